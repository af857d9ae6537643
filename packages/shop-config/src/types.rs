use std::path::PathBuf;

use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub ranking: Ranking,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	/// One of "postgres" or "memory".
	pub backend: String,
	pub postgres: Option<Postgres>,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub default_limit: u32,
	pub max_limit: u32,
	/// One of "exact", "wildcard", "ngram" or "multi".
	pub default_strategy: String,
	/// Optional replacement for the built-in character to syllable table.
	pub phonetic_table: Option<PathBuf>,
	pub suggestions: SearchSuggestions,
	pub highlight: SearchHighlight,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			default_limit: 20,
			max_limit: 100,
			default_strategy: "multi".to_string(),
			phonetic_table: None,
			suggestions: SearchSuggestions::default(),
			highlight: SearchHighlight::default(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchSuggestions {
	pub default_limit: u32,
	pub max_limit: u32,
}
impl Default for SearchSuggestions {
	fn default() -> Self {
		Self { default_limit: 10, max_limit: 50 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchHighlight {
	pub pre_tag: String,
	pub post_tag: String,
}
impl Default for SearchHighlight {
	fn default() -> Self {
		Self {
			pre_tag: "<mark class=\"search-highlight\">".to_string(),
			post_tag: "</mark>".to_string(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Ranking {
	/// Recorded in search responses so clients can tell which weight table ranked them.
	pub policy_version: String,
	/// One of "native" or "basic".
	pub default_profile: String,
	/// Fields left out of `[ranking.native]` keep the native preset.
	#[serde(deserialize_with = "native_weights")]
	pub native: RankingWeights,
	/// Fields left out of `[ranking.basic]` keep the basic preset.
	#[serde(deserialize_with = "basic_weights")]
	pub basic: RankingWeights,
}
impl Default for Ranking {
	fn default() -> Self {
		Self {
			policy_version: "2024-06-native".to_string(),
			default_profile: "native".to_string(),
			native: RankingWeights::native(),
			basic: RankingWeights::basic(),
		}
	}
}

/// Additive relevance weights. The four name tiers are mutually exclusive.
#[derive(Clone, Debug, PartialEq)]
pub struct RankingWeights {
	pub name_exact: f64,
	pub name_prefix: f64,
	pub name_suffix: f64,
	pub name_contains: f64,
	pub category: f64,
	pub description: f64,
	pub keywords: f64,
	pub phonetic: f64,
	pub phonetic_initials: f64,
	pub name_ngrams: f64,
	pub sales_coefficient: f64,
	pub sales_cap: f64,
	pub out_of_stock_penalty: f64,
}
impl RankingWeights {
	pub fn native() -> Self {
		Self {
			name_exact: 100.0,
			name_prefix: 80.0,
			name_suffix: 70.0,
			name_contains: 60.0,
			category: 20.0,
			description: 10.0,
			keywords: 15.0,
			phonetic: 20.0,
			phonetic_initials: 15.0,
			name_ngrams: 0.0,
			sales_coefficient: 0.01,
			sales_cap: 20.0,
			out_of_stock_penalty: -30.0,
		}
	}

	pub fn basic() -> Self {
		Self {
			name_exact: 50.0,
			name_prefix: 30.0,
			name_suffix: 30.0,
			name_contains: 30.0,
			category: 15.0,
			description: 10.0,
			keywords: 5.0,
			phonetic: 20.0,
			phonetic_initials: 15.0,
			name_ngrams: 10.0,
			sales_coefficient: 0.01,
			sales_cap: 10.0,
			out_of_stock_penalty: 0.0,
		}
	}

	pub(crate) fn entries(&self) -> [(&'static str, f64); 13] {
		[
			("name_exact", self.name_exact),
			("name_prefix", self.name_prefix),
			("name_suffix", self.name_suffix),
			("name_contains", self.name_contains),
			("category", self.category),
			("description", self.description),
			("keywords", self.keywords),
			("phonetic", self.phonetic),
			("phonetic_initials", self.phonetic_initials),
			("name_ngrams", self.name_ngrams),
			("sales_coefficient", self.sales_coefficient),
			("sales_cap", self.sales_cap),
			("out_of_stock_penalty", self.out_of_stock_penalty),
		]
	}
}
impl Default for RankingWeights {
	fn default() -> Self {
		Self::native()
	}
}

#[derive(Debug, Deserialize)]
struct RankingWeightsPatch {
	name_exact: Option<f64>,
	name_prefix: Option<f64>,
	name_suffix: Option<f64>,
	name_contains: Option<f64>,
	category: Option<f64>,
	description: Option<f64>,
	keywords: Option<f64>,
	phonetic: Option<f64>,
	phonetic_initials: Option<f64>,
	name_ngrams: Option<f64>,
	sales_coefficient: Option<f64>,
	sales_cap: Option<f64>,
	out_of_stock_penalty: Option<f64>,
}
impl RankingWeightsPatch {
	fn apply(self, preset: RankingWeights) -> RankingWeights {
		RankingWeights {
			name_exact: self.name_exact.unwrap_or(preset.name_exact),
			name_prefix: self.name_prefix.unwrap_or(preset.name_prefix),
			name_suffix: self.name_suffix.unwrap_or(preset.name_suffix),
			name_contains: self.name_contains.unwrap_or(preset.name_contains),
			category: self.category.unwrap_or(preset.category),
			description: self.description.unwrap_or(preset.description),
			keywords: self.keywords.unwrap_or(preset.keywords),
			phonetic: self.phonetic.unwrap_or(preset.phonetic),
			phonetic_initials: self.phonetic_initials.unwrap_or(preset.phonetic_initials),
			name_ngrams: self.name_ngrams.unwrap_or(preset.name_ngrams),
			sales_coefficient: self.sales_coefficient.unwrap_or(preset.sales_coefficient),
			sales_cap: self.sales_cap.unwrap_or(preset.sales_cap),
			out_of_stock_penalty: self.out_of_stock_penalty.unwrap_or(preset.out_of_stock_penalty),
		}
	}
}

fn native_weights<'de, D>(deserializer: D) -> Result<RankingWeights, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(RankingWeightsPatch::deserialize(deserializer)?.apply(RankingWeights::native()))
}

fn basic_weights<'de, D>(deserializer: D) -> Result<RankingWeights, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(RankingWeightsPatch::deserialize(deserializer)?.apply(RankingWeights::basic()))
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
}
