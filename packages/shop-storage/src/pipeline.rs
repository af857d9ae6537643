//! Backend-neutral query IR.
//!
//! A [`Predicate`] selects items, a [`Pipeline`] filters, scores, sorts, paginates and joins them,
//! and a [`SuggestionPipeline`] groups matching names. Every type serializes so callers can echo
//! the exact plan that ran. [`crate::memory::MemoryCatalog`] and [`crate::postgres::PgCatalog`]
//! evaluate the same IR.

use serde::Serialize;

use crate::models::CatalogItem;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
	Name,
	Description,
	Category,
	Keywords,
	MerchantLabel,
	NameNgrams,
	NamePhonetic,
	NamePhoneticInitials,
	SearchTokens,
}
impl TextField {
	pub fn column(self) -> &'static str {
		match self {
			Self::Name => "name",
			Self::Description => "description",
			Self::Category => "category",
			Self::Keywords => "keywords",
			Self::MerchantLabel => "merchant_label",
			Self::NameNgrams => "name_ngrams",
			Self::NamePhonetic => "name_phonetic",
			Self::NamePhoneticInitials => "name_phonetic_initials",
			Self::SearchTokens => "search_tokens",
		}
	}

	pub fn read(self, item: &CatalogItem) -> &str {
		match self {
			Self::Name => &item.name,
			Self::Description => &item.description,
			Self::Category => &item.category,
			Self::Keywords => &item.keywords,
			Self::MerchantLabel => &item.merchant_label,
			Self::NameNgrams => &item.name_ngrams,
			Self::NamePhonetic => &item.name_phonetic,
			Self::NamePhoneticInitials => &item.name_phonetic_initials,
			Self::SearchTokens => &item.search_tokens,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberField {
	Price,
	Stock,
	SalesCount,
}
impl NumberField {
	pub fn column(self) -> &'static str {
		match self {
			Self::Price => "price",
			Self::Stock => "stock",
			Self::SalesCount => "sales_count",
		}
	}

	pub fn read(self, item: &CatalogItem) -> f64 {
		match self {
			Self::Price => item.price,
			Self::Stock => item.stock as f64,
			Self::SalesCount => item.sales_count as f64,
		}
	}
}

/// Boolean condition over a single item.
///
/// `Regex` patterns are always matched case-insensitively and unanchored. Callers embedding user
/// input must escape it first; [`Predicate::contains`] does.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
	All,
	Regex { field: TextField, pattern: String },
	Equals { field: TextField, value: String },
	EqualsIgnoreCase { field: TextField, value: String },
	Range { field: NumberField, min: Option<f64>, max: Option<f64> },
	Or(Vec<Predicate>),
	And(Vec<Predicate>),
}
impl Predicate {
	pub fn regex(field: TextField, pattern: impl Into<String>) -> Self {
		Self::Regex { field, pattern: pattern.into() }
	}

	/// Case-insensitive literal substring match.
	pub fn contains(field: TextField, text: &str) -> Self {
		Self::regex(field, regex::escape(text))
	}

	pub fn equals(field: TextField, value: impl Into<String>) -> Self {
		Self::Equals { field, value: value.into() }
	}

	pub fn equals_ignore_case(field: TextField, value: impl Into<String>) -> Self {
		Self::EqualsIgnoreCase { field, value: value.into() }
	}

	pub fn range(field: NumberField, min: Option<f64>, max: Option<f64>) -> Self {
		Self::Range { field, min, max }
	}

	/// Disjunction that collapses a single branch. An empty list matches nothing.
	pub fn any(mut branches: Vec<Predicate>) -> Self {
		if branches.len() == 1 {
			return branches.remove(0);
		}

		Self::Or(branches)
	}

	/// Conjunction that drops `All` members and collapses a single branch.
	pub fn all(branches: Vec<Predicate>) -> Self {
		let mut branches =
			branches.into_iter().filter(|branch| *branch != Self::All).collect::<Vec<_>>();

		match branches.len() {
			0 => Self::All,
			1 => branches.remove(0),
			_ => Self::And(branches),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoreTier {
	pub when: Predicate,
	pub points: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTerm {
	/// Points of the first tier whose condition holds, otherwise zero.
	FirstOf(Vec<ScoreTier>),
	When(ScoreTier),
	/// `min(cap, field * coefficient)`.
	Capped { field: NumberField, coefficient: f64, cap: f64 },
}

/// Sum of independent terms, computed per item at query time.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ScoreExpr {
	pub terms: Vec<ScoreTerm>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
	RelevanceScore,
	Price,
	SalesCount,
	Stock,
	CreatedAt,
	Name,
	ItemId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
	Asc,
	Desc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SortKey {
	pub field: SortField,
	pub direction: Direction,
}
impl SortKey {
	pub fn asc(field: SortField) -> Self {
		Self { field, direction: Direction::Asc }
	}

	pub fn desc(field: SortField) -> Self {
		Self { field, direction: Direction::Desc }
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
	Match(Predicate),
	AddScore(ScoreExpr),
	Sort(Vec<SortKey>),
	Skip(u64),
	Limit(u64),
	LookupMerchant,
	Count,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Pipeline {
	pub stages: Vec<Stage>,
}
impl Pipeline {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn matching(mut self, predicate: Predicate) -> Self {
		self.stages.push(Stage::Match(predicate));

		self
	}

	pub fn add_score(mut self, score: ScoreExpr) -> Self {
		self.stages.push(Stage::AddScore(score));

		self
	}

	pub fn sort(mut self, keys: Vec<SortKey>) -> Self {
		self.stages.push(Stage::Sort(keys));

		self
	}

	pub fn skip(mut self, count: u64) -> Self {
		self.stages.push(Stage::Skip(count));

		self
	}

	pub fn limit(mut self, count: u64) -> Self {
		self.stages.push(Stage::Limit(count));

		self
	}

	pub fn lookup_merchant(mut self) -> Self {
		self.stages.push(Stage::LookupMerchant);

		self
	}

	pub fn count(mut self) -> Self {
		self.stages.push(Stage::Count);

		self
	}

	pub fn ends_with_count(&self) -> bool {
		matches!(self.stages.last(), Some(Stage::Count))
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionRank {
	/// Earliest character offset of `needle` in the lowercased name first.
	Position { needle: String },
	Popularity,
}

/// Group matching items by name, keep the first category seen and the group size, rank, then
/// truncate to `limit`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SuggestionPipeline {
	pub filter: Predicate,
	pub rank: SuggestionRank,
	pub limit: u64,
}
