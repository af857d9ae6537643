//! Relevance scoring as a versioned weight table.

use shop_config::{Ranking, RankingWeights};
use shop_domain::query::is_phonetic_query;
use shop_storage::pipeline::{NumberField, Predicate, ScoreExpr, ScoreTerm, ScoreTier, TextField};

use super::strategy::phonetic_pattern;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoringProfile {
	Native,
	Basic,
}
impl ScoringProfile {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"native" => Some(Self::Native),
			"basic" => Some(Self::Basic),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Native => "native",
			Self::Basic => "basic",
		}
	}
}

#[derive(Clone, Debug)]
pub struct ScoringPolicy<'a> {
	pub profile: ScoringProfile,
	pub version: &'a str,
	pub weights: &'a RankingWeights,
}
impl<'a> ScoringPolicy<'a> {
	pub fn resolve(ranking: &'a Ranking, profile: ScoringProfile) -> Self {
		let weights = match profile {
			ScoringProfile::Native => &ranking.native,
			ScoringProfile::Basic => &ranking.basic,
		};

		Self { profile, version: ranking.policy_version.as_str(), weights }
	}

	/// Builds the per-item score for `query`. Zero-weight terms are omitted.
	pub fn score_expr(&self, query: &str) -> ScoreExpr {
		let w = self.weights;
		let escaped = regex::escape(query);
		let lowered = query.to_lowercase();
		let name_tiers = [
			(Predicate::equals_ignore_case(TextField::Name, query), w.name_exact),
			(Predicate::regex(TextField::Name, format!("^{escaped}")), w.name_prefix),
			(Predicate::regex(TextField::Name, format!("{escaped}$")), w.name_suffix),
			(Predicate::contains(TextField::Name, query), w.name_contains),
		]
		.into_iter()
		.filter(|(_, points)| *points != 0.0)
		.map(|(when, points)| ScoreTier { when, points })
		.collect::<Vec<_>>();
		let mut terms = Vec::new();

		if !name_tiers.is_empty() {
			terms.push(ScoreTerm::FirstOf(name_tiers));
		}

		let mut flat = vec![
			(Predicate::contains(TextField::Category, query), w.category),
			(Predicate::contains(TextField::Description, query), w.description),
			(Predicate::contains(TextField::Keywords, query), w.keywords),
		];
		let phonetic = if is_phonetic_query(query) {
			Predicate::regex(TextField::NamePhonetic, phonetic_pattern(query))
		} else {
			Predicate::contains(TextField::NamePhonetic, &lowered)
		};

		flat.push((phonetic, w.phonetic));
		flat.push((
			Predicate::contains(TextField::NamePhoneticInitials, &lowered),
			w.phonetic_initials,
		));
		flat.push((Predicate::contains(TextField::NameNgrams, &lowered), w.name_ngrams));
		flat.push((Predicate::range(NumberField::Stock, None, Some(0.0)), w.out_of_stock_penalty));

		for (when, points) in flat {
			if points != 0.0 {
				terms.push(ScoreTerm::When(ScoreTier { when, points }));
			}
		}

		if w.sales_coefficient != 0.0 && w.sales_cap != 0.0 {
			terms.push(ScoreTerm::Capped {
				field: NumberField::SalesCount,
				coefficient: w.sales_coefficient,
				cap: w.sales_cap,
			});
		}

		ScoreExpr { terms }
	}
}
