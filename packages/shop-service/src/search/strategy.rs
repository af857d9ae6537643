//! Match predicates for each search strategy. User input is always regex-escaped.

use shop_domain::query::is_phonetic_query;
use shop_storage::pipeline::{Predicate, TextField};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchStrategy {
	Exact,
	Wildcard,
	Ngram,
	Multi,
}
impl MatchStrategy {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"exact" => Some(Self::Exact),
			"wildcard" => Some(Self::Wildcard),
			"ngram" => Some(Self::Ngram),
			"multi" => Some(Self::Multi),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Exact => "exact",
			Self::Wildcard => "wildcard",
			Self::Ngram => "ngram",
			Self::Multi => "multi",
		}
	}

	pub fn predicate(self, query: &str) -> Predicate {
		match self {
			Self::Exact => Predicate::any(
				[TextField::Name, TextField::Description, TextField::Category, TextField::Keywords]
					.into_iter()
					.map(|field| Predicate::contains(field, query))
					.collect(),
			),
			Self::Wildcard => {
				let pattern = wildcard_pattern(query);

				Predicate::any(vec![
					Predicate::regex(TextField::Name, pattern.clone()),
					Predicate::regex(TextField::Description, pattern),
				])
			},
			Self::Ngram => {
				let bigrams = query_bigrams(query);

				if bigrams.is_empty() {
					return Predicate::contains(TextField::Name, query);
				}

				Predicate::And(
					bigrams.iter().map(|gram| Predicate::contains(TextField::Name, gram)).collect(),
				)
			},
			Self::Multi => {
				let escaped = regex::escape(query);
				let mut branches = vec![
					Predicate::contains(TextField::Name, query),
					Predicate::contains(TextField::Description, query),
					Predicate::contains(TextField::Category, query),
					Predicate::regex(TextField::Name, wildcard_pattern(query)),
					Predicate::regex(TextField::Name, format!("^{escaped}")),
					Predicate::regex(TextField::Name, format!("{escaped}$")),
				];

				branches.extend(
					query_bigrams(query).iter().map(|gram| Predicate::contains(TextField::Name, gram)),
				);
				branches.extend(derived_field_branches(query));

				Predicate::any(branches)
			},
		}
	}
}

/// Recall-oriented predicate used by basic search and listings. A blank query matches everything.
pub fn basic_predicate(query: &str) -> Predicate {
	let query = query.trim();

	if query.is_empty() {
		return Predicate::All;
	}

	let mut branches = [
		TextField::Name,
		TextField::Description,
		TextField::Category,
		TextField::Keywords,
	]
	.into_iter()
	.map(|field| Predicate::contains(field, query))
	.collect::<Vec<_>>();

	branches.extend(derived_field_branches(query));

	Predicate::any(branches)
}

/// Branches over the derived search fields: name n-grams, search tokens, and the phonetic fields
/// when the query is alphabetic.
pub(crate) fn derived_field_branches(query: &str) -> Vec<Predicate> {
	let lowered = query.to_lowercase();
	let mut branches = vec![
		Predicate::contains(TextField::NameNgrams, &lowered),
		Predicate::contains(TextField::SearchTokens, &lowered),
	];

	branches.extend(phonetic_branches(query));

	branches
}

pub(crate) fn phonetic_branches(query: &str) -> Vec<Predicate> {
	if !is_phonetic_query(query) {
		return Vec::new();
	}

	vec![
		Predicate::regex(TextField::NamePhonetic, phonetic_pattern(query)),
		Predicate::contains(TextField::NamePhoneticInitials, &query.to_lowercase()),
	]
}

/// Escaped characters joined by `.*`, so `hp` matches `headphone`.
pub fn wildcard_pattern(query: &str) -> String {
	query
		.chars()
		.map(|ch| regex::escape(ch.encode_utf8(&mut [0; 4])))
		.collect::<Vec<_>>()
		.join(".*")
}

/// Lowercased letters joined by an optional space, so `erji` matches the transliteration `er ji`.
pub fn phonetic_pattern(query: &str) -> String {
	query
		.to_lowercase()
		.chars()
		.map(|ch| regex::escape(ch.encode_utf8(&mut [0; 4])))
		.collect::<Vec<_>>()
		.join(" ?")
}

/// Distinct 2-character windows of the query in first-seen order. Empty below two characters.
pub fn query_bigrams(query: &str) -> Vec<String> {
	let chars = query.chars().collect::<Vec<_>>();
	let mut grams: Vec<String> = Vec::new();

	for window in chars.windows(2) {
		let gram = window.iter().collect::<String>();

		if !grams.contains(&gram) {
			grams.push(gram);
		}
	}

	grams
}

#[cfg(test)]
mod tests {
	use super::*;

	fn fields(predicate: &Predicate) -> Vec<TextField> {
		match predicate {
			Predicate::Or(branches) | Predicate::And(branches) =>
				branches.iter().flat_map(fields).collect(),
			Predicate::Regex { field, .. }
			| Predicate::Equals { field, .. }
			| Predicate::EqualsIgnoreCase { field, .. } => vec![*field],
			Predicate::All | Predicate::Range { .. } => Vec::new(),
		}
	}

	#[test]
	fn blank_basic_query_matches_everything() {
		assert_eq!(basic_predicate("   "), Predicate::All);
	}

	#[test]
	fn phonetic_fields_only_join_for_alphabetic_queries() {
		let alphabetic = fields(&basic_predicate("erji"));
		let mixed = fields(&basic_predicate("耳机"));

		assert!(alphabetic.contains(&TextField::NamePhonetic));
		assert!(alphabetic.contains(&TextField::NamePhoneticInitials));
		assert!(!mixed.contains(&TextField::NamePhonetic));
		assert!(mixed.contains(&TextField::SearchTokens));
	}

	#[test]
	fn wildcard_interleaves_escaped_characters() {
		assert_eq!(wildcard_pattern("a.b"), "a.*\\..*b");
		assert_eq!(
			MatchStrategy::Wildcard.predicate("耳机"),
			Predicate::Or(vec![
				Predicate::regex(TextField::Name, "耳.*机"),
				Predicate::regex(TextField::Description, "耳.*机"),
			])
		);
	}

	#[test]
	fn phonetic_pattern_tolerates_syllable_separators() {
		let pattern = regex::Regex::new(&phonetic_pattern("ErJi")).expect("valid pattern");

		assert!(pattern.is_match("wu xian jiang zao er ji"));
		assert!(!pattern.is_match("er ju"));
	}

	#[test]
	fn ngram_strategy_requires_every_bigram() {
		assert_eq!(
			MatchStrategy::Ngram.predicate("降噪耳"),
			Predicate::And(vec![
				Predicate::contains(TextField::Name, "降噪"),
				Predicate::contains(TextField::Name, "噪耳"),
			])
		);
		assert_eq!(MatchStrategy::Ngram.predicate("耳"), Predicate::contains(TextField::Name, "耳"));
	}

	#[test]
	fn multi_anchors_prefix_and_suffix_on_escaped_input() {
		let Predicate::Or(branches) = MatchStrategy::Multi.predicate("a+b") else {
			panic!("Expected a disjunction.");
		};

		assert!(branches.contains(&Predicate::regex(TextField::Name, "^a\\+b")));
		assert!(branches.contains(&Predicate::regex(TextField::Name, "a\\+b$")));
		assert!(branches.contains(&Predicate::contains(TextField::Name, "+b")));
	}

	#[test]
	fn bigrams_are_deduplicated_in_order() {
		assert_eq!(query_bigrams("abab"), vec!["ab".to_string(), "ba".to_string()]);
		assert!(query_bigrams("a").is_empty());
	}
}
