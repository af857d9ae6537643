use serde::{Deserialize, Serialize};

use crate::{
	ngram::{ngrams, search_tokens},
	phonetic::PhoneticTable,
};

/// Source attributes of a catalog item that feed the derived search fields.
#[derive(Clone, Copy, Debug)]
pub struct SearchSource<'a> {
	pub name: &'a str,
	pub description: &'a str,
	pub category: &'a str,
	pub keywords: &'a str,
}

/// Derived attributes persisted next to a catalog item. Never edited directly.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFields {
	pub name_ngrams: String,
	pub name_phonetic: String,
	pub name_phonetic_initials: String,
	pub search_tokens: String,
}

pub fn compute_search_fields(table: &PhoneticTable, source: SearchSource<'_>) -> SearchFields {
	let combined =
		format!("{} {} {} {}", source.name, source.description, source.category, source.keywords);

	SearchFields {
		name_ngrams: ngrams(source.name, 2).into_iter().collect::<Vec<_>>().join(" "),
		name_phonetic: table.transliterate(source.name),
		name_phonetic_initials: table.initials(source.name),
		search_tokens: search_tokens(table, &combined),
	}
}
