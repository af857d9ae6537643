use std::collections::{BTreeSet, HashSet};

use crate::phonetic::PhoneticTable;

/// Lowercased character n-grams of `text` plus the whole lowercased text.
///
/// Offsets are counted in `char`s. Text shorter than `n` (or `n == 0`) yields only itself.
pub fn ngrams(text: &str, n: usize) -> BTreeSet<String> {
	let lower = text.to_lowercase();
	let chars = lower.chars().collect::<Vec<_>>();
	let mut out = BTreeSet::new();

	if n > 0 && chars.len() >= n {
		for window in chars.windows(n) {
			out.insert(window.iter().collect::<String>());
		}
	}

	out.insert(lower);

	out
}

/// Space-joined token soup used for the catch-all `search_tokens` field.
///
/// Order is first-seen: lowercased text, 2-grams, 3-grams, joined transliteration, each
/// syllable, initials.
pub fn search_tokens(table: &PhoneticTable, text: &str) -> String {
	if text.is_empty() {
		return String::new();
	}

	let mut tokens = Vec::new();
	let mut seen = HashSet::new();
	let mut push = |token: String| {
		if !token.is_empty() && seen.insert(token.clone()) {
			tokens.push(token);
		}
	};

	push(text.to_lowercase());

	for gram in ngrams(text, 2) {
		push(gram);
	}
	for gram in ngrams(text, 3) {
		push(gram);
	}

	let phonetic = table.transliterate(text);

	if !phonetic.is_empty() {
		push(phonetic.split_whitespace().collect::<String>());

		for piece in phonetic.split(' ') {
			push(piece.to_string());
		}
	}

	push(table.initials(text));

	tokens.join(" ")
}
