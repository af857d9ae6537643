use unicode_normalization::UnicodeNormalization;

/// NFKC-normalized, trimmed query text. Full-width Latin typed through CJK input methods
/// becomes plain ASCII here.
pub fn normalize_query(raw: &str) -> String {
	raw.nfkc().collect::<String>().trim().to_string()
}

/// Heuristic for "the user is typing a transliteration": non-empty and ASCII letters only.
pub fn is_phonetic_query(query: &str) -> bool {
	!query.is_empty() && query.chars().all(|ch| ch.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
	use super::{is_phonetic_query, normalize_query};

	#[test]
	fn full_width_letters_fold_to_ascii() {
		assert_eq!(normalize_query("  ｅｒｊｉ "), "erji");
	}

	#[test]
	fn phonetic_detection_requires_letters_only() {
		assert!(is_phonetic_query("erji"));
		assert!(is_phonetic_query("BJBDN"));
		assert!(!is_phonetic_query("er ji"));
		assert!(!is_phonetic_query("耳机"));
		assert!(!is_phonetic_query("x1"));
		assert!(!is_phonetic_query(""));
	}
}
