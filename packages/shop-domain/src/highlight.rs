use regex::{Captures, Regex, RegexBuilder};

/// Wraps literal, case-insensitive query occurrences in marker tags.
#[derive(Clone, Debug)]
pub struct Highlighter {
	pre_tag: String,
	post_tag: String,
}
impl Highlighter {
	pub fn new(pre_tag: impl Into<String>, post_tag: impl Into<String>) -> Self {
		Self { pre_tag: pre_tag.into(), post_tag: post_tag.into() }
	}

	/// Compiles the query once so it can be applied to many fields. `None` for an empty query.
	pub fn compile(&self, query: &str) -> Option<HighlightPattern<'_>> {
		if query.is_empty() {
			return None;
		}

		let regex =
			RegexBuilder::new(&regex::escape(query)).case_insensitive(true).build().ok()?;

		Some(HighlightPattern { highlighter: self, regex })
	}

	pub fn highlight(&self, text: &str, query: &str) -> String {
		match self.compile(query) {
			Some(pattern) => pattern.apply(text),
			None => text.to_string(),
		}
	}
}
impl Default for Highlighter {
	fn default() -> Self {
		Self::new("<mark class=\"search-highlight\">", "</mark>")
	}
}

pub struct HighlightPattern<'a> {
	highlighter: &'a Highlighter,
	regex: Regex,
}
impl HighlightPattern<'_> {
	pub fn apply(&self, text: &str) -> String {
		if text.is_empty() {
			return String::new();
		}

		self.regex
			.replace_all(text, |caps: &Captures<'_>| {
				format!("{}{}{}", self.highlighter.pre_tag, &caps[0], self.highlighter.post_tag)
			})
			.into_owned()
	}
}
