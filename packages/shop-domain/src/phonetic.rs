use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;

use crate::{Error, Result};

const BUILTIN_TABLE_TOML: &str = include_str!("../data/phonetic_table.toml");

#[derive(Deserialize)]
struct TableFile {
	syllables: HashMap<String, String>,
}

/// Character to Latin syllable mapping used to build phonetic search fields.
///
/// The table is data, not code: the built-in copy lives in `data/phonetic_table.toml` and a
/// deployment may load a replacement with the same `[syllables]` shape.
#[derive(Clone, Debug, Default)]
pub struct PhoneticTable {
	syllables: HashMap<char, String>,
}
impl PhoneticTable {
	pub fn builtin() -> Result<Self> {
		Self::from_toml_str(BUILTIN_TABLE_TOML)
	}

	pub fn load(path: &Path) -> Result<Self> {
		let raw = fs::read_to_string(path)
			.map_err(|err| Error::ReadPhoneticTable { path: path.to_path_buf(), source: err })?;

		Self::from_toml_str(&raw)
	}

	pub fn from_toml_str(raw: &str) -> Result<Self> {
		let file: TableFile =
			toml::from_str(raw).map_err(|err| Error::ParsePhoneticTable { source: err })?;
		let mut syllables = HashMap::with_capacity(file.syllables.len());

		for (key, syllable) in file.syllables {
			let mut chars = key.chars();
			let (Some(ch), None) = (chars.next(), chars.next()) else {
				return Err(Error::InvalidPhoneticTable {
					message: format!("key {key:?} must be exactly one character."),
				});
			};
			let syllable = syllable.trim().to_ascii_lowercase();

			if syllable.is_empty() || !syllable.chars().all(|c| c.is_ascii_alphabetic()) {
				return Err(Error::InvalidPhoneticTable {
					message: format!("syllable for {key:?} must be non-empty ASCII letters."),
				});
			}

			syllables.insert(ch, syllable);
		}

		Ok(Self { syllables })
	}

	pub fn syllable(&self, ch: char) -> Option<&str> {
		self.syllables.get(&ch).map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.syllables.len()
	}

	pub fn is_empty(&self) -> bool {
		self.syllables.is_empty()
	}

	/// Mapped characters become their syllable followed by a space, unmapped ASCII
	/// alphanumerics are lowercased in place, and everything else is dropped.
	pub fn transliterate(&self, text: &str) -> String {
		let mut out = String::with_capacity(text.len());

		for ch in text.chars() {
			if let Some(syllable) = self.syllable(ch) {
				out.push_str(syllable);
				out.push(' ');
			} else if ch.is_ascii_alphanumeric() {
				out.push(ch.to_ascii_lowercase());
			}
		}

		out.trim().to_string()
	}

	pub fn initials(&self, text: &str) -> String {
		let mut out = String::new();

		for ch in text.chars() {
			if let Some(first) = self.syllable(ch).and_then(|syllable| syllable.chars().next()) {
				out.push(first);
			} else if ch.is_ascii_alphanumeric() {
				out.push(ch.to_ascii_lowercase());
			}
		}

		out
	}
}

#[cfg(test)]
mod tests {
	use super::PhoneticTable;

	fn table() -> PhoneticTable {
		PhoneticTable::builtin().expect("Built-in table must parse.")
	}

	#[test]
	fn builtin_table_covers_catalog_vocabulary() {
		let table = table();

		assert!(table.len() >= 140, "Unexpected table size: {}", table.len());
		assert_eq!(table.syllable('耳'), Some("er"));
		assert_eq!(table.syllable('机'), Some("ji"));
	}

	#[test]
	fn transliterate_separates_syllables_and_drops_unmapped() {
		let table = table();

		assert_eq!(table.transliterate("无线降噪耳机"), "wu xian jiang zao er ji");
		assert_eq!(table.transliterate("耳机X1！"), "er ji x1");
		assert_eq!(table.transliterate("龘"), "");
	}

	#[test]
	fn initials_concatenate_first_letters() {
		let table = table();

		assert_eq!(table.initials("笔记本电脑"), "bjbdn");
		assert_eq!(table.initials("4K显示器"), "4kxsq");
		assert_eq!(table.initials("—"), "");
	}

	#[test]
	fn multi_character_keys_are_rejected() {
		let err = PhoneticTable::from_toml_str("[syllables]\n\"电脑\" = \"diannao\"\n")
			.expect_err("Expected invalid key.");

		assert!(err.to_string().contains("exactly one character"));
	}

	#[test]
	fn syllables_are_lowercased() {
		let table = PhoneticTable::from_toml_str("[syllables]\n\"电\" = \"DIAN\"\n")
			.expect("Table must parse.");

		assert_eq!(table.syllable('电'), Some("dian"));
	}
}
