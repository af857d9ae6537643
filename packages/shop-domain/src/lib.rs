//! Text algorithms behind catalog search: transliteration, n-grams, derived search fields,
//! query normalization and highlighting. Everything here is pure and allocation-only.

pub mod highlight;
pub mod ngram;
pub mod phonetic;
pub mod query;
pub mod search_fields;

mod error;

pub use error::{Error, Result};
