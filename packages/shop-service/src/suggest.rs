use serde::{Deserialize, Serialize};

use crate::{Error, Result, ShopService, search::strategy};
use shop_domain::query::normalize_query;
use shop_storage::pipeline::{Predicate, SuggestionPipeline, SuggestionRank, TextField};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SuggestionsRequest {
	pub q: Option<String>,
	pub limit: Option<u32>,
	/// `position` (default) or `popularity`.
	pub rank: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
	pub text: String,
	pub category: String,
	pub count: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SuggestionsResponse {
	pub suggestions: Vec<Suggestion>,
	pub query: String,
}

impl ShopService {
	/// Distinct item names for autocomplete. A blank query yields no suggestions.
	pub async fn suggestions(&self, req: SuggestionsRequest) -> Result<SuggestionsResponse> {
		let query = normalize_query(req.q.as_deref().unwrap_or_default());

		if query.is_empty() {
			return Ok(SuggestionsResponse { suggestions: Vec::new(), query });
		}

		let cfg = &self.cfg.search.suggestions;
		let limit = match req.limit {
			Some(0) => return Err(Error::invalid("limit must be at least 1.")),
			Some(limit) => limit.min(cfg.max_limit),
			None => cfg.default_limit,
		};
		let rank = match req.rank.as_deref().map(str::trim) {
			None | Some("" | "position") =>
				SuggestionRank::Position { needle: query.to_lowercase() },
			Some("popularity") => SuggestionRank::Popularity,
			Some(other) =>
				return Err(Error::invalid(format!(
					"rank must be one of position or popularity; got {other:?}."
				))),
		};
		let mut branches = vec![
			Predicate::contains(TextField::Name, &query),
			Predicate::contains(TextField::NameNgrams, &query.to_lowercase()),
		];

		branches.extend(strategy::phonetic_branches(&query));

		let plan =
			SuggestionPipeline { filter: Predicate::any(branches), rank, limit: u64::from(limit) };
		let rows = self.store.suggest(&plan).await?;

		Ok(SuggestionsResponse {
			suggestions: rows
				.into_iter()
				.map(|row| Suggestion { text: row.text, category: row.category, count: row.count })
				.collect(),
			query,
		})
	}
}
