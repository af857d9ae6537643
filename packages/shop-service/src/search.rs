pub mod pipeline;
pub mod policy;
pub mod strategy;

use serde::{Deserialize, Serialize};

use crate::{Error, ItemView, Result, ShopService};
use pipeline::{PageWindow, SearchFilter, SortOrder};
use policy::{ScoringPolicy, ScoringProfile};
use shop_domain::query::normalize_query;
use shop_storage::{
	models::MerchantSummary,
	pipeline::{Pipeline, SortField, SortKey},
};
use strategy::MatchStrategy;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchRequest {
	#[serde(default)]
	pub q: String,
	pub category: Option<String>,
	pub min_price: Option<f64>,
	pub max_price: Option<f64>,
	pub sort_by: Option<String>,
	pub strategy: Option<String>,
	pub scoring: Option<String>,
	pub page: Option<u64>,
	pub limit: Option<u64>,
	#[serde(default)]
	pub explain: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchHit {
	#[serde(flatten)]
	pub item: ItemView,
	pub relevance_score: f64,
	pub name_highlighted: String,
	pub description_highlighted: String,
	pub merchant: Option<MerchantSummary>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Pagination {
	pub total: u64,
	pub page: u64,
	pub limit: u64,
	pub total_pages: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchMeta {
	pub strategy: &'static str,
	pub sort_by: &'static str,
	pub scoring: &'static str,
	pub policy_version: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchResponse {
	pub items: Vec<SearchHit>,
	pub pagination: Pagination,
	pub query: String,
	pub meta: SearchMeta,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pipeline: Option<Pipeline>,
}

#[derive(Clone, Debug, Serialize)]
pub struct BasicSearchResponse {
	pub items: Vec<ItemView>,
	pub query: String,
}

impl ShopService {
	/// Ranked search: one aggregation for the requested page and one count over the same filter.
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let query = normalize_query(&req.q);

		if query.is_empty() {
			return Err(Error::EmptyQuery);
		}

		validate_price_bounds(req.min_price, req.max_price)?;

		let strategy = resolve(
			"strategy",
			req.strategy.as_deref(),
			&self.cfg.search.default_strategy,
			MatchStrategy::parse,
		)?;
		let profile = resolve(
			"scoring",
			req.scoring.as_deref(),
			&self.cfg.ranking.default_profile,
			ScoringProfile::parse,
		)?;
		let sort = resolve("sort_by", req.sort_by.as_deref(), "relevance", SortOrder::parse)?;
		let window = self.page_window(req.page, req.limit)?;
		let category =
			req.category.as_deref().map(str::trim).filter(|category| !category.is_empty());
		let filter = SearchFilter {
			query: &query,
			strategy,
			category,
			min_price: req.min_price,
			max_price: req.max_price,
		};
		let policy = ScoringPolicy::resolve(&self.cfg.ranking, profile);
		let ranked =
			pipeline::build_search_pipeline(&filter, policy.score_expr(&query), sort, window);
		let counted = pipeline::build_count_pipeline(&filter);
		let rows = self.store.aggregate(&ranked).await?;
		let total = self.store.count(&counted).await?;
		let pattern = self.highlighter.compile(&query);
		let items = rows
			.into_iter()
			.map(|row| {
				let (name_highlighted, description_highlighted) = match &pattern {
					Some(pattern) =>
						(pattern.apply(&row.item.name), pattern.apply(&row.item.description)),
					None => (row.item.name.clone(), row.item.description.clone()),
				};

				SearchHit {
					relevance_score: row.relevance_score.unwrap_or(0.0),
					name_highlighted,
					description_highlighted,
					merchant: row.merchant,
					item: row.item.into(),
				}
			})
			.collect::<Vec<_>>();

		tracing::debug!(
			query = %query,
			strategy = strategy.as_str(),
			scoring = profile.as_str(),
			hits = items.len(),
			total,
			"Ranked search completed."
		);

		Ok(SearchResponse {
			items,
			pagination: Pagination {
				total,
				page: window.page,
				limit: window.limit,
				total_pages: window.total_pages(total),
			},
			query,
			meta: SearchMeta {
				strategy: strategy.as_str(),
				sort_by: sort.as_str(),
				scoring: profile.as_str(),
				policy_version: policy.version.to_string(),
			},
			pipeline: req.explain.then_some(ranked),
		})
	}

	/// Recall-oriented search over every text and derived field, best sellers first.
	pub async fn basic_search(&self, q: &str) -> Result<BasicSearchResponse> {
		let query = normalize_query(q);

		if query.is_empty() {
			return Err(Error::EmptyQuery);
		}

		let items = self
			.store
			.find(
				&strategy::basic_predicate(&query),
				&[SortKey::desc(SortField::SalesCount), SortKey::asc(SortField::ItemId)],
			)
			.await?;

		Ok(BasicSearchResponse { items: items.into_iter().map(ItemView::from).collect(), query })
	}

	fn page_window(&self, page: Option<u64>, limit: Option<u64>) -> Result<PageWindow> {
		let page = page.unwrap_or(1);
		let limit = limit.unwrap_or(u64::from(self.cfg.search.default_limit));

		if page == 0 {
			return Err(Error::invalid("page must be at least 1."));
		}
		if limit == 0 {
			return Err(Error::invalid("limit must be at least 1."));
		}

		Ok(PageWindow { page, limit: limit.min(u64::from(self.cfg.search.max_limit)) })
	}
}

fn resolve<T>(
	field: &str,
	requested: Option<&str>,
	fallback: &str,
	parse: impl Fn(&str) -> Option<T>,
) -> Result<T> {
	let raw = requested.map(str::trim).filter(|value| !value.is_empty()).unwrap_or(fallback);

	parse(raw).ok_or_else(|| Error::invalid(format!("Unsupported {field} value {raw:?}.")))
}

fn validate_price_bounds(min_price: Option<f64>, max_price: Option<f64>) -> Result<()> {
	for (field, value) in [("min_price", min_price), ("max_price", max_price)] {
		if let Some(value) = value
			&& (!value.is_finite() || value < 0.0)
		{
			return Err(Error::invalid(format!("{field} must be a finite, non-negative number.")));
		}
	}

	if let (Some(min), Some(max)) = (min_price, max_price)
		&& min > max
	{
		return Err(Error::invalid("min_price must not exceed max_price."));
	}

	Ok(())
}
