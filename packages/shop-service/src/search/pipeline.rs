use shop_storage::pipeline::{
	NumberField, Pipeline, Predicate, ScoreExpr, SortField, SortKey, TextField,
};

use super::strategy::MatchStrategy;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
	Relevance,
	PriceAsc,
	PriceDesc,
	Sales,
	Newest,
}
impl SortOrder {
	/// Accepts the canonical names and the legacy `price`, `priceAsc` and `priceDesc` aliases.
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim() {
			"relevance" => Some(Self::Relevance),
			"price-asc" | "price" | "priceAsc" => Some(Self::PriceAsc),
			"price-desc" | "priceDesc" => Some(Self::PriceDesc),
			"sales" => Some(Self::Sales),
			"newest" => Some(Self::Newest),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Relevance => "relevance",
			Self::PriceAsc => "price-asc",
			Self::PriceDesc => "price-desc",
			Self::Sales => "sales",
			Self::Newest => "newest",
		}
	}

	/// Primary key, then score or sales as secondary, then item id so pages never overlap.
	pub fn keys(self) -> Vec<SortKey> {
		let mut keys = match self {
			Self::Relevance =>
				vec![SortKey::desc(SortField::RelevanceScore), SortKey::desc(SortField::SalesCount)],
			Self::PriceAsc =>
				vec![SortKey::asc(SortField::Price), SortKey::desc(SortField::RelevanceScore)],
			Self::PriceDesc =>
				vec![SortKey::desc(SortField::Price), SortKey::desc(SortField::RelevanceScore)],
			Self::Sales =>
				vec![SortKey::desc(SortField::SalesCount), SortKey::desc(SortField::RelevanceScore)],
			Self::Newest =>
				vec![SortKey::desc(SortField::CreatedAt), SortKey::desc(SortField::RelevanceScore)],
		};

		keys.push(SortKey::asc(SortField::ItemId));

		keys
	}
}

/// Filters shared by the ranked pipeline and its count pipeline.
#[derive(Clone, Debug)]
pub struct SearchFilter<'a> {
	pub query: &'a str,
	pub strategy: MatchStrategy,
	pub category: Option<&'a str>,
	pub min_price: Option<f64>,
	pub max_price: Option<f64>,
}
impl SearchFilter<'_> {
	pub fn predicate(&self) -> Predicate {
		let mut clauses = vec![self.strategy.predicate(self.query)];

		if let Some(category) = self.category {
			clauses.push(Predicate::equals(TextField::Category, category));
		}
		if self.min_price.is_some() || self.max_price.is_some() {
			clauses.push(Predicate::range(NumberField::Price, self.min_price, self.max_price));
		}

		Predicate::all(clauses)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
	pub page: u64,
	pub limit: u64,
}
impl PageWindow {
	pub fn skip(self) -> u64 {
		self.page.saturating_sub(1).saturating_mul(self.limit)
	}

	pub fn total_pages(self, total: u64) -> u64 {
		total.div_ceil(self.limit)
	}
}

/// `match → score → sort → skip → limit → merchant lookup`.
pub fn build_search_pipeline(
	filter: &SearchFilter<'_>,
	score: ScoreExpr,
	sort: SortOrder,
	window: PageWindow,
) -> Pipeline {
	Pipeline::new()
		.matching(filter.predicate())
		.add_score(score)
		.sort(sort.keys())
		.skip(window.skip())
		.limit(window.limit)
		.lookup_merchant()
}

/// `match → count`, with the same filter as the ranked pipeline and no scoring.
pub fn build_count_pipeline(filter: &SearchFilter<'_>) -> Pipeline {
	Pipeline::new().matching(filter.predicate()).count()
}
