use std::{future::Future, pin::Pin};

use shop_domain::search_fields::SearchFields;
use uuid::Uuid;

use crate::{
	Result,
	models::{CatalogItem, Merchant, PipelineRow, SuggestionRow},
	pipeline::{Pipeline, Predicate, SortKey, SuggestionPipeline},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Collection store behind the catalog service.
///
/// Writes are single-item and last-writer-wins. Methods returning `bool` report whether the item
/// existed.
pub trait CatalogStore
where
	Self: Send + Sync,
{
	fn insert_item<'a>(&'a self, item: &'a CatalogItem) -> BoxFuture<'a, Result<()>>;

	fn get_item(&self, item_id: Uuid) -> BoxFuture<'_, Result<Option<CatalogItem>>>;

	/// Replaces every mutable column, derived search fields included.
	fn update_item<'a>(&'a self, item: &'a CatalogItem) -> BoxFuture<'a, Result<bool>>;

	fn write_search_fields<'a>(
		&'a self,
		item_id: Uuid,
		fields: &'a SearchFields,
	) -> BoxFuture<'a, Result<bool>>;

	fn delete_item(&self, item_id: Uuid) -> BoxFuture<'_, Result<bool>>;

	/// Every item ordered by creation time, then id.
	fn list_items(&self) -> BoxFuture<'_, Result<Vec<CatalogItem>>>;

	fn insert_merchant<'a>(&'a self, merchant: &'a Merchant) -> BoxFuture<'a, Result<()>>;

	fn get_merchant(&self, merchant_id: Uuid) -> BoxFuture<'_, Result<Option<Merchant>>>;

	fn find<'a>(
		&'a self,
		predicate: &'a Predicate,
		sort: &'a [SortKey],
	) -> BoxFuture<'a, Result<Vec<CatalogItem>>>;

	fn aggregate<'a>(&'a self, pipeline: &'a Pipeline) -> BoxFuture<'a, Result<Vec<PipelineRow>>>;

	/// Runs a pipeline whose last stage is [`crate::pipeline::Stage::Count`].
	fn count<'a>(&'a self, pipeline: &'a Pipeline) -> BoxFuture<'a, Result<u64>>;

	fn suggest<'a>(
		&'a self,
		pipeline: &'a SuggestionPipeline,
	) -> BoxFuture<'a, Result<Vec<SuggestionRow>>>;
}
