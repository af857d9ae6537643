//! Postgres-backed [`CatalogStore`].

use shop_domain::search_fields::SearchFields;
use uuid::Uuid;

use crate::{
	Result,
	db::Db,
	models::{CatalogItem, Merchant, PipelineRow, SuggestionRow},
	pipeline::{Pipeline, Predicate, SortKey, SuggestionPipeline},
	queries,
	store::{BoxFuture, CatalogStore},
};

pub struct PgCatalog {
	pub db: Db,
}
impl PgCatalog {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}

impl CatalogStore for PgCatalog {
	fn insert_item<'a>(&'a self, item: &'a CatalogItem) -> BoxFuture<'a, Result<()>> {
		Box::pin(queries::insert_item(&self.db, item))
	}

	fn get_item(&self, item_id: Uuid) -> BoxFuture<'_, Result<Option<CatalogItem>>> {
		Box::pin(queries::get_item(&self.db, item_id))
	}

	fn update_item<'a>(&'a self, item: &'a CatalogItem) -> BoxFuture<'a, Result<bool>> {
		Box::pin(queries::update_item(&self.db, item))
	}

	fn write_search_fields<'a>(
		&'a self,
		item_id: Uuid,
		fields: &'a SearchFields,
	) -> BoxFuture<'a, Result<bool>> {
		Box::pin(queries::write_search_fields(&self.db, item_id, fields))
	}

	fn delete_item(&self, item_id: Uuid) -> BoxFuture<'_, Result<bool>> {
		Box::pin(queries::delete_item(&self.db, item_id))
	}

	fn list_items(&self) -> BoxFuture<'_, Result<Vec<CatalogItem>>> {
		Box::pin(queries::list_items(&self.db))
	}

	fn insert_merchant<'a>(&'a self, merchant: &'a Merchant) -> BoxFuture<'a, Result<()>> {
		Box::pin(queries::insert_merchant(&self.db, merchant))
	}

	fn get_merchant(&self, merchant_id: Uuid) -> BoxFuture<'_, Result<Option<Merchant>>> {
		Box::pin(queries::get_merchant(&self.db, merchant_id))
	}

	fn find<'a>(
		&'a self,
		predicate: &'a Predicate,
		sort: &'a [SortKey],
	) -> BoxFuture<'a, Result<Vec<CatalogItem>>> {
		Box::pin(queries::find(&self.db, predicate, sort))
	}

	fn aggregate<'a>(&'a self, pipeline: &'a Pipeline) -> BoxFuture<'a, Result<Vec<PipelineRow>>> {
		Box::pin(queries::aggregate(&self.db, pipeline))
	}

	fn count<'a>(&'a self, pipeline: &'a Pipeline) -> BoxFuture<'a, Result<u64>> {
		Box::pin(queries::count(&self.db, pipeline))
	}

	fn suggest<'a>(
		&'a self,
		pipeline: &'a SuggestionPipeline,
	) -> BoxFuture<'a, Result<Vec<SuggestionRow>>> {
		Box::pin(queries::suggest(&self.db, pipeline))
	}
}
