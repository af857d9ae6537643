//! Catalog service: item and merchant operations, search-field indexing, ranked search and
//! suggestions over any [`CatalogStore`].

pub mod catalog;
pub mod index;
pub mod search;
pub mod suggest;
pub mod time_serde;

mod error;

pub use catalog::{
	CreateItemRequest, CreateMerchantRequest, DeleteItemResponse, ItemView, ListItemsRequest,
	ListItemsResponse, MerchantView, UpdateItemRequest,
};
pub use error::{Error, Result};
pub use index::{ReindexItemResponse, ReindexReport};
pub use search::{
	BasicSearchResponse, Pagination, SearchHit, SearchMeta, SearchRequest, SearchResponse,
};
pub use suggest::{Suggestion, SuggestionsRequest, SuggestionsResponse};

use std::sync::Arc;

use shop_config::Config;
use shop_domain::{
	highlight::Highlighter,
	phonetic::PhoneticTable,
	search_fields::{SearchFields, SearchSource, compute_search_fields},
};
use shop_storage::CatalogStore;

pub struct ShopService {
	pub cfg: Config,
	pub store: Arc<dyn CatalogStore>,
	pub phonetic: PhoneticTable,
	pub highlighter: Highlighter,
}
impl ShopService {
	/// Loads the phonetic table named by `search.phonetic_table`, or the built-in one.
	pub fn new(cfg: Config, store: Arc<dyn CatalogStore>) -> Result<Self> {
		let phonetic = match cfg.search.phonetic_table.as_deref() {
			Some(path) => PhoneticTable::load(path)?,
			None => PhoneticTable::builtin()?,
		};

		Ok(Self::with_phonetic_table(cfg, store, phonetic))
	}

	pub fn with_phonetic_table(
		cfg: Config,
		store: Arc<dyn CatalogStore>,
		phonetic: PhoneticTable,
	) -> Self {
		let highlighter = Highlighter::new(
			cfg.search.highlight.pre_tag.as_str(),
			cfg.search.highlight.post_tag.as_str(),
		);

		Self { cfg, store, phonetic, highlighter }
	}

	pub(crate) fn search_fields(&self, source: SearchSource<'_>) -> SearchFields {
		compute_search_fields(&self.phonetic, source)
	}
}
