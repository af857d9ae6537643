use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, ShopService};
use shop_domain::search_fields::SearchFields;

const PROGRESS_EVERY: u64 = 500;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReindexItemResponse {
	pub item_id: Uuid,
	pub search_fields: SearchFields,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexReport {
	pub total: u64,
}

impl ShopService {
	pub async fn reindex_item(&self, item_id: Uuid) -> Result<ReindexItemResponse> {
		let item =
			self.store.get_item(item_id).await?.ok_or_else(|| Error::item_not_found(item_id))?;
		let search_fields = self.search_fields(item.search_source());

		if !self.store.write_search_fields(item_id, &search_fields).await? {
			return Err(Error::item_not_found(item_id));
		}

		tracing::debug!(item_id = %item_id, "Catalog item reindexed.");

		Ok(ReindexItemResponse { item_id, search_fields })
	}

	/// Recomputes derived fields for every item, one write at a time. Items deleted between the
	/// listing and their write are skipped. Safe to re-run after a partial failure.
	pub async fn reindex_all(&self) -> Result<ReindexReport> {
		let items = self.store.list_items().await?;
		let expected = items.len();
		let mut total = 0_u64;

		tracing::info!(items = expected, "Bulk reindex started.");

		for (done, item) in (1_u64..).zip(items) {
			let fields = self.search_fields(item.search_source());

			if self.store.write_search_fields(item.item_id, &fields).await? {
				total += 1;
			}
			if done % PROGRESS_EVERY == 0 {
				tracing::info!(done, items = expected, "Bulk reindex progress.");
			}
		}

		tracing::info!(total, "Bulk reindex finished.");

		Ok(ReindexReport { total })
	}
}
