use std::sync::Arc;

use color_eyre::eyre;

use shop_config::Config;
use shop_service::ShopService;
use shop_storage::{CatalogStore, db::Db, memory::MemoryCatalog, postgres::PgCatalog};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ShopService>,
}
impl AppState {
	/// Opens the configured backend. Postgres schemas are created or upgraded before serving.
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let store: Arc<dyn CatalogStore> = match config.storage.backend.as_str() {
			"memory" => Arc::new(MemoryCatalog::new()),
			"postgres" => {
				let postgres = config.storage.postgres.as_ref().ok_or_else(|| {
					eyre::eyre!("storage.postgres is required when storage.backend is postgres.")
				})?;
				let db = Db::connect(postgres).await?;

				db.ensure_schema().await?;

				Arc::new(PgCatalog::new(db))
			},
			other => return Err(eyre::eyre!("Unsupported storage backend {other:?}.")),
		};

		tracing::info!(backend = %config.storage.backend, "Catalog store ready.");

		Ok(Self::from_service(ShopService::new(config, store)?))
	}

	pub fn from_service(service: ShopService) -> Self {
		Self { service: Arc::new(service) }
	}
}
