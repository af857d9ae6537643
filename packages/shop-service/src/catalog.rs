use rand::Rng;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, ShopService, search::strategy};
use shop_storage::{
	models::{CatalogItem, Merchant},
	pipeline::{Predicate, SortField, SortKey, TextField},
};

const PRODUCT_CODE_ATTEMPTS: u32 = 5;

#[derive(Clone, Debug, Deserialize)]
pub struct CreateItemRequest {
	pub name: String,
	#[serde(default)]
	pub description: String,
	pub category: String,
	pub price: f64,
	#[serde(default)]
	pub stock: i64,
	#[serde(default)]
	pub sales_count: i64,
	#[serde(default)]
	pub keywords: String,
	pub image_url: Option<String>,
	pub merchant_id: Option<Uuid>,
	pub product_code: Option<String>,
}

/// Partial update. Absent fields keep their stored values.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateItemRequest {
	pub name: Option<String>,
	pub description: Option<String>,
	pub category: Option<String>,
	pub price: Option<f64>,
	pub stock: Option<i64>,
	pub sales_count: Option<i64>,
	pub keywords: Option<String>,
	pub image_url: Option<String>,
	pub merchant_id: Option<Uuid>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListItemsRequest {
	pub category: Option<String>,
	pub search: Option<String>,
	pub merchant: Option<String>,
	pub sort_by: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreateMerchantRequest {
	pub name: String,
	pub shop_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItemView {
	pub item_id: Uuid,
	pub product_code: String,
	pub name: String,
	pub description: String,
	pub category: String,
	pub price: f64,
	pub stock: i64,
	pub sales_count: i64,
	pub keywords: String,
	pub image_url: Option<String>,
	pub merchant_id: Option<Uuid>,
	pub merchant_label: String,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl From<CatalogItem> for ItemView {
	fn from(item: CatalogItem) -> Self {
		Self {
			item_id: item.item_id,
			product_code: item.product_code,
			name: item.name,
			description: item.description,
			category: item.category,
			price: item.price,
			stock: item.stock,
			sales_count: item.sales_count,
			keywords: item.keywords,
			image_url: item.image_url,
			merchant_id: item.merchant_id,
			merchant_label: item.merchant_label,
			created_at: item.created_at,
			updated_at: item.updated_at,
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListItemsResponse {
	pub items: Vec<ItemView>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteItemResponse {
	pub item_id: Uuid,
	pub deleted: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MerchantView {
	pub merchant_id: Uuid,
	pub name: String,
	pub shop_name: Option<String>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}
impl From<Merchant> for MerchantView {
	fn from(merchant: Merchant) -> Self {
		Self {
			merchant_id: merchant.merchant_id,
			name: merchant.name,
			shop_name: merchant.shop_name,
			created_at: merchant.created_at,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ListOrder {
	Newest,
	Sales,
	PriceAsc,
	PriceDesc,
	Stock,
}
impl ListOrder {
	fn parse(raw: Option<&str>) -> Result<Self> {
		match raw.map(str::trim).filter(|value| !value.is_empty()) {
			None | Some("newest") => Ok(Self::Newest),
			Some("sales") => Ok(Self::Sales),
			Some("price-asc" | "price" | "priceAsc") => Ok(Self::PriceAsc),
			Some("price-desc" | "priceDesc") => Ok(Self::PriceDesc),
			Some("stock") => Ok(Self::Stock),
			Some(other) => Err(Error::invalid(format!(
				"sort_by must be one of newest, sales, price-asc, price-desc or stock; got {other:?}."
			))),
		}
	}

	fn keys(self) -> Vec<SortKey> {
		let primary = match self {
			Self::Newest => SortKey::desc(SortField::CreatedAt),
			Self::Sales => SortKey::desc(SortField::SalesCount),
			Self::PriceAsc => SortKey::asc(SortField::Price),
			Self::PriceDesc => SortKey::desc(SortField::Price),
			Self::Stock => SortKey::desc(SortField::Stock),
		};

		vec![primary, SortKey::asc(SortField::ItemId)]
	}
}

impl ShopService {
	/// Indexes and stores a new item. A generated product code that collides is regenerated.
	pub async fn create_item(&self, req: CreateItemRequest) -> Result<ItemView> {
		let name = required_text("name", &req.name)?;
		let category = required_text("category", &req.category)?;

		validate_price(req.price)?;
		validate_counter("stock", req.stock)?;
		validate_counter("sales_count", req.sales_count)?;

		let merchant_label = self.merchant_label(req.merchant_id).await?;
		let requested_code = non_blank(req.product_code.as_deref()).map(str::to_string);
		let generated = requested_code.is_none();
		let product_code =
			requested_code.unwrap_or_else(|| generate_product_code(OffsetDateTime::now_utc()));
		let now = OffsetDateTime::now_utc();
		let mut item = CatalogItem {
			item_id: Uuid::new_v4(),
			product_code,
			merchant_id: req.merchant_id,
			merchant_label,
			name,
			description: req.description.trim().to_string(),
			category,
			keywords: req.keywords.trim().to_string(),
			price: req.price,
			stock: req.stock,
			sales_count: req.sales_count,
			image_url: normalize_optional(req.image_url),
			name_ngrams: String::new(),
			name_phonetic: String::new(),
			name_phonetic_initials: String::new(),
			search_tokens: String::new(),
			created_at: now,
			updated_at: now,
		};

		item.set_search_fields(self.search_fields(item.search_source()));

		for attempt in 1..=PRODUCT_CODE_ATTEMPTS {
			match self.store.insert_item(&item).await {
				Ok(()) => break,
				Err(shop_storage::Error::Conflict(_))
					if generated && attempt < PRODUCT_CODE_ATTEMPTS =>
				{
					item.product_code = generate_product_code(OffsetDateTime::now_utc());
				},
				Err(err) => return Err(err.into()),
			}
		}

		tracing::info!(
			item_id = %item.item_id,
			product_code = %item.product_code,
			"Catalog item created."
		);

		Ok(item.into())
	}

	pub async fn get_item(&self, item_id: Uuid) -> Result<ItemView> {
		let item =
			self.store.get_item(item_id).await?.ok_or_else(|| Error::item_not_found(item_id))?;

		Ok(item.into())
	}

	/// Merges the patch over the stored item and recomputes every derived search field from the
	/// merged source fields in the same write.
	pub async fn update_item(&self, item_id: Uuid, req: UpdateItemRequest) -> Result<ItemView> {
		let mut item =
			self.store.get_item(item_id).await?.ok_or_else(|| Error::item_not_found(item_id))?;

		if let Some(name) = req.name.as_deref() {
			item.name = required_text("name", name)?;
		}
		if let Some(category) = req.category.as_deref() {
			item.category = required_text("category", category)?;
		}
		if let Some(description) = req.description {
			item.description = description.trim().to_string();
		}
		if let Some(keywords) = req.keywords {
			item.keywords = keywords.trim().to_string();
		}
		if let Some(price) = req.price {
			validate_price(price)?;

			item.price = price;
		}
		if let Some(stock) = req.stock {
			validate_counter("stock", stock)?;

			item.stock = stock;
		}
		if let Some(sales_count) = req.sales_count {
			validate_counter("sales_count", sales_count)?;

			item.sales_count = sales_count;
		}
		if req.image_url.is_some() {
			item.image_url = normalize_optional(req.image_url);
		}
		if let Some(merchant_id) = req.merchant_id
			&& item.merchant_id != Some(merchant_id)
		{
			item.merchant_label = self.merchant_label(Some(merchant_id)).await?;
			item.merchant_id = Some(merchant_id);
		}

		item.set_search_fields(self.search_fields(item.search_source()));
		item.updated_at = OffsetDateTime::now_utc();

		if !self.store.update_item(&item).await? {
			return Err(Error::item_not_found(item_id));
		}

		tracing::debug!(item_id = %item_id, "Catalog item updated.");

		Ok(item.into())
	}

	pub async fn delete_item(&self, item_id: Uuid) -> Result<DeleteItemResponse> {
		if !self.store.delete_item(item_id).await? {
			return Err(Error::item_not_found(item_id));
		}

		tracing::info!(item_id = %item_id, "Catalog item deleted.");

		Ok(DeleteItemResponse { item_id, deleted: true })
	}

	pub async fn list_items(&self, req: ListItemsRequest) -> Result<ListItemsResponse> {
		let order = ListOrder::parse(req.sort_by.as_deref())?;
		let mut filters = Vec::new();

		if let Some(category) = non_blank(req.category.as_deref()) {
			filters.push(Predicate::equals(TextField::Category, category));
		}
		if let Some(search) = non_blank(req.search.as_deref()) {
			filters.push(strategy::basic_predicate(&shop_domain::query::normalize_query(search)));
		}
		if let Some(merchant) = non_blank(req.merchant.as_deref()) {
			filters.push(Predicate::contains(TextField::MerchantLabel, merchant));
		}

		let items = self.store.find(&Predicate::all(filters), &order.keys()).await?;

		Ok(ListItemsResponse { items: items.into_iter().map(ItemView::from).collect() })
	}

	pub async fn list_by_category(&self, category: &str) -> Result<ListItemsResponse> {
		self.list_items(ListItemsRequest {
			category: Some(required_text("category", category)?),
			sort_by: Some("sales".to_string()),
			..ListItemsRequest::default()
		})
		.await
	}

	pub async fn create_merchant(&self, req: CreateMerchantRequest) -> Result<MerchantView> {
		let merchant = Merchant {
			merchant_id: Uuid::new_v4(),
			name: required_text("name", &req.name)?,
			shop_name: normalize_optional(req.shop_name),
			created_at: OffsetDateTime::now_utc(),
		};

		self.store.insert_merchant(&merchant).await?;

		tracing::info!(merchant_id = %merchant.merchant_id, "Merchant registered.");

		Ok(merchant.into())
	}

	async fn merchant_label(&self, merchant_id: Option<Uuid>) -> Result<String> {
		let Some(merchant_id) = merchant_id else {
			return Ok(String::new());
		};
		let merchant = self
			.store
			.get_merchant(merchant_id)
			.await?
			.ok_or_else(|| Error::invalid(format!("Merchant {merchant_id} does not exist.")))?;

		Ok(merchant.shop_name.unwrap_or(merchant.name))
	}
}

/// `P` followed by the creation time in Unix milliseconds and three random digits.
pub fn generate_product_code(now: OffsetDateTime) -> String {
	let millis = now.unix_timestamp_nanos() / 1_000_000;
	let suffix: u16 = rand::thread_rng().gen_range(0..1_000);

	format!("P{millis}{suffix:03}")
}

fn required_text(field: &str, value: &str) -> Result<String> {
	let trimmed = value.trim();

	if trimmed.is_empty() {
		return Err(Error::invalid(format!("{field} must not be empty.")));
	}

	Ok(trimmed.to_string())
}

fn validate_price(price: f64) -> Result<()> {
	if !price.is_finite() || price < 0.0 {
		return Err(Error::invalid("price must be a finite, non-negative number."));
	}

	Ok(())
}

fn validate_counter(field: &str, value: i64) -> Result<()> {
	if value < 0 {
		return Err(Error::invalid(format!("{field} must not be negative.")));
	}

	Ok(())
}

fn normalize_optional(value: Option<String>) -> Option<String> {
	value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|value| !value.is_empty())
}
