use serde::Serialize;
use shop_domain::search_fields::{SearchFields, SearchSource};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct CatalogItem {
	pub item_id: Uuid,
	pub product_code: String,
	pub merchant_id: Option<Uuid>,
	pub merchant_label: String,
	pub name: String,
	pub description: String,
	pub category: String,
	pub keywords: String,
	pub price: f64,
	pub stock: i64,
	pub sales_count: i64,
	pub image_url: Option<String>,
	pub name_ngrams: String,
	pub name_phonetic: String,
	pub name_phonetic_initials: String,
	pub search_tokens: String,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl CatalogItem {
	pub fn search_source(&self) -> SearchSource<'_> {
		SearchSource {
			name: &self.name,
			description: &self.description,
			category: &self.category,
			keywords: &self.keywords,
		}
	}

	pub fn search_fields(&self) -> SearchFields {
		SearchFields {
			name_ngrams: self.name_ngrams.clone(),
			name_phonetic: self.name_phonetic.clone(),
			name_phonetic_initials: self.name_phonetic_initials.clone(),
			search_tokens: self.search_tokens.clone(),
		}
	}

	pub fn set_search_fields(&mut self, fields: SearchFields) {
		self.name_ngrams = fields.name_ngrams;
		self.name_phonetic = fields.name_phonetic;
		self.name_phonetic_initials = fields.name_phonetic_initials;
		self.search_tokens = fields.search_tokens;
	}
}

#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Merchant {
	pub merchant_id: Uuid,
	pub name: String,
	pub shop_name: Option<String>,
	pub created_at: OffsetDateTime,
}

/// Reduced merchant projection joined into pipeline results.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MerchantSummary {
	pub merchant_id: Uuid,
	pub name: String,
	pub shop_name: Option<String>,
}
impl From<&Merchant> for MerchantSummary {
	fn from(merchant: &Merchant) -> Self {
		Self {
			merchant_id: merchant.merchant_id,
			name: merchant.name.clone(),
			shop_name: merchant.shop_name.clone(),
		}
	}
}

/// One row produced by a pipeline: the item, its score when a score stage ran, and the merchant
/// when a lookup stage ran and the reference resolved.
#[derive(Clone, Debug)]
pub struct PipelineRow {
	pub item: CatalogItem,
	pub relevance_score: Option<f64>,
	pub merchant: Option<MerchantSummary>,
}

#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct SuggestionRow {
	pub text: String,
	pub category: String,
	#[sqlx(rename = "item_count")]
	pub count: i64,
	#[sqlx(rename = "match_position")]
	pub position: Option<i64>,
}
