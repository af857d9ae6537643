use sqlx::{FromRow, Postgres, QueryBuilder, Row, postgres::PgRow};
use shop_domain::search_fields::SearchFields;
use uuid::Uuid;

use crate::{
	Error, Result,
	db::Db,
	models::{CatalogItem, Merchant, MerchantSummary, PipelineRow, SuggestionRow},
	pipeline::{Pipeline, Predicate, SortKey, Stage, SuggestionPipeline},
	sql::{self, SqlPlan},
};

pub async fn insert_item(db: &Db, item: &CatalogItem) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO catalog_items (
	item_id,
	product_code,
	merchant_id,
	merchant_label,
	name,
	description,
	category,
	keywords,
	price,
	stock,
	sales_count,
	image_url,
	name_ngrams,
	name_phonetic,
	name_phonetic_initials,
	search_tokens,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
	)
	.bind(item.item_id)
	.bind(item.product_code.as_str())
	.bind(item.merchant_id)
	.bind(item.merchant_label.as_str())
	.bind(item.name.as_str())
	.bind(item.description.as_str())
	.bind(item.category.as_str())
	.bind(item.keywords.as_str())
	.bind(item.price)
	.bind(item.stock)
	.bind(item.sales_count)
	.bind(item.image_url.as_deref())
	.bind(item.name_ngrams.as_str())
	.bind(item.name_phonetic.as_str())
	.bind(item.name_phonetic_initials.as_str())
	.bind(item.search_tokens.as_str())
	.bind(item.created_at)
	.bind(item.updated_at)
	.execute(&db.pool)
	.await
	.map_err(Error::from_write)?;

	Ok(())
}

pub async fn get_item(db: &Db, item_id: Uuid) -> Result<Option<CatalogItem>> {
	let item = sqlx::query_as::<_, CatalogItem>("SELECT * FROM catalog_items WHERE item_id = $1")
		.bind(item_id)
		.fetch_optional(&db.pool)
		.await?;

	Ok(item)
}

pub async fn update_item(db: &Db, item: &CatalogItem) -> Result<bool> {
	let result = sqlx::query(
		"\
UPDATE catalog_items
SET
	product_code = $2,
	merchant_id = $3,
	merchant_label = $4,
	name = $5,
	description = $6,
	category = $7,
	keywords = $8,
	price = $9,
	stock = $10,
	sales_count = $11,
	image_url = $12,
	name_ngrams = $13,
	name_phonetic = $14,
	name_phonetic_initials = $15,
	search_tokens = $16,
	updated_at = $17
WHERE item_id = $1",
	)
	.bind(item.item_id)
	.bind(item.product_code.as_str())
	.bind(item.merchant_id)
	.bind(item.merchant_label.as_str())
	.bind(item.name.as_str())
	.bind(item.description.as_str())
	.bind(item.category.as_str())
	.bind(item.keywords.as_str())
	.bind(item.price)
	.bind(item.stock)
	.bind(item.sales_count)
	.bind(item.image_url.as_deref())
	.bind(item.name_ngrams.as_str())
	.bind(item.name_phonetic.as_str())
	.bind(item.name_phonetic_initials.as_str())
	.bind(item.search_tokens.as_str())
	.bind(item.updated_at)
	.execute(&db.pool)
	.await
	.map_err(Error::from_write)?;

	Ok(result.rows_affected() > 0)
}

pub async fn write_search_fields(db: &Db, item_id: Uuid, fields: &SearchFields) -> Result<bool> {
	let result = sqlx::query(
		"\
UPDATE catalog_items
SET
	name_ngrams = $2,
	name_phonetic = $3,
	name_phonetic_initials = $4,
	search_tokens = $5
WHERE item_id = $1",
	)
	.bind(item_id)
	.bind(fields.name_ngrams.as_str())
	.bind(fields.name_phonetic.as_str())
	.bind(fields.name_phonetic_initials.as_str())
	.bind(fields.search_tokens.as_str())
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn delete_item(db: &Db, item_id: Uuid) -> Result<bool> {
	let result = sqlx::query("DELETE FROM catalog_items WHERE item_id = $1")
		.bind(item_id)
		.execute(&db.pool)
		.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn list_items(db: &Db) -> Result<Vec<CatalogItem>> {
	let items = sqlx::query_as::<_, CatalogItem>(
		"SELECT * FROM catalog_items ORDER BY created_at ASC, item_id ASC",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(items)
}

pub async fn insert_merchant(db: &Db, merchant: &Merchant) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO merchants (merchant_id, name, shop_name, created_at)
VALUES ($1, $2, $3, $4)",
	)
	.bind(merchant.merchant_id)
	.bind(merchant.name.as_str())
	.bind(merchant.shop_name.as_deref())
	.bind(merchant.created_at)
	.execute(&db.pool)
	.await
	.map_err(Error::from_write)?;

	Ok(())
}

pub async fn get_merchant(db: &Db, merchant_id: Uuid) -> Result<Option<Merchant>> {
	let merchant =
		sqlx::query_as::<_, Merchant>("SELECT * FROM merchants WHERE merchant_id = $1")
			.bind(merchant_id)
			.fetch_optional(&db.pool)
			.await?;

	Ok(merchant)
}

pub async fn find(db: &Db, predicate: &Predicate, sort: &[SortKey]) -> Result<Vec<CatalogItem>> {
	let mut qb = QueryBuilder::<Postgres>::new("");

	sql::push_find(&mut qb, predicate, sort);

	let items = qb.build_query_as::<CatalogItem>().fetch_all(&db.pool).await?;

	Ok(items)
}

pub async fn aggregate(db: &Db, pipeline: &Pipeline) -> Result<Vec<PipelineRow>> {
	let plan = SqlPlan::from_stages(&pipeline.stages)?;
	let mut qb = QueryBuilder::<Postgres>::new("");

	sql::push_pipeline_select(&mut qb, &plan);

	let rows = qb.build().fetch_all(&db.pool).await?;

	rows.iter().map(pipeline_row).collect()
}

pub async fn count(db: &Db, pipeline: &Pipeline) -> Result<u64> {
	let Some((Stage::Count, stages)) = pipeline.stages.split_last() else {
		return Err(Error::InvalidArgument(
			"Count pipeline must end with a count stage.".to_string(),
		));
	};
	let plan = SqlPlan::from_stages(stages)?;
	let mut qb = QueryBuilder::<Postgres>::new("");

	sql::push_count(&mut qb, &plan);

	let total: i64 = qb.build_query_scalar().fetch_one(&db.pool).await?;

	Ok(u64::try_from(total).unwrap_or(0))
}

pub async fn suggest(db: &Db, pipeline: &SuggestionPipeline) -> Result<Vec<SuggestionRow>> {
	let mut qb = QueryBuilder::<Postgres>::new("");

	sql::push_suggestions(&mut qb, pipeline);

	let rows = qb.build_query_as::<SuggestionRow>().fetch_all(&db.pool).await?;

	Ok(rows)
}

fn pipeline_row(row: &PgRow) -> Result<PipelineRow> {
	let item = CatalogItem::from_row(row)?;
	let relevance_score: Option<f64> = row.try_get("relevance_score")?;
	let merchant_ref: Option<Uuid> = row.try_get("merchant_ref")?;
	let merchant = match merchant_ref {
		Some(merchant_id) => Some(MerchantSummary {
			merchant_id,
			name: row.try_get("merchant_name")?,
			shop_name: row.try_get("merchant_shop_name")?,
		}),
		None => None,
	};

	Ok(PipelineRow { item, relevance_score, merchant })
}
