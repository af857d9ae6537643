use axum::{
	Json, Router,
	extract::{
		Path, Query, State,
		rejection::{JsonRejection, PathRejection, QueryRejection},
	},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;
use shop_service::{
	BasicSearchResponse, CreateItemRequest, CreateMerchantRequest, DeleteItemResponse, Error,
	ItemView, ListItemsRequest, ListItemsResponse, MerchantView, ReindexItemResponse,
	ReindexReport, SearchRequest, SearchResponse, SuggestionsRequest, SuggestionsResponse,
	UpdateItemRequest,
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/products", get(list_items).post(create_item))
		.route("/v1/products/category/{category}", get(list_by_category))
		.route("/v1/products/search", get(basic_search))
		.route("/v1/products/search/advanced", get(search))
		.route("/v1/products/search/suggestions", get(suggestions))
		.route("/v1/products/{item_id}", get(get_item).patch(update_item).delete(delete_item))
		.route("/v1/products/{item_id}/reindex", post(reindex_item))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/v1/admin/products/reindex", post(reindex_all))
		.route("/v1/admin/merchants", post(create_merchant))
		.with_state(state)
}

#[derive(Debug, Deserialize)]
struct BasicSearchQuery {
	#[serde(default)]
	q: String,
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn list_items(
	State(state): State<AppState>,
	query: Result<Query<ListItemsRequest>, QueryRejection>,
) -> Result<Json<ListItemsResponse>, ApiError> {
	let Query(req) = query?;

	Ok(Json(state.service.list_items(req).await?))
}

async fn list_by_category(
	State(state): State<AppState>,
	path: Result<Path<String>, PathRejection>,
) -> Result<Json<ListItemsResponse>, ApiError> {
	let Path(category) = path?;

	Ok(Json(state.service.list_by_category(&category).await?))
}

async fn basic_search(
	State(state): State<AppState>,
	query: Result<Query<BasicSearchQuery>, QueryRejection>,
) -> Result<Json<BasicSearchResponse>, ApiError> {
	let Query(BasicSearchQuery { q }) = query?;

	Ok(Json(state.service.basic_search(&q).await?))
}

async fn search(
	State(state): State<AppState>,
	query: Result<Query<SearchRequest>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
	let Query(req) = query?;

	Ok(Json(state.service.search(req).await?))
}

async fn suggestions(
	State(state): State<AppState>,
	query: Result<Query<SuggestionsRequest>, QueryRejection>,
) -> Result<Json<SuggestionsResponse>, ApiError> {
	let Query(req) = query?;

	Ok(Json(state.service.suggestions(req).await?))
}

async fn get_item(
	State(state): State<AppState>,
	path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ItemView>, ApiError> {
	let Path(item_id) = path?;

	Ok(Json(state.service.get_item(item_id).await?))
}

async fn create_item(
	State(state): State<AppState>,
	payload: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ItemView>), ApiError> {
	let Json(req) = payload?;
	let item = state.service.create_item(req).await?;

	Ok((StatusCode::CREATED, Json(item)))
}

async fn update_item(
	State(state): State<AppState>,
	path: Result<Path<Uuid>, PathRejection>,
	payload: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Json<ItemView>, ApiError> {
	let Path(item_id) = path?;
	let Json(req) = payload?;

	Ok(Json(state.service.update_item(item_id, req).await?))
}

async fn delete_item(
	State(state): State<AppState>,
	path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DeleteItemResponse>, ApiError> {
	let Path(item_id) = path?;

	Ok(Json(state.service.delete_item(item_id).await?))
}

async fn reindex_item(
	State(state): State<AppState>,
	path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ReindexItemResponse>, ApiError> {
	let Path(item_id) = path?;

	Ok(Json(state.service.reindex_item(item_id).await?))
}

async fn reindex_all(State(state): State<AppState>) -> Result<Json<ReindexReport>, ApiError> {
	Ok(Json(state.service.reindex_all().await?))
}

async fn create_merchant(
	State(state): State<AppState>,
	payload: Result<Json<CreateMerchantRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MerchantView>), ApiError> {
	let Json(req) = payload?;
	let merchant = state.service.create_merchant(req).await?;

	Ok((StatusCode::CREATED, Json(merchant)))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(status: StatusCode, error_code: &str, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.to_string(), message: message.into(), fields: None }
	}

	fn invalid_request(message: impl Into<String>) -> Self {
		Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::EmptyQuery => Self {
				fields: Some(vec!["q".to_string()]),
				..Self::new(StatusCode::BAD_REQUEST, "empty_query", Error::EmptyQuery.to_string())
			},
			Error::InvalidRequest { message } => Self::invalid_request(message),
			Error::NotFound { message } => Self::new(StatusCode::NOT_FOUND, "not_found", message),
			Error::Conflict { message } => Self::new(StatusCode::CONFLICT, "conflict", message),
			Error::Storage { message } => {
				tracing::error!(error = %message, "Catalog store request failed.");

				Self::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"storage_error",
					"Catalog store request failed.",
				)
			},
			Error::PhoneticTable(inner) => Self::new(
				StatusCode::INTERNAL_SERVER_ERROR,
				"internal_error",
				inner.to_string(),
			),
		}
	}
}

impl From<QueryRejection> for ApiError {
	fn from(rejection: QueryRejection) -> Self {
		Self::invalid_request(rejection.body_text())
	}
}

impl From<PathRejection> for ApiError {
	fn from(rejection: PathRejection) -> Self {
		Self::invalid_request(rejection.body_text())
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		Self::invalid_request(rejection.body_text())
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}
