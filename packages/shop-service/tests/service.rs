use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use uuid::Uuid;

use shop_config::{Config, Ranking, Search, Security, Service, Storage};
use shop_domain::search_fields::compute_search_fields;
use shop_service::{
	CreateItemRequest, CreateMerchantRequest, Error, ItemView, ListItemsRequest, SearchRequest,
	ShopService, Suggestion, SuggestionsRequest, UpdateItemRequest,
};
use shop_storage::{CatalogStore, memory::MemoryCatalog};

static CODES: AtomicUsize = AtomicUsize::new(0);

fn test_config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			admin_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		storage: Storage { backend: "memory".to_string(), postgres: None },
		search: Search::default(),
		ranking: Ranking::default(),
		security: Security { bind_localhost_only: true },
	}
}

fn service() -> ShopService {
	ShopService::new(test_config(), Arc::new(MemoryCatalog::new()))
		.expect("Failed to build service.")
}

fn item(name: &str, category: &str, stock: i64, sales_count: i64) -> CreateItemRequest {
	CreateItemRequest {
		name: name.to_string(),
		description: String::new(),
		category: category.to_string(),
		price: 99.0,
		stock,
		sales_count,
		keywords: String::new(),
		image_url: None,
		merchant_id: None,
		product_code: Some(format!("T{:06}", CODES.fetch_add(1, Ordering::Relaxed))),
	}
}

fn search(q: &str) -> SearchRequest {
	SearchRequest { q: q.to_string(), ..SearchRequest::default() }
}

fn ids(items: &[ItemView]) -> Vec<Uuid> {
	items.iter().map(|item| item.item_id).collect()
}

#[tokio::test]
async fn headphone_is_found_by_hanzi_and_transliteration() {
	let service = service();
	let created = service
		.create_item(CreateItemRequest {
			description: "主动降噪蓝牙耳机".to_string(),
			price: 399.0,
			..item("无线降噪耳机", "数码", 100, 450)
		})
		.await
		.expect("Failed to create item.");
	let by_hanzi = service.search(search("耳机")).await.expect("Search failed.");

	assert_eq!(by_hanzi.items.len(), 1);
	assert_eq!(by_hanzi.items[0].item.item_id, created.item_id);
	assert!(by_hanzi.items[0].relevance_score > 0.0);
	assert_eq!(by_hanzi.pagination.total, 1);
	assert_eq!(by_hanzi.meta.strategy, "multi");
	assert_eq!(by_hanzi.meta.scoring, "native");

	let by_phonetic = service.search(search("erji")).await.expect("Search failed.");

	assert_eq!(by_phonetic.items.len(), 1);
	assert_eq!(by_phonetic.items[0].item.item_id, created.item_id);

	let missing = service.search(search("xyz_nonexistent")).await.expect("Search failed.");

	assert!(missing.items.is_empty());
	assert_eq!(missing.pagination.total, 0);
	assert_eq!(missing.pagination.total_pages, 0);
}

#[tokio::test]
async fn consecutive_pages_match_one_larger_page() {
	let service = service();

	for index in 0..12 {
		service
			.create_item(item(&format!("耳机 型号{index}"), "数码", 10, (index % 4) * 100))
			.await
			.expect("Failed to create item.");
	}

	let page = |page: u64, limit: u64| SearchRequest {
		page: Some(page),
		limit: Some(limit),
		..search("耳机")
	};
	let first = service.search(page(1, 5)).await.expect("Search failed.");
	let second = service.search(page(2, 5)).await.expect("Search failed.");
	let combined = service.search(page(1, 10)).await.expect("Search failed.");
	let mut stitched = first.items.iter().map(|hit| hit.item.item_id).collect::<Vec<_>>();

	stitched.extend(second.items.iter().map(|hit| hit.item.item_id));

	assert_eq!(stitched, combined.items.iter().map(|hit| hit.item.item_id).collect::<Vec<_>>());
	assert_eq!(first.pagination.total, 12);
	assert_eq!(first.pagination.total_pages, 3);
	assert_eq!(second.pagination.page, 2);
}

#[tokio::test]
async fn exact_name_outranks_substring_name() {
	let service = service();
	let exact = service.create_item(item("Lamp", "Home", 5, 0)).await.expect("create");
	let contains = service.create_item(item("Desk Lamp Pro", "Home", 5, 0)).await.expect("create");
	let response = service.search(search("lamp")).await.expect("Search failed.");
	let score_of = |item_id: Uuid| {
		response
			.items
			.iter()
			.find(|hit| hit.item.item_id == item_id)
			.map(|hit| hit.relevance_score)
			.expect("Item missing from results.")
	};

	assert!(score_of(exact.item_id) > score_of(contains.item_id));
	assert_eq!(response.items[0].item.item_id, exact.item_id);
}

#[tokio::test]
async fn out_of_stock_items_lose_points() {
	let service = service();
	let stocked = service.create_item(item("蓝牙音箱 A", "数码", 10, 0)).await.expect("create");
	let sold_out = service.create_item(item("蓝牙音箱 B", "数码", 0, 0)).await.expect("create");
	let response = service.search(search("蓝牙音箱")).await.expect("Search failed.");

	assert_eq!(response.items.len(), 2);
	assert_eq!(response.items[0].item.item_id, stocked.item_id);
	assert_eq!(response.items[1].item.item_id, sold_out.item_id);
	assert!(
		(response.items[0].relevance_score - response.items[1].relevance_score - 30.0).abs()
			< 1e-9
	);
}

#[tokio::test]
async fn suggestions_group_duplicate_names() {
	let service = service();

	for name in ["无线耳机", "无线耳机", "有线耳机"] {
		service.create_item(item(name, "数码", 10, 0)).await.expect("Failed to create item.");
	}

	let response = service
		.suggestions(SuggestionsRequest { q: Some("耳机".to_string()), ..Default::default() })
		.await
		.expect("Suggestions failed.");

	assert_eq!(response.suggestions.len(), 2);
	assert_eq!(
		response.suggestions[0],
		Suggestion { text: "无线耳机".to_string(), category: "数码".to_string(), count: 2 }
	);
	assert_eq!(response.suggestions[1].count, 1);

	let blank = service
		.suggestions(SuggestionsRequest { q: Some("  ".to_string()), ..Default::default() })
		.await
		.expect("Blank suggestions must not fail.");

	assert!(blank.suggestions.is_empty());
}

#[tokio::test]
async fn partial_update_recomputes_search_fields() {
	let service = service();
	let created = service
		.create_item(CreateItemRequest { price: 59.0, ..item("无线耳机", "数码", 3, 7) })
		.await
		.expect("Failed to create item.");
	let updated = service
		.update_item(
			created.item_id,
			UpdateItemRequest { name: Some("台灯".to_string()), ..Default::default() },
		)
		.await
		.expect("Failed to update item.");

	assert_eq!(updated.name, "台灯");
	assert_eq!(updated.category, "数码");
	assert_eq!(updated.price, 59.0);
	assert_eq!(updated.created_at, created.created_at);

	let stored = service
		.store
		.get_item(created.item_id)
		.await
		.expect("Store read failed.")
		.expect("Item must exist.");

	assert_eq!(stored.name_phonetic, "tai deng");
	assert_eq!(stored.name_phonetic_initials, "td");
	assert!(service.search(search("erji")).await.expect("Search failed.").items.is_empty());
	assert_eq!(service.search(search("taideng")).await.expect("Search failed.").items.len(), 1);
}

#[tokio::test]
async fn price_only_update_keeps_search_fields() {
	let service = service();
	let created = service
		.create_item(CreateItemRequest {
			description: "主动降噪蓝牙耳机".to_string(),
			keywords: "蓝牙 降噪".to_string(),
			..item("无线降噪耳机", "数码", 8, 40)
		})
		.await
		.expect("Failed to create item.");
	let read = || async {
		service
			.store
			.get_item(created.item_id)
			.await
			.expect("Store read failed.")
			.expect("Item must exist.")
	};
	let before = read().await.search_fields();

	service
		.update_item(
			created.item_id,
			UpdateItemRequest { price: Some(129.5), ..Default::default() },
		)
		.await
		.expect("Failed to update item.");

	let stored = read().await;

	assert_eq!(stored.price, 129.5);
	assert_eq!(stored.search_fields(), before);
	assert_eq!(
		stored.search_fields(),
		compute_search_fields(&service.phonetic, stored.search_source())
	);
}

#[tokio::test]
async fn alphanumeric_queries_earn_phonetic_points() {
	let service = service();
	let monitor = service
		.create_item(item("4K显示器", "数码", 6, 0))
		.await
		.expect("Failed to create item.");

	for query in ["4kxsq", "4kxian"] {
		let response = service.search(search(query)).await.expect("Search failed.");

		assert_eq!(response.pagination.total, 1, "query {query}");
		assert_eq!(response.items[0].item.item_id, monitor.item_id);
		assert!(response.items[0].relevance_score > 0.0, "query {query}");
	}
}

#[tokio::test]
async fn reindexing_is_idempotent() {
	let service = service();
	let created = service.create_item(item("降噪耳机", "数码", 1, 1)).await.expect("create");

	service.create_item(item("台灯", "家居", 1, 1)).await.expect("create");
	service.create_item(item("收纳盒", "家居", 1, 1)).await.expect("create");

	let before = service
		.store
		.get_item(created.item_id)
		.await
		.expect("Store read failed.")
		.expect("Item must exist.")
		.search_fields();
	let single = service.reindex_item(created.item_id).await.expect("Reindex failed.");
	let report = service.reindex_all().await.expect("Bulk reindex failed.");
	let again = service.reindex_all().await.expect("Bulk reindex failed.");

	assert_eq!(single.search_fields, before);
	assert_eq!(report.total, 3);
	assert_eq!(again, report);
}

#[tokio::test]
async fn unknown_items_are_not_found() {
	let service = service();
	let missing = Uuid::new_v4();

	assert!(matches!(service.reindex_item(missing).await, Err(Error::NotFound { .. })));
	assert!(matches!(service.get_item(missing).await, Err(Error::NotFound { .. })));
	assert!(matches!(service.delete_item(missing).await, Err(Error::NotFound { .. })));
	assert!(matches!(
		service.update_item(missing, UpdateItemRequest::default()).await,
		Err(Error::NotFound { .. })
	));
}

#[tokio::test]
async fn blank_queries_are_rejected() {
	let service = service();

	assert!(matches!(service.search(search("   ")).await, Err(Error::EmptyQuery)));
	assert!(matches!(service.basic_search("").await, Err(Error::EmptyQuery)));
}

#[tokio::test]
async fn malformed_search_requests_are_rejected() {
	let service = service();
	let cases = [
		SearchRequest { page: Some(0), ..search("耳机") },
		SearchRequest { limit: Some(0), ..search("耳机") },
		SearchRequest { min_price: Some(50.0), max_price: Some(10.0), ..search("耳机") },
		SearchRequest { strategy: Some("fuzzy".to_string()), ..search("耳机") },
		SearchRequest { sort_by: Some("random".to_string()), ..search("耳机") },
	];

	for case in cases {
		assert!(matches!(service.search(case).await, Err(Error::InvalidRequest { .. })));
	}
}

#[tokio::test]
async fn highlighting_treats_query_as_literal_text() {
	let service = service();

	service
		.create_item(CreateItemRequest {
			description: "Learn c++ fast.".to_string(),
			..item("C++ Primer (5th)", "Books", 4, 0)
		})
		.await
		.expect("Failed to create item.");

	let response = service.search(search("c++")).await.expect("Search failed.");

	assert_eq!(response.items.len(), 1);
	assert_eq!(
		response.items[0].name_highlighted,
		"<mark class=\"search-highlight\">C++</mark> Primer (5th)"
	);
	assert_eq!(
		response.items[0].description_highlighted,
		"Learn <mark class=\"search-highlight\">c++</mark> fast."
	);

	let metacharacters = service.search(search(".*+?")).await.expect("Search failed.");

	assert_eq!(metacharacters.pagination.total, 0);
}

#[tokio::test]
async fn explain_returns_the_executed_pipeline() {
	let service = service();

	service.create_item(item("台灯", "家居", 1, 1)).await.expect("create");

	let plain = service.search(search("台灯")).await.expect("Search failed.");
	let explained = service
		.search(SearchRequest { explain: true, ..search("台灯") })
		.await
		.expect("Search failed.");
	let body = serde_json::to_value(&explained).expect("Response must serialize.");

	assert!(plain.pipeline.is_none());
	assert!(body["pipeline"]["stages"].is_array());
	assert_eq!(body["meta"]["policy_version"], "2024-06-native");
}

#[tokio::test]
async fn basic_search_and_listing_order_by_sales() {
	let service = service();
	let merchant = service
		.create_merchant(CreateMerchantRequest {
			name: "Acme".to_string(),
			shop_name: Some("Acme 数码旗舰店".to_string()),
		})
		.await
		.expect("Failed to create merchant.");
	let slow = service.create_item(item("有线耳机", "数码", 5, 10)).await.expect("create");
	let fast = service
		.create_item(CreateItemRequest {
			merchant_id: Some(merchant.merchant_id),
			..item("无线耳机", "数码", 5, 900)
		})
		.await
		.expect("Failed to create item.");

	service.create_item(item("台灯", "家居", 5, 5000)).await.expect("create");

	let basic = service.basic_search("耳机").await.expect("Basic search failed.");

	assert_eq!(ids(&basic.items), vec![fast.item_id, slow.item_id]);
	assert_eq!(fast.merchant_label, "Acme 数码旗舰店");

	let by_merchant = service
		.list_items(ListItemsRequest {
			merchant: Some("旗舰".to_string()),
			..ListItemsRequest::default()
		})
		.await
		.expect("Listing failed.");

	assert_eq!(ids(&by_merchant.items), vec![fast.item_id]);

	let by_category = service.list_by_category("数码").await.expect("Listing failed.");

	assert_eq!(ids(&by_category.items), vec![fast.item_id, slow.item_id]);

	let orphan = service
		.create_item(CreateItemRequest { merchant_id: Some(Uuid::new_v4()), ..item("x", "y", 0, 0) })
		.await;

	assert!(matches!(orphan, Err(Error::InvalidRequest { .. })));
}
