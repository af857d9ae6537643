use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::{Table, Value};

use shop_config::{Config, Error, RankingWeights};

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn sample_table() -> Table {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.")
}

fn section<'a>(root: &'a mut Table, path: &[&str]) -> &'a mut Table {
	let mut current = root;

	for key in path {
		current = current
			.get_mut(*key)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Sample config must include [{key}]."));
	}

	current
}

fn render(table: &Table) -> String {
	toml::to_string(table).expect("Failed to render sample config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("shop_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_str(payload: String) -> shop_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = shop_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation(payload: String, needle: &str) {
	let err = load_str(payload).expect_err("Expected validation error.");

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error: {err:?}");

	let message = err.to_string();

	assert!(message.contains(needle), "Unexpected error message: {message}");
}

#[test]
fn sample_config_loads() {
	let cfg = load_str(SAMPLE_CONFIG_TOML.to_string()).expect("Sample config must load.");

	assert_eq!(cfg.storage.backend, "postgres");
	assert_eq!(cfg.search.default_strategy, "multi");
	assert_eq!(cfg.ranking.native, RankingWeights::native());
	assert_eq!(cfg.ranking.basic, RankingWeights::basic());
	assert_eq!(cfg.search.highlight.post_tag, "</mark>");
}

#[test]
fn search_and_ranking_sections_are_optional() {
	let mut table = sample_table();

	table.remove("search");
	table.remove("ranking");

	let cfg = load_str(render(&table)).expect("Config without search/ranking must load.");

	assert_eq!(cfg.search.default_limit, 20);
	assert_eq!(cfg.search.suggestions.default_limit, 10);
	assert_eq!(cfg.ranking.default_profile, "native");
}

#[test]
fn partial_weight_tables_keep_profile_presets() {
	let mut table = sample_table();
	let ranking = section(&mut table, &["ranking"]);
	let mut native = Table::new();
	let mut basic = Table::new();

	native.insert("name_exact".to_string(), Value::Float(120.0));
	basic.insert("keywords".to_string(), Value::Float(8.0));
	ranking.insert("native".to_string(), Value::Table(native));
	ranking.insert("basic".to_string(), Value::Table(basic));

	let cfg = load_str(render(&table)).expect("Partial weight tables must load.");

	assert_eq!(cfg.ranking.native, RankingWeights { name_exact: 120.0, ..RankingWeights::native() });
	assert_eq!(cfg.ranking.basic, RankingWeights { keywords: 8.0, ..RankingWeights::basic() });
}

#[test]
fn postgres_backend_requires_postgres_section() {
	let mut table = sample_table();

	section(&mut table, &["storage"]).remove("postgres");

	expect_validation(render(&table), "storage.postgres is required");
}

#[test]
fn memory_backend_needs_no_postgres_section() {
	let mut table = sample_table();
	let storage = section(&mut table, &["storage"]);

	storage.remove("postgres");
	storage.insert("backend".to_string(), Value::String(" Memory ".to_string()));

	let cfg = load_str(render(&table)).expect("Memory backend must load.");

	assert_eq!(cfg.storage.backend, "memory");
}

#[test]
fn unknown_backend_is_rejected() {
	let mut table = sample_table();

	section(&mut table, &["storage"])
		.insert("backend".to_string(), Value::String("mongodb".to_string()));

	expect_validation(render(&table), "storage.backend must be one of postgres or memory.");
}

#[test]
fn unknown_strategy_is_rejected() {
	let mut table = sample_table();

	section(&mut table, &["search"])
		.insert("default_strategy".to_string(), Value::String("fuzzy".to_string()));

	expect_validation(render(&table), "search.default_strategy must be one of");
}

#[test]
fn max_limit_below_default_is_rejected() {
	let mut table = sample_table();

	section(&mut table, &["search"]).insert("max_limit".to_string(), Value::Integer(5));

	expect_validation(render(&table), "search.max_limit must be greater than or equal to");
}

#[test]
fn positive_stock_penalty_is_rejected() {
	let mut table = sample_table();

	section(&mut table, &["ranking", "native"])
		.insert("out_of_stock_penalty".to_string(), Value::Float(5.0));

	expect_validation(render(&table), "ranking.native.out_of_stock_penalty must be zero or less.");
}

#[test]
fn name_tiers_must_be_ordered() {
	let mut table = sample_table();

	section(&mut table, &["ranking", "native"])
		.insert("name_contains".to_string(), Value::Float(90.0));

	expect_validation(render(&table), "ranking.native name tiers must be ordered");
}

#[test]
fn unknown_profile_is_rejected() {
	let mut table = sample_table();

	section(&mut table, &["ranking"])
		.insert("default_profile".to_string(), Value::String("fancy".to_string()));

	expect_validation(render(&table), "ranking.default_profile must be one of native or basic.");
}

#[test]
fn missing_file_reports_path() {
	let path = env::temp_dir().join("shop_config_test_missing.toml");
	let err = shop_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}
