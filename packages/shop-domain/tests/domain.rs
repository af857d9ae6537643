use shop_domain::{
	ngram,
	phonetic::PhoneticTable,
	search_fields::{SearchSource, compute_search_fields},
};

fn table() -> PhoneticTable {
	PhoneticTable::builtin().expect("Built-in table must parse.")
}

fn headphones() -> SearchSource<'static> {
	SearchSource {
		name: "无线降噪耳机",
		description: "主动降噪 蓝牙5.3",
		category: "数码",
		keywords: "earphones anc",
	}
}

#[test]
fn search_fields_for_headphones() {
	let fields = compute_search_fields(&table(), headphones());

	assert_eq!(fields.name_phonetic, "wu xian jiang zao er ji");
	assert_eq!(fields.name_phonetic_initials, "wxjzej");

	let name_grams = fields.name_ngrams.split(' ').collect::<Vec<_>>();

	assert!(name_grams.contains(&"耳机"));
	assert!(name_grams.contains(&"无线"));
	assert!(name_grams.contains(&"无线降噪耳机"));

	let tokens = fields.search_tokens.split(' ').collect::<Vec<_>>();

	assert!(tokens.contains(&"wuxianjiangzaoerji"));
	assert!(tokens.contains(&"earphones"));
	assert!(tokens.contains(&"数码"));
	assert!(fields.search_tokens.contains("erji"));
}

#[test]
fn recomputing_is_idempotent() {
	let table = table();
	let first = compute_search_fields(&table, headphones());
	let second = compute_search_fields(&table, headphones());

	assert_eq!(first, second);
}

#[test]
fn name_fields_only_depend_on_name() {
	let table = table();
	let base = compute_search_fields(&table, headphones());
	let changed = compute_search_fields(
		&table,
		SearchSource { description: "全新描述", keywords: "", ..headphones() },
	);

	assert_eq!(base.name_ngrams, changed.name_ngrams);
	assert_eq!(base.name_phonetic, changed.name_phonetic);
	assert_eq!(base.name_phonetic_initials, changed.name_phonetic_initials);
	assert_ne!(base.search_tokens, changed.search_tokens);
}

#[test]
fn unmapped_names_produce_empty_phonetic_fields() {
	let fields = compute_search_fields(
		&table(),
		SearchSource { name: "龘", description: "", category: "", keywords: "" },
	);

	assert_eq!(fields.name_phonetic, "");
	assert_eq!(fields.name_phonetic_initials, "");
	assert_eq!(fields.name_ngrams, "龘");
}

#[test]
fn ngram_coverage_holds_for_mixed_scripts() {
	for text in ["Sony WH-1000XM5 耳机", "北欧风 Sofa", "ab"] {
		for n in [2, 3] {
			let grams = ngram::ngrams(text, n);
			let chars = text.to_lowercase().chars().collect::<Vec<_>>();

			for window in chars.windows(n) {
				let gram = window.iter().collect::<String>();

				assert!(grams.contains(&gram), "Missing {gram:?} for {text:?} n={n}.");
			}
		}
	}
}
