//! Compiles the pipeline IR into Postgres SQL.
//!
//! Regex predicates map onto `~*`, which accepts every pattern the builders emit (escaped
//! literals, `.*`, `^`, `$` and ` ?`). Items are always aliased `i`, merchants `m`.

use sqlx::{Postgres, QueryBuilder};

use crate::{
	Error, Result,
	pipeline::{
		Direction, Predicate, ScoreExpr, ScoreTerm, SortField, SortKey, Stage, SuggestionPipeline,
		SuggestionRank,
	},
};

/// Canonical `filter → score → sort → skip → limit` shape of a pipeline, plus the join flag.
#[derive(Debug, Default)]
pub(crate) struct SqlPlan<'a> {
	filters: Vec<&'a Predicate>,
	score: Option<&'a ScoreExpr>,
	sort: Option<&'a [SortKey]>,
	skip: Option<u64>,
	limit: Option<u64>,
	lookup_merchant: bool,
}
impl<'a> SqlPlan<'a> {
	pub(crate) fn from_stages(stages: &'a [Stage]) -> Result<Self> {
		let mut plan = Self::default();

		for stage in stages {
			match stage {
				Stage::Match(predicate) => {
					if plan.skip.is_some() || plan.limit.is_some() {
						return Err(unsupported("match after skip or limit"));
					}

					plan.filters.push(predicate);
				},
				Stage::AddScore(expr) => {
					if plan.score.is_some() || plan.sort.is_some() {
						return Err(unsupported("score after another score or a sort"));
					}

					plan.score = Some(expr);
				},
				Stage::Sort(keys) => {
					if plan.sort.is_some() || plan.skip.is_some() || plan.limit.is_some() {
						return Err(unsupported("sort after another sort, skip or limit"));
					}

					plan.sort = Some(keys);
				},
				Stage::Skip(count) => {
					if plan.skip.is_some() || plan.limit.is_some() {
						return Err(unsupported("skip after another skip or a limit"));
					}

					plan.skip = Some(*count);
				},
				Stage::Limit(count) => {
					if plan.limit.is_some() {
						return Err(unsupported("more than one limit"));
					}

					plan.limit = Some(*count);
				},
				Stage::LookupMerchant => plan.lookup_merchant = true,
				Stage::Count => return Err(unsupported("count before the last stage")),
			}
		}

		Ok(plan)
	}
}

pub(crate) fn push_pipeline_select(qb: &mut QueryBuilder<'_, Postgres>, plan: &SqlPlan<'_>) {
	qb.push("SELECT i.*, ");

	match plan.score {
		Some(expr) => push_score(qb, expr),
		None => {
			qb.push("NULL::float8");
		},
	}

	qb.push(" AS relevance_score, ");

	if plan.lookup_merchant {
		qb.push(
			"m.merchant_id AS merchant_ref, m.name AS merchant_name, \
			 m.shop_name AS merchant_shop_name \
			 FROM catalog_items i LEFT JOIN merchants m ON m.merchant_id = i.merchant_id",
		);
	} else {
		qb.push(
			"NULL::uuid AS merchant_ref, NULL::text AS merchant_name, \
			 NULL::text AS merchant_shop_name FROM catalog_items i",
		);
	}

	push_where(qb, &plan.filters);

	if let Some(keys) = plan.sort {
		push_order_by(qb, keys);
	}
	if let Some(limit) = plan.limit {
		qb.push(" LIMIT ").push_bind(clamp_i64(limit));
	}
	if let Some(skip) = plan.skip {
		qb.push(" OFFSET ").push_bind(clamp_i64(skip));
	}
}

pub(crate) fn push_count(qb: &mut QueryBuilder<'_, Postgres>, plan: &SqlPlan<'_>) {
	qb.push("SELECT count(*) FROM (");
	push_pipeline_select(qb, plan);
	qb.push(") AS matched");
}

pub(crate) fn push_suggestions(qb: &mut QueryBuilder<'_, Postgres>, pipeline: &SuggestionPipeline) {
	qb.push(
		"SELECT i.name AS text, \
		 (array_agg(i.category ORDER BY i.created_at, i.item_id))[1] AS category, \
		 count(*) AS item_count, ",
	);

	match &pipeline.rank {
		SuggestionRank::Position { needle } => {
			qb.push("(NULLIF(strpos(lower(i.name), ")
				.push_bind(needle.to_lowercase())
				.push("), 0) - 1)::bigint");
		},
		SuggestionRank::Popularity => {
			qb.push("NULL::bigint");
		},
	}

	qb.push(" AS match_position FROM catalog_items i");
	push_where(qb, &[&pipeline.filter]);
	qb.push(
		" GROUP BY i.name \
		 ORDER BY match_position ASC NULLS LAST, item_count DESC, i.name COLLATE \"C\" ASC \
		 LIMIT ",
	)
	.push_bind(clamp_i64(pipeline.limit));
}

pub(crate) fn push_find(
	qb: &mut QueryBuilder<'_, Postgres>,
	predicate: &Predicate,
	sort: &[SortKey],
) {
	qb.push("SELECT i.* FROM catalog_items i");
	push_where(qb, &[predicate]);
	push_order_by(qb, sort);
}

fn push_where(qb: &mut QueryBuilder<'_, Postgres>, filters: &[&Predicate]) {
	let filters =
		filters.iter().filter(|predicate| !matches!(predicate, Predicate::All)).collect::<Vec<_>>();

	if filters.is_empty() {
		return;
	}

	qb.push(" WHERE ");

	for (idx, predicate) in filters.into_iter().enumerate() {
		if idx > 0 {
			qb.push(" AND ");
		}

		push_predicate(qb, predicate);
	}
}

pub(crate) fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
	match predicate {
		Predicate::All => {
			qb.push("TRUE");
		},
		Predicate::Regex { field, pattern } => {
			qb.push("i.").push(field.column()).push(" ~* ").push_bind(pattern.clone());
		},
		Predicate::Equals { field, value } => {
			qb.push("i.").push(field.column()).push(" = ").push_bind(value.clone());
		},
		Predicate::EqualsIgnoreCase { field, value } => {
			qb.push("lower(i.")
				.push(field.column())
				.push(") = lower(")
				.push_bind(value.clone())
				.push(")");
		},
		Predicate::Range { field, min, max } => match (min, max) {
			(None, None) => {
				qb.push("TRUE");
			},
			(Some(min), None) => {
				qb.push("i.").push(field.column()).push(" >= ").push_bind(*min);
			},
			(None, Some(max)) => {
				qb.push("i.").push(field.column()).push(" <= ").push_bind(*max);
			},
			(Some(min), Some(max)) => {
				qb.push("(i.")
					.push(field.column())
					.push(" >= ")
					.push_bind(*min)
					.push(" AND i.")
					.push(field.column())
					.push(" <= ")
					.push_bind(*max)
					.push(")");
			},
		},
		Predicate::Or(branches) => push_junction(qb, branches, " OR ", "FALSE"),
		Predicate::And(branches) => push_junction(qb, branches, " AND ", "TRUE"),
	}
}

fn push_junction(
	qb: &mut QueryBuilder<'_, Postgres>,
	branches: &[Predicate],
	separator: &str,
	empty: &str,
) {
	if branches.is_empty() {
		qb.push(empty);

		return;
	}

	qb.push("(");

	for (idx, branch) in branches.iter().enumerate() {
		if idx > 0 {
			qb.push(separator);
		}

		push_predicate(qb, branch);
	}

	qb.push(")");
}

fn push_score(qb: &mut QueryBuilder<'_, Postgres>, expr: &ScoreExpr) {
	if expr.terms.is_empty() {
		qb.push("0::float8");

		return;
	}

	qb.push("(");

	for (idx, term) in expr.terms.iter().enumerate() {
		if idx > 0 {
			qb.push(" + ");
		}

		match term {
			ScoreTerm::FirstOf(tiers) if tiers.is_empty() => {
				qb.push("0::float8");
			},
			ScoreTerm::FirstOf(tiers) => {
				qb.push("CASE");

				for tier in tiers {
					qb.push(" WHEN ");
					push_predicate(qb, &tier.when);
					qb.push(" THEN ").push_bind(tier.points);
				}

				qb.push(" ELSE 0::float8 END");
			},
			ScoreTerm::When(tier) => {
				qb.push("CASE WHEN ");
				push_predicate(qb, &tier.when);
				qb.push(" THEN ").push_bind(tier.points).push(" ELSE 0::float8 END");
			},
			ScoreTerm::Capped { field, coefficient, cap } => {
				qb.push("LEAST(")
					.push_bind(*cap)
					.push(", i.")
					.push(field.column())
					.push("::float8 * ")
					.push_bind(*coefficient)
					.push(")");
			},
		}
	}

	qb.push(")");
}

fn push_order_by(qb: &mut QueryBuilder<'_, Postgres>, keys: &[SortKey]) {
	if keys.is_empty() {
		return;
	}

	qb.push(" ORDER BY ");

	for (idx, key) in keys.iter().enumerate() {
		if idx > 0 {
			qb.push(", ");
		}

		qb.push(match key.field {
			SortField::RelevanceScore => "relevance_score",
			SortField::Price => "i.price",
			SortField::SalesCount => "i.sales_count",
			SortField::Stock => "i.stock",
			SortField::CreatedAt => "i.created_at",
			SortField::Name => "i.name COLLATE \"C\"",
			SortField::ItemId => "i.item_id",
		});
		qb.push(match key.direction {
			Direction::Asc => " ASC",
			Direction::Desc => " DESC",
		});
	}
}

fn clamp_i64(value: u64) -> i64 {
	i64::try_from(value).unwrap_or(i64::MAX)
}

fn unsupported(shape: &str) -> Error {
	Error::InvalidArgument(format!("Unsupported pipeline shape: {shape}."))
}
