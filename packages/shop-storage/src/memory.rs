//! In-process [`CatalogStore`] that evaluates the pipeline IR directly.

use std::{
	cmp::Ordering,
	collections::{HashMap, hash_map::Entry},
};

use regex::{Regex, RegexBuilder};
use shop_domain::search_fields::SearchFields;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{CatalogItem, Merchant, MerchantSummary, PipelineRow, SuggestionRow},
	pipeline::{
		Direction, NumberField, Pipeline, Predicate, ScoreExpr, ScoreTerm, SortField, SortKey,
		Stage, SuggestionPipeline, SuggestionRank, TextField,
	},
	store::{BoxFuture, CatalogStore},
};

#[derive(Default)]
pub struct MemoryCatalog {
	state: RwLock<State>,
}
impl MemoryCatalog {
	pub fn new() -> Self {
		Self::default()
	}
}

#[derive(Default)]
struct State {
	items: HashMap<Uuid, CatalogItem>,
	merchants: HashMap<Uuid, Merchant>,
}
impl State {
	fn ordered_items(&self) -> Vec<&CatalogItem> {
		let mut items = self.items.values().collect::<Vec<_>>();

		items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.item_id.cmp(&b.item_id)));

		items
	}

	fn product_code_taken(&self, item: &CatalogItem) -> bool {
		self.items
			.values()
			.any(|other| other.item_id != item.item_id && other.product_code == item.product_code)
	}

	fn check_merchant(&self, item: &CatalogItem) -> Result<()> {
		match item.merchant_id {
			Some(merchant_id) if !self.merchants.contains_key(&merchant_id) =>
				Err(Error::InvalidArgument(format!("Merchant {merchant_id} does not exist."))),
			_ => Ok(()),
		}
	}

	fn run(&self, stages: &[Stage]) -> Result<Vec<PipelineRow>> {
		let mut rows = self
			.ordered_items()
			.into_iter()
			.map(|item| PipelineRow { item: item.clone(), relevance_score: None, merchant: None })
			.collect::<Vec<_>>();

		for stage in stages {
			match stage {
				Stage::Match(predicate) => {
					let matcher = Matcher::compile(predicate)?;

					rows.retain(|row| matcher.matches(&row.item));
				},
				Stage::AddScore(expr) => {
					let score = CompiledScore::compile(expr)?;

					for row in &mut rows {
						row.relevance_score = Some(score.evaluate(&row.item));
					}
				},
				Stage::Sort(keys) => rows.sort_by(|a, b| compare_rows(a, b, keys)),
				Stage::Skip(count) => {
					let count = usize::try_from(*count).unwrap_or(usize::MAX).min(rows.len());

					rows.drain(..count);
				},
				Stage::Limit(count) => rows.truncate(usize::try_from(*count).unwrap_or(usize::MAX)),
				Stage::LookupMerchant =>
					for row in &mut rows {
						row.merchant = row
							.item
							.merchant_id
							.and_then(|merchant_id| self.merchants.get(&merchant_id))
							.map(MerchantSummary::from);
					},
				Stage::Count => {
					return Err(Error::InvalidArgument(
						"Count stage is only valid as the last stage of a count pipeline."
							.to_string(),
					));
				},
			}
		}

		Ok(rows)
	}

	fn suggest(&self, pipeline: &SuggestionPipeline) -> Result<Vec<SuggestionRow>> {
		let matcher = Matcher::compile(&pipeline.filter)?;
		let needle = match &pipeline.rank {
			SuggestionRank::Position { needle } => Some(needle.to_lowercase()),
			SuggestionRank::Popularity => None,
		};
		let mut groups: Vec<SuggestionRow> = Vec::new();
		let mut by_name: HashMap<&str, usize> = HashMap::new();

		for item in self.ordered_items() {
			if !matcher.matches(item) {
				continue;
			}

			match by_name.get(item.name.as_str()) {
				Some(&index) => groups[index].count += 1,
				None => {
					let position =
						needle.as_deref().and_then(|needle| char_position(&item.name, needle));

					by_name.insert(item.name.as_str(), groups.len());
					groups.push(SuggestionRow {
						text: item.name.clone(),
						category: item.category.clone(),
						count: 1,
						position,
					});
				},
			}
		}

		groups.sort_by(|a, b| {
			compare_positions(a.position, b.position)
				.then(b.count.cmp(&a.count))
				.then_with(|| a.text.cmp(&b.text))
		});
		groups.truncate(usize::try_from(pipeline.limit).unwrap_or(usize::MAX));

		Ok(groups)
	}
}

impl CatalogStore for MemoryCatalog {
	fn insert_item<'a>(&'a self, item: &'a CatalogItem) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut state = self.state.write().await;

			state.check_merchant(item)?;

			if state.product_code_taken(item) {
				return Err(Error::Conflict(format!(
					"Product code {} is already in use.",
					item.product_code
				)));
			}

			match state.items.entry(item.item_id) {
				Entry::Occupied(_) =>
					Err(Error::Conflict(format!("Item {} already exists.", item.item_id))),
				Entry::Vacant(slot) => {
					slot.insert(item.clone());

					Ok(())
				},
			}
		})
	}

	fn get_item(&self, item_id: Uuid) -> BoxFuture<'_, Result<Option<CatalogItem>>> {
		Box::pin(async move { Ok(self.state.read().await.items.get(&item_id).cloned()) })
	}

	fn update_item<'a>(&'a self, item: &'a CatalogItem) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			let mut state = self.state.write().await;

			if !state.items.contains_key(&item.item_id) {
				return Ok(false);
			}

			state.check_merchant(item)?;

			if state.product_code_taken(item) {
				return Err(Error::Conflict(format!(
					"Product code {} is already in use.",
					item.product_code
				)));
			}

			if let Some(stored) = state.items.get_mut(&item.item_id) {
				let created_at = stored.created_at;

				*stored = item.clone();
				stored.created_at = created_at;
			}

			Ok(true)
		})
	}

	fn write_search_fields<'a>(
		&'a self,
		item_id: Uuid,
		fields: &'a SearchFields,
	) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			let mut state = self.state.write().await;
			let Some(item) = state.items.get_mut(&item_id) else {
				return Ok(false);
			};

			item.set_search_fields(fields.clone());

			Ok(true)
		})
	}

	fn delete_item(&self, item_id: Uuid) -> BoxFuture<'_, Result<bool>> {
		Box::pin(async move { Ok(self.state.write().await.items.remove(&item_id).is_some()) })
	}

	fn list_items(&self) -> BoxFuture<'_, Result<Vec<CatalogItem>>> {
		Box::pin(async move {
			let state = self.state.read().await;

			Ok(state.ordered_items().into_iter().cloned().collect())
		})
	}

	fn insert_merchant<'a>(&'a self, merchant: &'a Merchant) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			match self.state.write().await.merchants.entry(merchant.merchant_id) {
				Entry::Occupied(_) => Err(Error::Conflict(format!(
					"Merchant {} already exists.",
					merchant.merchant_id
				))),
				Entry::Vacant(slot) => {
					slot.insert(merchant.clone());

					Ok(())
				},
			}
		})
	}

	fn get_merchant(&self, merchant_id: Uuid) -> BoxFuture<'_, Result<Option<Merchant>>> {
		Box::pin(async move { Ok(self.state.read().await.merchants.get(&merchant_id).cloned()) })
	}

	fn find<'a>(
		&'a self,
		predicate: &'a Predicate,
		sort: &'a [SortKey],
	) -> BoxFuture<'a, Result<Vec<CatalogItem>>> {
		Box::pin(async move {
			let stages = [Stage::Match(predicate.clone()), Stage::Sort(sort.to_vec())];
			let rows = self.state.read().await.run(&stages)?;

			Ok(rows.into_iter().map(|row| row.item).collect())
		})
	}

	fn aggregate<'a>(&'a self, pipeline: &'a Pipeline) -> BoxFuture<'a, Result<Vec<PipelineRow>>> {
		Box::pin(async move { self.state.read().await.run(&pipeline.stages) })
	}

	fn count<'a>(&'a self, pipeline: &'a Pipeline) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			let Some((Stage::Count, stages)) = pipeline.stages.split_last() else {
				return Err(Error::InvalidArgument(
					"Count pipeline must end with a count stage.".to_string(),
				));
			};
			let rows = self.state.read().await.run(stages)?;

			Ok(rows.len() as u64)
		})
	}

	fn suggest<'a>(
		&'a self,
		pipeline: &'a SuggestionPipeline,
	) -> BoxFuture<'a, Result<Vec<SuggestionRow>>> {
		Box::pin(async move { self.state.read().await.suggest(pipeline) })
	}
}

enum Matcher {
	All,
	Regex { field: TextField, regex: Regex },
	Equals { field: TextField, value: String },
	EqualsIgnoreCase { field: TextField, lowered: String },
	Range { field: NumberField, min: Option<f64>, max: Option<f64> },
	Or(Vec<Matcher>),
	And(Vec<Matcher>),
}
impl Matcher {
	fn compile(predicate: &Predicate) -> Result<Self> {
		Ok(match predicate {
			Predicate::All => Self::All,
			Predicate::Regex { field, pattern } => {
				let regex =
					RegexBuilder::new(pattern).case_insensitive(true).build().map_err(|err| {
						Error::InvalidArgument(format!("Invalid pattern {pattern:?}: {err}."))
					})?;

				Self::Regex { field: *field, regex }
			},
			Predicate::Equals { field, value } => Self::Equals { field: *field, value: value.clone() },
			Predicate::EqualsIgnoreCase { field, value } =>
				Self::EqualsIgnoreCase { field: *field, lowered: value.to_lowercase() },
			Predicate::Range { field, min, max } =>
				Self::Range { field: *field, min: *min, max: *max },
			Predicate::Or(branches) =>
				Self::Or(branches.iter().map(Self::compile).collect::<Result<Vec<_>>>()?),
			Predicate::And(branches) =>
				Self::And(branches.iter().map(Self::compile).collect::<Result<Vec<_>>>()?),
		})
	}

	fn matches(&self, item: &CatalogItem) -> bool {
		match self {
			Self::All => true,
			Self::Regex { field, regex } => regex.is_match(field.read(item)),
			Self::Equals { field, value } => field.read(item) == value,
			Self::EqualsIgnoreCase { field, lowered } => field.read(item).to_lowercase() == *lowered,
			Self::Range { field, min, max } => {
				let value = field.read(item);

				min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
			},
			Self::Or(branches) => branches.iter().any(|branch| branch.matches(item)),
			Self::And(branches) => branches.iter().all(|branch| branch.matches(item)),
		}
	}
}

enum CompiledTerm {
	FirstOf(Vec<(Matcher, f64)>),
	When(Matcher, f64),
	Capped { field: NumberField, coefficient: f64, cap: f64 },
}

struct CompiledScore {
	terms: Vec<CompiledTerm>,
}
impl CompiledScore {
	fn compile(expr: &ScoreExpr) -> Result<Self> {
		let mut terms = Vec::with_capacity(expr.terms.len());

		for term in &expr.terms {
			terms.push(match term {
				ScoreTerm::FirstOf(tiers) => CompiledTerm::FirstOf(
					tiers
						.iter()
						.map(|tier| Ok((Matcher::compile(&tier.when)?, tier.points)))
						.collect::<Result<Vec<_>>>()?,
				),
				ScoreTerm::When(tier) => CompiledTerm::When(Matcher::compile(&tier.when)?, tier.points),
				ScoreTerm::Capped { field, coefficient, cap } =>
					CompiledTerm::Capped { field: *field, coefficient: *coefficient, cap: *cap },
			});
		}

		Ok(Self { terms })
	}

	fn evaluate(&self, item: &CatalogItem) -> f64 {
		self.terms
			.iter()
			.map(|term| match term {
				CompiledTerm::FirstOf(tiers) => tiers
					.iter()
					.find(|(matcher, _)| matcher.matches(item))
					.map_or(0.0, |(_, points)| *points),
				CompiledTerm::When(matcher, points) =>
					if matcher.matches(item) {
						*points
					} else {
						0.0
					},
				CompiledTerm::Capped { field, coefficient, cap } =>
					(field.read(item) * coefficient).min(*cap),
			})
			.sum()
	}
}

fn compare_rows(a: &PipelineRow, b: &PipelineRow, keys: &[SortKey]) -> Ordering {
	for key in keys {
		let ordering = match key.field {
			SortField::RelevanceScore =>
				a.relevance_score.unwrap_or(0.0).total_cmp(&b.relevance_score.unwrap_or(0.0)),
			SortField::Price => a.item.price.total_cmp(&b.item.price),
			SortField::SalesCount => a.item.sales_count.cmp(&b.item.sales_count),
			SortField::Stock => a.item.stock.cmp(&b.item.stock),
			SortField::CreatedAt => a.item.created_at.cmp(&b.item.created_at),
			SortField::Name => a.item.name.cmp(&b.item.name),
			SortField::ItemId => a.item.item_id.cmp(&b.item.item_id),
		};
		let ordering = match key.direction {
			Direction::Asc => ordering,
			Direction::Desc => ordering.reverse(),
		};

		if ordering != Ordering::Equal {
			return ordering;
		}
	}

	Ordering::Equal
}

/// Present positions ascend; absent positions sort last.
fn compare_positions(a: Option<i64>, b: Option<i64>) -> Ordering {
	match (a, b) {
		(Some(a), Some(b)) => a.cmp(&b),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	}
}

fn char_position(name: &str, lowered_needle: &str) -> Option<i64> {
	let lowered = name.to_lowercase();
	let byte_offset = lowered.find(lowered_needle)?;

	Some(lowered[..byte_offset].chars().count() as i64)
}
