mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Postgres, Ranking, RankingWeights, Search, SearchHighlight, SearchSuggestions,
	Security, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.admin_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.admin_bind must be non-empty.".to_string(),
		});
	}

	match cfg.storage.backend.as_str() {
		"memory" => {},
		"postgres" => {
			let Some(postgres) = cfg.storage.postgres.as_ref() else {
				return Err(Error::Validation {
					message: "storage.postgres is required when storage.backend is postgres."
						.to_string(),
				});
			};

			if postgres.dsn.trim().is_empty() {
				return Err(Error::Validation {
					message: "storage.postgres.dsn must be non-empty.".to_string(),
				});
			}
			if postgres.pool_max_conns == 0 {
				return Err(Error::Validation {
					message: "storage.postgres.pool_max_conns must be greater than zero."
						.to_string(),
				});
			}
		},
		_ => {
			return Err(Error::Validation {
				message: "storage.backend must be one of postgres or memory.".to_string(),
			});
		},
	}

	if cfg.search.default_limit == 0 {
		return Err(Error::Validation {
			message: "search.default_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_limit < cfg.search.default_limit {
		return Err(Error::Validation {
			message: "search.max_limit must be greater than or equal to search.default_limit."
				.to_string(),
		});
	}
	if !matches!(cfg.search.default_strategy.as_str(), "exact" | "wildcard" | "ngram" | "multi") {
		return Err(Error::Validation {
			message: "search.default_strategy must be one of exact, wildcard, ngram, or multi."
				.to_string(),
		});
	}
	if cfg.search.suggestions.default_limit == 0 {
		return Err(Error::Validation {
			message: "search.suggestions.default_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.search.suggestions.max_limit < cfg.search.suggestions.default_limit {
		return Err(Error::Validation {
			message: "search.suggestions.max_limit must be greater than or equal to search.suggestions.default_limit."
				.to_string(),
		});
	}
	if cfg.search.highlight.pre_tag.is_empty() || cfg.search.highlight.post_tag.is_empty() {
		return Err(Error::Validation {
			message: "search.highlight.pre_tag and search.highlight.post_tag must be non-empty."
				.to_string(),
		});
	}
	if cfg.ranking.policy_version.trim().is_empty() {
		return Err(Error::Validation {
			message: "ranking.policy_version must be non-empty.".to_string(),
		});
	}
	if !matches!(cfg.ranking.default_profile.as_str(), "native" | "basic") {
		return Err(Error::Validation {
			message: "ranking.default_profile must be one of native or basic.".to_string(),
		});
	}

	for (label, weights) in [("native", &cfg.ranking.native), ("basic", &cfg.ranking.basic)] {
		for (name, value) in weights.entries() {
			if !value.is_finite() {
				return Err(Error::Validation {
					message: format!("ranking.{label}.{name} must be a finite number."),
				});
			}
		}

		if weights.sales_coefficient < 0.0 || weights.sales_cap < 0.0 {
			return Err(Error::Validation {
				message: format!(
					"ranking.{label}.sales_coefficient and ranking.{label}.sales_cap must be zero or greater."
				),
			});
		}
		if weights.out_of_stock_penalty > 0.0 {
			return Err(Error::Validation {
				message: format!("ranking.{label}.out_of_stock_penalty must be zero or less."),
			});
		}
		if !(weights.name_exact >= weights.name_prefix
			&& weights.name_prefix >= weights.name_suffix
			&& weights.name_suffix >= weights.name_contains)
		{
			return Err(Error::Validation {
				message: format!(
					"ranking.{label} name tiers must be ordered name_exact >= name_prefix >= name_suffix >= name_contains."
				),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg
		.search
		.phonetic_table
		.as_deref()
		.map(|path| path.as_os_str().to_string_lossy().trim().is_empty())
		.unwrap_or(false)
	{
		cfg.search.phonetic_table = None;
	}

	cfg.storage.backend = cfg.storage.backend.trim().to_ascii_lowercase();
	cfg.search.default_strategy = cfg.search.default_strategy.trim().to_ascii_lowercase();
	cfg.ranking.default_profile = cfg.ranking.default_profile.trim().to_ascii_lowercase();
}
