mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Analysis, Config, Insight, Postgres, Recommendation, Security, Service, Storage, Validation,
};

use std::{fs, path::Path};

pub const BACKEND_MEMORY: &str = "memory";
pub const BACKEND_POSTGRES: &str = "postgres";

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
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}

	validate_storage(cfg)?;

	for (label, value) in [
		("analysis.trend_delta", cfg.analysis.trend_delta),
		("analysis.low_mood_threshold", cfg.analysis.low_mood_threshold),
		("recommendation.affinity_boost", cfg.recommendation.affinity_boost),
		("recommendation.declining_boost", cfg.recommendation.declining_boost),
		("recommendation.repetition_penalty", cfg.recommendation.repetition_penalty),
		("validation.score_threshold", cfg.validation.score_threshold),
	] {
		validate_unit_interval(label, value)?;
	}

	if cfg.analysis.trend_delta >= 1.0 {
		return Err(Error::Validation {
			message: "analysis.trend_delta must be less than 1.0.".to_string(),
		});
	}

	for (label, value) in [
		("analysis.low_mood_min_periods", cfg.analysis.low_mood_min_periods),
		("analysis.period_hours", cfg.analysis.period_hours),
		("recommendation.frequent_label_min_uses", cfg.recommendation.frequent_label_min_uses),
		("insight.min_correlation_support", cfg.insight.min_correlation_support),
		("insight.confidence_saturation_entries", cfg.insight.confidence_saturation_entries),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	Ok(())
}

fn validate_storage(cfg: &Config) -> Result<()> {
	match cfg.storage.backend.as_str() {
		BACKEND_MEMORY => Ok(()),
		BACKEND_POSTGRES => {
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

			Ok(())
		},
		_ => Err(Error::Validation {
			message: "storage.backend must be one of memory or postgres.".to_string(),
		}),
	}
}

fn validate_unit_interval(label: &str, value: f64) -> Result<()> {
	if !value.is_finite() {
		return Err(Error::Validation { message: format!("{label} must be a finite number.") });
	}
	if !(0.0..=1.0).contains(&value) {
		return Err(Error::Validation {
			message: format!("{label} must be in the range 0.0-1.0."),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.storage.backend = cfg.storage.backend.trim().to_ascii_lowercase();

	if cfg.storage.postgres.as_ref().map(|pg| pg.dsn.trim().is_empty()).unwrap_or(false)
		&& cfg.storage.backend != BACKEND_POSTGRES
	{
		cfg.storage.postgres = None;
	}
}
