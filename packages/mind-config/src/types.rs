use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub analysis: Analysis,
	#[serde(default)]
	pub recommendation: Recommendation,
	#[serde(default)]
	pub validation: Validation,
	#[serde(default)]
	pub insight: Insight,
	#[serde(default)]
	pub security: Security,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
	/// One of "memory" or "postgres".
	pub backend: String,
	pub postgres: Option<Postgres>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// Thresholds used by the mood analyzer.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Analysis {
	/// Minimum difference between the later and earlier half means before a trend is reported.
	pub trend_delta: f64,
	/// Period mean intensity below which a period counts as low mood.
	pub low_mood_threshold: f64,
	/// Consecutive low-mood periods required before a warning is raised.
	pub low_mood_min_periods: u32,
	/// Width of one period in hours, aligned to the Unix epoch.
	pub period_hours: u32,
}
impl Default for Analysis {
	fn default() -> Self {
		Self {
			trend_delta: 0.05,
			low_mood_threshold: 0.35,
			low_mood_min_periods: 2,
			period_hours: 24,
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Recommendation {
	/// A trigger or activity logged at least this many times counts as frequent.
	pub frequent_label_min_uses: u32,
	pub affinity_boost: f64,
	pub declining_boost: f64,
	pub repetition_penalty: f64,
}
impl Default for Recommendation {
	fn default() -> Self {
		Self {
			frequent_label_min_uses: 2,
			affinity_boost: 0.15,
			declining_boost: 0.2,
			repetition_penalty: 0.2,
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Validation {
	pub score_threshold: f64,
}
impl Default for Validation {
	fn default() -> Self {
		Self { score_threshold: 0.5 }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Insight {
	pub min_correlation_support: u32,
	/// Entry count at which pattern confidence saturates at 1.0.
	pub confidence_saturation_entries: u32,
}
impl Default for Insight {
	fn default() -> Self {
		Self { min_correlation_support: 2, confidence_saturation_entries: 20 }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Security {
	pub bind_localhost_only: bool,
}
impl Default for Security {
	fn default() -> Self {
		Self { bind_localhost_only: true }
	}
}
