use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
	StageError,
	graph::{MoodEntry, MoodSnapshot},
	label::LabelKind,
	pipeline::Stage,
};

/// Placeholder emotion reported when there is nothing to analyze.
pub const INSUFFICIENT_DATA: &str = "insufficient_data";

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
	Improving,
	Declining,
	Stable,
	InsufficientData,
}
impl Trend {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Improving => "improving",
			Self::Declining => "declining",
			Self::Stable => "stable",
			Self::InsufficientData => "insufficient_data",
		}
	}
}

/// How often a trigger or activity shows up alongside one emotion.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Association {
	pub emotion: String,
	pub label: String,
	pub kind: LabelKind,
	/// Entries with this emotion that reference the label.
	pub count: u32,
	/// Entries that reference the label at all.
	pub label_uses: u32,
	/// Mean intensity of the co-occurring entries.
	pub mean_intensity: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AnalysisSummary {
	pub total_entries: usize,
	pub dominant_emotion: String,
	pub avg_intensity: f64,
	pub emotional_diversity: usize,
	pub trend: Trend,
	/// Later half mean minus earlier half mean, when a trend could be computed.
	pub intensity_change: Option<f64>,
	/// Most recent consecutive logged periods whose mean intensity was low.
	pub low_mood_streak: u32,
	pub associations: Vec<Association>,
}
impl AnalysisSummary {
	pub fn empty() -> Self {
		Self {
			total_entries: 0,
			dominant_emotion: INSUFFICIENT_DATA.to_string(),
			avg_intensity: 0.0,
			emotional_diversity: 0,
			trend: Trend::InsufficientData,
			intensity_change: None,
			low_mood_streak: 0,
			associations: Vec::new(),
		}
	}

	pub fn has_data(&self) -> bool {
		self.total_entries > 0
	}
}

pub fn analyze(
	cfg: &mind_config::Analysis,
	snapshot: &MoodSnapshot,
) -> Result<AnalysisSummary, StageError> {
	let entries = snapshot.entries();

	check_entries(entries)?;

	if entries.is_empty() {
		return Ok(AnalysisSummary::empty());
	}

	let intensities: Vec<f64> = entries.iter().map(|entry| entry.intensity).collect();
	let (trend, intensity_change) = classify_trend(&intensities, cfg.trend_delta);

	Ok(AnalysisSummary {
		total_entries: entries.len(),
		dominant_emotion: dominant_emotion(entries).unwrap_or(INSUFFICIENT_DATA).to_string(),
		avg_intensity: mean(&intensities).unwrap_or(0.0),
		emotional_diversity: distinct_emotions(entries),
		trend,
		intensity_change,
		low_mood_streak: low_mood_streak(entries, cfg.period_hours, cfg.low_mood_threshold),
		associations: associations(snapshot),
	})
}

/// Most frequent emotion; ties go to the emotion logged most recently.
pub fn dominant_emotion(entries: &[MoodEntry]) -> Option<&str> {
	let mut tally: HashMap<&str, (usize, usize)> = HashMap::new();

	for (idx, entry) in entries.iter().enumerate() {
		let slot = tally.entry(entry.emotion.as_str()).or_insert((0, idx));

		slot.0 += 1;
		slot.1 = idx;
	}

	tally
		.into_iter()
		.max_by(|(_, (count_a, last_a)), (_, (count_b, last_b))| {
			count_a.cmp(count_b).then_with(|| last_a.cmp(last_b))
		})
		.map(|(emotion, _)| emotion)
}

/// Compares the later half of the series against the earlier half. An odd middle value belongs to
/// the later half.
pub fn classify_trend(intensities: &[f64], delta: f64) -> (Trend, Option<f64>) {
	if intensities.len() < 2 {
		return (Trend::InsufficientData, None);
	}

	let (earlier, later) = intensities.split_at(intensities.len() / 2);
	let (Some(earlier_mean), Some(later_mean)) = (mean(earlier), mean(later)) else {
		return (Trend::InsufficientData, None);
	};
	let change = later_mean - earlier_mean;
	let trend = if change > delta {
		Trend::Improving
	} else if change < -delta {
		Trend::Declining
	} else {
		Trend::Stable
	};

	(trend, Some(change))
}

pub fn low_mood_streak(entries: &[MoodEntry], period_hours: u32, threshold: f64) -> u32 {
	let period_secs = i64::from(period_hours.max(1)) * 3_600;
	let mut periods: Vec<(i64, f64, u32)> = Vec::new();

	for entry in entries {
		let period = entry.created_at.unix_timestamp().div_euclid(period_secs);

		match periods.last_mut() {
			Some((last, sum, count)) if *last == period => {
				*sum += entry.intensity;
				*count += 1;
			},
			_ => periods.push((period, entry.intensity, 1)),
		}
	}

	periods
		.iter()
		.rev()
		.take_while(|(_, sum, count)| sum / f64::from(*count) < threshold)
		.count() as u32
}

fn associations(snapshot: &MoodSnapshot) -> Vec<Association> {
	let mut tally: BTreeMap<(&str, LabelKind, &str), (u32, f64, u32)> = BTreeMap::new();

	for entry in snapshot.entries() {
		for kind in [LabelKind::Trigger, LabelKind::Activity] {
			for label in snapshot.labels_for(entry, kind) {
				let slot = tally
					.entry((entry.emotion.as_str(), kind, label.name.as_str()))
					.or_insert((0, 0.0, label.usage_count));

				slot.0 += 1;
				slot.1 += entry.intensity;
			}
		}
	}

	let mut out: Vec<Association> = tally
		.into_iter()
		.map(|((emotion, kind, label), (count, sum, label_uses))| Association {
			emotion: emotion.to_string(),
			label: label.to_string(),
			kind,
			count,
			label_uses,
			mean_intensity: sum / f64::from(count),
		})
		.collect();

	out.sort_by(|a, b| b.count.cmp(&a.count));

	out
}

fn distinct_emotions(entries: &[MoodEntry]) -> usize {
	let mut seen: Vec<&str> = Vec::new();

	for entry in entries {
		if !seen.contains(&entry.emotion.as_str()) {
			seen.push(entry.emotion.as_str());
		}
	}

	seen.len()
}

fn check_entries(entries: &[MoodEntry]) -> Result<(), StageError> {
	for entry in entries {
		if !entry.intensity.is_finite() || !(0.0..=1.0).contains(&entry.intensity) {
			return Err(StageError::new(
				Stage::Analysis,
				format!("entry {} has an out-of-range intensity.", entry.entry_id),
			));
		}
	}
	for pair in entries.windows(2) {
		if pair[1].created_at <= pair[0].created_at {
			return Err(StageError::new(
				Stage::Analysis,
				format!("entry {} is not ordered by creation time.", pair[1].entry_id),
			));
		}
	}

	Ok(())
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
	if values.is_empty() {
		return None;
	}

	Some(values.iter().sum::<f64>() / values.len() as f64)
}
