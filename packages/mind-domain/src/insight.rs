use serde::{Deserialize, Serialize};

use crate::{
	StageError,
	analyzer::{AnalysisSummary, Association, Trend},
	label::LabelKind,
	pipeline::Stage,
	recommend::{self, Recommendation},
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
	Pattern,
	Correlation,
	Progress,
	Warning,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Insight {
	pub title: String,
	pub description: String,
	pub insight_type: InsightType,
	pub confidence_score: f64,
	/// Whether the insight is about something the user can change directly.
	pub actionable: bool,
}
impl Insight {
	fn new(
		title: impl Into<String>,
		description: impl Into<String>,
		insight_type: InsightType,
		confidence_score: f64,
		actionable: bool,
	) -> Self {
		Self {
			title: title.into(),
			description: description.into(),
			insight_type,
			confidence_score: recommend::clamp_score(confidence_score),
			actionable,
		}
	}
}

pub fn generate(
	cfg: &mind_config::Insight,
	analysis_cfg: &mind_config::Analysis,
	summary: &AnalysisSummary,
	recommendations: &[Recommendation],
) -> Result<Vec<Insight>, StageError> {
	check_summary(summary)?;

	let data_confidence = data_confidence(summary.total_entries, cfg.confidence_saturation_entries);
	let mut out = vec![pattern_insight(summary, data_confidence)];

	if summary.trend == Trend::Declining
		&& summary.low_mood_streak >= analysis_cfg.low_mood_min_periods
	{
		out.push(warning_insight(summary, recommendations, data_confidence));
	}
	if summary.trend == Trend::Improving {
		out.push(progress_insight(summary, data_confidence));
	}

	out.extend(
		summary
			.associations
			.iter()
			.filter(|association| association.count >= cfg.min_correlation_support)
			.map(correlation_insight),
	);

	Ok(out)
}

/// Grows with the number of entries and saturates at 1.0 once `saturation` entries exist.
pub fn data_confidence(total_entries: usize, saturation: u32) -> f64 {
	(total_entries as f64 / f64::from(saturation.max(1))).min(1.0)
}

fn pattern_insight(summary: &AnalysisSummary, confidence: f64) -> Insight {
	let description = if summary.has_data() {
		format!(
			"Across {} entries your most frequent emotion is {}, with {} distinct emotions and a {} trend.",
			summary.total_entries,
			summary.dominant_emotion,
			summary.emotional_diversity,
			summary.trend.as_str(),
		)
	} else {
		"No mood entries yet. Log a few moods to start seeing patterns.".to_string()
	};

	Insight::new("Mood Pattern", description, InsightType::Pattern, confidence, false)
}

fn warning_insight(
	summary: &AnalysisSummary,
	recommendations: &[Recommendation],
	confidence: f64,
) -> Insight {
	let mut description = format!(
		"Your mood has been low for {} periods in a row and is trending down.",
		summary.low_mood_streak
	);

	if let Some(top) = recommendations.iter().find(|rec| rec.validated) {
		description.push_str(&format!(" Try \"{}\" today.", top.title));
	}

	Insight::new("Low Mood Alert", description, InsightType::Warning, confidence, true)
}

fn progress_insight(summary: &AnalysisSummary, confidence: f64) -> Insight {
	let description = match summary.intensity_change {
		Some(change) => format!(
			"Your recent moods are {:.0}% brighter than earlier ones. Keep it up.",
			change * 100.0
		),
		None => "Your recent moods are brighter than earlier ones. Keep it up.".to_string(),
	};

	Insight::new("Mood Improving", description, InsightType::Progress, confidence, false)
}

fn correlation_insight(association: &Association) -> Insight {
	let (title, verb) = match association.kind {
		LabelKind::Trigger => (format!("Trigger: {}", association.label), "followed"),
		LabelKind::Activity => (format!("Activity: {}", association.label), "came with"),
	};
	let description = format!(
		"{} of your {} entries mentioning {} {} feeling {}.",
		association.count, association.label_uses, association.label, verb, association.emotion,
	);
	let confidence = f64::from(association.count) / f64::from(association.label_uses.max(1));

	Insight::new(
		title,
		description,
		InsightType::Correlation,
		confidence,
		association.kind.is_user_controllable(),
	)
}

fn check_summary(summary: &AnalysisSummary) -> Result<(), StageError> {
	if summary.emotional_diversity > summary.total_entries {
		return Err(StageError::new(
			Stage::Insight,
			"emotional diversity exceeds the number of entries.",
		));
	}
	if !summary.avg_intensity.is_finite() {
		return Err(StageError::new(Stage::Insight, "average intensity is not a finite number."));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn data_confidence_is_monotonic_and_saturates() {
		let values: Vec<f64> = (0..30).map(|n| data_confidence(n, 20)).collect();

		assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));
		assert_eq!(data_confidence(0, 20), 0.0);
		assert_eq!(data_confidence(10, 20), 0.5);
		assert_eq!(data_confidence(20, 20), 1.0);
		assert_eq!(data_confidence(200, 20), 1.0);
	}

	#[test]
	fn inconsistent_summary_fails_the_stage() {
		let mut summary = AnalysisSummary::empty();

		summary.emotional_diversity = 2;

		let err = check_summary(&summary).expect_err("Expected a stage error.");

		assert_eq!(err.stage, Stage::Insight);
	}
}
