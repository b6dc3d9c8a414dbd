use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
	StageError,
	analyzer::{self, Trend},
	graph::{LabelCount, MoodSnapshot},
	label::LabelKind,
};

pub const REPORT_TOP_LABELS: usize = 3;

/// An activity whose entries are brighter than the user's average.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ActivityLift {
	pub name: String,
	pub entries: u32,
	pub mean_intensity: f64,
	/// Mean intensity of the activity's entries minus the overall mean.
	pub lift: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TrendReport {
	pub user_id: String,
	pub total_entries: usize,
	pub dominant_emotion: String,
	pub trend: Trend,
	pub top_triggers: Vec<LabelCount>,
	pub effective_activities: Vec<ActivityLift>,
	pub summary: Vec<String>,
	#[serde(default, with = "crate::time_serde::option")]
	pub last_entry_at: Option<OffsetDateTime>,
}

pub fn trend_report(
	cfg: &mind_config::Analysis,
	snapshot: &MoodSnapshot,
) -> Result<TrendReport, StageError> {
	let analysis = analyzer::analyze(cfg, snapshot)?;
	let mut top_triggers = snapshot.frequencies().triggers;

	top_triggers.truncate(REPORT_TOP_LABELS);

	let effective_activities = activity_lifts(snapshot, analysis.avg_intensity);
	let mut summary = vec![format!("You have logged {} mood entries.", analysis.total_entries)];

	if analysis.has_data() {
		let dominant_count = snapshot
			.entries()
			.iter()
			.filter(|entry| entry.emotion == analysis.dominant_emotion)
			.count();
		let share = dominant_count as f64 * 100.0 / analysis.total_entries as f64;

		summary.push(format!(
			"{} makes up {share:.0}% of your entries.",
			capitalize(&analysis.dominant_emotion)
		));
	}
	if let Some(best) = effective_activities.first() {
		summary.push(format!(
			"{} lifts your mood by {:.0}% on average.",
			capitalize(&best.name),
			best.lift * 100.0
		));
	}

	Ok(TrendReport {
		user_id: snapshot.user_id().to_string(),
		total_entries: analysis.total_entries,
		dominant_emotion: analysis.dominant_emotion,
		trend: analysis.trend,
		top_triggers,
		effective_activities,
		summary,
		last_entry_at: snapshot.entries().last().map(|entry| entry.created_at),
	})
}

/// Activities with a positive lift over `overall_mean`, by lift descending then name.
pub fn activity_lifts(snapshot: &MoodSnapshot, overall_mean: f64) -> Vec<ActivityLift> {
	let activities = snapshot.labels(LabelKind::Activity);
	// Label ids index the table, so one slot per label.
	let mut tally = vec![(0.0_f64, 0_u32); activities.len()];

	for entry in snapshot.entries() {
		for id in &entry.activities {
			if let Some((sum, count)) = tally.get_mut(id.0 as usize) {
				*sum += entry.intensity;
				*count += 1;
			}
		}
	}

	let mut lifts: Vec<ActivityLift> = activities
		.iter()
		.zip(tally)
		.filter(|(_, (_, count))| *count > 0)
		.filter_map(|(label, (sum, count))| {
			let mean_intensity = sum / f64::from(count);
			let lift = mean_intensity - overall_mean;

			(lift > 0.0).then(|| ActivityLift {
				name: label.name.clone(),
				entries: count,
				mean_intensity,
				lift,
			})
		})
		.collect();

	lifts.sort_by(|a, b| b.lift.total_cmp(&a.lift).then_with(|| a.name.cmp(&b.name)));
	lifts.truncate(REPORT_TOP_LABELS);

	lifts
}

fn capitalize(text: &str) -> String {
	let mut chars = text.chars();

	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use time::{Duration, OffsetDateTime};

	use crate::graph::{MoodGraph, NewMoodEntry, User};

	fn logged(entries: &[(f64, Vec<&str>)]) -> MoodSnapshot {
		let start = OffsetDateTime::UNIX_EPOCH + Duration::days(20_000);
		let user = User::new("demo", "Demo User", start).expect("User must validate.");
		let mut graph = MoodGraph::new(user);

		for (idx, (intensity, activities)) in entries.iter().enumerate() {
			let input = NewMoodEntry {
				emotion: "calm".to_string(),
				intensity: *intensity,
				activities: activities.iter().map(|name| name.to_string()).collect(),
				..Default::default()
			};

			graph
				.add_entry_at(&input, start + Duration::minutes(idx as i64))
				.expect("Entry must validate.");
		}

		graph.snapshot()
	}

	#[test]
	fn lifts_average_only_the_entries_that_logged_the_activity() {
		let snapshot = logged(&[
			(0.9, vec!["yoga", "music"]),
			(0.7, vec!["yoga"]),
			(0.2, vec![]),
			(0.6, vec!["music"]),
			(0.1, vec!["tv"]),
		]);
		let lifts = activity_lifts(&snapshot, 0.5);
		let summary: Vec<(&str, u32)> =
			lifts.iter().map(|lift| (lift.name.as_str(), lift.entries)).collect();

		assert_eq!(summary, vec![("yoga", 2), ("music", 2)]);
		assert!((lifts[0].mean_intensity - 0.8).abs() < 1e-9);
		assert!((lifts[1].lift - 0.25).abs() < 1e-9);
	}

	#[test]
	fn capitalize_handles_empty_and_unicode() {
		assert_eq!(capitalize(""), "");
		assert_eq!(capitalize("walk"), "Walk");
		assert_eq!(capitalize("éclair"), "Éclair");
	}
}
