use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use mind_domain::{
	analyzer::{AnalysisSummary, Association, Trend},
	graph::{LabelCount, LabelFrequencies, MoodGraph, NewMoodEntry, User},
	insight::{self, InsightType},
	label::LabelKind,
	pipeline::{PipelineResult, Stage},
	recommend::{
		self, FallbackReason, RecType, Recommendation, RecommendationInput, TemplateSource,
	},
	report, validate,
};

fn summary(emotion: &str, total: usize, trend: Trend) -> AnalysisSummary {
	AnalysisSummary {
		total_entries: total,
		dominant_emotion: emotion.to_string(),
		avg_intensity: 0.5,
		emotional_diversity: total.min(1),
		trend,
		..AnalysisSummary::empty()
	}
}

fn candidate(title: &str, rec_type: RecType, score: f64) -> Recommendation {
	Recommendation::new(title, format!("{title} content."), rec_type, score)
}

fn score_of(recs: &[Recommendation], title: &str) -> f64 {
	recs.iter()
		.find(|rec| rec.title == title)
		.map(|rec| rec.relevance_score)
		.unwrap_or_else(|| panic!("Missing recommendation {title}."))
}

fn draft(summary: &AnalysisSummary, frequencies: &LabelFrequencies) -> recommend::RecommendationDraft {
	recommend::recommend(
		&mind_config::Recommendation::default(),
		RecommendationInput { summary, frequencies, previous: None },
	)
}

#[test]
fn recognized_emotion_uses_its_own_templates() {
	let draft = draft(&summary("Happy", 3, Trend::Stable), &LabelFrequencies::default());

	assert_eq!(draft.template_source, TemplateSource::Matched { emotion: "happy".to_string() });
	assert!(draft.candidates.len() >= 2);
	assert_eq!(draft.candidates[0].title, "Gratitude Journal");
	assert!(draft.candidates.iter().all(|rec| !rec.validated && rec.priority == 3));
}

#[test]
fn unrecognized_emotion_falls_back_explicitly() {
	let draft = draft(&summary("bored", 2, Trend::Stable), &LabelFrequencies::default());

	assert_eq!(
		draft.template_source,
		TemplateSource::Fallback {
			requested: "bored".to_string(),
			reason: FallbackReason::Unrecognized
		}
	);
	assert!(draft.template_source.is_fallback());
	assert_eq!(draft.candidates[0].title, "Box Breathing");
}

#[test]
fn empty_history_falls_back_with_no_data() {
	let draft = draft(&AnalysisSummary::empty(), &LabelFrequencies::default());

	assert!(matches!(
		draft.template_source,
		TemplateSource::Fallback { reason: FallbackReason::NoData, .. }
	));
	assert!(!draft.candidates.is_empty());
}

#[test]
fn frequent_activity_boosts_related_type() {
	let frequencies = LabelFrequencies {
		triggers: Vec::new(),
		activities: vec![
			LabelCount { name: "morning walk".to_string(), count: 2 },
			LabelCount { name: "journaling".to_string(), count: 1 },
		],
	};
	let draft = draft(&summary("anxious", 4, Trend::Stable), &frequencies);

	assert!((score_of(&draft.candidates, "Progressive Muscle Relaxation") - 0.75).abs() < 1e-9);
	assert!((score_of(&draft.candidates, "Worry Window") - 0.45).abs() < 1e-9);
	assert!((score_of(&draft.candidates, "Box Breathing") - 0.7).abs() < 1e-9);
}

#[test]
fn declining_trend_boosts_coping_types_and_caps_at_one() {
	let frequencies = LabelFrequencies {
		triggers: vec![LabelCount { name: "breathless".to_string(), count: 3 }],
		activities: Vec::new(),
	};
	let draft = draft(&summary("anxious", 4, Trend::Declining), &frequencies);

	assert_eq!(score_of(&draft.candidates, "Box Breathing"), 1.0);
	assert!((score_of(&draft.candidates, "Progressive Muscle Relaxation") - 0.6).abs() < 1e-9);
	assert!(draft.candidates.iter().all(|rec| rec.relevance_score <= 1.0));
}

#[test]
fn previous_validated_type_is_penalized() {
	let mut previous = PipelineResult::new(Uuid::new_v4(), "demo_user", OffsetDateTime::now_utc());
	let mut repeated = candidate("Box Breathing", RecType::Breathing, 0.7);
	let unvalidated = candidate("Worry Window", RecType::Journaling, 0.45);

	repeated.validated = true;
	previous.recommendations = vec![repeated, unvalidated];

	let summary = summary("anxious", 4, Trend::Stable);
	let frequencies = LabelFrequencies::default();
	let draft = recommend::recommend(
		&mind_config::Recommendation::default(),
		RecommendationInput { summary: &summary, frequencies: &frequencies, previous: Some(&previous) },
	);

	assert!((score_of(&draft.candidates, "Box Breathing") - 0.5).abs() < 1e-9);
	assert!((score_of(&draft.candidates, "Worry Window") - 0.45).abs() < 1e-9);
}

#[test]
fn score_at_threshold_is_validated() {
	let cfg = mind_config::Validation::default();
	let out = validate::validate(
		&cfg,
		vec![
			candidate("At", RecType::Breathing, cfg.score_threshold),
			candidate("Below", RecType::Exercise, cfg.score_threshold - 1e-9),
		],
	)
	.expect("Validation must succeed.");
	let at = out.recommendations.iter().find(|rec| rec.title == "At").expect("Missing At.");
	let below = out.recommendations.iter().find(|rec| rec.title == "Below").expect("Missing Below.");

	assert!(at.validated);
	assert!(!below.validated);
	assert_eq!(out.summary.validated_count, 1);
	assert_eq!(out.summary.total_recommendations, 2);
}

#[test]
fn same_type_candidates_collapse_to_the_best() {
	let out = validate::validate(
		&mind_config::Validation::default(),
		vec![
			candidate("First", RecType::Breathing, 0.6),
			candidate("Second", RecType::Breathing, 0.8),
			candidate("Third", RecType::Breathing, 0.8),
			candidate("Other", RecType::Social, 0.3),
		],
	)
	.expect("Validation must succeed.");
	let breathing: Vec<&Recommendation> =
		out.recommendations.iter().filter(|rec| rec.rec_type == RecType::Breathing).collect();

	assert_eq!(breathing.len(), 1);
	assert_eq!(breathing[0].title, "Second");
	assert_eq!(out.recommendations.len(), 2);
	assert!((out.summary.avg_relevance - 0.55).abs() < 1e-9);
}

#[test]
fn priorities_follow_score_order_with_stable_ties() {
	let out = validate::validate(
		&mind_config::Validation::default(),
		vec![
			candidate("Low", RecType::Exercise, 0.2),
			candidate("B", RecType::Breathing, 0.7),
			candidate("A", RecType::Social, 0.9),
			candidate("C", RecType::Journaling, 0.7),
		],
	)
	.expect("Validation must succeed.");
	let order: Vec<(&str, u8, bool)> = out
		.recommendations
		.iter()
		.map(|rec| (rec.title.as_str(), rec.priority, rec.validated))
		.collect();

	assert_eq!(
		order,
		vec![("A", 1, true), ("B", 2, true), ("C", 3, true), ("Low", 3, false)]
	);
	assert!(out.recommendations.iter().all(|rec| rec.priority != 1 || rec.validated));
}

#[test]
fn non_finite_candidate_fails_validation() {
	let mut broken = candidate("Broken", RecType::Breathing, 0.5);

	broken.relevance_score = f64::NAN;

	let err = validate::validate(&mind_config::Validation::default(), vec![broken])
		.expect_err("Expected a stage error.");

	assert_eq!(err.stage, Stage::Validation);
}

#[test]
fn pattern_insight_is_always_emitted() {
	let insights = insight::generate(
		&mind_config::Insight::default(),
		&mind_config::Analysis::default(),
		&AnalysisSummary::empty(),
		&[],
	)
	.expect("Insight generation must succeed.");

	assert_eq!(insights.len(), 1);
	assert_eq!(insights[0].insight_type, InsightType::Pattern);
	assert_eq!(insights[0].confidence_score, 0.0);
}

#[test]
fn warning_needs_declining_trend_and_a_low_streak() {
	let insight_cfg = mind_config::Insight::default();
	let analysis_cfg = mind_config::Analysis::default();
	let mut declining = summary("sad", 10, Trend::Declining);

	declining.low_mood_streak = 2;

	let mut top = candidate("Self-Compassion Break", RecType::Affirmation, 0.9);

	top.validated = true;

	let insights = insight::generate(&insight_cfg, &analysis_cfg, &declining, &[top])
		.expect("Insight generation must succeed.");
	let warning = insights
		.iter()
		.find(|insight| insight.insight_type == InsightType::Warning)
		.expect("Expected a warning.");

	assert!(warning.actionable);
	assert!(warning.description.contains("Self-Compassion Break"));
	assert!((insights[0].confidence_score - 0.5).abs() < 1e-9);

	declining.low_mood_streak = 1;

	let insights = insight::generate(&insight_cfg, &analysis_cfg, &declining, &[])
		.expect("Insight generation must succeed.");

	assert!(insights.iter().all(|insight| insight.insight_type != InsightType::Warning));
}

#[test]
fn progress_insight_follows_improving_trend() {
	let mut improving = summary("happy", 4, Trend::Improving);

	improving.intensity_change = Some(0.4);

	let insights = insight::generate(
		&mind_config::Insight::default(),
		&mind_config::Analysis::default(),
		&improving,
		&[],
	)
	.expect("Insight generation must succeed.");

	assert!(insights.iter().any(|insight| insight.insight_type == InsightType::Progress));
	assert!(insights.iter().all(|insight| insight.insight_type != InsightType::Warning));
}

#[test]
fn only_activity_correlations_are_actionable() {
	let association = |label: &str, kind: LabelKind, count: u32| Association {
		emotion: "stressed".to_string(),
		label: label.to_string(),
		kind,
		count,
		label_uses: 4,
		mean_intensity: 0.3,
	};
	let mut stressed = summary("stressed", 6, Trend::Stable);

	stressed.associations = vec![
		association("work", LabelKind::Trigger, 3),
		association("coffee", LabelKind::Activity, 2),
		association("commute", LabelKind::Trigger, 1),
	];

	let insights = insight::generate(
		&mind_config::Insight::default(),
		&mind_config::Analysis::default(),
		&stressed,
		&[],
	)
	.expect("Insight generation must succeed.");
	let correlations: Vec<(&str, bool, f64)> = insights
		.iter()
		.filter(|insight| insight.insight_type == InsightType::Correlation)
		.map(|insight| (insight.title.as_str(), insight.actionable, insight.confidence_score))
		.collect();

	assert_eq!(
		correlations,
		vec![("Trigger: work", false, 0.75), ("Activity: coffee", true, 0.5)]
	);
}

#[test]
fn correlation_support_threshold_is_inclusive() {
	let association = |label: &str, count: u32| Association {
		emotion: "sad".to_string(),
		label: label.to_string(),
		kind: LabelKind::Activity,
		count,
		label_uses: 5,
		mean_intensity: 0.3,
	};
	let mut sad = summary("sad", 8, Trend::Stable);

	sad.associations = vec![association("gaming", 3), association("reading", 2)];

	let cfg = mind_config::Insight { min_correlation_support: 3, ..Default::default() };
	let insights = insight::generate(&cfg, &mind_config::Analysis::default(), &sad, &[])
		.expect("Insight generation must succeed.");
	let titles: Vec<&str> = insights
		.iter()
		.filter(|insight| insight.insight_type == InsightType::Correlation)
		.map(|insight| insight.title.as_str())
		.collect();

	assert_eq!(titles, vec!["Activity: gaming"]);
}

#[test]
fn trend_report_ranks_triggers_and_effective_activities() {
	let start = OffsetDateTime::UNIX_EPOCH + Duration::days(20_000);
	let mut graph =
		MoodGraph::new(User::new("demo_user", "Demo User", start).expect("User must validate."));
	let entries = [
		("stressed", 0.2, vec!["work", "exams"], vec!["coffee"]),
		("stressed", 0.3, vec!["work"], vec![]),
		("happy", 0.9, vec!["friends"], vec!["walk", "music"]),
		("calm", 0.8, vec![], vec!["walk"]),
	];

	for (idx, (emotion, intensity, triggers, activities)) in entries.iter().enumerate() {
		let input = NewMoodEntry {
			emotion: emotion.to_string(),
			intensity: *intensity,
			note: String::new(),
			triggers: triggers.iter().map(|name| name.to_string()).collect(),
			activities: activities.iter().map(|name| name.to_string()).collect(),
		};

		graph.add_entry_at(&input, start + Duration::hours(idx as i64)).expect("Valid entry.");
	}

	let report = report::trend_report(&mind_config::Analysis::default(), &graph.snapshot())
		.expect("Report must succeed.");
	let triggers: Vec<&str> = report.top_triggers.iter().map(|label| label.name.as_str()).collect();
	let activities: Vec<&str> =
		report.effective_activities.iter().map(|lift| lift.name.as_str()).collect();

	assert_eq!(report.total_entries, 4);
	assert_eq!(report.dominant_emotion, "stressed");
	assert_eq!(triggers, vec!["work", "exams", "friends"]);
	assert_eq!(activities, vec!["music", "walk"]);
	assert_eq!(report.summary[0], "You have logged 4 mood entries.");
	assert_eq!(report.summary[1], "Stressed makes up 50% of your entries.");
	assert_eq!(report.summary[2], "Music lifts your mood by 35% on average.");
	assert_eq!(report.last_entry_at, Some(start + Duration::hours(3)));
}
