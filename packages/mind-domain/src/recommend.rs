use serde::{Deserialize, Serialize};

use crate::{
	analyzer::{AnalysisSummary, Trend},
	graph::LabelFrequencies,
	label,
	pipeline::PipelineResult,
};

pub const LOWEST_PRIORITY: u8 = 3;
/// Emotion whose templates stand in for any emotion without its own set.
pub const FALLBACK_EMOTION: &str = "anxious";

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecType {
	Breathing,
	Exercise,
	Journaling,
	Social,
	Mindfulness,
	Organization,
	Affirmation,
}
impl RecType {
	pub const ALL: [Self; 7] = [
		Self::Breathing,
		Self::Exercise,
		Self::Journaling,
		Self::Social,
		Self::Mindfulness,
		Self::Organization,
		Self::Affirmation,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Breathing => "breathing",
			Self::Exercise => "exercise",
			Self::Journaling => "journaling",
			Self::Social => "social",
			Self::Mindfulness => "mindfulness",
			Self::Organization => "organization",
			Self::Affirmation => "affirmation",
		}
	}

	/// Types that help in the moment when mood is sliding.
	pub fn is_coping(self) -> bool {
		matches!(self, Self::Breathing | Self::Mindfulness | Self::Affirmation)
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Recommendation {
	pub title: String,
	pub content: String,
	pub rec_type: RecType,
	pub relevance_score: f64,
	/// 1 is the highest priority.
	pub priority: u8,
	pub validated: bool,
}
impl Recommendation {
	pub fn new(
		title: impl Into<String>,
		content: impl Into<String>,
		rec_type: RecType,
		relevance_score: f64,
	) -> Self {
		Self {
			title: title.into(),
			content: content.into(),
			rec_type,
			relevance_score: clamp_score(relevance_score),
			priority: LOWEST_PRIORITY,
			validated: false,
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
	/// The emotion has no template set of its own.
	Unrecognized,
	/// There were no entries to take an emotion from.
	NoData,
}

/// Where a recommendation set came from. Fallbacks are always reported, never silent.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateSource {
	Matched { emotion: String },
	Fallback { requested: String, reason: FallbackReason },
}
impl TemplateSource {
	pub fn is_fallback(&self) -> bool {
		matches!(self, Self::Fallback { .. })
	}
}

#[derive(Clone, Copy, Debug)]
pub struct Template {
	pub title: &'static str,
	pub content: &'static str,
	pub rec_type: RecType,
	pub base_score: f64,
}
impl Template {
	pub fn to_recommendation(&self, relevance_score: f64) -> Recommendation {
		Recommendation::new(self.title, self.content, self.rec_type, relevance_score)
	}
}

struct TemplateSet {
	emotions: &'static [&'static str],
	templates: &'static [Template],
}

const fn template(
	title: &'static str,
	content: &'static str,
	rec_type: RecType,
	base_score: f64,
) -> Template {
	Template { title, content, rec_type, base_score }
}

static CATALOG: &[TemplateSet] = &[
	TemplateSet {
		emotions: &["anxious", "nervous", "worried", "fearful", "scared"],
		templates: &[
			template(
				"Box Breathing",
				"Breathe in for 4 seconds, hold for 4, out for 4, hold for 4. Repeat 5 times.",
				RecType::Breathing,
				0.7,
			),
			template(
				"Progressive Muscle Relaxation",
				"Tense and release each muscle group, starting from your toes.",
				RecType::Exercise,
				0.6,
			),
			template(
				"Worry Window",
				"Write your worries down and set them aside until a fixed 15 minute slot later today.",
				RecType::Journaling,
				0.45,
			),
		],
	},
	TemplateSet {
		emotions: &["happy", "joyful", "excited", "proud", "grateful"],
		templates: &[
			template(
				"Gratitude Journal",
				"Write down 3 things you're grateful for today.",
				RecType::Journaling,
				0.65,
			),
			template(
				"Share Your Joy",
				"Call a friend or family member and share what made you happy.",
				RecType::Social,
				0.6,
			),
			template(
				"Savor the Moment",
				"Pause for one minute and notice what this good feeling is like in your body.",
				RecType::Mindfulness,
				0.45,
			),
		],
	},
	TemplateSet {
		emotions: &["sad", "down", "lonely", "grieving", "hopeless"],
		templates: &[
			template(
				"Self-Compassion Break",
				"Place your hand on your heart. Say: 'This is a moment of suffering. Suffering is part of life. May I be kind to myself.'",
				RecType::Affirmation,
				0.7,
			),
			template(
				"Gentle Movement",
				"Take a short walk outside or do some light stretching.",
				RecType::Exercise,
				0.6,
			),
			template(
				"Reach Out",
				"Send a short message to someone you trust, even just to say hello.",
				RecType::Social,
				0.5,
			),
		],
	},
	TemplateSet {
		emotions: &["stressed", "overwhelmed", "busy", "pressured"],
		templates: &[
			template(
				"5-4-3-2-1 Grounding",
				"Name 5 things you see, 4 you can touch, 3 you hear, 2 you smell, 1 you taste.",
				RecType::Mindfulness,
				0.7,
			),
			template(
				"Time Management",
				"Write down your top 3 priorities for today. Focus on one at a time.",
				RecType::Organization,
				0.6,
			),
			template(
				"Deep Breathing",
				"Try 4-7-8 breathing: Inhale for 4, hold for 7, exhale for 8. Repeat 4 times.",
				RecType::Breathing,
				0.5,
			),
		],
	},
	TemplateSet {
		emotions: &["angry", "frustrated", "irritated", "annoyed"],
		templates: &[
			template(
				"Cool-Down Breathing",
				"Exhale slowly for twice as long as you inhale, ten times in a row.",
				RecType::Breathing,
				0.65,
			),
			template(
				"Burn It Off",
				"Do ten minutes of brisk exercise to release the tension.",
				RecType::Exercise,
				0.6,
			),
			template(
				"Unsent Letter",
				"Write everything you want to say to the situation, then put the page away.",
				RecType::Journaling,
				0.5,
			),
		],
	},
	TemplateSet {
		emotions: &["tired", "exhausted", "drained", "sleepy"],
		templates: &[
			template(
				"Body Scan",
				"Lie down and move your attention slowly from your feet to the top of your head.",
				RecType::Mindfulness,
				0.6,
			),
			template(
				"Plan a Rest Block",
				"Block out 30 minutes in your calendar today with nothing scheduled.",
				RecType::Organization,
				0.5,
			),
			template(
				"Stretch Break",
				"Stand up and stretch your neck, shoulders, and back for two minutes.",
				RecType::Exercise,
				0.45,
			),
		],
	},
	TemplateSet {
		emotions: &["calm", "content", "relaxed", "peaceful"],
		templates: &[
			template(
				"Mindful Check-In",
				"Take a moment to notice what helped you feel this settled so you can return to it.",
				RecType::Mindfulness,
				0.6,
			),
			template(
				"Positive Affirmation",
				"You are doing your best, and that is enough.",
				RecType::Affirmation,
				0.55,
			),
		],
	},
	TemplateSet {
		emotions: &["hopeful", "optimistic", "motivated", "inspired"],
		templates: &[
			template(
				"Goal Mapping",
				"Write down one goal and the very next step that moves you toward it.",
				RecType::Organization,
				0.6,
			),
			template(
				"Daily Affirmation",
				"You are strong, capable, and worthy of peace.",
				RecType::Affirmation,
				0.55,
			),
			template(
				"Visualize the Next Step",
				"Close your eyes and picture yourself completing today's next step.",
				RecType::Mindfulness,
				0.45,
			),
		],
	},
];

/// Word prefixes in trigger and activity names that relate to a recommendation type.
static AFFINITY_KEYWORDS: &[(&str, RecType)] = &[
	("breath", RecType::Breathing),
	("meditat", RecType::Mindfulness),
	("mindful", RecType::Mindfulness),
	("sleep", RecType::Mindfulness),
	("exercis", RecType::Exercise),
	("walk", RecType::Exercise),
	("run", RecType::Exercise),
	("gym", RecType::Exercise),
	("sport", RecType::Exercise),
	("stretch", RecType::Exercise),
	("yoga", RecType::Exercise),
	("journal", RecType::Journaling),
	("writ", RecType::Journaling),
	("reflect", RecType::Journaling),
	("friend", RecType::Social),
	("family", RecType::Social),
	("social", RecType::Social),
	("call", RecType::Social),
	("talk", RecType::Social),
	("lonel", RecType::Social),
	("plan", RecType::Organization),
	("goal", RecType::Organization),
	("work", RecType::Organization),
	("deadline", RecType::Organization),
	("study", RecType::Organization),
	("exam", RecType::Organization),
	("gratitude", RecType::Affirmation),
	("affirm", RecType::Affirmation),
	("achievement", RecType::Affirmation),
];

pub struct RecommendationInput<'a> {
	pub summary: &'a AnalysisSummary,
	pub frequencies: &'a LabelFrequencies,
	/// The user's immediately preceding run, when one is known.
	pub previous: Option<&'a PipelineResult>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecommendationDraft {
	pub candidates: Vec<Recommendation>,
	pub template_source: TemplateSource,
}

pub fn recommend(
	cfg: &mind_config::Recommendation,
	input: RecommendationInput<'_>,
) -> RecommendationDraft {
	let RecommendationInput { summary, frequencies, previous } = input;
	let (template_source, templates) = if summary.has_data() {
		templates_for(&summary.dominant_emotion)
	} else {
		(
			TemplateSource::Fallback {
				requested: summary.dominant_emotion.clone(),
				reason: FallbackReason::NoData,
			},
			fallback_templates(),
		)
	};
	let favored = favored_types(frequencies, cfg.frequent_label_min_uses);
	let repeated = previous.map(previously_recommended).unwrap_or_default();
	let candidates = templates
		.iter()
		.map(|template| {
			let mut score = template.base_score;

			if favored.contains(&template.rec_type) {
				score += cfg.affinity_boost;
			}
			if summary.trend == Trend::Declining && template.rec_type.is_coping() {
				score += cfg.declining_boost;
			}
			if repeated.contains(&template.rec_type) {
				score -= cfg.repetition_penalty;
			}

			template.to_recommendation(score.min(1.0))
		})
		.collect();

	RecommendationDraft { candidates, template_source }
}

/// Template set for an emotion, falling back to the anxious set for unknown emotions.
pub fn templates_for(emotion: &str) -> (TemplateSource, &'static [Template]) {
	let normalized = label::normalize_label(emotion);

	match CATALOG.iter().find(|set| set.emotions.iter().any(|known| *known == normalized)) {
		Some(set) => (TemplateSource::Matched { emotion: normalized }, set.templates),
		None => (
			TemplateSource::Fallback { requested: normalized, reason: FallbackReason::Unrecognized },
			fallback_templates(),
		),
	}
}

/// Recommendation types related to a trigger or activity name.
pub fn affinities(label_name: &str) -> Vec<RecType> {
	let mut out = Vec::new();

	for word in label_name.split(|ch: char| !ch.is_alphanumeric()).filter(|word| !word.is_empty()) {
		for (prefix, rec_type) in AFFINITY_KEYWORDS {
			if word.starts_with(*prefix) && !out.contains(rec_type) {
				out.push(*rec_type);
			}
		}
	}

	out
}

pub fn clamp_score(score: f64) -> f64 {
	if score.is_nan() {
		return 0.0;
	}

	score.clamp(0.0, 1.0)
}

fn fallback_templates() -> &'static [Template] {
	CATALOG
		.iter()
		.find(|set| set.emotions.contains(&FALLBACK_EMOTION))
		.map(|set| set.templates)
		.unwrap_or(&[])
}

fn favored_types(frequencies: &LabelFrequencies, min_uses: u32) -> Vec<RecType> {
	let mut out = Vec::new();

	for (_, name) in frequencies.frequent(min_uses) {
		for rec_type in affinities(name) {
			if !out.contains(&rec_type) {
				out.push(rec_type);
			}
		}
	}

	out
}

fn previously_recommended(previous: &PipelineResult) -> Vec<RecType> {
	previous.recommendations.iter().filter(|rec| rec.validated).map(|rec| rec.rec_type).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_set_has_at_least_two_templates() {
		for set in CATALOG {
			assert!(set.templates.len() >= 2, "Set {:?} is too small.", set.emotions);
		}
	}

	#[test]
	fn emotions_map_to_exactly_one_set() {
		for set in CATALOG {
			for emotion in set.emotions {
				let owners = CATALOG.iter().filter(|other| other.emotions.contains(emotion)).count();

				assert_eq!(owners, 1, "Emotion {emotion} appears in {owners} sets.");
			}
		}
	}

	#[test]
	fn affinities_match_word_prefixes_only() {
		assert_eq!(affinities("morning running"), vec![RecType::Exercise]);
		assert_eq!(affinities("goal_setting"), vec![RecType::Organization]);
		assert!(affinities("brunch").is_empty());
	}

	#[test]
	fn nan_scores_clamp_to_zero() {
		assert_eq!(clamp_score(f64::NAN), 0.0);
		assert_eq!(clamp_score(1.4), 1.0);
		assert_eq!(clamp_score(-0.2), 0.0);
	}
}
