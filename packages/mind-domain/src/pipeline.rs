use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	analyzer::AnalysisSummary, insight::Insight, recommend::Recommendation,
	recommend::TemplateSource, validate::ValidationSummary,
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
	Analysis,
	Recommendation,
	Validation,
	Insight,
}
impl Stage {
	/// Fixed execution order.
	pub const ALL: [Self; 4] = [Self::Analysis, Self::Recommendation, Self::Validation, Self::Insight];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Analysis => "analysis",
			Self::Recommendation => "recommendation",
			Self::Validation => "validation",
			Self::Insight => "insight",
		}
	}

	pub fn agent_name(self) -> &'static str {
		match self {
			Self::Analysis => "mood_analyzer",
			Self::Recommendation => "recommendation",
			Self::Validation => "validation",
			Self::Insight => "insight_generator",
		}
	}

	/// Coordinator state while this stage runs.
	pub fn running_state(self) -> CoordinatorState {
		match self {
			Self::Analysis => CoordinatorState::Analyzing,
			Self::Recommendation => CoordinatorState::Recommending,
			Self::Validation => CoordinatorState::Validating,
			Self::Insight => CoordinatorState::Synthesizing,
		}
	}
}

impl Display for Stage {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
	Ok,
	Skipped,
	Failed,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct StageOutcome {
	pub stage: Stage,
	pub status: StageStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "state", content = "stage", rename_all = "snake_case")]
pub enum CoordinatorState {
	NotStarted,
	Analyzing,
	Recommending,
	Validating,
	Synthesizing,
	Complete,
	Failed(Stage),
}
impl CoordinatorState {
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Complete | Self::Failed(_))
	}

	/// Stage that runs in this state, if any.
	pub fn stage(self) -> Option<Stage> {
		match self {
			Self::Analyzing => Some(Stage::Analysis),
			Self::Recommending => Some(Stage::Recommendation),
			Self::Validating => Some(Stage::Validation),
			Self::Synthesizing => Some(Stage::Insight),
			Self::NotStarted | Self::Complete | Self::Failed(_) => None,
		}
	}

	/// State after the current stage succeeds. Terminal states do not move.
	pub fn advance(self) -> Self {
		match self {
			Self::NotStarted => Self::Analyzing,
			Self::Analyzing => Self::Recommending,
			Self::Recommending => Self::Validating,
			Self::Validating => Self::Synthesizing,
			Self::Synthesizing => Self::Complete,
			Self::Complete | Self::Failed(_) => self,
		}
	}

	/// State after `stage` fails. Terminal states do not move.
	pub fn fail(self, stage: Stage) -> Self {
		if self.is_terminal() { self } else { Self::Failed(stage) }
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PipelineResult {
	pub run_id: Uuid,
	pub user_id: String,
	pub analysis: Option<AnalysisSummary>,
	pub recommendations: Vec<Recommendation>,
	pub validation_summary: Option<ValidationSummary>,
	pub insights: Vec<Insight>,
	/// Stages that actually ran, in order. A failed stage counts as having run.
	pub agents_involved: Vec<Stage>,
	pub stages: Vec<StageOutcome>,
	pub state: CoordinatorState,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub template_source: Option<TemplateSource>,
	#[serde(with = "crate::time_serde")]
	pub started_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub completed_at: OffsetDateTime,
}
impl PipelineResult {
	/// A run that has not executed any stage yet. Every stage starts out skipped.
	pub fn new(run_id: Uuid, user_id: impl Into<String>, started_at: OffsetDateTime) -> Self {
		Self {
			run_id,
			user_id: user_id.into(),
			analysis: None,
			recommendations: Vec::new(),
			validation_summary: None,
			insights: Vec::new(),
			agents_involved: Vec::new(),
			stages: Stage::ALL
				.iter()
				.map(|stage| StageOutcome { stage: *stage, status: StageStatus::Skipped, error: None })
				.collect(),
			state: CoordinatorState::NotStarted,
			template_source: None,
			started_at,
			completed_at: started_at,
		}
	}

	pub fn status_of(&self, stage: Stage) -> StageStatus {
		self.stages
			.iter()
			.find(|outcome| outcome.stage == stage)
			.map(|outcome| outcome.status)
			.unwrap_or(StageStatus::Skipped)
	}

	pub fn failed_stage(&self) -> Option<Stage> {
		match self.state {
			CoordinatorState::Failed(stage) => Some(stage),
			_ => None,
		}
	}

	pub fn is_complete(&self) -> bool {
		self.state == CoordinatorState::Complete
	}

	pub fn record(&mut self, stage: Stage, status: StageStatus, error: Option<String>) {
		if status != StageStatus::Skipped && !self.agents_involved.contains(&stage) {
			self.agents_involved.push(stage);
		}

		match self.stages.iter_mut().find(|outcome| outcome.stage == stage) {
			Some(outcome) => {
				outcome.status = status;
				outcome.error = error;
			},
			None => self.stages.push(StageOutcome { stage, status, error }),
		}
	}
}
