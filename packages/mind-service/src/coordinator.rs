use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use mind_config::Config;
use mind_domain::{
	StageError,
	analyzer::{self, AnalysisSummary},
	graph::MoodSnapshot,
	insight::{self, Insight},
	pipeline::{PipelineResult, StageStatus},
	recommend::{self, Recommendation, RecommendationDraft, RecommendationInput, TemplateSource},
	validate::{self, ValidatedRecommendations},
};

pub trait MoodAnalyzerAgent
where
	Self: Send + Sync,
{
	fn analyze(&self, cfg: &Config, snapshot: &MoodSnapshot) -> Result<AnalysisSummary, StageError>;
}

pub trait RecommendationAgent
where
	Self: Send + Sync,
{
	fn recommend(
		&self,
		cfg: &Config,
		input: RecommendationInput<'_>,
	) -> Result<RecommendationDraft, StageError>;
}

pub trait ValidationAgent
where
	Self: Send + Sync,
{
	fn validate(
		&self,
		cfg: &Config,
		candidates: Vec<Recommendation>,
	) -> Result<ValidatedRecommendations, StageError>;
}

pub trait InsightGeneratorAgent
where
	Self: Send + Sync,
{
	fn generate(
		&self,
		cfg: &Config,
		summary: &AnalysisSummary,
		recommendations: &[Recommendation],
	) -> Result<Vec<Insight>, StageError>;
}

#[derive(Clone)]
pub struct Agents {
	pub analyzer: Arc<dyn MoodAnalyzerAgent>,
	pub recommender: Arc<dyn RecommendationAgent>,
	pub validator: Arc<dyn ValidationAgent>,
	pub insight_generator: Arc<dyn InsightGeneratorAgent>,
}
impl Agents {
	pub fn new(
		analyzer: Arc<dyn MoodAnalyzerAgent>,
		recommender: Arc<dyn RecommendationAgent>,
		validator: Arc<dyn ValidationAgent>,
		insight_generator: Arc<dyn InsightGeneratorAgent>,
	) -> Self {
		Self { analyzer, recommender, validator, insight_generator }
	}
}

impl Default for Agents {
	fn default() -> Self {
		let agent = Arc::new(DefaultAgents);

		Self {
			analyzer: agent.clone(),
			recommender: agent.clone(),
			validator: agent.clone(),
			insight_generator: agent,
		}
	}
}

struct DefaultAgents;

impl MoodAnalyzerAgent for DefaultAgents {
	fn analyze(&self, cfg: &Config, snapshot: &MoodSnapshot) -> Result<AnalysisSummary, StageError> {
		analyzer::analyze(&cfg.analysis, snapshot)
	}
}

impl RecommendationAgent for DefaultAgents {
	fn recommend(
		&self,
		cfg: &Config,
		input: RecommendationInput<'_>,
	) -> Result<RecommendationDraft, StageError> {
		Ok(recommend::recommend(&cfg.recommendation, input))
	}
}

impl ValidationAgent for DefaultAgents {
	fn validate(
		&self,
		cfg: &Config,
		candidates: Vec<Recommendation>,
	) -> Result<ValidatedRecommendations, StageError> {
		validate::validate(&cfg.validation, candidates)
	}
}

impl InsightGeneratorAgent for DefaultAgents {
	fn generate(
		&self,
		cfg: &Config,
		summary: &AnalysisSummary,
		recommendations: &[Recommendation],
	) -> Result<Vec<Insight>, StageError> {
		insight::generate(&cfg.insight, &cfg.analysis, summary, recommendations)
	}
}

/// Runs the four stages in order over one snapshot.
///
/// A failing stage is recorded as failed, later stages are left skipped, and the partial result is
/// returned instead of an error.
pub struct SystemCoordinator<'a> {
	cfg: &'a Config,
	agents: &'a Agents,
}
impl<'a> SystemCoordinator<'a> {
	pub fn new(cfg: &'a Config, agents: &'a Agents) -> Self {
		Self { cfg, agents }
	}

	pub fn run(
		&self,
		run_id: Uuid,
		snapshot: &MoodSnapshot,
		previous: Option<&PipelineResult>,
	) -> PipelineResult {
		let mut result = PipelineResult::new(run_id, snapshot.user_id(), OffsetDateTime::now_utc());

		result.state = result.state.advance();

		self.enter(&result);

		let outcome = self.agents.analyzer.analyze(self.cfg, snapshot);
		let Some(summary) = self.settle(&mut result, outcome) else {
			return self.finish(result);
		};

		result.analysis = Some(summary.clone());

		self.enter(&result);

		let frequencies = snapshot.frequencies();
		let input = RecommendationInput { summary: &summary, frequencies: &frequencies, previous };
		let outcome = self.agents.recommender.recommend(self.cfg, input);
		let Some(draft) = self.settle(&mut result, outcome) else {
			return self.finish(result);
		};

		if let TemplateSource::Fallback { requested, reason } = &draft.template_source {
			tracing::warn!(
				user_id = %result.user_id,
				requested_emotion = %requested,
				reason = ?reason,
				"Using fallback recommendation templates."
			);
		}

		result.template_source = Some(draft.template_source);

		self.enter(&result);

		let outcome = self.agents.validator.validate(self.cfg, draft.candidates);
		let Some(validated) = self.settle(&mut result, outcome) else {
			return self.finish(result);
		};

		result.recommendations = validated.recommendations;
		result.validation_summary = Some(validated.summary);

		self.enter(&result);

		let outcome =
			self.agents.insight_generator.generate(self.cfg, &summary, &result.recommendations);

		if let Some(insights) = self.settle(&mut result, outcome) {
			result.insights = insights;
		}

		self.finish(result)
	}

	fn enter(&self, result: &PipelineResult) {
		if let Some(stage) = result.state.stage() {
			tracing::debug!(
				user_id = %result.user_id,
				run_id = %result.run_id,
				stage = stage.as_str(),
				agent = stage.agent_name(),
				"Pipeline stage started."
			);
		}
	}

	/// Records the outcome of the running stage and moves the state machine on.
	fn settle<T>(&self, result: &mut PipelineResult, outcome: Result<T, StageError>) -> Option<T> {
		let stage = result.state.stage()?;

		match outcome {
			Ok(value) => {
				result.record(stage, StageStatus::Ok, None);
				result.state = result.state.advance();

				tracing::debug!(
					user_id = %result.user_id,
					run_id = %result.run_id,
					stage = stage.as_str(),
					"Pipeline stage finished."
				);

				Some(value)
			},
			Err(err) => {
				tracing::warn!(
					user_id = %result.user_id,
					run_id = %result.run_id,
					stage = stage.as_str(),
					error = %err,
					"Pipeline stage failed."
				);

				result.record(stage, StageStatus::Failed, Some(err.message));
				result.state = result.state.fail(stage);

				None
			},
		}
	}

	fn finish(&self, mut result: PipelineResult) -> PipelineResult {
		result.completed_at = OffsetDateTime::now_utc();

		tracing::info!(
			user_id = %result.user_id,
			run_id = %result.run_id,
			complete = result.is_complete(),
			failed_stage = result.failed_stage().map(|stage| stage.as_str()),
			"Pipeline run finished."
		);

		result
	}
}
