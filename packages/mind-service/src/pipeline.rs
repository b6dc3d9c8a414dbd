use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{MindService, Result, SystemCoordinator};
use mind_domain::{graph::NewMoodEntry, pipeline::PipelineResult};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RunPipelineRequest {
	pub user_id: String,
	/// Appended before the snapshot is taken, so the run sees it.
	#[serde(default)]
	pub entry: Option<NewMoodEntry>,
}

impl MindService {
	/// Runs the analysis pipeline over the user's current mood graph.
	///
	/// Stage failures do not surface as errors; they are recorded in the returned result. Only
	/// request and storage problems before the run starts are errors.
	pub async fn run_pipeline(&self, req: RunPipelineRequest) -> Result<PipelineResult> {
		let user_id = crate::require_user_id(&req.user_id)?;

		if let Some(entry) = req.entry.as_ref() {
			let stored =
				self.store.append_entry(user_id, entry, OffsetDateTime::now_utc()).await?;

			tracing::info!(user_id, entry_id = %stored.entry_id, "Mood logged before pipeline run.");
		}

		let snapshot = self.store.load_graph(user_id).await?.snapshot();
		let previous = match self.store.last_run(user_id).await {
			Ok(previous) => previous,
			Err(err) => {
				tracing::warn!(
					user_id,
					error = %err,
					"Previous pipeline run is unavailable; skipping the repetition penalty."
				);

				None
			},
		};
		let result = SystemCoordinator::new(&self.cfg, &self.agents).run(
			Uuid::new_v4(),
			&snapshot,
			previous.as_ref(),
		);

		if let Err(err) = self.store.save_run(&result).await {
			tracing::error!(
				user_id,
				run_id = %result.run_id,
				error = %err,
				"Failed to save pipeline run."
			);
		}

		Ok(result)
	}
}
