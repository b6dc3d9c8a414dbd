use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{MindService, Result, suggestions};
use mind_domain::{
	graph::{EntryView, NewMoodEntry},
	recommend::Recommendation,
};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LogMoodRequest {
	pub user_id: String,
	#[serde(flatten)]
	pub entry: NewMoodEntry,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LogMoodResponse {
	pub entry: EntryView,
	pub suggestions: Vec<Recommendation>,
	pub fallback: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ListMoodsRequest {
	pub user_id: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ListMoodsResponse {
	pub entries: Vec<EntryView>,
}

impl MindService {
	pub async fn log_mood(&self, req: LogMoodRequest) -> Result<LogMoodResponse> {
		let user_id = crate::require_user_id(&req.user_id)?;
		let entry = self.store.append_entry(user_id, &req.entry, OffsetDateTime::now_utc()).await?;

		tracing::info!(user_id, entry_id = %entry.entry_id, seq = entry.seq, "Mood logged.");

		let suggested = suggestions::suggestions_for(&entry.emotion, Some(entry.intensity));

		Ok(LogMoodResponse {
			entry,
			suggestions: suggested.suggestions,
			fallback: suggested.fallback,
		})
	}

	pub async fn list_moods(&self, req: ListMoodsRequest) -> Result<ListMoodsResponse> {
		let user_id = crate::require_user_id(&req.user_id)?;
		let graph = self.store.load_graph(user_id).await?;

		Ok(ListMoodsResponse { entries: graph.snapshot().views() })
	}
}
