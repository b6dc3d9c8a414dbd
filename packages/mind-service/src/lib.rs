pub mod coordinator;
pub mod moods;
pub mod pipeline;
pub mod suggestions;
pub mod trends;
pub mod users;

mod error;

pub use coordinator::{
	Agents, InsightGeneratorAgent, MoodAnalyzerAgent, RecommendationAgent, SystemCoordinator,
	ValidationAgent,
};
pub use error::{Error, Result};
pub use moods::{ListMoodsRequest, ListMoodsResponse, LogMoodRequest, LogMoodResponse};
pub use pipeline::RunPipelineRequest;
pub use suggestions::{SuggestionsRequest, SuggestionsResponse};
pub use trends::TrendsRequest;
pub use users::{CreateUserRequest, CreateUserResponse};

use std::sync::Arc;

use mind_config::Config;
use mind_storage::MoodStore;

pub struct MindService {
	pub cfg: Config,
	pub store: Arc<dyn MoodStore>,
	pub agents: Agents,
}
impl MindService {
	pub fn new(cfg: Config, store: Arc<dyn MoodStore>) -> Self {
		Self { cfg, store, agents: Agents::default() }
	}

	pub fn with_agents(cfg: Config, store: Arc<dyn MoodStore>, agents: Agents) -> Self {
		Self { cfg, store, agents }
	}
}

pub(crate) fn require_user_id(raw: &str) -> Result<&str> {
	let user_id = raw.trim();

	if user_id.is_empty() {
		return Err(Error::InvalidRequest { message: "user_id is required.".to_string() });
	}

	Ok(user_id)
}
