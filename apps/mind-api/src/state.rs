use std::sync::Arc;

use color_eyre::eyre;

use mind_service::MindService;
use mind_storage::{MoodStore, db::Db, memory::MemoryStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<MindService>,
}
impl AppState {
	pub async fn new(config: mind_config::Config) -> color_eyre::Result<Self> {
		let store: Arc<dyn MoodStore> = match config.storage.backend.as_str() {
			mind_config::BACKEND_MEMORY => Arc::new(MemoryStore::new()),
			mind_config::BACKEND_POSTGRES => {
				let Some(pg) = config.storage.postgres.as_ref() else {
					return Err(eyre::eyre!("storage.postgres is required for the postgres backend."));
				};

				Arc::new(Db::open(pg).await?)
			},
			other => return Err(eyre::eyre!("Unsupported storage backend {other:?}.")),
		};

		tracing::info!(backend = %config.storage.backend, "Mood store ready.");

		Ok(Self::with_service(MindService::new(config, store)))
	}

	pub fn with_service(service: MindService) -> Self {
		Self { service: Arc::new(service) }
	}
}
