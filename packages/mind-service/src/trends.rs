use serde::{Deserialize, Serialize};

use crate::{MindService, Result};
use mind_domain::report::{self, TrendReport};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TrendsRequest {
	pub user_id: String,
}

impl MindService {
	pub async fn trend_report(&self, req: TrendsRequest) -> Result<TrendReport> {
		let user_id = crate::require_user_id(&req.user_id)?;
		let graph = self.store.load_graph(user_id).await?;

		Ok(report::trend_report(&self.cfg.analysis, &graph.snapshot())?)
	}
}
