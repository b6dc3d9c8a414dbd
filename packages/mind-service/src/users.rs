use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{MindService, Result};
use mind_domain::graph::User;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CreateUserRequest {
	/// Generated when absent.
	#[serde(default)]
	pub user_id: Option<String>,
	pub display_name: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CreateUserResponse {
	pub user: User,
}

impl MindService {
	pub async fn create_user(&self, req: CreateUserRequest) -> Result<CreateUserResponse> {
		let user_id = match req.user_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
			Some(user_id) => user_id.to_string(),
			None => Uuid::new_v4().simple().to_string(),
		};
		let user = User::new(&user_id, &req.display_name, OffsetDateTime::now_utc())?;

		self.store.create_user(&user).await?;

		tracing::info!(user_id = %user.user_id, "User created.");

		Ok(CreateUserResponse { user })
	}
}
