use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
	pub user_id: String,
	pub display_name: String,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct MoodEntryRow {
	pub entry_id: Uuid,
	pub seq: i64,
	pub emotion: String,
	pub intensity: f64,
	pub note: String,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct EntryLabelRow {
	pub entry_id: Uuid,
	pub kind: String,
	pub name: String,
}

/// Position of a user's newest entry; both fields are `None` for an empty log.
#[derive(Debug, sqlx::FromRow)]
pub struct EntryTailRow {
	pub last_seq: Option<i64>,
	pub last_created_at: Option<OffsetDateTime>,
}
