use std::collections::HashMap;

use serde_json::Value;
use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{EntryLabelRow, EntryTailRow, MoodEntryRow, UserRow},
};
use mind_domain::{
	graph::{EntryView, MoodGraph, NewMoodEntry, User},
	label::LabelKind,
	pipeline::PipelineResult,
};

pub async fn insert_user(conn: &mut PgConnection, user: &User) -> Result<()> {
	let inserted = sqlx::query(
		"\
INSERT INTO users (user_id, display_name, created_at)
VALUES ($1, $2, $3)
ON CONFLICT (user_id) DO NOTHING",
	)
	.bind(user.user_id.as_str())
	.bind(user.display_name.as_str())
	.bind(user.created_at)
	.execute(conn)
	.await?
	.rows_affected();

	if inserted == 0 {
		return Err(Error::Conflict(format!("User {} already exists.", user.user_id)));
	}

	Ok(())
}

pub async fn fetch_user(conn: &mut PgConnection, user_id: &str) -> Result<Option<User>> {
	let row: Option<UserRow> = sqlx::query_as(
		"\
SELECT user_id, display_name, created_at
FROM users
WHERE user_id = $1",
	)
	.bind(user_id)
	.fetch_optional(conn)
	.await?;

	Ok(row.map(|row| User {
		user_id: row.user_id,
		display_name: row.display_name,
		created_at: row.created_at,
	}))
}

/// Locks the user row for the rest of the transaction so appends for one user serialize.
pub async fn lock_user(conn: &mut PgConnection, user_id: &str) -> Result<()> {
	let locked: Option<String> =
		sqlx::query_scalar("SELECT user_id FROM users WHERE user_id = $1 FOR UPDATE")
			.bind(user_id)
			.fetch_optional(conn)
			.await?;

	if locked.is_none() {
		return Err(Error::NotFound(format!("User {user_id} does not exist.")));
	}

	Ok(())
}

/// Rebuilds the user's graph from stored entries, oldest first.
pub async fn load_graph(conn: &mut PgConnection, user: User) -> Result<MoodGraph> {
	let entries: Vec<MoodEntryRow> = sqlx::query_as(
		"\
SELECT entry_id, seq, emotion, intensity, note, created_at
FROM mood_entries
WHERE user_id = $1
ORDER BY seq ASC",
	)
	.bind(user.user_id.as_str())
	.fetch_all(&mut *conn)
	.await?;
	let labels: Vec<EntryLabelRow> = sqlx::query_as(
		"\
SELECT el.entry_id, l.kind, l.name
FROM mood_entry_labels el
JOIN mood_labels l ON l.label_id = el.label_id
WHERE l.user_id = $1
ORDER BY el.entry_id ASC, el.position ASC",
	)
	.bind(user.user_id.as_str())
	.fetch_all(&mut *conn)
	.await?;
	let mut labels_by_entry: HashMap<Uuid, Vec<EntryLabelRow>> = HashMap::new();

	for label in labels {
		labels_by_entry.entry(label.entry_id).or_default().push(label);
	}

	let mut graph = MoodGraph::new(user);

	for row in entries {
		let mut input = NewMoodEntry {
			emotion: row.emotion,
			intensity: row.intensity,
			note: row.note,
			triggers: Vec::new(),
			activities: Vec::new(),
		};

		for label in labels_by_entry.remove(&row.entry_id).unwrap_or_default() {
			match label.kind.as_str() {
				"trigger" => input.triggers.push(label.name),
				"activity" => input.activities.push(label.name),
				other => {
					return Err(Error::Conflict(format!(
						"Entry {} references a label of unknown kind {other:?}.",
						row.entry_id
					)));
				},
			}
		}

		let valid = input.validate()?;

		graph.append(row.entry_id, valid, row.created_at);
	}

	Ok(graph)
}

/// Sequence number and creation time the next appended entry must follow.
pub async fn fetch_tail(
	conn: &mut PgConnection,
	user_id: &str,
) -> Result<(u64, Option<OffsetDateTime>)> {
	let tail: EntryTailRow = sqlx::query_as(
		"\
SELECT max(seq) AS last_seq, max(created_at) AS last_created_at
FROM mood_entries
WHERE user_id = $1",
	)
	.bind(user_id)
	.fetch_one(conn)
	.await?;
	let next_seq = tail.last_seq.map_or(0, |seq| seq as u64 + 1);

	Ok((next_seq, tail.last_created_at))
}

pub async fn insert_entry(conn: &mut PgConnection, user_id: &str, entry: &EntryView) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO mood_entries (entry_id, user_id, seq, emotion, intensity, note, created_at)
VALUES ($1, $2, $3, $4, $5, $6, $7)",
	)
	.bind(entry.entry_id)
	.bind(user_id)
	.bind(entry.seq as i64)
	.bind(entry.emotion.as_str())
	.bind(entry.intensity)
	.bind(entry.note.as_str())
	.bind(entry.created_at)
	.execute(&mut *conn)
	.await?;

	let triggers = entry.triggers.iter().map(|name| (LabelKind::Trigger, name));
	let activities = entry.activities.iter().map(|name| (LabelKind::Activity, name));

	for (position, (kind, name)) in triggers.chain(activities).enumerate() {
		let label_id = upsert_label(&mut *conn, user_id, kind, name).await?;

		sqlx::query(
			"\
INSERT INTO mood_entry_labels (entry_id, label_id, position)
VALUES ($1, $2, $3)",
		)
		.bind(entry.entry_id)
		.bind(label_id)
		.bind(position as i32)
		.execute(&mut *conn)
		.await?;
	}

	Ok(())
}

pub async fn upsert_label(
	conn: &mut PgConnection,
	user_id: &str,
	kind: LabelKind,
	name: &str,
) -> Result<Uuid> {
	let label_id: Uuid = sqlx::query_scalar(
		"\
INSERT INTO mood_labels (label_id, user_id, kind, name)
VALUES ($1, $2, $3, $4)
ON CONFLICT (user_id, kind, name) DO UPDATE SET name = EXCLUDED.name
RETURNING label_id",
	)
	.bind(Uuid::new_v4())
	.bind(user_id)
	.bind(kind.as_str())
	.bind(name)
	.fetch_one(conn)
	.await?;

	Ok(label_id)
}

pub async fn fetch_last_run(
	conn: &mut PgConnection,
	user_id: &str,
) -> Result<Option<PipelineResult>> {
	let raw: Option<Value> =
		sqlx::query_scalar("SELECT result FROM pipeline_runs WHERE user_id = $1")
			.bind(user_id)
			.fetch_optional(conn)
			.await?;

	match raw {
		Some(raw) => Ok(Some(serde_json::from_value(raw)?)),
		None => Ok(None),
	}
}

pub async fn upsert_run(conn: &mut PgConnection, run: &PipelineResult) -> Result<()> {
	let raw = serde_json::to_value(run)?;

	sqlx::query(
		"\
INSERT INTO pipeline_runs (user_id, run_id, result, completed_at)
VALUES ($1, $2, $3, $4)
ON CONFLICT (user_id) DO UPDATE
SET run_id = EXCLUDED.run_id, result = EXCLUDED.result, completed_at = EXCLUDED.completed_at
WHERE pipeline_runs.completed_at <= EXCLUDED.completed_at",
	)
	.bind(run.user_id.as_str())
	.bind(run.run_id)
	.bind(raw)
	.bind(run.completed_at)
	.execute(conn)
	.await?;

	Ok(())
}

/// Postgres keeps microseconds, so timestamps are truncated before they enter a graph.
pub fn truncate_to_micros(ts: OffsetDateTime) -> OffsetDateTime {
	ts.replace_nanosecond(ts.nanosecond() / 1_000 * 1_000).unwrap_or(ts)
}
