use sqlx::{PgPool, postgres::PgPoolOptions};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{BoxFuture, Error, MoodStore, Result, queries, schema};
use mind_domain::{
	graph::{self, EntryView, MoodGraph, NewMoodEntry, User},
	pipeline::PipelineResult,
};

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &mind_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	/// Connects and bootstraps the schema.
	pub async fn open(cfg: &mind_config::Postgres) -> Result<Self> {
		let db = Self::connect(cfg).await?;

		db.ensure_schema().await?;

		Ok(db)
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let sql = schema::render_schema();
		let lock_id: i64 = 6_463_114;
		// Advisory locks are held per connection. Use a single transaction so the lock is scoped to
		// one connection and released when the transaction ends.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}

	async fn require_user(&self, user_id: &str) -> Result<User> {
		let mut conn = self.pool.acquire().await?;

		queries::fetch_user(&mut conn, user_id)
			.await?
			.ok_or_else(|| Error::NotFound(format!("User {user_id} does not exist.")))
	}

	async fn load_graph_inner(&self, user_id: &str) -> Result<MoodGraph> {
		let user = self.require_user(user_id).await?;
		let mut conn = self.pool.acquire().await?;

		queries::load_graph(&mut conn, user).await
	}

	async fn append_entry_inner(
		&self,
		user_id: &str,
		entry: &NewMoodEntry,
		now: OffsetDateTime,
	) -> Result<EntryView> {
		let valid = entry.validate()?;
		let mut tx = self.pool.begin().await?;

		queries::lock_user(&mut tx, user_id).await?;

		let (seq, last_created_at) = queries::fetch_tail(&mut tx, user_id).await?;
		let stored = EntryView {
			entry_id: Uuid::new_v4(),
			seq,
			emotion: valid.emotion().to_string(),
			intensity: valid.intensity(),
			note: valid.note().to_string(),
			created_at: graph::next_created_at(last_created_at, queries::truncate_to_micros(now)),
			triggers: valid.triggers().to_vec(),
			activities: valid.activities().to_vec(),
		};

		queries::insert_entry(&mut tx, user_id, &stored).await?;

		tx.commit().await?;

		Ok(stored)
	}

	async fn last_run_inner(&self, user_id: &str) -> Result<Option<PipelineResult>> {
		let mut conn = self.pool.acquire().await?;

		queries::fetch_last_run(&mut conn, user_id).await
	}

	async fn save_run_inner(&self, run: &PipelineResult) -> Result<()> {
		let mut conn = self.pool.acquire().await?;

		queries::upsert_run(&mut conn, run).await
	}
}

impl MoodStore for Db {
	fn create_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut conn = self.pool.acquire().await?;

			queries::insert_user(&mut conn, user).await
		})
	}

	fn load_graph<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<MoodGraph>> {
		Box::pin(self.load_graph_inner(user_id))
	}

	fn append_entry<'a>(
		&'a self,
		user_id: &'a str,
		entry: &'a NewMoodEntry,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<EntryView>> {
		Box::pin(self.append_entry_inner(user_id, entry, now))
	}

	fn last_run<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<PipelineResult>>> {
		Box::pin(self.last_run_inner(user_id))
	}

	fn save_run<'a>(&'a self, run: &'a PipelineResult) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.save_run_inner(run))
	}
}
