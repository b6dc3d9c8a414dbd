//! Throwaway Postgres databases for the ignored storage and service tests.

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

pub const DSN_ENV: &str = "MIND_PG_DSN";

/// Database the test databases are created from and dropped through.
const ADMIN_DATABASE: &str = "postgres";

pub fn env_dsn() -> Option<String> {
	env::var(DSN_ENV).ok().filter(|dsn| !dsn.trim().is_empty())
}

/// A uniquely named database on the server behind `MIND_PG_DSN`.
///
/// Dropped by `cleanup`, or on `Drop` when a test panics first.
pub struct TestDatabase {
	admin: PgConnectOptions,
	name: String,
	dropped: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn)
			.map_err(|source| Error::Dsn { dsn_env: DSN_ENV, source })?;
		let admin = base.database(ADMIN_DATABASE);
		let name = format!("mind_test_{}", Uuid::new_v4().simple());
		let mut conn = PgConnection::connect_with(&admin).await?;

		sqlx::query(&format!(r#"CREATE DATABASE "{name}""#)).execute(&mut conn).await?;
		conn.close().await?;

		Ok(Self { admin, name, dropped: false })
	}

	/// Storage config pointing at this database.
	pub fn postgres(&self, pool_max_conns: u32) -> mind_config::Postgres {
		let dsn = self.admin.clone().database(&self.name).to_url_lossy().to_string();

		mind_config::Postgres { dsn, pool_max_conns }
	}

	pub async fn cleanup(mut self) -> Result<()> {
		drop_database(&self.admin, &self.name).await?;

		self.dropped = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let admin = self.admin.clone();
		let name = self.name.clone();
		// Drop can run on a runtime thread, which must not block; use a thread of its own.
		let dropper = thread::spawn(move || -> Result<()> {
			let runtime = Builder::new_current_thread().enable_all().build()?;

			runtime.block_on(drop_database(&admin, &name))
		});

		match dropper.join() {
			Ok(Ok(())) => {},
			Ok(Err(err)) => eprintln!("Failed to drop test database {}: {err}.", self.name),
			Err(_) => eprintln!("Test database cleanup thread panicked for {}.", self.name),
		}
	}
}

async fn drop_database(admin: &PgConnectOptions, name: &str) -> Result<()> {
	let mut conn = PgConnection::connect_with(admin).await?;

	sqlx::query(&format!(r#"DROP DATABASE IF EXISTS "{name}" WITH (FORCE)"#))
		.execute(&mut conn)
		.await?;
	conn.close().await?;

	Ok(())
}
