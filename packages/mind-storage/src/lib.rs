//! Persistence for users, their mood graphs, and their latest pipeline run.

pub mod db;
pub mod memory;
pub mod models;
pub mod queries;
pub mod schema;

mod error;

pub use error::Error;

use std::{future::Future, pin::Pin};

use time::OffsetDateTime;

use mind_domain::{
	graph::{EntryView, MoodGraph, NewMoodEntry, User},
	pipeline::PipelineResult,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Per-user append-only mood log plus the user's latest pipeline run.
///
/// Appends for one user are mutually exclusive, and a graph returned by `load_graph` reflects
/// every append that completed before the call.
pub trait MoodStore
where
	Self: Send + Sync,
{
	/// Fails with [`Error::Conflict`] when the user id is taken.
	fn create_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, Result<()>>;

	/// Fails with [`Error::NotFound`] for unknown users.
	fn load_graph<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<MoodGraph>>;

	/// Validates and appends one entry, returning it with labels resolved.
	fn append_entry<'a>(
		&'a self,
		user_id: &'a str,
		entry: &'a NewMoodEntry,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<EntryView>>;

	fn last_run<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<PipelineResult>>>;

	/// Replaces the stored run unless the stored one completed later.
	fn save_run<'a>(&'a self, run: &'a PipelineResult) -> BoxFuture<'a, Result<()>>;
}
