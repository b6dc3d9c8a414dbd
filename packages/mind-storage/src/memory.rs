use std::{
	collections::HashMap,
	future,
	sync::{Arc, Mutex, RwLock},
};

use time::OffsetDateTime;

use crate::{BoxFuture, Error, MoodStore, Result};
use mind_domain::{
	graph::{EntryView, MoodGraph, NewMoodEntry, User},
	pipeline::PipelineResult,
};

struct UserSlot {
	graph: MoodGraph,
	last_run: Option<PipelineResult>,
}

/// In-process store. Each user gets its own lock, so writers for different users never contend.
#[derive(Default)]
pub struct MemoryStore {
	users: RwLock<HashMap<String, Arc<Mutex<UserSlot>>>>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn slot(&self, user_id: &str) -> Result<Arc<Mutex<UserSlot>>> {
		let users = self.users.read().unwrap_or_else(|err| err.into_inner());

		users
			.get(user_id)
			.cloned()
			.ok_or_else(|| Error::NotFound(format!("User {user_id} does not exist.")))
	}

	fn with_slot<T>(&self, user_id: &str, f: impl FnOnce(&mut UserSlot) -> Result<T>) -> Result<T> {
		let slot = self.slot(user_id)?;
		let mut guard = slot.lock().unwrap_or_else(|err| err.into_inner());

		f(&mut guard)
	}

	fn insert_user(&self, user: &User) -> Result<()> {
		let mut users = self.users.write().unwrap_or_else(|err| err.into_inner());

		if users.contains_key(&user.user_id) {
			return Err(Error::Conflict(format!("User {} already exists.", user.user_id)));
		}

		let slot = UserSlot { graph: MoodGraph::new(user.clone()), last_run: None };

		users.insert(user.user_id.clone(), Arc::new(Mutex::new(slot)));

		Ok(())
	}
}

impl MoodStore for MemoryStore {
	fn create_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, Result<()>> {
		Box::pin(future::ready(self.insert_user(user)))
	}

	fn load_graph<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<MoodGraph>> {
		Box::pin(future::ready(self.with_slot(user_id, |slot| Ok(slot.graph.clone()))))
	}

	fn append_entry<'a>(
		&'a self,
		user_id: &'a str,
		entry: &'a NewMoodEntry,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<EntryView>> {
		let appended = self.with_slot(user_id, |slot| {
			let stored = slot.graph.add_entry_at(entry, now)?;

			Ok(slot.graph.view(&stored))
		});

		Box::pin(future::ready(appended))
	}

	fn last_run<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<PipelineResult>>> {
		Box::pin(future::ready(self.with_slot(user_id, |slot| Ok(slot.last_run.clone()))))
	}

	fn save_run<'a>(&'a self, run: &'a PipelineResult) -> BoxFuture<'a, Result<()>> {
		let saved = self.with_slot(&run.user_id, |slot| {
			let newer = slot
				.last_run
				.as_ref()
				.is_none_or(|stored| stored.completed_at <= run.completed_at);

			if newer {
				slot.last_run = Some(run.clone());
			}

			Ok(())
		});

		Box::pin(future::ready(saved))
	}
}
