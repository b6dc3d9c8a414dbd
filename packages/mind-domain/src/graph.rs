//! Per-user mood graph: users own an append-only list of mood entries, and entries reference
//! shared trigger and activity labels.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{
	ValidationError,
	label::{self, Label, LabelId, LabelKind, LabelTable},
};

pub const MAX_USER_ID_CHARS: usize = 64;
pub const MAX_DISPLAY_NAME_CHARS: usize = 128;
pub const MAX_NOTE_CHARS: usize = 4_096;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct User {
	pub user_id: String,
	pub display_name: String,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}
impl User {
	pub fn new(
		user_id: &str,
		display_name: &str,
		created_at: OffsetDateTime,
	) -> Result<Self, ValidationError> {
		Ok(Self {
			user_id: validate_user_id(user_id)?,
			display_name: validate_display_name(display_name)?,
			created_at,
		})
	}
}

/// Raw mood entry input as received from a caller.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct NewMoodEntry {
	pub emotion: String,
	pub intensity: f64,
	#[serde(default)]
	pub note: String,
	#[serde(default)]
	pub triggers: Vec<String>,
	#[serde(default)]
	pub activities: Vec<String>,
}
impl NewMoodEntry {
	pub fn validate(&self) -> Result<ValidMoodEntry, ValidationError> {
		if !self.intensity.is_finite() || !(0.0..=1.0).contains(&self.intensity) {
			return Err(ValidationError::new("intensity", "must be a number in the range 0.0-1.0."));
		}

		let emotion = label::validate_label("emotion", &self.emotion)?;

		if self.note.chars().count() > MAX_NOTE_CHARS {
			return Err(ValidationError::new(
				"note",
				format!("must be at most {MAX_NOTE_CHARS} characters."),
			));
		}

		let triggers = label::validate_label_set("triggers", &self.triggers)?;
		let activities = label::validate_label_set("activities", &self.activities)?;

		Ok(ValidMoodEntry {
			emotion,
			intensity: self.intensity,
			note: self.note.clone(),
			triggers,
			activities,
		})
	}
}

/// A mood entry whose fields passed validation and are normalized.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidMoodEntry {
	emotion: String,
	intensity: f64,
	note: String,
	triggers: Vec<String>,
	activities: Vec<String>,
}
impl ValidMoodEntry {
	pub fn emotion(&self) -> &str {
		&self.emotion
	}

	pub fn intensity(&self) -> f64 {
		self.intensity
	}

	pub fn note(&self) -> &str {
		&self.note
	}

	pub fn triggers(&self) -> &[String] {
		&self.triggers
	}

	pub fn activities(&self) -> &[String] {
		&self.activities
	}
}

/// One logged mood. Never mutated once it is part of a graph.
#[derive(Clone, Debug, PartialEq)]
pub struct MoodEntry {
	pub entry_id: Uuid,
	/// Position in the owning graph, starting at zero.
	pub seq: u64,
	pub emotion: String,
	pub intensity: f64,
	pub note: String,
	pub created_at: OffsetDateTime,
	pub triggers: Vec<LabelId>,
	pub activities: Vec<LabelId>,
}

/// A mood entry with its label references resolved to names.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EntryView {
	pub entry_id: Uuid,
	pub seq: u64,
	pub emotion: String,
	pub intensity: f64,
	pub note: String,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	pub triggers: Vec<String>,
	pub activities: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LabelCount {
	pub name: String,
	pub count: u32,
}

/// Usage counts per label, most used first.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct LabelFrequencies {
	pub triggers: Vec<LabelCount>,
	pub activities: Vec<LabelCount>,
}
impl LabelFrequencies {
	pub fn of_kind(&self, kind: LabelKind) -> &[LabelCount] {
		match kind {
			LabelKind::Trigger => &self.triggers,
			LabelKind::Activity => &self.activities,
		}
	}

	/// Labels logged at least `min_uses` times.
	pub fn frequent(&self, min_uses: u32) -> impl Iterator<Item = (LabelKind, &str)> {
		let triggers = self.triggers.iter().map(|label| (LabelKind::Trigger, label));
		let activities = self.activities.iter().map(|label| (LabelKind::Activity, label));

		triggers
			.chain(activities)
			.filter(move |(_, label)| label.count >= min_uses)
			.map(|(kind, label)| (kind, label.name.as_str()))
	}
}

#[derive(Clone, Debug)]
pub struct MoodGraph {
	user: User,
	entries: Vec<MoodEntry>,
	triggers: LabelTable,
	activities: LabelTable,
}
impl MoodGraph {
	pub fn new(user: User) -> Self {
		Self {
			user,
			entries: Vec::new(),
			triggers: LabelTable::new(LabelKind::Trigger),
			activities: LabelTable::new(LabelKind::Activity),
		}
	}

	pub fn user(&self) -> &User {
		&self.user
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn entries(&self) -> &[MoodEntry] {
		&self.entries
	}

	pub fn last_created_at(&self) -> Option<OffsetDateTime> {
		self.entries.last().map(|entry| entry.created_at)
	}

	pub fn add_entry(&mut self, input: &NewMoodEntry) -> Result<MoodEntry, ValidationError> {
		self.add_entry_at(input, OffsetDateTime::now_utc())
	}

	pub fn add_entry_at(
		&mut self,
		input: &NewMoodEntry,
		now: OffsetDateTime,
	) -> Result<MoodEntry, ValidationError> {
		let valid = input.validate()?;

		Ok(self.append(Uuid::new_v4(), valid, now))
	}

	/// Appends an already validated entry, e.g. when rebuilding a graph from storage.
	///
	/// Timestamps that do not move forward are bumped one microsecond past the last entry so the
	/// graph stays totally ordered by creation time.
	pub fn append(
		&mut self,
		entry_id: Uuid,
		valid: ValidMoodEntry,
		created_at: OffsetDateTime,
	) -> MoodEntry {
		let created_at = next_created_at(self.last_created_at(), created_at);
		let ValidMoodEntry { emotion, intensity, note, triggers, activities } = valid;
		let triggers = triggers.iter().map(|name| self.triggers.record_use(name)).collect();
		let activities = activities.iter().map(|name| self.activities.record_use(name)).collect();
		let entry = MoodEntry {
			entry_id,
			seq: self.entries.len() as u64,
			emotion,
			intensity,
			note,
			created_at,
			triggers,
			activities,
		};

		self.entries.push(entry.clone());

		entry
	}

	pub fn triggers_for<'a>(&'a self, entry: &'a MoodEntry) -> impl Iterator<Item = &'a Label> {
		resolve(&self.triggers, &entry.triggers)
	}

	pub fn activities_for<'a>(&'a self, entry: &'a MoodEntry) -> impl Iterator<Item = &'a Label> {
		resolve(&self.activities, &entry.activities)
	}

	pub fn view(&self, entry: &MoodEntry) -> EntryView {
		view_with(&self.triggers, &self.activities, entry)
	}

	/// Point-in-time copy; later appends to the graph are never visible through it.
	pub fn snapshot(&self) -> MoodSnapshot {
		MoodSnapshot {
			user_id: self.user.user_id.clone(),
			captured_at: OffsetDateTime::now_utc(),
			entries: self.entries.clone(),
			triggers: self.triggers.clone(),
			activities: self.activities.clone(),
		}
	}
}

#[derive(Clone, Debug)]
pub struct MoodSnapshot {
	user_id: String,
	captured_at: OffsetDateTime,
	entries: Vec<MoodEntry>,
	triggers: LabelTable,
	activities: LabelTable,
}
impl MoodSnapshot {
	pub fn user_id(&self) -> &str {
		&self.user_id
	}

	pub fn captured_at(&self) -> OffsetDateTime {
		self.captured_at
	}

	/// Entries oldest first.
	pub fn entries(&self) -> &[MoodEntry] {
		&self.entries
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn labels(&self, kind: LabelKind) -> &LabelTable {
		match kind {
			LabelKind::Trigger => &self.triggers,
			LabelKind::Activity => &self.activities,
		}
	}

	pub fn labels_for<'a>(
		&'a self,
		entry: &'a MoodEntry,
		kind: LabelKind,
	) -> impl Iterator<Item = &'a Label> {
		let ids = match kind {
			LabelKind::Trigger => &entry.triggers,
			LabelKind::Activity => &entry.activities,
		};

		resolve(self.labels(kind), ids)
	}

	pub fn triggers_for<'a>(&'a self, entry: &'a MoodEntry) -> impl Iterator<Item = &'a Label> {
		self.labels_for(entry, LabelKind::Trigger)
	}

	pub fn activities_for<'a>(&'a self, entry: &'a MoodEntry) -> impl Iterator<Item = &'a Label> {
		self.labels_for(entry, LabelKind::Activity)
	}

	pub fn frequencies(&self) -> LabelFrequencies {
		LabelFrequencies {
			triggers: sorted_counts(&self.triggers),
			activities: sorted_counts(&self.activities),
		}
	}

	pub fn view(&self, entry: &MoodEntry) -> EntryView {
		view_with(&self.triggers, &self.activities, entry)
	}

	pub fn views(&self) -> Vec<EntryView> {
		self.entries.iter().map(|entry| self.view(entry)).collect()
	}
}

fn resolve<'a>(table: &'a LabelTable, ids: &'a [LabelId]) -> impl Iterator<Item = &'a Label> {
	ids.iter().filter_map(|id| table.get(*id))
}

fn view_with(triggers: &LabelTable, activities: &LabelTable, entry: &MoodEntry) -> EntryView {
	EntryView {
		entry_id: entry.entry_id,
		seq: entry.seq,
		emotion: entry.emotion.clone(),
		intensity: entry.intensity,
		note: entry.note.clone(),
		created_at: entry.created_at,
		triggers: resolve(triggers, &entry.triggers).map(|label| label.name.clone()).collect(),
		activities: resolve(activities, &entry.activities).map(|label| label.name.clone()).collect(),
	}
}

/// Creation time for an entry appended after `last`: `requested`, or one microsecond past `last`
/// when `requested` does not move forward.
pub fn next_created_at(last: Option<OffsetDateTime>, requested: OffsetDateTime) -> OffsetDateTime {
	match last {
		Some(last) if requested <= last => last + Duration::microseconds(1),
		_ => requested,
	}
}

fn sorted_counts(table: &LabelTable) -> Vec<LabelCount> {
	let mut counts: Vec<LabelCount> = table
		.iter()
		.map(|label| LabelCount { name: label.name.clone(), count: label.usage_count })
		.collect();

	counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

	counts
}

fn validate_user_id(raw: &str) -> Result<String, ValidationError> {
	let user_id = raw.trim();

	if user_id.is_empty() {
		return Err(ValidationError::new("user_id", "must be non-empty."));
	}
	if user_id.chars().count() > MAX_USER_ID_CHARS {
		return Err(ValidationError::new(
			"user_id",
			format!("must be at most {MAX_USER_ID_CHARS} characters."),
		));
	}
	if !user_id.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.')) {
		return Err(ValidationError::new(
			"user_id",
			"may only contain ASCII letters, digits, '_', '-', or '.'.",
		));
	}

	Ok(user_id.to_string())
}

fn validate_display_name(raw: &str) -> Result<String, ValidationError> {
	let name = raw.trim();

	if name.is_empty() {
		return Err(ValidationError::new("display_name", "must be non-empty."));
	}
	if name.chars().count() > MAX_DISPLAY_NAME_CHARS {
		return Err(ValidationError::new(
			"display_name",
			format!("must be at most {MAX_DISPLAY_NAME_CHARS} characters."),
		));
	}

	Ok(name.to_string())
}
