use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::ValidationError;

pub const MAX_LABEL_CHARS: usize = 64;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
	Trigger,
	Activity,
}
impl LabelKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Trigger => "trigger",
			Self::Activity => "activity",
		}
	}

	/// Activities are things the user does; triggers happen to them.
	pub fn is_user_controllable(self) -> bool {
		matches!(self, Self::Activity)
	}
}

/// Index of a label inside one graph's label table.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct LabelId(pub u32);

/// A deduplicated trigger or activity shared by every entry that references it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Label {
	pub name: String,
	pub kind: LabelKind,
	pub usage_count: u32,
}

#[derive(Clone, Debug)]
pub struct LabelTable {
	kind: LabelKind,
	labels: Vec<Label>,
	index: HashMap<String, LabelId>,
}
impl LabelTable {
	pub fn new(kind: LabelKind) -> Self {
		Self { kind, labels: Vec::new(), index: HashMap::new() }
	}

	pub fn kind(&self) -> LabelKind {
		self.kind
	}

	pub fn len(&self) -> usize {
		self.labels.len()
	}

	pub fn is_empty(&self) -> bool {
		self.labels.is_empty()
	}

	pub fn get(&self, id: LabelId) -> Option<&Label> {
		self.labels.get(id.0 as usize)
	}

	pub fn lookup(&self, name: &str) -> Option<&Label> {
		self.index.get(name).and_then(|id| self.get(*id))
	}

	pub fn iter(&self) -> impl Iterator<Item = &Label> {
		self.labels.iter()
	}

	/// Resolves `name` to its id, registering it on first use, and counts one more use.
	///
	/// `name` must already be normalized.
	pub(crate) fn record_use(&mut self, name: &str) -> LabelId {
		if let Some(id) = self.index.get(name).copied() {
			self.labels[id.0 as usize].usage_count += 1;

			return id;
		}

		let id = LabelId(self.labels.len() as u32);

		self.labels.push(Label { name: name.to_string(), kind: self.kind, usage_count: 1 });
		self.index.insert(name.to_string(), id);

		id
	}
}

/// Canonical form shared by emotions, triggers, and activities.
///
/// NFKC, lowercase, trimmed, with inner whitespace runs collapsed to one space.
pub fn normalize_label(raw: &str) -> String {
	let folded: String = raw.nfkc().flat_map(char::to_lowercase).collect();

	folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn validate_label(field: &'static str, raw: &str) -> Result<String, ValidationError> {
	if raw.chars().any(|ch| ch.is_control() && !ch.is_whitespace()) {
		return Err(ValidationError::new(field, "must not contain control characters."));
	}

	let normalized = normalize_label(raw);

	if normalized.is_empty() {
		return Err(ValidationError::new(field, "must be non-empty."));
	}
	if normalized.chars().count() > MAX_LABEL_CHARS {
		return Err(ValidationError::new(
			field,
			format!("must be at most {MAX_LABEL_CHARS} characters."),
		));
	}

	Ok(normalized)
}

/// Normalizes a list of labels, keeping the first occurrence of each.
pub(crate) fn validate_label_set(
	field: &'static str,
	raw: &[String],
) -> Result<Vec<String>, ValidationError> {
	let mut out: Vec<String> = Vec::with_capacity(raw.len());

	for item in raw {
		let normalized = validate_label(field, item)?;

		if !out.contains(&normalized) {
			out.push(normalized);
		}
	}

	Ok(out)
}
