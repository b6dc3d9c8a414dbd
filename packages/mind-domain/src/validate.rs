use serde::{Deserialize, Serialize};

use crate::{
	StageError,
	pipeline::Stage,
	recommend::{self, LOWEST_PRIORITY, Recommendation},
};

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ValidationSummary {
	pub validated_count: usize,
	pub total_recommendations: usize,
	/// Mean relevance over every deduplicated candidate, validated or not.
	pub avg_relevance: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedRecommendations {
	/// Validated recommendations by priority and score, then the rest in candidate order.
	pub recommendations: Vec<Recommendation>,
	pub summary: ValidationSummary,
}

pub fn validate(
	cfg: &mind_config::Validation,
	candidates: Vec<Recommendation>,
) -> Result<ValidatedRecommendations, StageError> {
	for candidate in &candidates {
		check_candidate(candidate)?;
	}

	let mut kept = dedupe_by_type(candidates);

	for rec in &mut kept {
		rec.relevance_score = recommend::clamp_score(rec.relevance_score);
		rec.validated = rec.relevance_score >= cfg.score_threshold;
		rec.priority = LOWEST_PRIORITY;
	}

	let (mut validated, rejected): (Vec<Recommendation>, Vec<Recommendation>) =
		kept.into_iter().partition(|rec| rec.validated);

	// Stable, so equal scores keep candidate order.
	validated.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

	let n = validated.len();

	for (rank, rec) in validated.iter_mut().enumerate() {
		rec.priority = priority_for_rank(rank, n);
	}

	let total = n + rejected.len();
	let score_sum: f64 =
		validated.iter().chain(rejected.iter()).map(|rec| rec.relevance_score).sum();
	let summary = ValidationSummary {
		validated_count: n,
		total_recommendations: total,
		avg_relevance: if total == 0 { 0.0 } else { score_sum / total as f64 },
	};
	let mut recommendations = validated;

	recommendations.extend(rejected);

	Ok(ValidatedRecommendations { recommendations, summary })
}

/// Top third of `n` ranked items gets priority 1, the middle third 2, the rest 3.
pub fn priority_for_rank(rank: usize, n: usize) -> u8 {
	if rank < n.div_ceil(3) {
		1
	} else if rank < (2 * n).div_ceil(3) {
		2
	} else {
		LOWEST_PRIORITY
	}
}

/// Keeps the best-scoring candidate per type at the position of that type's first candidate.
/// Equal scores keep the earlier candidate.
fn dedupe_by_type(candidates: Vec<Recommendation>) -> Vec<Recommendation> {
	let mut kept: Vec<Recommendation> = Vec::with_capacity(candidates.len());

	for candidate in candidates {
		match kept.iter_mut().find(|rec| rec.rec_type == candidate.rec_type) {
			Some(existing) =>
				if candidate.relevance_score > existing.relevance_score {
					*existing = candidate;
				},
			None => kept.push(candidate),
		}
	}

	kept
}

fn check_candidate(candidate: &Recommendation) -> Result<(), StageError> {
	if !candidate.relevance_score.is_finite() {
		return Err(StageError::new(
			Stage::Validation,
			format!("candidate {:?} has a non-finite relevance score.", candidate.title),
		));
	}
	if candidate.title.trim().is_empty() || candidate.content.trim().is_empty() {
		return Err(StageError::new(
			Stage::Validation,
			format!("a {} candidate is missing its title or content.", candidate.rec_type.as_str()),
		));
	}

	Ok(())
}
