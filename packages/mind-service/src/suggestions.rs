use serde::{Deserialize, Serialize};

use crate::{Error, MindService, Result};
use mind_domain::{
	label,
	recommend::{self, Recommendation, TemplateSource},
};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SuggestionsRequest {
	pub emotion: String,
	#[serde(default)]
	pub intensity: Option<f64>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SuggestionsResponse {
	pub emotion: String,
	pub intensity: Option<f64>,
	pub suggestions: Vec<Recommendation>,
	pub fallback: bool,
	pub template_source: TemplateSource,
}

impl MindService {
	/// Template suggestions for one emotion, without any personalization.
	pub fn suggestions(&self, req: SuggestionsRequest) -> Result<SuggestionsResponse> {
		if let Some(intensity) = req.intensity
			&& (!intensity.is_finite() || !(0.0..=1.0).contains(&intensity))
		{
			return Err(Error::InvalidRequest {
				message: "intensity must be a number in the range 0.0-1.0.".to_string(),
			});
		}

		let emotion = label::normalize_label(&req.emotion);

		if emotion.is_empty() {
			return Err(Error::InvalidRequest { message: "emotion is required.".to_string() });
		}

		Ok(suggestions_for(&emotion, req.intensity))
	}
}

pub(crate) fn suggestions_for(emotion: &str, intensity: Option<f64>) -> SuggestionsResponse {
	let (template_source, templates) = recommend::templates_for(emotion);
	let fallback = template_source.is_fallback();

	if fallback {
		tracing::warn!(emotion, "Unrecognized emotion; using fallback suggestions.");
	}

	SuggestionsResponse {
		emotion: emotion.to_string(),
		intensity,
		suggestions: templates
			.iter()
			.map(|template| template.to_recommendation(template.base_score))
			.collect(),
		fallback,
		template_source,
	}
}
