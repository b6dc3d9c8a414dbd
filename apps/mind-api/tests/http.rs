use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use mind_api::{routes, state::AppState};
use mind_config::{Config, Security, Service, Storage};
use mind_domain::{
	StageError, pipeline::Stage, recommend::Recommendation, validate::ValidatedRecommendations,
};
use mind_service::{Agents, MindService, ValidationAgent};
use mind_storage::memory::MemoryStore;

struct FailingValidator;
impl ValidationAgent for FailingValidator {
	fn validate(
		&self,
		_cfg: &Config,
		_candidates: Vec<Recommendation>,
	) -> Result<ValidatedRecommendations, StageError> {
		Err(StageError::new(Stage::Validation, "scores are unreadable."))
	}
}

fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage { backend: mind_config::BACKEND_MEMORY.to_string(), postgres: None },
		analysis: Default::default(),
		recommendation: Default::default(),
		validation: Default::default(),
		insight: Default::default(),
		security: Security::default(),
	}
}

fn app_with(agents: Agents) -> Router {
	let service = MindService::with_agents(test_config(), Arc::new(MemoryStore::new()), agents);

	routes::router(AppState::with_service(service))
}

fn app() -> Router {
	app_with(Agents::default())
}

async fn post(app: &Router, uri: &str, payload: Value) -> (StatusCode, Value) {
	let response = app
		.clone()
		.oneshot(
			Request::builder()
				.method("POST")
				.uri(uri)
				.header("content-type", "application/json")
				.body(Body::from(payload.to_string()))
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call route.");
	let status = response.status();
	let bytes =
		body::to_bytes(response.into_body(), usize::MAX).await.expect("Failed to read response.");
	let json = serde_json::from_slice(&bytes).expect("Failed to parse response.");

	(status, json)
}

async fn create_user(app: &Router, user_id: &str) {
	let (status, _) =
		post(app, "/v1/users", json!({ "user_id": user_id, "display_name": "Demo User" })).await;

	assert_eq!(status, StatusCode::OK);
}

async fn log_mood(app: &Router, user_id: &str, emotion: &str, intensity: f64) -> Value {
	let (status, json) = post(
		app,
		"/v1/moods",
		json!({ "user_id": user_id, "emotion": emotion, "intensity": intensity }),
	)
	.await;

	assert_eq!(status, StatusCode::OK);

	json
}

#[tokio::test]
async fn health_and_service_info_respond() {
	let app = app();
	let response = app
		.clone()
		.oneshot(Request::builder().uri("/health").body(Body::empty()).expect("Failed to build."))
		.await
		.expect("Failed to call health.");

	assert_eq!(response.status(), StatusCode::OK);

	let response = app
		.oneshot(Request::builder().uri("/api").body(Body::empty()).expect("Failed to build."))
		.await
		.expect("Failed to call service info.");

	assert_eq!(response.status(), StatusCode::OK);

	let bytes = body::to_bytes(response.into_body(), usize::MAX).await.expect("Failed to read.");
	let json: Value = serde_json::from_slice(&bytes).expect("Failed to parse.");

	assert_eq!(json["service"], "mind-api");
	assert_eq!(json["status"], "running");
	assert_eq!(json["version"], mind_cli::VERSION);
}

#[tokio::test]
async fn duplicate_user_is_a_conflict() {
	let app = app();

	create_user(&app, "demo").await;

	let (status, json) =
		post(&app, "/v1/users", json!({ "user_id": "demo", "display_name": "Again" })).await;

	assert_eq!(status, StatusCode::CONFLICT);
	assert_eq!(json["error_code"], "conflict");
}

#[tokio::test]
async fn logged_mood_comes_back_with_suggestions() {
	let app = app();

	create_user(&app, "demo").await;

	let (status, json) = post(
		&app,
		"/v1/moods",
		json!({
			"user_id": "demo",
			"emotion": "  Happy ",
			"intensity": 0.7,
			"triggers": ["Work", "work"],
			"activities": ["Morning  Walk"],
		}),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["entry"]["emotion"], "happy");
	assert_eq!(json["entry"]["triggers"], json!(["work"]));
	assert_eq!(json["entry"]["activities"], json!(["morning walk"]));
	assert_eq!(json["fallback"], false);
	assert!(!json["suggestions"].as_array().expect("Missing suggestions.").is_empty());

	let (status, json) = post(&app, "/v1/moods/list", json!({ "user_id": "demo" })).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["entries"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn out_of_range_intensity_is_rejected() {
	let app = app();

	create_user(&app, "demo").await;

	let (status, json) =
		post(&app, "/v1/moods", json!({ "user_id": "demo", "emotion": "sad", "intensity": 1.5 }))
			.await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "invalid_request");

	let (_, json) = post(&app, "/v1/moods/list", json!({ "user_id": "demo" })).await;

	assert_eq!(json["entries"], json!([]));
}

#[tokio::test]
async fn malformed_body_is_an_invalid_request() {
	let app = app();
	let (status, json) = post(&app, "/v1/moods", json!({ "user_id": "demo" })).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "invalid_request");
}

#[tokio::test]
async fn unknown_user_is_not_found() {
	let app = app();
	let (status, json) = post(&app, "/v1/pipeline/run", json!({ "user_id": "ghost" })).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(json["error_code"], "not_found");
}

#[tokio::test]
async fn pipeline_run_reports_every_stage() {
	let app = app();

	create_user(&app, "demo").await;
	log_mood(&app, "demo", "happy", 0.8).await;
	log_mood(&app, "demo", "happy", 0.6).await;

	let (status, json) = post(
		&app,
		"/v1/pipeline/run",
		json!({ "user_id": "demo", "entry": { "emotion": "sad", "intensity": 0.3 } }),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["analysis"]["total_entries"], 3);
	assert_eq!(json["analysis"]["dominant_emotion"], "happy");
	assert_eq!(
		json["agents_involved"],
		json!(["analysis", "recommendation", "validation", "insight"])
	);
	assert_eq!(json["state"]["state"], "complete");
	assert!(!json["insights"].as_array().expect("Missing insights.").is_empty());
}

#[tokio::test]
async fn failed_stage_returns_the_partial_result() {
	let agents = Agents { validator: Arc::new(FailingValidator), ..Agents::default() };
	let app = app_with(agents);

	create_user(&app, "demo").await;
	log_mood(&app, "demo", "sad", 0.2).await;

	let (status, json) = post(&app, "/v1/pipeline/run", json!({ "user_id": "demo" })).await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(json["error_code"], "stage_failed");
	assert_eq!(json["fields"][0], "validation");
	assert_eq!(json["message"], "scores are unreadable.");
	assert_eq!(json["result"]["analysis"]["total_entries"], 1);
	assert_eq!(json["result"]["state"], json!({ "state": "failed", "stage": "validation" }));
	assert_eq!(json["result"]["recommendations"], json!([]));
	assert_eq!(json["result"]["insights"], json!([]));
}

#[tokio::test]
async fn trends_summarize_logged_moods() {
	let app = app();

	create_user(&app, "demo").await;
	log_mood(&app, "demo", "calm", 0.6).await;
	log_mood(&app, "demo", "calm", 0.7).await;

	let (status, json) = post(&app, "/v1/trends", json!({ "user_id": "demo" })).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["total_entries"], 2);
	assert_eq!(json["dominant_emotion"], "calm");
	assert_eq!(json["summary"][0], "You have logged 2 mood entries.");
}

#[tokio::test]
async fn unknown_emotion_falls_back_to_anxious_suggestions() {
	let app = app();
	let (status, json) =
		post(&app, "/v1/suggestions", json!({ "emotion": "bored", "intensity": 0.4 })).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["emotion"], "bored");
	assert_eq!(json["intensity"], 0.4);
	assert_eq!(json["fallback"], true);
	assert_eq!(json["suggestions"][0]["title"], "Box Breathing");
}
