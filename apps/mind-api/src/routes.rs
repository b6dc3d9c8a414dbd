use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;

use crate::state::AppState;
use mind_domain::{pipeline::PipelineResult, report::TrendReport};
use mind_service::{
	CreateUserRequest, CreateUserResponse, Error as ServiceError, ListMoodsRequest,
	ListMoodsResponse, LogMoodRequest, LogMoodResponse, RunPipelineRequest, SuggestionsRequest,
	SuggestionsResponse, TrendsRequest,
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/api", get(service_info))
		.route("/v1/users", post(create_user))
		.route("/v1/moods", post(log_mood))
		.route("/v1/moods/list", post(list_moods))
		.route("/v1/pipeline/run", post(run_pipeline))
		.route("/v1/trends", post(trend_report))
		.route("/v1/suggestions", post(suggestions))
		.with_state(state)
}

#[derive(Debug, Serialize)]
struct ServiceInfo {
	service: &'static str,
	status: &'static str,
	version: &'static str,
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn service_info() -> Json<ServiceInfo> {
	Json(ServiceInfo { service: "mind-api", status: "running", version: mind_cli::VERSION })
}

async fn create_user(
	State(state): State<AppState>,
	payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<CreateUserResponse>, ApiError> {
	let response = state.service.create_user(body(payload)?).await?;

	Ok(Json(response))
}

async fn log_mood(
	State(state): State<AppState>,
	payload: Result<Json<LogMoodRequest>, JsonRejection>,
) -> Result<Json<LogMoodResponse>, ApiError> {
	let response = state.service.log_mood(body(payload)?).await?;

	Ok(Json(response))
}

async fn list_moods(
	State(state): State<AppState>,
	payload: Result<Json<ListMoodsRequest>, JsonRejection>,
) -> Result<Json<ListMoodsResponse>, ApiError> {
	let response = state.service.list_moods(body(payload)?).await?;

	Ok(Json(response))
}

async fn run_pipeline(
	State(state): State<AppState>,
	payload: Result<Json<RunPipelineRequest>, JsonRejection>,
) -> Result<Json<PipelineResult>, ApiError> {
	let result = state.service.run_pipeline(body(payload)?).await?;

	if let Some(stage) = result.failed_stage() {
		let message = result
			.stages
			.iter()
			.find(|outcome| outcome.stage == stage)
			.and_then(|outcome| outcome.error.clone())
			.unwrap_or_else(|| format!("Stage {stage} failed."));
		let partial = serde_json::to_value(&result).map_err(|err| {
			json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", err.to_string(), None)
		})?;

		return Err(json_error(
			StatusCode::INTERNAL_SERVER_ERROR,
			"stage_failed",
			message,
			Some(vec![stage.as_str().to_string()]),
		)
		.with_result(partial));
	}

	Ok(Json(result))
}

async fn trend_report(
	State(state): State<AppState>,
	payload: Result<Json<TrendsRequest>, JsonRejection>,
) -> Result<Json<TrendReport>, ApiError> {
	let response = state.service.trend_report(body(payload)?).await?;

	Ok(Json(response))
}

async fn suggestions(
	State(state): State<AppState>,
	payload: Result<Json<SuggestionsRequest>, JsonRejection>,
) -> Result<Json<SuggestionsResponse>, ApiError> {
	let response = state.service.suggestions(body(payload)?)?;

	Ok(Json(response))
}

/// Malformed or mistyped JSON is reported in the same shape as service validation errors.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
	match payload {
		Ok(Json(inner)) => Ok(inner),
		Err(rejection) =>
			Err(json_error(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text(), None)),
	}
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	result: Option<Value>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
	result: Option<Value>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self {
			status,
			error_code: error_code.into(),
			message: message.into(),
			fields,
			result: None,
		}
	}

	fn with_result(mut self, result: Value) -> Self {
		self.result = Some(result);

		self
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", message, None),
			ServiceError::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "not_found", message, None),
			ServiceError::Conflict { message } =>
				json_error(StatusCode::CONFLICT, "conflict", message, None),
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Request failed in storage.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", message, None)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			error_code: self.error_code,
			message: self.message,
			fields: self.fields,
			result: self.result,
		};

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
