use std::sync::Arc;

use mind_config::{Config, Postgres, Security, Service, Storage};
use mind_domain::{graph::NewMoodEntry, pipeline::Stage};
use mind_service::{CreateUserRequest, MindService, RunPipelineRequest};
use mind_storage::db::Db;
use mind_testkit::TestDatabase;

fn pg_config(pg: Postgres) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			backend: mind_config::BACKEND_POSTGRES.to_string(),
			postgres: Some(pg),
		},
		analysis: Default::default(),
		recommendation: Default::default(),
		validation: Default::default(),
		insight: Default::default(),
		security: Security::default(),
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set MIND_PG_DSN to run."]
async fn pipeline_runs_against_postgres() {
	let Some(base_dsn) = mind_testkit::env_dsn() else {
		eprintln!("Skipping pipeline_runs_against_postgres; set MIND_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let pg = test_db.postgres(2);
	let db = Db::open(&pg).await.expect("Failed to open Postgres store.");
	let pool = db.pool.clone();
	let service = MindService::new(pg_config(pg), Arc::new(db));

	service
		.create_user(CreateUserRequest {
			user_id: Some("demo".to_string()),
			display_name: "Demo User".to_string(),
		})
		.await
		.expect("Failed to create user.");

	for (emotion, intensity) in [("happy", 0.8), ("happy", 0.6), ("sad", 0.3)] {
		let entry = NewMoodEntry { emotion: emotion.to_string(), intensity, ..Default::default() };

		service
			.run_pipeline(RunPipelineRequest { user_id: "demo".to_string(), entry: Some(entry) })
			.await
			.expect("Run must succeed.");
	}

	let result = service
		.run_pipeline(RunPipelineRequest { user_id: "demo".to_string(), entry: None })
		.await
		.expect("Run must succeed.");
	let analysis = result.analysis.as_ref().expect("Missing analysis.");

	assert_eq!(analysis.total_entries, 3);
	assert_eq!(analysis.dominant_emotion, "happy");
	assert_eq!(result.agents_involved, Stage::ALL.to_vec());

	pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
