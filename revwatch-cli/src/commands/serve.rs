//! HTTP trigger for review checks

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use clap::Args;
use revwatch_core::{CheckReport, Config};
use revwatch_db::Database;
use serde_json::json;
use tracing::info;

use super::check::CheckRunner;
use super::watch::schedule;

/// Serve an HTTP endpoint that triggers review checks
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides config and env)
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,

    /// Only run passes when triggered over HTTP
    #[arg(long)]
    pub no_schedule: bool,
}

impl ServeArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let addr = match self.bind {
            Some(addr) => addr,
            None => config
                .server
                .bind
                .parse()
                .with_context(|| format!("Invalid bind address '{}'", config.server.bind))?,
        };

        let db = Database::open(config.database.path.as_deref()).await?;
        let runner = Arc::new(CheckRunner::from_config(config, &db).await?);

        let scheduler = (!self.no_schedule).then(|| {
            info!(interval = ?config.check.interval, "Scheduling review checks");
            tokio::spawn(schedule(runner.clone(), config.check.interval, false))
        });

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        info!(addr = %addr, "Listening for check triggers");

        axum::serve(listener, router(runner))
            .with_graceful_shutdown(async {
                // Shut down on Ctrl-C; a failed signal handler keeps serving
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupted, stopping");
                }
            })
            .await
            .context("Server error")?;

        if let Some(task) = scheduler {
            task.abort();
        }
        db.close().await;
        Ok(())
    }
}

struct PassError(revwatch_core::Error);

impl IntoResponse for PassError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}

async fn check_handler(
    State(runner): State<Arc<CheckRunner>>,
) -> Result<Json<CheckReport>, PassError> {
    runner.run().await.map(Json).map_err(PassError)
}

pub fn router(runner: Arc<CheckRunner>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/check", get(check_handler).post(check_handler))
        .with_state(runner)
}
