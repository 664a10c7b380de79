use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use peerly_slack::client::SlackApi;
use serde::Serialize;
use tracing::{error, info};

#[derive(Clone)]
pub struct HealthState {
    api: Arc<dyn SlackApi>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub slack: HealthCheck,
    pub checked_at: String,
}

pub fn router(api: Arc<dyn SlackApi>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { api })
}

pub async fn spawn(
    bind_address: &str,
    port: u16,
    api: Arc<dyn SlackApi>,
) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(api)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let slack = slack_check(state.api.as_ref()).await;
    let ready = slack.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "peerly-server runtime initialized".to_string(),
        },
        slack,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn slack_check(api: &dyn SlackApi) -> HealthCheck {
    match api.auth_test().await {
        Ok(()) => HealthCheck { status: "ready", detail: "auth.test succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("auth.test failed: {error}") }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{extract::State, http::StatusCode, Json};
    use peerly_slack::blocks::MessageTemplate;
    use peerly_slack::client::{ApiError, NoopSlackApi, SlackApi, WorkspaceUser};
    use peerly_slack::views::ModalView;

    use crate::health::{health, HealthState};

    struct UnreachableSlackApi;

    #[async_trait]
    impl SlackApi for UnreachableSlackApi {
        async fn post_message(
            &self,
            _channel: &str,
            _message: &MessageTemplate,
        ) -> Result<(), ApiError> {
            Err(self.rejected("chat.postMessage"))
        }

        async fn respond(
            &self,
            _response_url: &str,
            _message: &MessageTemplate,
        ) -> Result<(), ApiError> {
            Err(self.rejected("response_url"))
        }

        async fn open_view(&self, _trigger_id: &str, _view: &ModalView) -> Result<(), ApiError> {
            Err(self.rejected("views.open"))
        }

        async fn update_view(&self, _view_id: &str, _view: &ModalView) -> Result<(), ApiError> {
            Err(self.rejected("views.update"))
        }

        async fn list_users(&self) -> Result<Vec<WorkspaceUser>, ApiError> {
            Err(self.rejected("users.list"))
        }

        async fn auth_test(&self) -> Result<(), ApiError> {
            Err(self.rejected("auth.test"))
        }
    }

    impl UnreachableSlackApi {
        fn rejected(&self, method: &'static str) -> ApiError {
            ApiError::Rejected { method, error: "invalid_auth".to_string() }
        }
    }

    #[tokio::test]
    async fn health_returns_ready_when_slack_is_reachable() {
        let (status, Json(payload)) =
            health(State(HealthState { api: Arc::new(NoopSlackApi) })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.slack.status, "ready");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_slack_auth_fails() {
        let (status, Json(payload)) =
            health(State(HealthState { api: Arc::new(UnreachableSlackApi) })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.slack.status, "degraded");
        assert!(payload.slack.detail.contains("invalid_auth"));
        assert_eq!(payload.service.status, "ready");
    }
}
