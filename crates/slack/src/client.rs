use std::sync::Mutex;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::blocks::{MessageTemplate, RosterEntry};
use crate::views::ModalView;

const SLACK_API_BASE: &str = "https://slack.com/api";

/// Page size for `users.list`.
const USERS_LIST_LIMIT: u32 = 200;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("slack api transport failure calling {method}: {source}")]
    Transport {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("slack api call {method} rejected: {error}")]
    Rejected { method: &'static str, error: String },
}

/// One workspace member as returned by `users.list`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct WorkspaceUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub profile: WorkspaceUserProfile,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct WorkspaceUserProfile {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Drops bots, deactivated accounts, and Slackbot, then maps the survivors to
/// roster lines with display-name fallbacks.
pub fn active_users(users: &[WorkspaceUser]) -> Vec<RosterEntry> {
    users
        .iter()
        .filter(|user| !user.is_bot && !user.deleted && user.id != "USLACKBOT")
        .map(|user| RosterEntry {
            user_id: user.id.clone(),
            display_name: user
                .real_name
                .clone()
                .filter(|name| !name.is_empty())
                .or_else(|| Some(user.name.clone()).filter(|name| !name.is_empty()))
                .unwrap_or_else(|| "Unknown".to_owned()),
            title: user.profile.title.clone().filter(|title| !title.is_empty()),
            email: user.profile.email.clone().filter(|email| !email.is_empty()),
        })
        .collect()
}

/// Slack Web API surface the handlers depend on. The follow-up phase of every
/// handler runs its side effects through this trait, so tests swap in fakes
/// without any HTTP.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// `chat.postMessage` to a channel.
    async fn post_message(&self, channel: &str, message: &MessageTemplate)
        -> Result<(), ApiError>;

    /// Posts to an interaction's `response_url`.
    async fn respond(&self, response_url: &str, message: &MessageTemplate)
        -> Result<(), ApiError>;

    /// `views.open` against a trigger id.
    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), ApiError>;

    /// `views.update` by view id.
    async fn update_view(&self, view_id: &str, view: &ModalView) -> Result<(), ApiError>;

    /// `users.list`, a single page.
    async fn list_users(&self) -> Result<Vec<WorkspaceUser>, ApiError>;

    /// `auth.test`; used by the health endpoint.
    async fn auth_test(&self) -> Result<(), ApiError>;
}

/// reqwest-backed client. Every call is a JSON POST with the bot token as a
/// bearer header; Slack reports failures in-band via the `ok` field, so the
/// response body is checked even on HTTP 200.
pub struct HttpSlackApi {
    http: reqwest::Client,
    bot_token: SecretString,
    base_url: String,
}

impl HttpSlackApi {
    pub fn new(bot_token: SecretString) -> Self {
        Self { http: reqwest::Client::new(), bot_token, base_url: SLACK_API_BASE.to_owned() }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn call(&self, method: &'static str, body: Value) -> Result<Value, ApiError> {
        let response = self
            .http
            .post(format!("{}/{method}", self.base_url))
            .bearer_auth(self.bot_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|source| ApiError::Transport { method, source })?;

        let payload: Value = response
            .json()
            .await
            .map_err(|source| ApiError::Transport { method, source })?;

        if payload["ok"].as_bool() != Some(true) {
            return Err(ApiError::Rejected {
                method,
                error: payload["error"].as_str().unwrap_or("unknown").to_owned(),
            });
        }

        Ok(payload)
    }
}

#[async_trait]
impl SlackApi for HttpSlackApi {
    async fn post_message(
        &self,
        channel: &str,
        message: &MessageTemplate,
    ) -> Result<(), ApiError> {
        self.call(
            "chat.postMessage",
            json!({
                "channel": channel,
                "text": message.fallback_text,
                "blocks": message.blocks,
            }),
        )
        .await
        .map(|_| ())
    }

    async fn respond(
        &self,
        response_url: &str,
        message: &MessageTemplate,
    ) -> Result<(), ApiError> {
        // response_url posts land outside the api base and answer with a bare
        // "ok" body rather than the envelope JSON.
        let method = "response_url";
        self.http
            .post(response_url)
            .json(&json!({
                "text": message.fallback_text,
                "blocks": message.blocks,
            }))
            .send()
            .await
            .map_err(|source| ApiError::Transport { method, source })?
            .error_for_status()
            .map_err(|source| ApiError::Transport { method, source })?;
        Ok(())
    }

    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), ApiError> {
        self.call("views.open", json!({ "trigger_id": trigger_id, "view": view }))
            .await
            .map(|_| ())
    }

    async fn update_view(&self, view_id: &str, view: &ModalView) -> Result<(), ApiError> {
        self.call("views.update", json!({ "view_id": view_id, "view": view }))
            .await
            .map(|_| ())
    }

    async fn list_users(&self) -> Result<Vec<WorkspaceUser>, ApiError> {
        let payload = self.call("users.list", json!({ "limit": USERS_LIST_LIMIT })).await?;
        let members = payload["members"].clone();
        serde_json::from_value(members).map_err(|error| ApiError::Rejected {
            method: "users.list",
            error: format!("unparseable members payload: {error}"),
        })
    }

    async fn auth_test(&self) -> Result<(), ApiError> {
        self.call("auth.test", json!({})).await.map(|_| ())
    }
}

/// Does nothing, successfully. Default wiring until a real token is set.
#[derive(Default)]
pub struct NoopSlackApi;

#[async_trait]
impl SlackApi for NoopSlackApi {
    async fn post_message(
        &self,
        _channel: &str,
        _message: &MessageTemplate,
    ) -> Result<(), ApiError> {
        Ok(())
    }

    async fn respond(
        &self,
        _response_url: &str,
        _message: &MessageTemplate,
    ) -> Result<(), ApiError> {
        Ok(())
    }

    async fn open_view(&self, _trigger_id: &str, _view: &ModalView) -> Result<(), ApiError> {
        Ok(())
    }

    async fn update_view(&self, _view_id: &str, _view: &ModalView) -> Result<(), ApiError> {
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<WorkspaceUser>, ApiError> {
        Ok(Vec::new())
    }

    async fn auth_test(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

/// Records every call for assertions. Test double; lives here so integration
/// tests outside the crate can use it too.
#[derive(Default)]
pub struct RecordingSlackApi {
    calls: Mutex<Vec<RecordedCall>>,
    pub users: Vec<WorkspaceUser>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RecordedCall {
    PostMessage { channel: String, message: MessageTemplate },
    Respond { response_url: String, message: MessageTemplate },
    OpenView { trigger_id: String, view: ModalView },
    UpdateView { view_id: String, view: ModalView },
    ListUsers,
    AuthTest,
}

impl RecordingSlackApi {
    pub fn with_users(users: Vec<WorkspaceUser>) -> Self {
        Self { calls: Mutex::new(Vec::new()), users }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("recording lock").clone()
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().expect("recording lock").push(call);
    }
}

#[async_trait]
impl SlackApi for RecordingSlackApi {
    async fn post_message(
        &self,
        channel: &str,
        message: &MessageTemplate,
    ) -> Result<(), ApiError> {
        self.record(RecordedCall::PostMessage {
            channel: channel.to_owned(),
            message: message.clone(),
        });
        Ok(())
    }

    async fn respond(
        &self,
        response_url: &str,
        message: &MessageTemplate,
    ) -> Result<(), ApiError> {
        self.record(RecordedCall::Respond {
            response_url: response_url.to_owned(),
            message: message.clone(),
        });
        Ok(())
    }

    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), ApiError> {
        self.record(RecordedCall::OpenView {
            trigger_id: trigger_id.to_owned(),
            view: view.clone(),
        });
        Ok(())
    }

    async fn update_view(&self, view_id: &str, view: &ModalView) -> Result<(), ApiError> {
        self.record(RecordedCall::UpdateView { view_id: view_id.to_owned(), view: view.clone() });
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<WorkspaceUser>, ApiError> {
        self.record(RecordedCall::ListUsers);
        Ok(self.users.clone())
    }

    async fn auth_test(&self) -> Result<(), ApiError> {
        self.record(RecordedCall::AuthTest);
        Ok(())
    }
}
