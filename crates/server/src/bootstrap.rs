use std::sync::Arc;

use peerly_core::config::{AppConfig, ConfigError, LoadOptions};
use peerly_slack::client::{HttpSlackApi, SlackApi};
use peerly_slack::commands::SlashCommandHandler;
use peerly_slack::events::{AppMentionHandler, EventDispatcher, MessageHandler};
use peerly_slack::socket::{NoopSocketTransport, ReconnectPolicy, SocketModeRunner};
use peerly_slack::wizard::{FeedbackActionHandler, FeedbackSubmissionHandler};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub api: Arc<dyn SlackApi>,
    pub slack_runner: SocketModeRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let api: Arc<dyn SlackApi> = Arc::new(HttpSlackApi::new(config.slack.bot_token.clone()));

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(SlashCommandHandler::new(api.clone()));
    dispatcher.register(FeedbackSubmissionHandler::new(api.clone()));
    dispatcher.register(FeedbackActionHandler::new(api.clone()));
    dispatcher.register(AppMentionHandler::new(api.clone()));
    dispatcher.register(MessageHandler::new(api.clone()));
    info!(
        event_name = "system.bootstrap.handlers_registered",
        correlation_id = "bootstrap",
        handler_count = dispatcher.handler_count(),
        "event handlers registered"
    );

    let slack_runner = SocketModeRunner::new(
        Arc::new(NoopSocketTransport),
        dispatcher,
        ReconnectPolicy::default(),
    );

    Ok(Application { config, api, slack_runner })
}

#[cfg(test)]
mod tests {
    use peerly_core::config::{ConfigOverrides, LoadOptions};
    use secrecy::ExposeSecret;

    use crate::bootstrap::bootstrap;

    fn options(app_token: &str, bot_token: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                slack_app_token: Some(app_token.to_string()),
                slack_bot_token: Some(bot_token.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_valid_slack_tokens() {
        let result = bootstrap(options("invalid-token", "xoxb-valid")).await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("slack.app_token"));
    }

    #[tokio::test]
    async fn bootstrap_succeeds_with_valid_overrides() {
        let app = bootstrap(options("xapp-test", "xoxb-test"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        assert_eq!(app.config.slack.app_token.expose_secret(), "xapp-test");
    }
}
