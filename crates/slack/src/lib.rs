//! Slack Integration - Socket Mode bot interface
//!
//! This crate provides the Slack interface for peerly:
//! - **Socket Mode** (`socket`) - WebSocket connection to Slack (no public URL needed)
//! - **Slash Commands** (`commands`) - `/feedback`, `/list-users`
//! - **Events** (`events`) - Mentions, messages, interactions, modal submissions
//! - **Wizard** (`wizard`) - The multi-step feedback dialog handlers
//! - **Block Kit** (`blocks`, `views`) - Rich message and modal builders
//!
//! # Getting Started
//!
//! 1. Create a Slack app at https://api.slack.com/apps
//! 2. Enable Socket Mode and subscribe to events
//! 3. Add slash commands: `/feedback`, `/list-users`
//! 4. Set env vars: `PEERLY_SLACK_APP_TOKEN`, `PEERLY_SLACK_BOT_TOKEN`
//!
//! # Architecture
//!
//! ```text
//! Slack Events → EventDispatcher → Handlers → Wizard State Machine
//!                    ↓                             ↓
//!              ack (response_action)      private_metadata blob
//! ```
//!
//! The bot keeps no session state of its own: every modal screen carries the
//! serialized wizard run in its `private_metadata`, and each callback hands
//! it back to be decoded, advanced one step, and re-serialized.
//!
//! # Key Types
//!
//! - `SocketModeRunner` - WebSocket event loop with reconnection logic
//! - `EventDispatcher` - Routes events to two-phase handlers
//! - `SlackApi` - Trait over the Web API methods this bot calls
//! - `ViewBuilder` / `MessageBuilder` - Block Kit construction

pub mod blocks;
pub mod client;
pub mod commands;
pub mod events;
pub mod socket;
pub mod summary;
pub mod views;
pub mod wizard;
