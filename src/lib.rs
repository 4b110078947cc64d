//! rtmbridge — a real-time chat adapter for pluggable bot commands.
//!
//! Bridges an RTM-style messaging service (supplied by the host as an
//! [`RtmConnector`]/[`RtmClient`] implementation) to registered
//! [`Command`] handlers: a managed session pulls inbound events,
//! filters the ones addressed to the adapter, dispatches them to the
//! matching command, and routes the reply back to the originating
//! conversation.
//!
//! See `DESIGN.md` for full architecture documentation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bridge;
pub mod client;
pub mod command;
pub mod config;
pub mod logging;
pub mod plugin;

mod dispatch;
mod roster;
mod supervisor;

#[cfg(test)]
pub(crate) mod testutil;

pub use bridge::{BridgeConn, RtmBridge};
pub use client::{
    AuthIdentity, EventKind, InboundEvent, RtmClient, RtmConnector, RtmError, RtmSession, User,
};
pub use command::{Command, CommandError, CommandRegistry};
pub use config::{load_config, AdapterConfig, Options};

/// Errors surfaced by the adapter's lifecycle, configuration, and
/// registration surfaces.
///
/// Command execution failures are deliberately absent: they are
/// recovered inside the dispatcher and surfaced to the end user as a
/// formatted chat reply, never to the caller of start/stop.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// No authentication token has been configured.
    #[error("missing authentication token")]
    MissingToken,

    /// A recognized option carried a value that could not be parsed.
    #[error("invalid value {value:?} for option {key:?}")]
    InvalidOption {
        /// The option key.
        key: String,
        /// The rejected value.
        value: String,
    },

    /// A config file could not be read.
    #[error("failed to read config at {path}: {source}")]
    ConfigRead {
        /// Path to the file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A config file could not be parsed.
    #[error("failed to parse config at {path}: {source}")]
    ConfigParse {
        /// Path to the file.
        path: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// The remote service rejected the configured credentials.
    #[error("authentication rejected: {0}")]
    AuthRejected(#[source] RtmError),

    /// The operation requires a running adapter.
    #[error("adapter is not running")]
    NotRunning,

    /// A command with the same name is already registered.
    #[error("command {0:?} is already registered")]
    DuplicateCommand(String),

    /// An adapter with the same name is already registered.
    #[error("adapter {0:?} is already registered")]
    DuplicateAdapter(String),

    /// Transport-level failure from the remote service client.
    #[error(transparent)]
    Rtm(#[from] RtmError),
}
