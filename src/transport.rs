//! Narrow interface to the external chat host.
//!
//! The engine never talks to the messaging platform directly: handlers resolve
//! the acting user and render results only through this trait. Replies are
//! fire-and-forget — a transport failure is the host's problem, not a rules
//! violation.

use futures::future::BoxFuture;
use thiserror::Error;

/// Result alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Error raised by the host transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The host rejected or failed the operation.
    #[error("transport failure: {0}")]
    Failed(String),
}

/// Invocation context delivered with each command by the host.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Raw author token as the host saw it (may carry an `@` prefix).
    pub author: String,
    /// Thread the command was posted in, if any.
    pub topic_id: Option<u64>,
    /// Chat the command came from, when not posted in a thread.
    pub chat_id: Option<u64>,
    /// Tokenized arguments after the command name.
    pub args: Vec<String>,
    /// The full raw input line.
    pub input: String,
    /// Body of the post the command was embedded in (role cards ride here).
    pub parent_body: String,
}

/// The chat host as the engine sees it.
pub trait Transport: Send + Sync {
    /// Resolve the acting user's stable username from the invocation context.
    fn resolve_username<'a>(
        &'a self,
        ctx: &'a CommandContext,
    ) -> BoxFuture<'a, TransportResult<String>>;

    /// Plain reply to the invoking context.
    fn reply<'a>(
        &'a self,
        ctx: &'a CommandContext,
        text: &'a str,
    ) -> BoxFuture<'a, TransportResult<()>>;

    /// Reply rendered from a named template with a data object.
    fn reply_with_template<'a>(
        &'a self,
        ctx: &'a CommandContext,
        template: &'a str,
        data: serde_json::Value,
    ) -> BoxFuture<'a, TransportResult<()>>;

    /// Report a handler failure to the invoking user.
    fn report_error<'a>(
        &'a self,
        ctx: &'a CommandContext,
        prefix: &'a str,
        message: &'a str,
    ) -> BoxFuture<'a, TransportResult<()>>;

    /// Post into an arbitrary thread.
    fn reply_in_topic<'a>(
        &'a self,
        topic_id: u64,
        text: &'a str,
    ) -> BoxFuture<'a, TransportResult<()>>;

    /// Post into an arbitrary chat.
    fn reply_in_chat<'a>(&'a self, chat_id: u64, text: &'a str)
    -> BoxFuture<'a, TransportResult<()>>;

    /// Create a private chat room with the given members, body, and title,
    /// returning the new room's id.
    fn create_chat<'a>(
        &'a self,
        users: &'a [String],
        body: &'a str,
        title: &'a str,
    ) -> BoxFuture<'a, TransportResult<u64>>;
}
