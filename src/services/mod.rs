//! Command logic: one async function per player or moderator command, plus the
//! shared context and precondition helpers they build on.

pub mod mod_service;
pub mod player_service;

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::{
    config::AppConfig,
    dao::{
        MafiaDao,
        models::{GameRecord, Phase},
    },
    error::{CommandError, CommandResult},
    state::game::Game,
    transport::{CommandContext, Transport},
};

/// Explicit application context constructed once at startup and passed into
/// every handler. Replaces the module-level singletons of older designs.
pub struct AppContext {
    /// The game repository.
    pub dao: MafiaDao,
    /// The chat host.
    pub transport: Arc<dyn Transport>,
    /// Runtime configuration.
    pub config: AppConfig,
}

/// Shared handle to the application context.
pub type SharedContext = Arc<AppContext>;

/// Resolve the acting user's stable username through the transport.
pub(crate) async fn resolve_actor(
    app: &AppContext,
    ctx: &CommandContext,
) -> CommandResult<String> {
    Ok(app.transport.resolve_username(ctx).await?)
}

/// Resolve the target game: an explicit `in <name|topic id>` argument wins,
/// then the invoking thread, then the invoking chat.
pub(crate) async fn resolve_game(app: &AppContext, ctx: &CommandContext) -> CommandResult<Game> {
    for (position, word) in ctx.args.iter().enumerate() {
        if word.eq_ignore_ascii_case("in") && position + 1 < ctx.args.len() {
            let target = ctx.args[position + 1..].join(" ");
            return if is_numeric(&target) {
                Ok(app.dao.game_by_topic_id(target.parse().unwrap_or_default()).await?)
            } else {
                Ok(app.dao.game_by_name(&target).await?)
            };
        }
    }

    if let Some(topic_id) = ctx.topic_id {
        Ok(app.dao.game_by_topic_id(topic_id).await?)
    } else if let Some(chat_id) = ctx.chat_id {
        Ok(app.dao.game_by_chat_id(chat_id).await?)
    } else {
        Err(CommandError::NoGame)
    }
}

/// Resolve a game reference that may be a topic id or a name.
pub(crate) async fn game_by_reference(app: &AppContext, reference: &str) -> CommandResult<Game> {
    if is_numeric(reference) {
        Ok(app
            .dao
            .game_by_topic_id(reference.parse().unwrap_or_default())
            .await?)
    } else {
        Ok(app.dao.game_by_name(reference).await?)
    }
}

/// Deny unless the acting user is a registered moderator of the game.
pub(crate) fn require_moderator(record: &GameRecord, username: &str) -> CommandResult<()> {
    match record.find_moderator(username) {
        Some(moderator) if moderator.is_moderator => Ok(()),
        _ => Err(CommandError::NotModerator),
    }
}

/// Deny unless the game has been started and is still running.
pub(crate) fn ensure_active(record: &GameRecord) -> CommandResult<()> {
    if record.is_active() {
        Ok(())
    } else {
        Err(CommandError::NotStarted)
    }
}

/// Deny unless the game is currently in `phase`.
pub(crate) fn ensure_phase(record: &GameRecord, phase: Phase) -> CommandResult<()> {
    if record.phase == phase {
        Ok(())
    } else {
        Err(CommandError::WrongPhase {
            phase: record.phase,
        })
    }
}

/// Strip the chat-mention prefix from a target argument.
pub(crate) fn strip_mention(arg: &str) -> &str {
    arg.trim_start_matches('@')
}

/// Whether the whole string is a decimal number.
pub(crate) fn is_numeric(input: &str) -> bool {
    !input.is_empty() && input.chars().all(|c| c.is_ascii_digit())
}

/// Consume tokens from the front of `args` until one of `stops` (which is also
/// consumed) or the end, returning them joined by spaces. `None` when nothing
/// was collected.
pub(crate) fn arg_parse(args: &mut Vec<String>, stops: &[&str]) -> Option<String> {
    let mut taken = Vec::new();
    while !args.is_empty() {
        let word = args.remove(0);
        if stops.iter().any(|stop| word.eq_ignore_ascii_case(stop)) {
            break;
        }
        taken.push(word);
    }
    if taken.is_empty() {
        None
    } else {
        Some(taken.join(" "))
    }
}

/// Plain reply; transport failures are logged, never surfaced.
pub(crate) async fn reply(app: &AppContext, ctx: &CommandContext, text: &str) {
    if let Err(err) = app.transport.reply(ctx, text).await {
        warn!(error = %err, "failed to deliver reply");
    }
}

/// Templated reply; transport and serialization failures are logged, never
/// surfaced.
pub(crate) async fn render<T: Serialize>(
    app: &AppContext,
    ctx: &CommandContext,
    template: &str,
    data: &T,
) {
    let value = match serde_json::to_value(data) {
        Ok(value) => value,
        Err(err) => {
            warn!(template, error = %err, "failed to serialize template data");
            return;
        }
    };
    if let Err(err) = app.transport.reply_with_template(ctx, template, value).await {
        warn!(template, error = %err, "failed to deliver templated reply");
    }
}
