//! Command registry, the never-failing dispatcher, and startup bootstrap.

use std::collections::HashMap;

use rand::seq::IndexedRandom;
use tracing::{info, warn};

use crate::{
    dao::DaoError,
    error::CommandResult,
    services::{
        AppContext,
        mod_service::{self, AdvanceKind},
        player_service,
    },
    state::game::Game,
    transport::CommandContext,
};

/// Every command the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Create a game in the invoking thread.
    Prepare,
    /// Close signups and begin day 1.
    Start,
    /// End the game.
    End,
    /// Join the game.
    Join,
    /// Cast or change a day vote.
    Vote,
    /// Withdraw the current day vote.
    Unvote,
    /// Submit a night action.
    Target,
    /// Modkill or nightkill a player.
    Kill,
    /// Attach a property to a player.
    Set,
    /// Set a game option.
    SetValue,
    /// Jump to the next day's day phase.
    NewDay,
    /// Toggle day/night.
    NextPhase,
    /// Review the current night's actions.
    ListNightActions,
    /// Sanction a thread or chat as part of a game.
    Add,
    /// Deliver a role card through a private chat.
    SendRoleCard,
    /// List the living roster.
    ListPlayers,
    /// List every player, living and dead.
    ListAllPlayers,
    /// Show the current vote tally.
    ListVotes,
}

/// Name/alias table binding command words to handlers.
pub struct CommandRegistry {
    bindings: HashMap<String, Command>,
}

impl CommandRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// The full default command set, aliases included.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("prepare", Command::Prepare);
        registry.register("start", Command::Start);
        registry.register("end", Command::End);
        registry.register("finish", Command::End);
        registry.register("join", Command::Join);
        registry.register("vote", Command::Vote);
        registry.register("for", Command::Vote);
        registry.register("unvote", Command::Unvote);
        registry.register("target", Command::Target);
        registry.register("kill", Command::Kill);
        registry.register("set", Command::Set);
        registry.register("setvalue", Command::SetValue);
        registry.register("option", Command::SetValue);
        registry.register("new-day", Command::NewDay);
        registry.register("next-phase", Command::NextPhase);
        registry.register("list-night-actions", Command::ListNightActions);
        registry.register("add", Command::Add);
        registry.register("send-rolecard", Command::SendRoleCard);
        registry.register("list-players", Command::ListPlayers);
        registry.register("list-all-players", Command::ListAllPlayers);
        registry.register("list-votes", Command::ListVotes);
        registry
    }

    /// Bind a command word. Later registrations win, so hosts can shadow
    /// defaults.
    pub fn register(&mut self, name: &str, command: Command) {
        self.bindings.insert(name.to_lowercase(), command);
    }

    /// Resolve a command word, case-insensitively.
    pub fn lookup(&self, name: &str) -> Option<Command> {
        self.bindings.get(&name.to_lowercase()).copied()
    }

    /// Registered command words, for startup logging.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Dispatch one command invocation. Total by contract: every failure is caught
/// here and reported through the transport, never propagated to the host.
pub async fn dispatch(
    app: &AppContext,
    registry: &CommandRegistry,
    name: &str,
    ctx: &CommandContext,
) {
    let Some(command) = registry.lookup(name) else {
        let fallback = "Command invalid or no command issued.";
        let message = app
            .config
            .messages
            .choose(&mut rand::rng())
            .map(String::as_str)
            .unwrap_or(fallback);
        if let Err(err) = app.transport.reply(ctx, message).await {
            warn!(name, error = %err, "failed to reply to unknown command");
        }
        return;
    };

    if let Err(err) = run(app, command, ctx).await {
        warn!(?command, error = %err, "command failed");
        if let Err(transport_err) = app
            .transport
            .report_error(ctx, error_prefix(command), &err.to_string())
            .await
        {
            warn!(?command, error = %transport_err, "failed to report command error");
        }
    }
}

async fn run(app: &AppContext, command: Command, ctx: &CommandContext) -> CommandResult<()> {
    match command {
        Command::Prepare => mod_service::prepare(app, ctx).await,
        Command::Start => mod_service::start(app, ctx).await,
        Command::End => mod_service::finish(app, ctx).await,
        Command::Join => player_service::join(app, ctx).await,
        Command::Vote => player_service::vote(app, ctx).await,
        Command::Unvote => player_service::unvote(app, ctx).await,
        Command::Target => player_service::night_target(app, ctx).await,
        Command::Kill => mod_service::kill(app, ctx).await,
        Command::Set => mod_service::set_property(app, ctx).await,
        Command::SetValue => mod_service::set_value(app, ctx).await,
        Command::NewDay => mod_service::advance(app, ctx, AdvanceKind::Day).await,
        Command::NextPhase => mod_service::advance(app, ctx, AdvanceKind::Phase).await,
        Command::ListNightActions => mod_service::list_night_actions(app, ctx).await,
        Command::Add => mod_service::add_link(app, ctx).await,
        Command::SendRoleCard => mod_service::send_rolecard(app, ctx).await,
        Command::ListPlayers => player_service::list_players(app, ctx).await,
        Command::ListAllPlayers => player_service::list_all_players(app, ctx).await,
        Command::ListVotes => player_service::list_votes(app, ctx).await,
    }
}

fn error_prefix(command: Command) -> &'static str {
    match command {
        Command::Prepare => "Error creating game: ",
        Command::Start => "Error starting game: ",
        Command::End => "Error ending game: ",
        Command::Join => "Error joining game: ",
        Command::Vote => "Error voting: ",
        Command::Unvote => "Error unvoting: ",
        Command::Target => "Error targeting: ",
        Command::Kill => "Error killing player: ",
        Command::Set => "Error setting player property: ",
        Command::SetValue => "Error setting game value: ",
        Command::NewDay => "Error incrementing day: ",
        Command::NextPhase => "Error incrementing phase: ",
        Command::ListNightActions => "Error listing night actions: ",
        Command::Add => "Error adding thread/chat: ",
        Command::SendRoleCard => "Error sending rolecard: ",
        Command::ListPlayers => "Error listing players: ",
        Command::ListAllPlayers => "Error listing players: ",
        Command::ListVotes => "Error listing votes: ",
    }
}

/// Replay the configured game at startup: create it, or augment the existing
/// one, then register the configured players and moderators. Duplicate
/// registrations are logged no-ops so restarts are idempotent; storage
/// failures propagate and abort host startup.
pub async fn bootstrap(app: &AppContext) -> Result<Option<Game>, DaoError> {
    let (Some(thread), Some(name)) = (app.config.thread, app.config.name.clone()) else {
        info!("no game configured; skipping bootstrap");
        return Ok(None);
    };

    let game = match app.dao.create_game(thread, &name).await {
        Ok(game) => {
            info!(thread, name = %name, "created configured game");
            game
        }
        Err(DaoError::GameExists) => {
            info!(thread, name = %name, "existing game found, augmenting");
            app.dao.game_by_topic_id(thread).await?
        }
        Err(err) => return Err(err),
    };

    for player in &app.config.players {
        if let Err(err) = game.add_player(player).await {
            warn!(player = %player, error = %err, "skipping configured player");
        }
    }
    for moderator in &app.config.mods {
        if let Err(err) = game.add_moderator(moderator).await {
            warn!(moderator = %moderator, error = %err, "skipping configured moderator");
        }
    }

    Ok(Some(game))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        services::testing::{ctx, seeded_game, test_app, test_app_with},
        transport::testing::Sent,
    };

    #[tokio::test]
    async fn dispatch_reports_failures_instead_of_propagating() {
        let (app, transport) = test_app();
        seeded_game(&app).await;
        let registry = CommandRegistry::with_defaults();

        // Non-mod kill: the handler fails, dispatch must swallow and report.
        dispatch(&app, &registry, "kill", &ctx("yamikuronue", &["@accalia"])).await;

        let errors = transport.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Error killing player: "));
        assert!(errors[0].contains("not a moderator"));
    }

    #[tokio::test]
    async fn unknown_commands_get_a_canned_reply() {
        let mut config = AppConfig::ephemeral();
        config.messages = vec!["Nope.".into()];
        let (app, transport) = test_app_with(config);
        let registry = CommandRegistry::with_defaults();

        dispatch(&app, &registry, "dance", &ctx("yamikuronue", &[])).await;

        assert_eq!(transport.replies(), vec!["Nope."]);
    }

    #[tokio::test]
    async fn aliases_resolve_to_the_same_command() {
        let registry = CommandRegistry::with_defaults();
        assert_eq!(registry.lookup("option"), Some(Command::SetValue));
        assert_eq!(registry.lookup("setValue"), Some(Command::SetValue));
        assert_eq!(registry.lookup("FINISH"), Some(Command::End));
        assert_eq!(registry.lookup("dance"), None);
    }

    #[tokio::test]
    async fn full_game_flows_through_dispatch() {
        let (app, transport) = test_app();
        let registry = CommandRegistry::with_defaults();

        dispatch(&app, &registry, "prepare", &ctx("Moddy", &["testMafia"])).await;
        dispatch(&app, &registry, "join", &ctx("alice", &[])).await;
        dispatch(&app, &registry, "join", &ctx("bob", &[])).await;
        dispatch(&app, &registry, "join", &ctx("carol", &[])).await;
        dispatch(&app, &registry, "start", &ctx("Moddy", &[])).await;
        dispatch(&app, &registry, "vote", &ctx("alice", &["@bob"])).await;
        dispatch(&app, &registry, "vote", &ctx("carol", &["@bob"])).await;

        assert!(transport.errors().is_empty(), "{:?}", transport.sent());
        let game = app.dao.game_by_name("testMafia").await.expect("game");
        let record = game.snapshot().await.unwrap();
        assert!(!record.find_player("bob").unwrap().alive);
    }

    #[tokio::test]
    async fn bootstrap_creates_then_augments_idempotently() {
        let mut config = AppConfig::ephemeral();
        config.thread = Some(7);
        config.name = Some("configMafia".into());
        config.players = vec!["alice".into(), "bob".into()];
        config.mods = vec!["Moddy".into()];
        let (app, _transport) = test_app_with(config);

        let game = bootstrap(&app).await.expect("first run").expect("game");
        let record = game.snapshot().await.unwrap();
        assert_eq!(record.players.len(), 2);
        assert_eq!(record.moderators.len(), 1);

        // A restart replays the same configuration without failing.
        let game = bootstrap(&app).await.expect("second run").expect("game");
        let record = game.snapshot().await.unwrap();
        assert_eq!(record.players.len(), 2);
        assert_eq!(record.moderators.len(), 1);
    }

    #[tokio::test]
    async fn bootstrap_without_configured_game_is_a_no_op() {
        let (app, _transport) = test_app();
        assert!(bootstrap(&app).await.expect("bootstrap").is_none());
    }

    #[tokio::test]
    async fn list_commands_render_templates_through_dispatch() {
        let (app, transport) = test_app();
        seeded_game(&app).await;
        let registry = CommandRegistry::with_defaults();

        dispatch(&app, &registry, "list-players", &ctx("yamikuronue", &[])).await;

        assert!(
            transport
                .sent()
                .iter()
                .any(|entry| matches!(entry, Sent::Template(name, _) if name == "listPlayers"))
        );
    }
}
