//! Moderator commands: game setup, lifecycle advances, kills, properties,
//! options, links, night-action review, and role-card delivery.

use tracing::{debug, info};

use crate::{
    dao::models::{ActionToken, Phase, PlayerProperty},
    dto::{ModSuccess, NewDaySummary, NightAction, NightActionsReport},
    error::{CommandError, CommandResult},
    services::{
        AppContext, arg_parse, ensure_active, game_by_reference, render, reply, require_moderator,
        resolve_actor, resolve_game, strip_mention,
    },
    state::{game::LinkPolicy, ledger},
    transport::CommandContext,
};

use super::player_service::roster_summary;

/// Which direction a lifecycle advance goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceKind {
    /// `!new-day`: jump to the next day's day phase.
    Day,
    /// `!next-phase`: toggle day/night.
    Phase,
}

/// Create a game in the invoking thread and register the caller as its
/// moderator.
pub async fn prepare(app: &AppContext, ctx: &CommandContext) -> CommandResult<()> {
    let actor = resolve_actor(app, ctx).await?;
    let topic_id = ctx.topic_id.ok_or_else(|| {
        CommandError::InvalidInput("A game must be prepared from its thread".into())
    })?;
    let name = ctx.args.join(" ");
    if name.is_empty() {
        return Err(CommandError::InvalidInput(
            "Incorrect syntax. Usage: !prepare gameName".into(),
        ));
    }

    let game = app.dao.create_game(topic_id, &name).await?;
    game.add_moderator(&actor).await?;
    info!(topic_id, name = %name, moderator = %actor, "game prepared");
    reply(
        app,
        ctx,
        &format!("Game \"{name}\" created! The mod is @{actor}"),
    )
    .await;
    Ok(())
}

/// Start the game: close signups and begin day 1.
pub async fn start(app: &AppContext, ctx: &CommandContext) -> CommandResult<()> {
    let actor = resolve_actor(app, ctx).await?;
    let game = resolve_game(app, ctx).await?;
    let record = game.snapshot().await?;
    require_moderator(&record, &actor)?;

    game.start().await?;
    reply(
        app,
        ctx,
        &format!("Game \"{}\" has started! It is now day 1.", record.name),
    )
    .await;
    Ok(())
}

/// End the game. The final roster is reported before the game is finalized.
pub async fn finish(app: &AppContext, ctx: &CommandContext) -> CommandResult<()> {
    let actor = resolve_actor(app, ctx).await?;
    let game = resolve_game(app, ctx).await?;
    let record = game.snapshot().await?;
    require_moderator(&record, &actor)?;
    ensure_active(&record)?;

    render(app, ctx, "listAllPlayers", &roster_summary(&record)).await;
    game.finish().await?;
    reply(app, ctx, &format!("Game \"{}\" is over.", record.name)).await;
    Ok(())
}

/// Modkill or nightkill a player.
pub async fn kill(app: &AppContext, ctx: &CommandContext) -> CommandResult<()> {
    let actor = resolve_actor(app, ctx).await?;
    let game = resolve_game(app, ctx).await?;
    let record = game.snapshot().await?;

    ensure_active(&record)?;
    require_moderator(&record, &actor)?;

    let target_arg = ctx
        .args
        .first()
        .map(|arg| strip_mention(arg))
        .filter(|arg| !arg.is_empty())
        .ok_or_else(|| CommandError::InvalidInput("Please select a target to kill".into()))?;
    let target = record
        .find_player(target_arg)
        .ok_or_else(|| CommandError::TargetNotInGame {
            username: target_arg.to_string(),
        })?;
    if !target.alive {
        return Err(CommandError::TargetNotAlive {
            username: target.username.clone(),
        });
    }

    let target = target.username.clone();
    game.kill_player(&target).await?;
    debug!(target = %target, game = %record.name, "player killed");
    render(
        app,
        ctx,
        "modSuccess",
        &ModSuccess {
            command: "Kill".into(),
            results: format!("Killed @{target}"),
            game: record.name,
        },
    )
    .await;
    Ok(())
}

/// Attach a property to a living player: `!set @player loved [in game]`.
pub async fn set_property(app: &AppContext, ctx: &CommandContext) -> CommandResult<()> {
    let actor = resolve_actor(app, ctx).await?;
    let game = resolve_game(app, ctx).await?;
    let record = game.snapshot().await?;

    ensure_active(&record)?;
    require_moderator(&record, &actor)?;

    if ctx.args.len() < 2 {
        return Err(CommandError::InvalidInput(
            "Incorrect syntax. Usage: !set [playerName] [property] or !set [playerName] [property] in testMafia"
                .into(),
        ));
    }
    let target_arg = strip_mention(&ctx.args[0]);
    let property = PlayerProperty::from(ctx.args[1].to_lowercase());

    let target = record
        .find_player(target_arg)
        .ok_or_else(|| CommandError::TargetNotInGame {
            username: target_arg.to_string(),
        })?;
    if !target.alive {
        return Err(CommandError::TargetNotAlive {
            username: target.username.clone(),
        });
    }

    let target = target.username.clone();
    game.add_player_property(&target, property.clone()).await?;
    debug!(target = %target, property = %property, game = %record.name, "property set");
    render(
        app,
        ctx,
        "modSuccess",
        &ModSuccess {
            command: "Set property".into(),
            results: format!("Player {target} is now {property}"),
            game: record.name,
        },
    )
    .await;
    Ok(())
}

/// Set a game option: `!option [set] key to value [in game]`. Echoes the
/// previous value back so accidental overwrites are visible.
pub async fn set_value(app: &AppContext, ctx: &CommandContext) -> CommandResult<()> {
    let actor = resolve_actor(app, ctx).await?;

    let mut args = ctx.args.clone();
    if args
        .first()
        .is_some_and(|word| word.eq_ignore_ascii_case("set"))
    {
        args.remove(0);
    }
    let option = arg_parse(&mut args, &["to", "equal", "equals"]).ok_or_else(|| {
        CommandError::InvalidInput("Incorrect syntax. Usage: !option key to value".into())
    })?;
    let value = arg_parse(&mut args, &["in"]).ok_or_else(|| {
        CommandError::InvalidInput("Incorrect syntax. Usage: !option key to value".into())
    })?;

    let game = if args.is_empty() {
        resolve_game(app, ctx).await?
    } else {
        game_by_reference(app, &args.join(" ")).await?
    };
    let record = game.snapshot().await?;
    require_moderator(&record, &actor)?;

    let previous = game.set_value(&option, &value).await?;
    let previous = previous.unwrap_or_else(|| "unset".into());
    reply(
        app,
        ctx,
        &format!("Set option {option} to value \"{value}\" (Previous value was {previous})"),
    )
    .await;
    Ok(())
}

/// Advance the lifecycle: `!new-day` or `!next-phase`, optionally with a
/// deadline (`!next-phase ends <time>`).
pub async fn advance(app: &AppContext, ctx: &CommandContext, kind: AdvanceKind) -> CommandResult<()> {
    let actor = resolve_actor(app, ctx).await?;

    let mut args = ctx.args.clone();
    let end_time = if args
        .first()
        .is_some_and(|word| word.eq_ignore_ascii_case("ends"))
    {
        args.remove(0);
        arg_parse(&mut args, &["in"])
    } else {
        None
    };

    let game = resolve_game(app, ctx).await?;
    let record = game.snapshot().await?;
    ensure_active(&record)?;
    require_moderator(&record, &actor)?;

    let change = match kind {
        AdvanceKind::Day => game.new_day().await?,
        AdvanceKind::Phase => game.next_phase().await?,
    };
    debug!(
        from_day = change.from.day,
        from_phase = %change.from.phase,
        day = change.to.day,
        phase = %change.to.phase,
        game = %record.name,
        "advanced"
    );

    if let Some(end_time) = &end_time {
        game.set_value("phaseEnd", end_time).await?;
    }

    if change.started_new_day() {
        let record = game.snapshot().await?;
        let names: Vec<String> = record
            .living_players()
            .map(|player| player.username.clone())
            .collect();
        render(
            app,
            ctx,
            "newDay",
            &NewDaySummary {
                day: record.day,
                num_players: names.len(),
                to_execute: ledger::lynch_threshold(&record),
                names,
                show_phase_end: end_time.is_some(),
                phase_end: end_time,
            },
        )
        .await;
    } else {
        let mut text = format!("It is now {}", change.to.phase);
        if let Some(end_time) = end_time {
            text.push_str(&format!(". The phase will end {end_time}"));
        }
        reply(app, ctx, &text).await;
    }
    Ok(())
}

/// List the current night's submitted actions, grouped by lane.
pub async fn list_night_actions(app: &AppContext, ctx: &CommandContext) -> CommandResult<()> {
    let actor = resolve_actor(app, ctx).await?;
    let game = resolve_game(app, ctx).await?;
    let record = game.snapshot().await?;
    require_moderator(&record, &actor)?;

    let mut report = NightActionsReport::default();
    for action in ledger::current_actions(&record, None) {
        if action.phase != Phase::Night {
            continue;
        }
        let Some(target) = &action.target else {
            continue;
        };
        let entry = NightAction {
            actor: action.actor.clone(),
            target: target.clone(),
            token: action.token.to_string(),
        };
        let group = match action.token {
            ActionToken::Scum => &mut report.scum,
            ActionToken::Scum2 => &mut report.scum2,
            _ => &mut report.other,
        };
        group.show = true;
        group.actions.push(entry);
    }

    render(app, ctx, "listNightActions", &report).await;
    Ok(())
}

/// Sanction a thread or chat as part of a game. Accepts the terse and verbose
/// forms: `!add thread 123 gameName`, `!add chat 123 to gameName`,
/// `!add this to gameName`.
pub async fn add_link(app: &AppContext, ctx: &CommandContext) -> CommandResult<()> {
    const USAGE: &str = "Incorrect syntax. Usage: !add [thread|chat] 123 testMafia or !add [thread|chat] 123 to testMafia or !add this to testMafia";

    let actor = resolve_actor(app, ctx).await?;

    let kind = ctx
        .args
        .first()
        .map(|word| word.to_lowercase())
        .ok_or_else(|| CommandError::InvalidInput(USAGE.into()))?;
    let this_mode = kind == "this";

    let game_ref = {
        let tail = if this_mode { &ctx.args[1..] } else { ctx.args.get(2..).unwrap_or(&[]) };
        let mut tail = tail.to_vec();
        if tail
            .first()
            .is_some_and(|word| word.eq_ignore_ascii_case("to"))
        {
            tail.remove(0);
        }
        if tail.is_empty() {
            return Err(CommandError::InvalidInput(USAGE.into()));
        }
        tail.join(" ")
    };

    let game = game_by_reference(app, &game_ref).await?;
    let record = game.snapshot().await?;
    require_moderator(&record, &actor)?;
    debug!(game = %record.name, actor = %actor, "add link requested");

    let policy = if app.config.strict_links {
        LinkPolicy::RejectDuplicates
    } else {
        LinkPolicy::AllowDuplicates
    };

    let linked_chat = if this_mode {
        match (ctx.topic_id, ctx.chat_id) {
            (Some(topic_id), _) => {
                game.add_topic(topic_id, policy).await?;
                None
            }
            (None, Some(chat_id)) => {
                game.add_chat(chat_id, policy).await?;
                Some(chat_id)
            }
            (None, None) => return Err(CommandError::InvalidInput(USAGE.into())),
        }
    } else {
        let item: u64 = ctx
            .args
            .get(1)
            .filter(|raw| super::is_numeric(raw))
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| CommandError::InvalidInput(USAGE.into()))?;
        match kind.as_str() {
            "thread" => {
                game.add_topic(item, policy).await?;
                None
            }
            "chat" => {
                game.add_chat(item, policy).await?;
                Some(item)
            }
            other => {
                return Err(CommandError::InvalidInput(format!(
                    "I don't know how to add a \"{other}\". Try a \"thread\" or a \"chat\"?"
                )));
            }
        }
    };

    reply(app, ctx, "Success! That thread/chat is now part of the game.").await;
    let announcement = format!("This is now sanctioned as part of {}", record.name);
    match linked_chat {
        Some(chat_id) => {
            let _ = app.transport.reply_in_chat(chat_id, &announcement).await;
        }
        None => {
            let topic = if this_mode {
                ctx.topic_id.unwrap_or(record.topic_id)
            } else {
                ctx.args
                    .get(1)
                    .and_then(|raw| raw.parse().ok())
                    .unwrap_or(record.topic_id)
            };
            let _ = app.transport.reply_in_topic(topic, &announcement).await;
        }
    }
    Ok(())
}

/// Deliver a role card: create a private chat with the game's moderators and
/// the target, seeded with the invoking post's body.
pub async fn send_rolecard(app: &AppContext, ctx: &CommandContext) -> CommandResult<()> {
    const USAGE: &str =
        "Invalid command: command format is `!send-rolecard TargetUsername in TargetGame`";

    let actor = resolve_actor(app, ctx).await?;

    let mut args = ctx.args.clone();
    let target_arg = arg_parse(&mut args, &["in"])
        .map(|raw| strip_mention(&raw).to_string())
        .ok_or_else(|| CommandError::InvalidInput(USAGE.into()))?;
    if args.is_empty() {
        return Err(CommandError::InvalidInput(USAGE.into()));
    }
    let game_ref = args.join(" ");

    let game = game_by_reference(app, &game_ref).await?;
    let record = game.snapshot().await?;
    require_moderator(&record, &actor)?;

    let target = record
        .find_player(&target_arg)
        .filter(|player| player.alive)
        .ok_or_else(|| {
            CommandError::InvalidInput(format!(
                "{target_arg} is not a living player in {}",
                record.name
            ))
        })?;

    let mut members: Vec<String> = record
        .moderators
        .iter()
        .map(|moderator| moderator.username.clone())
        .collect();
    members.push(target.username.clone());

    let title = format!("Rolecard for {}", record.name);
    let chat_id = app
        .transport
        .create_chat(&members, &ctx.parent_body, &title)
        .await?;
    game.add_chat(chat_id, LinkPolicy::AllowDuplicates).await?;

    let target = target.username.clone();
    info!(target = %target, game = %record.name, chat_id, "rolecard sent");
    reply(
        app,
        ctx,
        &format!("Sent rolecard to {target} in {}", record.name),
    )
    .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::models::GameStatus,
        services::testing::{ctx, seeded_game, test_app, test_app_with},
        transport::testing::Sent,
    };

    #[tokio::test]
    async fn prepare_creates_a_game_with_the_caller_as_mod() {
        let (app, transport) = test_app();

        prepare(&app, &ctx("ModdyMcModerson", &["bushidoMafia"]))
            .await
            .expect("prepare");

        let game = app.dao.game_by_name("bushidoMafia").await.expect("game");
        let record = game.snapshot().await.unwrap();
        assert!(record.find_moderator("ModdyMcModerson").is_some());
        assert!(
            transport.replies()[0].contains("Game \"bushidoMafia\" created!"),
        );
    }

    #[tokio::test]
    async fn prepare_rejects_an_occupied_thread() {
        let (app, _transport) = test_app();
        seeded_game(&app).await;

        match prepare(&app, &ctx("dreikin", &["bushidoMafia"])).await {
            Err(CommandError::GameExists) => {}
            other => panic!("expected GameExists, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_mods_cannot_kill_and_the_target_stays_alive() {
        let (app, _transport) = test_app();
        let game = seeded_game(&app).await;

        match kill(&app, &ctx("yamikuronue", &["@accalia"])).await {
            Err(CommandError::NotModerator) => {}
            other => panic!("expected NotModerator, got {other:?}"),
        }
        let record = game.snapshot().await.unwrap();
        assert!(record.find_player("accalia").unwrap().alive);
    }

    #[tokio::test]
    async fn every_mutating_command_is_mod_gated() {
        let (app, _transport) = test_app();
        let game = seeded_game(&app).await;

        let denied = [
            start(&app, &ctx("yamikuronue", &[])).await,
            finish(&app, &ctx("yamikuronue", &[])).await,
            set_value(&app, &ctx("yamikuronue", &["x", "to", "y"])).await,
            add_link(&app, &ctx("yamikuronue", &["thread", "5", "testGame"])).await,
            advance(&app, &ctx("yamikuronue", &[]), AdvanceKind::Day).await,
        ];
        for outcome in denied {
            match outcome {
                Err(CommandError::NotModerator) => {}
                other => panic!("expected NotModerator, got {other:?}"),
            }
        }

        // Nothing leaked through: the entity state is untouched.
        let record = game.snapshot().await.unwrap();
        assert_eq!(record.status, GameStatus::Running);
        assert_eq!(record.day, 1);
        assert!(record.values.is_empty());
        assert_eq!(record.topics, vec![1]);
    }

    #[tokio::test]
    async fn mods_can_kill_living_players() {
        let (app, transport) = test_app();
        let game = seeded_game(&app).await;

        kill(&app, &ctx("ModdyMcModerson", &["@accalia"]))
            .await
            .expect("kill");

        let record = game.snapshot().await.unwrap();
        assert!(!record.find_player("accalia").unwrap().alive);
        assert!(
            transport
                .sent()
                .iter()
                .any(|entry| matches!(entry, Sent::Template(name, _) if name == "modSuccess"))
        );
    }

    #[tokio::test]
    async fn killing_a_dead_player_is_rejected() {
        let (app, _transport) = test_app();
        let game = seeded_game(&app).await;
        game.kill_player("accalia").await.expect("first kill");

        match kill(&app, &ctx("ModdyMcModerson", &["@accalia"])).await {
            Err(CommandError::TargetNotAlive { username }) => assert_eq!(username, "accalia"),
            other => panic!("expected TargetNotAlive, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn properties_can_only_be_set_by_mods_on_living_players() {
        let (app, _transport) = test_app();
        let game = seeded_game(&app).await;

        match set_property(&app, &ctx("yamikuronue", &["@accalia", "loved"])).await {
            Err(CommandError::NotModerator) => {}
            other => panic!("expected NotModerator, got {other:?}"),
        }

        set_property(&app, &ctx("ModdyMcModerson", &["@accalia", "loved"]))
            .await
            .expect("set");
        let record = game.snapshot().await.unwrap();
        assert!(
            record
                .find_player("accalia")
                .unwrap()
                .has_property(&PlayerProperty::Loved)
        );

        match set_property(&app, &ctx("ModdyMcModerson", &["@banana", "loved"])).await {
            Err(CommandError::TargetNotInGame { .. }) => {}
            other => panic!("expected TargetNotInGame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn set_value_echoes_the_previous_value() {
        let (app, transport) = test_app();
        seeded_game(&app).await;

        set_value(
            &app,
            &ctx("ModdyMcModerson", &["phaseEnd", "to", "sundown"]),
        )
        .await
        .expect("set");
        set_value(
            &app,
            &ctx("ModdyMcModerson", &["phaseEnd", "to", "midnight"]),
        )
        .await
        .expect("overwrite");

        let replies = transport.replies();
        assert!(replies[0].contains("Previous value was unset"));
        assert!(replies[1].contains("Previous value was sundown"));
    }

    #[tokio::test]
    async fn advancing_requires_a_running_game_and_a_mod() {
        let (app, _transport) = test_app();
        let game = app.dao.create_game(1, "testGame").await.expect("create");
        game.add_moderator("ModdyMcModerson").await.expect("mod");

        match advance(&app, &ctx("ModdyMcModerson", &[]), AdvanceKind::Phase).await {
            Err(CommandError::NotStarted) => {}
            other => panic!("expected NotStarted, got {other:?}"),
        }

        game.start().await.expect("start");
        match advance(&app, &ctx("someone", &[]), AdvanceKind::Phase).await {
            Err(CommandError::NotModerator) => {}
            other => panic!("expected NotModerator, got {other:?}"),
        }
        assert_eq!(game.snapshot().await.unwrap().day, 1);
    }

    #[tokio::test]
    async fn next_phase_announces_night_new_day_announces_the_roster() {
        let (app, transport) = test_app();
        seeded_game(&app).await;

        advance(&app, &ctx("ModdyMcModerson", &[]), AdvanceKind::Phase)
            .await
            .expect("to night");
        assert!(transport.replies().contains(&"It is now night".to_string()));

        advance(&app, &ctx("ModdyMcModerson", &[]), AdvanceKind::Day)
            .await
            .expect("new day");
        let summary = transport
            .sent()
            .into_iter()
            .find_map(|entry| match entry {
                Sent::Template(name, data) if name == "newDay" => Some(data),
                _ => None,
            })
            .expect("newDay template");
        assert_eq!(summary["day"], 2);
        assert_eq!(summary["numPlayers"], 3);
        assert_eq!(summary["toExecute"], 2);
    }

    #[tokio::test]
    async fn phase_deadlines_are_stored_and_announced() {
        let (app, transport) = test_app();
        let game = seeded_game(&app).await;

        advance(
            &app,
            &ctx("ModdyMcModerson", &["ends", "sundown"]),
            AdvanceKind::Phase,
        )
        .await
        .expect("to night");

        assert!(
            transport
                .replies()
                .contains(&"It is now night. The phase will end sundown".to_string())
        );
        let record = game.snapshot().await.unwrap();
        assert_eq!(record.values.get("phaseEnd"), Some(&"sundown".to_string()));
    }

    #[tokio::test]
    async fn night_actions_are_grouped_by_lane() {
        let (app, transport) = test_app();
        let game = seeded_game(&app).await;
        game.next_phase().await.expect("to night");
        game.record_action("yamikuronue", "accalia", ActionToken::Scum)
            .await
            .expect("scum");
        game.record_action("dreikin", "accalia", ActionToken::Target)
            .await
            .expect("other");

        list_night_actions(&app, &ctx("ModdyMcModerson", &[]))
            .await
            .expect("list");

        let report = transport
            .sent()
            .into_iter()
            .find_map(|entry| match entry {
                Sent::Template(name, data) if name == "listNightActions" => Some(data),
                _ => None,
            })
            .expect("listNightActions template");
        assert_eq!(report["scum"]["show"], true);
        assert_eq!(report["scum"]["actions"][0]["actor"], "yamikuronue");
        assert_eq!(report["scum2"]["show"], false);
        assert_eq!(report["other"]["actions"][0]["actor"], "dreikin");
    }

    #[tokio::test]
    async fn threads_and_chats_can_be_added_in_every_form() {
        let (app, _transport) = test_app();
        let game = seeded_game(&app).await;

        add_link(&app, &ctx("ModdyMcModerson", &["thread", "123", "testGame"]))
            .await
            .expect("thread");
        add_link(
            &app,
            &ctx("ModdyMcModerson", &["chat", "9", "to", "testGame"]),
        )
        .await
        .expect("chat");
        add_link(&app, &ctx("ModdyMcModerson", &["this", "to", "testGame"]))
            .await
            .expect("this");

        let record = game.snapshot().await.unwrap();
        assert!(record.topics.contains(&123));
        assert!(record.chats.contains(&9));
        // "this" was invoked from topic 1.
        assert_eq!(record.topics.iter().filter(|id| **id == 1).count(), 2);
    }

    #[tokio::test]
    async fn strict_links_reject_relinking() {
        let mut config = crate::config::AppConfig::ephemeral();
        config.strict_links = true;
        let (app, _transport) = test_app_with(config);
        seeded_game(&app).await;

        match add_link(&app, &ctx("ModdyMcModerson", &["this", "to", "testGame"])).await {
            Err(CommandError::Game(_)) => {}
            other => panic!("expected duplicate link error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_link_kinds_are_refused() {
        let (app, _transport) = test_app();
        seeded_game(&app).await;

        match add_link(
            &app,
            &ctx("ModdyMcModerson", &["banana", "123", "testGame"]),
        )
        .await
        {
            Err(CommandError::InvalidInput(message)) => {
                assert!(message.contains("banana"));
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rolecards_open_a_chat_with_mods_and_target() {
        let (app, transport) = test_app();
        let game = seeded_game(&app).await;

        let mut ctx = ctx("ModdyMcModerson", &["accalia", "in", "testGame"]);
        ctx.parent_body = "You are the cop.".into();
        send_rolecard(&app, &ctx).await.expect("rolecard");

        let created = transport
            .sent()
            .into_iter()
            .find_map(|entry| match entry {
                Sent::ChatCreated(id, members, title) => Some((id, members, title)),
                _ => None,
            })
            .expect("chat created");
        assert_eq!(created.1, vec!["ModdyMcModerson", "accalia"]);
        assert_eq!(created.2, "Rolecard for testGame");

        let record = game.snapshot().await.unwrap();
        assert!(record.chats.contains(&created.0));
    }

    #[tokio::test]
    async fn rolecards_require_a_living_target() {
        let (app, _transport) = test_app();
        let game = seeded_game(&app).await;
        game.kill_player("accalia").await.expect("kill");

        match send_rolecard(&app, &ctx("ModdyMcModerson", &["accalia", "in", "testGame"])).await {
            Err(CommandError::InvalidInput(message)) => {
                assert!(message.contains("not a living player"));
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ending_reports_the_roster_before_finalizing() {
        let (app, transport) = test_app();
        let game = seeded_game(&app).await;
        game.kill_player("dreikin").await.expect("kill");

        finish(&app, &ctx("ModdyMcModerson", &[])).await.expect("end");

        let record = game.snapshot().await.unwrap();
        assert_eq!(record.status, GameStatus::Finished);
        let roster = transport
            .sent()
            .into_iter()
            .find_map(|entry| match entry {
                Sent::Template(name, data) if name == "listAllPlayers" => Some(data),
                _ => None,
            })
            .expect("roster template");
        assert_eq!(roster["players"].as_array().unwrap().len(), 3);
    }
}
