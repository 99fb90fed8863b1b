//! Commands any participant can issue: joining, voting, night targeting, and
//! the public listings.

use tracing::debug;

use crate::{
    dao::models::{ActionToken, GameStatus, Phase},
    dto::{Lynched, RosterEntry, RosterSummary, VoteCount, VoteSummary},
    error::{CommandError, CommandResult},
    services::{
        AppContext, ensure_active, ensure_phase, render, reply, resolve_actor, resolve_game,
        strip_mention,
    },
    state::ledger,
    transport::CommandContext,
};

/// Join the game running in the invoking context. Open while the game is in
/// signups or already running; closed once it has finished.
pub async fn join(app: &AppContext, ctx: &CommandContext) -> CommandResult<()> {
    let actor = resolve_actor(app, ctx).await?;
    let game = resolve_game(app, ctx).await?;
    let record = game.snapshot().await?;

    if record.status == GameStatus::Finished {
        return Err(CommandError::InvalidInput(
            "This game has already finished".into(),
        ));
    }

    game.add_player(&actor).await?;
    debug!(actor = %actor, game = %record.name, "player joined");
    reply(app, ctx, &format!("Welcome to the game, @{actor}")).await;
    Ok(())
}

/// Cast or change a day vote. Resubmitting supersedes the previous vote; when
/// the target's weighted count reaches their threshold and house rules allow,
/// the handler performs the lynch itself.
pub async fn vote(app: &AppContext, ctx: &CommandContext) -> CommandResult<()> {
    let actor = resolve_actor(app, ctx).await?;
    let game = resolve_game(app, ctx).await?;
    let record = game.snapshot().await?;

    ensure_active(&record)?;
    ensure_phase(&record, Phase::Day)?;

    let voter = record
        .find_player(&actor)
        .ok_or(CommandError::NotPlayer)?;
    if !voter.alive {
        return Err(CommandError::NotAlive);
    }

    let target_arg = ctx
        .args
        .first()
        .map(|arg| strip_mention(arg))
        .filter(|arg| !arg.is_empty())
        .ok_or_else(|| CommandError::InvalidInput("Please name a target to vote for".into()))?;
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

    let actor = voter.username.clone();
    let target = target.username.clone();
    game.record_action(&actor, &target, ActionToken::Vote).await?;
    reply(app, ctx, &format!("@{actor} voted for @{target}")).await;

    check_auto_lynch(app, ctx, &game, &target).await
}

/// Kill the target once their tally crosses the line, when enabled.
async fn check_auto_lynch(
    app: &AppContext,
    ctx: &CommandContext,
    game: &crate::state::game::Game,
    target: &str,
) -> CommandResult<()> {
    if !app.config.auto_lynch {
        return Ok(());
    }

    let record = game.snapshot().await?;
    let Some(player) = record.find_player(target) else {
        return Ok(());
    };
    let threshold = ledger::threshold_for(&record, player);
    let tally = ledger::tally(&record, &ActionToken::Vote);
    let Some(entry) = tally
        .iter()
        .find(|entry| entry.target.eq_ignore_ascii_case(target))
    else {
        return Ok(());
    };

    if entry.votes < threshold {
        return Ok(());
    }

    game.kill_player(target).await?;
    render(
        app,
        ctx,
        "lynched",
        &Lynched {
            target: target.to_string(),
            votes: entry.votes,
            threshold,
            day: record.day,
        },
    )
    .await;
    Ok(())
}

/// Withdraw the current day vote. Recorded as a target-less action so history
/// shows the unvote.
pub async fn unvote(app: &AppContext, ctx: &CommandContext) -> CommandResult<()> {
    let actor = resolve_actor(app, ctx).await?;
    let game = resolve_game(app, ctx).await?;
    let record = game.snapshot().await?;

    ensure_active(&record)?;
    ensure_phase(&record, Phase::Day)?;

    let voter = record
        .find_player(&actor)
        .ok_or(CommandError::NotPlayer)?;
    if !voter.alive {
        return Err(CommandError::NotAlive);
    }

    let actor = voter.username.clone();
    game.revoke_action(&actor, ActionToken::Vote).await?;
    reply(app, ctx, &format!("@{actor} unvoted")).await;
    Ok(())
}

/// Submit a night action: `!target @player [as <lane>]`. Lanes default to the
/// generic target lane; scum kill lanes are named explicitly.
pub async fn night_target(app: &AppContext, ctx: &CommandContext) -> CommandResult<()> {
    let actor = resolve_actor(app, ctx).await?;
    let game = resolve_game(app, ctx).await?;
    let record = game.snapshot().await?;

    ensure_active(&record)?;
    ensure_phase(&record, Phase::Night)?;

    let player = record
        .find_player(&actor)
        .ok_or(CommandError::NotPlayer)?;
    if !player.alive {
        return Err(CommandError::NotAlive);
    }

    let target_arg = ctx
        .args
        .first()
        .map(|arg| strip_mention(arg))
        .filter(|arg| !arg.is_empty())
        .ok_or_else(|| CommandError::InvalidInput("Please name a target".into()))?;
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

    let token = match ctx.args.get(1).map(String::as_str) {
        Some("as") | Some("with") => ctx
            .args
            .get(2)
            .cloned()
            .map(ActionToken::from)
            .ok_or_else(|| CommandError::InvalidInput("Please name an ability".into()))?,
        _ => ActionToken::Target,
    };

    let actor = player.username.clone();
    let target = target.username.clone();
    game.record_action(&actor, &target, token).await?;
    reply(app, ctx, &format!("@{actor} has targeted @{target}")).await;
    Ok(())
}

/// List the living roster.
pub async fn list_players(app: &AppContext, ctx: &CommandContext) -> CommandResult<()> {
    let game = resolve_game(app, ctx).await?;
    let record = game.snapshot().await?;

    let summary = RosterSummary {
        game: record.name.clone(),
        players: record
            .living_players()
            .map(|player| RosterEntry {
                username: player.username.clone(),
                alive: true,
            })
            .collect(),
        moderators: record
            .moderators
            .iter()
            .map(|moderator| moderator.username.clone())
            .collect(),
    };
    render(app, ctx, "listPlayers", &summary).await;
    Ok(())
}

/// List every player, living and dead, with the moderator roster.
pub async fn list_all_players(app: &AppContext, ctx: &CommandContext) -> CommandResult<()> {
    let game = resolve_game(app, ctx).await?;
    let record = game.snapshot().await?;
    let summary = roster_summary(&record);
    render(app, ctx, "listAllPlayers", &summary).await;
    Ok(())
}

pub(crate) fn roster_summary(record: &crate::dao::models::GameRecord) -> RosterSummary {
    RosterSummary {
        game: record.name.clone(),
        players: record
            .players
            .iter()
            .map(|player| RosterEntry {
                username: player.username.clone(),
                alive: player.alive,
            })
            .collect(),
        moderators: record
            .moderators
            .iter()
            .map(|moderator| moderator.username.clone())
            .collect(),
    }
}

/// Show the current day's vote tally with per-target thresholds and the
/// players yet to vote.
pub async fn list_votes(app: &AppContext, ctx: &CommandContext) -> CommandResult<()> {
    let game = resolve_game(app, ctx).await?;
    let record = game.snapshot().await?;
    ensure_active(&record)?;

    let votes: Vec<VoteCount> = ledger::tally(&record, &ActionToken::Vote)
        .into_iter()
        .map(|entry| {
            let threshold = record
                .find_player(&entry.target)
                .map(|player| ledger::threshold_for(&record, player))
                .unwrap_or_else(|| ledger::lynch_threshold(&record));
            VoteCount {
                target: entry.target,
                votes: entry.votes,
                threshold,
                voters: entry.voters,
            }
        })
        .collect();

    let not_voting = record
        .living_players()
        .filter(|player| {
            !ledger::current_actions(&record, Some(&ActionToken::Vote))
                .iter()
                .any(|action| {
                    action.target.is_some()
                        && action.actor.eq_ignore_ascii_case(&player.username)
                        && action.phase == record.phase
                })
        })
        .map(|player| player.username.clone())
        .collect();

    render(
        app,
        ctx,
        "listVotes",
        &VoteSummary {
            day: record.day,
            votes,
            not_voting,
        },
    )
    .await;
    Ok(())
}
