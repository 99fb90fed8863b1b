//! The append-only action ledger and its vote arithmetic.
//!
//! Actions are never deleted. Submitting a new action in the same
//! (day, phase, actor, token) scope marks the previous one non-current, which
//! is how both "change vote" and "unvote" work while the full history stays
//! available for end-of-day reporting.

use crate::dao::models::{ActionRecord, ActionToken, GameRecord, PlayerProperty, PlayerRecord};

/// One row of a vote tally: a target and the weighted votes against them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyEntry {
    /// Target username as stored.
    pub target: String,
    /// Weighted count of current votes.
    pub votes: u32,
    /// Actors behind those votes, in submission order.
    pub voters: Vec<String>,
}

/// Record a targeted action, superseding any current action by the same actor
/// in the same token lane for the current day and phase.
pub fn add_action_with_target(
    record: &mut GameRecord,
    actor: &str,
    target: &str,
    token: ActionToken,
) {
    supersede(record, actor, &token);
    let action = ActionRecord {
        actor: actor.to_string(),
        target: Some(target.to_string()),
        token,
        day: record.day,
        phase: record.phase,
        is_current: true,
    };
    record.actions.push(action);
}

/// Record a revocation: a target-less action that supersedes the actor's
/// current action in the lane and tallies as zero.
pub fn revoke_action(record: &mut GameRecord, actor: &str, token: ActionToken) {
    supersede(record, actor, &token);
    let action = ActionRecord {
        actor: actor.to_string(),
        target: None,
        token,
        day: record.day,
        phase: record.phase,
        is_current: true,
    };
    record.actions.push(action);
}

fn supersede(record: &mut GameRecord, actor: &str, token: &ActionToken) {
    let day = record.day;
    let phase = record.phase;
    for action in record.actions.iter_mut() {
        if action.day == day
            && action.phase == phase
            && action.token == *token
            && action.actor.eq_ignore_ascii_case(actor)
        {
            action.is_current = false;
        }
    }
}

/// Current actions in the lane for the current day and phase. Pass `None` to
/// see every lane.
pub fn current_actions<'a>(
    record: &'a GameRecord,
    token: Option<&ActionToken>,
) -> Vec<&'a ActionRecord> {
    record
        .actions
        .iter()
        .filter(|action| action.is_current && action.day == record.day)
        .filter(|action| token.is_none_or(|token| action.token == *token))
        .collect()
}

/// Weighted tally of current targeted actions in one lane, descending by
/// count; ties break toward the target voted earliest.
pub fn tally(record: &GameRecord, token: &ActionToken) -> Vec<TallyEntry> {
    let mut entries: Vec<(usize, TallyEntry)> = Vec::new();

    for (position, action) in record.actions.iter().enumerate() {
        if !action.is_current
            || action.day != record.day
            || action.phase != record.phase
            || action.token != *token
        {
            continue;
        }
        let Some(target) = &action.target else {
            continue;
        };

        let weight = record
            .find_player(&action.actor)
            .map_or(1, vote_weight);

        match entries
            .iter_mut()
            .find(|(_, entry)| entry.target.eq_ignore_ascii_case(target))
        {
            Some((_, entry)) => {
                entry.votes += weight;
                entry.voters.push(action.actor.clone());
            }
            None => entries.push((
                position,
                TallyEntry {
                    target: target.clone(),
                    votes: weight,
                    voters: vec![action.actor.clone()],
                },
            )),
        }
    }

    entries.sort_by(|(first_a, a), (first_b, b)| {
        b.votes.cmp(&a.votes).then(first_a.cmp(first_b))
    });
    entries.into_iter().map(|(_, entry)| entry).collect()
}

/// Votes needed to lynch, recomputed fresh from the living roster: half the
/// living player count, rounded up.
pub fn lynch_threshold(record: &GameRecord) -> u32 {
    let living = record.living_players().count() as u32;
    living.div_ceil(2)
}

/// Votes needed to lynch this particular target: the base threshold shifted by
/// `loved` (+1) and `hated` (−1), never below 1.
pub fn threshold_for(record: &GameRecord, target: &PlayerRecord) -> u32 {
    let mut threshold = lynch_threshold(record);
    if target.has_property(&PlayerProperty::Loved) {
        threshold += 1;
    }
    if target.has_property(&PlayerProperty::Hated) {
        threshold = threshold.saturating_sub(1);
    }
    threshold.max(1)
}

/// How much one player's vote counts.
pub fn vote_weight(player: &PlayerRecord) -> u32 {
    if player.has_property(&PlayerProperty::Doublevoter) {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{GameStatus, Phase};

    fn running_game(players: &[&str]) -> GameRecord {
        let mut record = GameRecord::new(1, "testMafia");
        record.status = GameStatus::Running;
        record.day = 1;
        record.phase = Phase::Day;
        for player in players {
            record.players.push(PlayerRecord::new(*player));
        }
        record
    }

    #[test]
    fn resubmitting_supersedes_the_previous_action() {
        let mut record = running_game(&["alice", "bob", "carol"]);

        add_action_with_target(&mut record, "alice", "bob", ActionToken::Vote);
        add_action_with_target(&mut record, "alice", "carol", ActionToken::Vote);

        let current: Vec<_> = current_actions(&record, Some(&ActionToken::Vote));
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].target.as_deref(), Some("carol"));

        // Full history remains for reporting.
        assert_eq!(record.actions.len(), 2);
        assert!(!record.actions[0].is_current);
    }

    #[test]
    fn revoking_tallies_as_zero() {
        let mut record = running_game(&["alice", "bob", "carol"]);

        add_action_with_target(&mut record, "alice", "carol", ActionToken::Vote);
        revoke_action(&mut record, "alice", ActionToken::Vote);

        assert!(tally(&record, &ActionToken::Vote).is_empty());
        assert_eq!(record.actions.len(), 2);
    }

    #[test]
    fn tally_orders_by_count_then_earliest_vote() {
        let mut record = running_game(&["alice", "bob", "carol", "dave", "eve"]);

        add_action_with_target(&mut record, "alice", "bob", ActionToken::Vote);
        add_action_with_target(&mut record, "carol", "dave", ActionToken::Vote);
        add_action_with_target(&mut record, "eve", "dave", ActionToken::Vote);

        let tally = tally(&record, &ActionToken::Vote);
        assert_eq!(tally[0].target, "dave");
        assert_eq!(tally[0].votes, 2);
        assert_eq!(tally[0].voters, vec!["carol", "eve"]);
        assert_eq!(tally[1].target, "bob");
    }

    #[test]
    fn tally_ignores_other_lanes_and_stale_days() {
        let mut record = running_game(&["alice", "bob"]);

        add_action_with_target(&mut record, "alice", "bob", ActionToken::Vote);
        record.day = 2;
        add_action_with_target(&mut record, "alice", "bob", ActionToken::Scum);

        assert!(tally(&record, &ActionToken::Vote).is_empty());
        assert_eq!(tally(&record, &ActionToken::Scum).len(), 1);
    }

    #[test]
    fn doublevoter_counts_twice() {
        let mut record = running_game(&["alice", "bob", "carol"]);
        record
            .find_player_mut("alice")
            .unwrap()
            .properties
            .push(PlayerProperty::Doublevoter);

        add_action_with_target(&mut record, "alice", "bob", ActionToken::Vote);

        let tally = tally(&record, &ActionToken::Vote);
        assert_eq!(tally[0].votes, 2);
        assert_eq!(tally[0].voters, vec!["alice"]);
    }

    #[test]
    fn threshold_is_half_the_living_roster_rounded_up() {
        let mut record = running_game(&["alice", "bob", "carol"]);
        assert_eq!(lynch_threshold(&record), 2);

        record.find_player_mut("carol").unwrap().alive = false;
        assert_eq!(lynch_threshold(&record), 1);

        record.players.push(PlayerRecord::new("dave"));
        record.players.push(PlayerRecord::new("eve"));
        assert_eq!(lynch_threshold(&record), 2);
    }

    #[test]
    fn loved_and_hated_shift_the_target_threshold() {
        let mut record = running_game(&["alice", "bob", "carol"]);
        record
            .find_player_mut("alice")
            .unwrap()
            .properties
            .push(PlayerProperty::Loved);
        record
            .find_player_mut("bob")
            .unwrap()
            .properties
            .push(PlayerProperty::Hated);

        let alice = record.find_player("alice").unwrap();
        let bob = record.find_player("bob").unwrap();
        let carol = record.find_player("carol").unwrap();
        assert_eq!(threshold_for(&record, alice), 3);
        assert_eq!(threshold_for(&record, bob), 1);
        assert_eq!(threshold_for(&record, carol), 2);
    }

    #[test]
    fn supersede_matches_actors_case_insensitively() {
        let mut record = running_game(&["Alice", "bob", "carol"]);

        add_action_with_target(&mut record, "Alice", "bob", ActionToken::Vote);
        add_action_with_target(&mut record, "alice", "carol", ActionToken::Vote);

        let tally = tally(&record, &ActionToken::Vote);
        assert_eq!(tally.len(), 1);
        assert_eq!(tally[0].target, "carol");
    }
}
