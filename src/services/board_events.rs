use serde::Serialize;
use tracing::warn;

use crate::{
    dto::board::{
        BoardSnapshot, PhaseChangedEvent, PlayerPickedEvent, PlayerSummary, QuestionEvent,
        ScoreUpdateEvent, WinnersEvent,
    },
    state::{
        AppState,
        board::BoardEvent,
        game::{ActiveQuestion, GameRecord, PlayerSlot},
        state_machine::Phase,
    },
};

const EVENT_BOARD_OPENED: &str = "board.opened";
const EVENT_BOARD_SNAPSHOT: &str = "board.snapshot";
const EVENT_PLAYER_PICKED: &str = "player.picked";
const EVENT_QUESTION_REVEALED: &str = "question.revealed";
const EVENT_SCORE_UPDATED: &str = "score.updated";
const EVENT_WINNERS: &str = "game.winners";
const EVENT_PHASE_CHANGED: &str = "phase_changed";

/// Broadcast the bare board of a freshly opened game, before any player has
/// registered.
pub fn broadcast_board_opened(state: &AppState, record: &GameRecord) {
    let payload = board_snapshot(state, record);
    send_event(state, EVENT_BOARD_OPENED, &payload);
}

/// Broadcast the full board: roster, scores, and remaining questions.
pub fn broadcast_board(state: &AppState, record: &GameRecord) {
    let payload = board_snapshot(state, record);
    send_event(state, EVENT_BOARD_SNAPSHOT, &payload);
}

/// Announce whose turn it is to pick the next question.
pub fn broadcast_player_picked(state: &AppState, record: &GameRecord, slot: PlayerSlot) {
    let Some(player) = record.player(slot) else {
        warn!(%slot, "picked player is not registered");
        return;
    };
    let payload = PlayerPickedEvent {
        slot: slot.number(),
        name: player.name.clone(),
    };
    send_event(state, EVENT_PLAYER_PICKED, &payload);
}

/// Reveal a chosen question. The answer never leaves the admin channel.
pub fn broadcast_question(state: &AppState, active: &ActiveQuestion) {
    let payload = QuestionEvent::from(active);
    send_event(state, EVENT_QUESTION_REVEALED, &payload);
}

/// Announce a judged score change.
pub fn broadcast_score(state: &AppState, record: &GameRecord, slot: PlayerSlot, score: i64) {
    let Some(player) = record.player(slot) else {
        warn!(%slot, "scored player is not registered");
        return;
    };
    let payload = ScoreUpdateEvent {
        slot: slot.number(),
        name: player.name.clone(),
        score,
    };
    send_event(state, EVENT_SCORE_UPDATED, &payload);
}

/// Announce the winner set at game end.
pub fn broadcast_winners(state: &AppState, record: &GameRecord, slots: &[PlayerSlot]) {
    let payload = WinnersEvent {
        winners: slots
            .iter()
            .filter_map(|slot| record.player(*slot).map(|player| (*slot, player).into()))
            .collect(),
    };
    send_event(state, EVENT_WINNERS, &payload);
}

/// Notify subscribers that the game settled in a new phase.
pub fn broadcast_phase_changed(state: &AppState, phase: Phase) {
    let payload = PhaseChangedEvent {
        phase: phase.into(),
    };
    send_event(state, EVENT_PHASE_CHANGED, &payload);
}

fn board_snapshot(state: &AppState, record: &GameRecord) -> BoardSnapshot {
    let entries = state.bank().map(|bank| bank.board()).unwrap_or_default();
    let players: Vec<PlayerSummary> = PlayerSlot::ALL
        .into_iter()
        .filter_map(|slot| record.player(slot).map(|player| (slot, player).into()))
        .collect();
    BoardSnapshot {
        remaining: record.questions_remaining,
        entries,
        players,
    }
}

fn send_event(state: &AppState, event: &str, payload: &impl Serialize) {
    match BoardEvent::json(event, payload) {
        Ok(event) => state.board().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize board payload"),
    }
}
