//! Business logic powering the administrative control channel. The FSM
//! treats unrecognized events as silent no-ops; this layer validates
//! payloads first and turns a rejected command into an error the admin can
//! see.

use tracing::info;

use crate::{
    dto::board::{GameSnapshot, PlayerSummary, QuestionEvent},
    error::ServiceError,
    state::{
        SharedState,
        game::{ActiveQuestion, PlayerSlot},
        state_machine::{AdminEvent, DispatchOutcome, GameEvent, Verdict},
    },
};

/// Open a new game over the installed question bank.
pub async fn start_game(state: &SharedState) -> Result<GameSnapshot, ServiceError> {
    let bank = state.require_bank()?;
    let board_size = bank.remaining();
    if board_size == 0 {
        return Err(ServiceError::InvalidInput(
            "cannot start a game with an empty board".into(),
        ));
    }

    dispatch_admin(state, AdminEvent::StartGame { board_size }).await?;
    info!(board_size, "game opened");
    Ok(snapshot(state).await)
}

/// Register the player for `slot`. Names must be non-empty and unique;
/// slots must be filled in order.
pub async fn register_player(
    state: &SharedState,
    slot: PlayerSlot,
    name: String,
) -> Result<PlayerSummary, ServiceError> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput(
            "player name must not be empty".into(),
        ));
    }

    let duplicate = state
        .read_record(|record| record.players.iter().any(|player| player.name == name))
        .await;
    if duplicate {
        return Err(ServiceError::InvalidInput(format!(
            "duplicate player name `{name}`"
        )));
    }

    dispatch_admin(
        state,
        AdminEvent::RegisterPlayer {
            slot,
            name: name.clone(),
        },
    )
    .await?;
    info!(%slot, name, "player registered");

    Ok(PlayerSummary {
        slot: slot.number(),
        name,
        score: 0,
    })
}

/// Put the question with board key `id` in play on behalf of the picking
/// player.
pub async fn choose_question(
    state: &SharedState,
    id: u32,
) -> Result<QuestionEvent, ServiceError> {
    let bank = state.require_bank()?;
    let Some(question) = bank.question(id) else {
        return Err(ServiceError::NotFound(format!("question `{id}` not found")));
    };
    if bank.is_resolved(id) {
        return Err(ServiceError::InvalidInput(format!(
            "question `{id}` was already played"
        )));
    }

    let active = ActiveQuestion { id, question };
    let event = QuestionEvent::from(&active);
    dispatch_admin(state, AdminEvent::ChooseQuestion { question: active }).await?;
    info!(id, "question in play");
    Ok(event)
}

/// Judge the answer currently on the floor.
pub async fn judge_answer(
    state: &SharedState,
    verdict: Verdict,
) -> Result<GameSnapshot, ServiceError> {
    dispatch_admin(state, AdminEvent::Judge(verdict)).await?;
    info!(?verdict, "answer judged");
    Ok(snapshot(state).await)
}

/// Return a finished game to idle and restore the board for a rematch.
pub async fn reset_game(state: &SharedState) -> Result<(), ServiceError> {
    dispatch_admin(state, AdminEvent::Reset).await?;
    if let Some(bank) = state.bank() {
        bank.reset();
    }
    info!("game reset to idle");
    Ok(())
}

/// Read-only projection of the whole game for the admin UI.
pub async fn snapshot(state: &SharedState) -> GameSnapshot {
    state.read_record(|record| GameSnapshot::from(record)).await
}

async fn dispatch_admin(
    state: &SharedState,
    event: AdminEvent,
) -> Result<DispatchOutcome, ServiceError> {
    let description = describe(&event);
    let outcome = state.dispatch_event(GameEvent::Admin(event)).await;
    if outcome.accepted {
        Ok(outcome)
    } else {
        Err(ServiceError::InvalidState(format!(
            "{description} is not valid in phase {:?}",
            outcome.phase
        )))
    }
}

fn describe(event: &AdminEvent) -> &'static str {
    match event {
        AdminEvent::StartGame { .. } => "start-game",
        AdminEvent::RegisterPlayer { .. } => "register-player",
        AdminEvent::ChooseQuestion { .. } => "choose-question",
        AdminEvent::Judge(Verdict::Correct) => "judge-correct",
        AdminEvent::Judge(Verdict::Incorrect) => "judge-incorrect",
        AdminEvent::Reset => "reset",
    }
}
