use serde::Serialize;

use crate::state::{
    game::{ActiveQuestion, GameRecord, Player, PlayerSlot},
    state_machine::Phase,
};

/// Game phase as exposed to subscribers. Transient engine phases are never
/// settled on, but the projection stays total.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    /// No active game.
    Idle,
    /// Game opened, waiting for registrations.
    NewGame,
    /// Players registering.
    RegisteringPlayers,
    /// Board being announced.
    StartingGame,
    /// Waiting for the picker's question choice.
    PickingPlayer,
    /// Question on the floor, buzzers armed.
    QuestionChosen,
    /// A player buzzed in and is answering.
    AnswerExpected,
    /// Score being adjusted.
    AdjustingScore,
    /// Checking whether every player attempted.
    CheckingLastPlayer,
    /// Checking whether the board is exhausted.
    CheckingGameOver,
    /// Final standings shown.
    GameOver,
}

impl From<Phase> for VisiblePhase {
    fn from(value: Phase) -> Self {
        match value {
            Phase::Idle => VisiblePhase::Idle,
            Phase::NewGame => VisiblePhase::NewGame,
            Phase::RegisteringPlayers => VisiblePhase::RegisteringPlayers,
            Phase::StartingGame => VisiblePhase::StartingGame,
            Phase::PickingPlayer => VisiblePhase::PickingPlayer,
            Phase::QuestionChosen => VisiblePhase::QuestionChosen,
            Phase::AnswerExpected => VisiblePhase::AnswerExpected,
            Phase::AdjustingScore => VisiblePhase::AdjustingScore,
            Phase::CheckingLastPlayer => VisiblePhase::CheckingLastPlayer,
            Phase::CheckingGameOver => VisiblePhase::CheckingGameOver,
            Phase::GameOver => VisiblePhase::GameOver,
        }
    }
}

/// One player's standing as carried in broadcasts.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct PlayerSummary {
    /// One-based player number.
    pub slot: u8,
    /// Display name.
    pub name: String,
    /// Current score.
    pub score: i64,
}

impl From<(PlayerSlot, &Player)> for PlayerSummary {
    fn from((slot, player): (PlayerSlot, &Player)) -> Self {
        Self {
            slot: slot.number(),
            name: player.name.clone(),
            score: player.score,
        }
    }
}

/// One board cell in a snapshot. Question text stays hidden until chosen.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct BoardEntry {
    /// Board key of the question.
    pub id: u32,
    /// Point value shown on the board.
    pub value: i64,
    /// Whether the question has already been played.
    pub resolved: bool,
}

/// Full board state pushed on game start and after every resolution.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    /// Unresolved questions left.
    pub remaining: usize,
    /// All board cells in display order.
    pub entries: Vec<BoardEntry>,
    /// Registered players and their scores.
    pub players: Vec<PlayerSummary>,
}

/// Broadcast when the engine selects the next picking player.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct PlayerPickedEvent {
    /// One-based number of the picking player.
    pub slot: u8,
    /// Display name of the picking player.
    pub name: String,
}

/// Broadcast when a question is revealed. Never includes the answer.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct QuestionEvent {
    /// Board key of the question.
    pub id: u32,
    /// Prompt to read out.
    pub text: String,
    /// Point value at stake.
    pub value: i64,
}

impl From<&ActiveQuestion> for QuestionEvent {
    fn from(value: &ActiveQuestion) -> Self {
        Self {
            id: value.id,
            text: value.question.text.clone(),
            value: value.question.value,
        }
    }
}

/// Broadcast when a judgement changes a score.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ScoreUpdateEvent {
    /// One-based number of the player whose score changed.
    pub slot: u8,
    /// Display name of the player.
    pub name: String,
    /// Score after the change.
    pub score: i64,
}

/// Broadcast once at game end; lists every player tied for the top score.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct WinnersEvent {
    /// Winning players in slot order.
    pub winners: Vec<PlayerSummary>,
}

/// Broadcast whenever the settled phase changes.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChangedEvent {
    /// The phase the game settled in.
    pub phase: VisiblePhase,
}

/// Read-only projection of the whole game for the admin channel. Unlike the
/// broadcast payloads this one includes the expected answer.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    /// Settled phase.
    pub phase: VisiblePhase,
    /// Registered players.
    pub players: Vec<PlayerSummary>,
    /// One-based number of the current player, if any.
    pub current_player: Option<u8>,
    /// The question in play, if any.
    pub question: Option<QuestionEvent>,
    /// Expected answer of the question in play, admin eyes only.
    pub answer: Option<String>,
    /// Unresolved questions left on the board.
    pub remaining: usize,
}

impl From<&GameRecord> for GameSnapshot {
    fn from(record: &GameRecord) -> Self {
        Self {
            phase: record.phase.into(),
            players: PlayerSlot::ALL
                .into_iter()
                .filter_map(|slot| record.player(slot).map(|player| (slot, player).into()))
                .collect(),
            current_player: record.current_player.map(PlayerSlot::number),
            question: record.current_question.as_ref().map(Into::into),
            answer: record
                .current_question
                .as_ref()
                .map(|active| active.question.answer.clone()),
            remaining: record.questions_remaining,
        }
    }
}
