use serde::Deserialize;
use uuid::Uuid;

use crate::state::state_machine::Phase;

/// Identity of one of the three player positions. Doubles as the buzzer
/// identity: buzzer N belongs to player N.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerSlot {
    /// First player / buzzer.
    One,
    /// Second player / buzzer.
    Two,
    /// Third player / buzzer.
    Three,
}

impl PlayerSlot {
    /// All slots in registration order.
    pub const ALL: [PlayerSlot; 3] = [PlayerSlot::One, PlayerSlot::Two, PlayerSlot::Three];

    /// Zero-based index of the slot into the player roster.
    pub fn index(self) -> usize {
        match self {
            PlayerSlot::One => 0,
            PlayerSlot::Two => 1,
            PlayerSlot::Three => 2,
        }
    }

    /// Slot for a zero-based roster index, if in range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// One-based number shown to humans (console, broadcasts).
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }
}

impl std::fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player {}", self.number())
    }
}

/// Player info tracked during a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Display name registered through the admin channel.
    pub name: String,
    /// Current score. Signed; wrong answers can push it negative.
    pub score: i64,
}

impl Player {
    /// A freshly registered player with a zero score.
    pub fn new(name: String) -> Self {
        Self { name, score: 0 }
    }
}

/// A single board question. Owned by the question bank; the engine only ever
/// holds the copy embedded in [`ActiveQuestion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Prompt read to the players.
    pub text: String,
    /// Expected answer, visible to the admin only.
    pub answer: String,
    /// Points awarded or deducted when the question is judged.
    pub value: i64,
}

/// The question currently in play, paired with its board identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveQuestion {
    /// Board key of the question, used to mark it resolved in the bank.
    pub id: u32,
    /// The question data itself.
    pub question: Question,
}

/// Set of players that already attempted (and failed) the current question.
///
/// Backed by a three-bit mask; cleared whenever a fresh question is about to
/// be picked, preserved across the same-question re-offer loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttemptSet(u8);

impl AttemptSet {
    /// Record an attempt. Re-inserting an existing member is a no-op.
    pub fn insert(&mut self, slot: PlayerSlot) {
        self.0 |= 1 << slot.index();
    }

    /// Whether the slot already attempted the current question.
    pub fn contains(&self, slot: PlayerSlot) -> bool {
        self.0 & (1 << slot.index()) != 0
    }

    /// Number of players that attempted so far.
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// True when nobody attempted yet.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Forget all attempts.
    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

/// How the engine decides who picks the next question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPolicy {
    /// Rotate through the three slots, one pick each.
    #[default]
    RoundRobin,
    /// The player who last answered correctly picks; rotation until someone
    /// has.
    CorrectPicksNext,
}

/// Token identifying a single timer arming. A timeout event only matches the
/// arming that minted it, so timeouts that outlive their phase are ignored.
pub type TimerToken = Uuid;

/// The single mutable aggregate the transition engine owns: players, scores,
/// the question in play, attempt tracking, and progression bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    /// Current phase of the game.
    pub phase: Phase,
    /// Registered players in slot order; between zero and three entries.
    pub players: Vec<Player>,
    /// Whose turn it is. Set by PickingPlayer, replaced by the winning
    /// buzzer once a question is in play.
    pub current_player: Option<PlayerSlot>,
    /// The question in play, if any.
    pub current_question: Option<ActiveQuestion>,
    /// Players that already failed the current question.
    pub attempted: AttemptSet,
    /// Unresolved questions left on the board. Only ever decremented, and
    /// only by the engine.
    pub questions_remaining: usize,
    /// Token of the outstanding buzz-in or answer timer, if one is armed.
    pub armed_timer: Option<TimerToken>,
    /// Last player to answer correctly; input to [`TurnPolicy`].
    pub last_correct: Option<PlayerSlot>,
    /// Rotation cursor for round-robin picking.
    pub rotation: usize,
    /// Configured turn policy.
    pub turn_policy: TurnPolicy,
}

impl GameRecord {
    /// A fresh record in the idle phase.
    pub fn new(turn_policy: TurnPolicy) -> Self {
        Self {
            phase: Phase::Idle,
            players: Vec::new(),
            current_player: None,
            current_question: None,
            attempted: AttemptSet::default(),
            questions_remaining: 0,
            armed_timer: None,
            last_correct: None,
            rotation: 0,
            turn_policy,
        }
    }

    /// Wipe all game progress, keeping the configured policy. Used by the
    /// reset path back to idle.
    pub fn reset(&mut self) {
        *self = Self::new(self.turn_policy);
    }

    /// Player occupying a slot, if registered.
    pub fn player(&self, slot: PlayerSlot) -> Option<&Player> {
        self.players.get(slot.index())
    }

    /// Mutable access to the player occupying a slot.
    pub fn player_mut(&mut self, slot: PlayerSlot) -> Option<&mut Player> {
        self.players.get_mut(slot.index())
    }

    /// Pick the next question chooser according to the configured policy.
    ///
    /// Round-robin advances the rotation cursor; correct-picks-next hands
    /// the pick to the last correct answerer and falls back to the rotation
    /// while nobody has answered correctly yet.
    pub fn select_picker(&mut self) -> PlayerSlot {
        match self.turn_policy {
            TurnPolicy::RoundRobin => self.advance_rotation(),
            TurnPolicy::CorrectPicksNext => match self.last_correct {
                Some(slot) => slot,
                None => self.advance_rotation(),
            },
        }
    }

    fn advance_rotation(&mut self) -> PlayerSlot {
        let slot = PlayerSlot::from_index(self.rotation % PlayerSlot::ALL.len())
            .unwrap_or(PlayerSlot::One);
        self.rotation += 1;
        slot
    }

    /// Whether `token` matches the currently armed timer.
    pub fn timer_is_current(&self, token: TimerToken) -> bool {
        self.armed_timer == Some(token)
    }

    /// Slots holding the maximum score, in slot order. Empty before any
    /// player is registered.
    pub fn leaders(&self) -> Vec<PlayerSlot> {
        let Some(top) = self.players.iter().map(|p| p.score).max() else {
            return Vec::new();
        };
        PlayerSlot::ALL
            .into_iter()
            .filter(|slot| self.player(*slot).is_some_and(|p| p.score == top))
            .collect()
    }
}
