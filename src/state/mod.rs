pub mod arbitration;
pub mod board;
pub mod game;
pub mod state_machine;

use std::sync::{Arc, Mutex as StdMutex, RwLock as StdRwLock};

use tokio::sync::{Mutex, mpsc};
use tokio::task::AbortHandle;
use tracing::warn;

use crate::{
    bank::QuestionBank,
    config::AppConfig,
    error::ServiceError,
    services::{board_events, timer_service},
    state::{
        arbitration::BuzzerArbiter,
        board::BoardHub,
        game::{GameRecord, PlayerSlot, TimerToken},
        state_machine::{DispatchOutcome, Effect, GameEvent, Phase},
    },
};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

const BOARD_CHANNEL_CAPACITY: usize = 16;

/// Raw signal pushed onto the merged event queue by buzzer adapters and
/// timer tasks. Buzz signals are pre-arbitration; the event loop decides
/// which one becomes a [`GameEvent::Buzz`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuedSignal {
    /// A buzzer was pressed.
    Buzz(PlayerSlot),
    /// The timer armed with this token elapsed.
    Timeout(TimerToken),
}

/// Handle a buzzer adapter uses to push presses. Sending never blocks; the
/// queue is unbounded and losing signals to arbitration is expected.
#[derive(Clone)]
pub struct BuzzerHandle {
    slot: PlayerSlot,
    tx: mpsc::UnboundedSender<QueuedSignal>,
}

impl BuzzerHandle {
    /// Which buzzer this handle feeds.
    pub fn slot(&self) -> PlayerSlot {
        self.slot
    }

    /// Report a press. Dropped silently once the engine shuts down.
    pub fn press(&self) {
        let _ = self.tx.send(QueuedSignal::Buzz(self.slot));
    }
}

/// Central application state: the game record behind its dispatch lock, the
/// broadcast hub, buzzer arbitration, timer bookkeeping, and the installed
/// question bank.
pub struct AppState {
    config: Arc<AppConfig>,
    record: Mutex<GameRecord>,
    board: BoardHub,
    arbiter: BuzzerArbiter,
    bank: StdRwLock<Option<Arc<dyn QuestionBank>>>,
    timer: StdMutex<Option<AbortHandle>>,
    signals_tx: mpsc::UnboundedSender<QueuedSignal>,
    signals_rx: StdMutex<Option<mpsc::UnboundedReceiver<QueuedSignal>>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be
    /// cloned cheaply.
    pub fn new(config: AppConfig) -> SharedState {
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            record: Mutex::new(GameRecord::new(config.turn_policy)),
            config: Arc::new(config),
            board: BoardHub::new(BOARD_CHANNEL_CAPACITY),
            arbiter: BuzzerArbiter::new(),
            bank: StdRwLock::new(None),
            timer: StdMutex::new(None),
            signals_tx,
            signals_rx: StdMutex::new(Some(signals_rx)),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// Install the question bank the next game will be played over.
    pub fn install_bank(&self, bank: Arc<dyn QuestionBank>) {
        let mut guard = self.bank.write().expect("bank slot poisoned");
        *guard = Some(bank);
    }

    /// Obtain a handle to the installed question bank, if any.
    pub fn bank(&self) -> Option<Arc<dyn QuestionBank>> {
        self.bank.read().expect("bank slot poisoned").clone()
    }

    /// Question bank or the error admin callers expect.
    pub fn require_bank(&self) -> Result<Arc<dyn QuestionBank>, ServiceError> {
        self.bank().ok_or(ServiceError::BankUnavailable)
    }

    /// Broadcast hub for board-state notifications.
    pub fn board(&self) -> &BoardHub {
        &self.board
    }

    /// The first-buzz arbitration slot.
    pub fn arbiter(&self) -> &BuzzerArbiter {
        &self.arbiter
    }

    /// Handle feeding one buzzer's presses into the merged queue.
    pub fn buzzer(&self, slot: PlayerSlot) -> BuzzerHandle {
        BuzzerHandle {
            slot,
            tx: self.signals_tx.clone(),
        }
    }

    /// Handles for all three buzzers, in slot order.
    pub fn buzzers(&self) -> [BuzzerHandle; 3] {
        PlayerSlot::ALL.map(|slot| self.buzzer(slot))
    }

    /// Sender used by timer tasks to report expiries.
    pub(crate) fn signal_sender(&self) -> mpsc::UnboundedSender<QueuedSignal> {
        self.signals_tx.clone()
    }

    /// Take the merged-queue receiver. The event loop claims it exactly
    /// once; later calls return `None`.
    pub(crate) fn take_signal_receiver(&self) -> Option<mpsc::UnboundedReceiver<QueuedSignal>> {
        self.signals_rx.lock().expect("signal slot poisoned").take()
    }

    /// Replace the outstanding timer task, aborting the previous one.
    pub(crate) fn store_timer(&self, handle: AbortHandle) {
        let mut slot = self.timer.lock().expect("timer slot poisoned");
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Abort the outstanding timer task, if any.
    pub(crate) fn clear_timer(&self) {
        let mut slot = self.timer.lock().expect("timer slot poisoned");
        if let Some(previous) = slot.take() {
            previous.abort();
        }
    }

    /// Settled phase of the game.
    pub async fn phase(&self) -> Phase {
        self.record.lock().await.phase
    }

    /// Run a closure against the current record.
    pub async fn read_record<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&GameRecord) -> T,
    {
        let record = self.record.lock().await;
        f(&record)
    }

    /// Feed one event through the engine.
    ///
    /// This is the single serialization point: the record lock is held for
    /// the whole dispatch, transient cascade and effect execution included,
    /// so no other event can interleave. A phase-changed notification goes
    /// out for every accepted event.
    pub async fn dispatch_event(&self, event: GameEvent) -> DispatchOutcome {
        let mut record = self.record.lock().await;
        let outcome = state_machine::dispatch(&mut record, event);
        if outcome.accepted {
            self.apply_effects(&record, &outcome.effects);
            board_events::broadcast_phase_changed(self, outcome.phase);
        }
        outcome
    }

    /// Execute the side effects requested by the entry actions of one
    /// dispatch, in order.
    fn apply_effects(&self, record: &GameRecord, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::BroadcastEmptyBoard => board_events::broadcast_board_opened(self, record),
                Effect::BroadcastBoard => board_events::broadcast_board(self, record),
                Effect::BroadcastPlayerPicked(slot) => {
                    board_events::broadcast_player_picked(self, record, *slot);
                }
                Effect::BroadcastQuestion(active) => {
                    board_events::broadcast_question(self, active);
                }
                Effect::BroadcastScore { slot, score } => {
                    board_events::broadcast_score(self, record, *slot, *score);
                }
                Effect::BroadcastWinners(slots) => {
                    board_events::broadcast_winners(self, record, slots);
                }
                Effect::ArmBuzzTimer(token) => {
                    timer_service::arm(self, *token, self.config.buzz_timeout);
                }
                Effect::ArmAnswerTimer(token) => {
                    timer_service::arm(self, *token, self.config.answer_timeout);
                }
                Effect::CancelTimers => timer_service::cancel(self),
                Effect::ArmArbitration => self.arbiter.arm(),
                Effect::CloseArbitration => self.arbiter.close(),
                Effect::QuestionResolved(id) => match self.bank() {
                    Some(bank) => {
                        if !bank.mark_resolved(*id) {
                            warn!(id, "resolved question is unknown to the bank");
                        }
                    }
                    None => warn!(id, "no bank installed to record the resolved question"),
                },
            }
        }
    }
}
