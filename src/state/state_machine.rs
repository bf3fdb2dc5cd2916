use uuid::Uuid;

use crate::state::game::{ActiveQuestion, GameRecord, Player, PlayerSlot, TimerToken};

/// Upper bound on synthetic re-dispatches per external event. The longest
/// legal chain is three transitions; hitting the bound stalls the game in
/// place instead of spinning.
const MAX_CASCADE_DEPTH: usize = 8;

/// Admin judgement of the answer currently on the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Award the question value to the answering player.
    Correct,
    /// Deduct the question value and record the failed attempt.
    Incorrect,
}

/// Events originating from the administrative control channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminEvent {
    /// Open a new game. Carries the board size the admin service resolved
    /// from the installed question bank.
    StartGame {
        /// Number of unresolved questions on the board.
        board_size: usize,
    },
    /// Register the player occupying `slot`. Must arrive in slot order.
    RegisterPlayer {
        /// Position being filled.
        slot: PlayerSlot,
        /// Display name supplied by the admin.
        name: String,
    },
    /// The picking player chose a question from the board.
    ChooseQuestion {
        /// The resolved question, fetched from the bank by the admin
        /// service.
        question: ActiveQuestion,
    },
    /// Judge the answer given by the buzzed-in player.
    Judge(Verdict),
    /// Return the finished game to idle for a rematch.
    Reset,
}

/// Every event the engine consumes. Origin namespaces are separate variants,
/// never overlapping value ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Administrative command.
    Admin(AdminEvent),
    /// One of the three buzzers fired (post-arbitration winner only).
    Buzz(PlayerSlot),
    /// A buzz-in or answer timer elapsed. Matched against the token minted
    /// when the timer was armed; stale timeouts miss and are ignored.
    Timeout {
        /// Token of the arming that scheduled this timeout.
        token: TimerToken,
    },
}

/// The closed set of game phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing running; waiting for the admin to open a game.
    Idle,
    /// Game opened; waiting for the first player registration.
    NewGame,
    /// One or two players registered; waiting for the rest.
    RegisteringPlayers,
    /// All three players known; broadcast the board and hand off.
    StartingGame,
    /// Waiting for the picking player to choose a question.
    PickingPlayer,
    /// Question on the floor; buzzers armed.
    QuestionChosen,
    /// A buzzer won arbitration; waiting for the admin's judgement.
    AnswerExpected,
    /// Applying the judged score delta.
    AdjustingScore,
    /// Deciding whether every player has now failed the question.
    CheckingLastPlayer,
    /// Deciding whether the board is exhausted.
    CheckingGameOver,
    /// Board exhausted; winners announced. Only the reset event leaves here.
    GameOver,
}

impl Phase {
    /// Phases with no external trigger: entry synthesizes the follow-up
    /// dispatch and the engine cascades through them before returning.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Phase::StartingGame
                | Phase::AdjustingScore
                | Phase::CheckingLastPlayer
                | Phase::CheckingGameOver
        )
    }

    /// Phases whose entry action re-runs on a self-transition. Registration
    /// is the only one: the player-2 event loops back into the same phase
    /// and must still create the player slot.
    pub fn is_reentrant(self) -> bool {
        matches!(self, Phase::RegisteringPlayers)
    }
}

/// A side effect requested by a phase entry action. The engine stays pure;
/// [`crate::state::AppState`] executes these after the transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Publish the pre-game board placeholder.
    BroadcastEmptyBoard,
    /// Publish a full board snapshot (roster, remaining questions).
    BroadcastBoard,
    /// Announce whose turn it is to pick.
    BroadcastPlayerPicked(PlayerSlot),
    /// Reveal the chosen question (text and value, never the answer).
    BroadcastQuestion(ActiveQuestion),
    /// Announce a score change for one player.
    BroadcastScore {
        /// Player whose score changed.
        slot: PlayerSlot,
        /// Score after the change.
        score: i64,
    },
    /// Announce the winner set at game end.
    BroadcastWinners(Vec<PlayerSlot>),
    /// Start the buzz-in countdown for the token's arming.
    ArmBuzzTimer(TimerToken),
    /// Start the answer countdown for the token's arming.
    ArmAnswerTimer(TimerToken),
    /// Abort any outstanding countdown.
    CancelTimers,
    /// Open the arbitration slot for the next first-buzz race.
    ArmArbitration,
    /// Close the arbitration slot; late signals are discarded.
    CloseArbitration,
    /// Mark the question resolved in the bank.
    QuestionResolved(u32),
}

/// Result of dispatching one external event.
#[derive(Debug)]
pub struct DispatchOutcome {
    /// False when the event was unrecognized in the current phase; the
    /// record is untouched and no effects were produced.
    pub accepted: bool,
    /// The settled phase after any transient cascade.
    pub phase: Phase,
    /// Side effects requested by the entry actions that ran, in order.
    pub effects: Vec<Effect>,
}

/// Resolve one event against the record, mutate it per the entry actions of
/// every phase entered, and cascade transient phases until the game settles.
///
/// One call handles the whole cascade: from the caller's point of view a
/// single event (say, the third registration) lands the game in
/// [`Phase::PickingPlayer`] before this returns. Unrecognized events are
/// ignored without side effects.
pub fn dispatch(record: &mut GameRecord, event: GameEvent) -> DispatchOutcome {
    let mut effects = Vec::new();

    let Some(mut next) = accepts(record, &event) else {
        return DispatchOutcome {
            accepted: false,
            phase: record.phase,
            effects,
        };
    };

    for _ in 0..MAX_CASCADE_DEPTH {
        let changed = next != record.phase;
        record.phase = next;
        if changed || record.phase.is_reentrant() {
            on_enter(record, &event, &mut effects);
        }
        if !record.phase.is_transient() {
            break;
        }
        // Transient phases accept every event, so this always produces the
        // synthetic follow-up transition.
        match accepts(record, &event) {
            Some(phase) => next = phase,
            None => break,
        }
    }
    debug_assert!(!record.phase.is_transient(), "cascade failed to settle");

    DispatchOutcome {
        accepted: true,
        phase: record.phase,
        effects,
    }
}

/// The transition table: which event the current phase recognizes and where
/// it leads. `None` means "ignore and stay" — the engine then skips entry
/// actions entirely.
fn accepts(record: &GameRecord, event: &GameEvent) -> Option<Phase> {
    use AdminEvent as A;
    use GameEvent as E;

    match (record.phase, event) {
        (Phase::Idle, E::Admin(A::StartGame { .. })) => Some(Phase::NewGame),
        (
            Phase::NewGame,
            E::Admin(A::RegisterPlayer {
                slot: PlayerSlot::One,
                ..
            }),
        ) => Some(Phase::RegisteringPlayers),
        (
            Phase::RegisteringPlayers,
            E::Admin(A::RegisterPlayer {
                slot: PlayerSlot::Two,
                ..
            }),
        ) if record.players.len() == 1 => Some(Phase::RegisteringPlayers),
        (
            Phase::RegisteringPlayers,
            E::Admin(A::RegisterPlayer {
                slot: PlayerSlot::Three,
                ..
            }),
        ) if record.players.len() == 2 => Some(Phase::StartingGame),
        (Phase::StartingGame, _) => Some(Phase::PickingPlayer),
        (Phase::PickingPlayer, E::Admin(A::ChooseQuestion { .. })) => Some(Phase::QuestionChosen),
        // A player who already failed this question does not get a second
        // buzz at it.
        (Phase::QuestionChosen, E::Buzz(slot)) if !record.attempted.contains(*slot) => {
            Some(Phase::AnswerExpected)
        }
        (Phase::QuestionChosen, E::Timeout { token }) if record.timer_is_current(*token) => {
            Some(Phase::CheckingGameOver)
        }
        (Phase::AnswerExpected, E::Admin(A::Judge(_))) => Some(Phase::AdjustingScore),
        (Phase::AnswerExpected, E::Timeout { token }) if record.timer_is_current(*token) => {
            Some(Phase::CheckingGameOver)
        }
        (Phase::AdjustingScore, E::Admin(A::Judge(Verdict::Correct))) => {
            Some(Phase::CheckingGameOver)
        }
        (Phase::AdjustingScore, E::Admin(A::Judge(Verdict::Incorrect))) => {
            Some(Phase::CheckingLastPlayer)
        }
        (Phase::CheckingLastPlayer, _) => {
            Some(if record.attempted.len() == PlayerSlot::ALL.len() {
                Phase::CheckingGameOver
            } else {
                Phase::QuestionChosen
            })
        }
        (Phase::CheckingGameOver, _) => Some(if record.questions_remaining == 0 {
            Phase::GameOver
        } else {
            Phase::PickingPlayer
        }),
        (Phase::GameOver, E::Admin(A::Reset)) => Some(Phase::Idle),
        _ => None,
    }
}

/// Entry action of the phase the record just moved into. All mutation and
/// every requested side effect happens here.
fn on_enter(record: &mut GameRecord, event: &GameEvent, effects: &mut Vec<Effect>) {
    match record.phase {
        Phase::Idle => {
            record.reset();
            effects.push(Effect::CancelTimers);
            effects.push(Effect::CloseArbitration);
        }
        Phase::NewGame => {
            if let GameEvent::Admin(AdminEvent::StartGame { board_size }) = event {
                record.questions_remaining = *board_size;
            }
            effects.push(Effect::BroadcastEmptyBoard);
        }
        Phase::RegisteringPlayers => {
            if let GameEvent::Admin(AdminEvent::RegisterPlayer { name, .. }) = event {
                record.players.push(Player::new(name.clone()));
            }
        }
        Phase::StartingGame => {
            // The third registration lands here directly; complete the
            // roster before announcing the full board.
            if let GameEvent::Admin(AdminEvent::RegisterPlayer { name, .. }) = event {
                record.players.push(Player::new(name.clone()));
            }
            effects.push(Effect::BroadcastBoard);
        }
        Phase::PickingPlayer => {
            record.attempted.clear();
            let picker = record.select_picker();
            record.current_player = Some(picker);
            effects.push(Effect::BroadcastPlayerPicked(picker));
        }
        Phase::QuestionChosen => {
            // Only the admin's pick installs a question; the re-offer loop
            // re-enters with the judge event and keeps the current one.
            if let GameEvent::Admin(AdminEvent::ChooseQuestion { question }) = event {
                record.current_question = Some(question.clone());
                effects.push(Effect::BroadcastQuestion(question.clone()));
            }
            let token = Uuid::new_v4();
            record.armed_timer = Some(token);
            effects.push(Effect::ArmBuzzTimer(token));
            effects.push(Effect::ArmArbitration);
        }
        Phase::AnswerExpected => {
            if let GameEvent::Buzz(slot) = event {
                record.current_player = Some(*slot);
            }
            let token = Uuid::new_v4();
            record.armed_timer = Some(token);
            effects.push(Effect::ArmAnswerTimer(token));
        }
        Phase::AdjustingScore => {
            if let GameEvent::Admin(AdminEvent::Judge(verdict)) = event {
                apply_judgement(record, *verdict, effects);
            }
            record.armed_timer = None;
            effects.push(Effect::CancelTimers);
        }
        Phase::CheckingLastPlayer => {}
        Phase::CheckingGameOver => {
            // Reached only when the question resolved (scored, exhausted, or
            // timed out), so consuming here decrements exactly once.
            if let Some(active) = record.current_question.take() {
                record.questions_remaining = record.questions_remaining.saturating_sub(1);
                effects.push(Effect::QuestionResolved(active.id));
                effects.push(Effect::BroadcastBoard);
            }
            record.armed_timer = None;
            effects.push(Effect::CancelTimers);
            effects.push(Effect::CloseArbitration);
        }
        Phase::GameOver => {
            effects.push(Effect::BroadcastWinners(record.leaders()));
        }
    }
}

fn apply_judgement(record: &mut GameRecord, verdict: Verdict, effects: &mut Vec<Effect>) {
    let Some(slot) = record.current_player else {
        return;
    };
    let Some(value) = record
        .current_question
        .as_ref()
        .map(|active| active.question.value)
    else {
        return;
    };

    let Some(player) = record.player_mut(slot) else {
        return;
    };
    let score = match verdict {
        Verdict::Correct => {
            player.score += value;
            player.score
        }
        Verdict::Incorrect => {
            player.score -= value;
            player.score
        }
    };
    match verdict {
        Verdict::Correct => record.last_correct = Some(slot),
        Verdict::Incorrect => record.attempted.insert(slot),
    }

    effects.push(Effect::BroadcastScore { slot, score });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::{Question, TurnPolicy};

    fn question(id: u32, value: i64) -> ActiveQuestion {
        ActiveQuestion {
            id,
            question: Question {
                text: format!("question {id}"),
                answer: format!("answer {id}"),
                value,
            },
        }
    }

    fn admin(record: &mut GameRecord, event: AdminEvent) -> DispatchOutcome {
        dispatch(record, GameEvent::Admin(event))
    }

    /// Start a game with `board_size` questions and register Alice, Bob and
    /// Cara; the engine settles in PickingPlayer.
    fn running_game(board_size: usize) -> GameRecord {
        let mut record = GameRecord::new(TurnPolicy::RoundRobin);
        admin(&mut record, AdminEvent::StartGame { board_size });
        for (slot, name) in PlayerSlot::ALL.into_iter().zip(["Alice", "Bob", "Cara"]) {
            admin(
                &mut record,
                AdminEvent::RegisterPlayer {
                    slot,
                    name: name.into(),
                },
            );
        }
        record
    }

    fn choose(record: &mut GameRecord, id: u32, value: i64) -> DispatchOutcome {
        admin(
            record,
            AdminEvent::ChooseQuestion {
                question: question(id, value),
            },
        )
    }

    fn current_timeout(record: &GameRecord) -> GameEvent {
        GameEvent::Timeout {
            token: record.armed_timer.expect("a timer should be armed"),
        }
    }

    #[test]
    fn initial_phase_is_idle() {
        let record = GameRecord::new(TurnPolicy::RoundRobin);
        assert_eq!(record.phase, Phase::Idle);
        assert!(record.players.is_empty());
    }

    #[test]
    fn registration_cascades_to_picking_player() {
        let mut record = GameRecord::new(TurnPolicy::RoundRobin);
        admin(&mut record, AdminEvent::StartGame { board_size: 5 });
        assert_eq!(record.phase, Phase::NewGame);

        admin(
            &mut record,
            AdminEvent::RegisterPlayer {
                slot: PlayerSlot::One,
                name: "Alice".into(),
            },
        );
        admin(
            &mut record,
            AdminEvent::RegisterPlayer {
                slot: PlayerSlot::Two,
                name: "Bob".into(),
            },
        );
        let outcome = admin(
            &mut record,
            AdminEvent::RegisterPlayer {
                slot: PlayerSlot::Three,
                name: "Cara".into(),
            },
        );

        // The third registration cascades through StartingGame without any
        // further external trigger.
        assert_eq!(outcome.phase, Phase::PickingPlayer);
        assert_eq!(record.players.len(), 3);
        assert_eq!(record.current_player, Some(PlayerSlot::One));

        let board_broadcasts = outcome
            .effects
            .iter()
            .filter(|effect| matches!(effect, Effect::BroadcastBoard))
            .count();
        assert_eq!(board_broadcasts, 1);
        assert!(
            outcome
                .effects
                .contains(&Effect::BroadcastPlayerPicked(PlayerSlot::One))
        );
    }

    #[test]
    fn out_of_order_registration_is_ignored() {
        let mut record = GameRecord::new(TurnPolicy::RoundRobin);
        admin(&mut record, AdminEvent::StartGame { board_size: 5 });
        admin(
            &mut record,
            AdminEvent::RegisterPlayer {
                slot: PlayerSlot::One,
                name: "Alice".into(),
            },
        );

        let before = record.clone();
        let outcome = admin(
            &mut record,
            AdminEvent::RegisterPlayer {
                slot: PlayerSlot::Three,
                name: "Cara".into(),
            },
        );

        assert!(!outcome.accepted);
        assert!(outcome.effects.is_empty());
        assert_eq!(record, before);
    }

    #[test]
    fn unrecognized_event_leaves_record_untouched() {
        let mut record = running_game(5);
        let before = record.clone();

        let outcome = admin(&mut record, AdminEvent::Judge(Verdict::Correct));
        assert!(!outcome.accepted);
        assert!(outcome.effects.is_empty());
        assert_eq!(record, before);

        let outcome = dispatch(&mut record, GameEvent::Buzz(PlayerSlot::Two));
        assert!(!outcome.accepted);
        assert_eq!(record, before);
    }

    #[test]
    fn buzz_tracks_the_answering_player() {
        let mut record = running_game(5);
        choose(&mut record, 1, 200);
        let buzz_in_token = record.armed_timer;

        let outcome = dispatch(&mut record, GameEvent::Buzz(PlayerSlot::Two));
        assert!(outcome.accepted);
        assert_eq!(record.phase, Phase::AnswerExpected);
        assert_eq!(record.current_player, Some(PlayerSlot::Two));
        assert_ne!(record.armed_timer, buzz_in_token);
        assert!(
            outcome
                .effects
                .iter()
                .any(|effect| matches!(effect, Effect::ArmAnswerTimer(_)))
        );
    }

    #[test]
    fn wrong_answer_loops_back_to_the_same_question() {
        let mut record = running_game(5);
        choose(&mut record, 1, 200);
        dispatch(&mut record, GameEvent::Buzz(PlayerSlot::Two));

        let outcome = admin(&mut record, AdminEvent::Judge(Verdict::Incorrect));
        assert_eq!(outcome.phase, Phase::QuestionChosen);
        assert!(record.attempted.contains(PlayerSlot::Two));
        assert_eq!(record.attempted.len(), 1);
        assert_eq!(record.player(PlayerSlot::Two).unwrap().score, -200);
        assert_eq!(record.current_question.as_ref().unwrap().id, 1);
        assert_eq!(record.questions_remaining, 5);
        // Buzz-in is re-armed for the remaining players.
        assert!(outcome.effects.contains(&Effect::ArmArbitration));
        assert!(
            outcome
                .effects
                .iter()
                .any(|effect| matches!(effect, Effect::ArmBuzzTimer(_)))
        );
    }

    #[test]
    fn attempted_player_cannot_buzz_again() {
        let mut record = running_game(5);
        choose(&mut record, 1, 200);
        dispatch(&mut record, GameEvent::Buzz(PlayerSlot::Two));
        admin(&mut record, AdminEvent::Judge(Verdict::Incorrect));

        let outcome = dispatch(&mut record, GameEvent::Buzz(PlayerSlot::Two));
        assert!(!outcome.accepted);
        assert_eq!(record.phase, Phase::QuestionChosen);

        let outcome = dispatch(&mut record, GameEvent::Buzz(PlayerSlot::Three));
        assert!(outcome.accepted);
        assert_eq!(record.phase, Phase::AnswerExpected);
    }

    #[test]
    fn three_wrong_answers_consume_the_question() {
        let mut record = running_game(2);
        choose(&mut record, 1, 200);

        for slot in PlayerSlot::ALL {
            dispatch(&mut record, GameEvent::Buzz(slot));
            admin(&mut record, AdminEvent::Judge(Verdict::Incorrect));
        }

        // Third failure routes through CheckingLastPlayer into
        // CheckingGameOver; the question is consumed with nobody scoring.
        assert_eq!(record.phase, Phase::PickingPlayer);
        assert_eq!(record.questions_remaining, 1);
        assert!(record.current_question.is_none());
        assert!(record.attempted.is_empty());
        for slot in PlayerSlot::ALL {
            assert_eq!(record.player(slot).unwrap().score, -200);
        }
    }

    #[test]
    fn correct_answer_scores_and_consumes() {
        let mut record = running_game(2);
        choose(&mut record, 1, 200);
        dispatch(&mut record, GameEvent::Buzz(PlayerSlot::Two));

        let outcome = admin(&mut record, AdminEvent::Judge(Verdict::Correct));
        assert_eq!(outcome.phase, Phase::PickingPlayer);
        assert_eq!(record.player(PlayerSlot::Two).unwrap().score, 200);
        assert_eq!(record.questions_remaining, 1);
        assert_eq!(record.last_correct, Some(PlayerSlot::Two));
        assert!(outcome.effects.contains(&Effect::QuestionResolved(1)));
        assert!(outcome.effects.contains(&Effect::BroadcastScore {
            slot: PlayerSlot::Two,
            score: 200,
        }));
    }

    #[test]
    fn last_question_correct_ends_the_game() {
        let mut record = running_game(1);
        choose(&mut record, 1, 200);
        dispatch(&mut record, GameEvent::Buzz(PlayerSlot::Two));

        let outcome = admin(&mut record, AdminEvent::Judge(Verdict::Correct));
        assert_eq!(outcome.phase, Phase::GameOver);
        assert!(
            outcome
                .effects
                .contains(&Effect::BroadcastWinners(vec![PlayerSlot::Two]))
        );
    }

    #[test]
    fn buzz_in_timeout_consumes_the_question() {
        let mut record = running_game(2);
        choose(&mut record, 1, 200);

        let timeout = current_timeout(&record);
        let outcome = dispatch(&mut record, timeout);
        assert!(outcome.accepted);
        assert_eq!(outcome.phase, Phase::PickingPlayer);
        assert_eq!(record.questions_remaining, 1);
        for slot in PlayerSlot::ALL {
            assert_eq!(record.player(slot).unwrap().score, 0);
        }
    }

    #[test]
    fn answer_timeout_consumes_without_scoring() {
        let mut record = running_game(2);
        choose(&mut record, 1, 200);
        dispatch(&mut record, GameEvent::Buzz(PlayerSlot::One));

        let timeout = current_timeout(&record);
        let outcome = dispatch(&mut record, timeout);
        assert!(outcome.accepted);
        assert_eq!(record.questions_remaining, 1);
        assert_eq!(record.player(PlayerSlot::One).unwrap().score, 0);
    }

    #[test]
    fn stale_timeout_is_ignored() {
        let mut record = running_game(5);
        choose(&mut record, 1, 200);
        let stale = current_timeout(&record);

        // The buzz re-arms with a fresh token; the buzz-in timeout no
        // longer matches and must not be misapplied to the answer phase.
        dispatch(&mut record, GameEvent::Buzz(PlayerSlot::One));
        let before = record.clone();

        let outcome = dispatch(&mut record, stale);
        assert!(!outcome.accepted);
        assert!(outcome.effects.is_empty());
        assert_eq!(record, before);
    }

    #[test]
    fn scoreless_game_lists_everyone_as_winner() {
        let mut record = running_game(1);
        choose(&mut record, 1, 200);

        let timeout = current_timeout(&record);
        let outcome = dispatch(&mut record, timeout);
        assert_eq!(outcome.phase, Phase::GameOver);
        assert!(
            outcome
                .effects
                .contains(&Effect::BroadcastWinners(PlayerSlot::ALL.to_vec()))
        );
    }

    #[test]
    fn reset_returns_to_idle_for_a_rematch() {
        let mut record = running_game(1);
        choose(&mut record, 1, 200);
        dispatch(&mut record, GameEvent::Buzz(PlayerSlot::Two));
        admin(&mut record, AdminEvent::Judge(Verdict::Correct));
        assert_eq!(record.phase, Phase::GameOver);

        let outcome = admin(&mut record, AdminEvent::Reset);
        assert!(outcome.accepted);
        assert_eq!(record.phase, Phase::Idle);
        assert!(record.players.is_empty());
        assert_eq!(record.questions_remaining, 0);
        assert!(outcome.effects.contains(&Effect::CancelTimers));
        assert!(outcome.effects.contains(&Effect::CloseArbitration));
    }

    #[test]
    fn reset_is_ignored_mid_game() {
        let mut record = running_game(5);
        let before = record.clone();
        let outcome = admin(&mut record, AdminEvent::Reset);
        assert!(!outcome.accepted);
        assert_eq!(record, before);
    }

    #[test]
    fn questions_remaining_never_increases() {
        let mut record = running_game(3);
        let mut remaining = record.questions_remaining;
        let mut check = |record: &GameRecord| {
            assert!(record.questions_remaining <= remaining);
            remaining = record.questions_remaining;
        };

        choose(&mut record, 1, 100);
        dispatch(&mut record, GameEvent::Buzz(PlayerSlot::One));
        check(&record);
        admin(&mut record, AdminEvent::Judge(Verdict::Correct));
        check(&record);

        choose(&mut record, 2, 200);
        let timeout = current_timeout(&record);
        dispatch(&mut record, timeout);
        check(&record);

        choose(&mut record, 3, 300);
        for slot in PlayerSlot::ALL {
            dispatch(&mut record, GameEvent::Buzz(slot));
            check(&record);
            admin(&mut record, AdminEvent::Judge(Verdict::Incorrect));
            check(&record);
        }

        assert_eq!(record.questions_remaining, 0);
        assert_eq!(record.phase, Phase::GameOver);
    }

    #[test]
    fn every_dispatch_settles_out_of_transient_phases() {
        let mut record = running_game(2);
        let events = [
            GameEvent::Admin(AdminEvent::ChooseQuestion {
                question: question(1, 100),
            }),
            GameEvent::Buzz(PlayerSlot::One),
            GameEvent::Admin(AdminEvent::Judge(Verdict::Incorrect)),
            GameEvent::Buzz(PlayerSlot::Two),
            GameEvent::Admin(AdminEvent::Judge(Verdict::Correct)),
        ];
        for event in events {
            let outcome = dispatch(&mut record, event);
            assert!(!outcome.phase.is_transient());
            assert!(!record.phase.is_transient());
        }
    }

    #[test]
    fn attempts_reset_on_fresh_question_only() {
        let mut record = running_game(5);
        choose(&mut record, 1, 200);
        dispatch(&mut record, GameEvent::Buzz(PlayerSlot::Two));
        admin(&mut record, AdminEvent::Judge(Verdict::Incorrect));
        assert_eq!(record.attempted.len(), 1);

        // Same question re-offered: attempts survive.
        dispatch(&mut record, GameEvent::Buzz(PlayerSlot::Three));
        admin(&mut record, AdminEvent::Judge(Verdict::Correct));

        // Fresh question: attempts cleared by the pick.
        assert_eq!(record.phase, Phase::PickingPlayer);
        assert!(record.attempted.is_empty());
        choose(&mut record, 2, 400);
        assert!(record.attempted.is_empty());
    }
}
