use tracing::{debug, warn};

use crate::state::{
    QueuedSignal, SharedState,
    arbitration::ClaimOutcome,
    state_machine::{GameEvent, Phase},
};

/// Drain the merged buzz/timeout queue, one signal at a time.
///
/// This is the single consumer the arbitration design requires: buzz
/// signals race only inside [`crate::state::arbitration::BuzzerArbiter`],
/// and because timeouts travel through the same FIFO queue a buzz that
/// arrived first is always dispatched first. Runs until every sender is
/// gone.
pub async fn run(state: SharedState) {
    let Some(mut signals) = state.take_signal_receiver() else {
        warn!("event loop already running; refusing to start a second consumer");
        return;
    };

    while let Some(signal) = signals.recv().await {
        match signal {
            QueuedSignal::Buzz(slot) => match state.arbiter().claim(slot) {
                ClaimOutcome::Won => {
                    let outcome = state.dispatch_event(GameEvent::Buzz(slot)).await;
                    if !outcome.accepted {
                        debug!(%slot, phase = ?outcome.phase, "winning buzz rejected by the engine");
                        // The only rejected winner while a question is still
                        // on the floor is a player who already failed it;
                        // reopen the race for the others.
                        if outcome.phase == Phase::QuestionChosen {
                            state.arbiter().arm();
                        }
                    }
                }
                ClaimOutcome::Beaten(winner) => {
                    debug!(%slot, %winner, "buzz lost arbitration");
                }
                ClaimOutcome::Disarmed => {
                    debug!(%slot, "buzz ignored; no question is open for buzzing");
                }
            },
            QueuedSignal::Timeout(token) => {
                let outcome = state
                    .dispatch_event(GameEvent::Timeout { token })
                    .await;
                if !outcome.accepted {
                    debug!(%token, "stale timeout ignored");
                }
            }
        }
    }
    debug!("event queue closed; loop exiting");
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use tokio::time::{sleep, timeout};

    use super::*;
    use crate::{
        bank::MemoryBank,
        config::AppConfig,
        services::admin_service,
        state::{AppState, game::{PlayerSlot, Question}, state_machine::Verdict},
    };

    fn board(count: usize) -> MemoryBank {
        MemoryBank::new(
            (0..count)
                .map(|index| Question {
                    text: format!("question {index}"),
                    answer: format!("answer {index}"),
                    value: 100,
                })
                .collect(),
        )
    }

    async fn running_state(config: AppConfig, questions: usize) -> SharedState {
        let state = AppState::new(config);
        state.install_bank(Arc::new(board(questions)));
        tokio::spawn(run(state.clone()));

        admin_service::start_game(&state).await.unwrap();
        for (slot, name) in PlayerSlot::ALL.into_iter().zip(["Alice", "Bob", "Cara"]) {
            admin_service::register_player(&state, slot, name.into())
                .await
                .unwrap();
        }
        state
    }

    async fn wait_for_phase(state: &SharedState, expected: Phase) {
        timeout(Duration::from_secs(2), async {
            loop {
                if state.phase().await == expected {
                    break;
                }
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {expected:?}"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_buzzers_admit_exactly_one_answerer() {
        let state = running_state(AppConfig::default(), 3).await;
        admin_service::choose_question(&state, 0).await.unwrap();

        for handle in state.buzzers() {
            let handle = handle.clone();
            tokio::spawn(async move { handle.press() });
        }

        wait_for_phase(&state, Phase::AnswerExpected).await;
        let answering = state.read_record(|record| record.current_player).await;
        assert!(answering.is_some());

        // Give the losing signals time to drain; the phase must not move.
        sleep(Duration::from_millis(50)).await;
        assert_eq!(state.phase().await, Phase::AnswerExpected);
        assert_eq!(
            state.read_record(|record| record.current_player).await,
            answering
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failed_player_cannot_rebuzz_but_others_can() {
        let state = running_state(AppConfig::default(), 3).await;
        admin_service::choose_question(&state, 0).await.unwrap();

        state.buzzer(PlayerSlot::Two).press();
        wait_for_phase(&state, Phase::AnswerExpected).await;
        admin_service::judge_answer(&state, Verdict::Incorrect)
            .await
            .unwrap();
        assert_eq!(state.phase().await, Phase::QuestionChosen);

        // The failed player's repeat press is rejected and re-opens the
        // race instead of locking everyone out.
        state.buzzer(PlayerSlot::Two).press();
        sleep(Duration::from_millis(50)).await;
        assert_eq!(state.phase().await, Phase::QuestionChosen);

        state.buzzer(PlayerSlot::Three).press();
        wait_for_phase(&state, Phase::AnswerExpected).await;
        assert_eq!(
            state.read_record(|record| record.current_player).await,
            Some(PlayerSlot::Three)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unanswered_question_times_out_and_is_consumed() {
        let config = AppConfig {
            buzz_timeout: Duration::from_millis(20),
            ..AppConfig::default()
        };
        let state = running_state(config, 2).await;
        admin_service::choose_question(&state, 0).await.unwrap();

        wait_for_phase(&state, Phase::PickingPlayer).await;
        let remaining = state
            .read_record(|record| record.questions_remaining)
            .await;
        assert_eq!(remaining, 1);
        assert!(state.bank().unwrap().is_resolved(0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn buzz_cancels_the_buzz_in_window() {
        let config = AppConfig {
            buzz_timeout: Duration::from_millis(200),
            answer_timeout: Duration::from_secs(60),
            ..AppConfig::default()
        };
        let state = running_state(config, 2).await;
        admin_service::choose_question(&state, 0).await.unwrap();

        state.buzzer(PlayerSlot::One).press();
        wait_for_phase(&state, Phase::AnswerExpected).await;

        // Outlive the buzz-in window: the cancelled/stale timeout must not
        // consume the question out from under the answering player.
        sleep(Duration::from_millis(300)).await;
        assert_eq!(state.phase().await, Phase::AnswerExpected);
    }
}
