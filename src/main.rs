//! Buzzdesk binary entrypoint: wires the progression engine, the question
//! bank, and a line-oriented operator console standing in for the admin and
//! buzzer transports.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use buzzdesk::{
    bank::MemoryBank,
    config::AppConfig,
    services::{admin_service, event_loop},
    state::{AppState, SharedState, game::PlayerSlot, state_machine::Verdict},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let state = AppState::new(config.clone());
    state.install_bank(Arc::new(MemoryBank::load(&config.questions_path)));

    tokio::spawn(event_loop::run(state.clone()));
    tokio::spawn(log_board_events(state.clone()));

    info!("operator console ready; type `help` for commands");
    tokio::select! {
        result = run_console(state) => result?,
        _ = shutdown_signal() => info!("shutting down"),
    }

    Ok(())
}

/// Mirror every board broadcast into the log, the way a UI adapter would
/// consume the hub.
async fn log_board_events(state: SharedState) {
    let mut events = state.board().stream();
    while let Some(event) = events.next().await {
        match event {
            Ok(event) => info!(name = %event.event, data = %event.data, "board event"),
            Err(err) => warn!(error = %err, "board subscriber lagged"),
        }
    }
}

/// Read operator commands from stdin until `quit` or end of input.
async fn run_console(state: SharedState) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("reading console input")? {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            continue;
        };

        let result = match command {
            "help" => {
                print_help();
                Ok(())
            }
            "start" => admin_service::start_game(&state).await.map(print_json),
            "player" => match (parse_slot(parts.next()), parts.clone().count()) {
                (Some(slot), rest) if rest > 0 => {
                    let name = parts.collect::<Vec<_>>().join(" ");
                    admin_service::register_player(&state, slot, name)
                        .await
                        .map(print_json)
                }
                _ => {
                    println!("usage: player <1|2|3> <name>");
                    Ok(())
                }
            },
            "pick" => match parts.next().and_then(|raw| raw.parse::<u32>().ok()) {
                Some(id) => admin_service::choose_question(&state, id)
                    .await
                    .map(print_json),
                None => {
                    println!("usage: pick <question-id>");
                    Ok(())
                }
            },
            "buzz" => match parse_slot(parts.next()) {
                Some(slot) => {
                    state.buzzer(slot).press();
                    Ok(())
                }
                None => {
                    println!("usage: buzz <1|2|3>");
                    Ok(())
                }
            },
            "correct" => admin_service::judge_answer(&state, Verdict::Correct)
                .await
                .map(print_json),
            "incorrect" => admin_service::judge_answer(&state, Verdict::Incorrect)
                .await
                .map(print_json),
            "board" => {
                print_json(admin_service::snapshot(&state).await);
                Ok(())
            }
            "reset" => admin_service::reset_game(&state).await,
            "quit" | "exit" => break,
            other => {
                println!("unknown command `{other}`; type `help`");
                Ok(())
            }
        };

        if let Err(err) = result {
            println!("error: {err}");
        }
    }

    Ok(())
}

fn print_help() {
    println!("commands:");
    println!("  start                open a game over the loaded board");
    println!("  player <n> <name>    register player n (in order 1, 2, 3)");
    println!("  pick <id>            put a question in play");
    println!("  buzz <n>             press buzzer n");
    println!("  correct | incorrect  judge the answer on the floor");
    println!("  board                show the admin snapshot");
    println!("  reset                return a finished game to idle");
    println!("  quit                 leave the console");
}

fn print_json<T: serde::Serialize>(value: T) {
    match serde_json::to_string_pretty(&value) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => println!("error rendering response: {err}"),
    }
}

fn parse_slot(raw: Option<&str>) -> Option<PlayerSlot> {
    match raw? {
        "1" => Some(PlayerSlot::One),
        "2" => Some(PlayerSlot::Two),
        "3" => Some(PlayerSlot::Three),
        _ => None,
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the console down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
