use anyhow::Result;
use parley::config::AppConfig;
use parley::gateway::{start_server, AppState, DebateClient, OllamaProvider};
use parley::session::{FileStateStore, SessionController, SubmitOutcome};
use parley::speech::{NullSpeech, SpeechPort, VoiceState};
use std::io::Write;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Parley debate assistant");

    let config = AppConfig::from_env();
    config.validate().map_err(anyhow::Error::msg)?;

    // Serve the relay endpoint in the background.
    let provider = OllamaProvider::new(config.provider.clone());
    let state = AppState::new(Arc::new(provider));
    let bind_addr = config.bind_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = start_server(&bind_addr, state).await {
            error!(error = %e, "Relay endpoint failed");
        }
    });

    let store = Arc::new(FileStateStore::new(&config.state_dir)?);
    let gateway = DebateClient::new(config.gateway_endpoint());
    let speech = build_speech(&config);
    let mut controller = SessionController::new(gateway, speech, store);

    if let Some(notice) = controller.speech().capability().notice() {
        println!("{}", notice);
    }

    run_console(&mut controller).await
}

#[cfg(feature = "audio-io")]
fn build_speech(config: &AppConfig) -> Box<dyn SpeechPort> {
    if config.enable_voice {
        Box::new(parley::speech::SpeechAdapter::new(
            config.synthesis.clone(),
            config.transcription.clone(),
        ))
    } else {
        Box::new(NullSpeech::new())
    }
}

#[cfg(not(feature = "audio-io"))]
fn build_speech(_config: &AppConfig) -> Box<dyn SpeechPort> {
    Box::new(NullSpeech::new())
}

/// Thin console view over the session controller.
async fn run_console(controller: &mut SessionController<DebateClient>) -> Result<()> {
    println!("Parley debate assistant. Type a message, or /help for commands.");

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        prompt(controller);
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();

        match line.split_whitespace().next() {
            Some("/quit") => break,
            Some("/help") => print_help(),
            Some("/list") => {
                for session in controller.sessions() {
                    let marker = if Some(session.id) == controller.active_id() {
                        "*"
                    } else {
                        " "
                    };
                    println!("{} {}  {}", marker, session.id, session.preview);
                }
            }
            Some("/new") => {
                let rest = line.trim_start_matches("/new").trim().to_string();
                if rest.is_empty() {
                    controller.create_session(None, None);
                } else {
                    let title = controller.title_for(&rest).await;
                    controller.create_session(None, Some(&title));
                    render(controller.submit_user_input(&rest).await);
                }
            }
            Some("/select") => {
                let arg = line.trim_start_matches("/select").trim();
                let selected = arg
                    .parse::<i64>()
                    .map(|id| controller.select_session(id))
                    .unwrap_or(false);
                if !selected {
                    println!("No such session: {}", arg);
                }
            }
            Some("/remove") => match controller.active_id() {
                Some(id) => controller.remove_session(id),
                None => println!("No active session."),
            },
            Some("/talk") => {
                if let Some(notice) = controller.speech().capability().notice() {
                    println!("{}", notice);
                    continue;
                }
                match controller.toggle_voice_input().await {
                    Ok(None) => println!("Recording... /talk again to stop."),
                    Ok(Some(outcome)) => render(outcome),
                    Err(e) => println!("{}", e.user_message()),
                }
            }
            Some(cmd) if cmd.starts_with('/') => println!("Unknown command: {}", cmd),
            _ => render(controller.submit_user_input(&line).await),
        }
    }

    info!("Shutting down");
    Ok(())
}

fn prompt(controller: &SessionController<DebateClient>) {
    let state = match controller.speech().voice_state() {
        VoiceState::Idle => "",
        VoiceState::Capturing => "[rec] ",
        VoiceState::Speaking => "[tts] ",
    };
    print!("{}> ", state);
    let _ = std::io::stdout().flush();
}

fn render(outcome: SubmitOutcome) {
    match outcome {
        SubmitOutcome::Ignored => {}
        SubmitOutcome::Farewell(text)
        | SubmitOutcome::Replied(text)
        | SubmitOutcome::Failed(text) => println!("assistant: {}", text),
    }
}

fn print_help() {
    println!("/new [message]   start a new chat (optionally with a first message)");
    println!("/list            list chats");
    println!("/select <id>     switch to a chat");
    println!("/remove          remove the current chat");
    println!("/talk            toggle voice capture");
    println!("/quit            exit");
}
