//! Terminal host for the persona chat core.
//!
//! Stands in for the hosted UI: each stdin line is a submission and every
//! new transcript message is printed as a chat bubble.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (default on first run) and pick up the
//!    API token from the environment.
//! 3. Create the [`tokio`] runtime.
//! 4. Build the completion client from config.
//! 5. Rehydrate the conversation (when persistence is enabled).
//! 6. Spawn the typing-indicator watcher.
//! 7. Read stdin until EOF, submitting each line.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

use persona_chat::{
    completion::{ApiCompletionClient, CompletionClient},
    config::{AppConfig, AppPaths, API_KEY_ENV},
    conversation::{ConversationController, ConversationStatus, Submission},
    transcript::{JsonFileStorage, Message, Sender},
};

fn print_message(message: &Message) {
    let who = match (message.sender, message.is_error) {
        (Sender::User, _) => "you",
        (Sender::Assistant, false) => "prashant",
        (Sender::Assistant, true) => "!!",
    };
    println!("[{}] {who}: {}", message.display_time(), message.text);
}

/// Print every message past the `shown` cursor and advance it.
fn print_new_messages(controller: &ConversationController, shown: &Mutex<usize>) {
    let mut shown = shown.lock().unwrap_or_else(PoisonError::into_inner);
    let transcript = controller.transcript();
    for message in transcript.iter().skip(*shown) {
        print_message(message);
    }
    *shown = transcript.len();
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    // 4. Completion client
    let client: Arc<dyn CompletionClient> =
        Arc::new(ApiCompletionClient::from_config(&config.completion)?);
    let system_prompt = config.completion.system_prompt.clone();

    // 5. Conversation
    let controller = if config.persistence.enabled {
        let path = config.persistence.resolve_path(&AppPaths::new());
        log::info!("Transcript persisted to {}", path.display());
        let storage = Arc::new(JsonFileStorage::new(path));
        ConversationController::restore(client, system_prompt, storage)
    } else {
        ConversationController::new(client, system_prompt)
    };
    let shown = Arc::new(Mutex::new(0));
    print_new_messages(&controller, &shown);

    // 6. Printer + typing indicator
    {
        let controller = controller.clone();
        let shown = Arc::clone(&shown);
        let mut status_rx = controller.subscribe_status();
        tokio::spawn(async move {
            while status_rx.changed().await.is_ok() {
                let status = *status_rx.borrow_and_update();
                print_new_messages(&controller, &shown);
                if status == ConversationStatus::AwaitingResponse {
                    println!("{}", status.label());
                }
            }
        });
    }

    // 7. Input loop.  Submissions run detached so a line typed while a reply
    //    is pending hits the busy guard instead of queueing.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Vec<JoinHandle<Submission>> = Vec::new();

    while let Some(line) = lines.next_line().await? {
        pending.retain(|task| !task.is_finished());
        let controller = controller.clone();
        pending.push(tokio::spawn(async move {
            let outcome = controller.submit(&line).await;
            if outcome == Submission::Ignored {
                log::info!("Input ignored (blank, or a reply is still pending)");
            }
            outcome
        }));
    }

    for task in pending {
        task.await?;
    }
    print_new_messages(&controller, &shown);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("persona-chat starting up");

    // 2. Configuration
    let config = AppConfig::load()
        .unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            AppConfig::default()
        })
        .with_env_overrides();

    if config.completion.api_key.is_none() {
        log::warn!("{API_KEY_ENV} is not set; requests will be sent without a token");
    }

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    rt.block_on(run(config))
}
