use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use npc_arena::config::{ArenaConfig, DEFAULT_ROSTER_PATH};
use npc_arena::console::{self, ConsoleCommand};
use npc_arena::kernel::event::{Event, InputEvent};
use npc_arena::kernel::reactor::Reactor;
use npc_arena::outputs::ConsolePresenter;
use npc_arena::roster::{FileNpcStore, NpcStore};
use npc_arena::services::llm::LlmService;
use npc_arena::turns::TurnOrchestrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let config = ArenaConfig::from_env();
    tracing::info!(base_url = %config.llm.base_url, model = %config.llm.model, "NPC arena booting");

    let roster_path = config.roster_path.clone().unwrap_or_else(|| DEFAULT_ROSTER_PATH.into());
    let mut store = FileNpcStore::open(&roster_path)
        .with_context(|| format!("opening roster at {}", roster_path.display()))?;

    let (tx, rx) = mpsc::channel(100);
    let mut reactor = Reactor::new(rx, tx.clone(), config.clone(), store.list());
    let gateway = Arc::new(LlmService::new(&config.llm));
    let orchestrator = Arc::new(TurnOrchestrator::new(gateway, &config));
    let shutdown = CancellationToken::new();

    let input_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("{}", console::HELP);

        while let Ok(Some(line)) = lines.next_line().await {
            let command = console::parse(&line);
            let event = match &command {
                ConsoleCommand::Quit => break,
                ConsoleCommand::Chat(text) if text.is_empty() => continue,
                ConsoleCommand::Chat(text) => Event::Input(InputEvent::text("console", text)),
                _ if command.changes_roster() => {
                    match console::apply_roster_command(&mut store, &command) {
                        Ok(reply) => println!("{reply}"),
                        Err(e) => {
                            tracing::error!(error = %e, "Roster update failed");
                            continue;
                        }
                    }
                    Event::RosterChanged(store.list())
                }
                _ => {
                    match console::apply_roster_command(&mut store, &command) {
                        Ok(reply) => println!("{reply}"),
                        Err(e) => tracing::error!(error = %e, "Roster command failed"),
                    }
                    continue;
                }
            };

            if let Err(e) = tx.send(event).await {
                tracing::error!("Failed to send input: {}", e);
                break;
            }
        }
        input_shutdown.cancel();
    });

    let ctrl_c_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_shutdown.cancel();
        }
    });

    let mut presenter = ConsolePresenter::stdout();
    reactor.run(orchestrator, &mut presenter, shutdown).await;
    Ok(())
}
