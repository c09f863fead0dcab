mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use npc_arena::config::ArenaConfig;
use npc_arena::kernel::event::{Event, InputEvent};
use npc_arena::kernel::message::SenderType;
use npc_arena::kernel::reactor::Reactor;
use npc_arena::outputs::Transcript;
use npc_arena::roster::NpcProfile;
use npc_arena::services::llm::{GatewayError, GatewayPurpose};
use npc_arena::turns::TurnOrchestrator;

struct Session {
    tx: mpsc::Sender<Event>,
    transcript: Transcript,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl Session {
    fn start(config: ArenaConfig, roster: Vec<NpcProfile>, gateway: Arc<ScriptedGateway>) -> Self {
        let (tx, rx) = mpsc::channel(100);
        let mut reactor = Reactor::new(rx, tx.clone(), config.clone(), roster);
        let orchestrator = Arc::new(TurnOrchestrator::new(gateway, &config));
        let transcript = Transcript::new();
        let shutdown = CancellationToken::new();

        let mut presenter = transcript.clone();
        let token = shutdown.clone();
        let handle = tokio::spawn(async move {
            reactor.run(orchestrator, &mut presenter, token).await;
        });

        Self { tx, transcript, shutdown, handle }
    }

    async fn say(&self, text: &str) {
        self.tx.send(Event::Input(InputEvent::text("test", text))).await.unwrap();
    }

    fn lines(&self) -> Vec<(SenderType, String, String)> {
        self.transcript
            .messages()
            .into_iter()
            .map(|m| (m.sender_type, m.sender_name, m.text))
            .collect()
    }

    async fn close(self) {
        self.shutdown.cancel();
        self.handle.await.unwrap();
    }
}

fn leader(name: &str) -> String {
    format!(r#"{{"leadingNpc": "{name}", "reasoning": "best fit"}}"#)
}

#[tokio::test(start_paused = true)]
async fn user_turn_end_to_end() {
    let gateway = Arc::new(
        ScriptedGateway::new()
            .reply(GatewayPurpose::LeaderSelection, &leader("Kant"))
            .reply(GatewayPurpose::Response, "Have the courage to use your own understanding.")
            .reply(
                GatewayPurpose::Collaboration,
                r#"[{"npcName": "Hume", "response": "Reason is the slave of the passions."}]"#,
            ),
    );
    let session = Session::start(ArenaConfig::default(), vec![npc("Kant"), npc("Hume")], gateway.clone());

    session.say("Hello").await;
    tokio::time::sleep(Duration::from_secs(3)).await;

    let lines = session.lines();
    assert_eq!(lines.len(), 3, "{lines:?}");
    assert_eq!(lines[0].0, SenderType::User);
    assert_eq!(lines[1].1, "Kant");
    assert_eq!(lines[1].2, "Have the courage to use your own understanding.");
    assert_eq!(lines[2].1, "Hume");
    assert!(session.transcript.messages().iter().all(|m| !m.is_loading));
    assert_eq!(
        gateway.purposes(),
        vec![GatewayPurpose::LeaderSelection, GatewayPurpose::Response, GatewayPurpose::Collaboration]
    );

    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn summary_runs_before_leader_selection() {
    let mut config = ArenaConfig::default();
    config.context.summary_threshold = 3;
    let gateway = Arc::new(
        ScriptedGateway::new()
            .reply(GatewayPurpose::LeaderSelection, &leader("Kant"))
            .reply(GatewayPurpose::Response, "First answer.")
            .reply(GatewayPurpose::Summary, r#"{"newSummary": "User is greeting Kant"}"#)
            .reply(GatewayPurpose::LeaderSelection, &leader("Kant"))
            .reply(GatewayPurpose::Response, "Second answer."),
    );
    let session = Session::start(config, vec![npc("Kant")], gateway.clone());

    session.say("Hello").await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    session.say("Still here").await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(
        gateway.purposes(),
        vec![
            GatewayPurpose::LeaderSelection,
            GatewayPurpose::Response,
            GatewayPurpose::Summary,
            GatewayPurpose::LeaderSelection,
            GatewayPurpose::Response,
        ]
    );
    let calls = gateway.calls();
    assert!(calls[4].system_instruction.contains("User is greeting Kant"));
    let notice = session
        .lines()
        .into_iter()
        .find(|(kind, _, text)| *kind == SenderType::System && text.starts_with("[Context updated."));
    assert!(notice.is_some());

    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn ghost_leader_fails_turn_with_system_message() {
    let gateway = Arc::new(ScriptedGateway::new().reply(GatewayPurpose::LeaderSelection, &leader("Ghost")));
    let session = Session::start(ArenaConfig::default(), vec![npc("Kant"), npc("Hume")], gateway.clone());

    session.say("Hello").await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    let lines = session.lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1].0, SenderType::System);
    assert!(lines[1].2.contains("Ghost"));
    assert_eq!(gateway.purposes(), vec![GatewayPurpose::LeaderSelection]);

    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn empty_roster_makes_no_gateway_calls() {
    let gateway = Arc::new(ScriptedGateway::new());
    let session = Session::start(ArenaConfig::default(), Vec::new(), gateway.clone());

    session.say("Hello").await;
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert!(session.lines().is_empty());
    assert_eq!(session.transcript.notices().len(), 1);
    assert!(gateway.purposes().is_empty());

    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn stop_mid_response_cancels_and_silences() {
    let gateway = Arc::new(
        ScriptedGateway::new()
            .reply(GatewayPurpose::LeaderSelection, &leader("Kant"))
            .hang(GatewayPurpose::Response),
    );
    let session = Session::start(ArenaConfig::default(), vec![npc("Kant"), npc("Hume")], gateway.clone());

    session.say("Hello").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    session.say("stop").await;
    tokio::time::sleep(Duration::from_secs(120)).await;

    let lines = session.lines();
    assert_eq!(lines.len(), 2, "{lines:?}");
    assert_eq!(lines[1], (SenderType::System, "System".to_string(), "Response cancelled.".to_string()));
    assert_eq!(gateway.purposes(), vec![GatewayPurpose::LeaderSelection, GatewayPurpose::Response]);

    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn quiet_session_continues_then_backs_off() {
    let gateway = Arc::new(
        ScriptedGateway::new()
            .reply(
                GatewayPurpose::ContinuationSelection,
                r#"{"npcName": "Kant", "npcSystemPrompt": "philosopher", "triggerUserMessage": "Say more about duty."}"#,
            )
            .reply(GatewayPurpose::Response, "Duty is the necessity of acting from respect for the law."),
    );
    let session = Session::start(ArenaConfig::default(), vec![npc("Kant")], gateway.clone());

    tokio::time::sleep(Duration::from_secs(9)).await;

    let lines = session.lines();
    assert_eq!(lines.len(), 1, "{lines:?}");
    assert_eq!(lines[0].1, "Kant");
    assert_eq!(
        gateway.purposes(),
        vec![GatewayPurpose::ContinuationSelection, GatewayPurpose::Response]
    );
    assert_eq!(gateway.calls()[1].prompt, "Say more about duty.");

    // Next continuation is 13s out.
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(gateway.purposes().len(), 2);

    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn failed_reengagement_falls_back_to_nudge() {
    let mut config = ArenaConfig::default();
    // Push continuation past re-engagement so the nudge fires first.
    config.timing.initial_continuation = Duration::from_secs(120);
    let gateway = Arc::new(
        ScriptedGateway::new().fail(GatewayPurpose::Reengagement, GatewayError::Transport("down".into())),
    );
    let session = Session::start(config, vec![npc("Kant")], gateway.clone());

    tokio::time::sleep(Duration::from_secs(46)).await;

    let lines = session.lines();
    assert_eq!(lines, vec![(SenderType::Npc, "Kant".to_string(), "Still there?".to_string())]);

    session.close().await;
}
