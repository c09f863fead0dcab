use super::event::InputEvent;

const STOP_WORD: &str = "stop";

/// How the kernel reads one line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Abort the running turn and silence the NPCs.
    Stop,
    Message(String),
    Blank,
}

pub fn classify(input: &InputEvent) -> InputCommand {
    let text = input.content.trim();
    if text.is_empty() {
        InputCommand::Blank
    } else if is_stop_command(text) {
        InputCommand::Stop
    } else {
        InputCommand::Message(text.to_string())
    }
}

pub fn is_stop_command(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(STOP_WORD)
}
