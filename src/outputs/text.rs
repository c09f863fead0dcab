use std::io::Write;

use super::Presenter;
use crate::kernel::message::{ChatMessage, SenderType};

/// Line-oriented console rendering.
pub struct ConsolePresenter<W: Write + Send> {
    out: W,
}

impl ConsolePresenter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: std::io::stdout() }
    }
}

impl<W: Write + Send> ConsolePresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        // Write failures on the console are ignored.
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }
}

pub fn format_message(message: &ChatMessage) -> String {
    match (message.sender_type, message.is_loading) {
        (_, true) => format!("  ({} is thinking...)", message.sender_name),
        (SenderType::System, _) => format!("  * {}", message.text),
        (SenderType::User, _) => format!("you> {}", message.text),
        (SenderType::Npc, _) => format!("[{}] {}", message.sender_name, message.text),
    }
}

impl<W: Write + Send> Presenter for ConsolePresenter<W> {
    fn render(&mut self, message: &ChatMessage) {
        // The console already echoes what the user typed.
        if message.sender_type == SenderType::User {
            return;
        }
        let line = format_message(message);
        self.line(&line);
    }

    fn notice(&mut self, text: &str) {
        self.line(&format!("-- {text}"));
    }

    fn status(&mut self, label: &str) {
        self.line(&format!("   ...{label}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::NpcProfile;

    #[test]
    fn renders_npc_and_skips_user_echo() {
        let kant = NpcProfile::new("Kant", "philosopher");
        let mut console = ConsolePresenter::new(Vec::new());

        console.render(&ChatMessage::user("hello"));
        console.render(&ChatMessage::placeholder(&kant, None));
        console.render(&ChatMessage::npc(&kant, "Sapere aude."));

        let out = String::from_utf8(console.into_inner()).unwrap();
        assert_eq!(out, "  (Kant is thinking...)\n[Kant] Sapere aude.\n");
    }
}
