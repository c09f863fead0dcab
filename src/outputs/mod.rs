//! Where the kernel's side effects become visible.

pub mod text;
pub mod transcript;

pub use text::ConsolePresenter;
pub use transcript::Transcript;

use crate::kernel::message::ChatMessage;

pub trait Presenter: Send {
    /// A transcript message was added or finalized.
    fn render(&mut self, message: &ChatMessage);

    /// Out-of-band notice (busy, stopped, no NPCs).
    fn notice(&mut self, text: &str);

    /// Current busy stage. Optional.
    fn status(&mut self, _label: &str) {}
}
