use crossterm::event::Event;
use ratatui::{Frame, layout::Rect};

mod editor;

pub use editor::EditorWidget;

pub trait Widget: Send + Sync {
    /// Start background work and initial loading. `&self` so the widget can
    /// live behind an `Arc`; state goes through interior mutability.
    fn start(&self) {}

    fn render(&self, frame: &mut Frame, area: Rect);

    /// Handle input events. Returns true if the event was handled.
    fn handle_event(&self, _event: &Event) -> bool {
        false
    }
}
