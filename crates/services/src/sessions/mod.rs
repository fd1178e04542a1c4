mod manager;
mod progress;
mod view;

// Public API of the session subsystem.
pub use manager::{RollResult, SessionManager};
pub use progress::TopicStatus;
pub use view::{DiscardView, EngineView};
