#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod history;
pub mod model;
pub mod progress;
pub mod selector;
pub mod settings;
pub mod time;

pub use catalog::{CatalogError, QuestionCatalog};
pub use error::Error;
pub use history::DiscardHistory;
pub use progress::TopicProgress;
pub use selector::{OutcomeSelector, draw_question};
pub use settings::{EngineSettings, SettingsError};
pub use time::Clock;
