mod ids;
mod outcome;
mod question;
pub mod session;
mod topic;

pub use ids::{ParseIdError, QuestionId, SessionId};
pub use outcome::{ChooseMode, Outcome};
pub use question::{Question, QuestionDraft, QuestionError};
pub use session::{FlowStep, SessionState};
pub use topic::{TopicId, UnknownTopic};
