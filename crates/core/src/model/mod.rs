mod body;
mod catalog;
mod ids;
mod lesson;
mod module;
mod profile;
mod question;

pub use body::HtmlBody;
pub use catalog::Catalog;
pub use ids::{Identity, IdentityId, LessonId, ModuleId, ParseIdError, QuestionId};
pub use lesson::Lesson;
pub use module::{Content, Descriptor, Module, Test};
pub use profile::{ProgressSnapshot, ResumePoint, UserProfile};
pub use question::{Question, QuestionError};
