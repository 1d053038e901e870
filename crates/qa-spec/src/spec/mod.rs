pub mod question;
pub mod template;

pub use question::{AskWhen, Question, QuestionFormat, RawAskWhen, SelectOption};
pub use template::TemplateQuestions;
