pub mod attempt_counter;
pub mod exam;
pub mod progress;
pub mod question;
pub mod scoring;
pub mod subject;
pub mod submission;
pub mod user;

pub use attempt_counter::AttemptCounter;
pub use exam::{ExamDefinition, ExamStatus, ResolvedExam};
pub use progress::ProgressRecord;
pub use question::{QuestionDefinition, QuestionType};
pub use scoring::{DurationConfig, LevelMarks, ScoringConfig};
pub use subject::{Subject, Subtopic};
pub use submission::{
    AnswerRecord, AnswerStatus, AttemptOutcome, ReviewComment, StudentAnswer, Submission,
    SubmissionStatus,
};
pub use user::{User, UserRole};
