pub mod attempt_service;
pub mod eligibility_service;
pub mod grading;
pub mod notification_service;
pub mod review_service;
pub mod submission_service;

pub use attempt_service::AttemptService;
pub use eligibility_service::EligibilityService;
pub use notification_service::{NotificationQueue, Notifier};
pub use review_service::ReviewService;
pub use submission_service::SubmissionService;
