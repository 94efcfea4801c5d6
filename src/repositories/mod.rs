pub mod attempt_repository;
pub mod catalog_repository;
pub mod progress_repository;
pub mod user_repository;

pub use attempt_repository::{AttemptRepository, GradeFn, MongoAttemptRepository};
pub use catalog_repository::{CatalogRepository, MongoCatalogRepository};
pub use progress_repository::{MongoProgressRepository, ProgressRepository};
pub use user_repository::{MongoUserRepository, UserRepository};
