use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        AttemptRepository, CatalogRepository, MongoAttemptRepository, MongoCatalogRepository,
        MongoProgressRepository, MongoUserRepository, ProgressRepository, UserRepository,
    },
    services::{
        notification_service::{notifier_from_config, spawn_notification_worker},
        AttemptService, EligibilityService, NotificationQueue, Notifier, ReviewService,
        SubmissionService,
    },
};

/// Storage handles the services are built on.
#[derive(Clone)]
pub struct Repositories {
    pub catalog: Arc<dyn CatalogRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub users: Arc<dyn UserRepository>,
}

#[derive(Clone)]
pub struct AppState {
    pub eligibility_service: Arc<EligibilityService>,
    pub attempt_service: Arc<AttemptService>,
    pub submission_service: Arc<SubmissionService>,
    pub review_service: Arc<ReviewService>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub db: Option<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let catalog = Arc::new(MongoCatalogRepository::new(&db));
        catalog.ensure_indexes().await?;
        catalog.ensure_defaults().await?;

        let progress = Arc::new(MongoProgressRepository::new(&db));
        progress.ensure_indexes().await?;

        let attempts = Arc::new(MongoAttemptRepository::new(&db));
        attempts.ensure_indexes().await?;

        let users = Arc::new(MongoUserRepository::new(&db));

        let notifier = notifier_from_config(config.notification_webhook_url.as_deref());
        let repositories = Repositories {
            catalog,
            progress,
            attempts,
            users,
        };

        let mut state = Self::from_repositories(config, repositories, notifier);
        state.db = Some(db);
        Ok(state)
    }

    /// Wires the services over the given repositories and starts the alert
    /// worker. Must be called from inside a tokio runtime.
    pub fn from_repositories(
        config: Config,
        repositories: Repositories,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let policy = config.exam_policy();
        let retry = config.retry_policy();

        let (notifications, receiver) = NotificationQueue::new();
        spawn_notification_worker(receiver, repositories.users.clone(), notifier);

        let eligibility_service = Arc::new(EligibilityService::new(
            repositories.catalog.clone(),
            repositories.progress.clone(),
        ));
        let attempt_service = Arc::new(AttemptService::new(
            eligibility_service.clone(),
            repositories.catalog.clone(),
            repositories.attempts.clone(),
            policy,
            retry,
        ));
        let submission_service = Arc::new(SubmissionService::new(
            repositories.catalog.clone(),
            repositories.attempts.clone(),
            notifications,
            policy,
            retry,
        ));
        let review_service = Arc::new(ReviewService::new(repositories.attempts.clone()));

        Self {
            eligibility_service,
            attempt_service,
            submission_service,
            review_service,
            catalog: repositories.catalog,
            db: None,
            config: Arc::new(config),
        }
    }
}
