use secrecy::SecretString;
use std::{env, time::Duration};

const DEV_JWT_SECRET: &str = "dev_secret_key_change_in_production";

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub client_url: Option<String>,
    pub jwt_secret: SecretString,
    pub jwt_expiration_hours: i64,
    pub exam_grace_period_secs: i64,
    pub default_exam_duration_secs: i64,
    pub failure_alert_threshold: i32,
    pub transaction_max_retries: u32,
    pub notification_webhook_url: Option<String>,
}

/// Timing and alerting rules applied when an attempt is finalized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExamPolicy {
    pub grace_period_secs: i64,
    pub fallback_duration_secs: i64,
    pub failure_alert_threshold: i32,
}

impl Default for ExamPolicy {
    fn default() -> Self {
        Self {
            grace_period_secs: 60,
            fallback_duration_secs: 3600,
            failure_alert_threshold: 5,
        }
    }
}

/// Bounded exponential backoff for transactions that hit transient contention.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
        }
    }
}

fn parsed_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let policy = ExamPolicy::default();
        Self {
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017/?replicaSet=rs0".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME")
                .unwrap_or_else(|_| "exam-portal-local".to_string()),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: parsed_var("WEB_SERVER_PORT", 8080),
            client_url: env::var("CLIENT_URL").ok().filter(|u| !u.is_empty()),
            jwt_secret: SecretString::from(
                env::var("JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string()),
            ),
            jwt_expiration_hours: parsed_var("JWT_EXPIRATION_HOURS", 24),
            exam_grace_period_secs: parsed_var("EXAM_GRACE_PERIOD_SECS", policy.grace_period_secs),
            default_exam_duration_secs: parsed_var(
                "DEFAULT_EXAM_DURATION_SECS",
                policy.fallback_duration_secs,
            ),
            failure_alert_threshold: parsed_var(
                "FAILURE_ALERT_THRESHOLD",
                policy.failure_alert_threshold,
            ),
            transaction_max_retries: parsed_var(
                "TRANSACTION_MAX_RETRIES",
                RetryPolicy::default().max_attempts,
            ),
            notification_webhook_url: env::var("NOTIFICATION_WEBHOOK_URL")
                .ok()
                .filter(|u| !u.is_empty()),
        }
    }

    pub fn exam_policy(&self) -> ExamPolicy {
        ExamPolicy {
            grace_period_secs: self.exam_grace_period_secs,
            fallback_duration_secs: self.default_exam_duration_secs,
            failure_alert_threshold: self.failure_alert_threshold,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.transaction_max_retries.max(1),
            ..RetryPolicy::default()
        }
    }

    /// Validate that production-critical configuration is set
    /// Panics if required secrets are using default values
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        let jwt_secret = self.jwt_secret.expose_secret();

        if jwt_secret == DEV_JWT_SECRET {
            panic!(
                "FATAL: JWT_SECRET is using default value! Set JWT_SECRET environment variable to a secure random string."
            );
        }

        if jwt_secret.len() < 32 {
            panic!(
                "FATAL: JWT_SECRET is too short ({}). Must be at least 32 characters for security.",
                jwt_secret.len()
            );
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "exam-portal-test".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            client_url: None,
            jwt_secret: SecretString::from("test_jwt_secret_key".to_string()),
            jwt_expiration_hours: 1,
            exam_grace_period_secs: 60,
            default_exam_duration_secs: 3600,
            failure_alert_threshold: 5,
            transaction_max_retries: 3,
            notification_webhook_url: None,
        }
    }
}
