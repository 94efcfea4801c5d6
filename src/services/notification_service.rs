use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Submission, UserRole},
    repositories::UserRepository,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlertMessage {
    pub recipients: Vec<String>,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Outbound delivery channel for evaluator alerts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &AlertMessage) -> AppResult<()>;
}

/// Used when no webhook is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &AlertMessage) -> AppResult<()> {
        log::info!(
            "Alert '{}' for {} recipient(s): {}",
            message.subject,
            message.recipients.len(),
            message.text
        );
        Ok(())
    }
}

/// Posts the alert as JSON to an HTTP endpoint (mail relay, chat hook).
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, message: &AlertMessage) -> AppResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .map_err(|e| AppError::InternalError(format!("Webhook request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::InternalError(format!(
                "Webhook responded with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

pub fn notifier_from_config(webhook_url: Option<&str>) -> Arc<dyn Notifier> {
    match webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url)),
        None => Arc::new(LogNotifier),
    }
}

/// A failed attempt past the alert threshold, queued for the evaluators.
#[derive(Clone, Debug, PartialEq)]
pub struct FailureAlert {
    pub user_id: String,
    pub exam_id: String,
    pub attempt_number: i32,
    pub subject_name: String,
    pub subtopic_name: String,
    pub level: u8,
    pub timed_out: bool,
}

pub fn should_alert(submission: &Submission, threshold: i32) -> bool {
    !submission.pass && submission.attempt_number >= threshold
}

/// Sending half of the alert queue. Enqueueing never blocks and never fails the caller.
#[derive(Clone)]
pub struct NotificationQueue {
    sender: mpsc::UnboundedSender<FailureAlert>,
}

impl NotificationQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FailureAlert>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn enqueue(&self, alert: FailureAlert) {
        if let Err(err) = self.sender.send(alert) {
            log::warn!(
                "Dropped failure alert for user {}: worker is not running",
                err.0.user_id
            );
        }
    }
}

pub fn compose_alert_email(
    recipients: Vec<String>,
    username: &str,
    email: Option<&str>,
    alert: &FailureAlert,
) -> AlertMessage {
    let contact = email
        .map(|e| format!(" (Email: {})", e))
        .unwrap_or_default();
    let subject = format!("Student Repeated Exam Attempts: {}", username);
    let timeout_note = if alert.timed_out {
        " The latest attempt ran out of time."
    } else {
        ""
    };
    let text = format!(
        "The user {}{} has attempted the exam {} times but has not yet passed. \
         Exam Details: Subject - {}, Subtopic - {}, Level - {}.{}",
        username,
        contact,
        alert.attempt_number,
        alert.subject_name,
        alert.subtopic_name,
        alert.level,
        timeout_note
    );
    let html = format!(
        "<h2>Exam Attempt Alert</h2>\
         <p>The student <strong>{}</strong> has attempted the exam <strong>{} times</strong> but has not yet passed.</p>\
         <h3>Exam Details:</h3>\
         <ul>\
         <li><strong>Subject:</strong> {}</li>\
         <li><strong>Subtopic:</strong> {}</li>\
         <li><strong>Level:</strong> {}</li>\
         </ul>\
         {}\
         <p>Please review the student's progress.</p>",
        username,
        alert.attempt_number,
        alert.subject_name,
        alert.subtopic_name,
        alert.level,
        if alert.timed_out {
            "<p>The latest attempt ran out of time.</p>"
        } else {
            ""
        }
    );

    AlertMessage {
        recipients,
        subject,
        text,
        html,
    }
}

/// Resolves recipients and the student, then hands the alert to the notifier.
/// Returns `Ok(false)` when there is nobody to notify.
pub async fn deliver_alert(
    alert: &FailureAlert,
    users: &dyn UserRepository,
    notifier: &dyn Notifier,
) -> AppResult<bool> {
    let recipients = users.find_emails_by_role(UserRole::Evaluator).await?;
    if recipients.is_empty() {
        log::warn!(
            "No evaluators to alert about user {} on exam {}",
            alert.user_id,
            alert.exam_id
        );
        return Ok(false);
    }

    let student = users.find_by_id(&alert.user_id).await?;
    let (username, email) = match &student {
        Some(user) => (user.username.as_str(), Some(user.email.as_str())),
        None => (alert.user_id.as_str(), None),
    };

    let message = compose_alert_email(recipients, username, email, alert);
    notifier.notify(&message).await?;
    Ok(true)
}

/// Drains the queue until every sender is dropped. Delivery errors are logged and
/// the job is discarded; nothing is retried.
pub fn spawn_notification_worker(
    mut receiver: mpsc::UnboundedReceiver<FailureAlert>,
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn Notifier>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(alert) = receiver.recv().await {
            match deliver_alert(&alert, users.as_ref(), notifier.as_ref()).await {
                Ok(true) => log::info!(
                    "Sent repeated failure alert for user {} (attempt {})",
                    alert.user_id,
                    alert.attempt_number
                ),
                Ok(false) => {}
                Err(err) => log::error!(
                    "Failed to send repeated failure alert for user {}: {}",
                    alert.user_id,
                    err
                ),
            }
        }
        log::info!("Notification worker stopped");
    })
}
