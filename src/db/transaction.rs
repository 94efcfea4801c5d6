use std::future::Future;

use mongodb::ClientSession;

use crate::{config::RetryPolicy, errors::AppResult};

/// Commits the session's transaction when `result` is `Ok`, aborts it otherwise.
///
/// The work runs against the session before this is called, so the caller keeps
/// ownership of the borrow and no closure has to hold the session across awaits.
pub async fn commit_or_abort<T>(session: &mut ClientSession, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            session.commit_transaction().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(abort_err) = session.abort_transaction().await {
                log::error!("Failed to abort transaction after '{}': {}", err, abort_err);
            }
            Err(err)
        }
    }
}

/// Runs `operation` until it succeeds, fails with a non-transient error, or the
/// policy's attempts are used up. Each call must be a whole transaction.
pub async fn retry_transaction<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.backoff(attempt);
                log::warn!(
                    "Transient transaction failure (attempt {}/{}), retrying in {:?}: {}",
                    attempt,
                    policy.max_attempts,
                    delay,
                    err
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use std::{
        sync::atomic::{AtomicU32, Ordering},
        time::Duration,
    };

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result = retry_transaction(&fast_policy(3), move || async move {
            let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call < 3 {
                Err(AppError::TransientStorage("write conflict".into()))
            } else {
                Ok(call)
            }
        })
        .await;

        assert_eq!(result.expect("third call succeeds"), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: AppResult<()> = retry_transaction(&fast_policy(3), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::TransientStorage("write conflict".into()))
        })
        .await;

        assert!(matches!(result, Err(AppError::TransientStorage(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: AppResult<()> = retry_transaction(&fast_policy(5), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::NoActiveSession)
        })
        .await;

        assert!(matches!(result, Err(AppError::NoActiveSession)));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
