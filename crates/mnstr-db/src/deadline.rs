//! Caller-supplied deadlines for storage operations.
//!
//! Dropping a sqlx future mid-flight is safe: an open database transaction
//! is rolled back when its handle is dropped, so a timed-out operation
//! leaves nothing half-applied.

use std::future::Future;
use std::time::Duration;

use crate::error::DbError;

/// Run `operation` under `deadline`.
///
/// # Errors
///
/// Returns [`DbError::Timeout`] if the deadline elapses first; otherwise
/// whatever the operation returned.
pub async fn within<F, T>(
    name: &'static str,
    deadline: Duration,
    operation: F,
) -> Result<T, DbError>
where
    F: Future<Output = Result<T, DbError>>,
{
    tokio::time::timeout(deadline, operation)
        .await
        .unwrap_or_else(|_elapsed| {
            let deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(operation = name, deadline_ms, "Deadline elapsed");
            Err(DbError::Timeout {
                operation: name,
                deadline_ms,
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fast_operation_passes_through() {
        let result = within("noop", Duration::from_secs(1), async { Ok::<_, DbError>(7) }).await;
        assert_eq!(result.ok(), Some(7));
    }

    #[tokio::test]
    async fn inner_error_is_preserved() {
        let result: Result<(), DbError> = within("fails", Duration::from_secs(1), async {
            Err(DbError::Validation("bad".to_owned()))
        })
        .await;
        assert!(matches!(result, Err(DbError::Validation(_))));
    }

    #[tokio::test]
    async fn slow_operation_times_out() {
        let result: Result<(), DbError> = within(
            "stuck",
            Duration::from_millis(50),
            std::future::pending::<Result<(), DbError>>(),
        )
        .await;
        assert!(matches!(
            result,
            Err(DbError::Timeout {
                operation: "stuck",
                deadline_ms: 50
            })
        ));
    }
}
