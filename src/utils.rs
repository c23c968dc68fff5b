use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::Error;

/// How long a single request may spend talking to the stores.
#[derive(Copy, Clone, Debug)]
pub struct RequestTimeout(pub Duration);

/// Runs `operation` until it finishes or `timeout` elapses.
///
/// On expiry the operation is dropped where it stands. Nothing it already
/// applied to the stores is rolled back.
pub async fn with_deadline<F, T>(timeout: Duration, operation: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => {
            warn!(?timeout, "request deadline exceeded");
            Err(Error::DeadlineExceeded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finished_operations_pass_through() {
        let result = with_deadline(Duration::from_secs(1), async { Ok(5) }).await;

        assert_eq!(result.unwrap(), 5);
    }

    #[tokio::test]
    async fn operation_errors_pass_through() {
        let result: Result<(), Error> =
            with_deadline(Duration::from_secs(1), async { Err(Error::PathDoesNotExist) }).await;

        assert_eq!(result.unwrap_err(), Error::PathDoesNotExist);
    }

    #[tokio::test]
    async fn slow_operations_exceed_the_deadline() {
        let result = with_deadline(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert_eq!(result.unwrap_err(), Error::DeadlineExceeded);
    }
}
