//! Cooperative cancellation of in-flight store and image work.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Runs `future` unless `cancel` fires first.
///
/// Checks the token before polling, so an already-cancelled token never
/// starts the work.
pub(crate) async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    future: F,
) -> Result<F::Output> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        output = future => Ok(output),
    }
}
