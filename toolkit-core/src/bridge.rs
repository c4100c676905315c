//! Synchronous entry point for async tool calls.

use std::future::Future;
use std::io;
use std::thread;

use tokio::runtime::{Builder, Handle};

/// Drives `future` to completion from synchronous code.
///
/// Outside a tokio runtime the future runs on a fresh current-thread runtime.
/// Inside one, blocking the worker is not allowed, so the future runs on a
/// scoped OS thread with its own runtime while the caller waits.
///
/// # Errors
///
/// Returns the I/O error raised when the runtime cannot be built.
///
/// # Panics
///
/// Propagates a panic raised by `future`.
pub fn block_on<F>(future: F) -> io::Result<F::Output>
where
    F: Future + Send,
    F::Output: Send,
{
    if Handle::try_current().is_err() {
        return run(future);
    }

    thread::scope(|scope| {
        scope
            .spawn(|| run(future))
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
    })
}

fn run<F: Future>(future: F) -> io::Result<F::Output> {
    let runtime = Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn runs_without_ambient_runtime() {
        let value = block_on(async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            7
        })
        .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn runs_inside_a_runtime() {
        let value = block_on(async { "inner" }).unwrap();
        assert_eq!(value, "inner");
    }
}
