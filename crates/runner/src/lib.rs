//! Runs the gateway's long-lived process with graceful shutdown.
//!
//! The runner owns the lifecycle around the message-processing loop:
//! - cancels the process on SIGTERM/SIGINT
//! - executes cleanup closers afterward, regardless of process outcome
//! - maps the outcome to an exit code (0 graceful, 1 on process error)
//!
//! # Example
//!
//! ```no_run
//! use voltbridge_runner::Runner;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let code = Runner::new()
//!         .with_process(|ctx| async move {
//!             ctx.cancelled().await;
//!             tracing::info!("process stopping gracefully");
//!             Ok(())
//!         })
//!         .with_closer(|| async move {
//!             tracing::info!("cleaning up resources");
//!             Ok(())
//!         })
//!         .with_closer_timeout(Duration::from_secs(5))
//!         .run()
//!         .await;
//!     std::process::exit(code);
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Type alias for the app process function.
/// Takes a cancellation token and resolves to `Result<(), anyhow::Error>`.
pub type AppProcess = Box<
    dyn FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>>
        + Send,
>;

/// Type alias for a closer function.
pub type Closer =
    Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>> + Send>;

/// Lifecycle wrapper for the gateway process.
///
/// The process runs until it finishes, fails, or a shutdown signal arrives;
/// closers then execute (with a timeout) no matter how the process ended, so
/// resources like the database pool are released on every exit path.
pub struct Runner {
    process: Option<AppProcess>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    cancellation_token: CancellationToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        Self {
            process: None,
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Sets the app process. The process should observe the token and return
    /// `Ok(())` when cancelled.
    pub fn with_process<F, Fut>(mut self, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.process = Some(Box::new(|token| Box::pin(process(token))));
        self
    }

    /// Adds a closer, executed after the process has stopped. All closers
    /// attempt to run even if some fail.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    /// Sets the timeout for executing closers. Default is 10 seconds.
    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Sets a custom cancellation token, allowing external shutdown control.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Runs the process to completion and returns the exit code:
    /// 0 after a graceful stop, 1 if the process failed or panicked.
    pub async fn run(self) -> i32 {
        let token = self.cancellation_token;

        let signal_token = token.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("received shutdown signal");
                    signal_token.cancel();
                }
                Err(err) => {
                    tracing::error!("error setting up signal handler: {}", err);
                }
            }
        });

        #[cfg(unix)]
        {
            let sigterm_token = token.clone();
            tokio::spawn(async move {
                use tokio::signal::unix::{SignalKind, signal};
                match signal(SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                        tracing::info!("received SIGTERM signal");
                        sigterm_token.cancel();
                    }
                    Err(err) => {
                        tracing::error!("error setting up SIGTERM handler: {}", err);
                    }
                }
            });
        }

        let failed = match self.process {
            Some(process) => {
                let handle = tokio::spawn(process(token.clone()));
                match handle.await {
                    Ok(Ok(())) => {
                        tracing::debug!("app process completed");
                        false
                    }
                    Ok(Err(err)) => {
                        tracing::error!("app process error: {:#}", err);
                        true
                    }
                    Err(err) => {
                        tracing::error!("app process panicked: {}", err);
                        true
                    }
                }
            }
            None => false,
        };

        // Make sure helpers observing the token stop too.
        token.cancel();

        if !self.closers.is_empty() {
            tracing::info!("running closers with timeout of {:?}", self.closer_timeout);
            let closer_result =
                tokio::time::timeout(self.closer_timeout, Self::run_closers(self.closers)).await;
            match closer_result {
                Ok(()) => tracing::info!("all closers completed"),
                Err(_) => tracing::error!("closers timed out after {:?}", self.closer_timeout),
            }
        }

        if failed { 1 } else { 0 }
    }

    /// Runs all closers concurrently.
    async fn run_closers(closers: Vec<Closer>) {
        let mut closer_set = JoinSet::new();

        for closer in closers {
            closer_set.spawn(async move { closer().await });
        }

        while let Some(result) = closer_set.join_next().await {
            match result {
                Ok(Ok(())) => tracing::debug!("closer completed"),
                Ok(Err(err)) => tracing::error!("closer error: {:#}", err),
                Err(err) => tracing::error!("closer panicked: {}", err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    #[tokio::test]
    async fn graceful_stop_exits_zero_and_runs_closers() {
        let closer_called = Arc::new(AtomicBool::new(false));
        let closer_flag = closer_called.clone();

        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let code = Runner::new()
            .with_process(|ctx| async move {
                ctx.cancelled().await;
                Ok(())
            })
            .with_closer(move || {
                let flag = closer_flag.clone();
                async move {
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                }
            })
            .with_cancellation_token(token)
            .with_closer_timeout(Duration::from_secs(5))
            .run()
            .await;

        assert_eq!(code, 0);
        assert!(closer_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn process_error_exits_nonzero_but_still_closes() {
        let closer_called = Arc::new(AtomicBool::new(false));
        let closer_flag = closer_called.clone();

        let code = Runner::new()
            .with_process(|_ctx| async move { Err(anyhow::anyhow!("connection lost")) })
            .with_closer(move || {
                let flag = closer_flag.clone();
                async move {
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                }
            })
            .run()
            .await;

        assert_eq!(code, 1);
        assert!(closer_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn all_closers_run_even_when_one_fails() {
        let runs = Arc::new(AtomicU32::new(0));

        let first = runs.clone();
        let second = runs.clone();
        let code = Runner::new()
            .with_closer(move || {
                let counter = first.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(anyhow::anyhow!("cleanup failed"))
                }
            })
            .with_closer(move || {
                let counter = second.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .run()
            .await;

        assert_eq!(code, 0);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
