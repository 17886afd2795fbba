// Session recovery
//
// Controllers drop cookie sessions on their own schedule (restarts, idle
// expiry, admin logouts). `SessionGuard` runs each call once without
// synchronization; only when a call comes back `SessionExpired` does it
// take a lock, log in again (at most once per expiry, and no more often
// than `MIN_REAUTH_INTERVAL`), and replay the call a single time.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Error;

/// Minimum spacing between two completed re-logins.
pub const MIN_REAUTH_INTERVAL: Duration = Duration::from_secs(5);

/// Something that can establish a fresh controller session.
///
/// The login either fully succeeds or fails; a failed login must leave
/// the delegate usable for a later attempt.
#[async_trait]
pub trait Relogin: Send + Sync {
    async fn relogin(&self) -> Result<(), Error>;
}

/// Re-authenticating wrapper around a session-based delegate.
///
/// One guard per configured connection. Cheap to share behind an `Arc`;
/// all methods take `&self`.
pub struct SessionGuard<D> {
    delegate: D,
    /// Completion instant of the last successful re-login; `None` until
    /// the first one. Only advances, and only while the lock is held.
    last_auth: Mutex<Option<Instant>>,
}

impl<D: Relogin> SessionGuard<D> {
    pub fn new(delegate: D) -> Self {
        Self {
            delegate,
            last_auth: Mutex::new(None),
        }
    }

    /// The wrapped delegate, for building operations.
    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    /// When the last re-login completed, if any.
    pub async fn last_reauth(&self) -> Option<Instant> {
        *self.last_auth.lock().await
    }

    /// Run `operation`, recovering once from an expired session.
    ///
    /// Returns the first outcome unchanged unless it is
    /// [`Error::is_unauthorized`]. In that case the session is renewed
    /// (or a renewal that finished after the failure is reused) and the
    /// operation runs exactly one more time; its outcome is returned as-is.
    /// A failed renewal yields [`Error::ReauthenticationFailed`] and the
    /// operation is not replayed.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        self.run(None, operation).await
    }

    /// Like [`execute`](Self::execute), but every wait (the call, the lock,
    /// the re-login spacing, the re-login, the replay) gives up with
    /// [`Error::Cancelled`] as soon as `cancel` fires.
    pub async fn execute_cancellable<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        operation: F,
    ) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        self.run(Some(cancel), operation).await
    }

    async fn run<T, F, Fut>(
        &self,
        cancel: Option<&CancellationToken>,
        mut operation: F,
    ) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        match until_cancelled(cancel, operation()).await? {
            Err(e) if e.is_unauthorized() => {}
            outcome => return outcome,
        }

        // Taken before the lock so a re-login that finishes while we queue
        // is recognized as newer than this failure.
        let failed_at = Instant::now();
        self.reauthenticate(cancel, failed_at).await?;

        until_cancelled(cancel, operation()).await?
    }

    async fn reauthenticate(
        &self,
        cancel: Option<&CancellationToken>,
        failed_at: Instant,
    ) -> Result<(), Error> {
        let mut last_auth = until_cancelled(cancel, self.last_auth.lock()).await?;

        if let Some(at) = *last_auth {
            if at > failed_at {
                debug!("session already renewed by a concurrent caller");
                return Ok(());
            }
            let ready_at = at + MIN_REAUTH_INTERVAL;
            if ready_at > Instant::now() {
                debug!(
                    wait = ?ready_at.saturating_duration_since(Instant::now()),
                    "re-login attempted too soon, waiting"
                );
                until_cancelled(cancel, tokio::time::sleep_until(ready_at)).await?;
            }
        }

        debug!("session expired, logging in again");
        until_cancelled(cancel, self.delegate.relogin())
            .await?
            .map_err(|source| Error::ReauthenticationFailed {
                source: Box::new(source),
            })?;

        *last_auth = Some(Instant::now());
        debug!("re-login succeeded");
        Ok(())
    }
}

/// Await `fut`, or fail with `Error::Cancelled` once `cancel` fires.
async fn until_cancelled<F: Future>(
    cancel: Option<&CancellationToken>,
    fut: F,
) -> Result<F::Output, Error> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            () = token.cancelled() => Err(Error::Cancelled),
            out = fut => Ok(out),
        },
        None => Ok(fut.await),
    }
}
