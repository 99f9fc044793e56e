//! Process-wide default network timeout.
//!
//! `connect` honours the default timeout when one is set. Code that needs a bounded connect
//! acquires a `ScopedTimeout`, which installs its value and puts the previous one back when
//! dropped, on every exit path. Scopes are serialized, so two probes never interleave their
//! overrides.

use parking_lot::RwLock;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, OwnedMutexGuard};

static DEFAULT_TIMEOUT: RwLock<Option<Duration>> = parking_lot::const_rwlock(None);

static SCOPE_LOCK: LazyLock<Arc<Mutex<()>>> = LazyLock::new(|| Arc::new(Mutex::new(())));

/// The current default, `None` meaning unbounded.
pub fn default_timeout() -> Option<Duration> {
    *DEFAULT_TIMEOUT.read()
}

/// Replaces the default and returns the previous value.
pub fn set_default_timeout(timeout: Option<Duration>) -> Option<Duration> {
    std::mem::replace(&mut *DEFAULT_TIMEOUT.write(), timeout)
}

/// Guard over an overridden default timeout.
pub struct ScopedTimeout {
    previous: Option<Duration>,
    _scope: OwnedMutexGuard<()>,
}

impl ScopedTimeout {
    pub async fn acquire(timeout: Duration) -> Self {
        let scope = SCOPE_LOCK.clone().lock_owned().await;
        let previous = set_default_timeout(Some(timeout));
        tracing::trace!(?timeout, ?previous, "Default network timeout overridden");
        Self {
            previous,
            _scope: scope,
        }
    }

    pub fn previous(&self) -> Option<Duration> {
        self.previous
    }
}

impl Drop for ScopedTimeout {
    fn drop(&mut self) {
        // Runs before the scope lock is released.
        set_default_timeout(self.previous);
        tracing::trace!(restored = ?self.previous, "Default network timeout restored");
    }
}

/// TCP connect bounded by the current default timeout.
pub async fn connect(address: SocketAddr) -> io::Result<TcpStream> {
    connect_with_timeout(address, default_timeout()).await
}

pub async fn connect_with_timeout(address: SocketAddr, timeout: Option<Duration>) -> io::Result<TcpStream> {
    let connecting = TcpStream::connect(address);
    match timeout {
        Some(limit) => tokio::time::timeout(limit, connecting)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, format!("connect to {} timed out", address)))?,
        None => connecting.await,
    }
}
