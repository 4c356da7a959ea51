//! Lazily opened, shared database connection.
//!
//! A [`ConnectionManager`] owns at most one open [`Connection`]. The first
//! caller of [`ConnectionManager::open`] starts the open on a spawned task;
//! callers arriving while it is in flight subscribe to the same attempt and
//! all observe the same outcome. A failed attempt is not cached: the manager
//! goes back to [`ConnectionState::Unopened`] and the next call starts over.

use std::{
    fmt,
    path::Path,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use log::{debug, warn};
use tokio::{sync::watch, task};

use crate::{
    db::{Connection, ConnectionConfig, Upgrade},
    error::OpenError,
};

type OpenOutcome = Result<Arc<Connection>, OpenError>;

/// Observable lifecycle of the managed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and no attempt in flight
    Unopened,
    /// An open attempt is in flight
    Opening,
    /// The in-flight attempt is running the schema upgrade
    Migrating,
    /// A connection is cached and handed to every caller
    Ready,
}

enum Phase {
    Unopened,
    Opening {
        attempt: u64,
        outcome: watch::Receiver<Option<OpenOutcome>>,
    },
    Ready(Arc<Connection>),
}

/// Opens a versioned database once and shares the connection.
pub struct ConnectionManager {
    config: ConnectionConfig,
    schema: Arc<dyn Upgrade>,
    phase: Mutex<Phase>,
    migrating: Arc<AtomicBool>,
    attempts: AtomicU64,
    open_count: AtomicUsize,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("open_count", &self.open_count())
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    pub fn new(config: ConnectionConfig, schema: Arc<dyn Upgrade>) -> Self {
        Self {
            config,
            schema,
            phase: Mutex::new(Phase::Unopened),
            migrating: Arc::new(AtomicBool::new(false)),
            attempts: AtomicU64::new(0),
            open_count: AtomicUsize::new(0),
        }
    }

    /// Configuration the database is opened with.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Returns the open connection, opening (and migrating) the database
    /// first if needed.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn open(self: &Arc<Self>) -> Result<Arc<Connection>, OpenError> {
        let mut outcome = {
            let mut phase = self.lock_phase();
            match &*phase {
                Phase::Ready(connection) => return Ok(Arc::clone(connection)),
                Phase::Opening { outcome, .. } => {
                    debug!("Joining in-flight open of '{}'", self.config.name);
                    outcome.clone()
                }
                Phase::Unopened => {
                    let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    let (sender, receiver) = watch::channel(None);
                    *phase = Phase::Opening {
                        attempt,
                        outcome: receiver.clone(),
                    };
                    self.spawn_open(attempt, sender);
                    receiver
                }
            }
        };

        let settled = outcome
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|settled| settled.clone());
        settled.unwrap_or_else(|| {
            Err(OpenError::Refused {
                name: self.config.name.clone(),
                reason: "open task ended without a result".to_string(),
            })
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        match &*self.lock_phase() {
            Phase::Unopened => ConnectionState::Unopened,
            Phase::Opening { .. } if self.migrating.load(Ordering::SeqCst) => {
                ConnectionState::Migrating
            }
            Phase::Opening { .. } => ConnectionState::Opening,
            Phase::Ready(_) => ConnectionState::Ready,
        }
    }

    /// Number of successful physical opens so far.
    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    /// Drops the cached connection; returns whether one was cached.
    ///
    /// Operations already holding the connection finish on it. An attempt in
    /// flight still resolves for its waiters but its result is not cached.
    pub fn close(&self) -> bool {
        let previous = std::mem::replace(&mut *self.lock_phase(), Phase::Unopened);
        let was_ready = matches!(previous, Phase::Ready(_));
        if was_ready {
            debug!("Closed connection to '{}'", self.config.name);
        }
        was_ready
    }

    fn spawn_open(self: &Arc<Self>, attempt: u64, sender: watch::Sender<Option<OpenOutcome>>) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = manager.open_blocking().await;
            manager.settle(attempt, &outcome);
            sender.send_replace(Some(outcome));
        });
    }

    async fn open_blocking(&self) -> OpenOutcome {
        self.migrating.store(false, Ordering::SeqCst);
        let config = self.config.clone();
        let schema = Arc::clone(&self.schema);
        let migrating = Arc::clone(&self.migrating);

        let opened = task::spawn_blocking(move || {
            Connection::open(&config, schema.as_ref(), &|| {
                migrating.store(true, Ordering::SeqCst);
            })
        })
        .await;

        match opened {
            Ok(Ok(connection)) => {
                self.open_count.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(connection))
            }
            Ok(Err(e)) => {
                warn!("Failed to open database '{}': {}", self.config.name, e);
                Err(e)
            }
            Err(e) => Err(OpenError::Refused {
                name: self.config.name.clone(),
                reason: format!("Task join error: {e}"),
            }),
        }
    }

    fn settle(&self, attempt: u64, outcome: &OpenOutcome) {
        let mut phase = self.lock_phase();
        let current = matches!(&*phase, Phase::Opening { attempt: a, .. } if *a == attempt);
        if !current {
            return;
        }
        *phase = match outcome {
            Ok(connection) => Phase::Ready(Arc::clone(connection)),
            Err(_) => Phase::Unopened,
        };
        self.migrating.store(false, Ordering::SeqCst);
    }

    fn lock_phase(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
