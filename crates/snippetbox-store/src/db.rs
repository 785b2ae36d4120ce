// ABOUTME: Shared SQLite handle used by every store, with schema setup and blocking-call plumbing.
// ABOUTME: Store calls run on the blocking pool and are bounded by a per-call timeout.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rusqlite::{Connection, InterruptHandle};

use crate::error::StoreError;

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS snippets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        created TEXT NOT NULL,
        expires TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_snippets_expires ON snippets(expires);

    CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        expiry TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_sessions_expiry ON sessions(expiry);
";

/// A cloneable handle to the application database.
///
/// SQLite allows one writer at a time, so a single connection behind a mutex
/// serves all requests. Clones share the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    interrupt: Arc<InterruptHandle>,
    timeout: Duration,
}

impl Database {
    /// Open or create the database at `path` and ensure the schema exists.
    /// `:memory:` opens a private in-memory database.
    pub fn open(path: impl AsRef<Path>, timeout: Duration) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = if path == Path::new(":memory:") {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| StoreError::failure(format!("failed to open database {}", path.display()), e))?;

        Self::init(conn, timeout)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::failure("failed to open in-memory database", e))?;
        Self::init(conn, DEFAULT_QUERY_TIMEOUT)
    }

    fn init(conn: Connection, timeout: Duration) -> Result<Self, StoreError> {
        conn.busy_timeout(timeout)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        tracing::debug!(?timeout, "database schema ready");

        Ok(Self {
            interrupt: Arc::new(conn.get_interrupt_handle()),
            conn: Arc::new(Mutex::new(conn)),
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `f` against the connection on the blocking pool, inside a transaction.
    ///
    /// The caller gets `Failure` if the call does not finish within the
    /// configured timeout. A call that is given up on, by timeout or by
    /// dropping the returned future, never commits: if it is still queued for
    /// the lock it is skipped, and if it is running its statement is
    /// interrupted and the transaction rolled back. Once the commit has
    /// started the caller waits for it and gets its real outcome.
    pub(crate) async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let call = Arc::new(Call::default());
        let _abandon_on_drop = AbandonOnDrop {
            call: Arc::clone(&call),
            interrupt: Arc::clone(&self.interrupt),
        };

        let conn = Arc::clone(&self.conn);
        let worker = Arc::clone(&call);
        let mut task = tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| StoreError::failure_msg("database connection lock poisoned"))?;
            if !worker.advance(Phase::Queued, Phase::Running) {
                return Err(StoreError::failure_msg(format!("{op}: abandoned before start")));
            }
            // Declared after `conn`, so the phase settles while the lock is still held.
            let _finished = FinishOnExit(&worker);

            let tx = conn.unchecked_transaction()?;
            let out = f(&tx)?;
            if !worker.advance(Phase::Running, Phase::Committing) {
                return Err(StoreError::failure_msg(format!("{op}: abandoned before commit")));
            }
            tx.commit()?;
            Ok(out)
        });

        let joined = match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(joined) => joined,
            Err(elapsed) => {
                if call.abandon(&self.interrupt) {
                    tracing::warn!(op, timeout = ?self.timeout, "store call timed out");
                    return Err(StoreError::failure(format!("{op}: timed out"), elapsed));
                }
                tracing::debug!(op, "store call passed its timeout while committing");
                task.await
            }
        };

        joined.map_err(|e| StoreError::failure(format!("{op}: blocking task failed"), e))?
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Queued,
    Running,
    Committing,
    Finished,
    Abandoned,
}

/// Shared between a store call and its blocking worker to agree on whether
/// the work still counts.
#[derive(Debug, Default)]
struct Call {
    phase: Mutex<Phase>,
}

impl Call {
    fn lock(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn advance(&self, from: Phase, to: Phase) -> bool {
        let mut phase = self.lock();
        if *phase != from {
            return false;
        }
        *phase = to;
        true
    }

    /// Give up on the call. Returns false if it is already committing or
    /// done, in which case its outcome stands.
    fn abandon(&self, interrupt: &InterruptHandle) -> bool {
        let mut phase = self.lock();
        match *phase {
            Phase::Queued => {
                *phase = Phase::Abandoned;
                true
            }
            Phase::Running => {
                // Running means the worker holds the connection, so only its
                // statement can be interrupted.
                *phase = Phase::Abandoned;
                interrupt.interrupt();
                true
            }
            Phase::Abandoned => true,
            Phase::Committing | Phase::Finished => false,
        }
    }
}

struct FinishOnExit<'a>(&'a Call);

impl Drop for FinishOnExit<'_> {
    fn drop(&mut self) {
        let mut phase = self.0.lock();
        if matches!(*phase, Phase::Running | Phase::Committing) {
            *phase = Phase::Finished;
        }
    }
}

struct AbandonOnDrop {
    call: Arc<Call>,
    interrupt: Arc<InterruptHandle>,
}

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        self.call.abandon(&self.interrupt);
    }
}
