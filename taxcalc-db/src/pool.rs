//! Connection factory: one health-checked pool per database endpoint.
//!
//! Pools use the sqlx `Any` driver, so a `postgres://` URL and a `sqlite:`
//! URL go through the same code path.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use sqlx::any::{AnyConnectOptions, AnyPoolOptions};
use sqlx::{AnyPool, ConnectOptions};
use tracing::debug;

use crate::config::ConnectionConfig;
use crate::error::{DbError, Result};

/// Trivial round-trip used as the liveness probe
const PROBE_QUERY: &str = "SELECT 1";

/// An opened, probed connection pool bound to one [`ConnectionConfig`].
///
/// Cloning is cheap and shares the underlying pool. Only the router that
/// opened a pool closes it; executors hold clones purely for querying.
#[derive(Clone, Debug)]
pub struct DbPool {
    inner: AnyPool,
    target: Arc<str>,
    hits: Arc<AtomicU64>,
    debug: bool,
}

impl DbPool {
    /// Open a pool, apply the configured limits and run the liveness probe.
    ///
    /// # Errors
    ///
    /// `Config` for invalid settings or an unparsable URL, `Connectivity`
    /// if the endpoint cannot be reached or fails the probe.
    pub async fn open(config: &ConnectionConfig) -> Result<Self> {
        config.validate()?;
        sqlx::any::install_default_drivers();

        let target = config.redacted_url()?;
        let mut options = AnyConnectOptions::from_str(&config.url)
            .map_err(|err| DbError::from_connect(&target, err))?;
        if !config.debug {
            options = options.disable_statement_logging();
        }

        let hits = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&hits);

        let inner = AnyPoolOptions::new()
            .max_connections(config.pool_size)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_connection_lifetime)
            .acquire_timeout(config.acquire_timeout)
            // only fires when an idle connection is reused
            .before_acquire(move |_conn, _meta| {
                counter.fetch_add(1, Ordering::Relaxed);
                Box::pin(async { Ok::<_, sqlx::Error>(true) })
            })
            .connect_with(options)
            .await
            .map_err(|err| DbError::from_connect(&target, err))?;

        let pool = Self {
            inner,
            target: Arc::from(target),
            hits,
            debug: config.debug,
        };

        if let Err(err) = pool.ping().await {
            pool.inner.close().await;
            return Err(err);
        }

        if pool.debug {
            debug!(db = %pool.target, pool_size = config.pool_size, "connected to database");
        }

        Ok(pool)
    }

    /// Liveness probe. A closed pool always fails it.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query(PROBE_QUERY)
            .execute(&self.inner)
            .await
            .map(|_| ())
            .map_err(|err| DbError::connectivity(self.target(), err))
    }

    /// Close every connection in the pool.
    ///
    /// Waits for borrowed connections to be returned, so open transactions
    /// must finish first. Closing twice is a `Shutdown` error.
    pub async fn close(&self) -> Result<()> {
        if self.inner.is_closed() {
            return Err(DbError::shutdown(self.target(), "pool already closed"));
        }
        self.inner.close().await;

        if self.debug {
            debug!(db = %self.target, "closed database pool");
        }
        Ok(())
    }

    /// Credential-free endpoint label
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Number of times an idle connection was handed out by this pool
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Connections currently open (idle and in use)
    pub fn size(&self) -> u32 {
        self.inner.size()
    }

    pub(crate) fn inner(&self) -> &AnyPool {
        &self.inner
    }

    /// Debug-mode observability hook; never affects control flow.
    ///
    /// Emits the statement template with its `$n` placeholders only. Bound
    /// values are not logged, so password hashes and other arguments never
    /// reach the log output.
    pub(crate) fn trace_query(&self, sql: &str, started: Instant) {
        if self.debug {
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            debug!(
                db = %self.target,
                elapsed = %format!("{elapsed_ms:.2} ms"),
                query = sql,
                "query processed"
            );
        }
    }

    #[cfg(test)]
    pub(crate) fn set_hits(&self, hits: u64) {
        self.hits.store(hits, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::Mutex;
    use crate::testing::{missing_sqlite_url, sqlite_file_url};

    #[tokio::test]
    async fn open_probes_memory_database() {
        let pool = DbPool::open(&ConnectionConfig::new("sqlite::memory:").with_pool_size(1))
            .await
            .expect("pool creation failed");

        assert_eq!(pool.target(), "sqlite::memory:");
        assert!(!pool.is_closed());
        pool.ping().await.expect("probe failed");
        pool.close().await.expect("close failed");
    }

    #[tokio::test]
    async fn open_rejects_malformed_url() {
        let err = DbPool::open(&ConnectionConfig::new("definitely not a url"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[tokio::test]
    async fn open_rejects_unknown_scheme() {
        let err = DbPool::open(&ConnectionConfig::new("nosuchdb://localhost/app"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[tokio::test]
    async fn open_fails_for_unreachable_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let err = DbPool::open(&ConnectionConfig::new(missing_sqlite_url(&dir)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connectivity);
    }

    #[tokio::test]
    async fn reused_connections_count_as_hits() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConnectionConfig::new(sqlite_file_url(&dir, "hits.db")).with_pool_size(1);
        let pool = DbPool::open(&config).await.unwrap();

        let before = pool.hits();
        pool.ping().await.unwrap();
        pool.ping().await.unwrap();
        assert_eq!(pool.hits(), before + 2);

        pool.close().await.unwrap();
    }

    #[tokio::test]
    async fn closed_pool_fails_probe_and_second_close() {
        let pool = DbPool::open(&ConnectionConfig::new("sqlite::memory:").with_pool_size(1))
            .await
            .unwrap();
        pool.close().await.unwrap();

        let err = pool.ping().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connectivity);

        let err = pool.close().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shutdown);
    }

    #[tokio::test]
    async fn debug_hook_emits_db_elapsed_and_query() {
        let pool = DbPool::open(
            &ConnectionConfig::new("sqlite::memory:")
                .with_pool_size(1)
                .with_debug(true),
        )
        .await
        .unwrap();
        let quiet = DbPool::open(&ConnectionConfig::new("sqlite::memory:").with_pool_size(1))
            .await
            .unwrap();

        let captured = Arc::new(Mutex::new(Vec::new()));
        let writer = CaptureWriter(Arc::clone(&captured));
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            pool.trace_query("SELECT name FROM items WHERE id = $1", Instant::now());
            quiet.trace_query("SELECT 'quiet pool'", Instant::now());
        });

        let output = String::from_utf8(captured.lock().unwrap().clone()).unwrap();
        assert!(output.contains("query processed"), "{output}");
        assert!(output.contains("db=sqlite::memory:"), "{output}");
        assert!(output.contains("elapsed=0."), "{output}");
        assert!(output.contains(" ms"), "{output}");
        assert!(output.contains("query=\"SELECT name FROM items WHERE id = $1\""), "{output}");
        assert!(!output.contains("quiet pool"), "{output}");

        pool.close().await.unwrap();
        quiet.close().await.unwrap();
    }

    #[derive(Clone)]
    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pool_acquires_postgres_connection() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = DbPool::open(&ConnectionConfig::new(url).with_debug(true))
            .await
            .expect("pool creation failed");

        pool.ping().await.expect("probe failed");
        pool.close().await.unwrap();
    }
}
