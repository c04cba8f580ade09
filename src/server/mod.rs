//! # Request Server
//!
//! TCP front end speaking newline-delimited JSON. Each accepted connection is
//! served by one [`ConnectionHandler`] for its whole lifetime.
//!
//! ## Admission
//!
//! `workers` bounds how many connections are served at once. Up to `queue`
//! more connections are accepted and wait, in arrival order, for a worker to
//! free up. Past `workers + queue` a connection receives a single
//! `"Server busy"` error line and is closed.
//!
//! ## Shutdown
//!
//! Cancelling the shutdown token stops the accept loop and tells every handler
//! to stop reading once its current request is answered. Handlers still busy
//! after `shutdown_grace` are closed forcibly. [`RequestServer::run`] returns
//! only after every connection task has ended.

mod handler;
pub mod protocol;

use std::{
    io,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
    sync::Semaphore,
    time::{sleep, timeout},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

pub use handler::{ConnectionHandler, MAX_LINE_BYTES, RequestDefaults};
pub use protocol::{Action, ProtocolError, RecommendRequest, Request, Response, SearchRequest};

use crate::{config, info, recommend::RecommendationEngine, success, warning};

pub const BUSY_MESSAGE: &str = "Server busy";

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub address: String,
    pub workers: usize,
    pub queue: usize,
    /// Candidates fetched per recommendation.
    pub pool_size: usize,
    pub default_search_limit: usize,
    pub default_count: usize,
    pub idle_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            address: config::DEFAULT_SERVER_ADDRESS.to_string(),
            workers: 10,
            queue: 32,
            pool_size: crate::recommend::DEFAULT_POOL_SIZE,
            default_search_limit: 20,
            default_count: 10,
            idle_timeout: Duration::from_secs(300),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl ServerOptions {
    pub fn request_defaults(&self) -> RequestDefaults {
        RequestDefaults {
            search_limit: self.default_search_limit,
            count: self.default_count,
        }
    }
}

/// Live counters, readable while the server runs.
#[derive(Debug, Default)]
pub struct ServerStats {
    pub workers: usize,
    active: AtomicUsize,
    served: AtomicU64,
    rejected: AtomicU64,
}

impl ServerStats {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    pub fn served_connections(&self) -> u64 {
        self.served.load(Ordering::Relaxed)
    }

    pub fn rejected_connections(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

struct ActiveGuard<'a>(&'a ServerStats);

impl<'a> ActiveGuard<'a> {
    fn enter(stats: &'a ServerStats) -> Self {
        stats.active.fetch_add(1, Ordering::Relaxed);
        ActiveGuard(stats)
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::Relaxed);
        self.0.served.fetch_add(1, Ordering::Relaxed);
    }
}

pub struct RequestServer {
    listener: TcpListener,
    engine: Arc<RecommendationEngine>,
    options: ServerOptions,
    stats: Arc<ServerStats>,
}

impl RequestServer {
    pub async fn bind(
        options: ServerOptions,
        engine: Arc<RecommendationEngine>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(&options.address).await?;
        let stats = Arc::new(ServerStats::new(options.workers));

        Ok(Self {
            listener,
            engine,
            options,
            stats,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn stats(&self) -> Arc<ServerStats> {
        Arc::clone(&self.stats)
    }

    pub fn engine(&self) -> Arc<RecommendationEngine> {
        Arc::clone(&self.engine)
    }

    /// Accepts connections until `shutdown` is cancelled, then drains.
    pub async fn run(self, shutdown: CancellationToken) -> io::Result<()> {
        let RequestServer {
            listener,
            engine,
            options,
            stats,
        } = self;

        let workers = Arc::new(Semaphore::new(options.workers.max(1)));
        let admission = Arc::new(Semaphore::new(options.workers.max(1) + options.queue));
        let force_close = CancellationToken::new();
        let tracker = TaskTracker::new();
        let defaults = options.request_defaults();
        let mut next_id: u64 = 0;

        success!(
            "Recommendation server listening on {} ({} workers, strategy: {})",
            listener.local_addr()?,
            options.workers,
            engine.strategy_name()
        );

        loop {
            let (stream, peer) = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warning!("Failed to accept connection: {}", e);
                        sleep(Duration::from_millis(100)).await;
                        continue;
                    }
                },
            };

            next_id += 1;
            let id = next_id;

            let Ok(admitted) = Arc::clone(&admission).try_acquire_owned() else {
                warning!("[client {}] rejected from {}: server saturated", id, peer);
                stats.rejected.fetch_add(1, Ordering::Relaxed);
                tracker.spawn(reject_busy(stream));
                continue;
            };

            let handler = ConnectionHandler::new(id, Arc::clone(&engine), defaults);
            let workers = Arc::clone(&workers);
            let stats = Arc::clone(&stats);
            let shutdown = shutdown.clone();
            let force_close = force_close.clone();
            let idle_timeout = options.idle_timeout;

            tracker.spawn(async move {
                let _admitted = admitted;
                let _worker = tokio::select! {
                    permit = workers.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return,
                    },
                    _ = shutdown.cancelled() => return,
                };

                let _active = ActiveGuard::enter(&stats);
                info!("[client {}] connected from {}", id, peer);

                let result = tokio::select! {
                    result = handler.run(stream, idle_timeout, shutdown) => result,
                    _ = force_close.cancelled() => {
                        warning!("[client {}] closed by shutdown", id);
                        Ok(())
                    }
                };

                if let Err(e) = result {
                    warning!("[client {}] connection error: {}", id, e);
                }
                info!("[client {}] disconnected", id);
            });
        }

        drop(listener);
        tracker.close();
        info!(
            "Shutting down, waiting for {} active connection(s)",
            stats.active_connections()
        );

        if timeout(options.shutdown_grace, tracker.wait()).await.is_err() {
            warning!(
                "Connections still busy after {}s, closing them",
                options.shutdown_grace.as_secs()
            );
            force_close.cancel();
            tracker.wait().await;
        }

        success!("Recommendation server stopped");
        Ok(())
    }
}

async fn reject_busy(mut stream: TcpStream) {
    let mut line = Response::error(BUSY_MESSAGE).to_line();
    line.push('\n');
    if stream.write_all(line.as_bytes()).await.is_ok() {
        stream.shutdown().await.ok();
    }
}
