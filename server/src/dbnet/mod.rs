/*
 * Created on Sun Mar 21 2021
 *
 * This file is a part of Spinel
 * Spinel is a free and open-source in-memory key/value database that
 * speaks the RESP wire protocol, written by the Spinel developers with
 * the vision to provide a simple and reliable caching primitive without
 * compromising on performance.
 *
 * Copyright (c) 2021, The Spinel developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 *
*/

//! # Database networking
//!
//! This module provides the TCP listener and the per-connection handler.
//! Every accepted connection gets one task of its own; within a connection
//! request handling is strictly serial, so replies always come back in
//! request order. Across connections no ordering is guaranteed.

use crate::config::ServerConfig;
use crate::coredb::CoreDB;
use crate::kvengine::ActionError;
use crate::protocol::ActionGroup;
use crate::queryengine;
use libspinel::TResult;
use std::sync::atomic::{AtomicU8, Ordering};
use std::future::Future;
use std::io::Result as IoResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tokio::sync::Semaphore;
use tokio::time;

mod tcp;
pub use tcp::Connection;
pub use tcp::Listener;

/// This is a "marker trait" that ensures that no silly types are passed into
/// the [`Connection`] type
pub trait BufferedSocketStream: AsyncRead + AsyncWrite + Unpin + Send + Sync {}

impl BufferedSocketStream for tokio::net::TcpStream {}

#[cfg(test)]
impl BufferedSocketStream for tokio::io::DuplexStream {}

/// Result of [`Connection::read_query`]
pub enum QueryResult {
    /// A fully read request, ready to be run
    Q(ActionGroup),
    /// A protocol error: write the frame and close the connection
    E(&'static [u8]),
    /// The client disconnected cleanly
    Disconnected,
}

/// A backoff implementation that is meant to be used in connection loops
pub(self) struct NetBackoff {
    c: AtomicU8,
}

impl NetBackoff {
    /// The maximum backoff duration
    const MAX_BACKOFF: u8 = 64;
    /// Create a new [`NetBackoff`] instance
    pub const fn new() -> Self {
        Self {
            c: AtomicU8::new(1),
        }
    }
    /// Wait for the current backoff duration
    pub async fn spin(&self) {
        let c = self.c.load(Ordering::Relaxed);
        time::sleep(Duration::from_secs(c as _)).await;
        self.c.store(c << 1, Ordering::Relaxed);
    }
    /// Should we disconnect the stream?
    pub fn should_disconnect(&self) -> bool {
        self.c.load(Ordering::Relaxed) > Self::MAX_BACKOFF
    }
}

/// A generic connection handler. It runs the serial read loop of a single
/// client: frame one request, dispatch it, write exactly one reply back
pub struct ConnectionHandler<C> {
    /// an atomic reference to the shared in-memory engine
    db: CoreDB,
    /// the connection
    con: Connection<C>,
    /// the semaphore used to impose limits on the number of connections
    climit: Arc<Semaphore>,
    /// check for termination signals
    termination_signal: broadcast::Receiver<()>,
    /// the sender that we drop when we're done with handling a connection
    /// (used for graceful exit)
    _term_sig_tx: mpsc::Sender<()>,
}

impl<C> ConnectionHandler<C>
where
    C: BufferedSocketStream,
{
    /// Create a new connection handler
    pub fn new(
        db: CoreDB,
        con: Connection<C>,
        climit: Arc<Semaphore>,
        termination_signal: broadcast::Receiver<()>,
        _term_sig_tx: mpsc::Sender<()>,
    ) -> Self {
        Self {
            db,
            con,
            climit,
            termination_signal,
            _term_sig_tx,
        }
    }
    pub async fn run(&mut self) -> IoResult<()> {
        log::debug!("ConnectionHandler initialized to handle a remote client");
        loop {
            let packet = tokio::select! {
                pkt = self.con.read_query() => pkt,
                _ = self.termination_signal.recv() => {
                    return Ok(());
                }
            };
            match packet {
                Ok(QueryResult::Q(query)) => match self.execute_query(query).await {
                    Ok(()) => {}
                    Err(ActionError::ActionError(e)) => {
                        // a per-request error: the connection lives on
                        self.con.write_response(e).await?;
                        self.con.flush_stream().await?;
                    }
                    Err(ActionError::FatalError(e)) => {
                        self.con.close_conn_with_error(e).await?;
                        return Ok(());
                    }
                    Err(ActionError::IoError(e)) => return Err(e),
                },
                Ok(QueryResult::E(resp)) => {
                    log::debug!("Failed to read query!");
                    self.con.close_conn_with_error(resp).await?;
                    return Ok(());
                }
                Ok(QueryResult::Disconnected) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }
    async fn execute_query(&mut self, query: ActionGroup) -> Result<(), ActionError> {
        let Self { db, con, .. } = self;
        queryengine::execute_simple(db, con, query).await?;
        con.flush_stream().await.map_err(ActionError::IoError)?;
        Ok(())
    }
}

impl<C> Drop for ConnectionHandler<C> {
    fn drop(&mut self) {
        // Make sure that the permit is returned to the semaphore
        // in the case that there is a panic inside
        self.climit.add_permits(1);
    }
}

/// Start the server: restore the snapshot (if any), bind the listener and
/// accept connections until the termination signal future completes. The
/// database handle is returned to the caller for the final flush
pub async fn run(
    cfg: ServerConfig,
    sig: impl Future,
    restore_filepath: Option<std::path::PathBuf>,
) -> TResult<CoreDB> {
    let db = CoreDB::new(restore_filepath, cfg.savefile.clone())?;
    let climit = Arc::new(Semaphore::new(cfg.maxcon));
    let (signal, _) = broadcast::channel(1);
    let mut server = match Listener::init(&db, cfg.host, cfg.port, climit, signal.clone()).await {
        Ok(server) => server,
        Err(e) => return Err(format!("Failed to bind to port {}: {}", cfg.port, e).into()),
    };
    log::info!("Server started on spinel://{}:{}", cfg.host, cfg.port);
    tokio::select! {
        _ = server.run() => {}
        _ = sig => {
            log::info!("Signalling all workers to shut down");
        }
    }
    // dropping the broadcast sender wakes up every connection task, which
    // then returns; the mpsc channel tells us when the last one is gone
    drop(signal);
    server.release_self().await;
    Ok(db)
}
