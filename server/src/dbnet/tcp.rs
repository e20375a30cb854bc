/*
 * Created on Mon Mar 22 2021
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

use crate::coredb::CoreDB;
use crate::dbnet::BufferedSocketStream;
use crate::dbnet::ConnectionHandler;
use crate::dbnet::NetBackoff;
use crate::dbnet::QueryResult;
use crate::protocol::responses;
use crate::protocol::ParseError;
use crate::protocol::Parser;
use crate::resp::Writable;
use bytes::Buf;
use bytes::BytesMut;
use libspinel::BUF_CAP;
use std::io::Result as IoResult;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufWriter;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tokio::sync::Semaphore;

/// A TCP connection wrapper: the read buffer on one side and the buffered
/// write half on the other
pub struct Connection<T> {
    /// The connection to the remote socket, wrapped in a buffered writer
    pub stream: BufWriter<T>,
    /// The in-memory read buffer. The size is given by `BUF_CAP`
    pub buffer: BytesMut,
}

impl<T> Connection<T>
where
    T: BufferedSocketStream,
{
    /// Initialize a new `Connection` instance
    pub fn new(stream: T) -> Self {
        Connection {
            stream: BufWriter::new(stream),
            buffer: BytesMut::with_capacity(BUF_CAP),
        }
    }
    /// Try to parse one request from the buffered data
    fn try_query(&self) -> Result<(crate::protocol::ActionGroup, usize), ParseError> {
        Parser::new(&self.buffer).parse_query()
    }
    /// Read a query from the remote end
    ///
    /// This function asynchronously waits until all the data required for
    /// parsing the query is available. A clean EOF before any request byte
    /// ends the loop silently; an EOF in the middle of a frame is a protocol
    /// error
    pub async fn read_query(&mut self) -> IoResult<QueryResult> {
        loop {
            match self.try_query() {
                Ok((query, forward_by)) => {
                    self.buffer.advance(forward_by);
                    return Ok(QueryResult::Q(query));
                }
                Err(ParseError::Empty) | Err(ParseError::NotEnough) => {
                    if self.stream.read_buf(&mut self.buffer).await? == 0 {
                        if self.buffer.is_empty() {
                            return Ok(QueryResult::Disconnected);
                        } else {
                            // the peer hung up in the middle of a frame
                            return Ok(QueryResult::E(
                                responses::groups::TERMINATOR_NOT_FOUND_ERR,
                            ));
                        }
                    }
                }
                Err(e) => return Ok(QueryResult::E(e.response_bytes())),
            }
        }
    }
    /// Write a response to the stream
    pub async fn write_response(&mut self, streamer: impl Writable) -> IoResult<()> {
        streamer.write(&mut self.stream).await
    }
    /// Wraps around the `write_response` used to differentiate between a
    /// success response and an error response
    pub async fn close_conn_with_error(&mut self, resp: &'static [u8]) -> IoResult<()> {
        self.write_response(resp).await?;
        self.flush_stream().await
    }
    pub async fn flush_stream(&mut self) -> IoResult<()> {
        self.stream.flush().await
    }
}

/// A listener: the TCP binding, the shared database handle and the channels
/// used to coordinate a graceful shutdown
pub struct Listener {
    /// An atomic reference to the coretable
    db: CoreDB,
    /// The incoming connection listener (binding)
    listener: TcpListener,
    /// The maximum number of connections
    climit: Arc<Semaphore>,
    /// The shutdown broadcaster
    signal: broadcast::Sender<()>,
    // When all `Sender`s are dropped - the `Receiver` gets a `None` value
    // We send a clone of `terminate_tx` to each `ConnectionHandler`
    terminate_tx: mpsc::Sender<()>,
    terminate_rx: mpsc::Receiver<()>,
}

impl Listener {
    /// Bind the socket and initialize a new `Listener` instance
    pub async fn init(
        db: &CoreDB,
        host: IpAddr,
        port: u16,
        climit: Arc<Semaphore>,
        signal: broadcast::Sender<()>,
    ) -> IoResult<Self> {
        let (terminate_tx, terminate_rx) = mpsc::channel(1);
        let listener = TcpListener::bind((host, port)).await?;
        Ok(Listener {
            db: db.clone(),
            listener,
            climit,
            signal,
            terminate_tx,
            terminate_rx,
        })
    }
    /// The bound address, mostly useful when port 0 was requested
    pub fn local_addr(&self) -> IoResult<std::net::SocketAddr> {
        self.listener.local_addr()
    }
    /// Accept an incoming connection
    async fn accept(&mut self) -> IoResult<TcpStream> {
        let backoff = NetBackoff::new();
        loop {
            match self.listener.accept().await {
                // We don't need the bindaddr
                Ok((stream, _)) => return Ok(stream),
                Err(e) => {
                    if backoff.should_disconnect() {
                        // Too many retries, goodbye user
                        return Err(e);
                    }
                }
            }
            // spin to wait for the backoff duration
            backoff.spin().await;
        }
    }
    /// Run the accept loop
    pub async fn run(&mut self) -> IoResult<()> {
        loop {
            // Take the permit first, but we won't use it right now
            // that's why we will forget it
            self.climit.acquire().await.unwrap().forget();
            /*
             SECURITY: Ignore any errors that may arise in the accept
             loop. If we apply the try operator here, we will immediately
             terminate the run loop causing the entire server to go down.
             Also, do not log any errors because many connection errors
             can arise and it will flood the log and might also result
             in a crash
            */
            let stream = match self.accept().await {
                Ok(stream) => stream,
                Err(_) => continue,
            };
            let mut chandle = ConnectionHandler::new(
                self.db.clone(),
                Connection::new(stream),
                self.climit.clone(),
                self.signal.subscribe(),
                self.terminate_tx.clone(),
            );
            tokio::spawn(async move {
                if let Err(e) = chandle.run().await {
                    log::error!("Error: {}", e);
                }
            });
        }
    }
    /// Wait for every connection task to drain after the shutdown signal
    /// has been broadcast
    pub async fn release_self(self) {
        let Listener {
            mut terminate_rx,
            terminate_tx,
            signal,
            ..
        } = self;
        drop(signal);
        drop(terminate_tx);
        let _ = terminate_rx.recv().await;
    }
}
