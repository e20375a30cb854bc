/*
 * Created on Fri Apr 16 2021
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

//! End-to-end tests: a real listener is started on an ephemeral port and
//! raw clients drive it over TCP, asserting the exact reply bytes

use crate::coredb::CoreDB;
use crate::dbnet::Listener;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::sync::Semaphore;

/// Boot a server on an ephemeral port with a fresh database and return the
/// address it is listening on
async fn start_server(name: &str) -> SocketAddr {
    let db = CoreDB::new_empty(env::temp_dir().join(name));
    let climit = Arc::new(Semaphore::new(50));
    let (signal, _) = broadcast::channel(1);
    let mut listener = Listener::init(&db, "127.0.0.1".parse().unwrap(), 0, climit, signal)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = listener.run().await;
    });
    addr
}

/// Write a request and assert the exact bytes that come back
async fn exchange(stream: &mut TcpStream, request: &[u8], expected: &[u8]) {
    stream.write_all(request).await.unwrap();
    let mut response = vec![0u8; expected.len()];
    stream.read_exact(&mut response).await.unwrap();
    assert_eq!(
        response,
        expected,
        "got {:?}, expected {:?}",
        String::from_utf8_lossy(&response),
        String::from_utf8_lossy(expected)
    );
}

#[tokio::test]
async fn test_ping_pong() {
    let addr = start_server("e2e-ping.spinel").await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    exchange(&mut stream, b"*1\r\n$4\r\nPING\r\n", b"+PONG\r\n").await;
}

#[tokio::test]
async fn test_set_then_get() {
    let addr = start_server("e2e-setget.spinel").await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    exchange(
        &mut stream,
        b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n",
        b"+OK\r\n",
    )
    .await;
    exchange(&mut stream, b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n", b"$1\r\nv\r\n").await;
}

#[tokio::test]
async fn test_get_of_an_absent_key_is_null() {
    let addr = start_server("e2e-absent.spinel").await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    exchange(&mut stream, b"*2\r\n$3\r\nGET\r\n$3\r\nabs\r\n", b"$-1\r\n").await;
}

#[tokio::test]
async fn test_list_scenario() {
    let addr = start_server("e2e-lists.spinel").await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    exchange(
        &mut stream,
        b"*3\r\n$5\r\nLPUSH\r\n$1\r\nL\r\n$1\r\nx\r\n",
        b":1\r\n",
    )
    .await;
    exchange(
        &mut stream,
        b"*3\r\n$5\r\nLPUSH\r\n$1\r\nL\r\n$1\r\ny\r\n",
        b":2\r\n",
    )
    .await;
    exchange(
        &mut stream,
        b"*4\r\n$6\r\nLRANGE\r\n$1\r\nL\r\n$1\r\n0\r\n$1\r\n1\r\n",
        b"*2\r\n$1\r\ny\r\n$1\r\nx\r\n",
    )
    .await;
}

#[tokio::test]
async fn test_counter_scenario() {
    let addr = start_server("e2e-counter.spinel").await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    exchange(&mut stream, b"*2\r\n$4\r\nINCR\r\n$1\r\nn\r\n", b":1\r\n").await;
    exchange(&mut stream, b"*2\r\n$4\r\nINCR\r\n$1\r\nn\r\n", b":2\r\n").await;
}

#[tokio::test]
async fn test_set_presence_scenario() {
    let addr = start_server("e2e-setnx.spinel").await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    exchange(
        &mut stream,
        b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$3\r\nold\r\n",
        b"+OK\r\n",
    )
    .await;
    exchange(
        &mut stream,
        b"*4\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n$2\r\nNX\r\n",
        b"$-1\r\n",
    )
    .await;
    exchange(
        &mut stream,
        b"*5\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n$2\r\nNX\r\n$3\r\nGET\r\n",
        b"+old\r\n",
    )
    .await;
}

#[tokio::test]
async fn test_replies_come_back_in_request_order() {
    let addr = start_server("e2e-ordering.spinel").await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    // two requests in one write still produce two replies, in order
    exchange(
        &mut stream,
        b"*1\r\n$4\r\nPING\r\n*2\r\n$4\r\nECHO\r\n$2\r\nhi\r\n",
        b"+PONG\r\n$2\r\nhi\r\n",
    )
    .await;
}

#[tokio::test]
async fn test_unknown_command_closes_the_connection() {
    let addr = start_server("e2e-unknown.spinel").await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"*1\r\n$4\r\nBLAH\r\n").await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    // the error frame is the last thing the server says
    assert_eq!(response, b"-unknown command\r\n");
}

#[tokio::test]
async fn test_per_request_errors_leave_the_connection_open() {
    let addr = start_server("e2e-wrongtype.spinel").await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    exchange(
        &mut stream,
        b"*3\r\n$5\r\nLPUSH\r\n$1\r\nL\r\n$1\r\nx\r\n",
        b":1\r\n",
    )
    .await;
    exchange(
        &mut stream,
        b"*2\r\n$3\r\nGET\r\n$1\r\nL\r\n",
        b"-operation against a key holding the wrong kind of value\r\n",
    )
    .await;
    // the connection is still usable
    exchange(&mut stream, b"*1\r\n$4\r\nPING\r\n", b"+PONG\r\n").await;
}

#[tokio::test]
async fn test_malformed_requests_close_the_connection() {
    let addr = start_server("e2e-badreq.spinel").await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    // an integer can't be a request element
    stream.write_all(b"*1\r\n:1\r\n").await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    assert_eq!(response, b"-invalid client data\r\n");
}

#[tokio::test]
async fn test_connections_run_in_parallel() {
    let addr = start_server("e2e-parallel.spinel").await;
    let mut first = TcpStream::connect(addr).await.unwrap();
    let mut second = TcpStream::connect(addr).await.unwrap();
    exchange(
        &mut first,
        b"*3\r\n$3\r\nSET\r\n$1\r\na\r\n$1\r\n1\r\n",
        b"+OK\r\n",
    )
    .await;
    // the write from the first connection is visible to the second
    exchange(&mut second, b"*2\r\n$3\r\nGET\r\n$1\r\na\r\n", b"$1\r\n1\r\n").await;
}
