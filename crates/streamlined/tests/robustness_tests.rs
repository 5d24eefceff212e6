//! Robustness tests for the relay server.
//!
//! These tests verify the server stays available under misbehaving clients:
//! oversized lines, silent connections, rapid connect/disconnect, invalid
//! UTF-8 and many concurrent participants.
//!
//! Tests CAN use `.unwrap()` and `.expect()` - this is allowed.

mod common;

use std::time::Duration;

use common::TestServer;
use streamline_protocol::{MAX_LINE_LENGTH, NICK_REQUEST};
use tokio::time::sleep;

// ============================================================================
// Line Size Limit Tests
// ============================================================================

#[tokio::test]
async fn test_oversized_line_disconnects_only_that_participant() {
    let server = TestServer::spawn().await;
    let mut alice = server.join("alice").await;
    let mut bob = server.join("bob").await;
    alice.expect("bob joined").await;

    let huge = "x".repeat(MAX_LINE_LENGTH + 1024);
    bob.send(&huge).await;

    alice.expect("bob left").await;
    server.wait_for_departure("bob").await;

    // Server still admits new participants
    let _carol = server.join("carol").await;
    alice.expect("carol joined").await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_oversized_nickname_line_fails_admission() {
    let server = TestServer::spawn().await;

    let mut client = server.connect().await;
    client.expect(NICK_REQUEST).await;
    let huge = "n".repeat(MAX_LINE_LENGTH + 1);
    client.send(&huge).await;
    client.expect_closed().await;

    assert!(server.nicknames().await.is_empty());
    server.shutdown().await;
}

#[tokio::test]
async fn test_invalid_utf8_disconnects_sender() {
    let server = TestServer::spawn().await;
    let mut alice = server.join("alice").await;
    let mut bob = server.join("bob").await;
    alice.expect("bob joined").await;

    bob.send_raw(&[0xff, 0xfe, b'\n']).await;

    alice.expect("bob left").await;
    server.shutdown().await;
}

// ============================================================================
// Rapid Connect/Disconnect Tests
// ============================================================================

#[tokio::test]
async fn test_rapid_connect_disconnect() {
    let server = TestServer::spawn().await;

    // Half of them leave before admission, half right after it
    for i in 0..20 {
        let mut client = server.connect().await;
        if i % 2 == 0 {
            client.expect(NICK_REQUEST).await;
            client.send(&format!("rapid{i}")).await;
        }
        drop(client);
    }

    sleep(Duration::from_millis(200)).await;

    let _final = server.join("final").await;
    let remaining = server.nicknames().await;
    assert_eq!(remaining, vec!["final"]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_many_concurrent_participants() {
    let server = TestServer::spawn().await;

    let mut clients = Vec::new();
    for i in 0..15 {
        clients.push(server.join(&format!("user{i}")).await);
    }
    // Drain join announcements: user{i} saw every later join
    for (i, client) in clients.iter_mut().enumerate() {
        for j in (i + 1)..15 {
            client.expect(&format!("user{j} joined")).await;
        }
    }

    clients[0].send("ping").await;
    for client in clients.iter_mut().skip(1) {
        client.expect("user0: ping").await;
    }

    assert_eq!(server.registry.snapshot().await.len(), 15);
    server.shutdown().await;
}

// ============================================================================
// Idle Connection Tests
// ============================================================================

#[tokio::test]
async fn test_silent_connection_does_not_block_others() {
    let server = TestServer::spawn().await;

    // Connects but never answers NICK
    let mut silent = server.connect().await;
    silent.expect(NICK_REQUEST).await;

    let mut alice = server.join("alice").await;
    let mut bob = server.join("bob").await;
    alice.expect("bob joined").await;
    bob.send("still working").await;
    alice.expect("bob: still working").await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_with_pending_admission() {
    let server = TestServer::spawn().await;

    let mut pending = server.connect().await;
    pending.expect(NICK_REQUEST).await;

    server.shutdown().await;
    pending.expect_closed().await;
}
