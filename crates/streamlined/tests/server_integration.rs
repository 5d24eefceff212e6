//! Integration tests for the relay server.
//!
//! These tests drive a real `ChatServer` over loopback TCP: admission,
//! relaying, departures and graceful shutdown.
//!
//! Tests CAN use `.unwrap()` and `.expect()` - this is allowed.
//! We test the panic-free behavior of production code through assertions.

mod common;

use std::time::Duration;

use common::TestServer;
use streamline_protocol::{NICK_REQUEST, PASSWORD_ACCEPTED, PASSWORD_PROMPT};
use streamlined::config::ServerConfig;

// ============================================================================
// Admission
// ============================================================================

#[tokio::test]
async fn test_duplicate_nickname_rejected_and_first_remains_alone() {
    let server = TestServer::spawn().await;
    let mut alice = server.join("alice").await;

    let mut impostor = server.connect().await;
    impostor.expect(NICK_REQUEST).await;
    impostor.send("alice").await;
    impostor.expect("Nickname already in use. Disconnecting.").await;
    impostor.expect_closed().await;

    assert_eq!(server.nicknames().await, vec!["alice"]);
    // The rejected connection never joined, so nothing is announced
    alice.expect_silence().await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_password_flow() {
    let server = TestServer::spawn_with_password("hunter2").await;

    let mut client = server.connect().await;
    client.expect(PASSWORD_PROMPT).await;
    client.send("hunter2").await;
    client.expect(PASSWORD_ACCEPTED).await;
    client.expect(NICK_REQUEST).await;
    client.send("alice").await;
    server.wait_for_member("alice").await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_wrong_password_never_registers() {
    let server = TestServer::spawn_with_password("hunter2").await;

    let mut client = server.connect().await;
    client.expect(PASSWORD_PROMPT).await;
    client.send("letmein").await;
    client.expect("Invalid password. Disconnecting.").await;
    client.expect_closed().await;

    assert!(server.nicknames().await.is_empty());
    server.shutdown().await;
}

#[tokio::test]
async fn test_password_with_crlf_is_accepted() {
    let server = TestServer::spawn_with_password("hunter2").await;

    let mut client = server.connect().await;
    client.expect(PASSWORD_PROMPT).await;
    client.send_raw(b"hunter2\r\n").await;
    client.expect(PASSWORD_ACCEPTED).await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_non_alphanumeric_nickname_rejected_by_default() {
    let server = TestServer::spawn().await;

    let mut client = server.connect().await;
    client.expect(NICK_REQUEST).await;
    client.send("al ice").await;
    client
        .expect("Nickname should contain only letters and numbers. Disconnecting.")
        .await;
    client.expect_closed().await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_permissive_policy_accepts_punctuation() {
    let server = TestServer::spawn_with(ServerConfig {
        require_alphanumeric: false,
        ..ServerConfig::default()
    })
    .await;

    let _client = server.join("alice_99").await;
    assert_eq!(server.nicknames().await, vec!["alice_99"]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_admissions_with_same_nickname() {
    let server = TestServer::spawn().await;

    let mut clients = Vec::new();
    for _ in 0..8 {
        let mut client = server.connect().await;
        client.expect(NICK_REQUEST).await;
        clients.push(client);
    }
    // Send all nicknames before reading any reply
    for client in clients.iter_mut() {
        client.send("alice").await;
    }
    server.wait_for_member("alice").await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(server.nicknames().await, vec!["alice"]);

    let mut rejected = 0;
    for client in clients.iter_mut() {
        if client.recv_timeout(Duration::from_millis(200)).await.as_deref()
            == Some("Nickname already in use. Disconnecting.")
        {
            rejected += 1;
        }
    }
    assert_eq!(rejected, 7);

    server.shutdown().await;
}

// ============================================================================
// Relaying
// ============================================================================

#[tokio::test]
async fn test_message_reaches_others_but_not_sender() {
    let server = TestServer::spawn().await;
    let mut alice = server.join("alice").await;
    let mut bob = server.join("bob").await;

    alice.expect("bob joined").await;

    alice.send("hi").await;
    bob.expect("alice: hi").await;
    alice.expect_silence().await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_newcomer_does_not_see_own_join() {
    let server = TestServer::spawn().await;
    let mut alice = server.join("alice").await;
    alice.expect_silence().await;

    let mut bob = server.join("bob").await;
    alice.expect("bob joined").await;
    bob.expect_silence().await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_blank_lines_are_not_relayed() {
    let server = TestServer::spawn().await;
    let mut alice = server.join("alice").await;
    let mut bob = server.join("bob").await;
    alice.expect("bob joined").await;

    alice.send("").await;
    alice.send("   ").await;
    alice.send("real").await;
    bob.expect("alice: real").await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_lines_from_one_sender_arrive_in_order() {
    let server = TestServer::spawn().await;
    let mut alice = server.join("alice").await;
    let mut bob = server.join("bob").await;
    alice.expect("bob joined").await;

    for i in 0..20 {
        alice.send(&format!("line {i}")).await;
    }
    for i in 0..20 {
        bob.expect(&format!("alice: line {i}")).await;
    }

    server.shutdown().await;
}

// ============================================================================
// Departures
// ============================================================================

#[tokio::test]
async fn test_abrupt_disconnect_announces_departure() {
    let server = TestServer::spawn().await;
    let alice = server.join("alice").await;
    let mut bob = server.join("bob").await;

    drop(alice);

    bob.expect("alice left").await;
    server.wait_for_departure("alice").await;
    assert_eq!(server.nicknames().await, vec!["bob"]);
    bob.expect_silence().await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_nickname_reusable_after_departure() {
    let server = TestServer::spawn().await;
    let alice = server.join("alice").await;
    drop(alice);
    server.wait_for_departure("alice").await;

    let _again = server.join("alice").await;
    assert_eq!(server.nicknames().await, vec!["alice"]);

    server.shutdown().await;
}

// ============================================================================
// Dispatch
// ============================================================================

#[tokio::test]
async fn test_queued_participant_receives_broadcasts() {
    let server = TestServer::spawn_with(ServerConfig {
        max_workers: 1,
        ..ServerConfig::default()
    })
    .await;

    let mut alice = server.join("alice").await;
    // bob is registered but waits for alice's worker slot
    let mut bob = server.join("bob").await;
    alice.expect("bob joined").await;

    alice.send("hello").await;
    bob.expect("alice: hello").await;

    // bob's own lines wait until a slot frees up
    bob.send("queued").await;
    alice.expect_silence().await;

    drop(alice);
    bob.expect("alice left").await;

    server.shutdown().await;
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_shutdown_closes_participants_without_departures() {
    let server = TestServer::spawn().await;
    let mut alice = server.join("alice").await;
    let mut bob = server.join("bob").await;
    alice.expect("bob joined").await;

    let registry = server.registry.clone();
    server.shutdown().await;

    alice.expect_closed().await;
    bob.expect_closed().await;
    assert_eq!(registry.snapshot().await.len(), 0);
}
