//! StreamLine Server - Participant registry and broadcast relay
//!
//! This crate provides the core infrastructure for the relay server:
//! - `cli` - Flags, logging setup and the run entry point
//! - `config` - Server configuration (JSON file + CLI overrides)
//! - `port` - Ephemeral port allocation
//! - `transport` - Plain TCP or TLS stream provider
//! - `registry` - Participant registry actor (the only shared state)
//! - `server` - Accept loop, admission, broadcast and per-connection handlers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     streamlined                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐   │
//! │  │   ChatServer    │────▶│     RegistryActor           │   │
//! │  │ (TcpListener)   │     │  (participant state owner)  │   │
//! │  └────────┬────────┘     └──────────────┬──────────────┘   │
//! │           │                             │ snapshot          │
//! │           │ connections                 ▼                   │
//! │           ▼                  ┌─────────────────────────┐    │
//! │  ┌─────────────────┐        │      Broadcaster        │    │
//! │  │ Admission +     │───────▶│ (fan-out + eviction)    │    │
//! │  │ConnectionHandler│        └─────────────────────────┘    │
//! │  └─────────────────┘                                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

pub mod cli;
pub mod config;
pub mod port;
pub mod registry;
pub mod server;
pub mod transport;
