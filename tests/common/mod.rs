//! Common test utilities and fixtures for repcount-engine integration tests
//!
//! This module provides:
//! - Frame and engine fixtures
//! - A WebSocket test client against a server on an ephemeral port
//! - `TestWorkspace` for running the CLI binary in a temp directory
//! - Envelope and JSON assertions

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;
pub mod ws_client;

pub use assertions::*;
pub use fixtures::*;
pub use ws_client::{spawn_server, WsClient};
