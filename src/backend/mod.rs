//! Chat-completion backends.
//!
//! This module provides the HTTP client used to query one backend model.

pub mod client;

pub use client::{ChatClient, ClientConfig};
