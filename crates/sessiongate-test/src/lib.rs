//! # sessiongate-test
//!
//! Testing utilities for sessiongate. Provides a test client that drives an
//! axum router in-process while keeping cookies between requests, and
//! fixtures for building a seeded application.

pub mod client;
pub mod fixtures;

pub use client::{TestClient, TestResponse};
pub use fixtures::{seeded_app, test_settings};
