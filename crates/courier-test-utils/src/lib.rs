// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Courier integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests without a real delivery endpoint.
//!
//! # Components
//!
//! - [`MockWebhook`] - Scripted webhook adapter that records every call
//! - [`MemoryStore`] - In-memory message and delivery log store with failure injection
//! - [`FailingCache`] - Result cache whose every operation errors
//! - [`TestHarness`] - Temp SQLite + real webhook client + in-memory cache + pipeline

pub mod failing_cache;
pub mod harness;
pub mod memory_store;
pub mod mock_webhook;

pub use failing_cache::FailingCache;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use memory_store::MemoryStore;
pub use mock_webhook::{MockWebhook, WebhookCall};
