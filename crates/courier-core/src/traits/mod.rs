// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! The dispatch pipeline is assembled from trait objects constructed once at
//! process start. Lifecycle-bearing adapters extend the [`PluginAdapter`] base
//! trait and use `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod cache;
pub mod storage;
pub mod webhook;

pub use adapter::PluginAdapter;
pub use cache::ResultCache;
pub use storage::{DeliveryLogStore, MessageStore, StorageAdapter};
pub use webhook::WebhookAdapter;
