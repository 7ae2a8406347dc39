// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound webhook client for the Courier message dispatch service.
//!
//! Provides [`WebhookClient`], which posts one message to the configured
//! delivery endpoint and normalizes the answer into a
//! [`WebhookResponse`](courier_core::WebhookResponse).

pub mod client;
pub mod response;

pub use client::{AUTH_HEADER, WebhookClient};
