// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch pipeline, message service, and trigger loop for Courier.
//!
//! The [`DispatchPipeline`] drives pending messages to a terminal state one at
//! a time under a fixed throttle. [`MessageService`] is the creation and
//! listing surface used by the CLI. [`run_scheduler`] repeats batches until
//! cancelled.

pub mod pipeline;
pub mod scheduler;
pub mod service;
pub mod shutdown;

pub use pipeline::{BatchSummary, DispatchPipeline, SendOutcome};
pub use scheduler::run_scheduler;
pub use service::{MessageService, Pagination, SentMessage, SentPage, StatusCounts};
pub use shutdown::install_signal_handler;
