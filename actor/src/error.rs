// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Errors module
//!

use thiserror::Error;

use std::time::Duration;

/// Error type for the actor engine.
///
/// Only caller-facing operations fail: delivering into a mailbox and waiting for a reply.
/// Faults inside receive logic are contained by the actor's processor and never surface here.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// The mailbox no longer accepts envelopes.
    #[error("inbox closed")]
    InboxClosed,
    /// The mailbox is at capacity (non-waiting delivery only).
    #[error("inbox full")]
    InboxFull,
    /// No reply arrived within the requested duration.
    #[error("request timed out after {0:?}")]
    RequestTimeout(Duration),
    /// The request's cancellation token fired before a reply arrived.
    #[error("request cancelled")]
    RequestCancelled,
}
