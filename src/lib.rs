// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! Core library for the Troupe framework.
//! Provides an in-process actor engine: hierarchical actors, bounded mailboxes, middleware,
//! request/response and restart handling.

pub use actor::{
    Config, Consumer, Context, DEADLETTER_NAME, DEFAULT_DEADLETTER_INBOX_SIZE,
    DEFAULT_INBOX_SIZE, DEFAULT_MAX_RESTARTS, DEFAULT_RESTART_DELAY, ENGINE_NAME,
    Engine, Envelope, Error as ActorError, FnReceiver, Inbox, Initialized,
    LOCAL_ADDRESS, Message, Middleware, MiddlewareChain, Next, Options, PID_SEPARATOR,
    Pid, Receiver, Repeater, Started, Stopped, TaskTracker,
};
