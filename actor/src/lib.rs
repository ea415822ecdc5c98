// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Troupe Actor Engine
//!
//! An in-process actor runtime. Independent units of state and behavior, the actors, run
//! concurrently and interact only by sending messages to each other through bounded mailboxes.
//!
//! ## Overview
//!
//! An [`Engine`] owns a registry of live actors, each identified by a hierarchical [`Pid`].
//! Every actor drains its mailbox in its own task and handles one message at a time, so its
//! receive logic never runs concurrently with itself and can keep mutable state without locking.
//!
//! Messages are arbitrary `Send + Sync + 'static` values wrapped in a [`Message`]; receivers
//! discover their concrete type at runtime with [`Context::message_as`] and ignore what they do
//! not understand.
//!
//! ## Lifecycle
//!
//! An actor receives [`Initialized`] and [`Started`] before its first user message, and
//! [`Stopped`] when it terminates. A panic inside the receive logic is contained by the actor:
//! it receives `Stopped`, waits for its restart delay and runs the lifecycle again, up to a
//! configurable number of restarts. Once the budget is spent the actor is removed.
//!
//! ## Hierarchy
//!
//! Actors spawned through [`Context::spawn`] are children of the spawning actor; their pid id
//! extends the parent's one. Stopping an actor stops its whole subtree first.
//!
//! ## Getting Started
//!
//! ```ignore
//! use actor::{Config, Context, Engine, Options, Receiver, Started};
//! use async_trait::async_trait;
//!
//! #[derive(Default)]
//! struct Counter {
//!     count: usize,
//! }
//!
//! #[async_trait]
//! impl Receiver for Counter {
//!     async fn receive(&mut self, ctx: &mut Context) {
//!         if ctx.message_as::<Started>().is_some() {
//!             tracing::info!("counter {} started", ctx.pid());
//!         } else if let Some(n) = ctx.message_as::<usize>() {
//!             self.count += n;
//!             ctx.respond(self.count).await;
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), actor::Error> {
//!     let engine = Engine::new(Config::default()).await;
//!     let counter = engine
//!         .spawn(Counter::default(), "counter", Options::default())
//!         .await;
//!
//!     engine.send(&counter, 5usize).await;
//!     let total = engine
//!         .request(&counter, 3usize, std::time::Duration::from_secs(1))
//!         .await?;
//!     assert_eq!(total.downcast_ref::<usize>(), Some(&8));
//!
//!     engine.shutdown_and_wait().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Middleware
//!
//! A [`Middleware`] chain can wrap the receive logic of an actor, for tracing, metrics or
//! scoping the cancellation token of each message. Middleware runs in declaration order and
//! sees the lifecycle messages too.
//!
//! ## Undeliverable messages
//!
//! A message addressed to a pid that is not registered goes to the deadletter actor, which logs
//! it with the original destination.
//!

mod config;
mod context;
mod engine;
mod error;
mod inbox;
mod message;
mod middleware;
mod pid;
mod processor;
mod receiver;
mod registry;
mod repeater;
mod request;

//
// Engine
//

/// The actor runtime: spawning, routing, requests and shutdown.
pub use engine::Engine;

/// Names of the bookkeeping actors.
pub use engine::{DEADLETTER_NAME, ENGINE_NAME};

/// Engine-wide configuration and its defaults.
pub use config::{
    Config, DEFAULT_DEADLETTER_INBOX_SIZE, DEFAULT_INBOX_SIZE, DEFAULT_MAX_RESTARTS,
    DEFAULT_RESTART_DELAY,
};

/// Per-spawn overrides of the engine configuration.
pub use config::Options;

//
// Actors
//

/// Receive logic of an actor.
pub use receiver::{FnReceiver, Receiver};

/// The actor's view of the current message and of the engine.
pub use context::Context;

/// Decorators around an actor's receive logic.
pub use middleware::{Middleware, MiddlewareChain, Next};

/// Handle to a periodic message.
pub use repeater::Repeater;

//
// Messaging
//

/// Hierarchical actor identifier.
pub use pid::{LOCAL_ADDRESS, PID_SEPARATOR, Pid};

/// Type-erased message and the lifecycle messages.
pub use message::{Initialized, Message, Started, Stopped};

/// Bounded mailbox and its transport unit.
pub use inbox::{Consumer, Envelope, Inbox};

//
// Error Handling
//

/// Error type of the caller-facing operations.
pub use error::Error;

/// Completion tracker accepted by [`Engine::poison`] and [`Engine::shutdown`].
pub use tokio_util::task::TaskTracker;
