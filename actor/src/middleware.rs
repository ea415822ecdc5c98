// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Middleware
//!
//! Decorators wrapping an actor's receive logic. The chain is walked in declaration order: the
//! first middleware sees every message first and regains control last, the receiver sits
//! innermost.
//!

use crate::{Context, Receiver};

use async_trait::async_trait;

use std::sync::Arc;

/// A decorator around message dispatch.
///
/// Implementations do their work and then call [`Next::run`] to hand the message to the rest of
/// the chain. Not calling `next` swallows the message. The context may be modified before
/// calling `next`, for instance to attach a derived cancellation token.
///
/// Middleware also sees the lifecycle messages.
///
/// # Examples
///
/// ```ignore
/// use actor::{Context, Middleware, Next};
/// use async_trait::async_trait;
///
/// struct Trace;
///
/// #[async_trait]
/// impl Middleware for Trace {
///     async fn handle(&self, ctx: &mut Context, next: Next<'_>) {
///         tracing::debug!("before {:?}", ctx.message());
///         next.run(ctx).await;
///         tracing::debug!("after");
///     }
/// }
/// ```
///
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    /// Handles the current message, delegating to `next`.
    async fn handle(&self, ctx: &mut Context, next: Next<'_>);
}

/// Shared middleware chain.
pub type MiddlewareChain = Arc<[Arc<dyn Middleware>]>;

/// The remainder of a middleware chain, ending with the receiver.
pub struct Next<'a> {
    middleware: &'a [Arc<dyn Middleware>],
    receiver: &'a mut dyn Receiver,
}

impl<'a> Next<'a> {
    pub(crate) fn new(
        middleware: &'a [Arc<dyn Middleware>],
        receiver: &'a mut dyn Receiver,
    ) -> Self {
        Self {
            middleware,
            receiver,
        }
    }

    /// Runs the rest of the chain.
    pub async fn run(self, ctx: &mut Context) {
        match self.middleware.split_first() {
            Some((head, tail)) => {
                head.handle(ctx, Next::new(tail, self.receiver)).await
            }
            None => self.receiver.receive(ctx).await,
        }
    }
}
