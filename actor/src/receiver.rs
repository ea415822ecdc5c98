// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Receivers
//!
//! The receive logic of an actor: either any type implementing [`Receiver`] or a plain function
//! wrapped in [`FnReceiver`].
//!

use crate::Context;

use async_trait::async_trait;
use futures::future::BoxFuture;

/// Handles one message at a time.
///
/// The current message is read from the context with [`Context::message_as`]. Messages of
/// unknown type should simply be ignored. Lifecycle messages ([`crate::Initialized`],
/// [`crate::Started`], [`crate::Stopped`]) arrive through the same method.
///
/// A receiver is owned by its actor and is never called concurrently, so it can keep mutable
/// state without locking.
///
/// # Examples
///
/// ```ignore
/// use actor::{Context, Receiver, Started};
/// use async_trait::async_trait;
///
/// struct Counter {
///     count: usize,
/// }
///
/// #[async_trait]
/// impl Receiver for Counter {
///     async fn receive(&mut self, ctx: &mut Context) {
///         if ctx.message_as::<Started>().is_some() {
///             self.count = 0;
///         } else if let Some(n) = ctx.message_as::<usize>() {
///             self.count += n;
///             ctx.respond(self.count).await;
///         }
///     }
/// }
/// ```
///
#[async_trait]
pub trait Receiver: Send + 'static {
    /// Handles the context's current message.
    async fn receive(&mut self, ctx: &mut Context);
}

/// Adapts a plain function into a [`Receiver`].
///
/// ```ignore
/// let pid = engine
///     .spawn_func(
///         |ctx| Box::pin(async move {
///             if let Some(name) = ctx.message_as::<String>() {
///                 tracing::info!("hello {}", name);
///             }
///         }),
///         "greeter",
///         Options::default(),
///     )
///     .await;
/// ```
pub struct FnReceiver<F>(F);

impl<F> FnReceiver<F>
where
    F: for<'a> FnMut(&'a mut Context) -> BoxFuture<'a, ()> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> Receiver for FnReceiver<F>
where
    F: for<'a> FnMut(&'a mut Context) -> BoxFuture<'a, ()> + Send + 'static,
{
    async fn receive(&mut self, ctx: &mut Context) {
        (self.0)(ctx).await
    }
}

#[async_trait]
impl Receiver for Box<dyn Receiver> {
    async fn receive(&mut self, ctx: &mut Context) {
        self.as_mut().receive(ctx).await
    }
}
