// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Engine
//!
//! The [`Engine`] owns the registry and routes every message. It is cheap to clone; all clones
//! share the same actors.
//!
//! Two bookkeeping actors live in every engine: the engine actor itself, whose pid is the parent
//! of every root-level actor, and the deadletter actor, which receives anything addressed to a
//! pid that is not registered.
//!

use crate::{
    Config, Context, FnReceiver, Initialized, Message, Pid, Receiver, Started, Stopped,
    config::Options,
    context::ParentLink,
    inbox::Envelope,
    processor::{ActorProcessor, Processor},
    registry::Registry,
};

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, warn};

use std::{any::Any, sync::Arc};

/// Name of the engine actor.
pub const ENGINE_NAME: &str = "engine";

/// Name of the deadletter actor, spawned under the engine.
pub const DEADLETTER_NAME: &str = "deadletter";

/// Actor runtime.
///
/// # Examples
///
/// ```ignore
/// let engine = Engine::new(Config::default()).await;
/// let pid = engine.spawn(Counter::default(), "counter", Options::default()).await;
/// engine.send(&pid, 1usize).await;
/// engine.shutdown_and_wait().await;
/// ```
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    pid: Pid,
    deadletter: Pid,
    registry: Registry,
    config: Config,
}

impl Engine {
    /// Creates an engine and starts its bookkeeping actors.
    pub async fn new(config: Config) -> Self {
        let pid = Pid::new(&config.address, ENGINE_NAME, &[]);
        let deadletter = pid.child(DEADLETTER_NAME, &[]);
        let deadletter_inbox_size = config.deadletter_inbox_size;
        let engine = Self {
            inner: Arc::new(EngineInner {
                pid: pid.clone(),
                deadletter: deadletter.clone(),
                registry: Registry::new(),
                config,
            }),
        };

        engine
            .spawn_processor(Box::new(EngineActor), pid, None, Options::default())
            .await;
        engine
            .spawn_processor(
                Box::new(DeadLetter),
                deadletter,
                None,
                Options::default().with_inbox_size(deadletter_inbox_size),
            )
            .await;
        debug!("Engine {} is running.", engine.pid());
        engine
    }

    /// Pid of the engine actor.
    pub fn pid(&self) -> &Pid {
        &self.inner.pid
    }

    pub fn deadletter(&self) -> &Pid {
        &self.inner.deadletter
    }

    pub fn address(&self) -> &str {
        self.inner.pid.address()
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Spawns a root-level actor. The pid is built from the name and the options' tags.
    ///
    /// Spawning a pid that is already registered leaves the running actor untouched and returns
    /// its pid.
    pub async fn spawn<R: Receiver>(
        &self,
        receiver: R,
        name: &str,
        options: Options,
    ) -> Pid {
        let pid = Pid::new(self.address(), name, &options.tag_refs());
        self.spawn_processor(Box::new(receiver), pid, None, options)
            .await
    }

    /// Spawns a root-level actor from a function.
    pub async fn spawn_func<F>(&self, f: F, name: &str, options: Options) -> Pid
    where
        F: for<'a> FnMut(&'a mut Context) -> BoxFuture<'a, ()> + Send + 'static,
    {
        self.spawn(FnReceiver::new(f), name, options).await
    }

    pub(crate) async fn spawn_processor(
        &self,
        receiver: Box<dyn Receiver>,
        pid: Pid,
        parent: Option<ParentLink>,
        options: Options,
    ) -> Pid {
        let parent_pid = parent
            .as_ref()
            .map(|link| link.pid.clone())
            .unwrap_or_else(|| self.pid().clone());
        let token = options
            .token
            .clone()
            .unwrap_or_else(|| self.config().token.clone());

        let context = Context::new(self.clone(), pid.clone(), parent.clone(), token);
        let processor = Arc::new(ActorProcessor::new(
            pid.clone(),
            parent_pid,
            receiver,
            context,
            self.config(),
            options,
        ));
        if !self.registry().add(processor.clone()).await {
            return pid;
        }
        if let Some(parent) = &parent {
            parent.attach(&pid).await;
        }
        processor.start();
        debug!("Actor {} is spawned.", &pid);
        pid
    }

    /// Sends `message` to `to`, with the engine as sender.
    pub async fn send<M: Any + Send + Sync>(&self, to: &Pid, message: M) {
        self.send_message(to, Message::new(message), self.pid().clone())
            .await
    }

    /// Sends `message` to `to` on behalf of `from`. Replies go to `from`.
    pub async fn send_with_sender<M: Any + Send + Sync>(
        &self,
        to: &Pid,
        message: M,
        from: &Pid,
    ) {
        self.send_message(to, Message::new(message), from.clone())
            .await
    }

    pub async fn send_message(&self, to: &Pid, message: Message, from: Pid) {
        self.route(to, message, from, self.config().token.clone())
            .await
    }

    /// Delivers a message. Unknown destinations fall back to the deadletter actor, which sees
    /// the original destination as target.
    pub(crate) async fn route(
        &self,
        to: &Pid,
        message: Message,
        from: Pid,
        token: CancellationToken,
    ) {
        let processor = match self.registry().get(to).await {
            Some(processor) => processor,
            None => match self.registry().get(self.deadletter()).await {
                Some(deadletter) => deadletter,
                None => {
                    warn!(
                        "Message to {} from {} of type {} dropped: no deadletter.",
                        to,
                        &from,
                        message.type_name()
                    );
                    return;
                }
            },
        };

        let type_name = message.type_name();
        let envelope = Envelope::new(to.clone(), from, message).with_token(token);
        if let Err(error) = processor.send(envelope).await {
            warn!(
                "Failed to deliver message of type {} to {}: {}",
                type_name, to, error
            );
        }
    }

    /// Asks the actor `pid` to terminate, together with its descendants. The tracker, if any,
    /// completes once they are all gone.
    pub async fn poison(&self, pid: &Pid, tracker: Option<&TaskTracker>) {
        match self.registry().get(pid).await {
            Some(processor) => processor.shutdown(tracker).await,
            None => debug!("Actor {} not found, nothing to poison.", pid),
        }
    }

    /// Stops every actor: root-level actors and their descendants first, then the bookkeeping
    /// actors. The tracker, if any, completes once the bookkeeping actors are gone.
    pub async fn shutdown(&self, tracker: Option<&TaskTracker>) {
        debug!(
            "Engine {} is shutting down with {} registered actors.",
            self.pid(),
            self.registry().len().await
        );
        let roots = self
            .registry()
            .snapshot()
            .await
            .into_iter()
            .filter(|processor| {
                processor.parent() == Some(self.pid())
                    && processor.pid() != self.pid()
                    && processor.pid() != self.deadletter()
            });

        let subtree = TaskTracker::new();
        for processor in roots {
            processor.shutdown(Some(&subtree)).await;
        }
        subtree.close();
        subtree.wait().await;

        self.poison(self.deadletter(), tracker).await;
        self.poison(self.pid(), tracker).await;
    }

    /// Stops every actor and waits until all of them are gone.
    pub async fn shutdown_and_wait(&self) {
        let tracker = TaskTracker::new();
        self.shutdown(Some(&tracker)).await;
        tracker.close();
        tracker.wait().await;
        debug!("Engine {} is stopped.", self.pid());
    }

    /// Pid of the registered actor with the given name and tags, or the deadletter pid.
    pub async fn get_pid(&self, name: &str, tags: &[&str]) -> Pid {
        let pid = Pid::new(self.address(), name, tags);
        if self.registry().get(&pid).await.is_some() {
            pid
        } else {
            self.deadletter().clone()
        }
    }
}

/// Receiver of the engine actor.
struct EngineActor;

#[async_trait]
impl Receiver for EngineActor {
    async fn receive(&mut self, _ctx: &mut Context) {}
}

/// Receiver of the deadletter actor.
struct DeadLetter;

#[async_trait]
impl Receiver for DeadLetter {
    async fn receive(&mut self, ctx: &mut Context) {
        let Some(message) = ctx.message() else {
            return;
        };
        let lifecycle =
            message.is::<Initialized>() || message.is::<Started>() || message.is::<Stopped>();
        if lifecycle && ctx.target() == ctx.pid() {
            return;
        }
        warn!(
            "Deadletter: message to {} from {} of type {} could not be delivered.",
            ctx.target(),
            ctx.sender(),
            message.type_name()
        );
    }
}
