// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Actor context
//!
//! The [`Context`] is the actor's view of the message being processed and its window to the rest
//! of the engine: replying, sending, spawning children and issuing requests all go through it.
//!

use crate::{
    Engine, Error, FnReceiver, Message, Pid, Receiver, Repeater,
    config::Options,
};

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use std::{
    any::Any,
    collections::HashMap,
    sync::{Arc, Weak},
    time::Duration,
};

/// Children of an actor, keyed by pid id.
pub(crate) type ChildMap = Arc<RwLock<HashMap<String, Pid>>>;

/// Link from a child to its parent's child map.
#[derive(Clone)]
pub(crate) struct ParentLink {
    pub(crate) pid: Pid,
    children: Weak<RwLock<HashMap<String, Pid>>>,
}

impl ParentLink {
    /// Records `child` in the parent's child map.
    pub(crate) async fn attach(&self, child: &Pid) {
        if let Some(children) = self.children.upgrade() {
            children
                .write()
                .await
                .insert(child.id().to_owned(), child.clone());
        }
    }

    async fn detach(&self, child: &Pid) {
        if let Some(children) = self.children.upgrade() {
            children.write().await.remove(child.id());
        }
    }
}

/// Per-actor context.
///
/// Created once per actor and reused for every message; the message, the sender, the target and
/// the cancellation token are replaced before each dispatch.
pub struct Context {
    pid: Pid,
    sender: Pid,
    target: Pid,
    message: Option<Message>,
    token: CancellationToken,
    engine: Engine,
    parent: Option<ParentLink>,
    children: ChildMap,
}

impl Context {
    pub(crate) fn new(
        engine: Engine,
        pid: Pid,
        parent: Option<ParentLink>,
        token: CancellationToken,
    ) -> Self {
        Self {
            target: pid.clone(),
            pid,
            sender: Pid::default(),
            message: None,
            token,
            engine,
            parent,
            children: ChildMap::default(),
        }
    }

    pub(crate) fn prepare(
        &mut self,
        message: Message,
        sender: Pid,
        target: Pid,
        token: CancellationToken,
    ) {
        self.message = Some(message);
        self.sender = sender;
        self.target = target;
        self.token = token;
    }

    /// Removes the actor from its parent's children.
    pub(crate) async fn detach(&self) {
        if let Some(parent) = &self.parent {
            parent.detach(&self.pid).await;
        }
    }

    /// The message being processed.
    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    /// The message being processed, if it is a `T`.
    pub fn message_as<T: Any>(&self) -> Option<&T> {
        self.message.as_ref().and_then(Message::downcast_ref)
    }

    /// Sender of the current message. A zero pid when there is none, as for lifecycle messages.
    pub fn sender(&self) -> &Pid {
        &self.sender
    }

    /// Destination the current message was addressed to.
    ///
    /// Equal to [`Context::pid`] except for the deadletter actor, which sees the original,
    /// unreachable destination.
    pub fn target(&self) -> &Pid {
        &self.target
    }

    pub fn pid(&self) -> &Pid {
        &self.pid
    }

    /// Parent of the actor. Root-level actors report the engine pid.
    pub fn parent(&self) -> &Pid {
        match &self.parent {
            Some(parent) => &parent.pid,
            None => self.engine.pid(),
        }
    }

    /// Live child with the given name and tags, if any.
    pub async fn child(&self, name: &str, tags: &[&str]) -> Option<Pid> {
        let id = self.pid.child(name, tags);
        self.children.read().await.get(id.id()).cloned()
    }

    /// Every live child.
    pub async fn children(&self) -> Vec<Pid> {
        self.children.read().await.values().cloned().collect()
    }

    /// Cancellation token of the current message.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.token
    }

    /// Replaces the cancellation token for the rest of the current dispatch, and for anything
    /// sent from it.
    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.token = token;
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Sends `message` to `to`, with this actor as sender.
    pub async fn send<M: Any + Send + Sync>(&self, to: &Pid, message: M) {
        self.send_message(to, Message::new(message)).await
    }

    pub async fn send_message(&self, to: &Pid, message: Message) {
        self.engine
            .route(to, message, self.pid.clone(), self.token.clone())
            .await
    }

    /// Re-sends the current message to `to`, keeping the original sender.
    pub async fn forward(&self, to: &Pid) {
        let Some(message) = &self.message else {
            return;
        };
        self.engine
            .route(to, message.clone(), self.sender.clone(), self.token.clone())
            .await
    }

    /// Replies to the sender of the current message.
    pub async fn respond<M: Any + Send + Sync>(&self, message: M) {
        if self.sender.is_zero() {
            warn!(
                "Actor {} cannot respond: the current message has no sender.",
                &self.pid
            );
            return;
        }
        self.send(&self.sender, message).await
    }

    /// Spawns a child actor whose id extends this actor's id.
    pub async fn spawn<R: Receiver>(
        &self,
        receiver: R,
        name: &str,
        options: Options,
    ) -> Pid {
        let pid = self.pid.child(name, &options.tag_refs());
        let parent = ParentLink {
            pid: self.pid.clone(),
            children: Arc::downgrade(&self.children),
        };
        self.engine
            .spawn_processor(Box::new(receiver), pid, Some(parent), options)
            .await
    }

    /// Spawns a child actor from a function.
    pub async fn spawn_func<F>(&self, f: F, name: &str, options: Options) -> Pid
    where
        F: for<'a> FnMut(&'a mut Context) -> BoxFuture<'a, ()> + Send + 'static,
    {
        self.spawn(FnReceiver::new(f), name, options).await
    }

    /// Sends `message` to `to` and waits for the reply. The wait also ends when the current
    /// cancellation token is cancelled.
    pub async fn request<M: Any + Send + Sync>(
        &self,
        to: &Pid,
        message: M,
        timeout: Duration,
    ) -> Result<Message, Error> {
        self.engine
            .request_message(to, Message::new(message), timeout, self.token.clone())
            .await
    }

    /// Sends `message` to `to` every `interval`, with this actor as sender.
    pub fn send_repeat<M: Any + Send + Sync>(
        &self,
        to: &Pid,
        message: M,
        interval: Duration,
    ) -> Repeater {
        Repeater::start(
            self.engine.clone(),
            self.pid.clone(),
            to.clone(),
            Message::new(message),
            interval,
        )
    }

    /// Pid of the actor with the given name and tags, or the deadletter pid.
    pub async fn get_pid(&self, name: &str, tags: &[&str]) -> Pid {
        self.engine.get_pid(name, tags).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{Config, Started, Stopped};

    use std::sync::Mutex;

    #[tokio::test]
    async fn test_children_are_tracked() {
        let engine = Engine::new(Config::default()).await;
        let observed = Arc::new(Mutex::new(Vec::new()));
        let probe = observed.clone();

        let parent = engine
            .spawn_func(
                move |ctx| {
                    let probe = probe.clone();
                    Box::pin(async move {
                        if ctx.message_as::<Started>().is_some() {
                            let child = ctx
                                .spawn_func(
                                    |_| Box::pin(async {}),
                                    "child",
                                    Options::default().with_tags(&["1"]),
                                )
                                .await;
                            let found = ctx.child("child", &["1"]).await;
                            let children = ctx.children().await;
                            probe.lock().unwrap().push((child, found, children));
                        }
                    })
                },
                "parent",
                Options::default(),
            )
            .await;

        engine.shutdown_and_wait().await;

        let observed = observed.lock().unwrap();
        assert_eq!(observed.len(), 1);
        let (child, found, children) = &observed[0];
        assert_eq!(child.id(), "parent.child.1");
        assert_eq!(child.address(), parent.address());
        assert_eq!(found.as_ref(), Some(child));
        assert_eq!(children, &vec![child.clone()]);
    }

    #[tokio::test]
    async fn test_parent_of_root_and_child() {
        let engine = Engine::new(Config::default()).await;
        let parents = Arc::new(Mutex::new(Vec::new()));
        let outer = parents.clone();

        engine
            .spawn_func(
                move |ctx| {
                    let outer = outer.clone();
                    Box::pin(async move {
                        if ctx.message_as::<Started>().is_some() {
                            outer.lock().unwrap().push(ctx.parent().clone());
                            let inner = outer.clone();
                            ctx.spawn_func(
                                move |ctx| {
                                    let inner = inner.clone();
                                    Box::pin(async move {
                                        if ctx.message_as::<Started>().is_some() {
                                            inner.lock().unwrap().push(ctx.parent().clone());
                                        }
                                    })
                                },
                                "child",
                                Options::default(),
                            )
                            .await;
                        }
                    })
                },
                "root",
                Options::default(),
            )
            .await;

        let probe = parents.clone();
        for _ in 0..200 {
            if probe.lock().unwrap().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        engine.shutdown_and_wait().await;

        let parents = parents.lock().unwrap();
        assert_eq!(parents[0], *engine.pid());
        assert_eq!(parents[1].id(), "root");
    }

    #[tokio::test]
    async fn test_child_removed_when_stopped() {
        let engine = Engine::new(Config::default()).await;
        let parent = engine
            .spawn_func(
                |ctx| {
                    Box::pin(async move {
                        if ctx.message_as::<Started>().is_some() {
                            ctx.spawn_func(|_| Box::pin(async {}), "child", Options::default())
                                .await;
                        } else if ctx.message_as::<&str>().is_some() {
                            let count = ctx.children().await.len();
                            ctx.respond(count).await;
                        }
                    })
                },
                "parent",
                Options::default(),
            )
            .await;
        let timeout = Duration::from_secs(1);

        let before = engine.request(&parent, "count", timeout).await.unwrap();
        assert_eq!(before.downcast_ref::<usize>(), Some(&1));

        let child = engine.get_pid("parent.child", &[]).await;
        assert_ne!(&child, engine.deadletter());
        let tracker = tokio_util::task::TaskTracker::new();
        engine.poison(&child, Some(&tracker)).await;
        tracker.close();
        tracker.wait().await;

        let after = engine.request(&parent, "count", timeout).await.unwrap();
        assert_eq!(after.downcast_ref::<usize>(), Some(&0));
        engine.shutdown_and_wait().await;
    }

    #[tokio::test]
    async fn test_respond_without_sender() {
        let engine = Engine::new(Config::default()).await;
        let stopped = Arc::new(Mutex::new(false));
        let probe = stopped.clone();
        engine
            .spawn_func(
                move |ctx| {
                    let probe = probe.clone();
                    Box::pin(async move {
                        if ctx.message_as::<Started>().is_some() {
                            assert!(ctx.sender().is_zero());
                            // Dropped with a warning.
                            ctx.respond("nobody").await;
                        } else if ctx.message_as::<Stopped>().is_some() {
                            *probe.lock().unwrap() = true;
                        }
                    })
                },
                "lonely",
                Options::default(),
            )
            .await;
        engine.shutdown_and_wait().await;
        assert!(*stopped.lock().unwrap());
    }
}
