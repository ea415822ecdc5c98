// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Actor processor
//!
//! A processor is the execution unit behind a pid. It is split in two halves:
//!
//! - the [`ActorProcessor`] handle, stored in the registry and shared with every sender, which
//!   owns the mailbox;
//! - the `Runner`, moved into the mailbox drain task on start, which owns the receiver, the
//!   middleware chain and the actor's [`Context`] and drives the lifecycle.
//!
//! ## Lifecycle
//!
//! ```text
//!  Created ──► Initialized ──► Started ──► Stopped (terminated)
//!                  ▲                │
//!                  └──── Stopped ◄──┘  (fault, restart budget left)
//! ```
//!
//! The `Initialized` and `Started` transitions happen inside the normal dispatch path: a kick-off
//! envelope is the first thing queued in every mailbox, and any envelope dispatched while the
//! actor is not started first delivers the missing lifecycle messages. User messages only reach
//! the receiver once the actor is `Started`.
//!
//! ## Failures
//!
//! A panic raised while dispatching is caught at the processor boundary. An actor that was
//! started receives `Stopped`, then either waits for its restart delay and resequences, or is
//! terminated once its restart budget is spent.
//!

use crate::{
    Context, Error, Initialized, Message, Pid, Receiver, Started, Stopped,
    config::{Config, Options},
    inbox::{Consumer, Envelope, Inbox, Payload},
    middleware::{MiddlewareChain, Next},
};

use async_trait::async_trait;
use futures::FutureExt;
use tokio_util::{
    sync::CancellationToken,
    task::{TaskTracker, task_tracker::TaskTrackerToken},
};
use tracing::{Instrument, Span, debug, debug_span, error, warn};

use std::{
    any::Any,
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex},
    time::Duration,
};

/// Contract shared by everything that can be registered under a pid.
#[async_trait]
pub(crate) trait Processor: Send + Sync {
    fn pid(&self) -> &Pid;

    /// Pid of the supervising actor, the engine pid for root-level actors.
    fn parent(&self) -> Option<&Pid>;

    /// Starts processing. Only the first call has an effect.
    fn start(&self);

    async fn send(&self, envelope: Envelope) -> Result<(), Error>;

    /// Asks the processor to terminate. The tracker, if any, tracks the termination.
    async fn shutdown(&self, tracker: Option<&TaskTracker>);
}

/// Actor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    Created,
    Initialized,
    Started,
    Stopped,
}

/// Registered half of an actor.
pub(crate) struct ActorProcessor {
    pid: Pid,
    parent: Pid,
    inbox: Arc<Inbox>,
    runner: Mutex<Option<Runner>>,
}

impl ActorProcessor {
    pub(crate) fn new(
        pid: Pid,
        parent: Pid,
        receiver: Box<dyn Receiver>,
        context: Context,
        config: &Config,
        options: Options,
    ) -> Self {
        debug!("Creating new actor {} processor.", &pid);
        let inbox = Arc::new(Inbox::new(
            options.inbox_size.unwrap_or(config.inbox_size),
        ));
        let token = options
            .token
            .clone()
            .unwrap_or_else(|| config.token.clone());

        // Queued before anyone can reach the actor, so the lifecycle runs first.
        if let Err(error) = inbox.try_deliver(kick_off(&pid, &token)) {
            error!("Failed to queue kick-off for actor {}: {}", &pid, error);
        }

        let span = options
            .span
            .clone()
            .unwrap_or_else(|| debug_span!("actor", pid = %pid));
        let runner = Runner {
            pid: pid.clone(),
            state: Lifecycle::Created,
            restarts: 0,
            terminated: false,
            max_restarts: options.max_restarts.unwrap_or(config.max_restarts),
            restart_delay: options
                .restart_delay
                .unwrap_or(config.restart_delay),
            middleware: options.middleware.into(),
            receiver,
            context,
            inbox: inbox.clone(),
            token,
            span,
        };

        Self {
            pid,
            parent,
            inbox,
            runner: Mutex::new(Some(runner)),
        }
    }
}

#[async_trait]
impl Processor for ActorProcessor {
    fn pid(&self) -> &Pid {
        &self.pid
    }

    fn parent(&self) -> Option<&Pid> {
        Some(&self.parent)
    }

    fn start(&self) {
        let runner = self
            .runner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(runner) = runner {
            debug!("Starting actor {}.", &self.pid);
            self.inbox.process(runner);
        }
    }

    async fn send(&self, envelope: Envelope) -> Result<(), Error> {
        self.inbox.deliver(envelope).await
    }

    async fn shutdown(&self, tracker: Option<&TaskTracker>) {
        let envelope = Envelope::with_payload(
            self.pid.clone(),
            Pid::default(),
            Payload::Poison(tracker.map(TaskTracker::token)),
            CancellationToken::new(),
        );
        // On failure the envelope, and its tracker token, is dropped here.
        if let Err(error) = self.inbox.deliver(envelope).await {
            debug!("Actor {} already stopping: {}", &self.pid, error);
        }
    }
}

/// Half of an actor owned by its drain task.
pub(crate) struct Runner {
    pid: Pid,
    state: Lifecycle,
    restarts: u32,
    /// Set by cleanup; nothing is dispatched afterwards.
    terminated: bool,
    max_restarts: u32,
    restart_delay: Duration,
    middleware: MiddlewareChain,
    receiver: Box<dyn Receiver>,
    context: Context,
    inbox: Arc<Inbox>,
    /// Base cancellation token, used for lifecycle messages.
    token: CancellationToken,
    span: Span,
}

#[async_trait]
impl Consumer for Runner {
    async fn process(&mut self, envelope: Envelope) {
        let span = self.span.clone();
        self.handle(envelope).instrument(span).await
    }
}

impl Runner {
    async fn handle(&mut self, envelope: Envelope) {
        if self.terminated {
            debug!(
                "Actor {} is terminated, dropping envelope from {}.",
                &self.pid, &envelope.from
            );
            return;
        }

        let Envelope {
            to,
            from,
            token,
            payload,
        } = envelope;
        let message = match payload {
            Payload::Poison(completion) => {
                debug!("Actor {} received poison.", &self.pid);
                self.cleanup(completion).await;
                return;
            }
            Payload::KickOff => None,
            Payload::User(message) => Some(message),
        };

        let result = AssertUnwindSafe(self.dispatch(message, from, to, token))
            .catch_unwind()
            .await;
        if let Err(panic) = result {
            self.recover(panic_reason(panic.as_ref())).await;
        }
    }

    /// Brings the actor to `Started`, then delivers the message, if any.
    async fn dispatch(
        &mut self,
        message: Option<Message>,
        from: Pid,
        to: Pid,
        token: CancellationToken,
    ) {
        loop {
            match self.state {
                Lifecycle::Created | Lifecycle::Stopped => {
                    self.prepare_lifecycle(Message::new(Initialized));
                    self.invoke().await;
                    self.state = Lifecycle::Initialized;
                    debug!("Actor {} is initialized.", &self.pid);
                }
                Lifecycle::Initialized => {
                    self.prepare_lifecycle(Message::new(Started));
                    self.invoke().await;
                    self.state = Lifecycle::Started;
                    debug!("Actor {} is started.", &self.pid);
                }
                Lifecycle::Started => break,
            }
        }

        if let Some(message) = message {
            self.context.prepare(message, from, to, token);
            self.invoke().await;
        }
    }

    /// Runs the middleware chain and the receiver on the current context.
    async fn invoke(&mut self) {
        Next::new(&self.middleware, self.receiver.as_mut())
            .run(&mut self.context)
            .await
    }

    fn prepare_lifecycle(&mut self, message: Message) {
        self.context.prepare(
            message,
            Pid::default(),
            self.pid.clone(),
            self.token.clone(),
        );
    }

    /// Delivers `Stopped`. A panic here is logged and otherwise ignored.
    async fn notify_stopped(&mut self) {
        self.prepare_lifecycle(Message::new(Stopped));
        if let Err(panic) = AssertUnwindSafe(self.invoke()).catch_unwind().await {
            error!(
                "Actor {} panicked while stopping: {}",
                &self.pid,
                panic_reason(panic.as_ref())
            );
        }
    }

    async fn recover(&mut self, reason: String) {
        error!("Actor {} is faulty: {}", &self.pid, reason);
        if self.state == Lifecycle::Started {
            self.notify_stopped().await;
        }
        self.state = Lifecycle::Stopped;

        self.restarts += 1;
        if self.restarts > self.max_restarts {
            error!(
                "Actor {} exceeded max restarts ({}), shutting down.",
                &self.pid, self.max_restarts
            );
            self.cleanup(None).await;
            return;
        }

        warn!(
            "Actor {} restarting: count: {}; max restarts: {}",
            &self.pid, self.restarts, self.max_restarts
        );
        tokio::time::sleep(self.restart_delay).await;

        // Queued messages resequence the actor on their own.
        if self.inbox.is_empty() {
            if let Err(error) =
                self.inbox.try_deliver(kick_off(&self.pid, &self.token))
            {
                debug!("Kick-off for actor {} not queued: {}", &self.pid, error);
            }
        }
    }

    /// Terminates the actor. Only the first call has an effect.
    async fn cleanup(&mut self, completion: Option<TaskTrackerToken>) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        let engine = self.context.engine().clone();
        engine.registry().remove(&self.pid).await;
        self.inbox.close();
        self.context.detach().await;

        let tracker = completion.as_ref().map(TaskTrackerToken::task_tracker);
        for child in self.context.children().await {
            if &child == engine.deadletter() {
                continue;
            }
            if let Some(processor) = engine.registry().get(&child).await {
                processor.shutdown(tracker).await;
            }
        }

        if self.state == Lifecycle::Started {
            self.notify_stopped().await;
        }
        self.state = Lifecycle::Stopped;
        debug!("Actor {} is terminated.", &self.pid);
    }
}

fn kick_off(pid: &Pid, token: &CancellationToken) -> Envelope {
    Envelope::with_payload(
        pid.clone(),
        pid.clone(),
        Payload::KickOff,
        token.clone(),
    )
}

fn panic_reason(panic: &(dyn Any + Send)) -> String {
    if let Some(reason) = panic.downcast_ref::<String>() {
        reason.clone()
    } else if let Some(reason) = panic.downcast_ref::<&str>() {
        (*reason).to_string()
    } else {
        "unknown panic".to_string()
    }
}
