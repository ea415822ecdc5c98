// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Inbox
//!
//! Bounded mailbox feeding a single consumer. Senders wait while the mailbox is full, the
//! consumer drains envelopes strictly in the order they were accepted.
//!

use crate::{Error, Message, Pid};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::{sync::CancellationToken, task::task_tracker::TaskTrackerToken};
use tracing::debug;

use std::sync::{Mutex, MutexGuard};

/// What an envelope carries.
#[derive(Debug)]
pub(crate) enum Payload {
    /// A message for the receiver.
    User(Message),
    /// Runs the lifecycle sequence without delivering anything else.
    KickOff,
    /// Terminates the actor. The token is released once cleanup is done.
    Poison(Option<TaskTrackerToken>),
}

/// Unit of transport through a mailbox.
#[derive(Debug)]
pub struct Envelope {
    /// Destination pid.
    pub to: Pid,
    /// Sender pid, zero when there is none.
    pub from: Pid,
    /// Cancellation scope attached by the sender.
    pub token: CancellationToken,
    pub(crate) payload: Payload,
}

impl Envelope {
    /// Creates an envelope carrying a user message.
    pub fn new(to: Pid, from: Pid, message: Message) -> Self {
        Self::with_payload(to, from, Payload::User(message), CancellationToken::new())
    }

    pub(crate) fn with_payload(
        to: Pid,
        from: Pid,
        payload: Payload,
        token: CancellationToken,
    ) -> Self {
        Self {
            to,
            from,
            token,
            payload,
        }
    }

    /// Replaces the cancellation token.
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// The user message, if this envelope carries one.
    pub fn message(&self) -> Option<&Message> {
        match &self.payload {
            Payload::User(message) => Some(message),
            _ => None,
        }
    }
}

/// Single consumer of an inbox.
#[async_trait]
pub trait Consumer: Send + 'static {
    /// Processes one envelope. Never called concurrently.
    async fn process(&mut self, envelope: Envelope);
}

/// Bounded FIFO mailbox.
pub struct Inbox {
    /// `None` once closed.
    sender: Mutex<Option<mpsc::Sender<Envelope>>>,
    /// Taken by the first `process` call.
    receiver: Mutex<Option<mpsc::Receiver<Envelope>>>,
    capacity: usize,
    /// Cancelled when the drain task returns.
    drained: CancellationToken,
}

impl Inbox {
    /// Creates an inbox holding at most `capacity` envelopes (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
            capacity,
            drained: CancellationToken::new(),
        }
    }

    /// Starts the drain task. Only the first call has an effect.
    pub fn process<C: Consumer>(&self, mut consumer: C) {
        let Some(mut receiver) = lock(&self.receiver).take() else {
            return;
        };
        let drained = self.drained.clone();
        tokio::spawn(async move {
            while let Some(envelope) = receiver.recv().await {
                consumer.process(envelope).await;
            }
            debug!("Inbox drained.");
            drained.cancel();
        });
    }

    /// Enqueues an envelope, waiting while the inbox is full.
    ///
    /// # Errors
    ///
    /// Returns `Error::InboxClosed` if the inbox was closed.
    ///
    pub async fn deliver(&self, envelope: Envelope) -> Result<(), Error> {
        let sender = self.sender()?;
        sender.send(envelope).await.map_err(|_| Error::InboxClosed)
    }

    /// Enqueues an envelope only if there is room right now.
    ///
    /// # Errors
    ///
    /// Returns `Error::InboxClosed` if the inbox was closed, `Error::InboxFull` if it is at
    /// capacity.
    ///
    pub fn try_deliver(&self, envelope: Envelope) -> Result<(), Error> {
        let sender = self.sender()?;
        sender.try_send(envelope).map_err(|error| match error {
            mpsc::error::TrySendError::Full(_) => Error::InboxFull,
            mpsc::error::TrySendError::Closed(_) => Error::InboxClosed,
        })
    }

    /// Stops accepting envelopes. Already queued envelopes are still processed.
    pub fn close(&self) {
        if lock(&self.sender).take().is_some() {
            debug!("Inbox closed.");
        }
    }

    /// Closes the inbox and waits until every queued envelope has been processed.
    pub async fn drain(&self) {
        self.close();
        let started = lock(&self.receiver).is_none();
        if started {
            self.drained.cancelled().await;
        }
    }

    /// True once `close` has been called.
    pub fn is_closed(&self) -> bool {
        lock(&self.sender).is_none()
    }

    /// Number of queued envelopes (zero once closed).
    pub fn len(&self) -> usize {
        lock(&self.sender)
            .as_ref()
            .map(|sender| self.capacity - sender.capacity())
            .unwrap_or(0)
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of queued envelopes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn sender(&self) -> Result<mpsc::Sender<Envelope>, Error> {
        lock(&self.sender).clone().ok_or(Error::InboxClosed)
    }
}

/// Locks a mutex whose critical sections never panic.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
