// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Request / response
//!
//! A request registers a short-lived response processor under a random pid, sends the message
//! with that pid as sender and waits for the first reply. The processor is removed from the
//! registry whatever the outcome.
//!

use crate::{
    Engine, Error, Message, Pid,
    inbox::{Envelope, Payload},
    processor::Processor,
};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::debug;

use std::{any::Any, sync::Arc, time::Duration};

/// Name of response pids, tagged with a random number.
const RESPONSE_NAME: &str = "response";

/// Registry entry collecting a single reply.
struct ResponseProcessor {
    pid: Pid,
    reply: mpsc::Sender<Message>,
}

#[async_trait]
impl Processor for ResponseProcessor {
    fn pid(&self) -> &Pid {
        &self.pid
    }

    fn parent(&self) -> Option<&Pid> {
        None
    }

    fn start(&self) {}

    async fn send(&self, envelope: Envelope) -> Result<(), Error> {
        if let Payload::User(message) = envelope.payload {
            // Only the first reply is kept.
            if self.reply.try_send(message).is_err() {
                debug!("Extra reply to {} dropped.", &self.pid);
            }
        }
        Ok(())
    }

    async fn shutdown(&self, _tracker: Option<&TaskTracker>) {}
}

impl Engine {
    /// Sends `message` to `to` and waits up to `timeout` for the reply.
    ///
    /// The target replies with [`crate::Context::respond`].
    ///
    /// # Errors
    ///
    /// [`Error::RequestTimeout`] if no reply arrives in time, [`Error::RequestCancelled`] if the
    /// engine token is cancelled first.
    pub async fn request<M: Any + Send + Sync>(
        &self,
        to: &Pid,
        message: M,
        timeout: Duration,
    ) -> Result<Message, Error> {
        self.request_message(
            to,
            Message::new(message),
            timeout,
            self.config().token.clone(),
        )
        .await
    }

    pub(crate) async fn request_message(
        &self,
        to: &Pid,
        message: Message,
        timeout: Duration,
        token: CancellationToken,
    ) -> Result<Message, Error> {
        let (reply, mut replies) = mpsc::channel(1);
        let pid = self.register_response(reply).await;

        self.route(to, message, pid.clone(), token.clone()).await;
        let result = tokio::select! {
            outcome = tokio::time::timeout(timeout, replies.recv()) => match outcome {
                Ok(Some(message)) => Ok(message),
                Ok(None) | Err(_) => Err(Error::RequestTimeout(timeout)),
            },
            _ = token.cancelled() => Err(Error::RequestCancelled),
        };

        self.registry().remove(&pid).await;
        if let Err(error) = &result {
            debug!("Request to {} failed: {}", to, error);
        }
        result
    }

    async fn register_response(&self, reply: mpsc::Sender<Message>) -> Pid {
        loop {
            let tag = rand::random::<u32>().to_string();
            let pid = Pid::new(self.address(), RESPONSE_NAME, &[tag.as_str()]);
            let processor = Arc::new(ResponseProcessor {
                pid: pid.clone(),
                reply: reply.clone(),
            });
            if self.registry().add(processor).await {
                return pid;
            }
        }
    }
}
