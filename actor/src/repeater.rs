// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Repeater
//!

use crate::{Engine, Message, Pid};

use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use std::{any::Any, time::Duration};

/// Handle to a message sent periodically. Dropping the handle does not stop it.
#[derive(Debug)]
pub struct Repeater {
    stop: CancellationToken,
}

impl Repeater {
    pub(crate) fn start(
        engine: Engine,
        from: Pid,
        to: Pid,
        message: Message,
        interval: Duration,
    ) -> Self {
        let stop = CancellationToken::new();
        let token = stop.clone();
        tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticks.tick() => {
                        engine.send_message(&to, message.clone(), from.clone()).await;
                    }
                }
            }
            debug!("Repeater from {} to {} stopped.", &from, &to);
        });
        Self { stop }
    }

    /// Stops the repetition. A send already in flight may still land.
    pub fn stop(self) {
        self.stop.cancel();
    }
}

impl Engine {
    /// Sends `message` to `to` every `interval`, with the engine as sender. The first message
    /// goes out after one interval.
    pub fn send_repeat<M: Any + Send + Sync>(
        &self,
        to: &Pid,
        message: M,
        interval: Duration,
    ) -> Repeater {
        Repeater::start(
            self.clone(),
            self.pid().clone(),
            to.clone(),
            Message::new(message),
            interval,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::{Config, Engine, Options};

    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    #[tokio::test]
    async fn test_repeater_ticks_until_stopped() {
        let engine = Engine::new(Config::default()).await;
        let ticks = Arc::new(AtomicUsize::new(0));
        let probe = ticks.clone();
        let pid = engine
            .spawn_func(
                move |ctx| {
                    let probe = probe.clone();
                    Box::pin(async move {
                        if ctx.message_as::<&str>().is_some() {
                            probe.fetch_add(1, Ordering::SeqCst);
                        }
                    })
                },
                "ticker",
                Options::default(),
            )
            .await;

        let repeater = engine.send_repeat(&pid, "tick", Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(105)).await;
        repeater.stop();
        // Let any tick already in flight land.
        tokio::time::sleep(Duration::from_millis(30)).await;
        let seen = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(seen >= 3, "only {} ticks", seen);
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
        engine.shutdown_and_wait().await;
    }
}
