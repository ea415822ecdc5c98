// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Configuration
//!
//! [`Config`] holds the engine-wide defaults, [`Options`] the per-spawn overrides. Every
//! override left unset falls back to the engine value.
//!

use crate::{Middleware, pid::LOCAL_ADDRESS};

use tokio_util::sync::CancellationToken;
use tracing::Span;

use std::{sync::Arc, time::Duration};

/// Default mailbox capacity.
pub const DEFAULT_INBOX_SIZE: usize = 1024;

/// Default mailbox capacity of the deadletter actor, which absorbs all misrouted traffic.
pub const DEFAULT_DEADLETTER_INBOX_SIZE: usize = 8 * DEFAULT_INBOX_SIZE;

/// Default number of restarts before an actor is terminated.
pub const DEFAULT_MAX_RESTARTS: u32 = 3;

/// Default wait between a fault and the restart.
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_millis(500);

/// Engine-wide configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address space of every pid created by the engine.
    pub address: String,
    /// Mailbox capacity of spawned actors.
    pub inbox_size: usize,
    /// Mailbox capacity of the deadletter actor.
    pub deadletter_inbox_size: usize,
    /// Restarts allowed before an actor is terminated. `0` disables restarts.
    pub max_restarts: u32,
    /// Wait before restarting a faulted actor.
    pub restart_delay: Duration,
    /// Cancellation token attached to messages sent through the engine.
    pub token: CancellationToken,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: LOCAL_ADDRESS.to_owned(),
            inbox_size: DEFAULT_INBOX_SIZE,
            deadletter_inbox_size: DEFAULT_DEADLETTER_INBOX_SIZE,
            max_restarts: DEFAULT_MAX_RESTARTS,
            restart_delay: DEFAULT_RESTART_DELAY,
            token: CancellationToken::new(),
        }
    }
}

impl Config {
    pub fn with_address(mut self, address: &str) -> Self {
        self.address = address.to_owned();
        self
    }

    pub fn with_inbox_size(mut self, size: usize) -> Self {
        self.inbox_size = size;
        self
    }

    pub fn with_deadletter_inbox_size(mut self, size: usize) -> Self {
        self.deadletter_inbox_size = size;
        self
    }

    pub fn with_max_restarts(mut self, max_restarts: u32) -> Self {
        self.max_restarts = max_restarts;
        self
    }

    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }
}

/// Per-spawn options.
///
/// ```ignore
/// let options = Options::default()
///     .with_max_restarts(0)
///     .with_tags(&["bar"])
///     .with_middleware(Trace);
/// ```
#[derive(Clone, Default)]
pub struct Options {
    pub(crate) inbox_size: Option<usize>,
    pub(crate) max_restarts: Option<u32>,
    pub(crate) restart_delay: Option<Duration>,
    pub(crate) middleware: Vec<Arc<dyn Middleware>>,
    pub(crate) tags: Vec<String>,
    pub(crate) token: Option<CancellationToken>,
    pub(crate) span: Option<Span>,
}

impl Options {
    pub fn with_inbox_size(mut self, size: usize) -> Self {
        self.inbox_size = Some(size);
        self
    }

    pub fn with_max_restarts(mut self, max_restarts: u32) -> Self {
        self.max_restarts = Some(max_restarts);
        self
    }

    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = Some(delay);
        self
    }

    /// Appends a middleware. Middleware runs in the order it was added.
    pub fn with_middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared middleware.
    pub fn with_shared_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Appends tags to the actor's name.
    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags.extend(tags.iter().map(|tag| tag.to_string()));
        self
    }

    /// Base cancellation token of the actor.
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Span the actor's processing runs in.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub(crate) fn tag_refs(&self) -> Vec<&str> {
        self.tags.iter().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.address, LOCAL_ADDRESS);
        assert_eq!(config.inbox_size, 1024);
        assert_eq!(config.max_restarts, 3);
        assert_eq!(config.restart_delay, Duration::from_millis(500));
        assert!(config.deadletter_inbox_size > config.inbox_size);
    }

    #[test]
    fn test_options_accumulate() {
        let options = Options::default()
            .with_tags(&["a"])
            .with_tags(&["b", "c"])
            .with_max_restarts(0);
        assert_eq!(options.tag_refs(), vec!["a", "b", "c"]);
        assert_eq!(options.max_restarts, Some(0));
        assert!(options.inbox_size.is_none());
    }
}
