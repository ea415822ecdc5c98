// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Messages
//!
//! Actors exchange type-erased values. A receiver branches on the runtime type of the current
//! message and silently ignores the types it does not know.
//!

use std::{
    any::{Any, type_name},
    fmt::{Debug, Formatter},
    sync::Arc,
};

/// A type-erased message.
///
/// Cloning a `Message` is cheap: the value is shared, which lets the runtime forward the same
/// message or repeat it without copying. The static type name of the wrapped value is kept for
/// diagnostics (deadletter logs, `Debug`).
///
#[derive(Clone)]
pub struct Message {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Message {
    /// Wraps a value.
    pub fn new<M>(value: M) -> Self
    where
        M: Any + Send + Sync,
    {
        Self {
            value: Arc::new(value),
            type_name: type_name::<M>(),
        }
    }

    /// Returns the wrapped value if it is a `M`.
    pub fn downcast_ref<M: Any>(&self) -> Option<&M> {
        self.value.downcast_ref::<M>()
    }

    /// True if the wrapped value is a `M`.
    pub fn is<M: Any>(&self) -> bool {
        self.value.is::<M>()
    }

    /// Name of the wrapped type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl Debug for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Message<{}>", self.type_name)
    }
}

/// First lifecycle message: the actor is (re)initializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Initialized;

/// Second lifecycle message: the actor is ready for user messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Started;

/// Last lifecycle message of an incarnation: the actor failed or is terminating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopped;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Ping(u32);

    #[test]
    fn test_downcast() {
        let msg = Message::new(Ping(7));
        assert_eq!(msg.downcast_ref::<Ping>(), Some(&Ping(7)));
        assert!(msg.downcast_ref::<String>().is_none());
        assert!(msg.is::<Ping>());
        assert!(msg.type_name().ends_with("Ping"));
    }

    #[test]
    fn test_clone_shares_value() {
        let msg = Message::new(String::from("hello"));
        let other = msg.clone();
        assert_eq!(
            other.downcast_ref::<String>().map(String::as_str),
            Some("hello")
        );
        assert_eq!(format!("{:?}", other), "Message<alloc::string::String>");
    }
}
