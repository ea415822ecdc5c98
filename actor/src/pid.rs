// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Process identifier
//!
//! The `pid` module provides the `Pid` type. A `Pid` locates an actor inside the engine's
//! address space through a dotted path of names and tags.
//!

use serde::{Deserialize, Serialize};

use std::fmt::{Error, Formatter};

/// Address used when none is given.
pub const LOCAL_ADDRESS: &str = "local";

/// Separator between the segments of a `Pid` id.
pub const PID_SEPARATOR: &str = ".";

/// Hierarchical identifier of an actor.
///
/// A `Pid` is made of the engine address and an id built by joining a name and its tags with
/// [`PID_SEPARATOR`]. Child actors extend the id of their parent, so `parent` spawning `child`
/// yields the id `parent.child`. Uniqueness comes from this path construction, never from random
/// assignment.
///
/// `Pid` values are immutable. Equality is structural over both fields.
///
/// The default value has both fields empty and is the "zero" pid, used to mark a message without
/// a sender.
///
/// # Examples
///
/// ```ignore
/// use actor::Pid;
///
/// let parent = Pid::new("", "parent", &[]);
/// let child = parent.child("child", &["1"]);
/// assert_eq!(child.id(), "parent.child.1");
/// assert_eq!(child.to_string(), "local.parent.child.1");
/// ```
///
#[derive(
    Clone, Default, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Pid {
    address: String,
    id: String,
}

impl Pid {
    /// Creates a pid whose id is `name` followed by `tags`, joined by the separator.
    /// An empty address is replaced by [`LOCAL_ADDRESS`], so for an empty address the display
    /// form is `local.<id>` rather than `.<id>`.
    pub fn new(address: &str, name: &str, tags: &[&str]) -> Self {
        let address = if address.is_empty() {
            LOCAL_ADDRESS
        } else {
            address
        };
        let mut segments = Vec::with_capacity(tags.len() + 1);
        segments.push(name);
        segments.extend_from_slice(tags);

        Pid {
            address: address.to_owned(),
            id: segments.join(PID_SEPARATOR),
        }
    }

    /// Derives the pid of a child actor by appending `name` and `tags` to this id.
    pub fn child(&self, name: &str, tags: &[&str]) -> Self {
        let mut segments = Vec::with_capacity(tags.len() + 1);
        segments.push(name);
        segments.extend_from_slice(tags);

        Pid {
            address: self.address.clone(),
            id: format!("{}{}{}", self.id, PID_SEPARATOR, segments.join(PID_SEPARATOR)),
        }
    }

    /// The address space this pid belongs to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The dotted id, without the address.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// True for the uninitialized pid (both fields empty).
    pub fn is_zero(&self) -> bool {
        self.address.is_empty() && self.id.is_empty()
    }
}

impl std::fmt::Display for Pid {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}{}{}", self.address, PID_SEPARATOR, self.id)
    }
}

impl std::fmt::Debug for Pid {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}{}{}", self.address, PID_SEPARATOR, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_without_tags() {
        let pid = Pid::new(LOCAL_ADDRESS, "foo", &[]);
        assert_eq!(pid.id(), "foo");
        assert_eq!(pid.address(), LOCAL_ADDRESS);
    }

    #[test]
    fn new_joins_tags() {
        let pid = Pid::new(LOCAL_ADDRESS, "foo", &["bar", "baz"]);
        assert_eq!(pid.id(), "foo.bar.baz");
    }

    #[test]
    fn empty_address_is_local() {
        let pid = Pid::new("", "foo", &[]);
        assert_eq!(pid.address(), LOCAL_ADDRESS);
        assert_eq!(pid.to_string(), "local.foo");
    }

    #[test]
    fn child_appends_segments() {
        let parent = Pid::new(LOCAL_ADDRESS, "parent", &[]);
        for name in ["child", "a", "worker-1"] {
            let child = parent.child(name, &[]);
            assert_eq!(child.id(), format!("{}.{}", parent.id(), name));
            assert_eq!(child.address(), parent.address());
        }

        let tagged = parent.child("child", &["1", "2"]);
        assert_eq!(tagged.id(), "parent.child.1.2");
        assert_eq!(tagged, Pid::new(LOCAL_ADDRESS, "parent", &["child", "1", "2"]));
    }

    #[test]
    fn to_string_includes_address() {
        let pid = Pid::new("remote", "foo", &["bar"]);
        assert_eq!(pid.to_string(), "remote.foo.bar");
        assert_eq!(format!("{:?}", pid), "remote.foo.bar");
    }

    #[test]
    fn equality_is_structural() {
        let a = Pid::new(LOCAL_ADDRESS, "foo", &["bar"]);
        let b = Pid::new(LOCAL_ADDRESS, "foo.bar", &[]);
        let c = Pid::new("other", "foo", &["bar"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn zero_pid() {
        assert!(Pid::default().is_zero());
        assert!(!Pid::new("", "foo", &[]).is_zero());
    }
}
