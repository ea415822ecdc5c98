// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Registry
//!
//! Directory of the live processors of an engine, keyed by pid id.
//!

use crate::{Pid, processor::Processor};

use tokio::sync::RwLock;
use tracing::warn;

use std::{collections::HashMap, sync::Arc};

/// Handle stored in the registry.
pub(crate) type ProcessorRef = Arc<dyn Processor>;

#[derive(Default)]
pub(crate) struct Registry {
    lookup: RwLock<HashMap<String, ProcessorRef>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn get(&self, pid: &Pid) -> Option<ProcessorRef> {
        let lookup = self.lookup.read().await;
        lookup.get(pid.id()).cloned()
    }

    /// Registers a processor. Returns `false`, leaving the existing entry in place, if the id is
    /// already taken.
    pub(crate) async fn add(&self, processor: ProcessorRef) -> bool {
        let mut lookup = self.lookup.write().await;
        let id = processor.pid().id().to_owned();
        if lookup.contains_key(&id) {
            warn!("Actor '{}' already exists!", processor.pid());
            return false;
        }
        lookup.insert(id, processor);
        true
    }

    pub(crate) async fn remove(&self, pid: &Pid) {
        let mut lookup = self.lookup.write().await;
        lookup.remove(pid.id());
    }

    /// Point-in-time copy of every registered processor.
    pub(crate) async fn snapshot(&self) -> Vec<ProcessorRef> {
        let lookup = self.lookup.read().await;
        lookup.values().cloned().collect()
    }

    pub(crate) async fn len(&self) -> usize {
        self.lookup.read().await.len()
    }
}
