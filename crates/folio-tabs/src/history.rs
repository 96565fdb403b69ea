//! Closed tab history for undo

use serde::{Deserialize, Serialize};

use crate::tab::TabData;

/// A tab as it was when closed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTab {
    /// Position in the strip before the close batch started
    pub index: usize,
    pub title: String,
    pub data: Option<TabData>,
}

/// LIFO of close batches, oldest batches dropped past `limit`
#[derive(Debug, Clone)]
pub struct HistoryStack {
    batches: Vec<Vec<ClosedTab>>,
    limit: usize,
}

impl HistoryStack {
    pub fn new(limit: usize) -> Self {
        Self {
            batches: Vec::new(),
            limit,
        }
    }

    pub fn push(&mut self, batch: Vec<ClosedTab>) {
        self.batches.push(batch);

        if self.batches.len() > self.limit {
            let overflow = self.batches.len() - self.limit;
            self.batches.drain(0..overflow);
        }
    }

    pub fn pop(&mut self) -> Option<Vec<ClosedTab>> {
        self.batches.pop()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}
