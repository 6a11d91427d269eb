//! Bounded FIFO of the most recent transactions

use crate::types::transaction::Transaction;
use std::collections::vec_deque::{self, VecDeque};

/// Sliding window over the transaction feed.
///
/// Holds at most `capacity` transactions; the oldest is evicted first.
#[derive(Debug, Clone)]
pub struct TransactionWindow {
    entries: VecDeque<Transaction>,
    capacity: usize,
}

impl TransactionWindow {
    /// Create an empty window. A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a transaction, evicting the oldest on overflow.
    ///
    /// Returns the evicted transaction, if any.
    pub fn ingest(&mut self, transaction: Transaction) -> Option<Transaction> {
        self.entries.push_back(transaction);
        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> vec_deque::Iter<'_, Transaction> {
        self.entries.iter()
    }

    /// The last `count` transactions, oldest first
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &Transaction> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for TransactionWindow {
    fn default() -> Self {
        Self::new(50)
    }
}

impl<'a> IntoIterator for &'a TransactionWindow {
    type Item = &'a Transaction;
    type IntoIter = vec_deque::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
