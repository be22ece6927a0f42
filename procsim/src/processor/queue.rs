/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-processor ready queue.
//!
//! A thin `VecDeque` wrapper.  It carries no lock of its own: it is always
//! reached through the owning [`Processor`](super::Processor), which the
//! system keeps behind a `tokio::sync::Mutex`.  An enqueue plus the resort
//! that follows it therefore runs under one lock acquisition and can never
//! interleave with the worker's dequeue.

use std::collections::VecDeque;

use crate::process::{Pid, Process};

#[derive(Debug, Default)]
pub struct ReadyQueue {
    items: VecDeque<Process>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push_back(&mut self, process: Process) {
        self.items.push_back(process);
    }

    pub fn pop_front(&mut self) -> Option<Process> {
        self.items.pop_front()
    }

    pub fn front(&self) -> Option<&Process> {
        self.items.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.items.iter()
    }

    /// Pids in queue order, head first.
    pub fn pids(&self) -> Vec<Pid> {
        self.items.iter().map(Process::pid).collect()
    }

    /// Stable ascending sort: equal keys keep their current relative order.
    pub fn sort_by_key<F>(&mut self, key: F)
    where
        F: FnMut(&Process) -> u64,
    {
        self.items.make_contiguous().sort_by_key(key);
    }
}

impl Extend<Process> for ReadyQueue {
    fn extend<I: IntoIterator<Item = Process>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut q = ReadyQueue::new();
        q.extend([
            Process::new(0, 5, 10, 1),
            Process::new(1, 3, 10, 0),
            Process::new(2, 9, 10, 1),
            Process::new(3, 4, 10, 0),
        ]);
        q.sort_by_key(Process::admitted_cycle);
        assert_eq!(q.pids(), vec![1, 3, 0, 2]);
    }

    #[test]
    fn pop_front_drains_in_order() {
        let mut q = ReadyQueue::new();
        q.push_back(Process::new(4, 1, 10, 0));
        q.push_back(Process::new(5, 1, 10, 0));
        assert_eq!(q.front().map(Process::pid), Some(4));
        assert_eq!(q.pop_front().map(|p| p.pid()), Some(4));
        assert_eq!(q.pop_front().map(|p| p.pid()), Some(5));
        assert!(q.pop_front().is_none());
        assert!(q.is_empty());
    }
}
