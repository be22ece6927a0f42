/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Round-Robin state: the last dispatched pid and its running streak.

use crate::process::{Pid, Process};
use crate::processor::ReadyQueue;

#[derive(Debug, Clone)]
pub struct RoundRobin {
    quantum: u32,
    /// `None` until the first dispatch, so pid 0 is not skipped.
    last_dispatched: Option<Pid>,
    streak: u32,
}

impl RoundRobin {
    pub fn new(quantum: u32) -> Self {
        Self {
            quantum,
            last_dispatched: None,
            streak: 0,
        }
    }

    pub fn quantum(&self) -> u32 {
        self.quantum
    }

    pub fn last_dispatched(&self) -> Option<Pid> {
        self.last_dispatched
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub(super) fn should_preempt(&self, running: &Process) -> bool {
        self.last_dispatched == Some(running.pid()) && self.streak >= self.quantum
    }

    /// Take the head of the queue, rotating the last-dispatched pid to the
    /// tail while any other pid is still queued.
    pub(super) fn dispatch(&mut self, ready: &mut ReadyQueue) -> Option<Process> {
        let mut candidate = ready.pop_front()?;

        // Pids are unique, so one rotation is enough to reach a different one.
        while !ready.is_empty() && Some(candidate.pid()) == self.last_dispatched {
            ready.push_back(candidate);
            candidate = ready.pop_front()?;
        }

        self.last_dispatched = Some(candidate.pid());
        self.streak = 0;
        Some(candidate)
    }

    pub(super) fn on_clock_cycle(&mut self) {
        self.streak = self.streak.saturating_add(1);
    }
}
