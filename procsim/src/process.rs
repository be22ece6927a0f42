/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Process data structures for the simulator.
//!
//! Two types model the two sides of a process's life:
//!
//! ```text
//! Producer ──(admit)──►  Process  ──(Processor::run)──►  ProcessStatistics
//!                         ↑ mutable, single writer          ↑ immutable, recorded once
//! ```
//!
//! # Ownership model
//! A `Process` is **owned** by exactly one place at a time: the producer's
//! output batch, a processor's [`ReadyQueue`](crate::processor::ReadyQueue),
//! or a processor's running slot.  Moving it between those places is a Rust
//! move, so two workers can never mutate the same process.  Once it completes
//! the processor turns it into a [`ProcessStatistics`] and drops it.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use thiserror::Error;

/// Process identifier.  Unique within one [`PidAllocator`].
pub type Pid = u64;

/// One discrete unit of simulated processor time.
pub type Cycle = u64;

// ── Pid allocation ────────────────────────────────────────────────────────────

/// Hands out monotonically increasing process ids.
///
/// Owned by the [`Producer`](crate::producer::Producer), which in turn is owned
/// by the [`ProcessingSystem`](crate::system::ProcessingSystem), so every
/// simulation run numbers its processes from zero.
#[derive(Debug, Default)]
pub struct PidAllocator {
    next: AtomicU64,
}

impl PidAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next unused id.
    pub fn allocate(&self) -> Pid {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Lifecycle violations detected on a single process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    /// `execution_start` is set-once; a later attempt keeps the recorded value.
    #[error(
        "process {pid}: execution start already recorded at cycle {recorded}, \
         ignoring attempt to set it to {attempted}"
    )]
    ExecutionStartAlreadySet {
        pid: Pid,
        recorded: Cycle,
        attempted: Cycle,
    },
}

// ── Process ───────────────────────────────────────────────────────────────────

/// A unit of simulated work.
///
/// # Invariants
/// * `has_completed() ⇔ total_execution >= required_cycles`
/// * `total_execution` never decreases.
/// * `execution_start` is assigned exactly once, on the first call to
///   [`run`](Self::run).
#[derive(Debug, Clone)]
pub struct Process {
    // ── Identity (immutable) ──────────────────────────────────────────────────
    pid: Pid,
    required_cycles: u64,
    priority: u32,
    admitted_cycle: Cycle,

    // ── Progress ──────────────────────────────────────────────────────────────
    /// `None` until the first run.
    execution_start: Option<Cycle>,
    execution_end: Option<Cycle>,
    total_wait: u64,
    total_execution: u64,
    last_execution_cycle: Option<Cycle>,
}

impl Process {
    /// Create a process admitted at `admitted_cycle`.
    ///
    /// `required_cycles` is clamped to at least one so a process always has
    /// work to do.
    pub fn new(pid: Pid, required_cycles: u64, priority: u32, admitted_cycle: Cycle) -> Self {
        debug_assert!(required_cycles > 0, "process {pid} requires zero cycles");
        Self {
            pid,
            required_cycles: required_cycles.max(1),
            priority,
            admitted_cycle,
            execution_start: None,
            execution_end: None,
            total_wait: 0,
            total_execution: 0,
            last_execution_cycle: None,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn required_cycles(&self) -> u64 {
        self.required_cycles
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn admitted_cycle(&self) -> Cycle {
        self.admitted_cycle
    }

    pub fn execution_start(&self) -> Option<Cycle> {
        self.execution_start
    }

    pub fn execution_end(&self) -> Option<Cycle> {
        self.execution_end
    }

    pub fn total_wait(&self) -> u64 {
        self.total_wait
    }

    pub fn total_execution(&self) -> u64 {
        self.total_execution
    }

    pub fn last_execution_cycle(&self) -> Option<Cycle> {
        self.last_execution_cycle
    }

    pub fn began_execution(&self) -> bool {
        self.execution_start.is_some()
    }

    pub fn has_completed(&self) -> bool {
        self.total_execution >= self.required_cycles
    }

    /// `required_cycles − total_execution`, floored at zero.
    pub fn remaining_cycles(&self) -> u64 {
        self.required_cycles.saturating_sub(self.total_execution)
    }

    /// Record the cycle of first execution.
    ///
    /// # Errors
    /// [`ProcessError::ExecutionStartAlreadySet`] if a start cycle was already
    /// recorded.  The recorded value is left untouched.
    pub fn mark_execution_start(&mut self, cycle: Cycle) -> Result<(), ProcessError> {
        match self.execution_start {
            Some(recorded) => Err(ProcessError::ExecutionStartAlreadySet {
                pid: self.pid,
                recorded,
                attempted: cycle,
            }),
            None => {
                self.execution_start = Some(cycle);
                Ok(())
            }
        }
    }

    /// Advance the process by one unit of work at `current_cycle`.
    ///
    /// Cycles spent waiting since the previous run (excluding the one about to
    /// run) are added to `total_wait`.  The first run records
    /// `execution_start` instead.
    ///
    /// Returns `Ok(true)` when this run completed the process.
    ///
    /// # Errors
    /// Propagates [`ProcessError`] from the start-cycle bookkeeping.  The unit
    /// of work is applied either way; the caller decides whether the
    /// diagnostic is fatal.
    pub fn run(&mut self, current_cycle: Cycle) -> Result<bool, ProcessError> {
        let mut violation = None;

        match self.last_execution_cycle {
            Some(last) if self.began_execution() => {
                self.total_wait += current_cycle.saturating_sub(last).saturating_sub(1);
            }
            _ => violation = self.mark_execution_start(current_cycle).err(),
        }

        self.last_execution_cycle = Some(current_cycle);
        self.total_execution += 1;

        if self.has_completed() {
            self.execution_end = Some(current_cycle);
        }

        match violation {
            Some(e) => Err(e),
            None => Ok(self.has_completed()),
        }
    }

    /// Derive the final statistics.
    ///
    /// Returns `None` until the process has completed.
    pub fn statistics(&self) -> Option<ProcessStatistics> {
        let end = self.execution_end.filter(|_| self.has_completed())?;
        let turnaround_time = end.saturating_sub(self.admitted_cycle) + 1;

        Some(ProcessStatistics {
            pid: self.pid,
            completed_at: end,
            turnaround_time,
            normalized_turnaround_time: turnaround_time as f64 / self.required_cycles as f64,
            total_wait_time: self.total_wait,
            service_time: self.required_cycles,
        })
    }
}

// ── ProcessStatistics ─────────────────────────────────────────────────────────

/// Per-process result, computed once at completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessStatistics {
    pub pid: Pid,

    /// Cycle of the final unit of work.
    pub completed_at: Cycle,

    /// `completed_at − admitted_cycle + 1`.
    pub turnaround_time: u64,

    /// `turnaround_time / service_time`.
    pub normalized_turnaround_time: f64,

    pub total_wait_time: u64,

    /// Equal to the process's required cycles.
    pub service_time: u64,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
