/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! A single simulated processor.
//!
//! [`Processor`] owns one [`ReadyQueue`], one [`DispatchPolicy`] and at most
//! one running [`Process`].  One simulated clock cycle is split in two halves
//! around the pacing delay so the system can release the processor's lock
//! while a worker sleeps:
//!
//! ```text
//! begin_cycle():   1. preempt (preemptive policies only)
//!                  2. dispatch if idling
//!     ── pacing ──
//! finish_cycle():  4. run the current process for one unit of work
//!                  5. policy.on_clock_cycle()
//!                  6. record statistics if it completed
//!                  7. advance the local clock
//! ```
//!
//! [`tick`](Processor::tick) runs both halves back to back with no delay; it is
//! what the deterministic lock-step mode and the unit tests use.

pub mod queue;

pub use queue::ReadyQueue;

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::dispatch::{DispatchPolicy, PolicySpec};
use crate::process::{Cycle, Process, ProcessError, ProcessStatistics};

// ── Processor ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Processor {
    id: usize,
    policy: DispatchPolicy,
    ready: ReadyQueue,
    running: Option<Process>,
    /// Local clock; processors do not share a global cycle counter.
    clock: Cycle,
    processes_seen: u64,
    history: Vec<ProcessStatistics>,
    violations: Vec<ProcessError>,
}

impl Processor {
    pub fn new(id: usize, policy: DispatchPolicy) -> Self {
        Self {
            id,
            policy,
            ready: ReadyQueue::new(),
            running: None,
            clock: 0,
            processes_seen: 0,
            history: Vec::new(),
            violations: Vec::new(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn policy(&self) -> &DispatchPolicy {
        &self.policy
    }

    pub fn ready_queue(&self) -> &ReadyQueue {
        &self.ready
    }

    pub fn running(&self) -> Option<&Process> {
        self.running.as_ref()
    }

    pub fn current_cycle(&self) -> Cycle {
        self.clock
    }

    pub fn processes_seen(&self) -> u64 {
        self.processes_seen
    }

    /// Statistics of every process completed here, in completion order.
    pub fn history(&self) -> &[ProcessStatistics] {
        &self.history
    }

    /// Process lifecycle violations observed while running.
    pub fn violations(&self) -> &[ProcessError] {
        &self.violations
    }

    pub fn is_idling(&self) -> bool {
        self.running.is_none()
    }

    pub fn is_done(&self) -> bool {
        self.ready.is_empty() && self.is_idling()
    }

    // ── Queue mutation ────────────────────────────────────────────────────────

    /// Enqueue one process, then resort the whole queue by the policy's key.
    pub fn add_to_queue(&mut self, process: Process) {
        self.ready.push_back(process);
        self.sort_queue();
    }

    /// Enqueue a batch, then resort once.
    pub fn add_all_to_queue<I>(&mut self, processes: I)
    where
        I: IntoIterator<Item = Process>,
    {
        self.ready.extend(processes);
        self.sort_queue();
    }

    fn sort_queue(&mut self) {
        let policy = &self.policy;
        self.ready.sort_by_key(|p| policy.ordering_key(p));
    }

    // ── Execution loop ────────────────────────────────────────────────────────

    /// Run one full cycle without pacing.
    ///
    /// Returns the statistics of a process that completed in this cycle.
    pub fn tick(&mut self) -> Option<ProcessStatistics> {
        self.begin_cycle();
        self.finish_cycle()
    }

    /// Preemption and dispatch: the half of a cycle before the pacing delay.
    pub fn begin_cycle(&mut self) {
        debug!(processor = self.id, cycle = self.clock, "Beginning cycle");

        if self.policy.is_preemptive() {
            let preempt = self
                .running
                .as_ref()
                .is_some_and(|running| self.policy.should_preempt(running, &self.ready));

            if preempt {
                if let Some(preempted) = self.running.take() {
                    debug!(
                        processor = self.id,
                        cycle = self.clock,
                        pid = preempted.pid(),
                        remaining = preempted.remaining_cycles(),
                        "Preempted process"
                    );
                    self.add_to_queue(preempted);
                }
            }
        }

        if self.is_idling() {
            self.running = self.policy.dispatch(&mut self.ready);
            match &self.running {
                Some(p) => debug!(
                    processor = self.id,
                    cycle = self.clock,
                    pid = p.pid(),
                    queued = self.ready.len(),
                    "Dispatched process"
                ),
                None => debug!(processor = self.id, cycle = self.clock, "Idling..."),
            }
        }
    }

    /// Execution and bookkeeping: the half of a cycle after the pacing delay.
    pub fn finish_cycle(&mut self) -> Option<ProcessStatistics> {
        let cycle = self.clock;
        let completed = match self.running.as_mut() {
            Some(process) => match process.run(cycle) {
                Ok(done) => done,
                Err(violation) => {
                    warn!(processor = self.id, cycle, "{violation}");
                    self.violations.push(violation);
                    process.has_completed()
                }
            },
            None => false,
        };

        self.policy.on_clock_cycle();

        let mut finished = None;
        if completed {
            if let Some(process) = self.running.take() {
                if let Some(stats) = process.statistics() {
                    debug!(
                        processor = self.id,
                        cycle,
                        pid = stats.pid,
                        turnaround = stats.turnaround_time,
                        wait = stats.total_wait_time,
                        "Process completed"
                    );
                    self.history.push(stats.clone());
                    finished = Some(stats);
                }
                self.processes_seen += 1;
            }
        }

        debug!(processor = self.id, cycle, "Completed cycle");
        self.clock += 1;
        finished
    }

    // ── Statistics ────────────────────────────────────────────────────────────

    /// Averages over this processor's completed-process history.
    ///
    /// All averages are `0.0` when nothing has completed yet.
    pub fn statistics(&self) -> ProcessorStatistics {
        let n = self.history.len();
        let avg = |f: fn(&ProcessStatistics) -> f64| -> f64 {
            if n == 0 {
                0.0
            } else {
                self.history.iter().map(f).sum::<f64>() / n as f64
            }
        };

        ProcessorStatistics {
            processor: self.id,
            policy: self.policy.spec(),
            total_processes_seen: self.processes_seen,
            total_clock_cycles: self.clock,
            average_turnaround_time: avg(|s| s.turnaround_time as f64),
            average_normalized_turnaround_time: avg(|s| s.normalized_turnaround_time),
            average_wait_cycles: avg(|s| s.total_wait_time as f64),
            average_service_time: avg(|s| s.service_time as f64),
        }
    }
}

// ── ProcessorStatistics ───────────────────────────────────────────────────────

/// Per-processor aggregate, computed at shutdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessorStatistics {
    pub processor: usize,
    pub policy: PolicySpec,
    pub total_processes_seen: u64,
    pub total_clock_cycles: u64,
    pub average_turnaround_time: f64,
    pub average_normalized_turnaround_time: f64,
    pub average_wait_cycles: f64,
    pub average_service_time: f64,
}

impl fmt::Display for ProcessorStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Processor {} ({}) had the following statistics:",
            self.processor, self.policy
        )?;
        writeln!(f, "\t{} total clock cycles", self.total_clock_cycles)?;
        writeln!(f, "\t{} total processes seen", self.total_processes_seen)?;
        writeln!(f, "\t{:.3} average turnaround time", self.average_turnaround_time)?;
        writeln!(
            f,
            "\t{:.3} average normalized turnaround time",
            self.average_normalized_turnaround_time
        )?;
        writeln!(f, "\t{:.3} average service time", self.average_service_time)?;
        write!(f, "\t{:.3} average wait cycles", self.average_wait_cycles)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
