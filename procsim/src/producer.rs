/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Bounded random workload generator.
//!
//! The random source is a seedable [`StdRng`]: pass a seed for reproducible
//! runs (tests, `--seed`), or use [`Producer::from_entropy`] otherwise.

use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::process::{Cycle, PidAllocator, Process};

/// Range `requiredCycles` is drawn from (upper bound exclusive).
pub const REQUIRED_CYCLES_RANGE: Range<u64> = 2..20;

/// Range `priority` is drawn from (upper bound exclusive).
pub const PRIORITY_RANGE: Range<u32> = 10..99;

#[derive(Debug)]
pub struct Producer {
    rng: StdRng,
    pids: PidAllocator,
    max_to_produce: u64,
    produced: u64,
}

impl Producer {
    /// Create a producer with a fixed budget of `max_to_produce` processes.
    pub fn new(max_to_produce: u64, rng: StdRng) -> Self {
        Self {
            rng,
            pids: PidAllocator::new(),
            max_to_produce,
            produced: 0,
        }
    }

    pub fn seeded(max_to_produce: u64, seed: u64) -> Self {
        Self::new(max_to_produce, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(max_to_produce: u64) -> Self {
        Self::new(max_to_produce, StdRng::from_entropy())
    }

    pub fn max_to_produce(&self) -> u64 {
        self.max_to_produce
    }

    pub fn produced(&self) -> u64 {
        self.produced
    }

    pub fn remaining(&self) -> u64 {
        self.max_to_produce.saturating_sub(self.produced)
    }

    pub fn is_done_producing(&self) -> bool {
        self.produced >= self.max_to_produce
    }

    pub fn can_produce(&self, n: u64) -> bool {
        n <= self.remaining()
    }

    /// Create one process admitted at `admit_cycle`.
    ///
    /// Does not check the budget; [`produce_processes`](Self::produce_processes)
    /// is the bounded entry point.
    pub fn produce_process(&mut self, admit_cycle: Cycle) -> Process {
        self.produced += 1;
        let required = self.rng.gen_range(REQUIRED_CYCLES_RANGE);
        let priority = self.rng.gen_range(PRIORITY_RANGE);
        let process = Process::new(self.pids.allocate(), required, priority, admit_cycle);

        debug!(
            pid = process.pid(),
            required,
            priority,
            admit_cycle,
            "Produced process"
        );
        process
    }

    /// Create up to `n` processes admitted at `admit_cycle`, stopping early
    /// when the budget runs out.
    pub fn produce_processes(&mut self, n: u64, admit_cycle: Cycle) -> Vec<Process> {
        let count = n.min(self.remaining());
        (0..count).map(|_| self.produce_process(admit_cycle)).collect()
    }
}
