/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! System-wide statistics aggregated from every processor.
//!
//! Counts are plain sums.  Averages are weighted by each processor's total
//! clock cycles: a processor that ran twice as long counts twice as much.

use std::fmt;

use serde::Serialize;

use crate::processor::ProcessorStatistics;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemStatistics {
    pub processors: Vec<ProcessorStatistics>,
    pub total_processes_seen: u64,
    pub total_clock_cycles: u64,
    pub average_turnaround_time: f64,
    pub average_normalized_turnaround_time: f64,
    pub average_wait_cycles: f64,
    pub average_service_time: f64,
}

impl SystemStatistics {
    /// Aggregate per-processor results.  Weighted averages are `0.0` when no
    /// processor ran a single cycle.
    pub fn from_processors(processors: Vec<ProcessorStatistics>) -> Self {
        let total_processes_seen: u64 = processors.iter().map(|p| p.total_processes_seen).sum();
        let total_clock_cycles: u64 = processors.iter().map(|p| p.total_clock_cycles).sum();

        let weighted = |f: fn(&ProcessorStatistics) -> f64| -> f64 {
            if total_clock_cycles == 0 {
                return 0.0;
            }
            processors
                .iter()
                .map(|p| f(p) * p.total_clock_cycles as f64)
                .sum::<f64>()
                / total_clock_cycles as f64
        };

        let average_turnaround_time = weighted(|p| p.average_turnaround_time);
        let average_normalized_turnaround_time =
            weighted(|p| p.average_normalized_turnaround_time);
        let average_wait_cycles = weighted(|p| p.average_wait_cycles);
        let average_service_time = weighted(|p| p.average_service_time);

        Self {
            processors,
            total_processes_seen,
            total_clock_cycles,
            average_turnaround_time,
            average_normalized_turnaround_time,
            average_wait_cycles,
            average_service_time,
        }
    }
}

impl fmt::Display for SystemStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.processors {
            writeln!(f, "{p}")?;
        }
        writeln!(f, "System had the following statistics:")?;
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
