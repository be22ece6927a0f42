/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error type for the processing system.
//!
//! Configuration variants are raised synchronously by
//! [`ProcessingSystem::from_config`](super::ProcessingSystem::from_config)
//! before any worker is started.  The runtime variants are raised by
//! [`ProcessingSystem::simulate`](super::ProcessingSystem::simulate) and
//! [`ProcessingSystem::simulate_lockstep`](super::ProcessingSystem::simulate_lockstep).
//!
//! Producer exhaustion is the normal end of a run and is not an error.
//!
//! | Variant | Raised |
//! |---|---|
//! | `NoProcessors` / `NoPolicies` / `TooManyPolicies` | construction |
//! | `ZeroQuantum` / `ZeroBatchSize` / `InvalidWorkloadRange` | construction |
//! | `WorkerFailed` | `simulate()` – a processor task panicked or was cancelled |
//! | `ProcessorBusy` | `simulate_lockstep()` – called while workers hold a processor |

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    /// Processor count was zero.
    #[error("processor count must be at least 1")]
    NoProcessors,

    /// The dispatch policy list was empty.
    #[error("at least one dispatch policy is required")]
    NoPolicies,

    /// More policies than processors: the extra policies would never run.
    ///
    /// Shorter lists are fine and are reused cyclically
    /// (processor `i` gets policy `i % policies`).
    #[error("{policies} dispatch policies given for only {processors} processor(s)")]
    TooManyPolicies { policies: usize, processors: usize },

    /// A Round-Robin policy was configured with quantum 0.
    #[error("round-robin policy at index {index} has quantum 0; quantum must be positive")]
    ZeroQuantum { index: usize },

    /// Top-up batch size was zero, so idle processors would never get work.
    #[error("batch size must be at least 1")]
    ZeroBatchSize,

    /// Per-processor workload range is empty or inverted.
    #[error("invalid workload range per processor: min {min} > max {max}")]
    InvalidWorkloadRange { min: u64, max: u64 },

    /// A processor worker task ended abnormally.
    #[error("processor {processor} worker failed: {reason}")]
    WorkerFailed { processor: usize, reason: String },

    /// A processor was still locked by a running worker.
    #[error("processor {processor} is in use by a running simulation")]
    ProcessorBusy { processor: usize },
}
