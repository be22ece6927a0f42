/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! procsim – clock-driven multi-processor CPU scheduling simulator
//!
//! Module layout (leaves first):
//!
//! ```text
//! lib.rs
//! ├── process/      – Process, ProcessStatistics, pid allocation
//! ├── dispatch/     – FIFO / SPN / SRC / Round-Robin policies
//! ├── processor/    – per-processor ready queue and cycle loop
//! ├── producer      – seedable bounded workload generator
//! ├── system/       – orchestration, shutdown, aggregate statistics
//! └── config/       – YAML simulation configuration
//! ```

pub mod config;
pub mod dispatch;
pub mod process;
pub mod processor;
pub mod producer;
pub mod system;
