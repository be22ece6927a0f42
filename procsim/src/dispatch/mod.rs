/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Dispatch policies: how one processor orders, selects and preempts.
//!
//! Two types model the two sides of a policy:
//!
//! * [`PolicySpec`]: the configuration value parsed from YAML or the command
//!   line.  `Copy`, carries no state, can be reused for many processors.
//! * [`DispatchPolicy`]: the runtime value bound 1:1 to a
//!   [`Processor`](crate::processor::Processor).  Built from a spec with
//!   [`DispatchPolicy::from_spec`], so reusing a spec never shares state.
//!
//! | Policy | Preemptive | Ordering key | Selection |
//! |---|---|---|---|
//! | First-In-First-Out | no | admission cycle | queue head |
//! | Shortest-Process-Next | no | required cycles | queue head |
//! | Shortest-Remaining-Cycles | yes | remaining cycles | queue head |
//! | Round-Robin(Q) | yes | admission cycle | head, skipping the last-dispatched pid |

pub mod round_robin;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::process::Process;
use crate::processor::ReadyQueue;

pub use round_robin::RoundRobin;

// ── PolicySpec ────────────────────────────────────────────────────────────────

/// Configuration form of a dispatch policy.
///
/// Parses from the short or long names accepted on the command line and in
/// the YAML `policies` list:
///
/// | Input | Result |
/// |---|---|
/// | `fifo`, `first_in_first_out` | [`PolicySpec::FirstInFirstOut`] |
/// | `spn`, `shortest_process_next` | [`PolicySpec::ShortestProcessNext`] |
/// | `src`, `shortest_remaining_cycles` | [`PolicySpec::ShortestRemainingCycles`] |
/// | `rr:4`, `round_robin:4` | [`PolicySpec::RoundRobin`] with quantum 4 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicySpec {
    FirstInFirstOut,
    ShortestProcessNext,
    ShortestRemainingCycles,
    RoundRobin { quantum: u32 },
}

impl PolicySpec {
    /// The policy list used when nothing is configured: one of each, with
    /// three Round-Robin quanta.
    pub fn default_set() -> Vec<PolicySpec> {
        vec![
            PolicySpec::FirstInFirstOut,
            PolicySpec::ShortestProcessNext,
            PolicySpec::ShortestRemainingCycles,
            PolicySpec::RoundRobin { quantum: 2 },
            PolicySpec::RoundRobin { quantum: 4 },
            PolicySpec::RoundRobin { quantum: 8 },
        ]
    }

    pub fn is_preemptive(&self) -> bool {
        matches!(
            self,
            PolicySpec::ShortestRemainingCycles | PolicySpec::RoundRobin { .. }
        )
    }
}

impl fmt::Display for PolicySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicySpec::FirstInFirstOut => write!(f, "First In First Out"),
            PolicySpec::ShortestProcessNext => write!(f, "Shortest Process Next"),
            PolicySpec::ShortestRemainingCycles => write!(f, "Shortest Remaining Cycles"),
            PolicySpec::RoundRobin { quantum } => write!(f, "Round Robin (quantum {quantum})"),
        }
    }
}

/// Reason a policy string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyParseError {
    #[error("unknown dispatch policy: '{0}' (valid: fifo, spn, src, rr:<quantum>)")]
    Unknown(String),

    #[error("round-robin policy '{0}' needs a quantum, e.g. rr:4")]
    MissingQuantum(String),

    #[error("invalid round-robin quantum in '{input}': {reason}")]
    InvalidQuantum { input: String, reason: String },
}

impl FromStr for PolicySpec {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let lower = input.to_ascii_lowercase();
        let (name, arg) = match lower.split_once(':') {
            Some((name, arg)) => (name.trim(), Some(arg.trim())),
            None => (lower.as_str(), None),
        };

        match (name, arg) {
            ("fifo" | "first_in_first_out", None) => Ok(PolicySpec::FirstInFirstOut),
            ("spn" | "shortest_process_next", None) => Ok(PolicySpec::ShortestProcessNext),
            ("src" | "srt" | "shortest_remaining_cycles", None) => {
                Ok(PolicySpec::ShortestRemainingCycles)
            }
            ("rr" | "round_robin", None) => Err(PolicyParseError::MissingQuantum(input.into())),
            ("rr" | "round_robin", Some(q)) => q
                .parse::<u32>()
                .map(|quantum| PolicySpec::RoundRobin { quantum })
                .map_err(|e| PolicyParseError::InvalidQuantum {
                    input: input.into(),
                    reason: e.to_string(),
                }),
            _ => Err(PolicyParseError::Unknown(input.into())),
        }
    }
}

// ── DispatchPolicy ────────────────────────────────────────────────────────────

/// Runtime dispatch policy bound to one processor.
///
/// A closed set of variants behind one capability surface:
/// [`is_preemptive`](Self::is_preemptive),
/// [`should_preempt`](Self::should_preempt), [`dispatch`](Self::dispatch),
/// [`ordering_key`](Self::ordering_key) and
/// [`on_clock_cycle`](Self::on_clock_cycle).
#[derive(Debug, Clone)]
pub enum DispatchPolicy {
    FirstInFirstOut,
    ShortestProcessNext,
    ShortestRemainingCycles,
    RoundRobin(RoundRobin),
}

impl DispatchPolicy {
    /// Build a fresh runtime policy.  Round-Robin starts with no tracked pid
    /// and a zero streak.
    pub fn from_spec(spec: PolicySpec) -> Self {
        match spec {
            PolicySpec::FirstInFirstOut => DispatchPolicy::FirstInFirstOut,
            PolicySpec::ShortestProcessNext => DispatchPolicy::ShortestProcessNext,
            PolicySpec::ShortestRemainingCycles => DispatchPolicy::ShortestRemainingCycles,
            PolicySpec::RoundRobin { quantum } => DispatchPolicy::RoundRobin(RoundRobin::new(quantum)),
        }
    }

    /// The configuration this policy was built from.
    pub fn spec(&self) -> PolicySpec {
        match self {
            DispatchPolicy::FirstInFirstOut => PolicySpec::FirstInFirstOut,
            DispatchPolicy::ShortestProcessNext => PolicySpec::ShortestProcessNext,
            DispatchPolicy::ShortestRemainingCycles => PolicySpec::ShortestRemainingCycles,
            DispatchPolicy::RoundRobin(rr) => PolicySpec::RoundRobin {
                quantum: rr.quantum(),
            },
        }
    }

    pub fn is_preemptive(&self) -> bool {
        self.spec().is_preemptive()
    }

    /// Decide whether `running` must give up the processor this cycle.
    ///
    /// Only meaningful for preemptive policies with a running process; the
    /// processor does not call it otherwise.
    pub fn should_preempt(&self, running: &Process, ready: &ReadyQueue) -> bool {
        match self {
            DispatchPolicy::FirstInFirstOut | DispatchPolicy::ShortestProcessNext => false,
            DispatchPolicy::ShortestRemainingCycles => {
                let current = running.remaining_cycles();
                ready.iter().any(|p| p.remaining_cycles() < current)
            }
            DispatchPolicy::RoundRobin(rr) => rr.should_preempt(running),
        }
    }

    /// Remove and return the next process to run, or `None` if `ready` is
    /// empty.  Never duplicates or loses an entry.
    pub fn dispatch(&mut self, ready: &mut ReadyQueue) -> Option<Process> {
        match self {
            DispatchPolicy::RoundRobin(rr) => rr.dispatch(ready),
            other => {
                ready.sort_by_key(|p| other.ordering_key(p));
                ready.pop_front()
            }
        }
    }

    /// Ascending sort key applied to the ready queue after every mutation.
    pub fn ordering_key(&self, process: &Process) -> u64 {
        match self {
            DispatchPolicy::FirstInFirstOut | DispatchPolicy::RoundRobin(_) => {
                process.admitted_cycle()
            }
            DispatchPolicy::ShortestProcessNext => process.required_cycles(),
            DispatchPolicy::ShortestRemainingCycles => process.remaining_cycles(),
        }
    }

    /// Called once per processor cycle, idle or not.
    pub fn on_clock_cycle(&mut self) {
        if let DispatchPolicy::RoundRobin(rr) = self {
            rr.on_clock_cycle();
        }
    }
}

impl fmt::Display for DispatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.spec(), f)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(processes: Vec<Process>) -> ReadyQueue {
        let mut q = ReadyQueue::new();
        q.extend(processes);
        q
    }

    // ── PolicySpec parsing ────────────────────────────────────────────────────

    #[test]
    fn parses_short_and_long_names() {
        assert_eq!("fifo".parse(), Ok(PolicySpec::FirstInFirstOut));
        assert_eq!("first_in_first_out".parse(), Ok(PolicySpec::FirstInFirstOut));
        assert_eq!("SPN".parse(), Ok(PolicySpec::ShortestProcessNext));
        assert_eq!(" src ".parse(), Ok(PolicySpec::ShortestRemainingCycles));
        assert_eq!("rr:4".parse(), Ok(PolicySpec::RoundRobin { quantum: 4 }));
        assert_eq!(
            "round_robin: 8".parse(),
            Ok(PolicySpec::RoundRobin { quantum: 8 })
        );
    }

    #[test]
    fn round_robin_without_quantum_is_rejected() {
        assert!(matches!(
            "rr".parse::<PolicySpec>(),
            Err(PolicyParseError::MissingQuantum(_))
        ));
    }

    #[test]
    fn round_robin_with_garbage_quantum_is_rejected() {
        assert!(matches!(
            "rr:abc".parse::<PolicySpec>(),
            Err(PolicyParseError::InvalidQuantum { .. })
        ));
        assert!(matches!(
            "rr:-1".parse::<PolicySpec>(),
            Err(PolicyParseError::InvalidQuantum { .. })
        ));
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(matches!(
            "lottery".parse::<PolicySpec>(),
            Err(PolicyParseError::Unknown(_))
        ));
        // Non-RR policies take no argument
        assert!(matches!(
            "fifo:2".parse::<PolicySpec>(),
            Err(PolicyParseError::Unknown(_))
        ));
    }

    #[test]
    fn spec_round_trips_through_runtime_policy() {
        for spec in PolicySpec::default_set() {
            assert_eq!(DispatchPolicy::from_spec(spec).spec(), spec);
        }
    }

    #[test]
    fn preemptive_flag_matches_table() {
        assert!(!DispatchPolicy::FirstInFirstOut.is_preemptive());
        assert!(!DispatchPolicy::ShortestProcessNext.is_preemptive());
        assert!(DispatchPolicy::ShortestRemainingCycles.is_preemptive());
        assert!(DispatchPolicy::from_spec(PolicySpec::RoundRobin { quantum: 3 }).is_preemptive());
    }

    // ── FIFO ──────────────────────────────────────────────────────────────────

    #[test]
    fn fifo_dispatches_earliest_admission() {
        let mut policy = DispatchPolicy::FirstInFirstOut;
        let mut q = queue(vec![
            Process::new(0, 2, 10, 4),
            Process::new(1, 9, 10, 1),
            Process::new(2, 1, 10, 3),
        ]);
        assert_eq!(policy.dispatch(&mut q).map(|p| p.pid()), Some(1));
        assert_eq!(policy.dispatch(&mut q).map(|p| p.pid()), Some(2));
        assert_eq!(policy.dispatch(&mut q).map(|p| p.pid()), Some(0));
        assert!(policy.dispatch(&mut q).is_none());
    }

    #[test]
    fn fifo_never_preempts() {
        let policy = DispatchPolicy::FirstInFirstOut;
        let running = Process::new(0, 20, 10, 5);
        let q = queue(vec![Process::new(1, 1, 10, 0)]);
        assert!(!policy.should_preempt(&running, &q));
    }

    // ── SPN ───────────────────────────────────────────────────────────────────

    #[test]
    fn spn_dispatches_shortest_required() {
        let mut policy = DispatchPolicy::ShortestProcessNext;
        let mut q = queue(vec![
            Process::new(0, 7, 10, 0),
            Process::new(1, 3, 10, 0),
            Process::new(2, 5, 10, 0),
        ]);
        assert_eq!(policy.dispatch(&mut q).map(|p| p.pid()), Some(1));
        assert_eq!(policy.dispatch(&mut q).map(|p| p.pid()), Some(2));
    }

    #[test]
    fn spn_never_preempts() {
        let policy = DispatchPolicy::ShortestProcessNext;
        let running = Process::new(0, 19, 10, 0);
        let q = queue(vec![Process::new(1, 2, 10, 0)]);
        assert!(!policy.should_preempt(&running, &q));
    }

    // ── SRC ───────────────────────────────────────────────────────────────────

    #[test]
    fn src_preempts_only_on_strictly_shorter_remaining() {
        let policy = DispatchPolicy::ShortestRemainingCycles;
        let mut running = Process::new(0, 6, 10, 0);
        running.run(0).unwrap();
        running.run(1).unwrap(); // 4 remaining

        let equal = queue(vec![Process::new(1, 4, 10, 0)]);
        assert!(!policy.should_preempt(&running, &equal));

        let shorter = queue(vec![Process::new(1, 5, 10, 0), Process::new(2, 3, 10, 0)]);
        assert!(policy.should_preempt(&running, &shorter));

        assert!(!policy.should_preempt(&running, &ReadyQueue::new()));
    }

    #[test]
    fn src_orders_by_remaining_not_required() {
        let policy = DispatchPolicy::ShortestRemainingCycles;
        let mut partly_done = Process::new(0, 10, 10, 0);
        for c in 0..8 {
            partly_done.run(c).unwrap();
        }
        let fresh = Process::new(1, 3, 10, 0);
        assert_eq!(policy.ordering_key(&partly_done), 2);
        assert_eq!(policy.ordering_key(&fresh), 3);

        let mut policy = policy;
        let mut q = queue(vec![fresh, partly_done]);
        assert_eq!(policy.dispatch(&mut q).map(|p| p.pid()), Some(0));
    }

    // ── Ordering keys ─────────────────────────────────────────────────────────

    #[test]
    fn ordering_keys_match_policy() {
        let p = Process::new(0, 12, 10, 7);
        assert_eq!(DispatchPolicy::FirstInFirstOut.ordering_key(&p), 7);
        assert_eq!(DispatchPolicy::ShortestProcessNext.ordering_key(&p), 12);
        assert_eq!(DispatchPolicy::ShortestRemainingCycles.ordering_key(&p), 12);
        assert_eq!(
            DispatchPolicy::from_spec(PolicySpec::RoundRobin { quantum: 2 }).ordering_key(&p),
            7
        );
    }

    #[test]
    fn display_names_policy() {
        assert_eq!(
            DispatchPolicy::from_spec(PolicySpec::RoundRobin { quantum: 4 }).to_string(),
            "Round Robin (quantum 4)"
        );
        assert_eq!(PolicySpec::FirstInFirstOut.to_string(), "First In First Out");
    }
}
