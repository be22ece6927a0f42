/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The processing system: processors, producer and run orchestration.
//!
//! [`ProcessingSystem`] owns every [`Processor`] and the [`Producer`].  It can
//! drive a run in two ways:
//!
//! | Mode | Entry point | Timing | Reproducible |
//! |---|---|---|---|
//! | Concurrent | [`simulate`](ProcessingSystem::simulate) | one tokio task per processor, paced by `clock_period` | no (interleaving) |
//! | Lock-step | [`simulate_lockstep`](ProcessingSystem::simulate_lockstep) | single thread, no delay | yes, with a seed |
//!
//! Both follow the same orchestration:
//!
//! 1. seed every processor with one batch admitted at cycle 0
//! 2. while the producer has budget, top up each **idling** processor with a
//!    batch admitted at that processor's own local cycle
//! 3. once the producer is exhausted, wait until every processor is done
//! 4. stop the workers and aggregate [`SystemStatistics`]
//!
//! # Sharing model
//! Each processor lives in an `Arc<tokio::sync::Mutex<Processor>>`.  Its
//! worker is the only task that dequeues; the supervisor only enqueues.  Both
//! sides mutate the ready queue under the same lock, so an enqueue can never
//! interleave with a resort or a dispatch.  The worker releases the lock
//! across the pacing delay.

pub mod error;
pub mod report;

pub use error::SimulationError;
pub use report::SystemStatistics;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::dispatch::{DispatchPolicy, PolicySpec};
use crate::processor::{Processor, ProcessorStatistics};
use crate::producer::Producer;

// ── ProcessingSystem ──────────────────────────────────────────────────────────

pub struct ProcessingSystem {
    processors: Vec<Arc<Mutex<Processor>>>,
    producer: Producer,
    /// Cooperative on/off flag observed at the top of every worker loop.
    is_on: Arc<AtomicBool>,
    clock_period: Duration,
    batch_size: u64,
}

impl ProcessingSystem {
    /// Build a system with `processors` processors bound cyclically to
    /// `policies`, using default pacing, batch size and workload.
    ///
    /// # Errors
    /// See [`SimulationConfig::validate`].
    pub fn new(processors: usize, policies: &[PolicySpec]) -> Result<Self, SimulationError> {
        Self::from_config(&SimulationConfig {
            processors,
            policies: policies.to_vec(),
            ..Default::default()
        })
    }

    /// Build a system from a full configuration.
    ///
    /// The producer budget is drawn uniformly from
    /// `min * processors ..= max * processors`, using `config.seed` when set.
    ///
    /// # Errors
    /// Any configuration error, before a single processor is created.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let n = config.processors as u64;
        let range = config.workload_per_processor;
        let budget = rng.gen_range(range.min.saturating_mul(n)..=range.max.saturating_mul(n));

        Self::with_producer(config, Producer::new(budget, rng))
    }

    /// Build a system around an explicit producer (fixed budget or seed).
    ///
    /// # Errors
    /// Any configuration error.
    pub fn with_producer(
        config: &SimulationConfig,
        producer: Producer,
    ) -> Result<Self, SimulationError> {
        config.validate()?;

        let processors = (0..config.processors)
            .filter_map(|i| {
                config
                    .policy_for(i)
                    .map(|spec| Arc::new(Mutex::new(Processor::new(i, DispatchPolicy::from_spec(spec)))))
            })
            .collect::<Vec<_>>();

        info!(
            processors = processors.len(),
            policies = config.policies.len(),
            budget = producer.max_to_produce(),
            clock_period_ms = config.clock_period.as_millis() as u64,
            batch_size = config.batch_size,
            "Processing system created"
        );

        Ok(Self {
            processors,
            producer,
            is_on: Arc::new(AtomicBool::new(false)),
            clock_period: config.clock_period,
            batch_size: config.batch_size,
        })
    }

    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    pub fn processors(&self) -> &[Arc<Mutex<Processor>>] {
        &self.processors
    }

    pub fn producer(&self) -> &Producer {
        &self.producer
    }

    pub fn is_on(&self) -> bool {
        self.is_on.load(Ordering::Acquire)
    }

    // ── Concurrent mode ───────────────────────────────────────────────────────

    /// Run the simulation with one worker task per processor.
    ///
    /// Returns once the producer is exhausted, every processor is done and
    /// every worker has exited.
    ///
    /// # Errors
    /// [`SimulationError::WorkerFailed`] if a worker task panicked.  The other
    /// workers are still stopped and joined first.
    pub async fn simulate(&mut self) -> Result<SystemStatistics, SimulationError> {
        for processor in &self.processors {
            let mut cpu = processor.lock().await;
            seed_batch(&mut self.producer, &mut cpu, self.batch_size);
        }

        self.is_on.store(true, Ordering::Release);
        info!(processors = self.processors.len(), "Processing system turned on");

        let workers: Vec<(usize, JoinHandle<()>)> = self
            .processors
            .iter()
            .enumerate()
            .map(|(id, processor)| {
                let worker = run_worker(Arc::clone(processor), Arc::clone(&self.is_on), self.clock_period);
                (id, tokio::spawn(worker))
            })
            .collect();

        // ── Feed work while the budget lasts ──────────────────────────────────
        while !self.producer.is_done_producing() && !worker_exited(&workers) {
            pace(self.clock_period).await;
            for processor in &self.processors {
                let mut cpu = processor.lock().await;
                top_up(&mut self.producer, &mut cpu, self.batch_size);
            }
        }
        info!(produced = self.producer.produced(), "Producer exhausted");

        // ── Drain ─────────────────────────────────────────────────────────────
        while !worker_exited(&workers) {
            let mut all_done = true;
            for processor in &self.processors {
                if !processor.lock().await.is_done() {
                    all_done = false;
                    break;
                }
            }
            if all_done {
                break;
            }
            pace(self.clock_period).await;
        }

        // ── Shutdown ──────────────────────────────────────────────────────────
        self.is_on.store(false, Ordering::Release);
        info!("Processing system turning off, waiting for workers");

        let mut failure = None;
        for (processor, handle) in workers {
            if let Err(e) = handle.await {
                warn!(processor, "Worker ended abnormally: {e}");
                if failure.is_none() {
                    failure = Some(SimulationError::WorkerFailed {
                        processor,
                        reason: e.to_string(),
                    });
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        let mut per_processor = Vec::with_capacity(self.processors.len());
        for processor in &self.processors {
            per_processor.push(processor.lock().await.statistics());
        }
        Ok(report(per_processor))
    }

    // ── Lock-step mode ────────────────────────────────────────────────────────

    /// Run the simulation on the calling thread with no pacing.
    ///
    /// Each step runs one cycle on every processor, then polls the producer
    /// exactly like the concurrent supervisor.  With a seeded producer the
    /// result is fully reproducible.
    ///
    /// # Errors
    /// [`SimulationError::ProcessorBusy`] if a concurrent run still holds a
    /// processor.
    pub fn simulate_lockstep(&mut self) -> Result<SystemStatistics, SimulationError> {
        let mut cpus = Vec::with_capacity(self.processors.len());
        for (processor, cell) in self.processors.iter().enumerate() {
            let guard = cell
                .try_lock()
                .map_err(|_| SimulationError::ProcessorBusy { processor })?;
            cpus.push(guard);
        }

        for cpu in cpus.iter_mut() {
            seed_batch(&mut self.producer, cpu, self.batch_size);
        }

        self.is_on.store(true, Ordering::Release);
        info!(processors = cpus.len(), "Processing system turned on (lock-step)");

        let mut producer_exhausted_logged = false;
        loop {
            for cpu in cpus.iter_mut() {
                cpu.tick();
            }

            if !self.producer.is_done_producing() {
                for cpu in cpus.iter_mut() {
                    top_up(&mut self.producer, cpu, self.batch_size);
                }
                continue;
            }

            if !producer_exhausted_logged {
                info!(produced = self.producer.produced(), "Producer exhausted");
                producer_exhausted_logged = true;
            }
            if cpus.iter().all(|cpu| cpu.is_done()) {
                break;
            }
        }

        self.is_on.store(false, Ordering::Release);
        Ok(report(cpus.iter().map(|cpu| cpu.statistics()).collect()))
    }
}

// ── Worker & helpers ──────────────────────────────────────────────────────────

/// One processor's execution loop.  Exits at the first cycle boundary after
/// `is_on` is cleared; a cycle in flight always completes.
async fn run_worker(processor: Arc<Mutex<Processor>>, is_on: Arc<AtomicBool>, clock_period: Duration) {
    while is_on.load(Ordering::Acquire) {
        processor.lock().await.begin_cycle();
        pace(clock_period).await;
        processor.lock().await.finish_cycle();
    }

    let cpu = processor.lock().await;
    debug!(processor = cpu.id(), cycle = cpu.current_cycle(), "Worker stopped");
}

/// A worker only exits on its own by panicking; the supervisor stops waiting
/// for work to drain if that happens.
fn worker_exited(workers: &[(usize, JoinHandle<()>)]) -> bool {
    workers.iter().any(|(_, handle)| handle.is_finished())
}

/// Pacing delay.  A zero period only yields so other tasks can make progress.
async fn pace(clock_period: Duration) {
    if clock_period.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(clock_period).await;
    }
}

/// Initial batch, admitted at cycle 0.
fn seed_batch(producer: &mut Producer, cpu: &mut Processor, batch_size: u64) {
    let batch = producer.produce_processes(batch_size, 0);
    debug!(processor = cpu.id(), count = batch.len(), "Seeding ready queue");
    cpu.add_all_to_queue(batch);
}

/// Top up an idling processor with a batch admitted at its own local cycle.
fn top_up(producer: &mut Producer, cpu: &mut Processor, batch_size: u64) -> usize {
    if !cpu.is_idling() || producer.is_done_producing() {
        return 0;
    }
    let batch = producer.produce_processes(batch_size, cpu.current_cycle());
    let count = batch.len();
    debug!(
        processor = cpu.id(),
        cycle = cpu.current_cycle(),
        count,
        "Topped up idle processor"
    );
    cpu.add_all_to_queue(batch);
    count
}

fn report(per_processor: Vec<ProcessorStatistics>) -> SystemStatistics {
    let stats = SystemStatistics::from_processors(per_processor);
    for p in &stats.processors {
        info!(
            processor = p.processor,
            policy = %p.policy,
            cycles = p.total_clock_cycles,
            processes = p.total_processes_seen,
            turnaround = p.average_turnaround_time,
            normalized = p.average_normalized_turnaround_time,
            wait = p.average_wait_cycles,
            service = p.average_service_time,
            "Processor summary"
        );
    }
    info!(
        cycles = stats.total_clock_cycles,
        processes = stats.total_processes_seen,
        turnaround = stats.average_turnaround_time,
        normalized = stats.average_normalized_turnaround_time,
        wait = stats.average_wait_cycles,
        service = stats.average_service_time,
        "=== Simulation complete ==="
    );
    stats
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkloadRange;

    fn config(processors: usize, policies: Vec<PolicySpec>) -> SimulationConfig {
        SimulationConfig {
            processors,
            policies,
            clock_period: Duration::ZERO,
            batch_size: 5,
            workload_per_processor: WorkloadRange { min: 20, max: 40 },
            seed: Some(7),
        }
    }

    // ── Construction ──────────────────────────────────────────────────────────

    #[test]
    fn policies_are_assigned_modulo_list_length() {
        let cfg = config(
            5,
            vec![PolicySpec::FirstInFirstOut, PolicySpec::RoundRobin { quantum: 2 }],
        );
        let system = ProcessingSystem::from_config(&cfg).unwrap();
        let specs: Vec<_> = system
            .processors()
            .iter()
            .map(|p| p.try_lock().unwrap().policy().spec())
            .collect();
        assert_eq!(
            specs,
            vec![
                PolicySpec::FirstInFirstOut,
                PolicySpec::RoundRobin { quantum: 2 },
                PolicySpec::FirstInFirstOut,
                PolicySpec::RoundRobin { quantum: 2 },
                PolicySpec::FirstInFirstOut,
            ]
        );
    }

    #[test]
    fn budget_is_proportional_to_processor_count() {
        let system = ProcessingSystem::from_config(&config(3, vec![PolicySpec::FirstInFirstOut])).unwrap();
        let budget = system.producer().max_to_produce();
        assert!((60..=120).contains(&budget), "budget {budget}");
    }

    #[test]
    fn configuration_errors_fail_fast() {
        assert!(matches!(
            ProcessingSystem::new(0, &[PolicySpec::FirstInFirstOut]),
            Err(SimulationError::NoProcessors)
        ));
        assert!(matches!(
            ProcessingSystem::new(2, &[]),
            Err(SimulationError::NoPolicies)
        ));
        assert!(matches!(
            ProcessingSystem::new(1, &[PolicySpec::RoundRobin { quantum: 0 }]),
            Err(SimulationError::ZeroQuantum { index: 0 })
        ));
    }

    #[test]
    fn new_system_is_off() {
        let system = ProcessingSystem::new(1, &[PolicySpec::FirstInFirstOut]).unwrap();
        assert!(!system.is_on());
        assert_eq!(system.processor_count(), 1);
    }

    // ── Lock-step ─────────────────────────────────────────────────────────────

    #[test]
    fn lockstep_processes_entire_budget() {
        let cfg = config(4, PolicySpec::default_set()[..4].to_vec());
        let mut system = ProcessingSystem::with_producer(&cfg, Producer::seeded(57, 3)).unwrap();

        let stats = system.simulate_lockstep().unwrap();
        assert_eq!(stats.total_processes_seen, 57);
        assert!(system.producer().is_done_producing());
        assert!(!system.is_on());
        for cpu in system.processors() {
            assert!(cpu.try_lock().unwrap().is_done());
        }
    }

    #[test]
    fn lockstep_is_reproducible_with_seed() {
        let cfg = config(3, vec![PolicySpec::ShortestRemainingCycles, PolicySpec::RoundRobin { quantum: 4 }]);
        let run = || {
            ProcessingSystem::from_config(&cfg)
                .unwrap()
                .simulate_lockstep()
                .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn lockstep_statistics_hold_invariants() {
        let cfg = config(2, vec![PolicySpec::FirstInFirstOut, PolicySpec::ShortestProcessNext]);
        let mut system = ProcessingSystem::with_producer(&cfg, Producer::seeded(30, 11)).unwrap();
        let stats = system.simulate_lockstep().unwrap();

        let per_cpu_sum: u64 = stats.processors.iter().map(|p| p.total_processes_seen).sum();
        assert_eq!(per_cpu_sum, stats.total_processes_seen);
        for p in &stats.processors {
            assert!(p.average_turnaround_time >= p.average_service_time);
            assert!(p.average_normalized_turnaround_time >= 1.0);
        }
        for cpu in system.processors() {
            let cpu = cpu.try_lock().unwrap();
            assert!(cpu.violations().is_empty());
            for s in cpu.history() {
                assert!(s.turnaround_time >= s.service_time);
            }
        }
    }

    #[test]
    fn lockstep_tops_up_at_processor_local_cycle() {
        let cfg = SimulationConfig {
            batch_size: 1,
            ..config(1, vec![PolicySpec::FirstInFirstOut])
        };
        let mut system = ProcessingSystem::with_producer(&cfg, Producer::seeded(3, 5)).unwrap();
        system.simulate_lockstep().unwrap();

        let cpu = system.processors()[0].try_lock().unwrap();
        let history = cpu.history();
        assert_eq!(history.len(), 3);
        // One process at a time: each later one is admitted when the
        // processor went idle, so it never waits.
        for s in history {
            assert_eq!(s.total_wait_time, 0);
        }
        assert_eq!(history[0].turnaround_time, history[0].service_time);
    }

    #[test]
    fn lockstep_with_empty_budget_finishes_immediately() {
        let cfg = config(2, vec![PolicySpec::FirstInFirstOut]);
        let mut system = ProcessingSystem::with_producer(&cfg, Producer::seeded(0, 1)).unwrap();
        let stats = system.simulate_lockstep().unwrap();
        assert_eq!(stats.total_processes_seen, 0);
        assert_eq!(stats.average_turnaround_time, 0.0);
    }

    // ── Concurrent ────────────────────────────────────────────────────────────

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_run_processes_entire_budget() {
        let cfg = config(3, vec![
            PolicySpec::FirstInFirstOut,
            PolicySpec::ShortestRemainingCycles,
            PolicySpec::RoundRobin { quantum: 2 },
        ]);
        let mut system = ProcessingSystem::with_producer(&cfg, Producer::seeded(40, 9)).unwrap();

        let stats = tokio::time::timeout(Duration::from_secs(30), system.simulate())
            .await
            .expect("simulation finished in time")
            .unwrap();

        assert_eq!(stats.total_processes_seen, 40);
        assert!(!system.is_on());
        for cpu in system.processors() {
            let cpu = cpu.lock().await;
            assert!(cpu.is_done());
            for s in cpu.history() {
                assert!(s.turnaround_time >= s.service_time);
            }
        }
    }

    #[tokio::test]
    async fn concurrent_run_with_real_pacing() {
        let cfg = SimulationConfig {
            clock_period: Duration::from_millis(1),
            ..config(2, vec![PolicySpec::RoundRobin { quantum: 3 }])
        };
        let mut system = ProcessingSystem::with_producer(&cfg, Producer::seeded(12, 2)).unwrap();

        let stats = system.simulate().await.unwrap();
        assert_eq!(stats.total_processes_seen, 12);
        assert_eq!(stats.processors.len(), 2);
        assert!(stats.total_clock_cycles > 0);
    }

    #[test]
    fn lockstep_refuses_while_processor_is_held() {
        let mut system = ProcessingSystem::new(1, &[PolicySpec::FirstInFirstOut]).unwrap();
        let cell = Arc::clone(&system.processors()[0]);
        let _held = cell.try_lock().unwrap();
        assert!(matches!(
            system.simulate_lockstep(),
            Err(SimulationError::ProcessorBusy { processor: 0 })
        ));
    }
}
