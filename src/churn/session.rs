/*!
 * Churn Session
 *
 * Drives the sliding-window workload: prime one block, then for every cycle
 * allocate the next block, sample, release the current one, sample, and
 * rotate. The final block is released before the last sample.
 *
 * ## Phases
 *
 * ```text
 * Idle -> Priming -> Cycling (x cycle_limit) -> Draining -> Done
 *             \_________\__ allocation failure __> Aborted
 * ```
 *
 * A sample is appended only after the step it describes has completed, so
 * an aborted run never reports half a cycle.
 */

use super::config::ChurnConfig;
use super::report::{ChurnReport, LabeledSample, SampleLabel};
use crate::core::errors::{ConfigError, RunError};
use crate::core::types::CycleIndex;
use crate::memory::{Allocator, BufferBlock, MemoryError};
use crate::monitoring::{run_span, MemorySampler};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, error, info, warn, Span};
use uuid::Uuid;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Priming,
    Cycling,
    Draining,
    Done,
    Aborted,
}

impl Phase {
    /// No further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done | Phase::Aborted)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Priming => "priming",
            Phase::Cycling => "cycling",
            Phase::Draining => "draining",
            Phase::Done => "done",
            Phase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// One run of the churn workload
///
/// Holds at most two blocks at any time (`current` plus `next` during a
/// cycle) and exactly one between cycles.
///
/// A session is single-threaded: it is `!Sync` and must not be shared
/// between callers. Sampling and allocation order is only meaningful when
/// one thread drives every step.
pub struct ChurnSession<'a, A: Allocator + ?Sized, S: MemorySampler + ?Sized> {
    allocator: &'a A,
    sampler: &'a mut S,
    config: ChurnConfig,
    phase: Phase,
    current: Option<BufferBlock<'a, A>>,
    next: Option<BufferBlock<'a, A>>,
    cycle_index: CycleIndex,
    report: ChurnReport,
    span: Span,
    _not_sync: PhantomData<Cell<()>>,
}

impl<'a, A: Allocator + ?Sized, S: MemorySampler + ?Sized> ChurnSession<'a, A, S> {
    pub fn new(
        config: ChurnConfig,
        allocator: &'a A,
        sampler: &'a mut S,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let run_id = Uuid::new_v4();
        // Sized up front so recording never reallocates mid-run
        let report = ChurnReport::new(run_id, config, sampler.name());
        let span = run_span(run_id, &config);

        Ok(Self {
            allocator,
            sampler,
            config,
            phase: Phase::Idle,
            current: None,
            next: None,
            cycle_index: 0,
            report,
            span,
            _not_sync: PhantomData,
        })
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Cycle the next `Cycling` step will run (0 before priming)
    #[inline]
    pub fn cycle_index(&self) -> CycleIndex {
        self.cycle_index
    }

    /// Blocks currently held
    pub fn live_blocks(&self) -> usize {
        usize::from(self.current.is_some()) + usize::from(self.next.is_some())
    }

    /// Protocol samples recorded so far
    pub fn samples(&self) -> &[LabeledSample] {
        &self.report.samples
    }

    pub fn report(&self) -> &ChurnReport {
        &self.report
    }

    /// Perform one transition and return the phase reached
    ///
    /// A `Cycling` step runs one whole cycle. Terminal phases are a no-op.
    pub fn step(&mut self) -> Result<Phase, RunError> {
        let span = self.span.clone();
        let _entered = span.enter();

        match self.phase {
            Phase::Idle => {
                info!("churn run starting");
                self.record_baseline();
                self.phase = Phase::Priming;
            }
            Phase::Priming => {
                let block = self.allocate_block()?;
                self.current = Some(block);
                self.record(SampleLabel::Priming);

                self.cycle_index = 1;
                self.phase = self.after_cycle_phase();
            }
            Phase::Cycling => {
                let n = self.cycle_index;
                debug!(cycle = n, "cycle starting");

                let block = self.allocate_block()?;
                self.next = Some(block);
                self.record(SampleLabel::CyclePeak(n));

                if let Some(old) = self.current.take() {
                    old.release();
                }
                self.record(SampleLabel::CyclePostRelease(n));

                self.current = self.next.take();
                self.cycle_index += 1;
                self.phase = self.after_cycle_phase();
            }
            Phase::Draining => {
                if let Some(last) = self.current.take() {
                    last.release();
                }
                self.record(SampleLabel::DrainingFinal);
                self.phase = Phase::Done;

                info!(
                    samples = self.report.samples.len(),
                    missing = self.report.missing_samples(),
                    "churn run complete"
                );
            }
            Phase::Done | Phase::Aborted => {}
        }

        debug!(phase = %self.phase, live_blocks = self.live_blocks(), "phase reached");
        Ok(self.phase)
    }

    /// Drive the session to `Done`
    pub fn run(mut self) -> Result<ChurnReport, RunError> {
        while !self.phase.is_terminal() {
            self.step()?;
        }
        Ok(self.into_report())
    }

    /// Recorded report, releasing any block still held
    pub fn into_report(mut self) -> ChurnReport {
        self.release_all();
        self.report
    }

    fn after_cycle_phase(&self) -> Phase {
        if self.cycle_index > self.config.cycle_limit {
            Phase::Draining
        } else {
            Phase::Cycling
        }
    }

    fn allocate_block(&mut self) -> Result<BufferBlock<'a, A>, RunError> {
        BufferBlock::allocate(self.allocator, self.config.layout()).map_err(|e| self.abort(e))
    }

    fn abort(&mut self, source: MemoryError) -> RunError {
        let phase = self.phase;
        error!(
            %phase,
            cycle = self.cycle_index,
            error = %source,
            "allocation failed, aborting churn run"
        );

        self.release_all();
        self.phase = Phase::Aborted;

        RunError {
            phase,
            cycle_index: self.cycle_index,
            source,
            partial: Box::new(self.report.clone()),
        }
    }

    fn release_all(&mut self) {
        if let Some(block) = self.next.take() {
            block.release();
        }
        if let Some(block) = self.current.take() {
            block.release();
        }
    }

    fn read_resident(&mut self, label: SampleLabel) -> Option<u64> {
        match self.sampler.sample() {
            Ok(sample) => Some(sample.resident_bytes),
            Err(e) => {
                warn!(%label, error = %e, "sample unavailable, recording as absent");
                None
            }
        }
    }

    fn record_baseline(&mut self) {
        let resident_bytes = self.read_resident(SampleLabel::Baseline);
        self.report.baseline = Some(LabeledSample {
            step: 0,
            label: SampleLabel::Baseline,
            resident_bytes,
            live_blocks: self.live_blocks(),
        });
    }

    fn record(&mut self, label: SampleLabel) {
        let resident_bytes = self.read_resident(label);
        let sample = LabeledSample {
            step: self.report.samples.len() + 1,
            label,
            resident_bytes,
            live_blocks: self.live_blocks(),
        };
        debug!(
            step = sample.step,
            %label,
            resident_bytes = ?sample.resident_bytes,
            live_blocks = sample.live_blocks,
            "sample recorded"
        );
        self.report.samples.push(sample);
    }
}
