/*!
 * Property Tests
 * Invariants that hold for any workload shape
 */

use crate::failure_test::{FailAt, FailingAllocator};
use churn_probe::churn::{self, ChurnConfig, SampleLabel};
use churn_probe::{
    ChurnError, FnSampler, MemorySample, SampleError, SystemAllocator, TrackingAllocator,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_sample_count_and_window(
        segment_count in 1usize..16,
        segment_size in 1usize..2048,
        cycle_limit in 0usize..8,
    ) {
        let allocator = TrackingAllocator::new(SystemAllocator);
        let mut sampler =
            FnSampler::new(|| Ok(MemorySample::new(allocator.stats().live_blocks as u64)));
        let config = ChurnConfig::new(segment_count, segment_size, cycle_limit).unwrap();

        let report = churn::run(config, &allocator, &mut sampler).unwrap();

        prop_assert_eq!(report.samples.len(), 2 + 2 * cycle_limit);
        prop_assert_eq!(report.samples[0].label, SampleLabel::Priming);
        prop_assert_eq!(report.samples.last().unwrap().label, SampleLabel::DrainingFinal);
        for sample in &report.samples {
            prop_assert!(sample.live_blocks <= 2);
            // The sampler sees exactly what the session holds
            prop_assert_eq!(sample.resident_bytes, Some(sample.live_blocks as u64));
            let expected_live = match sample.label {
                SampleLabel::CyclePeak(_) => 2,
                SampleLabel::DrainingFinal | SampleLabel::Baseline => 0,
                _ => 1,
            };
            prop_assert_eq!(sample.live_blocks, expected_live);
        }

        let stats = allocator.stats();
        prop_assert!(stats.peak_live_blocks <= 2);
        prop_assert_eq!(stats.blocks_allocated, cycle_limit + 1);
        prop_assert_eq!(stats.segments_allocated, (cycle_limit + 1) * segment_count);
        prop_assert_eq!(stats.live_allocations(), 0);
    }

    #[test]
    fn prop_sampler_failures_are_recorded_as_missing(
        failures in proptest::collection::vec(any::<bool>(), 13),
    ) {
        let allocator = SystemAllocator;
        let mut calls = failures.iter().copied();
        let mut sampler = FnSampler::new(move || match calls.next() {
            Some(true) => Err(SampleError::unavailable("flaky", "injected")),
            _ => Ok(MemorySample::new(4096)),
        });
        let config = ChurnConfig::new(2, 16, 5).unwrap();

        let report = churn::run(config, &allocator, &mut sampler).unwrap();

        // First call is the baseline
        prop_assert_eq!(report.baseline.unwrap().resident_bytes.is_none(), failures[0]);
        let expected_missing = failures[1..].iter().filter(|&&f| f).count();
        prop_assert_eq!(report.samples.len(), 12);
        prop_assert_eq!(report.missing_samples(), expected_missing);
    }

    #[test]
    fn prop_injected_failure_never_leaks(
        block in 0usize..6,
        index in 0usize..4,
        fail_header in any::<bool>(),
    ) {
        let fail_at = if fail_header {
            FailAt::Header(block)
        } else {
            FailAt::Segment(block, index)
        };
        let allocator = FailingAllocator::new(fail_at);
        let mut sampler = FnSampler::new(|| Ok(MemorySample::new(0)));
        let config = ChurnConfig::new(4, 128, 5).unwrap();

        let result = churn::run(config, &allocator, &mut sampler);
        let err = match result {
            Err(ChurnError::Run(err)) => err,
            other => return Err(TestCaseError::fail(format!("expected abort, got {:?}", other))),
        };

        prop_assert_eq!(err.cycle_index, block);
        // Completed cycles only: priming plus two per finished cycle
        let expected = if block == 0 { 0 } else { 1 + 2 * (block - 1) };
        prop_assert_eq!(err.partial.samples.len(), expected);
        prop_assert_eq!(allocator.tracking.stats().live_allocations(), 0);
        prop_assert!(allocator.tracking.stats().peak_live_blocks <= 2);
    }
}
