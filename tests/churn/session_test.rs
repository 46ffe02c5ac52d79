/*!
 * Session Tests
 * Full runs against the tracking allocator, sampled from its own counters
 */

use churn_probe::churn::{self, ChurnConfig, RetentionVerdict, SampleLabel, Scenario};
use churn_probe::{ChurnError, ConfigError, FnSampler, MemorySample, SystemAllocator, TrackingAllocator};
use pretty_assertions::assert_eq;

fn labels(report: &churn_probe::ChurnReport) -> Vec<SampleLabel> {
    report.samples.iter().map(|s| s.label).collect()
}

#[test]
fn test_presets_record_twelve_samples() {
    for scenario in Scenario::ALL {
        let allocator = TrackingAllocator::new(SystemAllocator);
        let mut sampler =
            FnSampler::new(|| Ok(MemorySample::new(allocator.stats().live_bytes as u64)));

        let report = churn::run(scenario.default_config(), &allocator, &mut sampler).unwrap();
        let block = scenario.default_config().block_bytes() as u64;

        assert_eq!(report.samples.len(), 12, "{}", scenario);
        assert!(report.is_complete());
        assert_eq!(report.baseline.unwrap().resident_bytes, Some(0));
        assert_eq!(report.priming(), Some(block));
        for (cycle, peak) in report.peaks() {
            assert_eq!(peak, Some(2 * block), "{} cycle {}", scenario, cycle);
        }
        for (cycle, post) in report.post_release() {
            assert_eq!(post, Some(block), "{} cycle {}", scenario, cycle);
        }
        assert_eq!(
            report.find(SampleLabel::DrainingFinal).unwrap().resident_bytes,
            Some(0)
        );

        let stats = allocator.stats();
        assert_eq!(stats.peak_live_blocks, 2);
        assert_eq!(stats.blocks_allocated, 6);
        assert_eq!(stats.live_allocations(), 0);
    }
}

#[test]
fn test_label_sequence() {
    let allocator = SystemAllocator;
    let mut sampler = FnSampler::new(|| Ok(MemorySample::new(0)));
    let config = ChurnConfig::new(4, 256, 3).unwrap();

    let report = churn::run(config, &allocator, &mut sampler).unwrap();

    assert_eq!(
        labels(&report),
        vec![
            SampleLabel::Priming,
            SampleLabel::CyclePeak(1),
            SampleLabel::CyclePostRelease(1),
            SampleLabel::CyclePeak(2),
            SampleLabel::CyclePostRelease(2),
            SampleLabel::CyclePeak(3),
            SampleLabel::CyclePostRelease(3),
            SampleLabel::DrainingFinal,
        ]
    );
    let steps: Vec<usize> = report.samples.iter().map(|s| s.step).collect();
    assert_eq!(steps, (1..=8).collect::<Vec<_>>());
}

#[test]
fn test_zero_cycles_records_priming_and_final() {
    let allocator = TrackingAllocator::new(SystemAllocator);
    let mut sampler =
        FnSampler::new(|| Ok(MemorySample::new(allocator.stats().live_bytes as u64)));
    let config = Scenario::MediumSegments.config(0).unwrap();

    let report = churn::run(config, &allocator, &mut sampler).unwrap();

    assert_eq!(
        labels(&report),
        vec![SampleLabel::Priming, SampleLabel::DrainingFinal]
    );
    assert_eq!(report.samples[0].live_blocks, 1);
    assert_eq!(report.samples[1].live_blocks, 0);
    assert_eq!(report.samples[1].resident_bytes, Some(0));
    assert_eq!(allocator.stats().peak_live_blocks, 1);
    assert_eq!(report.verdict(0), RetentionVerdict::Inconclusive);
}

#[test]
fn test_invalid_config_never_allocates() {
    let allocator = TrackingAllocator::new(SystemAllocator);
    let mut calls = 0;
    let mut sampler = FnSampler::new(|| {
        calls += 1;
        Ok(MemorySample::new(0))
    });
    let config = ChurnConfig {
        segment_count: 3,
        segment_size: 0,
        cycle_limit: 2,
    };

    let err = churn::run(config, &allocator, &mut sampler).unwrap_err();

    assert!(matches!(err, ChurnError::Config(ConfigError::ZeroSegmentSize)));
    assert!(err.partial_report().is_none());
    drop(sampler);
    assert_eq!(calls, 0);
    assert_eq!(allocator.stats().blocks_allocated, 0);
}

#[test]
fn test_verdict_follows_resident_model() {
    let config = ChurnConfig::new(8, 4096, 4).unwrap();
    let block = config.block_bytes();

    // Memory handed back on every release
    let allocator = TrackingAllocator::new(SystemAllocator);
    let mut sampler =
        FnSampler::new(|| Ok(MemorySample::new(allocator.stats().live_bytes as u64)));
    let report = churn::run(config, &allocator, &mut sampler).unwrap();
    assert_eq!(report.verdict(0), RetentionVerdict::Returned);

    // Memory kept at its high-water mark and reused
    let allocator = TrackingAllocator::new(SystemAllocator);
    let mut sampler =
        FnSampler::new(|| Ok(MemorySample::new(allocator.stats().peak_live_bytes as u64)));
    let report = churn::run(config, &allocator, &mut sampler).unwrap();
    assert_eq!(report.verdict(1024), RetentionVerdict::Plateau);

    // Memory never reused
    let allocator = TrackingAllocator::new(SystemAllocator);
    let mut sampler = FnSampler::new(|| {
        Ok(MemorySample::new(
            (allocator.stats().segments_allocated * 4096) as u64,
        ))
    });
    let report = churn::run(config, &allocator, &mut sampler).unwrap();
    assert_eq!(report.verdict(block as u64 / 2), RetentionVerdict::Growing);
}

#[test]
fn test_report_serializes_labels_as_strings() {
    let allocator = SystemAllocator;
    let mut sampler = FnSampler::new(|| Ok(MemorySample::new(4096)));
    let config = ChurnConfig::new(1, 64, 1).unwrap();

    let report = churn::run(config, &allocator, &mut sampler).unwrap();
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["sampler"], "fn");
    assert_eq!(value["baseline"]["label"], "baseline");
    let names: Vec<&str> = value["samples"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["label"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["priming", "cycle-1-peak", "cycle-1-post-release", "draining-final"]
    );
    assert!(value.get("allocation").is_none());
}

#[test]
fn test_run_ids_are_unique() {
    let allocator = SystemAllocator;
    let mut sampler = FnSampler::new(|| Ok(MemorySample::new(0)));
    let config = ChurnConfig::new(1, 8, 0).unwrap();

    let a = churn::run(config, &allocator, &mut sampler).unwrap();
    let b = churn::run(config, &allocator, &mut sampler).unwrap();
    assert_ne!(a.run_id, b.run_id);
}
