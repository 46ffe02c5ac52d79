/*!
 * Scenario Tests
 * The built-in presets sampled through /proc/self/statm
 */

use churn_probe::churn::{self, Scenario};
use churn_probe::{StatmSampler, SystemAllocator, TrackingAllocator};
use serial_test::serial;

const SLACK: u64 = 256 * 1024;

fn run_preset(scenario: Scenario, cycles: usize) -> churn_probe::ChurnReport {
    let allocator = TrackingAllocator::new(SystemAllocator);
    let mut sampler = StatmSampler::open().unwrap();
    let config = scenario.config(cycles).unwrap();

    let report = churn::run(config, &allocator, &mut sampler).unwrap();
    assert_eq!(allocator.stats().live_allocations(), 0);
    assert!(allocator.stats().peak_live_blocks <= 2);
    report
}

fn assert_release_never_raises(report: &churn_probe::ChurnReport) {
    for ((cycle, peak), (_, post)) in report.peaks().into_iter().zip(report.post_release()) {
        let (peak, post) = (peak.unwrap(), post.unwrap());
        assert!(
            post <= peak + SLACK,
            "cycle {}: RSS rose from {} to {} across a release",
            cycle,
            peak,
            post
        );
    }
}

#[test]
#[serial]
fn test_medium_segments() {
    let report = run_preset(Scenario::MediumSegments, 5);
    assert_eq!(report.samples.len(), 12);
    assert_eq!(report.missing_samples(), 0);
    assert_release_never_raises(&report);
}

#[test]
#[serial]
fn test_large_segments() {
    let report = run_preset(Scenario::LargeSegments, 5);
    assert_eq!(report.samples.len(), 12);
    assert_eq!(report.missing_samples(), 0);
    assert_release_never_raises(&report);
}

#[test]
#[serial]
fn test_small_segments() {
    let report = run_preset(Scenario::SmallSegments, 5);
    assert_eq!(report.samples.len(), 12);
    assert_eq!(report.missing_samples(), 0);
    assert_release_never_raises(&report);
}

#[test]
#[serial]
fn test_zero_cycles() {
    let report = run_preset(Scenario::MediumSegments, 0);
    assert_eq!(report.samples.len(), 2);
    assert!(report.peaks().is_empty());
    assert!(report.baseline.unwrap().resident_bytes.is_some());
}
