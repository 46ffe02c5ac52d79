/*!
 * Round Trip Tests
 * Repeated allocate/release of one block shape against real RSS
 */

use churn_probe::{BlockLayout, BufferBlock, MemorySampler, StatmSampler, SystemAllocator};
use serial_test::serial;

const SLACK: u64 = 1 << 20;

#[test]
#[serial]
fn test_repeated_round_trips_stay_bounded() {
    let allocator = SystemAllocator;
    let mut sampler = StatmSampler::open().unwrap();
    let layout = BlockLayout::new(64, 16 * 1024);
    let block_bytes = layout.payload_bytes().unwrap() as u64;

    // Let the allocator settle on this shape first
    BufferBlock::allocate(&allocator, layout).unwrap().release();
    let reference = sampler.sample().unwrap().resident_bytes;

    for _ in 0..20 {
        BufferBlock::allocate(&allocator, layout).unwrap().release();
    }
    let after = sampler.sample().unwrap().resident_bytes;

    assert!(
        after <= reference + block_bytes + SLACK,
        "resident grew from {} to {} over 20 round trips",
        reference,
        after
    );
}

#[test]
#[serial]
fn test_live_block_is_resident() {
    let allocator = SystemAllocator;
    let mut sampler = StatmSampler::open().unwrap();
    let layout = BlockLayout::new(16, 4 << 20);
    let block_bytes = layout.payload_bytes().unwrap() as u64;

    let before = sampler.sample().unwrap().resident_bytes;
    let block = BufferBlock::allocate(&allocator, layout).unwrap();
    let during = sampler.sample().unwrap().resident_bytes;
    block.release();

    // Every byte was written, so the pages are backed
    assert!(
        during + SLACK >= before + block_bytes,
        "block of {} bytes barely moved RSS: {} -> {}",
        block_bytes,
        before,
        during
    );
}
