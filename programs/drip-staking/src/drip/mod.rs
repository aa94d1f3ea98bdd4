pub mod calculator;
pub use calculator::*;

// U256 intermediates for rate * time * precision products.
#[allow(clippy::assign_op_pattern)]
#[allow(clippy::ptr_offset_with_cast)]
#[allow(clippy::manual_range_contains)]
mod big_num {
    uint::construct_uint! {
        pub struct U256(4);
    }
}
pub use big_num::U256;

/// A flat (per-NFT) position earns nothing until this much time has passed
/// since its last settlement.
pub const MIN_FLAT_ACCRUAL_SECONDS: u64 = crate::SECONDS_PER_DAY;
