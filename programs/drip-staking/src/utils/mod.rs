pub mod token;
pub use token::*;

use crate::error::ErrorCode;
use anchor_lang::prelude::*;

/// Current cluster time in whole seconds.
pub fn current_timestamp() -> Result<u64> {
    let unix_timestamp = Clock::get()?.unix_timestamp;
    u64::try_from(unix_timestamp).map_err(|_| error!(ErrorCode::InvalidTimestamp))
}
