pub mod events;
pub use events::*;

pub mod global_config;
pub use global_config::*;

pub mod asset_config;
pub use asset_config::*;

pub mod reward_pool;
pub use reward_pool::*;

pub mod stake_position;
pub use stake_position::*;

pub mod reward_history;
pub use reward_history::*;

pub mod position_ledger;
pub use position_ledger::*;
