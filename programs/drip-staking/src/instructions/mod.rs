pub mod initialise_configs;
pub use initialise_configs::*;

pub mod update_configs;
pub use update_configs::*;

pub mod configure_stakeable_asset;
pub use configure_stakeable_asset::*;

pub mod permit_nft;
pub use permit_nft::*;

pub mod permit_reward_token;
pub use permit_reward_token::*;

pub mod set_asset_permission;
pub use set_asset_permission::*;

pub mod fund_reward_pool;
pub use fund_reward_pool::*;

pub mod stake;
pub use stake::*;

pub mod stake_nft;
pub use stake_nft::*;

pub mod claim;
pub use claim::*;

pub mod claim_all;
pub use claim_all::*;

pub mod unstake;
pub use unstake::*;

pub mod unstake_nft;
pub use unstake_nft::*;

pub mod views;
pub use views::*;
