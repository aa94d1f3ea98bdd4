use anchor_lang::prelude::*;

//
// ──────────────────────────────────────────────────────────────────────────────
// Events: Emitted for off-chain indexers/clients to track staking state changes
// ──────────────────────────────────────────────────────────────────────────────
//

/// Emitted once when the global configuration is initialized.
#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct GlobalConfigInitialized {
    /// Protocol admin pubkey (may later be updated).
    pub admin: Pubkey,
    /// Seconds a position must stay open before it can be unstaked.
    pub minimum_staking_time: u64,
}

/// Emitted whenever configuration parameters are modified via `update_config`.
#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct ConfigUpdated {
    /// Current admin (may be the same or newly set).
    pub admin: Pubkey,
    /// External reward wallet, or the default key for vault funding.
    pub reward_wallet: Pubkey,
    /// Minimum staking time after the update.
    pub minimum_staking_time: u64,
}

/// Emitted when a fungible asset is configured or an NFT collection is
/// permitted.
#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct AssetConfigured {
    /// Asset configuration account.
    pub asset_config: Pubkey,
    /// Collateral mint or collection mint.
    pub collateral: Pubkey,
    /// Reward token (default key for NFT collections).
    pub reward_mint: Pubkey,
    /// Total daily emission of the fungible pool.
    pub drip_rate_per_day: u64,
    /// Whether the asset holds NFTs.
    pub non_fungible: bool,
}

/// Emitted when an asset is permitted or revoked for new stakes.
#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct AssetPermissionChanged {
    pub asset_config: Pubkey,
    pub permitted: bool,
}

/// Emitted when an NFT-mode reward token is permitted, re-rated or revoked.
#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct RewardTokenPermitted {
    pub reward_mint: Pubkey,
    /// Daily reward per staked NFT for new positions.
    pub nft_rate_per_day: u64,
    pub permitted: bool,
}

/// Emitted when reward tokens are deposited into a reward vault.
#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct RewardPoolFunded {
    /// Account that supplied the tokens.
    pub funder: Pubkey,
    pub reward_mint: Pubkey,
    pub amount: u64,
    /// Vault balance after the deposit.
    pub vault_balance: u64,
}

/// Emitted when collateral enters custody (new position or top-up).
#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct Staked {
    /// Owner of the position.
    pub owner: Pubkey,
    /// Account that paid the collateral (differs from `owner` when staking
    /// on behalf of someone else).
    pub payer: Pubkey,
    pub position: Pubkey,
    /// Collateral mint or NFT mint.
    pub mint: Pubkey,
    pub reward_mint: Pubkey,
    pub amount: u64,
    /// Position amount after the stake.
    pub position_amount: u64,
    pub timestamp: u64,
}

/// Emitted for every settlement that accrued something: one entry of the
/// user's reward history.
#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct RewardClaimed {
    pub owner: Pubkey,
    pub position: Pubkey,
    pub reward_mint: Pubkey,
    /// Reward paid out (or restaked).
    pub amount: u64,
    /// Accrued reward the pool could not fund.
    pub forfeited: u64,
    /// Whether `amount` was added to the position instead of transferred.
    pub restaked: bool,
    pub timestamp: u64,
}

/// Emitted when collateral leaves custody.
#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct Unstaked {
    pub owner: Pubkey,
    pub position: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
    /// Pending reward dropped because the exit skipped the claim.
    pub forfeited: u64,
    /// Whether the position was closed.
    pub closed: bool,
    pub timestamp: u64,
}
