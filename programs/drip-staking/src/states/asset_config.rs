use crate::drip::{DripCalculator, IndexStep};
use crate::error::ErrorCode;
use anchor_lang::prelude::*;

//
// ──────────────────────────────────────────────────────────────────────────────
// AssetConfig Account
// ──────────────────────────────────────────────────────────────────────────────
//

/// PDA seed string used to derive an asset's configuration account.
/// Seeds: `ASSET_CONFIG_SEED + collateral` where `collateral` is the
/// fungible mint or the NFT collection mint.
pub const ASSET_CONFIG_SEED: &str = "asset_config";

/// Kind of collateral an asset accepts.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AssetKind {
    /// SPL token amounts; rewards are a pooled daily rate shared pro rata.
    #[default]
    Fungible,
    /// Individual NFTs of one verified collection; each token earns the
    /// flat daily rate of the reward token chosen at stake time.
    NonFungible,
}

/// Reward configuration and pool accounting for one stakeable asset.
///
/// For fungible assets the account also carries the reward-per-token index:
/// `reward_per_token_stored` accumulates
/// `drip_rate_per_day * elapsed * PRECISION / (SECONDS_PER_DAY * total_staked)`
/// and every position checkpoints it on settlement.
#[account]
#[derive(Default, Debug)]
pub struct AssetConfig {
    /// PDA bump for this account.
    pub bump: u8,

    /// Fungible or NFT collection.
    pub kind: AssetKind,

    /// Collateral mint (fungible) or collection mint (non-fungible).
    pub collateral: Pubkey,

    /// Program-owned vault holding fungible collateral. NFT vaults are
    /// derived per token and left unset here.
    pub collateral_vault: Pubkey,

    /// Reward token paid for fungible stakes.
    pub reward_mint: Pubkey,

    /// Total reward emitted per day across the whole fungible pool.
    pub drip_rate_per_day: u64,

    /// Whether new stakes are accepted.
    pub permitted: bool,

    /// Units currently staked (number of NFTs for collections).
    pub total_staked: u64,

    /// Number of open positions.
    pub open_positions: u64,

    /// Reward-per-token index, scaled by PRECISION.
    pub reward_per_token_stored: u128,

    /// Emission truncated out of the index so far, in reward * PRECISION *
    /// seconds. Folded into the next index advance.
    pub reward_index_remainder: u128,

    /// UNIX timestamp (seconds) the index was last advanced to.
    pub last_update_timestamp: u64,
}

impl AssetConfig {
    /// Fixed serialized size of the account (for allocation at initialization).
    ///
    /// Breakdown:
    /// - 8: account discriminator
    /// - 1: bump
    /// - 1: kind
    /// - 32 * 3: three Pubkeys
    /// - 8: drip rate
    /// - 1: permitted
    /// - 8 * 2: totals
    /// - 16: index
    /// - 16: index remainder
    /// - 8: timestamp
    pub const LEN: usize = 8 + 1 + 1 + 32 * 3 + 8 + 1 + 8 * 2 + 16 + 16 + 8;

    pub fn is_fungible(&self) -> bool {
        self.kind == AssetKind::Fungible
    }

    pub fn is_configured(&self) -> bool {
        match self.kind {
            AssetKind::Fungible => {
                self.reward_mint != Pubkey::default() && self.drip_rate_per_day > 0
            }
            AssetKind::NonFungible => self.collateral != Pubkey::default(),
        }
    }

    /// Preconditions shared by every stake into this asset.
    pub fn ensure_stakeable(&self, kind: AssetKind) -> Result<()> {
        require!(self.kind == kind, ErrorCode::InvalidAssetKind);
        require!(self.is_configured(), ErrorCode::NotConfigured);
        require!(self.permitted, ErrorCode::NotPermitted);
        Ok(())
    }

    fn index_step(&self, now: u64) -> IndexStep {
        let elapsed = DripCalculator::elapsed(now, self.last_update_timestamp);
        DripCalculator::reward_per_token_delta(
            self.drip_rate_per_day,
            elapsed,
            self.total_staked,
            self.reward_index_remainder,
        )
    }

    /// Index value the pool would have at `now`, without mutating state.
    pub fn reward_per_token_at(&self, now: u64) -> u128 {
        if !self.is_fungible() {
            return 0;
        }
        self.reward_per_token_stored
            .saturating_add(self.index_step(now).delta)
    }

    /// Advances the index to `now` at the current rate. Must run before any
    /// change to `total_staked` or `drip_rate_per_day`.
    pub fn update_reward_index(&mut self, now: u64) {
        if self.is_fungible() {
            let step = self.index_step(now);
            self.reward_per_token_stored = self.reward_per_token_stored.saturating_add(step.delta);
            self.reward_index_remainder = step.remainder;
        }
        self.last_update_timestamp = self.last_update_timestamp.max(now);
    }

    /// Writes a fungible reward configuration. The index is brought up to
    /// date first so time already elapsed is priced at the previous rate.
    ///
    /// Returns the previous daily rate when the pool was emitting, so the
    /// caller can move the runway aggregate.
    pub fn configure_fungible(
        &mut self,
        collateral: Pubkey,
        reward_mint: Pubkey,
        drip_rate_per_day: u64,
        now: u64,
    ) -> Result<Option<u64>> {
        require!(self.is_fungible(), ErrorCode::InvalidAssetKind);
        require_gt!(drip_rate_per_day, 0, ErrorCode::InvalidAmount);
        if self.open_positions > 0 {
            require_keys_eq!(self.reward_mint, reward_mint, ErrorCode::RewardTokenImmutable);
        }
        self.update_reward_index(now);

        let previous = if self.total_staked > 0 {
            Some(self.drip_rate_per_day)
        } else {
            None
        };
        self.collateral = collateral;
        self.reward_mint = reward_mint;
        self.drip_rate_per_day = drip_rate_per_day;
        self.permitted = true;
        Ok(previous)
    }

    /// Registers (or re-permits) an NFT collection.
    pub fn permit_collection(&mut self, collection: Pubkey) -> Result<()> {
        if self.collateral == Pubkey::default() {
            self.kind = AssetKind::NonFungible;
            self.collateral = collection;
        }
        require!(!self.is_fungible(), ErrorCode::InvalidAssetKind);
        require_keys_eq!(self.collateral, collection, ErrorCode::InvalidCollection);
        self.permitted = true;
        Ok(())
    }

    /// Toggles whether new stakes are accepted. Open positions are
    /// unaffected either way.
    pub fn set_permitted(&mut self, permitted: bool) -> Result<()> {
        if permitted {
            require!(self.is_configured(), ErrorCode::NotConfigured);
        }
        self.permitted = permitted;
        Ok(())
    }

    /// Adds stake to the pool. Returns true when the pool goes from empty to
    /// emitting.
    pub fn add_stake(&mut self, amount: u64, opens_position: bool) -> Result<bool> {
        let was_empty = self.total_staked == 0;
        self.total_staked = self
            .total_staked
            .checked_add(amount)
            .ok_or(ErrorCode::MathOverflow)?;
        if opens_position {
            self.open_positions = self
                .open_positions
                .checked_add(1)
                .ok_or(ErrorCode::MathOverflow)?;
        }
        Ok(was_empty && self.total_staked > 0)
    }

    /// Removes stake from the pool. Returns true when the pool stops
    /// emitting.
    pub fn remove_stake(&mut self, amount: u64, closes_position: bool) -> Result<bool> {
        self.total_staked = self
            .total_staked
            .checked_sub(amount)
            .ok_or(ErrorCode::MathOverflow)?;
        if closes_position {
            self.open_positions = self
                .open_positions
                .checked_sub(1)
                .ok_or(ErrorCode::MathOverflow)?;
        }
        Ok(self.total_staked == 0)
    }

    /// Per-unit daily reward at the current pool size; zero when nothing is
    /// staked. Scaled by PRECISION.
    pub fn reward_rate(&self) -> Result<u128> {
        if !self.is_fungible() || self.total_staked == 0 {
            return Ok(0);
        }
        u128::from(self.drip_rate_per_day)
            .checked_mul(crate::PRECISION)
            .and_then(|v| v.checked_div(u128::from(self.total_staked)))
            .ok_or(ErrorCode::MathOverflow.into())
    }

    /// Whether a reward from this asset may be restaked as more collateral.
    pub fn can_compound(&self) -> bool {
        self.is_fungible() && self.permitted && self.reward_mint == self.collateral
    }
}
