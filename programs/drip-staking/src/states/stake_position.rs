use crate::drip::{DripCalculator, DripSchedule, Settlement};
use crate::error::ErrorCode;
use crate::states::{AssetConfig, AssetKind};
use anchor_lang::prelude::*;

//
// ──────────────────────────────────────────────────────────────────────────────
// StakePosition Account
// ──────────────────────────────────────────────────────────────────────────────
//

/// PDA seed string used to derive a position.
/// Seeds: `POSITION_SEED + owner + mint`, where `mint` is the fungible
/// collateral mint or the staked NFT's mint (the NFT stake id).
pub const POSITION_SEED: &str = "position";

/// One user's stake of one fungible asset, or of one NFT.
///
/// Lifecycle: opened by a stake, topped up by further fungible stakes,
/// settled by claims (only the timestamps and checkpoint move), closed by
/// the unstake that returns the last of the collateral.
#[account]
#[derive(Default, Debug)]
pub struct StakePosition {
    /// PDA bump for this account.
    pub bump: u8,

    /// User the position (and its rewards) belongs to.
    pub owner: Pubkey,

    /// Asset configuration the position was opened against.
    pub asset_config: Pubkey,

    /// Fungible amount or single NFT.
    pub kind: AssetKind,

    /// Collateral mint (fungible) or NFT mint.
    pub mint: Pubkey,

    /// Collateral held in custody (always 1 for an NFT).
    pub amount: u64,

    /// Reward token this position accrues.
    pub reward_mint: Pubkey,

    /// NFT positions: daily rate snapshotted from the reward pool at stake.
    pub drip_rate_per_day: u64,

    /// Fungible positions: pool index at the last checkpoint.
    pub reward_per_token_completed: u128,

    /// Fungible positions: reward checkpointed but not yet settled.
    pub rewards_pending: u64,

    /// UNIX timestamp of the first stake; never changes.
    pub staked_at: u64,

    /// UNIX timestamp of the last settlement; starts at `staked_at`.
    pub last_claim_at: u64,

    /// Restake rewards on every claim when the asset allows it.
    pub auto_compound: bool,
}

impl StakePosition {
    /// Fixed serialized size of the account (for allocation at initialization).
    ///
    /// Breakdown:
    /// - 8: account discriminator
    /// - 1: bump
    /// - 32 * 4: four Pubkeys
    /// - 1: kind
    /// - 8 * 2: amount, drip rate
    /// - 16: index checkpoint
    /// - 8 * 3: pending, timestamps
    /// - 1: auto_compound
    pub const LEN: usize = 8 + 1 + 32 * 4 + 1 + 8 * 2 + 16 + 8 * 3 + 1;

    pub fn is_open(&self) -> bool {
        self.owner != Pubkey::default()
    }

    /// Opens a fungible position. The asset index must already be advanced
    /// to `now`.
    #[allow(clippy::too_many_arguments)]
    pub fn open_fungible(
        &mut self,
        bump: u8,
        owner: Pubkey,
        asset_key: Pubkey,
        asset: &AssetConfig,
        amount: u64,
        auto_compound: bool,
        now: u64,
    ) -> Result<()> {
        require_gt!(amount, 0, ErrorCode::InvalidAmount);
        self.bump = bump;
        self.owner = owner;
        self.asset_config = asset_key;
        self.kind = AssetKind::Fungible;
        self.mint = asset.collateral;
        self.amount = amount;
        self.reward_mint = asset.reward_mint;
        self.drip_rate_per_day = 0;
        self.reward_per_token_completed = asset.reward_per_token_stored;
        self.rewards_pending = 0;
        self.staked_at = now;
        self.last_claim_at = now;
        self.auto_compound = auto_compound;
        Ok(())
    }

    /// Opens a position for a single NFT at a snapshotted daily rate.
    #[allow(clippy::too_many_arguments)]
    pub fn open_non_fungible(
        &mut self,
        bump: u8,
        owner: Pubkey,
        asset_key: Pubkey,
        nft_mint: Pubkey,
        reward_mint: Pubkey,
        drip_rate_per_day: u64,
        now: u64,
    ) {
        self.bump = bump;
        self.owner = owner;
        self.asset_config = asset_key;
        self.kind = AssetKind::NonFungible;
        self.mint = nft_mint;
        self.amount = 1;
        self.reward_mint = reward_mint;
        self.drip_rate_per_day = drip_rate_per_day;
        self.reward_per_token_completed = 0;
        self.rewards_pending = 0;
        self.staked_at = now;
        self.last_claim_at = now;
        self.auto_compound = false;
    }

    /// Accrual schedule of the position against a given pool index.
    pub fn schedule(&self, reward_per_token: u128, now: u64) -> DripSchedule {
        match self.kind {
            AssetKind::Fungible => DripSchedule::Pooled {
                amount: self.amount,
                reward_per_token,
                checkpoint: self.reward_per_token_completed,
            },
            AssetKind::NonFungible => DripSchedule::Flat {
                rate_per_day: self.drip_rate_per_day,
                elapsed: DripCalculator::elapsed(now, self.last_claim_at),
            },
        }
    }

    /// Reward accrued and unsettled as of `now`, without mutating anything.
    pub fn accrued(&self, asset: &AssetConfig, now: u64) -> u64 {
        let fresh = self.schedule(asset.reward_per_token_at(now), now).accrued();
        self.rewards_pending.saturating_add(fresh)
    }

    /// Moves pooled reward earned up to the asset's current index into
    /// `rewards_pending`. No-op for NFT positions.
    ///
    /// Pending reward saturates at `u64::MAX`; it is capped to the reward
    /// balance on settlement anyway.
    pub fn checkpoint(&mut self, asset: &AssetConfig) {
        if self.kind != AssetKind::Fungible {
            return;
        }
        let earned = DripCalculator::pooled_reward(
            self.amount,
            asset.reward_per_token_stored,
            self.reward_per_token_completed,
        );
        self.rewards_pending = self.rewards_pending.saturating_add(earned);
        self.reward_per_token_completed = asset.reward_per_token_stored;
    }

    /// Adds collateral to an open fungible position. Pending reward is kept
    /// and `last_claim_at` does not move.
    pub fn top_up(&mut self, asset: &AssetConfig, amount: u64) -> Result<()> {
        require_gt!(amount, 0, ErrorCode::InvalidAmount);
        require!(self.kind == AssetKind::Fungible, ErrorCode::InvalidAssetKind);
        self.checkpoint(asset);
        self.amount = self
            .amount
            .checked_add(amount)
            .ok_or(ErrorCode::MathOverflow)?;
        Ok(())
    }

    /// Settles everything accrued up to `now` against `available`.
    ///
    /// The asset index must already be advanced to `now`. Whatever cannot
    /// be funded is forfeited. An NFT position less than a full day past its
    /// last settlement keeps its clock running.
    pub fn settle(&mut self, asset: &AssetConfig, available: u64, now: u64) -> Settlement {
        self.checkpoint(asset);
        let accrued = match self.kind {
            AssetKind::Fungible => self.rewards_pending,
            AssetKind::NonFungible => self.schedule(0, now).accrued(),
        };
        let settlement = DripCalculator::settle(accrued, available);
        self.rewards_pending = 0;
        if self.kind == AssetKind::Fungible || accrued > 0 {
            self.last_claim_at = self.last_claim_at.max(now);
        }
        settlement
    }

    /// Drops everything accrued up to `now`, for exits that skip the claim.
    /// Returns the amount given up. Never fails, so an exit without a claim
    /// cannot be blocked by the reward arithmetic.
    pub fn forfeit(&mut self, asset: &AssetConfig, now: u64) -> u64 {
        self.settle(asset, 0, now).forfeited
    }

    /// Adds a restaked reward to the collateral.
    pub fn compound(&mut self, amount: u64) -> Result<()> {
        self.amount = self
            .amount
            .checked_add(amount)
            .ok_or(ErrorCode::MathOverflow)?;
        Ok(())
    }

    /// Removes collateral for an unstake. Returns true when the position is
    /// emptied and must be closed.
    pub fn withdraw(&mut self, amount: u64) -> Result<bool> {
        require_gt!(amount, 0, ErrorCode::InvalidAmount);
        require_gte!(self.amount, amount, ErrorCode::InvalidAmount);
        self.amount -= amount;
        Ok(self.amount == 0)
    }

    /// Daily emission this position adds to its reward pool's run rate.
    /// Fungible positions contribute through their asset instead.
    pub fn run_rate_per_day(&self) -> u64 {
        match self.kind {
            AssetKind::Fungible => 0,
            AssetKind::NonFungible => self.drip_rate_per_day,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SECONDS_PER_DAY;

    const DAY: u64 = SECONDS_PER_DAY;

    fn pool(rate: u64) -> AssetConfig {
        let mut asset = AssetConfig::default();
        asset
            .configure_fungible(Pubkey::new_unique(), Pubkey::new_unique(), rate, 0)
            .unwrap();
        asset
    }

    fn stake(asset: &mut AssetConfig, amount: u64, now: u64) -> StakePosition {
        asset.update_reward_index(now);
        let mut position = StakePosition::default();
        position
            .open_fungible(1, Pubkey::new_unique(), Pubkey::new_unique(), asset, amount, false, now)
            .unwrap();
        asset.add_stake(amount, true).unwrap();
        position
    }

    #[test]
    fn one_day_claim_pays_pool_share_once() {
        let mut asset = pool(3_000);
        let mut alice = stake(&mut asset, 10, 0);
        let _bob = stake(&mut asset, 20, 0);

        assert_eq!(alice.accrued(&asset, DAY), 1_000);

        asset.update_reward_index(DAY);
        let first = alice.settle(&asset, u64::MAX, DAY);
        assert_eq!(first.paid, 1_000);
        assert_eq!(alice.last_claim_at, DAY);

        let second = alice.settle(&asset, u64::MAX, DAY);
        assert_eq!(second.accrued, 0);
        assert_eq!(alice.accrued(&asset, DAY), 0);
    }

    #[test]
    fn underfunded_claim_forfeits_the_rest() {
        let mut asset = pool(1_000);
        let mut position = stake(&mut asset, 10, 0);

        asset.update_reward_index(DAY);
        let s = position.settle(&asset, 400, DAY);
        assert_eq!((s.accrued, s.paid, s.forfeited), (1_000, 400, 600));

        // the forfeited part is gone; the next day starts from zero
        assert_eq!(position.accrued(&asset, DAY), 0);
        assert_eq!(position.accrued(&asset, 2 * DAY), 1_000);
    }

    #[test]
    fn top_up_preserves_pending_and_timestamp() {
        let mut asset = pool(1_000);
        let mut position = stake(&mut asset, 10, 0);

        asset.update_reward_index(DAY);
        position.top_up(&asset, 10).unwrap();
        asset.add_stake(10, false).unwrap();
        assert_eq!(position.rewards_pending, 1_000);
        assert_eq!(position.last_claim_at, 0);
        assert_eq!(position.staked_at, 0);

        // sole staker keeps earning the whole pool rate
        assert_eq!(position.accrued(&asset, 2 * DAY), 2_000);
    }

    #[test]
    fn nft_accrues_flat_rate_after_first_day() {
        let asset = AssetConfig {
            kind: AssetKind::NonFungible,
            ..AssetConfig::default()
        };
        let mut position = StakePosition::default();
        position.open_non_fungible(
            1,
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            1_000,
            0,
        );

        assert_eq!(position.accrued(&asset, DAY / 2), 0);
        let early = position.settle(&asset, u64::MAX, DAY / 2);
        assert_eq!(early.paid, 0);
        assert_eq!(position.last_claim_at, 0);

        assert_eq!(position.accrued(&asset, DAY + DAY / 2), 1_500);
        let s = position.settle(&asset, u64::MAX, DAY + DAY / 2);
        assert_eq!(s.paid, 1_500);
        assert_eq!(position.last_claim_at, DAY + DAY / 2);

        // a day later the claimable amount is smaller than the first claim
        assert_eq!(position.accrued(&asset, 2 * DAY + DAY / 2), 1_000);
        assert_eq!(position.run_rate_per_day(), 1_000);
    }

    #[test]
    fn withdraw_bounds() {
        let mut asset = pool(1_000);
        let mut position = stake(&mut asset, 10, 0);
        assert!(position.withdraw(0).is_err());
        assert!(position.withdraw(11).is_err());
        assert!(!position.withdraw(4).unwrap());
        assert!(position.withdraw(6).unwrap());
    }

    #[test]
    fn forfeit_drops_accrued_reward() {
        let mut asset = pool(1_000);
        let mut position = stake(&mut asset, 10, 0);
        asset.update_reward_index(DAY);
        assert_eq!(position.forfeit(&asset, DAY), 1_000);
        assert_eq!(position.rewards_pending, 0);
    }

    #[test]
    fn settle_never_moves_clock_backwards() {
        let mut asset = pool(1_000);
        let mut position = stake(&mut asset, 10, DAY);
        asset.update_reward_index(DAY);
        position.settle(&asset, u64::MAX, DAY / 2);
        assert_eq!(position.last_claim_at, DAY);
    }

    #[test]
    fn exit_is_possible_after_pending_reward_saturates() {
        // 1e18/day over 10 units for 20 days accrues past u64::MAX
        let rate = 1_000_000_000_000_000_000;
        let mut asset = pool(rate);
        let mut position = stake(&mut asset, 10, 0);
        asset.update_reward_index(20 * DAY);

        position.checkpoint(&asset);
        assert_eq!(position.rewards_pending, u64::MAX);
        assert!(position.withdraw(10).unwrap());
        assert_eq!(position.forfeit(&asset, 20 * DAY), u64::MAX);
        assert_eq!(position.rewards_pending, 0);

        let s = position.settle(&asset, 1_000, 20 * DAY);
        assert_eq!(s.accrued, 0);
    }

    #[test]
    fn nft_exit_is_possible_after_flat_reward_saturates() {
        let asset = AssetConfig {
            kind: AssetKind::NonFungible,
            ..AssetConfig::default()
        };
        let mut position = StakePosition::default();
        position.open_non_fungible(
            1,
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            1_000_000_000_000_000_000,
            0,
        );
        assert_eq!(position.accrued(&asset, 20 * DAY), u64::MAX);
        assert_eq!(position.forfeit(&asset, 20 * DAY), u64::MAX);
        assert!(position.withdraw(1).unwrap());
    }
}
