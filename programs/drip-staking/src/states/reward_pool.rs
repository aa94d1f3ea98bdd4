use crate::drip::{DripCalculator, Settlement};
use crate::error::ErrorCode;
use anchor_lang::prelude::*;

//
// ──────────────────────────────────────────────────────────────────────────────
// RewardPool Account
// ──────────────────────────────────────────────────────────────────────────────
//

/// PDA seed string used to derive a reward token's pool account.
/// Seeds: `REWARD_POOL_SEED + reward_mint`.
pub const REWARD_POOL_SEED: &str = "reward_pool";

/// Emission bookkeeping for one reward token.
///
/// The pool tracks:
/// - The NFT-mode permission and flat per-token rate.
/// - The aggregate daily emission of every open position paid in this token
///   (the runway numerator).
/// - Lifetime totals paid and forfeited.
#[account]
#[derive(Default, Debug)]
pub struct RewardPool {
    /// PDA bump for this account.
    pub bump: u8,

    /// Reward token this pool pays.
    pub reward_mint: Pubkey,

    /// Program-owned vault paying rewards when no reward wallet is set.
    pub reward_vault: Pubkey,

    /// Whether NFT stakes may choose this reward token.
    pub permitted: bool,

    /// Daily reward per staked NFT; snapshotted into each NFT position.
    pub nft_rate_per_day: u64,

    /// Sum of the daily emission of every open position paying this token.
    pub run_rate_per_day: u128,

    /// Open positions paying this token.
    pub open_positions: u64,

    /// Total reward transferred or restaked.
    pub total_paid: u64,

    /// Total accrued reward dropped for lack of funds (or on exit without
    /// claiming).
    pub total_forfeited: u64,
}

/// Derived emission state of a reward pool.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Runway {
    /// Aggregate emission per second, scaled by PRECISION.
    pub run_rate_per_second: u128,
    /// Seconds the available balance sustains that rate; `None` while
    /// nothing is emitting.
    pub funded_seconds: Option<u64>,
    /// Reward balance the program can currently pay out.
    pub available: u64,
}

impl RewardPool {
    /// Fixed serialized size of the account (for allocation at initialization).
    ///
    /// Breakdown:
    /// - 8: account discriminator
    /// - 1: bump
    /// - 32 * 2: two Pubkeys
    /// - 1: permitted
    /// - 8: nft rate
    /// - 16: run rate
    /// - 8 * 3: counters
    pub const LEN: usize = 8 + 1 + 32 * 2 + 1 + 8 + 16 + 8 * 3;

    /// Fills in the identity of a freshly created pool; a no-op afterwards.
    pub fn initialize(&mut self, bump: u8, reward_mint: Pubkey, reward_vault: Pubkey) {
        if self.reward_mint == Pubkey::default() {
            self.bump = bump;
            self.reward_mint = reward_mint;
            self.reward_vault = reward_vault;
        }
    }

    /// Permits the token for NFT stakes at `nft_rate_per_day`. Existing NFT
    /// positions keep the rate they snapshotted.
    pub fn permit(&mut self, nft_rate_per_day: u64) -> Result<()> {
        require_gt!(nft_rate_per_day, 0, ErrorCode::InvalidAmount);
        self.nft_rate_per_day = nft_rate_per_day;
        self.permitted = true;
        Ok(())
    }

    pub fn revoke(&mut self) {
        self.permitted = false;
    }

    /// NFT-mode precondition: the reward token must be configured and
    /// permitted. Returns the rate a new position snapshots.
    pub fn nft_rate(&self) -> Result<u64> {
        require!(self.nft_rate_per_day > 0, ErrorCode::NotConfigured);
        require!(self.permitted, ErrorCode::NotPermitted);
        Ok(self.nft_rate_per_day)
    }

    pub fn add_run_rate(&mut self, rate_per_day: u64) -> Result<()> {
        self.run_rate_per_day = self
            .run_rate_per_day
            .checked_add(u128::from(rate_per_day))
            .ok_or(ErrorCode::MathOverflow)?;
        Ok(())
    }

    pub fn sub_run_rate(&mut self, rate_per_day: u64) -> Result<()> {
        self.run_rate_per_day = self
            .run_rate_per_day
            .checked_sub(u128::from(rate_per_day))
            .ok_or(ErrorCode::MathOverflow)?;
        Ok(())
    }

    /// Swaps an asset's contribution to the run rate after it was
    /// reconfigured. `previous` is `None` when the asset was not emitting.
    pub fn move_run_rate(&mut self, previous: Option<u64>, current: u64) -> Result<()> {
        match previous {
            Some(previous) => {
                self.sub_run_rate(previous)?;
                self.add_run_rate(current)
            }
            None => Ok(()),
        }
    }

    pub fn open_position(&mut self) -> Result<()> {
        self.open_positions = self
            .open_positions
            .checked_add(1)
            .ok_or(ErrorCode::MathOverflow)?;
        Ok(())
    }

    pub fn close_position(&mut self) -> Result<()> {
        self.open_positions = self
            .open_positions
            .checked_sub(1)
            .ok_or(ErrorCode::MathOverflow)?;
        Ok(())
    }

    pub fn record_settlement(&mut self, settlement: &Settlement) -> Result<()> {
        self.total_paid = self
            .total_paid
            .checked_add(settlement.paid)
            .ok_or(ErrorCode::MathOverflow)?;
        self.record_forfeit(settlement.forfeited);
        Ok(())
    }

    /// Forfeits saturate; they never block the exit that produced them.
    pub fn record_forfeit(&mut self, amount: u64) {
        self.total_forfeited = self.total_forfeited.saturating_add(amount);
    }

    /// How fast the pool drains and how long `available` lasts.
    pub fn runway(&self, available: u64) -> Result<Runway> {
        Ok(Runway {
            run_rate_per_second: DripCalculator::run_rate_per_second(self.run_rate_per_day)
                .ok_or(ErrorCode::MathOverflow)?,
            funded_seconds: DripCalculator::funded_seconds(self.run_rate_per_day, available),
            available,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SECONDS_PER_DAY;

    #[test]
    fn nft_rate_requires_configuration_then_permission() {
        let mut pool = RewardPool::default();
        assert!(pool.nft_rate().is_err());
        pool.nft_rate_per_day = 10;
        assert!(pool.nft_rate().is_err());
        pool.permitted = true;
        assert_eq!(pool.nft_rate().unwrap(), 10);
    }

    #[test]
    fn permit_and_revoke() {
        let mut pool = RewardPool::default();
        let mint = Pubkey::new_unique();
        let vault = Pubkey::new_unique();
        pool.initialize(7, mint, vault);
        pool.initialize(9, Pubkey::new_unique(), Pubkey::new_unique());
        assert_eq!((pool.bump, pool.reward_mint, pool.reward_vault), (7, mint, vault));

        assert!(pool.permit(0).is_err());
        pool.permit(25).unwrap();
        assert_eq!(pool.nft_rate().unwrap(), 25);
        pool.revoke();
        assert!(pool.nft_rate().is_err());
    }

    #[test]
    fn runway_tracks_run_rate() {
        let mut pool = RewardPool::default();
        let idle = pool.runway(1_000).unwrap();
        assert_eq!(idle.run_rate_per_second, 0);
        assert_eq!(idle.funded_seconds, None);

        pool.add_run_rate(SECONDS_PER_DAY).unwrap();
        pool.open_position().unwrap();
        let active = pool.runway(1_000).unwrap();
        assert_eq!(active.run_rate_per_second, crate::PRECISION);
        assert_eq!(active.funded_seconds, Some(1_000));
        assert_eq!(active.available, 1_000);

        pool.sub_run_rate(SECONDS_PER_DAY).unwrap();
        pool.close_position().unwrap();
        assert_eq!(pool.runway(1_000).unwrap().run_rate_per_second, 0);
        assert!(pool.sub_run_rate(1).is_err());
    }

    #[test]
    fn settlements_accumulate() {
        let mut pool = RewardPool::default();
        pool.record_settlement(&DripCalculator::settle(300, 200)).unwrap();
        pool.record_forfeit(5);
        assert_eq!(pool.total_paid, 200);
        assert_eq!(pool.total_forfeited, 105);

        pool.record_forfeit(u64::MAX);
        assert_eq!(pool.total_forfeited, u64::MAX);
    }

    #[test]
    fn reconfigured_asset_moves_its_run_rate() {
        let mut pool = RewardPool::default();
        pool.add_run_rate(1_000).unwrap();
        pool.add_run_rate(300).unwrap();

        pool.move_run_rate(Some(1_000), 5_000).unwrap();
        assert_eq!(pool.run_rate_per_day, 5_300);
        pool.move_run_rate(None, 9_000).unwrap();
        assert_eq!(pool.run_rate_per_day, 5_300);
        assert!(pool.move_run_rate(Some(10_000), 1).is_err());
    }
}
