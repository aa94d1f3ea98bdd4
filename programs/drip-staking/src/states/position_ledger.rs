use crate::drip::Settlement;
use crate::error::ErrorCode;
use crate::states::{AssetConfig, AssetKind, RewardHistory, RewardPool, StakePosition};
use anchor_lang::prelude::*;

/// Where a settled reward is sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Payout {
    /// The owner's reward token account.
    Owner,
    /// The asset's collateral vault, as more stake on the same position.
    Restake,
}

impl Payout {
    /// A reward is restaked only when asked to, when something is paid, and
    /// when the asset compounds. Restaking then needs the collateral vault.
    pub fn choose(restake: bool, paid: u64, asset: &AssetConfig, has_vault: bool) -> Result<Self> {
        if !(restake && paid > 0 && asset.can_compound()) {
            return Ok(Payout::Owner);
        }
        require!(has_vault, ErrorCode::InvalidVault);
        Ok(Payout::Restake)
    }
}

/// Result of taking collateral out of a position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Withdrawal {
    /// Reward dropped because the exit skipped the claim.
    pub forfeited: u64,
    /// Whether the position was emptied.
    pub closed: bool,
}

/// Bookkeeping of one position and the shared accounts it moves: the asset
/// pool, the reward pool and the owner's reward history.
///
/// Token transfers and account closing stay with the instruction handlers.
pub struct PositionLedger<'a> {
    pub position: &'a mut StakePosition,
    pub asset_config: &'a mut AssetConfig,
    pub reward_pool: &'a mut RewardPool,
    pub reward_history: &'a mut RewardHistory,
}

impl PositionLedger<'_> {
    /// Settles the position at `now` against `available` reward balance.
    ///
    /// The asset index is advanced first. A restaked payout is added to the
    /// position and the asset pool before the totals are recorded.
    pub fn settle(
        &mut self,
        available: u64,
        restake: bool,
        has_vault: bool,
        now: u64,
    ) -> Result<(Settlement, Payout)> {
        self.asset_config.update_reward_index(now);
        let settlement = self.position.settle(self.asset_config, available, now);
        let payout = Payout::choose(restake, settlement.paid, self.asset_config, has_vault)?;
        if payout == Payout::Restake {
            self.position.compound(settlement.paid)?;
            self.asset_config.add_stake(settlement.paid, false)?;
        }
        self.record(&settlement, now)?;
        Ok((settlement, payout))
    }

    /// Removes `amount` of fungible collateral.
    ///
    /// A partial withdrawal keeps accrued reward pending. Emptying the
    /// position forfeits it and releases the position from every counter.
    pub fn withdraw_fungible(&mut self, amount: u64, now: u64) -> Result<Withdrawal> {
        require!(
            self.position.kind == AssetKind::Fungible,
            ErrorCode::InvalidAssetKind
        );
        self.asset_config.update_reward_index(now);
        self.position.checkpoint(self.asset_config);
        let closed = self.position.withdraw(amount)?;
        let forfeited = if closed { self.forfeit(now)? } else { 0 };

        if self.asset_config.remove_stake(amount, closed)? {
            self.reward_pool
                .sub_run_rate(self.asset_config.drip_rate_per_day)?;
        }
        if closed {
            self.release()?;
        }
        Ok(Withdrawal { forfeited, closed })
    }

    /// Takes the single NFT out of the position, forfeiting whatever is still
    /// accrued, and drops its snapshotted rate from the runway.
    pub fn withdraw_nft(&mut self, now: u64) -> Result<Withdrawal> {
        require!(
            self.position.kind == AssetKind::NonFungible,
            ErrorCode::InvalidAssetKind
        );
        let forfeited = self.forfeit(now)?;
        self.position.withdraw(1)?;
        self.asset_config.remove_stake(1, true)?;
        self.reward_pool
            .sub_run_rate(self.position.run_rate_per_day())?;
        self.release()?;
        Ok(Withdrawal {
            forfeited,
            closed: true,
        })
    }

    fn forfeit(&mut self, now: u64) -> Result<u64> {
        let forfeited = self.position.forfeit(self.asset_config, now);
        self.record(
            &Settlement {
                accrued: forfeited,
                paid: 0,
                forfeited,
            },
            now,
        )?;
        Ok(forfeited)
    }

    fn record(&mut self, settlement: &Settlement, now: u64) -> Result<()> {
        self.reward_pool.record_settlement(settlement)?;
        self.reward_history
            .record(self.position.reward_mint, settlement, now)
    }

    fn release(&mut self) -> Result<()> {
        self.reward_pool.close_position()?;
        self.reward_history.close_position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SECONDS_PER_DAY;

    const DAY: u64 = SECONDS_PER_DAY;

    struct Fixture {
        position: StakePosition,
        asset: AssetConfig,
        pool: RewardPool,
        history: RewardHistory,
    }

    impl Fixture {
        fn ledger(&mut self) -> PositionLedger<'_> {
            PositionLedger {
                position: &mut self.position,
                asset_config: &mut self.asset,
                reward_pool: &mut self.pool,
                reward_history: &mut self.history,
            }
        }
    }

    fn fungible(collateral: Pubkey, reward_mint: Pubkey, rate: u64, amount: u64) -> Fixture {
        let mut asset = AssetConfig::default();
        asset
            .configure_fungible(collateral, reward_mint, rate, 0)
            .unwrap();
        let mut pool = RewardPool::default();
        pool.initialize(1, reward_mint, Pubkey::new_unique());
        let mut position = StakePosition::default();
        position
            .open_fungible(1, Pubkey::new_unique(), Pubkey::new_unique(), &asset, amount, false, 0)
            .unwrap();
        if asset.add_stake(amount, true).unwrap() {
            pool.add_run_rate(rate).unwrap();
        }
        pool.open_position().unwrap();
        let mut history = RewardHistory::default();
        history.open_position().unwrap();
        Fixture {
            position,
            asset,
            pool,
            history,
        }
    }

    fn nft(rate: u64) -> Fixture {
        let reward_mint = Pubkey::new_unique();
        let mut asset = AssetConfig::default();
        asset.permit_collection(Pubkey::new_unique()).unwrap();
        asset.add_stake(1, true).unwrap();
        let mut pool = RewardPool::default();
        pool.initialize(1, reward_mint, Pubkey::new_unique());
        pool.permit(rate).unwrap();
        pool.add_run_rate(rate).unwrap();
        pool.open_position().unwrap();
        let mut position = StakePosition::default();
        position.open_non_fungible(
            1,
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            reward_mint,
            rate,
            0,
        );
        let mut history = RewardHistory::default();
        history.open_position().unwrap();
        Fixture {
            position,
            asset,
            pool,
            history,
        }
    }

    #[test]
    fn payout_goes_to_owner_unless_restake_applies() {
        let mint = Pubkey::new_unique();
        let mut compounding = AssetConfig::default();
        compounding.configure_fungible(mint, mint, 1_000, 0).unwrap();
        let mut other = AssetConfig::default();
        other
            .configure_fungible(mint, Pubkey::new_unique(), 1_000, 0)
            .unwrap();

        assert_eq!(Payout::choose(false, 10, &compounding, true).unwrap(), Payout::Owner);
        assert_eq!(Payout::choose(true, 0, &compounding, true).unwrap(), Payout::Owner);
        assert_eq!(Payout::choose(true, 10, &other, true).unwrap(), Payout::Owner);
        assert_eq!(Payout::choose(true, 10, &other, false).unwrap(), Payout::Owner);
        assert_eq!(Payout::choose(true, 10, &compounding, true).unwrap(), Payout::Restake);

        // a restake without the vault is rejected, not silently paid out
        assert!(Payout::choose(true, 10, &compounding, false).is_err());

        compounding.permitted = false;
        assert_eq!(Payout::choose(true, 10, &compounding, true).unwrap(), Payout::Owner);
    }

    #[test]
    fn restaked_claim_grows_position_and_pool() {
        let mint = Pubkey::new_unique();
        let mut accounts = fungible(mint, mint, 1_000, 10);
        let (settlement, payout) = accounts.ledger().settle(u64::MAX, true, true, DAY).unwrap();
        assert_eq!(payout, Payout::Restake);
        assert_eq!(settlement.paid, 1_000);
        assert_eq!(accounts.position.amount, 1_010);
        assert_eq!(accounts.asset.total_staked, 1_010);
        assert_eq!(accounts.pool.total_paid, 1_000);
        assert_eq!(accounts.history.reward_totals().1, vec![1_000]);
    }

    #[test]
    fn plain_claim_leaves_stake_alone() {
        let mut accounts = fungible(Pubkey::new_unique(), Pubkey::new_unique(), 1_000, 10);
        let (settlement, payout) = accounts.ledger().settle(600, true, true, DAY).unwrap();
        assert_eq!(payout, Payout::Owner);
        assert_eq!((settlement.paid, settlement.forfeited), (600, 400));
        assert_eq!(accounts.position.amount, 10);
        assert_eq!(accounts.asset.total_staked, 10);
        assert_eq!(accounts.pool.total_forfeited, 400);
    }

    #[test]
    fn full_fungible_exit_forfeits_and_releases_counters() {
        let mut accounts = fungible(Pubkey::new_unique(), Pubkey::new_unique(), 1_000, 10);
        let partial = accounts.ledger().withdraw_fungible(4, DAY).unwrap();
        assert_eq!(partial, Withdrawal::default());
        assert_eq!(accounts.position.rewards_pending, 1_000);

        let full = accounts.ledger().withdraw_fungible(6, DAY).unwrap();
        assert_eq!(
            full,
            Withdrawal {
                forfeited: 1_000,
                closed: true
            }
        );
        assert_eq!(accounts.asset.total_staked, 0);
        assert_eq!(accounts.asset.open_positions, 0);
        assert_eq!(accounts.pool.run_rate_per_day, 0);
        assert_eq!(accounts.pool.open_positions, 0);
        assert_eq!(accounts.pool.total_forfeited, 1_000);
        assert!(!accounts.history.has_open_positions());
    }

    #[test]
    fn exit_without_claim_survives_saturated_accrual() {
        // 1e18/day over 10 units for 20 days accrues past u64::MAX
        let mut accounts = fungible(
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            1_000_000_000_000_000_000,
            10,
        );
        let withdrawal = accounts.ledger().withdraw_fungible(10, 20 * DAY).unwrap();
        assert!(withdrawal.closed);
        assert_eq!(withdrawal.forfeited, u64::MAX);

        let mut accounts = nft(1_000_000_000_000_000_000);
        let withdrawal = accounts.ledger().withdraw_nft(20 * DAY).unwrap();
        assert!(withdrawal.closed);
        assert_eq!(withdrawal.forfeited, u64::MAX);
        assert_eq!(accounts.pool.run_rate_per_day, 0);
    }

    #[test]
    fn nft_exit_after_claim_forfeits_nothing() {
        let mut accounts = nft(1_000);
        let (settlement, _) = accounts
            .ledger()
            .settle(u64::MAX, false, false, 2 * DAY)
            .unwrap();
        assert_eq!(settlement.paid, 2_000);
        let withdrawal = accounts.ledger().withdraw_nft(2 * DAY).unwrap();
        assert_eq!(withdrawal.forfeited, 0);
        assert_eq!(accounts.asset.total_staked, 0);
        assert_eq!(accounts.pool.open_positions, 0);
    }

    #[test]
    fn withdrawals_check_the_position_kind() {
        let mut accounts = nft(1_000);
        assert!(accounts.ledger().withdraw_fungible(1, DAY).is_err());
        let mut accounts = fungible(Pubkey::new_unique(), Pubkey::new_unique(), 1_000, 10);
        assert!(accounts.ledger().withdraw_nft(DAY).is_err());
    }
}
