//! Read views over staking accounts.
//!
//! The program answers `claimable` and `runway` through instruction return
//! data; list views are computed off-chain from fetched accounts with the
//! same functions.

use crate::error::ErrorCode;
use crate::states::{AssetConfig, AssetKind, StakePosition};
use anchor_lang::prelude::*;
use std::collections::BTreeMap;

/// What a position could claim right now.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClaimableReward {
    /// Position account.
    pub position: Pubkey,
    /// Collateral mint or NFT mint.
    pub stake_id: Pubkey,
    /// Fungible mint or NFT collection.
    pub asset: Pubkey,
    pub reward_mint: Pubkey,
    /// Reward accrued, before capping to the available balance.
    pub accrued: u64,
    /// Reward a claim would pay.
    pub amount: u64,
}

/// One entry of a user's staked collateral.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StakedAsset {
    pub asset: Pubkey,
    pub stake_id: Pubkey,
    pub kind: AssetKind,
    pub amount: u64,
    pub staked_at: u64,
    /// Last settlement that moved the position's reward clock.
    pub last_claim_at: u64,
}

/// Reward terms of an asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssetRewards {
    pub drip_token: Pubkey,
    /// Total daily emission of the pool.
    pub drip_rate: u64,
    pub staked: u64,
    /// Daily reward per staked unit at the current pool size, scaled by
    /// PRECISION; zero when nothing is staked.
    pub reward_rate: u128,
}

pub fn claimable(
    position_key: Pubkey,
    position: &StakePosition,
    asset: &AssetConfig,
    available: u64,
    now: u64,
) -> Result<ClaimableReward> {
    let accrued = position.accrued(asset, now);
    Ok(ClaimableReward {
        position: position_key,
        stake_id: position.mint,
        asset: asset.collateral,
        reward_mint: position.reward_mint,
        accrued,
        amount: accrued.min(available),
    })
}

/// Claimable amounts for a batch of positions settled in order against
/// shared reward balances, the way `claim_all` pays them.
pub fn claimable_batch(
    positions: &[(Pubkey, StakePosition)],
    assets: &BTreeMap<Pubkey, AssetConfig>,
    balances: &BTreeMap<Pubkey, u64>,
    now: u64,
) -> Result<Vec<ClaimableReward>> {
    let mut remaining = balances.clone();
    positions
        .iter()
        .map(|(key, position)| {
            let asset = assets
                .get(&position.asset_config)
                .ok_or(ErrorCode::PositionMismatch)?;
            let balance = remaining.entry(position.reward_mint).or_insert(0);
            let reward = claimable(*key, position, asset, *balance, now)?;
            *balance -= reward.amount;
            Ok(reward)
        })
        .collect()
}

pub fn staked(positions: &[(Pubkey, StakePosition)], assets: &BTreeMap<Pubkey, AssetConfig>) -> Vec<StakedAsset> {
    positions
        .iter()
        .filter(|(_, position)| position.is_open())
        .map(|(_, position)| StakedAsset {
            asset: assets
                .get(&position.asset_config)
                .map(|asset| asset.collateral)
                .unwrap_or(position.mint),
            stake_id: position.mint,
            kind: position.kind,
            amount: position.amount,
            staked_at: position.staked_at,
            last_claim_at: position.last_claim_at,
        })
        .collect()
}

/// NFT mints a user has staked into the collection behind `asset_config`.
pub fn stake_ids(positions: &[(Pubkey, StakePosition)], asset_config: &Pubkey) -> Vec<Pubkey> {
    positions
        .iter()
        .filter(|(_, p)| p.kind == AssetKind::NonFungible && p.asset_config == *asset_config)
        .map(|(_, p)| p.mint)
        .collect()
}

pub fn asset_rewards(asset: &AssetConfig) -> Result<AssetRewards> {
    Ok(AssetRewards {
        drip_token: asset.reward_mint,
        drip_rate: asset.drip_rate_per_day,
        staked: asset.total_staked,
        reward_rate: asset.reward_rate()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SECONDS_PER_DAY;

    const DAY: u64 = SECONDS_PER_DAY;

    fn asset(rate: u64) -> (Pubkey, AssetConfig) {
        let mut asset = AssetConfig::default();
        asset
            .configure_fungible(Pubkey::new_unique(), Pubkey::new_unique(), rate, 0)
            .unwrap();
        (Pubkey::new_unique(), asset)
    }

    fn open(key: Pubkey, asset: &mut AssetConfig, amount: u64) -> (Pubkey, StakePosition) {
        let mut position = StakePosition::default();
        position
            .open_fungible(1, Pubkey::new_unique(), key, asset, amount, false, 0)
            .unwrap();
        asset.add_stake(amount, true).unwrap();
        (Pubkey::new_unique(), position)
    }

    #[test]
    fn claimable_reports_capped_amount() {
        let (key, mut config) = asset(1_000);
        let (position_key, position) = open(key, &mut config, 10);

        let reward = claimable(position_key, &position, &config, 300, DAY).unwrap();
        assert_eq!(reward.accrued, 1_000);
        assert_eq!(reward.amount, 300);
        assert_eq!(reward.stake_id, config.collateral);
        assert_eq!(reward.asset, config.collateral);
    }

    #[test]
    fn batch_shares_one_balance_per_reward_token() {
        let (key, mut config) = asset(1_000);
        let first = open(key, &mut config, 10);
        let second = open(key, &mut config, 10);
        let assets = BTreeMap::from([(key, config.clone())]);
        let balances = BTreeMap::from([(config.reward_mint, 700)]);

        let rewards = claimable_batch(&[first, second], &assets, &balances, DAY).unwrap();
        assert_eq!(rewards[0].amount, 500);
        assert_eq!(rewards[1].amount, 200);
        assert_eq!(rewards[1].accrued, 500);
    }

    #[test]
    fn batch_rejects_unknown_asset() {
        let (key, mut config) = asset(1_000);
        let position = open(key, &mut config, 10);
        assert!(claimable_batch(&[position], &BTreeMap::new(), &BTreeMap::new(), DAY).is_err());
    }

    #[test]
    fn stake_ids_filter_by_collection() {
        let collection_config = Pubkey::new_unique();
        let nft = Pubkey::new_unique();
        let mut position = StakePosition::default();
        position.open_non_fungible(
            1,
            Pubkey::new_unique(),
            collection_config,
            nft,
            Pubkey::new_unique(),
            10,
            0,
        );
        let positions = vec![(Pubkey::new_unique(), position)];
        assert_eq!(stake_ids(&positions, &collection_config), vec![nft]);
        assert!(stake_ids(&positions, &Pubkey::new_unique()).is_empty());
        let listed = staked(&positions, &BTreeMap::new());
        assert_eq!(listed[0].amount, 1);
        assert_eq!(listed[0].kind, AssetKind::NonFungible);
    }

    #[test]
    fn staked_reports_last_claim() {
        let (key, mut config) = asset(1_000);
        let (position_key, mut position) = open(key, &mut config, 10);
        config.update_reward_index(DAY);
        position.settle(&config, u64::MAX, DAY);

        let assets = BTreeMap::from([(key, config.clone())]);
        let listed = staked(&[(position_key, position)], &assets);
        assert_eq!(listed[0].asset, config.collateral);
        assert_eq!(listed[0].staked_at, 0);
        assert_eq!(listed[0].last_claim_at, DAY);
    }

    #[test]
    fn asset_rewards_reflect_pool_size() {
        let (key, mut config) = asset(900);
        assert_eq!(asset_rewards(&config).unwrap().reward_rate, 0);
        open(key, &mut config, 30);
        let rewards = asset_rewards(&config).unwrap();
        assert_eq!(rewards.drip_rate, 900);
        assert_eq!(rewards.staked, 30);
        assert_eq!(rewards.reward_rate, 30 * crate::PRECISION);
    }
}
