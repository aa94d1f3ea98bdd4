use anchor_lang::prelude::*;

#[cfg(not(feature = "no-entrypoint"))]
solana_security_txt::security_txt! {
    name: "drip-staking",
    project_url: "https://github.com/drip-staking/drip-staking",
    contacts: "email:security@drip-staking.xyz",
    policy: "https://github.com/drip-staking/drip-staking/blob/main/SECURITY.md",
    source_code: "https://github.com/drip-staking/drip-staking"
}

declare_id!("DR1PxK6dJ8gWq3tYjS4c7Ha2m9uFvEoLbRzN5kXyPs1T");

pub mod admin {
    use anchor_lang::prelude::declare_id;
    declare_id!("B8VmoTgg2arRfw7qQVTYK9GohYeyMEjaCSW6jVPVBUgV");
}

pub const AUTH_SEED: &str = "vault_and_reward_auth";
pub const COLLATERAL_VAULT_SEED: &str = "collateral_vault";
pub const REWARD_VAULT_SEED: &str = "reward_vault";
pub const PRECISION: u128 = 1_000_000_000_000;
pub const SECONDS_PER_DAY: u64 = 86_400;

pub mod drip;
pub mod error;
pub mod instructions;
pub mod states;
pub mod utils;
pub mod views;

use instructions::*;
use states::Runway;
use views::ClaimableReward;

#[program]
pub mod drip_staking {

    use super::*;

    pub fn initialise_configs(
        ctx: Context<InitialiseConfigs>,
        admin: Pubkey,
        minimum_staking_time: u64,
    ) -> Result<()> {
        instructions::initialise_configs(ctx, admin, minimum_staking_time)
    }

    pub fn update_config(ctx: Context<UpdateConfig>, param: u8, value: u64) -> Result<()> {
        instructions::update_config(ctx, param, value)
    }

    pub fn configure_stakeable_asset(
        ctx: Context<ConfigureStakeableAsset>,
        drip_rate_per_day: u64,
    ) -> Result<()> {
        instructions::configure_stakeable_asset(ctx, drip_rate_per_day)
    }

    pub fn permit_nft(ctx: Context<PermitNft>) -> Result<()> {
        instructions::permit_nft(ctx)
    }

    pub fn permit_reward_token(
        ctx: Context<PermitRewardToken>,
        nft_rate_per_day: u64,
    ) -> Result<()> {
        instructions::permit_reward_token(ctx, nft_rate_per_day)
    }

    pub fn revoke_reward_token(ctx: Context<RevokeRewardToken>) -> Result<()> {
        instructions::revoke_reward_token(ctx)
    }

    pub fn set_asset_permission(ctx: Context<SetAssetPermission>, permitted: bool) -> Result<()> {
        instructions::set_asset_permission(ctx, permitted)
    }

    pub fn fund_reward_pool(ctx: Context<FundRewardPool>, amount: u64) -> Result<()> {
        instructions::fund_reward_pool(ctx, amount)
    }

    pub fn stake(ctx: Context<Stake>, beneficiary: Pubkey, amount: u64, compound: bool) -> Result<()> {
        instructions::stake(ctx, beneficiary, amount, compound)
    }

    pub fn stake_nft(ctx: Context<StakeNft>) -> Result<()> {
        instructions::stake_nft(ctx)
    }

    pub fn claim(ctx: Context<Claim>, restake: bool) -> Result<()> {
        instructions::claim(ctx, restake)
    }

    pub fn claim_all<'info>(
        ctx: Context<'_, '_, 'info, 'info, ClaimAll<'info>>,
        restake: bool,
    ) -> Result<()> {
        instructions::claim_all(ctx, restake)
    }

    pub fn unstake(ctx: Context<Unstake>, amount: u64, claim_first: bool) -> Result<()> {
        instructions::unstake(ctx, amount, claim_first)
    }

    pub fn unstake_nft(ctx: Context<UnstakeNft>, claim_first: bool) -> Result<()> {
        instructions::unstake_nft(ctx, claim_first)
    }

    pub fn runway(ctx: Context<RunwayView>) -> Result<Runway> {
        instructions::runway(ctx)
    }

    pub fn claimable(ctx: Context<ClaimableView>) -> Result<ClaimableReward> {
        instructions::claimable(ctx)
    }
}
