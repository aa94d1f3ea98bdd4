use crate::error::ErrorCode;
use crate::states::*;
use crate::utils::{available_rewards, current_timestamp};
use crate::views::{self, ClaimableReward};
use anchor_lang::prelude::*;
use anchor_spl::token_interface::TokenAccount;

/// Accounts context for the `runway` view.
#[derive(Accounts)]
pub struct RunwayView<'info> {
    #[account(
        seeds = [GLOBAL_CONFIG_SEED.as_bytes()],
        bump = global_config.bump,
    )]
    pub global_config: Account<'info, GlobalConfig>,

    /// CHECK: PDA derivation enforced by seeds; delegate of the reward wallet.
    #[account(
        seeds = [crate::AUTH_SEED.as_bytes()],
        bump,
    )]
    pub authority: UncheckedAccount<'info>,

    #[account(
        seeds = [REWARD_POOL_SEED.as_bytes(), reward_pool.reward_mint.as_ref()],
        bump = reward_pool.bump,
    )]
    pub reward_pool: Account<'info, RewardPool>,

    #[account(
        constraint = global_config.is_reward_source(
            &reward_pool.reward_vault,
            &reward_pool.reward_mint,
            &reward_source.key(),
            &reward_source.owner,
            &reward_source.mint,
        ) @ ErrorCode::InvalidRewardSource
    )]
    pub reward_source: Box<InterfaceAccount<'info, TokenAccount>>,
}

/// Aggregate emission of a reward token and how long its balance lasts.
/// Returned through instruction return data.
pub fn runway(ctx: Context<RunwayView>) -> Result<Runway> {
    let available = available_rewards(
        &ctx.accounts.global_config,
        ctx.accounts.authority.key,
        &ctx.accounts.reward_source,
    );
    ctx.accounts.reward_pool.runway(available)
}

/// Accounts context for the `claimable` view.
#[derive(Accounts)]
pub struct ClaimableView<'info> {
    #[account(
        seeds = [GLOBAL_CONFIG_SEED.as_bytes()],
        bump = global_config.bump,
    )]
    pub global_config: Account<'info, GlobalConfig>,

    /// CHECK: PDA derivation enforced by seeds; delegate of the reward wallet.
    #[account(
        seeds = [crate::AUTH_SEED.as_bytes()],
        bump,
    )]
    pub authority: UncheckedAccount<'info>,

    #[account(has_one = asset_config @ ErrorCode::PositionMismatch)]
    pub position: Account<'info, StakePosition>,

    pub asset_config: Account<'info, AssetConfig>,

    #[account(
        seeds = [REWARD_POOL_SEED.as_bytes(), position.reward_mint.as_ref()],
        bump = reward_pool.bump,
    )]
    pub reward_pool: Account<'info, RewardPool>,

    #[account(
        constraint = global_config.is_reward_source(
            &reward_pool.reward_vault,
            &reward_pool.reward_mint,
            &reward_source.key(),
            &reward_source.owner,
            &reward_source.mint,
        ) @ ErrorCode::InvalidRewardSource
    )]
    pub reward_source: Box<InterfaceAccount<'info, TokenAccount>>,
}

/// What a claim on `position` would pay right now. Returned through
/// instruction return data.
pub fn claimable(ctx: Context<ClaimableView>) -> Result<ClaimableReward> {
    let now = current_timestamp()?;
    let available = available_rewards(
        &ctx.accounts.global_config,
        ctx.accounts.authority.key,
        &ctx.accounts.reward_source,
    );
    views::claimable(
        ctx.accounts.position.key(),
        &ctx.accounts.position,
        &ctx.accounts.asset_config,
        available,
        now,
    )
}
