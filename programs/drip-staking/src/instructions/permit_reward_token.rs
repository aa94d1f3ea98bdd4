use crate::error::ErrorCode;
use crate::states::*;
use crate::REWARD_VAULT_SEED;
use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

/// Accounts context for `permit_reward_token`.
///
/// NFT stakers pick their reward token among the permitted ones; each token
/// carries a flat daily rate per staked NFT.
#[derive(Accounts)]
pub struct PermitRewardToken<'info> {
    #[account(
        mut,
        constraint = global_config.is_admin(&owner.key()) @ ErrorCode::InvalidOwner
    )]
    pub owner: Signer<'info>,

    #[account(
        seeds = [GLOBAL_CONFIG_SEED.as_bytes()],
        bump = global_config.bump,
    )]
    pub global_config: Account<'info, GlobalConfig>,

    /// CHECK: PDA derivation enforced by seeds; vault token authority.
    #[account(
        seeds = [crate::AUTH_SEED.as_bytes()],
        bump,
    )]
    pub authority: UncheckedAccount<'info>,

    #[account(mint::token_program = token_program)]
    pub reward_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        init_if_needed,
        seeds = [REWARD_POOL_SEED.as_bytes(), reward_mint.key().as_ref()],
        bump,
        payer = owner,
        space = RewardPool::LEN
    )]
    pub reward_pool: Account<'info, RewardPool>,

    #[account(
        init_if_needed,
        seeds = [REWARD_VAULT_SEED.as_bytes(), reward_mint.key().as_ref()],
        bump,
        payer = owner,
        token::mint = reward_mint,
        token::authority = authority,
        token::token_program = token_program,
    )]
    pub reward_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,

    pub system_program: Program<'info, System>,
}

/// Permits `reward_mint` for NFT stakes, or changes its rate for future
/// stakes. Open NFT positions keep the rate they were opened with.
pub fn permit_reward_token(ctx: Context<PermitRewardToken>, nft_rate_per_day: u64) -> Result<()> {
    let reward_pool = &mut ctx.accounts.reward_pool;
    reward_pool.initialize(
        ctx.bumps.reward_pool,
        ctx.accounts.reward_mint.key(),
        ctx.accounts.reward_vault.key(),
    );
    reward_pool.permit(nft_rate_per_day)?;
    msg!(
        "Reward token {} permitted at {} per NFT per day",
        reward_pool.reward_mint,
        nft_rate_per_day
    );

    emit!(RewardTokenPermitted {
        reward_mint: reward_pool.reward_mint,
        nft_rate_per_day,
        permitted: true,
    });
    Ok(())
}

/// Accounts context for `revoke_reward_token`.
#[derive(Accounts)]
pub struct RevokeRewardToken<'info> {
    #[account(
        constraint = global_config.is_admin(&owner.key()) @ ErrorCode::InvalidOwner
    )]
    pub owner: Signer<'info>,

    #[account(
        seeds = [GLOBAL_CONFIG_SEED.as_bytes()],
        bump = global_config.bump,
    )]
    pub global_config: Account<'info, GlobalConfig>,

    #[account(
        mut,
        seeds = [REWARD_POOL_SEED.as_bytes(), reward_pool.reward_mint.as_ref()],
        bump = reward_pool.bump,
    )]
    pub reward_pool: Account<'info, RewardPool>,
}

/// Stops new NFT stakes from choosing this reward token. Open positions keep
/// accruing and claiming.
pub fn revoke_reward_token(ctx: Context<RevokeRewardToken>) -> Result<()> {
    let reward_pool = &mut ctx.accounts.reward_pool;
    reward_pool.revoke();
    msg!("Reward token {} revoked", reward_pool.reward_mint);

    emit!(RewardTokenPermitted {
        reward_mint: reward_pool.reward_mint,
        nft_rate_per_day: reward_pool.nft_rate_per_day,
        permitted: false,
    });
    Ok(())
}
