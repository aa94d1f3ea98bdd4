use crate::error::ErrorCode;
use crate::states::*;
use crate::utils::transfer_from_user_to_vault;
use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

/// Accounts context for `fund_reward_pool`. Anyone may top up a reward vault.
#[derive(Accounts)]
pub struct FundRewardPool<'info> {
    pub funder: Signer<'info>,

    #[account(
        seeds = [REWARD_POOL_SEED.as_bytes(), reward_mint.key().as_ref()],
        bump = reward_pool.bump,
    )]
    pub reward_pool: Account<'info, RewardPool>,

    pub reward_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        address = reward_pool.reward_vault @ ErrorCode::InvalidVault
    )]
    pub reward_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        token::mint = reward_mint,
        token::authority = funder,
    )]
    pub funder_token: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
}

pub fn fund_reward_pool(ctx: Context<FundRewardPool>, amount: u64) -> Result<()> {
    require_gt!(amount, 0, ErrorCode::InvalidAmount);

    transfer_from_user_to_vault(
        ctx.accounts.funder.to_account_info(),
        ctx.accounts.funder_token.to_account_info(),
        ctx.accounts.reward_vault.to_account_info(),
        ctx.accounts.reward_mint.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        amount,
        ctx.accounts.reward_mint.decimals,
    )?;
    ctx.accounts.reward_vault.reload()?;

    emit!(RewardPoolFunded {
        funder: ctx.accounts.funder.key(),
        reward_mint: ctx.accounts.reward_mint.key(),
        amount,
        vault_balance: ctx.accounts.reward_vault.amount,
    });
    Ok(())
}
