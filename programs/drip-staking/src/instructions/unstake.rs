use crate::error::ErrorCode;
use crate::instructions::SettleAccounts;
use crate::states::*;
use crate::utils::{current_timestamp, transfer_from_vault_to_user};
use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token_interface::{Mint, TokenAccount, TokenInterface},
};

/// Accounts context for the fungible `unstake` instruction.
#[derive(Accounts)]
pub struct Unstake<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        seeds = [GLOBAL_CONFIG_SEED.as_bytes()],
        bump = global_config.bump,
    )]
    pub global_config: Account<'info, GlobalConfig>,

    /// CHECK: PDA derivation enforced by seeds; signs vault transfers.
    #[account(
        seeds = [crate::AUTH_SEED.as_bytes()],
        bump,
    )]
    pub authority: UncheckedAccount<'info>,

    #[account(
        mut,
        seeds = [
            POSITION_SEED.as_bytes(),
            position.owner.as_ref(),
            position.mint.as_ref(),
        ],
        bump = position.bump,
        has_one = owner @ ErrorCode::NotOwner,
        has_one = asset_config @ ErrorCode::PositionMismatch,
    )]
    pub position: Account<'info, StakePosition>,

    #[account(mut)]
    pub asset_config: Account<'info, AssetConfig>,

    #[account(
        mut,
        seeds = [REWARD_POOL_SEED.as_bytes(), position.reward_mint.as_ref()],
        bump = reward_pool.bump,
    )]
    pub reward_pool: Account<'info, RewardPool>,

    #[account(
        mut,
        seeds = [REWARD_HISTORY_SEED.as_bytes(), owner.key().as_ref()],
        bump = reward_history.bump,
    )]
    pub reward_history: Account<'info, RewardHistory>,

    #[account(address = position.mint @ ErrorCode::PositionMismatch)]
    pub collateral_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        address = asset_config.collateral_vault @ ErrorCode::InvalidVault
    )]
    pub collateral_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    /// Owner's collateral ATA; created on demand.
    #[account(
        init_if_needed,
        payer = owner,
        associated_token::mint = collateral_mint,
        associated_token::authority = owner,
        associated_token::token_program = token_program,
    )]
    pub owner_collateral_token: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(address = position.reward_mint @ ErrorCode::PositionMismatch)]
    pub reward_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        constraint = global_config.is_reward_source(
            &reward_pool.reward_vault,
            &reward_pool.reward_mint,
            &reward_source.key(),
            &reward_source.owner,
            &reward_source.mint,
        ) @ ErrorCode::InvalidRewardSource
    )]
    pub reward_source: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = owner,
        associated_token::mint = reward_mint,
        associated_token::authority = owner,
        associated_token::token_program = token_program,
    )]
    pub owner_reward_token: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,

    pub associated_token_program: Program<'info, AssociatedToken>,

    pub system_program: Program<'info, System>,
}

/// Returns `amount` of fungible collateral to the owner.
///
/// - `claim_first` settles accrued reward before the withdrawal.
/// - Without it, a partial unstake keeps accrued reward pending while a full
///   unstake forfeits it.
/// - A full unstake closes the position and returns its rent.
///
/// Fails with `TooEarly` until the minimum staking time has passed since
/// the position was opened.
pub fn unstake(mut ctx: Context<Unstake>, amount: u64, claim_first: bool) -> Result<()> {
    let now = current_timestamp()?;
    let authority_bump = ctx.bumps.authority;
    let accounts = &mut ctx.accounts;
    require!(
        accounts.position.kind == AssetKind::Fungible,
        ErrorCode::InvalidAssetKind
    );
    require!(
        accounts
            .global_config
            .can_unstake(accounts.position.staked_at, now),
        ErrorCode::TooEarly
    );

    let position_key = accounts.position.key();
    if claim_first {
        SettleAccounts {
            global_config: &accounts.global_config,
            position_key,
            ledger: PositionLedger {
                position: &mut accounts.position,
                asset_config: &mut accounts.asset_config,
                reward_pool: &mut accounts.reward_pool,
                reward_history: &mut accounts.reward_history,
            },
            authority: accounts.authority.to_account_info(),
            reward_source: &accounts.reward_source,
            reward_mint: &accounts.reward_mint,
            owner_reward_token: accounts.owner_reward_token.to_account_info(),
            collateral_vault: None,
            token_program: accounts.token_program.to_account_info(),
            authority_bump,
        }
        .settle(false, now)?;
    }

    let withdrawal = PositionLedger {
        position: &mut accounts.position,
        asset_config: &mut accounts.asset_config,
        reward_pool: &mut accounts.reward_pool,
        reward_history: &mut accounts.reward_history,
    }
    .withdraw_fungible(amount, now)?;

    transfer_from_vault_to_user(
        accounts.authority.to_account_info(),
        accounts.collateral_vault.to_account_info(),
        accounts.owner_collateral_token.to_account_info(),
        accounts.collateral_mint.to_account_info(),
        accounts.token_program.to_account_info(),
        amount,
        accounts.collateral_mint.decimals,
        &[&[crate::AUTH_SEED.as_bytes(), &[authority_bump]]],
    )?;

    if withdrawal.closed {
        accounts.position.close(accounts.owner.to_account_info())?;
    }

    emit!(Unstaked {
        owner: accounts.owner.key(),
        position: position_key,
        mint: accounts.collateral_mint.key(),
        amount,
        forfeited: withdrawal.forfeited,
        closed: withdrawal.closed,
        timestamp: now,
    });
    Ok(())
}
