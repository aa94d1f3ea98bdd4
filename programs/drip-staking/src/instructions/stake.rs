use crate::error::ErrorCode;
use crate::states::*;
use crate::utils::{current_timestamp, transfer_from_user_to_vault};
use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

/// Accounts context for the fungible `stake` instruction.
///
/// The `payer` supplies the collateral; `beneficiary` owns the resulting
/// position and its rewards. A second stake into the same asset tops up the
/// existing position.
#[derive(Accounts)]
#[instruction(beneficiary: Pubkey)]
pub struct Stake<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,

    #[account(
        seeds = [GLOBAL_CONFIG_SEED.as_bytes()],
        bump = global_config.bump,
    )]
    pub global_config: Account<'info, GlobalConfig>,

    #[account(
        mut,
        seeds = [ASSET_CONFIG_SEED.as_bytes(), collateral_mint.key().as_ref()],
        bump = asset_config.bump,
    )]
    pub asset_config: Account<'info, AssetConfig>,

    /// Pool of the asset's reward token (runway aggregate).
    #[account(
        mut,
        seeds = [REWARD_POOL_SEED.as_bytes(), asset_config.reward_mint.as_ref()],
        bump = reward_pool.bump,
    )]
    pub reward_pool: Account<'info, RewardPool>,

    #[account(
        init_if_needed,
        seeds = [
            POSITION_SEED.as_bytes(),
            beneficiary.as_ref(),
            collateral_mint.key().as_ref(),
        ],
        bump,
        payer = payer,
        space = StakePosition::LEN
    )]
    pub position: Account<'info, StakePosition>,

    #[account(
        init_if_needed,
        seeds = [REWARD_HISTORY_SEED.as_bytes(), beneficiary.as_ref()],
        bump,
        payer = payer,
        space = RewardHistory::LEN
    )]
    pub reward_history: Account<'info, RewardHistory>,

    pub collateral_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        address = asset_config.collateral_vault @ ErrorCode::InvalidVault
    )]
    pub collateral_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    /// Payer's collateral token account.
    #[account(
        mut,
        token::mint = collateral_mint,
        token::authority = payer,
    )]
    pub payer_token: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,

    pub system_program: Program<'info, System>,
}

/// Stakes `amount` of a fungible asset for `beneficiary`.
///
/// Steps:
/// 1. Check the asset is configured and permitted.
/// 2. Advance the asset's reward index to now.
/// 3. Open the position, or top it up keeping pending reward and
///    timestamps untouched.
/// 4. Update pool totals and the runway aggregate.
/// 5. Move the collateral into the program vault.
///
/// `compound` sets the position's auto-compound preference when it is
/// opened.
pub fn stake(ctx: Context<Stake>, beneficiary: Pubkey, amount: u64, compound: bool) -> Result<()> {
    require_gt!(amount, 0, ErrorCode::InvalidAmount);
    require_keys_neq!(beneficiary, Pubkey::default(), ErrorCode::InvalidParam);

    let now = current_timestamp()?;
    let asset_config = &mut ctx.accounts.asset_config;
    let reward_pool = &mut ctx.accounts.reward_pool;
    let position = &mut ctx.accounts.position;
    let reward_history = &mut ctx.accounts.reward_history;

    asset_config.ensure_stakeable(AssetKind::Fungible)?;
    asset_config.update_reward_index(now);

    let opens_position = !position.is_open();
    if opens_position {
        position.open_fungible(
            ctx.bumps.position,
            beneficiary,
            asset_config.key(),
            asset_config,
            amount,
            compound,
            now,
        )?;
        if reward_history.owner == Pubkey::default() {
            reward_history.bump = ctx.bumps.reward_history;
            reward_history.owner = beneficiary;
        }
        reward_history.open_position()?;
        reward_pool.open_position()?;
    } else {
        position.top_up(asset_config, amount)?;
    }

    if asset_config.add_stake(amount, opens_position)? {
        reward_pool.add_run_rate(asset_config.drip_rate_per_day)?;
    }

    transfer_from_user_to_vault(
        ctx.accounts.payer.to_account_info(),
        ctx.accounts.payer_token.to_account_info(),
        ctx.accounts.collateral_vault.to_account_info(),
        ctx.accounts.collateral_mint.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        amount,
        ctx.accounts.collateral_mint.decimals,
    )?;

    emit!(Staked {
        owner: beneficiary,
        payer: ctx.accounts.payer.key(),
        position: position.key(),
        mint: position.mint,
        reward_mint: position.reward_mint,
        amount,
        position_amount: position.amount,
        timestamp: now,
    });
    Ok(())
}
