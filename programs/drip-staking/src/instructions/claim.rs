use crate::drip::Settlement;
use crate::error::ErrorCode;
use crate::states::*;
use crate::utils::{available_rewards, current_timestamp, transfer_from_vault_to_user};
use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token_interface::{Mint, TokenAccount, TokenInterface},
};

/// Accounts context for `claim`.
///
/// Rewards are paid from `reward_source`: the reward pool's vault, or the
/// configured reward wallet's token account (spent through the allowance it
/// delegated to the program authority).
#[derive(Accounts)]
pub struct Claim<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        seeds = [GLOBAL_CONFIG_SEED.as_bytes()],
        bump = global_config.bump,
    )]
    pub global_config: Account<'info, GlobalConfig>,

    /// CHECK: PDA derivation enforced by seeds; signs reward transfers.
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

    #[account(
        address = position.reward_mint @ ErrorCode::PositionMismatch,
        mint::token_program = token_program,
    )]
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

    /// Owner's reward token ATA; created on demand.
    #[account(
        init_if_needed,
        payer = owner,
        associated_token::mint = reward_mint,
        associated_token::authority = owner,
        associated_token::token_program = token_program,
    )]
    pub owner_reward_token: Box<InterfaceAccount<'info, TokenAccount>>,

    /// Fungible collateral vault; required only to restake.
    #[account(
        mut,
        address = asset_config.collateral_vault @ ErrorCode::InvalidVault
    )]
    pub collateral_vault: Option<Box<InterfaceAccount<'info, TokenAccount>>>,

    pub token_program: Interface<'info, TokenInterface>,

    pub associated_token_program: Program<'info, AssociatedToken>,

    pub system_program: Program<'info, System>,
}

/// Claims everything the position accrued, capped to the reward balance.
///
/// With `restake` (or the position's auto-compound preference) the reward is
/// added to the position as collateral instead, provided the asset is
/// fungible, permitted, and pays rewards in its own collateral token.
pub fn claim(mut ctx: Context<Claim>, restake: bool) -> Result<()> {
    let now = current_timestamp()?;
    let authority_bump = ctx.bumps.authority;
    let accounts = &mut ctx.accounts;
    let restake = restake || accounts.position.auto_compound;

    let collateral_vault = accounts
        .collateral_vault
        .as_ref()
        .map(|vault| vault.to_account_info());
    let position_key = accounts.position.key();
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
        collateral_vault,
        token_program: accounts.token_program.to_account_info(),
        authority_bump,
    }
    .settle(restake, now)?;
    Ok(())
}

/// Everything one settlement reads and writes.
pub struct SettleAccounts<'a, 'info> {
    pub global_config: &'a GlobalConfig,
    pub position_key: Pubkey,
    pub ledger: PositionLedger<'a>,
    pub authority: AccountInfo<'info>,
    pub reward_source: &'a InterfaceAccount<'info, TokenAccount>,
    pub reward_mint: &'a InterfaceAccount<'info, Mint>,
    pub owner_reward_token: AccountInfo<'info>,
    pub collateral_vault: Option<AccountInfo<'info>>,
    pub token_program: AccountInfo<'info>,
    pub authority_bump: u8,
}

impl<'a, 'info> SettleAccounts<'a, 'info> {
    /// Settles the position at `now`:
    /// 1. Advance the asset's reward index.
    /// 2. Cap the accrued reward to the available balance; forfeit the rest.
    /// 3. Record pool totals and the owner's reward history.
    /// 4. Pay the owner, or restake into the collateral vault.
    pub fn settle(mut self, restake: bool, now: u64) -> Result<Settlement> {
        let available = available_rewards(
            self.global_config,
            self.authority.key,
            self.reward_source,
        );
        let (settlement, payout) = self.ledger.settle(
            available,
            restake,
            self.collateral_vault.is_some(),
            now,
        )?;

        let destination = match payout {
            Payout::Restake => self.collateral_vault.ok_or(error!(ErrorCode::InvalidVault))?,
            Payout::Owner => self.owner_reward_token,
        };
        transfer_from_vault_to_user(
            self.authority,
            self.reward_source.to_account_info(),
            destination,
            self.reward_mint.to_account_info(),
            self.token_program,
            settlement.paid,
            self.reward_mint.decimals,
            &[&[crate::AUTH_SEED.as_bytes(), &[self.authority_bump]]],
        )?;

        if settlement.accrued > 0 {
            msg!(
                "Settled {}: paid {} forfeited {}",
                self.position_key,
                settlement.paid,
                settlement.forfeited
            );
            emit!(RewardClaimed {
                owner: self.ledger.position.owner,
                position: self.position_key,
                reward_mint: self.ledger.position.reward_mint,
                amount: settlement.paid,
                forfeited: settlement.forfeited,
                restaked: payout == Payout::Restake,
                timestamp: now,
            });
        }
        Ok(settlement)
    }
}
