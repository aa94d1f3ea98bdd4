use crate::error::ErrorCode;
use crate::states::{ConfigUpdated, GlobalConfig, GLOBAL_CONFIG_SEED};
use anchor_lang::prelude::*;

/// Accounts context for the `update_config` instruction.
///
/// Only the current `admin` in `global_config` or the program-level admin
/// may update the configuration.
#[derive(Accounts)]
pub struct UpdateConfig<'info> {
    /// Authorized signer: must be the stored admin or the hardcoded program admin.
    #[account(
        constraint = global_config.is_admin(&owner.key()) @ ErrorCode::InvalidOwner
    )]
    pub owner: Signer<'info>,

    /// Global configuration account to be updated.
    #[account(
        mut,
        seeds = [GLOBAL_CONFIG_SEED.as_bytes()],
        bump = global_config.bump,
    )]
    pub global_config: Account<'info, GlobalConfig>,
}

/// Updates selected fields of the global configuration.
///
/// # Param Mapping
/// - `0`: **Admin change** → new admin Pubkey passed via `remaining_accounts[0]`.
/// - `1`: **minimum_staking_time** → seconds before a position can be unstaked.
/// - `2`: **reward_wallet** → wallet Pubkey passed via `remaining_accounts[0]`;
///   rewards are then paid from its delegated allowance.
/// - `3`: **clear reward_wallet** → rewards are paid from program vaults again.
///
/// Any other `param` value returns `ErrorCode::InvalidParam`.
///
/// # Errors
/// - `InvalidOwner`: If the caller is not an authorized admin.
/// - `MissingRemainingAccount`: If a Pubkey parameter is not provided.
/// - `InvalidParam`: If `param` is outside the valid range.
pub fn update_config(ctx: Context<UpdateConfig>, param: u8, value: u64) -> Result<()> {
    let global_config = &mut ctx.accounts.global_config;
    match param {
        0 => {
            let new_admin = remaining_key(ctx.remaining_accounts)?;
            require_keys_neq!(new_admin, Pubkey::default());
            global_config.admin = new_admin;
        }
        1 => {
            global_config.minimum_staking_time = value;
        }
        2 => {
            let wallet = remaining_key(ctx.remaining_accounts)?;
            require_keys_neq!(wallet, Pubkey::default());
            global_config.reward_wallet = wallet;
        }
        3 => {
            global_config.reward_wallet = Pubkey::default();
        }
        _ => return Err(error!(ErrorCode::InvalidParam)),
    }
    msg!("Config param {} updated", param);

    emit!(ConfigUpdated {
        admin: global_config.admin,
        reward_wallet: global_config.reward_wallet,
        minimum_staking_time: global_config.minimum_staking_time,
    });
    Ok(())
}

fn remaining_key(remaining_accounts: &[AccountInfo]) -> Result<Pubkey> {
    Ok(*remaining_accounts
        .iter()
        .next()
        .ok_or(error!(ErrorCode::MissingRemainingAccount))?
        .key)
}
