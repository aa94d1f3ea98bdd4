use crate::error::ErrorCode;
use crate::states::*;
use anchor_lang::prelude::*;
use std::ops::DerefMut;

/// Accounts context for `initialise_configs`.
///
/// Creates the global configuration. Reward vaults and collateral vaults are
/// created lazily when assets and reward tokens are configured.
#[derive(Accounts)]
pub struct InitialiseConfigs<'info> {
    /// Admin signer (must match the program-level admin id).
    #[account(
        mut,
        address = crate::admin::id() @ ErrorCode::InvalidOwner
    )]
    pub owner: Signer<'info>,

    /// Global configuration account holding protocol parameters.
    #[account(
        init,
        seeds = [GLOBAL_CONFIG_SEED.as_bytes()],
        bump,
        payer = owner,
        space = GlobalConfig::LEN
    )]
    pub global_config: Account<'info, GlobalConfig>,

    /// Solana System Program.
    pub system_program: Program<'info, System>,
}

/// Writes the initial admin and minimum staking time. Rewards start out
/// funded from program-owned vaults (no reward wallet).
pub fn initialise_configs(
    ctx: Context<InitialiseConfigs>,
    admin: Pubkey,
    minimum_staking_time: u64,
) -> Result<()> {
    require_keys_neq!(admin, Pubkey::default(), ErrorCode::InvalidParam);

    let global_config = ctx.accounts.global_config.deref_mut();
    global_config.bump = ctx.bumps.global_config;
    global_config.admin = admin;
    global_config.reward_wallet = Pubkey::default();
    global_config.minimum_staking_time = minimum_staking_time;
    msg!("Global Config initialized");

    emit!(GlobalConfigInitialized {
        admin,
        minimum_staking_time,
    });
    Ok(())
}
