use crate::error::ErrorCode;
use crate::states::*;
use crate::utils::current_timestamp;
use crate::{COLLATERAL_VAULT_SEED, REWARD_VAULT_SEED};
use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

/// Accounts context for `configure_stakeable_asset`.
///
/// Creates on first use:
/// - The asset configuration for `collateral_mint`.
/// - The program vault that holds staked collateral.
/// - The reward pool and reward vault for `reward_mint`.
#[derive(Accounts)]
pub struct ConfigureStakeableAsset<'info> {
    /// Admin (must match `global_config.admin` or program admin).
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

    /// Fungible token users stake.
    #[account(mint::token_program = token_program)]
    pub collateral_mint: Box<InterfaceAccount<'info, Mint>>,

    /// Token the pool drips.
    #[account(mint::token_program = token_program)]
    pub reward_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        init_if_needed,
        seeds = [ASSET_CONFIG_SEED.as_bytes(), collateral_mint.key().as_ref()],
        bump,
        payer = owner,
        space = AssetConfig::LEN
    )]
    pub asset_config: Account<'info, AssetConfig>,

    #[account(
        init_if_needed,
        seeds = [COLLATERAL_VAULT_SEED.as_bytes(), collateral_mint.key().as_ref()],
        bump,
        payer = owner,
        token::mint = collateral_mint,
        token::authority = authority,
        token::token_program = token_program,
    )]
    pub collateral_vault: Box<InterfaceAccount<'info, TokenAccount>>,

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

/// Creates or overwrites the reward terms of a fungible asset.
///
/// Time elapsed before this call is priced at the previous rate. The runway
/// aggregate of the reward pool moves from the old rate to the new one when
/// the asset currently has stake.
pub fn configure_stakeable_asset(
    ctx: Context<ConfigureStakeableAsset>,
    drip_rate_per_day: u64,
) -> Result<()> {
    let now = current_timestamp()?;
    let asset_config = &mut ctx.accounts.asset_config;
    let reward_pool = &mut ctx.accounts.reward_pool;

    if asset_config.collateral == Pubkey::default() {
        asset_config.bump = ctx.bumps.asset_config;
        asset_config.last_update_timestamp = now;
    }
    reward_pool.initialize(
        ctx.bumps.reward_pool,
        ctx.accounts.reward_mint.key(),
        ctx.accounts.reward_vault.key(),
    );

    apply_fungible_terms(
        asset_config,
        reward_pool,
        ctx.accounts.collateral_mint.key(),
        ctx.accounts.reward_mint.key(),
        drip_rate_per_day,
        now,
    )?;
    asset_config.collateral_vault = ctx.accounts.collateral_vault.key();
    msg!(
        "Asset {} drips {} per day",
        asset_config.collateral,
        drip_rate_per_day
    );

    emit!(AssetConfigured {
        asset_config: asset_config.key(),
        collateral: asset_config.collateral,
        reward_mint: asset_config.reward_mint,
        drip_rate_per_day,
        non_fungible: false,
    });
    Ok(())
}

/// Writes new fungible terms into `asset_config` and keeps the runway of
/// `reward_pool` in step with the rate the asset now emits.
pub fn apply_fungible_terms(
    asset_config: &mut AssetConfig,
    reward_pool: &mut RewardPool,
    collateral: Pubkey,
    reward_mint: Pubkey,
    drip_rate_per_day: u64,
    now: u64,
) -> Result<()> {
    let previous_rate =
        asset_config.configure_fungible(collateral, reward_mint, drip_rate_per_day, now)?;
    reward_pool.move_run_rate(previous_rate, drip_rate_per_day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SECONDS_PER_DAY;

    const DAY: u64 = SECONDS_PER_DAY;

    #[test]
    fn rate_change_with_open_stake_moves_runway() {
        let collateral = Pubkey::new_unique();
        let reward_mint = Pubkey::new_unique();
        let mut asset = AssetConfig::default();
        let mut pool = RewardPool::default();
        pool.initialize(1, reward_mint, Pubkey::new_unique());
        // another asset already drips from this pool
        pool.add_run_rate(200).unwrap();

        apply_fungible_terms(&mut asset, &mut pool, collateral, reward_mint, 1_000, 0).unwrap();
        assert_eq!(pool.run_rate_per_day, 200);

        asset.update_reward_index(0);
        if asset.add_stake(10, true).unwrap() {
            pool.add_run_rate(asset.drip_rate_per_day).unwrap();
        }
        assert_eq!(pool.run_rate_per_day, 1_200);

        apply_fungible_terms(&mut asset, &mut pool, collateral, reward_mint, 4_000, DAY).unwrap();
        assert_eq!(pool.run_rate_per_day, 4_200);
        // the first day was priced at the old rate
        assert_eq!(asset.reward_per_token_stored, 100 * crate::PRECISION);

        // leaving takes out exactly what the asset now contributes
        asset.update_reward_index(2 * DAY);
        if asset.remove_stake(10, true).unwrap() {
            pool.sub_run_rate(asset.drip_rate_per_day).unwrap();
        }
        assert_eq!(pool.run_rate_per_day, 200);
    }

    #[test]
    fn rate_change_on_idle_asset_leaves_runway() {
        let collateral = Pubkey::new_unique();
        let reward_mint = Pubkey::new_unique();
        let mut asset = AssetConfig::default();
        let mut pool = RewardPool::default();

        apply_fungible_terms(&mut asset, &mut pool, collateral, reward_mint, 1_000, 0).unwrap();
        apply_fungible_terms(&mut asset, &mut pool, collateral, reward_mint, 3_000, DAY).unwrap();
        assert_eq!(pool.run_rate_per_day, 0);
        assert_eq!(asset.drip_rate_per_day, 3_000);
    }

    #[test]
    fn reward_token_swap_is_rejected_while_staked() {
        let collateral = Pubkey::new_unique();
        let reward_mint = Pubkey::new_unique();
        let mut asset = AssetConfig::default();
        let mut pool = RewardPool::default();
        apply_fungible_terms(&mut asset, &mut pool, collateral, reward_mint, 1_000, 0).unwrap();
        asset.add_stake(10, true).unwrap();
        pool.add_run_rate(1_000).unwrap();

        let mut other_pool = RewardPool::default();
        assert!(apply_fungible_terms(
            &mut asset,
            &mut other_pool,
            collateral,
            Pubkey::new_unique(),
            2_000,
            DAY
        )
        .is_err());
        assert_eq!(other_pool.run_rate_per_day, 0);
        assert_eq!(asset.drip_rate_per_day, 1_000);
    }
}
