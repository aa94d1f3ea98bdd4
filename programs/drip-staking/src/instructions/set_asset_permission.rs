use crate::error::ErrorCode;
use crate::states::*;
use anchor_lang::prelude::*;

#[derive(Accounts)]
pub struct SetAssetPermission<'info> {
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
        seeds = [ASSET_CONFIG_SEED.as_bytes(), asset_config.collateral.as_ref()],
        bump = asset_config.bump,
    )]
    pub asset_config: Account<'info, AssetConfig>,
}

/// Permits or revokes an asset. Revoking only blocks new stakes; open
/// positions keep accruing and can still claim and unstake.
pub fn set_asset_permission(ctx: Context<SetAssetPermission>, permitted: bool) -> Result<()> {
    let asset_config = &mut ctx.accounts.asset_config;
    asset_config.set_permitted(permitted)?;

    emit!(AssetPermissionChanged {
        asset_config: asset_config.key(),
        permitted,
    });
    Ok(())
}
