use crate::error::ErrorCode;
use crate::states::*;
use anchor_lang::prelude::*;
use anchor_spl::token_interface::Mint;

/// Accounts context for `permit_nft`: registers a Metaplex collection whose
/// verified members can be staked.
#[derive(Accounts)]
pub struct PermitNft<'info> {
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

    /// Collection NFT mint.
    pub collection_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        init_if_needed,
        seeds = [ASSET_CONFIG_SEED.as_bytes(), collection_mint.key().as_ref()],
        bump,
        payer = owner,
        space = AssetConfig::LEN
    )]
    pub asset_config: Account<'info, AssetConfig>,

    pub system_program: Program<'info, System>,
}

pub fn permit_nft(ctx: Context<PermitNft>) -> Result<()> {
    let asset_config = &mut ctx.accounts.asset_config;
    if asset_config.collateral == Pubkey::default() {
        asset_config.bump = ctx.bumps.asset_config;
    }
    asset_config.permit_collection(ctx.accounts.collection_mint.key())?;
    msg!("Collection {} permitted", asset_config.collateral);

    emit!(AssetConfigured {
        asset_config: asset_config.key(),
        collateral: asset_config.collateral,
        reward_mint: Pubkey::default(),
        drip_rate_per_day: 0,
        non_fungible: true,
    });
    Ok(())
}
