use crate::error::ErrorCode;
use crate::states::*;
use crate::utils::{current_timestamp, transfer_from_user_to_vault};
use crate::COLLATERAL_VAULT_SEED;
use anchor_lang::prelude::*;
use anchor_spl::{
    metadata::{Metadata, MetadataAccount},
    token_interface::{Mint, TokenAccount, TokenInterface},
};

/// Accounts context for `stake_nft`.
///
/// Validations:
/// - `nft_mint` is a verified member of the collection behind `asset_config`
///   (checked against its Metaplex metadata).
/// - The chosen `reward_mint` is permitted for NFT stakes.
///
/// The NFT moves into a per-mint program vault for the life of the position.
#[derive(Accounts)]
pub struct StakeNft<'info> {
    #[account(mut)]
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

    #[account(
        mut,
        seeds = [ASSET_CONFIG_SEED.as_bytes(), collection_mint.key().as_ref()],
        bump = asset_config.bump,
    )]
    pub asset_config: Account<'info, AssetConfig>,

    pub collection_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        constraint = nft_mint.decimals == 0 && nft_mint.supply == 1 @ ErrorCode::InvalidCollection
    )]
    pub nft_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        seeds = [
            b"metadata",
            metadata_program.key().as_ref(),
            nft_mint.key().as_ref(),
        ],
        seeds::program = metadata_program.key(),
        bump,
    )]
    pub metadata: Box<Account<'info, MetadataAccount>>,

    /// Reward token chosen for this NFT.
    pub reward_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        seeds = [REWARD_POOL_SEED.as_bytes(), reward_mint.key().as_ref()],
        bump = reward_pool.bump,
    )]
    pub reward_pool: Account<'info, RewardPool>,

    #[account(
        init,
        seeds = [
            POSITION_SEED.as_bytes(),
            owner.key().as_ref(),
            nft_mint.key().as_ref(),
        ],
        bump,
        payer = owner,
        space = StakePosition::LEN
    )]
    pub position: Account<'info, StakePosition>,

    #[account(
        init_if_needed,
        seeds = [REWARD_HISTORY_SEED.as_bytes(), owner.key().as_ref()],
        bump,
        payer = owner,
        space = RewardHistory::LEN
    )]
    pub reward_history: Account<'info, RewardHistory>,

    #[account(
        mut,
        token::mint = nft_mint,
        token::authority = owner,
    )]
    pub owner_nft_token: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init,
        seeds = [COLLATERAL_VAULT_SEED.as_bytes(), nft_mint.key().as_ref()],
        bump,
        payer = owner,
        token::mint = nft_mint,
        token::authority = authority,
        token::token_program = token_program,
    )]
    pub nft_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,

    pub metadata_program: Program<'info, Metadata>,

    pub system_program: Program<'info, System>,
}

/// Stakes one NFT of a permitted collection. The position snapshots the
/// reward pool's current NFT rate and adds it to the pool's runway
/// aggregate.
pub fn stake_nft(ctx: Context<StakeNft>) -> Result<()> {
    let verified = matches!(
        ctx.accounts.metadata.collection.as_ref(),
        Some(collection)
            if collection.verified && collection.key == ctx.accounts.collection_mint.key()
    );
    require!(verified, ErrorCode::InvalidCollection);

    let now = current_timestamp()?;
    let asset_config = &mut ctx.accounts.asset_config;
    let reward_pool = &mut ctx.accounts.reward_pool;
    let position = &mut ctx.accounts.position;
    let reward_history = &mut ctx.accounts.reward_history;

    asset_config.ensure_stakeable(AssetKind::NonFungible)?;
    let drip_rate_per_day = reward_pool.nft_rate()?;

    position.open_non_fungible(
        ctx.bumps.position,
        ctx.accounts.owner.key(),
        asset_config.key(),
        ctx.accounts.nft_mint.key(),
        reward_pool.reward_mint,
        drip_rate_per_day,
        now,
    );
    asset_config.add_stake(1, true)?;
    reward_pool.open_position()?;
    reward_pool.add_run_rate(drip_rate_per_day)?;
    if reward_history.owner == Pubkey::default() {
        reward_history.bump = ctx.bumps.reward_history;
        reward_history.owner = ctx.accounts.owner.key();
    }
    reward_history.open_position()?;

    transfer_from_user_to_vault(
        ctx.accounts.owner.to_account_info(),
        ctx.accounts.owner_nft_token.to_account_info(),
        ctx.accounts.nft_vault.to_account_info(),
        ctx.accounts.nft_mint.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        1,
        ctx.accounts.nft_mint.decimals,
    )?;
    msg!("NFT {} staked for {}", position.mint, position.reward_mint);

    emit!(Staked {
        owner: position.owner,
        payer: position.owner,
        position: position.key(),
        mint: position.mint,
        reward_mint: position.reward_mint,
        amount: 1,
        position_amount: 1,
        timestamp: now,
    });
    Ok(())
}
