use anchor_client::{Client, Cluster, Program};
use anchor_lang::prelude::AccountMeta;
use anyhow::Result;
use drip_staking::accounts as drip_accounts;
use drip_staking::instruction as drip_instructions;
use drip_staking::states::{AssetConfig, StakePosition};
use solana_sdk::{instruction::Instruction, pubkey::Pubkey, signature::Keypair, system_program};
use spl_associated_token_account::get_associated_token_address_with_program_id;
use std::rc::Rc;

use crate::instructions::utils::{
    get_asset_config_address, get_authority_address, get_collateral_vault_address,
    get_global_config_address, get_metadata_address, get_position_address,
    get_reward_history_address, get_reward_pool_address, get_reward_vault_address,
};

use super::super::{read_keypair_file, ClientConfig};

fn drip_program(config: &ClientConfig) -> Result<Program<Rc<Keypair>>> {
    let payer = read_keypair_file(&config.payer_path)?;
    let url = Cluster::Custom(config.http_url.clone(), config.ws_url.clone());
    let client = Client::new(url, Rc::new(payer));
    Ok(client.program(config.drip_staking_program)?)
}

/// Accounts settled for one position inside `claim_all`.
#[derive(Clone, Copy, Debug)]
pub struct ClaimGroup {
    pub position: Pubkey,
    pub asset_config: Pubkey,
    pub reward_pool: Pubkey,
    pub reward_source: Pubkey,
    pub reward_mint: Pubkey,
    pub owner_reward_token: Pubkey,
    pub collateral_vault: Pubkey,
}

impl ClaimGroup {
    /// NFT positions never restake, so their vault slot is a placeholder.
    pub fn new(
        program_id: &Pubkey,
        position_key: Pubkey,
        position: &StakePosition,
        asset: &AssetConfig,
        reward_source: Pubkey,
        token_program: &Pubkey,
    ) -> Self {
        ClaimGroup {
            position: position_key,
            asset_config: position.asset_config,
            reward_pool: get_reward_pool_address(program_id, &position.reward_mint),
            reward_source,
            reward_mint: position.reward_mint,
            owner_reward_token: get_associated_token_address_with_program_id(
                &position.owner,
                &position.reward_mint,
                token_program,
            ),
            collateral_vault: if asset.is_fungible() {
                asset.collateral_vault
            } else {
                system_program::id()
            },
        }
    }

    fn account_metas(&self) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.position, false),
            AccountMeta::new(self.asset_config, false),
            AccountMeta::new(self.reward_pool, false),
            AccountMeta::new(self.reward_source, false),
            AccountMeta::new_readonly(self.reward_mint, false),
            AccountMeta::new(self.owner_reward_token, false),
            AccountMeta::new(self.collateral_vault, false),
        ]
    }
}

pub fn initialise_configs_instr(
    config: &ClientConfig,
    owner: Pubkey,
    admin: Pubkey,
    minimum_staking_time: u64,
) -> Result<Vec<Instruction>> {
    let program = drip_program(config)?;
    let instructions = program
        .request()
        .accounts(drip_accounts::InitialiseConfigs {
            owner,
            global_config: get_global_config_address(&program.id()),
            system_program: system_program::id(),
        })
        .args(drip_instructions::InitialiseConfigs {
            admin,
            minimum_staking_time,
        })
        .instructions()?;
    Ok(instructions)
}

/// `account` carries the new admin (param 0) or reward wallet (param 2).
pub fn update_config_instr(
    config: &ClientConfig,
    owner: Pubkey,
    param: u8,
    value: u64,
    account: Option<Pubkey>,
) -> Result<Vec<Instruction>> {
    let program = drip_program(config)?;
    let mut request = program
        .request()
        .accounts(drip_accounts::UpdateConfig {
            owner,
            global_config: get_global_config_address(&program.id()),
        })
        .args(drip_instructions::UpdateConfig { param, value });
    if let Some(account) = account {
        request = request.accounts(vec![AccountMeta::new_readonly(account, false)]);
    }
    Ok(request.instructions()?)
}

pub fn configure_stakeable_asset_instr(
    config: &ClientConfig,
    owner: Pubkey,
    collateral_mint: Pubkey,
    reward_mint: Pubkey,
    token_program: Pubkey,
    drip_rate_per_day: u64,
) -> Result<Vec<Instruction>> {
    let program = drip_program(config)?;
    let program_id = program.id();
    let instructions = program
        .request()
        .accounts(drip_accounts::ConfigureStakeableAsset {
            owner,
            global_config: get_global_config_address(&program_id),
            authority: get_authority_address(&program_id),
            collateral_mint,
            reward_mint,
            asset_config: get_asset_config_address(&program_id, &collateral_mint),
            collateral_vault: get_collateral_vault_address(&program_id, &collateral_mint),
            reward_pool: get_reward_pool_address(&program_id, &reward_mint),
            reward_vault: get_reward_vault_address(&program_id, &reward_mint),
            token_program,
            system_program: system_program::id(),
        })
        .args(drip_instructions::ConfigureStakeableAsset { drip_rate_per_day })
        .instructions()?;
    Ok(instructions)
}

pub fn permit_nft_instr(
    config: &ClientConfig,
    owner: Pubkey,
    collection_mint: Pubkey,
) -> Result<Vec<Instruction>> {
    let program = drip_program(config)?;
    let program_id = program.id();
    let instructions = program
        .request()
        .accounts(drip_accounts::PermitNft {
            owner,
            global_config: get_global_config_address(&program_id),
            collection_mint,
            asset_config: get_asset_config_address(&program_id, &collection_mint),
            system_program: system_program::id(),
        })
        .args(drip_instructions::PermitNft {})
        .instructions()?;
    Ok(instructions)
}

pub fn permit_reward_token_instr(
    config: &ClientConfig,
    owner: Pubkey,
    reward_mint: Pubkey,
    token_program: Pubkey,
    nft_rate_per_day: u64,
) -> Result<Vec<Instruction>> {
    let program = drip_program(config)?;
    let program_id = program.id();
    let instructions = program
        .request()
        .accounts(drip_accounts::PermitRewardToken {
            owner,
            global_config: get_global_config_address(&program_id),
            authority: get_authority_address(&program_id),
            reward_mint,
            reward_pool: get_reward_pool_address(&program_id, &reward_mint),
            reward_vault: get_reward_vault_address(&program_id, &reward_mint),
            token_program,
            system_program: system_program::id(),
        })
        .args(drip_instructions::PermitRewardToken { nft_rate_per_day })
        .instructions()?;
    Ok(instructions)
}

pub fn revoke_reward_token_instr(
    config: &ClientConfig,
    owner: Pubkey,
    reward_mint: Pubkey,
) -> Result<Vec<Instruction>> {
    let program = drip_program(config)?;
    let program_id = program.id();
    let instructions = program
        .request()
        .accounts(drip_accounts::RevokeRewardToken {
            owner,
            global_config: get_global_config_address(&program_id),
            reward_pool: get_reward_pool_address(&program_id, &reward_mint),
        })
        .args(drip_instructions::RevokeRewardToken {})
        .instructions()?;
    Ok(instructions)
}

pub fn set_asset_permission_instr(
    config: &ClientConfig,
    owner: Pubkey,
    asset: Pubkey,
    permitted: bool,
) -> Result<Vec<Instruction>> {
    let program = drip_program(config)?;
    let program_id = program.id();
    let instructions = program
        .request()
        .accounts(drip_accounts::SetAssetPermission {
            owner,
            global_config: get_global_config_address(&program_id),
            asset_config: get_asset_config_address(&program_id, &asset),
        })
        .args(drip_instructions::SetAssetPermission { permitted })
        .instructions()?;
    Ok(instructions)
}

pub fn fund_reward_pool_instr(
    config: &ClientConfig,
    reward_mint: Pubkey,
    reward_vault: Pubkey,
    token_program: Pubkey,
    amount: u64,
) -> Result<Vec<Instruction>> {
    let program = drip_program(config)?;
    let program_id = program.id();
    let funder = program.payer();
    let instructions = program
        .request()
        .accounts(drip_accounts::FundRewardPool {
            funder,
            reward_pool: get_reward_pool_address(&program_id, &reward_mint),
            reward_mint,
            reward_vault,
            funder_token: get_associated_token_address_with_program_id(
                &funder,
                &reward_mint,
                &token_program,
            ),
            token_program,
        })
        .args(drip_instructions::FundRewardPool { amount })
        .instructions()?;
    Ok(instructions)
}

/// Stakes the payer's `collateral_mint` tokens into a position owned by
/// `beneficiary`.
pub fn stake_instr(
    config: &ClientConfig,
    asset: &AssetConfig,
    token_program: Pubkey,
    beneficiary: Pubkey,
    amount: u64,
    compound: bool,
) -> Result<Vec<Instruction>> {
    let program = drip_program(config)?;
    let program_id = program.id();
    let payer = program.payer();
    let collateral_mint = asset.collateral;
    let instructions = program
        .request()
        .accounts(drip_accounts::Stake {
            payer,
            global_config: get_global_config_address(&program_id),
            asset_config: get_asset_config_address(&program_id, &collateral_mint),
            reward_pool: get_reward_pool_address(&program_id, &asset.reward_mint),
            position: get_position_address(&program_id, &beneficiary, &collateral_mint),
            reward_history: get_reward_history_address(&program_id, &beneficiary),
            collateral_mint,
            collateral_vault: asset.collateral_vault,
            payer_token: get_associated_token_address_with_program_id(
                &payer,
                &collateral_mint,
                &token_program,
            ),
            token_program,
            system_program: system_program::id(),
        })
        .args(drip_instructions::Stake {
            beneficiary,
            amount,
            compound,
        })
        .instructions()?;
    Ok(instructions)
}

pub fn stake_nft_instr(
    config: &ClientConfig,
    collection_mint: Pubkey,
    nft_mint: Pubkey,
    reward_mint: Pubkey,
    token_program: Pubkey,
) -> Result<Vec<Instruction>> {
    let program = drip_program(config)?;
    let program_id = program.id();
    let owner = program.payer();
    let instructions = program
        .request()
        .accounts(drip_accounts::StakeNft {
            owner,
            global_config: get_global_config_address(&program_id),
            authority: get_authority_address(&program_id),
            asset_config: get_asset_config_address(&program_id, &collection_mint),
            collection_mint,
            nft_mint,
            metadata: get_metadata_address(&nft_mint),
            reward_mint,
            reward_pool: get_reward_pool_address(&program_id, &reward_mint),
            position: get_position_address(&program_id, &owner, &nft_mint),
            reward_history: get_reward_history_address(&program_id, &owner),
            owner_nft_token: get_associated_token_address_with_program_id(
                &owner,
                &nft_mint,
                &token_program,
            ),
            nft_vault: get_collateral_vault_address(&program_id, &nft_mint),
            token_program,
            metadata_program: anchor_spl::metadata::mpl_token_metadata::ID,
            system_program: system_program::id(),
        })
        .args(drip_instructions::StakeNft {})
        .instructions()?;
    Ok(instructions)
}

pub fn claim_instr(
    config: &ClientConfig,
    position_key: Pubkey,
    position: &StakePosition,
    asset: &AssetConfig,
    reward_source: Pubkey,
    token_program: Pubkey,
    restake: bool,
) -> Result<Vec<Instruction>> {
    let program = drip_program(config)?;
    let program_id = program.id();
    let instructions = program
        .request()
        .accounts(drip_accounts::Claim {
            owner: position.owner,
            global_config: get_global_config_address(&program_id),
            authority: get_authority_address(&program_id),
            position: position_key,
            asset_config: position.asset_config,
            reward_pool: get_reward_pool_address(&program_id, &position.reward_mint),
            reward_history: get_reward_history_address(&program_id, &position.owner),
            reward_mint: position.reward_mint,
            reward_source,
            owner_reward_token: get_associated_token_address_with_program_id(
                &position.owner,
                &position.reward_mint,
                &token_program,
            ),
            collateral_vault: asset.is_fungible().then_some(asset.collateral_vault),
            token_program,
            associated_token_program: spl_associated_token_account::id(),
            system_program: system_program::id(),
        })
        .args(drip_instructions::Claim { restake })
        .instructions()?;
    Ok(instructions)
}

pub fn claim_all_instr(
    config: &ClientConfig,
    owner: Pubkey,
    groups: &[ClaimGroup],
    token_program: Pubkey,
    restake: bool,
) -> Result<Vec<Instruction>> {
    let program = drip_program(config)?;
    let program_id = program.id();
    let remaining: Vec<AccountMeta> = groups.iter().flat_map(ClaimGroup::account_metas).collect();
    let instructions = program
        .request()
        .accounts(drip_accounts::ClaimAll {
            owner,
            global_config: get_global_config_address(&program_id),
            authority: get_authority_address(&program_id),
            reward_history: get_reward_history_address(&program_id, &owner),
            token_program,
        })
        .accounts(remaining)
        .args(drip_instructions::ClaimAll { restake })
        .instructions()?;
    Ok(instructions)
}

pub fn unstake_instr(
    config: &ClientConfig,
    position_key: Pubkey,
    position: &StakePosition,
    asset: &AssetConfig,
    reward_source: Pubkey,
    token_program: Pubkey,
    amount: u64,
    claim_first: bool,
) -> Result<Vec<Instruction>> {
    let program = drip_program(config)?;
    let program_id = program.id();
    let owner = position.owner;
    let instructions = program
        .request()
        .accounts(drip_accounts::Unstake {
            owner,
            global_config: get_global_config_address(&program_id),
            authority: get_authority_address(&program_id),
            position: position_key,
            asset_config: position.asset_config,
            reward_pool: get_reward_pool_address(&program_id, &position.reward_mint),
            reward_history: get_reward_history_address(&program_id, &owner),
            collateral_mint: position.mint,
            collateral_vault: asset.collateral_vault,
            owner_collateral_token: get_associated_token_address_with_program_id(
                &owner,
                &position.mint,
                &token_program,
            ),
            reward_mint: position.reward_mint,
            reward_source,
            owner_reward_token: get_associated_token_address_with_program_id(
                &owner,
                &position.reward_mint,
                &token_program,
            ),
            token_program,
            associated_token_program: spl_associated_token_account::id(),
            system_program: system_program::id(),
        })
        .args(drip_instructions::Unstake {
            amount,
            claim_first,
        })
        .instructions()?;
    Ok(instructions)
}

pub fn unstake_nft_instr(
    config: &ClientConfig,
    position_key: Pubkey,
    position: &StakePosition,
    reward_source: Pubkey,
    token_program: Pubkey,
    claim_first: bool,
) -> Result<Vec<Instruction>> {
    let program = drip_program(config)?;
    let program_id = program.id();
    let owner = position.owner;
    let instructions = program
        .request()
        .accounts(drip_accounts::UnstakeNft {
            owner,
            global_config: get_global_config_address(&program_id),
            authority: get_authority_address(&program_id),
            position: position_key,
            asset_config: position.asset_config,
            reward_pool: get_reward_pool_address(&program_id, &position.reward_mint),
            reward_history: get_reward_history_address(&program_id, &owner),
            nft_mint: position.mint,
            nft_vault: get_collateral_vault_address(&program_id, &position.mint),
            owner_nft_token: get_associated_token_address_with_program_id(
                &owner,
                &position.mint,
                &token_program,
            ),
            reward_mint: position.reward_mint,
            reward_source,
            owner_reward_token: get_associated_token_address_with_program_id(
                &owner,
                &position.reward_mint,
                &token_program,
            ),
            token_program,
            associated_token_program: spl_associated_token_account::id(),
            system_program: system_program::id(),
        })
        .args(drip_instructions::UnstakeNft { claim_first })
        .instructions()?;
    Ok(instructions)
}

pub fn runway_instr(
    config: &ClientConfig,
    reward_mint: Pubkey,
    reward_source: Pubkey,
) -> Result<Vec<Instruction>> {
    let program = drip_program(config)?;
    let program_id = program.id();
    let instructions = program
        .request()
        .accounts(drip_accounts::RunwayView {
            global_config: get_global_config_address(&program_id),
            authority: get_authority_address(&program_id),
            reward_pool: get_reward_pool_address(&program_id, &reward_mint),
            reward_source,
        })
        .args(drip_instructions::Runway {})
        .instructions()?;
    Ok(instructions)
}

pub fn claimable_instr(
    config: &ClientConfig,
    position_key: Pubkey,
    position: &StakePosition,
    reward_source: Pubkey,
) -> Result<Vec<Instruction>> {
    let program = drip_program(config)?;
    let program_id = program.id();
    let instructions = program
        .request()
        .accounts(drip_accounts::ClaimableView {
            global_config: get_global_config_address(&program_id),
            authority: get_authority_address(&program_id),
            position: position_key,
            asset_config: position.asset_config,
            reward_pool: get_reward_pool_address(&program_id, &position.reward_mint),
            reward_source,
        })
        .args(drip_instructions::Claimable {})
        .instructions()?;
    Ok(instructions)
}
