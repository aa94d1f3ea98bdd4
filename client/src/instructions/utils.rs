use anchor_lang::AccountDeserialize;
use anyhow::{format_err, Result};
use drip_staking::{
    states::{
        GlobalConfig, RewardPool, ASSET_CONFIG_SEED, GLOBAL_CONFIG_SEED, POSITION_SEED,
        REWARD_HISTORY_SEED, REWARD_POOL_SEED,
    },
    AUTH_SEED, COLLATERAL_VAULT_SEED, REWARD_VAULT_SEED,
};
use solana_sdk::{account::Account, pubkey::Pubkey};
use spl_associated_token_account::get_associated_token_address_with_program_id;
use spl_token_2022::{
    extension::StateWithExtensions, solana_program::program_option::COption,
    state::Account as TokenAccount,
};

pub fn deserialize_anchor_account<T: AccountDeserialize>(account: &Account) -> Result<T> {
    let mut data: &[u8] = &account.data;
    T::try_deserialize(&mut data).map_err(Into::into)
}

/// Unpacks an SPL Token or Token-2022 account.
pub fn unpack_token_account(account: &Account) -> Result<TokenAccount> {
    let state = StateWithExtensions::<TokenAccount>::unpack(&account.data)
        .map_err(|e| format_err!("invalid token account: {}", e))?;
    Ok(state.base)
}

/// Reward balance the program can move out of `source`, as the program
/// computes it.
pub fn available_from_source(
    global_config: &GlobalConfig,
    authority: &Pubkey,
    source: &TokenAccount,
) -> u64 {
    let delegate = match source.delegate {
        COption::Some(delegate) => Some(delegate),
        COption::None => None,
    };
    global_config.available_rewards(authority, source.amount, delegate, source.delegated_amount)
}

pub fn get_global_config_address(program_id: &Pubkey) -> Pubkey {
    let (global_config, _bump) =
        Pubkey::find_program_address(&[GLOBAL_CONFIG_SEED.as_bytes()], program_id);
    global_config
}

pub fn get_authority_address(program_id: &Pubkey) -> Pubkey {
    let (authority, _bump) = Pubkey::find_program_address(&[AUTH_SEED.as_bytes()], program_id);
    authority
}

pub fn get_asset_config_address(program_id: &Pubkey, collateral: &Pubkey) -> Pubkey {
    let (asset_config, _bump) = Pubkey::find_program_address(
        &[ASSET_CONFIG_SEED.as_bytes(), collateral.as_ref()],
        program_id,
    );
    asset_config
}

/// Fungible collateral vault, or the custody account of a single NFT.
pub fn get_collateral_vault_address(program_id: &Pubkey, mint: &Pubkey) -> Pubkey {
    let (vault, _bump) = Pubkey::find_program_address(
        &[COLLATERAL_VAULT_SEED.as_bytes(), mint.as_ref()],
        program_id,
    );
    vault
}

pub fn get_reward_pool_address(program_id: &Pubkey, reward_mint: &Pubkey) -> Pubkey {
    let (reward_pool, _bump) = Pubkey::find_program_address(
        &[REWARD_POOL_SEED.as_bytes(), reward_mint.as_ref()],
        program_id,
    );
    reward_pool
}

pub fn get_reward_vault_address(program_id: &Pubkey, reward_mint: &Pubkey) -> Pubkey {
    let (reward_vault, _bump) = Pubkey::find_program_address(
        &[REWARD_VAULT_SEED.as_bytes(), reward_mint.as_ref()],
        program_id,
    );
    reward_vault
}

pub fn get_position_address(program_id: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    let (position, _bump) = Pubkey::find_program_address(
        &[POSITION_SEED.as_bytes(), owner.as_ref(), mint.as_ref()],
        program_id,
    );
    position
}

pub fn get_reward_history_address(program_id: &Pubkey, owner: &Pubkey) -> Pubkey {
    let (reward_history, _bump) = Pubkey::find_program_address(
        &[REWARD_HISTORY_SEED.as_bytes(), owner.as_ref()],
        program_id,
    );
    reward_history
}

pub fn get_metadata_address(mint: &Pubkey) -> Pubkey {
    let metadata_program = anchor_spl::metadata::mpl_token_metadata::ID;
    let (metadata, _bump) = Pubkey::find_program_address(
        &[b"metadata", metadata_program.as_ref(), mint.as_ref()],
        &metadata_program,
    );
    metadata
}

/// Token account rewards for `pool` are paid from: the reward wallet's ATA
/// when one is configured, the pool's vault otherwise.
pub fn get_reward_source_address(
    global_config: &GlobalConfig,
    pool: &RewardPool,
    token_program: &Pubkey,
) -> Pubkey {
    if global_config.uses_reward_wallet() {
        get_associated_token_address_with_program_id(
            &global_config.reward_wallet,
            &pool.reward_mint,
            token_program,
        )
    } else {
        pool.reward_vault
    }
}
