use anchor_lang::{AccountDeserialize, Discriminator};
use anyhow::{format_err, Result};
use drip_staking::states::{
    AssetConfig, GlobalConfig, RewardHistory, RewardPool, StakePosition,
};
use solana_account_decoder::UiAccountEncoding;
use solana_client::{
    rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig},
    rpc_filter::{Memcmp, RpcFilterType},
};
use solana_sdk::{clock::Clock, pubkey::Pubkey, sysvar};
use std::collections::BTreeMap;

use super::utils::{
    available_from_source, deserialize_anchor_account, get_asset_config_address,
    get_authority_address, get_global_config_address, get_reward_history_address, get_reward_pool_address,
    get_reward_source_address, unpack_token_account,
};

/// Byte offset of `StakePosition::owner`: discriminator then bump.
const POSITION_OWNER_OFFSET: usize = 8 + 1;

pub fn fetch_anchor_account<T: AccountDeserialize>(rpc_client: &RpcClient, key: &Pubkey) -> Result<T> {
    let account = rpc_client
        .get_account(key)
        .map_err(|e| format_err!("failed to load {}: {}", key, e))?;
    deserialize_anchor_account(&account)
}

pub fn fetch_global_config(rpc_client: &RpcClient, program_id: &Pubkey) -> Result<GlobalConfig> {
    fetch_anchor_account(rpc_client, &get_global_config_address(program_id))
}

pub fn fetch_reward_pool(
    rpc_client: &RpcClient,
    program_id: &Pubkey,
    reward_mint: &Pubkey,
) -> Result<RewardPool> {
    fetch_anchor_account(rpc_client, &get_reward_pool_address(program_id, reward_mint))
}

/// Reward terms of the asset staked as `mint`.
///
/// An asset that was never configured has no account, which the program
/// reports as `AccountNotInitialized` rather than `NotConfigured`; both read
/// as "not configured" here.
pub fn fetch_asset_config(
    rpc_client: &RpcClient,
    program_id: &Pubkey,
    mint: &Pubkey,
) -> Result<AssetConfig> {
    let key = get_asset_config_address(program_id, mint);
    let account = rpc_client
        .get_account_with_commitment(&key, rpc_client.commitment())?
        .value
        .ok_or_else(|| format_err!("asset {} is not configured", mint))?;
    let asset: AssetConfig = deserialize_anchor_account(&account)?;
    if !asset.is_configured() {
        return Err(format_err!("asset {} is not configured", mint));
    }
    Ok(asset)
}

/// A user's reward history; a user who never staked has an empty one.
pub fn fetch_reward_history(
    rpc_client: &RpcClient,
    program_id: &Pubkey,
    owner: &Pubkey,
) -> Result<RewardHistory> {
    let key = get_reward_history_address(program_id, owner);
    let account = rpc_client
        .get_account_with_commitment(&key, rpc_client.commitment())?
        .value;
    match account {
        Some(account) => deserialize_anchor_account(&account),
        None => Ok(RewardHistory {
            owner: *owner,
            ..RewardHistory::default()
        }),
    }
}

fn program_accounts<T: AccountDeserialize + Discriminator>(
    rpc_client: &RpcClient,
    program_id: &Pubkey,
    data_size: usize,
    mut filters: Vec<RpcFilterType>,
) -> Result<Vec<(Pubkey, T)>> {
    filters.push(RpcFilterType::DataSize(data_size as u64));
    filters.push(RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
        0,
        T::DISCRIMINATOR.to_vec(),
    )));
    let accounts = rpc_client.get_program_accounts_with_config(
        program_id,
        RpcProgramAccountsConfig {
            filters: Some(filters),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                ..RpcAccountInfoConfig::default()
            },
            ..RpcProgramAccountsConfig::default()
        },
    )?;
    accounts
        .into_iter()
        .map(|(key, account)| Ok((key, deserialize_anchor_account(&account)?)))
        .collect()
}

/// Open positions of `owner`, ordered by account address.
pub fn fetch_positions(
    rpc_client: &RpcClient,
    program_id: &Pubkey,
    owner: &Pubkey,
) -> Result<Vec<(Pubkey, StakePosition)>> {
    let mut positions: Vec<(Pubkey, StakePosition)> = program_accounts(
        rpc_client,
        program_id,
        StakePosition::LEN,
        vec![RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
            POSITION_OWNER_OFFSET,
            owner.to_bytes().to_vec(),
        ))],
    )?;
    positions.retain(|(_, position)| position.is_open());
    positions.sort_by_key(|(key, _)| *key);
    Ok(positions)
}

/// Every asset configuration, keyed by account address.
pub fn fetch_asset_configs(
    rpc_client: &RpcClient,
    program_id: &Pubkey,
) -> Result<BTreeMap<Pubkey, AssetConfig>> {
    let assets: Vec<(Pubkey, AssetConfig)> =
        program_accounts(rpc_client, program_id, AssetConfig::LEN, Vec::new())?;
    Ok(assets.into_iter().collect())
}

pub fn fetch_clock(rpc_client: &RpcClient) -> Result<Clock> {
    let account = rpc_client.get_account(&sysvar::clock::id())?;
    Ok(bincode::deserialize(&account.data)?)
}

/// Current cluster time in the unsigned seconds the program works with.
pub fn cluster_now(rpc_client: &RpcClient) -> Result<u64> {
    let clock = fetch_clock(rpc_client)?;
    u64::try_from(clock.unix_timestamp)
        .map_err(|_| format_err!("negative cluster time {}", clock.unix_timestamp))
}

/// Token program owning `mint`.
pub fn mint_token_program(rpc_client: &RpcClient, mint: &Pubkey) -> Result<Pubkey> {
    Ok(rpc_client.get_account(mint)?.owner)
}

/// Where rewards for `pool` are paid from and how much of it the program
/// can move.
pub fn reward_source(
    rpc_client: &RpcClient,
    program_id: &Pubkey,
    global_config: &GlobalConfig,
    pool: &RewardPool,
) -> Result<(Pubkey, u64)> {
    let token_program = mint_token_program(rpc_client, &pool.reward_mint)?;
    let source = get_reward_source_address(global_config, pool, &token_program);
    let available = match rpc_client
        .get_account_with_commitment(&source, rpc_client.commitment())?
        .value
    {
        Some(account) => available_from_source(
            global_config,
            &get_authority_address(program_id),
            &unpack_token_account(&account)?,
        ),
        None => 0,
    };
    Ok((source, available))
}

/// Available reward balance per reward mint referenced by `positions`.
pub fn reward_balances(
    rpc_client: &RpcClient,
    program_id: &Pubkey,
    global_config: &GlobalConfig,
    positions: &[(Pubkey, StakePosition)],
) -> Result<BTreeMap<Pubkey, u64>> {
    let mut balances = BTreeMap::new();
    for (_, position) in positions {
        if balances.contains_key(&position.reward_mint) {
            continue;
        }
        let pool = fetch_reward_pool(rpc_client, program_id, &position.reward_mint)?;
        let (_, available) = reward_source(rpc_client, program_id, global_config, &pool)?;
        balances.insert(position.reward_mint, available);
    }
    Ok(balances)
}
