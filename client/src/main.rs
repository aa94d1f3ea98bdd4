use anyhow::{format_err, Result};
use clap::Parser;
use colorful::Colorful;
use configparser::ini::Ini;
use drip_staking::{
    states::{AssetConfig, AssetKind, Runway, StakePosition},
    views::{self, ClaimableReward},
};
use serde::Serialize;
use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use std::str::FromStr;

mod instructions;
use instructions::drip_instructions::*;
use instructions::queries::*;
use instructions::rpc::*;
use instructions::utils::*;

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    http_url: String,
    ws_url: String,
    payer_path: String,
    admin_path: String,
    drip_staking_program: Pubkey,
}

fn required(config: &Ini, key: &str) -> Result<String> {
    config
        .get("Global", key)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| format_err!("{} must not be empty", key))
}

fn load_cfg(client_config: &str) -> Result<ClientConfig> {
    let mut config = Ini::new();
    config
        .load(client_config)
        .map_err(|e| format_err!("failed to load {}: {}", client_config, e))?;
    let http_url = required(&config, "http_url")?;
    let ws_url = required(&config, "ws_url")?;
    let payer_path = required(&config, "payer_path")?;
    let admin_path = required(&config, "admin_path")?;
    let drip_staking_program = Pubkey::from_str(&required(&config, "drip_staking_program")?)?;

    Ok(ClientConfig {
        http_url,
        ws_url,
        payer_path,
        admin_path,
        drip_staking_program,
    })
}

fn read_keypair_file(s: &str) -> Result<Keypair> {
    solana_sdk::signature::read_keypair_file(s)
        .map_err(|_| format_err!("failed to read keypair from {}", s))
}

#[derive(Debug, Parser)]
pub struct Opts {
    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,
    #[clap(subcommand)]
    pub command: DripCommands,
}

#[derive(Debug, Parser)]
pub enum DripCommands {
    InitialiseConfigs {
        #[arg(long)]
        admin: Pubkey,
        #[arg(long, default_value_t = 0)]
        minimum_staking_time: u64,
    },
    /// 0: admin (--account), 1: minimum staking time (--value),
    /// 2: reward wallet (--account), 3: clear reward wallet.
    UpdateConfig {
        #[arg(long)]
        param: u8,
        #[arg(long, default_value_t = 0)]
        value: u64,
        #[arg(long)]
        account: Option<Pubkey>,
    },
    ConfigureAsset {
        #[arg(long)]
        collateral_mint: Pubkey,
        #[arg(long)]
        reward_mint: Pubkey,
        #[arg(long)]
        drip_rate_per_day: u64,
    },
    PermitNft {
        #[arg(long)]
        collection_mint: Pubkey,
    },
    PermitRewardToken {
        #[arg(long)]
        reward_mint: Pubkey,
        #[arg(long)]
        nft_rate_per_day: u64,
    },
    RevokeRewardToken {
        #[arg(long)]
        reward_mint: Pubkey,
    },
    SetAssetPermission {
        /// Collateral mint or NFT collection.
        #[arg(long)]
        asset: Pubkey,
        #[arg(long)]
        permitted: bool,
    },
    FundRewardPool {
        #[arg(long)]
        reward_mint: Pubkey,
        #[arg(long)]
        amount: u64,
    },
    Stake {
        #[arg(long)]
        collateral_mint: Pubkey,
        #[arg(long)]
        amount: u64,
        /// Position owner; defaults to the payer.
        #[arg(long)]
        beneficiary: Option<Pubkey>,
        #[arg(long)]
        compound: bool,
    },
    StakeNft {
        #[arg(long)]
        collection_mint: Pubkey,
        #[arg(long)]
        nft_mint: Pubkey,
        #[arg(long)]
        reward_mint: Pubkey,
    },
    Claim {
        /// Collateral mint or NFT mint of the position.
        #[arg(long)]
        stake_id: Pubkey,
        #[arg(long)]
        restake: bool,
    },
    ClaimAll {
        #[arg(long)]
        restake: bool,
    },
    Unstake {
        #[arg(long)]
        collateral_mint: Pubkey,
        #[arg(long)]
        amount: u64,
        #[arg(long)]
        claim_first: bool,
    },
    UnstakeNft {
        #[arg(long)]
        nft_mint: Pubkey,
        #[arg(long)]
        claim_first: bool,
    },
    Runway {
        #[arg(long)]
        reward_mint: Pubkey,
    },
    Claimable {
        #[arg(long)]
        user: Option<Pubkey>,
        /// Restrict to positions in this collateral mint or collection.
        #[arg(long)]
        asset: Option<Pubkey>,
        /// Ask the program for a single position instead of computing locally.
        #[arg(long)]
        stake_id: Option<Pubkey>,
    },
    Staked {
        #[arg(long)]
        user: Option<Pubkey>,
    },
    StakeIds {
        #[arg(long)]
        collection_mint: Pubkey,
        #[arg(long)]
        user: Option<Pubkey>,
    },
    RewardHistory {
        #[arg(long)]
        user: Option<Pubkey>,
    },
    Asset {
        #[arg(long)]
        mint: Pubkey,
    },
    Assets {},
}

#[derive(Serialize)]
struct ClaimableRow {
    position: String,
    stake_id: String,
    asset: String,
    reward_mint: String,
    accrued: u64,
    amount: u64,
}

impl From<&ClaimableReward> for ClaimableRow {
    fn from(reward: &ClaimableReward) -> Self {
        ClaimableRow {
            position: reward.position.to_string(),
            stake_id: reward.stake_id.to_string(),
            asset: reward.asset.to_string(),
            reward_mint: reward.reward_mint.to_string(),
            accrued: reward.accrued,
            amount: reward.amount,
        }
    }
}

#[derive(Serialize)]
struct AssetRow {
    asset: String,
    kind: &'static str,
    permitted: bool,
    drip_token: String,
    drip_rate: u64,
    staked: u64,
    open_positions: u64,
    reward_rate: String,
}

fn asset_row(asset: &AssetConfig) -> Result<AssetRow> {
    let rewards = views::asset_rewards(asset)?;
    Ok(AssetRow {
        asset: asset.collateral.to_string(),
        kind: kind_name(asset.kind),
        permitted: asset.permitted,
        drip_token: rewards.drip_token.to_string(),
        drip_rate: rewards.drip_rate,
        staked: rewards.staked,
        open_positions: asset.open_positions,
        reward_rate: rewards.reward_rate.to_string(),
    })
}

fn kind_name(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Fungible => "fungible",
        AssetKind::NonFungible => "nft",
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn send(
    rpc_client: &RpcClient,
    instructions: &[Instruction],
    payer: &Keypair,
    signers: &[&Keypair],
) -> Result<()> {
    let recent_hash = rpc_client.get_latest_blockhash()?;
    let txn =
        Transaction::new_signed_with_payer(instructions, Some(&payer.pubkey()), signers, recent_hash);
    let signature = send_txn(rpc_client, &txn, true)?;
    println!("{}", signature.to_string().as_str().green());
    Ok(())
}

fn main() -> Result<()> {
    let client_config = "client_config.ini";
    let drip_config = load_cfg(client_config)?;
    // cluster params.
    let payer = read_keypair_file(&drip_config.payer_path)?;
    let admin = read_keypair_file(&drip_config.admin_path)?;
    // solana rpc client
    let rpc_client = RpcClient::new(drip_config.http_url.to_string());
    let program_id = drip_config.drip_staking_program;

    let opts = Opts::parse();
    match opts.command {
        DripCommands::InitialiseConfigs {
            admin: new_admin,
            minimum_staking_time,
        } => {
            let ixs = initialise_configs_instr(
                &drip_config,
                admin.pubkey(),
                new_admin,
                minimum_staking_time,
            )?;
            send(&rpc_client, &ixs, &payer, &[&payer, &admin])?;
        }
        DripCommands::UpdateConfig {
            param,
            value,
            account,
        } => {
            let ixs = update_config_instr(&drip_config, admin.pubkey(), param, value, account)?;
            send(&rpc_client, &ixs, &payer, &[&payer, &admin])?;
        }
        DripCommands::ConfigureAsset {
            collateral_mint,
            reward_mint,
            drip_rate_per_day,
        } => {
            let token_program = mint_token_program(&rpc_client, &collateral_mint)?;
            let ixs = configure_stakeable_asset_instr(
                &drip_config,
                admin.pubkey(),
                collateral_mint,
                reward_mint,
                token_program,
                drip_rate_per_day,
            )?;
            send(&rpc_client, &ixs, &payer, &[&payer, &admin])?;
        }
        DripCommands::PermitNft { collection_mint } => {
            let ixs = permit_nft_instr(&drip_config, admin.pubkey(), collection_mint)?;
            send(&rpc_client, &ixs, &payer, &[&payer, &admin])?;
        }
        DripCommands::PermitRewardToken {
            reward_mint,
            nft_rate_per_day,
        } => {
            let token_program = mint_token_program(&rpc_client, &reward_mint)?;
            let ixs = permit_reward_token_instr(
                &drip_config,
                admin.pubkey(),
                reward_mint,
                token_program,
                nft_rate_per_day,
            )?;
            send(&rpc_client, &ixs, &payer, &[&payer, &admin])?;
        }
        DripCommands::RevokeRewardToken { reward_mint } => {
            let ixs = revoke_reward_token_instr(&drip_config, admin.pubkey(), reward_mint)?;
            send(&rpc_client, &ixs, &payer, &[&payer, &admin])?;
        }
        DripCommands::SetAssetPermission { asset, permitted } => {
            let ixs = set_asset_permission_instr(&drip_config, admin.pubkey(), asset, permitted)?;
            send(&rpc_client, &ixs, &payer, &[&payer, &admin])?;
        }
        DripCommands::FundRewardPool {
            reward_mint,
            amount,
        } => {
            let pool = fetch_reward_pool(&rpc_client, &program_id, &reward_mint)?;
            let token_program = mint_token_program(&rpc_client, &reward_mint)?;
            let ixs = fund_reward_pool_instr(
                &drip_config,
                reward_mint,
                pool.reward_vault,
                token_program,
                amount,
            )?;
            send(&rpc_client, &ixs, &payer, &[&payer])?;
        }
        DripCommands::Stake {
            collateral_mint,
            amount,
            beneficiary,
            compound,
        } => {
            let asset = fetch_asset_config(&rpc_client, &program_id, &collateral_mint)?;
            let token_program = mint_token_program(&rpc_client, &collateral_mint)?;
            let ixs = stake_instr(
                &drip_config,
                &asset,
                token_program,
                beneficiary.unwrap_or_else(|| payer.pubkey()),
                amount,
                compound,
            )?;
            send(&rpc_client, &ixs, &payer, &[&payer])?;
        }
        DripCommands::StakeNft {
            collection_mint,
            nft_mint,
            reward_mint,
        } => {
            let token_program = mint_token_program(&rpc_client, &nft_mint)?;
            let ixs = stake_nft_instr(
                &drip_config,
                collection_mint,
                nft_mint,
                reward_mint,
                token_program,
            )?;
            send(&rpc_client, &ixs, &payer, &[&payer])?;
        }
        DripCommands::Claim { stake_id, restake } => {
            let global_config = fetch_global_config(&rpc_client, &program_id)?;
            let position_key = get_position_address(&program_id, &payer.pubkey(), &stake_id);
            let position: StakePosition = fetch_anchor_account(&rpc_client, &position_key)?;
            let asset: AssetConfig = fetch_anchor_account(&rpc_client, &position.asset_config)?;
            let pool = fetch_reward_pool(&rpc_client, &program_id, &position.reward_mint)?;
            let (reward_source, _) =
                reward_source(&rpc_client, &program_id, &global_config, &pool)?;
            let token_program = mint_token_program(&rpc_client, &position.reward_mint)?;
            let ixs = claim_instr(
                &drip_config,
                position_key,
                &position,
                &asset,
                reward_source,
                token_program,
                restake,
            )?;
            send(&rpc_client, &ixs, &payer, &[&payer])?;
        }
        DripCommands::ClaimAll { restake } => {
            let owner = payer.pubkey();
            let global_config = fetch_global_config(&rpc_client, &program_id)?;
            let assets = fetch_asset_configs(&rpc_client, &program_id)?;
            let positions = fetch_positions(&rpc_client, &program_id, &owner)?;
            let mut groups = Vec::with_capacity(positions.len());
            let mut token_program = spl_token::id();
            for (key, position) in &positions {
                let asset = assets
                    .get(&position.asset_config)
                    .ok_or_else(|| format_err!("missing asset config for {}", key))?;
                let pool = fetch_reward_pool(&rpc_client, &program_id, &position.reward_mint)?;
                let (source, _) = reward_source(&rpc_client, &program_id, &global_config, &pool)?;
                token_program = mint_token_program(&rpc_client, &position.reward_mint)?;
                groups.push(ClaimGroup::new(
                    &program_id,
                    *key,
                    position,
                    asset,
                    source,
                    &token_program,
                ));
            }
            let ixs = claim_all_instr(&drip_config, owner, &groups, token_program, restake)?;
            send(&rpc_client, &ixs, &payer, &[&payer])?;
        }
        DripCommands::Unstake {
            collateral_mint,
            amount,
            claim_first,
        } => {
            let global_config = fetch_global_config(&rpc_client, &program_id)?;
            let position_key =
                get_position_address(&program_id, &payer.pubkey(), &collateral_mint);
            let position: StakePosition = fetch_anchor_account(&rpc_client, &position_key)?;
            let asset: AssetConfig = fetch_anchor_account(&rpc_client, &position.asset_config)?;
            let pool = fetch_reward_pool(&rpc_client, &program_id, &position.reward_mint)?;
            let (reward_source, _) =
                reward_source(&rpc_client, &program_id, &global_config, &pool)?;
            let token_program = mint_token_program(&rpc_client, &collateral_mint)?;
            let ixs = unstake_instr(
                &drip_config,
                position_key,
                &position,
                &asset,
                reward_source,
                token_program,
                amount,
                claim_first,
            )?;
            send(&rpc_client, &ixs, &payer, &[&payer])?;
        }
        DripCommands::UnstakeNft {
            nft_mint,
            claim_first,
        } => {
            let global_config = fetch_global_config(&rpc_client, &program_id)?;
            let position_key = get_position_address(&program_id, &payer.pubkey(), &nft_mint);
            let position: StakePosition = fetch_anchor_account(&rpc_client, &position_key)?;
            let pool = fetch_reward_pool(&rpc_client, &program_id, &position.reward_mint)?;
            let (reward_source, _) =
                reward_source(&rpc_client, &program_id, &global_config, &pool)?;
            let token_program = mint_token_program(&rpc_client, &nft_mint)?;
            let ixs = unstake_nft_instr(
                &drip_config,
                position_key,
                &position,
                reward_source,
                token_program,
                claim_first,
            )?;
            send(&rpc_client, &ixs, &payer, &[&payer])?;
        }
        DripCommands::Runway { reward_mint } => {
            let global_config = fetch_global_config(&rpc_client, &program_id)?;
            let pool = fetch_reward_pool(&rpc_client, &program_id, &reward_mint)?;
            let (reward_source, _) =
                reward_source(&rpc_client, &program_id, &global_config, &pool)?;
            let ixs = runway_instr(&drip_config, reward_mint, reward_source)?;
            let runway: Runway = simulate_return_data(&rpc_client, &ixs, &payer.pubkey())?;
            if opts.json {
                print_json(&serde_json::json!({
                    "reward_mint": reward_mint.to_string(),
                    "run_rate_per_second": runway.run_rate_per_second.to_string(),
                    "funded_seconds": runway.funded_seconds,
                    "available": runway.available,
                }))?;
            } else {
                println!("reward mint:         {}", reward_mint);
                println!("available:           {}", runway.available);
                println!(
                    "run rate per second: {} (x1e12)",
                    runway.run_rate_per_second
                );
                match runway.funded_seconds {
                    Some(seconds) => println!("funded seconds:      {}", seconds),
                    None => println!("funded seconds:      {}", "not emitting".yellow()),
                }
            }
        }
        DripCommands::Claimable {
            user,
            asset,
            stake_id,
        } => {
            let user = user.unwrap_or_else(|| payer.pubkey());
            let global_config = fetch_global_config(&rpc_client, &program_id)?;
            let rewards = match stake_id {
                Some(stake_id) => {
                    let position_key = get_position_address(&program_id, &user, &stake_id);
                    let position: StakePosition = fetch_anchor_account(&rpc_client, &position_key)?;
                    let pool =
                        fetch_reward_pool(&rpc_client, &program_id, &position.reward_mint)?;
                    let (reward_source, _) =
                        reward_source(&rpc_client, &program_id, &global_config, &pool)?;
                    let ixs = claimable_instr(&drip_config, position_key, &position, reward_source)?;
                    let reward: ClaimableReward =
                        simulate_return_data(&rpc_client, &ixs, &payer.pubkey())?;
                    vec![reward]
                }
                None => {
                    let assets = fetch_asset_configs(&rpc_client, &program_id)?;
                    let mut positions = fetch_positions(&rpc_client, &program_id, &user)?;
                    if let Some(asset) = asset {
                        let asset_config = get_asset_config_address(&program_id, &asset);
                        positions.retain(|(_, position)| position.asset_config == asset_config);
                    }
                    let balances =
                        reward_balances(&rpc_client, &program_id, &global_config, &positions)?;
                    let now = cluster_now(&rpc_client)?;
                    views::claimable_batch(&positions, &assets, &balances, now)?
                }
            };
            if opts.json {
                let rows: Vec<ClaimableRow> = rewards.iter().map(ClaimableRow::from).collect();
                print_json(&rows)?;
            } else {
                for reward in &rewards {
                    let line = format!(
                        "{} reward {} claimable {} of {}",
                        reward.stake_id, reward.reward_mint, reward.amount, reward.accrued
                    );
                    if reward.amount < reward.accrued {
                        println!("{}", line.as_str().yellow());
                    } else {
                        println!("{}", line);
                    }
                }
            }
        }
        DripCommands::Staked { user } => {
            let user = user.unwrap_or_else(|| payer.pubkey());
            let assets = fetch_asset_configs(&rpc_client, &program_id)?;
            let positions = fetch_positions(&rpc_client, &program_id, &user)?;
            let staked = views::staked(&positions, &assets);
            if opts.json {
                let rows: Vec<serde_json::Value> = staked
                    .iter()
                    .map(|entry| {
                        serde_json::json!({
                            "asset": entry.asset.to_string(),
                            "stake_id": entry.stake_id.to_string(),
                            "kind": kind_name(entry.kind),
                            "amount": entry.amount,
                            "staked_at": entry.staked_at,
                            "last_claim_at": entry.last_claim_at,
                        })
                    })
                    .collect();
                print_json(&rows)?;
            } else {
                for entry in &staked {
                    println!(
                        "{} {} {} amount {} since {} last claim {}",
                        kind_name(entry.kind),
                        entry.asset,
                        entry.stake_id,
                        entry.amount,
                        entry.staked_at,
                        entry.last_claim_at
                    );
                }
            }
        }
        DripCommands::StakeIds {
            collection_mint,
            user,
        } => {
            let user = user.unwrap_or_else(|| payer.pubkey());
            let positions = fetch_positions(&rpc_client, &program_id, &user)?;
            let ids = views::stake_ids(
                &positions,
                &get_asset_config_address(&program_id, &collection_mint),
            );
            if opts.json {
                let ids: Vec<String> = ids.iter().map(Pubkey::to_string).collect();
                print_json(&ids)?;
            } else {
                for id in ids {
                    println!("{}", id);
                }
            }
        }
        DripCommands::RewardHistory { user } => {
            let user = user.unwrap_or_else(|| payer.pubkey());
            let history = fetch_reward_history(&rpc_client, &program_id, &user)?;
            let (mints, amounts) = history.reward_totals();
            if opts.json {
                let totals: Vec<serde_json::Value> = history
                    .totals
                    .iter()
                    .map(|total| {
                        serde_json::json!({
                            "reward_mint": total.reward_mint.to_string(),
                            "total_claimed": total.total_claimed,
                            "total_forfeited": total.total_forfeited,
                        })
                    })
                    .collect();
                print_json(&serde_json::json!({
                    "owner": user.to_string(),
                    "open_positions": history.open_positions,
                    "claim_count": history.claim_count,
                    "last_claim_at": history.last_claim_at,
                    "totals": totals,
                }))?;
            } else {
                println!(
                    "{} claims, {} open positions, last claim at {}",
                    history.claim_count, history.open_positions, history.last_claim_at
                );
                for (mint, amount) in mints.iter().zip(amounts) {
                    println!("{} {}", mint, amount);
                }
            }
        }
        DripCommands::Asset { mint } => {
            let asset = fetch_asset_config(&rpc_client, &program_id, &mint)?;
            let row = asset_row(&asset)?;
            if opts.json {
                print_json(&row)?;
            } else {
                let permitted = if row.permitted {
                    "permitted".green()
                } else {
                    "revoked".red()
                };
                println!("{} {} {}", row.kind, row.asset, permitted);
                println!("drip token:   {}", row.drip_token);
                println!("drip rate:    {} per day", row.drip_rate);
                println!("staked:       {} in {} positions", row.staked, row.open_positions);
                println!("reward rate:  {} per unit per day (x1e12)", row.reward_rate);
            }
        }
        DripCommands::Assets {} => {
            let assets = fetch_asset_configs(&rpc_client, &program_id)?;
            let rows = assets
                .values()
                .map(asset_row)
                .collect::<Result<Vec<AssetRow>>>()?;
            if opts.json {
                print_json(&rows)?;
            } else {
                for row in &rows {
                    println!(
                        "{} {} drip {} of {} per day, staked {}{}",
                        row.kind,
                        row.asset,
                        row.drip_rate,
                        row.drip_token,
                        row.staked,
                        if row.permitted { "" } else { " (revoked)" }
                    );
                }
            }
        }
    }
    Ok(())
}
