use anchor_lang::AnchorDeserialize;
use anyhow::{format_err, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use solana_client::{
    rpc_client::RpcClient,
    rpc_config::{RpcSendTransactionConfig, RpcSimulateTransactionConfig},
};
use solana_sdk::{
    commitment_config::CommitmentConfig, instruction::Instruction, pubkey::Pubkey,
    signature::Signature, transaction::Transaction,
};
use solana_transaction_status::UiReturnDataEncoding;

pub fn send_txn(client: &RpcClient, txn: &Transaction, wait_confirm: bool) -> Result<Signature> {
    Ok(client.send_and_confirm_transaction_with_spinner_and_config(
        txn,
        if wait_confirm {
            CommitmentConfig::confirmed()
        } else {
            CommitmentConfig::processed()
        },
        RpcSendTransactionConfig {
            skip_preflight: false,
            ..RpcSendTransactionConfig::default()
        },
    )?)
}

/// Runs a read-only instruction through `simulateTransaction` and decodes
/// the value the program wrote to return data.
pub fn simulate_return_data<T: AnchorDeserialize>(
    client: &RpcClient,
    instructions: &[Instruction],
    payer: &Pubkey,
) -> Result<T> {
    let txn = Transaction::new_with_payer(instructions, Some(payer));
    let result = client
        .simulate_transaction_with_config(
            &txn,
            RpcSimulateTransactionConfig {
                sig_verify: false,
                replace_recent_blockhash: true,
                commitment: Some(CommitmentConfig::confirmed()),
                ..RpcSimulateTransactionConfig::default()
            },
        )?
        .value;
    if let Some(err) = result.err {
        return Err(format_err!(
            "simulation failed: {}\n{}",
            err,
            result.logs.unwrap_or_default().join("\n")
        ));
    }
    let return_data = result
        .return_data
        .ok_or_else(|| format_err!("program returned no data"))?;
    let (data, encoding) = return_data.data;
    if encoding != UiReturnDataEncoding::Base64 {
        return Err(format_err!("unexpected return data encoding {:?}", encoding));
    }
    let bytes = STANDARD.decode(data)?;
    T::deserialize(&mut bytes.as_slice()).map_err(Into::into)
}
