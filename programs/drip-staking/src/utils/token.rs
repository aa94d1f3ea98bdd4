use crate::states::GlobalConfig;
use anchor_lang::prelude::*;
use anchor_lang::solana_program::program_option::COption;
use anchor_spl::token_interface::{self, CloseAccount, TokenAccount, TransferChecked};

pub fn transfer_from_user_to_vault<'a>(
    authority: AccountInfo<'a>,
    from: AccountInfo<'a>,
    to_vault: AccountInfo<'a>,
    mint: AccountInfo<'a>,
    token_program: AccountInfo<'a>,
    amount: u64,
    mint_decimals: u8,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    token_interface::transfer_checked(
        CpiContext::new(
            token_program,
            TransferChecked {
                from,
                to: to_vault,
                authority,
                mint,
            },
        ),
        amount,
        mint_decimals,
    )
}

/// Moves tokens out of an account the program authority controls, either
/// as owner (program vaults) or as delegate (the reward wallet).
#[allow(clippy::too_many_arguments)]
pub fn transfer_from_vault_to_user<'a>(
    authority: AccountInfo<'a>,
    from_vault: AccountInfo<'a>,
    to: AccountInfo<'a>,
    mint: AccountInfo<'a>,
    token_program: AccountInfo<'a>,
    amount: u64,
    mint_decimals: u8,
    signer_seeds: &[&[&[u8]]],
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    token_interface::transfer_checked(
        CpiContext::new_with_signer(
            token_program,
            TransferChecked {
                from: from_vault,
                to,
                authority,
                mint,
            },
            signer_seeds,
        ),
        amount,
        mint_decimals,
    )
}

/// Closes an emptied program vault, returning its rent to `destination`.
pub fn close_vault<'a>(
    authority: AccountInfo<'a>,
    vault: AccountInfo<'a>,
    destination: AccountInfo<'a>,
    token_program: AccountInfo<'a>,
    signer_seeds: &[&[&[u8]]],
) -> Result<()> {
    token_interface::close_account(CpiContext::new_with_signer(
        token_program,
        CloseAccount {
            account: vault,
            destination,
            authority,
        },
        signer_seeds,
    ))
}

/// Reward balance `source` can fund under the configured funding mode.
pub fn available_rewards(
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
