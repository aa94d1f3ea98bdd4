use crate::error::ErrorCode;
use crate::instructions::SettleAccounts;
use crate::states::*;
use crate::utils::current_timestamp;
use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

/// Remaining accounts supplied per position, in this order:
/// position, asset_config, reward_pool, reward_source, reward_mint,
/// owner_reward_token, collateral_vault.
///
/// `collateral_vault` is only read when the claim restakes; NFT positions
/// may pass any account in that slot.
pub const CLAIM_ALL_GROUP_LEN: usize = 7;

/// Number of position groups in `account_count` remaining accounts. The
/// groups must cover exactly the owner's `open_positions`.
pub fn position_group_count(account_count: usize, open_positions: u32) -> Result<usize> {
    require!(
        account_count % CLAIM_ALL_GROUP_LEN == 0,
        ErrorCode::MissingRemainingAccount
    );
    let group_count = account_count / CLAIM_ALL_GROUP_LEN;
    require!(
        u32::try_from(group_count).ok() == Some(open_positions),
        ErrorCode::IncompletePositionSet
    );
    Ok(group_count)
}

/// Marks `position` as settled in this call. A repeated position would leave
/// another one out, so it fails like a short list.
pub fn mark_settled(settled: &mut Vec<Pubkey>, position: Pubkey) -> Result<()> {
    require!(
        !settled.contains(&position),
        ErrorCode::IncompletePositionSet
    );
    settled.push(position);
    Ok(())
}

/// Accounts context for `claim_all`. Positions arrive through
/// `remaining_accounts`; every open position of the owner must be present.
#[derive(Accounts)]
pub struct ClaimAll<'info> {
    pub owner: Signer<'info>,

    #[account(
        seeds = [GLOBAL_CONFIG_SEED.as_bytes()],
        bump = global_config.bump,
    )]
    pub global_config: Account<'info, GlobalConfig>,

    /// CHECK: PDA derivation enforced by seeds; signs reward transfers.
    #[account(
        seeds = [crate::AUTH_SEED.as_bytes()],
        bump,
    )]
    pub authority: UncheckedAccount<'info>,

    #[account(
        mut,
        seeds = [REWARD_HISTORY_SEED.as_bytes(), owner.key().as_ref()],
        bump = reward_history.bump,
    )]
    pub reward_history: Account<'info, RewardHistory>,

    pub token_program: Interface<'info, TokenInterface>,
}

/// Settles every open position of the owner, in the order supplied.
///
/// Positions sharing a reward token draw on the same balance one after the
/// other, so a late position may be capped where an earlier one was paid in
/// full. Each group is written back before the next is loaded, which keeps
/// shared asset and pool accounts consistent.
pub fn claim_all<'info>(
    mut ctx: Context<'_, '_, 'info, 'info, ClaimAll<'info>>,
    restake: bool,
) -> Result<()> {
    let remaining = ctx.remaining_accounts;
    let group_count =
        position_group_count(remaining.len(), ctx.accounts.reward_history.open_positions)?;

    let now = current_timestamp()?;
    let owner = ctx.accounts.owner.key();
    let mut seen: Vec<Pubkey> = Vec::with_capacity(group_count);

    for group in remaining.chunks_exact(CLAIM_ALL_GROUP_LEN) {
        let mut position: Account<'info, StakePosition> = Account::try_from(&group[0])?;
        require_keys_eq!(position.owner, owner, ErrorCode::NotOwner);
        mark_settled(&mut seen, position.key())?;

        let mut asset_config: Account<'info, AssetConfig> = Account::try_from(&group[1])?;
        require_keys_eq!(
            asset_config.key(),
            position.asset_config,
            ErrorCode::PositionMismatch
        );
        let mut reward_pool: Account<'info, RewardPool> = Account::try_from(&group[2])?;
        require_keys_eq!(
            reward_pool.reward_mint,
            position.reward_mint,
            ErrorCode::PositionMismatch
        );

        let reward_source: InterfaceAccount<'info, TokenAccount> =
            InterfaceAccount::try_from(&group[3])?;
        require!(
            ctx.accounts.global_config.is_reward_source(
                &reward_pool.reward_vault,
                &reward_pool.reward_mint,
                &reward_source.key(),
                &reward_source.owner,
                &reward_source.mint,
            ),
            ErrorCode::InvalidRewardSource
        );
        let reward_mint: InterfaceAccount<'info, Mint> = InterfaceAccount::try_from(&group[4])?;
        require_keys_eq!(
            reward_mint.key(),
            position.reward_mint,
            ErrorCode::PositionMismatch
        );
        let owner_reward_token: InterfaceAccount<'info, TokenAccount> =
            InterfaceAccount::try_from(&group[5])?;
        require_keys_eq!(owner_reward_token.owner, owner, ErrorCode::NotOwner);
        require_keys_eq!(
            owner_reward_token.mint,
            position.reward_mint,
            ErrorCode::PositionMismatch
        );
        let collateral_vault = (group[6].key() == asset_config.collateral_vault)
            .then(|| group[6].clone());

        let position_key = position.key();
        let compound = restake || position.auto_compound;
        SettleAccounts {
            global_config: &ctx.accounts.global_config,
            position_key,
            ledger: PositionLedger {
                position: &mut position,
                asset_config: &mut asset_config,
                reward_pool: &mut reward_pool,
                reward_history: &mut ctx.accounts.reward_history,
            },
            authority: ctx.accounts.authority.to_account_info(),
            reward_source: &reward_source,
            reward_mint: &reward_mint,
            owner_reward_token: owner_reward_token.to_account_info(),
            collateral_vault,
            token_program: ctx.accounts.token_program.to_account_info(),
            authority_bump: ctx.bumps.authority,
        }
        .settle(compound, now)?;

        position.exit(&crate::ID)?;
        asset_config.exit(&crate::ID)?;
        reward_pool.exit(&crate::ID)?;
    }
    msg!("Claimed {} positions", group_count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_lang::error::Error;

    fn code(err: Error) -> u32 {
        match err {
            Error::AnchorError(e) => e.error_code_number,
            Error::ProgramError(_) => u32::MAX,
        }
    }

    #[test]
    fn groups_must_cover_every_open_position() {
        assert_eq!(position_group_count(0, 0).unwrap(), 0);
        assert_eq!(position_group_count(3 * CLAIM_ALL_GROUP_LEN, 3).unwrap(), 3);

        let short = position_group_count(2 * CLAIM_ALL_GROUP_LEN, 3).unwrap_err();
        assert_eq!(code(short), u32::from(ErrorCode::IncompletePositionSet));
        let extra = position_group_count(4 * CLAIM_ALL_GROUP_LEN, 3).unwrap_err();
        assert_eq!(code(extra), u32::from(ErrorCode::IncompletePositionSet));
    }

    #[test]
    fn partial_group_is_a_missing_account() {
        let err = position_group_count(CLAIM_ALL_GROUP_LEN + 1, 1).unwrap_err();
        assert_eq!(code(err), u32::from(ErrorCode::MissingRemainingAccount));
    }

    #[test]
    fn repeated_position_is_rejected() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let mut settled = Vec::new();
        mark_settled(&mut settled, a).unwrap();
        mark_settled(&mut settled, b).unwrap();

        // [a, b, a] has the right count for three positions but misses one
        let err = mark_settled(&mut settled, a).unwrap_err();
        assert_eq!(code(err), u32::from(ErrorCode::IncompletePositionSet));
        assert_eq!(settled, vec![a, b]);
    }
}
