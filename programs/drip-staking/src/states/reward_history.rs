use crate::drip::Settlement;
use crate::error::ErrorCode;
use anchor_lang::prelude::*;

//
// ──────────────────────────────────────────────────────────────────────────────
// RewardHistory Account
// ──────────────────────────────────────────────────────────────────────────────
//

/// PDA seed string used to derive a user's reward history.
/// Seeds: `REWARD_HISTORY_SEED + owner`.
pub const REWARD_HISTORY_SEED: &str = "reward_history";

/// Distinct reward tokens one user can accumulate totals for.
pub const MAX_REWARD_TOKENS: usize = 16;

/// Running totals for one reward token.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewardTotal {
    pub reward_mint: Pubkey,
    pub total_claimed: u64,
    pub total_forfeited: u64,
}

/// Per-user ledger of realized claims.
///
/// Individual entries (`reward_mint`, amount, timestamp) are emitted as
/// `RewardClaimed` events; this account keeps the cumulative totals grouped
/// by reward token and the number of positions the user still has open.
/// Totals only ever grow.
#[account]
#[derive(Default, Debug)]
pub struct RewardHistory {
    /// PDA bump for this account.
    pub bump: u8,

    /// User the history belongs to.
    pub owner: Pubkey,

    /// Positions currently open for `owner`.
    pub open_positions: u32,

    /// Number of settlements that paid something.
    pub claim_count: u64,

    /// UNIX timestamp of the last paying settlement.
    pub last_claim_at: u64,

    /// Totals per reward token, in first-claim order.
    pub totals: Vec<RewardTotal>,
}

impl RewardHistory {
    /// Fixed serialized size of the account (for allocation at initialization).
    ///
    /// Breakdown:
    /// - 8: account discriminator
    /// - 1: bump
    /// - 32: owner
    /// - 4: open positions
    /// - 8 * 2: claim count, timestamp
    /// - 4 + MAX_REWARD_TOKENS * (32 + 8 + 8): totals vector
    pub const LEN: usize = 8 + 1 + 32 + 4 + 8 * 2 + 4 + MAX_REWARD_TOKENS * (32 + 8 + 8);

    pub fn open_position(&mut self) -> Result<()> {
        self.open_positions = self
            .open_positions
            .checked_add(1)
            .ok_or(ErrorCode::MathOverflow)?;
        Ok(())
    }

    pub fn close_position(&mut self) -> Result<()> {
        self.open_positions = self
            .open_positions
            .checked_sub(1)
            .ok_or(ErrorCode::MathOverflow)?;
        Ok(())
    }

    pub fn has_open_positions(&self) -> bool {
        self.open_positions > 0
    }

    /// Adds a settlement to the totals of its reward token.
    ///
    /// Forfeit totals saturate, and a pure forfeit for a token that no longer
    /// fits the history is dropped, so recording never blocks an exit.
    pub fn record(&mut self, reward_mint: Pubkey, settlement: &Settlement, now: u64) -> Result<()> {
        if settlement.accrued == 0 {
            return Ok(());
        }
        let index = match self.totals.iter().position(|t| t.reward_mint == reward_mint) {
            Some(index) => index,
            None if settlement.paid == 0 && self.totals.len() >= MAX_REWARD_TOKENS => {
                return Ok(());
            }
            None => {
                require!(
                    self.totals.len() < MAX_REWARD_TOKENS,
                    ErrorCode::RewardHistoryFull
                );
                self.totals.push(RewardTotal {
                    reward_mint,
                    ..RewardTotal::default()
                });
                self.totals.len() - 1
            }
        };
        let total = &mut self.totals[index];
        total.total_claimed = total
            .total_claimed
            .checked_add(settlement.paid)
            .ok_or(ErrorCode::MathOverflow)?;
        total.total_forfeited = total.total_forfeited.saturating_add(settlement.forfeited);

        if settlement.paid > 0 {
            self.claim_count = self.claim_count.checked_add(1).ok_or(ErrorCode::MathOverflow)?;
            self.last_claim_at = self.last_claim_at.max(now);
        }
        Ok(())
    }

    /// Claimed totals grouped by reward token: `(tokens, totals)`.
    pub fn reward_totals(&self) -> (Vec<Pubkey>, Vec<u64>) {
        self.totals
            .iter()
            .map(|t| (t.reward_mint, t.total_claimed))
            .unzip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drip::DripCalculator;

    #[test]
    fn totals_group_by_reward_token() {
        let mut history = RewardHistory::default();
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();

        history.record(a, &DripCalculator::settle(100, u64::MAX), 10).unwrap();
        history.record(b, &DripCalculator::settle(50, 20), 20).unwrap();
        history.record(a, &DripCalculator::settle(25, u64::MAX), 30).unwrap();

        let (tokens, totals) = history.reward_totals();
        assert_eq!(tokens, vec![a, b]);
        assert_eq!(totals, vec![125, 20]);
        assert_eq!(history.totals[1].total_forfeited, 30);
        assert_eq!(history.claim_count, 3);
        assert_eq!(history.last_claim_at, 30);
    }

    #[test]
    fn empty_settlements_leave_no_trace() {
        let mut history = RewardHistory::default();
        history
            .record(Pubkey::new_unique(), &DripCalculator::settle(0, 100), 10)
            .unwrap();
        assert!(history.totals.is_empty());
        assert_eq!(history.claim_count, 0);
    }

    #[test]
    fn fully_forfeited_settlement_is_not_a_claim() {
        let mut history = RewardHistory::default();
        let mint = Pubkey::new_unique();
        history.record(mint, &DripCalculator::settle(70, 0), 10).unwrap();
        assert_eq!(history.claim_count, 0);
        assert_eq!(history.totals[0].total_forfeited, 70);
    }

    #[test]
    fn capacity_is_bounded() {
        let mut history = RewardHistory::default();
        for _ in 0..MAX_REWARD_TOKENS {
            history
                .record(Pubkey::new_unique(), &DripCalculator::settle(1, 1), 1)
                .unwrap();
        }
        assert!(history
            .record(Pubkey::new_unique(), &DripCalculator::settle(1, 1), 1)
            .is_err());

        // an exit that only forfeits still goes through
        history
            .record(Pubkey::new_unique(), &DripCalculator::settle(u64::MAX, 0), 2)
            .unwrap();
        assert_eq!(history.totals.len(), MAX_REWARD_TOKENS);
    }

    #[test]
    fn forfeit_totals_saturate() {
        let mut history = RewardHistory::default();
        let mint = Pubkey::new_unique();
        history.record(mint, &DripCalculator::settle(u64::MAX, 0), 1).unwrap();
        history.record(mint, &DripCalculator::settle(u64::MAX, 0), 2).unwrap();
        assert_eq!(history.totals[0].total_forfeited, u64::MAX);
    }

    #[test]
    fn open_position_counter() {
        let mut history = RewardHistory::default();
        assert!(!history.has_open_positions());
        history.open_position().unwrap();
        assert!(history.has_open_positions());
        history.close_position().unwrap();
        assert!(!history.has_open_positions());
        assert!(history.close_position().is_err());
    }
}
