//! Drip accrual calculations

use crate::drip::{MIN_FLAT_ACCRUAL_SECONDS, U256};
use crate::{PRECISION, SECONDS_PER_DAY};

/// How an asset turns elapsed time into reward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DripSchedule {
    /// Fungible pool: a fixed daily amount shared pro rata by everything
    /// staked in the asset, tracked through a reward-per-token index.
    Pooled {
        /// Units staked by the position.
        amount: u64,
        /// Current pool index, scaled by `PRECISION`.
        reward_per_token: u128,
        /// Index at the position's last checkpoint.
        checkpoint: u128,
    },
    /// Non-fungible stake: a fixed daily rate per token.
    Flat {
        /// Reward per day for one staked token.
        rate_per_day: u64,
        /// Seconds since the last settlement.
        elapsed: u64,
    },
}

impl DripSchedule {
    /// Reward accrued under this schedule, truncated toward zero and
    /// saturating at `u64::MAX`.
    pub fn accrued(&self) -> u64 {
        match *self {
            DripSchedule::Pooled {
                amount,
                reward_per_token,
                checkpoint,
            } => DripCalculator::pooled_reward(amount, reward_per_token, checkpoint),
            DripSchedule::Flat {
                rate_per_day,
                elapsed,
            } => DripCalculator::flat_reward(rate_per_day, elapsed),
        }
    }
}

/// Encodes the result of settling a position against the reward balance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Settlement {
    /// Reward accrued since the last settlement, before capping
    pub accrued: u64,
    /// Amount transferred to the owner (or restaked)
    pub paid: u64,
    /// Accrued reward the pool could not fund; dropped, never carried forward
    pub forfeited: u64,
}

/// One advance of a pooled reward-per-token index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexStep {
    /// Amount added to the index, scaled by `PRECISION`.
    pub delta: u128,
    /// Truncated part of the emission, carried into the next step.
    pub remainder: u128,
}

fn saturate_u128(value: U256) -> u128 {
    if value > U256::from(u128::MAX) {
        u128::MAX
    } else {
        value.as_u128()
    }
}

fn saturate_u64(value: U256) -> u64 {
    if value > U256::from(u64::MAX) {
        u64::MAX
    } else {
        value.as_u64()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DripCalculator {}

impl DripCalculator {
    /// Seconds between `since` and `now`. A clock that appears to run
    /// backwards yields zero.
    pub fn elapsed(now: u64, since: u64) -> u64 {
        now.saturating_sub(since)
    }

    /// Growth of a pooled asset's reward-per-token index over `elapsed`
    /// seconds:
    ///
    /// (rate_per_day * elapsed * PRECISION + carry) / (SECONDS_PER_DAY * total_staked)
    ///
    /// `carry` is the remainder left by the previous step. It is denominated
    /// in reward * PRECISION * seconds, so it stays valid when `total_staked`
    /// changes between steps. An empty pool keeps the carry untouched.
    pub fn reward_per_token_delta(
        rate_per_day: u64,
        elapsed: u64,
        total_staked: u64,
        carry: u128,
    ) -> IndexStep {
        if total_staked == 0 {
            return IndexStep {
                delta: 0,
                remainder: carry,
            };
        }
        // at most u64::MAX^2 * PRECISION + u128::MAX, far inside U256
        let numerator = U256::from(rate_per_day) * U256::from(elapsed) * U256::from(PRECISION)
            + U256::from(carry);
        let denominator = U256::from(SECONDS_PER_DAY) * U256::from(total_staked);
        let (quotient, remainder) = numerator.div_mod(denominator);
        IndexStep {
            delta: saturate_u128(quotient),
            // below SECONDS_PER_DAY * u64::MAX
            remainder: remainder.as_u128(),
        }
    }

    /// Reward owed to `amount` staked units between two index values. A
    /// checkpoint ahead of the index owes nothing.
    pub fn pooled_reward(amount: u64, reward_per_token: u128, checkpoint: u128) -> u64 {
        let delta = reward_per_token.saturating_sub(checkpoint);
        let reward = U256::from(amount) * U256::from(delta) / U256::from(PRECISION);
        saturate_u64(reward)
    }

    /// Reward for one non-fungible token staked at `rate_per_day`.
    ///
    /// Nothing is claimable before a full day has elapsed; after that the
    /// reward accrues per second.
    pub fn flat_reward(rate_per_day: u64, elapsed: u64) -> u64 {
        if elapsed < MIN_FLAT_ACCRUAL_SECONDS {
            return 0;
        }
        let reward = u128::from(rate_per_day) * u128::from(elapsed) / u128::from(SECONDS_PER_DAY);
        u64::try_from(reward).unwrap_or(u64::MAX)
    }

    /// Caps an accrued reward to what the pool can actually pay.
    pub fn settle(accrued: u64, available: u64) -> Settlement {
        let paid = accrued.min(available);
        Settlement {
            accrued,
            paid,
            forfeited: accrued - paid,
        }
    }

    /// Aggregate daily emission converted to a per-second rate, scaled by
    /// `PRECISION`.
    pub fn run_rate_per_second(run_rate_per_day: u128) -> Option<u128> {
        let rate = U256::from(run_rate_per_day)
            .checked_mul(U256::from(PRECISION))?
            .checked_div(U256::from(SECONDS_PER_DAY))?;
        u128::try_from(rate).ok()
    }

    /// Seconds the `available` balance sustains the aggregate daily rate.
    /// `None` when nothing is emitting.
    pub fn funded_seconds(run_rate_per_day: u128, available: u64) -> Option<u64> {
        if run_rate_per_day == 0 {
            return None;
        }
        let seconds = u128::from(available)
            .checked_mul(u128::from(SECONDS_PER_DAY))?
            .checked_div(run_rate_per_day)?;
        Some(u64::try_from(seconds).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DAY: u64 = SECONDS_PER_DAY;

    fn delta(rate: u64, elapsed: u64, total: u64) -> u128 {
        DripCalculator::reward_per_token_delta(rate, elapsed, total, 0).delta
    }

    #[test]
    fn single_staker_earns_whole_pool_rate() {
        let reward = DripCalculator::pooled_reward(10, delta(1_000_000, DAY, 10), 0);
        assert_eq!(reward, 1_000_000);
    }

    #[test]
    fn pooled_reward_is_proportional_share() {
        // 10 of 30 units staked for one day at 900/day
        let index = delta(900, DAY, 30);
        assert_eq!(DripCalculator::pooled_reward(10, index, 0), 300);
        assert_eq!(DripCalculator::pooled_reward(20, index, 0), 600);
    }

    #[test]
    fn pooled_reward_truncates() {
        // 1/3 of 100 over one day
        assert_eq!(DripCalculator::pooled_reward(1, delta(100, DAY, 3), 0), 33);
    }

    #[test]
    fn empty_pool_does_not_move_index() {
        assert_eq!(
            DripCalculator::reward_per_token_delta(1_000, DAY, 0, 7),
            IndexStep {
                delta: 0,
                remainder: 7
            }
        );
        assert_eq!(delta(1_000, 0, 5), 0);
    }

    #[test]
    fn checkpoint_ahead_of_index_owes_nothing() {
        assert_eq!(DripCalculator::pooled_reward(10, 5, 6), 0);
    }

    #[test]
    fn accrual_saturates_instead_of_overflowing() {
        // 1e18/day for 20 days over 10 units
        let rate = 1_000_000_000_000_000_000;
        let index = delta(rate, 20 * DAY, 10);
        assert_eq!(DripCalculator::pooled_reward(10, index, 0), u64::MAX);
        assert_eq!(DripCalculator::flat_reward(rate, 20 * DAY), u64::MAX);

        let step = DripCalculator::reward_per_token_delta(u64::MAX, u64::MAX, 1, 0);
        assert_eq!(step.delta, u128::MAX);
    }

    #[test]
    fn carried_remainder_pays_frequent_updates_in_full() {
        // 1e11/day over 1e18 units; per-second steps truncate most of each delta
        let rate = 100_000_000_000;
        let total = 1_000_000_000_000_000_000;
        let daily = delta(rate, DAY, total);

        let mut index = 0u128;
        let mut carry = 0u128;
        for _ in 0..DAY {
            let step = DripCalculator::reward_per_token_delta(rate, 1, total, carry);
            index += step.delta;
            carry = step.remainder;
        }
        assert_eq!(index, daily);
        assert_eq!(DripCalculator::pooled_reward(total, index, 0), 100_000_000_000);

        // without the carry the same updates pay 13.6% less
        let truncated = u128::from(DAY) * delta(rate, 1, total);
        assert_eq!(DripCalculator::pooled_reward(total, truncated, 0), 86_400_000_000);
    }

    #[test]
    fn flat_reward_waits_for_a_full_day() {
        let rate = 1_000_000_000;
        assert_eq!(DripCalculator::flat_reward(rate, DAY / 2), 0);
        assert_eq!(DripCalculator::flat_reward(rate, DAY - 1), 0);
        assert_eq!(DripCalculator::flat_reward(rate, DAY), rate);
        assert_eq!(DripCalculator::flat_reward(rate, DAY + DAY / 2), rate * 3 / 2);
    }

    #[test]
    fn settle_caps_to_available() {
        let s = DripCalculator::settle(500, 200);
        assert_eq!(
            s,
            Settlement {
                accrued: 500,
                paid: 200,
                forfeited: 300
            }
        );
        let s = DripCalculator::settle(500, 10_000);
        assert_eq!(s.paid, 500);
        assert_eq!(s.forfeited, 0);
    }

    #[test]
    fn runway_of_idle_pool() {
        assert_eq!(DripCalculator::run_rate_per_second(0), Some(0));
        assert_eq!(DripCalculator::funded_seconds(0, 1_000), None);
    }

    #[test]
    fn runway_of_active_pool() {
        // 86_400 per day is one unit per second
        assert_eq!(
            DripCalculator::run_rate_per_second(u128::from(DAY)),
            Some(PRECISION)
        );
        assert_eq!(
            DripCalculator::funded_seconds(u128::from(DAY), 3_600),
            Some(3_600)
        );
        assert_eq!(DripCalculator::funded_seconds(2 * u128::from(DAY), 1), Some(0));
    }

    #[test]
    fn elapsed_never_negative() {
        assert_eq!(DripCalculator::elapsed(10, 20), 0);
        assert_eq!(DripCalculator::elapsed(20, 10), 10);
    }

    #[test]
    fn schedule_dispatches_on_kind() {
        let pooled = DripSchedule::Pooled {
            amount: 10,
            reward_per_token: delta(100, DAY, 10),
            checkpoint: 0,
        };
        assert_eq!(pooled.accrued(), 100);
        let flat = DripSchedule::Flat {
            rate_per_day: 7,
            elapsed: 2 * DAY,
        };
        assert_eq!(flat.accrued(), 14);
    }

    proptest! {
        #[test]
        fn pooled_reward_never_exceeds_emission(
            rate in 1..u64::MAX / 4,
            elapsed in 0..(10 * 365 * DAY),
            total in 1..u64::MAX / 2,
            share in 0..=10_000u64,
        ) {
            let amount = (u128::from(total) * u128::from(share) / 10_000) as u64;
            let reward = DripCalculator::pooled_reward(amount, delta(rate, elapsed, total), 0);
            let entitled = U256::from(rate) * U256::from(elapsed) * U256::from(amount)
                / (U256::from(DAY) * U256::from(total));
            prop_assert!(U256::from(reward) <= entitled);
        }

        #[test]
        fn carried_split_matches_single_accrual(
            rate in 1..u64::MAX / 4,
            first in 0..(365 * DAY),
            second in 0..(365 * DAY),
            total in 1..1_000_000_000_000u64,
        ) {
            let a = DripCalculator::reward_per_token_delta(rate, first, total, 0);
            let b = DripCalculator::reward_per_token_delta(rate, second, total, a.remainder);
            let whole = DripCalculator::reward_per_token_delta(rate, first + second, total, 0);
            prop_assert_eq!(a.delta + b.delta, whole.delta);
            prop_assert_eq!(b.remainder, whole.remainder);
        }

        #[test]
        fn settlement_conserves_accrual(accrued: u64, available: u64) {
            let s = DripCalculator::settle(accrued, available);
            prop_assert_eq!(s.paid + s.forfeited, accrued);
            prop_assert!(s.paid <= available);
        }

        #[test]
        fn funded_seconds_is_covered_by_balance(
            rate in 1..u128::from(u64::MAX),
            available: u64,
        ) {
            let seconds = DripCalculator::funded_seconds(rate, available).unwrap();
            let spent = U256::from(rate) * U256::from(seconds) / U256::from(DAY);
            prop_assert!(spent <= U256::from(available));
        }
    }
}
