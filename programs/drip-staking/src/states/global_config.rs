use anchor_lang::prelude::*;

//
// ──────────────────────────────────────────────────────────────────────────────
// Global Configuration Account
// ──────────────────────────────────────────────────────────────────────────────
//

/// PDA seed string used to derive the global configuration account.
pub const GLOBAL_CONFIG_SEED: &str = "global_config";

/// Protocol-wide parameters shared by every asset and reward pool.
///
/// Created once by `initialise_configs` and tuned afterwards through
/// `update_config`.
#[account]
#[derive(Default, Debug)]
pub struct GlobalConfig {
    /// PDA bump for this account (for seed derivation).
    pub bump: u8,

    /// Current admin (authorized to configure assets and reward tokens).
    pub admin: Pubkey,

    /// Wallet that funds rewards through a delegated allowance.
    /// `Pubkey::default()` means rewards are paid from program-owned vaults.
    pub reward_wallet: Pubkey,

    /// Seconds a position must stay open before it can be unstaked.
    pub minimum_staking_time: u64,
}

impl GlobalConfig {
    /// Fixed serialized size of the account (for allocation at initialization).
    ///
    /// Breakdown:
    /// - 8: account discriminator
    /// - 1: bump
    /// - 32 * 2: two Pubkeys
    /// - 8: one u64 field
    pub const LEN: usize = 8 + 1 + 32 * 2 + 8;

    pub fn is_admin(&self, key: &Pubkey) -> bool {
        *key == self.admin || *key == crate::admin::id()
    }

    /// Whether rewards are drawn from an external wallet instead of the
    /// program-owned reward vaults.
    pub fn uses_reward_wallet(&self) -> bool {
        self.reward_wallet != Pubkey::default()
    }

    /// Checks that a token account is where rewards for `reward_mint` are
    /// paid from under the current funding mode.
    pub fn is_reward_source(
        &self,
        reward_vault: &Pubkey,
        reward_mint: &Pubkey,
        source_key: &Pubkey,
        source_owner: &Pubkey,
        source_mint: &Pubkey,
    ) -> bool {
        if self.uses_reward_wallet() {
            *source_owner == self.reward_wallet && source_mint == reward_mint
        } else {
            source_key == reward_vault
        }
    }

    /// Reward balance the program can actually move out of the source
    /// account. A reward wallet only counts up to the allowance it delegated
    /// to the program authority.
    pub fn available_rewards(
        &self,
        authority: &Pubkey,
        source_amount: u64,
        source_delegate: Option<Pubkey>,
        delegated_amount: u64,
    ) -> u64 {
        if !self.uses_reward_wallet() {
            return source_amount;
        }
        match source_delegate {
            Some(delegate) if delegate == *authority => source_amount.min(delegated_amount),
            _ => 0,
        }
    }

    pub fn can_unstake(&self, staked_at: u64, now: u64) -> bool {
        now.saturating_sub(staked_at) >= self.minimum_staking_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet_config(wallet: Pubkey) -> GlobalConfig {
        GlobalConfig {
            reward_wallet: wallet,
            ..GlobalConfig::default()
        }
    }

    #[test]
    fn vault_mode_uses_whole_balance() {
        let config = GlobalConfig::default();
        let authority = Pubkey::new_unique();
        assert_eq!(config.available_rewards(&authority, 500, None, 0), 500);
    }

    #[test]
    fn wallet_mode_is_bounded_by_allowance() {
        let authority = Pubkey::new_unique();
        let config = wallet_config(Pubkey::new_unique());
        assert_eq!(config.available_rewards(&authority, 500, Some(authority), 200), 200);
        assert_eq!(config.available_rewards(&authority, 100, Some(authority), 200), 100);
        assert_eq!(
            config.available_rewards(&authority, 500, Some(Pubkey::new_unique()), 200),
            0
        );
        assert_eq!(config.available_rewards(&authority, 500, None, 0), 0);
    }

    #[test]
    fn reward_source_follows_funding_mode() {
        let vault = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let wallet = Pubkey::new_unique();
        let other = Pubkey::new_unique();

        let vault_mode = GlobalConfig::default();
        assert!(vault_mode.is_reward_source(&vault, &mint, &vault, &other, &mint));
        assert!(!vault_mode.is_reward_source(&vault, &mint, &other, &other, &mint));

        let wallet_mode = wallet_config(wallet);
        assert!(wallet_mode.is_reward_source(&vault, &mint, &other, &wallet, &mint));
        assert!(!wallet_mode.is_reward_source(&vault, &mint, &vault, &other, &mint));
        assert!(!wallet_mode.is_reward_source(&vault, &mint, &other, &wallet, &other));
    }

    #[test]
    fn minimum_staking_time_gates_unstake() {
        let config = GlobalConfig {
            minimum_staking_time: 86_400,
            ..GlobalConfig::default()
        };
        assert!(!config.can_unstake(1_000, 1_000 + 86_399));
        assert!(config.can_unstake(1_000, 1_000 + 86_400));
        assert!(!config.can_unstake(1_000, 500));
    }
}
