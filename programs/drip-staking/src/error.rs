use anchor_lang::prelude::*;

#[error_code]
pub enum ErrorCode {
    #[msg("Asset or reward token is not permitted")]
    NotPermitted,

    /// Raised for an asset or reward pool account that exists but carries no
    /// terms. A fungible mint that was never configured has no asset account
    /// at all, so `stake` fails earlier with Anchor's `AccountNotInitialized`
    /// (3012); clients should report both as "not configured".
    #[msg("Asset or reward token is not configured")]
    NotConfigured,

    #[msg("Amount must be greater than zero and within the staked balance")]
    InvalidAmount,

    #[msg("Signer does not own this position")]
    NotOwner,

    #[msg("Minimum staking time has not elapsed")]
    TooEarly,

    #[msg("Signer is not an admin")]
    InvalidOwner,

    #[msg("Invalid parameter provided")]
    InvalidParam,

    #[msg("Missing remaining account")]
    MissingRemainingAccount,

    #[msg("Math operation overflowed or underflowed")]
    MathOverflow,

    #[msg("Invalid timestamp conversion")]
    InvalidTimestamp,

    #[msg("Reward token cannot change while positions are open")]
    RewardTokenImmutable,

    #[msg("Reward source account does not match the funding mode")]
    InvalidRewardSource,

    #[msg("NFT is not a verified member of the collection")]
    InvalidCollection,

    #[msg("Asset kind does not match the instruction")]
    InvalidAssetKind,

    #[msg("Invalid vault account")]
    InvalidVault,

    #[msg("Account does not belong to this position")]
    PositionMismatch,

    #[msg("Every open position must be supplied")]
    IncompletePositionSet,

    #[msg("Reward history cannot track more reward tokens")]
    RewardHistoryFull,
}
