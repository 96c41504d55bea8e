//! Status and role enums.

use serde::{Deserialize, Serialize};

/// Settlement state of a purchase.
///
/// A purchase starts `Pending` when a gateway order is created and moves to
/// exactly one of `Success` or `Failed` when the signed settlement
/// notification arrives. Both of those states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "purchase_status", rename_all = "snake_case")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

impl PurchaseStatus {
    /// Whether no further transitions are allowed out of this state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    /// Whether a transition from `self` to `next` is allowed.
    ///
    /// Only `Pending -> Success` and `Pending -> Failed` are valid; terminal
    /// states accept nothing, including themselves (replayed settlements are
    /// handled as no-ops above this level, not as transitions).
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Success) | (Self::Pending, Self::Failed)
        )
    }
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Success => write!(f, "SUCCESS"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// The outcome reported by a settlement notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementOutcome {
    Captured,
    Failed,
}

impl SettlementOutcome {
    /// The terminal purchase status this outcome settles to.
    #[must_use]
    pub const fn final_status(&self) -> PurchaseStatus {
        match self {
            Self::Captured => PurchaseStatus::Success,
            Self::Failed => PurchaseStatus::Failed,
        }
    }
}

/// Account role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "account_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    /// Regular learner account. Default for accounts mirrored from the
    /// auth provider.
    #[default]
    User,
    /// Full access to catalog, blog, and account administration.
    Admin,
}

impl AccountRole {
    /// Whether this role may use the admin API.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for AccountRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid account role: {s}")),
        }
    }
}
