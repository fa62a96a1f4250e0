//! Status enums for vouchers and trade-in requests.

use serde::{Deserialize, Serialize};

/// Voucher claim lifecycle for one (customer, program) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    #[default]
    Unclaimed,
    /// A claim request is in flight.
    Claiming,
    Claimed,
}

impl std::fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unclaimed => write!(f, "unclaimed"),
            Self::Claiming => write!(f, "claiming"),
            Self::Claimed => write!(f, "claimed"),
        }
    }
}

/// Condition of a used product offered for trade-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceCondition {
    /// No visible wear.
    LikeNew,
    /// Light scratches.
    Good,
    /// Visible wear, fully functional.
    Fair,
    /// Broken hinge, cracked lens or similar.
    Damaged,
}

impl DeviceCondition {
    /// Every condition, best first.
    pub const ALL: &'static [Self] = &[Self::LikeNew, Self::Good, Self::Fair, Self::Damaged];

    /// Share of the base appraisal value credited, in percent.
    #[must_use]
    pub const fn credit_percent(self) -> u8 {
        match self {
            Self::LikeNew => 100,
            Self::Good => 70,
            Self::Fair => 45,
            Self::Damaged => 15,
        }
    }

    /// URL / form slug.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::LikeNew => "like-new",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Damaged => "damaged",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::LikeNew => "Như mới",
            Self::Good => "Tốt",
            Self::Fair => "Trung bình",
            Self::Damaged => "Hư hỏng",
        }
    }
}

impl std::str::FromStr for DeviceCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.slug() == s.trim())
            .ok_or_else(|| format!("invalid condition: {s}"))
    }
}
