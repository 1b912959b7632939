//! Initial rating seeding from an externally reported rank
//!
//! Seven base tiers carry four divisions each and map to
//! `tier_index * 100 + division_bonus`; the three apex tiers map to fixed
//! values. Seeding is applied once, when a player with no rating links an
//! account.

use crate::error::BalancerError;
use crate::types::Rating;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Rating for players with no reported tier
pub const UNRANKED_RATING: Rating = 1000;

/// Skill tiers, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RankTier {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Emerald,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

impl RankTier {
    pub const ALL: [RankTier; 10] = [
        RankTier::Iron,
        RankTier::Bronze,
        RankTier::Silver,
        RankTier::Gold,
        RankTier::Platinum,
        RankTier::Emerald,
        RankTier::Diamond,
        RankTier::Master,
        RankTier::Grandmaster,
        RankTier::Challenger,
    ];

    /// Apex tiers have no divisions
    pub fn is_apex(self) -> bool {
        matches!(
            self,
            RankTier::Master | RankTier::Grandmaster | RankTier::Challenger
        )
    }

    /// 1-based position among the base tiers, `None` for apex tiers
    pub fn base_index(self) -> Option<u32> {
        match self {
            RankTier::Iron => Some(1),
            RankTier::Bronze => Some(2),
            RankTier::Silver => Some(3),
            RankTier::Gold => Some(4),
            RankTier::Platinum => Some(5),
            RankTier::Emerald => Some(6),
            RankTier::Diamond => Some(7),
            RankTier::Master | RankTier::Grandmaster | RankTier::Challenger => None,
        }
    }

    /// Initial rating for this tier; the division is ignored for apex tiers
    /// and counts as the lowest division when absent
    pub fn seed_rating(self, division: Option<Division>) -> Rating {
        match self {
            RankTier::Master => 800,
            RankTier::Grandmaster => 900,
            RankTier::Challenger => 1000,
            base => {
                let index = base.base_index().unwrap_or_default();
                index * 100 + division.map(Division::bonus).unwrap_or(0)
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RankTier::Iron => "IRON",
            RankTier::Bronze => "BRONZE",
            RankTier::Silver => "SILVER",
            RankTier::Gold => "GOLD",
            RankTier::Platinum => "PLATINUM",
            RankTier::Emerald => "EMERALD",
            RankTier::Diamond => "DIAMOND",
            RankTier::Master => "MASTER",
            RankTier::Grandmaster => "GRANDMASTER",
            RankTier::Challenger => "CHALLENGER",
        }
    }
}

impl std::fmt::Display for RankTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankTier {
    type Err = BalancerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        RankTier::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| BalancerError::invalid_input(format!("Unknown rank tier: {}", s)))
    }
}

/// Divisions within a base tier, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Division {
    I,
    II,
    III,
    IV,
}

impl Division {
    pub const ALL: [Division; 4] = [Division::I, Division::II, Division::III, Division::IV];

    /// Rating bonus on top of the tier base
    pub fn bonus(self) -> Rating {
        match self {
            Division::I => 75,
            Division::II => 50,
            Division::III => 25,
            Division::IV => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Division::I => "I",
            Division::II => "II",
            Division::III => "III",
            Division::IV => "IV",
        }
    }
}

impl std::fmt::Display for Division {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Division {
    type Err = BalancerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "I" | "1" => Ok(Division::I),
            "II" | "2" => Ok(Division::II),
            "III" | "3" => Ok(Division::III),
            "IV" | "4" => Ok(Division::IV),
            _ => Err(BalancerError::invalid_input(format!(
                "Unknown division: {}",
                s
            ))),
        }
    }
}

/// Initial rating for a player's reported rank; unranked yields 1000
pub fn seed_rating(tier: Option<RankTier>, division: Option<Division>) -> Rating {
    match tier {
        Some(tier) => tier.seed_rating(division),
        None => UNRANKED_RATING,
    }
}
