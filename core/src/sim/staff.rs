use serde::{Deserialize, Serialize};

use super::customer::WealthTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRank {
    Student,
    Newbie,
    Regular,
    Veteran,
    Pro,
}

impl StaffRank {
    pub fn success_rate(self, wealth: WealthTier) -> f64 {
        use StaffRank::*;
        use WealthTier::*;
        match (wealth, self) {
            (Poorest, _) => 1.00,
            (Poor, Student) => 0.80,
            (Poor, _) => 1.00,
            (Normal, Student) => 0.60,
            (Normal, Newbie) => 0.80,
            (Normal, _) => 1.00,
            (Rich, Student) => 0.40,
            (Rich, Newbie) => 0.60,
            (Rich, Regular) => 0.80,
            (Rich, _) => 1.00,
            (Richest, Student) => 0.20,
            (Richest, Newbie) => 0.40,
            (Richest, Regular) => 0.60,
            (Richest, Veteran) => 0.80,
            (Richest, Pro) => 1.00,
        }
    }

    pub fn review_multiplier(self) -> f64 {
        match self {
            StaffRank::Student => 0.90,
            StaffRank::Newbie => 0.95,
            StaffRank::Regular => 1.00,
            StaffRank::Veteran => 1.05,
            StaffRank::Pro => 1.10,
        }
    }

    pub fn daily_wage(self) -> i64 {
        match self {
            StaffRank::Student => 80,
            StaffRank::Newbie => 100,
            StaffRank::Regular => 150,
            StaffRank::Veteran => 200,
            StaffRank::Pro => 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Staff {
    rank: StaffRank,
}

impl Staff {
    pub fn new(rank: StaffRank) -> Self {
        Self { rank }
    }

    pub fn rank(&self) -> StaffRank {
        self.rank
    }

    pub(crate) fn promote_to(&mut self, rank: StaffRank) {
        self.rank = rank;
    }

    pub fn success_rate(&self, wealth: WealthTier) -> f64 {
        self.rank.success_rate(wealth)
    }

    pub fn review_multiplier(&self) -> f64 {
        self.rank.review_multiplier()
    }

    pub fn daily_wage(&self) -> i64 {
        self.rank.daily_wage()
    }
}
