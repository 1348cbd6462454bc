use anyhow::Result;
#[cfg(test)]
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::{
    advert::AdInstance,
    bootstrap::{SimulationBootstrap, SimulationBuilder},
    catalog::Catalog,
    constants::MAX_GRADE,
    day::{self, DayReport},
    loan::Loan,
    progression::{self, FinancingPlan, UpgradeOutcome},
    staff::Staff,
};

/// 実行オプション。状態には含まれない、1回のラン全体にかかる設定。
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_operating_seconds")]
    pub operating_seconds: u32,
    #[serde(default = "default_avg_treatment_seconds")]
    pub avg_treatment_seconds: u32,
    #[serde(default)]
    pub use_loans: bool,
    #[serde(default = "default_max_days")]
    pub max_days: u32,
    #[serde(default)]
    pub verbose: bool,
}

fn default_operating_seconds() -> u32 {
    600
}

fn default_avg_treatment_seconds() -> u32 {
    15
}

fn default_max_days() -> u32 {
    100
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            operating_seconds: default_operating_seconds(),
            avg_treatment_seconds: default_avg_treatment_seconds(),
            use_loans: false,
            max_days: default_max_days(),
            verbose: false,
        }
    }
}

/// 単一店舗の可変状態。Day-Cycle / Progression エンジンだけが書き換える。
#[derive(Debug, Clone)]
pub struct SalonState {
    pub(crate) grade: u8,
    pub(crate) money: i64,
    pub(crate) cumulative_review: i64,
    pub(crate) star_level: u32,
    pub(crate) attraction_level: i64,
    pub(crate) day: u32,
    pub(crate) tool_grade: u8,
    pub(crate) staff: Vec<Staff>,
    pub(crate) loans: Vec<Loan>,
    pub(crate) active_ads: Vec<AdInstance>,
    pub(crate) total_revenue: i64,
    pub(crate) total_expenses: i64,
    pub(crate) customers_served: u64,
}

impl SalonState {
    pub fn grade(&self) -> u8 {
        self.grade
    }

    pub fn money(&self) -> i64 {
        self.money
    }

    pub fn cumulative_review(&self) -> i64 {
        self.cumulative_review
    }

    pub fn star_level(&self) -> u32 {
        self.star_level
    }

    pub fn attraction_level(&self) -> i64 {
        self.attraction_level
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn tool_grade(&self) -> u8 {
        self.tool_grade
    }

    pub fn staff(&self) -> &[Staff] {
        &self.staff
    }

    pub fn loans(&self) -> &[Loan] {
        &self.loans
    }

    pub fn active_ads(&self) -> &[AdInstance] {
        &self.active_ads
    }

    pub fn total_revenue(&self) -> i64 {
        self.total_revenue
    }

    pub fn total_expenses(&self) -> i64 {
        self.total_expenses
    }

    pub fn customers_served(&self) -> u64 {
        self.customers_served
    }

    pub(crate) fn has_active_loan(&self, product: &str) -> bool {
        self.loans
            .iter()
            .any(|loan| !loan.is_paid_off() && loan.product() == product)
    }
}

/// 1日分の記録とその日のアップグレード結果。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRecord {
    pub report: DayReport,
    pub upgraded_to: Option<u8>,
    pub financing: Option<FinancingPlan>,
}

pub struct Simulation {
    state: SalonState,
    catalog: Catalog,
    config: RunConfig,
    rng: StdRng,
}

impl Simulation {
    pub fn from_catalog(catalog: Catalog, config: RunConfig) -> Result<Self> {
        SimulationBuilder::new(catalog, config).build()
    }

    pub fn from_catalog_with_rng(catalog: Catalog, config: RunConfig, rng: StdRng) -> Result<Self> {
        SimulationBuilder::new(catalog, config).with_rng(rng).build()
    }

    #[cfg(test)]
    pub fn from_catalog_with_seed(catalog: Catalog, config: RunConfig, seed: u64) -> Result<Self> {
        SimulationBuilder::new(catalog, config)
            .with_rng(StdRng::seed_from_u64(seed))
            .build()
    }

    pub(crate) fn new(bootstrap: SimulationBootstrap) -> Self {
        Self {
            state: bootstrap.state,
            catalog: bootstrap.catalog,
            config: bootstrap.config,
            rng: bootstrap.rng,
        }
    }

    pub fn state(&self) -> &SalonState {
        &self.state
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// 1日進める: 広告 → 家賃 → 給与 → ローン → 集客 → 施術 → フィードバック → 決算。
    pub fn simulate_day(&mut self) -> Result<DayReport> {
        day::simulate_day(&mut self.state, &self.catalog, &self.config, &mut self.rng)
    }

    /// グレードアップを1回試みる。資金不足時はローンによる調達も行う。
    pub fn try_upgrade(&mut self) -> Result<UpgradeOutcome> {
        progression::try_upgrade(&mut self.state, &self.catalog, &self.config)
    }

    /// 最大日数まで、または最高グレード到達まで日次ループを回す。
    pub fn run(&mut self) -> Result<Vec<DayRecord>> {
        let mut records = Vec::new();
        for _ in 0..self.config.max_days {
            let report = self.simulate_day()?;
            let outcome = self.try_upgrade()?;
            let reached_max = self.state.grade >= MAX_GRADE;
            records.push(DayRecord {
                report,
                upgraded_to: outcome.upgraded.then_some(self.state.grade),
                financing: outcome.financing,
            });
            if reached_max {
                break;
            }
        }
        Ok(records)
    }
}
