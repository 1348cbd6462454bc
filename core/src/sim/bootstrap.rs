use anyhow::{Result, ensure};
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::catalog::Catalog;
use super::constants::{INITIAL_ATTRACTION, INITIAL_MONEY, MIN_ATTRACTION};
use super::staff::Staff;
use super::state::{RunConfig, SalonState, Simulation};

pub(crate) struct SimulationBootstrap {
    pub(crate) state: SalonState,
    pub(crate) catalog: Catalog,
    pub(crate) config: RunConfig,
    pub(crate) rng: StdRng,
}

/// G1の開店状態を組み立てる。乱数源を差し替えなければエントロピーから初期化する。
pub struct SimulationBuilder {
    catalog: Catalog,
    config: RunConfig,
    rng: StdRng,
}

impl SimulationBuilder {
    pub fn new(catalog: Catalog, config: RunConfig) -> Self {
        Self {
            catalog,
            config,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn build(self) -> Result<Simulation> {
        ensure!(
            self.config.operating_seconds >= 1,
            "営業時間は1秒以上必要です"
        );
        ensure!(
            self.config.avg_treatment_seconds >= 1,
            "平均施術時間は1秒以上必要です"
        );
        ensure!(self.config.max_days >= 1, "シミュレーション日数は1日以上必要です");

        let opening = self.catalog.grade(1)?;
        let staff = (0..opening.staff_slots)
            .map(|_| Staff::new(opening.hire_rank))
            .collect();
        let state = SalonState {
            grade: 1,
            money: INITIAL_MONEY,
            cumulative_review: 0,
            star_level: self.catalog.star_for(0)?,
            attraction_level: INITIAL_ATTRACTION.clamp(MIN_ATTRACTION, opening.attraction_cap),
            day: 1,
            tool_grade: 1,
            staff,
            loans: Vec::new(),
            active_ads: Vec::new(),
            total_revenue: 0,
            total_expenses: 0,
            customers_served: 0,
        };
        Ok(Simulation::new(SimulationBootstrap {
            state,
            catalog: self.catalog,
            config: self.config,
            rng: self.rng,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_seeds_an_opening_roster() {
        let catalog = Catalog::from_embedded().expect("組み込みカタログ");
        let sim = SimulationBuilder::new(catalog, RunConfig::default())
            .with_rng(StdRng::seed_from_u64(0))
            .build()
            .expect("構築");
        let state = sim.state();
        assert_eq!(state.money(), INITIAL_MONEY);
        assert_eq!(state.attraction_level(), INITIAL_ATTRACTION);
        assert_eq!(
            state.staff().len(),
            sim.catalog().grade(1).unwrap().staff_slots
        );
    }

    #[test]
    fn zero_day_budget_is_rejected() {
        let catalog = Catalog::from_embedded().expect("組み込みカタログ");
        let config = RunConfig {
            max_days: 0,
            ..RunConfig::default()
        };
        assert!(SimulationBuilder::new(catalog, config).build().is_err());
    }

    #[test]
    fn zero_treatment_time_is_rejected() {
        let catalog = Catalog::from_embedded().expect("組み込みカタログ");
        let config = RunConfig {
            avg_treatment_seconds: 0,
            ..RunConfig::default()
        };
        assert!(SimulationBuilder::new(catalog, config).build().is_err());
    }
}
