mod advert;
mod bootstrap;
mod catalog;
mod constants;
mod customer;
mod day;
mod loan;
mod progression;
mod staff;
mod state;

pub use advert::AdInstance;
pub use bootstrap::SimulationBuilder;
pub use catalog::{
    AdSpec, Catalog, GradeSpec, ItemKind, ItemSpec, LoanProduct, StarThreshold, ToolSpec,
};
pub use customer::{
    BracketWeights, Customer, CustomerRank, PlanSpec, PricingModel, StarDistribution, WealthTier,
};
pub use day::DayReport;
pub use loan::Loan;
pub use progression::{BorrowedLoan, FinancingPlan, UpgradeOutcome};
pub use staff::{Staff, StaffRank};
pub use state::{DayRecord, RunConfig, SalonState, Simulation};
