mod sim;

pub use sim::{
    AdInstance, AdSpec, BorrowedLoan, BracketWeights, Catalog, Customer, CustomerRank, DayRecord,
    DayReport, FinancingPlan, GradeSpec, ItemKind, ItemSpec, Loan, LoanProduct, PlanSpec,
    PricingModel, RunConfig, SalonState, Simulation, SimulationBuilder, Staff, StaffRank,
    StarDistribution, StarThreshold, ToolSpec, UpgradeOutcome, WealthTier,
};
