pub(crate) const MAX_GRADE: u8 = 7;
pub(crate) const MIN_ATTRACTION: i64 = 10;
pub(crate) const MAX_ACTIVE_ADS: usize = 3;
pub(crate) const MAX_ACTIVE_LOANS: usize = 3;
pub(crate) const RENT_INTERVAL_DAYS: u32 = 3;
pub(crate) const ANGRY_LEAVE_REVIEW: i64 = -50;
pub(crate) const AD_BUDGET_RATIO: f64 = 0.2;
pub(crate) const AD_SATURATION_RATIO: f64 = 0.9;
pub(crate) const AD_SHORTLIST: usize = 3;
pub(crate) const DAILY_ATTRACTION_VARIANCE: i64 = 3;
pub(crate) const INITIAL_MONEY: i64 = 3000;
pub(crate) const INITIAL_ATTRACTION: i64 = 50;
