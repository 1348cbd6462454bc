use anyhow::Result;
use serde::Serialize;

use super::catalog::Catalog;
use super::constants::{MAX_ACTIVE_LOANS, MAX_GRADE};
use super::loan::Loan;
use super::staff::Staff;
use super::state::{RunConfig, SalonState};

/// 資金調達で組んだ個別ローン。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BorrowedLoan {
    pub product: String,
    pub amount: i64,
    pub term_days: u32,
}

/// その日の借入内容。アップグレードが不成立でも借入自体は残る。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancingPlan {
    pub loans: Vec<BorrowedLoan>,
    pub total_borrowed: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradeOutcome {
    pub upgraded: bool,
    pub financing: Option<FinancingPlan>,
}

impl UpgradeOutcome {
    fn unchanged() -> Self {
        Self {
            upgraded: false,
            financing: None,
        }
    }
}

/// 次グレードへの昇格を1回試みる。費用は昇格費 + 全ベッド分のツール一式。
/// 資金不足時は use_loans が有効なら借入上限の大きい順に商品上限額まで借りる。
pub(crate) fn try_upgrade(
    state: &mut SalonState,
    catalog: &Catalog,
    config: &RunConfig,
) -> Result<UpgradeOutcome> {
    if state.grade >= MAX_GRADE {
        return Ok(UpgradeOutcome::unchanged());
    }
    let next_grade = state.grade + 1;
    let spec = catalog.grade(next_grade)?;
    if state.star_level < spec.required_stars {
        return Ok(UpgradeOutcome::unchanged());
    }

    let tool_cost = catalog.tool_cost(next_grade)? * spec.beds as i64;
    let total_cost = spec.upgrade_cost + tool_cost;

    let mut financing = None;
    if state.money < total_cost {
        if !config.use_loans {
            return Ok(UpgradeOutcome::unchanged());
        }
        let mut plan = FinancingPlan {
            loans: Vec::new(),
            total_borrowed: 0,
        };
        for product in catalog.loan_products_by_amount() {
            if state.money >= total_cost {
                break;
            }
            if state.loans.len() >= MAX_ACTIVE_LOANS {
                break;
            }
            if product.grade_req > state.grade {
                continue;
            }
            if state.has_active_loan(&product.name) {
                continue;
            }
            state.loans.push(Loan::new(
                &product.name,
                product.max_amount,
                product.daily_rate,
                product.term_days,
            ));
            state.money += product.max_amount;
            plan.total_borrowed += product.max_amount;
            plan.loans.push(BorrowedLoan {
                product: product.name.clone(),
                amount: product.max_amount,
                term_days: product.term_days,
            });
        }
        if !plan.loans.is_empty() {
            financing = Some(plan);
        }
        if state.money < total_cost {
            return Ok(UpgradeOutcome {
                upgraded: false,
                financing,
            });
        }
    }

    state.grade = next_grade;
    state.money -= total_cost;
    state.tool_grade = next_grade;

    for staff in &mut state.staff {
        staff.promote_to(spec.hire_rank);
    }
    while state.staff.len() < spec.staff_slots {
        state.staff.push(Staff::new(spec.hire_rank));
    }

    Ok(UpgradeOutcome {
        upgraded: true,
        financing,
    })
}
