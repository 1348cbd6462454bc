use anyhow::{Result, anyhow};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;

use super::advert::AdInstance;
use super::catalog::{AdSpec, Catalog, ItemKind};
use super::constants::{
    AD_BUDGET_RATIO, AD_SATURATION_RATIO, AD_SHORTLIST, ANGRY_LEAVE_REVIEW,
    DAILY_ATTRACTION_VARIANCE, MAX_ACTIVE_ADS, MIN_ATTRACTION, RENT_INTERVAL_DAYS,
};
use super::customer;
use super::state::{RunConfig, SalonState};

/// 1日分の決算レポート。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayReport {
    pub day: u32,
    pub grade: u8,
    pub star_level: u32,
    pub revenue: i64,
    pub expenses: i64,
    pub net: i64,
    pub money: i64,
    pub expense_ads: i64,
    pub expense_rent: i64,
    pub expense_payroll: i64,
    pub expense_loans: i64,
    pub expense_items: i64,
    pub staff_count: usize,
    pub active_loans: usize,
    pub new_ads: Vec<String>,
    pub active_ads: usize,
    pub ad_boost: i64,
    pub expected_customers: i64,
    pub customers_served: i64,
    pub turned_away: i64,
    pub daily_capacity: i64,
    pub attraction_level: i64,
    pub attraction_cap: i64,
    pub review_delta: i64,
    pub cumulative_review: i64,
}

/// 1日を進める。広告 → 固定費 → ローン → 集客 → 施術 → フィードバック → 決算の順。
pub(crate) fn simulate_day(
    state: &mut SalonState,
    catalog: &Catalog,
    config: &RunConfig,
    rng: &mut StdRng,
) -> Result<DayReport> {
    let spec = catalog.grade(state.grade)?;
    let attraction_cap = spec.attraction_cap;

    // 掲出中の広告から今日のブーストを取り出し、減衰と日数消化を進める
    let mut ad_boost = 0i64;
    for ad in &mut state.active_ads {
        let decay = catalog.ad(ad.kind())?.decay;
        ad_boost += ad.consume_daily_boost(decay);
    }
    state.active_ads.retain(|ad| !ad.is_expired());

    // 集客度が飽和していない限り、枠が空いていれば広告を追加購入する
    let mut expense_ads = 0i64;
    let mut new_ads = Vec::new();
    let attraction_ratio = state.attraction_level as f64 / attraction_cap as f64;
    while state.active_ads.len() < MAX_ACTIVE_ADS {
        if attraction_ratio >= AD_SATURATION_RATIO && !state.active_ads.is_empty() {
            break;
        }
        let Some(pick) = select_ad(state, catalog, rng) else {
            break;
        };
        expense_ads += pick.cost;
        ad_boost += pick.attraction_boost;
        state
            .active_ads
            .push(AdInstance::new(&pick.name, pick.duration, pick.attraction_boost));
        new_ads.push(pick.name.clone());
    }

    let expense_rent = if state.day % RENT_INTERVAL_DAYS == 0 {
        spec.rent
    } else {
        0
    };

    let expense_payroll: i64 = state.staff.iter().map(|staff| staff.daily_wage()).sum();

    let mut expense_loans = 0i64;
    for loan in &mut state.loans {
        expense_loans += loan.make_payment(0);
    }
    state.loans.retain(|loan| !loan.is_paid_off());

    // 集客度 + 広告ブースト + 日次変動から来客数を見積もる
    let variance = rng.gen_range(-DAILY_ATTRACTION_VARIANCE..=DAILY_ATTRACTION_VARIANCE);
    let effective_attraction =
        (state.attraction_level + ad_boost + variance).clamp(MIN_ATTRACTION, attraction_cap);
    let max_customers = catalog.max_customers(state.grade)?;
    let expected_customers =
        (max_customers as f64 * (effective_attraction as f64 / attraction_cap as f64)) as i64;

    // 稼働ベッド数と施術時間から1日の処理上限を求める
    let available_beds = (spec.beds as usize).min(state.staff.len()) as i64;
    let time_reduction = catalog.best_time_reduction(state.tool_grade)?;
    let treatment_seconds =
        (config.avg_treatment_seconds as f64 * (1.0 - time_reduction)).max(1.0);
    let daily_capacity =
        (config.operating_seconds as f64 / treatment_seconds * available_beds as f64) as i64;

    let mut revenue = 0i64;
    let mut expense_items = 0i64;
    let mut review_delta = 0i64;
    let mut customers_served = 0i64;
    let mut turned_away = 0i64;
    let tool_bonus = catalog.tool_review_bonus(state.tool_grade)?;
    let score_bracket = customer::score_bracket(state.cumulative_review);
    let reception_pool = catalog.items_for(ItemKind::Reception, state.star_level);
    let register_pool = catalog.items_for(ItemKind::Register, state.star_level);

    for _ in 0..expected_customers {
        if customers_served >= daily_capacity {
            turned_away += 1;
            review_delta += ANGRY_LEAVE_REVIEW;
            continue;
        }
        let customer =
            catalog
                .pricing()
                .generate(rng, state.star_level, state.grade, score_bracket)?;
        let staff = state
            .staff
            .choose(rng)
            .ok_or_else(|| anyhow!("施術できるスタッフがいません"))?;
        let multiplier = staff.review_multiplier();
        let success = rng.gen_range(0.0..1.0) < staff.success_rate(customer.wealth);
        customers_served += 1;

        if success {
            revenue += customer.payment;
            if let Some(item) = reception_pool.choose(rng) {
                expense_items += item.cost;
                revenue += item.price;
                review_delta += (item.review_bonus as f64 * multiplier) as i64;
            }
            if let Some(item) = register_pool.choose(rng) {
                expense_items += item.cost;
                revenue += item.price;
                review_delta += (item.review_bonus as f64 * multiplier) as i64;
            }
            if tool_bonus > 0 {
                review_delta += (tool_bonus as f64 * multiplier) as i64;
            }
            let roll: f64 = rng.gen_range(0.0..1.0);
            let base: i64 = if roll < 0.80 {
                50
            } else if roll < 0.95 {
                rng.gen_range(30..=49)
            } else {
                rng.gen_range(-10..=29)
            };
            review_delta += (base as f64 * multiplier) as i64;
        } else {
            let base: i64 = rng.gen_range(-50..=0);
            review_delta += (base as f64 * multiplier) as i64;
        }
    }

    // 当日の平均レビューが翌日以降の集客度へ反映される
    let average_review = if customers_served > 0 {
        review_delta as f64 / customers_served as f64
    } else {
        0.0
    };
    let attraction_change = (average_review / 5.0 * state.grade as f64) as i64;
    state.attraction_level =
        (state.attraction_level + attraction_change).clamp(MIN_ATTRACTION, attraction_cap);

    state.cumulative_review = (state.cumulative_review + review_delta).max(0);
    state.star_level = catalog.star_for(state.cumulative_review)?;

    let expenses = expense_ads + expense_rent + expense_payroll + expense_loans + expense_items;
    let net = revenue - expenses;
    state.money += net;
    state.total_revenue += revenue;
    state.total_expenses += expenses;
    state.customers_served += customers_served as u64;
    let day = state.day;
    state.day += 1;

    Ok(DayReport {
        day,
        grade: state.grade,
        star_level: state.star_level,
        revenue,
        expenses,
        net,
        money: state.money,
        expense_ads,
        expense_rent,
        expense_payroll,
        expense_loans,
        expense_items,
        staff_count: state.staff.len(),
        active_loans: state.loans.len(),
        new_ads,
        active_ads: state.active_ads.len(),
        ad_boost,
        expected_customers,
        customers_served,
        turned_away,
        daily_capacity,
        attraction_level: state.attraction_level,
        attraction_cap,
        review_delta,
        cumulative_review: state.cumulative_review,
    })
}

/// 掲出可能かつ予算内の広告を効率順に並べ、上位からランダムに1つ選ぶ。
fn select_ad<'a>(state: &SalonState, catalog: &'a Catalog, rng: &mut StdRng) -> Option<&'a AdSpec> {
    let budget = state.money as f64 * AD_BUDGET_RATIO;
    let mut candidates: Vec<&AdSpec> = catalog
        .ads()
        .iter()
        .filter(|ad| ad.grade_req <= state.grade)
        .filter(|ad| !state.active_ads.iter().any(|active| active.kind() == ad.name))
        .filter(|ad| ad.cost == 0 || (ad.cost as f64) <= budget)
        .collect();
    candidates.sort_by(|a, b| {
        b.efficiency()
            .partial_cmp(&a.efficiency())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let shortlist = candidates.len().min(AD_SHORTLIST);
    candidates[..shortlist].choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::constants::{INITIAL_ATTRACTION, INITIAL_MONEY};
    use crate::sim::loan::Loan;
    use crate::sim::staff::{Staff, StaffRank};
    use rand::SeedableRng;

    fn catalog() -> Catalog {
        Catalog::from_embedded().expect("組み込みカタログ")
    }

    fn base_state() -> SalonState {
        SalonState {
            grade: 1,
            money: INITIAL_MONEY,
            cumulative_review: 0,
            star_level: 1,
            attraction_level: INITIAL_ATTRACTION,
            day: 1,
            tool_grade: 1,
            staff: (0..4).map(|_| Staff::new(StaffRank::Student)).collect(),
            loans: Vec::new(),
            active_ads: Vec::new(),
            total_revenue: 0,
            total_expenses: 0,
            customers_served: 0,
        }
    }

    #[test]
    fn served_never_exceeds_capacity() {
        let catalog = catalog();
        let config = RunConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = base_state();
        for _ in 0..60 {
            let report = simulate_day(&mut state, &catalog, &config, &mut rng).expect("日次処理");
            assert!(report.customers_served <= report.daily_capacity);
            assert_eq!(
                report.customers_served + report.turned_away,
                report.expected_customers
            );
        }
    }

    #[test]
    fn grade_one_buys_only_the_free_ad() {
        let catalog = catalog();
        let config = RunConfig::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut state = base_state();
        let report = simulate_day(&mut state, &catalog, &config, &mut rng).expect("日次処理");
        assert_eq!(report.new_ads, vec!["free_sns".to_string()]);
        assert_eq!(report.expense_ads, 0);
        assert_eq!(report.active_ads, 1);
        assert_eq!(report.ad_boost, 5);
    }

    #[test]
    fn overflow_turns_customers_away_angry() {
        let catalog = catalog();
        // 処理上限 75/15×1 = 5人。集客度を上限に張り付けて需要18人を固定する
        let config = RunConfig {
            operating_seconds: 75,
            ..RunConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(10);
        let mut state = base_state();
        state.attraction_level = 100;
        state.active_ads = vec![AdInstance::new("free_sns", 3, 5)];
        let report = simulate_day(&mut state, &catalog, &config, &mut rng).expect("日次処理");
        assert_eq!(report.expected_customers, 18);
        assert_eq!(report.daily_capacity, 5);
        assert_eq!(report.customers_served, 5);
        assert_eq!(report.turned_away, 13);
    }

    #[test]
    fn ad_boost_decays_until_expiry() {
        let catalog = catalog();
        let config = RunConfig {
            operating_seconds: 0,
            ..RunConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = base_state();
        // paid_sns: boost 30, duration 4, decay 5
        state.grade = 3;
        state.tool_grade = 3;
        state.attraction_level = catalog.grade(3).unwrap().attraction_cap;
        state.active_ads = vec![AdInstance::new("paid_sns", 4, 30)];
        let mut boosts = Vec::new();
        for _ in 0..3 {
            let report = simulate_day(&mut state, &catalog, &config, &mut rng).expect("日次処理");
            boosts.push(report.ad_boost);
        }
        assert_eq!(boosts, vec![30, 25, 20]);
        assert_eq!(state.active_ads.len(), 1);
        // 4日目で掲出期間が尽き、翌日の枠から外れる
        let report = simulate_day(&mut state, &catalog, &config, &mut rng).expect("日次処理");
        assert!(report.ad_boost >= 15);
        assert!(!state.active_ads.iter().any(|ad| ad.kind() == "paid_sns"));
    }

    #[test]
    fn rent_is_charged_every_third_day() {
        let catalog = catalog();
        let config = RunConfig::default();
        let rent = catalog.grade(1).unwrap().rent;
        let mut rng = StdRng::seed_from_u64(4);
        let mut state = base_state();
        let mut charged = Vec::new();
        for _ in 0..6 {
            let report = simulate_day(&mut state, &catalog, &config, &mut rng).expect("日次処理");
            charged.push(report.expense_rent);
        }
        assert_eq!(charged, vec![0, 0, rent, 0, 0, rent]);
    }

    #[test]
    fn payroll_matches_roster_wages() {
        let catalog = catalog();
        let config = RunConfig::default();
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = base_state();
        state.staff = vec![Staff::new(StaffRank::Student), Staff::new(StaffRank::Pro)];
        let report = simulate_day(&mut state, &catalog, &config, &mut rng).expect("日次処理");
        assert_eq!(report.expense_payroll, 80 + 300);
    }

    #[test]
    fn paid_off_loans_are_dropped_from_the_books() {
        let catalog = catalog();
        let config = RunConfig::default();
        let mut rng = StdRng::seed_from_u64(6);
        let mut state = base_state();
        state.loans = vec![Loan::new("starter", 8_000, 0.005, 1)];
        let report = simulate_day(&mut state, &catalog, &config, &mut rng).expect("日次処理");
        assert_eq!(report.expense_loans, 8_000 + 40);
        assert_eq!(report.active_loans, 0);
        assert!(state.loans.is_empty());
    }

    #[test]
    fn no_staff_means_no_service() {
        let catalog = catalog();
        let config = RunConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut state = base_state();
        state.staff.clear();
        let report = simulate_day(&mut state, &catalog, &config, &mut rng).expect("日次処理");
        assert_eq!(report.daily_capacity, 0);
        assert_eq!(report.customers_served, 0);
        assert_eq!(report.turned_away, report.expected_customers);
        assert_eq!(
            report.review_delta,
            report.turned_away * ANGRY_LEAVE_REVIEW
        );
        assert_eq!(state.cumulative_review, 0);
    }

    #[test]
    fn attraction_respects_grade_cap_and_floor() {
        let catalog = catalog();
        let config = RunConfig::default();
        let cap = catalog.grade(1).unwrap().attraction_cap;
        let mut rng = StdRng::seed_from_u64(8);
        let mut state = base_state();
        state.attraction_level = cap;
        for _ in 0..30 {
            simulate_day(&mut state, &catalog, &config, &mut rng).expect("日次処理");
            assert!((MIN_ATTRACTION..=cap).contains(&state.attraction_level));
        }
    }

    #[test]
    fn failure_streaks_drive_attraction_down_to_the_floor() {
        // 大富豪のみの客層×大学生ローテ (成功率0.2) で悪評が続く状況を作る
        let customers = r#"
thresholds:
  - { star: 1, min_review: 0 }
pricing:
  model: wealth_tiers
  plans:
    poorest:
      - { name: 胸, price: 20 }
    richest:
      - { name: 全身(ヒゲあり), price: 420 }
  distribution:
    - star: 1
      brackets:
        - { min_score: 0, weights: { richest: 1.0 } }
        - { min_score: 20, weights: { richest: 1.0 } }
        - { min_score: 50, weights: { richest: 1.0 } }
        - { min_score: 80, weights: { richest: 1.0 } }
"#;
        let catalog = Catalog::from_embedded_with_customers(customers).expect("カタログ");
        let config = RunConfig::default();
        let cap = catalog.grade(1).unwrap().attraction_cap;
        let mut rng = StdRng::seed_from_u64(21);
        let mut state = base_state();
        state.attraction_level = cap;
        let mut reached_floor = false;
        for _ in 0..150 {
            simulate_day(&mut state, &catalog, &config, &mut rng).expect("日次処理");
            assert!((MIN_ATTRACTION..=cap).contains(&state.attraction_level));
            if state.attraction_level == MIN_ATTRACTION {
                reached_floor = true;
            }
        }
        assert!(reached_floor, "集客度が下限{}まで落ちていない", MIN_ATTRACTION);
    }

    #[test]
    fn perfect_streaks_hold_attraction_at_the_cap() {
        // 極貧のみの客層は全スタッフで成功率1.0、レビューは正が続く
        let customers = r#"
thresholds:
  - { star: 1, min_review: 0 }
pricing:
  model: wealth_tiers
  plans:
    poorest:
      - { name: 胸, price: 20 }
  distribution:
    - star: 1
      brackets:
        - { min_score: 0, weights: { poorest: 1.0 } }
        - { min_score: 20, weights: { poorest: 1.0 } }
        - { min_score: 50, weights: { poorest: 1.0 } }
        - { min_score: 80, weights: { poorest: 1.0 } }
"#;
        let catalog = Catalog::from_embedded_with_customers(customers).expect("カタログ");
        let config = RunConfig::default();
        let cap = catalog.grade(1).unwrap().attraction_cap;
        let mut rng = StdRng::seed_from_u64(22);
        let mut state = base_state();
        for _ in 0..60 {
            simulate_day(&mut state, &catalog, &config, &mut rng).expect("日次処理");
            assert!((MIN_ATTRACTION..=cap).contains(&state.attraction_level));
        }
        assert_eq!(state.attraction_level, cap);
    }

    #[test]
    fn saturated_attraction_keeps_a_single_ad() {
        let catalog = catalog();
        let config = RunConfig::default();
        let mut rng = StdRng::seed_from_u64(9);
        let mut state = base_state();
        state.attraction_level = catalog.grade(1).unwrap().attraction_cap;
        state.active_ads = vec![AdInstance::new("free_sns", 3, 5)];
        let report = simulate_day(&mut state, &catalog, &config, &mut rng).expect("日次処理");
        assert!(report.new_ads.is_empty());
    }
}
