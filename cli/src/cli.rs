use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use salonsim_core::{Catalog, DayRecord, RunConfig, Simulation};

const TARGET_GRADE: u8 = 7;
const BATCH_RUNS: u32 = 1000;

pub fn run(catalog: &Catalog, config: RunConfig) -> Result<()> {
    println!("============================================================");
    println!("脱毛サロン経営シミュレーター");
    println!("============================================================");

    let without_loans = run_batch(catalog, config, false)?;
    print_batch_summary("ローンなし", &without_loans);
    let with_loans = run_batch(catalog, config, true)?;
    print_batch_summary("ローンあり", &with_loans);

    if config.verbose {
        println!();
        println!("============================================================");
        println!(
            "詳細シミュレーション ({})",
            if config.use_loans {
                "ローンあり"
            } else {
                "ローンなし"
            }
        );
        println!("============================================================");
        let mut sim =
            Simulation::from_catalog_with_rng(catalog.clone(), config, StdRng::from_entropy())?;
        let records = sim.run()?;
        for record in &records {
            print_day_record(record);
        }
        if sim.state().grade() >= TARGET_GRADE {
            if let Some(last) = records.last() {
                println!();
                println!(
                    "*** {}日目にグレード{}へ到達 ***",
                    last.report.day, TARGET_GRADE
                );
            }
        } else {
            println!();
            println!(
                "{}日以内にグレード{}へ到達できませんでした (最終: G{})",
                config.max_days,
                TARGET_GRADE,
                sim.state().grade()
            );
        }
    }

    Ok(())
}

/// 同一設定で複数ラン回し、グレード7到達日数を集める。未達成は上限日数扱い。
fn run_batch(catalog: &Catalog, base: RunConfig, use_loans: bool) -> Result<Vec<u32>> {
    let mut days_to_target = Vec::with_capacity(BATCH_RUNS as usize);
    for _ in 0..BATCH_RUNS {
        let config = RunConfig {
            use_loans,
            verbose: false,
            ..base
        };
        let mut sim = Simulation::from_catalog(catalog.clone(), config)?;
        let records = sim.run()?;
        if sim.state().grade() >= TARGET_GRADE {
            let day = records.last().map(|record| record.report.day).unwrap_or(0);
            days_to_target.push(day);
        } else {
            days_to_target.push(config.max_days);
        }
    }
    Ok(days_to_target)
}

fn print_batch_summary(label: &str, days: &[u32]) {
    println!();
    println!("[結果] {} ({}ラン)", label, days.len());
    println!("----------------------------------------");
    if days.is_empty() {
        println!("  記録なし");
        return;
    }
    let total: u64 = days.iter().map(|&d| d as u64).sum();
    let average = total as f64 / days.len() as f64;
    let min = days.iter().min().copied().unwrap_or(0);
    let max = days.iter().max().copied().unwrap_or(0);
    println!("グレード{}到達日数:", TARGET_GRADE);
    println!("  平均: {:.1}日", average);
    println!("  最短: {}日", min);
    println!("  最長: {}日", max);
}

fn print_day_record(record: &DayRecord) {
    let r = &record.report;
    println!(
        "Day {:>3}: G{} ★{} | 資金 ${} | 客 {}/{} (集客 {}/{})",
        r.day,
        r.grade,
        r.star_level,
        r.money,
        r.customers_served,
        r.expected_customers,
        r.attraction_level,
        r.attraction_cap
    );

    let mut expenses = Vec::new();
    if r.expense_rent > 0 {
        expenses.push(format!("家賃 ${}", r.expense_rent));
    }
    if r.expense_payroll > 0 {
        expenses.push(format!("給与({}名) ${}", r.staff_count, r.expense_payroll));
    }
    if r.expense_loans > 0 {
        expenses.push(format!("ローン返済 ${}", r.expense_loans));
    }
    if r.expense_ads > 0 {
        expenses.push(format!("広告 ${}", r.expense_ads));
    }
    if r.expense_items > 0 {
        expenses.push(format!("アイテム ${}", r.expense_items));
    }
    if !expenses.is_empty() {
        println!("       支出: {}", expenses.join(" | "));
    }
    println!(
        "       売上 ${} / 損益 ${} / レビュー {:+} (累計 {})",
        r.revenue, r.net, r.review_delta, r.cumulative_review
    );
    if r.turned_away > 0 {
        println!("       満員で{}名が帰宅", r.turned_away);
    }

    if let Some(grade) = record.upgraded_to {
        let mut line = format!("  >>> グレード{}へ昇格!", grade);
        if let Some(financing) = &record.financing {
            line.push_str(&format!(
                " [借入 ${} ({}件)]",
                financing.total_borrowed,
                financing.loans.len()
            ));
        }
        println!("{line}");
    } else if let Some(financing) = &record.financing {
        println!(
            "  >>> 借入 ${} ({}件)。昇格費用には届かず",
            financing.total_borrowed,
            financing.loans.len()
        );
    }
}
