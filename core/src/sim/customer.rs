use std::collections::BTreeMap;

use anyhow::{Result, anyhow, bail, ensure};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

const PROBABILITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WealthTier {
    Poorest,
    Poor,
    Normal,
    Rich,
    Richest,
}

impl WealthTier {
    fn from_rank_position(index: usize, total: usize) -> Self {
        let slot = if total == 0 { 0 } else { index * 5 / total };
        match slot {
            0 => WealthTier::Poorest,
            1 => WealthTier::Poor,
            2 => WealthTier::Normal,
            3 => WealthTier::Rich,
            _ => WealthTier::Richest,
        }
    }
}

/// 1回の施術イベント内でのみ生きる使い捨ての顧客。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Customer {
    pub wealth: WealthTier,
    pub payment: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSpec {
    pub name: String,
    pub price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketWeights {
    pub min_score: i64,
    pub weights: BTreeMap<WealthTier, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarDistribution {
    pub star: u32,
    pub brackets: Vec<BracketWeights>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRank {
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub addon_budget: i64,
    pub star_req: u32,
    #[serde(default = "default_grade_req")]
    pub grade_req: u8,
}

fn default_grade_req() -> u8 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum PricingModel {
    WealthTiers {
        plans: BTreeMap<WealthTier, Vec<PlanSpec>>,
        distribution: Vec<StarDistribution>,
    },
    Ranked {
        ranks: Vec<CustomerRank>,
    },
}

impl PricingModel {
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            PricingModel::WealthTiers {
                plans,
                distribution,
            } => {
                ensure!(!distribution.is_empty(), "顧客分布が定義されていません");
                for entry in distribution {
                    ensure!(
                        entry.brackets.iter().any(|b| b.min_score == 0),
                        "星{}の顧客分布にスコア0の区間がありません",
                        entry.star
                    );
                    for bracket in &entry.brackets {
                        let total: f64 = bracket.weights.values().sum();
                        ensure!(
                            total <= 1.0 + PROBABILITY_TOLERANCE,
                            "星{}スコア{}の分布合計が1を超えています: {:.3}",
                            entry.star,
                            bracket.min_score,
                            total
                        );
                        for (tier, weight) in &bracket.weights {
                            ensure!(
                                *weight >= 0.0,
                                "星{}スコア{}の{:?}確率が負です",
                                entry.star,
                                bracket.min_score,
                                tier
                            );
                            ensure!(
                                plans.get(tier).is_some_and(|p| !p.is_empty()),
                                "富裕層{:?}のプラン表が空です",
                                tier
                            );
                        }
                    }
                }
                ensure!(
                    plans.get(&WealthTier::Poorest).is_some_and(|p| !p.is_empty()),
                    "最下位層のプラン表は必須です (確率の残余が流れ込むため)"
                );
                Ok(())
            }
            PricingModel::Ranked { ranks } => {
                ensure!(!ranks.is_empty(), "顧客ランクが定義されていません");
                ensure!(
                    ranks.iter().any(|r| r.star_req <= 1 && r.grade_req <= 1),
                    "星1・グレード1で呼べる顧客ランクが存在しません"
                );
                for rank in ranks {
                    ensure!(rank.price > 0, "顧客ランク {} の料金が不正です", rank.name);
                    ensure!(
                        rank.addon_budget >= 0,
                        "顧客ランク {} の追加予算が負です",
                        rank.name
                    );
                }
                Ok(())
            }
        }
    }

    pub(crate) fn generate(
        &self,
        rng: &mut StdRng,
        star_level: u32,
        grade: u8,
        review_score: i64,
    ) -> Result<Customer> {
        match self {
            PricingModel::WealthTiers {
                plans,
                distribution,
            } => {
                let entry = distribution
                    .iter()
                    .find(|d| d.star == star_level)
                    .ok_or_else(|| anyhow!("星{}の顧客分布が未定義です", star_level))?;
                let bracket = entry
                    .brackets
                    .iter()
                    .filter(|b| b.min_score <= review_score)
                    .max_by_key(|b| b.min_score)
                    .ok_or_else(|| {
                        anyhow!("星{}スコア{}に対応する区間がありません", star_level, review_score)
                    })?;

                // 確率の残余は最下位層へ流す (元データの行和は1未満がありうる)
                let roll: f64 = rng.gen_range(0.0..1.0);
                let mut cumulative = 0.0;
                let mut wealth = WealthTier::Poorest;
                for (tier, weight) in &bracket.weights {
                    cumulative += weight;
                    if roll <= cumulative {
                        wealth = *tier;
                        break;
                    }
                }

                let tier_plans = plans
                    .get(&wealth)
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| anyhow!("富裕層{:?}のプラン表がありません", wealth))?;
                let plan = tier_plans
                    .choose(rng)
                    .ok_or_else(|| anyhow!("富裕層{:?}のプラン表が空です", wealth))?;
                Ok(Customer {
                    wealth,
                    payment: plan.price,
                })
            }
            PricingModel::Ranked { ranks } => {
                let eligible: Vec<(usize, &CustomerRank)> = ranks
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.star_req <= star_level && r.grade_req <= grade)
                    .collect();
                let Some(&(index, rank)) = eligible.choose(rng) else {
                    bail!(
                        "星{}グレード{}で呼べる顧客ランクがありません",
                        star_level,
                        grade
                    );
                };
                let addon = if rank.addon_budget > 0 {
                    rng.gen_range(0..=rank.addon_budget)
                } else {
                    0
                };
                Ok(Customer {
                    wealth: WealthTier::from_rank_position(index, ranks.len()),
                    payment: rank.price + addon,
                })
            }
        }
    }
}

/// 累積レビューをスコア区間キーに落とす (0 / 20 / 50 / 80)。
pub(crate) fn score_bracket(cumulative_review: i64) -> i64 {
    let score = cumulative_review.rem_euclid(100);
    match score {
        0..=19 => 0,
        20..=49 => 20,
        50..=79 => 50,
        _ => 80,
    }
}
