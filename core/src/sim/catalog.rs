use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, ensure};
use serde::{Deserialize, Serialize};

use super::constants::{MAX_GRADE, MIN_ATTRACTION};
use super::customer::PricingModel;
use super::staff::StaffRank;

const EMBEDDED_GRADES: &str = include_str!("../../../config/catalog/grades.yaml");
const EMBEDDED_LOANS: &str = include_str!("../../../config/catalog/loans.yaml");
const EMBEDDED_ADS: &str = include_str!("../../../config/catalog/ads.yaml");
const EMBEDDED_TOOLS: &str = include_str!("../../../config/catalog/tools.yaml");
const EMBEDDED_ITEMS: &str = include_str!("../../../config/catalog/items.yaml");
const EMBEDDED_CUSTOMERS: &str = include_str!("../../../config/catalog/customers.yaml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeSpec {
    pub grade: u8,
    pub upgrade_cost: i64,
    pub beds: u32,
    pub staff_slots: usize,
    pub rent: i64,
    pub required_stars: u32,
    pub attraction_cap: i64,
    pub max_customers: u32,
    #[serde(default)]
    pub facility_bonus: f64,
    pub hire_rank: StaffRank,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanProduct {
    pub name: String,
    pub max_amount: i64,
    pub daily_rate: f64,
    pub term_days: u32,
    pub grade_req: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdSpec {
    pub name: String,
    pub cost: i64,
    pub attraction_boost: i64,
    pub duration: u32,
    pub decay: i64,
    pub grade_req: u8,
}

impl AdSpec {
    /// コスト効率 = 総ブースト量 / コスト。無料広告は常に最優先。
    pub(crate) fn efficiency(&self) -> f64 {
        if self.cost == 0 {
            return f64::INFINITY;
        }
        (self.attraction_boost * self.duration as i64) as f64 / self.cost as f64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub cost: i64,
    #[serde(default)]
    pub time_reduction: f64,
    #[serde(default)]
    pub review_bonus: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Reception,
    Register,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSpec {
    pub name: String,
    pub kind: ItemKind,
    pub cost: i64,
    pub price: i64,
    pub review_bonus: i64,
    #[serde(default)]
    pub time_reduction: f64,
    pub star_req: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StarThreshold {
    pub star: u32,
    pub min_review: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GradeFile {
    grades: Vec<GradeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoanFile {
    products: Vec<LoanProduct>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AdFile {
    ads: Vec<AdSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolSetEntry {
    grade: u8,
    #[serde(default)]
    tools: Vec<ToolSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolFile {
    tool_sets: Vec<ToolSetEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ItemFile {
    items: Vec<ItemSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CustomerFile {
    thresholds: Vec<StarThreshold>,
    pricing: PricingModel,
}

/// サロン運営の静的テーブル一式。起動時に一度だけ読み込み、
/// 以後は全シミュレーションインスタンスで共有する不変値。
#[derive(Debug, Clone)]
pub struct Catalog {
    grades: Vec<GradeSpec>,
    loans: Vec<LoanProduct>,
    ads: Vec<AdSpec>,
    tools: BTreeMap<u8, Vec<ToolSpec>>,
    items: Vec<ItemSpec>,
    thresholds: Vec<StarThreshold>,
    pricing: PricingModel,
}

impl Catalog {
    pub fn from_embedded() -> Result<Self> {
        Self::from_sources(
            EMBEDDED_GRADES,
            EMBEDDED_LOANS,
            EMBEDDED_ADS,
            EMBEDDED_TOOLS,
            EMBEDDED_ITEMS,
            EMBEDDED_CUSTOMERS,
        )
        .context("組み込みカタログの読み込みに失敗しました")
    }

    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        ensure!(
            dir.exists(),
            "カタログディレクトリが存在しません: {}",
            dir.display()
        );
        let read = |file: &str| -> Result<String> {
            fs::read_to_string(dir.join(file))
                .with_context(|| format!("カタログファイルの読み込みに失敗しました: {}", file))
        };
        Self::from_sources(
            &read("grades.yaml")?,
            &read("loans.yaml")?,
            &read("ads.yaml")?,
            &read("tools.yaml")?,
            &read("items.yaml")?,
            &read("customers.yaml")?,
        )
    }

    #[cfg(test)]
    pub(crate) fn from_embedded_with_customers(customers: &str) -> Result<Self> {
        Self::from_sources(
            EMBEDDED_GRADES,
            EMBEDDED_LOANS,
            EMBEDDED_ADS,
            EMBEDDED_TOOLS,
            EMBEDDED_ITEMS,
            customers,
        )
    }

    fn from_sources(
        grades: &str,
        loans: &str,
        ads: &str,
        tools: &str,
        items: &str,
        customers: &str,
    ) -> Result<Self> {
        let grade_file: GradeFile =
            serde_yaml::from_str(grades).context("グレード定義 YAML の解析に失敗しました")?;
        let loan_file: LoanFile =
            serde_yaml::from_str(loans).context("ローン定義 YAML の解析に失敗しました")?;
        let ad_file: AdFile =
            serde_yaml::from_str(ads).context("広告定義 YAML の解析に失敗しました")?;
        let tool_file: ToolFile =
            serde_yaml::from_str(tools).context("ツール定義 YAML の解析に失敗しました")?;
        let item_file: ItemFile =
            serde_yaml::from_str(items).context("アイテム定義 YAML の解析に失敗しました")?;
        let customer_file: CustomerFile =
            serde_yaml::from_str(customers).context("顧客定義 YAML の解析に失敗しました")?;

        let catalog = Self {
            grades: grade_file.grades,
            loans: loan_file.products,
            ads: ad_file.ads,
            tools: tool_file
                .tool_sets
                .into_iter()
                .map(|entry| (entry.grade, entry.tools))
                .collect(),
            items: item_file.items,
            thresholds: customer_file.thresholds,
            pricing: customer_file.pricing,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.grades.len() == MAX_GRADE as usize,
            "グレード定義は{}件必要です (現在{}件)",
            MAX_GRADE,
            self.grades.len()
        );
        for (index, spec) in self.grades.iter().enumerate() {
            let expected = index as u8 + 1;
            ensure!(
                spec.grade == expected,
                "グレード定義の並びが不正です: {}番目が G{}",
                index + 1,
                spec.grade
            );
            ensure!(spec.beds >= 1, "G{} のベッド数が0です", spec.grade);
            ensure!(spec.staff_slots >= 1, "G{} のスタッフ枠が0です", spec.grade);
            ensure!(
                spec.attraction_cap >= MIN_ATTRACTION,
                "G{} の集客度上限が下限{}を下回っています",
                spec.grade,
                MIN_ATTRACTION
            );
            ensure!(spec.max_customers >= 1, "G{} の集客上限が0です", spec.grade);
            ensure!(spec.rent >= 0, "G{} の家賃が負です", spec.grade);
            ensure!(
                spec.facility_bonus >= 0.0,
                "G{} の設備ボーナスが負です",
                spec.grade
            );
        }

        for (index, product) in self.loans.iter().enumerate() {
            ensure!(
                !self.loans[..index].iter().any(|p| p.name == product.name),
                "ローン商品が重複しています: {}",
                product.name
            );
            ensure!(
                product.max_amount > 0,
                "ローン {} の上限額が不正です",
                product.name
            );
            ensure!(
                product.daily_rate >= 0.0,
                "ローン {} の日利が負です",
                product.name
            );
            ensure!(
                product.term_days >= 1,
                "ローン {} の返済期間が0日です",
                product.name
            );
            ensure!(
                (1..=MAX_GRADE).contains(&product.grade_req),
                "ローン {} の必要グレードが範囲外です",
                product.name
            );
        }

        for (index, ad) in self.ads.iter().enumerate() {
            ensure!(
                !self.ads[..index].iter().any(|a| a.name == ad.name),
                "広告が重複しています: {}",
                ad.name
            );
            ensure!(ad.cost >= 0, "広告 {} のコストが負です", ad.name);
            ensure!(
                ad.attraction_boost > 0,
                "広告 {} のブースト量が不正です",
                ad.name
            );
            ensure!(ad.duration >= 1, "広告 {} の効果日数が0です", ad.name);
            ensure!(ad.decay >= 0, "広告 {} の減衰量が負です", ad.name);
            ensure!(
                (1..=MAX_GRADE).contains(&ad.grade_req),
                "広告 {} の必要グレードが範囲外です",
                ad.name
            );
        }

        for grade in 1..=MAX_GRADE {
            let tools = self
                .tools
                .get(&grade)
                .ok_or_else(|| anyhow!("G{} のツールセットが未定義です", grade))?;
            for tool in tools {
                ensure!(tool.cost >= 0, "ツール {} のコストが負です", tool.name);
                ensure!(
                    (0.0..1.0).contains(&tool.time_reduction),
                    "ツール {} の時間短縮率が範囲外です",
                    tool.name
                );
            }
        }

        for item in &self.items {
            ensure!(item.cost >= 0, "アイテム {} のコストが負です", item.name);
            ensure!(item.price >= 0, "アイテム {} の価格が負です", item.name);
            ensure!(item.star_req >= 1, "アイテム {} の必要星が0です", item.name);
        }

        ensure!(
            !self.thresholds.is_empty(),
            "レビュー閾値が定義されていません"
        );
        ensure!(
            self.thresholds[0].star == 1 && self.thresholds[0].min_review == 0,
            "レビュー閾値は星1・閾値0から始まる必要があります"
        );
        for pair in self.thresholds.windows(2) {
            ensure!(
                pair[1].star == pair[0].star + 1,
                "レビュー閾値の星が連続していません: {} の次が {}",
                pair[0].star,
                pair[1].star
            );
            ensure!(
                pair[1].min_review > pair[0].min_review,
                "レビュー閾値が単調増加していません (星{})",
                pair[1].star
            );
        }

        self.pricing.validate()?;
        if let PricingModel::WealthTiers { distribution, .. } = &self.pricing {
            for threshold in &self.thresholds {
                ensure!(
                    distribution.iter().any(|d| d.star == threshold.star),
                    "星{}の顧客分布が定義されていません",
                    threshold.star
                );
            }
        }
        Ok(())
    }

    pub fn grade(&self, grade: u8) -> Result<&GradeSpec> {
        self.grades
            .get(grade.wrapping_sub(1) as usize)
            .ok_or_else(|| anyhow!("グレード定義がありません: G{}", grade))
    }

    /// 設備ボーナス込みの基礎集客数上限。
    pub fn max_customers(&self, grade: u8) -> Result<i64> {
        let spec = self.grade(grade)?;
        Ok((spec.max_customers as f64 * (1.0 + spec.facility_bonus)) as i64)
    }

    pub fn ads(&self) -> &[AdSpec] {
        &self.ads
    }

    pub fn ad(&self, name: &str) -> Result<&AdSpec> {
        self.ads
            .iter()
            .find(|ad| ad.name == name)
            .ok_or_else(|| anyhow!("広告定義がありません: {}", name))
    }

    /// 借入上限の大きい順に並べたローン商品一覧。
    pub fn loan_products_by_amount(&self) -> Vec<&LoanProduct> {
        let mut products: Vec<&LoanProduct> = self.loans.iter().collect();
        products.sort_by(|a, b| b.max_amount.cmp(&a.max_amount));
        products
    }

    pub fn tool_set(&self, grade: u8) -> Result<&[ToolSpec]> {
        self.tools
            .get(&grade)
            .map(Vec::as_slice)
            .ok_or_else(|| anyhow!("G{} のツールセットが未定義です", grade))
    }

    pub fn tool_cost(&self, grade: u8) -> Result<i64> {
        Ok(self.tool_set(grade)?.iter().map(|tool| tool.cost).sum())
    }

    pub fn best_time_reduction(&self, grade: u8) -> Result<f64> {
        Ok(self
            .tool_set(grade)?
            .iter()
            .map(|tool| tool.time_reduction)
            .fold(0.0, f64::max))
    }

    pub fn tool_review_bonus(&self, grade: u8) -> Result<i64> {
        Ok(self.tool_set(grade)?.iter().map(|tool| tool.review_bonus).sum())
    }

    pub fn items_for(&self, kind: ItemKind, star_level: u32) -> Vec<&ItemSpec> {
        self.items
            .iter()
            .filter(|item| item.kind == kind && item.star_req <= star_level)
            .collect()
    }

    /// 累積レビューから星を導出する (閾値以下で最大の星)。
    pub fn star_for(&self, cumulative_review: i64) -> Result<u32> {
        self.thresholds
            .iter()
            .filter(|threshold| threshold.min_review <= cumulative_review)
            .map(|threshold| threshold.star)
            .max()
            .ok_or_else(|| {
                anyhow!(
                    "累積レビュー {} に対応する星がありません",
                    cumulative_review
                )
            })
    }

    pub fn pricing(&self) -> &PricingModel {
        &self.pricing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_loads_and_validates() {
        let catalog = Catalog::from_embedded().expect("組み込みカタログ");
        assert_eq!(catalog.grade(1).unwrap().beds, 1);
        assert_eq!(catalog.grade(7).unwrap().required_stars, 7);
        assert!(catalog.grade(8).is_err());
        assert!(!catalog.loan_products_by_amount().is_empty());
    }

    #[test]
    fn loan_products_sorted_by_descending_amount() {
        let catalog = Catalog::from_embedded().expect("組み込みカタログ");
        let products = catalog.loan_products_by_amount();
        for pair in products.windows(2) {
            assert!(pair[0].max_amount >= pair[1].max_amount);
        }
    }

    #[test]
    fn star_derivation_uses_highest_reached_threshold() {
        let catalog = Catalog::from_embedded().expect("組み込みカタログ");
        assert_eq!(catalog.star_for(0).unwrap(), 1);
        assert_eq!(catalog.star_for(1_199).unwrap(), 1);
        assert_eq!(catalog.star_for(1_200).unwrap(), 2);
        assert_eq!(catalog.star_for(10_000_000).unwrap(), 7);
    }

    #[test]
    fn facility_bonus_scales_max_customers() {
        let catalog = Catalog::from_embedded().expect("組み込みカタログ");
        let spec = catalog.grade(3).unwrap();
        let expected = (spec.max_customers as f64 * (1.0 + spec.facility_bonus)) as i64;
        assert_eq!(catalog.max_customers(3).unwrap(), expected);
        assert!(expected > spec.max_customers as i64);
    }

    #[test]
    fn free_ads_always_win_on_efficiency() {
        let catalog = Catalog::from_embedded().expect("組み込みカタログ");
        let free = catalog.ad("free_sns").expect("無料広告");
        assert_eq!(free.cost, 0);
        for ad in catalog.ads() {
            if ad.cost > 0 {
                assert!(free.efficiency() > ad.efficiency());
            }
        }
    }

    #[test]
    fn duplicate_loan_product_is_rejected() {
        let grades = EMBEDDED_GRADES;
        let loans = r#"
products:
  - { name: starter, max_amount: 8000, daily_rate: 0.005, term_days: 5, grade_req: 1 }
  - { name: starter, max_amount: 9000, daily_rate: 0.004, term_days: 6, grade_req: 1 }
"#;
        let result = Catalog::from_sources(
            grades,
            loans,
            EMBEDDED_ADS,
            EMBEDDED_TOOLS,
            EMBEDDED_ITEMS,
            EMBEDDED_CUSTOMERS,
        );
        assert!(result.is_err());
    }

    #[test]
    fn missing_tool_grade_is_rejected() {
        let tools = r#"
tool_sets:
  - grade: 1
    tools:
      - { name: 入門機, cost: 500 }
"#;
        let result = Catalog::from_sources(
            EMBEDDED_GRADES,
            EMBEDDED_LOANS,
            EMBEDDED_ADS,
            tools,
            EMBEDDED_ITEMS,
            EMBEDDED_CUSTOMERS,
        );
        assert!(result.is_err());
    }

    #[test]
    fn threshold_gaps_are_rejected() {
        let customers = r#"
thresholds:
  - { star: 1, min_review: 0 }
  - { star: 3, min_review: 4500 }
pricing:
  model: ranked
  ranks:
    - { name: 常連, price: 30, star_req: 1, grade_req: 1 }
"#;
        let result = Catalog::from_sources(
            EMBEDDED_GRADES,
            EMBEDDED_LOANS,
            EMBEDDED_ADS,
            EMBEDDED_TOOLS,
            EMBEDDED_ITEMS,
            customers,
        );
        assert!(result.is_err());
    }
}
