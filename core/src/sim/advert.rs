/// 購入済み広告キャンペーン。ブーストは毎日一定量ずつ減衰し、
/// 日数切れか効果切れで破棄される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdInstance {
    kind: String,
    remaining_days: u32,
    current_boost: i64,
}

impl AdInstance {
    pub fn new(kind: impl Into<String>, duration: u32, boost: i64) -> Self {
        Self {
            kind: kind.into(),
            remaining_days: duration,
            current_boost: boost,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn remaining_days(&self) -> u32 {
        self.remaining_days
    }

    pub fn current_boost(&self) -> i64 {
        self.current_boost
    }

    /// 本日分のブーストを返してから減衰させる。
    pub(crate) fn consume_daily_boost(&mut self, decay: i64) -> i64 {
        let boost = self.current_boost;
        self.current_boost -= decay;
        self.remaining_days = self.remaining_days.saturating_sub(1);
        boost
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_days == 0 || self.current_boost <= 0
    }
}
