#[derive(Debug, Clone, PartialEq)]
pub struct Loan {
    product: String,
    principal: i64,
    daily_rate: f64,
    term_days: u32,
    remaining_principal: i64,
    remaining_days: u32,
    accrued_interest: i64,
}

impl Loan {
    pub fn new(product: impl Into<String>, principal: i64, daily_rate: f64, term_days: u32) -> Self {
        Self {
            product: product.into(),
            principal,
            daily_rate,
            term_days,
            remaining_principal: principal,
            remaining_days: term_days,
            accrued_interest: 0,
        }
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn principal(&self) -> i64 {
        self.principal
    }

    pub fn term_days(&self) -> u32 {
        self.term_days
    }

    pub fn remaining_principal(&self) -> i64 {
        self.remaining_principal
    }

    pub fn remaining_days(&self) -> u32 {
        self.remaining_days
    }

    pub fn accrued_interest(&self) -> i64 {
        self.accrued_interest
    }

    pub fn is_paid_off(&self) -> bool {
        self.remaining_principal <= 0
    }

    pub fn accrue_daily_interest(&mut self) -> i64 {
        let daily_interest = (self.remaining_principal as f64 * self.daily_rate) as i64;
        self.accrued_interest += daily_interest;
        daily_interest
    }

    pub fn minimum_payment(&self) -> i64 {
        if self.remaining_days == 0 {
            return self.remaining_principal + self.accrued_interest;
        }
        self.remaining_principal / self.remaining_days as i64 + self.accrued_interest
    }

    /// 返済を1回分進める。`offered` は任意の追加返済額で、最低返済額を
    /// 下回る指定は最低返済額に切り上げられる。返り値は実際に動いた現金。
    pub fn make_payment(&mut self, offered: i64) -> i64 {
        if self.is_paid_off() {
            return 0;
        }

        self.accrue_daily_interest();

        let mut payment = self.minimum_payment().max(offered);

        let interest_paid = payment.min(self.accrued_interest);
        self.accrued_interest -= interest_paid;
        payment -= interest_paid;

        let principal_paid = payment.min(self.remaining_principal);
        self.remaining_principal -= principal_paid;

        self.remaining_days = self.remaining_days.saturating_sub(1);
        interest_paid + principal_paid
    }
}
