//! Wire payloads mapped into display-ready shapes.

use api_types::{
    account::Account,
    category::Category,
    report::{CategoryAmount, MonthlyReport},
    transaction::Transaction,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountKind {
    Cash,
    Bank,
    EWallet,
}

impl AccountKind {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Cash),
            2 => Some(Self::Bank),
            3 => Some(Self::EWallet),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Cash => 1,
            Self::Bank => 2,
            Self::EWallet => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::Bank => "Bank",
            Self::EWallet => "E-Wallet",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Income),
            2 => Some(Self::Expense),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Income => 1,
            Self::Expense => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AccountView {
    pub id: String,
    pub name: String,
    pub balance: f64,
    pub kind: Option<AccountKind>,
    pub type_label: &'static str,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CategoryView {
    pub id: String,
    pub name: String,
    pub kind: Option<CategoryKind>,
    pub type_label: &'static str,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransactionView {
    pub id: String,
    pub amount: f64,
    /// Signed, grouped amount, e.g. `- 12,500`.
    pub amount_text: String,
    pub category_name: String,
    pub account_name: String,
    pub kind: CategoryKind,
    /// `YYYY-MM-DD`, empty when the date is missing or unreadable.
    pub date_text: String,
    pub note: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReportView {
    pub income: f64,
    pub expense: f64,
    pub nett: f64,
    pub income_by_category: Vec<CategoryAmount>,
    pub expense_by_category: Vec<CategoryAmount>,
}

pub fn account_view(account: &Account) -> AccountView {
    let kind = AccountKind::from_code(account.kind);
    AccountView {
        id: account.id.clone(),
        name: account.name.clone(),
        balance: account.balance,
        kind,
        type_label: kind.map_or("Unknown", AccountKind::label),
    }
}

pub fn category_view(category: &Category) -> CategoryView {
    let kind = CategoryKind::from_code(category.kind);
    CategoryView {
        id: category.id.clone(),
        name: category.name.clone(),
        kind,
        type_label: kind.map_or("Unknown", CategoryKind::label),
    }
}

pub fn transaction_view(tx: &Transaction) -> TransactionView {
    let sign = if tx.kind == Some(2) { '-' } else { '+' };
    TransactionView {
        id: tx.id.clone(),
        amount: tx.amount,
        amount_text: format!("{sign} {}", format_amount(tx.amount)),
        account_name: tx
            .account_name
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        category_name: tx
            .category_name
            .clone()
            .unwrap_or_else(|| "Uncategorized".to_string()),
        kind: if tx.kind == Some(1) {
            CategoryKind::Income
        } else {
            CategoryKind::Expense
        },
        date_text: tx
            .transaction_date
            .as_deref()
            .and_then(parse_date)
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        note: tx.note.clone().unwrap_or_else(|| "-No note-".to_string()),
    }
}

impl From<MonthlyReport> for ReportView {
    fn from(report: MonthlyReport) -> Self {
        Self {
            income: report.income,
            expense: report.expense,
            nett: report.nett,
            income_by_category: report.income_by_category.unwrap_or_default(),
            expense_by_category: report.expense_by_category.unwrap_or_default(),
        }
    }
}

/// Accepts RFC 3339 timestamps, offset-less timestamps and plain dates.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Groups thousands and keeps at most two decimals: `1234567.5` becomes
/// `1,234,567.5`.
pub fn format_amount(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    match fraction {
        0 => format!("{sign}{grouped}"),
        f if f % 10 == 0 => format!("{sign}{grouped}.{}", f / 10),
        f => format!("{sign}{grouped}.{f:02}"),
    }
}
