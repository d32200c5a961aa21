use std::{io::BufRead, sync::Arc, time::Duration};

use api_types::{account::AccountNew, category::CategoryNew, transaction::TransactionNew};
use chrono::{Datelike, Local};
use clap::{Subcommand, ValueEnum};
use client::{
    Client, FileStorage, PageRequest, RecordingNavigator, Session,
    resources::{accounts, categories, reports, transactions},
    views::{self, AccountKind, CategoryKind},
};

use crate::{
    config::AppConfig,
    error::{AppError, Result},
};

const PASSWORD_ENV: &str = "LEDGERLY_PASSWORD";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and keep the session on disk.
    Login {
        #[arg(long)]
        email: String,
    },
    /// End the session locally and on the server.
    Logout,
    /// Show whether a session is held.
    Status,
    /// List accounts.
    Accounts,
    AccountCreate {
        #[arg(long)]
        name: String,
        #[arg(long, value_enum)]
        kind: AccountKindArg,
        #[arg(long, default_value_t = 0.0)]
        initial_balance: f64,
    },
    /// List categories.
    Categories,
    CategoryCreate {
        #[arg(long)]
        name: String,
        #[arg(long, value_enum)]
        kind: CategoryKindArg,
    },
    /// List one page of transactions. Unusable page values fall back to
    /// the first page of ten.
    Transactions {
        #[arg(long)]
        page: Option<String>,
        #[arg(long)]
        page_size: Option<String>,
    },
    TransactionCreate {
        #[arg(long)]
        account: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        amount: f64,
        #[arg(long, value_enum)]
        kind: CategoryKindArg,
        #[arg(long)]
        note: Option<String>,
        /// Transaction date (YYYY-MM-DD), defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Monthly income/expense report, defaults to the current month.
    Report {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum AccountKindArg {
    Cash,
    Bank,
    EWallet,
}

impl From<AccountKindArg> for AccountKind {
    fn from(value: AccountKindArg) -> Self {
        match value {
            AccountKindArg::Cash => AccountKind::Cash,
            AccountKindArg::Bank => AccountKind::Bank,
            AccountKindArg::EWallet => AccountKind::EWallet,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CategoryKindArg {
    Income,
    Expense,
}

impl From<CategoryKindArg> for CategoryKind {
    fn from(value: CategoryKindArg) -> Self {
        match value {
            CategoryKindArg::Income => CategoryKind::Income,
            CategoryKindArg::Expense => CategoryKind::Expense,
        }
    }
}

/// Session and client wired from the configuration.
pub struct Context {
    pub session: Arc<Session>,
    pub client: Client,
    pub navigator: Arc<RecordingNavigator>,
}

impl Context {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let mut http = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            http = http.timeout(Duration::from_secs(secs));
        }
        let http = http.build()?;

        let navigator = Arc::new(RecordingNavigator::default());
        let session = Arc::new(
            Session::builder()
                .api_base(&config.api_base)
                .http(http.clone())
                .storage(Arc::new(FileStorage::new(&config.state_path)))
                .navigator(navigator.clone())
                .login_route(&config.login_route)
                .build()?,
        );
        session.init()?;

        let client = Client::new(http, &config.api_base, session.clone())?;
        tracing::debug!(
            api_base = %config.api_base,
            authenticated = session.is_authenticated(),
            "client ready"
        );
        Ok(Self {
            session,
            client,
            navigator,
        })
    }
}

pub async fn run(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Login { email } => {
            let password = read_password()?;
            ctx.session.login(&email, &password).await?;
            println!("Logged in as {email}.");
        }
        Command::Logout => {
            ctx.session.logout().await;
            println!("Logged out.");
        }
        Command::Status => {
            if ctx.session.is_authenticated() {
                println!("Logged in.");
            } else {
                println!("Not logged in.");
            }
        }
        Command::Accounts => {
            for account in accounts::list(&ctx.client).await? {
                println!(
                    "{:<12} {:<24} {:<10} {:>16}",
                    account.id,
                    account.name,
                    account.type_label,
                    views::format_amount(account.balance)
                );
            }
        }
        Command::AccountCreate {
            name,
            kind,
            initial_balance,
        } => {
            let payload = AccountNew {
                name,
                kind: AccountKind::from(kind).code(),
                initial_balance,
            };
            match accounts::create(&ctx.client, &payload).await? {
                Some(account) => println!("Created account {} ({}).", account.name, account.id),
                None => println!("Account created."),
            }
        }
        Command::Categories => {
            for category in categories::list(&ctx.client).await? {
                println!(
                    "{:<12} {:<24} {}",
                    category.id, category.name, category.type_label
                );
            }
        }
        Command::CategoryCreate { name, kind } => {
            let payload = CategoryNew {
                name,
                kind: CategoryKind::from(kind).code(),
            };
            match categories::create(&ctx.client, &payload).await? {
                Some(category) => {
                    println!("Created category {} ({}).", category.name, category.id)
                }
                None => println!("Category created."),
            }
        }
        Command::Transactions { page, page_size } => {
            let request = PageRequest::from_query(
                [("page", page.as_deref()), ("pageSize", page_size.as_deref())]
                    .into_iter()
                    .filter_map(|(key, value)| value.map(|value| (key, value))),
            );

            let page = transactions::list(&ctx.client, request).await?;
            for tx in &page.items {
                println!(
                    "{:<10} {:>16} {:<16} {:<16} {}",
                    tx.date_text, tx.amount_text, tx.category_name, tx.account_name, tx.note
                );
            }
            println!(
                "Page {}/{} ({} transactions)",
                page.page, page.total_pages, page.total_items
            );
            if page.has_prev() {
                println!("Previous: --page {}", page.page - 1);
            }
            if page.has_next() {
                println!("Next: --page {}", page.page + 1);
            }
        }
        Command::TransactionCreate {
            account,
            category,
            amount,
            kind,
            note,
            date,
        } => {
            let transaction_date = match date {
                Some(date) => chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                    .map_err(|err| AppError::Input(format!("date {date}: {err}")))?,
                None => Local::now().date_naive(),
            };
            let payload = TransactionNew {
                account_id: account,
                category_id: category,
                amount,
                kind: CategoryKind::from(kind).code(),
                note,
                transaction_date: transaction_date.format("%Y-%m-%d").to_string(),
            };
            match transactions::create(&ctx.client, &payload).await? {
                Some(tx) => println!("Created transaction {}.", tx.id),
                None => println!("Transaction created."),
            }
        }
        Command::Report { year, month } => {
            let today = Local::now().date_naive();
            let year = year.unwrap_or(today.year());
            let month = month.unwrap_or(today.month());
            if !(1..=12).contains(&month) {
                return Err(AppError::Input(format!("month {month} out of range")));
            }

            match reports::monthly(&ctx.client, year, month).await? {
                Some(report) => {
                    println!("Report {year}-{month:02}");
                    println!("  income   {:>16}", views::format_amount(report.income));
                    println!("  expense  {:>16}", views::format_amount(report.expense));
                    println!("  nett     {:>16}", views::format_amount(report.nett));
                    for line in &report.expense_by_category {
                        println!(
                            "    {:<20} {:>16}",
                            line.category,
                            views::format_amount(line.amount)
                        );
                    }
                }
                None => println!("No data for {year}-{month:02}."),
            }
        }
    }
    Ok(())
}

/// Password comes from the environment or the first line of stdin, never
/// from a flag.
fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }

    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(AppError::Input("empty password".to_string()));
    }
    Ok(password)
}
