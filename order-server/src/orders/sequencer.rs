//! Order number sequencing
//!
//! Format: `MN` + `YYMMDD` (business timezone) + 7-digit zero-padded daily
//! counter, e.g. `MN23100500000042`.
//!
//! The counter lives in `order_sequence` and is incremented with
//! `UPDATE … RETURNING` on the order's own transaction, so two concurrent
//! creates can never mint the same number. The first order of a day seeds the
//! day row from the last persisted order number, which keeps numbering
//! continuous with data written before the table existed.

use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::SqliteConnection;

use crate::db::repository::{RepoError, RepoResult, order_sequence};
use crate::utils::Clock;

pub const ORDER_NUMBER_PREFIX: &str = "MN";

/// Largest counter that fits in 7 digits
pub const MAX_DAILY_COUNTER: i64 = 9_999_999;

const DATE_CODE_LEN: usize = 6;
const COUNTER_LEN: usize = 7;

/// `YYMMDD`
pub fn date_code(date: NaiveDate) -> String {
    date.format("%y%m%d").to_string()
}

pub fn format_order_number(date_code: &str, counter: i64) -> String {
    format!("{ORDER_NUMBER_PREFIX}{date_code}{counter:0width$}", width = COUNTER_LEN)
}

/// Date code and counter parsed out of a persisted order number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastOrderNumber {
    pub date: String,
    pub number: i64,
}

impl LastOrderNumber {
    pub fn parse(order_number: &str) -> Option<Self> {
        let rest = order_number.strip_prefix(ORDER_NUMBER_PREFIX)?;
        if rest.len() < DATE_CODE_LEN + 1 || !rest.is_ascii() {
            return None;
        }
        let (date, number) = rest.split_at(DATE_CODE_LEN);
        if !date.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let number = number.parse::<i64>().ok()?;
        Some(Self {
            date: date.to_string(),
            number,
        })
    }
}

/// Counter value already consumed for `today`
///
/// No previous order, or one from an earlier day (`YYMMDD` string order),
/// means nothing has been issued yet.
pub fn issued_counter(last: Option<&LastOrderNumber>, today: &str) -> i64 {
    match last {
        Some(last) if last.date.as_str() >= today => last.number,
        _ => 0,
    }
}

/// Pure form of the sequencing rule
pub fn next_order_number(last: Option<&LastOrderNumber>, today: &str) -> String {
    format_order_number(today, issued_counter(last, today) + 1)
}

/// Issues order numbers for "today" in the business timezone
#[derive(Debug, Clone)]
pub struct OrderNumberSequencer {
    clock: Arc<dyn Clock>,
}

impl OrderNumberSequencer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn today_code(&self) -> String {
        date_code(self.clock.today())
    }

    /// Reserve the next number on the caller's transaction
    ///
    /// Rolling the transaction back releases the number.
    pub async fn next(&self, conn: &mut SqliteConnection) -> RepoResult<String> {
        let today = self.today_code();

        if order_sequence::ensure_day(conn, &today).await? {
            let last = order_sequence::find_last_order_number(conn)
                .await?
                .and_then(|n| {
                    let parsed = LastOrderNumber::parse(&n);
                    if parsed.is_none() {
                        tracing::warn!(order_number = %n, "Unparseable last order number, counter starts at 0");
                    }
                    parsed
                });
            let seed = issued_counter(last.as_ref(), &today);
            if seed > 0 {
                order_sequence::seed(conn, &today, seed).await?;
                tracing::debug!(date = %today, seed, "Order sequence seeded from last order number");
            }
        }

        let counter = order_sequence::increment(conn, &today).await?;
        if counter > MAX_DAILY_COUNTER {
            return Err(RepoError::Database(format!(
                "daily order counter exhausted for {today}"
            )));
        }
        Ok(format_order_number(&today, counter))
    }
}
