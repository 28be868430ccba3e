//! # Reporting
//!
//! Read-only aggregation over stored orders.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SalesRecord (date, total) ──┬──► weekly_sales   week{n}/MM/YYYY        │
//! │                              ├──► monthly_sales  MM/YYYY  (one year)    │
//! │                              └──► yearly_sales   YYYY     (one row)     │
//! │                                                                         │
//! │  (item, line count) ─────────┬──► popular_items    count desc, id asc   │
//! │                              └──► unpopular_items  count asc,  id asc   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! "Week" is the week of the month, `(day − 1) ÷ 7 + 1`, so every month has
//! weeks 1 to 5. It is not the ISO week.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::money::Money;

/// One order as the sales reports see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub total: Money,
}

/// Sales for one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PeriodSales {
    pub label: String,
    pub year: i32,
    pub month: Option<u32>,
    pub week: Option<u32>,
    pub total: Money,
    pub order_count: u32,
}

/// Week of the month, 1-based.
pub fn week_of_month(date: NaiveDate) -> u32 {
    (date.day() - 1) / 7 + 1
}

type BucketKey = (i32, Option<u32>, Option<u32>);

fn aggregate(
    records: impl IntoIterator<Item = SalesRecord>,
    key: impl Fn(NaiveDate) -> Option<BucketKey>,
    label: impl Fn(&BucketKey) -> String,
) -> Vec<PeriodSales> {
    let mut buckets: BTreeMap<BucketKey, (Money, u32)> = BTreeMap::new();
    for record in records {
        if let Some(k) = key(record.date) {
            let bucket = buckets.entry(k).or_insert((Money::zero(), 0));
            bucket.0 += record.total;
            bucket.1 += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(k, (total, order_count))| PeriodSales {
            label: label(&k),
            year: k.0,
            month: k.1,
            week: k.2,
            total,
            order_count,
        })
        .collect()
}

/// Sales per week of month, over every year present, oldest first.
pub fn weekly_sales(records: impl IntoIterator<Item = SalesRecord>) -> Vec<PeriodSales> {
    aggregate(
        records,
        |d| Some((d.year(), Some(d.month()), Some(week_of_month(d)))),
        |(y, m, w)| format!("week{}/{:02}/{}", w.unwrap_or_default(), m.unwrap_or_default(), y),
    )
}

/// Sales per month of `year`.
pub fn monthly_sales(records: impl IntoIterator<Item = SalesRecord>, year: i32) -> Vec<PeriodSales> {
    aggregate(
        records,
        |d| (d.year() == year).then(|| (d.year(), Some(d.month()), None)),
        |(y, m, _)| format!("{:02}/{}", m.unwrap_or_default(), y),
    )
}

/// Total sales for `year`. A year without orders reports zero.
pub fn yearly_sales(records: impl IntoIterator<Item = SalesRecord>, year: i32) -> PeriodSales {
    let mut buckets = aggregate(
        records,
        |d| (d.year() == year).then_some((year, None, None)),
        |(y, _, _)| y.to_string(),
    );
    buckets.pop().unwrap_or(PeriodSales {
        label: year.to_string(),
        year,
        month: None,
        week: None,
        total: Money::zero(),
        order_count: 0,
    })
}

// =============================================================================
// Popularity
// =============================================================================

/// How many order lines reference an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemPopularity {
    pub item_id: i64,
    pub name: String,
    pub line_count: u32,
}

/// The most-ordered items. Items never ordered are left out.
pub fn popular_items(counts: &[ItemPopularity], limit: usize) -> Vec<ItemPopularity> {
    let mut ranked: Vec<ItemPopularity> = counts
        .iter()
        .filter(|c| c.line_count > 0)
        .cloned()
        .collect();
    ranked.sort_by(|a, b| b.line_count.cmp(&a.line_count).then(a.item_id.cmp(&b.item_id)));
    ranked.truncate(limit);
    ranked
}

/// The least-ordered items, including those never ordered.
pub fn unpopular_items(counts: &[ItemPopularity], limit: usize) -> Vec<ItemPopularity> {
    let mut ranked = counts.to_vec();
    ranked.sort_by(|a, b| a.line_count.cmp(&b.line_count).then(a.item_id.cmp(&b.item_id)));
    ranked.truncate(limit);
    ranked
}
