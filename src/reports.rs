use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::models::{Field, SalesTable, UNKNOWN, UNKNOWN_ITEM};

// ---------------------------------------------------------------------------
// Unknown ratios
// ---------------------------------------------------------------------------

/// Categorical columns whose placeholder share is reported after cleaning.
pub const MONITORED: [(Field, &str); 3] = [
    (Field::Item, UNKNOWN_ITEM),
    (Field::PaymentMethod, UNKNOWN),
    (Field::Location, UNKNOWN),
];

#[derive(Debug, Clone, PartialEq)]
pub struct UnknownRatio {
    pub field: Field,
    pub unknown: usize,
    pub total: usize,
}

impl UnknownRatio {
    /// Percentage of rows holding the placeholder. An empty table reports 0.
    pub fn pct(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.unknown as f64 / self.total as f64 * 100.0
    }
}

impl fmt::Display for UnknownRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.2}% unknown", self.field.key(), self.pct())
    }
}

pub fn unknown_ratios(table: &SalesTable) -> Vec<UnknownRatio> {
    MONITORED
        .iter()
        .map(|&(field, placeholder)| UnknownRatio {
            field,
            unknown: table
                .rows
                .iter()
                .filter(|row| row.text(field) == Some(placeholder))
                .count(),
            total: table.len(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Revenue by item
// ---------------------------------------------------------------------------

/// The two columns of a cleaned file that revenue reporting needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RevenueRow {
    pub item: Option<String>,
    pub total_spent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevenueItem {
    pub item: String,
    pub total: f64,
    pub count: usize,
}

pub struct RevenueBreakdown {
    /// Highest revenue first; ties in item name order.
    pub items: Vec<RevenueItem>,
    pub total: f64,
}

impl RevenueBreakdown {
    pub fn top(&self, n: usize) -> &[RevenueItem] {
        &self.items[..n.min(self.items.len())]
    }

    /// Rows counted across all items. Rows without an item are not included.
    pub fn count(&self) -> usize {
        self.items.iter().map(|i| i.count).sum()
    }

    /// Share of overall revenue, as a percentage.
    pub fn pct(&self, item: &RevenueItem) -> f64 {
        if self.total == 0.0 {
            return 0.0;
        }
        item.total / self.total * 100.0
    }
}

pub fn revenue_by_item(rows: &[RevenueRow]) -> RevenueBreakdown {
    let mut by_item: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for row in rows {
        let Some(item) = row.item.as_deref() else {
            continue;
        };
        let entry = by_item.entry(item).or_default();
        entry.0 += row.total_spent.unwrap_or(0.0);
        entry.1 += 1;
    }

    let mut items: Vec<RevenueItem> = by_item
        .into_iter()
        .map(|(item, (total, count))| RevenueItem {
            item: item.to_string(),
            total,
            count,
        })
        .collect();
    // Stable sort keeps name order among equal totals
    items.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));

    let total = items.iter().map(|i| i.total).sum();
    RevenueBreakdown { items, total }
}
