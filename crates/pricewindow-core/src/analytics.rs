//! Summary analytics over an already-parsed price series.
//!
//! Every function here is a pure read over a caller-owned slice. Nothing is
//! cached and nothing is reordered; callers decide the order records are in.

use pricewindow_parser::PriceRecord;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

const AVERAGE_DECIMAL_PLACES: u32 = 2;

/// Smallest value in the series, or zero when it is empty.
pub fn minimum(records: &[PriceRecord]) -> Decimal {
    records
        .iter()
        .map(|record| record.value)
        .min()
        .unwrap_or(Decimal::ZERO)
}

/// Largest value in the series, or zero when it is empty.
pub fn maximum(records: &[PriceRecord]) -> Decimal {
    records
        .iter()
        .map(|record| record.value)
        .max()
        .unwrap_or(Decimal::ZERO)
}

/// Arithmetic mean rounded to two decimal places (midpoint away from zero),
/// or zero when the series is empty.
pub fn average(records: &[PriceRecord]) -> Decimal {
    if records.is_empty() {
        return Decimal::ZERO;
    }
    let total = records
        .iter()
        .fold(Decimal::ZERO, |acc, record| acc.saturating_add(record.value));
    let mut mean = (total / Decimal::from(records.len()))
        .round_dp_with_strategy(AVERAGE_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    // Already rounded, so this only pads: 20 becomes 20.00.
    mean.rescale(AVERAGE_DECIMAL_PLACES);
    mean
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceStatistics {
    pub count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub minimum: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub maximum: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub average: Decimal,
}

pub fn statistics(records: &[PriceRecord]) -> PriceStatistics {
    PriceStatistics {
        count: records.len(),
        minimum: minimum(records),
        maximum: maximum(records),
        average: average(records),
    }
}

/// Two neighbouring records and their combined value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceWindow {
    /// Position of `left` in the analysed slice; `right` is at `start_index + 1`.
    pub start_index: usize,
    pub left: PriceRecord,
    pub right: PriceRecord,
    #[serde(with = "rust_decimal::serde::float")]
    pub combined_value: Decimal,
    /// Absolute difference between the two values.
    #[serde(with = "rust_decimal::serde::float")]
    pub price_difference: Decimal,
}

impl PriceWindow {
    fn from_pair(start_index: usize, left: PriceRecord, right: PriceRecord) -> Self {
        Self {
            start_index,
            left,
            right,
            combined_value: left.value.saturating_add(right.value),
            price_difference: right.value.saturating_sub(left.value).abs(),
        }
    }
}

/// Finds the adjacent pair `(i, i + 1)` with the greatest combined value.
///
/// Pairs are taken in slice order and the first pair wins ties. The slice must
/// already be sorted by timestamp ascending for the result to describe a
/// period of time; this function does not sort (see [`sort_chronologically`]).
///
/// Returns `None` when there are fewer than two records.
pub fn most_expensive_window(records: &[PriceRecord]) -> Option<PriceWindow> {
    let mut best: Option<PriceWindow> = None;
    for (idx, pair) in records.windows(2).enumerate() {
        let candidate = PriceWindow::from_pair(idx, pair[0], pair[1]);
        match best {
            Some(current) if candidate.combined_value <= current.combined_value => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Stable ascending sort by timestamp; records with equal timestamps keep
/// their source order.
pub fn sort_chronologically(records: &mut [PriceRecord]) {
    records.sort_by_key(|record| record.timestamp);
}

pub fn is_chronological(records: &[PriceRecord]) -> bool {
    records
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceSummary {
    pub statistics: PriceStatistics,
    pub most_expensive_window: Option<PriceWindow>,
}

pub fn summarize(records: &[PriceRecord]) -> PriceSummary {
    PriceSummary {
        statistics: statistics(records),
        most_expensive_window: most_expensive_window(records),
    }
}
