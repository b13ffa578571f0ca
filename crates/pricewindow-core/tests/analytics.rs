use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use pricewindow_core::analytics::{
    average, is_chronological, maximum, minimum, most_expensive_window, sort_chronologically,
    statistics, summarize,
};
use pricewindow_parser::{parse_upload, sentinel_timestamp, PriceRecord};
use rust_decimal::Decimal;

fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

fn half_hour(slot: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2017, 1, 10)
        .unwrap()
        .and_hms_opt(slot / 2, (slot % 2) * 30, 0)
        .unwrap()
}

fn series(values: &[&str]) -> Vec<PriceRecord> {
    values
        .iter()
        .enumerate()
        .map(|(slot, value)| PriceRecord::new(half_hour(slot as u32), dec(value)))
        .collect()
}

#[test]
fn most_expensive_window_picks_largest_adjacent_sum() {
    let records = series(&["10", "40", "25", "25"]);
    let window = most_expensive_window(&records).expect("window");

    assert_eq!(window.start_index, 1);
    assert_eq!(window.left, records[1]);
    assert_eq!(window.right, records[2]);
    assert_eq!(window.combined_value, dec("65"));
    assert_eq!(window.price_difference, dec("15"));
}

#[test]
fn most_expensive_window_prefers_earliest_pair_on_ties() {
    let records = series(&["30", "30", "10"]);
    assert_eq!(most_expensive_window(&records).unwrap().start_index, 0);

    let records = series(&["10", "30", "10", "30"]);
    assert_eq!(most_expensive_window(&records).unwrap().start_index, 0);
}

#[test]
fn most_expensive_window_handles_negative_prices() {
    let records = series(&["-5", "-3", "-10"]);
    let window = most_expensive_window(&records).expect("window");
    assert_eq!(window.start_index, 0);
    assert_eq!(window.combined_value, dec("-8"));
    assert_eq!(window.price_difference, dec("2"));
}

#[test]
fn most_expensive_window_needs_two_records() {
    assert!(most_expensive_window(&[]).is_none());
    assert!(most_expensive_window(&series(&["99"])).is_none());
    assert_eq!(
        most_expensive_window(&series(&["1", "2"])).unwrap().start_index,
        0
    );
}

#[test]
fn most_expensive_window_uses_slice_order() {
    let mut records = series(&["50", "10", "45"]);
    records.swap(0, 2);
    // 45 + 10 and 10 + 50 in slice order, regardless of timestamps.
    let window = most_expensive_window(&records).expect("window");
    assert_eq!(window.start_index, 1);
    assert_eq!(window.combined_value, dec("60"));
}

#[test]
fn average_rounds_to_two_places_away_from_zero() {
    assert_eq!(average(&series(&["10", "20", "30"])), dec("20"));
    assert_eq!(average(&series(&["10", "20", "30"])).to_string(), "20.00");
    assert_eq!(average(&series(&["1", "2"])).to_string(), "1.50");
    assert_eq!(average(&series(&["1.005"])), dec("1.01"));
    assert_eq!(average(&series(&["-1.005"])), dec("-1.01"));
    assert_eq!(average(&series(&["1", "1", "2"])), dec("1.33"));
}

#[test]
fn empty_series_yields_zeroes() {
    assert_eq!(minimum(&[]), Decimal::ZERO);
    assert_eq!(maximum(&[]), Decimal::ZERO);
    assert_eq!(average(&[]), Decimal::ZERO);

    let stats = statistics(&[]);
    assert_eq!(stats.count, 0);
    assert_eq!(stats.average, Decimal::ZERO);
}

#[test]
fn minimum_and_maximum_follow_values() {
    let records = series(&["12.5", "-3", "99.125", "0"]);
    assert_eq!(minimum(&records), dec("-3"));
    assert_eq!(maximum(&records), dec("99.125"));
}

#[test]
fn sort_chronologically_is_stable_and_moves_sentinels_first() {
    let mut records = vec![
        PriceRecord::new(half_hour(3), dec("1")),
        PriceRecord::new(half_hour(1), dec("2")),
        PriceRecord::new(half_hour(1), dec("3")),
        PriceRecord::new(sentinel_timestamp(), dec("4")),
    ];
    assert!(!is_chronological(&records));

    sort_chronologically(&mut records);

    assert!(is_chronological(&records));
    let values: Vec<Decimal> = records.iter().map(|record| record.value).collect();
    assert_eq!(values, vec![dec("4"), dec("2"), dec("3"), dec("1")]);
}

#[test]
fn summarize_reference_market_sample() {
    let content = std::fs::read(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../pricewindow-parser/tests/data/market_prices.csv"),
    )
    .expect("read fixture");
    let parsed = parse_upload("market_prices.csv", &content).expect("parse");

    let summary = summarize(&parsed.records);

    assert_eq!(summary.statistics.count, 4);
    assert_eq!(summary.statistics.minimum, dec("40.88000107"));
    assert_eq!(summary.statistics.maximum, dec("50.29000092"));
    assert_eq!(summary.statistics.average, dec("47.79"));

    let window = summary.most_expensive_window.expect("window");
    assert_eq!(window.start_index, 0);
    assert_eq!(window.combined_value, dec("100.29000092"));
    assert_eq!(window.left.timestamp, half_hour(0));
    // "10/1/2017 0:30" has a single-digit hour and reads month-first.
    assert_eq!(
        window.right.timestamp,
        NaiveDate::from_ymd_opt(2017, 10, 1)
            .unwrap()
            .and_hms_opt(0, 30, 0)
            .unwrap()
    );
}
