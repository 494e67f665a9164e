use std::collections::{HashMap, HashSet};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::data::Record;
use crate::ir::{CellAverage, DailyAverage, GroupSummary};

/// Inclusive range of calendar days drawn by the line chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Default for DateWindow {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 3, 7).unwrap_or_default(),
        }
    }
}

/// Quantile of ascending `sorted_data` by linear interpolation at rank p*(n-1) (R-7)
pub fn quantile(sorted_data: &[f64], p: f64) -> Option<f64> {
    let n = sorted_data.len();
    if n == 0 { return None; }
    if n == 1 { return Some(sorted_data[0]); }

    let rank = p.clamp(0.0, 1.0) * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        Some(sorted_data[lower_idx])
    } else {
        let weight = rank - lower_idx as f64;
        Some(sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight)
    }
}

/// Distinct values in order of first appearance
pub fn distinct_in_order<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashSet<&'a str> = HashSet::new();
    let mut order = Vec::new();
    for v in values {
        if seen.insert(v) {
            order.push(v.to_string());
        }
    }
    order
}

/// Group items by key, keeping groups in first-seen key order
fn group_in_order<'a, T, F>(items: &'a [T], key: F) -> Vec<(&'a str, Vec<&'a T>)>
where
    F: Fn(&'a T) -> &'a str,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<(&'a str, Vec<&'a T>)> = Vec::new();
    for item in items {
        let k = key(item);
        let slot = *index.entry(k).or_insert_with(|| {
            groups.push((k, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(item);
    }
    groups
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { None } else { Some(sum / count as f64) }
}

/// Five-number summary of the Likes of each group, groups in first-seen order
pub fn summarize<F>(records: &[Record], key: F) -> Vec<GroupSummary>
where
    F: Fn(&Record) -> &str,
{
    group_in_order(records, &key)
        .into_iter()
        .filter_map(|(k, rows)| {
            let mut ys: Vec<f64> = rows.iter().map(|r| r.likes as f64).collect();
            ys.sort_by(|a, b| a.total_cmp(b));

            Some(GroupSummary {
                key: k.to_string(),
                count: ys.len(),
                min: *ys.first()?,
                q1: quantile(&ys, 0.25)?,
                median: quantile(&ys, 0.50)?,
                q3: quantile(&ys, 0.75)?,
                max: *ys.last()?,
            })
        })
        .collect()
}

/// Mean Likes per (key1, key2) pair present in the data.
/// Outer keys in first-seen order, inner keys in first-seen order within their outer key.
pub fn mean_by_two_keys<F1, F2>(records: &[Record], key1: F1, key2: F2) -> Vec<CellAverage>
where
    F1: Fn(&Record) -> &str,
    F2: Fn(&Record) -> &str,
{
    let mut cells = Vec::new();
    for (outer, rows) in group_in_order(records, &key1) {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut inner: Vec<(&str, Vec<f64>)> = Vec::new();
        for r in rows {
            let k = key2(r);
            let slot = *index.entry(k).or_insert_with(|| {
                inner.push((k, Vec::new()));
                inner.len() - 1
            });
            inner[slot].1.push(r.likes as f64);
        }
        for (sub, values) in inner {
            if let Some(m) = mean(values.into_iter()) {
                cells.push(CellAverage {
                    group: outer.to_string(),
                    subgroup: sub.to_string(),
                    mean: m,
                });
            }
        }
    }
    cells
}

/// Mean Likes per calendar day, in chronological order
pub fn mean_by_date(records: &[Record]) -> Vec<DailyAverage> {
    let mut by_day: HashMap<NaiveDate, (f64, usize)> = HashMap::new();
    for r in records {
        let entry = by_day.entry(r.date).or_insert((0.0, 0));
        entry.0 += r.likes as f64;
        entry.1 += 1;
    }

    let mut daily: Vec<DailyAverage> = by_day
        .into_iter()
        .map(|(date, (sum, count))| DailyAverage { date, avg_likes: sum / count as f64 })
        .collect();
    daily.sort_by_key(|d| d.date);
    daily
}

/// Daily averages ready for the line chart
pub fn compute_daily_averages(records: &[Record]) -> Vec<DailyAverage> {
    mean_by_date(records)
}

/// Entries whose date falls inside `window` (both ends inclusive)
pub fn filter_window(daily: &[DailyAverage], window: &DateWindow) -> Vec<DailyAverage> {
    daily.iter().filter(|d| window.contains(d.date)).cloned().collect()
}
