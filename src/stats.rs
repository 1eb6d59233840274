use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::transform::{EnrichedRecord, PriceCategory, round2};

/// Arithmetic mean. `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). `None` below two values.
pub fn stddev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    Some(variance.sqrt())
}

/// Mean, extremes and spread of one numeric column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SeriesStats {
    pub mean: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub stddev: Option<f64>,
}

impl SeriesStats {
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            mean: mean(values),
            max: values.iter().copied().reduce(f64::max),
            min: values.iter().copied().reduce(f64::min),
            stddev: stddev(values),
        }
    }

    /// Copy with every present value rounded to two decimals.
    pub fn rounded(&self) -> Self {
        Self {
            mean: self.mean.map(round2),
            max: self.max.map(round2),
            min: self.min.map(round2),
            stddev: self.stddev.map(round2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub first_settlement: Option<NaiveDateTime>,
    pub last_settlement: Option<NaiveDateTime>,
    pub price: SeriesStats,
    pub demand: SeriesStats,
}

impl SummaryStats {
    pub fn from_records(records: &[EnrichedRecord]) -> Self {
        let prices: Vec<f64> = records.iter().map(|r| r.rrp).collect();
        let demand: Vec<f64> = records.iter().map(|r| r.total_demand).collect();

        Self {
            count: records.len(),
            first_settlement: records.iter().map(|r| r.settlement_date).min(),
            last_settlement: records.iter().map(|r| r.settlement_date).max(),
            price: SeriesStats::from_values(&prices),
            demand: SeriesStats::from_values(&demand),
        }
    }

    /// `"<first> to <last>"`, or an empty string when there are no rows.
    pub fn time_range(&self) -> String {
        match (self.first_settlement, self.last_settlement) {
            (Some(first), Some(last)) => format!("{} to {}", first, last),
            _ => String::new(),
        }
    }
}

/// Aggregates for all rows sharing one hour of day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyStats {
    pub hour: u32,
    pub count: usize,
    pub price: SeriesStats,
    pub demand: SeriesStats,
}

/// One row per hour present in `records`, ascending by hour.
pub fn hourly_stats(records: &[EnrichedRecord]) -> Vec<HourlyStats> {
    let mut by_hour: BTreeMap<u32, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for r in records {
        let (prices, demand) = by_hour.entry(r.hour).or_default();
        prices.push(r.rrp);
        demand.push(r.total_demand);
    }

    by_hour
        .into_iter()
        .map(|(hour, (prices, demand))| HourlyStats {
            hour,
            count: prices.len(),
            price: SeriesStats::from_values(&prices),
            demand: SeriesStats::from_values(&demand),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: PriceCategory,
    pub count: usize,
}

/// Counts per price category present in `records`, most frequent first.
/// Equal counts keep bucket order.
pub fn category_counts(records: &[EnrichedRecord]) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<PriceCategory, usize> = BTreeMap::new();
    for r in records {
        *counts.entry(r.price_category).or_default() += 1;
    }

    let mut rows: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();
    // stable sort keeps bucket order among ties
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}
