//! Derived columns: calendar decomposition, price movement and price bucket.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use std::fmt;

use crate::parser::RawRecord;

/// A column of the data sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    SettlementDate,
    Date,
    Time,
    Hour,
    DayOfWeek,
    Region,
    TotalDemand,
    Rrp,
    PriceCategory,
    PriceChange,
    PriceChangePct,
    PeriodType,
}

/// Column order of the data sheet.
pub const COLUMNS: [Column; 12] = [
    Column::SettlementDate,
    Column::Date,
    Column::Time,
    Column::Hour,
    Column::DayOfWeek,
    Column::Region,
    Column::TotalDemand,
    Column::Rrp,
    Column::PriceCategory,
    Column::PriceChange,
    Column::PriceChangePct,
    Column::PeriodType,
];

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Column::SettlementDate => "SETTLEMENTDATE",
            Column::Date => "DATE",
            Column::Time => "TIME",
            Column::Hour => "HOUR",
            Column::DayOfWeek => "DAY_OF_WEEK",
            Column::Region => "REGION",
            Column::TotalDemand => "TOTALDEMAND",
            Column::Rrp => "RRP",
            Column::PriceCategory => "PRICE_CATEGORY",
            Column::PriceChange => "PRICE_CHANGE",
            Column::PriceChangePct => "PRICE_CHANGE_PCT",
            Column::PeriodType => "PERIODTYPE",
        }
    }
}

/// Coarse price bucket in AUD/MWh.
///
/// | Range            | Category  |
/// |------------------|-----------|
/// | < 50             | Low       |
/// | 50 ..< 100       | Medium    |
/// | 100 ..< 200      | High      |
/// | >= 200           | Extreme   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PriceCategory {
    Low,
    Medium,
    High,
    Extreme,
}

impl PriceCategory {
    pub fn classify(price: f64) -> Self {
        match price {
            p if p < 50.0 => PriceCategory::Low,
            p if p < 100.0 => PriceCategory::Medium,
            p if p < 200.0 => PriceCategory::High,
            _ => PriceCategory::Extreme,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriceCategory::Low => "Low (<50)",
            PriceCategory::Medium => "Medium (50-100)",
            PriceCategory::High => "High (100-200)",
            PriceCategory::Extreme => "Extreme (>=200)",
        }
    }
}

impl fmt::Display for PriceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub settlement_date: NaiveDateTime,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub hour: u32,
    pub day_of_week: String,
    pub region: String,
    pub total_demand: f64,
    pub rrp: f64,
    pub price_category: PriceCategory,
    /// `None` for the first row.
    pub price_change: Option<f64>,
    /// `None` for the first row and whenever the previous price is zero.
    pub price_change_pct: Option<f64>,
    pub period_type: String,
}

/// Rounds half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Adds derived fields to every record, in file order. Never drops a row.
pub fn enrich(records: Vec<RawRecord>) -> Vec<EnrichedRecord> {
    let mut previous: Option<f64> = None;

    records
        .into_iter()
        .map(|r| {
            let price_change = previous.map(|prev| r.rrp - prev);
            let price_change_pct = match (price_change, previous) {
                (Some(delta), Some(prev)) if prev != 0.0 => Some(round2(delta / prev * 100.0)),
                _ => None,
            };
            previous = Some(r.rrp);

            EnrichedRecord {
                date: r.settlement_date.date(),
                time: r.settlement_date.time(),
                hour: r.settlement_date.hour(),
                day_of_week: r.settlement_date.format("%A").to_string(),
                price_category: PriceCategory::classify(r.rrp),
                price_change,
                price_change_pct,
                settlement_date: r.settlement_date,
                region: r.region,
                total_demand: r.total_demand,
                rrp: r.rrp,
                period_type: r.period_type,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(ts: &str, rrp: f64) -> RawRecord {
        RawRecord {
            settlement_date: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap(),
            region: "QLD1".to_string(),
            total_demand: 6000.0,
            rrp,
            period_type: "TRADE".to_string(),
        }
    }

    #[test]
    fn test_column_order_is_fixed() {
        let names: Vec<&str> = COLUMNS.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "SETTLEMENTDATE",
                "DATE",
                "TIME",
                "HOUR",
                "DAY_OF_WEEK",
                "REGION",
                "TOTALDEMAND",
                "RRP",
                "PRICE_CATEGORY",
                "PRICE_CHANGE",
                "PRICE_CHANGE_PCT",
                "PERIODTYPE",
            ]
        );
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(PriceCategory::classify(-1000.0), PriceCategory::Low);
        assert_eq!(PriceCategory::classify(49.99), PriceCategory::Low);
        assert_eq!(PriceCategory::classify(50.0), PriceCategory::Medium);
        assert_eq!(PriceCategory::classify(99.99), PriceCategory::Medium);
        assert_eq!(PriceCategory::classify(100.0), PriceCategory::High);
        assert_eq!(PriceCategory::classify(199.99), PriceCategory::High);
        assert_eq!(PriceCategory::classify(200.0), PriceCategory::Extreme);
        assert_eq!(PriceCategory::classify(17500.0), PriceCategory::Extreme);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(266.666666), 266.67);
        assert_eq!(round2(50.0), 50.0);
        assert_eq!(round2(-12.344), -12.34);
    }

    #[test]
    fn test_enrich_three_rows() {
        let rows = vec![
            raw("2024-01-01 00:05:00", 40.0),
            raw("2024-01-01 00:10:00", 60.0),
            raw("2024-01-01 01:00:00", 220.0),
        ];
        let enriched = enrich(rows);

        assert_eq!(enriched.len(), 3);
        let categories: Vec<_> = enriched.iter().map(|r| r.price_category).collect();
        assert_eq!(
            categories,
            vec![PriceCategory::Low, PriceCategory::Medium, PriceCategory::Extreme]
        );
        let deltas: Vec<_> = enriched.iter().map(|r| r.price_change).collect();
        assert_eq!(deltas, vec![None, Some(20.0), Some(160.0)]);
        let pcts: Vec<_> = enriched.iter().map(|r| r.price_change_pct).collect();
        assert_eq!(pcts, vec![None, Some(50.0), Some(266.67)]);
        let hours: Vec<_> = enriched.iter().map(|r| r.hour).collect();
        assert_eq!(hours, vec![0, 0, 1]);
    }

    #[test]
    fn test_enrich_calendar_fields() {
        let enriched = enrich(vec![raw("2024-01-01 13:30:00", 10.0)]);
        let r = &enriched[0];
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(r.time, NaiveTime::from_hms_opt(13, 30, 0).unwrap());
        assert_eq!(r.hour, 13);
        assert_eq!(r.day_of_week, "Monday");
    }

    #[test]
    fn test_zero_previous_price_has_delta_but_no_pct() {
        let enriched = enrich(vec![
            raw("2024-01-01 00:05:00", 0.0),
            raw("2024-01-01 00:10:00", 25.0),
        ]);
        assert_eq!(enriched[1].price_change, Some(25.0));
        assert_eq!(enriched[1].price_change_pct, None);
    }

    #[test]
    fn test_negative_prices_keep_sign_of_delta() {
        let enriched = enrich(vec![
            raw("2024-01-01 00:05:00", -20.0),
            raw("2024-01-01 00:10:00", -30.0),
        ]);
        assert_eq!(enriched[1].price_change, Some(-10.0));
        // relative to the previous price, which is negative here
        assert_eq!(enriched[1].price_change_pct, Some(50.0));
    }

    #[test]
    fn test_enrich_preserves_row_count() {
        let rows: Vec<_> = (0..48)
            .map(|i| {
                let ts = format!("2024-01-02 {:02}:{:02}:00", i / 2, (i % 2) * 30);
                raw(&ts, i as f64 * 7.5)
            })
            .collect();
        assert_eq!(enrich(rows).len(), 48);
    }
}
