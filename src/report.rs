//! Workbook assembly and persistence.
//!
//! The whole workbook is built in memory and written with a single save, so a
//! failed run never leaves a half-written report behind.

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;
use tracing::{debug, info};

use crate::error::PipelineError;
use crate::stats::{
    CategoryCount, HourlyStats, SeriesStats, SummaryStats, category_counts, hourly_stats,
};
use crate::transform::{COLUMNS, Column, EnrichedRecord};

pub const DATA_SHEET: &str = "Data";
pub const SUMMARY_SHEET: &str = "Summary";
pub const HOURLY_SHEET: &str = "Hourly";
pub const CATEGORY_SHEET: &str = "Categories";

/// The enriched table together with its three aggregate views.
#[derive(Debug, Clone)]
pub struct Report {
    pub records: Vec<EnrichedRecord>,
    pub summary: SummaryStats,
    pub hourly: Vec<HourlyStats>,
    pub categories: Vec<CategoryCount>,
}

impl Report {
    pub fn from_records(records: Vec<EnrichedRecord>) -> Self {
        let summary = SummaryStats::from_records(&records);
        let hourly = hourly_stats(&records);
        let categories = category_counts(&records);
        Self {
            records,
            summary,
            hourly,
            categories,
        }
    }
}

fn header_row(sheet: &mut Worksheet, names: &[&str]) -> Result<(), XlsxError> {
    let bold = Format::new().set_bold();
    for (col, name) in names.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &bold)?;
    }
    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

/// Writes `value` if present, leaving the cell blank otherwise.
fn write_opt(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<f64>,
) -> Result<(), XlsxError> {
    if let Some(v) = value {
        sheet.write_number(row, col, v)?;
    }
    Ok(())
}

fn data_sheet(records: &[EnrichedRecord]) -> Result<Worksheet, XlsxError> {
    let mut sheet = Worksheet::new();
    sheet.set_name(DATA_SHEET)?;
    header_row(&mut sheet, &COLUMNS.map(Column::name))?;

    let datetime = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    let date = Format::new().set_num_format("yyyy-mm-dd");
    let time = Format::new().set_num_format("hh:mm:ss");

    for (i, r) in records.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, column) in COLUMNS.into_iter().enumerate() {
            let col = col as u16;
            match column {
                Column::SettlementDate => {
                    sheet.write_datetime_with_format(row, col, &r.settlement_date, &datetime)?;
                }
                Column::Date => {
                    sheet.write_datetime_with_format(row, col, &r.date, &date)?;
                }
                Column::Time => {
                    sheet.write_datetime_with_format(row, col, &r.time, &time)?;
                }
                Column::Hour => {
                    sheet.write_number(row, col, r.hour)?;
                }
                Column::DayOfWeek => {
                    sheet.write_string(row, col, &r.day_of_week)?;
                }
                Column::Region => {
                    sheet.write_string(row, col, &r.region)?;
                }
                Column::TotalDemand => {
                    sheet.write_number(row, col, r.total_demand)?;
                }
                Column::Rrp => {
                    sheet.write_number(row, col, r.rrp)?;
                }
                Column::PriceCategory => {
                    sheet.write_string(row, col, r.price_category.label())?;
                }
                Column::PriceChange => write_opt(&mut sheet, row, col, r.price_change)?,
                Column::PriceChangePct => write_opt(&mut sheet, row, col, r.price_change_pct)?,
                Column::PeriodType => {
                    sheet.write_string(row, col, &r.period_type)?;
                }
            }
        }
    }

    sheet.autofit();
    Ok(sheet)
}

/// Labelled metric rows of the summary sheet, rounded to two decimals.
fn summary_rows(summary: &SummaryStats) -> [(&'static str, Option<f64>); 8] {
    let price = summary.price.rounded();
    let demand = summary.demand.rounded();
    [
        ("Mean price (AUD/MWh)", price.mean),
        ("Max price (AUD/MWh)", price.max),
        ("Min price (AUD/MWh)", price.min),
        ("Price std dev", price.stddev),
        ("Mean demand (MW)", demand.mean),
        ("Max demand (MW)", demand.max),
        ("Min demand (MW)", demand.min),
        ("Demand std dev", demand.stddev),
    ]
}

fn summary_sheet(summary: &SummaryStats) -> Result<Worksheet, XlsxError> {
    let mut sheet = Worksheet::new();
    sheet.set_name(SUMMARY_SHEET)?;
    header_row(&mut sheet, &["Metric", "Value"])?;

    sheet.write_string(1, 0, "Total data points")?;
    sheet.write_number(1, 1, summary.count as f64)?;
    sheet.write_string(2, 0, "Time range")?;
    sheet.write_string(2, 1, summary.time_range())?;

    for (i, (label, value)) in summary_rows(summary).into_iter().enumerate() {
        let row = i as u32 + 3;
        sheet.write_string(row, 0, label)?;
        write_opt(&mut sheet, row, 1, value)?;
    }

    sheet.autofit();
    Ok(sheet)
}

/// Values after the HOUR column of one hourly row, rounded to two decimals.
fn hourly_values(h: &HourlyStats) -> [Option<f64>; 7] {
    let SeriesStats {
        mean,
        max,
        min,
        stddev,
    } = h.price.rounded();
    let demand = h.demand.rounded();
    [mean, max, min, stddev, demand.mean, demand.max, demand.min]
}

fn hourly_sheet(hourly: &[HourlyStats]) -> Result<Worksheet, XlsxError> {
    let mut sheet = Worksheet::new();
    sheet.set_name(HOURLY_SHEET)?;
    header_row(
        &mut sheet,
        &[
            "HOUR",
            "Mean price",
            "Max price",
            "Min price",
            "Price std dev",
            "Mean demand",
            "Max demand",
            "Min demand",
        ],
    )?;

    for (i, h) in hourly.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_number(row, 0, h.hour)?;
        for (col, value) in hourly_values(h).into_iter().enumerate() {
            write_opt(&mut sheet, row, col as u16 + 1, value)?;
        }
    }

    sheet.autofit();
    Ok(sheet)
}

fn category_sheet(categories: &[CategoryCount]) -> Result<Worksheet, XlsxError> {
    let mut sheet = Worksheet::new();
    sheet.set_name(CATEGORY_SHEET)?;
    header_row(&mut sheet, &["Price category", "Data points"])?;

    for (i, c) in categories.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, c.category.label())?;
        sheet.write_number(row, 1, c.count as f64)?;
    }

    sheet.autofit();
    Ok(sheet)
}

/// Builds the four-sheet workbook in memory.
pub fn build_workbook(report: &Report) -> Result<Workbook, PipelineError> {
    let mut workbook = Workbook::new();
    workbook.push_worksheet(data_sheet(&report.records)?);
    workbook.push_worksheet(summary_sheet(&report.summary)?);
    workbook.push_worksheet(hourly_sheet(&report.hourly)?);
    workbook.push_worksheet(category_sheet(&report.categories)?);
    Ok(workbook)
}

/// Builds the workbook and saves it to `path` in one write.
#[tracing::instrument(skip_all, fields(path = %path.display(), rows = report.records.len()))]
pub fn write_report(path: &Path, report: &Report) -> Result<(), PipelineError> {
    let mut workbook = build_workbook(report)?;
    debug!("Workbook assembled");
    workbook.save(path)?;
    info!(path = %path.display(), "Workbook saved");
    Ok(())
}

/// Logs the headline numbers of a finished report.
pub fn print_summary(summary: &SummaryStats) {
    let price = summary.price.rounded();
    let demand = summary.demand.rounded();
    let fmt = |v: Option<f64>| v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "n/a".to_string());

    info!(count = summary.count, "Data points");
    info!(range = %summary.time_range(), "Time range");
    info!(
        mean = %fmt(price.mean),
        max = %fmt(price.max),
        min = %fmt(price.min),
        "Price (AUD/MWh)"
    );
    info!(mean = %fmt(demand.mean), "Demand (MW)");
}

/// Prints the summary as pretty JSON on stdout.
pub fn print_json(summary: &SummaryStats) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}
