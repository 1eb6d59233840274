use std::fmt;
use std::path::{Path, PathBuf};

pub const BASE_URL: &str = "https://aemo.com.au/aemo/data/nem/priceanddemand";
pub const LANDING_URL: &str = "https://aemo.com.au/";
pub const MANUAL_DOWNLOAD_URL: &str = "https://aemo.com.au/energy-systems/electricity/national-electricity-market-nem/data-nem/aggregated-data";

/// Identifies one monthly price-and-demand file for a NEM region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    pub year: i32,
    pub month: u32,
    pub region: String,
}

impl ResourceId {
    pub fn new(year: i32, month: u32, region: impl Into<String>) -> Self {
        Self {
            year,
            month,
            region: region.into(),
        }
    }

    /// `PRICE_AND_DEMAND_202401_QLD1.csv`
    pub fn file_name(&self) -> String {
        format!(
            "PRICE_AND_DEMAND_{}{:02}_{}.csv",
            self.year, self.month, self.region
        )
    }

    pub fn url(&self) -> String {
        format!("{}/{}", BASE_URL, self.file_name())
    }

    /// Lower-case region code without the trailing region number (`QLD1` -> `qld`).
    pub fn region_slug(&self) -> String {
        self.region
            .trim_end_matches(|c: char| c.is_ascii_digit())
            .to_ascii_lowercase()
    }

    /// Where the downloaded CSV is kept, e.g. `qld_data_2024_01.csv`.
    pub fn raw_csv_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!(
            "{}_data_{}_{:02}.csv",
            self.region_slug(),
            self.year,
            self.month
        ))
    }

    /// Workbook path, e.g. `qld_electricity_data_2024_1.xlsx`.
    pub fn report_path(&self, dir: &Path, label: &str) -> PathBuf {
        dir.join(format!("{}_{}_{}.xlsx", label, self.year, self.month))
    }

    pub fn default_label(&self) -> String {
        format!("{}_electricity_data", self.region_slug())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-{:02}", self.region, self.year, self.month)
    }
}
