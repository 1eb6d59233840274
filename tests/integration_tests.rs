use aemo_report::fetch::{Fetcher, HttpClient, LANDING_URL, ResourceId};
use aemo_report::parser::parse_records;
use aemo_report::pipeline::{Pipeline, RunConfig, Stage, report_from_csv};
use aemo_report::report::{Report, build_workbook};
use aemo_report::transform::{PriceCategory, enrich};
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;

const FIXTURE: &[u8] = include_bytes!("fixtures/price_and_demand_qld1.csv");

/// Serves the fixture for the data URL and an empty 200 for the landing page.
struct FixtureServer {
    status: u16,
}

#[async_trait]
impl HttpClient for FixtureServer {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let (status, body): (u16, &'static [u8]) = if req.url().as_str() == LANDING_URL {
            (200, &b""[..])
        } else {
            (self.status, FIXTURE)
        };
        Ok(http::Response::builder()
            .status(status)
            .body(body)
            .unwrap()
            .into())
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_fixture_transform_and_aggregates() {
    let raw = parse_records(FIXTURE).expect("Failed to parse fixture");
    let raw_len = raw.len();
    let report = Report::from_records(enrich(raw));

    assert_eq!(raw_len, 48);
    assert_eq!(report.records.len(), raw_len);
    assert_eq!(report.summary.count, 48);
    assert_eq!(report.summary.price.min, Some(-15.0));
    assert_eq!(report.summary.price.max, Some(310.0));

    // half-hourly data for one day covers every hour twice
    assert_eq!(report.hourly.len(), 24);
    assert!(report.hourly.iter().all(|h| h.count == 2));
    let nine = &report.hourly[9];
    assert_eq!(nine.hour, 9);
    assert!((nine.price.mean.unwrap() - 222.65).abs() < 1e-9);

    let total: usize = report.categories.iter().map(|c| c.count).sum();
    assert_eq!(total, 48);
    let counts: Vec<(PriceCategory, usize)> = report
        .categories
        .iter()
        .map(|c| (c.category, c.count))
        .collect();
    assert_eq!(
        counts,
        vec![
            (PriceCategory::Low, 21),
            (PriceCategory::Medium, 14),
            (PriceCategory::High, 10),
            (PriceCategory::Extreme, 3),
        ]
    );

    // a zero price has no percent change after it
    assert_eq!(report.records[37].rrp, 0.0);
    assert_eq!(report.records[37].price_change_pct, Some(-100.0));
    assert_eq!(report.records[38].price_change, Some(12.5));
    assert_eq!(report.records[38].price_change_pct, None);

    assert!(build_workbook(&report).is_ok());
}

#[test]
fn test_three_row_scenario() {
    let csv = "\
REGION,SETTLEMENTDATE,TOTALDEMAND,RRP,PERIODTYPE
QLD1,2024/01/01 00:05:00,5000,40,TRADE
QLD1,2024/01/01 00:35:00,5100,60,TRADE
QLD1,2024/01/01 01:05:00,5200,220,TRADE
";
    let report = Report::from_records(enrich(parse_records(csv.as_bytes()).unwrap()));

    let categories: Vec<_> = report.records.iter().map(|r| r.price_category).collect();
    assert_eq!(
        categories,
        vec![PriceCategory::Low, PriceCategory::Medium, PriceCategory::Extreme]
    );
    let deltas: Vec<_> = report.records.iter().map(|r| r.price_change).collect();
    assert_eq!(deltas, vec![None, Some(20.0), Some(160.0)]);
    let pcts: Vec<_> = report.records.iter().map(|r| r.price_change_pct).collect();
    assert_eq!(pcts, vec![None, Some(50.0), Some(266.67)]);

    assert_eq!(report.hourly[0].hour, 0);
    assert_eq!(report.hourly[0].price.mean, Some(50.0));
    assert_eq!(report.categories.len(), 3);
    assert!(report.categories.iter().all(|c| c.count == 1));
}

#[tokio::test]
async fn test_full_pipeline_against_stub_server() {
    let dir = scratch_dir("aemo_report_it_full");
    let fetcher = Fetcher::new(FixtureServer { status: 200 }).with_delay(0.0..=0.0).unwrap();
    let config = RunConfig::new(ResourceId::new(2024, 1, "QLD1"), &dir).with_label("qld_test");
    let mut pipeline = Pipeline::new(fetcher, config);

    let outcome = pipeline.execute().await.expect("pipeline should succeed");
    assert_eq!(pipeline.stage(), Stage::Done);
    assert_eq!(outcome.csv_path, dir.join("qld_data_2024_01.csv"));
    assert_eq!(outcome.report_path, dir.join("qld_test_2024_1.xlsx"));
    assert_eq!(fs::read(&outcome.csv_path).unwrap(), FIXTURE);
    assert!(fs::metadata(&outcome.report_path).unwrap().len() > 0);

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_forbidden_download_yields_no_result() {
    let dir = scratch_dir("aemo_report_it_403");
    let fetcher = Fetcher::new(FixtureServer { status: 403 }).with_delay(0.0..=0.0).unwrap();
    let config = RunConfig::new(ResourceId::new(2024, 1, "QLD1"), &dir);
    let mut pipeline = Pipeline::new(fetcher, config);

    assert!(pipeline.execute().await.is_none());
    assert_eq!(pipeline.stage(), Stage::Failed);
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_report_from_local_csv() {
    let dir = scratch_dir("aemo_report_it_local");
    let csv_path = dir.join("PRICE_AND_DEMAND_202401_QLD1.csv");
    fs::write(&csv_path, FIXTURE).unwrap();

    let outcome = report_from_csv(&csv_path, &dir.join("local.xlsx")).unwrap();
    assert_eq!(outcome.report.records.len(), 48);
    assert!(outcome.report_path.exists());

    fs::remove_dir_all(&dir).unwrap();
}
