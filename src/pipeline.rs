//! Fetch → transform → report, run once.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::error::PipelineError;
use crate::fetch::{Fetcher, HttpClient, ResourceId, manual_download_guide, save_raw};
use crate::parser::{load_records, parse_records};
use crate::report::{Report, print_summary, write_report};
use crate::transform::enrich;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Transforming,
    Reporting,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Transforming => "transforming",
            Stage::Reporting => "reporting",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Where the run writes its files and what it calls the workbook.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub resource: ResourceId,
    pub output_dir: PathBuf,
    pub label: String,
}

impl RunConfig {
    pub fn new(resource: ResourceId, output_dir: impl Into<PathBuf>) -> Self {
        let label = resource.default_label();
        Self {
            resource,
            output_dir: output_dir.into(),
            label,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn raw_csv_path(&self) -> PathBuf {
        self.resource.raw_csv_path(&self.output_dir)
    }

    pub fn report_path(&self) -> PathBuf {
        self.resource.report_path(&self.output_dir, &self.label)
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub csv_path: PathBuf,
    pub report_path: PathBuf,
    pub report: Report,
}

pub struct Pipeline<C> {
    fetcher: Fetcher<C>,
    config: RunConfig,
    stage: Stage,
}

impl<C: HttpClient> Pipeline<C> {
    pub fn new(fetcher: Fetcher<C>, config: RunConfig) -> Self {
        Self {
            fetcher,
            config,
            stage: Stage::Fetching,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, stage: Stage) {
        info!(from = %self.stage, to = %stage, "Stage transition");
        self.stage = stage;
    }

    /// Runs every stage in order, stopping at the first error.
    pub async fn run(&mut self) -> Result<Outcome, PipelineError> {
        let result = self.run_stages().await;
        if result.is_err() {
            self.enter(Stage::Failed);
        }
        result
    }

    async fn run_stages(&mut self) -> Result<Outcome, PipelineError> {
        self.stage = Stage::Fetching;
        let bytes = self.fetcher.fetch(&self.config.resource).await?;
        let csv_path = self.config.raw_csv_path();
        save_raw(&bytes, &csv_path)?;
        info!(path = %csv_path.display(), "CSV saved");

        self.enter(Stage::Transforming);
        let records = enrich(parse_records(&bytes)?);
        info!(rows = records.len(), "Records enriched");

        self.enter(Stage::Reporting);
        let report = Report::from_records(records);
        let report_path = self.config.report_path();
        write_report(&report_path, &report)?;
        print_summary(&report.summary);

        self.enter(Stage::Done);
        Ok(Outcome {
            csv_path,
            report_path,
            report,
        })
    }

    /// Runs the pipeline and turns any failure into printed diagnostics.
    /// Returns `None` when the run failed.
    pub async fn execute(&mut self) -> Option<Outcome> {
        match self.run().await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                report_failure(&e, &self.config.resource);
                None
            }
        }
    }
}

/// Transformer and reporter over a CSV that is already on disk, e.g. one
/// downloaded by hand after the site refused the automated request.
#[tracing::instrument(skip_all, fields(csv = %csv_path.display()))]
pub fn report_from_csv(csv_path: &Path, report_path: &Path) -> Result<Outcome, PipelineError> {
    let records = enrich(load_records(csv_path)?);
    info!(rows = records.len(), "Records enriched");

    let report = Report::from_records(records);
    write_report(report_path, &report)?;
    print_summary(&report.summary);

    Ok(Outcome {
        csv_path: csv_path.to_path_buf(),
        report_path: report_path.to_path_buf(),
        report,
    })
}

/// What the user can do about `err`. Only an access-denied failure has
/// anything to suggest: the likely causes and the manual download procedure.
pub fn failure_guidance(err: &PipelineError, resource: &ResourceId) -> Vec<String> {
    let PipelineError::AccessDenied { .. } = err else {
        return Vec::new();
    };
    let mut lines = vec![
        "Possible causes: the site requires a login, detected automated access, \
         or expects specific headers or cookies"
            .to_string(),
        "The file can be downloaded manually:".to_string(),
    ];
    lines.extend(manual_download_guide(resource));
    lines
}

/// Logs a diagnostic for `err`. The guidance goes out at the same level as the
/// failure so that filtering down to errors keeps it.
pub fn report_failure(err: &PipelineError, resource: &ResourceId) {
    error!(kind = ?err.kind(), error = %err, "Run failed");
    for line in failure_guidance(err, resource) {
        error!("{}", line);
    }
}
