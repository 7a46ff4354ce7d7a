use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar};
use reqwest::header::CONTENT_TYPE;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::{Id, JoinSet};

use crate::config::UploaderConfig;
use crate::envelope::{self, Envelope};
use crate::log;
use crate::progress;
use crate::report::{self, TestType};

/// What happened to a single report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The endpoint accepted the envelope.
    Reported,
    /// The endpoint answered with a non-success status.
    Rejected { status: u16, body: String },
    /// Nothing was sent: the report could not be loaded or the CI context is incomplete.
    Skipped { reason: String },
    /// Transport error or panicked task.
    Failed { error: String },
}

impl UploadOutcome {
    fn spinner_status(&self) -> String {
        match self {
            UploadOutcome::Reported => "reported".to_string(),
            UploadOutcome::Rejected { status, .. } => format!("rejected ({status})"),
            UploadOutcome::Skipped { .. } => "skipped".to_string(),
            UploadOutcome::Failed { .. } => "FAILED".to_string(),
        }
    }
}

impl std::fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadOutcome::Reported => write!(f, "reported"),
            UploadOutcome::Rejected { status, body } => {
                write!(f, "rejected (HTTP {status}): {}", body.trim())
            }
            UploadOutcome::Skipped { reason } => write!(f, "skipped: {reason}"),
            UploadOutcome::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Per-type outcomes of a full run, sorted by test type.
#[derive(Debug, Default)]
pub struct UploadSummary {
    pub outcomes: Vec<(TestType, UploadOutcome)>,
}

impl UploadSummary {
    fn count(&self, pred: impl Fn(&UploadOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }

    pub fn reported(&self) -> usize {
        self.count(|o| matches!(o, UploadOutcome::Reported))
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, UploadOutcome::Rejected { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, UploadOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, UploadOutcome::Failed { .. }))
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{}/{} reports uploaded, {} rejected, {} skipped, {} failed",
            self.reported(),
            self.outcomes.len(),
            self.rejected(),
            self.skipped(),
            self.failed()
        )
    }
}

/// Uploads test result reports to the storage endpoint.
///
/// Cloning is cheap: configuration is shared and the HTTP client is pooled.
#[derive(Clone)]
pub struct Uploader {
    config: Arc<UploaderConfig>,
    client: reqwest::Client,
    progress: MultiProgress,
}

impl Uploader {
    pub fn new(config: UploaderConfig, show_progress: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("report-uploader/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Uploader {
            config: Arc::new(config),
            client,
            progress: progress::multi_progress(show_progress),
        })
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    /// Read and parse a report from the reports directory.
    ///
    /// A missing file and a malformed one both log an error and return `None`.
    pub async fn load_report(&self, test_type: &TestType) -> Option<serde_json::Value> {
        match report::load_report(&self.config.reports_dir, test_type).await {
            Ok(report) => Some(report),
            Err(e) => {
                self.progress
                    .suspend(|| log::error(&log::load_error_line(test_type, &e)));
                None
            }
        }
    }

    /// Load a report and wrap it in an envelope.
    ///
    /// `Err` is the reason the report is skipped; it has already been logged.
    async fn prepare(&self, test_type: &TestType) -> Result<Envelope> {
        let Some(results) = self.load_report(test_type).await else {
            anyhow::bail!("could not load {}", test_type.file_name());
        };
        envelope::build_envelope(&self.config.ci, test_type, results).inspect_err(|e| {
            self.progress
                .suspend(|| log::error(&log::envelope_error_line(test_type, e)));
        })
    }

    /// Load, wrap and POST a single report.
    ///
    /// A non-success status is a soft failure reported as
    /// [`UploadOutcome::Rejected`]; only transport errors are returned as `Err`.
    pub async fn upload_one(&self, test_type: &TestType) -> Result<UploadOutcome> {
        let envelope = match self.prepare(test_type).await {
            Ok(envelope) => envelope,
            Err(e) => {
                return Ok(UploadOutcome::Skipped {
                    reason: format!("{e:#}"),
                });
            }
        };

        let endpoint = &self.config.endpoint;
        let body = serde_json::to_vec(&envelope).context("Failed to serialize report envelope")?;
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .with_context(|| format!("Failed to POST {test_type} results to {endpoint}"))?;

        let status = response.status();
        if status.is_success() {
            self.progress
                .suspend(|| log::info(&log::reported_line(test_type, endpoint)));
            return Ok(UploadOutcome::Reported);
        }

        let text = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable response body: {e}>"));
        self.progress
            .suspend(|| log::warning(&log::rejected_line(test_type, status.as_u16(), &text)));
        Ok(UploadOutcome::Rejected {
            status: status.as_u16(),
            body: text,
        })
    }

    /// Discover every report and upload them all concurrently.
    ///
    /// Each upload runs in its own task; a failed or panicked task never
    /// affects its siblings. Only a failure to list the reports directory
    /// aborts the run.
    pub async fn run(&self) -> Result<UploadSummary> {
        let test_types = report::discover_report_types(&self.config.reports_dir)?;

        let mut set = JoinSet::new();
        let mut pending = HashMap::new();

        for test_type in test_types {
            let uploader = self.clone();
            let pb = progress::report_spinner(&self.progress, test_type.as_str());
            let label = test_type.clone();
            let task_pb = pb.clone();

            let handle = set.spawn(async move {
                let outcome = match uploader.upload_one(&test_type).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        uploader
                            .progress
                            .suspend(|| log::error(&log::transport_error_line(&test_type, &e)));
                        UploadOutcome::Failed {
                            error: format!("{e:#}"),
                        }
                    }
                };
                task_pb.finish_with_message(format!("{test_type}: {}", outcome.spinner_status()));
                (test_type, outcome)
            });
            pending.insert(handle.id(), (label, pb));
        }

        Ok(self.collect_outcomes(set, pending).await)
    }

    /// Drain the upload tasks, turning a panicked task into a `Failed` outcome
    /// and finishing its spinner.
    async fn collect_outcomes(
        &self,
        mut set: JoinSet<(TestType, UploadOutcome)>,
        mut pending: HashMap<Id, (TestType, ProgressBar)>,
    ) -> UploadSummary {
        let mut summary = UploadSummary::default();
        while let Some(res) = set.join_next_with_id().await {
            match res {
                Ok((id, pair)) => {
                    pending.remove(&id);
                    summary.outcomes.push(pair);
                }
                Err(e) => {
                    let (test_type, pb) = match pending.remove(&e.id()) {
                        Some(entry) => entry,
                        None => (TestType::Other("unknown".to_string()), ProgressBar::hidden()),
                    };
                    let outcome = UploadOutcome::Failed {
                        error: format!("task panic: {e}"),
                    };
                    self.progress
                        .suspend(|| log::error(&format!("Upload task for {test_type} panicked: {e}")));
                    pb.finish_with_message(format!("{test_type}: {}", outcome.spinner_status()));
                    summary.outcomes.push((test_type, outcome));
                }
            }
        }

        summary.outcomes.sort_by(|a, b| a.0.cmp(&b.0));
        summary
    }

    /// Build every envelope without sending anything.
    pub async fn dry_run(&self) -> Result<Vec<Envelope>> {
        let test_types = report::discover_report_types(&self.config.reports_dir)?;
        let mut envelopes = Vec::new();
        for test_type in &test_types {
            if let Ok(envelope) = self.prepare(test_type).await {
                envelopes.push(envelope);
            }
        }
        Ok(envelopes)
    }
}

/// Print envelopes as pretty JSON.
pub fn print_json(envelopes: &[Envelope]) {
    match serde_json::to_string_pretty(envelopes) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error serializing JSON: {e}"),
    }
}
