use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "report-uploader",
    about = "Send test result reports, tagged with CI build and job info, to the test results database"
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Directory containing <test-type>.json reports (default: result-reports)
    #[arg(long)]
    pub reports_dir: Option<PathBuf>,

    /// Endpoint that stores report envelopes (default: https://amp-test-cases.appspot.com/report)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// TOML config file with `endpoint` and `reports_dir` keys.
    /// When omitted, config/report-upload.toml is used if it exists.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the envelopes that would be sent without uploading anything
    #[arg(long)]
    pub dry_run: bool,

    /// Disable per-report progress spinners
    #[arg(long)]
    pub no_progress: bool,
}
