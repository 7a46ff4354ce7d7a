mod ci;
mod cli;
mod config;
mod envelope;
mod log;
mod progress;
mod report;
mod upload;

use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => config::load_config(path, true),
        None => config::load_config(&config::default_config_path(), false),
    };
    let file_config = match file_config {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e:#}");
            std::process::exit(2);
        }
    };

    let ci = ci::CiContext::from_env();
    let cfg = config::resolve(file_config, cli.endpoint, cli.reports_dir, ci);

    if cli.verbose {
        match cfg.ci.provider {
            Some(provider) => eprintln!("CI provider: {provider}"),
            None => eprintln!("No CI provider detected"),
        }
        eprintln!("Reports directory: {}", cfg.reports_dir.display());
        eprintln!("Endpoint: {}", cfg.endpoint);
    }

    let show_progress = !cli.no_progress && !cli.dry_run;
    let uploader = match upload::Uploader::new(cfg, show_progress) {
        Ok(u) => u,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(2);
        }
    };

    if cli.dry_run {
        match uploader.dry_run().await {
            Ok(envelopes) => {
                upload::print_json(&envelopes);
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("Error: {e:#}");
                std::process::exit(2);
            }
        }
    }

    match uploader.run().await {
        Ok(summary) => {
            if summary.outcomes.is_empty() {
                eprintln!(
                    "No test result reports found in {}",
                    uploader.config().reports_dir.display()
                );
                std::process::exit(0);
            }
            if cli.verbose {
                for (test_type, outcome) in &summary.outcomes {
                    eprintln!("  {test_type}: {outcome}");
                }
            }
            eprintln!("{}", summary.summary_line());
            // Rejections and skips are reported but do not fail the build step.
            if summary.failed() > 0 {
                std::process::exit(1);
            }
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(2);
        }
    }
}
