//! Styled status lines on stderr.
//!
//! Line builders are pure so callers and tests can inspect exactly what gets
//! printed; the `info`/`warning`/`error` helpers add the colored prefix.

use console::Style;

use crate::report::TestType;

pub fn info(message: &str) {
    eprintln!("{} {}", Style::new().green().bold().apply_to("INFO:"), message);
}

pub fn warning(message: &str) {
    eprintln!("{} {}", Style::new().yellow().bold().apply_to("WARNING:"), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", Style::new().red().bold().apply_to("ERROR:"), message);
}

fn cyan(s: &str) -> String {
    Style::new().cyan().apply_to(s).to_string()
}

pub fn reported_line(test_type: &TestType, endpoint: &str) -> String {
    format!(
        "Test results of type {} reported to {}",
        cyan(test_type.as_str()),
        cyan(endpoint)
    )
}

pub fn rejected_line(test_type: &TestType, status: u16, body: &str) -> String {
    format!(
        "failed to report results of type {} (HTTP {}):\n{}",
        cyan(test_type.as_str()),
        status,
        Style::new().yellow().apply_to(body)
    )
}

pub fn load_error_line(test_type: &TestType, err: &anyhow::Error) -> String {
    format!(
        "Error getting test result report {}:\n{err:#}",
        cyan(test_type.as_str())
    )
}

pub fn envelope_error_line(test_type: &TestType, err: &anyhow::Error) -> String {
    format!(
        "Skipping upload of {} results: {err:#}",
        cyan(test_type.as_str())
    )
}

pub fn transport_error_line(test_type: &TestType, err: &anyhow::Error) -> String {
    format!(
        "Upload of {} results failed: {err:#}",
        cyan(test_type.as_str())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_line_carries_body() {
        let line = rejected_line(&TestType::Unit, 500, "db error");
        assert!(line.contains("db error"));
        assert!(line.contains("500"));
        assert!(line.contains("unit"));
    }

    #[test]
    fn test_reported_line_names_endpoint() {
        let line = reported_line(&TestType::E2e, "https://example.test/report");
        assert!(line.contains("e2e"));
        assert!(line.contains("https://example.test/report"));
    }

    #[test]
    fn test_error_lines_use_alternate_format() {
        let err = anyhow::anyhow!("No such file").context("Failed to read unit.json");
        let line = load_error_line(&TestType::Unit, &err);
        assert!(line.contains("Failed to read unit.json: No such file"));
    }
}
