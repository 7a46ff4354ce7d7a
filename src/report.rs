use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;

/// Default directory the test runners write their JSON reports to.
pub const DEFAULT_REPORTS_DIR: &str = "result-reports";

/// Test suite that produced a report, derived from the report's file name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TestType {
    Unit,
    Integration,
    E2e,
    /// Any other base name found in the reports directory.
    Other(String),
}

impl TestType {
    pub fn as_str(&self) -> &str {
        match self {
            TestType::Unit => "unit",
            TestType::Integration => "integration",
            TestType::E2e => "e2e",
            TestType::Other(name) => name,
        }
    }

    /// File name of this type's report inside the reports directory.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl From<&str> for TestType {
    fn from(label: &str) -> Self {
        match label {
            "unit" => TestType::Unit,
            "integration" => TestType::Integration,
            "e2e" => TestType::E2e,
            other => TestType::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for TestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// List the reports directory and derive one test type per file base name.
///
/// Subdirectories are ignored and labels are deduplicated, so `unit.json`
/// and `unit.xml` yield a single `unit`. Fails if the directory cannot be read.
pub fn discover_report_types(reports_dir: &Path) -> Result<Vec<TestType>> {
    let entries = std::fs::read_dir(reports_dir)
        .with_context(|| format!("Failed to list reports directory: {}", reports_dir.display()))?;

    let mut types = BTreeSet::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("Failed to read entry in {}", reports_dir.display()))?;
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let path = entry.path();
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            types.insert(TestType::from(stem));
        }
    }

    Ok(types.into_iter().collect())
}

/// Read and parse `<test_type>.json` from the reports directory.
pub async fn load_report(reports_dir: &Path, test_type: &TestType) -> Result<serde_json::Value> {
    let path = reports_dir.join(test_type.file_name());
    let content = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let report = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(report)
}
