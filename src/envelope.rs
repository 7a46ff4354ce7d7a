use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::ci::CiContext;
use crate::report::TestType;

/// Body POSTed to the storage endpoint: raw results plus CI metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    pub results: serde_json::Value,
    pub build: BuildInfo,
    pub job: JobInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub build_id: String,
    pub commit_sha: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub job_id: String,
    pub test_suite_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Wrap a parsed report with build and job info from the CI context.
///
/// Build id, commit SHA and job id are required; the error names every one
/// that is missing.
pub fn build_envelope(
    ci: &CiContext,
    test_type: &TestType,
    results: serde_json::Value,
) -> Result<Envelope> {
    let required = [
        ("buildId", &ci.build_id),
        ("commitSha", &ci.commit_sha),
        ("jobId", &ci.job_id),
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        anyhow::bail!("missing required CI field(s): {}", missing.join(", "));
    }

    Ok(Envelope {
        repository: ci.repo_slug.clone(),
        results,
        build: BuildInfo {
            build_id: ci.build_id.clone().unwrap_or_default(),
            commit_sha: ci.commit_sha.clone().unwrap_or_default(),
            url: ci.build_url.clone(),
        },
        job: JobInfo {
            job_id: ci.job_id.clone().unwrap_or_default(),
            test_suite_type: test_type.to_string(),
            url: ci.job_url.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ci() -> CiContext {
        CiContext {
            provider: None,
            build_id: Some("42".to_string()),
            build_url: Some("https://ci.example/builds/42".to_string()),
            job_id: Some("7".to_string()),
            job_url: Some("https://ci.example/jobs/7".to_string()),
            commit_sha: Some("abc123".to_string()),
            repo_slug: Some("ampproject/amphtml".to_string()),
        }
    }

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = build_envelope(&ci(), &TestType::Unit, json!({"passed": 10})).unwrap();
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "repository": "ampproject/amphtml",
                "results": {"passed": 10},
                "build": {
                    "buildId": "42",
                    "commitSha": "abc123",
                    "url": "https://ci.example/builds/42",
                },
                "job": {
                    "jobId": "7",
                    "testSuiteType": "unit",
                    "url": "https://ci.example/jobs/7",
                },
            })
        );
    }

    #[test]
    fn test_absent_optional_fields_are_omitted() {
        let ctx = CiContext {
            build_url: None,
            job_url: None,
            repo_slug: None,
            ..ci()
        };
        let envelope = build_envelope(&ctx, &TestType::E2e, json!([])).unwrap();
        let value = serde_json::to_value(&envelope).unwrap();
        assert!(value.get("repository").is_none());
        assert!(value["build"].get("url").is_none());
        assert!(value["job"].get("url").is_none());
        assert_eq!(value["job"]["testSuiteType"], "e2e");
    }

    #[test]
    fn test_missing_required_fields_fail() {
        let ctx = CiContext {
            build_id: None,
            job_id: Some(String::new()),
            ..ci()
        };
        let err = build_envelope(&ctx, &TestType::Unit, json!({})).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("buildId"));
        assert!(msg.contains("jobId"));
        assert!(!msg.contains("commitSha"));
    }
}
