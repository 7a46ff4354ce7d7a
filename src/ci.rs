//! CI context detection.
//!
//! Maps the environment variables of the supported CI providers onto a single
//! [`CiContext`]. The environment is read once through a lookup function so
//! the rest of the uploader never touches process state.

/// CI providers whose environment variables we understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiProvider {
    GithubActions,
    Travis,
    Circleci,
}

impl std::fmt::Display for CiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CiProvider::GithubActions => write!(f, "GitHub Actions"),
            CiProvider::Travis => write!(f, "Travis CI"),
            CiProvider::Circleci => write!(f, "CircleCI"),
        }
    }
}

/// Metadata describing the current CI run. Every field is `None` outside CI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiContext {
    pub provider: Option<CiProvider>,
    pub build_id: Option<String>,
    pub build_url: Option<String>,
    pub job_id: Option<String>,
    pub job_url: Option<String>,
    pub commit_sha: Option<String>,
    pub repo_slug: Option<String>,
}

impl CiContext {
    /// Build the context from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the context from an arbitrary variable lookup.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let is_true = |key: &str| get(key).as_deref() == Some("true");

        if is_true("GITHUB_ACTIONS") {
            let run_url = match (
                get("GITHUB_SERVER_URL"),
                get("GITHUB_REPOSITORY"),
                get("GITHUB_RUN_ID"),
            ) {
                (Some(server), Some(repo), Some(run)) => {
                    Some(format!("{server}/{repo}/actions/runs/{run}"))
                }
                _ => None,
            };
            CiContext {
                provider: Some(CiProvider::GithubActions),
                build_id: get("GITHUB_RUN_ID"),
                build_url: run_url.clone(),
                job_id: get("GITHUB_RUN_NUMBER"),
                job_url: run_url,
                commit_sha: get("GITHUB_SHA"),
                repo_slug: get("GITHUB_REPOSITORY"),
            }
        } else if is_true("TRAVIS") {
            CiContext {
                provider: Some(CiProvider::Travis),
                build_id: get("TRAVIS_BUILD_ID"),
                build_url: get("TRAVIS_BUILD_WEB_URL"),
                job_id: get("TRAVIS_JOB_ID"),
                job_url: get("TRAVIS_JOB_WEB_URL"),
                commit_sha: get("TRAVIS_COMMIT"),
                repo_slug: get("TRAVIS_REPO_SLUG"),
            }
        } else if is_true("CIRCLECI") {
            let repo_slug = match (get("CIRCLE_PROJECT_USERNAME"), get("CIRCLE_PROJECT_REPONAME")) {
                (Some(user), Some(repo)) => Some(format!("{user}/{repo}")),
                _ => None,
            };
            CiContext {
                provider: Some(CiProvider::Circleci),
                build_id: get("CIRCLE_WORKFLOW_ID"),
                build_url: get("CIRCLE_WORKFLOW_ID")
                    .map(|id| format!("https://app.circleci.com/pipelines/workflows/{id}")),
                job_id: get("CIRCLE_BUILD_NUM"),
                job_url: get("CIRCLE_BUILD_URL"),
                commit_sha: get("CIRCLE_SHA1"),
                repo_slug,
            }
        } else {
            CiContext::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_outside_ci_is_empty() {
        let ctx = CiContext::from_lookup(lookup(&[("HOME", "/root")]));
        assert_eq!(ctx, CiContext::default());
    }

    #[test]
    fn test_github_actions() {
        let ctx = CiContext::from_lookup(lookup(&[
            ("GITHUB_ACTIONS", "true"),
            ("GITHUB_SERVER_URL", "https://github.com"),
            ("GITHUB_REPOSITORY", "ampproject/amphtml"),
            ("GITHUB_RUN_ID", "42"),
            ("GITHUB_RUN_NUMBER", "7"),
            ("GITHUB_SHA", "abc123"),
        ]));
        assert_eq!(ctx.provider, Some(CiProvider::GithubActions));
        assert_eq!(ctx.build_id.as_deref(), Some("42"));
        assert_eq!(ctx.job_id.as_deref(), Some("7"));
        assert_eq!(ctx.commit_sha.as_deref(), Some("abc123"));
        assert_eq!(ctx.repo_slug.as_deref(), Some("ampproject/amphtml"));
        assert_eq!(
            ctx.build_url.as_deref(),
            Some("https://github.com/ampproject/amphtml/actions/runs/42")
        );
        assert_eq!(ctx.job_url, ctx.build_url);
    }

    #[test]
    fn test_travis() {
        let ctx = CiContext::from_lookup(lookup(&[
            ("TRAVIS", "true"),
            ("TRAVIS_BUILD_ID", "1001"),
            ("TRAVIS_BUILD_WEB_URL", "https://travis-ci.org/builds/1001"),
            ("TRAVIS_JOB_ID", "2002"),
            ("TRAVIS_JOB_WEB_URL", "https://travis-ci.org/jobs/2002"),
            ("TRAVIS_COMMIT", "deadbeef"),
            ("TRAVIS_REPO_SLUG", "ampproject/amphtml"),
        ]));
        assert_eq!(ctx.provider, Some(CiProvider::Travis));
        assert_eq!(ctx.build_id.as_deref(), Some("1001"));
        assert_eq!(ctx.job_url.as_deref(), Some("https://travis-ci.org/jobs/2002"));
        assert_eq!(ctx.commit_sha.as_deref(), Some("deadbeef"));
    }

    #[test]
    fn test_circleci_repo_slug_needs_both_parts() {
        let ctx = CiContext::from_lookup(lookup(&[
            ("CIRCLECI", "true"),
            ("CIRCLE_WORKFLOW_ID", "wf-1"),
            ("CIRCLE_BUILD_NUM", "99"),
            ("CIRCLE_SHA1", "cafe"),
            ("CIRCLE_PROJECT_USERNAME", "ampproject"),
        ]));
        assert_eq!(ctx.provider, Some(CiProvider::Circleci));
        assert_eq!(
            ctx.build_url.as_deref(),
            Some("https://app.circleci.com/pipelines/workflows/wf-1")
        );
        assert_eq!(ctx.repo_slug, None);
    }

    #[test]
    fn test_empty_values_are_absent() {
        let ctx = CiContext::from_lookup(lookup(&[
            ("GITHUB_ACTIONS", "true"),
            ("GITHUB_RUN_ID", ""),
            ("GITHUB_SHA", "abc123"),
        ]));
        assert_eq!(ctx.build_id, None);
        assert_eq!(ctx.build_url, None);
        assert_eq!(ctx.commit_sha.as_deref(), Some("abc123"));
    }
}
