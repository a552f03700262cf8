//! Repository review: archive summary, LLM prompt and typed assessment.

use crate::config::CompletionProfile;
use crate::extract::{self, deserialize_score, deserialize_string_list, ExtractError};
use crate::github::{self, GitHubClient, UrlError};
use crate::llm::ChatClient;
use crate::prompts;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The reviewer's verdict on one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoAssessment {
    #[serde(deserialize_with = "deserialize_score")]
    pub documentation_score: i64,
    #[serde(deserialize_with = "deserialize_score")]
    pub code_quality_score: i64,
    #[serde(deserialize_with = "deserialize_score")]
    pub maintainability_score: i64,
    pub estimated_developer_level: String,
    #[serde(deserialize_with = "deserialize_string_list")]
    pub strengths: Vec<String>,
    #[serde(deserialize_with = "deserialize_string_list")]
    pub weaknesses: Vec<String>,
    #[serde(deserialize_with = "deserialize_string_list")]
    pub improvement_suggestions: Vec<String>,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    InvalidUrl(#[from] UrlError),
    #[error(transparent)]
    Extraction(#[from] ExtractError),
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

/// Read an assessment out of raw model output
pub fn parse_assessment(raw: &str) -> Result<RepoAssessment, ExtractError> {
    let value = extract::json_object(raw)?;
    Ok(serde_json::from_value(value)?)
}

/// Download, summarize and review a repository
pub async fn analyze_repository(
    github: &GitHubClient,
    llm: &ChatClient,
    profile: &CompletionProfile,
    repo_url: &str,
) -> Result<RepoAssessment, AnalysisError> {
    let coords = github::parse_repo_url(repo_url)?;
    let archive = github.download_archive(&coords).await?;
    let summary = github::summarize_archive(&archive)?;

    tracing::info!(
        "Reviewing {} ({} files, {} samples)",
        repo_url,
        summary.total_files,
        summary.code_samples.len()
    );

    let prompt = prompts::analysis_prompt(repo_url, &summary);
    let raw = llm
        .complete(profile, prompts::REVIEW_SYSTEM, &prompt)
        .await?;

    let assessment = parse_assessment(&raw)?;
    tracing::info!(
        "Reviewed {}: documentation {}, code quality {}, maintainability {}",
        repo_url,
        assessment.documentation_score,
        assessment.code_quality_score,
        assessment.maintainability_score
    );

    Ok(assessment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GitHubConfig, LlmConfig};
    use crate::test_support::{spawn_llm_stub, spawn_stub, zip_bytes};
    use axum::{routing::get, Router};

    const REVIEW: &str = r#"Here is my review:
```json
{
  "documentation_score": 72,
  "code_quality_score": "81",
  "maintainability_score": 64.6,
  "estimated_developer_level": "intermediate",
  "strengths": ["Clear module layout"],
  "weaknesses": "No tests",
  "improvement_suggestions": ["Add CI", "Write tests"]
}
```"#;

    #[test]
    fn test_parse_assessment_coerces_fields() {
        let assessment = parse_assessment(REVIEW).unwrap();

        assert_eq!(assessment.documentation_score, 72);
        assert_eq!(assessment.code_quality_score, 81);
        assert_eq!(assessment.maintainability_score, 65);
        assert_eq!(assessment.estimated_developer_level, "intermediate");
        assert_eq!(assessment.weaknesses, vec!["No tests".to_string()]);
        assert_eq!(assessment.improvement_suggestions.len(), 2);
    }

    #[test]
    fn test_parse_assessment_clamps_scores() {
        let raw = r#"{"documentation_score": 120, "code_quality_score": -3,
            "maintainability_score": 50, "estimated_developer_level": "advanced",
            "strengths": [], "weaknesses": [], "improvement_suggestions": []}"#;

        let assessment = parse_assessment(raw).unwrap();
        assert_eq!(assessment.documentation_score, 100);
        assert_eq!(assessment.code_quality_score, 0);
    }

    #[test]
    fn test_parse_assessment_missing_field() {
        let raw = r#"{"documentation_score": 50}"#;
        assert!(matches!(
            parse_assessment(raw),
            Err(ExtractError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_assessment_without_json() {
        assert!(matches!(
            parse_assessment("I could not review this repository."),
            Err(ExtractError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_analyze_repository_end_to_end() {
        let archive = zip_bytes(&[
            ("demo-main/README.md", b"# Demo".as_slice()),
            ("demo-main/main.py", b"print('hi')".as_slice()),
        ]);
        let router = Router::new().route(
            "/octo/demo/archive/refs/heads/main.zip",
            get(move || {
                let archive = archive.clone();
                async move { archive }
            }),
        );
        let github_url = spawn_stub(router).await;
        let (llm_url, recorded) = spawn_llm_stub(REVIEW).await;

        let github = GitHubClient::new(&GitHubConfig {
            archive_url: github_url,
            ..Default::default()
        })
        .unwrap();
        let llm = ChatClient::new(
            &LlmConfig {
                base_url: llm_url,
                ..Default::default()
            },
            "sk-test",
        )
        .unwrap();

        let assessment = analyze_repository(
            &github,
            &llm,
            &CompletionProfile::analysis(),
            "https://github.com/octo/demo",
        )
        .await
        .unwrap();

        assert_eq!(assessment.code_quality_score, 81);

        let requests = recorded.lock().unwrap();
        let prompt = requests[0]["messages"][1]["content"].as_str().unwrap();
        assert!(prompt.contains("print('hi')"));
        assert!(prompt.contains("# Demo"));
        assert_eq!(requests[0]["max_tokens"], 3000);
    }

    #[tokio::test]
    async fn test_analyze_repository_rejects_bad_url() {
        let github = GitHubClient::new(&GitHubConfig::default()).unwrap();
        let llm = ChatClient::new(&LlmConfig::default(), "sk-test").unwrap();

        let result = analyze_repository(
            &github,
            &llm,
            &CompletionProfile::analysis(),
            "https://example.com/octo/demo",
        )
        .await;

        assert!(matches!(result, Err(AnalysisError::InvalidUrl(_))));
    }
}
