//! Askama templates and view models for HTML rendering.
//!
//! View models flatten optional database columns into display strings so the
//! templates stay free of `Option` handling.

use crate::db::{RepositoryOverview, ScoredRepository};
use crate::error::AppError;
use crate::stats::ResumeSummary;
use askama::Template;
use axum::response::Html;

/// Shown in place of a score that has not been computed yet
const PENDING: &str = "-";

/// Render a template into an HTML response
pub fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub flash: Option<String>,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub flash: Option<String>,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct DashboardTemplate {
    pub username: String,
    pub total_users: i64,
    pub user_repos: i64,
    pub analyzed_projects: i64,
    pub avg_code_quality: f64,
}

#[derive(Template)]
#[template(path = "github.html")]
pub struct GitHubTemplate {
    pub username: String,
    pub repositories: Vec<RepositoryView>,
    pub last_sync_time: String,
    pub flash: Option<String>,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub username: String,
    pub repositories: Vec<RepositoryView>,
    pub analyzed_count: usize,
    pub growth: &'static str,
    pub languages: Vec<String>,
}

#[derive(Template)]
#[template(path = "resume.html")]
pub struct ResumeTemplate {
    pub username: String,
    pub analyses: Vec<ScoredRepository>,
    pub summary: Option<ResumeSummary>,
}

#[derive(Template)]
#[template(path = "learning.html")]
pub struct LearningTemplate {}

/// A repository row with its latest scores formatted for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryView {
    pub id: i64,
    pub repo_url: String,
    pub name: String,
    pub language: String,
    pub documentation_score: String,
    pub code_quality_score: String,
    pub maintainability_score: String,
    pub developer_level: String,
    pub updated_at: String,
    pub analyzed: bool,
}

fn score_text(score: Option<i64>) -> String {
    score.map_or_else(|| PENDING.to_string(), |s| s.to_string())
}

impl From<RepositoryOverview> for RepositoryView {
    fn from(row: RepositoryOverview) -> Self {
        let name = row
            .repo_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        Self {
            id: row.id,
            name,
            language: row.language,
            documentation_score: score_text(row.documentation_score),
            code_quality_score: score_text(row.code_quality_score),
            maintainability_score: score_text(row.maintainability_score),
            analyzed: row.developer_level.is_some(),
            developer_level: row.developer_level.unwrap_or_else(|| PENDING.to_string()),
            updated_at: row.updated_at.unwrap_or_default(),
            repo_url: row.repo_url,
        }
    }
}
