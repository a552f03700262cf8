use crate::analysis;
use crate::auth::{self, AuthContext};
use crate::error::{AppError, Result};
use crate::evaluation::{self, CodeEvaluation};
use crate::extract::{self, ExtractError};
use crate::prompts;
use crate::roadmap::{self, RoadmapItem};
use crate::stats;
use crate::AppState;
use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Form, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use super::templates::{
    render, DashboardTemplate, GitHubTemplate, LearningTemplate, LoginTemplate, ProfileTemplate,
    RegisterTemplate, RepositoryView, ResumeTemplate,
};

/// Format of the last-sync timestamp shown on the GitHub page
const SYNC_TIME_FORMAT: &str = "%b %d, %Y %I:%M %p";

/// Reading list attached to every improvements response
const REFERENCES: [&str; 3] = [
    "https://realpython.com/",
    "https://docs.python.org/3/",
    "https://github.com/clean-code-book",
];

// ============================================================================
// Accounts
// ============================================================================

/// Login page
pub async fn login_page() -> Result<Response> {
    Ok(render(&LoginTemplate { flash: None })?.into_response())
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let user = state.db.find_user_by_email(form.email.trim()).await?;

    let Some(user) = user.filter(|u| auth::verify_password(&form.password, &u.password_hash))
    else {
        tracing::info!("Failed login for {}", form.email);
        let template = LoginTemplate {
            flash: Some("Invalid credentials".to_string()),
        };
        return Ok(render(&template)?.into_response());
    };

    let jar = state
        .sessions
        .create(
            state.sessions.jar(&headers),
            AuthContext {
                user_id: user.id,
                username: user.username.clone(),
            },
        )
        .await;

    tracing::info!("User {} logged in", user.id);

    Ok((jar, Redirect::to("/dashboard")).into_response())
}

/// Registration page
pub async fn register_page() -> Result<Response> {
    Ok(render(&RegisterTemplate { flash: None })?.into_response())
}

#[derive(Deserialize)]
pub struct SignupForm {
    username: String,
    email: String,
    password: String,
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    let username = form.username.trim();
    let email = form.email.trim();

    if username.is_empty() || email.is_empty() || form.password.is_empty() {
        let template = RegisterTemplate {
            flash: Some("All fields are required".to_string()),
        };
        return Ok(render(&template)?.into_response());
    }

    let password_hash = auth::hash_password(&form.password)?;
    match state.db.create_user(username, email, &password_hash).await? {
        Some(id) => {
            tracing::info!("Registered user {}", id);
            Ok(Redirect::to("/login").into_response())
        }
        None => {
            let template = RegisterTemplate {
                flash: Some("Email already exists".to_string()),
            };
            Ok(render(&template)?.into_response())
        }
    }
}

pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let jar = state.sessions.destroy(&headers).await;
    (jar, Redirect::to("/login")).into_response()
}

// ============================================================================
// Dashboard, profile and resume
// ============================================================================

/// Dashboard page
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Response> {
    let counters = state.db.dashboard_stats(auth.user_id).await?;

    let template = DashboardTemplate {
        username: auth.username,
        total_users: counters.total_users,
        user_repos: counters.user_repos,
        analyzed_projects: counters.analyzed_projects,
        avg_code_quality: stats::round1(counters.avg_code_quality.unwrap_or(0.0)),
    };

    Ok(render(&template)?.into_response())
}

/// Profile page with the growth summary and one card per repository
pub async fn profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Response> {
    let repositories: Vec<RepositoryView> = state
        .db
        .list_repository_overviews(auth.user_id)
        .await?
        .into_iter()
        .map(RepositoryView::from)
        .collect();

    let scored = state.db.list_scored_repositories(auth.user_id).await?;

    let template = ProfileTemplate {
        username: auth.username,
        analyzed_count: repositories.iter().filter(|r| r.analyzed).count(),
        repositories,
        growth: stats::growth_label(&scored),
        languages: stats::languages(&scored),
    };

    Ok(render(&template)?.into_response())
}

#[derive(Serialize)]
pub struct ProfileSummary {
    growth: &'static str,
    languages: Vec<String>,
}

pub async fn profile_summary(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ProfileSummary>> {
    let rows = state.db.list_scored_repositories(auth.user_id).await?;

    Ok(Json(ProfileSummary {
        growth: stats::growth_label(&rows),
        languages: stats::languages(&rows),
    }))
}

/// Resume preview built from reviewed repositories
pub async fn resume(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Response> {
    let analyses = state.db.list_scored_repositories(auth.user_id).await?;

    let template = ResumeTemplate {
        username: auth.username,
        summary: stats::resume_summary(&analyses),
        analyses,
    };

    Ok(render(&template)?.into_response())
}

// ============================================================================
// GitHub
// ============================================================================

#[derive(Deserialize)]
pub struct GitHubPageQuery {
    connected: Option<String>,
}

async fn render_github_page(
    state: &AppState,
    auth: AuthContext,
    flash: Option<String>,
) -> Result<Response> {
    let repositories = state
        .db
        .list_repository_overviews(auth.user_id)
        .await?
        .into_iter()
        .map(RepositoryView::from)
        .collect();

    let last_sync_time = state
        .last_sync
        .read()
        .await
        .clone()
        .unwrap_or_else(|| "Never".to_string());

    let template = GitHubTemplate {
        username: auth.username,
        repositories,
        last_sync_time,
        flash,
    };

    Ok(render(&template)?.into_response())
}

/// Repositories with their latest review
pub async fn github_page(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<GitHubPageQuery>,
) -> Result<Response> {
    let flash = query
        .connected
        .map(|_| "GitHub connected successfully".to_string());
    render_github_page(&state, auth, flash).await
}

#[derive(Deserialize)]
pub struct AnalyzeForm {
    repo_id: i64,
}

/// Review one of the user's repositories, then show the page again
pub async fn analyze_repository(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<AnalyzeForm>,
) -> Result<Response> {
    match state
        .db
        .find_user_repository(auth.user_id, form.repo_id)
        .await?
    {
        Some(repo) => {
            let assessment = analysis::analyze_repository(
                &state.github,
                &state.llm,
                &state.config.llm.analysis,
                &repo.repo_url,
            )
            .await?;
            state.db.record_analysis(repo.id, &assessment).await?;
        }
        None => tracing::warn!(
            "User {} asked to analyze unknown repository {}",
            auth.user_id,
            form.repo_id
        ),
    }

    render_github_page(&state, auth, None).await
}

#[derive(Serialize)]
pub struct ProgressResponse {
    labels: Vec<String>,
    documentation: Vec<i64>,
    code_quality: Vec<i64>,
    maintainability: Vec<i64>,
}

/// Score history for charts
pub async fn github_progress(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(repo_id): Path<i64>,
) -> Result<Json<ProgressResponse>> {
    let history = state.db.get_analysis_history(auth.user_id, repo_id).await?;

    let mut progress = ProgressResponse {
        labels: Vec::with_capacity(history.len()),
        documentation: Vec::with_capacity(history.len()),
        code_quality: Vec::with_capacity(history.len()),
        maintainability: Vec::with_capacity(history.len()),
    };
    for entry in history {
        progress.labels.push(entry.created_at);
        progress.documentation.push(entry.documentation_score);
        progress.code_quality.push(entry.code_quality_score);
        progress.maintainability.push(entry.maintainability_score);
    }

    Ok(Json(progress))
}

/// Stored lists are JSON arrays; anything else reads as empty
fn stored_list(text: &str) -> Vec<String> {
    serde_json::from_str(text).unwrap_or_default()
}

/// Strengths, weaknesses and suggestions from the latest review
pub async fn github_improvements(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(repo_id): Path<i64>,
) -> Result<Json<Value>> {
    let analysis = state
        .db
        .get_analysis(auth.user_id, repo_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No analysis found".to_string()))?;

    Ok(Json(json!({
        "strengths": stored_list(&analysis.strengths),
        "weaknesses": stored_list(&analysis.weaknesses),
        "improvements": stored_list(&analysis.improvements),
        "references": REFERENCES,
    })))
}

async fn mark_synced(state: &AppState) {
    let now = chrono::Local::now().format(SYNC_TIME_FORMAT).to_string();
    *state.last_sync.write().await = Some(now);
}

#[derive(Deserialize)]
pub struct ConnectForm {
    github_username: String,
}

/// Link a GitHub account and import its public repositories
pub async fn github_connect(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<ConnectForm>,
) -> Result<Response> {
    let github_username = form.github_username.trim();
    if github_username.is_empty() {
        return Err(AppError::BadRequest("GitHub username required".to_string()));
    }

    let repos = state.github.fetch_public_repos(github_username).await?;

    state
        .db
        .link_github_account(auth.user_id, github_username)
        .await?;
    let inserted = state.db.import_repositories(auth.user_id, &repos).await?;
    mark_synced(&state).await;

    tracing::info!(
        "Connected {} for user {}: {} repositories, {} new",
        github_username,
        auth.user_id,
        repos.len(),
        inserted
    );

    Ok(Redirect::to("/github?connected=1").into_response())
}

/// Re-import repositories of the linked account
pub async fn github_refresh(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Value>> {
    let linked = state
        .db
        .get_user(auth.user_id)
        .await?
        .and_then(|user| user.github_username)
        .filter(|name| !name.is_empty());

    let Some(github_username) = linked else {
        return Ok(Json(json!({
            "success": false,
            "message": "GitHub account not connected yet"
        })));
    };

    let repos = state.github.fetch_public_repos(&github_username).await?;
    let inserted = state.db.import_repositories(auth.user_id, &repos).await?;
    mark_synced(&state).await;

    tracing::info!(
        "Refreshed {} for user {}: {} new repositories",
        github_username,
        auth.user_id,
        inserted
    );

    Ok(Json(json!({ "success": true })))
}

// ============================================================================
// Learning
// ============================================================================

/// Learning page
pub async fn learning_page() -> Result<Response> {
    Ok(render(&LearningTemplate {})?.into_response())
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    github_url: Option<String>,
    #[serde(default)]
    stage: Option<Value>,
    #[serde(default)]
    task: Option<Value>,
}

/// Accept the GitHub link for a finished learning task
pub async fn learning_submit(Json(req): Json<SubmitRequest>) -> Result<Json<Value>> {
    let github_url = req
        .github_url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| AppError::BadRequest("GitHub link required".to_string()))?;

    if !github_url.starts_with("https://github.com/") {
        return Err(AppError::BadRequest("Invalid GitHub URL".to_string()));
    }

    tracing::info!(
        "Task submitted: {} (stage {:?}, task {:?})",
        github_url,
        req.stage,
        req.task
    );

    Ok(Json(json!({
        "success": true,
        "message": "Task completed. Next task unlocked."
    })))
}

#[derive(Deserialize)]
pub struct SkillRequest {
    #[serde(default)]
    skill: Option<String>,
}

impl SkillRequest {
    fn skill(self) -> Result<String> {
        self.skill
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::BadRequest("Skill is required".to_string()))
    }
}

/// Portfolio project path, returned as the model produced it
pub async fn learning_roadmap(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SkillRequest>,
) -> Result<Response> {
    let skill = req.skill()?;

    let raw = state
        .llm
        .complete(
            &state.config.llm.roadmap,
            prompts::PROJECT_PATH_SYSTEM,
            &prompts::project_path_prompt(&skill),
        )
        .await?;

    match extract::json_object(&raw) {
        Ok(value) => Ok(Json(value).into_response()),
        Err(ExtractError::NotFound) => {
            tracing::error!("No JSON in project path for {}", skill);
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to generate roadmap" })),
            )
                .into_response())
        }
        Err(e) => Err(anyhow::Error::new(e)
            .context("Failed to parse project path")
            .into()),
    }
}

#[derive(Serialize)]
pub struct GeneratedRoadmap {
    success: bool,
    skill: String,
    roadmap_count: usize,
    roadmap: Vec<RoadmapItem>,
}

/// Generate a normalized roadmap, export it and store it for the user
pub async fn learning_generate(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SkillRequest>,
) -> Result<Json<GeneratedRoadmap>> {
    let skill = req.skill()?;

    let raw = state
        .llm
        .complete(
            &state.config.llm.roadmap,
            prompts::ROADMAP_SYSTEM,
            &prompts::roadmap_prompt(&skill),
        )
        .await?;

    let items = roadmap::parse_roadmap(&raw)?;

    roadmap::write_roadmap_file(&state.config.roadmap_export_path(), &items).await?;
    let roadmap_json = serde_json::to_string(&items).context("Failed to serialize roadmap")?;
    state
        .db
        .save_roadmap(auth.user_id, &skill, &roadmap_json)
        .await?;

    tracing::info!("Generated {} roadmap for user {}", skill, auth.user_id);

    Ok(Json(GeneratedRoadmap {
        success: true,
        skill,
        roadmap_count: items.len(),
        roadmap: items,
    }))
}

#[derive(Deserialize)]
pub struct EvaluateRequest {
    #[serde(default)]
    task: String,
    #[serde(default)]
    code: String,
}

/// Feedback on submitted code
pub async fn learning_evaluate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<CodeEvaluation>> {
    if evaluation::is_blank(&req.code) {
        return Ok(Json(CodeEvaluation::empty_submission()));
    }

    let raw = state
        .llm
        .complete(
            &state.config.llm.evaluation,
            prompts::EVALUATION_SYSTEM,
            &prompts::evaluation_prompt(&req.task, &req.code),
        )
        .await?;

    Ok(Json(evaluation::parse_evaluation(&raw, &req.code)))
}

/// The user's latest roadmap, or `{"roadmap": null}`
pub async fn learning_current(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Value>> {
    let Some(latest) = state.db.latest_roadmap(auth.user_id).await? else {
        return Ok(Json(json!({ "roadmap": null })));
    };

    let roadmap: Value =
        serde_json::from_str(&latest.roadmap_json).context("Stored roadmap is not valid JSON")?;
    Ok(Json(roadmap))
}
