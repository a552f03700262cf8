mod models;

pub use models::*;

use crate::analysis::RepoAssessment;
use crate::github::RemoteRepository;
use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;

/// Database wrapper for SQLite operations
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection
    pub async fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;

        Ok(Self { pool })
    }

    /// Create all tables if they don't exist yet
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                github_username TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create users table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS repositories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                repo_url TEXT NOT NULL,
                language TEXT NOT NULL DEFAULT 'Unknown',
                UNIQUE (user_id, repo_url),
                FOREIGN KEY (user_id) REFERENCES users(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create repositories table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS repo_analysis (
                repo_id INTEGER NOT NULL UNIQUE,
                documentation_score INTEGER NOT NULL,
                code_quality_score INTEGER NOT NULL,
                maintainability_score INTEGER NOT NULL,
                developer_level TEXT NOT NULL,
                strengths TEXT NOT NULL DEFAULT '[]',
                weaknesses TEXT NOT NULL DEFAULT '[]',
                improvements TEXT NOT NULL DEFAULT '[]',
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (repo_id) REFERENCES repositories(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create repo_analysis table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS repo_analysis_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                repo_id INTEGER NOT NULL,
                documentation_score INTEGER NOT NULL,
                code_quality_score INTEGER NOT NULL,
                maintainability_score INTEGER NOT NULL,
                developer_level TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (repo_id) REFERENCES repositories(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create repo_analysis_history table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_history_repo
            ON repo_analysis_history(repo_id, created_at)
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create history index")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS learning_roadmaps (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                skill TEXT NOT NULL,
                roadmap_json TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create learning_roadmaps table")?;

        Ok(())
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Register a user. Returns `None` if the email is already taken.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<i64>> {
        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(Some(sqlx::Row::get(&row, "id"))),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(None),
            Err(e) => Err(e).context("Failed to create user"),
        }
    }

    /// Look up a user by email
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user")?;

        Ok(user)
    }

    /// Look up a user by id
    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user")?;

        Ok(user)
    }

    /// Remember which GitHub account a user linked
    pub async fn link_github_account(&self, user_id: i64, github_username: &str) -> Result<()> {
        sqlx::query("UPDATE users SET github_username = ? WHERE id = ?")
            .bind(github_username)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to link GitHub account")?;

        Ok(())
    }

    /// Total number of registered users
    pub async fn count_users(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count users")?;

        Ok(count)
    }

    // =========================================================================
    // Repositories
    // =========================================================================

    /// Import repositories for a user. Already-known URLs are left untouched.
    ///
    /// Returns the number of newly inserted rows.
    pub async fn import_repositories(
        &self,
        user_id: i64,
        repos: &[RemoteRepository],
    ) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let mut inserted = 0;
        for repo in repos {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO repositories (user_id, repo_url, language) VALUES (?, ?, ?)",
            )
            .bind(user_id)
            .bind(&repo.url)
            .bind(&repo.language)
            .execute(&mut *tx)
            .await
            .context("Failed to import repository")?;
            inserted += result.rows_affected();
        }

        tx.commit().await.context("Failed to commit repositories")?;

        Ok(inserted)
    }

    /// Get a repository if it belongs to the user
    pub async fn find_user_repository(
        &self,
        user_id: i64,
        repo_id: i64,
    ) -> Result<Option<Repository>> {
        let repo = sqlx::query_as::<_, Repository>(
            "SELECT * FROM repositories WHERE id = ? AND user_id = ?",
        )
        .bind(repo_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch repository")?;

        Ok(repo)
    }

    /// All repositories of a user with their latest review, if any
    pub async fn list_repository_overviews(&self, user_id: i64) -> Result<Vec<RepositoryOverview>> {
        let rows = sqlx::query_as::<_, RepositoryOverview>(
            r#"
            SELECT r.id, r.repo_url, r.language,
                   a.documentation_score, a.code_quality_score,
                   a.maintainability_score, a.developer_level, a.updated_at
            FROM repositories r
            LEFT JOIN repo_analysis a ON r.id = a.repo_id
            WHERE r.user_id = ?
            ORDER BY r.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch repository overviews")?;

        Ok(rows)
    }

    /// Repositories of a user that have been reviewed
    pub async fn list_scored_repositories(&self, user_id: i64) -> Result<Vec<ScoredRepository>> {
        let rows = sqlx::query_as::<_, ScoredRepository>(
            r#"
            SELECT r.id, r.repo_url, r.language,
                   a.documentation_score, a.code_quality_score,
                   a.maintainability_score, a.developer_level
            FROM repositories r
            JOIN repo_analysis a ON r.id = a.repo_id
            WHERE r.user_id = ?
            ORDER BY r.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch reviewed repositories")?;

        Ok(rows)
    }

    /// Counters for the dashboard page
    pub async fn dashboard_stats(&self, user_id: i64) -> Result<DashboardStats> {
        let total_users = self.count_users().await?;

        let user_repos =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM repositories WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count repositories")?;

        let (analyzed_projects, avg_code_quality) = sqlx::query_as::<_, (i64, Option<f64>)>(
            r#"
            SELECT COUNT(*), AVG(a.code_quality_score)
            FROM repo_analysis a
            JOIN repositories r ON a.repo_id = r.id
            WHERE r.user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to aggregate reviews")?;

        Ok(DashboardStats {
            total_users,
            user_repos,
            analyzed_projects,
            avg_code_quality,
        })
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// Store a review: replaces the snapshot and appends to the history
    pub async fn record_analysis(&self, repo_id: i64, assessment: &RepoAssessment) -> Result<()> {
        let strengths = serde_json::to_string(&assessment.strengths)?;
        let weaknesses = serde_json::to_string(&assessment.weaknesses)?;
        let improvements = serde_json::to_string(&assessment.improvement_suggestions)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT INTO repo_analysis (
                repo_id, documentation_score, code_quality_score, maintainability_score,
                developer_level, strengths, weaknesses, improvements
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(repo_id) DO UPDATE SET
                documentation_score = excluded.documentation_score,
                code_quality_score = excluded.code_quality_score,
                maintainability_score = excluded.maintainability_score,
                developer_level = excluded.developer_level,
                strengths = excluded.strengths,
                weaknesses = excluded.weaknesses,
                improvements = excluded.improvements,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(repo_id)
        .bind(assessment.documentation_score)
        .bind(assessment.code_quality_score)
        .bind(assessment.maintainability_score)
        .bind(&assessment.estimated_developer_level)
        .bind(&strengths)
        .bind(&weaknesses)
        .bind(&improvements)
        .execute(&mut *tx)
        .await
        .context("Failed to save review snapshot")?;

        sqlx::query(
            r#"
            INSERT INTO repo_analysis_history (
                repo_id, documentation_score, code_quality_score,
                maintainability_score, developer_level
            )
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(repo_id)
        .bind(assessment.documentation_score)
        .bind(assessment.code_quality_score)
        .bind(assessment.maintainability_score)
        .bind(&assessment.estimated_developer_level)
        .execute(&mut *tx)
        .await
        .context("Failed to append review history")?;

        tx.commit().await.context("Failed to commit review")?;

        Ok(())
    }

    /// Latest review of one of the user's repositories
    pub async fn get_analysis(&self, user_id: i64, repo_id: i64) -> Result<Option<RepoAnalysis>> {
        let analysis = sqlx::query_as::<_, RepoAnalysis>(
            r#"
            SELECT a.*
            FROM repo_analysis a
            JOIN repositories r ON a.repo_id = r.id
            WHERE a.repo_id = ? AND r.user_id = ?
            "#,
        )
        .bind(repo_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch review")?;

        Ok(analysis)
    }

    /// Score history of one of the user's repositories, oldest first
    pub async fn get_analysis_history(
        &self,
        user_id: i64,
        repo_id: i64,
    ) -> Result<Vec<AnalysisHistoryEntry>> {
        let rows = sqlx::query_as::<_, AnalysisHistoryEntry>(
            r#"
            SELECT h.*
            FROM repo_analysis_history h
            JOIN repositories r ON h.repo_id = r.id
            WHERE h.repo_id = ? AND r.user_id = ?
            ORDER BY h.created_at, h.id
            "#,
        )
        .bind(repo_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch review history")?;

        Ok(rows)
    }

    // =========================================================================
    // Learning roadmaps
    // =========================================================================

    /// Append a generated roadmap
    pub async fn save_roadmap(&self, user_id: i64, skill: &str, roadmap_json: &str) -> Result<i64> {
        let row = sqlx::query(
            "INSERT INTO learning_roadmaps (user_id, skill, roadmap_json) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(user_id)
        .bind(skill)
        .bind(roadmap_json)
        .fetch_one(&self.pool)
        .await
        .context("Failed to save roadmap")?;

        Ok(sqlx::Row::get(&row, "id"))
    }

    /// The user's most recent roadmap
    pub async fn latest_roadmap(&self, user_id: i64) -> Result<Option<LearningRoadmap>> {
        let roadmap = sqlx::query_as::<_, LearningRoadmap>(
            r#"
            SELECT * FROM learning_roadmaps
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch roadmap")?;

        Ok(roadmap)
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}
