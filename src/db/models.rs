use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub github_username: Option<String>,
}

/// A public repository imported from a linked GitHub account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Repository {
    pub id: i64,
    pub user_id: i64,
    pub repo_url: String,
    pub language: String,
}

/// The latest review of a repository
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RepoAnalysis {
    pub repo_id: i64,
    pub documentation_score: i64,
    pub code_quality_score: i64,
    pub maintainability_score: i64,
    pub developer_level: String,
    /// JSON array of strings
    pub strengths: String,
    /// JSON array of strings
    pub weaknesses: String,
    /// JSON array of strings
    pub improvements: String,
    pub updated_at: String,
}

/// One entry in a repository's score history
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisHistoryEntry {
    pub id: i64,
    pub repo_id: i64,
    pub documentation_score: i64,
    pub code_quality_score: i64,
    pub maintainability_score: i64,
    pub developer_level: String,
    pub created_at: String,
}

/// A repository joined with its latest review, if any
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RepositoryOverview {
    pub id: i64,
    pub repo_url: String,
    pub language: String,
    pub documentation_score: Option<i64>,
    pub code_quality_score: Option<i64>,
    pub maintainability_score: Option<i64>,
    pub developer_level: Option<String>,
    pub updated_at: Option<String>,
}

/// A repository that has been reviewed at least once
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScoredRepository {
    pub id: i64,
    pub repo_url: String,
    pub language: String,
    pub documentation_score: i64,
    pub code_quality_score: i64,
    pub maintainability_score: i64,
    pub developer_level: String,
}

impl ScoredRepository {
    /// Mean of the three scores
    pub fn mean_score(&self) -> f64 {
        (self.documentation_score + self.code_quality_score + self.maintainability_score) as f64
            / 3.0
    }
}

/// A saved learning roadmap
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LearningRoadmap {
    pub id: i64,
    pub user_id: i64,
    pub skill: String,
    /// JSON array of roadmap items
    pub roadmap_json: String,
    pub created_at: String,
}

/// Counters shown on the dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_users: i64,
    pub user_repos: i64,
    pub analyzed_projects: i64,
    pub avg_code_quality: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(doc: i64, code: i64, maint: i64) -> ScoredRepository {
        ScoredRepository {
            id: 1,
            repo_url: "https://github.com/octo/demo".to_string(),
            language: "Rust".to_string(),
            documentation_score: doc,
            code_quality_score: code,
            maintainability_score: maint,
            developer_level: "intermediate".to_string(),
        }
    }

    #[test]
    fn test_mean_score() {
        assert!((scored(90, 60, 30).mean_score() - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mean_score_fractional() {
        assert!((scored(100, 100, 99).mean_score() - 99.666_666_666_666_67).abs() < 1e-9);
    }

    #[test]
    fn test_user_serialization_skips_password() {
        let user = User {
            id: 1,
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$ZGlnZXN0".to_string(),
            github_username: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("digest"));
        assert!(json.contains("ada@example.com"));
    }
}
