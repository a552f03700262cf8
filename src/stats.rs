//! Aggregates over a user's reviewed repositories.

use crate::db::ScoredRepository;
use serde::Serialize;
use std::collections::BTreeMap;

/// Growth label when nothing has been reviewed yet
pub const NO_DATA: &str = "No data";

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let count = values.len();
    if count == 0 {
        return 0.0;
    }
    values.sum::<f64>() / count as f64
}

/// Trend label from the mean of per-repository mean scores
pub fn growth_label(rows: &[ScoredRepository]) -> &'static str {
    if rows.is_empty() {
        return NO_DATA;
    }

    let average = mean(rows.iter().map(ScoredRepository::mean_score));
    if average >= 80.0 {
        "🚀 Strong Upward Trend"
    } else if average >= 65.0 {
        "📈 Steady Improvement"
    } else {
        "🌱 Learning Phase"
    }
}

/// Distinct non-empty languages, sorted
pub fn languages(rows: &[ScoredRepository]) -> Vec<String> {
    let mut languages: Vec<String> = rows
        .iter()
        .filter(|r| !r.language.is_empty())
        .map(|r| r.language.clone())
        .collect();
    languages.sort();
    languages.dedup();
    languages
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageScore {
    pub language: String,
    pub average: f64,
}

/// Figures shown on the resume page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeSummary {
    pub avg_documentation: f64,
    pub avg_code_quality: f64,
    pub avg_maintainability: f64,
    pub overall_score: f64,
    pub languages: Vec<LanguageScore>,
    pub summary: &'static str,
}

/// Summarize reviewed repositories. `None` when there are none.
pub fn resume_summary(rows: &[ScoredRepository]) -> Option<ResumeSummary> {
    if rows.is_empty() {
        return None;
    }

    let avg_doc = mean(rows.iter().map(|r| r.documentation_score as f64));
    let avg_code = mean(rows.iter().map(|r| r.code_quality_score as f64));
    let avg_maint = mean(rows.iter().map(|r| r.maintainability_score as f64));
    let overall = (avg_doc + avg_code + avg_maint) / 3.0;

    let mut by_language: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for row in rows {
        by_language
            .entry(row.language.as_str())
            .or_default()
            .push(row.mean_score());
    }

    let languages = by_language
        .into_iter()
        .map(|(language, scores)| LanguageScore {
            language: language.to_string(),
            average: round1(mean(scores.into_iter())),
        })
        .collect();

    let summary = if overall >= 85.0 {
        "Advanced developer"
    } else if overall >= 70.0 {
        "Proficient developer"
    } else {
        "Growing developer"
    };

    Some(ResumeSummary {
        avg_documentation: round1(avg_doc),
        avg_code_quality: round1(avg_code),
        avg_maintainability: round1(avg_maint),
        overall_score: round1(overall),
        languages,
        summary,
    })
}
