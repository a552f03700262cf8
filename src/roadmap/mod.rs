//! Learning roadmap normalization.
//!
//! Model output comes in many shapes: a bare array, an object wrapping the
//! array under `projects` or `roadmap`, or under some other key entirely.
//! Items use several spellings for the same field. Everything is folded into
//! [`RoadmapItem`] and the result must contain exactly [`ROADMAP_LENGTH`]
//! items.

use crate::extract::{self, is_truthy, string_list_from_value, ExtractError};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

/// Number of items a roadmap must have
pub const ROADMAP_LENGTH: usize = 10;

/// Keys tried, in order, for an item's skills
pub const SKILL_KEYS: &[&str] = &[
    "skills",
    "skill",
    "technologies",
    "tools",
    "technical_skills_learned",
    "tools_and_technologies",
];

/// Keys tried, in order, for an item's prerequisites
pub const PREREQUISITE_KEYS: &[&str] = &["prerequisites", "requires", "depends_on"];

/// Keys tried, in order, for an item's projects
pub const PROJECT_KEYS: &[&str] = &["project_list", "projects", "projectList"];

/// Keys tried, in order, for an item's level
pub const LEVEL_KEYS: &[&str] = &["level", "difficulty"];

/// Wrapper keys checked before falling back to the first array field
const WRAPPER_KEYS: &[&str] = &["projects", "roadmap"];

const DEFAULT_TITLE: &str = "Untitled Topic";
const DEFAULT_PROJECT_TOPIC: &str = "Topic";
const DEFAULT_LEVEL: &str = "Beginner";

/// One step of a learning roadmap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapItem {
    pub title: String,
    pub description: String,
    pub level: String,
    pub skills: Vec<String>,
    pub prerequisites: Vec<String>,
    pub project_list: Vec<String>,
}

/// Why a single raw item was dropped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemRejection {
    #[error("roadmap item is not an object: {0}")]
    NotAnObject(String),
}

#[derive(Debug, Error)]
pub enum RoadmapError {
    #[error("AI returned empty response")]
    Empty,
    #[error("Invalid AI JSON")]
    InvalidJson(#[source] ExtractError),
    #[error("Unknown AI JSON structure")]
    UnknownStructure,
    #[error("Unexpected AI output format")]
    UnexpectedFormat,
    #[error("AI must return exactly 10 roadmap items")]
    WrongItemCount { received: usize },
}

/// Turn raw model output into exactly [`ROADMAP_LENGTH`] normalized items
pub fn parse_roadmap(raw: &str) -> Result<Vec<RoadmapItem>, RoadmapError> {
    let text = extract::strip_code_fences(raw);
    if text.is_empty() {
        return Err(RoadmapError::Empty);
    }

    let parsed = extract::json_value(&text).map_err(RoadmapError::InvalidJson)?;
    let raw_items = locate_items(&parsed)?;
    let items = normalize_items(raw_items);

    if items.len() != ROADMAP_LENGTH {
        return Err(RoadmapError::WrongItemCount {
            received: items.len(),
        });
    }

    Ok(items)
}

/// Find the array of raw items inside parsed output
pub fn locate_items(parsed: &Value) -> Result<&[Value], RoadmapError> {
    match parsed {
        Value::Array(items) => Ok(items),
        Value::Object(map) => WRAPPER_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .or_else(|| map.values().find_map(Value::as_array))
            .map(Vec::as_slice)
            .ok_or(RoadmapError::UnknownStructure),
        _ => Err(RoadmapError::UnexpectedFormat),
    }
}

/// Normalize every item, skipping the ones that are rejected
pub fn normalize_items(raw_items: &[Value]) -> Vec<RoadmapItem> {
    raw_items
        .iter()
        .filter_map(|item| match normalize_item(item) {
            Ok(item) => Some(item),
            Err(rejection) => {
                tracing::warn!("Skipping roadmap item: {}", rejection);
                None
            }
        })
        .collect()
}

/// Fold one raw item into a [`RoadmapItem`]
pub fn normalize_item(raw: &Value) -> Result<RoadmapItem, ItemRejection> {
    let Value::Object(fields) = raw else {
        return Err(ItemRejection::NotAnObject(raw.to_string()));
    };

    let title = fields.get("title").and_then(Value::as_str);

    let mut project_list = first_list(fields, PROJECT_KEYS);
    if project_list.is_empty() {
        let topic = title.unwrap_or(DEFAULT_PROJECT_TOPIC);
        project_list = vec![
            format!("{} – Mini Project", topic),
            format!("{} – Practical Implementation", topic),
            format!("{} – Real-World Use Case", topic),
        ];
    }

    let level = LEVEL_KEYS
        .iter()
        .filter_map(|key| fields.get(*key))
        .find(|value| is_truthy(value))
        .map(text_of)
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string());

    Ok(RoadmapItem {
        title: title.unwrap_or(DEFAULT_TITLE).to_string(),
        description: fields
            .get("description")
            .map(text_of)
            .unwrap_or_default(),
        level,
        skills: first_list(fields, SKILL_KEYS),
        prerequisites: first_list(fields, PREREQUISITE_KEYS),
        project_list,
    })
}

/// First truthy value among `keys` that reads as a list of strings
fn first_list(fields: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .filter(|value| is_truthy(value))
        .find_map(string_list_from_value)
        .unwrap_or_default()
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Export a roadmap as pretty JSON, creating parent directories
pub async fn write_roadmap_file(path: &Path, items: &[RoadmapItem]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let content = serde_json::to_string_pretty(items).context("Failed to serialize roadmap")?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write roadmap: {:?}", path))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items(count: usize) -> Vec<Value> {
        (1..=count)
            .map(|i| {
                json!({
                    "title": format!("Step {}", i),
                    "description": "Learn things",
                    "level": "Intermediate",
                    "skills": ["a", "b"],
                    "prerequisites": [],
                    "project_list": ["Build it"]
                })
            })
            .collect()
    }

    // =========================================================================
    // Whole-output parsing
    // =========================================================================

    #[test]
    fn test_parse_roadmap_plain_array() {
        let raw = Value::Array(items(10)).to_string();
        let roadmap = parse_roadmap(&raw).unwrap();

        assert_eq!(roadmap.len(), ROADMAP_LENGTH);
        assert_eq!(roadmap[0].title, "Step 1");
        assert_eq!(roadmap[9].title, "Step 10");
        assert_eq!(roadmap[0].project_list, vec!["Build it".to_string()]);
    }

    #[test]
    fn test_parse_roadmap_fenced() {
        let raw = format!("```json\n{}\n```", json!({ "roadmap": items(10) }));
        assert_eq!(parse_roadmap(&raw).unwrap().len(), ROADMAP_LENGTH);
    }

    #[test]
    fn test_parse_roadmap_with_surrounding_prose() {
        let raw = format!("Here you go:\n{}\nGood luck!", Value::Array(items(10)));
        assert_eq!(parse_roadmap(&raw).unwrap().len(), ROADMAP_LENGTH);
    }

    #[test]
    fn test_parse_roadmap_rejects_nine_and_eleven() {
        for count in [9, 11] {
            let raw = Value::Array(items(count)).to_string();
            match parse_roadmap(&raw) {
                Err(RoadmapError::WrongItemCount { received }) => assert_eq!(received, count),
                other => panic!("expected count error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_roadmap_counts_after_skipping_non_objects() {
        let mut raw_items = items(10);
        raw_items.push(json!("just a string"));
        raw_items.push(json!(42));
        let raw = Value::Array(raw_items).to_string();

        assert_eq!(parse_roadmap(&raw).unwrap().len(), ROADMAP_LENGTH);
    }

    #[test]
    fn test_parse_roadmap_empty() {
        assert!(matches!(parse_roadmap("  "), Err(RoadmapError::Empty)));
        assert!(matches!(parse_roadmap("```json\n```"), Err(RoadmapError::Empty)));
    }

    #[test]
    fn test_parse_roadmap_invalid_json() {
        assert!(matches!(
            parse_roadmap("I cannot help with that"),
            Err(RoadmapError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_parse_roadmap_scalar_output() {
        assert!(matches!(
            parse_roadmap("\"ten items\""),
            Err(RoadmapError::UnexpectedFormat)
        ));
    }

    // =========================================================================
    // Locating the item array
    // =========================================================================

    #[test]
    fn test_locate_items_prefers_projects() {
        let parsed = json!({"roadmap": [1], "projects": [1, 2]});
        assert_eq!(locate_items(&parsed).unwrap().len(), 2);
    }

    #[test]
    fn test_locate_items_first_array_in_insertion_order() {
        let parsed = json!({"skill": "Go", "zeta": [1, 2, 3], "alpha": [1]});
        assert_eq!(locate_items(&parsed).unwrap().len(), 3);
    }

    #[test]
    fn test_locate_items_ignores_non_array_wrapper() {
        let parsed = json!({"projects": "none", "steps": [1]});
        assert_eq!(locate_items(&parsed).unwrap().len(), 1);
    }

    #[test]
    fn test_locate_items_unknown_structure() {
        let parsed = json!({"skill": "Go"});
        assert!(matches!(
            locate_items(&parsed),
            Err(RoadmapError::UnknownStructure)
        ));
    }

    // =========================================================================
    // Item normalization
    // =========================================================================

    #[test]
    fn test_normalize_item_aliases() {
        let item = normalize_item(&json!({
            "title": "Web APIs",
            "difficulty": "Advanced",
            "technologies": "axum",
            "requires": ["HTTP basics"],
            "projectList": ["REST service"]
        }))
        .unwrap();

        assert_eq!(item.level, "Advanced");
        assert_eq!(item.skills, vec!["axum".to_string()]);
        assert_eq!(item.prerequisites, vec!["HTTP basics".to_string()]);
        assert_eq!(item.project_list, vec!["REST service".to_string()]);
        assert_eq!(item.description, "");
    }

    #[test]
    fn test_normalize_item_portfolio_schema() {
        let item = normalize_item(&json!({
            "task_id": 1,
            "level": "Beginner",
            "title": "CLI calculator",
            "technical_skills_learned": ["parsing", "error handling"],
            "tools_and_technologies": ["cargo"]
        }))
        .unwrap();

        assert_eq!(
            item.skills,
            vec!["parsing".to_string(), "error handling".to_string()]
        );
    }

    #[test]
    fn test_normalize_item_skips_empty_aliases() {
        let item = normalize_item(&json!({
            "title": "X",
            "skills": [],
            "tools": ["git"],
            "level": ""
        }))
        .unwrap();

        assert_eq!(item.skills, vec!["git".to_string()]);
        assert_eq!(item.level, DEFAULT_LEVEL);
    }

    #[test]
    fn test_normalize_item_skips_aliases_that_are_not_lists() {
        let item = normalize_item(&json!({
            "title": "X",
            "skills": {"primary": "ownership"},
            "technologies": ["cargo"],
            "prerequisites": 3,
            "requires": "basics"
        }))
        .unwrap();

        assert_eq!(item.skills, vec!["cargo".to_string()]);
        assert_eq!(item.prerequisites, vec!["basics".to_string()]);
    }

    #[test]
    fn test_normalize_item_generates_projects() {
        let item = normalize_item(&json!({"title": "Ownership"})).unwrap();
        assert_eq!(
            item.project_list,
            vec![
                "Ownership – Mini Project".to_string(),
                "Ownership – Practical Implementation".to_string(),
                "Ownership – Real-World Use Case".to_string(),
            ]
        );
    }

    #[test]
    fn test_normalize_item_defaults_without_title() {
        let item = normalize_item(&json!({})).unwrap();

        assert_eq!(item.title, DEFAULT_TITLE);
        assert_eq!(item.level, DEFAULT_LEVEL);
        assert!(item.skills.is_empty());
        assert!(item.prerequisites.is_empty());
        assert_eq!(item.project_list[0], "Topic – Mini Project");
    }

    #[test]
    fn test_normalize_item_rejects_non_objects() {
        assert!(matches!(
            normalize_item(&json!(["a"])),
            Err(ItemRejection::NotAnObject(_))
        ));
    }

    // =========================================================================
    // Export
    // =========================================================================

    #[tokio::test]
    async fn test_write_roadmap_file_creates_directories() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("static").join("data").join("skill.json");
        let roadmap = normalize_items(&items(2));

        write_roadmap_file(&path, &roadmap).await.unwrap();

        let written: Vec<RoadmapItem> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, roadmap);
    }
}
