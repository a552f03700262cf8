//! Prompt text sent to the LLM provider.

use crate::github::RepoSummary;

/// System message for repository reviews
pub const REVIEW_SYSTEM: &str = "You are a professional GitHub repository reviewer.";

/// System message for roadmap generation
pub const ROADMAP_SYSTEM: &str = "Return ONLY valid JSON.";

/// System message for the portfolio project path
pub const PROJECT_PATH_SYSTEM: &str = "Return ONLY valid JSON. No markdown.";

/// System message for code evaluation
pub const EVALUATION_SYSTEM: &str = "Return ONLY JSON inside <json> tags.";

fn pretty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Ask for a scored review of a summarized repository
pub fn analysis_prompt(repo_url: &str, summary: &RepoSummary) -> String {
    let readme = if summary.readme.is_empty() {
        "No README"
    } else {
        summary.readme.as_str()
    };

    format!(
        r#"You are a senior software engineer performing an AI-assisted review of a public GitHub repository.

Repository URL:
{repo_url}

Total files: {total_files}
File types:
{file_types}

README:
{readme}

Code Samples:
{code_samples}

Return ONLY valid JSON:

{{
  "documentation_score": 0-100,
  "code_quality_score": 0-100,
  "maintainability_score": 0-100,
  "estimated_developer_level": "beginner | intermediate | advanced",
  "strengths": [],
  "weaknesses": [],
  "improvement_suggestions": []
}}
"#,
        total_files = summary.total_files,
        file_types = pretty(&summary.file_types),
        code_samples = pretty(&summary.code_samples),
    )
}

/// Ask for a ten-item learning roadmap
pub fn roadmap_prompt(skill: &str) -> String {
    format!(
        r#"You are an expert curriculum designer.
Create a professional learning roadmap for "{skill}".

RULES:
- JSON ONLY
- EXACTLY 10 ROADMAP ITEMS
- Beginner → Advanced
- Each item MUST include:
  - title
  - description
  - level
  - skills (array)
  - prerequisites (array, empty if none)
  - project_list (array of hands-on projects)
"#
    )
}

/// Ask for a ten-project portfolio path with a richer per-project schema
pub fn project_path_prompt(skill: &str) -> String {
    format!(
        r#"You are a senior curriculum architect and industry expert.

Create a COMPLETE, MODERN, INDUSTRY-READY learning path for the skill:

SKILL: "{skill}"

ABSOLUTE RULES (DO NOT BREAK):
- Return ONLY valid JSON
- No markdown
- No explanations
- Exactly 10 projects
- Projects must progress from Beginner → Advanced
- Each project must be REAL, PRACTICAL, and PORTFOLIO-WORTHY
- Include multiple platforms: console, web app, API, system, mobile, AI, cloud
- Each project MUST clearly state technical skills learned
- Assume learner is starting from scratch and ends job-ready

REQUIRED JSON SCHEMA:

{{
  "skill": "{skill}",
  "projects": [
    {{
      "task_id": 1,
      "level": "Beginner",
      "title": "Project title",
      "platform": "Console / Web / API / Mobile / ML / System",
      "description": "What the learner will build",
      "technical_skills_learned": ["Skill 1", "Skill 2", "Skill 3"],
      "tools_and_technologies": ["Tool 1", "Tool 2"],
      "expected_outcome": "What the learner will be capable of after completing this project",
      "references": ["https://official-docs-link", "https://high-quality-tutorial"]
    }}
  ]
}}

Order the projects from console fundamentals through data handling, files or
APIs, web applications, databases, authentication, performance, architecture
and AI or cloud automation, ending with a production-grade capstone.

Generate the FULL 10-project roadmap now.
"#
    )
}

/// Ask for a review of a learner's code, wrapped in `<json>` tags
pub fn evaluation_prompt(task: &str, code: &str) -> String {
    format!(
        r#"You are a senior Python instructor.

TASK:
{task}

STUDENT CODE:
{code}

Evaluate the code.

RULES:
- Respond ONLY with JSON
- Wrap JSON between <json> and </json>
- No explanation outside JSON

JSON FORMAT EXAMPLE:
<json>
{{
  "feedback": [
    "Clear and correct solution"
  ],
  "improved_code": "<improved version of the student code>",
  "score": 95
}}
</json>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::CodeSample;

    fn summary() -> RepoSummary {
        let mut summary = RepoSummary {
            total_files: 3,
            readme: "# Demo project".to_string(),
            code_samples: vec![CodeSample {
                file: "demo-main/main.py".to_string(),
                content: "print('hi')".to_string(),
            }],
            ..Default::default()
        };
        summary.file_types.insert(".py".to_string(), 2);
        summary.file_types.insert(".md".to_string(), 1);
        summary
    }

    #[test]
    fn test_analysis_prompt_embeds_summary() {
        let prompt = analysis_prompt("https://github.com/octo/demo", &summary());

        assert!(prompt.contains("https://github.com/octo/demo"));
        assert!(prompt.contains("Total files: 3"));
        assert!(prompt.contains("\".py\": 2"));
        assert!(prompt.contains("# Demo project"));
        assert!(prompt.contains("demo-main/main.py"));
        assert!(prompt.contains("\"improvement_suggestions\": []"));
    }

    #[test]
    fn test_analysis_prompt_without_readme() {
        let prompt = analysis_prompt("https://github.com/octo/demo", &RepoSummary::default());
        assert!(prompt.contains("README:\nNo README"));
        assert!(prompt.contains("Code Samples:\n[]"));
    }

    #[test]
    fn test_roadmap_prompt() {
        let prompt = roadmap_prompt("Rust");
        assert!(prompt.contains("roadmap for \"Rust\""));
        assert!(prompt.contains("EXACTLY 10 ROADMAP ITEMS"));
        assert!(prompt.contains("project_list"));
    }

    #[test]
    fn test_project_path_prompt() {
        let prompt = project_path_prompt("Go");
        assert!(prompt.contains("SKILL: \"Go\""));
        assert!(prompt.contains("\"skill\": \"Go\""));
        assert!(prompt.contains("technical_skills_learned"));
    }

    #[test]
    fn test_evaluation_prompt() {
        let prompt = evaluation_prompt("Print hello", "print('hello')");
        assert!(prompt.contains("TASK:\nPrint hello"));
        assert!(prompt.contains("STUDENT CODE:\nprint('hello')"));
        assert!(prompt.contains("<json>"));
        assert!(prompt.contains("</json>"));
    }
}
