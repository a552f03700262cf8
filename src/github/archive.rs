//! Bounded summaries of repository source archives.
//!
//! Only enough of the repository is kept to fit a review prompt: an extension
//! histogram, the README excerpt and a handful of truncated source files.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::Path;

/// Maximum number of source files sampled
pub const MAX_SAMPLES: usize = 15;

/// Characters kept from each sampled file
pub const MAX_SAMPLE_CHARS: usize = 1500;

/// Characters kept from the README
pub const MAX_README_CHARS: usize = 3000;

/// Extensions considered source code when sampling
const SOURCE_EXTENSIONS: &[&str] = &[".py", ".js", ".ts", ".java", ".cpp", ".c", ".go", ".rs"];

/// One truncated source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeSample {
    pub file: String,
    pub content: String,
}

/// What the reviewer gets to see of a repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepoSummary {
    pub total_files: usize,
    pub file_types: BTreeMap<String, usize>,
    pub readme: String,
    pub code_samples: Vec<CodeSample>,
}

/// Lower-cased extension with its leading dot, or `""`
fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

fn is_readme(name: &str) -> bool {
    Path::new(name)
        .file_name()
        .is_some_and(|f| f.to_string_lossy().to_lowercase().starts_with("readme"))
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Summarize a zip archive held in memory
pub fn summarize_archive(bytes: &[u8]) -> Result<RepoSummary> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).context("Failed to open repository archive")?;

    let mut files = Vec::new();
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .context("Failed to read archive entry")?;
        if !entry.is_dir() {
            files.push((index, entry.name().to_string()));
        }
    }

    let mut summary = RepoSummary {
        total_files: files.len(),
        ..Default::default()
    };

    for (_, name) in &files {
        *summary.file_types.entry(extension_of(name)).or_insert(0) += 1;
    }

    if let Some((index, _)) = files.iter().find(|(_, name)| is_readme(name)) {
        if let Some(bytes) = read_entry(&mut archive, *index) {
            let text = String::from_utf8_lossy(&bytes).replace('\u{FFFD}', "");
            summary.readme = truncate_chars(&text, MAX_README_CHARS);
        }
    }

    for (index, name) in &files {
        if summary.code_samples.len() >= MAX_SAMPLES {
            break;
        }
        if !SOURCE_EXTENSIONS.contains(&extension_of(name).as_str()) {
            continue;
        }

        let Some(bytes) = read_entry(&mut archive, *index) else {
            continue;
        };
        match String::from_utf8(bytes) {
            Ok(content) => summary.code_samples.push(CodeSample {
                file: name.clone(),
                content: truncate_chars(&content, MAX_SAMPLE_CHARS),
            }),
            Err(_) => tracing::debug!("Skipping non-UTF-8 file {}", name),
        }
    }

    Ok(summary)
}

fn read_entry(archive: &mut zip::ZipArchive<Cursor<&[u8]>>, index: usize) -> Option<Vec<u8>> {
    let mut entry = archive.by_index(index).ok()?;
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).ok()?;
    Some(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::zip_bytes;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("repo-main/src/Main.RS"), ".rs");
        assert_eq!(extension_of("repo-main/Makefile"), "");
        assert_eq!(extension_of("repo-main/.gitignore"), "");
        assert_eq!(extension_of("repo-main/archive.tar.gz"), ".gz");
    }

    #[test]
    fn test_is_readme() {
        assert!(is_readme("repo-main/README.md"));
        assert!(is_readme("repo-main/docs/readme"));
        assert!(!is_readme("repo-main/readme-assets/logo.png"));
        assert!(!is_readme("repo-main/src/lib.rs"));
    }

    #[test]
    fn test_summary_counts_and_histogram() {
        let archive = zip_bytes(&[
            ("demo-main/README.md", b"# Demo".as_slice()),
            ("demo-main/src/main.rs", b"fn main() {}".as_slice()),
            ("demo-main/src/lib.rs", b"pub fn lib() {}".as_slice()),
            ("demo-main/Makefile", b"all:".as_slice()),
        ]);

        let summary = summarize_archive(&archive).unwrap();

        assert_eq!(summary.total_files, 4);
        assert_eq!(summary.file_types.get(".rs"), Some(&2));
        assert_eq!(summary.file_types.get(".md"), Some(&1));
        assert_eq!(summary.file_types.get(""), Some(&1));
        assert_eq!(summary.readme, "# Demo");
        assert_eq!(summary.code_samples.len(), 2);
        assert_eq!(summary.code_samples[0].file, "demo-main/src/main.rs");
    }

    #[test]
    fn test_summary_truncates_readme_and_samples() {
        let long_readme = "r".repeat(MAX_README_CHARS + 500);
        let long_source = "x".repeat(MAX_SAMPLE_CHARS + 10);
        let archive = zip_bytes(&[
            ("demo-main/README", long_readme.as_bytes()),
            ("demo-main/app.py", long_source.as_bytes()),
        ]);

        let summary = summarize_archive(&archive).unwrap();

        assert_eq!(summary.readme.chars().count(), MAX_README_CHARS);
        assert_eq!(summary.code_samples[0].content.chars().count(), MAX_SAMPLE_CHARS);
    }

    #[test]
    fn test_summary_truncates_by_characters_not_bytes() {
        let source = "é".repeat(MAX_SAMPLE_CHARS + 1);
        let archive = zip_bytes(&[("demo-main/app.go", source.as_bytes())]);

        let summary = summarize_archive(&archive).unwrap();
        assert_eq!(summary.code_samples[0].content, "é".repeat(MAX_SAMPLE_CHARS));
    }

    #[test]
    fn test_summary_caps_sample_count() {
        let names: Vec<String> = (0..MAX_SAMPLES + 5)
            .map(|i| format!("demo-main/src/file{}.ts", i))
            .collect();
        let entries: Vec<(&str, &[u8])> = names
            .iter()
            .map(|n| (n.as_str(), b"export {}".as_slice()))
            .collect();
        let archive = zip_bytes(&entries);

        let summary = summarize_archive(&archive).unwrap();
        assert_eq!(summary.total_files, MAX_SAMPLES + 5);
        assert_eq!(summary.code_samples.len(), MAX_SAMPLES);
    }

    #[test]
    fn test_summary_skips_non_utf8_sources() {
        let archive = zip_bytes(&[
            ("demo-main/bad.c", b"\xff\xfe\x00A".as_slice()),
            ("demo-main/good.c", b"int main() {}".as_slice()),
        ]);

        let summary = summarize_archive(&archive).unwrap();
        assert_eq!(summary.code_samples.len(), 1);
        assert_eq!(summary.code_samples[0].file, "demo-main/good.c");
        assert_eq!(summary.total_files, 2);
    }

    #[test]
    fn test_summary_ignores_directory_entries() {
        let archive = zip_bytes(&[
            ("demo-main/", b"".as_slice()),
            ("demo-main/src/", b"".as_slice()),
            ("demo-main/src/index.js", b"console.log(1)".as_slice()),
        ]);

        let summary = summarize_archive(&archive).unwrap();
        assert_eq!(summary.total_files, 1);
        assert_eq!(summary.file_types.len(), 1);
    }

    #[test]
    fn test_summary_without_readme() {
        let archive = zip_bytes(&[("demo-main/main.java", b"class Main {}".as_slice())]);
        let summary = summarize_archive(&archive).unwrap();
        assert!(summary.readme.is_empty());
    }

    #[test]
    fn test_summary_rejects_garbage() {
        assert!(summarize_archive(b"definitely not a zip").is_err());
    }
}
