use crate::scanner::DocumentFile;
use std::collections::{HashMap, HashSet};
use std::path::{Component, PathBuf};

#[derive(Debug, Clone)]
pub struct PlannedOutput {
    pub document: DocumentFile,
    pub output_path: PathBuf,
}

/// Assigns every document of a run a distinct PDF path in the output directory.
///
/// Documents are ordered by relative path. A document whose stem is unique in
/// the run keeps `<stem>.pdf`; documents sharing a stem are named after their
/// flattened relative path (`a/index.html` -> `a_index.pdf`), with `-2`, `-3`
/// appended if that is still taken. Names are compared case-insensitively so
/// the plan also holds on case-folding filesystems.
pub struct OutputPlanner {
    output_dir: PathBuf,
    extension: String,
}

impl OutputPlanner {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(output_dir: P, extension: S) -> Self {
        Self {
            output_dir: output_dir.into(),
            extension: extension.into(),
        }
    }

    pub fn plan(&self, mut documents: Vec<DocumentFile>) -> Vec<PlannedOutput> {
        documents.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        let stems: Vec<String> = documents
            .iter()
            .map(|doc| sanitize_filename(&doc.stem(&self.extension)))
            .collect();

        let mut stem_counts: HashMap<String, usize> = HashMap::new();
        for stem in &stems {
            *stem_counts.entry(stem.to_lowercase()).or_insert(0) += 1;
        }

        let mut taken: HashSet<String> = HashSet::new();
        let mut planned = Vec::with_capacity(documents.len());

        for (document, stem) in documents.into_iter().zip(stems) {
            let base = if stem_counts.get(&stem.to_lowercase()).copied().unwrap_or(0) > 1 {
                self.flattened_name(&document)
            } else {
                stem
            };

            let mut name = base.clone();
            let mut suffix = 2;
            while !taken.insert(name.to_lowercase()) {
                name = format!("{}-{}", base, suffix);
                suffix += 1;
            }

            planned.push(PlannedOutput {
                output_path: self.output_dir.join(format!("{}.pdf", name)),
                document,
            });
        }

        planned
    }

    fn flattened_name(&self, document: &DocumentFile) -> String {
        let mut parts: Vec<String> = document
            .relative_path
            .parent()
            .map(|parent| {
                parent
                    .components()
                    .filter_map(|c| match c {
                        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        parts.push(document.stem(&self.extension));
        sanitize_filename(&parts.join("_"))
    }
}

/// Replaces characters that are invalid in file names on common filesystems.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|ch| match ch {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    // Trailing dots and spaces are stripped by Windows
    let sanitized = sanitized.trim_end_matches(['.', ' ']);

    if sanitized.is_empty() {
        "document".to_string()
    } else {
        sanitized.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn doc(relative: &str) -> DocumentFile {
        DocumentFile::new(
            Path::new("/extracted").join(relative),
            PathBuf::from(relative),
            0,
        )
    }

    fn names(planned: &[PlannedOutput]) -> Vec<String> {
        planned
            .iter()
            .map(|p| p.output_path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_unique_stems_keep_simple_names() {
        let planner = OutputPlanner::new("/out", ".html");
        let planned = planner.plan(vec![doc("docs/guide.html"), doc("about.html")]);

        assert_eq!(names(&planned), vec!["about.pdf", "guide.pdf"]);
        assert_eq!(planned[1].output_path, PathBuf::from("/out/guide.pdf"));
        assert_eq!(planned[1].document.relative_path, PathBuf::from("docs/guide.html"));
    }

    #[test]
    fn test_shared_stems_use_relative_path() {
        let planner = OutputPlanner::new("/out", ".html");
        let planned = planner.plan(vec![
            doc("b/index.html"),
            doc("index.html"),
            doc("a/index.html"),
        ]);

        assert_eq!(names(&planned), vec!["a_index.pdf", "b_index.pdf", "index.pdf"]);
    }

    #[test]
    fn test_flattened_name_collision_gets_suffix() {
        let planner = OutputPlanner::new("/out", ".html");
        let planned = planner.plan(vec![
            doc("a/b_c.html"),
            doc("a_b/c.html"),
            doc("a/b/c.html"),
        ]);

        let result = names(&planned);
        let unique: HashSet<_> = result.iter().map(|n| n.to_lowercase()).collect();
        assert_eq!(unique.len(), 3);
        assert!(result.contains(&"a_b_c.pdf".to_string()));
        assert!(result.contains(&"a_b_c-2.pdf".to_string()));
    }

    #[test]
    fn test_plan_is_deterministic() {
        let planner = OutputPlanner::new("/out", ".html");
        let first = names(&planner.plan(vec![doc("x/index.html"), doc("y/index.html")]));
        let second = names(&planner.plan(vec![doc("y/index.html"), doc("x/index.html")]));
        assert_eq!(first, second);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("normal-name"), "normal-name");
        assert_eq!(sanitize_filename("what?: \"quoted\""), "what__ _quoted_");
        assert_eq!(sanitize_filename("trailing. "), "trailing");
        assert_eq!(sanitize_filename(""), "document");
        assert_eq!(sanitize_filename("İstanbul"), "İstanbul");
    }
}
