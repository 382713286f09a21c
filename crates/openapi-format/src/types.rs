//! Options and report types for the formatter.

use serde::Serialize;

/// How hoisted schemas are named when a body has several media types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum SuffixScheme {
    /// `Name2`, `Name3`, `Name4`, ...
    #[default]
    Indexed,
    /// `Name2`, `Name23`, `Name234`, ... Each suffix extends the previous name.
    Cumulative,
}

impl SuffixScheme {
    /// Name for the `nth` hoisted schema (0-based) of a body with
    /// `media_types` entries. Single-media bodies keep the bare name.
    pub fn name(&self, base: &str, nth: usize, media_types: usize) -> String {
        if media_types <= 1 {
            return base.to_string();
        }
        match self {
            SuffixScheme::Indexed => format!("{base}{}", nth + 2),
            SuffixScheme::Cumulative => {
                let mut name = base.to_string();
                for i in 0..=nth {
                    name.push_str(&(i + 2).to_string());
                }
                name
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    pub suffix: SuffixScheme,
    /// Transform and report, but leave the file untouched.
    pub dry_run: bool,
}

/// A schema moved into `components.schemas`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoistedSchema {
    /// Component name, referenced as `#/components/schemas/<name>`.
    pub name: String,
    /// Where the inline schema was, e.g. `paths./users.post.requestBody.application/json`.
    pub location: String,
    /// A component with the same name existed and was replaced.
    pub replaced: bool,
}

/// What a formatting pass changed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormatReport {
    /// `(METHOD path, new operationId)` for every operation whose id changed.
    pub renamed_operations: Vec<(String, String)>,
    pub hoisted: Vec<HoistedSchema>,
    /// Operations skipped because they have neither summary nor operationId.
    pub unnamed_operations: Vec<String>,
}

impl FormatReport {
    pub fn is_unchanged(&self) -> bool {
        self.renamed_operations.is_empty() && self.hoisted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_media_type_keeps_bare_name() {
        assert_eq!(SuffixScheme::Indexed.name("Op_200_Response", 0, 1), "Op_200_Response");
        assert_eq!(SuffixScheme::Cumulative.name("Op_Request", 0, 1), "Op_Request");
    }

    #[test]
    fn test_indexed_suffixes() {
        let names: Vec<_> = (0..3).map(|n| SuffixScheme::Indexed.name("Op", n, 3)).collect();
        assert_eq!(names, vec!["Op2", "Op3", "Op4"]);
    }

    #[test]
    fn test_cumulative_suffixes() {
        let names: Vec<_> = (0..3)
            .map(|n| SuffixScheme::Cumulative.name("Op", n, 3))
            .collect();
        assert_eq!(names, vec!["Op2", "Op23", "Op234"]);
    }
}
