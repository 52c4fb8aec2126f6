//! Gitignore-style ignore patterns for content filtering.
//!
//! Parses a `.contentignore` file (one pattern per line, `#` comments,
//! `!` negation, trailing-`/` directory patterns) and evaluates relative
//! paths against it. Matching is a pure function over (pattern list, path)
//! with no filesystem access, so it is unit-testable without real
//! directories.
//!
//! # Semantics
//!
//! - Patterns apply in file order; the *last* matching pattern wins.
//! - A `!`-prefixed pattern re-includes a path excluded by an earlier one.
//! - A pattern ending in `/` matches directories only (and therefore
//!   everything beneath them).
//! - A pattern containing no `/` matches at any depth; a pattern with a
//!   `/` is anchored to the root of the tree being filtered.
//! - A pattern matching a directory ignores all files beneath it.
//!
//! Malformed lines are skipped with a warning rather than aborting the
//! sync (best-effort parsing).

use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// IgnorePattern
// ---------------------------------------------------------------------------

/// One parsed pattern line from a `.contentignore` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnorePattern {
    /// The original line text, for reporting.
    pub text: String,
    /// 1-based line number in the ignore file (0 for synthetic patterns).
    pub line: usize,
    /// `true` if the line started with `!` (re-include).
    negated: bool,
    /// `true` if the line ended with `/` (directories only).
    dir_only: bool,
    /// Compiled glob, matched against forward-slash relative paths.
    glob: String,
    /// `true` if the glob is anchored to the tree root.
    anchored: bool,
}

impl fmt::Display for IgnorePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl IgnorePattern {
    /// Parse a single line. Returns `None` for blanks and comments,
    /// `Some(Err(reason))` for lines that cannot be compiled.
    fn parse(line: &str, line_number: usize) -> Option<Result<Self, String>> {
        let text = line.to_string();
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let (negated, rest) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (dir_only, rest) = match rest.strip_suffix('/') {
            Some(rest) => (true, rest),
            None => (false, rest),
        };

        // Leading slash anchors without contributing to the glob.
        let (had_leading_slash, rest) = match rest.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, rest),
        };

        if rest.is_empty() {
            return Some(Err("pattern is empty after stripping".into()));
        }

        let anchored = had_leading_slash || rest.contains('/');

        Some(Ok(Self {
            text,
            line: line_number,
            negated,
            dir_only,
            glob: rest.to_string(),
            anchored,
        }))
    }

    /// Whether `self.glob` matches the given relative path string.
    fn glob_matches(&self, rel: &str) -> bool {
        if glob_match::glob_match(&self.glob, rel) {
            return true;
        }
        // Unanchored patterns also match at any depth.
        if !self.anchored {
            let nested = format!("**/{}", self.glob);
            if glob_match::glob_match(&nested, rel) {
                return true;
            }
        }
        false
    }

    /// Whether this pattern matches the file at `rel_path`.
    ///
    /// `rel_path` is a forward-slash relative path to a *file*. Directory
    /// patterns match via the file's ancestor directories; plain patterns
    /// match the file itself or any ancestor (a matched directory ignores
    /// its whole subtree).
    pub fn matches_file(&self, rel_path: &str) -> bool {
        if !self.dir_only && self.glob_matches(rel_path) {
            return true;
        }
        for ancestor in ancestors(rel_path) {
            if self.glob_matches(ancestor) {
                return true;
            }
        }
        false
    }

}

/// Proper ancestor directories of a relative file path, nearest-root first.
/// `"a/b/c.yml"` yields `"a"` then `"a/b"`.
fn ancestors(rel_path: &str) -> impl Iterator<Item = &str> {
    rel_path
        .match_indices('/')
        .map(move |(idx, _)| &rel_path[..idx])
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// The outcome of evaluating a path against an [`IgnoreSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<'a> {
    /// Excluded: the last matching pattern was an ignore.
    Ignored(&'a IgnorePattern),
    /// Re-included: the last matching pattern was a `!` negation.
    Included(&'a IgnorePattern),
    /// No pattern matched.
    Unmatched,
}

impl Decision<'_> {
    /// `true` if the path should be excluded from the sync.
    pub fn is_ignored(&self) -> bool {
        matches!(self, Decision::Ignored(_))
    }
}

// ---------------------------------------------------------------------------
// IgnoreSet
// ---------------------------------------------------------------------------

/// A line that could not be parsed, kept for reporting.
#[derive(Debug, Clone)]
pub struct SkippedLine {
    pub line: usize,
    pub text: String,
    pub reason: String,
}

/// An ordered set of ignore patterns with gitignore precedence.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    patterns: Vec<IgnorePattern>,
    skipped: Vec<SkippedLine>,
}

impl IgnoreSet {
    /// Parse patterns from the text of an ignore file. Malformed lines are
    /// recorded in [`IgnoreSet::skipped`] and logged, not fatal.
    pub fn parse(text: &str) -> Self {
        let mut patterns = Vec::new();
        let mut skipped = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            let line_number = idx + 1;
            match IgnorePattern::parse(line, line_number) {
                None => {}
                Some(Ok(pattern)) => patterns.push(pattern),
                Some(Err(reason)) => {
                    warn!(line = line_number, text = line, %reason, "skipping malformed ignore pattern");
                    skipped.push(SkippedLine {
                        line: line_number,
                        text: line.to_string(),
                        reason,
                    });
                }
            }
        }

        debug!(
            patterns = patterns.len(),
            skipped = skipped.len(),
            "parsed ignore set"
        );
        Self { patterns, skipped }
    }

    /// Load patterns from an ignore file. A missing file yields an empty
    /// set (not an error); an unreadable existing file is an I/O error.
    pub fn load(path: &Path) -> Result<Self, std::io::Error> {
        if !path.exists() {
            debug!(path = %path.display(), "no ignore file present");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Build a set from pattern strings (used by tests and callers that
    /// assemble patterns programmatically).
    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();
        Self::parse(&text.join("\n"))
    }

    /// Evaluate `rel_path` (forward-slash, relative to the tree root).
    /// The last matching pattern decides.
    pub fn decide(&self, rel_path: &str) -> Decision<'_> {
        let mut last: Option<&IgnorePattern> = None;
        for pattern in &self.patterns {
            if pattern.matches_file(rel_path) {
                last = Some(pattern);
            }
        }
        match last {
            Some(p) if p.negated => Decision::Included(p),
            Some(p) => Decision::Ignored(p),
            None => Decision::Unmatched,
        }
    }

    /// Shorthand for `decide(rel_path).is_ignored()`.
    pub fn is_ignored(&self, rel_path: &str) -> bool {
        self.decide(rel_path).is_ignored()
    }

    /// The pattern responsible for ignoring `rel_path`, if any. Used by the
    /// `ignores` subcommand to explain why a file is excluded.
    pub fn explain(&self, rel_path: &str) -> Option<&IgnorePattern> {
        match self.decide(rel_path) {
            Decision::Ignored(p) => Some(p),
            _ => None,
        }
    }

    pub fn skipped(&self) -> &[SkippedLine] {
        &self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_matches_nothing() {
        let set = IgnoreSet::parse("");
        assert!(!set.is_ignored("anything.yml"));
        assert_eq!(set.decide("a/b/c"), Decision::Unmatched);
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let set = IgnoreSet::parse("# a comment\n\n   \n*.sh\n");
        assert_eq!(set.len(), 1);
        assert!(set.is_ignored("install.sh"));
    }

    #[test]
    fn test_extension_pattern_any_depth() {
        let set = IgnoreSet::from_patterns(["*.sh"]);
        assert!(set.is_ignored("install.sh"));
        assert!(set.is_ignored("scripts/deep/run.sh"));
        assert!(!set.is_ignored("Integrations/bar.yml"));
    }

    #[test]
    fn test_spec_filter_example() {
        // Patterns ["*.sh", "Tests/*"] over install.sh, Tests/foo.py,
        // Integrations/bar.yml: only the last survives.
        let set = IgnoreSet::from_patterns(["*.sh", "Tests/*"]);
        assert!(set.is_ignored("install.sh"));
        assert!(set.is_ignored("Tests/foo.py"));
        assert!(!set.is_ignored("Integrations/bar.yml"));
    }

    #[test]
    fn test_negation_last_match_wins() {
        let set = IgnoreSet::from_patterns(["Tests/*", "!Tests/keep.yml"]);
        assert!(!set.is_ignored("Tests/keep.yml"));
        assert!(set.is_ignored("Tests/drop.yml"));
        assert!(matches!(
            set.decide("Tests/keep.yml"),
            Decision::Included(_)
        ));
    }

    #[test]
    fn test_negation_then_reignore() {
        // Order matters: a later ignore overrides an earlier negation.
        let set = IgnoreSet::from_patterns(["!keep.yml", "*.yml"]);
        assert!(set.is_ignored("keep.yml"));
    }

    #[test]
    fn test_directory_pattern_matches_subtree() {
        let set = IgnoreSet::from_patterns(["build/"]);
        assert!(set.is_ignored("build/out/main.o"));
        assert!(set.is_ignored("nested/build/cache.bin"));
        // A *file* named build is not a directory match.
        assert!(!set.is_ignored("build"));
    }

    #[test]
    fn test_bare_name_matches_dir_contents() {
        // Gitignoring a directory by name ignores everything beneath it.
        let set = IgnoreSet::from_patterns([".git"]);
        assert!(set.is_ignored(".git/config"));
        assert!(set.is_ignored(".git/objects/ab/cdef"));
        assert!(!set.is_ignored("src/git.rs"));
    }

    #[test]
    fn test_anchored_pattern() {
        let set = IgnoreSet::from_patterns(["/TestData"]);
        assert!(set.is_ignored("TestData/sample.json"));
        assert!(!set.is_ignored("Packs/TestData/sample.json"));
    }

    #[test]
    fn test_anchored_by_inner_slash() {
        let set = IgnoreSet::from_patterns(["docs/*.md"]);
        assert!(set.is_ignored("docs/readme.md"));
        assert!(!set.is_ignored("other/docs/readme.md"));
    }

    #[test]
    fn test_double_star() {
        let set = IgnoreSet::from_patterns(["Packs/**/test_data/*"]);
        assert!(set.is_ignored("Packs/Base/test_data/x.json"));
        assert!(set.is_ignored("Packs/a/b/test_data/y.json"));
        assert!(!set.is_ignored("Packs/Base/real_data/x.json"));
    }

    #[test]
    fn test_question_mark_glob() {
        let set = IgnoreSet::from_patterns(["v?.yml"]);
        assert!(set.is_ignored("v1.yml"));
        assert!(!set.is_ignored("v10.yml"));
    }

    #[test]
    fn test_malformed_line_skipped_not_fatal() {
        // A lone "!" strips to nothing: recovered, remaining patterns apply.
        let set = IgnoreSet::parse("!\n*.sh\n");
        assert_eq!(set.len(), 1);
        assert_eq!(set.skipped().len(), 1);
        assert_eq!(set.skipped()[0].line, 1);
        assert!(set.is_ignored("install.sh"));
    }

    #[test]
    fn test_explain_names_deciding_pattern() {
        let set = IgnoreSet::from_patterns(["*.sh", "Tests/*"]);
        let pattern = set.explain("Tests/foo.py").expect("should be ignored");
        assert_eq!(pattern.text, "Tests/*");
        assert_eq!(pattern.line, 2);
        assert!(set.explain("Integrations/bar.yml").is_none());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let set = IgnoreSet::load(&dir.path().join(".contentignore")).unwrap();
        assert!(set.is_empty());
        assert!(!set.is_ignored("anything"));
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".contentignore");
        std::fs::write(&path, "# generated\n*.pyc\nTests/\n").unwrap();
        let set = IgnoreSet::load(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.is_ignored("module.pyc"));
        assert!(set.is_ignored("Tests/unit/test_x.py"));
    }
}
