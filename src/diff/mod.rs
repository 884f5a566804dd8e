//! Line diff engine
//!
//! Text is split into line tokens, aligned with Myers' shortest edit script
//! and returned as an ordered list of added, removed and unchanged segments.
//! Rendering and statistics live in [`formatter`].

pub mod algorithms;
pub mod formatter;
pub mod generator;
pub mod segment;
pub mod tokenize;

// Re-export the main types for easier use
pub use algorithms::{DiffAlgorithm, DiffOptions, MyersAlgorithm};
pub use formatter::{DiffFormat, DiffFormatter};
pub use generator::{DiffConfig, DiffGenerator, DEFAULT_CONTEXT_LINES};
pub use segment::{ChangeKind, Diff, DiffStats, Segment};
pub use tokenize::{tokenize_lines, tokenize_merged_lines};

/// Diff two texts line by line with default options
pub fn diff_lines(before: &str, after: &str) -> Diff {
    MyersAlgorithm::default().diff(before, after)
}

/// Convenience function to render a diff with the given context
pub fn render_diff(before: &str, after: &str, context_lines: usize) -> String {
    diff_lines(before, after).render(context_lines)
}

/// Convenience function to get diff statistics
pub fn get_diff_stats(before: &str, after: &str) -> DiffStats {
    diff_lines(before, after).stats()
}
