use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::segment::{ChangeKind, Diff, DiffStats, Segment};
use crate::error::Result;

const ELLIPSIS: &str = "...";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Different output formats for diffs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffFormat {
    /// Line preview with +/- markers
    #[default]
    Text,
    /// Segments and counts as JSON
    Json,
    /// One-line summary
    Stat,
}

/// Lines of one segment as they appear in the printed preview
#[derive(Debug, Clone, PartialEq, Eq)]
struct PrintBlock {
    kind: ChangeKind,
    lines: Vec<String>,
}

impl PrintBlock {
    fn is_change(&self) -> bool {
        self.kind.is_change()
    }

    fn is_single_line(&self) -> bool {
        self.lines.len() == 1
    }
}

#[derive(Serialize)]
struct DiffReport<'a> {
    changes: usize,
    minimal: bool,
    stats: DiffStats,
    segments: &'a [Segment],
}

/// Formats diff results into various text representations
pub struct DiffFormatter;

impl DiffFormatter {
    /// Render a diff as `+ `/`- ` prefixed lines with up to `context_lines`
    /// unchanged lines around each change.
    ///
    /// Returns an empty string when nothing changed.
    pub fn render(diff: &Diff, context_lines: usize) -> String {
        let mut blocks = print_blocks(diff.segments());
        reorder_split_changes(&mut blocks);

        if !blocks.iter().any(PrintBlock::is_change) {
            return String::new();
        }

        let mut output: Vec<String> = Vec::new();
        let mut pending: Vec<&str> = Vec::new();
        let mut seen_change = false;

        for block in &blocks {
            if !block.is_change() {
                pending.extend(block.lines.iter().map(String::as_str));
                continue;
            }

            if seen_change {
                push_gap(&mut output, &pending, context_lines);
            } else {
                push_leading(&mut output, &pending, context_lines);
            }
            pending.clear();
            seen_change = true;

            for line in &block.lines {
                output.push(format_line(block.kind, line));
            }
        }

        push_trailing(&mut output, &pending, context_lines);
        output.join("\n")
    }

    /// Render with `---`/`+++` labels for the two sides
    pub fn render_with_header(
        diff: &Diff,
        old_label: &str,
        new_label: &str,
        context_lines: usize,
    ) -> String {
        let body = Self::render(diff, context_lines);
        let mut output = format!("--- {}\n+++ {}", old_label, new_label);
        if !body.is_empty() {
            output.push('\n');
            output.push_str(&body);
        }
        output
    }

    /// Wrap added lines in green and removed lines in red
    pub fn colorize(rendered: &str) -> String {
        rendered
            .lines()
            .map(|line| {
                if line == "+" || line.starts_with("+ ") {
                    format!("{}{}{}", GREEN, line, RESET)
                } else if line == "-" || line.starts_with("- ") {
                    format!("{}{}{}", RED, line, RESET)
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Format diff statistics as a summary
    pub fn format_stats(diff: &Diff) -> String {
        let stats = diff.stats();

        if !diff.has_changes() {
            return "No changes".to_string();
        }

        let mut parts = Vec::new();

        if stats.lines_added > 0 {
            parts.push(format!(
                "{} insertion{}",
                stats.lines_added,
                if stats.lines_added == 1 { "" } else { "s" }
            ));
        }

        if stats.lines_removed > 0 {
            parts.push(format!(
                "{} deletion{}",
                stats.lines_removed,
                if stats.lines_removed == 1 { "" } else { "s" }
            ));
        }

        if parts.is_empty() {
            // Only line terminators changed
            parts.push("whitespace changes only".to_string());
        }

        parts.join(", ")
    }

    /// Format with the specified format type
    pub fn format(
        diff: &Diff,
        format: DiffFormat,
        context_lines: usize,
        color: bool,
    ) -> Result<String> {
        let output = match format {
            DiffFormat::Text => {
                let rendered = Self::render(diff, context_lines);
                if color {
                    Self::colorize(&rendered)
                } else {
                    rendered
                }
            }
            DiffFormat::Json => serde_json::to_string_pretty(&DiffReport {
                changes: diff.changes(),
                minimal: diff.is_minimal(),
                stats: diff.stats(),
                segments: diff.segments(),
            })?,
            DiffFormat::Stat => Self::format_stats(diff),
        };
        Ok(output)
    }
}

fn format_line(kind: ChangeKind, line: &str) -> String {
    format!("{}{}", kind.sign(), line).trim_end().to_string()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_bare_terminator(value: &str) -> bool {
    value == "\n" || value == "\r\n"
}

fn strip_leading_terminator(value: &str) -> &str {
    value
        .strip_prefix("\r\n")
        .or_else(|| value.strip_prefix('\n'))
        .unwrap_or(value)
}

fn split_lines(value: &str) -> Vec<String> {
    let body = value
        .strip_suffix("\r\n")
        .or_else(|| value.strip_suffix('\n'))
        .unwrap_or(value);
    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// Build the print view of the stored segments.
///
/// Segments that are empty or only a line terminator are dropped. When line
/// terminators are separate tokens a segment may open with the terminator of
/// the line before it; that terminator is not a line of its own.
fn print_blocks(segments: &[Segment]) -> Vec<PrintBlock> {
    let mut blocks = Vec::new();
    let mut previous_ends_line = true;

    for segment in segments {
        let value = segment.value.as_str();
        if value.is_empty() {
            continue;
        }

        let ends_line = value.ends_with('\n');
        let value = if previous_ends_line {
            value
        } else {
            strip_leading_terminator(value)
        };
        previous_ends_line = ends_line;

        if value.is_empty() || is_bare_terminator(value) {
            continue;
        }

        blocks.push(PrintBlock {
            kind: segment.kind,
            lines: split_lines(value),
        });
    }

    blocks
}

/// Keep multi-line changes of one kind contiguous.
///
/// A single-line change wedged between a single-line change of the other
/// kind and a multi-line change of its own kind trades places with that
/// other single-line change.
fn reorder_split_changes(blocks: &mut [PrintBlock]) {
    let mut i = 0;
    while i + 2 < blocks.len() {
        let (a, b, c) = (&blocks[i], &blocks[i + 1], &blocks[i + 2]);
        if a.is_change()
            && b.is_change()
            && c.is_change()
            && a.kind != b.kind
            && c.kind == a.kind
        {
            if a.is_single_line() && b.is_single_line() && !c.is_single_line() {
                blocks.swap(i, i + 1);
            } else if !a.is_single_line() && b.is_single_line() && c.is_single_line() {
                blocks.swap(i + 1, i + 2);
            }
        }
        i += 1;
    }
}

fn push_context(output: &mut Vec<String>, lines: &[&str]) {
    for line in lines {
        output.push(format_line(ChangeKind::Unchanged, line));
    }
}

fn push_leading(output: &mut Vec<String>, pending: &[&str], context_lines: usize) {
    let start = pending.len().saturating_sub(context_lines);
    let mut window = &pending[start..];
    while window.first().map_or(false, |line| is_blank(line)) {
        window = &window[1..];
    }

    if start > 0 {
        output.push(ELLIPSIS.to_string());
    }
    push_context(output, window);
}

fn push_gap(output: &mut Vec<String>, pending: &[&str], context_lines: usize) {
    if pending.len() <= context_lines * 2 {
        push_context(output, pending);
        return;
    }

    push_context(output, &pending[..context_lines]);
    output.push(ELLIPSIS.to_string());
    push_context(output, &pending[pending.len() - context_lines..]);
}

fn push_trailing(output: &mut Vec<String>, pending: &[&str], context_lines: usize) {
    let end = pending.len().min(context_lines);
    let mut window = &pending[..end];
    while window.last().map_or(false, |line| is_blank(line)) {
        window = &window[..window.len() - 1];
    }

    push_context(output, window);
    if end < pending.len() {
        output.push(ELLIPSIS.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::algorithms::{DiffAlgorithm, MyersAlgorithm};

    fn create_test_diff() -> Diff {
        MyersAlgorithm::default().diff("line1\nline2\nline3\n", "line1\nmodified\nline3\n")
    }

    fn block(kind: ChangeKind, lines: &[&str]) -> PrintBlock {
        PrintBlock {
            kind,
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn test_render_simple_change() {
        let rendered = DiffFormatter::render(&create_test_diff(), 3);
        assert_eq!(rendered, "  line1\n- line2\n+ modified\n  line3");
    }

    #[test]
    fn test_render_no_changes() {
        let diff = MyersAlgorithm::default().diff("a\nb\n", "a\nb\n");
        assert_eq!(DiffFormatter::render(&diff, 3), "");
    }

    #[test]
    fn test_print_blocks_drop_bare_terminators() {
        let segments = vec![
            Segment::new(ChangeKind::Added, 1, "y"),
            Segment::new(ChangeKind::Removed, 1, "x"),
            Segment::new(ChangeKind::Unchanged, 1, "\n"),
            Segment::new(ChangeKind::Added, 1, "z"),
            Segment::new(ChangeKind::Unchanged, 3, "\nend\n"),
        ];
        let blocks = print_blocks(&segments);
        assert_eq!(
            blocks,
            vec![
                block(ChangeKind::Added, &["y"]),
                block(ChangeKind::Removed, &["x"]),
                block(ChangeKind::Added, &["z"]),
                block(ChangeKind::Unchanged, &["end"]),
            ]
        );
    }

    #[test]
    fn test_print_blocks_keep_leading_blank_line() {
        let segments = vec![
            Segment::new(ChangeKind::Unchanged, 1, "a\n"),
            Segment::new(ChangeKind::Added, 2, "\nb\n"),
        ];
        let blocks = print_blocks(&segments);
        assert_eq!(blocks[1], block(ChangeKind::Added, &["", "b"]));
    }

    #[test]
    fn test_reorder_lone_line_before_block() {
        let mut blocks = vec![
            block(ChangeKind::Removed, &["a"]),
            block(ChangeKind::Added, &["b"]),
            block(ChangeKind::Removed, &["c", "d"]),
        ];
        reorder_split_changes(&mut blocks);
        assert_eq!(blocks[0].kind, ChangeKind::Added);
        assert_eq!(blocks[1], block(ChangeKind::Removed, &["a"]));
        assert_eq!(blocks[2].kind, ChangeKind::Removed);
    }

    #[test]
    fn test_reorder_lone_line_after_block() {
        let mut blocks = vec![
            block(ChangeKind::Added, &["a", "b"]),
            block(ChangeKind::Removed, &["c"]),
            block(ChangeKind::Added, &["d"]),
        ];
        reorder_split_changes(&mut blocks);
        assert_eq!(blocks[1], block(ChangeKind::Added, &["d"]));
        assert_eq!(blocks[2], block(ChangeKind::Removed, &["c"]));
    }

    #[test]
    fn test_reorder_leaves_other_shapes_alone() {
        let original = vec![
            block(ChangeKind::Added, &["a"]),
            block(ChangeKind::Removed, &["b"]),
            block(ChangeKind::Removed, &["c", "d"]),
        ];
        let mut blocks = original.clone();
        reorder_split_changes(&mut blocks);
        assert_eq!(blocks, original);
    }

    #[test]
    fn test_context_collapses_long_gaps() {
        let old = "a\nb\nc\nd\ne\nf\ng\nh\n";
        let new = "A\nb\nc\nd\ne\nf\ng\nH\n";
        let diff = MyersAlgorithm::default().diff(old, new);
        let rendered = DiffFormatter::render(&diff, 1);
        assert_eq!(rendered, "- a\n+ A\n  b\n...\n  g\n- h\n+ H");
    }

    #[test]
    fn test_leading_blank_context_is_trimmed() {
        let diff = MyersAlgorithm::default().diff("\n\nkeep\nold\n", "\n\nkeep\nnew\n");
        let rendered = DiffFormatter::render(&diff, 3);
        assert_eq!(rendered, "  keep\n- old\n+ new");
    }

    #[test]
    fn test_colorize() {
        let colored = DiffFormatter::colorize("  same\n+ new\n- old\n+");
        assert_eq!(
            colored,
            "  same\n\x1b[32m+ new\x1b[0m\n\x1b[31m- old\x1b[0m\n\x1b[32m+\x1b[0m"
        );
    }

    #[test]
    fn test_format_stats() {
        let stats = DiffFormatter::format_stats(&create_test_diff());
        assert_eq!(stats, "1 insertion, 1 deletion");

        let same = MyersAlgorithm::default().diff("a\n", "a\n");
        assert_eq!(DiffFormatter::format_stats(&same), "No changes");
    }

    #[test]
    fn test_format_json() {
        let json = DiffFormatter::format(&create_test_diff(), DiffFormat::Json, 3, false)
            .expect("json output");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["changes"], 2);
        assert_eq!(value["segments"][1]["kind"], "removed");
        assert_eq!(value["segments"][1]["value"], "line2");
        assert_eq!(value["segments"][2]["kind"], "added");
        assert_eq!(value["segments"][2]["value"], "modified");
    }

    #[test]
    fn test_render_with_header() {
        let rendered =
            DiffFormatter::render_with_header(&create_test_diff(), "deployed", "desired", 0);
        assert!(rendered.starts_with("--- deployed\n+++ desired\n"));
        assert!(rendered.contains("+ modified"));
    }
}
