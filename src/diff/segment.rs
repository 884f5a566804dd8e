use serde::{Deserialize, Serialize};

/// Classification of a run of tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Unchanged,
    Added,
    Removed,
}

impl ChangeKind {
    pub fn is_change(&self) -> bool {
        !matches!(self, ChangeKind::Unchanged)
    }

    /// The prefix used when rendering a line of this kind
    pub fn sign(&self) -> &'static str {
        match self {
            ChangeKind::Unchanged => "  ",
            ChangeKind::Added => "+ ",
            ChangeKind::Removed => "- ",
        }
    }
}

/// A run of tokens that share one classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub kind: ChangeKind,
    /// Number of tokens in the run, always at least one
    pub count: usize,
    /// Concatenated text of the run's tokens
    pub value: String,
}

impl Segment {
    pub fn new(kind: ChangeKind, count: usize, value: impl Into<String>) -> Self {
        Self {
            kind,
            count,
            value: value.into(),
        }
    }

    pub fn added(&self) -> bool {
        self.kind == ChangeKind::Added
    }

    pub fn removed(&self) -> bool {
        self.kind == ChangeKind::Removed
    }

    pub fn is_change(&self) -> bool {
        self.kind.is_change()
    }

    /// Lines of the value without their terminators.
    ///
    /// A trailing terminator does not produce an empty last line.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        let body = self.value.strip_suffix('\n').unwrap_or(&self.value);
        body.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line))
    }

    pub fn line_count(&self) -> usize {
        if self.value.is_empty() {
            0
        } else {
            self.lines().count()
        }
    }
}

/// Statistics about a diff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub segments_added: usize,
    pub segments_removed: usize,
    pub lines_added: usize,
    pub lines_removed: usize,
}

impl DiffStats {
    pub fn from_segments(segments: &[Segment]) -> Self {
        let mut stats = Self::default();
        let mut starts_line = true;
        for segment in segments {
            let lines = visible_lines(&segment.value, starts_line);
            if !segment.value.is_empty() {
                starts_line = segment.value.ends_with('\n');
            }

            match segment.kind {
                ChangeKind::Added => {
                    stats.segments_added += 1;
                    stats.lines_added += lines;
                }
                ChangeKind::Removed => {
                    stats.segments_removed += 1;
                    stats.lines_removed += lines;
                }
                ChangeKind::Unchanged => {}
            }
        }
        stats
    }

    pub fn total_changes(&self) -> usize {
        self.lines_added + self.lines_removed
    }

    pub fn net_change(&self) -> isize {
        self.lines_added as isize - self.lines_removed as isize
    }
}

/// Lines a segment shows in the printed preview. A segment that starts in
/// the middle of a line opens with the terminator of that line, which is not
/// a line of its own.
fn visible_lines(value: &str, starts_line: bool) -> usize {
    let value = if starts_line {
        value
    } else {
        value
            .strip_prefix("\r\n")
            .or_else(|| value.strip_prefix('\n'))
            .unwrap_or(value)
    };
    if value.is_empty() || value == "\n" || value == "\r\n" {
        return 0;
    }

    let body = value.strip_suffix('\n').unwrap_or(value);
    body.split('\n').count()
}

/// The outcome of one diff computation.
///
/// Segments are stored in edit order and never mutated after construction;
/// rendering works on a filtered copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    segments: Vec<Segment>,
    minimal: bool,
}

impl Default for Diff {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Diff {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            minimal: true,
        }
    }

    pub(crate) fn non_minimal(mut self) -> Self {
        self.minimal = false;
        self
    }

    /// False when the search gave up and the diff is a full replacement
    pub fn is_minimal(&self) -> bool {
        self.minimal
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    /// Number of added or removed segments
    pub fn changes(&self) -> usize {
        self.segments.iter().filter(|s| s.is_change()).count()
    }

    pub fn has_changes(&self) -> bool {
        self.segments.iter().any(Segment::is_change)
    }

    pub fn stats(&self) -> DiffStats {
        DiffStats::from_segments(&self.segments)
    }

    /// Rebuild the old text from unchanged and removed segments
    pub fn old_text(&self) -> String {
        self.segments
            .iter()
            .filter(|s| !s.added())
            .map(|s| s.value.as_str())
            .collect()
    }

    /// Rebuild the new text from unchanged and added segments
    pub fn new_text(&self) -> String {
        self.segments
            .iter()
            .filter(|s| !s.removed())
            .map(|s| s.value.as_str())
            .collect()
    }

    /// Render with the given number of context lines
    pub fn render(&self, context_lines: usize) -> String {
        super::formatter::DiffFormatter::render(self, context_lines)
    }
}
