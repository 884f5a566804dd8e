use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::segment::{ChangeKind, Diff, Segment};
use super::tokenize::tokenize;

/// Trait defining a diff algorithm interface
pub trait DiffAlgorithm: Send + Sync {
    /// Generate a diff between old and new content
    fn diff(&self, old: &str, new: &str) -> Diff;

    /// Get the algorithm name
    fn name(&self) -> &'static str;

    /// Get algorithm description
    fn description(&self) -> &'static str;
}

/// Options shared by the line diff algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOptions {
    /// Keep line terminators as tokens of their own
    pub newline_is_token: bool,
    /// Give up on a minimal diff after this many edits
    pub max_edit_length: Option<usize>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            newline_is_token: true,
            max_edit_length: None,
        }
    }
}

/// Myers' O(ND) shortest edit script over line tokens
#[derive(Debug, Clone, Default)]
pub struct MyersAlgorithm {
    options: DiffOptions,
}

impl MyersAlgorithm {
    pub fn new(options: DiffOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// Diff two token sequences.
    ///
    /// Returns `None` when `max_edit_length` is set and no alignment exists
    /// within it.
    pub fn diff_tokens(&self, old: &[&str], new: &[&str]) -> Option<Vec<Segment>> {
        shortest_edit_script(old, new, self.options.max_edit_length)
    }
}

impl DiffAlgorithm for MyersAlgorithm {
    fn diff(&self, old: &str, new: &str) -> Diff {
        let old_tokens = tokenize(old, self.options.newline_is_token);
        let new_tokens = tokenize(new, self.options.newline_is_token);

        match self.diff_tokens(&old_tokens, &new_tokens) {
            Some(segments) => Diff::new(segments),
            None => {
                warn!(
                    max_edit_length = ?self.options.max_edit_length,
                    "edit length limit reached, falling back to full replacement"
                );
                Diff::replacement(old_tokens.len(), old, new_tokens.len(), new)
            }
        }
    }

    fn name(&self) -> &'static str {
        "Myers"
    }

    fn description(&self) -> &'static str {
        "Myers' O(ND) diff algorithm - minimal line-based edit scripts"
    }
}

impl Diff {
    /// A non-minimal diff that removes everything old and adds everything new
    pub(crate) fn replacement(old_count: usize, old: &str, new_count: usize, new: &str) -> Self {
        let mut segments = Vec::new();
        if old_count > 0 {
            segments.push(Segment::new(ChangeKind::Removed, old_count, old));
        }
        if new_count > 0 {
            segments.push(Segment::new(ChangeKind::Added, new_count, new));
        }
        Diff::new(segments).non_minimal()
    }
}

/// A node of the segment chain built while searching the edit graph
#[derive(Debug, Clone, Copy)]
struct Component {
    kind: ChangeKind,
    count: usize,
    previous: Option<usize>,
}

/// Furthest point reached on one diagonal
#[derive(Debug, Clone, Copy)]
struct PathHead {
    old_pos: isize,
    last: Option<usize>,
}

/// Token sequences plus the arena holding every component created during
/// the search. Paths refer to components by index, so many paths can share
/// one history.
struct EditGraph<'a> {
    old: &'a [&'a str],
    new: &'a [&'a str],
    components: Vec<Component>,
}

impl<'a> EditGraph<'a> {
    fn new(old: &'a [&'a str], new: &'a [&'a str]) -> Self {
        Self {
            old,
            new,
            components: Vec::new(),
        }
    }

    fn old_len(&self) -> isize {
        self.old.len() as isize
    }

    fn new_len(&self) -> isize {
        self.new.len() as isize
    }

    fn push(&mut self, component: Component) -> usize {
        self.components.push(component);
        self.components.len() - 1
    }

    /// Extend `path` by one added or removed token
    fn add_to_path(&mut self, path: PathHead, kind: ChangeKind, old_pos_inc: isize) -> PathHead {
        let last = path.last.map(|index| self.components[index]);
        let component = match last {
            Some(last) if last.kind == kind => Component {
                kind,
                count: last.count + 1,
                previous: last.previous,
            },
            _ => Component {
                kind,
                count: 1,
                previous: path.last,
            },
        };

        PathHead {
            old_pos: path.old_pos + old_pos_inc,
            last: Some(self.push(component)),
        }
    }

    /// Follow the diagonal through common tokens. Returns the new position.
    fn extract_common(&mut self, path: &mut PathHead, diagonal: isize) -> isize {
        let mut old_pos = path.old_pos;
        let mut new_pos = old_pos - diagonal;
        let mut common = 0;

        while new_pos + 1 < self.new_len()
            && old_pos + 1 < self.old_len()
            && self.new[(new_pos + 1) as usize] == self.old[(old_pos + 1) as usize]
        {
            new_pos += 1;
            old_pos += 1;
            common += 1;
        }

        if common > 0 {
            let index = self.push(Component {
                kind: ChangeKind::Unchanged,
                count: common,
                previous: path.last,
            });
            path.last = Some(index);
        }

        path.old_pos = old_pos;
        new_pos
    }

    /// Turn the chain ending at `last` into ordered segments with values.
    ///
    /// Consumes the arena; every visited back-link is cleared as the chain
    /// is unwound.
    fn linearize(self, last: Option<usize>) -> Vec<Segment> {
        let EditGraph {
            old,
            new,
            mut components,
        } = self;

        let mut chain = Vec::new();
        let mut cursor = last;
        while let Some(index) = cursor {
            let component = &mut components[index];
            cursor = component.previous.take();
            chain.push((component.kind, component.count));
        }
        drop(components);
        chain.reverse();

        let mut old_pos = 0;
        let mut new_pos = 0;
        chain
            .into_iter()
            .map(|(kind, count)| {
                let value = match kind {
                    ChangeKind::Removed => {
                        let value = old[old_pos..old_pos + count].concat();
                        old_pos += count;
                        value
                    }
                    ChangeKind::Added | ChangeKind::Unchanged => {
                        let value = new[new_pos..new_pos + count].concat();
                        new_pos += count;
                        if kind == ChangeKind::Unchanged {
                            old_pos += count;
                        }
                        value
                    }
                };
                Segment::new(kind, count, value)
            })
            .collect()
    }
}

/// Compute a minimal edit script between two token sequences.
///
/// Paths are indexed by diagonal `old_pos - new_pos`. Positions start at -1,
/// meaning nothing consumed yet.
fn shortest_edit_script(
    old: &[&str],
    new: &[&str],
    max_edit_length: Option<usize>,
) -> Option<Vec<Segment>> {
    if old.is_empty() && new.is_empty() {
        return Some(Vec::new());
    }

    let mut graph = EditGraph::new(old, new);
    let old_len = graph.old_len();
    let new_len = graph.new_len();

    let upper_bound = old.len() + new.len();
    let max_edits = max_edit_length.map_or(upper_bound, |cap| cap.min(upper_bound));
    let offset = max_edits as isize + 1;
    let slot = |diagonal: isize| (diagonal + offset) as usize;
    let mut best_path: Vec<Option<PathHead>> = vec![None; 2 * max_edits + 3];

    let mut seed = PathHead {
        old_pos: -1,
        last: None,
    };
    let new_pos = graph.extract_common(&mut seed, 0);
    if seed.old_pos + 1 >= old_len && new_pos + 1 >= new_len {
        debug!(tokens = new.len(), "inputs are identical");
        return Some(vec![Segment::new(
            ChangeKind::Unchanged,
            new.len(),
            new.concat(),
        )]);
    }
    best_path[slot(0)] = Some(seed);

    let mut min_diagonal = isize::MIN;
    let mut max_diagonal = isize::MAX;

    for edit_length in 1..=max_edits as isize {
        let mut diagonal = min_diagonal.max(-edit_length);
        let last_diagonal = max_diagonal.min(edit_length);

        while diagonal <= last_diagonal {
            // Nothing else reads the remove source after this diagonal.
            let remove_path = best_path[slot(diagonal - 1)].take();
            let add_path = best_path[slot(diagonal + 1)];

            let can_add = add_path.map_or(false, |path| {
                let new_pos = path.old_pos - diagonal;
                0 <= new_pos && new_pos < new_len
            });
            let can_remove = remove_path.map_or(false, |path| path.old_pos + 1 < old_len);

            if !can_add && !can_remove {
                best_path[slot(diagonal)] = None;
                diagonal += 2;
                continue;
            }

            // Extend the add path unless removing would move strictly further
            // into the old sequence. Removals come first in a replacement.
            let use_add = match (add_path, remove_path) {
                (Some(add), Some(remove)) if can_add && can_remove => {
                    remove.old_pos + 1 <= add.old_pos
                }
                _ => !can_remove,
            };

            let mut base = if use_add {
                let Some(add) = add_path else {
                    unreachable!("add branch chosen without an add path on diagonal {diagonal}")
                };
                graph.add_to_path(add, ChangeKind::Added, 0)
            } else {
                let Some(remove) = remove_path else {
                    unreachable!(
                        "remove branch chosen without a remove path on diagonal {diagonal}"
                    )
                };
                graph.add_to_path(remove, ChangeKind::Removed, 1)
            };

            let new_pos = graph.extract_common(&mut base, diagonal);

            if base.old_pos + 1 >= old_len && new_pos + 1 >= new_len {
                debug!(
                    edit_length,
                    components = graph.components.len(),
                    "shortest edit script found"
                );
                return Some(graph.linearize(base.last));
            }

            best_path[slot(diagonal)] = Some(base);
            if base.old_pos + 1 >= old_len {
                max_diagonal = max_diagonal.min(diagonal - 1);
                trace!(diagonal, "old sequence exhausted, pruning higher diagonals");
            }
            if new_pos + 1 >= new_len {
                min_diagonal = min_diagonal.max(diagonal + 1);
                trace!(diagonal, "new sequence exhausted, pruning lower diagonals");
            }

            diagonal += 2;
        }
    }

    if max_edits < upper_bound {
        return None;
    }
    unreachable!(
        "no edit script within {} edits for {} old and {} new tokens",
        upper_bound,
        old.len(),
        new.len()
    )
}
