use super::algorithms::{DiffAlgorithm, DiffOptions, MyersAlgorithm};
use super::formatter::DiffFormatter;
use super::segment::Diff;

/// Default number of unchanged lines shown around a change
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// High-level diff generator pairing an algorithm with rendering settings
pub struct DiffGenerator {
    algorithm: Box<dyn DiffAlgorithm>,
    context_lines: usize,
}

impl DiffGenerator {
    /// Create a new Myers diff generator with the given options
    pub fn new(options: DiffOptions) -> Self {
        Self::with_algorithm(Box::new(MyersAlgorithm::new(options)))
    }

    /// Create a diff generator with a custom algorithm
    pub fn with_algorithm(algorithm: Box<dyn DiffAlgorithm>) -> Self {
        Self {
            algorithm,
            context_lines: DEFAULT_CONTEXT_LINES,
        }
    }

    /// Generate a diff between old and new content
    pub fn generate(&self, old: &str, new: &str) -> Diff {
        self.algorithm.diff(old, new)
    }

    /// Render a diff with this generator's context setting
    pub fn render(&self, diff: &Diff) -> String {
        DiffFormatter::render(diff, self.context_lines)
    }

    pub fn context_lines(&self) -> usize {
        self.context_lines
    }

    /// Get the current algorithm name
    pub fn algorithm_name(&self) -> &str {
        self.algorithm.name()
    }

    /// Get the current algorithm description
    pub fn algorithm_description(&self) -> &str {
        self.algorithm.description()
    }
}

impl Default for DiffGenerator {
    fn default() -> Self {
        Self::new(DiffOptions::default())
    }
}

/// Builder for configuring diff generation
#[derive(Debug, Clone)]
pub struct DiffConfig {
    options: DiffOptions,
    context_lines: usize,
}

impl DiffConfig {
    pub fn new() -> Self {
        Self {
            options: DiffOptions::default(),
            context_lines: DEFAULT_CONTEXT_LINES,
        }
    }

    pub fn newline_is_token(mut self, enabled: bool) -> Self {
        self.options.newline_is_token = enabled;
        self
    }

    pub fn max_edit_length(mut self, limit: Option<usize>) -> Self {
        self.options.max_edit_length = limit;
        self
    }

    pub fn context_lines(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }

    pub fn build(self) -> DiffGenerator {
        DiffGenerator {
            algorithm: Box::new(MyersAlgorithm::new(self.options)),
            context_lines: self.context_lines,
        }
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_generator() {
        let generator = DiffGenerator::default();
        let diff = generator.generate("a\nb\nc", "a\nx\nc");

        assert_eq!(generator.algorithm_name(), "Myers");
        assert_eq!(diff.stats().lines_added, 1);
        assert_eq!(diff.stats().lines_removed, 1);
    }

    #[test]
    fn test_diff_config_builder() {
        let generator = DiffConfig::new()
            .newline_is_token(false)
            .context_lines(5)
            .build();

        assert_eq!(generator.context_lines(), 5);

        let diff = generator.generate("a\nb\n", "a\nc\n");
        assert_eq!(diff.segments().len(), 3);
        assert_eq!(diff.segments()[1].value, "b\n");
        assert_eq!(diff.segments()[2].value, "c\n");
    }

    #[test]
    fn test_generator_render_uses_context() {
        let generator = DiffConfig::new().context_lines(0).build();
        let diff = generator.generate("a\nb\nc\n", "a\nB\nc\n");
        assert_eq!(generator.render(&diff), "...\n- b\n+ B\n...");
    }
}
