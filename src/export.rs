//! Export functionality for saving diff previews
//!
//! This module writes rendered diffs and deploy plans to files or any other
//! `io::Write` destination.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::diff::{Diff, DiffFormat, DiffFormatter, DEFAULT_CONTEXT_LINES};
use crate::error::Result;
use crate::plan::Plan;

/// Export configuration
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub format: DiffFormat,
    pub include_stats: bool,
    pub include_metadata: bool,
    pub context_lines: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: DiffFormat::Text,
            include_stats: true,
            include_metadata: true,
            context_lines: DEFAULT_CONTEXT_LINES,
        }
    }
}

/// Handles exporting diffs to files and writers
pub struct DiffExporter {
    config: ExportConfig,
}

impl DiffExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn with_format(format: DiffFormat) -> Self {
        Self {
            config: ExportConfig {
                format,
                ..Default::default()
            },
        }
    }

    /// Export a single diff to a file
    pub fn export_diff<P: AsRef<Path>>(
        &self,
        diff: &Diff,
        old_label: &str,
        new_label: &str,
        output_path: P,
    ) -> Result<()> {
        let mut content = Vec::new();
        self.export_diff_to_writer(diff, old_label, new_label, &mut content)?;
        fs::write(output_path.as_ref(), content)?;
        tracing::debug!("Exported diff to {}", output_path.as_ref().display());
        Ok(())
    }

    /// Export to a writer (for streaming or custom outputs)
    pub fn export_diff_to_writer<W: Write>(
        &self,
        diff: &Diff,
        old_label: &str,
        new_label: &str,
        writer: &mut W,
    ) -> Result<()> {
        // JSON reports carry their own stats and must stay parseable
        let plain = self.config.format == DiffFormat::Text;

        if plain && self.config.include_metadata {
            writeln!(writer, "{}", format_metadata(old_label, new_label))?;
            writeln!(writer)?;
        }

        if plain && self.config.include_stats {
            writeln!(writer, "Changes: {}", DiffFormatter::format_stats(diff))?;
            writeln!(writer)?;
        }

        let body = match self.config.format {
            DiffFormat::Text => DiffFormatter::render_with_header(
                diff,
                old_label,
                new_label,
                self.config.context_lines,
            ),
            format => DiffFormatter::format(diff, format, self.config.context_lines, false)?,
        };
        writeln!(writer, "{}", body)?;

        Ok(())
    }

    /// Export a deploy plan: status line followed by its preview
    pub fn export_plan_to_writer<W: Write>(&self, plan: &Plan, writer: &mut W) -> Result<()> {
        if self.config.include_metadata {
            writeln!(
                writer,
                "Generated at: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
            )?;
        }

        writeln!(writer, "{}", plan.describe())?;

        if let (true, Some(diff)) = (self.config.include_stats, plan.diff()) {
            writeln!(writer, "Changes: {}", DiffFormatter::format_stats(diff))?;
        }

        let preview = plan.preview(self.config.context_lines);
        if !preview.is_empty() {
            writeln!(writer)?;
            write!(writer, "{}", preview)?;
            if !preview.ends_with('\n') {
                writeln!(writer)?;
            }
        }

        Ok(())
    }

    /// Export a deploy plan to a file
    pub fn export_plan<P: AsRef<Path>>(&self, plan: &Plan, output_path: P) -> Result<()> {
        let mut content = Vec::new();
        self.export_plan_to_writer(plan, &mut content)?;
        fs::write(output_path.as_ref(), content)?;
        Ok(())
    }
}

/// Predefined export presets
impl DiffExporter {
    /// Plain text preview with metadata and stats
    pub fn text() -> Self {
        Self::with_format(DiffFormat::Text)
    }

    /// Machine-readable JSON report
    pub fn json() -> Self {
        Self::with_format(DiffFormat::Json)
    }
}

fn format_metadata(old_label: &str, new_label: &str) -> String {
    format!(
        "Diff between {} and {}\nGenerated at: {}",
        old_label,
        new_label,
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff_lines;
    use crate::plan::{plan_application, PlanOptions};
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_export_diff() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("preview.diff");

        let diff = diff_lines("old\nline\n", "new\nline\n");
        DiffExporter::text()
            .export_diff(&diff, "before.json", "after.json", &output_path)
            .unwrap();

        let content = fs::read_to_string(output_path).unwrap();
        assert!(content.starts_with("Diff between before.json and after.json\nGenerated at: "));
        assert!(content.contains("Changes: 1 insertion, 1 deletion"));
        assert!(content.contains("--- before.json\n+++ after.json\n- old\n+ new\n  line"));
    }

    #[test]
    fn test_export_without_metadata() {
        let exporter = DiffExporter::new(ExportConfig {
            include_metadata: false,
            include_stats: false,
            ..Default::default()
        });
        let diff = diff_lines("a\n", "b\n");

        let mut out = Vec::new();
        exporter.export_diff_to_writer(&diff, "x", "y", &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "--- x\n+++ y\n- a\n+ b\n");
    }

    #[test]
    fn test_export_json_is_parseable() {
        let diff = diff_lines("a\n", "b\n");

        let mut out = Vec::new();
        DiffExporter::json()
            .export_diff_to_writer(&diff, "x", "y", &mut out)
            .unwrap();

        let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(report["stats"]["lines_added"], 1);
        assert_eq!(report["stats"]["lines_removed"], 1);
    }

    #[test]
    fn test_export_plan() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("plan.txt");

        let plan = plan_application(None, &json!({ "name": "web" }), &PlanOptions::default())
            .unwrap();
        DiffExporter::text().export_plan(&plan, &output_path).unwrap();

        let content = fs::read_to_string(output_path).unwrap();
        assert!(content.contains("NEW web\n\n{\n  \"containers\": ["));
        assert!(content.ends_with("}\n"));
    }
}
