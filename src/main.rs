use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;

use confdiff::{
    cli::Cli,
    snapshot::snapshot_from_str,
    ConfdiffConfig, DiffExporter, DiffFormat, DiffFormatter, ExportConfig, Plan, PlanOptions,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(err) = cli.validate() {
        eprintln!("Error: {}", err);
        std::process::exit(2);
    }

    cli.setup_logging();

    let mut config = ConfdiffConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    cli.apply_to(&mut config);
    tracing::debug!("Effective configuration: {:?}", config);

    let changed = if cli.plan {
        run_plan_mode(&cli, &config)?
    } else {
        run_diff_mode(&cli, &config)?
    };

    if cli.exit_code && changed {
        std::process::exit(1);
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn run_diff_mode(cli: &Cli, config: &ConfdiffConfig) -> Result<bool> {
    let mut before = read_input(&cli.before)?;
    let mut after = read_input(&cli.after)?;

    if cli.json {
        before = snapshot_from_str(&before, &config.snapshot)
            .with_context(|| format!("Invalid JSON in {}", cli.before.display()))?;
        after = snapshot_from_str(&after, &config.snapshot)
            .with_context(|| format!("Invalid JSON in {}", cli.after.display()))?;
    }

    let generator = config.diff.generator();
    let diff = generator.generate(&before, &after);
    tracing::debug!(
        "{} produced {} segments ({} changed)",
        generator.algorithm_name(),
        diff.segments().len(),
        diff.changes()
    );

    let color = config.output.color && cli.format == DiffFormat::Text;
    let output = DiffFormatter::format(&diff, cli.format, config.diff.context_lines, color)?;
    if !output.is_empty() {
        println!("{}", output);
    }
    if cli.format == DiffFormat::Text && config.output.show_stats {
        eprintln!("{}", DiffFormatter::format_stats(&diff));
    }

    if let Some(path) = &cli.output {
        let exporter = DiffExporter::new(ExportConfig {
            format: cli.format,
            include_stats: config.output.show_stats,
            context_lines: config.diff.context_lines,
            ..Default::default()
        });
        let old_label = cli.before.display().to_string();
        let new_label = cli.after.display().to_string();
        exporter
            .export_diff(&diff, &old_label, &new_label, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(diff.has_changes())
}

fn parse_json(path: &Path, text: &str) -> Result<Value> {
    serde_json::from_str(text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn run_plan_mode(cli: &Cli, config: &ConfdiffConfig) -> Result<bool> {
    let before = read_input(&cli.before)?;
    let previous = if before.trim().is_empty() {
        None
    } else {
        Some(parse_json(&cli.before, &before)?)
    };
    let desired = parse_json(&cli.after, &read_input(&cli.after)?)?;

    let plan = confdiff::plan_application(previous.as_ref(), &desired, &PlanOptions::from(config))?;

    println!("{}", plan.describe());
    let preview = plan.preview(config.diff.context_lines);
    if !preview.is_empty() {
        let preview = match &plan {
            Plan::Modify { .. } if config.output.color => DiffFormatter::colorize(&preview),
            _ => preview,
        };
        println!("{}", preview.trim_end_matches('\n'));
    }
    if !plan.should_apply() && plan.diff().is_some() {
        println!("rollout_kind is none, skipping {}", plan.name());
    }

    if let Some(path) = &cli.output {
        let exporter = DiffExporter::new(ExportConfig {
            include_stats: config.output.show_stats,
            context_lines: config.diff.context_lines,
            ..Default::default()
        });
        exporter
            .export_plan(&plan, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(plan.has_changes())
}
