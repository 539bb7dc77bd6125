//! Report generation for coupling analysis
//!
//! Text report (each metric sorted highest-first with its average,
//! stable-dependencies warnings, cycles, PlantUML diagram) and a JSON dump of
//! the whole result.

use std::collections::BTreeMap;
use std::io::{self, Write};

use serde::Serialize;

use crate::diagram::{DiagramOptions, render_plantuml, write_plantuml};
use crate::metrics::CouplingMetrics;
use crate::stability::{StableDependencyViolation, stable_dependency_violations};

const RULE: &str = "------------------";

/// How values of a metric are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueFormat {
    Count,
    Ratio,
}

/// Sort `(module, value)` pairs by value descending, ties by module name
fn ranked<'a>(entries: impl Iterator<Item = (&'a str, f64)>) -> Vec<(&'a str, f64)> {
    let mut pairs: Vec<(&str, f64)> = entries.collect();
    pairs.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    pairs
}

fn average(pairs: &[(&str, f64)]) -> Option<f64> {
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.iter().map(|(_, v)| v).sum::<f64>() / pairs.len() as f64)
    }
}

fn ranked_counts(map: &BTreeMap<String, usize>) -> Vec<(&str, f64)> {
    ranked(map.iter().map(|(k, v)| (k.as_str(), *v as f64)))
}

fn ranked_ratios(map: &BTreeMap<String, f64>) -> Vec<(&str, f64)> {
    ranked(map.iter().map(|(k, v)| (k.as_str(), *v)))
}

type Section<'a> = (&'static str, ValueFormat, Vec<(&'a str, f64)>);

/// The five metrics in report order, ranked
fn metric_sections(metrics: &CouplingMetrics) -> Vec<Section<'_>> {
    vec![
        (
            "Afferent coupling",
            ValueFormat::Count,
            ranked_counts(&metrics.afferent_count),
        ),
        (
            "Efferent coupling",
            ValueFormat::Count,
            ranked_counts(&metrics.efferent_count),
        ),
        (
            "Instability",
            ValueFormat::Ratio,
            ranked_ratios(&metrics.instability),
        ),
        (
            "Abstractness",
            ValueFormat::Ratio,
            ranked_ratios(&metrics.abstractness),
        ),
        (
            "Distance to main sequence",
            ValueFormat::Ratio,
            ranked_ratios(&metrics.distance_to_main_seq),
        ),
    ]
}

fn write_section_header<W: Write>(writer: &mut W, title: &str) -> io::Result<()> {
    writeln!(writer, "{}", RULE)?;
    writeln!(writer, "{}:", title)?;
    writeln!(writer, "{}", RULE)
}

fn write_metric_section<W: Write>(
    writer: &mut W,
    title: &str,
    format: ValueFormat,
    pairs: &[(&str, f64)],
) -> io::Result<()> {
    write_section_header(writer, title)?;
    for (module, value) in pairs {
        match format {
            ValueFormat::Count => writeln!(writer, "{} -> {}", module, *value as usize)?,
            ValueFormat::Ratio => writeln!(writer, "{} -> {:.2}", module, value)?,
        }
    }
    if let Some(avg) = average(pairs) {
        writeln!(writer, " -> average: {:.2}", avg)?;
    }
    Ok(())
}

/// Options for the text report
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub diagram: DiagramOptions,
    /// Leave the PlantUML block out
    pub skip_diagram: bool,
}

/// Generate the full text report to the given writer
pub fn generate_report<W: Write>(
    metrics: &CouplingMetrics,
    options: &ReportOptions,
    writer: &mut W,
) -> io::Result<()> {
    write_header(metrics, writer)?;

    for (title, format, pairs) in metric_sections(metrics) {
        write_metric_section(writer, title, format, &pairs)?;
    }

    write_violations_section(&stable_dependency_violations(metrics), writer)?;
    write_circular_dependencies_section(metrics, writer)?;
    write_skipped_section(metrics, writer)?;

    if !options.skip_diagram {
        write_section_header(writer, "PlantUML diagram")?;
        write_plantuml(
            &metrics.package_name,
            &metrics.diagram_edges,
            &options.diagram,
            writer,
        )?;
    }

    Ok(())
}

/// Generate a short summary: totals and per-metric averages
pub fn generate_summary<W: Write>(metrics: &CouplingMetrics, writer: &mut W) -> io::Result<()> {
    write_header(metrics, writer)?;

    for (title, _, pairs) in metric_sections(metrics) {
        match average(&pairs) {
            Some(avg) => writeln!(writer, "  {:<26} {:.2}", format!("{}:", title), avg)?,
            None => writeln!(writer, "  {:<26} -", format!("{}:", title))?,
        }
    }

    let violations = stable_dependency_violations(metrics);
    let cycles = metrics.detect_circular_dependencies();
    writeln!(writer)?;
    writeln!(
        writer,
        "Stable dependencies warnings: {} | Circular dependencies: {}",
        violations.len(),
        cycles.len()
    )?;
    Ok(())
}

fn write_header<W: Write>(metrics: &CouplingMetrics, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "Coupling Analysis: {}", metrics.package_name)?;
    writeln!(writer, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
    writeln!(
        writer,
        "Files: {} | Modules: {} | Dependencies: {} | Level: {}",
        metrics.total_files,
        metrics.module_count(),
        metrics.dependency_count(),
        if metrics.level < 1 {
            "none".to_string()
        } else {
            metrics.level.to_string()
        }
    )?;
    writeln!(writer)
}

fn write_violations_section<W: Write>(
    violations: &[StableDependencyViolation],
    writer: &mut W,
) -> io::Result<()> {
    if violations.is_empty() {
        return Ok(());
    }
    write_section_header(writer, "Stable dependencies principle")?;
    for violation in violations {
        writeln!(writer, "WARNING: {}", violation)?;
    }
    Ok(())
}

fn write_circular_dependencies_section<W: Write>(
    metrics: &CouplingMetrics,
    writer: &mut W,
) -> io::Result<()> {
    let cycles = metrics.detect_circular_dependencies();
    if cycles.is_empty() {
        return Ok(());
    }
    write_section_header(writer, "Circular dependencies")?;
    for cycle in &cycles {
        let mut chain = cycle.clone();
        if let Some(first) = cycle.first() {
            chain.push(first.clone());
        }
        writeln!(writer, "{}", chain.join(" -> "))?;
    }
    Ok(())
}

fn write_skipped_section<W: Write>(metrics: &CouplingMetrics, writer: &mut W) -> io::Result<()> {
    if metrics.skipped_files.is_empty() {
        return Ok(());
    }
    write_section_header(writer, "Skipped files")?;
    for skipped in &metrics.skipped_files {
        writeln!(writer, "{}: {}", skipped.path.display(), skipped.reason)?;
    }
    Ok(())
}

/// Everything in one JSON document
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    metrics: &'a CouplingMetrics,
    stable_dependency_violations: Vec<StableDependencyViolation>,
    circular_dependencies: Vec<Vec<String>>,
    plantuml: Vec<String>,
}

/// Generate a JSON report
pub fn generate_json_output<W: Write>(
    metrics: &CouplingMetrics,
    diagram: &DiagramOptions,
    writer: &mut W,
) -> io::Result<()> {
    let report = JsonReport {
        metrics,
        stable_dependency_violations: stable_dependency_violations(metrics),
        circular_dependencies: metrics.detect_circular_dependencies(),
        plantuml: render_plantuml(&metrics.package_name, &metrics.diagram_edges, diagram),
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)
}
