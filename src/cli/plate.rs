use anyhow::{Context, Result};
use std::path::PathBuf;

use lcms_qc::plate::{PlateGrid, WellCoordinate, WellState};
use lcms_qc::report::ReportDocument;

/// Print detection, purity and retention-time maps of a batch report
pub fn run(report: PathBuf) -> Result<()> {
    if !report.exists() {
        anyhow::bail!("Report does not exist: {}", report.display());
    }

    let document = ReportDocument::open(&report)
        .with_context(|| format!("Failed to read report: {}", report.display()))?;
    let grid = document.plate_grid().context("Report wells do not fit its plate")?;
    let summary = grid.summary();

    println!("Plate Report");
    println!("============");
    println!("Report:    {}", report.display());
    println!("Generated: {}", document.generated_at.to_rfc3339());
    println!("Format:    {}", grid.format());
    println!(
        "Wells:     {} analyzed, {} detected, {} failed, {} empty",
        summary.analyzed, summary.detected, summary.failed, summary.empty
    );
    println!();

    println!("Detection (+ detected, - not detected, x failed, . empty):");
    print_map(&grid, 2, |state| {
        let symbol = match state {
            WellState::Empty => ".",
            WellState::Failed { .. } => "x",
            WellState::Analyzed(s) if s.detected => "+",
            WellState::Analyzed(_) => "-",
        };
        symbol.to_string()
    });
    println!();

    println!("Purity (%):");
    print_map(&grid, 4, |state| {
        state
            .summary()
            .and_then(|s| s.purity)
            .map(|p| format!("{:.0}", p * 100.0))
            .unwrap_or_else(|| ".".to_string())
    });
    println!();

    println!("Retention time (min):");
    print_map(&grid, 5, |state| {
        state
            .summary()
            .and_then(|s| s.retention_time)
            .map(|rt| format!("{:.2}", rt))
            .unwrap_or_else(|| ".".to_string())
    });

    println!();
    println!("Wells:");
    for (well, state) in grid.iter() {
        if let WellState::Analyzed(s) = state {
            let peaks: Vec<String> = s
                .peaks
                .iter()
                .map(|p| match p.mass {
                    Some(mass) => format!("{:.2}@{:.4}", p.retention_time, mass),
                    None => format!("{:.2}", p.retention_time),
                })
                .collect();
            println!(
                "  {:<4} {:<10} {:<14} [M+H]+ {:>10.4}  peaks {}",
                well.to_string(),
                s.sample_id,
                s.formula,
                s.mh_mass,
                peaks.join(" ")
            );
        }
    }

    let failures: Vec<_> = grid
        .iter()
        .filter_map(|(well, state)| match state {
            WellState::Failed { sample_id, reason } => Some((well, sample_id, reason)),
            _ => None,
        })
        .collect();
    if !failures.is_empty() {
        println!();
        println!("Failures:");
        for (well, sample_id, reason) in failures {
            println!("  {:<4} {}: {}", well.to_string(), sample_id, reason);
        }
    }

    Ok(())
}

fn print_map(grid: &PlateGrid, width: usize, cell: impl Fn(&WellState) -> String) {
    let format = grid.format();
    let mut header = String::from("   ");
    for column in 1..=format.columns() {
        header.push_str(&format!(" {:>width$}", column, width = width));
    }
    println!("{}", header);

    for row in 0..format.rows() {
        let mut line = String::new();
        for column in 0..format.columns() {
            let well = WellCoordinate::new(row as u8, column as u8);
            let text = grid.get(well).map(&cell).unwrap_or_default();
            line.push_str(&format!(" {:>width$}", text, width = width));
        }
        println!("{:>3}{}", WellCoordinate::new(row as u8, 0).row_label(), line);
    }
}
