use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use lcms_qc::analysis::{analyze_run, load_blank, load_run, sample_work_dir, Sample, SampleAnalysis};
use lcms_qc::config::AnalysisConfig;
use lcms_qc::converter::MsConvert;
use lcms_qc::matching::DetectionResult;

/// Analyze a single run against its expected structure
pub fn run(
    run: PathBuf,
    structure: String,
    id: Option<String>,
    output: Option<PathBuf>,
    config: &AnalysisConfig,
) -> Result<()> {
    if !run.exists() {
        anyhow::bail!("Run does not exist: {}", run.display());
    }

    let id = id.unwrap_or_else(|| {
        run.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sample".to_string())
    });
    let sample = Sample::new(id, structure, &run)?;

    let converter = MsConvert::from_config(&config.converter);
    let scratch = tempfile::tempdir().context("Failed to create work directory")?;
    let work_dir = config
        .batch
        .work_dir
        .clone()
        .unwrap_or_else(|| scratch.path().to_path_buf());

    let blank = match &config.batch.blank {
        Some(path) => Some(
            load_blank(path, &converter, &work_dir, config).context("Failed to load blank")?,
        ),
        None => None,
    };

    info!("Analyzing {}", run.display());
    let sample_dir = sample_work_dir(&work_dir, 0, sample.id());
    let loaded = load_run(&sample, &converter, &sample_dir, config)?;
    let analysis = analyze_run(&sample, &loaded, blank.as_ref(), config)?;

    print_analysis(&analysis);

    if let Some(output) = output {
        let file = File::create(&output)
            .with_context(|| format!("Failed to create output file: {}", output.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &analysis)
            .context("Failed to write analysis JSON")?;
        info!("Wrote {}", output.display());
    }

    Ok(())
}

fn print_analysis(analysis: &SampleAnalysis) {
    let masses = &analysis.masses;

    println!("Sample {}", analysis.sample_id);
    println!("=======");
    println!("Formula:      {}", masses.formula);
    println!("Monoisotopic: {:.4}", masses.monoisotopic);
    println!();

    println!("Adduct Traces:");
    for trace in &analysis.adduct_traces {
        println!(
            "  {:<9} m/z {:>10.4}  max {:>12.0} at {:>6.2} min",
            trace.adduct.label(),
            trace.mz,
            trace.max_intensity,
            trace.apex_rt
        );
    }
    println!();

    println!("Peaks:");
    if analysis.peaks.is_empty() {
        println!("  (none)");
    }
    for (rank, peak) in analysis.peaks.iter().enumerate() {
        let ion = peak
            .apex_ion
            .map(|ion| format!("{:.4}", ion.mz))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {}. RT {:>6.2} [{:.2}-{:.2}]  height {:>12.0}  area {:>12.1}  apex m/z {}",
            rank + 1,
            peak.apex_rt,
            peak.left_rt,
            peak.right_rt,
            peak.apex_intensity,
            peak.area,
            ion
        );
    }
    println!();

    match &analysis.detection {
        DetectionResult::Detected {
            mass,
            retention_time,
            adduct,
            peak_rank,
        } => println!(
            "Detected:     {} at m/z {:.4}, RT {:.2} min (peak {})",
            adduct,
            mass,
            retention_time,
            peak_rank + 1
        ),
        DetectionResult::NotDetected => println!("Detected:     no"),
    }

    match (&analysis.purity, analysis.purity_trace) {
        (Some(purity), Some(trace)) => {
            let value = purity
                .purity
                .map(|p| format!("{:.1}%", p * 100.0))
                .unwrap_or_else(|| "-".to_string());
            println!("Purity:       {} ({:?}, window area {:.1})", value, trace, purity.window_area);
        }
        _ => println!("Purity:       -"),
    }

    if !analysis.correlations.is_empty() {
        println!();
        println!("PDA Correlation:");
        for c in &analysis.correlations {
            match (c.pda_rt, c.pda_value) {
                (Some(rt), Some(value)) => {
                    println!("  RT {:>6.2} -> PDA {:>6.2} ({:.1})", c.peak_rt, rt, value)
                }
                _ => println!("  RT {:>6.2} -> unpaired", c.peak_rt),
            }
        }
    }
}
