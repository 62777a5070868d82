use anyhow::{Context, Result};
use log::{info, warn};
use std::path::PathBuf;

use lcms_qc::batch::{read_sample_sheet, BatchProcessor, ProgressEvent};
use lcms_qc::config::AnalysisConfig;
use lcms_qc::converter::MsConvert;
use lcms_qc::report::{FAILURES_CSV, REPORT_JSON, RESULTS_CSV};

/// Analyze every sample of a sample sheet and write the reports
pub fn run(sheet: PathBuf, out: PathBuf, config: &AnalysisConfig) -> Result<()> {
    if !sheet.exists() {
        anyhow::bail!("Sample sheet does not exist: {}", sheet.display());
    }

    let samples = read_sample_sheet(&sheet)
        .with_context(|| format!("Failed to read sample sheet: {}", sheet.display()))?;
    if samples.is_empty() {
        anyhow::bail!("Sample sheet has no samples: {}", sheet.display());
    }

    info!("lcms-qc batch");
    info!("=============");
    info!("Sheet:   {}", sheet.display());
    info!("Output:  {}", out.display());
    info!("Samples: {}", samples.len());
    info!("Plate:   {}", config.batch.plate_format);

    let converter = MsConvert::from_config(&config.converter);
    let (sender, receiver) = crossbeam_channel::unbounded();
    let monitor = std::thread::spawn(move || {
        for event in receiver {
            match event {
                ProgressEvent::Started { sample_id } => log::debug!("Started {}", sample_id),
                ProgressEvent::Finished {
                    sample_id,
                    detected,
                    completed,
                    total,
                } => info!(
                    "[{}/{}] {}: {}",
                    completed,
                    total,
                    sample_id,
                    if detected { "detected" } else { "not detected" }
                ),
                ProgressEvent::Failed {
                    sample_id,
                    message,
                    completed,
                    total,
                } => warn!("[{}/{}] {} failed: {}", completed, total, sample_id, message),
            }
        }
    });

    let result = BatchProcessor::new(config, &converter)
        .with_progress(sender)
        .run(samples);
    monitor
        .join()
        .map_err(|_| anyhow::anyhow!("Progress monitor panicked"))?;
    let report = result.context("Batch failed")?;

    report
        .document
        .write_dir(&out)
        .with_context(|| format!("Failed to write reports to {}", out.display()))?;

    let detected = report.document.samples.iter().filter(|r| r.detected).count();
    println!("Batch Complete");
    println!("==============");
    println!("  Analyzed: {}", report.document.samples.len());
    println!("  Detected: {}", detected);
    println!("  Failed:   {}", report.failure_count());
    println!();
    println!("  {}", out.join(RESULTS_CSV).display());
    println!("  {}", out.join(FAILURES_CSV).display());
    println!("  {}", out.join(REPORT_JSON).display());

    Ok(())
}
