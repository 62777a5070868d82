use anyhow::{Context, Result};

use lcms_qc::chemistry::{MassCalculator, ISOTOPE_TABLE_VERSION};

/// Print formula, monoisotopic mass and adduct masses of a structure
pub fn run(smiles: &str, json: bool) -> Result<()> {
    let masses = MassCalculator
        .calculate(smiles)
        .with_context(|| format!("Invalid structure: {}", smiles))?;

    if json {
        let out = serde_json::to_string_pretty(&masses).context("Failed to serialize masses")?;
        println!("{}", out);
        return Ok(());
    }

    println!("Theoretical Masses");
    println!("==================");
    println!("Structure:     {}", smiles.trim());
    println!("Formula:       {}", masses.formula);
    println!("Monoisotopic:  {:.4}", masses.monoisotopic);
    println!("Isotope table: {}", ISOTOPE_TABLE_VERSION);
    println!();
    println!("Adducts:");
    for (adduct, mass) in masses.adducts() {
        println!("  {:<9} {:>12.4}", adduct.label(), mass);
    }

    Ok(())
}
