//! Synthetic LC-MS runs written as mzML for integration tests.

#![allow(dead_code)]

use base64::Engine;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use lcms_qc::chemistry::{Adduct, MassCalculator};

/// Lenalidomide-like test structure used across the suite.
pub const STRUCTURE: &str = "NCCC(NCc(cc1)cc(CN2C(CCC(N3)=O)C3=O)c1C2=O)=O";

/// m/z of an unrelated impurity.
pub const IMPURITY_MZ: f64 = 300.0;

pub fn protonated_mass() -> f64 {
    MassCalculator
        .calculate(STRUCTURE)
        .unwrap()
        .adduct_mass(Adduct::Protonated)
}

pub fn gaussian(t: f64, center: f64, sigma: f64, height: f64) -> f64 {
    height * (-0.5 * ((t - center) / sigma).powi(2)).exp()
}

/// Retention times from 0.5 to 2.0 min in 0.05 min steps.
pub fn times() -> Vec<f64> {
    (0..=30).map(|i| 0.5 + i as f64 * 0.05).collect()
}

struct Spectrum {
    rt: f64,
    pda: bool,
    x: Vec<f64>,
    y: Vec<f64>,
}

/// Builds a minimal mzML document spectrum by spectrum.
#[derive(Default)]
pub struct MzmlBuilder {
    spectra: Vec<Spectrum>,
}

impl MzmlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ms1(mut self, rt: f64, mz: Vec<f64>, intensity: Vec<f64>) -> Self {
        self.spectra.push(Spectrum {
            rt,
            pda: false,
            x: mz,
            y: intensity,
        });
        self
    }

    pub fn pda(mut self, rt: f64, wavelengths: Vec<f64>, absorbance: Vec<f64>) -> Self {
        self.spectra.push(Spectrum {
            rt,
            pda: true,
            x: wavelengths,
            y: absorbance,
        });
        self
    }

    pub fn build(&self) -> String {
        let mut doc = String::new();
        doc.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        doc.push('\n');
        doc.push_str(r#"<mzML xmlns="http://psi.hupo.org/ms/mzml" version="1.1.0">"#);
        doc.push('\n');
        let _ = writeln!(doc, r#"<run id="synthetic"><spectrumList count="{}">"#, self.spectra.len());
        for (i, s) in self.spectra.iter().enumerate() {
            let _ = writeln!(
                doc,
                r#"<spectrum index="{i}" id="scan={}" defaultArrayLength="{}">"#,
                i + 1,
                s.x.len()
            );
            if s.pda {
                doc.push_str(r#"<cvParam cvRef="MS" accession="MS:1000804" name="electromagnetic radiation spectrum"/>"#);
            } else {
                doc.push_str(r#"<cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="1"/>"#);
                doc.push_str(r#"<cvParam cvRef="MS" accession="MS:1000130" name="positive scan"/>"#);
            }
            let _ = write!(
                doc,
                r#"<scanList count="1"><scan><cvParam cvRef="MS" accession="MS:1000016" name="scan start time" value="{}" unitCvRef="UO" unitAccession="UO:0000031" unitName="minute"/></scan></scanList>"#,
                s.rt
            );
            doc.push_str(r#"<binaryDataArrayList count="2">"#);
            let axis = if s.pda {
                r#"<cvParam cvRef="MS" accession="MS:1000617" name="wavelength array"/>"#
            } else {
                r#"<cvParam cvRef="MS" accession="MS:1000514" name="m/z array"/>"#
            };
            push_array(&mut doc, axis, &s.x);
            push_array(
                &mut doc,
                r#"<cvParam cvRef="MS" accession="MS:1000515" name="intensity array"/>"#,
                &s.y,
            );
            doc.push_str("</binaryDataArrayList></spectrum>\n");
        }
        doc.push_str("</spectrumList></run></mzML>\n");
        doc
    }

    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

fn push_array(doc: &mut String, role: &str, values: &[f64]) {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    doc.push_str("<binaryDataArray>");
    doc.push_str(r#"<cvParam cvRef="MS" accession="MS:1000523" name="64-bit float"/>"#);
    doc.push_str(r#"<cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>"#);
    doc.push_str(role);
    let _ = write!(doc, "<binary>{}</binary></binaryDataArray>", encoded);
}

/// Product eluting at 1.2 min with a smaller impurity at 1.6 min, with
/// matching PDA spectra at 254 nm.
pub fn product_run(with_pda: bool) -> MzmlBuilder {
    let product = protonated_mass();
    let mut builder = MzmlBuilder::new();
    for t in times() {
        let mut mz = vec![IMPURITY_MZ, product];
        let mut y = vec![
            gaussian(t, 1.6, 0.08, 2.0e5) + 50.0,
            gaussian(t, 1.2, 0.08, 1.0e6) + 50.0,
        ];
        if IMPURITY_MZ > product {
            mz.swap(0, 1);
            y.swap(0, 1);
        }
        builder = builder.ms1(t, mz, y);
        if with_pda {
            builder = builder.pda(t, vec![254.0], vec![impurity_absorbance(t) + gaussian(t, 1.2, 0.08, 80.0)]);
        }
    }
    builder
}

pub fn impurity_absorbance(t: f64) -> f64 {
    gaussian(t, 1.6, 0.08, 20.0)
}

/// Blank injection carrying only the impurity's UV signal.
pub fn blank_run() -> MzmlBuilder {
    let mut builder = MzmlBuilder::new();
    for t in times() {
        builder = builder
            .ms1(t, vec![IMPURITY_MZ], vec![50.0])
            .pda(t, vec![254.0], vec![impurity_absorbance(t)]);
    }
    builder
}

/// Low, flat signal with no peaks above the detection threshold.
pub fn flat_run() -> MzmlBuilder {
    let mut builder = MzmlBuilder::new();
    for t in times() {
        builder = builder.ms1(t, vec![protonated_mass()], vec![500.0]);
    }
    builder
}
