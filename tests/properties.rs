//! Property tests for the analysis invariants.

use lcms_qc::chemistry::{MassCalculator, HYDROGEN_MASS};
use lcms_qc::chromatogram::{Chromatogram, TraceKind};
use lcms_qc::matching::{MassMatchConfig, MassMatcher};
use lcms_qc::peaks::{ApexIon, Peak, PeakDetector, PeakDetectorConfig};
use lcms_qc::purity::{PurityConfig, PurityIntegrator};
use lcms_qc::run::{ChannelTag, Polarity, Scan};
use proptest::prelude::*;

const MS1: ChannelTag = ChannelTag::Ms {
    level: 1,
    polarity: Polarity::Positive,
};

fn scans_strategy() -> impl Strategy<Value = Vec<Scan>> {
    prop::collection::vec(
        prop::collection::vec((100.0f64..1000.0, 0.0f64..1e6), 0..40),
        1..30,
    )
    .prop_map(|scans| {
        scans
            .into_iter()
            .enumerate()
            .map(|(i, points)| {
                let (x, y) = points.into_iter().unzip();
                Scan::from_unsorted(i as f64 * 0.05, x, y, MS1).unwrap()
            })
            .collect()
    })
}

fn trace(intensities: &[f64]) -> Chromatogram {
    let times = (0..intensities.len()).map(|i| i as f64 * 0.1).collect();
    Chromatogram::new(times, intensities.to_vec(), TraceKind::Tic).unwrap()
}

proptest! {
    #[test]
    fn test_xic_never_exceeds_tic(
        scans in scans_strategy(),
        target in 100.0f64..1000.0,
        tolerance in 0.0f64..50.0,
    ) {
        let tic = Chromatogram::total_ion(&scans).unwrap();
        let xic = Chromatogram::extracted_ion(&scans, target, tolerance).unwrap();

        prop_assert_eq!(tic.len(), scans.len());
        prop_assert_eq!(xic.len(), scans.len());
        for ((_, x), (_, t)) in xic.points().zip(tic.points()) {
            prop_assert!(x >= 0.0);
            prop_assert!(x <= t);
        }
    }

    #[test]
    fn test_wider_tolerance_extracts_more(
        scans in scans_strategy(),
        target in 100.0f64..1000.0,
        narrow in 0.0f64..10.0,
        extra in 0.0f64..10.0,
    ) {
        let a = Chromatogram::extracted_ion(&scans, target, narrow).unwrap();
        let b = Chromatogram::extracted_ion(&scans, target, narrow + extra).unwrap();
        for (x, y) in a.intensities().iter().zip(b.intensities()) {
            prop_assert!(x <= y);
        }
    }

    #[test]
    fn test_peak_invariants(
        intensities in prop::collection::vec(0.0f64..1e6, 3..80),
        min_height in 0.0f64..5e5,
        top_n in 1usize..6,
        boundary_fraction in 0.0f64..0.5,
    ) {
        let config = PeakDetectorConfig { min_height, top_n, boundary_fraction };
        let peaks = PeakDetector::new(config).detect(&trace(&intensities), &[]);

        prop_assert!(peaks.len() <= top_n);
        for p in &peaks {
            prop_assert!(p.left_rt < p.apex_rt && p.apex_rt < p.right_rt);
            prop_assert!(p.apex_intensity >= min_height);
            prop_assert!(p.area >= 0.0);
        }
        for pair in peaks.windows(2) {
            prop_assert!(pair[0].apex_intensity >= pair[1].apex_intensity);
        }
        for (i, p) in peaks.iter().enumerate() {
            for (j, q) in peaks.iter().enumerate() {
                if i != j {
                    prop_assert!(!q.contains_strictly(p.apex_rt));
                }
            }
        }
    }

    #[test]
    fn test_detection_is_monotonic_in_tolerance(
        apex_mzs in prop::collection::vec(100.0f64..600.0, 1..4),
        narrow in 0.0f64..2.0,
        extra in 0.0f64..2.0,
    ) {
        let masses = MassCalculator.calculate("CC(=O)Nc1ccc(O)cc1").unwrap();
        let peaks: Vec<Peak> = apex_mzs
            .iter()
            .enumerate()
            .map(|(i, &mz)| Peak {
                apex_rt: 1.0 + i as f64,
                left_rt: 0.5 + i as f64,
                right_rt: 1.5 + i as f64,
                apex_intensity: 1e5,
                area: 1e4,
                apex_ion: Some(ApexIon { mz, intensity: 1e5 }),
            })
            .collect();

        let strict = MassMatcher::new(MassMatchConfig { tolerance: narrow }).match_peaks(&peaks, &masses);
        let loose = MassMatcher::new(MassMatchConfig { tolerance: narrow + extra }).match_peaks(&peaks, &masses);
        if strict.is_detected() {
            prop_assert!(loose.is_detected());
            prop_assert!(loose.peak_rank() <= strict.peak_rank());
        }
    }

    #[test]
    fn test_zero_blank_changes_nothing(
        intensities in prop::collection::vec(0.0f64..1e6, 2..50),
    ) {
        let sample = trace(&intensities);
        let blank = trace(&vec![0.0; intensities.len()]);
        let end = (intensities.len() - 1) as f64 * 0.1;
        let integrator = PurityIntegrator::new(PurityConfig { window_start: 0.0, window_end: end, ..Default::default() }).unwrap();

        let without = integrator.integrate(&sample, None, None).unwrap();
        let with = integrator.integrate(&sample, Some(&blank), None).unwrap();
        prop_assert_eq!(without, with);
    }

    #[test]
    fn test_alkane_masses(n in 1usize..40) {
        let smiles = "C".repeat(n);
        let a = MassCalculator.calculate(&smiles).unwrap();
        let b = MassCalculator.calculate(&smiles).unwrap();
        prop_assert_eq!(&a, &b);

        let hydrogens = 2 * n as u32 + 2;
        prop_assert_eq!(a.formula.count("C"), n as u32);
        prop_assert_eq!(a.formula.count("H"), hydrogens);
        let expected = 12.0 * n as f64 + HYDROGEN_MASS * hydrogens as f64;
        prop_assert!((a.monoisotopic - expected).abs() < 1e-6);
    }
}
