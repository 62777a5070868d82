#![no_main]

use libfuzzer_sys::fuzz_target;

use lcms_qc::chemistry::MassCalculator;

fuzz_target!(|data: &[u8]| {
    if let Ok(smiles) = std::str::from_utf8(data) {
        // Either a mass or an InvalidStructureError; the parser must not panic
        if let Ok(masses) = MassCalculator::default().calculate(smiles) {
            assert!(masses.monoisotopic.is_finite());
        }
    }
});
