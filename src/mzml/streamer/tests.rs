use super::*;
use crate::mzml::models::{ChromatogramType, SpectrumKind};
use std::io::Cursor;

const MINIMAL_MZML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mzML xmlns="http://psi.hupo.org/ms/mzml" version="1.1.0">
  <fileDescription>
    <sourceFileList count="1">
      <sourceFile id="RAW1" name="A1_sample.raw" location="file:///data"/>
    </sourceFileList>
  </fileDescription>
  <run id="test_run" startTimeStamp="2024-01-01T10:00:00Z">
    <spectrumList count="2">
      <spectrum index="0" id="scan=1" defaultArrayLength="2">
        <cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="1"/>
        <cvParam cvRef="MS" accession="MS:1000130" name="positive scan"/>
        <scanList count="1">
          <scan>
            <cvParam cvRef="MS" accession="MS:1000016" name="scan start time" value="60.0" unitCvRef="UO" unitAccession="UO:0000010" unitName="second"/>
          </scan>
        </scanList>
        <binaryDataArrayList count="2">
          <binaryDataArray>
            <cvParam cvRef="MS" accession="MS:1000523" name="64-bit float"/>
            <cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>
            <cvParam cvRef="MS" accession="MS:1000514" name="m/z array"/>
            <binary>AAAAAAAAWUAAAAAAAABpQA==</binary>
          </binaryDataArray>
          <binaryDataArray>
            <cvParam cvRef="MS" accession="MS:1000521" name="32-bit float"/>
            <cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>
            <cvParam cvRef="MS" accession="MS:1000515" name="intensity array"/>
            <binary>AADIQgAASEM=</binary>
          </binaryDataArray>
        </binaryDataArrayList>
      </spectrum>
      <spectrum index="1" id="function=2 scan=1" defaultArrayLength="2">
        <cvParam cvRef="MS" accession="MS:1000804" name="electromagnetic radiation spectrum"/>
        <scanList count="1">
          <scan>
            <cvParam cvRef="MS" accession="MS:1000016" name="scan start time" value="1.25" unitCvRef="UO" unitAccession="UO:0000031" unitName="minute"/>
          </scan>
        </scanList>
        <binaryDataArrayList count="2">
          <binaryDataArray>
            <cvParam cvRef="MS" accession="MS:1000523" name="64-bit float"/>
            <cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>
            <cvParam cvRef="MS" accession="MS:1000617" name="wavelength array" unitCvRef="UO" unitAccession="UO:0000018" unitName="nanometer"/>
            <binary>AAAAAABAakAAAAAAAMBvQA==</binary>
          </binaryDataArray>
          <binaryDataArray>
            <cvParam cvRef="MS" accession="MS:1000521" name="32-bit float"/>
            <cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>
            <cvParam cvRef="MS" accession="MS:1000515" name="intensity array"/>
            <binary>AAAAPwAAwD8=</binary>
          </binaryDataArray>
        </binaryDataArrayList>
      </spectrum>
    </spectrumList>
    <chromatogramList count="1">
      <chromatogram index="0" id="UV 254" defaultArrayLength="3">
        <cvParam cvRef="MS" accession="MS:1000812" name="absorption chromatogram"/>
        <binaryDataArrayList count="2">
          <binaryDataArray>
            <cvParam cvRef="MS" accession="MS:1000523" name="64-bit float"/>
            <cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>
            <cvParam cvRef="MS" accession="MS:1000595" name="time array" unitCvRef="UO" unitAccession="UO:0000031" unitName="minute"/>
            <binary>AAAAAAAA4D8AAAAAAADwPwAAAAAAAPg/</binary>
          </binaryDataArray>
          <binaryDataArray>
            <cvParam cvRef="MS" accession="MS:1000521" name="32-bit float"/>
            <cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>
            <cvParam cvRef="MS" accession="MS:1000515" name="intensity array"/>
            <binary>AAAgQQAAIEIAAKBB</binary>
          </binaryDataArray>
        </binaryDataArrayList>
      </chromatogram>
    </chromatogramList>
  </run>
</mzML>"#;

#[test]
fn test_parse_ms_spectrum() {
    let mut streamer = MzMLStreamer::new(Cursor::new(MINIMAL_MZML)).unwrap();

    let spectrum = streamer.next_spectrum().unwrap().unwrap();

    assert_eq!(spectrum.index, 0);
    assert_eq!(spectrum.id, "scan=1");
    assert_eq!(spectrum.ms_level, 1);
    assert_eq!(spectrum.polarity, 1);
    assert_eq!(spectrum.kind, SpectrumKind::Mass);
    // 60 s normalised to minutes
    assert!((spectrum.retention_time.unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(spectrum.mz_array, vec![100.0, 200.0]);
    assert_eq!(spectrum.intensity_array.len(), 2);

    assert_eq!(streamer.spectrum_count(), Some(2));
    assert_eq!(streamer.metadata().run_id.as_deref(), Some("test_run"));
    assert_eq!(streamer.metadata().source_files, vec!["A1_sample.raw"]);
}

#[test]
fn test_parse_absorption_spectrum() {
    let spectra: Vec<_> = MzMLStreamer::new(Cursor::new(MINIMAL_MZML))
        .unwrap()
        .spectra()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(spectra.len(), 2);
    let pda = &spectra[1];
    assert_eq!(pda.kind, SpectrumKind::Absorption);
    assert_eq!(pda.ms_level, 0);
    assert!((pda.retention_time.unwrap() - 1.25).abs() < 1e-9);
    assert_eq!(pda.x_array(), &[210.0, 254.0]);
    assert!((pda.intensity_array[1] - 1.5).abs() < 1e-6);
}

#[test]
fn test_chromatograms_after_spectra() {
    let mut spectra = MzMLStreamer::new(Cursor::new(MINIMAL_MZML))
        .unwrap()
        .spectra();
    for spectrum in spectra.by_ref() {
        spectrum.unwrap();
    }
    let mut streamer = spectra.into_inner();

    let chromatogram = streamer.next_chromatogram().unwrap().unwrap();
    assert_eq!(chromatogram.id, "UV 254");
    assert_eq!(chromatogram.chromatogram_type, ChromatogramType::Absorption);
    assert_eq!(chromatogram.time_array, vec![0.5, 1.0, 1.5]);
    assert_eq!(chromatogram.intensity_array, vec![10.0, 40.0, 20.0]);
    assert_eq!(streamer.chromatogram_count(), Some(1));

    assert!(streamer.next_chromatogram().unwrap().is_none());
}

#[test]
fn test_zlib_array() {
    let doc = MINIMAL_MZML
        .replacen(
            r#"<cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>
            <cvParam cvRef="MS" accession="MS:1000514" name="m/z array"/>
            <binary>AAAAAAAAWUAAAAAAAABpQA==</binary>"#,
            r#"<cvParam cvRef="MS" accession="MS:1000574" name="zlib compression"/>
            <cvParam cvRef="MS" accession="MS:1000514" name="m/z array"/>
            <binary>eJxjYACBSAcwxZDpAAAG3AFD</binary>"#,
            1,
        );
    assert!(doc.contains("eJxj"));

    let mut streamer = MzMLStreamer::new(Cursor::new(doc)).unwrap();
    let spectrum = streamer.next_spectrum().unwrap().unwrap();
    assert_eq!(spectrum.mz_array, vec![100.0, 200.0]);
}

#[test]
fn test_truncated_document_is_an_error() {
    let truncated = &MINIMAL_MZML[..MINIMAL_MZML.find("</spectrum>").unwrap()];
    let mut streamer = MzMLStreamer::new(Cursor::new(truncated)).unwrap();
    assert!(streamer.next_spectrum().is_err());
}

#[test]
fn test_length_mismatch_names_the_spectrum() {
    let doc = MINIMAL_MZML.replacen(r#"defaultArrayLength="2""#, r#"defaultArrayLength="3""#, 1);
    let mut streamer = MzMLStreamer::new(Cursor::new(doc)).unwrap();
    let err = streamer.next_spectrum().unwrap_err();
    assert!(matches!(err, MzMLError::BinaryError { ref element, .. } if element == "scan=1"));
}

#[test]
fn test_document_without_spectra() {
    let doc = r#"<mzML><run id="r"><spectrumList count="0"/></run></mzML>"#;
    let mut streamer = MzMLStreamer::new(Cursor::new(doc)).unwrap();
    assert!(streamer.next_spectrum().unwrap().is_none());
    assert_eq!(streamer.spectrum_count(), Some(0));
}
