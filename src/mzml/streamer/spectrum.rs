use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};

use super::arrays::{ArrayRole, BinaryArray};
use super::helpers::{get_attribute, parse_attribute_or, parse_cv_param};
use super::{MzMLError, MzMLStreamer};
use crate::mzml::cv_params::{normalize_retention_time, CvParam, MS_CV_ACCESSIONS};
use crate::mzml::models::{MzMLSpectrum, SpectrumKind};

impl<R: BufRead> MzMLStreamer<R> {
    /// Read the next spectrum from the stream
    pub fn next_spectrum(&mut self) -> Result<Option<MzMLSpectrum>, MzMLError> {
        if !self.in_spectrum_list {
            self.read_metadata()?;
            if !self.in_spectrum_list {
                return Ok(None);
            }
        }

        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    if e.name().as_ref() == b"spectrum" {
                        let spectrum = self.parse_spectrum(&e)?;
                        self.current_spectrum_index += 1;
                        return Ok(Some(spectrum));
                    }
                }
                Ok(Event::End(ref e)) => {
                    if e.name().as_ref() == b"spectrumList" {
                        self.in_spectrum_list = false;
                        return Ok(None);
                    }
                }
                Ok(Event::Eof) => {
                    self.in_spectrum_list = false;
                    return Ok(None);
                }
                Err(e) => return Err(MzMLError::XmlError(e)),
                _ => {}
            }
            buf.clear();
        }
    }

    /// Parse a single spectrum element
    fn parse_spectrum(&mut self, start_event: &BytesStart) -> Result<MzMLSpectrum, MzMLError> {
        let mut spectrum = MzMLSpectrum {
            index: parse_attribute_or(start_event, "index", self.current_spectrum_index)?,
            id: get_attribute(start_event, "id")?.unwrap_or_default(),
            default_array_length: parse_attribute_or(start_event, "defaultArrayLength", 0)?,
            ms_level: 1,
            ..Default::default()
        };

        let mut depth = 1;
        let mut in_scan_list = false;
        let mut in_precursor_list = false;
        let mut current_binary_array: Option<BinaryArray> = None;
        let mut buf = Vec::new();

        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    depth += 1;
                    match e.name().as_ref() {
                        b"scanList" => in_scan_list = true,
                        b"precursorList" => in_precursor_list = true,
                        b"binaryDataArray" => {
                            current_binary_array = Some(BinaryArray::default());
                        }
                        _ => {}
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    if e.name().as_ref() == b"cvParam" {
                        let cv_param = parse_cv_param(e)?;

                        if let Some(ref mut array) = current_binary_array {
                            array.apply_cv_param(&cv_param);
                        } else if !in_precursor_list {
                            // precursor terms describe the parent ion, not this spectrum
                            if in_scan_list {
                                Self::apply_scan_cv_param(&mut spectrum, &cv_param);
                            } else {
                                Self::apply_spectrum_cv_param(&mut spectrum, &cv_param);
                            }
                            spectrum.cv_params.push(cv_param);
                        }
                    }
                }
                Ok(Event::Text(ref t)) => {
                    if let Some(ref mut array) = current_binary_array {
                        array.push_text(&t.unescape()?);
                    }
                }
                Ok(Event::End(ref e)) => {
                    depth -= 1;
                    match e.name().as_ref() {
                        b"spectrum" if depth == 0 => break,
                        b"scanList" => in_scan_list = false,
                        b"precursorList" => in_precursor_list = false,
                        b"binaryDataArray" => {
                            if let Some(array) = current_binary_array.take() {
                                Self::store_array(&mut spectrum, array)?;
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => {
                    return Err(MzMLError::InvalidStructure(format!(
                        "Unexpected EOF in spectrum {}",
                        spectrum.id
                    )));
                }
                Err(e) => return Err(MzMLError::XmlError(e)),
                _ => {}
            }
            buf.clear();
        }

        if spectrum.mz_array.is_empty() && !spectrum.wavelength_array.is_empty() {
            spectrum.kind = SpectrumKind::Absorption;
        }
        if spectrum.kind == SpectrumKind::Absorption {
            spectrum.ms_level = 0;
        }

        Ok(spectrum)
    }

    /// Apply CV param to spectrum properties
    fn apply_spectrum_cv_param(spectrum: &mut MzMLSpectrum, cv: &CvParam) {
        match cv.accession.as_str() {
            MS_CV_ACCESSIONS::MS_LEVEL => {
                spectrum.ms_level = cv.value_as_i64().unwrap_or(1) as i16;
            }
            MS_CV_ACCESSIONS::CENTROID_SPECTRUM => {
                spectrum.centroided = true;
            }
            MS_CV_ACCESSIONS::POSITIVE_SCAN => {
                spectrum.polarity = 1;
            }
            MS_CV_ACCESSIONS::NEGATIVE_SCAN => {
                spectrum.polarity = -1;
            }
            MS_CV_ACCESSIONS::EM_RADIATION_SPECTRUM | MS_CV_ACCESSIONS::ABSORPTION_SPECTRUM => {
                spectrum.kind = SpectrumKind::Absorption;
            }
            MS_CV_ACCESSIONS::TOTAL_ION_CURRENT => {
                spectrum.total_ion_current = cv.value_as_f64();
            }
            _ => {}
        }
    }

    /// Apply CV param to scan properties
    fn apply_scan_cv_param(spectrum: &mut MzMLSpectrum, cv: &CvParam) {
        match cv.accession.as_str() {
            MS_CV_ACCESSIONS::SCAN_START_TIME => {
                if let Some(val) = cv.value_as_f64() {
                    spectrum.retention_time =
                        Some(normalize_retention_time(val, cv.unit_accession.as_deref()));
                }
            }
            _ => {
                Self::apply_spectrum_cv_param(spectrum, cv);
            }
        }
    }

    /// Decode a closed binary array into the spectrum's m/z, wavelength or
    /// intensity values
    fn store_array(spectrum: &mut MzMLSpectrum, array: BinaryArray) -> Result<(), MzMLError> {
        if array.is_blank() {
            return Ok(());
        }
        let values = array
            .decode(spectrum.default_array_length)
            .map_err(|source| MzMLError::BinaryError {
                element: spectrum.id.clone(),
                source,
            })?;

        match array.role() {
            ArrayRole::Mz => spectrum.mz_array = values,
            ArrayRole::Wavelength => spectrum.wavelength_array = values,
            ArrayRole::Intensity => spectrum.intensity_array = values,
            ArrayRole::Time | ArrayRole::Other => {}
        }
        Ok(())
    }
}
