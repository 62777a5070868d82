use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};

use super::arrays::{ArrayRole, BinaryArray};
use super::helpers::{get_attribute, parse_attribute_or, parse_cv_param};
use super::{MzMLError, MzMLStreamer};
use crate::mzml::cv_params::normalize_retention_time;
use crate::mzml::models::{ChromatogramType, MzMLChromatogram};

impl<R: BufRead> MzMLStreamer<R> {
    /// Read the next chromatogram from the stream.
    ///
    /// Call after the spectra have been consumed; chromatograms follow the
    /// spectrum list in mzML.
    pub fn next_chromatogram(&mut self) -> Result<Option<MzMLChromatogram>, MzMLError> {
        self.read_metadata()?;
        let mut buf = Vec::new();

        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => match e.name().as_ref() {
                    b"chromatogram" => {
                        let chromatogram = self.parse_chromatogram(e)?;
                        self.current_chromatogram_index += 1;
                        return Ok(Some(chromatogram));
                    }
                    b"chromatogramList" => {
                        self.chromatogram_count =
                            get_attribute(e, "count")?.and_then(|s| s.parse().ok());
                    }
                    _ => {}
                },
                Ok(Event::End(ref e)) => {
                    if e.name().as_ref() == b"chromatogramList" {
                        return Ok(None);
                    }
                }
                Ok(Event::Eof) => return Ok(None),
                Err(e) => return Err(MzMLError::XmlError(e)),
                _ => {}
            }
            buf.clear();
        }
    }

    /// Parse a single chromatogram element
    fn parse_chromatogram(
        &mut self,
        start_event: &BytesStart,
    ) -> Result<MzMLChromatogram, MzMLError> {
        let mut chromatogram = MzMLChromatogram {
            index: parse_attribute_or(start_event, "index", self.current_chromatogram_index)?,
            id: get_attribute(start_event, "id")?.unwrap_or_default(),
            default_array_length: parse_attribute_or(start_event, "defaultArrayLength", 0)?,
            ..Default::default()
        };

        let mut depth = 1;
        let mut in_precursor_or_product = false;
        let mut current_binary_array: Option<BinaryArray> = None;
        let mut buf = Vec::new();

        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    depth += 1;
                    match e.name().as_ref() {
                        b"precursor" | b"product" => in_precursor_or_product = true,
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
                        } else if !in_precursor_or_product {
                            if let Some(kind) = ChromatogramType::from_cv_accession(&cv_param.accession)
                            {
                                chromatogram.chromatogram_type = kind;
                            }
                            chromatogram.cv_params.push(cv_param);
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
                        b"chromatogram" if depth == 0 => break,
                        b"precursor" | b"product" => in_precursor_or_product = false,
                        b"binaryDataArray" => {
                            if let Some(array) = current_binary_array.take() {
                                Self::store_chromatogram_array(&mut chromatogram, array)?;
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => {
                    return Err(MzMLError::InvalidStructure(format!(
                        "Unexpected EOF in chromatogram {}",
                        chromatogram.id
                    )));
                }
                Err(e) => return Err(MzMLError::XmlError(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(chromatogram)
    }

    /// Decode a time or intensity array; times are converted to minutes
    fn store_chromatogram_array(
        chromatogram: &mut MzMLChromatogram,
        array: BinaryArray,
    ) -> Result<(), MzMLError> {
        if array.is_blank() {
            return Ok(());
        }
        let values = array
            .decode(chromatogram.default_array_length)
            .map_err(|source| MzMLError::BinaryError {
                element: chromatogram.id.clone(),
                source,
            })?;

        match array.role() {
            ArrayRole::Time => {
                let unit = array.unit_accession();
                chromatogram.time_array = values
                    .into_iter()
                    .map(|t| normalize_retention_time(t, unit))
                    .collect();
            }
            ArrayRole::Intensity => chromatogram.intensity_array = values,
            ArrayRole::Mz | ArrayRole::Wavelength | ArrayRole::Other => {}
        }
        Ok(())
    }
}
