//! `<binaryDataArray>` accumulation and decoding.
//!
//! An array's cvParams (float width, compression, what the values are) and
//! its `<binary>` text arrive as separate pull events. [`BinaryArray`] collects
//! both while the element is open and decodes once it closes: Base64, then
//! zlib when flagged, then little-endian floats widened to `f64`.

use std::io::Read;

use base64::prelude::*;
use byteorder::{ByteOrder, LittleEndian};
use flate2::read::ZlibDecoder;

use crate::mzml::cv_params::{CvParam, MS_CV_ACCESSIONS};

/// MS-Numpress compressions (linear, pic, slof); reported, never decoded.
const NUMPRESS_ACCESSIONS: [&str; 3] = ["MS:1002312", "MS:1002313", "MS:1002314"];

/// Errors decoding one binary array.
#[derive(Debug, thiserror::Error)]
pub enum BinaryDecodeError {
    /// Text is not valid Base64
    #[error("invalid Base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// zlib stream is corrupt or truncated
    #[error("zlib inflate failed: {0}")]
    Inflate(#[from] std::io::Error),

    /// Byte count is not a whole number of floats
    #[error("{len} bytes do not hold whole {width}-byte floats")]
    RaggedBytes {
        /// Decoded byte count
        len: usize,
        /// Bytes per float
        width: usize,
    },

    /// Value count disagrees with `defaultArrayLength`
    #[error("expected {expected} values, decoded {actual}")]
    LengthMismatch {
        /// `defaultArrayLength` of the enclosing element
        expected: usize,
        /// Values actually decoded
        actual: usize,
    },

    /// Compression the reader recognises but cannot undo
    #[error("unsupported compression {0}")]
    UnsupportedCompression(String),
}

/// What an array's values are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) enum ArrayRole {
    Mz,
    Wavelength,
    Intensity,
    Time,
    #[default]
    Other,
}

/// One `<binaryDataArray>` being read.
#[derive(Debug, Default)]
pub(super) struct BinaryArray {
    role: ArrayRole,
    unit_accession: Option<String>,
    single_precision: bool,
    zlib: bool,
    unsupported: Option<String>,
    text: String,
}

impl BinaryArray {
    /// Record a cvParam of the array.
    pub(super) fn apply_cv_param(&mut self, cv: &CvParam) {
        let role = match cv.accession.as_str() {
            MS_CV_ACCESSIONS::FLOAT_32_BIT => {
                self.single_precision = true;
                return;
            }
            MS_CV_ACCESSIONS::FLOAT_64_BIT => {
                self.single_precision = false;
                return;
            }
            MS_CV_ACCESSIONS::ZLIB_COMPRESSION => {
                self.zlib = true;
                return;
            }
            MS_CV_ACCESSIONS::NO_COMPRESSION => {
                self.zlib = false;
                return;
            }
            accession if NUMPRESS_ACCESSIONS.contains(&accession) => {
                self.unsupported = Some(format!("{} ({})", cv.name, cv.accession));
                return;
            }
            MS_CV_ACCESSIONS::MZ_ARRAY => ArrayRole::Mz,
            MS_CV_ACCESSIONS::WAVELENGTH_ARRAY => ArrayRole::Wavelength,
            MS_CV_ACCESSIONS::INTENSITY_ARRAY => ArrayRole::Intensity,
            MS_CV_ACCESSIONS::TIME_ARRAY => ArrayRole::Time,
            _ => return,
        };
        self.role = role;
        self.unit_accession = cv.unit_accession.clone();
    }

    /// Append `<binary>` text; quick-xml may split it across events.
    pub(super) fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub(super) fn role(&self) -> ArrayRole {
        self.role
    }

    /// Unit of the array's values, e.g. seconds for a time array.
    pub(super) fn unit_accession(&self) -> Option<&str> {
        self.unit_accession.as_deref()
    }

    /// True when the element carried no `<binary>` text.
    pub(super) fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Decode the values; `expected_len` is the element's `defaultArrayLength`.
    pub(super) fn decode(&self, expected_len: usize) -> Result<Vec<f64>, BinaryDecodeError> {
        if let Some(compression) = &self.unsupported {
            return Err(BinaryDecodeError::UnsupportedCompression(compression.clone()));
        }
        if self.is_blank() {
            return Ok(Vec::new());
        }

        let mut bytes = BASE64_STANDARD.decode(self.text.trim())?;
        if self.zlib {
            let mut inflated = Vec::with_capacity(bytes.len() * 4);
            ZlibDecoder::new(bytes.as_slice()).read_to_end(&mut inflated)?;
            bytes = inflated;
        }

        let width = if self.single_precision { 4 } else { 8 };
        if bytes.len() % width != 0 {
            return Err(BinaryDecodeError::RaggedBytes {
                len: bytes.len(),
                width,
            });
        }
        let values: Vec<f64> = if self.single_precision {
            bytes
                .chunks_exact(4)
                .map(|chunk| f64::from(LittleEndian::read_f32(chunk)))
                .collect()
        } else {
            bytes.chunks_exact(8).map(LittleEndian::read_f64).collect()
        };

        if values.len() != expected_len {
            return Err(BinaryDecodeError::LengthMismatch {
                expected: expected_len,
                actual: values.len(),
            });
        }
        Ok(values)
    }
}
