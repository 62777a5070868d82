//! Streaming mzML parser using quick-xml
//!
//! A pull-based parser: spectra are decoded one at a time so memory use is
//! bounded by the largest spectrum, not the run.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::Reader;

use super::models::MzMLFileMetadata;

pub use arrays::BinaryDecodeError;
pub use error::MzMLError;
pub use iterators::SpectrumIterator;

mod arrays;
mod chromatogram;
mod error;
mod helpers;
mod iterators;
mod metadata;
mod spectrum;

#[cfg(test)]
mod tests;

/// Input buffer size used when opening files
pub const DEFAULT_INPUT_BUFFER_SIZE: usize = 64 * 1024;

/// Streaming parser for mzML files
pub struct MzMLStreamer<R: BufRead> {
    reader: Reader<R>,
    metadata: MzMLFileMetadata,
    metadata_read: bool,
    in_spectrum_list: bool,
    spectrum_count: Option<usize>,
    chromatogram_count: Option<usize>,
    current_spectrum_index: i64,
    current_chromatogram_index: i64,
}

impl MzMLStreamer<BufReader<File>> {
    /// Open an mzML file for streaming
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MzMLError> {
        let file = File::open(path.as_ref())?;
        Self::new(BufReader::with_capacity(DEFAULT_INPUT_BUFFER_SIZE, file))
    }
}

impl<R: BufRead> MzMLStreamer<R> {
    /// Create a new streamer from a BufRead source
    pub fn new(reader: R) -> Result<Self, MzMLError> {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.config_mut().trim_text(true);

        Ok(Self {
            reader: xml_reader,
            metadata: MzMLFileMetadata::default(),
            metadata_read: false,
            in_spectrum_list: false,
            spectrum_count: None,
            chromatogram_count: None,
            current_spectrum_index: 0,
            current_chromatogram_index: 0,
        })
    }

    /// Get the file metadata (populated once the first spectrum is requested)
    pub fn metadata(&self) -> &MzMLFileMetadata {
        &self.metadata
    }

    /// Spectrum count declared by `spectrumList/@count`
    pub fn spectrum_count(&self) -> Option<usize> {
        self.spectrum_count
    }

    /// Chromatogram count declared by `chromatogramList/@count`
    pub fn chromatogram_count(&self) -> Option<usize> {
        self.chromatogram_count
    }

    /// Iterate over all spectra
    pub fn spectra(self) -> SpectrumIterator<R> {
        SpectrumIterator { streamer: self }
    }
}
