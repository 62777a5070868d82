//! # mzML Reader
//!
//! Streaming reader for the open mzML format written by the vendor converter.
//! Both mass spectra and UV/PDA absorption data are read; all retention
//! times are normalised to minutes.
//!
//! ## mzML Structure
//!
//! ```text
//! mzML
//! ├── fileDescription
//! └── run
//!     ├── spectrumList
//!     │   └── spectrum* (MS scans and PDA absorption spectra)
//!     │       ├── cvParam*  (ms level, polarity, spectrum type)
//!     │       ├── scanList  (scan start time)
//!     │       └── binaryDataArrayList
//!     │           └── binaryDataArray* (m/z | wavelength | intensity)
//!     └── chromatogramList (optional)
//!         └── chromatogram* (TIC, absorption, ...)
//! ```

mod cv_params;
mod models;
mod streamer;

pub use cv_params::{has_cv_param, normalize_retention_time, CvParam, MS_CV_ACCESSIONS};
pub use models::{ChromatogramType, MzMLChromatogram, MzMLFileMetadata, MzMLSpectrum, SpectrumKind};
pub use streamer::{
    BinaryDecodeError, MzMLError, MzMLStreamer, SpectrumIterator, DEFAULT_INPUT_BUFFER_SIZE,
};
