use std::io::BufRead;

use quick_xml::events::Event;

use super::helpers::get_attribute;
use super::{MzMLError, MzMLStreamer};
use crate::mzml::models::MzMLFileMetadata;

impl<R: BufRead> MzMLStreamer<R> {
    /// Read file-level metadata up to the first spectrum or chromatogram list.
    ///
    /// Only runs once; later calls return the cached metadata.
    pub fn read_metadata(&mut self) -> Result<&MzMLFileMetadata, MzMLError> {
        if self.metadata_read {
            return Ok(&self.metadata);
        }
        self.metadata_read = true;

        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => match e.name().as_ref() {
                    b"mzML" => {
                        self.metadata.version = get_attribute(e, "version")?;
                    }
                    b"sourceFile" => {
                        if let Some(name) = get_attribute(e, "name")? {
                            self.metadata.source_files.push(name);
                        }
                    }
                    b"run" => {
                        self.metadata.run_id = get_attribute(e, "id")?;
                        self.metadata.run_start_time = get_attribute(e, "startTimeStamp")?;
                    }
                    b"spectrumList" => {
                        self.spectrum_count =
                            get_attribute(e, "count")?.and_then(|s| s.parse().ok());
                        self.in_spectrum_list = true;
                        break;
                    }
                    b"chromatogramList" => {
                        self.chromatogram_count =
                            get_attribute(e, "count")?.and_then(|s| s.parse().ok());
                        break;
                    }
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                    b"sourceFile" => {
                        if let Some(name) = get_attribute(e, "name")? {
                            self.metadata.source_files.push(name);
                        }
                    }
                    b"spectrumList" => {
                        self.spectrum_count = Some(0);
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(MzMLError::XmlError(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(&self.metadata)
    }
}
