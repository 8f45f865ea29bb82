//! Writing replies and record listings as JSON or JSON Lines.

use serde::Serialize;
use std::io::{self, Write};

use crate::service::Reply;
use crate::types::Sighting;

/// Listing format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON array
    #[default]
    Json,
    /// One record per line
    JsonLines,
}

/// Serializes service output onto a writer.
pub struct OutputWriter<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> OutputWriter<W> {
    /// `pretty` only affects single replies and JSON arrays, never JSONL.
    pub fn new(writer: W, pretty: bool) -> Self {
        Self { writer, pretty }
    }

    pub fn write_reply(&mut self, reply: &Reply) -> io::Result<()> {
        self.write_value(reply, self.pretty)
    }

    /// Write a listing; an empty listing is `[]` in JSON and nothing in JSONL.
    pub fn write_sightings(&mut self, sightings: &[Sighting], format: OutputFormat) -> io::Result<()> {
        match format {
            OutputFormat::Json => self.write_value(sightings, self.pretty),
            OutputFormat::JsonLines => {
                for sighting in sightings {
                    self.write_value(sighting, false)?;
                }
                Ok(())
            }
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_value<T: Serialize + ?Sized>(&mut self, value: &T, pretty: bool) -> io::Result<()> {
        if pretty {
            serde_json::to_writer_pretty(&mut self.writer, value).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, value).map_err(io::Error::other)?;
        }
        writeln!(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::BlobRef;
    use crate::types::{Artifacts, SightingId};
    use chrono::Utc;

    fn sighting(title: &str) -> Sighting {
        Sighting {
            id: SightingId::new(),
            owner: None,
            captured_at: Utc::now(),
            category: None,
            title: Some(title.to_string()),
            details: None,
            coordinates: None,
            artifacts: Artifacts {
                thumbnail_ref: BlobRef::new("thumb/1.jpg"),
                display_ref: BlobRef::new("img/1.jpg"),
                original_ref: BlobRef::new("original/1.jpg"),
            },
        }
    }

    #[test]
    fn test_jsonl_one_record_per_line() {
        let mut writer = OutputWriter::new(Vec::new(), true);
        writer
            .write_sightings(&[sighting("a"), sighting("b")], OutputFormat::JsonLines)
            .unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"title\":\"a\""));
    }

    #[test]
    fn test_json_listing_is_array() {
        let mut writer = OutputWriter::new(Vec::new(), false);
        writer.write_sightings(&[], OutputFormat::Json).unwrap();
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), "[]\n");
    }

    #[test]
    fn test_reply_written() {
        let mut writer = OutputWriter::new(Vec::new(), false);
        let reply = Reply::Ok {
            record: None,
            metadata: None,
            message: Some("Removed".to_string()),
        };
        writer.write_reply(&reply).unwrap();
        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(output, "{\"status\":\"OK\",\"message\":\"Removed\"}\n");
    }
}
