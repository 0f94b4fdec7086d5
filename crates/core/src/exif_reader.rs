use crate::metadata::TimestampTag;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use exif::{In, Reader, Value};
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub trait TimestampReader {
    fn read_timestamp(&self, path: &Path) -> Option<NaiveDateTime>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExifTimestampReader;

impl TimestampReader for ExifTimestampReader {
    fn read_timestamp(&self, path: &Path) -> Option<NaiveDateTime> {
        match read_exif_timestamp(path) {
            Ok(found) => found,
            Err(err) => {
                debug!("no EXIF timestamp in {}: {err:#}", path.display());
                None
            }
        }
    }
}

fn read_exif_timestamp(path: &Path) -> Result<Option<NaiveDateTime>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut buf = BufReader::new(file);
    let exif = Reader::new()
        .read_from_container(&mut buf)
        .with_context(|| format!("cannot decode EXIF of {}", path.display()))?;

    Ok(TimestampTag::PRIORITY
        .iter()
        .find_map(|tag| find_ascii_field(&exif, *tag).and_then(|raw| parse_date(&raw))))
}

fn find_ascii_field(exif: &exif::Exif, tag: TimestampTag) -> Option<String> {
    let field = exif.get_field(tag.exif_tag(), In::PRIMARY)?;
    match &field.value {
        Value::Ascii(values) => values
            .iter()
            .find_map(|bytes| std::str::from_utf8(bytes).ok())
            .map(|s| s.trim_matches(|c: char| c == '\0' || c.is_whitespace()).to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn parse_date(input: &str) -> Option<NaiveDateTime> {
    let candidates = ["%Y:%m:%d %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    candidates
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input.trim(), fmt).ok())
}
