use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::error::RecordError;
use crate::network::LinkParam;
use crate::scheduler::TrafficDemand;

/// Cursor over the comma separated fields of one CSV row.
pub(crate) struct Fields<'a> {
    inner: std::str::Split<'a, char>,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(line: &'a str) -> Self {
        Self {
            inner: line.split(','),
        }
    }

    pub(crate) fn required<T: FromStr>(&mut self, field: &'static str) -> Result<T, RecordError> {
        let raw = self.inner.next().ok_or(RecordError::MissingField(field))?;
        parse_field(field, raw)
    }

    /// Trailing fields may be absent or empty, both yield `default`.
    pub(crate) fn optional<T: FromStr>(
        &mut self,
        field: &'static str,
        default: T,
    ) -> Result<T, RecordError> {
        match self.inner.next() {
            Some(raw) if !raw.trim().is_empty() => parse_field(field, raw),
            _ => Ok(default),
        }
    }
}

fn parse_field<T: FromStr>(field: &'static str, raw: &str) -> Result<T, RecordError> {
    let value = raw.trim();
    value.parse().map_err(|_| RecordError::InvalidField {
        field,
        value: value.to_string(),
    })
}

/// Reads header-prefixed CSV records, skipping blank and malformed rows.
///
/// Only I/O failures are returned as errors; a row that does not parse is
/// logged and dropped so one bad line never aborts a whole load.
pub fn read_records<T, R>(reader: R) -> Result<Vec<T>>
where
    T: FromStr<Err = RecordError>,
    R: BufRead,
{
    let mut records = Vec::new();

    for (index, raw) in reader.split(b'\n').enumerate() {
        let raw = raw.context("failed to read input line")?;
        if index == 0 {
            continue;
        }
        let line = match String::from_utf8(raw) {
            Ok(line) => line,
            Err(e) => {
                warn!("Skipping malformed row {}: {}", index + 1, e);
                continue;
            }
        };
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<T>() {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping malformed row {}: {}", index + 1, e),
        }
    }

    Ok(records)
}

pub fn load_records<T>(path: &Path) -> Result<Vec<T>>
where
    T: FromStr<Err = RecordError>,
{
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    read_records(BufReader::new(file))
}

pub fn load_links(path: &Path) -> Result<Vec<LinkParam>> {
    let links: Vec<LinkParam> = load_records(path)?;
    info!("Loaded {} links from {}", links.len(), path.display());
    Ok(links)
}

pub fn load_demands(path: &Path) -> Result<Vec<TrafficDemand>> {
    let demands: Vec<TrafficDemand> = load_records(path)?;
    info!("Loaded {} traffic demands from {}", demands.len(), path.display());
    Ok(demands)
}
