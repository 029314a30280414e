//! CSV reading/writing
//!
//! Input layout, one observation per row:
//!
//! ```text
//! unit_id,timestamp,interval_end,value,valid,qa
//! px-1,2019-01-01,2019-01-08,1.25,true,0
//! px-1,2019-01-09,,0.97,,
//! ```
//!
//! `interval_end`, `valid` (default `true`) and `qa` may be empty or absent;
//! an empty `value` marks a missing observation.
//!
//! `interval_end` is inclusive. Exports whose end date is the first day of
//! the next composite (Earth Engine `system:time_end`, for instance) must be
//! read with [`ReadOptions::exclusive_end`] set; otherwise adjacent
//! composites share a day and a fully covered period overflows.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::series::qa::QaMask;
use crate::series::{Observation, UnitId};

/// Options applied while reading observations
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Invalidate rows whose `qa` column fails this mask. Rows without a
    /// `qa` value are left untouched.
    pub qa_mask: Option<QaMask>,
    /// Width in days of the compositing bucket used to fill a missing
    /// `interval_end`. `None` keeps single-day coverage.
    pub dn: Option<u32>,
    /// Treat `interval_end` as exclusive and step it back one day. An end
    /// equal to `timestamp` is kept as single-day coverage.
    pub exclusive_end: bool,
}

/// Counts gathered while reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadSummary {
    pub rows: usize,
    pub missing_values: usize,
    pub qa_rejected: usize,
}

#[derive(Debug, Deserialize)]
struct ObservationRow {
    unit_id: String,
    timestamp: NaiveDate,
    #[serde(default)]
    interval_end: Option<NaiveDate>,
    #[serde(default)]
    value: Option<f64>,
    #[serde(default)]
    valid: Option<bool>,
    #[serde(default)]
    qa: Option<u32>,
}

/// Read observations from a CSV file
pub fn read_observations<P: AsRef<Path>>(
    path: P,
    options: &ReadOptions,
) -> Result<(Vec<Observation>, ReadSummary)> {
    let file = File::open(path.as_ref())?;
    read_observations_from_reader(file, options)
}

/// Read observations from any CSV source
pub fn read_observations_from_reader<R: Read>(
    reader: R,
    options: &ReadOptions,
) -> Result<(Vec<Observation>, ReadSummary)> {
    let mut rdr = ::csv::ReaderBuilder::new()
        .trim(::csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut summary = ReadSummary::default();
    let mut observations = Vec::new();

    for row in rdr.deserialize::<ObservationRow>() {
        let row = row?;
        summary.rows += 1;

        let mut valid = row.valid.unwrap_or(true);
        let value = match row.value {
            Some(v) => v,
            None => {
                summary.missing_values += 1;
                valid = false;
                f64::NAN
            }
        };
        if let (Some(mask), Some(qa)) = (&options.qa_mask, row.qa)
            && !mask.accepts(qa)
        {
            summary.qa_rejected += 1;
            valid = false;
        }

        let interval_end = match row.interval_end {
            Some(end) if options.exclusive_end && end > row.timestamp => {
                Some(end.pred_opt().unwrap_or(end))
            }
            other => other,
        };

        let mut obs = Observation {
            unit_id: UnitId::from(row.unit_id),
            timestamp: row.timestamp,
            interval_end,
            value,
            valid,
        };
        if let Some(n) = options.dn {
            obs = obs.with_dn_coverage(n)?;
        }
        observations.push(obs);
    }

    Ok((observations, summary))
}

/// Write serializable records to a CSV file with a header row
pub fn write_records<T: Serialize, P: AsRef<Path>>(records: &[T], path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_records_to_writer(records, file)
}

/// Write serializable records to any sink with a header row
pub fn write_records_to_writer<T: Serialize, W: Write>(records: &[T], writer: W) -> Result<()> {
    let mut wtr = ::csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}
