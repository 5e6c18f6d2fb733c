use crate::error::PipelineResult;
use crate::types::{ImpactRecord, RawRow};
use crate::util::{parse_count, parse_measure, parse_year_safe};
use bzip2::read::MultiBzDecoder;
use csv::{DeserializeRecordsIntoIter, ReaderBuilder};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub retained_rows: usize,
    pub zero_impact_rows: usize,
    pub out_of_range_rows: usize,
    /// Rows without a readable `BGN_DATE` while the year filter is on
    pub undated_rows: usize,
    pub parse_errors: usize,
}

/// What the projector decided for one raw row.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Retained(ImpactRecord),
    ZeroImpact,
    OutOfRange,
    Undated,
    Invalid,
}

/// Keep only the impact columns of `row` and drop rows that record no
/// impact at all. With `min_year` set, rows dated earlier (or without a
/// readable `BGN_DATE`) are dropped as well.
pub fn project(row: RawRow, min_year: Option<i32>) -> Projection {
    if let Some(min) = min_year {
        match parse_year_safe(row.bgn_date.as_deref()) {
            Some(year) if year >= min => {}
            Some(_) => return Projection::OutOfRange,
            None => return Projection::Undated,
        }
    }

    let Some((fatalities, injuries, property_magnitude, crop_magnitude)) = parse_measures(&row)
    else {
        return Projection::Invalid;
    };

    let record = ImpactRecord {
        category: row.evtype.unwrap_or_default(),
        fatalities,
        injuries,
        property_magnitude,
        property_exponent: row.propdmgexp,
        crop_magnitude,
        crop_exponent: row.cropdmgexp,
    };
    if record.has_impact() {
        Projection::Retained(record)
    } else {
        Projection::ZeroImpact
    }
}

/// The four impact measures of a row, or `None` if any is unreadable.
fn parse_measures(row: &RawRow) -> Option<(u64, u64, f64, f64)> {
    Some((
        parse_count(row.fatalities.as_deref())?,
        parse_count(row.injuries.as_deref())?,
        parse_measure(row.propdmg.as_deref())?,
        parse_measure(row.cropdmg.as_deref())?,
    ))
}

/// Lazy, single-pass stream of projected records. Rows are read and
/// projected one at a time; the tallies in [`LoadReport`] are complete
/// once the iterator is exhausted.
///
/// A bad row is counted and skipped. A failure of the underlying reader
/// ends the stream and is returned by [`RecordStream::finish`].
pub struct RecordStream<R: Read> {
    rows: DeserializeRecordsIntoIter<R, RawRow>,
    min_year: Option<i32>,
    report: LoadReport,
    failure: Option<csv::Error>,
}

impl<R: Read> RecordStream<R> {
    pub fn from_reader(reader: R, min_year: Option<i32>) -> Self {
        let rows = ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader)
            .into_deserialize::<RawRow>();
        RecordStream {
            rows,
            min_year,
            report: LoadReport::default(),
            failure: None,
        }
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn finish(self) -> PipelineResult<LoadReport> {
        match self.failure {
            Some(e) => Err(e.into()),
            None => Ok(self.report),
        }
    }
}

impl<R: Read> Iterator for RecordStream<R> {
    type Item = ImpactRecord;

    fn next(&mut self) -> Option<ImpactRecord> {
        if self.failure.is_some() {
            return None;
        }
        loop {
            let result = self.rows.next()?;
            let row = match result {
                Ok(r) => r,
                Err(e) if e.is_io_error() => {
                    self.failure = Some(e);
                    return None;
                }
                Err(e) => {
                    self.report.total_rows += 1;
                    debug!(row = self.report.total_rows, error = %e, "skipping malformed row");
                    self.report.parse_errors += 1;
                    continue;
                }
            };
            self.report.total_rows += 1;
            match project(row, self.min_year) {
                Projection::Retained(record) => {
                    self.report.retained_rows += 1;
                    return Some(record);
                }
                Projection::ZeroImpact => self.report.zero_impact_rows += 1,
                Projection::OutOfRange => self.report.out_of_range_rows += 1,
                Projection::Undated => self.report.undated_rows += 1,
                Projection::Invalid => self.report.parse_errors += 1,
            }
        }
    }
}

/// Open the dataset, decompressing on the fly when the file name ends in
/// `.bz2`.
pub fn open_dataset<P: AsRef<Path>>(
    path: P,
    min_year: Option<i32>,
) -> PipelineResult<RecordStream<Box<dyn Read>>> {
    let path = path.as_ref();
    let file = BufReader::new(File::open(path)?);
    let compressed = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("bz2"))
        .unwrap_or(false);
    let reader: Box<dyn Read> = if compressed {
        Box::new(MultiBzDecoder::new(file))
    } else {
        Box::new(file)
    };
    debug!(path = %path.display(), compressed, "opened dataset");
    Ok(RecordStream::from_reader(reader, min_year))
}
