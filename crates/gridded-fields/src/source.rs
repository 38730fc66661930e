//! Collaborators that supply grid records.
//!
//! Decoding and downloading live outside this crate. A [`Retriever`] turns a
//! [`RetrievalRequest`] into a [`RecordSource`]; its client, credentials and
//! caching belong to the caller.

use chrono::{DateTime, Datelike, Duration, Utc};
use reanalysis_common::{BoundingBox, TimeWindow, Variable};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::dataset::GriddedFieldSet;
use crate::error::{FieldSetError, Result};
use crate::record::GridRecord;

/// A stream of decoded grid records.
pub trait RecordSource {
    /// The next record, `Ok(None)` once the source is exhausted.
    fn next_record(&mut self) -> anyhow::Result<Option<GridRecord>>;
}

impl<I> RecordSource for I
where
    I: Iterator<Item = GridRecord>,
{
    fn next_record(&mut self) -> anyhow::Result<Option<GridRecord>> {
        Ok(self.next())
    }
}

/// Fetches records for a request from a remote dataset.
pub trait Retriever {
    type Source: RecordSource;

    fn retrieve(&self, request: &RetrievalRequest) -> anyhow::Result<Self::Source>;
}

/// Dataset name of the hourly single-level reanalysis.
pub const DATASET: &str = "reanalysis-era5-single-levels";

/// A request for every tracked variable over a date range and area.
///
/// The date selection is expressed as distinct year, month and day lists
/// covering the window plus one trailing day, with all 24 hourly times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalRequest {
    pub dataset: String,
    pub product_type: String,
    pub format: String,
    pub variable: Vec<String>,
    pub year: Vec<String>,
    pub month: Vec<String>,
    pub day: Vec<String>,
    pub time: Vec<String>,
    /// `[north, west, south, east]`
    pub area: [f64; 4],
}

impl RetrievalRequest {
    pub fn new(window: &TimeWindow, extent: &BoundingBox) -> Self {
        let mut year = Vec::new();
        let mut month = Vec::new();
        let mut day = Vec::new();

        let last: DateTime<Utc> = window.end + Duration::days(1);
        let mut date = window.start.date_naive();
        while date
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc() <= last)
            .unwrap_or(false)
        {
            push_unique(&mut year, date.year().to_string());
            push_unique(&mut month, date.month().to_string());
            push_unique(&mut day, date.day().to_string());
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }

        Self {
            dataset: DATASET.to_string(),
            product_type: "reanalysis".to_string(),
            format: "grib".to_string(),
            variable: Variable::ALL
                .iter()
                .map(|v| v.request_name().to_string())
                .collect(),
            year,
            month,
            day,
            time: (0..24).map(|h| format!("{:02}:00", h)).collect(),
            area: extent.to_nwse(),
        }
    }

    /// Request body as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "product_type": self.product_type,
            "format": self.format,
            "variable": self.variable,
            "year": self.year,
            "month": self.month,
            "day": self.day,
            "time": self.time,
            "area": self.area,
        })
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Retrieve records for `window` and `extent` and build a field set.
#[instrument(skip(retriever), fields(start = %window.start, end = %window.end))]
pub fn fetch_field_set<R: Retriever>(
    retriever: &R,
    window: TimeWindow,
    extent: BoundingBox,
) -> Result<GriddedFieldSet> {
    let request = RetrievalRequest::new(&window, &extent);
    info!(
        days = request.day.len(),
        area = ?request.area,
        "Requesting reanalysis records"
    );
    let source = retriever
        .retrieve(&request)
        .map_err(FieldSetError::Retrieval)?;
    GriddedFieldSet::from_source(source, window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_request_spans_trailing_day() {
        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2023, 12, 30, 22, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 12, 31, 3, 0, 0).unwrap(),
        )
        .unwrap();
        let extent = BoundingBox::new(-71.0, 38.0, -67.0, 42.0);
        let request = RetrievalRequest::new(&window, &extent);

        assert_eq!(request.year, vec!["2023", "2024"]);
        assert_eq!(request.month, vec!["12", "1"]);
        assert_eq!(request.day, vec!["30", "31", "1"]);
        assert_eq!(request.time.len(), 24);
        assert_eq!(request.time[0], "00:00");
        assert_eq!(request.time[23], "23:00");
        assert_eq!(request.area, [42.0, -71.0, 38.0, -67.0]);
        assert_eq!(request.variable.len(), 6);
    }

    #[test]
    fn test_request_json_body() {
        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap(),
        )
        .unwrap();
        let request = RetrievalRequest::new(&window, &BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        let body = request.to_json();
        assert_eq!(body["format"], "grib");
        assert_eq!(body["variable"][0], "10m_u_component_of_wind");
        assert_eq!(body["day"], serde_json::json!(["1", "2"]));
    }
}
