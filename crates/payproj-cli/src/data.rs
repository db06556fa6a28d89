//! JSON data file standing in for the record service
//!
//! The file holds a JSON array of projection records. Reads go through an
//! in-memory copy; every successful create or update is written back.

use std::fs;
use std::path::PathBuf;

use payproj_core::{
    NewProjection, ProjectionFilter, ProjectionId, ProjectionPatch, ProjectionRecord,
    ProjectionSource, SourceError,
};
use payproj_grid::MemorySource;
use tracing::debug;

pub struct JsonFileSource {
    path: PathBuf,
    inner: MemorySource,
}

impl JsonFileSource {
    /// Open a data file; a missing file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let path = path.into();
        let records = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            parse_records(&contents)?
        } else {
            Vec::new()
        };
        debug!(path = %path.display(), count = records.len(), "opened data file");
        Ok(Self {
            path,
            inner: MemorySource::with_records(records),
        })
    }

    fn save(&self) -> Result<(), SourceError> {
        let json = serde_json::to_string_pretty(&self.inner.snapshot())
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Parse and validate a JSON array of records
pub fn parse_records(contents: &str) -> Result<Vec<ProjectionRecord>, SourceError> {
    let records: Vec<ProjectionRecord> =
        serde_json::from_str(contents).map_err(|e| SourceError::Parse(e.to_string()))?;
    for record in &records {
        record.validate()?;
    }
    Ok(records)
}

impl ProjectionSource for JsonFileSource {
    fn fetch(&self, filter: &ProjectionFilter) -> Result<Vec<ProjectionRecord>, SourceError> {
        self.inner.fetch(filter)
    }

    fn create(&self, input: NewProjection) -> Result<ProjectionRecord, SourceError> {
        let record = self.inner.create(input)?;
        self.save()?;
        Ok(record)
    }

    fn update(
        &self,
        id: ProjectionId,
        patch: ProjectionPatch,
    ) -> Result<ProjectionRecord, SourceError> {
        let record = self.inner.update(id, patch)?;
        self.save()?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn parses_camel_case_records() {
        let records = parse_records(
            r#"[{"id": 1, "clientId": 7, "clientName": "Acme",
                 "projectedDate": "2024-06-03T00:00:00Z", "amount": "12.50",
                 "status": "OVERDUE"}]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].client_id, 7);
        assert_eq!(records[0].projected_date, date(2024, 6, 3));
        assert_eq!(records[0].amount, dec!(12.50));
    }

    #[test]
    fn rejects_negative_amounts() {
        let err = parse_records(
            r#"[{"id": 1, "clientId": 7, "projectedDate": "2024-06-03", "amount": "-1"}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, SourceError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(parse_records("{"), Err(SourceError::Parse(_))));
    }

    #[test]
    fn writes_back_after_create_and_update() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projections.json");

        let source = JsonFileSource::open(&path).unwrap();
        let created = source
            .create(NewProjection::new(3, date(2024, 6, 4), dec!(40)).client_name("Initech"))
            .unwrap();
        source
            .update(created.id, ProjectionPatch::new().amount(dec!(45)))
            .unwrap();

        let reopened = JsonFileSource::open(&path).unwrap();
        let all = reopened.fetch(&ProjectionFilter::new()).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].amount, dec!(45));
        assert_eq!(all[0].client_name, "Initech");
    }

    #[test]
    fn failed_update_does_not_touch_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projections.json");
        fs::write(&path, "[]").unwrap();

        let source = JsonFileSource::open(&path).unwrap();
        assert!(source.update(9, ProjectionPatch::new().amount(dec!(1))).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }
}
