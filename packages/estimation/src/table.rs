//! Immutable snapshot of the loaded case table and per-area curve
//! extraction.

use std::collections::BTreeSet;

use corona_stats_cases_models::{AreaRecord, Curve, Measurement};

use crate::EstimationError;

/// The full case table as loaded from the source.
///
/// Built once per load and never mutated; share it behind an `Arc` and
/// swap the whole snapshot on refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseTable {
    records: Vec<AreaRecord>,
}

impl CaseTable {
    /// Wraps the given rows. Row order is kept and used to break date ties.
    #[must_use]
    pub const fn new(records: Vec<AreaRecord>) -> Self {
        Self { records }
    }

    /// All rows in source order.
    #[must_use]
    pub fn records(&self) -> &[AreaRecord] {
        &self.records
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct area types, sorted.
    #[must_use]
    pub fn list_area_types(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.area_type.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Distinct area names of one area type, sorted. Matching is
    /// case-sensitive.
    #[must_use]
    pub fn list_areas(&self, area_type: &str) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.area_type == area_type)
            .map(|r| r.area_name.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Builds the date-ordered curve for one area.
    ///
    /// Rows are matched exactly on `area_type` and `area_name`, then
    /// stable-sorted by specimen date. When a date appears more than once
    /// the row that comes last in the source wins and the others are
    /// dropped with a warning.
    ///
    /// Each count gets a Poisson error of `sqrt(max(count, 0))`, so a
    /// negative revision keeps its value with zero error.
    ///
    /// # Errors
    ///
    /// Returns [`EstimationError::EmptySelection`] if no row matches.
    pub fn extract(&self, area_type: &str, area_name: &str) -> Result<Curve, EstimationError> {
        let mut rows: Vec<&AreaRecord> = self
            .records
            .iter()
            .filter(|r| r.area_type == area_type && r.area_name == area_name)
            .collect();

        if rows.is_empty() {
            return Err(EstimationError::EmptySelection {
                area_type: area_type.to_string(),
                area_name: Some(area_name.to_string()),
            });
        }

        rows.sort_by_key(|r| r.specimen_date);

        let mut kept: Vec<&AreaRecord> = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(last) = kept.last_mut()
                && last.specimen_date == row.specimen_date
            {
                log::warn!(
                    "Duplicate row for {area_type} '{area_name}' on {}; keeping the later one",
                    row.specimen_date
                );
                *last = row;
            } else {
                kept.push(row);
            }
        }

        log::debug!(
            "Extracted {} dates for {area_type} '{area_name}'",
            kept.len()
        );

        #[allow(clippy::cast_precision_loss)]
        let (daily, cumulative): (Vec<Measurement>, Vec<Measurement>) = kept
            .iter()
            .map(|r| {
                (
                    Measurement::from_count(r.daily_count as f64),
                    Measurement::from_count(r.cumulative_count as f64),
                )
            })
            .unzip();

        Ok(Curve::from_parts(
            kept.iter().map(|r| r.specimen_date).collect(),
            daily.iter().map(|m| m.value).collect(),
            daily.iter().map(|m| m.error).collect(),
            cumulative.iter().map(|m| m.value).collect(),
            cumulative.iter().map(|m| m.error).collect(),
        )?)
    }
}

impl From<Vec<AreaRecord>> for CaseTable {
    fn from(records: Vec<AreaRecord>) -> Self {
        Self::new(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{day, record, series};

    fn sample_table() -> CaseTable {
        CaseTable::new(vec![
            record("Region", "London", 2, 30, 60),
            record("Region", "London", 0, 10, 10),
            record("Nation", "England", 0, 100, 100),
            record("Region", "London", 1, 20, 30),
            record("Region", "North West", 0, 5, 5),
        ])
    }

    #[test]
    fn lists_area_types_and_areas() {
        let table = sample_table();
        assert_eq!(table.list_area_types(), vec!["Nation", "Region"]);
        assert_eq!(table.list_areas("Region"), vec!["London", "North West"]);
        assert!(table.list_areas("region").is_empty());
    }

    #[test]
    fn extract_sorts_by_date() {
        let curve = sample_table().extract("Region", "London").unwrap();
        assert_eq!(curve.dates(), &[day(0), day(1), day(2)]);
        assert_eq!(curve.daily(), &[10.0, 20.0, 30.0]);
        assert_eq!(curve.cumulative(), &[10.0, 30.0, 60.0]);
        assert!(curve.dates().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(curve.daily_err().len(), curve.len());
        assert_eq!(curve.cumulative_err().len(), curve.len());
    }

    #[test]
    fn extract_poisson_errors() {
        let curve = sample_table().extract("Nation", "England").unwrap();
        assert!((curve.daily_err()[0] - 10.0).abs() < f64::EPSILON);
        assert!((curve.cumulative_err()[0] - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn negative_revision_gets_zero_error() {
        let table = CaseTable::new(vec![
            record("Region", "London", 0, 4, 4),
            record("Region", "London", 1, -3, 1),
        ]);
        let curve = table.extract("Region", "London").unwrap();
        assert!((curve.daily()[1] + 3.0).abs() < f64::EPSILON);
        assert!(curve.daily_err()[1].abs() < f64::EPSILON);
        assert!(!curve.daily_err()[1].is_nan());
    }

    #[test]
    fn extract_is_case_sensitive() {
        let err = sample_table().extract("Region", "london").unwrap_err();
        assert!(matches!(err, EstimationError::EmptySelection { .. }));
    }

    #[test]
    fn unknown_area_is_empty_selection() {
        let err = sample_table().extract("Region", "Atlantis").unwrap_err();
        match err {
            EstimationError::EmptySelection {
                area_type,
                area_name,
            } => {
                assert_eq!(area_type, "Region");
                assert_eq!(area_name.as_deref(), Some("Atlantis"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_dates_keep_last_row() {
        let table = CaseTable::new(vec![
            record("Region", "London", 0, 10, 10),
            record("Region", "London", 1, 20, 30),
            record("Region", "London", 0, 12, 12),
        ]);
        let curve = table.extract("Region", "London").unwrap();
        assert_eq!(curve.dates(), &[day(0), day(1)]);
        assert_eq!(curve.daily(), &[12.0, 20.0]);
    }

    #[test]
    fn other_areas_do_not_leak() {
        let mut records = series("Region", "London", &[1, 2, 3]);
        records.extend(series("Region", "Wales", &[100, 200]));
        let curve = CaseTable::from(records).extract("Region", "Wales").unwrap();
        assert_eq!(curve.daily(), &[100.0, 200.0]);
    }
}
