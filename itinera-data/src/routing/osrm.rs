//! Wire types for the OSRM Table service.
//!
//! A request for `n` coordinates yields `n × n` tables keyed by source then
//! destination. Durations are always requested; distances only when the
//! `annotations` parameter names them, and older servers ignore that, so the
//! distance table is optional.
//!
//! Reference: <http://project-osrm.org/docs/v5.24.0/api/#table-service>

use serde::Deserialize;

use itinera_core::TravelTimeError;

/// Status OSRM reports for a successful request.
const STATUS_OK: &str = "Ok";

/// Decoded body of a `/table/v1` response.
#[derive(Debug, Deserialize)]
pub struct TableResponse {
    /// `"Ok"` on success, otherwise an OSRM error code such as
    /// `"InvalidQuery"` or `"NoTable"`.
    pub code: String,

    /// Human-readable reason accompanying a failure code.
    pub message: Option<String>,

    /// Seconds from source row to destination column; `null` when no route
    /// exists.
    pub durations: Option<Vec<Vec<Option<f64>>>>,

    /// Metres from source row to destination column.
    #[serde(default)]
    pub distances: Option<Vec<Vec<Option<f64>>>>,
}

impl TableResponse {
    /// Whether OSRM reported success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == STATUS_OK
    }

    /// Validate the status and extract the tables.
    ///
    /// # Errors
    ///
    /// [`TravelTimeError::ServiceError`] for a failure code and
    /// [`TravelTimeError::ParseError`] when a successful response carries no
    /// durations.
    pub fn into_tables(self) -> Result<Tables, TravelTimeError> {
        if !self.is_ok() {
            return Err(TravelTimeError::ServiceError {
                code: self.code,
                message: self.message.unwrap_or_default(),
            });
        }
        let durations = self.durations.ok_or_else(|| TravelTimeError::ParseError {
            message: "OSRM response missing durations array".to_owned(),
        })?;
        Ok(Tables {
            durations,
            distances: self.distances.unwrap_or_default(),
        })
    }
}

/// Duration and distance tables of a successful response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    durations: Vec<Vec<Option<f64>>>,
    distances: Vec<Vec<Option<f64>>>,
}

impl Tables {
    /// Number of source rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.durations.len()
    }

    /// Whole seconds for `from → to`, or `None` when unroutable.
    ///
    /// Negative and non-finite values count as unroutable.
    #[must_use]
    pub fn duration_secs(&self, from: usize, to: usize) -> Option<u64> {
        cell(&self.durations, from, to).and_then(whole_units)
    }

    /// Whole metres for `from → to`, when OSRM supplied them.
    #[must_use]
    pub fn distance_meters(&self, from: usize, to: usize) -> Option<u64> {
        cell(&self.distances, from, to).and_then(whole_units)
    }

    /// Width of row `from`.
    #[must_use]
    pub fn columns(&self, from: usize) -> usize {
        self.durations.get(from).map_or(0, Vec::len)
    }
}

fn cell(table: &[Vec<Option<f64>>], from: usize, to: usize) -> Option<f64> {
    table.get(from).and_then(|row| row.get(to)).copied().flatten()
}

/// Round a non-negative finite value to whole units.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is finite, non-negative and rounded before the cast"
)]
pub(crate) fn whole_units(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value.round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(json: &str) -> TableResponse {
        serde_json::from_str(json).expect("valid table JSON")
    }

    #[rstest]
    fn success_exposes_both_tables() {
        let tables = parse(
            r#"{"code":"Ok","durations":[[0.0,120.5],[118.0,0.0]],"distances":[[0.0,950.2],[940.0,0.0]]}"#,
        )
        .into_tables()
        .expect("successful response");

        assert_eq!(tables.rows(), 2);
        assert_eq!(tables.columns(1), 2);
        assert_eq!(tables.duration_secs(0, 1), Some(121));
        assert_eq!(tables.duration_secs(1, 0), Some(118));
        assert_eq!(tables.distance_meters(0, 1), Some(950));
    }

    #[rstest]
    fn failure_code_becomes_service_error() {
        let response = parse(r#"{"code":"InvalidQuery","message":"Coordinates are invalid"}"#);
        assert!(!response.is_ok());

        let err = response.into_tables().expect_err("failure code");
        assert_eq!(
            err,
            TravelTimeError::ServiceError {
                code: "InvalidQuery".to_owned(),
                message: "Coordinates are invalid".to_owned(),
            }
        );
    }

    #[rstest]
    fn ok_without_durations_is_a_parse_error() {
        let err = parse(r#"{"code":"Ok"}"#).into_tables().expect_err("no durations");
        assert!(matches!(err, TravelTimeError::ParseError { .. }));
    }

    #[rstest]
    fn nulls_and_missing_distances_read_as_absent() {
        let tables = parse(r#"{"code":"Ok","durations":[[0.0,null],[-3.0,0.0]]}"#)
            .into_tables()
            .expect("successful response");

        assert_eq!(tables.duration_secs(0, 1), None);
        assert_eq!(tables.duration_secs(1, 0), None);
        assert_eq!(tables.duration_secs(1, 1), Some(0));
        assert_eq!(tables.distance_meters(0, 0), None);
        assert_eq!(tables.duration_secs(5, 0), None);
    }

    #[rstest]
    #[case(12.49, Some(12))]
    #[case(12.5, Some(13))]
    #[case(-0.1, None)]
    #[case(f64::NAN, None)]
    #[case(f64::INFINITY, None)]
    fn whole_units_rounds_or_rejects(#[case] value: f64, #[case] expected: Option<u64>) {
        assert_eq!(whole_units(value), expected);
    }
}
