//! Test helpers for composing itinerary files and stub routing.

use super::*;
use crate::optimize::{OptimizeConfig, ProviderFactory};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use itinera_core::test_support::UniformTravelTimeProvider;
use itinera_core::{Activity, Day, Itinerary, TravelCost, TravelTimeProvider};
use std::fs;
use tempfile::TempDir;

/// Write `contents` to `path`, panicking on failure.
pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path.as_std_path(), contents).expect("write test file");
}

/// Temporary directory exposed as a UTF-8 path.
pub(super) fn utf8_tempdir() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

/// One day in Paris with three located activities.
pub(super) fn sample_itinerary() -> Itinerary {
    let date = NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date");
    Itinerary::new(vec![Day::new(
        date,
        vec![
            Activity::new("orsay", "Musée d'Orsay")
                .with_coordinates(48.8600, 2.3266)
                .with_duration_minutes(90)
                .with_priority(3),
            Activity::new("louvre", "Louvre")
                .with_coordinates(48.8606, 2.3376)
                .with_duration_minutes(120)
                .with_priority(5),
            Activity::new("tower", "Eiffel Tower")
                .with_coordinates(48.8584, 2.2945)
                .with_duration_minutes(60)
                .with_priority(4),
        ],
    )])
}

/// Serialise `itinerary` to `path`.
pub(super) fn write_itinerary(path: &Utf8Path, itinerary: &Itinerary) {
    let payload = serde_json::to_vec_pretty(itinerary).expect("serialise itinerary");
    write_utf8(path, &payload);
}

/// Factory handing out a provider that prices every leg identically.
#[derive(Debug, Clone, Copy)]
pub(super) struct UniformProviderFactory {
    pub(super) cost: TravelCost,
}

impl Default for UniformProviderFactory {
    fn default() -> Self {
        Self {
            cost: TravelCost::from_secs(300, 800),
        }
    }
}

impl ProviderFactory for UniformProviderFactory {
    fn build(&self, _config: &OptimizeConfig) -> Result<Box<dyn TravelTimeProvider>, CliError> {
        Ok(Box::new(UniformTravelTimeProvider::new(self.cost)))
    }
}
