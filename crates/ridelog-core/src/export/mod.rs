//! File sinks: coordinates JSON and aggregate CSVs.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::models::ride::EnrichedRide;
use crate::storage::{BucketStats, RideRow, RideStore, TimeBucket};

/// Start and end of one ride, each as `[latitude, longitude]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinatePair {
    pub start: [f64; 2],
    pub end: [f64; 2],
}

/// Coordinate pairs of every ride that has both ends geocoded.
pub fn coordinate_pairs(rides: &[EnrichedRide]) -> Vec<CoordinatePair> {
    rides
        .iter()
        .filter_map(|ride| match (ride.start_coordinates, ride.end_coordinates) {
            (Some(start), Some(end)) => Some(CoordinatePair {
                start: start.lat_lng(),
                end: end.lat_lng(),
            }),
            _ => None,
        })
        .collect()
}

/// Write the coordinate pairs as a JSON array. Returns the number written.
pub fn export_coordinates(rides: &[EnrichedRide], path: &Path) -> Result<usize> {
    let pairs = coordinate_pairs(rides);
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, &pairs)?;

    info!("Wrote {} coordinate pairs to {}", pairs.len(), path.display());
    Ok(pairs.len())
}

fn write_csv<T: Serialize>(rows: &[T], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write one bucket table as CSV.
pub fn write_bucket_csv(stats: &[BucketStats], path: &Path) -> Result<()> {
    write_csv(stats, path)
}

/// Write every stored ride with a known distance as CSV (price against
/// distance, one row per ride).
pub fn write_records_csv(rows: &[RideRow], path: &Path) -> Result<()> {
    write_csv(rows, path)
}

/// Write `totals.json`, one `by_<bucket>.csv` per time bucket and
/// `records.csv` into `dir`.
pub fn write_aggregate_report(store: &RideStore, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let totals_path = dir.join("totals.json");
    fs::write(&totals_path, serde_json::to_string_pretty(&store.totals()?)?)?;
    written.push(totals_path);

    for bucket in TimeBucket::ALL {
        let path = dir.join(format!("by_{}.csv", bucket));
        write_bucket_csv(&store.by_bucket(bucket)?, &path)?;
        written.push(path);
    }

    let records_path = dir.join("records.csv");
    write_records_csv(&store.records()?, &records_path)?;
    written.push(records_path);

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ride::{Coordinates, Field, ParsedRide};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn ride(coords: Option<(Coordinates, Coordinates)>) -> EnrichedRide {
        let parsed = ParsedRide::new(
            Field::Parsed("a".to_string()),
            Field::Parsed("b".to_string()),
            Field::Parsed(
                NaiveDate::from_ymd_opt(2012, 11, 25)
                    .unwrap()
                    .and_hms_opt(10, 7, 0)
                    .unwrap(),
            ),
            Some(12),
            0,
        );
        EnrichedRide {
            distance_m: coords.map(|_| 4000),
            start_coordinates: coords.map(|c| c.0),
            end_coordinates: coords.map(|c| c.1),
            ..EnrichedRide::unrouted(parsed)
        }
    }

    #[test]
    fn test_coordinates_are_lat_lng() {
        let rides = vec![
            ride(Some((Coordinates::new(-122.4, 37.7), Coordinates::new(-122.3, 37.6)))),
            ride(None),
        ];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coordinates.json");
        assert_eq!(export_coordinates(&rides, &path).unwrap(), 1);

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!([{"start": [37.7, -122.4], "end": [37.6, -122.3]}]));
    }

    #[test]
    fn test_aggregate_report() {
        let mut store = RideStore::open_in_memory().unwrap();
        store.rebuild(&[ride(Some((Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 1.0))))]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let written = write_aggregate_report(&store, dir.path()).unwrap();
        assert_eq!(written.len(), 6);

        let by_month = fs::read_to_string(dir.path().join("by_month.csv")).unwrap();
        let mut lines = by_month.lines();
        assert_eq!(
            lines.next(),
            Some("bucket,num_rides,total_distance,total_cost,avg_cost,avg_distance,cost_per_meter")
        );
        assert_eq!(lines.next(), Some("2012-11,1,4000,12,12.0,4000.0,0.003"));

        let records = fs::read_to_string(dir.path().join("records.csv")).unwrap();
        assert_eq!(
            records.lines().collect::<Vec<_>>(),
            vec!["distance,price,bonus,time", "4000,12,0,2012-11-25 10:07:00"]
        );
    }
}
