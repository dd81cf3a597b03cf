//! SQLite storage of rides and the aggregate queries run over them.

use std::path::Path;

use rusqlite::{params, Connection, Row};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::models::ride::EnrichedRide;

/// Timestamp layout stored in the `time` column; understood by `strftime`.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

type Result<T> = std::result::Result<T, StorageError>;

/// Time bucket for grouped statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    Month,
    Day,
    Hour,
    DayOfWeek,
}

impl TimeBucket {
    pub const ALL: [TimeBucket; 4] = [
        TimeBucket::Month,
        TimeBucket::Day,
        TimeBucket::Hour,
        TimeBucket::DayOfWeek,
    ];

    /// SQLite `strftime` format producing the bucket key.
    fn strftime(&self) -> &'static str {
        match self {
            TimeBucket::Month => "%Y-%m",
            TimeBucket::Day => "%Y-%m-%d",
            TimeBucket::Hour => "%H",
            TimeBucket::DayOfWeek => "%w",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TimeBucket::Month => "month",
            TimeBucket::Day => "day",
            TimeBucket::Hour => "hour",
            TimeBucket::DayOfWeek => "day_of_week",
        }
    }
}

impl std::fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Totals over every stored ride.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub num_rides: i64,
    pub total_cost: Option<i64>,
    pub total_distance: Option<i64>,
    pub avg_cost: Option<f64>,
    pub avg_distance: Option<f64>,
    pub cost_per_meter: Option<f64>,
}

/// Aggregates for one time bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketStats {
    pub bucket: String,
    pub num_rides: i64,
    pub total_distance: Option<i64>,
    pub total_cost: Option<i64>,
    pub avg_cost: Option<f64>,
    pub avg_distance: Option<f64>,
    pub cost_per_meter: Option<f64>,
}

/// One stored ride.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideRow {
    pub distance: Option<i64>,
    pub price: Option<i64>,
    pub bonus: i64,
    pub time: Option<String>,
}

/// Ride table in a SQLite database.
pub struct RideStore {
    conn: Connection,
}

impl RideStore {
    /// Open (or create) the database file.
    pub fn open(path: &Path) -> Result<Self> {
        debug!("Opening ride database {}", path.display());
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Replace the ride table with `rides`.
    pub fn rebuild(&mut self, rides: &[EnrichedRide]) -> Result<usize> {
        let tx = self.conn.transaction()?;

        tx.execute_batch(
            "DROP TABLE IF EXISTS rides;
             CREATE TABLE rides (distance INTEGER, price INTEGER, bonus INTEGER, time TEXT);",
        )?;

        {
            let mut stmt =
                tx.prepare("INSERT INTO rides (distance, price, bonus, time) VALUES (?1, ?2, ?3, ?4)")?;
            for ride in rides {
                let parsed = &ride.ride;
                let time = parsed
                    .timestamp()
                    .as_ref()
                    .parsed()
                    .map(|t| t.format(TIME_FORMAT).to_string());
                stmt.execute(params![
                    ride.distance_m.map(|d| d as i64),
                    parsed.price(),
                    parsed.bonus_credit(),
                    time,
                ])?;
            }
        }

        tx.commit()?;
        info!("Stored {} rides", rides.len());
        Ok(rides.len())
    }

    pub fn totals(&self) -> Result<Totals> {
        let totals = self.conn.query_row(
            "SELECT COUNT(*), SUM(price), SUM(distance), AVG(price), AVG(distance),
                    1.0 * SUM(price) / SUM(distance)
             FROM rides",
            [],
            |row| {
                Ok(Totals {
                    num_rides: row.get(0)?,
                    total_cost: row.get(1)?,
                    total_distance: row.get(2)?,
                    avg_cost: row.get(3)?,
                    avg_distance: row.get(4)?,
                    cost_per_meter: row.get(5)?,
                })
            },
        )?;
        Ok(totals)
    }

    /// Aggregates grouped by `bucket`, ordered by bucket key. Rides without
    /// a timestamp are left out.
    pub fn by_bucket(&self, bucket: TimeBucket) -> Result<Vec<BucketStats>> {
        let sql = format!(
            "SELECT STRFTIME('{}', time) AS bucket, COUNT(*), SUM(distance), SUM(price),
                    AVG(price), AVG(distance), 1.0 * SUM(price) / SUM(distance)
             FROM rides
             WHERE time IS NOT NULL
             GROUP BY bucket
             ORDER BY bucket",
            bucket.strftime()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], bucket_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Every ride with a known, non-zero distance.
    pub fn records(&self) -> Result<Vec<RideRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT distance, price, bonus, time FROM rides WHERE distance != 0 ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok(RideRow {
                distance: row.get(0)?,
                price: row.get(1)?,
                bonus: row.get(2)?,
                time: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn bucket_from_row(row: &Row<'_>) -> rusqlite::Result<BucketStats> {
    Ok(BucketStats {
        bucket: row.get(0)?,
        num_rides: row.get(1)?,
        total_distance: row.get(2)?,
        total_cost: row.get(3)?,
        avg_cost: row.get(4)?,
        avg_distance: row.get(5)?,
        cost_per_meter: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ride::{EnrichmentStatus, Field, ParsedRide};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn ride(ts: Option<(i32, u32, u32, u32)>, price: Option<u32>, bonus: u32, distance: Option<u64>) -> EnrichedRide {
        let timestamp: Field<_> = ts
            .map(|(y, m, d, h)| {
                NaiveDate::from_ymd_opt(y, m, d)
                    .unwrap()
                    .and_hms_opt(h, 15, 0)
                    .unwrap()
            })
            .into();
        let parsed = ParsedRide::new(
            Field::Parsed("a".to_string()),
            Field::Parsed("b".to_string()),
            timestamp,
            price,
            bonus,
        );
        EnrichedRide {
            distance_m: distance,
            enrichment: EnrichmentStatus::Routed,
            ..EnrichedRide::unrouted(parsed)
        }
    }

    fn store() -> RideStore {
        let mut store = RideStore::open_in_memory().unwrap();
        store
            .rebuild(&[
                // Sunday
                ride(Some((2012, 11, 25, 10)), Some(12), 0, Some(4000)),
                ride(Some((2012, 11, 25, 18)), Some(8), 2, Some(1000)),
                // Saturday
                ride(Some((2012, 12, 15, 10)), Some(20), 0, Some(5000)),
                ride(None, Some(5), 0, Some(0)),
                ride(Some((2012, 12, 16, 1)), None, 0, None),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_totals() {
        let totals = store().totals().unwrap();

        assert_eq!(totals.num_rides, 5);
        assert_eq!(totals.total_cost, Some(45));
        assert_eq!(totals.total_distance, Some(10000));
        assert_eq!(totals.avg_cost, Some(11.25));
        assert_eq!(totals.avg_distance, Some(2500.0));
        assert_eq!(totals.cost_per_meter, Some(0.0045));
    }

    #[test]
    fn test_by_month() {
        let months = store().by_bucket(TimeBucket::Month).unwrap();

        assert_eq!(months.len(), 2);
        assert_eq!(months[0].bucket, "2012-11");
        assert_eq!(months[0].num_rides, 2);
        assert_eq!(months[0].total_cost, Some(20));
        assert_eq!(months[0].total_distance, Some(5000));
        assert_eq!(months[1].bucket, "2012-12");
        assert_eq!(months[1].num_rides, 2);
        assert_eq!(months[1].total_cost, Some(20));
    }

    #[test]
    fn test_by_hour_and_weekday() {
        let store = store();

        let hours: Vec<(String, i64)> = store
            .by_bucket(TimeBucket::Hour)
            .unwrap()
            .into_iter()
            .map(|b| (b.bucket, b.num_rides))
            .collect();
        assert_eq!(
            hours,
            vec![("01".to_string(), 1), ("10".to_string(), 2), ("18".to_string(), 1)]
        );

        let weekdays: Vec<(String, i64)> = store
            .by_bucket(TimeBucket::DayOfWeek)
            .unwrap()
            .into_iter()
            .map(|b| (b.bucket, b.num_rides))
            .collect();
        assert_eq!(weekdays, vec![("0".to_string(), 3), ("6".to_string(), 1)]);
    }

    #[test]
    fn test_records_exclude_zero_and_missing_distance() {
        let records = store().records().unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].time.as_deref(), Some("2012-11-25 10:15:00"));
        assert_eq!(records[1].bonus, 2);
    }

    #[test]
    fn test_rebuild_replaces_rows() {
        let mut store = store();
        store.rebuild(&[ride(Some((2013, 1, 1, 9)), Some(7), 0, Some(700))]).unwrap();

        assert_eq!(store.totals().unwrap().num_rides, 1);
    }

    #[test]
    fn test_empty_table() {
        let mut store = RideStore::open_in_memory().unwrap();
        store.rebuild(&[]).unwrap();

        let totals = store.totals().unwrap();
        assert_eq!(totals.num_rides, 0);
        assert_eq!(totals.total_cost, None);
        assert!(store.by_bucket(TimeBucket::Day).unwrap().is_empty());
    }
}
