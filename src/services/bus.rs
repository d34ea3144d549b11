use crate::{
    error::AppResult,
    models::{BusTimingRow, NearbyStop},
    services::cache::CacheService,
    utils::geo::BoundingBox,
};
use chrono::NaiveTime;
use sea_orm::{DatabaseConnection, FromQueryResult, Statement};

const CACHE_TTL_TIMINGS: u64 = 60; // 1 minute

pub struct BusService {
    db: DatabaseConnection,
    cache: Option<CacheService>,
}

impl BusService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db, cache: None }
    }

    pub fn with_cache(mut self, cache: CacheService) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Upcoming arrivals at a stop, soonest first.
    pub async fn timings(&self, stop_id: i32, after: NaiveTime) -> AppResult<Vec<BusTimingRow>> {
        let cache_key = timings_cache_key(stop_id, after);
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get::<Vec<BusTimingRow>>(&cache_key).await {
                return Ok(cached);
            }
        }

        let rows = BusTimingRow::find_by_statement(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT t.id AS timing_id, t.arrival_time, b.id AS bus_id, b.name AS bus_name, \
             b.trip_code, b.wheelchair_accessible \
             FROM bus_timings t \
             JOIN buses b ON b.id = t.bus_id \
             WHERE t.stop_id = $1 AND t.arrival_time >= $2 \
             ORDER BY t.arrival_time ASC",
            vec![stop_id.into(), after.into()],
        ))
        .all(&self.db)
        .await?;

        if let Some(cache) = &self.cache {
            cache.set(&cache_key, &rows, CACHE_TTL_TIMINGS).await;
        }

        Ok(rows)
    }

    /// Stops within `radius_m` meters of a point, nearest first. The bounding
    /// box prefilters on the lat/lon index; the haversine distance is then
    /// computed exactly in SQL and bounds the result.
    pub async fn nearby_stops(
        &self,
        latitude: f64,
        longitude: f64,
        radius_m: f64,
        city: Option<&str>,
    ) -> AppResult<Vec<NearbyStop>> {
        let radius_km = radius_m / 1000.0;
        let bbox = BoundingBox::around(latitude, longitude, radius_km);

        let mut sql = String::from(
            "SELECT id, stop_name, latitude, longitude, distance FROM ( \
             SELECT id, stop_name, latitude, longitude, \
             (6371 * acos(LEAST(1.0, \
             cos(radians($1)) * cos(radians(latitude)) * cos(radians(longitude) - radians($2)) + \
             sin(radians($1)) * sin(radians(latitude))))) AS distance \
             FROM bus_stops \
             WHERE latitude BETWEEN $3 AND $4 AND longitude BETWEEN $5 AND $6",
        );
        let mut values: Vec<sea_orm::Value> = vec![
            latitude.into(),
            longitude.into(),
            bbox.min_lat.into(),
            bbox.max_lat.into(),
            bbox.min_lon.into(),
            bbox.max_lon.into(),
        ];

        if let Some(city) = city {
            sql.push_str(" AND city = $7) s WHERE distance <= $8 ORDER BY distance ASC");
            values.push(city.to_string().into());
        } else {
            sql.push_str(") s WHERE distance <= $7 ORDER BY distance ASC");
        }
        values.push(radius_km.into());

        let stops = NearbyStop::find_by_statement(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            &sql,
            values,
        ))
        .all(&self.db)
        .await?;

        Ok(stops)
    }
}

/// Keyed to the minute so repeated polls within a minute share one entry.
fn timings_cache_key(stop_id: i32, after: NaiveTime) -> String {
    format!("bus_timings:{}:{}", stop_id, after.format("%H:%M"))
}

#[cfg(test)]
mod tests {
    use super::timings_cache_key;
    use chrono::NaiveTime;

    #[test]
    fn cache_key_truncates_to_the_minute() {
        let a = NaiveTime::from_hms_opt(14, 30, 5).unwrap();
        let b = NaiveTime::from_hms_opt(14, 30, 59).unwrap();
        assert_eq!(timings_cache_key(3, a), "bus_timings:3:14:30");
        assert_eq!(timings_cache_key(3, a), timings_cache_key(3, b));
    }

    #[test]
    fn cache_key_separates_stops() {
        let t = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_ne!(timings_cache_key(1, t), timings_cache_key(2, t));
    }
}
