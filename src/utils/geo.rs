/// Prefilter box for the nearby-stops query, sized in degrees around a
/// point. One degree of latitude is ~111 km; a degree of longitude shrinks
/// with cos(latitude). The box deliberately over-covers — the exact
/// haversine distance in the query bounds the final result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn around(latitude: f64, longitude: f64, radius_km: f64) -> Self {
        let lat_delta = radius_km / 111.0;
        let lon_delta = radius_km / (111.0 * latitude.to_radians().cos());
        Self {
            min_lat: latitude - lat_delta,
            max_lat: latitude + lat_delta,
            min_lon: longitude - lon_delta,
            max_lon: longitude + lon_delta,
        }
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_lat
            && latitude <= self.max_lat
            && longitude >= self.min_lon
            && longitude <= self.max_lon
    }
}

#[cfg(test)]
mod tests {
    use super::BoundingBox;

    const EARTH_RADIUS_KM: f64 = 6371.0;

    fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
        let d_lat = (lat2 - lat1).to_radians();
        let d_lon = (lon2 - lon1).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }

    #[test]
    fn box_is_centered_on_the_point() {
        let bbox = BoundingBox::around(11.0, 77.0, 5.0);
        assert!((bbox.min_lat + bbox.max_lat) / 2.0 - 11.0 < 1e-9);
        assert!((bbox.min_lon + bbox.max_lon) / 2.0 - 77.0 < 1e-9);
    }

    #[test]
    fn lat_span_matches_radius() {
        // 111 km of radius is one degree of latitude either side.
        let bbox = BoundingBox::around(11.0, 77.0, 111.0);
        assert!((bbox.max_lat - bbox.min_lat - 2.0).abs() < 1e-9);
    }

    #[test]
    fn lon_span_widens_away_from_the_equator() {
        let equator = BoundingBox::around(0.0, 10.0, 10.0);
        let north = BoundingBox::around(60.0, 10.0, 10.0);
        let span = |b: &BoundingBox| b.max_lon - b.min_lon;

        // cos(60 deg) = 0.5, so the span doubles.
        assert!((span(&north) / span(&equator) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn box_covers_the_radius_circle() {
        let (lat, lon, radius_km) = (10.9, 76.9, 5.0);
        let bbox = BoundingBox::around(lat, lon, radius_km);

        // Points at the circle's extremes in each cardinal direction.
        for (dx, dy) in [(1.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (0.0, -1.0)] {
            let p_lat = lat + dy * radius_km / 111.0;
            let p_lon = lon + dx * radius_km / (111.0 * lat.to_radians().cos());
            assert!(bbox.contains(p_lat, p_lon));
            assert!(haversine_km(lat, lon, p_lat, p_lon) <= radius_km * 1.01);
        }
    }

    #[test]
    fn faraway_points_fall_outside() {
        let bbox = BoundingBox::around(10.9, 76.9, 5.0);
        assert!(!bbox.contains(11.9, 76.9));
        assert!(!bbox.contains(10.9, 78.9));
    }
}
