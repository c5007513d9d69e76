//! Great-circle distance between two coordinates

/// Mean Earth radius in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between two (latitude, longitude) pairs in degrees
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Round to two decimal places for display
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(haversine_km((55.0478, -1.4827), (55.0478, -1.4827)), 0.0);
    }

    #[test]
    fn test_one_degree_of_longitude_on_equator() {
        let d = haversine_km((0.0, 0.0), (0.0, 1.0));
        assert!((d - 111.195).abs() < 0.01);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let whitley_bay = (55.0478, -1.4827);
        let london = (51.5152, -0.1449);
        let there = haversine_km(whitley_bay, london);
        let back = haversine_km(london, whitley_bay);
        assert!((there - back).abs() < 1e-9);
        // Roughly 400 km as the crow flies
        assert!(there > 390.0 && there < 410.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.3000000000000003), 1.3);
        assert_eq!(round2(2.346), 2.35);
        assert_eq!(round2(0.004), 0.0);
    }
}
