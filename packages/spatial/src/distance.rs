//! Haversine great-circle distance.

use trash_bin_map_record_models::Coordinate;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates in meters.
///
/// Callers must only pass coordinates that are actually present; there is
/// no error case. The haversine term is clamped to `[0, 1]` so rounding
/// cannot push antipodal points past the `atan2` domain.
#[must_use]
pub fn distance_m(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const CITY_HALL: Coordinate = Coordinate::new(37.5665, 126.978);

    #[test]
    fn same_point_is_zero() {
        assert!(distance_m(CITY_HALL, CITY_HALL).abs() < f64::EPSILON);
        let origin = Coordinate::new(0.0, 0.0);
        assert!(distance_m(origin, origin).abs() < f64::EPSILON);
    }

    #[test]
    fn is_symmetric() {
        let jamsil = Coordinate::new(37.5176, 127.1229);
        let there = distance_m(CITY_HALL, jamsil);
        let back = distance_m(jamsil, CITY_HALL);
        assert!((there - back).abs() < 1e-6);
    }

    #[test]
    fn one_kilometer_along_a_meridian() {
        // 1000 m of arc on a 6,371 km sphere.
        let delta_deg = (1000.0 / EARTH_RADIUS_M).to_degrees();
        let north = Coordinate::new(CITY_HALL.latitude + delta_deg, CITY_HALL.longitude);
        let d = distance_m(CITY_HALL, north);
        assert!((d - 1000.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn antipodal_points_are_half_the_circumference() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 180.0);
        let d = distance_m(a, b);
        let half = std::f64::consts::PI * EARTH_RADIUS_M;
        assert!((d - half).abs() < 1.0, "got {d}");
        assert!(d.is_finite());

        let pole = distance_m(Coordinate::new(90.0, 0.0), Coordinate::new(-90.0, 0.0));
        assert!((pole - half).abs() < 1.0, "got {pole}");
    }

    #[test]
    fn near_zero_distance_stays_stable() {
        let nudged = Coordinate::new(CITY_HALL.latitude + 1e-9, CITY_HALL.longitude);
        let d = distance_m(CITY_HALL, nudged);
        assert!(d > 0.0 && d < 0.001, "got {d}");
    }

    #[test]
    fn seoul_reference_distance() {
        // City Hall to (37.6000, 127.1000) is roughly 11-12 km.
        let d = distance_m(CITY_HALL, Coordinate::new(37.6, 127.1));
        assert!(d > 10_000.0 && d < 14_000.0, "got {d}");
    }
}
