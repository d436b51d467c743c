//! WGS-84 local-tangent-plane (NED) to geodetic coordinate conversion.
//!
//! The reference agent delegates this to a third-party coordinate library;
//! no equivalent crate appears anywhere in the corpus this project is
//! grounded on, so the flat-earth approximation used by that library for
//! short-range local-tangent-plane offsets (accurate to sub-millimeter for
//! the ≤1000 m ranges this agent actually flies) is reimplemented directly.

use crate::types::Origin;

/// WGS-84 semi-major axis, meters.
const WGS84_A: f64 = 6_378_137.0;
/// WGS-84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS-84 eccentricity squared.
const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Meridional and transverse radii of curvature at a given latitude.
fn radii_of_curvature(lat_rad: f64) -> (f64, f64) {
    let sin_lat = lat_rad.sin();
    let denom = (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let r_n = WGS84_A / denom; // transverse (prime vertical)
    let r_m = WGS84_A * (1.0 - WGS84_E2) / denom.powi(3); // meridional
    (r_m, r_n)
}

/// Convert a North-East-Down offset from `origin` into absolute geodetic
/// coordinates, returning `(latitude_deg, longitude_deg, altitude_msl_m)`.
///
/// `down` is meters below the origin; the returned altitude is therefore
/// `origin.altitude_msl_m - down`.
pub fn ned_to_geodetic(north: f64, east: f64, down: f64, origin: Origin) -> (f64, f64, f64) {
    let lat_rad = origin.latitude.to_radians();
    let (r_m, r_n) = radii_of_curvature(lat_rad);

    let dlat_rad = north / r_m;
    let dlon_rad = east / (r_n * lat_rad.cos());

    let lat = origin.latitude + dlat_rad.to_degrees();
    let lon = origin.longitude + dlon_rad.to_degrees();
    let alt_msl = origin.altitude_msl_m - down;

    (lat, lon, alt_msl)
}

/// Inverse of [`ned_to_geodetic`]: convert an absolute geodetic position back
/// into a North-East-Down offset from `origin`.
pub fn geodetic_to_ned(lat: f64, lon: f64, alt_msl: f64, origin: Origin) -> (f64, f64, f64) {
    let lat_rad = origin.latitude.to_radians();
    let (r_m, r_n) = radii_of_curvature(lat_rad);

    let dlat_rad = (lat - origin.latitude).to_radians();
    let dlon_rad = (lon - origin.longitude).to_radians();

    let north = dlat_rad * r_m;
    let east = dlon_rad * r_n * lat_rad.cos();
    let down = origin.altitude_msl_m - alt_msl;

    (north, east, down)
}

/// Haversine great-circle distance between two lat/lon pairs, meters.
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    use crate::config::defaults::EARTH_RADIUS_M;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = lat2_rad - lat1_rad;
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_M * c
}

/// 3-D distance combining horizontal Haversine distance with the absolute
/// altitude delta, as used by the `goto` arrival check.
pub fn distance_3d_m(lat1: f64, lon1: f64, alt1: f64, lat2: f64, lon2: f64, alt2: f64) -> f64 {
    let horizontal = haversine_distance_m(lat1, lon1, lat2, lon2);
    let vertical = (alt2 - alt1).abs();
    (horizontal * horizontal + vertical * vertical).sqrt()
}

/// Signed shortest angular distance from `current` to `target`, both in
/// degrees, wrapped to `(-180, 180]`. Used by the `yaw` monitor loop.
pub fn signed_heading_delta_deg(current: f64, target: f64) -> f64 {
    let mut delta = (target - current) % 360.0;
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta <= -180.0 {
        delta += 360.0;
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zurich_origin() -> Origin {
        Origin {
            latitude: 47.397_750_5,
            longitude: 8.545_607_2,
            altitude_msl_m: 488.0,
        }
    }

    #[test]
    fn test_ned_round_trip_within_one_millimeter() {
        let origin = zurich_origin();
        for (n, e, d) in [(0.0, 0.0, 0.0), (500.0, -300.0, -15.0), (1000.0, 1000.0, 50.0), (-1000.0, -1000.0, -1000.0)] {
            let (lat, lon, alt) = ned_to_geodetic(n, e, d, origin);
            let (n2, e2, d2) = geodetic_to_ned(lat, lon, alt, origin);
            assert!((n - n2).abs() < 0.001, "north drifted: {} vs {}", n, n2);
            assert!((e - e2).abs() < 0.001, "east drifted: {} vs {}", e, e2);
            assert!((d - d2).abs() < 0.001, "down drifted: {} vs {}", d, d2);
        }
    }

    #[test]
    fn test_down_negative_means_up() {
        let origin = zurich_origin();
        let (_, _, alt) = ned_to_geodetic(0.0, 0.0, -15.0, origin);
        assert!((alt - 503.0).abs() < 1e-9);
    }

    #[test]
    fn test_haversine_zero_distance() {
        assert!(haversine_distance_m(47.0, 8.0, 47.0, 8.0) < 1e-6);
    }

    #[test]
    fn test_distance_3d_combines_horizontal_and_vertical() {
        let d = distance_3d_m(0.0, 0.0, 100.0, 0.0, 0.0, 110.0);
        assert!((d - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_signed_heading_delta_wraps() {
        assert!((signed_heading_delta_deg(350.0, 10.0) - 20.0).abs() < 1e-9);
        assert!((signed_heading_delta_deg(10.0, 350.0) - (-20.0)).abs() < 1e-9);
        assert!((signed_heading_delta_deg(0.0, 180.0) - 180.0).abs() < 1e-9);
    }
}
