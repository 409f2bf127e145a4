//! Spherical-earth geometry.
//!
//! Storm tracks are short relative to the planet, so a spherical model is
//! accurate to well under a percent for the distances involved:
//!
//! - haversine great-circle distance
//! - initial bearing (clockwise from north)
//! - the inverse destination-point step (used by the sample generator)
//!
//! All angles at the API boundary are degrees; radians stay internal.

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance (km) and initial bearing (degrees, [0, 360)) from
/// point 1 to point 2.
///
/// Total over finite inputs: coincident points yield distance 0 and bearing 0
/// (the two-argument arctangent of (0, 0)), never an error.
pub fn distance_and_bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> (f64, f64) {
    (
        haversine_km(lat1, lon1, lat2, lon2),
        initial_bearing_deg(lat1, lon1, lat2, lon2),
    )
}

/// Haversine distance in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Initial bearing in degrees, normalized into [0, 360) by adding a full turn
/// before the modulo.
pub fn initial_bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dlambda = (lon2 - lon1).to_radians();

    let x = dlambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();

    (x.atan2(y).to_degrees() + 360.0) % 360.0
}

/// The point reached by travelling `distance_km` from (`lat`, `lon`) along an
/// initial bearing of `bearing_deg`. Longitude is wrapped into [-180, 180].
pub fn destination_point(lat: f64, lon: f64, bearing_deg: f64, distance_km: f64) -> (f64, f64) {
    let phi1 = lat.to_radians();
    let lambda1 = lon.to_radians();
    let theta = bearing_deg.to_radians();
    let delta = distance_km / EARTH_RADIUS_KM;

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    let lat2 = phi2.to_degrees();
    let lon2 = (lambda2.to_degrees() + 540.0) % 360.0 - 180.0;
    (lat2, lon2)
}
