/*!
Local tangent plane <-> WGS84 conversion around a datum.

The Earth is treated as a sphere of radius [`EARTH_RADIUS_M`] centred on the
datum. A local point `(x, y)` (east, north, meters) is the endpoint of a
great-circle walk of length `hypot(x, y)` on bearing `atan2(x, y)`; the
inverse recovers distance (haversine) and initial bearing. The two
directions are exact inverses, so the round trip error is only floating
point noise.
 */
use crate::error::{Error, Result};

pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Origin of the local frame, WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Datum {
    pub latitude: f64,
    pub longitude: f64,
}

impl Datum {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Datum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lat {:.6} lon {:.6}", self.latitude, self.longitude)
    }
}

/// Meters east (`x`) and north (`y`) of the datum.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalPoint {
    pub x: f64,
    pub y: f64,
}

impl LocalPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &LocalPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// WGS84 degrees, in GeoJSON axis order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }

    pub fn to_position(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// Converts meters from the datum to WGS84 degrees.
pub fn to_wgs84(local: LocalPoint, datum: Datum) -> Result<GeoPoint> {
    check_datum(datum)?;
    let distance = local.x.hypot(local.y);
    if !distance.is_finite() {
        return Err(Error::DegenerateProjection(format!(
            "local point ({}, {}) is not finite",
            local.x, local.y
        )));
    }
    if distance == 0.0 {
        return Ok(GeoPoint::new(datum.longitude, datum.latitude));
    }
    let delta = distance / EARTH_RADIUS_M;
    if delta >= std::f64::consts::PI {
        return Err(Error::DegenerateProjection(format!(
            "displacement of {:.0} m reaches the antipode of the datum",
            distance
        )));
    }

    let lat1 = datum.latitude.to_radians();
    let lon1 = datum.longitude.to_radians();
    let bearing = local.x.atan2(local.y);

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    let geo = GeoPoint::new(normalize_longitude(lon2.to_degrees()), lat2.to_degrees());
    finite_or_fail(geo.longitude, geo.latitude, "WGS84")?;
    Ok(geo)
}

/// Converts WGS84 degrees to meters from the datum.
pub fn to_local(geo: GeoPoint, datum: Datum) -> Result<LocalPoint> {
    check_datum(datum)?;
    if !geo.longitude.is_finite() || !geo.latitude.is_finite() {
        return Err(Error::DegenerateProjection(format!(
            "position [{}, {}] is not finite",
            geo.longitude, geo.latitude
        )));
    }
    if geo.longitude == datum.longitude && geo.latitude == datum.latitude {
        return Ok(LocalPoint::default());
    }

    let lat1 = datum.latitude.to_radians();
    let lat2 = geo.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = wrap_pi((geo.longitude - datum.longitude).to_radians());

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let delta = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    let bearing = (dlon.sin() * lat2.cos())
        .atan2(lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos());

    let distance = EARTH_RADIUS_M * delta;
    let local = LocalPoint::new(distance * bearing.sin(), distance * bearing.cos());
    finite_or_fail(local.x, local.y, "local")?;
    Ok(local)
}

/// Distance in meters between `local` and its WGS84 round trip.
pub fn round_trip_error(local: LocalPoint, datum: Datum) -> Result<f64> {
    let back = to_local(to_wgs84(local, datum)?, datum)?;
    Ok(local.distance(&back))
}

/// Projection bound to one datum for the duration of a conversion.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    datum: Datum,
}

impl Projector {
    /// Fails for datums the projection cannot work around (poles, NaN).
    pub fn new(datum: Datum) -> Result<Self> {
        check_datum(datum)?;
        Ok(Self { datum })
    }

    pub fn datum(&self) -> Datum {
        self.datum
    }

    pub fn to_wgs84(&self, local: LocalPoint) -> Result<GeoPoint> {
        to_wgs84(local, self.datum)
    }

    pub fn to_local(&self, geo: GeoPoint) -> Result<LocalPoint> {
        to_local(geo, self.datum)
    }

    pub fn round_trip_error(&self, local: LocalPoint) -> Result<f64> {
        round_trip_error(local, self.datum)
    }
}

fn check_datum(datum: Datum) -> Result<()> {
    if !datum.latitude.is_finite() || !datum.longitude.is_finite() {
        return Err(Error::DegenerateProjection(format!(
            "datum {} is not finite",
            datum
        )));
    }
    if datum.latitude.abs() >= 90.0 {
        return Err(Error::DegenerateProjection(format!(
            "datum {} lies on or beyond a pole",
            datum
        )));
    }
    Ok(())
}

fn finite_or_fail(a: f64, b: f64, frame: &str) -> Result<()> {
    if a.is_finite() && b.is_finite() {
        Ok(())
    } else {
        Err(Error::DegenerateProjection(format!(
            "{} result ({}, {}) is not finite",
            frame, a, b
        )))
    }
}

fn normalize_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

fn wrap_pi(angle: f64) -> f64 {
    use std::f64::consts::PI;
    if (-PI..=PI).contains(&angle) {
        angle
    } else {
        (angle + PI).rem_euclid(2.0 * PI) - PI
    }
}
