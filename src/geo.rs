use serde::{Deserialize, Serialize};

/// Mean Earth radius in statute miles
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Miles per degree of latitude (and of longitude at the equator)
pub const MILES_PER_DEGREE: f64 = 69.0;

/// Latitude ceiling used for the longitude scale factor. cos(lat) vanishes
/// at the poles, so offsets are computed as if no closer than this.
pub const MAX_SCALE_LATITUDE: f64 = 89.9;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance to `other` in miles
    pub fn distance_miles(&self, other: &GeoPoint) -> f64 {
        haversine_miles(self.lat, self.lng, other.lat, other.lng)
    }

    /// Move this point by the given north/east offsets in miles.
    ///
    /// Latitude is clamped to [-90, 90] and longitude wrapped into [-180, 180).
    pub fn offset_miles(&self, north_miles: f64, east_miles: f64) -> GeoPoint {
        let scale_lat = self.lat.clamp(-MAX_SCALE_LATITUDE, MAX_SCALE_LATITUDE);
        let dlat = north_miles / MILES_PER_DEGREE;
        let dlng = east_miles / (MILES_PER_DEGREE * scale_lat.to_radians().cos());

        GeoPoint {
            lat: (self.lat + dlat).clamp(-90.0, 90.0),
            lng: wrap_longitude(self.lng + dlng),
        }
    }

    /// Key identifying the ~1.1km cell this point falls in (2 decimal places)
    pub fn bucket_key(&self) -> String {
        format!("{:.2},{:.2}", self.lat, self.lng)
    }
}

/// Haversine distance between two coordinates in miles
pub fn haversine_miles(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlng = (lng2 - lng1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

fn wrap_longitude(lng: f64) -> f64 {
    if (-180.0..180.0).contains(&lng) {
        lng
    } else {
        (lng + 180.0).rem_euclid(360.0) - 180.0
    }
}
