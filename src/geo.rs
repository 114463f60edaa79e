use crate::types::CityCountTable;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::Serialize;

/// Fixed reference coordinates (latitude, longitude) for plotting city counts.
pub static CITY_COORDINATES: Lazy<IndexMap<&'static str, (f64, f64)>> = Lazy::new(|| {
    IndexMap::from([
        ("Mumbai", (19.076, 72.8777)),
        ("Delhi", (28.7041, 77.1025)),
        ("Bengaluru", (12.9716, 77.5946)),
        ("Chennai", (13.0827, 80.2707)),
        ("Kolkata", (22.5726, 88.3639)),
        ("Hyderabad", (17.385, 78.4867)),
    ])
});

/// Map view the markers are laid out for.
pub const MAP_CENTER: (f64, f64) = (22.5, 78.9);
pub const MAP_ZOOM: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub count: u64,
    pub radius: f64,
}

pub fn coordinates_for(city: &str) -> Option<(f64, f64)> {
    CITY_COORDINATES.get(city).copied()
}

pub fn marker_radius(count: u64) -> f64 {
    (count as f64).sqrt() * 3.0
}

/// One marker per city with known coordinates, in table order. Unknown
/// cities are left off the map.
pub fn map_markers(by_city: &CityCountTable) -> Vec<MapMarker> {
    by_city
        .iter()
        .filter_map(|(city, count)| {
            let (latitude, longitude) = coordinates_for(city)?;
            Some(MapMarker {
                city: city.to_string(),
                latitude,
                longitude,
                count,
                radius: marker_radius(count),
            })
        })
        .collect()
}
