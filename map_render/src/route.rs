//! Turns a telemetry CSV into a route map.
//!
//! The CSV carries a header row naming an `X` (longitude) and a `Y`
//! (latitude) column; any other columns are ignored. The rendered page is a
//! self-contained Leaflet map with the route drawn in file order.

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use thiserror::Error;

pub const X_COLUMN: &str = "X";
pub const Y_COLUMN: &str = "Y";
pub const ZOOM_START: u8 = 6;
const ROUTE_COLOR: &str = "red";

#[derive(Debug, Error, PartialEq)]
pub enum MapError {
    #[error("coordinate data is not UTF-8")]
    NotUtf8,
    #[error("coordinate data has no header row")]
    MissingHeader,
    #[error("malformed coordinate data: {0}")]
    Malformed(String),
    #[error("missing column {0}")]
    MissingColumn(&'static str),
    #[error("line {line}: cannot read {column} value {value:?}")]
    BadValue {
        line: usize,
        column: &'static str,
        value: String,
    },
    #[error("coordinate data has no rows")]
    NoPoints,
}

/// `[lat, lon]`, the order Leaflet expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng(pub f64, pub f64);

impl LatLng {
    pub fn lat(&self) -> f64 {
        self.0
    }

    pub fn lng(&self) -> f64 {
        self.1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Bounds {
    pub fn contains(&self, point: LatLng) -> bool {
        (self.south_west.lat()..=self.north_east.lat()).contains(&point.lat())
            && (self.south_west.lng()..=self.north_east.lng()).contains(&point.lng())
    }

    fn around(path: &[LatLng]) -> Option<Bounds> {
        let (first, rest) = path.split_first()?;
        let mut bounds = Bounds {
            south_west: *first,
            north_east: *first,
        };
        for p in rest {
            bounds.south_west = LatLng(bounds.south_west.lat().min(p.lat()), bounds.south_west.lng().min(p.lng()));
            bounds.north_east = LatLng(bounds.north_east.lat().max(p.lat()), bounds.north_east.lng().max(p.lng()));
        }
        Some(bounds)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteMap {
    pub center: LatLng,
    pub path: Vec<LatLng>,
    pub bounds: Bounds,
}

impl RouteMap {
    pub fn from_points(path: Vec<LatLng>) -> Result<RouteMap, MapError> {
        let bounds = Bounds::around(&path).ok_or(MapError::NoPoints)?;
        Ok(RouteMap {
            center: path[0],
            path,
            bounds,
        })
    }

    pub fn from_csv(data: &[u8]) -> Result<RouteMap, MapError> {
        let text = std::str::from_utf8(data).map_err(|_| MapError::NotUtf8)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let header = reader.headers().map_err(malformed)?;
        if header.iter().all(str::is_empty) {
            return Err(MapError::MissingHeader);
        }
        let x_idx = column_index(header, X_COLUMN)?;
        let y_idx = column_index(header, Y_COLUMN)?;

        let mut path = Vec::new();
        for row in reader.records() {
            let row = row.map_err(malformed)?;
            let line = row.position().map_or(0, |p| p.line() as usize);
            let x = parse_field(&row, x_idx, X_COLUMN, line)?;
            let y = parse_field(&row, y_idx, Y_COLUMN, line)?;
            path.push(LatLng(y, x));
        }
        RouteMap::from_points(path)
    }

    pub fn render_html(&self) -> Result<String, serde_json::Error> {
        let center = serde_json::to_string(&self.center)?;
        let path = serde_json::to_string(&self.path)?;
        let bounds = serde_json::to_string(&[self.bounds.south_west, self.bounds.north_east])?;
        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1.0"/>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css"/>
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map {{ width: 100%; height: 100%; margin: 0; padding: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map("map", {{ center: {center}, zoom: {zoom} }});
L.tileLayer("https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", {{
    maxZoom: 19,
    attribution: "&copy; OpenStreetMap contributors"
}}).addTo(map);
var route = L.polyline({path}, {{ color: "{color}" }}).addTo(map);
map.fitBounds({bounds});
</script>
</body>
</html>
"#,
            center = center,
            zoom = ZOOM_START,
            path = path,
            color = ROUTE_COLOR,
            bounds = bounds,
        ))
    }
}

fn malformed(err: csv::Error) -> MapError {
    MapError::Malformed(err.to_string())
}

fn column_index(header: &StringRecord, name: &'static str) -> Result<usize, MapError> {
    header.iter()
        .position(|c| c == name)
        .ok_or(MapError::MissingColumn(name))
}

fn parse_field(row: &StringRecord, idx: usize, column: &'static str, line: usize) -> Result<f64, MapError> {
    let raw = row.get(idx).unwrap_or_default();
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| MapError::BadValue {
            line,
            column,
            value: raw.to_string(),
        })
}
