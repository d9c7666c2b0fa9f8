use std::{error, fmt};

use geo::{Coord, LineString, Point, Polygon};
use geojson::{Feature, FeatureCollection, GeoJson};
use wkt::TryFromWkt;

/// A vector geometry as the domain understands it. Kept as a closed set of
/// variants so shape checks are exhaustive matches instead of downcasts.
/// No coordinate-reference metadata is carried here; the storage boundary
/// tags geometries with an SRID when encoding (see [`crate::ewkb`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point<f64>),
    LineString(LineString<f64>),
    Polygon(Polygon<f64>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryKind::Point => write!(f, "Point"),
            GeometryKind::LineString => write!(f, "LineString"),
            GeometryKind::Polygon => write!(f, "Polygon"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    MalformedGeoJson(String),
    MalformedWkt(String),
    MalformedEwkb(String),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::MalformedGeoJson(why) => {
                write!(f, "malformed GeoJSON: {}", why)
            }
            GeometryError::MalformedWkt(why) => write!(f, "malformed WKT: {}", why),
            GeometryError::MalformedEwkb(why) => write!(f, "malformed EWKB: {}", why),
        }
    }
}

impl error::Error for GeometryError {}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
        }
    }

    fn from_value(value: geojson::Value) -> Result<Self, GeometryError> {
        match value {
            geojson::Value::Point(position) => {
                Ok(Geometry::Point(Point::from(coord(&position)?)))
            }
            geojson::Value::LineString(positions) => {
                Ok(Geometry::LineString(line_string(&positions)?))
            }
            geojson::Value::Polygon(rings) => {
                let mut rings = rings.iter();
                let exterior = rings.next().ok_or_else(|| {
                    GeometryError::MalformedGeoJson(
                        "polygon has no rings".to_owned(),
                    )
                })?;
                let interiors = rings
                    .map(|ring| line_string(ring))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Geometry::Polygon(Polygon::new(
                    line_string(exterior)?,
                    interiors,
                )))
            }
            other => Err(GeometryError::MalformedGeoJson(format!(
                "unsupported geometry type: {}",
                other.type_name()
            ))),
        }
    }

    fn to_value(&self) -> geojson::Value {
        match self {
            Geometry::Point(point) => {
                geojson::Value::Point(vec![point.x(), point.y()])
            }
            Geometry::LineString(line) => {
                geojson::Value::LineString(positions(line))
            }
            Geometry::Polygon(polygon) => {
                let mut rings = vec![positions(polygon.exterior())];
                rings.extend(polygon.interiors().iter().map(positions));
                geojson::Value::Polygon(rings)
            }
        }
    }
}

fn coord(position: &[f64]) -> Result<Coord<f64>, GeometryError> {
    if position.len() < 2 {
        return Err(GeometryError::MalformedGeoJson(format!(
            "position has {} coordinates, expected at least 2",
            position.len()
        )));
    }
    Ok(Coord {
        x: position[0],
        y: position[1],
    })
}

fn line_string(positions: &[Vec<f64>]) -> Result<LineString<f64>, GeometryError> {
    positions
        .iter()
        .map(|position| coord(position))
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

fn positions(line: &LineString<f64>) -> Vec<Vec<f64>> {
    line.coords().map(|coord| vec![coord.x, coord.y]).collect()
}

/// Parses a geometry from GeoJSON text. Accepts a bare geometry, a feature
/// or a feature collection (the first feature is taken), matching what
/// [`to_geojson`] produces so the two round-trip.
pub fn from_geojson(text: &str) -> Result<Geometry, GeometryError> {
    let parsed: GeoJson = serde_json::from_str(text)
        .map_err(|why| GeometryError::MalformedGeoJson(why.to_string()))?;
    let geometry = match parsed {
        GeoJson::Geometry(geometry) => Some(geometry),
        GeoJson::Feature(feature) => feature.geometry,
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .next()
            .and_then(|feature| feature.geometry),
    };
    let geometry = geometry.ok_or_else(|| {
        GeometryError::MalformedGeoJson("no geometry found".to_owned())
    })?;
    Geometry::from_value(geometry.value)
}

/// Encodes a geometry as a single-feature GeoJSON feature collection, the
/// wire format handed to clients.
pub fn to_geojson(geometry: &Geometry) -> String {
    let feature = Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geometry.to_value())),
        id: None,
        properties: None,
        foreign_members: None,
    };
    GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features: vec![feature],
        foreign_members: None,
    })
    .to_string()
}

/// Absent geometries encode to an absent value, never an empty string.
pub fn to_geojson_opt(geometry: Option<&Geometry>) -> Option<String> {
    geometry.map(to_geojson)
}

/// Parses a geometry from WKT, tolerating a leading `SRID=<n>;` marker as
/// produced by PostGIS EWKT output.
pub fn from_wkt(text: &str) -> Result<Geometry, GeometryError> {
    let text = text.trim();
    let wkt_text = match text.split_once(';') {
        Some((prefix, rest))
            if prefix.trim().to_ascii_uppercase().starts_with("SRID=") =>
        {
            rest
        }
        _ => text,
    };
    let parsed: geo::Geometry<f64> = TryFromWkt::try_from_wkt_str(wkt_text)
        .map_err(|_| GeometryError::MalformedWkt(wkt_text.to_owned()))?;
    match parsed {
        geo::Geometry::Point(point) => Ok(Geometry::Point(point)),
        geo::Geometry::LineString(line) => Ok(Geometry::LineString(line)),
        geo::Geometry::Polygon(polygon) => Ok(Geometry::Polygon(polygon)),
        _ => Err(GeometryError::MalformedWkt(format!(
            "unsupported geometry type in: {}",
            wkt_text
        ))),
    }
}
