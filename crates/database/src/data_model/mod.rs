use cycling::database::{DatabaseError, Result};
use model::{ewkb, geometry::Geometry};
use uuid::Uuid;

pub mod course_point;
pub mod route;
pub mod user;
pub mod waypoint;

/// Identifiers travel as strings through the domain and become UUIDs at
/// this boundary. A string that does not parse is a caller error, kept
/// distinct from "no such row".
pub(crate) fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| DatabaseError::InvalidId(raw.to_owned()))
}

pub(crate) fn decode_geometry(data: &[u8]) -> Result<Geometry> {
    ewkb::decode(data).map_err(DatabaseError::storage)
}

/// `NULL` geometry columns decode to no geometry rather than an error, so
/// legacy rows with unset locations still load.
pub(crate) fn decode_optional_geometry(
    column: Option<&[u8]>,
) -> Result<Option<Geometry>> {
    match column {
        Some(data) => decode_geometry(data).map(Some),
        None => Ok(None),
    }
}
