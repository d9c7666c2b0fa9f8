use cycling::database::Result;
use model::{
    ewkb::{self, SRID_WGS84},
    route::Waypoint,
};
use sqlx::prelude::FromRow;
use utility::id::Id;
use uuid::Uuid;

use crate::data_model::{decode_geometry, parse_id};

/// Table: waypoints
#[derive(Debug, Clone, FromRow)]
pub struct WaypointRow {
    pub id: Uuid,
    pub route_id: Uuid,
    pub location: Vec<u8>,
}

impl WaypointRow {
    pub fn from_model(waypoint: &Waypoint) -> Result<WaypointRow> {
        Ok(WaypointRow {
            id: parse_id(waypoint.id().raw_ref())?,
            route_id: parse_id(waypoint.route_id().raw_ref())?,
            location: ewkb::encode(waypoint.location(), SRID_WGS84),
        })
    }

    pub fn to_model(self) -> Result<Waypoint> {
        let location = decode_geometry(&self.location)?;
        Ok(Waypoint::reconstruct(
            Id::new(self.id.to_string()),
            Id::new(self.route_id.to_string()),
            location,
        ))
    }
}
