use chrono::{DateTime, Utc};
use cycling::database::Result;
use model::{
    ewkb::{self, SRID_WGS84},
    route::{Route, RouteRecord},
};
use sqlx::prelude::FromRow;
use utility::id::Id;
use uuid::Uuid;

use crate::{
    bbox,
    data_model::{decode_geometry, decode_optional_geometry, parse_id},
};

/// Table: routes
#[derive(Debug, Clone, FromRow)]
pub struct RouteRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub highlighted_photo_id: Option<i64>,
    pub distance: f64,
    pub duration: i32,
    pub elevation_gain: f64,
    pub elevation_loss: f64,
    pub path_geom: Vec<u8>,
    pub bbox: Option<Vec<u8>>,
    pub first_point: Vec<u8>,
    pub last_point: Vec<u8>,
    pub visibility: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RouteRow {
    /// Encodes the aggregate for storage. The bounding box is derived
    /// from the path geometry here, never taken from the aggregate.
    pub fn from_model(route: &Route) -> Result<RouteRow> {
        let bbox = bbox::calculate_bbox(route.path_geom());
        Ok(RouteRow {
            id: parse_id(route.id().raw_ref())?,
            user_id: parse_id(route.user_id().raw_ref())?,
            name: route.name().to_owned(),
            description: route.description().to_owned(),
            highlighted_photo_id: route.highlighted_photo_id(),
            distance: route.distance(),
            duration: route.duration(),
            elevation_gain: route.elevation_gain(),
            elevation_loss: route.elevation_loss(),
            path_geom: ewkb::encode(route.path_geom(), SRID_WGS84),
            bbox: Some(ewkb::encode(&bbox, SRID_WGS84)),
            first_point: ewkb::encode(route.first_point(), SRID_WGS84),
            last_point: ewkb::encode(route.last_point(), SRID_WGS84),
            visibility: route.visibility(),
            created_at: route.created_at(),
            updated_at: route.updated_at(),
        })
    }

    pub fn to_model(self) -> Result<Route> {
        let path_geom = decode_geometry(&self.path_geom)?;
        let bbox = decode_optional_geometry(self.bbox.as_deref())?;
        let first_point = decode_geometry(&self.first_point)?;
        let last_point = decode_geometry(&self.last_point)?;

        Ok(Route::reconstruct(RouteRecord {
            id: Id::new(self.id.to_string()),
            user_id: Id::new(self.user_id.to_string()),
            name: self.name,
            description: self.description,
            highlighted_photo_id: self.highlighted_photo_id,
            distance: self.distance,
            duration: self.duration,
            elevation_gain: self.elevation_gain,
            elevation_loss: self.elevation_loss,
            path_geom,
            bbox,
            first_point,
            last_point,
            visibility: self.visibility,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use cycling::database::DatabaseError;
    use geo::{LineString, Point};
    use model::{
        geometry::{Geometry, GeometryKind},
        route::{NewRoute, Route},
    };

    use super::*;

    fn sample_route() -> Route {
        Route::new(NewRoute {
            user_id: Id::new(Uuid::now_v7().to_string()),
            name: "Test Route".to_owned(),
            description: String::new(),
            highlighted_photo_id: None,
            distance: 100.0,
            duration: 600,
            elevation_gain: 10.0,
            elevation_loss: 5.0,
            path_geom: Geometry::LineString(LineString::from(vec![
                (139.7000, 35.6800),
                (139.7200, 35.6900),
            ])),
            first_point: Geometry::Point(Point::new(139.7000, 35.6800)),
            last_point: Geometry::Point(Point::new(139.7200, 35.6900)),
            visibility: 1,
        })
        .unwrap()
    }

    #[test]
    fn row_round_trip_derives_the_bbox() {
        let route = sample_route();
        let row = RouteRow::from_model(&route).unwrap();
        let loaded = row.to_model().unwrap();

        assert_eq!(loaded.id(), route.id());
        assert_eq!(loaded.user_id(), route.user_id());
        assert_eq!(loaded.path_geom(), route.path_geom());
        assert_eq!(loaded.first_point(), route.first_point());
        assert_eq!(loaded.last_point(), route.last_point());

        // the aggregate had no bbox; the row computed one from the path
        assert!(route.bbox().is_none());
        let bbox = loaded.bbox().expect("bbox derived at encode time");
        assert_eq!(bbox.kind(), GeometryKind::Polygon);
        assert_eq!(bbox, &bbox::calculate_bbox(route.path_geom()));
    }

    #[test]
    fn malformed_route_id_is_an_invalid_id_error() {
        let valid = sample_route();
        let route = Route::reconstruct(model::route::RouteRecord {
            id: Id::new("not-a-uuid".to_owned()),
            user_id: valid.user_id().clone(),
            name: "n".to_owned(),
            description: String::new(),
            highlighted_photo_id: None,
            distance: 0.0,
            duration: 0,
            elevation_gain: 0.0,
            elevation_loss: 0.0,
            path_geom: valid.path_geom().clone(),
            bbox: None,
            first_point: valid.first_point().clone(),
            last_point: valid.last_point().clone(),
            visibility: 0,
            created_at: valid.created_at(),
            updated_at: valid.updated_at(),
        });

        assert!(matches!(
            RouteRow::from_model(&route),
            Err(DatabaseError::InvalidId(_))
        ));
    }
}
