use cycling::database::Result;
use model::{
    ewkb::{self, SRID_WGS84},
    route::{CoursePoint, CoursePointRecord},
};
use sqlx::prelude::FromRow;
use utility::id::Id;
use uuid::Uuid;

use crate::data_model::{decode_optional_geometry, parse_id};

/// Table: course_points
#[derive(Debug, Clone, FromRow)]
pub struct CoursePointRow {
    pub id: Uuid,
    pub route_id: Uuid,
    pub step_order: i32,
    pub seg_dist_m: Option<f64>,
    pub cum_dist_m: Option<f64>,
    pub duration: Option<f64>,
    pub instruction: Option<String>,
    pub road_name: Option<String>,
    pub maneuver_type: Option<String>,
    pub modifier: Option<String>,
    pub location: Option<Vec<u8>>,
    pub bearing_before: Option<i32>,
    pub bearing_after: Option<i32>,
}

impl CoursePointRow {
    pub fn from_model(course_point: &CoursePoint) -> Result<CoursePointRow> {
        Ok(CoursePointRow {
            id: parse_id(course_point.id().raw_ref())?,
            route_id: parse_id(course_point.route_id().raw_ref())?,
            step_order: course_point.step_order(),
            seg_dist_m: course_point.seg_dist_m(),
            cum_dist_m: course_point.cum_dist_m(),
            duration: course_point.duration(),
            instruction: course_point.instruction().map(str::to_owned),
            road_name: course_point.road_name().map(str::to_owned),
            maneuver_type: course_point.maneuver_type().map(str::to_owned),
            modifier: course_point.modifier().map(str::to_owned),
            location: course_point
                .location()
                .map(|location| ewkb::encode(location, SRID_WGS84)),
            bearing_before: course_point.bearing_before(),
            bearing_after: course_point.bearing_after(),
        })
    }

    pub fn to_model(self) -> Result<CoursePoint> {
        let location = decode_optional_geometry(self.location.as_deref())?;
        Ok(CoursePoint::reconstruct(CoursePointRecord {
            id: Id::new(self.id.to_string()),
            route_id: Id::new(self.route_id.to_string()),
            step_order: self.step_order,
            seg_dist_m: self.seg_dist_m,
            cum_dist_m: self.cum_dist_m,
            duration: self.duration,
            instruction: self.instruction,
            road_name: self.road_name,
            maneuver_type: self.maneuver_type,
            modifier: self.modifier,
            location,
            bearing_before: self.bearing_before,
            bearing_after: self.bearing_after,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_location_column_loads_as_no_geometry() {
        let row = CoursePointRow {
            id: Uuid::now_v7(),
            route_id: Uuid::now_v7(),
            step_order: 0,
            seg_dist_m: None,
            cum_dist_m: None,
            duration: None,
            instruction: None,
            road_name: None,
            maneuver_type: None,
            modifier: None,
            location: None,
            bearing_before: None,
            bearing_after: None,
        };
        let course_point = row.to_model().unwrap();
        assert!(course_point.location().is_none());
    }
}
