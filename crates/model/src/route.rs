use chrono::{DateTime, Utc};
use utility::id::{HasId, Id};
use uuid::Uuid;

use crate::{
    geometry::{Geometry, GeometryKind},
    user::User,
    ValidationError,
};

/// The route aggregate root. Holds the recorded path geometry together
/// with its two owned child collections. Invariants:
///
/// - `path_geom` is always a LineString, `first_point` and `last_point`
///   are always Points.
/// - `distance` and `duration` are the sums over the attached course
///   points and are recomputed on every append, never set directly.
/// - course-point `step_order` is a contiguous zero-based sequence
///   assigned at append time.
/// - the bounding box is derived from `path_geom` by the persistence
///   layer; the aggregate never computes or accepts one.
///
/// Mutators either fully succeed or leave the aggregate untouched.
#[derive(Debug, Clone)]
pub struct Route {
    id: Id<Route>,
    user_id: Id<User>,
    name: String,
    description: String,
    highlighted_photo_id: Option<i64>,
    distance: f64,
    duration: i32,
    elevation_gain: f64,
    elevation_loss: f64,
    path_geom: Geometry,
    bbox: Option<Geometry>,
    first_point: Geometry,
    last_point: Geometry,
    visibility: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    course_points: Vec<CoursePoint>,
    waypoints: Vec<Waypoint>,
}

impl HasId for Route {
    type IdType = String;
}

/// Arguments for [`Route::new`].
#[derive(Debug, Clone)]
pub struct NewRoute {
    pub user_id: Id<User>,
    pub name: String,
    pub description: String,
    pub highlighted_photo_id: Option<i64>,
    pub distance: f64,
    pub duration: i32,
    pub elevation_gain: f64,
    pub elevation_loss: f64,
    pub path_geom: Geometry,
    pub first_point: Geometry,
    pub last_point: Geometry,
    pub visibility: i16,
}

/// Trusted-data arguments for [`Route::reconstruct`], used when loading
/// rows that already passed validation on their way in.
#[derive(Debug, Clone)]
pub struct RouteRecord {
    pub id: Id<Route>,
    pub user_id: Id<User>,
    pub name: String,
    pub description: String,
    pub highlighted_photo_id: Option<i64>,
    pub distance: f64,
    pub duration: i32,
    pub elevation_gain: f64,
    pub elevation_loss: f64,
    pub path_geom: Geometry,
    pub bbox: Option<Geometry>,
    pub first_point: Geometry,
    pub last_point: Geometry,
    pub visibility: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A course point append request. `step_order` is deliberately absent:
/// ordering is assigned by the aggregate.
#[derive(Debug, Clone, Default)]
pub struct CoursePointInput {
    pub seg_dist_m: Option<f64>,
    pub cum_dist_m: Option<f64>,
    pub duration: Option<f64>,
    pub instruction: Option<String>,
    pub road_name: Option<String>,
    pub maneuver_type: Option<String>,
    pub modifier: Option<String>,
    pub location: Option<Geometry>,
    pub bearing_before: Option<i32>,
    pub bearing_after: Option<i32>,
}

impl Route {
    pub fn new(params: NewRoute) -> Result<Route, ValidationError> {
        if params.user_id.raw_ref::<str>().is_empty() {
            return Err(ValidationError::MissingField("userId"));
        }
        if params.name.is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        require_kind(&params.path_geom, "pathGeom", GeometryKind::LineString)?;
        require_kind(&params.first_point, "firstPoint", GeometryKind::Point)?;
        require_kind(&params.last_point, "lastPoint", GeometryKind::Point)?;
        if params.distance < 0.0 {
            return Err(ValidationError::NegativeValue("distance"));
        }
        if params.duration < 0 {
            return Err(ValidationError::NegativeValue("duration"));
        }

        let now = Utc::now();
        Ok(Route {
            id: generate_id(),
            user_id: params.user_id,
            name: params.name,
            description: params.description,
            highlighted_photo_id: params.highlighted_photo_id,
            distance: params.distance,
            duration: params.duration,
            elevation_gain: params.elevation_gain,
            elevation_loss: params.elevation_loss,
            path_geom: params.path_geom,
            bbox: None,
            first_point: params.first_point,
            last_point: params.last_point,
            visibility: params.visibility,
            created_at: now,
            updated_at: now,
            course_points: Vec::new(),
            waypoints: Vec::new(),
        })
    }

    /// Rebuilds a route from storage without generating a new identity or
    /// re-validating geometry shapes.
    pub fn reconstruct(record: RouteRecord) -> Route {
        Route {
            id: record.id,
            user_id: record.user_id,
            name: record.name,
            description: record.description,
            highlighted_photo_id: record.highlighted_photo_id,
            distance: record.distance,
            duration: record.duration,
            elevation_gain: record.elevation_gain,
            elevation_loss: record.elevation_loss,
            path_geom: record.path_geom,
            bbox: record.bbox,
            first_point: record.first_point,
            last_point: record.last_point,
            visibility: record.visibility,
            created_at: record.created_at,
            updated_at: record.updated_at,
            course_points: Vec::new(),
            waypoints: Vec::new(),
        }
    }

    /// Appends a course point. The step order is the current child count,
    /// so orders form a gapless zero-based sequence. Afterwards the route
    /// metrics are recomputed over all attached points, not just the new
    /// one, so a bad intermediate state cannot persist.
    pub fn add_course_point(
        &mut self,
        input: CoursePointInput,
    ) -> Result<(), ValidationError> {
        let location = input
            .location
            .ok_or(ValidationError::MissingField("location"))?;
        require_kind(&location, "location", GeometryKind::Point)?;

        let step_order = self.course_points.len() as i32;
        self.course_points.push(CoursePoint {
            id: generate_id(),
            route_id: self.id.clone(),
            step_order,
            seg_dist_m: input.seg_dist_m,
            cum_dist_m: input.cum_dist_m,
            duration: input.duration,
            instruction: input.instruction,
            road_name: input.road_name,
            maneuver_type: input.maneuver_type,
            modifier: input.modifier,
            location: Some(location),
            bearing_before: input.bearing_before,
            bearing_after: input.bearing_after,
        });

        self.recalculate_metrics();
        Ok(())
    }

    pub fn add_waypoint(&mut self, location: Geometry) -> Result<(), ValidationError> {
        require_kind(&location, "location", GeometryKind::Point)?;
        self.waypoints.push(Waypoint {
            id: generate_id(),
            route_id: self.id.clone(),
            location,
        });
        Ok(())
    }

    pub fn update_basic_info(
        &mut self,
        name: String,
        description: String,
        highlighted_photo_id: Option<i64>,
        visibility: i16,
    ) -> Result<(), ValidationError> {
        if name.is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        self.name = name;
        self.description = description;
        self.highlighted_photo_id = highlighted_photo_id;
        self.visibility = visibility;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Replaces the recorded geometry and metrics, with the same checks as
    /// construction. The bounding box is left alone; it is derived from
    /// the new path when the route is persisted.
    pub fn update_route_geometry(
        &mut self,
        distance: f64,
        duration: i32,
        elevation_gain: f64,
        elevation_loss: f64,
        path_geom: Geometry,
        first_point: Geometry,
        last_point: Geometry,
    ) -> Result<(), ValidationError> {
        require_kind(&path_geom, "pathGeom", GeometryKind::LineString)?;
        require_kind(&first_point, "firstPoint", GeometryKind::Point)?;
        require_kind(&last_point, "lastPoint", GeometryKind::Point)?;
        if distance < 0.0 {
            return Err(ValidationError::NegativeValue("distance"));
        }
        if duration < 0 {
            return Err(ValidationError::NegativeValue("duration"));
        }

        self.distance = distance;
        self.duration = duration;
        self.elevation_gain = elevation_gain;
        self.elevation_loss = elevation_loss;
        self.path_geom = path_geom;
        self.first_point = first_point;
        self.last_point = last_point;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Empties both child collections, ahead of a full re-population
    /// during an update flow.
    pub fn clear_course_points_and_waypoints(&mut self) {
        self.course_points.clear();
        self.waypoints.clear();
    }

    /// Reattaches course points fetched from storage. Repository use only;
    /// stored metrics are trusted and not recomputed here.
    pub fn attach_course_points(&mut self, course_points: Vec<CoursePoint>) {
        self.course_points = course_points;
    }

    /// Reattaches waypoints fetched from storage. Repository use only.
    pub fn attach_waypoints(&mut self, waypoints: Vec<Waypoint>) {
        self.waypoints = waypoints;
    }

    fn recalculate_metrics(&mut self) {
        if self.course_points.is_empty() {
            return;
        }

        let mut total_distance = 0.0;
        let mut total_duration = 0.0;
        for course_point in &self.course_points {
            total_distance += course_point.seg_dist_m.unwrap_or(0.0);
            total_duration += course_point.duration.unwrap_or(0.0);
        }
        self.distance = total_distance;
        self.duration = total_duration as i32;
    }

    pub fn id(&self) -> &Id<Route> {
        &self.id
    }

    pub fn user_id(&self) -> &Id<User> {
        &self.user_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn highlighted_photo_id(&self) -> Option<i64> {
        self.highlighted_photo_id
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn duration(&self) -> i32 {
        self.duration
    }

    pub fn elevation_gain(&self) -> f64 {
        self.elevation_gain
    }

    pub fn elevation_loss(&self) -> f64 {
        self.elevation_loss
    }

    pub fn path_geom(&self) -> &Geometry {
        &self.path_geom
    }

    pub fn bbox(&self) -> Option<&Geometry> {
        self.bbox.as_ref()
    }

    pub fn first_point(&self) -> &Geometry {
        &self.first_point
    }

    pub fn last_point(&self) -> &Geometry {
        &self.last_point
    }

    pub fn visibility(&self) -> i16 {
        self.visibility
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Immutable view of the attached course points, in step order.
    pub fn course_points(&self) -> &[CoursePoint] {
        &self.course_points
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }
}

fn require_kind(
    geometry: &Geometry,
    field: &'static str,
    expected: GeometryKind,
) -> Result<(), ValidationError> {
    if geometry.kind() != expected {
        return Err(ValidationError::WrongGeometryKind { field, expected });
    }
    Ok(())
}

fn generate_id<T>() -> Id<T>
where
    T: HasId<IdType = String>,
{
    Id::new(Uuid::now_v7().to_string())
}

/// A turn-by-turn instruction point owned by a route. Only constructible
/// through [`Route::add_course_point`] or, for trusted storage rows,
/// [`CoursePoint::reconstruct`].
#[derive(Debug, Clone)]
pub struct CoursePoint {
    id: Id<CoursePoint>,
    route_id: Id<Route>,
    step_order: i32,
    seg_dist_m: Option<f64>,
    cum_dist_m: Option<f64>,
    duration: Option<f64>,
    instruction: Option<String>,
    road_name: Option<String>,
    maneuver_type: Option<String>,
    modifier: Option<String>,
    location: Option<Geometry>,
    bearing_before: Option<i32>,
    bearing_after: Option<i32>,
}

impl HasId for CoursePoint {
    type IdType = String;
}

#[derive(Debug, Clone)]
pub struct CoursePointRecord {
    pub id: Id<CoursePoint>,
    pub route_id: Id<Route>,
    pub step_order: i32,
    pub seg_dist_m: Option<f64>,
    pub cum_dist_m: Option<f64>,
    pub duration: Option<f64>,
    pub instruction: Option<String>,
    pub road_name: Option<String>,
    pub maneuver_type: Option<String>,
    pub modifier: Option<String>,
    pub location: Option<Geometry>,
    pub bearing_before: Option<i32>,
    pub bearing_after: Option<i32>,
}

impl CoursePoint {
    pub fn reconstruct(record: CoursePointRecord) -> CoursePoint {
        CoursePoint {
            id: record.id,
            route_id: record.route_id,
            step_order: record.step_order,
            seg_dist_m: record.seg_dist_m,
            cum_dist_m: record.cum_dist_m,
            duration: record.duration,
            instruction: record.instruction,
            road_name: record.road_name,
            maneuver_type: record.maneuver_type,
            modifier: record.modifier,
            location: record.location,
            bearing_before: record.bearing_before,
            bearing_after: record.bearing_after,
        }
    }

    pub fn id(&self) -> &Id<CoursePoint> {
        &self.id
    }

    pub fn route_id(&self) -> &Id<Route> {
        &self.route_id
    }

    pub fn step_order(&self) -> i32 {
        self.step_order
    }

    pub fn seg_dist_m(&self) -> Option<f64> {
        self.seg_dist_m
    }

    pub fn cum_dist_m(&self) -> Option<f64> {
        self.cum_dist_m
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn instruction(&self) -> Option<&str> {
        self.instruction.as_deref()
    }

    pub fn road_name(&self) -> Option<&str> {
        self.road_name.as_deref()
    }

    pub fn maneuver_type(&self) -> Option<&str> {
        self.maneuver_type.as_deref()
    }

    pub fn modifier(&self) -> Option<&str> {
        self.modifier.as_deref()
    }

    pub fn location(&self) -> Option<&Geometry> {
        self.location.as_ref()
    }

    pub fn bearing_before(&self) -> Option<i32> {
        self.bearing_before
    }

    pub fn bearing_after(&self) -> Option<i32> {
        self.bearing_after
    }
}

/// A marked point of interest owned by a route.
#[derive(Debug, Clone)]
pub struct Waypoint {
    id: Id<Waypoint>,
    route_id: Id<Route>,
    location: Geometry,
}

impl HasId for Waypoint {
    type IdType = String;
}

impl Waypoint {
    pub fn reconstruct(
        id: Id<Waypoint>,
        route_id: Id<Route>,
        location: Geometry,
    ) -> Waypoint {
        Waypoint {
            id,
            route_id,
            location,
        }
    }

    pub fn id(&self) -> &Id<Waypoint> {
        &self.id
    }

    pub fn route_id(&self) -> &Id<Route> {
        &self.route_id
    }

    pub fn location(&self) -> &Geometry {
        &self.location
    }
}
