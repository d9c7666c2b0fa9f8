use model::{
    geometry::Geometry,
    route::{CoursePointInput, Route},
};
use utility::id::Id;

use crate::{
    database::{Database, RouteRepository, UserRepository},
    RequestError, RequestResult,
};

/// The complete desired state of the route, children included. Updates
/// always submit the full child set; the persistence layer replaces the
/// stored children wholesale.
#[derive(Debug, Clone)]
pub struct UpdateRouteInput {
    pub id: String,
    pub external_id: String,
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
    pub course_points: Vec<CoursePointInput>,
    pub waypoints: Vec<Geometry>,
}

pub struct UpdateRouteUsecase<D: Database> {
    db: D,
}

impl<D: Database> UpdateRouteUsecase<D> {
    pub fn new(db: D) -> Self {
        UpdateRouteUsecase { db }
    }

    pub async fn update_route(&self, input: UpdateRouteInput) -> RequestResult<()> {
        let mut store = self.db.auto();
        let user = store.get_user_by_external_id(&input.external_id).await?;

        let id: Id<Route> = Id::new(input.id.clone());
        let mut route = store.get_route_by_id(&id).await?;

        if route.user_id() != user.id() {
            return Err(RequestError::Unauthorized);
        }

        route.update_basic_info(
            input.name,
            input.description,
            input.highlighted_photo_id,
            input.visibility,
        )?;
        route.update_route_geometry(
            input.distance,
            input.duration,
            input.elevation_gain,
            input.elevation_loss,
            input.path_geom,
            input.first_point,
            input.last_point,
        )?;

        route.clear_course_points_and_waypoints();
        for location in input.waypoints {
            route.add_waypoint(location)?;
        }
        for course_point in input.course_points {
            route.add_course_point(course_point)?;
        }

        self.db
            .run_in_transaction(move |store| {
                Box::pin(async move { store.update_route(&route).await })
            })
            .await?;
        Ok(())
    }
}
