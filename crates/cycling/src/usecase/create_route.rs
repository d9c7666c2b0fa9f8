use model::{
    geometry::Geometry,
    route::{CoursePointInput, NewRoute, Route},
};

use crate::{
    database::{Database, RouteRepository, UserRepository},
    usecase::RouteOutput,
    RequestResult,
};

/// Everything needed to record a new route. Geometries arrive already
/// decoded from the wire format; `external_id` identifies the acting user
/// at the identity provider.
#[derive(Debug, Clone)]
pub struct CreateRouteInput {
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

pub struct CreateRouteUsecase<D: Database> {
    db: D,
}

impl<D: Database> CreateRouteUsecase<D> {
    pub fn new(db: D) -> Self {
        CreateRouteUsecase { db }
    }

    /// Builds and validates the aggregate fully in memory, then persists
    /// route and children in a single unit of work.
    pub async fn create_route(
        &self,
        input: CreateRouteInput,
    ) -> RequestResult<RouteOutput> {
        let mut store = self.db.auto();
        let user = store.get_user_by_external_id(&input.external_id).await?;

        let mut route = Route::new(NewRoute {
            user_id: user.id().clone(),
            name: input.name,
            description: input.description,
            highlighted_photo_id: input.highlighted_photo_id,
            distance: input.distance,
            duration: input.duration,
            elevation_gain: input.elevation_gain,
            elevation_loss: input.elevation_loss,
            path_geom: input.path_geom,
            first_point: input.first_point,
            last_point: input.last_point,
            visibility: input.visibility,
        })?;

        for location in input.waypoints {
            route.add_waypoint(location)?;
        }
        for course_point in input.course_points {
            route.add_course_point(course_point)?;
        }

        let route = self
            .db
            .run_in_transaction(move |store| {
                Box::pin(async move {
                    store.save_route(&route).await?;
                    Ok(route)
                })
            })
            .await?;

        Ok(RouteOutput::from_route(&route))
    }
}

#[cfg(test)]
mod tests {
    use model::ValidationError;

    use super::*;
    use crate::usecase::testing::*;
    use crate::RequestError;

    #[tokio::test]
    async fn create_persists_route_with_children() {
        let database = MemoryDatabase::with_user(sample_user("idp|1"));
        let usecase = CreateRouteUsecase::new(database.clone());

        let output = usecase
            .create_route(sample_create_input("idp|1"))
            .await
            .unwrap();

        assert_eq!(output.name, "Morning loop");
        // metrics come from the course points, not the request
        assert_eq!(output.distance, 1200.0);
        assert_eq!(output.duration, 200);
        assert_eq!(output.course_points.len(), 2);
        assert_eq!(output.course_points[0].step_order, 0);
        assert_eq!(output.course_points[1].step_order, 1);
        assert_eq!(output.waypoints.len(), 1);

        let stored = database.snapshot();
        assert_eq!(stored.routes.len(), 1);
        assert_eq!(stored.routes[0].course_points().len(), 2);
    }

    #[tokio::test]
    async fn create_fails_for_unknown_user() {
        let database = MemoryDatabase::with_user(sample_user("idp|1"));
        let usecase = CreateRouteUsecase::new(database.clone());

        let result = usecase.create_route(sample_create_input("idp|other")).await;
        assert!(matches!(result, Err(RequestError::NotFound)));
        assert!(database.snapshot().routes.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_invalid_course_points_before_any_write() {
        let database = MemoryDatabase::with_user(sample_user("idp|1"));
        let usecase = CreateRouteUsecase::new(database.clone());

        let mut input = sample_create_input("idp|1");
        input.course_points[1].location = Some(sample_path());
        let result = usecase.create_route(input).await;

        assert!(matches!(
            result,
            Err(RequestError::Validation(
                ValidationError::WrongGeometryKind { .. }
            ))
        ));
        assert!(database.snapshot().routes.is_empty());
    }
}
