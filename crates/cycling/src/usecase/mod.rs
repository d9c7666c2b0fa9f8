use chrono::{DateTime, Utc};
use model::{
    geometry::Geometry,
    route::{CoursePoint, Route, Waypoint},
    user::User,
};
use utility::id::Id;

pub mod create_route;
pub mod delete_route;
pub mod get_route;
pub mod update_route;

/// Route representation handed back to the request layer. Geometries are
/// still domain values here; encoding to GeoJSON text happens upstream.
#[derive(Debug, Clone)]
pub struct RouteOutput {
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
    pub course_points: Vec<CoursePointOutput>,
    pub waypoints: Vec<WaypointOutput>,
}

#[derive(Debug, Clone)]
pub struct CoursePointOutput {
    pub id: Id<CoursePoint>,
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

#[derive(Debug, Clone)]
pub struct WaypointOutput {
    pub id: Id<Waypoint>,
    pub location: Geometry,
}

impl RouteOutput {
    pub(crate) fn from_route(route: &Route) -> RouteOutput {
        let course_points = route
            .course_points()
            .iter()
            .map(|course_point| CoursePointOutput {
                id: course_point.id().clone(),
                step_order: course_point.step_order(),
                seg_dist_m: course_point.seg_dist_m(),
                cum_dist_m: course_point.cum_dist_m(),
                duration: course_point.duration(),
                instruction: course_point.instruction().map(str::to_owned),
                road_name: course_point.road_name().map(str::to_owned),
                maneuver_type: course_point.maneuver_type().map(str::to_owned),
                modifier: course_point.modifier().map(str::to_owned),
                location: course_point.location().cloned(),
                bearing_before: course_point.bearing_before(),
                bearing_after: course_point.bearing_after(),
            })
            .collect();
        let waypoints = route
            .waypoints()
            .iter()
            .map(|waypoint| WaypointOutput {
                id: waypoint.id().clone(),
                location: waypoint.location().clone(),
            })
            .collect();

        RouteOutput {
            id: route.id().clone(),
            user_id: route.user_id().clone(),
            name: route.name().to_owned(),
            description: route.description().to_owned(),
            highlighted_photo_id: route.highlighted_photo_id(),
            distance: route.distance(),
            duration: route.duration(),
            elevation_gain: route.elevation_gain(),
            elevation_loss: route.elevation_loss(),
            path_geom: route.path_geom().clone(),
            bbox: route.bbox().cloned(),
            first_point: route.first_point().clone(),
            last_point: route.last_point().clone(),
            visibility: route.visibility(),
            created_at: route.created_at(),
            updated_at: route.updated_at(),
            course_points,
            waypoints,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory store backing the use-case tests. Transactions work on a
    //! copy of the state that only replaces the shared state on success,
    //! which mirrors the all-or-nothing behavior of the real store.

    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use futures::future::BoxFuture;
    use geo::{LineString, Point};
    use model::{
        geometry::Geometry,
        route::{CoursePointInput, Route},
        user::User,
    };
    use utility::id::Id;
    use uuid::Uuid;

    use crate::database::{
        Database, DatabaseError, Result, RouteRepository, UserRepository,
    };
    use crate::usecase::create_route::CreateRouteInput;

    #[derive(Debug, Default, Clone)]
    pub struct State {
        pub users: Vec<User>,
        pub routes: Vec<Route>,
    }

    #[derive(Debug, Default, Clone)]
    pub struct MemoryDatabase {
        state: Arc<Mutex<State>>,
    }

    impl MemoryDatabase {
        pub fn with_user(user: User) -> MemoryDatabase {
            let database = MemoryDatabase::default();
            database.state.lock().unwrap().users.push(user);
            database
        }

        pub fn snapshot(&self) -> State {
            self.state.lock().unwrap().clone()
        }
    }

    pub struct MemoryStore {
        state: Arc<Mutex<State>>,
    }

    pub struct MemoryTransaction {
        state: State,
    }

    fn parse_id(raw: &str) -> Result<Uuid> {
        Uuid::parse_str(raw).map_err(|_| DatabaseError::InvalidId(raw.to_owned()))
    }

    fn get_route(state: &State, id: &Id<Route>) -> Result<Route> {
        parse_id(id.raw_ref())?;
        state
            .routes
            .iter()
            .find(|route| route.id() == id)
            .cloned()
            .ok_or(DatabaseError::NotFound)
    }

    fn get_routes_by_user(state: &State, user_id: &Id<User>) -> Vec<Route> {
        state
            .routes
            .iter()
            .filter(|route| route.user_id() == user_id)
            .map(|route| {
                // summaries carry no children
                let mut summary = route.clone();
                summary.clear_course_points_and_waypoints();
                summary
            })
            .collect()
    }

    fn save_route(state: &mut State, route: &Route) -> Result<()> {
        parse_id(route.id().raw_ref())?;
        if state.routes.iter().any(|existing| existing.id() == route.id()) {
            return Err(DatabaseError::Storage(
                "duplicate key value violates unique constraint".into(),
            ));
        }
        state.routes.push(route.clone());
        Ok(())
    }

    fn update_route(state: &mut State, route: &Route) -> Result<()> {
        parse_id(route.id().raw_ref())?;
        let position = state
            .routes
            .iter()
            .position(|existing| existing.id() == route.id())
            .ok_or(DatabaseError::NotFound)?;
        state.routes[position] = route.clone();
        Ok(())
    }

    fn delete_route(state: &mut State, id: &Id<Route>) -> Result<()> {
        parse_id(id.raw_ref())?;
        let before = state.routes.len();
        state.routes.retain(|route| route.id() != id);
        if state.routes.len() == before {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    fn get_user_by_external_id(state: &State, external_id: &str) -> Result<User> {
        state
            .users
            .iter()
            .find(|user| user.external_id() == external_id)
            .cloned()
            .ok_or(DatabaseError::NotFound)
    }

    fn get_user_by_id(state: &State, id: &Id<User>) -> Result<User> {
        state
            .users
            .iter()
            .find(|user| user.id() == id)
            .cloned()
            .ok_or(DatabaseError::NotFound)
    }

    #[async_trait]
    impl RouteRepository for MemoryStore {
        async fn get_route_by_id(&mut self, id: &Id<Route>) -> Result<Route> {
            get_route(&self.state.lock().unwrap(), id)
        }

        async fn get_routes_by_user_id(
            &mut self,
            user_id: &Id<User>,
        ) -> Result<Vec<Route>> {
            Ok(get_routes_by_user(&self.state.lock().unwrap(), user_id))
        }

        async fn count_routes_by_user_id(
            &mut self,
            user_id: &Id<User>,
        ) -> Result<i64> {
            Ok(get_routes_by_user(&self.state.lock().unwrap(), user_id).len()
                as i64)
        }

        async fn save_route(&mut self, route: &Route) -> Result<()> {
            save_route(&mut self.state.lock().unwrap(), route)
        }

        async fn update_route(&mut self, route: &Route) -> Result<()> {
            update_route(&mut self.state.lock().unwrap(), route)
        }

        async fn delete_route(&mut self, id: &Id<Route>) -> Result<()> {
            delete_route(&mut self.state.lock().unwrap(), id)
        }
    }

    #[async_trait]
    impl UserRepository for MemoryStore {
        async fn get_user_by_id(&mut self, id: &Id<User>) -> Result<User> {
            get_user_by_id(&self.state.lock().unwrap(), id)
        }

        async fn get_user_by_external_id(
            &mut self,
            external_id: &str,
        ) -> Result<User> {
            get_user_by_external_id(&self.state.lock().unwrap(), external_id)
        }

        async fn create_user(&mut self, user: &User) -> Result<()> {
            self.state.lock().unwrap().users.push(user.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl RouteRepository for MemoryTransaction {
        async fn get_route_by_id(&mut self, id: &Id<Route>) -> Result<Route> {
            get_route(&self.state, id)
        }

        async fn get_routes_by_user_id(
            &mut self,
            user_id: &Id<User>,
        ) -> Result<Vec<Route>> {
            Ok(get_routes_by_user(&self.state, user_id))
        }

        async fn count_routes_by_user_id(
            &mut self,
            user_id: &Id<User>,
        ) -> Result<i64> {
            Ok(get_routes_by_user(&self.state, user_id).len() as i64)
        }

        async fn save_route(&mut self, route: &Route) -> Result<()> {
            save_route(&mut self.state, route)
        }

        async fn update_route(&mut self, route: &Route) -> Result<()> {
            update_route(&mut self.state, route)
        }

        async fn delete_route(&mut self, id: &Id<Route>) -> Result<()> {
            delete_route(&mut self.state, id)
        }
    }

    #[async_trait]
    impl UserRepository for MemoryTransaction {
        async fn get_user_by_id(&mut self, id: &Id<User>) -> Result<User> {
            get_user_by_id(&self.state, id)
        }

        async fn get_user_by_external_id(
            &mut self,
            external_id: &str,
        ) -> Result<User> {
            get_user_by_external_id(&self.state, external_id)
        }

        async fn create_user(&mut self, user: &User) -> Result<()> {
            self.state.users.push(user.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl Database for MemoryDatabase {
        type Transaction = MemoryTransaction;
        type Autocommit = MemoryStore;

        fn auto(&self) -> MemoryStore {
            MemoryStore {
                state: self.state.clone(),
            }
        }

        async fn run_in_transaction<T, F>(&self, action: F) -> Result<T>
        where
            T: Send,
            F: for<'a> FnOnce(&'a mut MemoryTransaction) -> BoxFuture<'a, Result<T>>
                + Send,
        {
            let working = self.state.lock().unwrap().clone();
            let mut transaction = MemoryTransaction { state: working };
            match action(&mut transaction).await {
                Ok(value) => {
                    *self.state.lock().unwrap() = transaction.state;
                    Ok(value)
                }
                Err(why) => Err(why),
            }
        }
    }

    pub fn sample_user(external_id: &str) -> User {
        User::new(
            external_id.to_owned(),
            "rider".to_owned(),
            None,
            None,
            None,
        )
        .unwrap()
    }

    pub fn sample_point(x: f64, y: f64) -> Geometry {
        Geometry::Point(Point::new(x, y))
    }

    pub fn sample_path() -> Geometry {
        Geometry::LineString(LineString::from(vec![
            (139.7000, 35.6800),
            (139.7100, 35.6850),
            (139.7200, 35.6900),
        ]))
    }

    pub fn sample_create_input(external_id: &str) -> CreateRouteInput {
        CreateRouteInput {
            external_id: external_id.to_owned(),
            name: "Morning loop".to_owned(),
            description: "Along the river".to_owned(),
            highlighted_photo_id: None,
            distance: 0.0,
            duration: 0,
            elevation_gain: 12.0,
            elevation_loss: 8.0,
            path_geom: sample_path(),
            first_point: sample_point(139.7000, 35.6800),
            last_point: sample_point(139.7200, 35.6900),
            visibility: 1,
            course_points: vec![
                CoursePointInput {
                    seg_dist_m: Some(500.0),
                    duration: Some(90.0),
                    instruction: Some("turn left".to_owned()),
                    location: Some(sample_point(139.7050, 35.6820)),
                    ..Default::default()
                },
                CoursePointInput {
                    seg_dist_m: Some(700.0),
                    duration: Some(110.0),
                    location: Some(sample_point(139.7150, 35.6880)),
                    ..Default::default()
                },
            ],
            waypoints: vec![sample_point(139.7100, 35.6850)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use crate::database::{Database, DatabaseError, RouteRepository};
    use crate::usecase::create_route::CreateRouteUsecase;

    #[tokio::test]
    async fn failed_transaction_leaves_no_state_behind() {
        let database = MemoryDatabase::with_user(sample_user("idp|1"));
        let usecase = CreateRouteUsecase::new(database.clone());
        let created = usecase
            .create_route(sample_create_input("idp|1"))
            .await
            .unwrap();

        // saving the same route again inside one transaction first succeeds
        // on a fresh id and then violates the duplicate check; nothing from
        // the closure may stick.
        let mut existing = database
            .auto()
            .get_route_by_id(&created.id)
            .await
            .unwrap();
        existing.clear_course_points_and_waypoints();
        let fresh = model::route::Route::new(model::route::NewRoute {
            user_id: created.user_id.clone(),
            name: "other".to_owned(),
            description: String::new(),
            highlighted_photo_id: None,
            distance: 1.0,
            duration: 1,
            elevation_gain: 0.0,
            elevation_loss: 0.0,
            path_geom: sample_path(),
            first_point: sample_point(0.0, 0.0),
            last_point: sample_point(1.0, 1.0),
            visibility: 0,
        })
        .unwrap();

        let result = database
            .run_in_transaction(move |store| {
                Box::pin(async move {
                    store.save_route(&fresh).await?;
                    store.save_route(&existing).await?;
                    Ok(())
                })
            })
            .await;

        assert!(matches!(result, Err(DatabaseError::Storage(_))));
        // the fresh route from the aborted transaction must not exist
        assert_eq!(database.snapshot().routes.len(), 1);
    }
}
