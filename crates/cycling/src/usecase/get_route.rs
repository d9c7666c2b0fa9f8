use model::{route::Route, user::User};
use utility::id::Id;

use crate::{
    database::{Database, RouteRepository},
    usecase::RouteOutput,
    RequestResult,
};

pub struct GetRouteUsecase<D: Database> {
    db: D,
}

impl<D: Database> GetRouteUsecase<D> {
    pub fn new(db: D) -> Self {
        GetRouteUsecase { db }
    }

    pub async fn get_route_by_id(&self, route_id: &str) -> RequestResult<RouteOutput> {
        let mut store = self.db.auto();
        let id: Id<Route> = Id::new(route_id.to_owned());
        let route = store.get_route_by_id(&id).await?;
        Ok(RouteOutput::from_route(&route))
    }

    pub async fn get_routes_by_user_id(
        &self,
        user_id: &str,
    ) -> RequestResult<Vec<RouteOutput>> {
        let mut store = self.db.auto();
        let id: Id<User> = Id::new(user_id.to_owned());
        let routes = store.get_routes_by_user_id(&id).await?;
        Ok(routes.iter().map(RouteOutput::from_route).collect())
    }

    pub async fn count_routes_by_user_id(&self, user_id: &str) -> RequestResult<i64> {
        let mut store = self.db.auto();
        let id: Id<User> = Id::new(user_id.to_owned());
        Ok(store.count_routes_by_user_id(&id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::create_route::CreateRouteUsecase;
    use crate::usecase::testing::*;
    use crate::RequestError;

    #[tokio::test]
    async fn get_by_id_returns_children_in_step_order() {
        let database = MemoryDatabase::with_user(sample_user("idp|1"));
        let created = CreateRouteUsecase::new(database.clone())
            .create_route(sample_create_input("idp|1"))
            .await
            .unwrap();

        let usecase = GetRouteUsecase::new(database);
        let output = usecase
            .get_route_by_id(created.id.raw_ref())
            .await
            .unwrap();

        assert_eq!(output.id, created.id);
        let orders: Vec<i32> = output
            .course_points
            .iter()
            .map(|course_point| course_point.step_order)
            .collect();
        assert_eq!(orders, vec![0, 1]);
    }

    #[tokio::test]
    async fn get_by_id_distinguishes_invalid_and_unknown_ids() {
        let database = MemoryDatabase::with_user(sample_user("idp|1"));
        let usecase = GetRouteUsecase::new(database);

        let invalid = usecase.get_route_by_id("not-a-uuid").await;
        assert!(matches!(invalid, Err(RequestError::InvalidId(_))));

        let unknown = usecase
            .get_route_by_id("018f4e7c-0000-7000-8000-000000000000")
            .await;
        assert!(matches!(unknown, Err(RequestError::NotFound)));
    }

    #[tokio::test]
    async fn listing_by_user_returns_summaries_without_children() {
        let database = MemoryDatabase::with_user(sample_user("idp|1"));
        let created = CreateRouteUsecase::new(database.clone())
            .create_route(sample_create_input("idp|1"))
            .await
            .unwrap();

        let usecase = GetRouteUsecase::new(database);
        let routes = usecase
            .get_routes_by_user_id(created.user_id.raw_ref())
            .await
            .unwrap();
        assert_eq!(routes.len(), 1);
        assert!(routes[0].course_points.is_empty());

        let count = usecase
            .count_routes_by_user_id(created.user_id.raw_ref())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
