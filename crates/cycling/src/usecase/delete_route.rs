use model::route::Route;
use utility::id::Id;

use crate::{
    database::{Database, RouteRepository, UserRepository},
    RequestError, RequestResult,
};

pub struct DeleteRouteUsecase<D: Database> {
    db: D,
}

impl<D: Database> DeleteRouteUsecase<D> {
    pub fn new(db: D) -> Self {
        DeleteRouteUsecase { db }
    }

    /// Deletes a route as a unit. The storage layer cascades the delete to
    /// the route's course points and waypoints.
    pub async fn delete_route(
        &self,
        route_id: &str,
        external_id: &str,
    ) -> RequestResult<()> {
        let mut store = self.db.auto();
        let user = store.get_user_by_external_id(external_id).await?;

        let id: Id<Route> = Id::new(route_id.to_owned());
        let route = store.get_route_by_id(&id).await?;

        if route.user_id() != user.id() {
            return Err(RequestError::Unauthorized);
        }

        let id = route.id().clone();
        self.db
            .run_in_transaction(move |store| {
                Box::pin(async move { store.delete_route(&id).await })
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::create_route::CreateRouteUsecase;
    use crate::usecase::get_route::GetRouteUsecase;
    use crate::usecase::testing::*;

    #[tokio::test]
    async fn delete_removes_route_and_children() {
        let database = MemoryDatabase::with_user(sample_user("idp|1"));
        let created = CreateRouteUsecase::new(database.clone())
            .create_route(sample_create_input("idp|1"))
            .await
            .unwrap();

        DeleteRouteUsecase::new(database.clone())
            .delete_route(created.id.raw_ref(), "idp|1")
            .await
            .unwrap();

        assert!(database.snapshot().routes.is_empty());
        let after = GetRouteUsecase::new(database)
            .get_route_by_id(created.id.raw_ref())
            .await;
        assert!(matches!(after, Err(RequestError::NotFound)));
    }

    #[tokio::test]
    async fn delete_of_missing_route_is_not_found_without_side_effects() {
        let database = MemoryDatabase::with_user(sample_user("idp|1"));
        CreateRouteUsecase::new(database.clone())
            .create_route(sample_create_input("idp|1"))
            .await
            .unwrap();

        let result = DeleteRouteUsecase::new(database.clone())
            .delete_route("018f4e7c-0000-7000-8000-000000000000", "idp|1")
            .await;
        assert!(matches!(result, Err(RequestError::NotFound)));
        assert_eq!(database.snapshot().routes.len(), 1);
    }

    #[tokio::test]
    async fn delete_by_non_owner_is_unauthorized() {
        let database = MemoryDatabase::with_user(sample_user("idp|1"));
        let mut store = database.auto();
        store.create_user(&sample_user("idp|2")).await.unwrap();

        let created = CreateRouteUsecase::new(database.clone())
            .create_route(sample_create_input("idp|1"))
            .await
            .unwrap();

        let result = DeleteRouteUsecase::new(database.clone())
            .delete_route(created.id.raw_ref(), "idp|2")
            .await;
        assert!(matches!(result, Err(RequestError::Unauthorized)));
        assert_eq!(database.snapshot().routes.len(), 1);
    }
}
