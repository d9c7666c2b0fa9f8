use std::{error, fmt, result};

use async_trait::async_trait;
use futures::future::BoxFuture;
use model::{
    route::Route,
    user::User,
};
use utility::id::Id;

/// Storage-layer failures. An unparseable identifier (`InvalidId`), a
/// well-formed identifier with no matching row (`NotFound`) and transport
/// or constraint failures (`Storage`) are never conflated.
#[derive(Debug)]
pub enum DatabaseError {
    NotFound,
    InvalidId(String),
    Storage(Box<dyn error::Error + Send + Sync>),
    Commit(Box<dyn error::Error + Send + Sync>),
    /// A rollback that itself failed. Keeps the original error visible
    /// next to the rollback failure instead of swallowing either.
    Rollback {
        source: Box<DatabaseError>,
        rollback: Box<dyn error::Error + Send + Sync>,
    },
}

impl DatabaseError {
    pub fn storage<E>(why: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        DatabaseError::Storage(Box::new(why))
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::NotFound => write!(f, "not found"),
            DatabaseError::InvalidId(id) => write!(f, "invalid identifier: {}", id),
            DatabaseError::Storage(why) => write!(f, "storage error: {}", why),
            DatabaseError::Commit(why) => write!(f, "commit failed: {}", why),
            DatabaseError::Rollback { source, rollback } => {
                write!(f, "tx error: {}, rollback error: {}", source, rollback)
            }
        }
    }
}

impl error::Error for DatabaseError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            DatabaseError::Storage(why) | DatabaseError::Commit(why) => {
                Some(why.as_ref())
            }
            DatabaseError::Rollback { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T> = result::Result<T, DatabaseError>;

/// Read/write surface of the route aggregate. `save_route` and
/// `update_route` persist the route row together with its full child
/// collections; callers that need atomicity run them through
/// [`Database::run_in_transaction`].
#[async_trait]
pub trait RouteRepository {
    /// Loads the route and both child collections, children ordered by
    /// their storage order.
    async fn get_route_by_id(&mut self, id: &Id<Route>) -> Result<Route>;

    /// Summary rows only; no children attached.
    async fn get_routes_by_user_id(&mut self, user_id: &Id<User>)
        -> Result<Vec<Route>>;

    async fn count_routes_by_user_id(&mut self, user_id: &Id<User>) -> Result<i64>;

    /// Inserts the route row, then all course points, then all waypoints.
    async fn save_route(&mut self, route: &Route) -> Result<()>;

    /// Updates the route row in place, then replaces the child rows with
    /// the route's current in-memory collections (delete, then re-insert).
    async fn update_route(&mut self, route: &Route) -> Result<()>;

    /// Deletes the route row; children are removed by the cascading
    /// relationship at the storage layer.
    async fn delete_route(&mut self, id: &Id<Route>) -> Result<()>;
}

#[async_trait]
pub trait UserRepository {
    async fn get_user_by_id(&mut self, id: &Id<User>) -> Result<User>;
    async fn get_user_by_external_id(&mut self, external_id: &str) -> Result<User>;
    async fn create_user(&mut self, user: &User) -> Result<()>;
}

pub trait DatabaseOperations: RouteRepository + UserRepository {}

impl<T: RouteRepository + UserRepository> DatabaseOperations for T {}

/// Handle to the backing store. Cloning is cheap; each clone shares the
/// underlying connection pool.
#[async_trait]
pub trait Database: Clone + Send + Sync {
    type Transaction: DatabaseOperations + Send;
    type Autocommit: DatabaseOperations + Send;

    /// An accessor that runs each operation on its own connection.
    fn auto(&self) -> Self::Autocommit;

    /// Runs `action` against a store scoped to a single unit of work.
    /// The unit of work is committed when `action` returns `Ok` (a commit
    /// failure surfaces as [`DatabaseError::Commit`]) and rolled back when
    /// it returns `Err`, in which case the original error is returned; a
    /// rollback failure is wrapped together with it. Nesting is not
    /// supported: writes that must be atomic together are sequenced
    /// inside one closure. The scoped store cannot outlive the closure.
    /// Dropping the returned future cancels the unit of work; nothing is
    /// committed in that case.
    async fn run_in_transaction<T, F>(&self, action: F) -> Result<T>
    where
        T: Send,
        F: for<'a> FnOnce(&'a mut Self::Transaction) -> BoxFuture<'a, Result<T>>
            + Send;
}
