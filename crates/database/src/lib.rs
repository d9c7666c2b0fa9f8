use std::{env, error::Error};

use async_trait::async_trait;
use cycling::database::{
    Database, DatabaseError, Result, RouteRepository, UserRepository,
};
use futures::future::BoxFuture;
use model::{route::Route, user::User};
use queries::convert_error;
use sqlx::{PgPool, Postgres, Transaction};
use utility::id::Id;

pub mod bbox;
pub mod data_model;
pub mod queries;

pub struct DatabaseConnectionInfo {
    pub username: String,
    pub password: String,
    pub hostname: String,
    pub port: u16,
    pub database: String,
}

impl DatabaseConnectionInfo {
    pub fn from_env() -> Option<Self> {
        let username = env::var("DATABASE_USER").ok()?;
        let password = env::var("DATABASE_PASSWORD").ok()?;
        let hostname = env::var("DATABASE_HOST").ok()?;
        let port: u16 = env::var("DATABASE_PORT").ok()?.parse().ok()?;
        let database = env::var("DATABASE_NAME").ok()?;
        Some(Self {
            username,
            password,
            hostname,
            port,
            database,
        })
    }

    fn postgres_url(self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.hostname, self.port, self.database
        )
    }
}

/// Postgres-backed store. Cloning shares the pool; every accessor checks a
/// connection out of it per operation or transaction.
#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub async fn connect(
        database_connection_info: DatabaseConnectionInfo,
    ) -> std::result::Result<Self, Box<dyn Error>> {
        let url = database_connection_info.postgres_url();
        let pool = PgPool::connect(&url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }
}

/// Store scoped to one unit of work. Only reachable inside the closure
/// passed to [`Database::run_in_transaction`], so the transaction cannot
/// leak across concurrent operations.
pub struct PgTransactionStore {
    tx: Transaction<'static, Postgres>,
}

/// Store that runs each operation on a connection checked out of the pool.
pub struct PgAutocommitStore {
    pool: PgPool,
}

#[async_trait]
impl Database for PgDatabase {
    type Transaction = PgTransactionStore;
    type Autocommit = PgAutocommitStore;

    fn auto(&self) -> PgAutocommitStore {
        PgAutocommitStore {
            pool: self.pool.clone(),
        }
    }

    async fn run_in_transaction<T, F>(&self, action: F) -> Result<T>
    where
        T: Send,
        F: for<'a> FnOnce(&'a mut PgTransactionStore) -> BoxFuture<'a, Result<T>>
            + Send,
    {
        let tx = self.pool.begin().await.map_err(convert_error)?;
        let mut store = PgTransactionStore { tx };

        match action(&mut store).await {
            Ok(value) => {
                store
                    .tx
                    .commit()
                    .await
                    .map_err(|why| DatabaseError::Commit(Box::new(why)))?;
                Ok(value)
            }
            Err(why) => {
                log::error!("db rollback: {}", why);
                match store.tx.rollback().await {
                    Ok(()) => Err(why),
                    Err(rollback) => Err(DatabaseError::Rollback {
                        source: Box::new(why),
                        rollback: Box::new(rollback),
                    }),
                }
            }
        }
    }
}

#[async_trait]
impl RouteRepository for PgTransactionStore {
    async fn get_route_by_id(&mut self, id: &Id<Route>) -> Result<Route> {
        queries::route::get(&mut self.tx, id).await
    }

    async fn get_routes_by_user_id(
        &mut self,
        user_id: &Id<User>,
    ) -> Result<Vec<Route>> {
        queries::route::get_all_by_user(&mut *self.tx, user_id).await
    }

    async fn count_routes_by_user_id(&mut self, user_id: &Id<User>) -> Result<i64> {
        queries::route::count_by_user(&mut *self.tx, user_id).await
    }

    async fn save_route(&mut self, route: &Route) -> Result<()> {
        queries::route::save(&mut self.tx, route).await
    }

    async fn update_route(&mut self, route: &Route) -> Result<()> {
        queries::route::update(&mut self.tx, route).await
    }

    async fn delete_route(&mut self, id: &Id<Route>) -> Result<()> {
        queries::route::delete(&mut *self.tx, id).await
    }
}

#[async_trait]
impl UserRepository for PgTransactionStore {
    async fn get_user_by_id(&mut self, id: &Id<User>) -> Result<User> {
        queries::user::get(&mut *self.tx, id).await
    }

    async fn get_user_by_external_id(&mut self, external_id: &str) -> Result<User> {
        queries::user::get_by_external_id(&mut *self.tx, external_id).await
    }

    async fn create_user(&mut self, user: &User) -> Result<()> {
        queries::user::insert(&mut *self.tx, user).await
    }
}

#[async_trait]
impl RouteRepository for PgAutocommitStore {
    async fn get_route_by_id(&mut self, id: &Id<Route>) -> Result<Route> {
        let mut conn = self.pool.acquire().await.map_err(convert_error)?;
        queries::route::get(&mut conn, id).await
    }

    async fn get_routes_by_user_id(
        &mut self,
        user_id: &Id<User>,
    ) -> Result<Vec<Route>> {
        queries::route::get_all_by_user(&self.pool, user_id).await
    }

    async fn count_routes_by_user_id(&mut self, user_id: &Id<User>) -> Result<i64> {
        queries::route::count_by_user(&self.pool, user_id).await
    }

    async fn save_route(&mut self, route: &Route) -> Result<()> {
        let mut conn = self.pool.acquire().await.map_err(convert_error)?;
        queries::route::save(&mut conn, route).await
    }

    async fn update_route(&mut self, route: &Route) -> Result<()> {
        let mut conn = self.pool.acquire().await.map_err(convert_error)?;
        queries::route::update(&mut conn, route).await
    }

    async fn delete_route(&mut self, id: &Id<Route>) -> Result<()> {
        queries::route::delete(&self.pool, id).await
    }
}

#[async_trait]
impl UserRepository for PgAutocommitStore {
    async fn get_user_by_id(&mut self, id: &Id<User>) -> Result<User> {
        queries::user::get(&self.pool, id).await
    }

    async fn get_user_by_external_id(&mut self, external_id: &str) -> Result<User> {
        queries::user::get_by_external_id(&self.pool, external_id).await
    }

    async fn create_user(&mut self, user: &User) -> Result<()> {
        queries::user::insert(&self.pool, user).await
    }
}
