use cycling::database::Result;
use model::user::User;
use sqlx::{Executor, Postgres};
use utility::id::Id;

use crate::data_model::{parse_id, user::UserRow};

use super::convert_error;

pub async fn get<'c, E>(executor: E, id: &Id<User>) -> Result<User>
where
    E: Executor<'c, Database = Postgres>,
{
    let user_id = parse_id(id.raw_ref())?;
    sqlx::query_as(
        "
        SELECT
            id, external_id, name, email, first_name, last_name
        FROM
            users
        WHERE id = $1;
        ",
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: UserRow| row.to_model())
}

pub async fn get_by_external_id<'c, E>(executor: E, external_id: &str) -> Result<User>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id, external_id, name, email, first_name, last_name
        FROM
            users
        WHERE external_id = $1;
        ",
    )
    .bind(external_id)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: UserRow| row.to_model())
}

pub async fn insert<'c, E>(executor: E, user: &User) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let row = UserRow::from_model(user)?;
    sqlx::query(
        "
        INSERT INTO users(id, external_id, name, email, first_name, last_name)
        VALUES ($1, $2, $3, $4, $5, $6);
        ",
    )
    .bind(row.id)
    .bind(&row.external_id)
    .bind(&row.name)
    .bind(&row.email)
    .bind(&row.first_name)
    .bind(&row.last_name)
    .execute(executor)
    .await
    .map_err(convert_error)?;
    Ok(())
}
