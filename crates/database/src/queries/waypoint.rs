use cycling::database::Result;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::data_model::waypoint::WaypointRow;

use super::convert_error;

pub async fn get_by_route_id<'c, E>(
    executor: E,
    route_id: Uuid,
) -> Result<Vec<WaypointRow>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id, route_id, ST_AsEWKB(location) AS location
        FROM
            waypoints
        WHERE route_id = $1
        ORDER BY id;
        ",
    )
    .bind(route_id)
    .fetch_all(executor)
    .await
    .map_err(convert_error)
}

pub async fn insert<'c, E>(executor: E, row: &WaypointRow) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "
        INSERT INTO waypoints(id, route_id, location)
        VALUES ($1, $2, ST_GeomFromEWKB($3));
        ",
    )
    .bind(row.id)
    .bind(row.route_id)
    .bind(&row.location)
    .execute(executor)
    .await
    .map_err(convert_error)?;
    Ok(())
}

pub async fn delete_by_route_id<'c, E>(executor: E, route_id: Uuid) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "
        DELETE FROM
            waypoints
        WHERE route_id = $1;
        ",
    )
    .bind(route_id)
    .execute(executor)
    .await
    .map_err(convert_error)?;
    Ok(())
}
