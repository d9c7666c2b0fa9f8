use cycling::database::Result;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::data_model::course_point::CoursePointRow;

use super::convert_error;

pub async fn get_by_route_id<'c, E>(
    executor: E,
    route_id: Uuid,
) -> Result<Vec<CoursePointRow>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id, route_id, step_order, seg_dist_m, cum_dist_m, duration,
            instruction, road_name, maneuver_type, modifier,
            ST_AsEWKB(location) AS location,
            bearing_before, bearing_after
        FROM
            course_points
        WHERE route_id = $1
        ORDER BY step_order;
        ",
    )
    .bind(route_id)
    .fetch_all(executor)
    .await
    .map_err(convert_error)
}

pub async fn insert<'c, E>(executor: E, row: &CoursePointRow) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "
        INSERT INTO course_points(
            id,
            route_id,
            step_order,
            seg_dist_m,
            cum_dist_m,
            duration,
            instruction,
            road_name,
            maneuver_type,
            modifier,
            location,
            bearing_before,
            bearing_after
        )
        VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
            ST_GeomFromEWKB($11), $12, $13
        );
        ",
    )
    .bind(row.id)
    .bind(row.route_id)
    .bind(row.step_order)
    .bind(row.seg_dist_m)
    .bind(row.cum_dist_m)
    .bind(row.duration)
    .bind(&row.instruction)
    .bind(&row.road_name)
    .bind(&row.maneuver_type)
    .bind(&row.modifier)
    .bind(&row.location)
    .bind(row.bearing_before)
    .bind(row.bearing_after)
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
            course_points
        WHERE route_id = $1;
        ",
    )
    .bind(route_id)
    .execute(executor)
    .await
    .map_err(convert_error)?;
    Ok(())
}
