use cycling::database::Result;
use model::{
    route::Route,
    user::User,
};
use sqlx::{Executor, PgConnection, Postgres};
use utility::id::Id;
use uuid::Uuid;

use crate::data_model::{
    course_point::CoursePointRow, parse_id, route::RouteRow,
    waypoint::WaypointRow,
};

use super::{convert_error, course_point, waypoint};

/// Loads a route together with both child collections, children in their
/// storage order.
pub async fn get(conn: &mut PgConnection, id: &Id<Route>) -> Result<Route> {
    let route_id = parse_id(id.raw_ref())?;
    let mut route = get_row(&mut *conn, route_id).await?.to_model()?;

    let course_point_rows =
        course_point::get_by_route_id(&mut *conn, route_id).await?;
    let mut course_points = Vec::with_capacity(course_point_rows.len());
    for row in course_point_rows {
        course_points.push(row.to_model()?);
    }
    route.attach_course_points(course_points);

    let waypoint_rows = waypoint::get_by_route_id(&mut *conn, route_id).await?;
    let mut waypoints = Vec::with_capacity(waypoint_rows.len());
    for row in waypoint_rows {
        waypoints.push(row.to_model()?);
    }
    route.attach_waypoints(waypoints);

    Ok(route)
}

/// Summary rows only; children are not fetched for listings.
pub async fn get_all_by_user<'c, E>(
    executor: E,
    user_id: &Id<User>,
) -> Result<Vec<Route>>
where
    E: Executor<'c, Database = Postgres>,
{
    let user_id = parse_id(user_id.raw_ref())?;
    let rows: Vec<RouteRow> = sqlx::query_as(
        "
        SELECT
            id, user_id, name, description, highlighted_photo_id,
            distance, duration, elevation_gain, elevation_loss,
            ST_AsEWKB(path_geom) AS path_geom,
            ST_AsEWKB(bbox) AS bbox,
            ST_AsEWKB(first_point) AS first_point,
            ST_AsEWKB(last_point) AS last_point,
            visibility, created_at, updated_at
        FROM
            routes
        WHERE user_id = $1
        ORDER BY created_at DESC;
        ",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
    .map_err(convert_error)?;

    rows.into_iter().map(|row| row.to_model()).collect()
}

pub async fn count_by_user<'c, E>(executor: E, user_id: &Id<User>) -> Result<i64>
where
    E: Executor<'c, Database = Postgres>,
{
    let user_id = parse_id(user_id.raw_ref())?;
    sqlx::query_scalar(
        "
        SELECT COUNT(*) FROM routes WHERE user_id = $1;
        ",
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
}

/// Inserts the route row followed by all of its children. Run inside a
/// transaction; the route row is written first so the child rows satisfy
/// their foreign key.
pub async fn save(conn: &mut PgConnection, route: &Route) -> Result<()> {
    let row = RouteRow::from_model(route)?;
    insert_row(&mut *conn, &row).await?;

    for point in route.course_points() {
        let row = CoursePointRow::from_model(point)?;
        course_point::insert(&mut *conn, &row).await?;
    }
    for wp in route.waypoints() {
        let row = WaypointRow::from_model(wp)?;
        waypoint::insert(&mut *conn, &row).await?;
    }
    Ok(())
}

/// Updates the route row in place, then replaces the stored children with
/// the route's current in-memory collections. Children carry no stable
/// identity across edits, so delete-then-reinsert beats diffing here.
/// Run inside a transaction.
pub async fn update(conn: &mut PgConnection, route: &Route) -> Result<()> {
    let row = RouteRow::from_model(route)?;
    update_row(&mut *conn, &row).await?;

    course_point::delete_by_route_id(&mut *conn, row.id).await?;
    waypoint::delete_by_route_id(&mut *conn, row.id).await?;

    for point in route.course_points() {
        let row = CoursePointRow::from_model(point)?;
        course_point::insert(&mut *conn, &row).await?;
    }
    for wp in route.waypoints() {
        let row = WaypointRow::from_model(wp)?;
        waypoint::insert(&mut *conn, &row).await?;
    }
    Ok(())
}

/// Deletes the route row; course points and waypoints go with it through
/// the schema's cascading foreign keys.
pub async fn delete<'c, E>(executor: E, id: &Id<Route>) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let route_id = parse_id(id.raw_ref())?;
    let _: Uuid = sqlx::query_scalar(
        "
        DELETE FROM
            routes
        WHERE id = $1
        RETURNING id;
        ",
    )
    .bind(route_id)
    .fetch_one(executor)
    .await
    .map_err(convert_error)?;
    Ok(())
}

async fn get_row<'c, E>(executor: E, route_id: Uuid) -> Result<RouteRow>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id, user_id, name, description, highlighted_photo_id,
            distance, duration, elevation_gain, elevation_loss,
            ST_AsEWKB(path_geom) AS path_geom,
            ST_AsEWKB(bbox) AS bbox,
            ST_AsEWKB(first_point) AS first_point,
            ST_AsEWKB(last_point) AS last_point,
            visibility, created_at, updated_at
        FROM
            routes
        WHERE id = $1;
        ",
    )
    .bind(route_id)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
}

async fn insert_row<'c, E>(executor: E, row: &RouteRow) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "
        INSERT INTO routes(
            id,
            user_id,
            name,
            description,
            highlighted_photo_id,
            distance,
            duration,
            elevation_gain,
            elevation_loss,
            path_geom,
            bbox,
            first_point,
            last_point,
            visibility,
            created_at,
            updated_at
        )
        VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9,
            ST_GeomFromEWKB($10), ST_GeomFromEWKB($11),
            ST_GeomFromEWKB($12), ST_GeomFromEWKB($13),
            $14, $15, $16
        );
        ",
    )
    .bind(row.id)
    .bind(row.user_id)
    .bind(&row.name)
    .bind(&row.description)
    .bind(row.highlighted_photo_id)
    .bind(row.distance)
    .bind(row.duration)
    .bind(row.elevation_gain)
    .bind(row.elevation_loss)
    .bind(&row.path_geom)
    .bind(&row.bbox)
    .bind(&row.first_point)
    .bind(&row.last_point)
    .bind(row.visibility)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(executor)
    .await
    .map_err(convert_error)?;
    Ok(())
}

async fn update_row<'c, E>(executor: E, row: &RouteRow) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let _: Uuid = sqlx::query_scalar(
        "
        UPDATE routes
        SET name = $2,
            description = $3,
            highlighted_photo_id = $4,
            distance = $5,
            duration = $6,
            elevation_gain = $7,
            elevation_loss = $8,
            path_geom = ST_GeomFromEWKB($9),
            bbox = ST_GeomFromEWKB($10),
            first_point = ST_GeomFromEWKB($11),
            last_point = ST_GeomFromEWKB($12),
            visibility = $13,
            updated_at = $14
        WHERE id = $1
        RETURNING id;
        ",
    )
    .bind(row.id)
    .bind(&row.name)
    .bind(&row.description)
    .bind(row.highlighted_photo_id)
    .bind(row.distance)
    .bind(row.duration)
    .bind(row.elevation_gain)
    .bind(row.elevation_loss)
    .bind(&row.path_geom)
    .bind(&row.bbox)
    .bind(&row.first_point)
    .bind(&row.last_point)
    .bind(row.visibility)
    .bind(row.updated_at)
    .fetch_one(executor)
    .await
    .map_err(convert_error)?;
    Ok(())
}
