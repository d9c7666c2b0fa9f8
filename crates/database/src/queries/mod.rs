use cycling::database::DatabaseError;

pub mod course_point;
pub mod route;
pub mod user;
pub mod waypoint;

pub(crate) fn convert_error(why: sqlx::Error) -> DatabaseError {
    match why {
        sqlx::Error::RowNotFound => DatabaseError::NotFound,
        _ => DatabaseError::Storage(Box::new(why)),
    }
}
