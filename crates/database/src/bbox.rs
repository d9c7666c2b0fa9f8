use geo::{BoundingRect, Coord, LineString, Polygon, Rect};
use model::geometry::Geometry;

/// Derives the bounding box of a path geometry as a closed single-ring
/// polygon. This runs at persistence time so the aggregate never carries
/// a caller-supplied bbox.
pub fn calculate_bbox(path_geom: &Geometry) -> Geometry {
    calculate_bbox_with_padding(path_geom, 0.0)
}

/// Like [`calculate_bbox`], expanded symmetrically by `padding` on each
/// axis. The padding is in coordinate degrees; how many meters a degree
/// covers depends on latitude, so picking a value is the caller's call.
/// For reference, 0.001 degrees of latitude is roughly 111 m.
pub fn calculate_bbox_with_padding(path_geom: &Geometry, padding: f64) -> Geometry {
    let bound = bounding_rect(path_geom);
    let min_x = bound.min().x - padding;
    let min_y = bound.min().y - padding;
    let max_x = bound.max().x + padding;
    let max_y = bound.max().y + padding;

    // ring runs counter-clockwise from the lower-left corner and closes
    // back on its first coordinate
    Geometry::Polygon(Polygon::new(
        LineString::from(vec![
            (min_x, min_y),
            (max_x, min_y),
            (max_x, max_y),
            (min_x, max_y),
            (min_x, min_y),
        ]),
        vec![],
    ))
}

fn bounding_rect(geometry: &Geometry) -> Rect<f64> {
    let empty = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 0.0 });
    match geometry {
        Geometry::Point(point) => Rect::new(point.0, point.0),
        Geometry::LineString(line) => line.bounding_rect().unwrap_or(empty),
        Geometry::Polygon(polygon) => polygon.bounding_rect().unwrap_or(empty),
    }
}
