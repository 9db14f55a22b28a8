//! Path and stroke conversion to tiny-skia.

use crate::device::{LineCap, LineJoin, Path, PathSegment, StrokeState};
use crate::geometry::{Matrix, Quad};
use tiny_skia::{PathBuilder, Stroke, StrokeDash, Transform};

/// Build a tiny-skia path; `None` when the path is empty or degenerate.
pub(crate) fn to_skia_path(path: &Path) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for segment in path.segments() {
        match *segment {
            PathSegment::MoveTo(p) => builder.move_to(p.x, p.y),
            PathSegment::LineTo(p) => builder.line_to(p.x, p.y),
            PathSegment::CurveTo(c1, c2, p) => builder.cubic_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y),
            PathSegment::Close => builder.close(),
        }
    }
    builder.finish()
}

/// One closed subpath per quad.
pub(crate) fn quads_to_path(quads: &[Quad]) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for quad in quads {
        let [p0, p1, p2, p3] = quad.points;
        builder.move_to(p0.x, p0.y);
        builder.line_to(p1.x, p1.y);
        builder.line_to(p2.x, p2.y);
        builder.line_to(p3.x, p3.y);
        builder.close();
    }
    builder.finish()
}

/// Convert stroke parameters.
pub(crate) fn to_skia_stroke(state: &StrokeState) -> Stroke {
    let dash = if state.dash.is_empty() {
        None
    } else {
        StrokeDash::new(state.dash.clone(), state.dash_phase)
    };
    Stroke {
        width: state.line_width,
        miter_limit: state.miter_limit,
        line_cap: skia_line_cap(state.line_cap),
        line_join: skia_line_join(state.line_join),
        dash,
    }
}

/// Device transform for a ctm.
pub(crate) fn to_transform(ctm: &Matrix) -> Transform {
    Transform::from_row(ctm.a, ctm.b, ctm.c, ctm.d, ctm.e, ctm.f)
}

fn skia_line_cap(cap: LineCap) -> tiny_skia::LineCap {
    match cap {
        LineCap::Butt => tiny_skia::LineCap::Butt,
        LineCap::Round => tiny_skia::LineCap::Round,
        LineCap::Square => tiny_skia::LineCap::Square,
    }
}

fn skia_line_join(join: LineJoin) -> tiny_skia::LineJoin {
    match join {
        LineJoin::Miter => tiny_skia::LineJoin::Miter,
        LineJoin::Round => tiny_skia::LineJoin::Round,
        LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    #[test]
    fn test_empty_path() {
        assert!(to_skia_path(&Path::new()).is_none());
        assert!(quads_to_path(&[]).is_none());
    }

    #[test]
    fn test_rect_path_bounds() {
        let path = to_skia_path(&Path::from_rect(&Rect::new(1.0, 2.0, 3.0, 4.0))).unwrap();
        let bounds = path.bounds();
        assert_eq!(bounds.left(), 1.0);
        assert_eq!(bounds.top(), 2.0);
        assert_eq!(bounds.right(), 4.0);
        assert_eq!(bounds.bottom(), 6.0);
    }

    #[test]
    fn test_stroke_conversion() {
        let state = StrokeState {
            line_width: 2.0,
            line_cap: LineCap::Round,
            line_join: LineJoin::Bevel,
            dash: vec![3.0, 1.0],
            ..StrokeState::default()
        };
        let stroke = to_skia_stroke(&state);
        assert_eq!(stroke.width, 2.0);
        assert_eq!(stroke.line_cap, tiny_skia::LineCap::Round);
        assert_eq!(stroke.line_join, tiny_skia::LineJoin::Bevel);
        assert!(stroke.dash.is_some());
        assert!(to_skia_stroke(&StrokeState::default()).dash.is_none());
    }

    #[test]
    fn test_transform_matches_row_vectors() {
        let m = Matrix::new(2.0, 0.0, 0.0, 3.0, 10.0, 20.0);
        let t = to_transform(&m);
        let mut points = [tiny_skia::Point::from_xy(1.0, 1.0)];
        t.map_points(&mut points);
        let expected = m.transform_point(1.0, 1.0);
        assert_eq!(points[0].x, expected.x);
        assert_eq!(points[0].y, expected.y);
    }
}
