//! Clip outlines built from arc-to primitives.
//!
//! A rounded rectangle is described the way a 2D canvas would draw it: move to
//! the end of the top-left corner, then four `arc_to` segments (each defined by
//! the corner point, a second point fixing the outgoing tangent, and a radius),
//! then a line back to the start. [`ClipPath::resolve`] turns that description
//! into plain line and cubic segments that any rasteriser can fill.
//!
//! Nothing here clamps the radius. Callers pass `r <= min(w, h) / 2`; a larger
//! radius yields a self-intersecting outline.

use std::f32::consts::PI;

/// Below this length or angle a segment is treated as degenerate.
const EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    fn add_scaled(self, dir: Point, len: f32) -> Point {
        Point::new(self.x + dir.x * len, self.y + dir.y * len)
    }

    fn length(self) -> f32 {
        self.x.hypot(self.y)
    }
}

/// One drawing command of a [`ClipPath`], in canvas terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    /// Tangent arc: the arc touches the line `current → corner` and the line
    /// `corner → toward`.
    ArcTo {
        corner: Point,
        toward: Point,
        radius: f32,
    },
    LineTo(Point),
}

/// Rasteriser-ready segment produced by [`ClipPath::resolve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedSegment {
    MoveTo(Point),
    LineTo(Point),
    CubicTo(Point, Point, Point),
    Close,
}

/// A closed outline.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPath {
    segments: Vec<PathSegment>,
}

impl ClipPath {
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Expand every arc into a connecting line plus a cubic approximation.
    pub fn resolve(&self) -> Vec<ResolvedSegment> {
        let mut out = Vec::with_capacity(self.segments.len() * 2 + 1);
        let mut current = Point::new(0.0, 0.0);

        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo(p) => {
                    out.push(ResolvedSegment::MoveTo(p));
                    current = p;
                }
                PathSegment::LineTo(p) => {
                    out.push(ResolvedSegment::LineTo(p));
                    current = p;
                }
                PathSegment::ArcTo {
                    corner,
                    toward,
                    radius,
                } => match tangent_arc(current, corner, toward, radius) {
                    TangentArc::Line(p) => {
                        out.push(ResolvedSegment::LineTo(p));
                        current = p;
                    }
                    TangentArc::Arc {
                        start,
                        ctrl1,
                        ctrl2,
                        end,
                    } => {
                        out.push(ResolvedSegment::LineTo(start));
                        out.push(ResolvedSegment::CubicTo(ctrl1, ctrl2, end));
                        current = end;
                    }
                },
            }
        }

        out.push(ResolvedSegment::Close);
        out
    }
}

/// Outcome of resolving one `arc_to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TangentArc {
    /// Degenerate input (zero radius, zero-length or collinear tangents):
    /// the canvas rule is a straight line to the corner.
    Line(Point),
    Arc {
        start: Point,
        ctrl1: Point,
        ctrl2: Point,
        end: Point,
    },
}

/// Resolve a canvas-style `arc_to(corner, toward, radius)` issued from `current`.
///
/// The arc starts where the circle touches `current → corner` and ends where it
/// touches `corner → toward`. The circular arc is approximated by one cubic
/// whose handles lie on the tangent lines, with length `4/3 · tan(sweep/4) · r`.
pub fn tangent_arc(current: Point, corner: Point, toward: Point, radius: f32) -> TangentArc {
    let incoming = current.sub(corner);
    let outgoing = toward.sub(corner);
    let (len_in, len_out) = (incoming.length(), outgoing.length());

    if radius <= EPSILON || len_in <= EPSILON || len_out <= EPSILON {
        return TangentArc::Line(corner);
    }

    let u_in = Point::new(incoming.x / len_in, incoming.y / len_in);
    let u_out = Point::new(outgoing.x / len_out, outgoing.y / len_out);
    let cos = (u_in.x * u_out.x + u_in.y * u_out.y).clamp(-1.0, 1.0);
    let theta = cos.acos();

    if theta <= EPSILON || PI - theta <= EPSILON {
        return TangentArc::Line(corner);
    }

    let reach = radius / (theta / 2.0).tan();
    let start = corner.add_scaled(u_in, reach);
    let end = corner.add_scaled(u_out, reach);

    let sweep = PI - theta;
    let handle = 4.0 / 3.0 * (sweep / 4.0).tan() * radius;

    TangentArc::Arc {
        start,
        ctrl1: start.add_scaled(u_in, -handle),
        ctrl2: end.add_scaled(u_out, -handle),
        end,
    }
}

/// Plain rectangle outline at `(x, y)` sized `w × h`.
pub fn rect_path(x: f32, y: f32, w: f32, h: f32) -> ClipPath {
    let start = Point::new(x, y);
    ClipPath {
        segments: vec![
            PathSegment::MoveTo(start),
            PathSegment::LineTo(Point::new(x, y + h)),
            PathSegment::LineTo(Point::new(x + w, y + h)),
            PathSegment::LineTo(Point::new(x + w, y)),
            PathSegment::LineTo(start),
        ],
    }
}

/// Rounded rectangle outline at `(x, y)` sized `w × h` with corner radius `r`.
///
/// Corners are visited top-left, bottom-left, bottom-right, top-right.
pub fn rounded_rect_path(x: f32, y: f32, w: f32, h: f32, r: f32) -> ClipPath {
    let start = Point::new(x + r, y);
    ClipPath {
        segments: vec![
            PathSegment::MoveTo(start),
            PathSegment::ArcTo {
                corner: Point::new(x, y),
                toward: Point::new(x, y + h - r),
                radius: r,
            },
            PathSegment::ArcTo {
                corner: Point::new(x, y + h),
                toward: Point::new(x + w - r, y + h),
                radius: r,
            },
            PathSegment::ArcTo {
                corner: Point::new(x + w, y + h),
                toward: Point::new(x + w, y + h - r),
                radius: r,
            },
            PathSegment::ArcTo {
                corner: Point::new(x + w, y),
                toward: Point::new(x + w - r, y),
                radius: r,
            },
            PathSegment::LineTo(start),
        ],
    }
}
