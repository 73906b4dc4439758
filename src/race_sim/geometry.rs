//! Geometry - Small 2D helpers shared by physics, AI and tracking
//!
//! World coordinates are y-down, headings are degrees with 0 pointing
//! along +x and 90 pointing along +y.

use nalgebra::Vector2;

/// World-space 2D vector
pub type Vec2 = Vector2<f32>;

/// Below this magnitude a vector has no usable direction
pub const EPSILON: f32 = 1e-6;

pub fn vec2(x: f32, y: f32) -> Vec2 {
    Vec2::new(x, y)
}

/// Normalize an angle in degrees to `[0, 360)`
pub fn normalize_angle(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Signed shortest difference `a - b` in degrees, in `[-180, 180)`
pub fn angle_difference(a: f32, b: f32) -> f32 {
    (a - b + 180.0).rem_euclid(360.0) - 180.0
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Unit vector for a heading in degrees
pub fn heading_vector(heading: f32) -> Vec2 {
    let rad = heading.to_radians();
    vec2(rad.cos(), rad.sin())
}

/// Bearing in degrees from `from` to `to`, `[0, 360)`
pub fn bearing(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    normalize_angle(d.y.atan2(d.x).to_degrees())
}

/// Unit vector or zero when the input is degenerate
pub fn direction_or_zero(v: Vec2) -> Vec2 {
    let len = v.norm();
    if len > EPSILON {
        v / len
    } else {
        Vec2::zeros()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

fn orientation(p: Vec2, q: Vec2, r: Vec2) -> Orientation {
    let val = (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y);
    if val.abs() < 1e-9 {
        Orientation::Collinear
    } else if val > 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::CounterClockwise
    }
}

/// Whether collinear point `q` lies within the bounding box of `p..r`
fn on_segment(p: Vec2, q: Vec2, r: Vec2) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

/// Segment-segment intersection test, touching endpoints count
pub fn segments_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    // Bounding box rejection
    if a1.x.max(a2.x) < b1.x.min(b2.x)
        || a1.x.min(a2.x) > b1.x.max(b2.x)
        || a1.y.max(a2.y) < b1.y.min(b2.y)
        || a1.y.min(a2.y) > b1.y.max(b2.y)
    {
        return false;
    }

    let o1 = orientation(a1, a2, b1);
    let o2 = orientation(a1, a2, b2);
    let o3 = orientation(b1, b2, a1);
    let o4 = orientation(b1, b2, a2);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == Orientation::Collinear && on_segment(a1, b1, a2))
        || (o2 == Orientation::Collinear && on_segment(a1, b2, a2))
        || (o3 == Orientation::Collinear && on_segment(b1, a1, b2))
        || (o4 == Orientation::Collinear && on_segment(b1, a2, b2))
}

/// Squared distance from `p` to the closest point of segment `a..b`
pub fn point_segment_distance_sq(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq <= EPSILON {
        return (p - a).norm_squared();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm_squared()
}

/// Ray-casting point in polygon test
pub fn point_in_polygon(p: Vec2, vertices: &[Vec2]) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (vi, vj) = (vertices[i], vertices[j]);
        // Horizontal edges never satisfy the straddle test, so no division by zero
        if (vi.y > p.y) != (vj.y > p.y) {
            let x_cross = vi.x + (p.y - vi.y) * (vj.x - vi.x) / (vj.y - vi.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
