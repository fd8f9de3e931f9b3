/// 3D point type. Coordinates are in microns.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Microns in one foot.
pub const MICRONS_PER_FOOT: f64 = 304_800.0;

/// Slack applied to every current comparison, in amps.
pub const CURRENT_TOLERANCE: f64 = 1e-9;

/// Converts a length in microns to feet.
#[must_use]
pub fn microns_to_feet(microns: f64) -> f64 {
    microns / MICRONS_PER_FOOT
}

/// Converts a length in feet to microns.
#[must_use]
pub fn feet_to_microns(feet: f64) -> f64 {
    feet * MICRONS_PER_FOOT
}

/// Straight-line distance between two points, in microns.
#[must_use]
pub fn straight_line_distance(a: &Point3, b: &Point3) -> f64 {
    (b - a).norm()
}

/// Area of the triangle `abc` by Heron's formula.
///
/// Degenerate (collinear) triangles return zero rather than `NaN`.
#[must_use]
pub fn heron_area(a: &Point3, b: &Point3, c: &Point3) -> f64 {
    let ab = straight_line_distance(a, b);
    let bc = straight_line_distance(b, c);
    let ca = straight_line_distance(c, a);
    let s = (ab + bc + ca) / 2.0;
    let product = s * (s - ab) * (s - bc) * (s - ca);
    product.max(0.0).sqrt()
}

/// Centroid of the triangle `abc`.
#[must_use]
pub fn triangle_centroid(a: &Point3, b: &Point3, c: &Point3) -> Point3 {
    Point3::from((a.coords + b.coords + c.coords) / 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn feet_round_trip() {
        assert_relative_eq!(microns_to_feet(304_800.0), 1.0);
        assert_relative_eq!(feet_to_microns(17.0), 5_181_600.0);
    }

    #[test]
    fn heron_3_4_5() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(3.0, 0.0, 0.0);
        let c = Point3::new(0.0, 4.0, 0.0);
        assert_relative_eq!(heron_area(&a, &b, &c), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn collinear_triangle_has_zero_area() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(2.0, 0.0, 0.0);
        assert_relative_eq!(heron_area(&a, &b, &c), 0.0);
    }

    #[test]
    fn centroid_is_vertex_average() {
        let c = triangle_centroid(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(3.0, 0.0, 0.0),
            &Point3::new(0.0, 3.0, 3.0),
        );
        assert_relative_eq!(c.x, 1.0);
        assert_relative_eq!(c.y, 1.0);
        assert_relative_eq!(c.z, 1.0);
    }
}
