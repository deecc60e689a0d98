use nalgebra::{ClosedSub, Point3, Scalar, Vector2, Vector3};

/// 3D axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB<T: Scalar + PartialOrd> {
    min: Point3<T>,
    max: Point3<T>,
}

impl<T: Scalar + ClosedSub + PartialOrd + Copy> AABB<T> {
    /// Creates a new AABB from the given minimum and maximum coordinates without checking that min <= max
    /// ```
    /// # use cloudshape_core::math::AABB;
    /// let bounds = AABB::from_min_max_unchecked(nalgebra::Point3::new(0.0, 0.0, 0.0), nalgebra::Point3::new(1.0, 1.0, 1.0));
    /// assert_eq!(*bounds.max(), nalgebra::Point3::new(1.0, 1.0, 1.0));
    /// ```
    pub fn from_min_max_unchecked(min: Point3<T>, max: Point3<T>) -> Self {
        Self { min, max }
    }

    /// Computes the tightest AABB around the given points. Returns `None` if there are no points
    /// ```
    /// # use cloudshape_core::math::AABB;
    /// let points = [nalgebra::Point3::new(1.0, 5.0, -1.0), nalgebra::Point3::new(-2.0, 0.0, 3.0)];
    /// let bounds = AABB::from_points(points.iter()).unwrap();
    /// assert_eq!(*bounds.min(), nalgebra::Point3::new(-2.0, 0.0, -1.0));
    /// assert_eq!(*bounds.max(), nalgebra::Point3::new(1.0, 5.0, 3.0));
    /// ```
    pub fn from_points<'a, I: IntoIterator<Item = &'a Point3<T>>>(points: I) -> Option<Self>
    where
        T: 'a,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(
            Self::from_min_max_unchecked(first, first),
            |bounds, point| bounds.extend_with_point(point),
        ))
    }

    pub fn min(&self) -> &Point3<T> {
        &self.min
    }

    pub fn max(&self) -> &Point3<T> {
        &self.max
    }

    /// Returns the size between the minimum and maximum position of this AABB
    pub fn extent(&self) -> Vector3<T> {
        self.max - self.min
    }

    /// Returns true if the given point is contained within this AABB. Points on the boundary count
    /// as contained
    /// ```
    /// # use cloudshape_core::math::AABB;
    /// let bounds = AABB::from_min_max_unchecked(nalgebra::Point3::new(0.0, 0.0, 0.0), nalgebra::Point3::new(1.0, 1.0, 1.0));
    /// assert!(bounds.contains(&nalgebra::Point3::new(1.0, 0.5, 0.0)));
    /// ```
    pub fn contains(&self, point: &Point3<T>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Returns a copy of this AABB that is extended so that it contains `point`
    pub fn extend_with_point(&self, point: &Point3<T>) -> Self {
        let pick_min = |a: T, b: T| if a < b { a } else { b };
        let pick_max = |a: T, b: T| if a > b { a } else { b };
        Self {
            min: Point3::new(
                pick_min(self.min.x, point.x),
                pick_min(self.min.y, point.y),
                pick_min(self.min.z, point.z),
            ),
            max: Point3::new(
                pick_max(self.max.x, point.x),
                pick_max(self.max.y, point.y),
                pick_max(self.max.z, point.z),
            ),
        }
    }
}

/// 2D axis-aligned rectangle in the horizontal plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    min: Vector2<f64>,
    max: Vector2<f64>,
}

impl Rect {
    /// Computes the tightest rectangle around the given points. Returns `None` if there are no points
    /// ```
    /// # use cloudshape_core::math::Rect;
    /// # use cloudshape_core::nalgebra::Vector2;
    /// let rect = Rect::from_points(&[Vector2::new(0.0, 0.0), Vector2::new(4.0, 2.0)]).unwrap();
    /// assert_eq!(rect.width(), 4.0);
    /// assert_eq!(rect.height(), 2.0);
    /// assert_eq!(rect.center(), Vector2::new(2.0, 1.0));
    /// ```
    pub fn from_points(points: &[Vector2<f64>]) -> Option<Self> {
        let first = *points.first()?;
        Some(points.iter().skip(1).fold(
            Self {
                min: first,
                max: first,
            },
            |rect, p| Self {
                min: rect.min.inf(p),
                max: rect.max.sup(p),
            },
        ))
    }

    pub fn min(&self) -> &Vector2<f64> {
        &self.min
    }

    pub fn max(&self) -> &Vector2<f64> {
        &self.max
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Vector2<f64> {
        (self.min + self.max) / 2.0
    }

    /// Returns true if the two rectangles share at least one point. Touching edges count as an intersection
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// The four corners in counter-clockwise order, starting at the minimum corner
    pub fn corners(&self) -> [Vector2<f64>; 4] {
        [
            self.min,
            Vector2::new(self.max.x, self.min.y),
            self.max,
            Vector2::new(self.min.x, self.max.y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_from_points_empty() {
        let points: Vec<Point3<f64>> = vec![];
        assert!(AABB::from_points(points.iter()).is_none());
    }

    #[test]
    fn test_aabb_extent() {
        let points = vec![
            Point3::new(1.0, 2.0, 3.0),
            Point3::new(4.0, -2.0, 3.5),
            Point3::new(2.0, 0.0, 10.0),
        ];
        let bounds = AABB::from_points(points.iter()).unwrap();
        assert_eq!(bounds.extent(), Vector3::new(3.0, 4.0, 7.0));
        for point in &points {
            assert!(bounds.contains(point));
        }
    }

    #[test]
    fn test_rect_intersects() {
        let a = Rect::from_points(&[Vector2::new(0.0, 0.0), Vector2::new(2.0, 2.0)]).unwrap();
        let b = Rect::from_points(&[Vector2::new(2.0, 1.0), Vector2::new(3.0, 3.0)]).unwrap();
        let c = Rect::from_points(&[Vector2::new(5.0, 5.0), Vector2::new(6.0, 6.0)]).unwrap();
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_rect_corners_span_area() {
        let rect = Rect::from_points(&[
            Vector2::new(1.0, 1.0),
            Vector2::new(3.0, 2.0),
            Vector2::new(2.0, 5.0),
        ])
        .unwrap();
        assert_eq!(rect.area(), 8.0);
        let corners = rect.corners();
        assert_eq!(corners[0], Vector2::new(1.0, 1.0));
        assert_eq!(corners[2], Vector2::new(3.0, 5.0));
    }
}
