use std::fmt::Debug;

use geo_traits::{
    CoordTrait, GeometryTrait, GeometryType, RectTrait, UnimplementedGeometryCollection,
    UnimplementedLine, UnimplementedLineString, UnimplementedMultiLineString,
    UnimplementedMultiPoint, UnimplementedMultiPolygon, UnimplementedPoint, UnimplementedPolygon,
    UnimplementedTriangle,
};
use num_traits::{Bounded, Num, NumCast, ToPrimitive};

/// A trait for types that can be used as descriptor components.
///
/// This trait is sealed and cannot be implemented for external types. Every component is widened
/// to `f64` for split statistics and distance computation, so only primitive numeric types that
/// convert losslessly (or near-losslessly, for `f32`) are accepted.
pub trait DescriptorNum:
    private::Sealed
    + Num
    + NumCast
    + ToPrimitive
    + PartialOrd
    + Debug
    + Send
    + Sync
    + bytemuck::Pod
    + Bounded
{
    /// Widen this component to `f64`.
    #[inline]
    fn as_f64(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

impl DescriptorNum for i8 {}
impl DescriptorNum for u8 {}
impl DescriptorNum for i16 {}
impl DescriptorNum for u16 {}
impl DescriptorNum for i32 {}
impl DescriptorNum for u32 {}
impl DescriptorNum for f32 {}
impl DescriptorNum for f64 {}

/// A 2D location in image or model space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// x coordinate
    pub x: f64,
    /// y coordinate
    pub y: f64,
}

impl Point {
    /// Construct a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl CoordTrait for Point {
    type T = f64;

    fn dim(&self) -> geo_traits::Dimensions {
        geo_traits::Dimensions::Xy
    }

    fn x(&self) -> Self::T {
        self.x
    }

    fn y(&self) -> Self::T {
        self.y
    }

    fn nth_or_panic(&self, n: usize) -> Self::T {
        match n {
            0 => self.x,
            1 => self.y,
            _ => panic!("Invalid index of coord"),
        }
    }
}

/// An axis-aligned rectangle used to constrain spatial searches.
///
/// Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    min: Point,
    max: Point,
}

impl Rect {
    /// Construct a rectangle from its corner coordinates. The corners are normalized so that
    /// `min <= max` on both axes.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min: Point::new(min_x.min(max_x), min_y.min(max_y)),
            max: Point::new(min_x.max(max_x), min_y.max(max_y)),
        }
    }

    /// Construct a rectangle from its top-left origin and a width and height, as image
    /// regions are usually described.
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Returns `true` if `point` lies inside this rectangle or on its boundary.
    #[inline]
    pub fn contains(&self, point: &Point) -> bool {
        contains(self, point)
    }
}

impl GeometryTrait for Rect {
    type T = f64;
    type PointType<'a>
        = UnimplementedPoint<f64>
    where
        Self: 'a;
    type LineStringType<'a>
        = UnimplementedLineString<f64>
    where
        Self: 'a;
    type PolygonType<'a>
        = UnimplementedPolygon<f64>
    where
        Self: 'a;
    type MultiPointType<'a>
        = UnimplementedMultiPoint<f64>
    where
        Self: 'a;
    type MultiLineStringType<'a>
        = UnimplementedMultiLineString<f64>
    where
        Self: 'a;
    type MultiPolygonType<'a>
        = UnimplementedMultiPolygon<f64>
    where
        Self: 'a;
    type GeometryCollectionType<'a>
        = UnimplementedGeometryCollection<f64>
    where
        Self: 'a;
    type RectType<'a>
        = Rect
    where
        Self: 'a;
    type TriangleType<'a>
        = UnimplementedTriangle<f64>
    where
        Self: 'a;
    type LineType<'a>
        = UnimplementedLine<f64>
    where
        Self: 'a;

    fn dim(&self) -> geo_traits::Dimensions {
        geo_traits::Dimensions::Xy
    }

    fn as_type(
        &self,
    ) -> GeometryType<
        '_,
        Self::PointType<'_>,
        Self::LineStringType<'_>,
        Self::PolygonType<'_>,
        Self::MultiPointType<'_>,
        Self::MultiLineStringType<'_>,
        Self::MultiPolygonType<'_>,
        Self::GeometryCollectionType<'_>,
        Self::RectType<'_>,
        Self::TriangleType<'_>,
        Self::LineType<'_>,
    > {
        GeometryType::Rect(self)
    }
}

impl RectTrait for Rect {
    type CoordType<'a>
        = Point
    where
        Self: 'a;

    fn min(&self) -> Self::CoordType<'_> {
        self.min
    }

    fn max(&self) -> Self::CoordType<'_> {
        self.max
    }
}

/// Inclusive point-in-rectangle test for any [`RectTrait`] implementation.
#[inline]
pub(crate) fn contains(rect: &impl RectTrait<T = f64>, point: &Point) -> bool {
    let min = rect.min();
    let max = rect.max();
    point.x >= min.x() && point.x <= max.x() && point.y >= min.y() && point.y <= max.y()
}

// https://rust-lang.github.io/api-guidelines/future-proofing.html#sealed-traits-protect-against-downstream-implementations-c-sealed
mod private {
    pub trait Sealed {}

    impl Sealed for i8 {}
    impl Sealed for u8 {}
    impl Sealed for i16 {}
    impl Sealed for u16 {}
    impl Sealed for i32 {}
    impl Sealed for u32 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}
