//! Descriptor records and the squared-distance primitive.

use crate::error::{DescriptorIndexError, Result};
use crate::r#type::{DescriptorNum, Point};

/// Which location of a record a spatial constraint applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationKind {
    /// The location at which the feature was detected in its image.
    #[default]
    Image,
    /// The location of the feature in a reference model, when one is known.
    Model,
}

/// A record that can be indexed in a k-d tree.
///
/// The tree never owns records; it borrows them for its whole lifetime. Every record indexed
/// together must have a descriptor of the same, non-zero length.
pub trait Descriptor {
    /// The numeric type of each descriptor component.
    type Num: DescriptorNum;

    /// The descriptor vector.
    fn descriptor(&self) -> &[Self::Num];

    /// The image-space location of this record.
    fn image_location(&self) -> Point;

    /// The model-space location of this record, if any.
    fn model_location(&self) -> Option<Point> {
        None
    }

    /// The location selected by `kind`.
    fn location(&self, kind: LocationKind) -> Option<Point> {
        match kind {
            LocationKind::Image => Some(self.image_location()),
            LocationKind::Model => self.model_location(),
        }
    }
}

/// A local image feature: a descriptor vector plus where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature<N: DescriptorNum> {
    descr: Vec<N>,
    location: Point,
    model_location: Option<Point>,
}

impl<N: DescriptorNum> Feature<N> {
    /// Create a feature detected at image location `(x, y)`.
    pub fn new(descr: impl Into<Vec<N>>, x: f64, y: f64) -> Self {
        Self {
            descr: descr.into(),
            location: Point::new(x, y),
            model_location: None,
        }
    }

    /// Attach a model-space location to this feature.
    pub fn with_model_location(mut self, x: f64, y: f64) -> Self {
        self.model_location = Some(Point::new(x, y));
        self
    }

    /// The number of components in the descriptor.
    pub fn dimension(&self) -> usize {
        self.descr.len()
    }
}

impl<N: DescriptorNum> Descriptor for Feature<N> {
    type Num = N;

    #[inline]
    fn descriptor(&self) -> &[N] {
        &self.descr
    }

    #[inline]
    fn image_location(&self) -> Point {
        self.location
    }

    #[inline]
    fn model_location(&self) -> Option<Point> {
        self.model_location
    }
}

/// Squared Euclidean distance between two descriptor vectors.
///
/// This is monotonic with the true distance, so it can rank candidates or feed a
/// nearest/second-nearest ratio test without taking a square root.
///
/// ```
/// use descriptor_index::descr_dist_sq;
///
/// let d = descr_dist_sq(&[0.0f64, 0.0], &[3.0, 4.0]).unwrap();
/// assert_eq!(d, 25.0);
/// ```
pub fn descr_dist_sq<N: DescriptorNum>(a: &[N], b: &[N]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(DescriptorIndexError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(sq_dist(a, b))
}

/// Unchecked squared distance. Callers guarantee equal lengths.
#[inline]
pub(crate) fn sq_dist<N: DescriptorNum>(a: &[N], b: &[N]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x.as_f64() - y.as_f64();
            d * d
        })
        .sum()
}

/// Ensure every component of `descr` widens to a finite value.
pub(crate) fn check_finite<N: DescriptorNum>(descr: &[N]) -> Result<()> {
    if descr.iter().all(|v| v.as_f64().is_finite()) {
        Ok(())
    } else {
        Err(DescriptorIndexError::InvalidArgument(
            "Descriptor contains a non-finite component.".to_string(),
        ))
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn squared_distance() {
        let a = [1.0f64, 2.0, 3.0];
        let b = [4.0f64, 6.0, 3.0];
        assert_relative_eq!(descr_dist_sq(&a, &b).unwrap(), 25.0);
        assert_relative_eq!(descr_dist_sq(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn squared_distance_does_not_wrap_small_integers() {
        let a = [0u8, 255];
        let b = [255u8, 0];
        assert_relative_eq!(descr_dist_sq(&a, &b).unwrap(), 2.0 * 255.0 * 255.0);
    }

    #[test]
    fn squared_distance_rejects_mismatched_dimensions() {
        let err = descr_dist_sq(&[1.0f32, 2.0], &[1.0f32]).unwrap_err();
        assert!(matches!(
            err,
            DescriptorIndexError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn feature_locations() {
        let feat = Feature::new(vec![0.0f64; 4], 3., 4.).with_model_location(30., 40.);
        assert_eq!(feat.dimension(), 4);
        assert_eq!(feat.location(LocationKind::Image), Some(Point::new(3., 4.)));
        assert_eq!(
            feat.location(LocationKind::Model),
            Some(Point::new(30., 40.))
        );

        let bare = Feature::new(vec![0u8; 2], 1., 1.);
        assert_eq!(bare.location(LocationKind::Model), None);
    }

    #[test]
    fn finite_check() {
        assert!(check_finite(&[1.0f64, 2.0]).is_ok());
        assert!(check_finite(&[1.0f64, f64::NAN]).is_err());
        assert!(check_finite(&[f32::INFINITY]).is_err());
        assert!(check_finite(&[7u16, 9]).is_ok());
    }
}
