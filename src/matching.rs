//! Match one set of descriptors against a k-d tree built over another.
//!
//! Each query is matched to its nearest neighbor only when that neighbor is clearly closer than
//! the second nearest (Lowe's ratio test), which discards most ambiguous matches.

use log::debug;
#[cfg(feature = "rayon")]
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};

use crate::descriptor::Descriptor;
use crate::error::{DescriptorIndexError, Result};
use crate::kdtree::KDTreeIndex;

/// The default maximum number of records examined per query.
pub const DEFAULT_MAX_CHECKS: usize = 200;

/// The default threshold on the ratio of squared distances between the nearest and second
/// nearest neighbor.
pub const DEFAULT_RATIO_THRESHOLD: f64 = 0.49;

/// Parameters for [`match_features`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchConfig {
    max_checks: usize,
    ratio_threshold: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_checks: DEFAULT_MAX_CHECKS,
            ratio_threshold: DEFAULT_RATIO_THRESHOLD,
        }
    }
}

impl MatchConfig {
    /// Set the search budget per query. Must be at least 1.
    pub fn with_max_checks(mut self, max_checks: usize) -> Result<Self> {
        if max_checks == 0 {
            return Err(DescriptorIndexError::InvalidArgument(
                "max_checks must be at least 1.".to_string(),
            ));
        }
        self.max_checks = max_checks;
        Ok(self)
    }

    /// Set the squared-distance ratio threshold. Must be in `(0, 1]`.
    pub fn with_ratio_threshold(mut self, ratio_threshold: f64) -> Result<Self> {
        if !(ratio_threshold > 0.0 && ratio_threshold <= 1.0) {
            return Err(DescriptorIndexError::InvalidArgument(format!(
                "Ratio threshold must be in (0, 1], got {}.",
                ratio_threshold
            )));
        }
        self.ratio_threshold = ratio_threshold;
        Ok(self)
    }

    /// The search budget per query.
    pub fn max_checks(&self) -> usize {
        self.max_checks
    }

    /// The squared-distance ratio threshold.
    pub fn ratio_threshold(&self) -> f64 {
        self.ratio_threshold
    }
}

/// A query descriptor paired with its accepted nearest neighbor in the tree.
pub struct Match<'a, F> {
    /// Position of the query in the slice passed to [`match_features`].
    pub query_index: usize,
    /// The nearest record in the tree.
    pub target: &'a F,
    /// Squared distance from the query to `target`.
    pub distance_sq: f64,
    /// Squared distance from the query to the second nearest record.
    pub second_distance_sq: f64,
}

impl<F> Clone for Match<'_, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F> Copy for Match<'_, F> {}

impl<F: std::fmt::Debug> std::fmt::Debug for Match<'_, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Match")
            .field("query_index", &self.query_index)
            .field("target", self.target)
            .field("distance_sq", &self.distance_sq)
            .field("second_distance_sq", &self.second_distance_sq)
            .finish()
    }
}

/// Match a single query; `None` if fewer than two neighbors were found or the ratio test failed.
fn match_one<'a, F, T, Q>(
    tree: &T,
    query_index: usize,
    query: &Q,
    config: &MatchConfig,
) -> Result<Option<Match<'a, F>>>
where
    F: Descriptor + 'a,
    T: KDTreeIndex<'a, F>,
    Q: Descriptor<Num = F::Num>,
{
    let nbrs = tree.knn(query, 2, config.max_checks)?;
    let [nearest, second] = nbrs.as_slice() else {
        return Ok(None);
    };

    if nearest.distance_sq < second.distance_sq * config.ratio_threshold {
        Ok(Some(Match {
            query_index,
            target: nearest.record,
            distance_sq: nearest.distance_sq,
            second_distance_sq: second.distance_sq,
        }))
    } else {
        Ok(None)
    }
}

/// Match every descriptor in `queries` against `tree`.
///
/// Returns the accepted matches in query order. The first failing query aborts the whole
/// operation. With the `rayon` feature, queries are matched in parallel.
pub fn match_features<'a, F, T, Q>(
    tree: &T,
    queries: &[Q],
    config: &MatchConfig,
) -> Result<Vec<Match<'a, F>>>
where
    F: Descriptor + Sync + 'a,
    T: KDTreeIndex<'a, F> + Sync,
    Q: Descriptor<Num = F::Num> + Sync,
{
    #[cfg(feature = "rayon")]
    let per_query = queries
        .par_iter()
        .enumerate()
        .map(|(query_index, query)| match_one(tree, query_index, query, config))
        .collect::<Result<Vec<_>>>()?;

    #[cfg(not(feature = "rayon"))]
    let per_query = queries
        .iter()
        .enumerate()
        .map(|(query_index, query)| match_one(tree, query_index, query, config))
        .collect::<Result<Vec<_>>>()?;

    let matches: Vec<_> = per_query.into_iter().flatten().collect();

    debug!("matched {} of {} features", matches.len(), queries.len());
    Ok(matches)
}
