//! Shared fixtures for tests across modules.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::descriptor::{descr_dist_sq, Descriptor, Feature};
use crate::kdtree::traversal::Node;
use crate::kdtree::KDTreeIndex;
use crate::r#type::DescriptorNum;


/// Five 2-D descriptors on the diagonal, each tagged with its input position as its x location.
pub(crate) fn diagonal_features() -> Vec<Feature<f64>> {
    (0..5)
        .map(|i| Feature::new(vec![i as f64, i as f64], i as f64, 0.))
        .collect()
}

/// `n` random descriptors of dimension `dim`. Record `i` is detected at image location
/// `(i, i % 100)`; every even record also has a model location at twice that.
pub(crate) fn random_features(n: usize, dim: usize, seed: u64) -> Vec<Feature<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let descr: Vec<f64> = (0..dim).map(|_| rng.gen_range(0.0..1.0)).collect();
            let x = i as f64;
            let y = (i % 100) as f64;
            let feat = Feature::new(descr, x, y);
            if i % 2 == 0 {
                feat.with_model_location(2. * x, 2. * y)
            } else {
                feat
            }
        })
        .collect()
}

/// Random 128-D byte descriptors, like quantized SIFT.
pub(crate) fn random_byte_features(n: usize, seed: u64) -> Vec<Feature<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let descr: Vec<u8> = (0..128).map(|_| rng.gen()).collect();
            Feature::new(descr, i as f64, 0.)
        })
        .collect()
}

/// The exact `k` nearest records by linear scan, ascending, ties in input order.
pub(crate) fn brute_force_knn<'a, N: DescriptorNum>(
    records: &'a [Feature<N>],
    query: &[N],
    k: usize,
) -> Vec<(&'a Feature<N>, f64)> {
    let mut all: Vec<(&Feature<N>, f64)> = records
        .iter()
        .map(|r| (r, descr_dist_sq(query, r.descriptor()).unwrap()))
        .collect();
    all.sort_by(|a, b| a.1.total_cmp(&b.1));
    all.truncate(k);
    all
}

/// Every record under `node`, in leaf order.
pub(crate) fn subtree_records<'a, F, T>(node: Node<'_, 'a, F, T>) -> Vec<&'a F>
where
    F: Descriptor + 'a,
    T: KDTreeIndex<'a, F>,
{
    let mut out = vec![];
    let mut stack = vec![node];
    while let Some(node) = stack.pop() {
        if node.is_leaf() {
            out.extend(node.records());
        } else {
            stack.push(node.right_child().unwrap());
            stack.push(node.left_child().unwrap());
        }
    }
    out
}

/// Panic unless every split node separates its subtrees at its split value, and every leaf is
/// non-empty.
pub(crate) fn assert_partition_invariant<'a, F, T>(tree: &T)
where
    F: Descriptor + 'a,
    T: KDTreeIndex<'a, F>,
{
    let mut stack = vec![tree.root()];
    while let Some(node) = stack.pop() {
        if node.is_leaf() {
            assert!(node.records().len() >= 1, "empty leaf");
            assert!(node.left_child().is_none() && node.right_child().is_none());
            continue;
        }

        assert_eq!(node.records().len(), 0, "split node holds records");
        let dim = node.split_dimension().unwrap();
        let value = node.split_value().unwrap();
        let left = node.left_child().unwrap();
        let right = node.right_child().unwrap();

        for record in subtree_records(left) {
            assert!(
                record.descriptor()[dim].as_f64() <= value,
                "left record above split value"
            );
        }
        for record in subtree_records(right) {
            assert!(
                record.descriptor()[dim].as_f64() >= value,
                "right record below split value"
            );
        }

        stack.push(left);
        stack.push(right);
    }
}

/// The image x locations of `records`, sorted. Fixtures use x as a unique record tag.
pub(crate) fn sorted_tags<'r, N: DescriptorNum + 'r>(
    records: impl IntoIterator<Item = &'r Feature<N>>,
) -> Vec<f64> {
    let mut tags: Vec<f64> = records.into_iter().map(|r| r.image_location().x).collect();
    tags.sort_by(f64::total_cmp);
    tags
}
