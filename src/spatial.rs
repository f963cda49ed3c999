//! Nearest-particle lookups
//!
//! Wraps an immutable KD-tree over a subset of particle positions and maps
//! query results back to particle ids.

use glam::Vec3;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;

/// KD-tree over particle positions
///
/// The tree is built once per frame (cell mode) or once per face assignment
/// (face mode) and is never mutated afterwards.
///
/// # Performance
///
/// - Construction: O(n log n)
/// - Query: O(log n)
#[derive(Clone)]
pub struct SpatialIndex {
    tree: ImmutableKdTree<f32, usize, 3, 32>,
    ids: Vec<usize>,
}

impl SpatialIndex {
    /// Build an index where entry `i` of `positions` is particle `i`
    ///
    /// Returns `None` when there are no positions to index.
    ///
    /// # Example
    ///
    /// ```
    /// use particle_fracture::SpatialIndex;
    /// use glam::Vec3;
    ///
    /// let positions = vec![
    ///     Vec3::new(1.0, 0.0, 0.0),
    ///     Vec3::new(0.0, 1.0, 0.0),
    ///     Vec3::new(0.0, 0.0, 1.0),
    /// ];
    ///
    /// let index = SpatialIndex::new(&positions).unwrap();
    /// assert_eq!(index.find_nearest(Vec3::new(1.0, 0.1, 0.0)), 0);
    /// ```
    pub fn new(positions: &[Vec3]) -> Option<Self> {
        Self::from_entries(positions.iter().copied().enumerate())
    }

    /// Build an index from `(particle id, position)` pairs
    ///
    /// Used when only a subset of particles is eligible (e.g. born ones).
    pub fn from_entries<I>(entries: I) -> Option<Self>
    where
        I: IntoIterator<Item = (usize, Vec3)>,
    {
        let (ids, points): (Vec<usize>, Vec<[f32; 3]>) = entries
            .into_iter()
            .map(|(id, p)| (id, [p.x, p.y, p.z]))
            .unzip();

        if points.is_empty() {
            return None;
        }

        Some(Self {
            tree: ImmutableKdTree::new_from_slice(&points),
            ids,
        })
    }

    /// Number of indexed particles
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if the index is empty (never true for a constructed index)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Find the id of the particle nearest to a position
    pub fn find_nearest(&self, position: Vec3) -> usize {
        let query = [position.x, position.y, position.z];
        let result = self.tree.nearest_one::<SquaredEuclidean>(&query);
        self.ids[result.item as usize]
    }
}
