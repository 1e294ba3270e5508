//! Layout positioning algorithms
//!
//! This module provides placement helpers shared by the layout engines.

/// Returns the largest value, or `0.0` for an empty collection.
pub(crate) fn max_or_zero<I>(values: I) -> f32
where
    I: IntoIterator<Item = f32>,
{
    values.into_iter().fold(0.0, f32::max)
}

/// Calculate additional spacing needed based on text labels
///
/// Returns the width needed for the widest label plus padding on both sides,
/// or 0 if there are no labels.
pub(crate) fn calculate_label_spacing<I>(label_widths: I, padding: f32) -> f32
where
    I: IntoIterator<Item = f32>,
{
    label_widths
        .into_iter()
        .map(|width| width + 2.0 * padding)
        .fold(0.0, f32::max)
}

/// Extent of an element around its anchor along one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Extent {
    pub before: f32,
    pub after: f32,
}

impl Extent {
    pub fn new(before: f32, after: f32) -> Self {
        Self { before, after }
    }

    /// An extent centered on its anchor.
    pub fn symmetric(size: f32) -> Self {
        Self::new(size / 2.0, size / 2.0)
    }

    /// Grows the extent so it covers `other` as well.
    pub fn cover(&mut self, other: Extent) {
        self.before = self.before.max(other.before);
        self.after = self.after.max(other.after);
    }
}

/// Minimum distance between the anchors of two elements in a row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MinDistance {
    pub left: usize,
    pub right: usize,
    pub distance: f32,
}

/// Distribute elements along a row with appropriate spacing
///
/// Places elements left to right so that the extent of consecutive elements
/// is separated by at least `min_spacing`, and every [`MinDistance`] between
/// a left and a right element is honored. The first element's extent starts
/// at zero.
///
/// Distances whose `left` is not smaller than `right` are ignored.
///
/// # Returns
/// The anchor position of each element
pub(crate) fn distribute_horizontally(
    extents: &[Extent],
    min_spacing: f32,
    min_distances: &[MinDistance],
) -> Vec<f32> {
    let mut positions: Vec<f32> = Vec::with_capacity(extents.len());

    for (i, extent) in extents.iter().enumerate() {
        let mut position = match i.checked_sub(1) {
            None => extent.before,
            Some(prev) => positions[prev] + extents[prev].after + min_spacing + extent.before,
        };

        for constraint in min_distances
            .iter()
            .filter(|c| c.right == i && c.left < c.right)
        {
            position = position.max(positions[constraint.left] + constraint.distance);
        }

        positions.push(position);
    }

    positions
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_max_or_zero() {
        assert_eq!(max_or_zero([]), 0.0);
        assert_eq!(max_or_zero([1.0, 5.0, 3.0]), 5.0);
    }

    #[test]
    fn test_calculate_label_spacing() {
        assert_eq!(calculate_label_spacing([], 4.0), 0.0);
        assert_eq!(calculate_label_spacing([10.0, 30.0], 5.0), 40.0);
    }

    #[test]
    fn test_distribute_without_constraints() {
        let extents = [
            Extent::symmetric(20.0),
            Extent::symmetric(40.0),
            Extent::new(5.0, 15.0),
        ];
        let positions = distribute_horizontally(&extents, 10.0, &[]);
        assert_approx_eq!(f32, positions[0], 10.0);
        assert_approx_eq!(f32, positions[1], 10.0 + 10.0 + 10.0 + 20.0);
        assert_approx_eq!(f32, positions[2], 50.0 + 20.0 + 10.0 + 5.0);
    }

    #[test]
    fn test_distribute_honors_min_distance() {
        let extents = [Extent::symmetric(10.0); 3];
        let positions = distribute_horizontally(
            &extents,
            10.0,
            &[MinDistance {
                left: 0,
                right: 2,
                distance: 100.0,
            }],
        );
        assert_approx_eq!(f32, positions[1], 25.0);
        assert_approx_eq!(f32, positions[2], 105.0);
    }

    #[test]
    fn test_distribute_ignores_backward_distance() {
        let extents = [Extent::symmetric(10.0); 2];
        let positions = distribute_horizontally(
            &extents,
            10.0,
            &[MinDistance {
                left: 1,
                right: 0,
                distance: 500.0,
            }],
        );
        assert_approx_eq!(f32, positions[0], 5.0);
        assert_approx_eq!(f32, positions[1], 25.0);
    }

    #[test]
    fn test_extent_cover() {
        let mut extent = Extent::new(1.0, 5.0);
        extent.cover(Extent::new(3.0, 2.0));
        assert_eq!(extent, Extent::new(3.0, 5.0));
    }
}
