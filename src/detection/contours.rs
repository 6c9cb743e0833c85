use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};

use crate::error::{DetectError, Result};
use crate::models::{Contour, HierarchyEntry};

/// Contours of one mask plus the parallel hierarchy table
#[derive(Debug, Clone, Default)]
pub struct ContourSet {
    pub contours: Vec<Contour>,
    pub hierarchy: Vec<HierarchyEntry>,
}

impl ContourSet {
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contours.len()
    }

    /// Direct children of `index`, following the sibling chain
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let first = self.hierarchy.get(index).and_then(|e| e.first_child);
        std::iter::successors(first, |&c| self.hierarchy.get(c).and_then(|e| e.next))
    }
}

/// Trace every border in a binary mask (non-zero = foreground), keeping holes
pub fn analyze(mask: &GrayImage) -> ContourSet {
    let traced = find_contours::<i32>(mask);

    let parents: Vec<Option<usize>> = traced.iter().map(|c| c.parent).collect();
    let contours = traced
        .into_iter()
        .map(|c| {
            let is_hole = matches!(c.border_type, BorderType::Hole);
            Contour::new(c.points, is_hole)
        })
        .collect();

    ContourSet {
        contours,
        hierarchy: build_hierarchy(&parents),
    }
}

/// Derive next/previous/first-child links from parent pointers.
///
/// Siblings are chained in index order. Panics if a parent index is out of
/// range.
pub fn build_hierarchy(parents: &[Option<usize>]) -> Vec<HierarchyEntry> {
    let mut entries = vec![HierarchyEntry::default(); parents.len()];
    let mut last_child: Vec<Option<usize>> = vec![None; parents.len()];
    let mut last_root: Option<usize> = None;

    for (i, parent) in parents.iter().enumerate() {
        entries[i].parent = *parent;

        let previous = match parent {
            Some(p) => {
                let prev = last_child[*p].replace(i);
                if prev.is_none() {
                    entries[*p].first_child = Some(i);
                }
                prev
            }
            None => last_root.replace(i),
        };

        entries[i].previous = previous;
        if let Some(prev) = previous {
            entries[prev].next = Some(i);
        }
    }

    entries
}

/// Pick the largest contour and the largest of its direct children.
///
/// Ties go to the lowest index. The inner index is `None` when the outer
/// contour has no children.
pub fn select_largest_and_child(set: &ContourSet) -> Result<(usize, Option<usize>)> {
    if set.contours.is_empty() {
        return Err(DetectError::InvalidInput("no contours to select from"));
    }
    if set.hierarchy.len() != set.contours.len() {
        return Err(DetectError::InvalidInput("hierarchy does not match contour list"));
    }

    let areas: Vec<f64> = set.contours.iter().map(Contour::area).collect();

    let mut outer = 0;
    for (i, area) in areas.iter().enumerate().skip(1) {
        if *area > areas[outer] {
            outer = i;
        }
    }

    let mut inner: Option<usize> = None;
    for child in set.children(outer) {
        if inner.is_none_or(|best| areas[child] > areas[best]) {
            inner = Some(child);
        }
    }

    Ok((outer, inner))
}
