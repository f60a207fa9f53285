use glam::Vec2;

use std::collections::{HashMap, HashSet};

use crate::math::Aabb;
use crate::types::BodyHandle;

/// Occupancy numbers for the current grid contents.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GridStats {
    pub entries: usize,
    pub cells: usize,
    /// Sum of per-cell pair counts (n*(n-1)/2), counts duplicates across cells.
    pub candidate_pairs: usize,
    /// Unique pairs encountered when deduplicated across cells.
    pub unique_pairs: usize,
}

/// Uniform spatial hash used as the broad phase.
///
/// A body is bucketed into every cell its bounds touch. Rebuilt from scratch
/// each step.
#[derive(Clone, Debug)]
pub struct SpatialHash {
    cell_size: f32,
    entries: Vec<(BodyHandle, Aabb)>,
    // cell coord -> indices into `entries`
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl Default for SpatialHash {
    fn default() -> Self {
        Self::new(64.0)
    }
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1e-5),
            entries: Vec::new(),
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Change the bucket size. Drops the current contents.
    pub fn set_cell_size(&mut self, cell_size: f32) {
        self.cell_size = cell_size.max(1e-5);
        self.clear();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cells.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bucket `handle` into every cell `aabb` overlaps.
    pub fn insert(&mut self, handle: BodyHandle, aabb: Aabb) {
        let idx = self.entries.len();
        self.entries.push((handle, aabb));
        let (ix0, iy0) = self.world_to_cell(aabb.min);
        let (ix1, iy1) = self.world_to_cell(aabb.max);
        for iy in iy0..=iy1 {
            for ix in ix0..=ix1 {
                self.cells.entry((ix, iy)).or_default().push(idx);
            }
        }
    }

    /// Unique same-cell pairs whose bounds really overlap, ordered by
    /// insertion. Within a pair, the earlier-inserted body comes first.
    pub fn pairs(&self) -> Vec<(BodyHandle, BodyHandle)> {
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut out: Vec<(usize, usize)> = Vec::new();
        for indices in self.cells.values() {
            for i0 in 0..indices.len() {
                for i1 in (i0 + 1)..indices.len() {
                    let a = indices[i0];
                    let b = indices[i1];
                    let key = if a < b { (a, b) } else { (b, a) };
                    if !seen.insert(key) {
                        continue;
                    }
                    if self.entries[key.0].1.overlaps(&self.entries[key.1].1) {
                        out.push(key);
                    }
                }
            }
        }
        // cell iteration order is unspecified
        out.sort_unstable();
        out.into_iter().map(|(a, b)| (self.entries[a].0, self.entries[b].0)).collect()
    }

    /// Every body sharing a cell with `aabb`. A superset of exact overlap.
    pub fn query(&self, aabb: &Aabb) -> Vec<BodyHandle> {
        let (ix0, iy0) = self.world_to_cell(aabb.min);
        let (ix1, iy1) = self.world_to_cell(aabb.max);
        let mut hits: Vec<usize> = Vec::new();
        let mut seen = HashSet::new();
        for iy in iy0..=iy1 {
            for ix in ix0..=ix1 {
                if let Some(list) = self.cells.get(&(ix, iy)) {
                    hits.extend(list.iter().copied().filter(|&idx| seen.insert(idx)));
                }
            }
        }
        hits.sort_unstable();
        hits.into_iter().map(|idx| self.entries[idx].0).collect()
    }

    pub fn stats(&self) -> GridStats {
        let mut candidate_pairs: usize = 0;
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        for v in self.cells.values() {
            let n = v.len();
            if n >= 2 {
                candidate_pairs += n * (n - 1) / 2;
            }
            for i in 0..n {
                for j in (i + 1)..n {
                    let (a, b) = (v[i], v[j]);
                    seen.insert(if a < b { (a, b) } else { (b, a) });
                }
            }
        }
        GridStats {
            entries: self.entries.len(),
            cells: self.cells.len(),
            candidate_pairs,
            unique_pairs: seen.len(),
        }
    }

    fn world_to_cell(&self, p: Vec2) -> (i32, i32) {
        ((p.x / self.cell_size).floor() as i32, (p.y / self.cell_size).floor() as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn handles(n: usize) -> Vec<BodyHandle> {
        let mut sm: SlotMap<BodyHandle, ()> = SlotMap::with_key();
        (0..n).map(|_| sm.insert(())).collect()
    }

    fn boxed(cx: f32, cy: f32, h: f32) -> Aabb {
        Aabb::from_center_half_extents(Vec2::new(cx, cy), Vec2::splat(h))
    }

    #[test]
    fn test_insert_covers_straddled_cells() {
        let h = handles(1);
        let mut g = SpatialHash::new(1.0);
        g.insert(h[0], boxed(0.0, 0.0, 0.5));
        // With floor indexing, bounds straddling origin cover 4 cells
        let s = g.stats();
        assert_eq!(s.cells, 4);
        assert_eq!(s.entries, 1);
        for k in [(-1, -1), (-1, 0), (0, -1), (0, 0)] {
            assert_eq!(g.cells[&k].len(), 1);
        }
    }

    #[test]
    fn test_pair_spanning_cells_emitted_once() {
        let h = handles(2);
        let mut g = SpatialHash::new(1.0);
        g.insert(h[0], boxed(0.0, 0.0, 0.5));
        g.insert(h[1], boxed(0.2, 0.2, 0.5));
        let s = g.stats();
        assert_eq!(s.candidate_pairs, 4);
        assert_eq!(s.unique_pairs, 1);
        assert_eq!(g.pairs(), vec![(h[0], h[1])]);
    }

    #[test]
    fn test_same_cell_without_overlap_is_filtered() {
        let h = handles(2);
        let mut g = SpatialHash::new(64.0);
        g.insert(h[0], boxed(5.0, 5.0, 1.0));
        g.insert(h[1], boxed(50.0, 50.0, 1.0));
        assert_eq!(g.stats().unique_pairs, 1);
        assert!(g.pairs().is_empty());
    }

    #[test]
    fn test_query_is_superset() {
        let h = handles(3);
        let mut g = SpatialHash::new(10.0);
        g.insert(h[0], boxed(2.0, 2.0, 1.0));
        g.insert(h[1], boxed(8.0, 8.0, 1.0));
        g.insert(h[2], boxed(45.0, 45.0, 1.0));
        let hits = g.query(&boxed(1.0, 1.0, 0.5));
        // h[1] shares the cell but does not overlap the query box
        assert_eq!(hits, vec![h[0], h[1]]);
        g.clear();
        assert!(g.is_empty());
        assert!(g.query(&boxed(1.0, 1.0, 0.5)).is_empty());
    }

    #[test]
    fn test_resize_clears_and_rebuckets() {
        let h = handles(1);
        let mut g = SpatialHash::new(64.0);
        g.insert(h[0], boxed(0.0, 0.0, 50.0));
        assert_eq!(g.stats().cells, 4);
        g.set_cell_size(10.0);
        assert!(g.is_empty());
        g.insert(h[0], boxed(0.0, 0.0, 50.0));
        // -50..=50 spans cells -5..=5 on each axis
        assert_eq!(g.stats().cells, 121);
        g.set_cell_size(-1.0);
        assert!(g.cell_size() > 0.0);
    }
}
