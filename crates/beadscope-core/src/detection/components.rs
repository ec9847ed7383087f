use ndarray::Array3;

/// Statistics for a single connected component.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentStats {
    /// Label in the returned label volume (1-based).
    pub label: u32,
    /// Number of voxels in the component.
    pub voxel_count: usize,
    /// Inclusive bounding box: (min, max) per axis in (z, y, x) order.
    pub bbox: [(usize, usize); 3],
}

/// Label volume plus per-component statistics.
#[derive(Clone, Debug)]
pub struct LabeledVolume {
    /// 0 for background, otherwise the component label.
    pub labels: Array3<u32>,
    /// Components ordered by label.
    pub components: Vec<ComponentStats>,
}

/// Offsets of the 13 neighbors already visited in raster order; together
/// with their mirror images they form the 26-neighborhood.
const BACKWARD_NEIGHBORS: [(isize, isize, isize); 13] = [
    (-1, -1, -1),
    (-1, -1, 0),
    (-1, -1, 1),
    (-1, 0, -1),
    (-1, 0, 0),
    (-1, 0, 1),
    (-1, 1, -1),
    (-1, 1, 0),
    (-1, 1, 1),
    (0, -1, -1),
    (0, -1, 0),
    (0, -1, 1),
    (0, 0, -1),
];

/// Label the 26-connected components of a binary volume using two-pass
/// labeling with union-find.
///
/// Final labels are consecutive from 1, numbered in raster order of each
/// component's first voxel.
pub fn label_components(mask: &Array3<bool>) -> LabeledVolume {
    let (d, h, w) = mask.dim();
    let mut labels = Array3::<u32>::zeros((d, h, w));
    if mask.is_empty() {
        return LabeledVolume {
            labels,
            components: Vec::new(),
        };
    }

    // Index 0 unused; provisional labels start at 1.
    let mut parent: Vec<u32> = vec![0];

    // Pass 1: provisional labels.
    for z in 0..d {
        for y in 0..h {
            for x in 0..w {
                if !mask[[z, y, x]] {
                    continue;
                }

                let mut current = 0u32;
                for &(dz, dy, dx) in &BACKWARD_NEIGHBORS {
                    let (nz, ny, nx) = (z as isize + dz, y as isize + dy, x as isize + dx);
                    if nz < 0 || ny < 0 || nx < 0 || ny >= h as isize || nx >= w as isize {
                        continue;
                    }
                    let neighbor = labels[[nz as usize, ny as usize, nx as usize]];
                    if neighbor == 0 {
                        continue;
                    }
                    if current == 0 {
                        current = neighbor;
                    } else if neighbor != current {
                        union(&mut parent, current, neighbor);
                        current = current.min(neighbor);
                    }
                }

                if current == 0 {
                    current = parent.len() as u32;
                    parent.push(current);
                }
                labels[[z, y, x]] = current;
            }
        }
    }

    // Pass 2: resolve roots, renumber in raster order and collect stats.
    let mut final_label = vec![0u32; parent.len()];
    let mut components: Vec<ComponentStats> = Vec::new();

    for ((z, y, x), lbl) in labels.indexed_iter_mut() {
        if *lbl == 0 {
            continue;
        }
        let root = find(&parent, *lbl) as usize;
        if final_label[root] == 0 {
            components.push(ComponentStats {
                label: components.len() as u32 + 1,
                voxel_count: 0,
                bbox: [(z, z), (y, y), (x, x)],
            });
            final_label[root] = components.len() as u32;
        }
        let label = final_label[root];
        *lbl = label;

        let entry = &mut components[label as usize - 1];
        entry.voxel_count += 1;
        for (bound, v) in entry.bbox.iter_mut().zip([z, y, x]) {
            bound.0 = bound.0.min(v);
            bound.1 = bound.1.max(v);
        }
    }

    LabeledVolume { labels, components }
}

fn find(parent: &[u32], mut x: u32) -> u32 {
    while parent[x as usize] != x {
        x = parent[x as usize];
    }
    x
}

fn union(parent: &mut [u32], a: u32, b: u32) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        let (small, big) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[big as usize] = small;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_voxels_are_connected() {
        let mut mask = Array3::from_elem((3, 3, 3), false);
        mask[[0, 0, 0]] = true;
        mask[[1, 1, 1]] = true;
        mask[[2, 2, 2]] = true;
        let labeled = label_components(&mask);
        assert_eq!(labeled.components.len(), 1);
        assert_eq!(labeled.components[0].voxel_count, 3);
        assert_eq!(labeled.components[0].bbox, [(0, 2), (0, 2), (0, 2)]);
    }

    #[test]
    fn test_separated_voxels_get_raster_ordered_labels() {
        let mut mask = Array3::from_elem((1, 1, 5), false);
        mask[[0, 0, 4]] = true;
        mask[[0, 0, 0]] = true;
        let labeled = label_components(&mask);
        assert_eq!(labeled.components.len(), 2);
        assert_eq!(labeled.labels[[0, 0, 0]], 1);
        assert_eq!(labeled.labels[[0, 0, 4]], 2);
    }

    #[test]
    fn test_u_shape_merges() {
        // Two arms joined only at the bottom row.
        let mut mask = Array3::from_elem((1, 3, 3), false);
        for y in 0..3 {
            mask[[0, y, 0]] = true;
            mask[[0, y, 2]] = true;
        }
        mask[[0, 2, 1]] = true;
        let labeled = label_components(&mask);
        assert_eq!(labeled.components.len(), 1);
        assert!(labeled.labels.iter().filter(|&&l| l > 0).all(|&l| l == 1));
    }
}
