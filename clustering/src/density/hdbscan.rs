use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::fmt::Display;

use linfa::traits::Transformer;
use linfa::ParamGuard;
use linfa_nn::distance::{Distance, L2Dist};
use linfa_nn::{BallTreeIndex, BuildError, NearestNeighbourIndex, NnError};
use log::debug;
use ndarray::{Array1, ArrayBase, Axis, Data, Ix2};

const LEAF_SIZE: usize = 16;

/// Neighbours per point whose edges are offered to the spanning tree. Windows of at most
/// `CANDIDATE_NEIGHBOURS + 1` points get the exact tree.
const CANDIDATE_NEIGHBOURS: usize = 16;

// merge distances of zero (duplicated points) would give infinite lambdas
const MIN_DISTANCE: f64 = 1e-10;

/// Hierarchical density based clustering with excess-of-mass cluster selection.
///
/// ```ignore
/// let labels = Hdbscan::params(6)
///     .min_samples(3)
///     .check()?
///     .transform(&points)?;
/// ```
pub struct Hdbscan;

impl Hdbscan {
    pub fn params(min_cluster_size: usize) -> HdbscanParams {
        HdbscanParams(HdbscanValidParams {
            min_cluster_size,
            min_samples: None,
            allow_single_cluster: false,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HdbscanValidParams {
    min_cluster_size: usize,
    min_samples: Option<usize>,
    allow_single_cluster: bool,
}

impl HdbscanValidParams {
    pub fn min_cluster_size(&self) -> usize {
        self.min_cluster_size
    }

    /// Neighbourhood size used for core distances. Falls back to `min_cluster_size`.
    pub fn effective_min_samples(&self) -> usize {
        self.min_samples.unwrap_or(self.min_cluster_size)
    }

    pub fn allow_single_cluster(&self) -> bool {
        self.allow_single_cluster
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HdbscanParams(HdbscanValidParams);

impl HdbscanParams {
    pub fn min_samples(mut self, min_samples: usize) -> Self {
        self.0.min_samples = Some(min_samples);
        self
    }

    /// If no split of the whole data set yields two clusters of at least `min_cluster_size`
    /// points, the data set itself may be reported as one cluster.
    pub fn allow_single_cluster(mut self, allow_single_cluster: bool) -> Self {
        self.0.allow_single_cluster = allow_single_cluster;
        self
    }
}

impl ParamGuard for HdbscanParams {
    type Checked = HdbscanValidParams;
    type Error = HdbscanError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.min_cluster_size < 2 {
            Err(HdbscanError::InvalidMinClusterSize(self.0.min_cluster_size))
        } else if self.0.min_samples == Some(0) {
            Err(HdbscanError::InvalidMinSamples(0))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<D: Data<Elem = f64>> Transformer<&ArrayBase<D, Ix2>, Result<Array1<Option<usize>>, HdbscanError>>
    for HdbscanValidParams
{
    /// Labels every row with a cluster index (`0..k`, ordered by the position of the cluster in
    /// the condensed tree) or `None` for noise.
    fn transform(&self, points: &ArrayBase<D, Ix2>) -> Result<Array1<Option<usize>>, HdbscanError> {
        let n = points.nrows();
        if n < self.min_cluster_size.max(2) {
            return Ok(Array1::from_elem(n, None));
        }

        let k = self.effective_min_samples().min(n);
        let (core, neighbours) = nearest_neighbours(points, k)?;
        let edges = minimum_spanning_tree(points, &core, &neighbours)?;
        let hierarchy = single_linkage(n, edges);
        let tree = CondensedTree::new(&hierarchy, n, self.min_cluster_size);
        let selected = tree.select_clusters(self.allow_single_cluster);

        Ok(tree.label_points(&selected))
    }
}

/// A spanning tree edge `(a, b, mutual reachability)` with `a < b`.
type Edge = (usize, usize, f64);

fn edge(a: usize, b: usize, weight: f64) -> Edge {
    (a.min(b), a.max(b), weight)
}

/// Orders edges by weight, then by their end points, so every tie is broken the same way.
fn edge_order(a: &Edge, b: &Edge) -> Ordering {
    a.2.total_cmp(&b.2)
        .then(a.0.cmp(&b.0))
        .then(a.1.cmp(&b.1))
}

/// The nearest `max(k, CANDIDATE_NEIGHBOURS + 1)` points of every point, closest first and the
/// point itself included, and the core distances: the distance to the k-th of them.
fn nearest_neighbours<D: Data<Elem = f64>>(
    points: &ArrayBase<D, Ix2>,
    k: usize,
) -> Result<(Vec<f64>, Vec<Vec<(usize, f64)>>), HdbscanError> {
    let index = BallTreeIndex::new(points, LEAF_SIZE, L2Dist)?;
    let count = k.max(CANDIDATE_NEIGHBOURS + 1).min(points.nrows());

    let neighbours = points.rows().into_iter()
        .map(|point| -> Result<Vec<(usize, f64)>, HdbscanError> {
            let mut found = index.k_nearest(point, count)?
                .into_iter()
                .map(|(neighbour, i)| (i, L2Dist.distance(point, neighbour)))
                .collect::<Vec<_>>();
            found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            Ok(found)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let core = neighbours.iter()
        .map(|found| found.get(k - 1).map_or(0.0, |&(_, distance)| distance))
        .collect();

    Ok((core, neighbours))
}

fn mutual_reachability(distance: f64, core: &[f64], a: usize, b: usize) -> f64 {
    distance.max(core[a]).max(core[b])
}

/// Kruskal over the mutual reachability edges between every point and its nearest neighbours.
/// Groups the neighbour graph leaves disconnected are joined afterwards by `bridge_components`.
fn minimum_spanning_tree<D: Data<Elem = f64>>(
    points: &ArrayBase<D, Ix2>,
    core: &[f64],
    neighbours: &[Vec<(usize, f64)>],
) -> Result<Vec<Edge>, HdbscanError> {
    let n = points.nrows();

    let mut candidates: Vec<Edge> = neighbours.iter()
        .enumerate()
        .flat_map(|(a, found)| {
            found.iter()
                .filter(move |&&(b, _)| b != a)
                .map(move |&(b, distance)| edge(a, b, mutual_reachability(distance, core, a, b)))
        })
        .collect();
    candidates.sort_by(edge_order);
    candidates.dedup();

    let mut components = DisjointSet::new(n);
    let mut edges = Vec::with_capacity(n.saturating_sub(1));
    for candidate in candidates {
        if components.union(candidate.0, candidate.1) {
            edges.push(candidate);
        }
    }

    if edges.len() + 1 < n {
        bridge_components(points, core, &mut components, &mut edges)?;
    }

    Ok(edges)
}

/// Borůvka rounds over the components left by the neighbour graph. For every component, each
/// outside point looks up its nearest members in a ball tree over the component, and the shortest
/// of those edges joins the component to the rest. Every round at least halves the components.
fn bridge_components<D: Data<Elem = f64>>(
    points: &ArrayBase<D, Ix2>,
    core: &[f64],
    components: &mut DisjointSet,
    edges: &mut Vec<Edge>,
) -> Result<(), HdbscanError> {
    let n = points.nrows();

    loop {
        let roots: Vec<usize> = (0..n).map(|point| components.find(point)).collect();
        let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (point, &root) in roots.iter().enumerate() {
            members.entry(root).or_default().push(point);
        }
        if members.len() <= 1 {
            return Ok(());
        }

        debug!(target: "hdbscan", "Bridging {} disconnected groups of the neighbour graph", members.len());

        let mut shortest = Vec::with_capacity(members.len());
        for (&root, member_points) in &members {
            let inside = points.select(Axis(0), member_points);
            let index = BallTreeIndex::new(&inside, LEAF_SIZE, L2Dist)?;
            let count = member_points.len().min(CANDIDATE_NEIGHBOURS);

            let mut best: Option<Edge> = None;
            for outside in (0..n).filter(|&point| roots[point] != root) {
                let point = points.row(outside);
                for (neighbour, i) in index.k_nearest(point, count)? {
                    let member = member_points[i];
                    let distance = L2Dist.distance(point, neighbour);
                    let candidate = edge(member, outside, mutual_reachability(distance, core, member, outside));
                    if best.map_or(true, |best| edge_order(&candidate, &best).is_lt()) {
                        best = Some(candidate);
                    }
                }
            }
            shortest.extend(best);
        }

        shortest.sort_by(edge_order);
        for candidate in shortest {
            if components.union(candidate.0, candidate.1) {
                edges.push(candidate);
            }
        }
    }
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self { parent: (0..size).collect() }
    }

    fn find(&mut self, node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = node;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// False if `a` and `b` already were in the same set.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (a, b) = (self.find(a), self.find(b));
        if a == b {
            return false;
        }
        self.parent[a.max(b)] = a.min(b);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Merge {
    left: usize,
    right: usize,
    distance: f64,
    size: usize,
}

/// Single linkage dendrogram. Leaves are the points `0..n`, merge `i` creates node `n + i`.
fn single_linkage(n: usize, mut edges: Vec<Edge>) -> Vec<Merge> {
    edges.sort_by(edge_order);

    let mut nodes = DisjointSet::new(2 * n - 1);
    let mut size = vec![1; 2 * n - 1];

    edges.into_iter()
        .enumerate()
        .map(|(i, (a, b, distance))| {
            let left = nodes.find(a);
            let right = nodes.find(b);
            let node = n + i;
            size[node] = size[left] + size[right];
            nodes.parent[left] = node;
            nodes.parent[right] = node;
            Merge { left, right, distance, size: size[node] }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CondensedEdge {
    parent: usize,
    child: usize,
    lambda: f64,
    size: usize,
}

/// The dendrogram with every split that leaves fewer than `min_cluster_size` points on one side
/// replaced by those points falling out of the surviving cluster. Clusters are numbered from `n`
/// (the root) upwards, points keep their index.
struct CondensedTree {
    n: usize,
    edges: Vec<CondensedEdge>,
    cluster_count: usize,
}

impl CondensedTree {
    fn new(hierarchy: &[Merge], n: usize, min_cluster_size: usize) -> Self {
        let root = 2 * n - 2;
        let node_size = |node: usize| if node < n { 1 } else { hierarchy[node - n].size };

        let mut relabel = vec![0; 2 * n - 1];
        relabel[root] = n;
        let mut next_label = n + 1;
        let mut ignore = vec![false; 2 * n - 1];
        let mut edges = Vec::with_capacity(2 * n);

        for node in descendants(hierarchy, n, root) {
            if node < n || ignore[node] {
                continue;
            }

            let Merge { left, right, distance, .. } = hierarchy[node - n];
            let cluster = relabel[node];
            let lambda = 1.0 / distance.max(MIN_DISTANCE);
            let (left_size, right_size) = (node_size(left), node_size(right));

            match (left_size >= min_cluster_size, right_size >= min_cluster_size) {
                (true, true) => {
                    for (child, child_size) in [(left, left_size), (right, right_size)] {
                        relabel[child] = next_label;
                        edges.push(CondensedEdge { parent: cluster, child: next_label, lambda, size: child_size });
                        next_label += 1;
                    }
                }
                (false, false) => {
                    fall_out(hierarchy, n, left, cluster, lambda, &mut ignore, &mut edges);
                    fall_out(hierarchy, n, right, cluster, lambda, &mut ignore, &mut edges);
                }
                (false, true) => {
                    relabel[right] = cluster;
                    fall_out(hierarchy, n, left, cluster, lambda, &mut ignore, &mut edges);
                }
                (true, false) => {
                    relabel[left] = cluster;
                    fall_out(hierarchy, n, right, cluster, lambda, &mut ignore, &mut edges);
                }
            }
        }

        Self { n, edges, cluster_count: next_label - n }
    }

    fn root(&self) -> usize {
        self.n
    }

    fn cluster_edges(&self) -> impl Iterator<Item = &CondensedEdge> {
        self.edges.iter().filter(|edge| edge.child >= self.n)
    }

    /// Persistence of every cluster: the sum over its points of how long (in lambda) they stay
    /// in the cluster after its birth. Indexed by `cluster - n`.
    fn stabilities(&self) -> Vec<f64> {
        let mut birth = vec![0.0; self.cluster_count];
        for edge in self.cluster_edges() {
            birth[edge.child - self.n] = edge.lambda;
        }

        let mut stability = vec![0.0; self.cluster_count];
        for edge in &self.edges {
            let parent = edge.parent - self.n;
            stability[parent] += (edge.lambda - birth[parent]) * edge.size as f64;
        }
        stability
    }

    fn child_clusters(&self, cluster: usize) -> impl Iterator<Item = usize> + '_ {
        self.cluster_edges()
            .filter(move |edge| edge.parent == cluster)
            .map(|edge| edge.child)
    }

    /// Excess of mass selection. Children are visited before their parents (child ids are always
    /// larger), so a parent competes against the best selection found in its subtree.
    fn select_clusters(&self, allow_single_cluster: bool) -> Vec<bool> {
        let mut stability = self.stabilities();
        let mut selected = vec![true; self.cluster_count];
        selected[0] = false;

        for cluster in (self.n + 1..self.n + self.cluster_count).rev() {
            let subtree: f64 = self.child_clusters(cluster)
                .map(|child| stability[child - self.n])
                .sum();

            if subtree > stability[cluster - self.n] {
                selected[cluster - self.n] = false;
                stability[cluster - self.n] = subtree;
            } else {
                let mut queue: VecDeque<usize> = self.child_clusters(cluster).collect();
                while let Some(descendant) = queue.pop_front() {
                    selected[descendant - self.n] = false;
                    queue.extend(self.child_clusters(descendant));
                }
            }
        }

        if allow_single_cluster && !selected.iter().any(|&s| s) {
            selected[0] = true;
        }

        selected
    }

    fn label_points(&self, selected: &[bool]) -> Array1<Option<usize>> {
        let mut ordinal = vec![None; self.cluster_count];
        for (label, cluster) in (0..self.cluster_count).filter(|&c| selected[c]).enumerate() {
            ordinal[cluster] = Some(label);
        }

        let mut parent_cluster = vec![None; self.cluster_count];
        for edge in self.cluster_edges() {
            parent_cluster[edge.child - self.n] = Some(edge.parent);
        }

        // points only belong to a selected root if they stay until the whole data set dissolves
        let root_threshold = self.edges.iter()
            .filter(|edge| edge.parent == self.root())
            .map(|edge| edge.lambda)
            .fold(f64::NEG_INFINITY, f64::max);

        let mut labels = Array1::from_elem(self.n, None);
        for edge in self.edges.iter().filter(|edge| edge.child < self.n) {
            let mut cluster = edge.parent;
            while !selected[cluster - self.n] {
                match parent_cluster[cluster - self.n] {
                    Some(parent) => cluster = parent,
                    None => break,
                }
            }

            if !selected[cluster - self.n] {
                continue;
            }
            if cluster == self.root() && edge.lambda < root_threshold {
                continue;
            }
            labels[edge.child] = ordinal[cluster - self.n];
        }

        labels
    }
}

/// Every point below `node` leaves `cluster` at the same lambda.
fn fall_out(
    hierarchy: &[Merge],
    n: usize,
    node: usize,
    cluster: usize,
    lambda: f64,
    ignore: &mut [bool],
    edges: &mut Vec<CondensedEdge>,
) {
    for descendant in descendants(hierarchy, n, node) {
        if descendant < n {
            edges.push(CondensedEdge { parent: cluster, child: descendant, lambda, size: 1 });
        }
        ignore[descendant] = true;
    }
}

/// Breadth first walk over the dendrogram below `node`, including `node`.
fn descendants(hierarchy: &[Merge], n: usize, node: usize) -> Vec<usize> {
    let mut order = vec![node];
    let mut position = 0;
    while position < order.len() {
        let current = order[position];
        if current >= n {
            let merge = &hierarchy[current - n];
            order.push(merge.left);
            order.push(merge.right);
        }
        position += 1;
    }
    order
}

#[derive(thiserror::Error, Debug)]
pub enum HdbscanError {
    InvalidMinClusterSize(usize),
    InvalidMinSamples(usize),
    Build(#[from] BuildError),
    Nn(#[from] NnError),
}

impl Display for HdbscanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HdbscanError::InvalidMinClusterSize(size) => {
                write!(f, "min_cluster_size must be at least 2, got {}", size)
            }
            HdbscanError::InvalidMinSamples(samples) => {
                write!(f, "min_samples must be at least 1, got {}", samples)
            }
            HdbscanError::Build(err) => write!(f, "Building the neighbour index failed: {}", err),
            HdbscanError::Nn(err) => write!(f, "Neighbour query failed: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn blob(center: (f64, f64), count: usize, spread: f64) -> Vec<[f64; 2]> {
        (0..count)
            .map(|i| {
                let angle = i as f64 * 2.399963;
                let radius = spread * ((i + 1) as f64 / count as f64).sqrt();
                [center.0 + radius * angle.cos(), center.1 + radius * angle.sin()]
            })
            .collect()
    }

    fn to_array(points: &[[f64; 2]]) -> Array2<f64> {
        Array2::from_shape_fn((points.len(), 2), |(row, column)| points[row][column])
    }

    fn run(params: HdbscanParams, points: &Array2<f64>) -> Vec<Option<usize>> {
        params.check().unwrap().transform(points).unwrap().to_vec()
    }

    #[test]
    fn test_separates_two_blobs() {
        let mut points = blob((0.0, 0.0), 10, 0.5);
        points.extend(blob((20.0, 20.0), 10, 0.5));
        let points = to_array(&points);

        // no blob can split into two clusters of 6
        let labels = run(Hdbscan::params(6), &points);

        assert!(labels.iter().all(|label| label.is_some()));
        let first = labels[0];
        let second = labels[10];
        assert_ne!(first, second);
        assert!(labels[..10].iter().all(|&label| label == first));
        assert!(labels[10..].iter().all(|&label| label == second));
    }

    #[test]
    fn test_outlier_is_noise() {
        let mut points = blob((0.0, 0.0), 8, 0.5);
        points.extend(blob((20.0, 0.0), 8, 0.5));
        points.push([100.0, 100.0]);
        let points = to_array(&points);

        let labels = run(Hdbscan::params(5), &points);

        assert_eq!(labels[16], None);
        assert!(labels[..16].iter().all(|label| label.is_some()));
    }

    #[test]
    fn test_single_dense_group_needs_allow_single_cluster() {
        let points = to_array(&blob((5.0, 5.0), 6, 0.1));

        let without = run(Hdbscan::params(6), &points);
        let with = run(Hdbscan::params(6).allow_single_cluster(true), &points);

        assert!(without.iter().all(|label| label.is_none()));
        assert!(with.iter().all(|&label| label == Some(0)));
    }

    #[test]
    fn test_too_few_points_are_noise() {
        let points = array![[0.0, 0.0], [0.1, 0.0], [0.0, 0.1]];

        let labels = run(Hdbscan::params(4).allow_single_cluster(true), &points);

        assert_eq!(labels, vec![None, None, None]);
    }

    #[test]
    fn test_identical_points() {
        let points = Array2::zeros((5, 3));

        let labels = run(Hdbscan::params(2).allow_single_cluster(true), &points);

        assert!(labels.iter().all(|&label| label == Some(0)));
    }

    #[test]
    fn test_is_deterministic() {
        let mut points = blob((0.0, 0.0), 12, 1.0);
        points.extend(blob((3.0, 0.0), 12, 1.0));
        points.extend(blob((30.0, 30.0), 5, 0.2));
        let points = to_array(&points);
        let params = Hdbscan::params(3).min_samples(2);

        let first = run(params.clone(), &points);
        let second = run(params, &points);

        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_params() {
        assert!(matches!(
            Hdbscan::params(1).check(),
            Err(HdbscanError::InvalidMinClusterSize(1)),
        ));
        assert!(matches!(
            Hdbscan::params(5).min_samples(0).check(),
            Err(HdbscanError::InvalidMinSamples(0)),
        ));
    }

    /// Prim on the complete mutual reachability graph.
    fn dense_minimum_spanning_tree(points: &Array2<f64>, core: &[f64]) -> Vec<Edge> {
        let n = points.nrows();
        let mut in_tree = vec![false; n];
        let mut distance = vec![f64::INFINITY; n];
        let mut nearest = vec![0; n];
        let mut edges = Vec::new();

        let mut current = 0;
        for _ in 1..n {
            in_tree[current] = true;
            let mut next: Option<usize> = None;
            for candidate in (0..n).filter(|&c| !in_tree[c]) {
                let reachability = mutual_reachability(
                    L2Dist.distance(points.row(current), points.row(candidate)), core, current, candidate,
                );
                if reachability < distance[candidate] {
                    distance[candidate] = reachability;
                    nearest[candidate] = current;
                }
                if next.map_or(true, |best| distance[candidate] < distance[best]) {
                    next = Some(candidate);
                }
            }
            let next = next.unwrap();
            edges.push(edge(nearest[next], next, distance[next]));
            current = next;
        }
        edges
    }

    fn sorted_weights(edges: &[Edge]) -> Vec<f64> {
        let mut weights: Vec<f64> = edges.iter().map(|edge| edge.2).collect();
        weights.sort_by(f64::total_cmp);
        weights
    }

    fn spans(n: usize, edges: &[Edge]) -> bool {
        let mut components = DisjointSet::new(n);
        edges.len() + 1 == n && edges.iter().all(|&(a, b, _)| components.union(a, b))
    }

    /// Uniform points in the unit cube from a fixed xorshift sequence.
    fn scattered(count: usize, dimension: usize) -> Array2<f64> {
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        Array2::from_shape_fn((count, dimension), |_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 11) as f64 / (1u64 << 53) as f64
        })
    }

    #[test]
    fn test_minimum_spanning_tree_connects_all_points() {
        let points = array![[0.0, 0.0], [1.0, 0.0], [5.0, 0.0], [5.0, 1.0]];
        let (_, neighbours) = nearest_neighbours(&points, 1).unwrap();
        let core = vec![0.0; 4];

        let edges = minimum_spanning_tree(&points, &core, &neighbours).unwrap();

        assert_eq!(edges, vec![(0, 1, 1.0), (2, 3, 1.0), (1, 2, 4.0)]);
    }

    #[test]
    fn test_core_distances_count_the_point_itself() {
        let points = array![[0.0], [1.0], [3.0], [7.0]];

        let (core, neighbours) = nearest_neighbours(&points, 2).unwrap();

        assert_eq!(core, vec![1.0, 1.0, 2.0, 4.0]);
        assert_eq!(neighbours[2][0], (2, 0.0));
        assert_eq!(neighbours[2].len(), 4);
    }

    #[test]
    fn test_separated_groups_are_bridged() {
        // every point's neighbours lie in its own group, so the groups are only joined by bridging
        let mut points = blob((0.0, 0.0), 20, 1.0);
        points.extend(blob((100.0, 0.0), 20, 1.0));
        points.extend(blob((0.0, 250.0), 20, 1.0));
        let points = to_array(&points);
        let (core, neighbours) = nearest_neighbours(&points, 3).unwrap();
        assert!(neighbours.iter().enumerate().all(|(point, found)| {
            found.iter().all(|&(other, _)| other / 20 == point / 20)
        }));

        let edges = minimum_spanning_tree(&points, &core, &neighbours).unwrap();

        assert!(spans(60, &edges));
        let long = |edges: &[Edge]| sorted_weights(edges).into_iter().filter(|&w| w > 50.0).collect::<Vec<_>>();
        let exact = dense_minimum_spanning_tree(&points, &core);
        assert_eq!(long(&edges).len(), 2);
        assert_eq!(long(&edges), long(&exact));
    }

    #[test]
    fn test_spanning_tree_close_to_exact() {
        let points = scattered(400, 2);
        let (core, neighbours) = nearest_neighbours(&points, 5).unwrap();

        let edges = minimum_spanning_tree(&points, &core, &neighbours).unwrap();
        let exact = dense_minimum_spanning_tree(&points, &core);

        assert!(spans(400, &edges));
        let weight: f64 = edges.iter().map(|edge| edge.2).sum();
        let exact_weight: f64 = exact.iter().map(|edge| edge.2).sum();
        assert!(weight >= exact_weight - 1e-9);
        assert!(weight <= exact_weight * 1.05, "{} against {}", weight, exact_weight);
    }

    #[test]
    fn test_large_window_only_uses_neighbour_edges() {
        // a full day of passengers in one window; the complete graph would have ~2 * 10^8 edges
        let n = 20_000;
        let points = scattered(n, 5);
        let (core, neighbours) = nearest_neighbours(&points, 6).unwrap();

        assert!(neighbours.iter().all(|found| found.len() == CANDIDATE_NEIGHBOURS + 1));

        let edges = minimum_spanning_tree(&points, &core, &neighbours).unwrap();

        assert!(spans(n, &edges));
    }
}
