use crate::model::bounds::BoundingBox;
use crate::model::options::TilerOptions;
use crate::model::point::PointRecord;

pub type NodeId = usize;

// Nodes live in an arena indexed by NodeId; children hold indices and the
// parent index is a weak back-reference for diagnostics, so the tree has no
// reference cycles to manage.
pub struct OctreeNode {
	pub bounds: BoundingBox,
	pub contents: Vec<PointRecord>,
	pub children: Vec<NodeId>,
	pub parent: Option<NodeId>,
	pub depth: u8,
}

impl OctreeNode {
	pub fn is_leaf(&self) -> bool {
		self.children.is_empty()
	}
}

// Recursive midpoint partitioner for point sets that already fit in memory
// (post-bucketing). A node splits only while it is above the depth limit,
// holds enough points and its box is still large enough; a dense node that
// hits either limit stays a leaf, however many points it holds.
pub struct PointCloudOctree {
	nodes: Vec<OctreeNode>,
	limit_depth: u8,
	limit_box_size: f64,
	min_vertex_count: usize,
}

impl PointCloudOctree {
	pub fn build(
		points: Vec<PointRecord>,
		bounds: BoundingBox,
		options: &TilerOptions,
	) -> PointCloudOctree {
		let mut tree = PointCloudOctree {
			nodes: vec![OctreeNode {
				bounds,
				contents: points,
				children: Vec::new(),
				parent: None,
				depth: 0,
			}],
			limit_depth: options.limit_depth,
			limit_box_size: options.limit_box_size,
			min_vertex_count: options.min_vertex_count,
		};
		tree.split_node(0);
		tree
	}

	pub fn root(&self) -> &OctreeNode {
		&self.nodes[0]
	}

	pub fn node(&self, id: NodeId) -> &OctreeNode {
		&self.nodes[id]
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn leaves(&self) -> impl Iterator<Item = &OctreeNode> {
		self.nodes.iter().filter(|node| node.is_leaf())
	}

	pub fn max_depth(&self) -> u8 {
		self.nodes.iter().map(|node| node.depth).max().unwrap_or(0)
	}

	pub fn num_points(&self) -> usize {
		self.nodes.iter().map(|node| node.contents.len()).sum()
	}

	fn should_split(&self, id: NodeId) -> bool {
		let node = &self.nodes[id];
		node.depth < self.limit_depth
			&& node.contents.len() >= self.min_vertex_count
			&& node.bounds.longest_side() >= self.limit_box_size
	}

	fn split_node(&mut self, id: NodeId) {
		if !self.should_split(id) {
			return;
		}

		let points = std::mem::take(&mut self.nodes[id].contents);
		let bounds = self.nodes[id].bounds.clone();
		let depth = self.nodes[id].depth;

		let mut octants: Vec<Vec<PointRecord>> = (0..8).map(|_| Vec::new()).collect();
		for point in points {
			octants[bounds.octant_index(&point)].push(point);
		}

		let mut created = Vec::new();
		for (index, bucket) in octants.into_iter().enumerate() {
			if bucket.is_empty() {
				continue;
			}
			let child_id = self.nodes.len();
			self.nodes.push(OctreeNode {
				bounds: bounds.child_octant(index),
				contents: bucket,
				children: Vec::new(),
				parent: Some(id),
				depth: depth + 1,
			});
			self.nodes[id].children.push(child_id);
			created.push(child_id);
		}

		for child_id in created {
			self.split_node(child_id);
		}
	}
}
