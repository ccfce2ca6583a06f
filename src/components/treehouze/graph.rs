//! The live graph: an arena of nodes and links addressed by index.
//!
//! Relations (lineage/neighbors) and link endpoints hold indices into the
//! arena they were hydrated against, so they can never outlive or point past
//! the collection attached to the current session.

use std::collections::HashMap;

use super::types::{Coord3, GraphKind, LinkKind, NodeKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIx(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkIx(pub usize);

/// A hydrated relation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Relation {
	pub nodes: Vec<NodeIx>,
	pub links: Vec<LinkIx>,
}

/// Coordinates that override the layout engine, per axis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pin {
	pub fx: Option<f64>,
	pub fy: Option<f64>,
	pub fz: Option<f64>,
}

impl Pin {
	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() || self.fy.is_some() || self.fz.is_some()
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: String,
	pub kind: NodeKind,
	pub node_type: Option<String>,
	pub label: String,
	/// Live position, written by the layout engine.
	pub pos: Coord3,
	pub pin: Pin,
	pub lineage: Relation,
	pub neighbors: Relation,
}

impl GraphNode {
	pub fn relation(&self, kind: GraphKind) -> &Relation {
		match kind {
			GraphKind::Tree => &self.lineage,
			GraphKind::Web => &self.neighbors,
		}
	}

	pub fn x(&self) -> f64 {
		self.pos[0]
	}

	pub fn y(&self) -> f64 {
		self.pos[1]
	}

	pub fn z(&self) -> f64 {
		self.pos[2]
	}

	/// Moves the live position onto every pinned axis.
	pub fn settle_on_pin(&mut self) {
		if let Some(fx) = self.pin.fx {
			self.pos[0] = fx;
		}
		if let Some(fy) = self.pin.fy {
			self.pos[1] = fy;
		}
		if let Some(fz) = self.pin.fz {
			self.pos[2] = fz;
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphLink {
	pub source: NodeIx,
	pub target: NodeIx,
	pub kind: LinkKind,
}

impl GraphLink {
	pub fn touches(&self, node: NodeIx) -> bool {
		self.source == node || self.target == node
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
	nodes: Vec<GraphNode>,
	links: Vec<GraphLink>,
	by_id: HashMap<String, NodeIx>,
}

impl Graph {
	pub(crate) fn from_parts(nodes: Vec<GraphNode>, links: Vec<GraphLink>) -> Self {
		let by_id = nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), NodeIx(i)))
			.collect();
		Self {
			nodes,
			links,
			by_id,
		}
	}

	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	pub fn links(&self) -> &[GraphLink] {
		&self.links
	}

	pub fn node(&self, ix: NodeIx) -> &GraphNode {
		&self.nodes[ix.0]
	}

	pub fn node_mut(&mut self, ix: NodeIx) -> &mut GraphNode {
		&mut self.nodes[ix.0]
	}

	pub fn get(&self, ix: NodeIx) -> Option<&GraphNode> {
		self.nodes.get(ix.0)
	}

	pub fn link(&self, ix: LinkIx) -> &GraphLink {
		&self.links[ix.0]
	}

	pub fn find(&self, id: &str) -> Option<NodeIx> {
		self.by_id.get(id).copied()
	}

	pub fn node_ixs(&self) -> impl Iterator<Item = NodeIx> + use<> {
		(0..self.nodes.len()).map(NodeIx)
	}

	pub fn link_ixs(&self) -> impl Iterator<Item = LinkIx> + use<> {
		(0..self.links.len()).map(LinkIx)
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}
