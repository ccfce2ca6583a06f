//! Fixtures and backend doubles shared by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use super::backend::{BackendConfig, BackendFactory, GraphBackend};
use super::color::NODE_RADIUS;
use super::graph::{Graph, GraphNode, NodeIx, Pin, Relation};
use super::select::FrustumSelect;
use super::types::{Coord3, Dim, GraphData, LinkEnds, LinkKind, LinkRecord, NodeKind, NodeRecord, RelationIds};

pub type CallLog = Rc<RefCell<Vec<String>>>;

fn ends(source: &str, target: &str) -> LinkEnds {
	LinkEnds {
		source: source.into(),
		target: target.into(),
	}
}

fn relation(nodes: &[&str], links: &[(&str, &str)]) -> RelationIds {
	RelationIds {
		nodes: nodes.iter().map(|n| n.to_string()).collect(),
		links: links.iter().map(|(s, t)| ends(s, t)).collect(),
	}
}

/// `a -link-> b -attr-> c`, with `c` a zombie and `a` an article.
pub fn sample_data() -> GraphData {
	let record = |id: &str, kind, node_type: Option<&str>, lineage, neighbors| NodeRecord {
		id: id.into(),
		kind,
		node_type: node_type.map(Into::into),
		label: id.to_uppercase(),
		lineage,
		neighbors,
		coord: None,
	};
	GraphData {
		nodes: vec![
			record(
				"a",
				NodeKind::Doc,
				Some("article"),
				RelationIds::default(),
				relation(&["b"], &[("a", "b")]),
			),
			record(
				"b",
				NodeKind::Doc,
				None,
				relation(&["a"], &[("a", "b")]),
				relation(&["a", "c"], &[("a", "b"), ("b", "c")]),
			),
			record(
				"c",
				NodeKind::Zombie,
				None,
				relation(&["a", "b"], &[("a", "b"), ("b", "c")]),
				relation(&["b"], &[("b", "c")]),
			),
		],
		links: vec![
			LinkRecord {
				source: "a".into(),
				target: "b".into(),
				kind: LinkKind::Link,
			},
			LinkRecord {
				source: "b".into(),
				target: "c".into(),
				kind: LinkKind::Attr,
			},
		],
	}
}

/// A bare doc node sitting at `pos`.
pub fn node(id: &str, pos: Coord3) -> GraphNode {
	GraphNode {
		id: id.into(),
		kind: NodeKind::Doc,
		node_type: None,
		label: id.into(),
		pos,
		pin: Pin::default(),
		lineage: Relation::default(),
		neighbors: Relation::default(),
	}
}

/// Horizontal gap between nodes laid out by [`MockBackend::attach`].
pub const SPACING: f64 = 50.0;

/// Backend double: screen space equals graph space, nodes attach in a row
/// and never move on their own, and every call that matters lands in `log`.
pub struct MockBackend {
	pub dim: Dim,
	pub camera: Option<Coord3>,
	pub config: Option<BackendConfig>,
	pub log: CallLog,
}

impl MockBackend {
	pub fn new(dim: Dim) -> Self {
		Self::logging(dim, CallLog::default())
	}

	pub fn logging(dim: Dim, log: CallLog) -> Self {
		let camera = (!dim.is_planar()).then_some([0.0, 0.0, 300.0]);
		Self {
			dim,
			camera,
			config: None,
			log,
		}
	}

	fn record(&self, call: impl Into<String>) {
		self.log.borrow_mut().push(call.into());
	}
}

impl GraphBackend for MockBackend {
	fn dim(&self) -> Dim {
		self.dim
	}

	fn configure(&mut self, config: &BackendConfig) {
		self.record(format!("configure {}", self.dim));
		self.config = Some(config.clone());
	}

	fn attach(&mut self, graph: &mut Graph) {
		self.record(format!("attach {} ({} nodes)", self.dim, graph.nodes().len()));
		for ix in graph.node_ixs() {
			let node = graph.node_mut(ix);
			node.pos = [SPACING * ix.0 as f64, 0.0, 0.0];
			node.settle_on_pin();
		}
	}

	fn step(&mut self, graph: &mut Graph, _dt: f32) {
		for ix in graph.node_ixs() {
			graph.node_mut(ix).settle_on_pin();
		}
	}

	fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(sx, sy)
	}

	fn node_at(&self, graph: &Graph, sx: f64, sy: f64) -> Option<NodeIx> {
		graph.node_ixs().find(|&ix| {
			let n = graph.node(ix);
			(n.x() - sx).hypot(n.y() - sy) <= NODE_RADIUS
		})
	}

	fn center_at(&mut self, x: f64, y: f64, duration_ms: u32) {
		self.record(format!("center {x},{y} in {duration_ms}"));
	}

	fn camera_position(&self) -> Option<Coord3> {
		self.camera
	}

	fn set_camera_position(&mut self, position: Coord3, look_at: Option<Coord3>, duration_ms: u32) {
		self.camera = Some(position);
		if duration_ms > 0 {
			self.record(format!("camera {position:?} looking at {look_at:?} in {duration_ms}"));
		}
	}

	fn frustum_selector(&self) -> Option<Box<dyn FrustumSelect>> {
		(self.dim == Dim::ThreeD).then(|| Box::new(MockFrustum::default()) as Box<dyn FrustumSelect>)
	}

	fn refresh(&mut self) {
		self.record("refresh");
	}

	fn teardown(&mut self) {
		self.record(format!("teardown {}", self.dim));
	}
}

/// Hands out [`MockBackend`]s for the listed dims, all sharing one log.
pub struct MockFactory {
	pub dims: Vec<Dim>,
	pub log: CallLog,
}

impl MockFactory {
	pub fn new(dims: &[Dim]) -> Self {
		Self {
			dims: dims.to_vec(),
			log: CallLog::default(),
		}
	}

	pub fn calls(&self) -> Vec<String> {
		self.log.borrow().clone()
	}
}

impl BackendFactory for MockFactory {
	fn create(&self, dim: Dim) -> Option<Box<dyn GraphBackend>> {
		if !self.dims.contains(&dim) {
			return None;
		}
		self.log.borrow_mut().push(format!("create {dim}"));
		Some(Box::new(MockBackend::logging(dim, self.log.clone())))
	}
}

/// Frustum double returning a canned answer and recording its corners.
#[derive(Default)]
pub struct MockFrustum {
	answer: Vec<NodeIx>,
	calls: Rc<RefCell<Vec<(Coord3, Coord3)>>>,
}

impl MockFrustum {
	pub fn returning(answer: Vec<NodeIx>) -> (Self, Rc<RefCell<Vec<(Coord3, Coord3)>>>) {
		let calls = Rc::new(RefCell::new(Vec::new()));
		(
			Self {
				answer,
				calls: calls.clone(),
			},
			calls,
		)
	}
}

impl FrustumSelect for MockFrustum {
	fn select(&mut self, start: Coord3, end: Coord3) -> Vec<NodeIx> {
		self.calls.borrow_mut().push((start, end));
		self.answer.clone()
	}
}
