//! Built-in 2d backend: a `force_graph` simulation painted on a canvas.

use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::debug;
use web_sys::CanvasRenderingContext2d;

use super::backend::{BackendConfig, GraphBackend, Scene};
use super::graph::{Graph, LinkIx, NodeIx};
use super::render;
use super::types::Dim;

/// Pointer hit radius in graph space; scales with zoom like the nodes.
pub const HIT_RADIUS: f64 = 12.0;
pub const LINK_HIT_RADIUS: f64 = 4.0;
const SEED_RADIUS: f64 = 100.0;
const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 10.0;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

/// Animated pan towards a target transform.
#[derive(Clone, Debug, PartialEq)]
struct Glide {
	from: (f64, f64),
	to: (f64, f64),
	elapsed_ms: f64,
	duration_ms: f64,
}

pub(crate) fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub struct PlanarSession {
	sim: ForceGraph<usize, ()>,
	/// arena index -> simulation index
	slots: Vec<DefaultNodeIdx>,
	/// lineage depth per node, used by the top-down layout
	depths: Vec<usize>,
	config: BackendConfig,
	ctx: Option<CanvasRenderingContext2d>,
	glide: Option<Glide>,
	pub transform: ViewTransform,
	pub width: f64,
	pub height: f64,
	pub running: bool,
	pub flow_time: f64,
}

impl PlanarSession {
	pub fn new(ctx: Option<CanvasRenderingContext2d>, width: f64, height: f64) -> Self {
		Self {
			sim: Self::simulation(),
			slots: Vec::new(),
			depths: Vec::new(),
			config: BackendConfig::default(),
			ctx,
			glide: None,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			width,
			height,
			running: true,
			flow_time: 0.0,
		}
	}

	fn simulation() -> ForceGraph<usize, ()> {
		ForceGraph::new(SimulationParameters {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		})
	}

	pub fn config(&self) -> &BackendConfig {
		&self.config
	}

	/// Vertical position a node is held at by the top-down layout.
	fn dag_y(&self, ix: usize) -> Option<f64> {
		let dag = self.config.dag?;
		Some(self.depths[ix] as f64 * dag.level_distance)
	}

	/// Pinned axes win, then the top-down layout, then the simulation.
	fn held_position(&self, graph: &Graph, ix: usize, (x, y): (f64, f64)) -> (f64, f64) {
		let pin = graph.node(NodeIx(ix)).pin;
		(
			pin.fx.unwrap_or(x),
			pin.fy.or_else(|| self.dag_y(ix)).unwrap_or(y),
		)
	}

	fn advance_glide(&mut self, dt: f32) {
		let Some(glide) = self.glide.as_mut() else {
			return;
		};
		glide.elapsed_ms += dt as f64 * 1000.0;
		let t = if glide.duration_ms > 0.0 {
			(glide.elapsed_ms / glide.duration_ms).min(1.0)
		} else {
			1.0
		};
		let e = ease_out_cubic(t);
		self.transform.x = glide.from.0 + (glide.to.0 - glide.from.0) * e;
		self.transform.y = glide.from.1 + (glide.to.1 - glide.from.1) * e;
		if t >= 1.0 {
			self.glide = None;
		}
	}
}

impl GraphBackend for PlanarSession {
	fn dim(&self) -> Dim {
		Dim::TwoD
	}

	fn configure(&mut self, config: &BackendConfig) {
		self.config = config.clone();
	}

	fn attach(&mut self, graph: &mut Graph) {
		self.sim = Self::simulation();
		self.depths = graph.nodes().iter().map(|n| n.lineage.nodes.len()).collect();
		let count = graph.nodes().len().max(1) as f64;

		let mut slots = Vec::with_capacity(graph.nodes().len());
		for ix in graph.node_ixs() {
			let angle = ix.0 as f64 * 2.0 * PI / count;
			let seed = (SEED_RADIUS * angle.cos(), SEED_RADIUS * angle.sin());
			// tree levels live in the vertical pin so flip can mirror them
			if let Some(level) = self.dag_y(ix.0) {
				graph.node_mut(ix).pin.fy.get_or_insert(level);
			}
			let (x, y) = self.held_position(graph, ix.0, seed);
			let node = graph.node_mut(ix);
			node.pos = [x, y, 0.0];
			slots.push(self.sim.add_node(NodeData {
				x: x as f32,
				y: y as f32,
				mass: 10.0,
				is_anchor: node.pin.fx.is_some(),
				user_data: ix.0,
			}));
		}
		self.slots = slots;

		for link in graph.links() {
			self.sim
				.add_edge(self.slots[link.source.0], self.slots[link.target.0], EdgeData::default());
		}
		debug!("planar session attached {} nodes", self.slots.len());
	}

	fn step(&mut self, graph: &mut Graph, dt: f32) {
		self.advance_glide(dt);
		if !self.running {
			return;
		}
		self.flow_time += dt as f64;

		// the live graph is authoritative for pins and drags; a held y alone
		// (tree levels) still lets the simulation spread x
		let held: Vec<_> = graph
			.node_ixs()
			.map(|ix| {
				let node = graph.node(ix);
				let pos = self.held_position(graph, ix.0, (node.x(), node.y()));
				(pos, node.pin.fx.is_some())
			})
			.collect();
		self.sim.visit_nodes_mut(|n| {
			let ((x, y), pinned) = held[n.data.user_data];
			n.data.x = x as f32;
			n.data.y = y as f32;
			n.data.is_anchor = pinned;
		});

		self.sim.update(dt);

		let mut moved = Vec::with_capacity(held.len());
		self.sim.visit_nodes(|n| moved.push((n.data.user_data, (n.x() as f64, n.y() as f64))));
		for (ix, sim_pos) in moved {
			let (x, y) = self.held_position(graph, ix, sim_pos);
			graph.node_mut(NodeIx(ix)).pos = [x, y, 0.0];
		}
	}

	fn render(&mut self, scene: &Scene<'_>) {
		if let Some(ctx) = &self.ctx {
			render::render(self, scene, ctx);
		}
	}

	fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	fn node_at(&self, graph: &Graph, sx: f64, sy: f64) -> Option<NodeIx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		// last drawn wins
		graph
			.node_ixs()
			.filter(|&ix| {
				let n = graph.node(ix);
				(n.x() - gx).hypot(n.y() - gy) < HIT_RADIUS
			})
			.last()
	}

	fn link_at(&self, graph: &Graph, sx: f64, sy: f64) -> Option<LinkIx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		graph.link_ixs().find(|&ix| {
			let link = graph.link(ix);
			let (a, b) = (graph.node(link.source), graph.node(link.target));
			segment_distance((gx, gy), (a.x(), a.y()), (b.x(), b.y())) < LINK_HIT_RADIUS
		})
	}

	fn center_at(&mut self, x: f64, y: f64, duration_ms: u32) {
		let to = (
			self.width / 2.0 - x * self.transform.k,
			self.height / 2.0 - y * self.transform.k,
		);
		self.glide = Some(Glide {
			from: (self.transform.x, self.transform.y),
			to,
			elapsed_ms: 0.0,
			duration_ms: duration_ms as f64,
		});
	}

	fn pan(&mut self, dx: f64, dy: f64) {
		self.glide = None;
		self.transform.x += dx;
		self.transform.y += dy;
	}

	fn zoom(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	fn teardown(&mut self) {
		self.running = false;
		self.glide = None;
		self.ctx = None;
		self.sim = Self::simulation();
		self.slots.clear();
		debug!("planar session torn down");
	}
}

fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
	let (dx, dy) = (b.0 - a.0, b.1 - a.1);
	let len2 = dx * dx + dy * dy;
	if len2 < f64::EPSILON {
		return (p.0 - a.0).hypot(p.1 - a.1);
	}
	let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0);
	(p.0 - (a.0 + t * dx)).hypot(p.1 - (a.1 + t * dy))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::treehouze::backend::{BackendFactory, StepInput, compose};
	use crate::components::treehouze::color::Palette;
	use crate::components::treehouze::config::{CtrlUpdate, Options};
	use crate::components::treehouze::orchestrator::TreeHouze;
	use crate::components::treehouze::prepare::hydrate;
	use crate::components::treehouze::testing::sample_data;
	use crate::components::treehouze::types::{GraphKind, Mode};

	struct Offscreen;

	impl BackendFactory for Offscreen {
		fn create(&self, dim: Dim) -> Option<Box<dyn GraphBackend>> {
			dim.is_planar()
				.then(|| Box::new(PlanarSession::new(None, 400.0, 300.0)) as Box<dyn GraphBackend>)
		}
	}

	fn levels(house: &TreeHouze) -> Vec<(String, f64, Option<f64>)> {
		house
			.graph()
			.unwrap()
			.nodes()
			.iter()
			.map(|n| (n.id.clone(), n.y(), n.pin.fy))
			.collect()
	}

	fn attached(kind: GraphKind) -> (PlanarSession, Graph) {
		let mut session = PlanarSession::new(None, 400.0, 300.0);
		let palette = Palette::default();
		session.configure(&compose(&StepInput {
			mode: Mode { dim: Dim::TwoD, kind },
			palette: &palette,
			dag_height: 60.0,
		}));
		let mut graph = hydrate(sample_data(), kind);
		session.attach(&mut graph);
		(session, graph)
	}

	#[test]
	fn screen_and_graph_space_follow_pan_and_zoom() {
		let mut session = PlanarSession::new(None, 400.0, 300.0);
		assert_eq!(session.screen_to_graph(200.0, 150.0), (0.0, 0.0));
		session.pan(10.0, -20.0);
		assert_eq!(session.screen_to_graph(210.0, 130.0), (0.0, 0.0));
		session.zoom(210.0, 130.0, 2.0);
		assert_eq!(session.screen_to_graph(210.0, 130.0), (0.0, 0.0));
		assert_eq!(session.screen_to_graph(230.0, 130.0), (10.0, 0.0));
	}

	#[test]
	fn zoom_is_clamped() {
		let mut session = PlanarSession::new(None, 400.0, 300.0);
		for _ in 0..100 {
			session.zoom(0.0, 0.0, 1.1);
		}
		assert_eq!(session.transform.k, MAX_ZOOM);
	}

	#[test]
	fn tree_layout_places_nodes_by_lineage_depth() {
		let (mut session, mut graph) = attached(GraphKind::Tree);
		let depth_y = |graph: &Graph, id: &str| graph.node(graph.find(id).unwrap()).y();
		assert_eq!(depth_y(&graph, "a"), 0.0);
		assert_eq!(depth_y(&graph, "b"), 60.0);
		assert_eq!(depth_y(&graph, "c"), 120.0);
		session.step(&mut graph, 0.016);
		assert_eq!(depth_y(&graph, "c"), 120.0);
	}

	#[test]
	fn flip_mirrors_the_tree_layout() {
		let mut house = TreeHouze::new(Options::default(), Box::new(Offscreen));
		house.draw(Some(&sample_data()), None).unwrap();
		house.apply(CtrlUpdate::Kind(GraphKind::Tree));
		house.tick(0.016);
		let level = |y: f64| (Some(y), Some(y));
		let before = levels(&house);
		assert_eq!(
			before.iter().map(|(_, y, fy)| (Some(*y), *fy)).collect::<Vec<_>>(),
			vec![level(0.0), level(100.0), level(200.0)]
		);

		house.flip();
		house.tick(0.016);
		let after = levels(&house);
		assert_eq!(
			after.iter().map(|(_, y, fy)| (Some(*y), *fy)).collect::<Vec<_>>(),
			vec![level(-0.0), level(-100.0), level(-200.0)]
		);

		house.flip();
		house.tick(0.016);
		assert_eq!(levels(&house), before);
	}

	#[test]
	fn pinned_nodes_stay_put_while_others_move() {
		let (mut session, mut graph) = attached(GraphKind::Web);
		let a = graph.find("a").unwrap();
		graph.node_mut(a).pin.fx = Some(-40.0);
		graph.node_mut(a).pin.fy = Some(25.0);
		let before = graph.node(NodeIx(2)).pos;
		for _ in 0..10 {
			session.step(&mut graph, 0.016);
		}
		assert_eq!(graph.node(a).pos, [-40.0, 25.0, 0.0]);
		assert_ne!(graph.node(NodeIx(2)).pos, before);
	}

	#[test]
	fn hit_tests_nodes_and_links() {
		let (session, mut graph) = attached(GraphKind::Web);
		graph.node_mut(NodeIx(0)).pos = [-100.0, 0.0, 0.0];
		graph.node_mut(NodeIx(1)).pos = [100.0, 0.0, 0.0];
		graph.node_mut(NodeIx(2)).pos = [100.0, 100.0, 0.0];
		// screen origin sits at (200, 150)
		assert_eq!(session.node_at(&graph, 105.0, 150.0), Some(NodeIx(0)));
		assert_eq!(session.node_at(&graph, 200.0, 150.0), None);
		assert_eq!(session.link_at(&graph, 200.0, 152.0), Some(LinkIx(0)));
		assert_eq!(session.link_at(&graph, 302.0, 200.0), Some(LinkIx(1)));
		assert_eq!(session.link_at(&graph, 200.0, 200.0), None);
	}

	#[test]
	fn center_glides_node_to_the_middle() {
		let (mut session, mut graph) = attached(GraphKind::Web);
		session.running = false;
		session.center_at(50.0, -30.0, 1000);
		session.step(&mut graph, 0.5);
		assert_ne!(session.transform.x, 150.0);
		session.step(&mut graph, 0.6);
		assert_eq!((session.transform.x, session.transform.y), (150.0, 180.0));
	}

	#[test]
	fn teardown_stops_the_simulation() {
		let (mut session, mut graph) = attached(GraphKind::Web);
		session.teardown();
		let before: Vec<_> = graph.nodes().iter().map(|n| n.pos).collect();
		session.step(&mut graph, 0.016);
		let after: Vec<_> = graph.nodes().iter().map(|n| n.pos).collect();
		assert_eq!(before, after);
	}
}
