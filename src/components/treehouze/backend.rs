//! The seam to rendering/layout backends.
//!
//! A backend owns the layout simulation and the drawing surface for one
//! dimensionality. It is configured by folding an ordered list of
//! conditional steps into a [`BackendConfig`]; later steps win on the same
//! knob, so the order of [`CONFIG_STEPS`] is part of the contract.

use std::collections::BTreeSet;

use super::color::{Glow, NodeLook, Palette, VolumetricNode, volumetric_node};
use super::graph::{Graph, LinkIx, NodeIx};
use super::select::FrustumSelect;
use super::types::{Coord3, Dim, GraphKind, Mode};

pub const DIRECTIONAL_PARTICLES: u32 = 4;

/// A live render session for one dimensionality.
pub trait GraphBackend {
	fn dim(&self) -> Dim;

	fn configure(&mut self, config: &BackendConfig);

	/// Takes over layout of `graph`. May seed live positions.
	fn attach(&mut self, graph: &mut Graph);

	/// Advances the layout; pinned axes must be honoured.
	fn step(&mut self, graph: &mut Graph, dt: f32);

	fn render(&mut self, _scene: &Scene<'_>) {}

	fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64);

	fn node_at(&self, _graph: &Graph, _sx: f64, _sy: f64) -> Option<NodeIx> {
		None
	}

	fn link_at(&self, _graph: &Graph, _sx: f64, _sy: f64) -> Option<LinkIx> {
		None
	}

	fn center_at(&mut self, _x: f64, _y: f64, _duration_ms: u32) {}

	fn camera_position(&self) -> Option<Coord3> {
		None
	}

	fn set_camera_position(&mut self, _position: Coord3, _look_at: Option<Coord3>, _duration_ms: u32) {}

	/// Box/frustum helper bound to this session's camera and scene.
	fn frustum_selector(&self) -> Option<Box<dyn FrustumSelect>> {
		None
	}

	fn refresh(&mut self) {}

	fn pan(&mut self, _dx: f64, _dy: f64) {}

	fn zoom(&mut self, _sx: f64, _sy: f64, _factor: f64) {}

	fn resize(&mut self, _width: f64, _height: f64) {}

	/// Stops the simulation and detaches every listener.
	fn teardown(&mut self);
}

/// Creates a fresh backend for a dimensionality, or `None` if the host has
/// none registered for it.
pub trait BackendFactory {
	fn create(&self, dim: Dim) -> Option<Box<dyn GraphBackend>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DagMode {
	TopDown,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DagLayout {
	pub mode: DagMode,
	pub level_distance: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Painter {
	#[default]
	None,
	/// 2d canvas path, see `render`
	Canvas,
	/// volumetric objects built from [`Scene::clay`]
	Volumetric,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Handlers {
	pub background_click: bool,
	pub node_click: bool,
	pub node_drag: bool,
	pub node_hover: bool,
	pub link_hover: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Particles {
	pub count: u32,
	pub color: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BackendConfig {
	pub node_id: &'static str,
	pub link_source: &'static str,
	pub link_target: &'static str,
	pub link_color: String,
	pub dag: Option<DagLayout>,
	pub painter: Painter,
	pub background: Option<String>,
	pub node_label: bool,
	pub handlers: Handlers,
	pub particles: Option<Particles>,
}

impl Default for BackendConfig {
	fn default() -> Self {
		Self {
			node_id: "id",
			link_source: "source",
			link_target: "target",
			link_color: String::new(),
			dag: None,
			painter: Painter::None,
			background: None,
			node_label: false,
			handlers: Handlers::default(),
			particles: None,
		}
	}
}

#[derive(Clone, Copy, Debug)]
pub struct StepInput<'a> {
	pub mode: Mode,
	pub palette: &'a Palette,
	pub dag_height: f64,
}

pub struct ConfigStep {
	pub name: &'static str,
	pub when: fn(&StepInput<'_>) -> bool,
	pub apply: fn(&mut BackendConfig, &StepInput<'_>),
}

fn always(_: &StepInput<'_>) -> bool {
	true
}

fn is_tree(i: &StepInput<'_>) -> bool {
	i.mode.kind == GraphKind::Tree
}

fn is_planar(i: &StepInput<'_>) -> bool {
	i.mode.dim.is_planar()
}

fn is_volumetric(i: &StepInput<'_>) -> bool {
	!i.mode.dim.is_planar()
}

fn has_backdrop(i: &StepInput<'_>) -> bool {
	i.mode.dim != Dim::Ar
}

fn is_interactive(i: &StepInput<'_>) -> bool {
	i.mode.dim.is_interactive()
}

pub const CONFIG_STEPS: &[ConfigStep] = &[
	ConfigStep {
		name: "graph",
		when: always,
		apply: |c, i| {
			c.node_id = "id";
			c.link_source = "source";
			c.link_target = "target";
			c.link_color = i.palette.link.clone();
		},
	},
	ConfigStep {
		name: "dag",
		when: is_tree,
		apply: |c, i| {
			c.dag = Some(DagLayout {
				mode: DagMode::TopDown,
				level_distance: i.dag_height,
			});
		},
	},
	ConfigStep {
		name: "canvas-painter",
		when: is_planar,
		apply: |c, _| c.painter = Painter::Canvas,
	},
	ConfigStep {
		name: "volumetric-painter",
		when: is_volumetric,
		apply: |c, _| c.painter = Painter::Volumetric,
	},
	ConfigStep {
		name: "backdrop",
		when: has_backdrop,
		apply: |c, i| {
			c.background = Some(i.palette.background.clone());
			c.node_label = true;
		},
	},
	ConfigStep {
		name: "background-click",
		when: is_interactive,
		apply: |c, _| c.handlers.background_click = true,
	},
	ConfigStep {
		name: "node-click",
		when: is_interactive,
		apply: |c, _| c.handlers.node_click = true,
	},
	ConfigStep {
		name: "node-drag",
		when: is_interactive,
		apply: |c, _| c.handlers.node_drag = true,
	},
	ConfigStep {
		name: "hover",
		when: is_interactive,
		apply: |c, i| {
			c.handlers.node_hover = true;
			c.handlers.link_hover = true;
			c.particles = Some(Particles {
				count: DIRECTIONAL_PARTICLES,
				color: i.palette.particle.clone(),
			});
		},
	},
];

/// Folds `steps` in order into a fresh config.
pub fn compose_with(steps: &[ConfigStep], input: &StepInput<'_>) -> BackendConfig {
	steps
		.iter()
		.filter(|step| (step.when)(input))
		.fold(BackendConfig::default(), |mut config, step| {
			(step.apply)(&mut config, input);
			config
		})
}

pub fn compose(input: &StepInput<'_>) -> BackendConfig {
	compose_with(CONFIG_STEPS, input)
}

/// Names of the steps that apply for `input`, in application order.
pub fn applied_steps(input: &StepInput<'_>) -> Vec<&'static str> {
	CONFIG_STEPS
		.iter()
		.filter(|step| (step.when)(input))
		.map(|step| step.name)
		.collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeSprite {
	pub look: NodeLook,
	pub color: String,
	pub glow: Option<Glow>,
}

/// One frame's worth of decisions handed to [`GraphBackend::render`].
pub struct Scene<'a> {
	pub graph: &'a Graph,
	pub palette: &'a Palette,
	pub config: &'a BackendConfig,
	pub sprites: Vec<NodeSprite>,
	pub highlight_links: &'a BTreeSet<LinkIx>,
}

impl Scene<'_> {
	pub fn sprite(&self, ix: NodeIx) -> &NodeSprite {
		&self.sprites[ix.0]
	}

	/// Particle width for a link: visible only on highlighted links.
	pub fn particle_width(&self, ix: LinkIx) -> f64 {
		if self.highlight_links.contains(&ix) { 2.0 } else { 0.0 }
	}

	pub fn clay(&self, ix: NodeIx) -> VolumetricNode {
		let sprite = self.sprite(ix);
		volumetric_node(self.graph.node(ix), &sprite.look, sprite.color.clone(), self.palette)
	}
}
