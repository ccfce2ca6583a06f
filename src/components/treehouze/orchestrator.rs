//! The render orchestrator: owns the cache, the control state and the one
//! live render session, and routes every operation and backend event.

use log::{debug, error, info, warn};
use serde_json::{Map, Value};

use super::backend::{BackendConfig, BackendFactory, GraphBackend, NodeSprite, Scene, StepInput, compose};
use super::cache::DataCache;
use super::color::{ColorEntry, ColorResolver, Palette, glow, node_look};
use super::config::{CtrlState, CtrlUpdate, Options};
use super::error::DrawError;
use super::graph::{Graph, GraphNode, LinkIx, NodeIx, Pin};
use super::interaction::{Ctx, Effect, InteractionController, Toggles};
use super::panel::{PanelAction, PanelEvent, PanelSpec};
use super::pin;
use super::prepare::prepare;
use super::select::{FrustumSelect, SelectBox, SpatialSelector};
use super::types::{Coord3, Dim, GraphData, Mode, NodeKind};

/// How far outside a node the volumetric camera settles when centering on it.
pub const CENTER_DISTANCE: f64 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GraphEvent {
	NodeHover(Option<NodeIx>),
	LinkHover(Option<LinkIx>),
	NodeClick { node: NodeIx, modifier: bool },
	BackgroundClick { modifier: bool },
	NodeDrag { node: NodeIx, delta: Coord3 },
	NodeDragEnd { node: NodeIx },
}

/// A node held by the pointer. `origin` is its pin from before the drag.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DragHold {
	pub node: NodeIx,
	pub origin: Pin,
	pub start: (f64, f64),
	pub moved: bool,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct PanHold {
	pub last: (f64, f64),
	pub moved: bool,
}

/// Everything bound to one attached backend. Dropped wholesale on redraw.
pub(crate) struct Session {
	pub backend: Box<dyn GraphBackend>,
	pub graph: Graph,
	pub interaction: InteractionController,
	pub selector: SpatialSelector,
	pub frustum: Option<Box<dyn FrustumSelect>>,
	pub config: BackendConfig,
	pub mode: Mode,
	pub drag: Option<DragHold>,
	pub pan: Option<PanHold>,
}

type CurrentFn = Box<dyn Fn(&GraphNode) -> bool>;

pub struct TreeHouze {
	pub(crate) options: Options,
	pub(crate) ctrls: CtrlState,
	resolver: ColorResolver,
	pub(crate) cache: DataCache,
	factory: Box<dyn BackendFactory>,
	current: Option<CurrentFn>,
	pub(crate) session: Option<Session>,
}

impl TreeHouze {
	pub fn new(options: Options, factory: Box<dyn BackendFactory>) -> Self {
		let resolver = ColorResolver::from_tables(&options.nodekinds, &options.nodetypes);
		let ctrls = CtrlState::from_options(&options.ctrls);
		Self {
			options,
			ctrls,
			resolver,
			cache: DataCache::new(),
			factory,
			current: None,
			session: None,
		}
	}

	pub fn options(&self) -> &Options {
		&self.options
	}

	pub fn ctrls(&self) -> &CtrlState {
		&self.ctrls
	}

	pub fn is_drawn(&self) -> bool {
		self.session.is_some()
	}

	pub fn graph(&self) -> Option<&Graph> {
		self.session.as_ref().map(|s| &s.graph)
	}

	pub fn interaction(&self) -> Option<&InteractionController> {
		self.session.as_ref().map(|s| &s.interaction)
	}

	pub fn select_box(&self) -> Option<SelectBox> {
		self.session.as_ref().and_then(|s| s.selector.select_box())
	}

	pub fn set_current(&mut self, current: impl Fn(&GraphNode) -> bool + 'static) {
		self.current = Some(Box::new(current));
	}

	pub fn set_kind_color(&mut self, kind: NodeKind, entry: impl Into<ColorEntry>) {
		self.resolver.set_kind(kind, entry);
	}

	pub fn set_type_color(&mut self, node_type: &str, entry: impl Into<ColorEntry>) {
		self.resolver.set_type(node_type, entry);
	}

	/// Draws `data`, or redraws the cached dataset when `data` is `None`.
	/// `opts` override the current options first.
	pub fn draw(&mut self, data: Option<&GraphData>, opts: Option<&Options>) -> Result<(), DrawError> {
		if let Some(data) = data {
			self.cache.store(data);
		}
		let Some(data) = self.cache.retrieve() else {
			error!("no graph data");
			return Err(DrawError::NoGraphData);
		};
		if let Some(opts) = opts {
			self.set_options(opts);
		}
		self.attach(data)
	}

	/// The cached dataset with every persisted pin written into `coord`.
	pub fn save(&self) -> Option<GraphData> {
		self.cache.retrieve()
	}

	pub fn sync(&mut self) -> Result<(), DrawError> {
		self.draw(None, None)
	}

	/// Redraws with fresh live data while keeping the pin history.
	pub fn autosync(&mut self, data: &GraphData) -> Result<(), DrawError> {
		if !self.ctrls.toggles.autosync {
			debug!("autosync is off, ignoring {} nodes", data.nodes.len());
			return Ok(());
		}
		self.cache.refresh(data);
		self.draw(None, None)
	}

	pub fn flip(&mut self) {
		let Some(session) = self.session.as_mut() else {
			return;
		};
		for ix in session.graph.node_ixs() {
			let node = session.graph.node_mut(ix);
			pin::flip(node);
			if let Some([x, y, z]) = self.cache.recall(&node.id) {
				self.cache.persist(&node.id, [x, -y, z]);
			}
		}
		session.backend.refresh();
	}

	/// Applies a partial ctrl payload, e.g. `{"dim": "3d", "fix": false}`.
	/// Invalid entries are reported and skipped.
	pub fn update_ctrls(&mut self, payload: &Map<String, Value>) {
		let updates = CtrlUpdate::parse_payload(payload);
		let redraw = updates.iter().any(CtrlUpdate::needs_redraw);
		let before = self.ctrls.clone();
		for update in updates {
			self.set_ctrl(update);
		}
		if redraw {
			self.redraw(before);
		}
	}

	/// Applies one ctrl change, redrawing when it alters the graph structure.
	pub fn apply(&mut self, update: CtrlUpdate) {
		let before = self.ctrls.clone();
		self.set_ctrl(update);
		if update.needs_redraw() {
			self.redraw(before);
		}
	}

	pub fn panel(&self) -> PanelSpec {
		PanelSpec::build(&self.ctrls)
	}

	/// Handles a panel event. `Save` hands back the dataset to persist.
	pub fn handle_panel(&mut self, event: PanelEvent) -> Option<GraphData> {
		match event {
			PanelEvent::Change(update) => self.apply(update),
			PanelEvent::Press(PanelAction::Flip) => self.flip(),
			PanelEvent::Press(PanelAction::Sync) => {
				if let Err(err) = self.sync() {
					warn!("sync failed: {err}");
				}
			}
			PanelEvent::Press(PanelAction::Save) => return self.save(),
		}
		None
	}

	/// Dispatches a backend callback. Events the session did not wire are
	/// ignored.
	pub fn handle(&mut self, event: GraphEvent) {
		let toggles = self.ctrls.toggles;
		let Some(session) = self.session.as_mut() else {
			return;
		};
		let ctx = Ctx {
			mode: session.mode,
			toggles,
		};
		let handlers = session.config.handlers;
		let interaction = &mut session.interaction;
		let effects = match event {
			GraphEvent::NodeHover(node) if handlers.node_hover => interaction.on_node_hover(&session.graph, node, &ctx),
			GraphEvent::LinkHover(link) if handlers.link_hover => interaction.on_link_hover(&session.graph, link, &ctx),
			GraphEvent::NodeClick { node, modifier } if handlers.node_click => {
				interaction.on_node_click(node, modifier, &ctx)
			}
			GraphEvent::BackgroundClick { modifier } if handlers.background_click => {
				interaction.on_background_click(modifier, &ctx)
			}
			GraphEvent::NodeDrag { node, delta } if handlers.node_drag => {
				interaction.on_drag_move(&mut session.graph, node, delta, &ctx)
			}
			GraphEvent::NodeDragEnd { node } if handlers.node_drag => {
				interaction.on_drag_end(&mut session.graph, node, &ctx, &mut self.cache)
			}
			_ => Vec::new(),
		};
		self.run(effects);
	}

	pub fn tick(&mut self, dt: f32) {
		let Some(session) = self.session.as_mut() else {
			return;
		};
		session.backend.step(&mut session.graph, dt);

		let Session {
			backend,
			graph,
			interaction,
			config,
			mode,
			..
		} = session;
		let painter = NodePainter {
			resolver: &self.resolver,
			current: self.current.as_deref(),
			toggles: self.ctrls.toggles,
			palette: &self.options.colors,
		};
		let sprites = painter.sprites(graph, interaction, *mode);
		let scene = Scene {
			graph,
			palette: &self.options.colors,
			config,
			sprites,
			highlight_links: interaction.highlight_links(),
		};
		backend.render(&scene);
	}

	/// This frame's draw decisions, without stepping the layout.
	pub fn scene(&self) -> Option<Scene<'_>> {
		let session = self.session.as_ref()?;
		Some(Scene {
			graph: &session.graph,
			palette: &self.options.colors,
			config: &session.config,
			sprites: self.painter().sprites(&session.graph, &session.interaction, session.mode),
			highlight_links: session.interaction.highlight_links(),
		})
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		if let Some(session) = self.session.as_mut() {
			session.backend.resize(width, height);
		}
	}

	pub(crate) fn ctx(&self) -> Option<Ctx> {
		self.session.as_ref().map(|s| Ctx {
			mode: s.mode,
			toggles: self.ctrls.toggles,
		})
	}

	pub(crate) fn run(&mut self, effects: Vec<Effect>) {
		let speed = self.options.center_speed;
		let Some(session) = self.session.as_mut() else {
			return;
		};
		for effect in effects {
			match effect {
				Effect::CenterOn(ix) => {
					center_on(session.backend.as_mut(), session.graph.node(ix), session.mode.dim, speed)
				}
				Effect::Refresh => session.backend.refresh(),
			}
		}
	}

	fn set_options(&mut self, opts: &Options) {
		self.resolver.reload_tables(&opts.nodekinds, &opts.nodetypes);
		self.ctrls = self.ctrls.updated(&opts.ctrls);
		self.options = opts.clone();
	}

	fn painter(&self) -> NodePainter<'_> {
		NodePainter {
			resolver: &self.resolver,
			current: self.current.as_deref(),
			toggles: self.ctrls.toggles,
			palette: &self.options.colors,
		}
	}

	/// Tears down the current session and attaches a fresh one for `data`.
	/// If no backend exists for the dimension the current session stays.
	fn attach(&mut self, data: GraphData) -> Result<(), DrawError> {
		let mode = self.ctrls.mode;
		let Some(mut backend) = self.factory.create(mode.dim) else {
			error!("no render backend for dimension {}", mode.dim);
			return Err(DrawError::NoBackend(mode.dim));
		};
		let mut graph = prepare(data, &self.ctrls.filter, mode.kind);

		if let Some(mut old) = self.session.take() {
			old.backend.teardown();
		}

		let config = compose(&StepInput {
			mode,
			palette: &self.options.colors,
			dag_height: self.options.dag_height,
		});
		backend.configure(&config);
		backend.attach(&mut graph);

		let toggles = self.ctrls.toggles;
		if toggles.drag && toggles.fix {
			for ix in graph.node_ixs() {
				pin::restick(graph.node_mut(ix), mode, &self.cache);
			}
		}
		let frustum = if mode.dim == Dim::ThreeD {
			backend.frustum_selector()
		} else {
			None
		};

		info!(
			"attached {} {} graph: {} nodes, {} links",
			mode.dim,
			mode.kind,
			graph.nodes().len(),
			graph.links().len()
		);
		self.session = Some(Session {
			backend,
			graph,
			interaction: InteractionController::default(),
			selector: SpatialSelector::default(),
			frustum,
			config,
			mode,
			drag: None,
			pan: None,
		});
		Ok(())
	}

	/// Redraws after a structural ctrl change. Nothing happens before the
	/// first dataset arrives; a failed redraw rolls the ctrls back.
	fn redraw(&mut self, before: CtrlState) {
		if !self.cache.has_data() {
			return;
		}
		if let Err(err) = self.draw(None, None) {
			warn!("keeping previous ctrls: {err}");
			self.ctrls = before;
		}
	}

	fn set_ctrl(&mut self, update: CtrlUpdate) {
		let toggles = &mut self.ctrls.toggles;
		match update {
			CtrlUpdate::Dim(dim) => self.ctrls.mode.dim = dim,
			CtrlUpdate::Kind(kind) => self.ctrls.mode.kind = kind,
			CtrlUpdate::FilterNode(kind, on) => {
				self.ctrls.filter.nodes.insert(kind, on);
			}
			CtrlUpdate::FilterLink(kind, on) => {
				self.ctrls.filter.links.insert(kind, on);
			}
			CtrlUpdate::Follow(on) => toggles.follow = on,
			CtrlUpdate::Glow(on) => toggles.glow = on,
			CtrlUpdate::Autosync(on) => toggles.autosync = on,
			CtrlUpdate::Click(on) => toggles.click = on,
			CtrlUpdate::Drag(on) => toggles.drag = on,
			CtrlUpdate::Fix(on) => {
				toggles.fix = on;
				self.repin(on);
			}
			CtrlUpdate::Hover(on) => {
				toggles.hover = on;
				if let (false, Some(session)) = (on, self.session.as_mut()) {
					session.interaction.clear_hover();
				}
			}
			CtrlUpdate::Select(on) => {
				toggles.select = on;
				if let (false, Some(session)) = (on, self.session.as_mut()) {
					session.interaction.clear_selection();
					session.selector.cancel();
				}
			}
		}
	}

	/// Fix switched: pull every pin back from the cache, or release them all.
	fn repin(&mut self, fix: bool) {
		let Some(session) = self.session.as_mut() else {
			return;
		};
		let mode = session.mode;
		for ix in session.graph.node_ixs() {
			let node = session.graph.node_mut(ix);
			if fix {
				pin::restick(node, mode, &self.cache);
			} else {
				pin::unstick(node, mode);
			}
		}
	}
}

struct NodePainter<'a> {
	resolver: &'a ColorResolver,
	current: Option<&'a dyn Fn(&GraphNode) -> bool>,
	toggles: Toggles,
	palette: &'a Palette,
}

impl NodePainter<'_> {
	fn sprites(&self, graph: &Graph, interaction: &InteractionController, mode: Mode) -> Vec<NodeSprite> {
		graph
			.node_ixs()
			.map(|ix| {
				let node = graph.node(ix);
				let is_current = self.toggles.glow && self.current.is_some_and(|current| current(node));
				NodeSprite {
					look: node_look(graph, ix, interaction, mode.dim, mode.kind, self.toggles.hover),
					color: self.resolver.resolve(node),
					glow: glow(is_current, self.palette),
				}
			})
			.collect()
	}
}

/// Moves the view onto `node`. Planar views pan; volumetric cameras aim at the
/// node from `CENTER_DISTANCE` beyond it, or from the z axis at the origin.
fn center_on(backend: &mut dyn GraphBackend, node: &GraphNode, dim: Dim, duration_ms: u32) {
	if dim.is_planar() {
		backend.center_at(node.x(), node.y(), duration_ms);
		return;
	}
	let [x, y, z] = node.pos;
	let position = if x != 0.0 || y != 0.0 || z != 0.0 {
		let ratio = 1.0 + CENTER_DISTANCE / x.hypot(y).hypot(z);
		[x * ratio, y * ratio, z * ratio]
	} else {
		[0.0, 0.0, CENTER_DISTANCE]
	};
	backend.set_camera_position(position, Some(node.pos), duration_ms);
}
