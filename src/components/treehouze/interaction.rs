//! Hover, click, drag and selection state.
//!
//! Every handler mutates the transient sets synchronously and returns the
//! side effects the orchestrator has to run against the backend.

use std::collections::BTreeSet;

use super::cache::DataCache;
use super::graph::{Graph, LinkIx, NodeIx};
use super::pin;
use super::types::{Coord3, Dim, Mode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Toggles {
	pub click: bool,
	pub drag: bool,
	pub fix: bool,
	pub follow: bool,
	pub glow: bool,
	pub hover: bool,
	pub select: bool,
	pub autosync: bool,
}

impl Default for Toggles {
	fn default() -> Self {
		Self {
			click: true,
			drag: true,
			fix: true,
			follow: true,
			glow: true,
			hover: true,
			select: true,
			autosync: true,
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ctx {
	pub mode: Mode,
	pub toggles: Toggles,
}

impl Ctx {
	fn volumetric_refresh(&self) -> Option<Effect> {
		(self.mode.dim == Dim::ThreeD).then_some(Effect::Refresh)
	}
}

/// Work the backend has to do after a handler ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
	CenterOn(NodeIx),
	/// Rebuild node objects so highlight/selection changes show up.
	Refresh,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Gesture {
	#[default]
	Idle,
	Hovering,
	Dragging,
	BoxSelecting,
}

#[derive(Clone, Debug, Default)]
pub struct InteractionController {
	selected: BTreeSet<NodeIx>,
	highlight_nodes: BTreeSet<NodeIx>,
	highlight_links: BTreeSet<LinkIx>,
	hover_node: Option<NodeIx>,
	hover_link: Option<LinkIx>,
	gesture: Gesture,
}

impl InteractionController {
	pub fn selected(&self) -> &BTreeSet<NodeIx> {
		&self.selected
	}

	pub fn highlight_nodes(&self) -> &BTreeSet<NodeIx> {
		&self.highlight_nodes
	}

	pub fn highlight_links(&self) -> &BTreeSet<LinkIx> {
		&self.highlight_links
	}

	pub fn hover_node(&self) -> Option<NodeIx> {
		self.hover_node
	}

	pub fn hover_link(&self) -> Option<LinkIx> {
		self.hover_link
	}

	pub fn gesture(&self) -> Gesture {
		self.gesture
	}

	pub fn on_node_hover(&mut self, graph: &Graph, node: Option<NodeIx>, ctx: &Ctx) -> Vec<Effect> {
		if !ctx.toggles.hover {
			return Vec::new();
		}
		let prev = self.hover_node;
		self.highlight_nodes.clear();
		self.highlight_links.clear();
		if let Some(ix) = node {
			let relation = graph.node(ix).relation(ctx.mode.kind);
			self.highlight_nodes.insert(ix);
			self.highlight_nodes.extend(relation.nodes.iter().copied());
			self.highlight_links.extend(relation.links.iter().copied());
		}
		self.hover_node = node;
		self.settle_hover_gesture();

		if node != prev {
			ctx.volumetric_refresh().into_iter().collect()
		} else {
			Vec::new()
		}
	}

	pub fn on_link_hover(&mut self, graph: &Graph, link: Option<LinkIx>, ctx: &Ctx) -> Vec<Effect> {
		if !ctx.toggles.hover {
			return Vec::new();
		}
		self.highlight_nodes.clear();
		self.highlight_links.clear();
		if let Some(ix) = link {
			let l = graph.link(ix);
			self.highlight_links.insert(ix);
			self.highlight_nodes.insert(l.source);
			self.highlight_nodes.insert(l.target);
		}
		self.hover_link = link;
		self.settle_hover_gesture();
		ctx.volumetric_refresh().into_iter().collect()
	}

	/// Hover was switched off: drop everything it owned.
	pub fn clear_hover(&mut self) {
		self.highlight_nodes.clear();
		self.highlight_links.clear();
		self.hover_node = None;
		self.hover_link = None;
		self.settle_hover_gesture();
	}

	pub fn clear_selection(&mut self) {
		self.selected.clear();
	}

	pub fn on_node_click(&mut self, node: NodeIx, modifier: bool, ctx: &Ctx) -> Vec<Effect> {
		if !ctx.toggles.click {
			return Vec::new();
		}
		if ctx.toggles.select && modifier {
			if !self.selected.remove(&node) {
				self.selected.insert(node);
			}
			return ctx.volumetric_refresh().into_iter().collect();
		}
		if ctx.toggles.follow {
			vec![Effect::CenterOn(node)]
		} else {
			Vec::new()
		}
	}

	pub fn on_background_click(&mut self, modifier: bool, ctx: &Ctx) -> Vec<Effect> {
		if ctx.toggles.select && !modifier {
			self.selected.clear();
			return ctx.volumetric_refresh().into_iter().collect();
		}
		Vec::new()
	}

	/// Moves the dragged node (and, if it is part of the selection, every
	/// selected node) by `delta`. Only pins when fix is on.
	pub fn on_drag_move(&mut self, graph: &mut Graph, node: NodeIx, delta: Coord3, ctx: &Ctx) -> Vec<Effect> {
		if !(ctx.toggles.drag && ctx.toggles.fix) {
			return Vec::new();
		}
		self.gesture = Gesture::Dragging;
		let mut effects = Vec::new();
		let planar = ctx.mode.dim.is_planar();

		shift_pin(graph, node, delta, planar);
		if ctx.toggles.select {
			if !self.selected.contains(&node) {
				self.selected.clear();
				effects.extend(ctx.volumetric_refresh());
			}
			for &other in self.selected.iter().filter(|&&s| s != node) {
				shift_pin(graph, other, delta, planar);
			}
		}
		effects
	}

	/// Finishes a drag. With fix on every dragged node is pinned and
	/// persisted; with fix off the co-selected nodes are released.
	pub fn on_drag_end(&mut self, graph: &mut Graph, node: NodeIx, ctx: &Ctx, cache: &mut DataCache) -> Vec<Effect> {
		self.gesture = Gesture::Idle;
		if !ctx.toggles.drag {
			return Vec::new();
		}

		if ctx.toggles.fix {
			let mut dragged = BTreeSet::from([node]);
			if ctx.toggles.select {
				dragged.extend(self.selected.iter().copied());
			}
			for ix in dragged {
				pin::stick(graph.node_mut(ix), ctx.mode, cache);
			}
		} else {
			// the primary was already restored by whoever held the drag
			for &other in self.selected.iter().filter(|&&s| s != node) {
				pin::unstick(graph.node_mut(other), ctx.mode);
			}
		}
		ctx.volumetric_refresh().into_iter().collect()
	}

	pub fn begin_box_select(&mut self) {
		self.gesture = Gesture::BoxSelecting;
	}

	/// Replaces the selection with the result of a box gesture.
	pub fn finish_box_select(&mut self, selection: Option<BTreeSet<NodeIx>>, ctx: &Ctx) -> Vec<Effect> {
		self.gesture = Gesture::Idle;
		self.settle_hover_gesture();
		match selection {
			Some(nodes) => {
				self.selected = nodes;
				ctx.volumetric_refresh().into_iter().collect()
			}
			None => Vec::new(),
		}
	}

	fn settle_hover_gesture(&mut self) {
		if matches!(self.gesture, Gesture::Dragging | Gesture::BoxSelecting) {
			return;
		}
		self.gesture = if self.hover_node.is_some() || self.hover_link.is_some() {
			Gesture::Hovering
		} else {
			Gesture::Idle
		};
	}

	#[cfg(test)]
	pub(crate) fn set_hover_for_test(&mut self, node: Option<NodeIx>, link: Option<LinkIx>) {
		self.hover_node = node;
		self.hover_link = link;
	}

	#[cfg(test)]
	pub(crate) fn select_for_test(&mut self, node: NodeIx) {
		self.selected.insert(node);
	}
}

fn shift_pin(graph: &mut Graph, ix: NodeIx, delta: Coord3, planar: bool) {
	let node = graph.node_mut(ix);
	node.pin.fx = Some(node.x() + delta[0]);
	node.pin.fy = Some(node.y() + delta[1]);
	if !planar {
		node.pin.fz = Some(node.z() + delta[2]);
	}
	node.settle_on_pin();
}
