//! Pointer plumbing: raw canvas pointer events turned into box selection,
//! node drags, pans, clicks and hover callbacks.

use log::debug;

use super::graph::NodeIx;
use super::orchestrator::{DragHold, GraphEvent, PanHold, TreeHouze};
use super::select::PointerInput;

const ZOOM_IN: f64 = 1.1;
const ZOOM_OUT: f64 = 0.9;

impl TreeHouze {
	/// Grabs the node under the pointer, starts a box selection, or starts a
	/// pan, in that order.
	pub fn pointer_down(&mut self, p: PointerInput) {
		let Some(ctx) = self.ctx() else {
			return;
		};
		let Some(session) = self.session.as_mut() else {
			return;
		};
		let handlers = session.config.handlers;
		let grabbed = (handlers.node_drag || handlers.node_click)
			.then(|| session.backend.node_at(&session.graph, p.x, p.y))
			.flatten();
		if let Some(node) = grabbed {
			session.drag = Some(DragHold {
				node,
				origin: session.graph.node(node).pin,
				start: (p.x, p.y),
				moved: false,
			});
			return;
		}
		if session.selector.begin(&p, &ctx, session.backend.as_ref()) {
			session.interaction.begin_box_select();
			return;
		}
		session.pan = Some(PanHold {
			last: (p.x, p.y),
			moved: false,
		});
	}

	pub fn pointer_move(&mut self, p: PointerInput) {
		let Some(ctx) = self.ctx() else {
			return;
		};
		let Some(session) = self.session.as_mut() else {
			return;
		};

		if session.selector.is_active() {
			session.selector.update(&p, &ctx, session.backend.as_mut());
			if !session.selector.is_active() {
				let effects = session.interaction.finish_box_select(None, &ctx);
				self.run(effects);
			}
			return;
		}

		if let Some(hold) = session.drag.as_mut() {
			if !hold.moved && hold.start == (p.x, p.y) {
				return;
			}
			hold.moved = true;
			let node = hold.node;
			let (gx, gy) = session.backend.screen_to_graph(p.x, p.y);
			let held = session.graph.node(node);
			let delta = [gx - held.x(), gy - held.y(), 0.0];
			self.handle(GraphEvent::NodeDrag { node, delta });
			self.hold_at(node, gx, gy);
			return;
		}

		if let Some(pan) = session.pan.as_mut() {
			let (dx, dy) = (p.x - pan.last.0, p.y - pan.last.1);
			pan.last = (p.x, p.y);
			pan.moved |= dx != 0.0 || dy != 0.0;
			session.backend.pan(dx, dy);
			return;
		}

		self.hover_at(p.x, p.y);
	}

	/// Ends whatever the pointer was doing. A grab or pan that never moved
	/// counts as a click.
	pub fn pointer_up(&mut self, p: PointerInput) {
		let Some(ctx) = self.ctx() else {
			return;
		};
		let Some(session) = self.session.as_mut() else {
			return;
		};

		if session.selector.is_active() {
			let picked = session.selector.finish(
				&p,
				&ctx,
				&session.graph,
				session.backend.as_ref(),
				&mut session.frustum,
			);
			let effects = session.interaction.finish_box_select(picked, &ctx);
			self.run(effects);
			return;
		}

		if let Some(hold) = session.drag.take() {
			if hold.moved {
				self.release(hold);
			} else {
				self.handle(GraphEvent::NodeClick {
					node: hold.node,
					modifier: p.modifier,
				});
			}
			return;
		}

		if let Some(pan) = session.pan.take() {
			if !pan.moved {
				self.handle(GraphEvent::BackgroundClick { modifier: p.modifier });
			}
		}
	}

	/// Pointer left the surface: cancel the box, finish any drag, drop hover.
	pub fn pointer_leave(&mut self) {
		let Some(ctx) = self.ctx() else {
			return;
		};
		let Some(session) = self.session.as_mut() else {
			return;
		};
		session.pan = None;
		let drag = session.drag.take();
		let mut effects = Vec::new();
		if session.selector.is_active() {
			debug!("pointer left, dropping select box");
			session.selector.cancel();
			effects = session.interaction.finish_box_select(None, &ctx);
		}
		self.run(effects);
		if let Some(hold) = drag.filter(|hold| hold.moved) {
			self.release(hold);
		}
		self.handle(GraphEvent::LinkHover(None));
		self.handle(GraphEvent::NodeHover(None));
	}

	pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) {
		if let Some(session) = self.session.as_mut() {
			let factor = if delta_y > 0.0 { ZOOM_OUT } else { ZOOM_IN };
			session.backend.zoom(x, y, factor);
		}
	}

	/// Keeps the grabbed node under the pointer for the rest of the gesture.
	fn hold_at(&mut self, node: NodeIx, gx: f64, gy: f64) {
		let Some(session) = self.session.as_mut() else {
			return;
		};
		let held = session.graph.node_mut(node);
		held.pin.fx = Some(gx);
		held.pin.fy = Some(gy);
		held.settle_on_pin();
	}

	/// Drops a moved node: its pre-drag pin comes back before the drag end
	/// callback decides what sticks.
	fn release(&mut self, hold: DragHold) {
		if let Some(session) = self.session.as_mut() {
			session.graph.node_mut(hold.node).pin = hold.origin;
		}
		self.handle(GraphEvent::NodeDragEnd { node: hold.node });
	}

	/// Hover detection. Leaving events go out before entering ones so a
	/// new highlight is never wiped by the old one clearing.
	fn hover_at(&mut self, x: f64, y: f64) {
		let Some(session) = self.session.as_ref() else {
			return;
		};
		let node = session.backend.node_at(&session.graph, x, y);
		let link = match node {
			Some(_) => None,
			None => session.backend.link_at(&session.graph, x, y),
		};
		let prev_node = session.interaction.hover_node();
		let prev_link = session.interaction.hover_link();

		if node.is_none() && prev_node.is_some() {
			self.handle(GraphEvent::NodeHover(None));
		}
		if link != prev_link {
			self.handle(GraphEvent::LinkHover(link));
		}
		if node.is_some() && node != prev_node {
			self.handle(GraphEvent::NodeHover(node));
		}
	}
}
