//! Rectangular box selection.
//!
//! Planar mode converts the screen rectangle into graph space and keeps the
//! nodes strictly inside it. Volumetric mode hands normalized device
//! coordinates to a frustum helper supplied by the backend and holds the
//! camera still while the box is open.

use std::collections::BTreeSet;

use log::{debug, warn};

use super::backend::GraphBackend;
use super::graph::{Graph, NodeIx};
use super::interaction::Ctx;
use super::types::{Coord3, Dim};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerInput {
	pub x: f64,
	pub y: f64,
	/// selection modifier (shift)
	pub modifier: bool,
	/// width and height of the window the pointer lives in
	pub viewport: (f64, f64),
}

impl PointerInput {
	/// Normalized device coordinates on the mid depth plane.
	pub fn ndc(&self) -> Coord3 {
		let (w, h) = self.viewport;
		[(self.x / w) * 2.0 - 1.0, -(self.y / h) * 2.0 + 1.0, 0.5]
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SelectBox {
	pub left: f64,
	pub top: f64,
	pub width: f64,
	pub height: f64,
}

impl SelectBox {
	fn spanning(a: (f64, f64), b: (f64, f64)) -> Self {
		let (left, right) = (a.0.min(b.0), a.0.max(b.0));
		let (top, bottom) = (a.1.min(b.1), a.1.max(b.1));
		Self {
			left,
			top,
			width: right - left,
			height: bottom - top,
		}
	}

	pub fn right(&self) -> f64 {
		self.left + self.width
	}

	pub fn bottom(&self) -> f64 {
		self.top + self.height
	}
}

/// Frustum selection helper seeded with a camera and scene.
pub trait FrustumSelect {
	/// Nodes inside the frustum spanned by two NDC corners.
	fn select(&mut self, start: Coord3, end: Coord3) -> Vec<NodeIx>;
}

#[derive(Clone, Debug, Default)]
pub struct SpatialSelector {
	start: Option<(f64, f64)>,
	rect: Option<SelectBox>,
	held_camera: Option<Coord3>,
	ndc_start: Coord3,
	ndc_end: Coord3,
}

impl SpatialSelector {
	pub fn is_active(&self) -> bool {
		self.start.is_some()
	}

	pub fn select_box(&self) -> Option<SelectBox> {
		self.rect
	}

	/// Opens a box if selection is on and the modifier is held.
	pub fn begin(&mut self, p: &PointerInput, ctx: &Ctx, backend: &dyn GraphBackend) -> bool {
		if !(ctx.toggles.select && p.modifier && ctx.mode.dim.is_interactive()) {
			return false;
		}
		if ctx.mode.dim == Dim::ThreeD {
			self.held_camera = backend.camera_position();
			self.ndc_start = p.ndc();
			self.ndc_end = self.ndc_start;
		}
		self.start = Some((p.x, p.y));
		self.rect = Some(SelectBox {
			left: p.x,
			top: p.y,
			..SelectBox::default()
		});
		true
	}

	/// Resizes the open box. Letting go of the modifier cancels it.
	pub fn update(&mut self, p: &PointerInput, ctx: &Ctx, backend: &mut dyn GraphBackend) {
		let Some(start) = self.start else {
			return;
		};
		if !p.modifier {
			debug!("modifier released, dropping select box");
			self.cancel();
			return;
		}
		if ctx.mode.dim == Dim::ThreeD {
			if let Some(camera) = self.held_camera {
				backend.set_camera_position(camera, None, 0);
			}
			self.ndc_end = p.ndc();
		}
		self.rect = Some(SelectBox::spanning(start, (p.x, p.y)));
	}

	/// Closes the box and returns the new selection. A release with no open
	/// box returns `None` and changes nothing.
	pub fn finish(
		&mut self,
		p: &PointerInput,
		ctx: &Ctx,
		graph: &Graph,
		backend: &dyn GraphBackend,
		frustum: &mut Option<Box<dyn FrustumSelect>>,
	) -> Option<BTreeSet<NodeIx>> {
		let start = self.start.take()?;
		self.rect = None;
		self.held_camera = None;
		if !ctx.toggles.select {
			return None;
		}

		match ctx.mode.dim {
			Dim::TwoD => {
				let rect = SelectBox::spanning(start, (p.x, p.y));
				let (x0, y0) = backend.screen_to_graph(rect.left, rect.top);
				let (x1, y1) = backend.screen_to_graph(rect.right(), rect.bottom());
				Some(
					graph
						.node_ixs()
						.filter(|&ix| {
							let n = graph.node(ix);
							x0 < n.x() && n.x() < x1 && y0 < n.y() && n.y() < y1
						})
						.collect(),
				)
			}
			Dim::ThreeD => {
				self.ndc_end = p.ndc();
				let Some(helper) = frustum.as_mut() else {
					warn!("no frustum selection helper for this session");
					return None;
				};
				Some(helper.select(self.ndc_start, self.ndc_end).into_iter().collect())
			}
			Dim::Ar | Dim::Vr => None,
		}
	}

	pub fn cancel(&mut self) {
		self.start = None;
		self.rect = None;
		self.held_camera = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::treehouze::interaction::Toggles;
	use crate::components::treehouze::prepare::hydrate;
	use crate::components::treehouze::testing::{MockBackend, MockFrustum, sample_data};
	use crate::components::treehouze::types::{GraphKind, Mode};

	fn pointer(x: f64, y: f64, modifier: bool) -> PointerInput {
		PointerInput {
			x,
			y,
			modifier,
			viewport: (200.0, 100.0),
		}
	}

	fn ctx(dim: Dim) -> Ctx {
		Ctx {
			mode: Mode {
				dim,
				kind: GraphKind::Web,
			},
			toggles: Toggles::default(),
		}
	}

	fn placed_graph() -> Graph {
		let mut graph = hydrate(sample_data(), GraphKind::Web);
		graph.node_mut(NodeIx(0)).pos = [10.0, 10.0, 0.0];
		graph.node_mut(NodeIx(1)).pos = [20.0, 20.0, 0.0];
		graph.node_mut(NodeIx(2)).pos = [30.0, 5.0, 0.0];
		graph
	}

	#[test]
	fn planar_box_selects_strictly_inside() {
		let graph = placed_graph();
		let mut backend = MockBackend::new(Dim::TwoD);
		let mut selector = SpatialSelector::default();
		let c = ctx(Dim::TwoD);

		assert!(selector.begin(&pointer(25.0, 25.0, true), &c, &backend));
		selector.update(&pointer(5.0, 8.0, true), &c, &mut backend);
		assert_eq!(
			selector.select_box(),
			Some(SelectBox {
				left: 5.0,
				top: 8.0,
				width: 20.0,
				height: 17.0
			})
		);
		// node at (20, 20) inside, (10, 10) inside, (30, 5) outside
		let picked = selector
			.finish(&pointer(5.0, 8.0, true), &c, &graph, &backend, &mut None)
			.unwrap();
		assert_eq!(picked, BTreeSet::from([NodeIx(0), NodeIx(1)]));
		assert!(!selector.is_active());
	}

	#[test]
	fn boundary_nodes_are_excluded() {
		let graph = placed_graph();
		let backend = MockBackend::new(Dim::TwoD);
		let mut selector = SpatialSelector::default();
		let c = ctx(Dim::TwoD);
		selector.begin(&pointer(10.0, 0.0, true), &c, &backend);
		let picked = selector
			.finish(&pointer(30.0, 20.0, true), &c, &graph, &backend, &mut None)
			.unwrap();
		assert!(picked.is_empty());
	}

	#[test]
	fn needs_modifier_and_selection_enabled() {
		let backend = MockBackend::new(Dim::TwoD);
		let mut selector = SpatialSelector::default();
		assert!(!selector.begin(&pointer(0.0, 0.0, false), &ctx(Dim::TwoD), &backend));
		let mut off = ctx(Dim::TwoD);
		off.toggles.select = false;
		assert!(!selector.begin(&pointer(0.0, 0.0, true), &off, &backend));
		assert!(!selector.begin(&pointer(0.0, 0.0, true), &ctx(Dim::Vr), &backend));
	}

	#[test]
	fn stray_release_and_modifier_release_cancel_silently() {
		let graph = placed_graph();
		let mut backend = MockBackend::new(Dim::TwoD);
		let mut selector = SpatialSelector::default();
		let c = ctx(Dim::TwoD);
		assert!(
			selector
				.finish(&pointer(1.0, 1.0, true), &c, &graph, &backend, &mut None)
				.is_none()
		);

		selector.begin(&pointer(0.0, 0.0, true), &c, &backend);
		selector.update(&pointer(50.0, 50.0, false), &c, &mut backend);
		assert!(selector.select_box().is_none());
		assert!(
			selector
				.finish(&pointer(50.0, 50.0, true), &c, &graph, &backend, &mut None)
				.is_none()
		);
	}

	#[test]
	fn volumetric_box_uses_frustum_and_holds_camera() {
		let graph = placed_graph();
		let mut backend = MockBackend::new(Dim::ThreeD);
		backend.camera = Some([0.0, 0.0, 300.0]);
		let (frustum, calls) = MockFrustum::returning(vec![NodeIx(2)]);
		let mut helper: Option<Box<dyn FrustumSelect>> = Some(Box::new(frustum));
		let mut selector = SpatialSelector::default();
		let c = ctx(Dim::ThreeD);

		selector.begin(&pointer(0.0, 0.0, true), &c, &backend);
		backend.camera = Some([9.0, 9.0, 9.0]);
		selector.update(&pointer(100.0, 50.0, true), &c, &mut backend);
		assert_eq!(backend.camera, Some([0.0, 0.0, 300.0]));

		let picked = selector
			.finish(&pointer(200.0, 100.0, true), &c, &graph, &backend, &mut helper)
			.unwrap();
		assert_eq!(picked, BTreeSet::from([NodeIx(2)]));
		assert_eq!(calls.borrow().as_slice(), &[([-1.0, 1.0, 0.5], [1.0, -1.0, 0.5])]);
	}
}
