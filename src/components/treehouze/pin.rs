//! Pinning nodes in place and carrying those pins through the cache.
//!
//! Volumetric backends run their vertical axis opposite to the planar one, so
//! every coordinate crossing between a live node and the cache goes through
//! [`cache_transform`].

use super::cache::DataCache;
use super::graph::GraphNode;
use super::types::{Coord3, Dim, GraphKind, Mode};

const FLIP_Y_AXIS: f64 = -1.0;

/// Maps a coordinate between live space for `dim` and cache space. It is its
/// own inverse.
pub fn cache_transform(coord: Coord3, dim: Dim) -> Coord3 {
	if dim.is_planar() {
		coord
	} else {
		[coord[0], coord[1] * FLIP_Y_AXIS, coord[2]]
	}
}

/// Pins `node` at its live position and persists that position.
///
/// In tree mode the vertical axis belongs to the layout and is left alone.
pub fn stick(node: &mut GraphNode, mode: Mode, cache: &mut DataCache) {
	node.pin.fx = Some(node.x());
	if mode.kind != GraphKind::Tree {
		node.pin.fy = Some(node.y());
	}
	if !mode.dim.is_planar() {
		node.pin.fz = Some(node.z());
	}

	let mut coord = cache_transform(node.pos, mode.dim);
	if mode.dim.is_planar() {
		// planar pins don't own z, keep whatever was there
		coord[2] = cache.recall(&node.id).map_or(0.0, |c| c[2]);
	}
	cache.persist(&node.id, coord);
}

/// Releases a node back to the layout engine.
pub fn unstick(node: &mut GraphNode, mode: Mode) {
	node.pin.fx = None;
	if mode.kind != GraphKind::Tree {
		node.pin.fy = None;
	}
	if !mode.dim.is_planar() {
		node.pin.fz = None;
	}
}

/// Restores a node's pin from the cache. Returns whether one was found.
pub fn restick(node: &mut GraphNode, mode: Mode, cache: &DataCache) -> bool {
	let Some(coord) = cache.recall(&node.id) else {
		return false;
	};
	let [x, y, z] = cache_transform(coord, mode.dim);
	node.pin.fx = Some(x);
	node.pin.fy = Some(y);
	if !mode.dim.is_planar() {
		node.pin.fz = Some(z);
	}
	node.settle_on_pin();
	true
}

/// Mirrors the vertical pin of a node.
pub fn flip(node: &mut GraphNode) {
	if let Some(fy) = node.pin.fy.as_mut() {
		*fy = -*fy;
		node.pos[1] = *fy;
	}
}
