//! Dataset cache that outlives render sessions.
//!
//! Holds the last supplied dataset so the graph can be redrawn without the
//! caller handing data in again, and the pinned coordinate of every node that
//! was ever fixed in place, keyed by node id.

use std::collections::HashMap;

use log::debug;

use super::types::{Coord3, GraphData};

#[derive(Clone, Debug, Default)]
pub struct DataCache {
	data: Option<GraphData>,
	pins: HashMap<String, Coord3>,
}

impl DataCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces the cached dataset. Pins are reset to those the dataset carries.
	pub fn store(&mut self, data: &GraphData) {
		self.pins = data
			.nodes
			.iter()
			.filter_map(|n| n.coord.map(|c| (n.id.clone(), c)))
			.collect();
		self.data = Some(data.clone());
		debug!(
			"cached dataset: {} nodes, {} links, {} pins",
			data.nodes.len(),
			data.links.len(),
			self.pins.len()
		);
	}

	/// Replaces the cached dataset but keeps the pin history; pins carried by
	/// `data` only fill ids that have none yet.
	pub fn refresh(&mut self, data: &GraphData) {
		for node in &data.nodes {
			if let Some(coord) = node.coord {
				self.pins.entry(node.id.clone()).or_insert(coord);
			}
		}
		self.data = Some(data.clone());
	}

	/// Deep copy of the cached dataset with persisted pins written into each
	/// record's `coord`. `None` if nothing was ever stored.
	pub fn retrieve(&self) -> Option<GraphData> {
		let mut data = self.data.clone()?;
		for node in &mut data.nodes {
			if let Some(coord) = self.pins.get(&node.id) {
				node.coord = Some(*coord);
			}
		}
		Some(data)
	}

	pub fn persist(&mut self, id: &str, coord: Coord3) {
		*self.pins.entry(id.to_owned()).or_default() = coord;
	}

	pub fn recall(&self, id: &str) -> Option<Coord3> {
		self.pins.get(id).copied()
	}

	pub fn has_data(&self) -> bool {
		self.data.is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::treehouze::testing::sample_data;

	#[test]
	fn retrieve_before_store_is_none() {
		assert!(DataCache::new().retrieve().is_none());
	}

	#[test]
	fn round_trip_is_deep_equal() {
		let data = sample_data();
		let mut cache = DataCache::new();
		cache.store(&data);
		assert_eq!(cache.retrieve(), Some(data));
	}

	#[test]
	fn retrieve_is_a_copy() {
		let data = sample_data();
		let mut cache = DataCache::new();
		cache.store(&data);
		let mut copy = cache.retrieve().unwrap();
		copy.nodes.clear();
		assert_eq!(cache.retrieve().unwrap().nodes.len(), data.nodes.len());
	}

	#[test]
	fn persist_creates_missing_entry() {
		let mut cache = DataCache::new();
		cache.persist("nowhere", [1.0, 2.0, 3.0]);
		assert_eq!(cache.recall("nowhere"), Some([1.0, 2.0, 3.0]));
		assert_eq!(cache.recall("elsewhere"), None);
	}

	#[test]
	fn persisted_pins_show_up_in_retrieved_records() {
		let mut cache = DataCache::new();
		cache.store(&sample_data());
		cache.persist("a", [4.0, 5.0, 0.0]);
		let data = cache.retrieve().unwrap();
		let a = data.nodes.iter().find(|n| n.id == "a").unwrap();
		assert_eq!(a.coord, Some([4.0, 5.0, 0.0]));
	}

	#[test]
	fn store_resets_pins_but_refresh_keeps_them() {
		let mut cache = DataCache::new();
		cache.store(&sample_data());
		cache.persist("a", [4.0, 5.0, 0.0]);

		cache.refresh(&sample_data());
		assert_eq!(cache.recall("a"), Some([4.0, 5.0, 0.0]));

		cache.store(&sample_data());
		assert_eq!(cache.recall("a"), None);
	}
}
