//! Turns an id-based dataset into the live graph: kind filtering first, then
//! hydration of one relation field into arena indices.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::warn;

use super::graph::{Graph, GraphLink, GraphNode, LinkIx, NodeIx, Relation, Pin};
use super::types::{GraphData, GraphKind, LinkKind, NodeKind, RelationIds};

/// Per-kind enable flags for nodes and links. A kind missing from a map is
/// treated as disabled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KindFilter {
	pub nodes: BTreeMap<NodeKind, bool>,
	pub links: BTreeMap<LinkKind, bool>,
}

impl Default for KindFilter {
	fn default() -> Self {
		Self {
			nodes: NodeKind::ALL.iter().map(|k| (*k, true)).collect(),
			links: LinkKind::ALL.iter().map(|k| (*k, true)).collect(),
		}
	}
}

impl KindFilter {
	pub fn node_enabled(&self, kind: NodeKind) -> bool {
		self.nodes.get(&kind).copied().unwrap_or(false)
	}

	pub fn link_enabled(&self, kind: LinkKind) -> bool {
		self.links.get(&kind).copied().unwrap_or(false)
	}
}

/// Drops nodes of disabled kinds, then every link that is of a disabled kind
/// or touches a dropped node.
pub fn filter(mut data: GraphData, enabled: &KindFilter) -> GraphData {
	let mut removed = HashSet::new();
	data.nodes.retain(|node| {
		let keep = enabled.node_enabled(node.kind);
		if !keep {
			removed.insert(node.id.clone());
		}
		keep
	});
	data.links.retain(|link| {
		enabled.link_enabled(link.kind)
			&& !removed.contains(&link.source)
			&& !removed.contains(&link.target)
	});
	data
}

/// Builds the arena and resolves `field` on every node against it. Entries
/// with no match are dropped. The other relation is left empty.
pub fn hydrate(data: GraphData, field: GraphKind) -> Graph {
	let node_ix: HashMap<&str, NodeIx> = data
		.nodes
		.iter()
		.enumerate()
		.map(|(i, n)| (n.id.as_str(), NodeIx(i)))
		.collect();

	let mut links = Vec::with_capacity(data.links.len());
	let mut link_ix: HashMap<(&str, &str), LinkIx> = HashMap::new();
	for link in &data.links {
		let (Some(&source), Some(&target)) = (
			node_ix.get(link.source.as_str()),
			node_ix.get(link.target.as_str()),
		) else {
			warn!(
				"dropping link {} -> {}: endpoint not in graph",
				link.source, link.target
			);
			continue;
		};
		link_ix
			.entry((link.source.as_str(), link.target.as_str()))
			.or_insert(LinkIx(links.len()));
		links.push(GraphLink {
			source,
			target,
			kind: link.kind,
		});
	}

	let resolve = |ids: &RelationIds| Relation {
		nodes: ids
			.nodes
			.iter()
			.filter_map(|id| node_ix.get(id.as_str()).copied())
			.collect(),
		links: ids
			.links
			.iter()
			.filter_map(|ends| {
				link_ix
					.get(&(ends.source.as_str(), ends.target.as_str()))
					.copied()
			})
			.collect(),
	};

	let nodes = data
		.nodes
		.iter()
		.map(|record| {
			let (lineage, neighbors) = match field {
				GraphKind::Tree => (resolve(&record.lineage), Relation::default()),
				GraphKind::Web => (Relation::default(), resolve(&record.neighbors)),
			};
			GraphNode {
				id: record.id.clone(),
				kind: record.kind,
				node_type: record.node_type.clone(),
				label: record.label.clone(),
				pos: [0.0; 3],
				pin: Pin::default(),
				lineage,
				neighbors,
			}
		})
		.collect();

	Graph::from_parts(nodes, links)
}

/// `filter` followed by `hydrate`, the order draw relies on.
pub fn prepare(data: GraphData, enabled: &KindFilter, kind: GraphKind) -> Graph {
	hydrate(filter(data, enabled), kind)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::treehouze::testing::sample_data;
	use crate::components::treehouze::types::{LinkRecord, NodeRecord};

	fn without(kind: NodeKind) -> KindFilter {
		let mut f = KindFilter::default();
		f.nodes.insert(kind, false);
		f
	}

	#[test]
	fn removing_a_kind_removes_links_touching_it() {
		let out = filter(sample_data(), &without(NodeKind::Zombie));
		let ids: Vec<_> = out.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, ["a", "b"]);
		assert_eq!(out.links.len(), 1);
		assert_eq!((out.links[0].source.as_str(), out.links[0].target.as_str()), ("a", "b"));
	}

	#[test]
	fn disabled_link_kind_is_removed() {
		let mut f = KindFilter::default();
		f.links.insert(LinkKind::Link, false);
		let out = filter(sample_data(), &f);
		assert_eq!(out.nodes.len(), 3);
		assert!(out.links.iter().all(|l| l.kind != LinkKind::Link));
	}

	#[test]
	fn no_surviving_link_dangles_for_any_mask() {
		let data = sample_data();
		for mask in 0u32..(1 << NodeKind::ALL.len()) {
			let mut f = KindFilter::default();
			for (bit, kind) in NodeKind::ALL.iter().enumerate() {
				f.nodes.insert(*kind, mask & (1 << bit) != 0);
			}
			let out = filter(data.clone(), &f);
			let ids: HashSet<_> = out.nodes.iter().map(|n| n.id.clone()).collect();
			for link in &out.links {
				assert!(ids.contains(&link.source) && ids.contains(&link.target));
			}
		}
	}

	#[test]
	fn hydration_resolves_neighbors_to_indices() {
		let graph = hydrate(sample_data(), GraphKind::Web);
		let b = graph.find("b").unwrap();
		let names: Vec<_> = graph
			.node(b)
			.neighbors
			.nodes
			.iter()
			.map(|ix| graph.node(*ix).id.as_str())
			.collect();
		assert_eq!(names, ["a", "c"]);
		assert_eq!(graph.node(b).neighbors.links.len(), 2);
		assert!(graph.node(b).lineage.nodes.is_empty());
	}

	#[test]
	fn hydration_resolves_lineage_in_tree_mode() {
		let graph = hydrate(sample_data(), GraphKind::Tree);
		let c = graph.find("c").unwrap();
		let lineage = &graph.node(c).lineage;
		assert_eq!(lineage.nodes, vec![graph.find("a").unwrap(), graph.find("b").unwrap()]);
		for link in &lineage.links {
			assert!(link.0 < graph.links().len());
		}
	}

	#[test]
	fn relations_to_filtered_entities_are_dropped_not_left_empty() {
		let graph = prepare(sample_data(), &without(NodeKind::Zombie), GraphKind::Web);
		let b = graph.find("b").unwrap();
		let rel = &graph.node(b).neighbors;
		assert_eq!(rel.nodes, vec![graph.find("a").unwrap()]);
		assert_eq!(rel.links.len(), 1);
		let link = graph.link(rel.links[0]);
		assert_eq!(graph.node(link.target).id, "b");
	}

	#[test]
	fn link_with_unknown_endpoint_is_dropped() {
		let data = GraphData {
			nodes: vec![NodeRecord {
				id: "solo".into(),
				kind: NodeKind::Doc,
				node_type: None,
				label: "solo".into(),
				lineage: Default::default(),
				neighbors: Default::default(),
				coord: None,
			}],
			links: vec![LinkRecord {
				source: "solo".into(),
				target: "ghost".into(),
				kind: LinkKind::Link,
			}],
		};
		let graph = hydrate(data, GraphKind::Web);
		assert!(graph.links().is_empty());
	}

	#[test]
	fn graph_survives_a_record_of_unknown_kind() {
		let data = GraphData::from_json(
			r#"{
				"nodes": [
					{ "id": "a", "kind": "doc", "neighbors": { "nodes": ["g", "b"] } },
					{ "id": "g", "kind": "ghost" },
					{ "id": "b", "kind": "doc" }
				],
				"links": [
					{ "source": "a", "target": "g", "kind": "link" },
					{ "source": "a", "target": "b", "kind": "link" }
				]
			}"#,
		)
		.unwrap();

		let graph = prepare(data, &KindFilter::default(), GraphKind::Web);
		assert_eq!(graph.nodes().len(), 2);
		assert_eq!(graph.links().len(), 1);
		let a = graph.find("a").unwrap();
		assert_eq!(graph.node(a).relation(GraphKind::Web).nodes, vec![graph.find("b").unwrap()]);
	}
}
