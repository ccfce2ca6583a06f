use leptos::prelude::*;

use crate::components::treehouze::{
	GraphData, LinkEnds, LinkKind, LinkRecord, NodeKind, NodeRecord, Options, RelationIds, TreeHouzeCanvas,
};

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

fn ends(source: usize, target: usize) -> LinkEnds {
	LinkEnds {
		source: source.to_string(),
		target: target.to_string(),
	}
}

/// A random family tree of `n` docs with a sprinkling of cross references.
fn generate_sample_data(n: usize) -> GraphData {
	let parents: Vec<Option<usize>> = (0..n)
		.map(|i| (i > 0).then(|| (rand_simple(i) * i as f64) as usize))
		.collect();
	let refs: Vec<(usize, usize)> = (1..n)
		.filter(|i| i % 5 == 0)
		.map(|i| (i, (i * 7 + 3) % n))
		.filter(|(a, b)| a != b)
		.collect();

	let lineage = |i: usize| {
		let mut rel = RelationIds::default();
		let mut child = i;
		while let Some(parent) = parents[child] {
			rel.nodes.insert(0, parent.to_string());
			rel.links.insert(0, ends(parent, child));
			child = parent;
		}
		rel
	};
	let neighbors = |i: usize| {
		let mut rel = RelationIds::default();
		if let Some(parent) = parents[i] {
			rel.nodes.push(parent.to_string());
			rel.links.push(ends(parent, i));
		}
		for (child, _) in parents.iter().enumerate().filter(|(_, p)| **p == Some(i)) {
			rel.nodes.push(child.to_string());
			rel.links.push(ends(i, child));
		}
		for &(a, b) in refs.iter().filter(|(a, b)| *a == i || *b == i) {
			let other = if a == i { b } else { a };
			rel.nodes.push(other.to_string());
			rel.links.push(ends(a, b));
		}
		rel
	};
	let kind = |i: usize| match i % 13 {
		4 => NodeKind::Zombie,
		7 => NodeKind::Template,
		11 => NodeKind::Media,
		_ => NodeKind::Doc,
	};

	let nodes = (0..n)
		.map(|i| NodeRecord {
			id: i.to_string(),
			kind: kind(i),
			node_type: (i % 3 == 0).then(|| "article".to_owned()),
			label: format!("Node {i}"),
			lineage: lineage(i),
			neighbors: neighbors(i),
			coord: None,
		})
		.collect();

	let family = parents.iter().enumerate().filter_map(|(child, parent)| {
		parent.map(|parent| LinkRecord {
			source: parent.to_string(),
			target: child.to_string(),
			kind: LinkKind::Fam,
		})
	});
	let cross = refs.iter().map(|(a, b)| LinkRecord {
		source: a.to_string(),
		target: b.to_string(),
		kind: if a % 2 == 0 { LinkKind::Link } else { LinkKind::Embed },
	});

	GraphData {
		nodes,
		links: family.chain(cross).collect(),
	}
}

fn sample_options() -> Options {
	let mut options = Options::default();
	options.nodekinds.insert("media".to_owned(), "#7a5c8e".to_owned());
	options.nodetypes.insert("article".to_owned(), "#5c7a8e".to_owned());
	options
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let graph_data = Signal::derive(move || generate_sample_data(60));

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<TreeHouzeCanvas data=graph_data options=sample_options() current="0" fullscreen=true />
				<div class="graph-overlay">
					<h1>"treehouze"</h1>
					<p class="subtitle">
						"Hover to trace relations. Click to select, shift-drag to box select. Drag nodes to pin them."
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
