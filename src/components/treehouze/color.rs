//! Color, opacity, size and label decisions shared by the planar painter and
//! volumetric node construction.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use log::warn;
use serde::{Deserialize, Serialize};

use super::graph::{Graph, GraphNode, NodeIx};
use super::interaction::InteractionController;
use super::types::{Dim, GraphKind, NodeKind};

pub const NODE_RADIUS: f64 = 6.0;
pub const FALLBACK_COLOR: &str = "#FFFFFF";
pub const GLOW_SHADOW_BLUR: f64 = 40.0;
const DEFAULT_TYPE: &str = "default";

/// A color table entry: a literal or a function of the node's type.
#[derive(Clone)]
pub enum ColorEntry {
	Literal(String),
	Derived(Rc<dyn Fn(Option<&str>) -> String>),
}

impl ColorEntry {
	pub fn derived(f: impl Fn(Option<&str>) -> String + 'static) -> Self {
		Self::Derived(Rc::new(f))
	}

	fn paint(&self, node_type: Option<&str>) -> String {
		match self {
			Self::Literal(color) => color.clone(),
			Self::Derived(f) => f(node_type),
		}
	}
}

impl fmt::Debug for ColorEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Literal(color) => f.debug_tuple("Literal").field(color).finish(),
			Self::Derived(_) => f.write_str("Derived(..)"),
		}
	}
}

impl From<&str> for ColorEntry {
	fn from(color: &str) -> Self {
		Self::Literal(color.to_owned())
	}
}

impl From<String> for ColorEntry {
	fn from(color: String) -> Self {
		Self::Literal(color)
	}
}

/// Fixed colors for everything that isn't a node body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
	pub background: String,
	pub text: String,
	/// ring around each node
	pub band: String,
	/// glow of the node marked current
	pub current: String,
	pub link: String,
	pub particle: String,
}

impl Default for Palette {
	fn default() -> Self {
		Self {
			background: "#000011".into(),
			text: "#e6e1e8".into(),
			band: "#44434d".into(),
			current: "#F0C61F".into(),
			link: "#44434d".into(),
			particle: "#959396".into(),
		}
	}
}

pub fn default_node_kinds() -> BTreeMap<String, String> {
	[
		("doc", "#3e5c50"),
		("template", "#F8F0E3"),
		("zombie", "#959DA5"),
	]
	.into_iter()
	.map(|(k, v)| (k.to_owned(), v.to_owned()))
	.collect()
}

pub fn default_node_types() -> BTreeMap<String, String> {
	BTreeMap::from([(DEFAULT_TYPE.to_owned(), "#3e5c50".to_owned())])
}

#[derive(Clone, Debug, Default)]
pub struct ColorResolver {
	kinds: HashMap<NodeKind, ColorEntry>,
	types: HashMap<String, ColorEntry>,
	/// set through the API; these survive table reloads
	custom_kinds: HashMap<NodeKind, ColorEntry>,
	custom_types: HashMap<String, ColorEntry>,
	warned: RefCell<HashSet<String>>,
}

impl ColorResolver {
	/// Builds the tables from string maps. Unknown kind keys are skipped with
	/// a warning.
	pub fn from_tables(kinds: &BTreeMap<String, String>, types: &BTreeMap<String, String>) -> Self {
		let mut resolver = Self::default();
		resolver.reload_tables(kinds, types);
		resolver
	}

	/// Swaps in new string tables, keeping entries set with
	/// [`set_kind`](Self::set_kind) and [`set_type`](Self::set_type).
	pub fn reload_tables(&mut self, kinds: &BTreeMap<String, String>, types: &BTreeMap<String, String>) {
		self.kinds = kinds
			.iter()
			.filter_map(|(key, color)| match key.parse::<NodeKind>() {
				Ok(kind) => Some((kind, ColorEntry::from(color.as_str()))),
				Err(err) => {
					warn!("skipping nodekinds entry: {err}");
					None
				}
			})
			.collect();
		self.types = types
			.iter()
			.map(|(key, color)| (key.clone(), ColorEntry::from(color.as_str())))
			.collect();
		self.warned.borrow_mut().clear();
	}

	pub fn set_kind(&mut self, kind: NodeKind, entry: impl Into<ColorEntry>) {
		self.custom_kinds.insert(kind, entry.into());
	}

	pub fn set_type(&mut self, node_type: &str, entry: impl Into<ColorEntry>) {
		self.custom_types.insert(node_type.to_owned(), entry.into());
	}

	fn kind_entry(&self, kind: NodeKind) -> Option<&ColorEntry> {
		self.custom_kinds.get(&kind).or_else(|| self.kinds.get(&kind))
	}

	fn type_entry(&self, node_type: &str) -> Option<&ColorEntry> {
		self.custom_types.get(node_type).or_else(|| self.types.get(node_type))
	}

	fn warn_once(&self, key: String, message: impl FnOnce() -> String) {
		if self.warned.borrow_mut().insert(key) {
			warn!("{}", message());
		}
	}

	/// Body color of a node.
	///
	/// A doc node whose type has an entry takes the type color. Otherwise the
	/// kind entry is used, then the `default` type for docs, then
	/// [`FALLBACK_COLOR`].
	pub fn resolve(&self, node: &GraphNode) -> String {
		let is_doc = node.kind == NodeKind::Doc;
		let node_type = node.node_type.as_deref();

		let by_type = if is_doc {
			node_type.and_then(|t| self.type_entry(t).map(|e| (e, Some(t))))
		} else {
			None
		};
		if is_doc && by_type.is_none() {
			if let Some(t) = node_type {
				self.warn_once(format!("type:{t}"), || format!("not a valid nodetype: {t}"));
			}
		}

		let entry = by_type
			.or_else(|| self.kind_entry(node.kind).map(|e| (e, node_type)))
			.or_else(|| {
				is_doc
					.then(|| self.type_entry(DEFAULT_TYPE))
					.flatten()
					.map(|e| (e, Some(DEFAULT_TYPE)))
			});

		match entry {
			Some((entry, t)) => entry.paint(t),
			None => {
				self.warn_once(format!("kind:{}", node.kind), || {
					format!("no color for {} nodes, using fallback", node.kind)
				});
				FALLBACK_COLOR.to_owned()
			}
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Opacity {
	pub full: f64,
	pub dimmed: f64,
	pub idle_label: f64,
}

impl Opacity {
	pub fn for_dim(dim: Dim) -> Self {
		if dim.is_planar() {
			Self {
				full: 1.0,
				dimmed: 0.25,
				idle_label: 0.25,
			}
		} else {
			Self {
				full: 0.75,
				dimmed: 0.20,
				idle_label: 0.20,
			}
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeLook {
	pub radius: f64,
	pub alpha: f64,
	pub labelled: bool,
	pub label_alpha: f64,
	pub selected: bool,
}

impl NodeLook {
	pub fn band_width(&self) -> f64 {
		if self.selected {
			self.radius * (4.0 / 5.0)
		} else {
			self.radius * (2.0 / 5.0)
		}
	}

	pub fn band_radius(&self) -> f64 {
		if self.selected {
			self.radius * (7.0 / 5.0)
		} else {
			self.radius
		}
	}
}

/// Size, opacity and label visibility for `ix` given the hover and selection
/// state.
pub fn node_look(
	graph: &Graph,
	ix: NodeIx,
	interaction: &InteractionController,
	dim: Dim,
	kind: GraphKind,
	hover_enabled: bool,
) -> NodeLook {
	let opacity = Opacity::for_dim(dim);
	let selected = interaction.selected().contains(&ix);
	let hover_node = interaction.hover_node().filter(|_| hover_enabled);
	let hover_link = interaction.hover_link().map(|l| graph.link(l));
	let label_alpha = if interaction.hover_node().is_some() || hover_link.is_some() {
		1.0
	} else {
		opacity.idle_label
	};

	let mut look = NodeLook {
		radius: NODE_RADIUS,
		alpha: opacity.full,
		labelled: true,
		label_alpha,
		selected,
	};

	if hover_node == Some(ix) {
		look.radius *= 2.0;
		look.labelled = false;
		return look;
	}

	let outside_hovered = hover_node.is_some_and(|h| {
		!selected && !graph.node(h).relation(kind).nodes.contains(&ix)
	});
	let off_link = hover_link.is_some_and(|link| !link.touches(ix));
	if outside_hovered || off_link {
		look.alpha = opacity.dimmed;
		look.labelled = false;
	}
	look
}

/// Glow for a node when glow is on: only the current node glows.
#[derive(Clone, Debug, PartialEq)]
pub struct Glow {
	pub color: String,
	pub blur: f64,
}

pub fn glow(is_current: bool, palette: &Palette) -> Option<Glow> {
	is_current.then(|| Glow {
		color: palette.current.clone(),
		blur: GLOW_SHADOW_BLUR,
	})
}

/// Everything a volumetric backend needs to build a node object: an invisible
/// drag handle, the colored sphere, its band and an optional label.
#[derive(Clone, Debug, PartialEq)]
pub struct VolumetricNode {
	pub handle_radius: f64,
	pub color: String,
	pub opacity: f64,
	pub band_radius: f64,
	pub band_color: String,
	pub label: Option<VolumetricLabel>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VolumetricLabel {
	pub text: String,
	pub color: String,
	pub opacity: f64,
}

pub fn volumetric_node(node: &GraphNode, look: &NodeLook, color: String, palette: &Palette) -> VolumetricNode {
	VolumetricNode {
		handle_radius: look.radius,
		color,
		opacity: look.alpha,
		band_radius: look.band_radius(),
		band_color: palette.band.clone(),
		label: look.labelled.then(|| VolumetricLabel {
			text: node.label.clone(),
			color: palette.text.clone(),
			opacity: look.label_alpha,
		}),
	}
}
