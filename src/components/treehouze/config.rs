//! Options and controls.
//!
//! Options arrive as JSON (or are built in Rust) and are validated here; the
//! control state is the typed view every other module reads from.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::color::{Palette, default_node_kinds, default_node_types};
use super::error::{DataError, ParseError};
use super::interaction::Toggles;
use super::prepare::KindFilter;
use super::types::{Dim, GraphKind, LinkKind, Mode, NodeKind};

/// Names of the controls, as used by `exclude` and `update_ctrls`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ctrl {
	Kind,
	Dim,
	Filter,
	Fix,
	Flip,
	Follow,
	Glow,
	Autosync,
	Click,
	Drag,
	Hover,
	Select,
	Data,
	Save,
	Sync,
}

impl FromStr for Ctrl {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s {
			"kind" => Ctrl::Kind,
			"dim" => Ctrl::Dim,
			"filter" => Ctrl::Filter,
			"fix" => Ctrl::Fix,
			"flip" => Ctrl::Flip,
			"follow" => Ctrl::Follow,
			"glow" => Ctrl::Glow,
			"autosync" => Ctrl::Autosync,
			"click" => Ctrl::Click,
			"drag" => Ctrl::Drag,
			"hover" => Ctrl::Hover,
			"select" => Ctrl::Select,
			"data" => Ctrl::Data,
			"save" => Ctrl::Save,
			"sync" => Ctrl::Sync,
			other => return Err(ParseError::unknown("ctrl", other)),
		})
	}
}

/// `ctrls` section of the options. Only the keys that are present change
/// anything; absent ones keep the current control state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CtrlOptions {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub enabled: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub exclude: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub autosync: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub dim: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub kind: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub click: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub drag: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub fix: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub follow: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub glow: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub hover: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub select: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
	pub dag_height: f64,
	/// milliseconds
	pub center_speed: u32,
	pub colors: Palette,
	pub nodekinds: BTreeMap<String, String>,
	pub nodetypes: BTreeMap<String, String>,
	pub ctrls: CtrlOptions,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			dag_height: 100.0,
			center_speed: 1000,
			colors: Palette::default(),
			nodekinds: default_node_kinds(),
			nodetypes: default_node_types(),
			ctrls: CtrlOptions::default(),
		}
	}
}

impl Options {
	pub fn from_json(json: &str) -> Result<Self, DataError> {
		Ok(serde_json::from_str(json)?)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct CtrlState {
	pub enabled: bool,
	pub exclude: BTreeSet<Ctrl>,
	pub mode: Mode,
	pub filter: KindFilter,
	pub toggles: Toggles,
}

impl Default for CtrlState {
	fn default() -> Self {
		Self::from_options(&CtrlOptions::default())
	}
}

impl CtrlState {
	pub fn from_options(opts: &CtrlOptions) -> Self {
		let baseline = Self {
			enabled: true,
			exclude: BTreeSet::new(),
			mode: Mode::default(),
			filter: KindFilter::default(),
			toggles: Toggles::default(),
		};
		baseline.updated(opts)
	}

	/// Merges the keys present in `opts` into this state. Invalid
	/// `dim`/`kind`/`exclude` entries are reported and the current value is
	/// kept; the filter is untouched.
	pub fn updated(&self, opts: &CtrlOptions) -> Self {
		let dim = match opts.dim.as_deref().map(str::parse) {
			Some(Ok(dim)) => dim,
			Some(Err(err)) => {
				warn!("{err}");
				self.mode.dim
			}
			None => self.mode.dim,
		};
		let kind = match opts.kind.as_deref().map(str::parse) {
			Some(Ok(kind)) => kind,
			Some(Err(err)) => {
				warn!("{err}");
				self.mode.kind
			}
			None => self.mode.kind,
		};
		let exclude = match &opts.exclude {
			Some(names) => names
				.iter()
				.filter_map(|name| {
					name.parse::<Ctrl>()
						.map_err(|err| warn!("ignoring exclude entry: {err}"))
						.ok()
				})
				.collect(),
			None => self.exclude.clone(),
		};
		let t = self.toggles;

		Self {
			enabled: opts.enabled.unwrap_or(self.enabled),
			exclude,
			mode: Mode { dim, kind },
			filter: self.filter.clone(),
			toggles: Toggles {
				click: opts.click.unwrap_or(t.click),
				drag: opts.drag.unwrap_or(t.drag),
				fix: opts.fix.unwrap_or(t.fix),
				follow: opts.follow.unwrap_or(t.follow),
				glow: opts.glow.unwrap_or(t.glow),
				hover: opts.hover.unwrap_or(t.hover),
				select: opts.select.unwrap_or(t.select),
				autosync: opts.autosync.unwrap_or(t.autosync),
			},
		}
	}

	pub fn shows(&self, ctrl: Ctrl) -> bool {
		!self.exclude.contains(&ctrl)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CtrlUpdate {
	Dim(Dim),
	Kind(GraphKind),
	FilterNode(NodeKind, bool),
	FilterLink(LinkKind, bool),
	Fix(bool),
	Follow(bool),
	Glow(bool),
	Autosync(bool),
	Click(bool),
	Drag(bool),
	Hover(bool),
	Select(bool),
}

impl CtrlUpdate {
	/// Whether the change invalidates the attached graph.
	pub fn needs_redraw(&self) -> bool {
		matches!(
			self,
			CtrlUpdate::Dim(_) | CtrlUpdate::Kind(_) | CtrlUpdate::FilterNode(..) | CtrlUpdate::FilterLink(..)
		)
	}

	/// Parses one `(ctrl, value)` pair of an `update_ctrls` payload. A filter
	/// entry expands into one update per kind listed.
	pub fn parse(ctrl: &str, value: &Value) -> Vec<Result<CtrlUpdate, ParseError>> {
		let bad = || ParseError::BadCtrlValue {
			ctrl: ctrl.to_owned(),
			value: value.to_string(),
		};
		let flag = |make: fn(bool) -> CtrlUpdate| vec![value.as_bool().map(make).ok_or_else(bad)];
		let text = || value.as_str().ok_or_else(bad);

		let ctrl_name = match ctrl.parse::<Ctrl>() {
			Ok(c) => c,
			Err(err) => return vec![Err(err)],
		};
		match ctrl_name {
			Ctrl::Dim => vec![text().and_then(|s| s.parse().map(CtrlUpdate::Dim))],
			Ctrl::Kind => vec![text().and_then(|s| s.parse().map(CtrlUpdate::Kind))],
			Ctrl::Filter => parse_filter(value).unwrap_or_else(|| vec![Err(bad())]),
			Ctrl::Fix => flag(CtrlUpdate::Fix),
			Ctrl::Follow => flag(CtrlUpdate::Follow),
			Ctrl::Glow => flag(CtrlUpdate::Glow),
			Ctrl::Autosync => flag(CtrlUpdate::Autosync),
			Ctrl::Click => flag(CtrlUpdate::Click),
			Ctrl::Drag => flag(CtrlUpdate::Drag),
			Ctrl::Hover => flag(CtrlUpdate::Hover),
			Ctrl::Select => flag(CtrlUpdate::Select),
			Ctrl::Flip | Ctrl::Data | Ctrl::Save | Ctrl::Sync => vec![Err(bad())],
		}
	}

	/// Parses a whole payload, keeping the valid updates and logging the rest.
	pub fn parse_payload(payload: &Map<String, Value>) -> Vec<CtrlUpdate> {
		payload
			.iter()
			.flat_map(|(ctrl, value)| CtrlUpdate::parse(ctrl, value))
			.filter_map(|res| res.map_err(|err| warn!("{err}")).ok())
			.collect()
	}
}

fn parse_filter(value: &Value) -> Option<Vec<Result<CtrlUpdate, ParseError>>> {
	let obj = value.as_object()?;
	let mut out = Vec::new();
	if let Some(nodes) = obj.get("nodes").and_then(Value::as_object) {
		for (kind, on) in nodes {
			out.push(filter_entry(kind, on, "node filter", CtrlUpdate::FilterNode));
		}
	}
	if let Some(links) = obj.get("links").and_then(Value::as_object) {
		for (kind, on) in links {
			out.push(filter_entry(kind, on, "link filter", CtrlUpdate::FilterLink));
		}
	}
	Some(out)
}

fn filter_entry<K: FromStr<Err = ParseError>>(
	kind: &str,
	on: &Value,
	what: &'static str,
	make: fn(K, bool) -> CtrlUpdate,
) -> Result<CtrlUpdate, ParseError> {
	let kind = kind.parse::<K>().map_err(|_| ParseError::unknown(what, kind))?;
	let on = on.as_bool().ok_or_else(|| ParseError::BadCtrlValue {
		ctrl: "filter".to_owned(),
		value: on.to_string(),
	})?;
	Ok(make(kind, on))
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn options_default_from_empty_json() {
		let opts = Options::from_json("{}").unwrap();
		assert_eq!(opts, Options::default());
		assert_eq!(opts.dag_height, 100.0);
		assert_eq!(opts.nodekinds.get("doc").map(String::as_str), Some("#3e5c50"));
	}

	#[test]
	fn options_accept_camel_case_and_false_flags() {
		let opts = Options::from_json(
			r#"{ "dagHeight": 40, "centerSpeed": 250,
			     "ctrls": { "fix": false, "dim": "3d", "kind": "tree", "exclude": ["flip", "nope"] } }"#,
		)
		.unwrap();
		assert_eq!(opts.dag_height, 40.0);
		assert_eq!(opts.center_speed, 250);
		let state = CtrlState::from_options(&opts.ctrls);
		assert!(!state.toggles.fix);
		assert_eq!(
			state.mode,
			Mode {
				dim: Dim::ThreeD,
				kind: GraphKind::Tree
			}
		);
		assert_eq!(state.exclude, BTreeSet::from([Ctrl::Flip]));
	}

	#[test]
	fn invalid_dim_keeps_default() {
		let opts = CtrlOptions {
			dim: Some("5d".into()),
			..CtrlOptions::default()
		};
		assert_eq!(CtrlState::from_options(&opts).mode.dim, Dim::TwoD);
	}

	#[test]
	fn overlay_keeps_previous_valid_values() {
		let mut current = CtrlState::default();
		current.mode.dim = Dim::ThreeD;
		current.filter.nodes.insert(NodeKind::Media, false);
		current.toggles.hover = false;
		let opts = CtrlOptions {
			dim: Some("hologram".into()),
			kind: Some("tree".into()),
			fix: Some(false),
			..CtrlOptions::default()
		};
		let next = current.updated(&opts);
		assert_eq!(next.mode.dim, Dim::ThreeD);
		assert_eq!(next.mode.kind, GraphKind::Tree);
		assert!(!next.filter.node_enabled(NodeKind::Media));
		assert!(!next.toggles.fix);
		assert!(!next.toggles.hover);
	}

	#[test]
	fn absent_keys_leave_state_alone() {
		let mut current = CtrlState::default();
		current.toggles.fix = false;
		current.mode.kind = GraphKind::Tree;
		current.exclude.insert(Ctrl::Save);
		let opts = Options::from_json(r#"{ "ctrls": { "glow": false } }"#).unwrap();
		let next = current.updated(&opts.ctrls);
		assert!(!next.toggles.fix);
		assert!(!next.toggles.glow);
		assert_eq!(next.mode.kind, GraphKind::Tree);
		assert_eq!(next.exclude, BTreeSet::from([Ctrl::Save]));
	}

	#[test]
	fn payload_parsing_keeps_valid_entries() {
		let payload = json!({
			"dim": "vr",
			"kind": "bush",
			"hover": false,
			"wobble": true,
			"filter": { "nodes": { "zombie": false, "ghost": false }, "links": { "attr": false } }
		});
		let updates = CtrlUpdate::parse_payload(payload.as_object().unwrap());
		assert!(updates.contains(&CtrlUpdate::Dim(Dim::Vr)));
		assert!(updates.contains(&CtrlUpdate::Hover(false)));
		assert!(updates.contains(&CtrlUpdate::FilterNode(NodeKind::Zombie, false)));
		assert!(updates.contains(&CtrlUpdate::FilterLink(LinkKind::Attr, false)));
		assert_eq!(updates.len(), 4);
	}

	#[test]
	fn non_bool_flag_is_rejected() {
		let res = CtrlUpdate::parse("fix", &json!("yes"));
		assert!(matches!(res.as_slice(), [Err(ParseError::BadCtrlValue { .. })]));
	}

	#[test]
	fn redraw_is_needed_only_for_structural_changes() {
		assert!(CtrlUpdate::Kind(GraphKind::Tree).needs_redraw());
		assert!(CtrlUpdate::FilterLink(LinkKind::Fam, true).needs_redraw());
		assert!(!CtrlUpdate::Fix(true).needs_redraw());
	}
}
