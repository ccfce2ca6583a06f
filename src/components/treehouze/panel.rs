//! Control panel definition.
//!
//! The panel is described as a plain tree of tabs, folders and inputs built
//! from the current [`CtrlState`]; whatever widget layer renders it reports
//! back with [`PanelEvent`]s.

use super::config::{Ctrl, CtrlState, CtrlUpdate};
use super::error::ParseError;
use super::types::{Dim, GraphKind, LinkKind, NodeKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Switch {
	Dim,
	Kind,
	Fix,
	Follow,
	Glow,
	Autosync,
	Click,
	Drag,
	Hover,
	Select,
	Node(NodeKind),
	Link(LinkKind),
}

impl Switch {
	/// Update for a boolean input. `None` for the choice switches.
	pub fn toggled(self, on: bool) -> Option<CtrlUpdate> {
		Some(match self {
			Switch::Fix => CtrlUpdate::Fix(on),
			Switch::Follow => CtrlUpdate::Follow(on),
			Switch::Glow => CtrlUpdate::Glow(on),
			Switch::Autosync => CtrlUpdate::Autosync(on),
			Switch::Click => CtrlUpdate::Click(on),
			Switch::Drag => CtrlUpdate::Drag(on),
			Switch::Hover => CtrlUpdate::Hover(on),
			Switch::Select => CtrlUpdate::Select(on),
			Switch::Node(kind) => CtrlUpdate::FilterNode(kind, on),
			Switch::Link(kind) => CtrlUpdate::FilterLink(kind, on),
			Switch::Dim | Switch::Kind => return None,
		})
	}

	/// Update for a choice input.
	pub fn chosen(self, value: &str) -> Result<CtrlUpdate, ParseError> {
		match self {
			Switch::Dim => value.parse().map(CtrlUpdate::Dim),
			Switch::Kind => value.parse().map(CtrlUpdate::Kind),
			_ => Err(ParseError::BadCtrlValue {
				ctrl: format!("{self:?}").to_lowercase(),
				value: value.to_owned(),
			}),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelAction {
	Flip,
	Save,
	Sync,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelEvent {
	Change(CtrlUpdate),
	Press(PanelAction),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
	Toggle {
		label: &'static str,
		switch: Switch,
		value: bool,
		disabled: bool,
	},
	Choice {
		label: &'static str,
		switch: Switch,
		/// `(title, value)` pairs
		options: Vec<(&'static str, &'static str)>,
		value: &'static str,
	},
	Button {
		label: &'static str,
		action: PanelAction,
		disabled: bool,
	},
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item {
	Input(Input),
	Folder { title: &'static str, inputs: Vec<Input> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tab {
	pub title: &'static str,
	pub items: Vec<Item>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PanelSpec {
	pub tabs: Vec<Tab>,
}

impl PanelSpec {
	/// Builds the panel for `state`. Empty when the panel is disabled.
	pub fn build(state: &CtrlState) -> Self {
		if !state.enabled {
			return Self::default();
		}
		Self {
			tabs: vec![properties(state), actions(state)],
		}
	}

	pub fn is_empty(&self) -> bool {
		self.tabs.is_empty()
	}

	pub fn inputs(&self) -> impl Iterator<Item = &Input> {
		self.tabs.iter().flat_map(|tab| {
			tab.items.iter().flat_map(|item| match item {
				Item::Input(input) => std::slice::from_ref(input).iter(),
				Item::Folder { inputs, .. } => inputs.iter(),
			})
		})
	}
}

fn toggle(label: &'static str, switch: Switch, value: bool) -> Input {
	Input::Toggle {
		label,
		switch,
		value,
		disabled: false,
	}
}

fn properties(state: &CtrlState) -> Tab {
	let t = &state.toggles;
	let mut items = Vec::new();
	let mut push = |ctrl: Ctrl, input: Input| {
		if state.shows(ctrl) {
			items.push(Item::Input(input));
		}
	};

	push(
		Ctrl::Kind,
		Input::Choice {
			label: "kind",
			switch: Switch::Kind,
			options: GraphKind::ALL.iter().map(|k| (k.as_str(), k.as_str())).collect(),
			value: state.mode.kind.as_str(),
		},
	);
	push(
		Ctrl::Dim,
		Input::Choice {
			label: "dim",
			switch: Switch::Dim,
			options: Dim::ALL.iter().map(|d| (dim_title(*d), d.as_str())).collect(),
			value: state.mode.dim.as_str(),
		},
	);
	push(Ctrl::Fix, toggle("fix", Switch::Fix, t.fix));
	push(Ctrl::Follow, toggle("follow", Switch::Follow, t.follow));
	push(Ctrl::Glow, toggle("glow", Switch::Glow, t.glow));
	push(Ctrl::Autosync, toggle("autosync", Switch::Autosync, t.autosync));
	push(
		Ctrl::Flip,
		Input::Button {
			label: "flip",
			action: PanelAction::Flip,
			disabled: state.mode.kind == GraphKind::Web,
		},
	);

	if state.shows(Ctrl::Filter) {
		items.push(Item::Folder {
			title: "filter",
			inputs: filter_inputs(state),
		});
	}

	Tab {
		title: "properties",
		items,
	}
}

fn filter_inputs(state: &CtrlState) -> Vec<Input> {
	let tree = state.mode.kind == GraphKind::Tree;
	let nodes = NodeKind::ALL
		.iter()
		.map(|&kind| toggle(kind.as_str(), Switch::Node(kind), state.filter.node_enabled(kind)));
	let links = LinkKind::ALL.iter().map(|&kind| Input::Toggle {
		label: kind.as_str(),
		switch: Switch::Link(kind),
		value: state.filter.link_enabled(kind),
		// tree mode only draws family links, web mode never does
		disabled: if tree { kind != LinkKind::Fam } else { kind == LinkKind::Fam },
	});
	nodes.chain(links).collect()
}

fn actions(state: &CtrlState) -> Tab {
	let t = &state.toggles;
	let mut items: Vec<Item> = [
		(Ctrl::Click, toggle("click", Switch::Click, t.click)),
		(Ctrl::Drag, toggle("drag", Switch::Drag, t.drag)),
		(Ctrl::Hover, toggle("hover", Switch::Hover, t.hover)),
		(Ctrl::Select, toggle("select", Switch::Select, t.select)),
	]
	.into_iter()
	.filter(|(ctrl, _)| state.shows(*ctrl))
	.map(|(_, input)| Item::Input(input))
	.collect();

	if state.shows(Ctrl::Data) {
		let buttons: Vec<Input> = [(Ctrl::Sync, PanelAction::Sync, "sync"), (Ctrl::Save, PanelAction::Save, "save")]
			.into_iter()
			.filter(|(ctrl, _, _)| state.shows(*ctrl))
			.map(|(_, action, label)| Input::Button {
				label,
				action,
				disabled: false,
			})
			.collect();
		if !buttons.is_empty() {
			items.push(Item::Folder {
				title: "data",
				inputs: buttons,
			});
		}
	}

	Tab {
		title: "actions",
		items,
	}
}

fn dim_title(dim: Dim) -> &'static str {
	match dim {
		Dim::TwoD => "2D",
		Dim::ThreeD => "3D",
		Dim::Ar => "AR",
		Dim::Vr => "VR",
	}
}
