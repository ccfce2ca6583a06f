//! Closed vocabularies and the id-based input records.
//!
//! Records are what callers hand in and what `save` hands back: relations are
//! plain ids here. The live, index-linked form lives in [`super::graph`].

use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};

use super::error::{DataError, ParseError};

pub type Coord3 = [f64; 3];

macro_rules! closed_enum {
	($(#[$meta:meta])* $name:ident, $what:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
		$(#[$meta])*
		#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		pub enum $name {
			$(
				#[serde(rename = $text)]
				$variant,
			)+
		}

		impl $name {
			pub const ALL: &'static [$name] = &[$($name::$variant),+];

			pub fn as_str(self) -> &'static str {
				match self {
					$($name::$variant => $text,)+
				}
			}
		}

		impl FromStr for $name {
			type Err = ParseError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				match s {
					$($text => Ok($name::$variant),)+
					other => Err(ParseError::unknown($what, other)),
				}
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(self.as_str())
			}
		}
	};
}

closed_enum!(
	/// Coarse node category.
	NodeKind, "node kind", {
		Doc => "doc",
		Media => "media",
		Template => "template",
		Zombie => "zombie",
	}
);

closed_enum!(
	/// Link category.
	LinkKind, "link kind", {
		Fam => "fam",
		Attr => "attr",
		Link => "link",
		Embed => "embed",
	}
);

closed_enum!(
	/// Presentation dimensionality.
	Dim, "graph dimension", {
		TwoD => "2d",
		ThreeD => "3d",
		Ar => "ar",
		Vr => "vr",
	}
);

closed_enum!(
	/// Which relation drives highlighting and layout.
	GraphKind, "graph kind", {
		Tree => "tree",
		Web => "web",
	}
);

impl Dim {
	pub fn is_planar(self) -> bool {
		self == Dim::TwoD
	}

	/// Only the screen-bound modes take pointer interaction.
	pub fn is_interactive(self) -> bool {
		matches!(self, Dim::TwoD | Dim::ThreeD)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mode {
	pub dim: Dim,
	pub kind: GraphKind,
}

impl Default for Mode {
	fn default() -> Self {
		Self {
			dim: Dim::TwoD,
			kind: GraphKind::Web,
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEnds {
	pub source: String,
	pub target: String,
}

/// A relation before hydration: node ids and `{source, target}` pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationIds {
	pub nodes: Vec<String>,
	pub links: Vec<LinkEnds>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
	pub id: String,
	pub kind: NodeKind,
	#[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
	pub node_type: Option<String>,
	#[serde(default)]
	pub label: String,
	#[serde(default)]
	pub lineage: RelationIds,
	#[serde(default)]
	pub neighbors: RelationIds,
	/// Persisted pin, written back by `save`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub coord: Option<Coord3>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
	pub source: String,
	pub target: String,
	pub kind: LinkKind,
}

/// The dataset shape accepted by `draw` and returned by `save`.
///
/// Records that do not decode (an unknown kind, a missing id) are dropped with
/// a warning; the rest of the dataset still loads.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphData {
	#[serde(deserialize_with = "readable_records")]
	pub nodes: Vec<NodeRecord>,
	#[serde(deserialize_with = "readable_records")]
	pub links: Vec<LinkRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
	Known(T),
	Raw(serde_json::Value),
}

fn readable_records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	let records = Vec::<Lenient<T>>::deserialize(deserializer)?;
	Ok(records
		.into_iter()
		.filter_map(|record| match record {
			Lenient::Known(record) => Some(record),
			Lenient::Raw(raw) => {
				warn!("dropping unreadable record {raw}");
				None
			}
		})
		.collect())
}

impl GraphData {
	pub fn from_json(json: &str) -> Result<Self, DataError> {
		Ok(serde_json::from_str(json)?)
	}

	pub fn to_json(&self) -> Result<String, DataError> {
		Ok(serde_json::to_string(self)?)
	}
}
