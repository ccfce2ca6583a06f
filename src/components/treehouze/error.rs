use thiserror::Error;

use super::types::Dim;

/// A value from outside the crate that does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
	#[error("invalid {what}: {value:?}")]
	UnknownVariant { what: &'static str, value: String },
	#[error("invalid value for ctrl {ctrl:?}: {value}")]
	BadCtrlValue { ctrl: String, value: String },
}

impl ParseError {
	pub(crate) fn unknown(what: &'static str, value: impl Into<String>) -> Self {
		Self::UnknownVariant {
			what,
			value: value.into(),
		}
	}
}

/// Reasons a draw aborts before any session is attached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
	#[error("no graph data")]
	NoGraphData,
	#[error("no render backend available for dimension {0}")]
	NoBackend(Dim),
}

/// Decoding failures for datasets and options.
#[derive(Debug, Error)]
pub enum DataError {
	#[error("malformed json: {0}")]
	Json(#[from] serde_json::Error),
}
