use std::fmt::{Display, Formatter};
use thiserror::Error;

/// One of the two inputs of a merge.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Side {
	A,
	B,
}

impl Display for Side {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Side::A => write!(f, "A"),
			Side::B => write!(f, "B"),
		}
	}
}

/// The failures a merge reports to its caller.
///
/// These are returned wrapped in an [`anyhow::Error`], use [`anyhow::Error::downcast_ref`] to get them back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
	/// The inputs share no namespace, and none was given.
	#[error("no common namespaces between inputs, only found A: {a:?}, B: {b:?}")]
	NoCommonNamespace {
		a: Vec<String>,
		b: Vec<String>,
	},

	/// The inputs share more than one namespace, and none was given.
	#[error("multiple common namespaces between inputs: {candidates:?}, specify the desired common namespace")]
	AmbiguousCommonNamespace {
		candidates: Vec<String>,
	},

	/// The given common namespace is missing from one of the inputs.
	#[error("unable to find specified common namespace {namespace:?} in {side} input, only found {available:?}")]
	UnknownNamespace {
		namespace: String,
		side: Side,
		available: Vec<String>,
	},

	/// Neither input gives a descriptor for a field or method.
	#[error("no descriptor for key {key:?}")]
	MissingDescriptor {
		key: String,
	},

	/// The second input of a legacy merge brings no namespace the first doesn't already have.
	#[error("no additional namespaces to merge from B")]
	NoAdditionalNamespaces,

	/// A header lists the same namespace twice.
	#[error("duplicate namespace: {namespace:?}")]
	DuplicateNamespace {
		namespace: String,
	},

	/// An entry has no name in the namespace used as the join key.
	#[error("common namespace of {side} input has holes")]
	HoleInCommonNamespace {
		side: Side,
	},
}
