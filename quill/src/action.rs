pub(crate) mod enclosing_class;
pub(crate) mod merge;
pub(crate) mod merge_v1;

use std::fmt::Debug;
use std::hash::Hash;
use anyhow::{bail, Result};
use indexmap::IndexMap;
use indexmap::map::Entry;
use log::debug;
use crate::error::{MergeError, Side};
use crate::tree::GetNames;
use crate::tree::names::{Names, Namespace, Namespaces};

/// Options for merging two mappings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOptions {
	/// The namespace both inputs share. If not given, the only namespace both inputs have is used.
	pub common_namespace: Option<String>,
	/// Leave names missing in both inputs empty, instead of filling them with the name in the common namespace.
	pub leave_holes: bool,
}

/// Finds the namespace to join two inputs on.
///
/// If `common` is given, both inputs must have it. Otherwise the inputs must share exactly one namespace.
pub(crate) fn find_common_namespace(a: &Namespaces, b: &Namespaces, common: Option<&str>) -> Result<String> {
	if let Some(common) = common {
		for (side, namespaces) in [(Side::A, a), (Side::B, b)] {
			if !namespaces.contains(common) {
				return Err(MergeError::UnknownNamespace {
					namespace: common.to_owned(),
					side,
					available: namespaces.names().to_vec(),
				}.into());
			}
		}
		return Ok(common.to_owned());
	}

	let mut candidates = a.intersection(b);
	match candidates.len() {
		0 => Err(MergeError::NoCommonNamespace {
			a: a.names().to_vec(),
			b: b.names().to_vec(),
		}.into()),
		1 => Ok(candidates.remove(0)),
		_ => Err(MergeError::AmbiguousCommonNamespace { candidates }.into()),
	}
}

/// Builds a lookup of `items` by the given key, failing if two items have the same key.
pub(crate) fn index_by<'a, T, K, F>(items: &'a [T], side: Side, key: F) -> Result<IndexMap<K, &'a T>>
where
	K: Hash + Eq + Debug,
	F: Fn(&'a T) -> Result<K>,
{
	let mut map = IndexMap::with_capacity(items.len());
	for item in items {
		match map.entry(key(item)?) {
			Entry::Occupied(entry) => bail!("duplicate key {:?} in {side} input", entry.key()),
			Entry::Vacant(entry) => {
				entry.insert(item);
			},
		}
	}
	Ok(map)
}

/// Everything about the namespaces of a merge, computed once before merging any entries.
#[derive(Debug, Clone)]
pub(crate) struct MergeContext {
	/// The name of the common namespace.
	pub(crate) common_name: String,
	/// The common namespace, in the output.
	pub(crate) common: Namespace,
	pub(crate) common_a: Namespace,
	pub(crate) common_b: Namespace,
	pub(crate) leave_holes: bool,
	/// The namespaces of `a`, followed by the ones only `b` has.
	pub(crate) namespaces: Namespaces,
	/// For each output namespace, where to find it in `a`.
	map_a: Vec<Option<Namespace>>,
	/// For each output namespace, where to find it in `b`.
	map_b: Vec<Option<Namespace>>,
}

impl MergeContext {
	pub(crate) fn new(a: &Namespaces, b: &Namespaces, options: &MergeOptions) -> Result<MergeContext> {
		let common_name = find_common_namespace(a, b, options.common_namespace.as_deref())?;
		let namespaces = a.union(b);

		debug!("merging on common namespace {common_name:?}, resulting in namespaces {namespaces:?}");

		let map_a = namespaces.names().iter().map(|name| a.find(name)).collect();
		let map_b = namespaces.names().iter().map(|name| b.find(name)).collect();

		Ok(MergeContext {
			common: namespaces.get_namespace(&common_name)?,
			common_a: a.get_namespace(&common_name)?,
			common_b: b.get_namespace(&common_name)?,
			common_name,
			leave_holes: options.leave_holes,
			namespaces,
			map_a,
			map_b,
		})
	}

	pub(crate) fn common_of(&self, side: Side) -> Namespace {
		match side {
			Side::A => self.common_a,
			Side::B => self.common_b,
		}
	}

	/// Where to find the given output namespace in the input of the given side.
	pub(crate) fn input_namespace(&self, side: Side, namespace: Namespace) -> Option<Namespace> {
		let map = match side {
			Side::A => &self.map_a,
			Side::B => &self.map_b,
		};
		map.get(namespace.index()).copied().flatten()
	}

	/// The name of an entry in the common namespace, which it must have.
	pub(crate) fn key<'a>(&self, side: Side, names: &'a Names) -> Result<&'a str> {
		names.get(self.common_of(side))
			.ok_or_else(|| MergeError::HoleInCommonNamespace { side }.into())
	}

	/// Decides the name of an entry in every output namespace.
	///
	/// The `key` always wins in the common namespace, then the name from `a`, then the one from `b`.
	/// If neither has one, this leaves a hole if asked to or if there's no key, and otherwise uses the key.
	pub(crate) fn merge_names<T: GetNames>(&self, key: Option<&str>, a: Option<&T>, b: Option<&T>) -> Names {
		self.namespaces.iter()
			.map(|(namespace, _)| {
				if let Some(key) = key.filter(|_| namespace == self.common) {
					return Some(key.to_owned());
				}

				let name_a = a.zip(self.input_namespace(Side::A, namespace))
					.and_then(|(x, namespace)| x.get_names().get(namespace));
				let name_b = b.zip(self.input_namespace(Side::B, namespace))
					.and_then(|(x, namespace)| x.get_names().get(namespace));

				name_a.or(name_b)
					.or(if self.leave_holes { None } else { key })
					.map(|name| name.to_owned())
			})
			.collect()
	}
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use crate::action::{find_common_namespace, MergeContext, MergeOptions};
	use crate::error::{MergeError, Side};
	use crate::tree::mappings::ClassMapping;
	use crate::tree::names::{Names, Namespaces};

	fn namespaces(names: &[&str]) -> Namespaces {
		names.try_into().unwrap()
	}

	#[test]
	fn inferred_common_namespace() {
		let a = namespaces(&["intermediary", "named"]);
		let b = namespaces(&["intermediary", "official"]);
		assert_eq!(find_common_namespace(&a, &b, None).unwrap(), "intermediary");
	}

	#[test]
	fn no_common_namespace() {
		let a = namespaces(&["intermediary", "named"]);
		let b = namespaces(&["official", "srg"]);
		let error = find_common_namespace(&a, &b, None).unwrap_err();
		assert_eq!(
			error.downcast_ref::<MergeError>(),
			Some(&MergeError::NoCommonNamespace {
				a: vec!["intermediary".to_owned(), "named".to_owned()],
				b: vec!["official".to_owned(), "srg".to_owned()],
			})
		);
	}

	#[test]
	fn ambiguous_common_namespace() {
		let a = namespaces(&["intermediary", "named", "official"]);
		let b = namespaces(&["official", "intermediary"]);
		let error = find_common_namespace(&a, &b, None).unwrap_err();
		assert_eq!(
			error.downcast_ref::<MergeError>(),
			Some(&MergeError::AmbiguousCommonNamespace {
				candidates: vec!["intermediary".to_owned(), "official".to_owned()],
			})
		);

		assert_eq!(find_common_namespace(&a, &b, Some("official")).unwrap(), "official");
	}

	#[test]
	fn unknown_common_namespace() {
		let a = namespaces(&["intermediary", "named"]);
		let b = namespaces(&["official", "intermediary"]);
		let error = find_common_namespace(&a, &b, Some("named")).unwrap_err();
		assert_eq!(
			error.downcast_ref::<MergeError>(),
			Some(&MergeError::UnknownNamespace {
				namespace: "named".to_owned(),
				side: Side::B,
				available: vec!["official".to_owned(), "intermediary".to_owned()],
			})
		);
	}

	#[test]
	fn merge_names() {
		let a = namespaces(&["intermediary", "named"]);
		let b = namespaces(&["official", "intermediary", "srg"]);

		let context = MergeContext::new(&a, &b, &MergeOptions::default()).unwrap();
		context.namespaces.check_that(&["intermediary", "named", "official", "srg"]).unwrap();

		let names_a = ClassMapping { names: Names::from(["class_1", ""]) };
		let names_b = ClassMapping { names: Names::from(["a", "class_1", "C_1"]) };

		assert_eq!(
			context.merge_names(Some("class_1"), Some(&names_a), Some(&names_b)),
			Names::from(["class_1", "class_1", "a", "C_1"])
		);
		assert_eq!(
			context.merge_names(Some("class_1"), Some(&names_a), None),
			Names::from(["class_1", "class_1", "class_1", "class_1"])
		);
		assert_eq!(
			context.merge_names(None, Some(&names_a), None),
			Names::from(["class_1", "", "", ""])
		);

		let context = MergeContext::new(&a, &b, &MergeOptions { common_namespace: None, leave_holes: true }).unwrap();
		assert_eq!(
			context.merge_names(Some("class_1"), Some(&names_a), None),
			Names::from(["class_1", "", "", ""])
		);
	}
}
