use crate::tree::names::Names;

pub mod descriptor;
pub mod mappings;

pub trait NodeInfo<I> {
	fn get_node_info(&self) -> &I;
	fn get_node_info_mut(&mut self) -> &mut I;
	fn new(info: I) -> Self;
}

/// Something that has a name in each namespace of a mapping tree.
///
/// Implemented by the info structs of all the nodes.
pub trait GetNames {
	fn get_names(&self) -> &Names;
	fn get_names_mut(&mut self) -> &mut Names;
}

pub mod names {
	use std::fmt::{Debug, Formatter};
	use anyhow::{anyhow, bail, Error, Result};
	use indexmap::IndexSet;
	use crate::error::MergeError;

	/// Describes a given namespace of a mapping tree.
	///
	/// Obtain one via [`Namespaces::get_namespace`].
	#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
	pub struct Namespace(pub(crate) usize);

	impl Namespace {
		pub fn index(self) -> usize {
			self.0
		}
	}

	/// A struct storing the names of the namespaces, in column order.
	///
	/// The names are non-empty and unique.
	#[derive(Clone, PartialEq, Eq)]
	pub struct Namespaces {
		names: Vec<String>,
	}

	impl Namespaces {
		pub fn names(&self) -> &[String] {
			&self.names
		}

		pub fn len(&self) -> usize {
			self.names.len()
		}

		pub fn is_empty(&self) -> bool {
			self.names.is_empty()
		}

		pub fn iter(&self) -> impl Iterator<Item=(Namespace, &str)> {
			self.names.iter()
				.enumerate()
				.map(|(id, name)| (Namespace(id), name.as_str()))
		}

		pub fn find(&self, name: &str) -> Option<Namespace> {
			self.names.iter()
				.position(|namespace| namespace == name)
				.map(Namespace)
		}

		pub fn contains(&self, name: &str) -> bool {
			self.find(name).is_some()
		}

		pub fn get_namespace(&self, name: &str) -> Result<Namespace> {
			self.find(name)
				.ok_or_else(|| anyhow!("cannot find namespace with name {name:?}, only got {self:?}"))
		}

		/// Returns an error if the names of `self` aren't the names given in the argument.
		/// This can be used to check that after reading mappings, you have the correct namespaces in them.
		pub fn check_that(&self, names: &[&str]) -> Result<()> {
			if self.names != names {
				bail!("expected namespaces {names:?}, got {self:?}");
			}
			Ok(())
		}

		/// The namespaces of `self`, followed by the ones of `other` that `self` doesn't have.
		pub fn union(&self, other: &Namespaces) -> Namespaces {
			let names: IndexSet<&String> = self.names.iter().chain(&other.names).collect();
			Namespaces {
				names: names.into_iter().cloned().collect(),
			}
		}

		/// The names of `self` that `other` also has, in the order of `self`.
		pub fn intersection(&self, other: &Namespaces) -> Vec<String> {
			self.names.iter()
				.filter(|name| other.contains(name))
				.cloned()
				.collect()
		}
	}

	impl Debug for Namespaces {
		fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
			f.debug_list()
				.entries(&self.names)
				.finish()
		}
	}

	impl TryFrom<Vec<String>> for Namespaces {
		type Error = Error;

		fn try_from(value: Vec<String>) -> Result<Self> {
			if value.iter().any(|i| i.is_empty()) {
				bail!("found empty namespace name in {value:?}, every namespace name must be non-empty");
			}

			let mut seen = IndexSet::new();
			for name in &value {
				if !seen.insert(name) {
					return Err(MergeError::DuplicateNamespace { namespace: name.clone() }.into());
				}
			}

			Ok(Namespaces { names: value })
		}
	}

	impl TryFrom<&[&str]> for Namespaces {
		type Error = Error;

		fn try_from(value: &[&str]) -> Result<Self> {
			value.iter()
				.map(|&x| x.to_owned())
				.collect::<Vec<_>>()
				.try_into()
		}
	}

	impl From<Namespaces> for Vec<String> {
		fn from(value: Namespaces) -> Self {
			value.names
		}
	}

	/// A struct storing names for namespaces.
	///
	/// A `None` entry is a hole: the entity has no name in that namespace.
	/// Asking for a namespace past the end also gives a hole.
	#[derive(Clone, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
	pub struct Names {
		names: Vec<Option<String>>,
	}

	impl Names {
		pub fn get(&self, namespace: Namespace) -> Option<&str> {
			self.names.get(namespace.0)?.as_deref()
		}

		pub fn names(&self) -> &[Option<String>] {
			&self.names
		}

		pub fn len(&self) -> usize {
			self.names.len()
		}

		pub fn is_empty(&self) -> bool {
			self.names.is_empty()
		}
	}

	impl Debug for Names {
		fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
			f.debug_list()
				.entries(&self.names)
				.finish()
		}
	}

	/// Note that empty inputs are converted into `None`.
	impl From<Vec<String>> for Names {
		fn from(value: Vec<String>) -> Self {
			value.into_iter()
				.map(Some)
				.collect()
		}
	}

	impl<const N: usize> From<[&str; N]> for Names {
		fn from(value: [&str; N]) -> Self {
			value.into_iter()
				.map(|x| Some(x.to_owned()))
				.collect()
		}
	}

	/// Note that `Some("")` is converted into `None`.
	impl FromIterator<Option<String>> for Names {
		fn from_iter<T: IntoIterator<Item=Option<String>>>(iter: T) -> Self {
			let names = iter.into_iter()
				.map(|x| x.filter(|x| !x.is_empty()))
				.collect();
			Names { names }
		}
	}

	impl From<Names> for Vec<Option<String>> {
		fn from(value: Names) -> Self {
			value.names
		}
	}

	#[cfg(test)]
	mod testing {
		use pretty_assertions::assert_eq;
		use crate::error::MergeError;
		use crate::tree::names::{Names, Namespace, Namespaces};

		#[test]
		fn empty_names_are_holes() {
			let names = Names::from(["a", "", "c"]);
			assert_eq!(names.get(Namespace(0)), Some("a"));
			assert_eq!(names.get(Namespace(1)), None);
			assert_eq!(names.get(Namespace(2)), Some("c"));
			assert_eq!(names.get(Namespace(3)), None);
		}

		#[test]
		fn duplicate_namespace() {
			let error = Namespaces::try_from(&["a", "b", "a"][..]).unwrap_err();
			assert_eq!(
				error.downcast_ref::<MergeError>(),
				Some(&MergeError::DuplicateNamespace { namespace: "a".to_owned() })
			);
		}

		#[test]
		fn union_keeps_order_of_first() {
			let a = Namespaces::try_from(&["intermediary", "named"][..]).unwrap();
			let b = Namespaces::try_from(&["official", "intermediary"][..]).unwrap();

			let union = a.union(&b);
			union.check_that(&["intermediary", "named", "official"]).unwrap();

			assert_eq!(a.intersection(&b), vec!["intermediary".to_owned()]);
		}
	}
}
