use std::borrow::Cow;
use std::hash::Hash;
use anyhow::{anyhow, bail, Context, Result};
use indexmap::{IndexMap, IndexSet};
use log::{trace, warn};
use crate::action::enclosing_class::synthesize_class;
use crate::action::{index_by, MergeContext, MergeOptions};
use crate::error::{MergeError, Side};
use crate::tree::descriptor::MethodDescriptor;
use crate::tree::mappings::{ClassMapping, ClassNowodeMapping, FieldMapping, FieldNowodeMapping, LocalVariableMapping, LocalVariableNowodeMapping, MappingInfo, Mappings, MethodMapping, MethodNowodeMapping, ParameterMapping, ParameterNowodeMapping};
use crate::tree::names::Namespaces;
use crate::tree::NodeInfo;

/// Merges the entries of two lookups, calling `merger` once for every key in either of them.
///
/// The keys of `a` come first, then the ones only `b` has.
fn merge_map<K, V, W, F>(a: &IndexMap<K, V>, b: &IndexMap<K, V>, mut merger: F) -> Result<Vec<W>>
where
	K: Hash + Eq,
	V: Copy,
	F: FnMut(&K, Option<V>, Option<V>) -> Result<W>,
{
	let keys: IndexSet<&K> = a.keys().chain(b.keys()).collect();

	keys.into_iter()
		.map(|key| merger(key, a.get(key).copied(), b.get(key).copied()))
		.collect()
}

fn merge_comments(a: Option<&IndexSet<String>>, b: Option<&IndexSet<String>>) -> IndexSet<String> {
	a.into_iter().chain(b).flatten().cloned().collect()
}

type ClassLookup<'a> = IndexMap<&'a str, &'a ClassNowodeMapping>;
type MethodKey<'a> = (&'a str, Option<&'a MethodDescriptor>);

impl MergeContext {
	fn index_classes<'a>(&self, mappings: &'a Mappings, side: Side) -> Result<ClassLookup<'a>> {
		index_by(&mappings.classes, side, |class| self.key(side, &class.info.names))
			.with_context(|| anyhow!("failed to look up classes of {side} input"))
	}

	fn index_fields<'a>(&self, class: Option<&'a ClassNowodeMapping>, side: Side) -> Result<IndexMap<&'a str, &'a FieldNowodeMapping>> {
		let fields = class.map_or(&[][..], |class| class.fields.as_slice());
		index_by(fields, side, |field| self.key(side, &field.info.names))
	}

	fn index_methods<'a>(&self, class: Option<&'a ClassNowodeMapping>, side: Side) -> Result<IndexMap<MethodKey<'a>, &'a MethodNowodeMapping>> {
		let methods = class.map_or(&[][..], |class| class.methods.as_slice());
		index_by(methods, side, |method| Ok((self.key(side, &method.info.names)?, method.info.desc.as_ref())))
	}

	/// Gives back the class of one input, or makes one up if it's a nested class that input doesn't have.
	fn match_enclosing_class_if_needed<'a>(
		&self,
		key: &str,
		class: Option<&'a ClassNowodeMapping>,
		side: Side,
		namespaces: &Namespaces,
		classes: &ClassLookup<'a>,
	) -> Option<Cow<'a, ClassNowodeMapping>> {
		match class {
			Some(class) => Some(Cow::Borrowed(class)),
			None if key.contains('$') => {
				let class = synthesize_class(key, namespaces, self.common_of(side), classes);
				trace!("{side} input has no class {key:?}, using {:?} from its enclosing classes", class.info.names);
				Some(Cow::Owned(class))
			},
			None => None,
		}
	}

	fn merge_info(&self, a: &MappingInfo, b: &MappingInfo) -> MappingInfo {
		if a.version != b.version {
			warn!("version {:?} of B input differs from {:?} of A input, keeping the one of A", b.version, a.version);
		}
		if a.properties != b.properties {
			warn!("properties {:?} of B input differ from {:?} of A input, keeping the ones of A", b.properties, a.properties);
		}

		MappingInfo {
			namespaces: self.namespaces.clone(),
			version: a.version,
			properties: a.properties.clone(),
		}
	}

	fn merge_class(&self, key: &str, a: Option<&ClassNowodeMapping>, b: Option<&ClassNowodeMapping>) -> Result<ClassNowodeMapping> {
		let names = self.merge_names(Some(key), a.map(NodeInfo::get_node_info), b.map(NodeInfo::get_node_info));

		let mut class = ClassNowodeMapping::new(ClassMapping { names });
		class.comments = merge_comments(a.map(|x| &x.comments), b.map(|x| &x.comments));

		let fields_a = self.index_fields(a, Side::A)?;
		let fields_b = self.index_fields(b, Side::B)?;
		class.fields = merge_map(&fields_a, &fields_b, |&key, a, b| {
			self.merge_field(key, a, b)
				.with_context(|| anyhow!("failed to merge field {key:?}"))
		})?;

		let methods_a = self.index_methods(a, Side::A)?;
		let methods_b = self.index_methods(b, Side::B)?;
		class.methods = merge_map(&methods_a, &methods_b, |&key, a, b| {
			self.merge_method(key, a, b)
				.with_context(|| anyhow!("failed to merge method {:?} {:?}", key.0, key.1))
		})?;

		Ok(class)
	}

	fn merge_field(&self, key: &str, a: Option<&FieldNowodeMapping>, b: Option<&FieldNowodeMapping>) -> Result<FieldNowodeMapping> {
		let names = self.merge_names(Some(key), a.map(NodeInfo::get_node_info), b.map(NodeInfo::get_node_info));

		let desc = a.and_then(|x| x.info.desc.as_ref())
			.or_else(|| b.and_then(|x| x.info.desc.as_ref()))
			.ok_or_else(|| MergeError::MissingDescriptor { key: key.to_owned() })?;

		let mut field = FieldNowodeMapping::new(FieldMapping { desc: Some(desc.clone()), names });
		field.comments = merge_comments(a.map(|x| &x.comments), b.map(|x| &x.comments));
		Ok(field)
	}

	fn merge_method(&self, (key, desc): MethodKey<'_>, a: Option<&MethodNowodeMapping>, b: Option<&MethodNowodeMapping>) -> Result<MethodNowodeMapping> {
		let names = self.merge_names(Some(key), a.map(NodeInfo::get_node_info), b.map(NodeInfo::get_node_info));

		let desc = desc.ok_or_else(|| MergeError::MissingDescriptor { key: key.to_owned() })?;

		let mut method = MethodNowodeMapping::new(MethodMapping { desc: Some(desc.clone()), names });
		method.comments = merge_comments(a.map(|x| &x.comments), b.map(|x| &x.comments));

		let parameters_a = index_by(a.map_or(&[][..], |x| x.parameters.as_slice()), Side::A, |x| Ok(x.info.lv_index))?;
		let parameters_b = index_by(b.map_or(&[][..], |x| x.parameters.as_slice()), Side::B, |x| Ok(x.info.lv_index))?;
		method.parameters = merge_map(&parameters_a, &parameters_b, |&lv_index, a, b| {
			Ok(self.merge_parameter(lv_index, a, b))
		})?;

		let local_variables_a = index_by(a.map_or(&[][..], |x| x.local_variables.as_slice()), Side::A, |x| Ok(x.info.lv_index))?;
		let local_variables_b = index_by(b.map_or(&[][..], |x| x.local_variables.as_slice()), Side::B, |x| Ok(x.info.lv_index))?;
		method.local_variables = merge_map(&local_variables_a, &local_variables_b, |&lv_index, a, b| {
			self.merge_local_variable(lv_index, a, b)
		})?;

		Ok(method)
	}

	fn merge_parameter(&self, lv_index: usize, a: Option<&ParameterNowodeMapping>, b: Option<&ParameterNowodeMapping>) -> ParameterNowodeMapping {
		let names = self.merge_names(None, a.map(NodeInfo::get_node_info), b.map(NodeInfo::get_node_info));

		let mut parameter = ParameterNowodeMapping::new(ParameterMapping { lv_index, names });
		parameter.comments = merge_comments(a.map(|x| &x.comments), b.map(|x| &x.comments));
		parameter
	}

	fn merge_local_variable(&self, lv_index: usize, a: Option<&LocalVariableNowodeMapping>, b: Option<&LocalVariableNowodeMapping>) -> Result<LocalVariableNowodeMapping> {
		let names = self.merge_names(None, a.map(NodeInfo::get_node_info), b.map(NodeInfo::get_node_info));

		let (lv_start_offset, lv_table_index) = match (a, b) {
			(Some(a), Some(b)) => {
				if (a.info.lv_start_offset, a.info.lv_table_index) != (b.info.lv_start_offset, b.info.lv_table_index) {
					warn!(
						"local variable {lv_index} has start offset {} and table index {:?} in A input, but {} and {:?} in B input, keeping the ones of A",
						a.info.lv_start_offset, a.info.lv_table_index, b.info.lv_start_offset, b.info.lv_table_index,
					);
				}
				(a.info.lv_start_offset, a.info.lv_table_index)
			},
			(Some(x), None) | (None, Some(x)) => (x.info.lv_start_offset, x.info.lv_table_index),
			(None, None) => bail!("no local variable with index {lv_index} in either input"),
		};

		let mut local_variable = LocalVariableNowodeMapping::new(LocalVariableMapping { lv_index, lv_start_offset, lv_table_index, names });
		local_variable.comments = merge_comments(a.map(|x| &x.comments), b.map(|x| &x.comments));
		Ok(local_variable)
	}
}

impl Mappings {
	#[allow(clippy::tabs_in_doc_comments)]
	/// Merges two mappings that share one namespace, the common namespace.
	///
	/// The result has the namespaces of `a`, followed by the ones only `b` has. Entries are matched up by their
	/// name in the common namespace, methods additionally by their descriptor, and parameters and local variables
	/// by their local variable index. Names missing in one input are taken from the other one. For names that
	/// are missing in both, see [`MergeOptions::leave_holes`].
	///
	/// A nested class only one input has gets its name in the other input from its nearest enclosing class
	/// there, with the inner part appended.
	///
	/// The version and properties are the ones of `a`.
	///
	/// ```
	/// # use pretty_assertions::assert_eq;
	/// use quill::tree::mappings::Mappings;
	/// use quill::MergeOptions;
	///
	/// let a = quill::tiny_v2::read("\
	/// tiny	2	0	intermediary	named
	/// c	class_1	com/foo/Bar
	/// ".as_bytes()).unwrap();
	/// let b = quill::tiny_v2::read("\
	/// tiny	2	0	intermediary	official
	/// c	class_1	a
	/// ".as_bytes()).unwrap();
	///
	/// let merged = Mappings::merge(&a, &b, &MergeOptions::default()).unwrap();
	///
	/// assert_eq!(quill::tiny_v2::write_string(&merged).unwrap(), "\
	/// tiny	2	0	intermediary	named	official
	/// c	class_1	com/foo/Bar	a
	/// ");
	/// ```
	pub fn merge(a: &Mappings, b: &Mappings, options: &MergeOptions) -> Result<Mappings> {
		let context = MergeContext::new(&a.info.namespaces, &b.info.namespaces, options)?;

		let classes_a = context.index_classes(a, Side::A)?;
		let classes_b = context.index_classes(b, Side::B)?;

		let classes = merge_map(&classes_a, &classes_b, |&key, class_a, class_b| {
			let class_a = context.match_enclosing_class_if_needed(key, class_a, Side::A, &a.info.namespaces, &classes_a);
			let class_b = context.match_enclosing_class_if_needed(key, class_b, Side::B, &b.info.namespaces, &classes_b);

			context.merge_class(key, class_a.as_deref(), class_b.as_deref())
				.with_context(|| anyhow!("failed to merge class {key:?}"))
		})?;

		Ok(Mappings {
			info: context.merge_info(&a.info, &b.info),
			classes,
		})
	}
}
