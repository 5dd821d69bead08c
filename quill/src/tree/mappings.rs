use anyhow::Result;
use indexmap::{IndexMap, IndexSet};
use crate::tree::descriptor::{FieldDescriptor, MethodDescriptor};
use crate::tree::names::{Names, Namespace, Namespaces};
use crate::tree::{GetNames, NodeInfo};

/// The property that marks names in a tiny v2 file as escaped.
pub const ESCAPED_NAMES: &str = "escaped-names";

#[derive(Debug, Clone, PartialEq)]
pub struct Mappings {
	pub info: MappingInfo,
	pub classes: Vec<ClassNowodeMapping>,
}

impl NodeInfo<MappingInfo> for Mappings {
	fn get_node_info(&self) -> &MappingInfo {
		&self.info
	}

	fn get_node_info_mut(&mut self) -> &mut MappingInfo {
		&mut self.info
	}

	fn new(info: MappingInfo) -> Self {
		Mappings {
			info,
			classes: Vec::new(),
		}
	}
}

impl Mappings {
	pub fn add_class(&mut self, child: ClassNowodeMapping) -> &mut ClassNowodeMapping {
		self.classes.push(child);
		let last = self.classes.len() - 1;
		&mut self.classes[last]
	}

	pub fn get_namespace(&self, name: &str) -> Result<Namespace> {
		self.info.namespaces.get_namespace(name)
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassNowodeMapping {
	pub info: ClassMapping,
	pub fields: Vec<FieldNowodeMapping>,
	pub methods: Vec<MethodNowodeMapping>,
	pub comments: IndexSet<String>,
}

impl NodeInfo<ClassMapping> for ClassNowodeMapping {
	fn get_node_info(&self) -> &ClassMapping {
		&self.info
	}

	fn get_node_info_mut(&mut self) -> &mut ClassMapping {
		&mut self.info
	}

	fn new(info: ClassMapping) -> Self {
		ClassNowodeMapping {
			info,
			fields: Vec::new(),
			methods: Vec::new(),
			comments: IndexSet::new(),
		}
	}
}

impl ClassNowodeMapping {
	pub fn add_field(&mut self, child: FieldNowodeMapping) -> &mut FieldNowodeMapping {
		self.fields.push(child);
		let last = self.fields.len() - 1;
		&mut self.fields[last]
	}

	pub fn add_method(&mut self, child: MethodNowodeMapping) -> &mut MethodNowodeMapping {
		self.methods.push(child);
		let last = self.methods.len() - 1;
		&mut self.methods[last]
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldNowodeMapping {
	pub info: FieldMapping,
	pub comments: IndexSet<String>,
}

impl NodeInfo<FieldMapping> for FieldNowodeMapping {
	fn get_node_info(&self) -> &FieldMapping {
		&self.info
	}

	fn get_node_info_mut(&mut self) -> &mut FieldMapping {
		&mut self.info
	}

	fn new(info: FieldMapping) -> FieldNowodeMapping {
		FieldNowodeMapping {
			info,
			comments: IndexSet::new(),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodNowodeMapping {
	pub info: MethodMapping,
	pub parameters: Vec<ParameterNowodeMapping>,
	pub local_variables: Vec<LocalVariableNowodeMapping>,
	pub comments: IndexSet<String>,
}

impl NodeInfo<MethodMapping> for MethodNowodeMapping {
	fn get_node_info(&self) -> &MethodMapping {
		&self.info
	}

	fn get_node_info_mut(&mut self) -> &mut MethodMapping {
		&mut self.info
	}

	fn new(info: MethodMapping) -> Self {
		MethodNowodeMapping {
			info,
			parameters: Vec::new(),
			local_variables: Vec::new(),
			comments: IndexSet::new(),
		}
	}
}

impl MethodNowodeMapping {
	pub fn add_parameter(&mut self, child: ParameterNowodeMapping) -> &mut ParameterNowodeMapping {
		self.parameters.push(child);
		let last = self.parameters.len() - 1;
		&mut self.parameters[last]
	}

	pub fn add_local_variable(&mut self, child: LocalVariableNowodeMapping) -> &mut LocalVariableNowodeMapping {
		self.local_variables.push(child);
		let last = self.local_variables.len() - 1;
		&mut self.local_variables[last]
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterNowodeMapping {
	pub info: ParameterMapping,
	pub comments: IndexSet<String>,
}

impl NodeInfo<ParameterMapping> for ParameterNowodeMapping {
	fn get_node_info(&self) -> &ParameterMapping {
		&self.info
	}

	fn get_node_info_mut(&mut self) -> &mut ParameterMapping {
		&mut self.info
	}

	fn new(info: ParameterMapping) -> ParameterNowodeMapping {
		ParameterNowodeMapping {
			info,
			comments: IndexSet::new(),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalVariableNowodeMapping {
	pub info: LocalVariableMapping,
	pub comments: IndexSet<String>,
}

impl NodeInfo<LocalVariableMapping> for LocalVariableNowodeMapping {
	fn get_node_info(&self) -> &LocalVariableMapping {
		&self.info
	}

	fn get_node_info_mut(&mut self) -> &mut LocalVariableMapping {
		&mut self.info
	}

	fn new(info: LocalVariableMapping) -> LocalVariableNowodeMapping {
		LocalVariableNowodeMapping {
			info,
			comments: IndexSet::new(),
		}
	}
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Version {
	pub major: u32,
	pub minor: u32,
}

impl Default for Version {
	fn default() -> Self {
		Version { major: 2, minor: 0 }
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappingInfo {
	pub namespaces: Namespaces,
	pub version: Version,
	/// The header properties, a key with an optional value.
	pub properties: IndexMap<String, Option<String>>,
}

impl MappingInfo {
	pub fn new(namespaces: Namespaces) -> MappingInfo {
		MappingInfo {
			namespaces,
			version: Version::default(),
			properties: IndexMap::new(),
		}
	}

	pub fn escaped_names(&self) -> bool {
		self.properties.contains_key(ESCAPED_NAMES)
	}
}

#[derive(Debug, Clone, Default, PartialEq, PartialOrd, Eq, Ord)]
pub struct ClassMapping {
	pub names: Names,
}

#[derive(Debug, Clone, Default, PartialEq, PartialOrd, Eq, Ord)]
pub struct FieldMapping {
	/// The descriptor, using the class names of the first namespace.
	pub desc: Option<FieldDescriptor>,
	pub names: Names,
}

#[derive(Debug, Clone, Default, PartialEq, PartialOrd, Eq, Ord)]
pub struct MethodMapping {
	/// The descriptor, using the class names of the first namespace.
	pub desc: Option<MethodDescriptor>,
	pub names: Names,
}

#[derive(Debug, Clone, Default, PartialEq, PartialOrd, Eq, Ord)]
pub struct ParameterMapping {
	pub lv_index: usize,
	pub names: Names,
}

#[derive(Debug, Clone, Default, PartialEq, PartialOrd, Eq, Ord)]
pub struct LocalVariableMapping {
	pub lv_index: usize,
	pub lv_start_offset: usize,
	/// The index into the local variable table, `None` if unknown.
	pub lv_table_index: Option<usize>,
	pub names: Names,
}

macro_rules! impl_get_names {
	($($t:ty),*) => {
		$(
			impl GetNames for $t {
				fn get_names(&self) -> &Names {
					&self.names
				}

				fn get_names_mut(&mut self) -> &mut Names {
					&mut self.names
				}
			}
		)*
	}
}

impl_get_names!(ClassMapping, FieldMapping, MethodMapping, ParameterMapping, LocalVariableMapping);
