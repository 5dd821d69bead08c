//! Parsed JVM type descriptors, and remapping the class names inside them.
//!
//! The grammar for descriptors is:
//! ```txt,ignore
//!   FieldDescriptor:
//!     FieldType
//!
//!   MethodDescriptor:
//!     "(" FieldType* ")" ReturnDescriptor
//!
//!   ReturnDescriptor:
//!     FieldType | "V"
//! ```
//!
//! Descriptors don't change between namespaces, except for the class names in them. A [`ClassRemapper`] rewrites
//! those.

use std::fmt::{Debug, Display, Formatter};
use std::iter::Peekable;
use anyhow::{anyhow, bail, Context, Error, Result};
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseType {
	B, C, D, F, I, J, S, Z,
	/// An object type, holding the internal class name, like `java/lang/Object`.
	L(String),
}

impl Display for BaseType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			BaseType::B => write!(f, "B"),
			BaseType::C => write!(f, "C"),
			BaseType::D => write!(f, "D"),
			BaseType::F => write!(f, "F"),
			BaseType::I => write!(f, "I"),
			BaseType::J => write!(f, "J"),
			BaseType::S => write!(f, "S"),
			BaseType::Z => write!(f, "Z"),
			BaseType::L(name) => write!(f, "L{name};"),
		}
	}
}

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldDescriptor {
	dimension: usize,
	base: BaseType,
}

impl FieldDescriptor {
	pub fn new(dimension: usize, base: BaseType) -> FieldDescriptor {
		FieldDescriptor { dimension, base }
	}

	fn from_iter(iter: &mut Peekable<impl Iterator<Item=char>>) -> Result<FieldDescriptor> {
		let mut dimension = 0;
		while iter.next_if(|&x| x == '[').is_some() {
			dimension += 1;
		}

		let ch = iter.next()
			.with_context(|| anyhow!("descriptor ends suddenly"))?;

		let base = match ch {
			'B' => BaseType::B,
			'C' => BaseType::C,
			'D' => BaseType::D,
			'F' => BaseType::F,
			'I' => BaseType::I,
			'J' => BaseType::J,
			'S' => BaseType::S,
			'Z' => BaseType::Z,
			'L' => {
				let mut s = String::new();
				while let Some(ch) = iter.next_if(|&x| x != ';') {
					s.push(ch);
				}
				if Some(';') != iter.next() {
					bail!("expected semicolon to terminate class name {s:?} in descriptor");
				}
				if s.is_empty() {
					bail!("empty class name in descriptor");
				}
				BaseType::L(s)
			},
			x => {
				bail!("unexpected base type {x:?} in descriptor");
			}
		};

		Ok(FieldDescriptor { dimension, base })
	}
}

impl TryFrom<String> for FieldDescriptor {
	type Error = Error;
	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::try_from(value.as_str())
	}
}

impl TryFrom<&str> for FieldDescriptor {
	type Error = Error;
	fn try_from(value: &str) -> Result<Self, Self::Error> {
		let mut iter = value.chars().peekable();

		let descriptor = FieldDescriptor::from_iter(&mut iter)
			.with_context(|| anyhow!("failed to parse field descriptor {value:?}"))?;

		if iter.next().is_some() {
			bail!("field descriptor doesn't end: {value:?}");
		}

		Ok(descriptor)
	}
}

impl Display for FieldDescriptor {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}{}", "[".repeat(self.dimension), self.base)
	}
}

impl Debug for FieldDescriptor {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{:?}", self.to_string())
	}
}

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodDescriptor {
	args: Vec<FieldDescriptor>,
	ret: Option<FieldDescriptor>, // None is `void`, and nicely the rest fits well from the field!
}

impl MethodDescriptor {
	pub fn new(args: Vec<FieldDescriptor>, ret: Option<FieldDescriptor>) -> MethodDescriptor {
		MethodDescriptor { args, ret }
	}

	/// Returns `true` for `()V`.
	pub fn is_no_args_void(&self) -> bool {
		self.args.is_empty() && self.ret.is_none()
	}
}

impl TryFrom<String> for MethodDescriptor {
	type Error = Error;
	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::try_from(value.as_str())
	}
}

impl TryFrom<&str> for MethodDescriptor {
	type Error = Error;
	fn try_from(value: &str) -> Result<Self, Self::Error> {
		let mut iter = value.chars()
			.peekable();

		if Some('(') != iter.next() {
			bail!("method descriptor must start with opening parenthesis: {value:?}");
		}

		let mut args = Vec::new();

		while iter.peek().is_some_and(|&x| x != ')') {
			let field_descriptor = FieldDescriptor::from_iter(&mut iter)
				.with_context(|| anyhow!("failed to parse method parameter descriptor: {value:?}"))?;

			args.push(field_descriptor);
		}

		if Some(')') != iter.next() {
			bail!("method descriptor must contain a closing parenthesis: {value:?}");
		}

		let ret = if Some(&'V') == iter.peek() {
			iter.next(); // take the `V`
			None
		} else {
			let ret = FieldDescriptor::from_iter(&mut iter)
				.with_context(|| anyhow!("failed to parse method return descriptor: {value:?}"))?;

			Some(ret)
		};

		if iter.next().is_some() {
			bail!("method descriptor doesn't end: {value:?}");
		}

		Ok(MethodDescriptor { args, ret })
	}
}

impl Display for MethodDescriptor {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "(")?;
		for arg in &self.args {
			write!(f, "{arg}")?;
		}
		match &self.ret {
			Some(ret) => write!(f, "){ret}"),
			None => write!(f, ")V"),
		}
	}
}

impl Debug for MethodDescriptor {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{:?}", self.to_string())
	}
}

/// Either a field or a method descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Descriptor {
	Field(FieldDescriptor),
	Method(MethodDescriptor),
}

/// What shape a [`Descriptor`] has, seen from the outside.
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorKind<'a> {
	/// One of the primitive types, which never get remapped.
	Primitive(&'a BaseType),
	/// An array, with the element type given as a descriptor of dimension zero.
	Array {
		dimension: usize,
		element: FieldDescriptor,
	},
	/// An object type, holding the class name.
	Object(&'a str),
	Method(&'a MethodDescriptor),
}

impl Descriptor {
	pub fn kind(&self) -> DescriptorKind<'_> {
		match self {
			Descriptor::Field(desc) if desc.dimension > 0 => DescriptorKind::Array {
				dimension: desc.dimension,
				element: FieldDescriptor::new(0, desc.base.clone()),
			},
			Descriptor::Field(FieldDescriptor { base: BaseType::L(class), .. }) => DescriptorKind::Object(class),
			Descriptor::Field(FieldDescriptor { base, .. }) => DescriptorKind::Primitive(base),
			Descriptor::Method(desc) => DescriptorKind::Method(desc),
		}
	}
}

impl Display for Descriptor {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Descriptor::Field(desc) => Display::fmt(desc, f),
			Descriptor::Method(desc) => Display::fmt(desc, f),
		}
	}
}

/// Answers the question "what is the name of class X in the other namespace?".
///
/// Implementors only need to define [`ClassRemapper::map_class_fail`].
pub trait ClassRemapper {
	/// Maps a class name to a new one, if the mapping exists.
	///
	/// If the mapping doesn't exist, returns `Ok(None)`.
	fn map_class_fail(&self, class: &str) -> Result<Option<String>>;

	/// Maps a class name to a new one, if the mapping doesn't exist, return the old one.
	///
	/// Do not implement this yourself.
	fn map_class(&self, class: &str) -> Result<String> {
		Ok(self.map_class_fail(class)?.unwrap_or_else(|| class.to_owned()))
	}

	/// Do not implement this yourself.
	fn map_desc(&self, desc: &Descriptor) -> Result<Descriptor> {
		map_desc(self, desc)
	}

	/// Do not implement this yourself.
	fn map_field_desc(&self, desc: &FieldDescriptor) -> Result<FieldDescriptor> {
		match map_desc(self, &Descriptor::Field(desc.clone()))? {
			Descriptor::Field(desc) => Ok(desc),
			Descriptor::Method(desc) => bail!("remapping a field descriptor gave a method descriptor {desc:?}"),
		}
	}

	/// Do not implement this yourself.
	fn map_method_desc(&self, desc: &MethodDescriptor) -> Result<MethodDescriptor> {
		match map_desc(self, &Descriptor::Method(desc.clone()))? {
			Descriptor::Method(desc) => Ok(desc),
			Descriptor::Field(desc) => bail!("remapping a method descriptor gave a field descriptor {desc:?}"),
		}
	}
}

/// Remaps all class names in the descriptor.
///
/// Note that this relies on the fact that for non-existing class mappings class names are just copied over.
fn map_desc(remapper: &(impl ClassRemapper + ?Sized), desc: &Descriptor) -> Result<Descriptor> {
	Ok(match desc.kind() {
		DescriptorKind::Primitive(_) => desc.clone(),
		DescriptorKind::Array { dimension, element } => {
			match map_desc(remapper, &Descriptor::Field(element))? {
				Descriptor::Field(element) => Descriptor::Field(FieldDescriptor::new(dimension, element.base)),
				Descriptor::Method(desc) => bail!("remapping an array element gave a method descriptor {desc:?}"),
			}
		},
		DescriptorKind::Object(class) => {
			Descriptor::Field(FieldDescriptor::new(0, BaseType::L(remapper.map_class(class)?)))
		},
		DescriptorKind::Method(method) => {
			if method.is_no_args_void() {
				return Ok(desc.clone());
			}

			let args = method.args.iter()
				.map(|arg| remapper.map_field_desc(arg))
				.collect::<Result<_>>()?;
			let ret = method.ret.as_ref()
				.map(|ret| remapper.map_field_desc(ret))
				.transpose()?;

			Descriptor::Method(MethodDescriptor::new(args, ret))
		},
	})
}

/// A [`ClassRemapper`] backed by a map from old to new class names.
#[derive(Debug, Default)]
pub struct ClassRemapperImpl<'a> {
	classes: IndexMap<&'a str, &'a str>,
}

impl<'a> ClassRemapperImpl<'a> {
	pub fn new(classes: IndexMap<&'a str, &'a str>) -> ClassRemapperImpl<'a> {
		ClassRemapperImpl { classes }
	}
}

impl ClassRemapper for ClassRemapperImpl<'_> {
	fn map_class_fail(&self, class: &str) -> Result<Option<String>> {
		Ok(self.classes.get(class).map(|&class| class.to_owned()))
	}
}

#[cfg(test)]
mod testing {
	use indexmap::IndexMap;
	use pretty_assertions::assert_eq;
	use crate::tree::descriptor::{BaseType, ClassRemapper, ClassRemapperImpl, Descriptor, DescriptorKind, FieldDescriptor, MethodDescriptor};

	#[test]
	fn method_to_str() {
		assert_eq!(
			MethodDescriptor {
				args: vec![
					FieldDescriptor { dimension: 1, base: BaseType::B },
					FieldDescriptor { dimension: 1, base: BaseType::C },
				],
				ret: None,
			}.to_string(),
			"([B[C)V"
		);
		assert_eq!(
			MethodDescriptor {
				args: vec![
					FieldDescriptor { dimension: 4, base: BaseType::L(String::from("a/fun/class/Name")) },
				],
				ret: Some(FieldDescriptor { dimension: 6, base: BaseType::Z }),
			}.to_string(),
			"([[[[La/fun/class/Name;)[[[[[[Z"
		);
		assert_eq!(MethodDescriptor { args: vec![], ret: None }.to_string(), "()V");
	}

	#[test]
	fn method_from_str() {
		assert_eq!(
			MethodDescriptor::try_from("([[[I[[[La/b;La;Lb;)[I").unwrap(),
			MethodDescriptor {
				args: vec![
					FieldDescriptor { dimension: 3, base: BaseType::I },
					FieldDescriptor { dimension: 3, base: BaseType::L(String::from("a/b")) },
					FieldDescriptor { dimension: 0, base: BaseType::L(String::from("a")) },
					FieldDescriptor { dimension: 0, base: BaseType::L(String::from("b")) },
				],
				ret: Some(FieldDescriptor { dimension: 1, base: BaseType::I }),
			}
		);
		assert_eq!(
			MethodDescriptor::try_from("()V").unwrap(),
			MethodDescriptor { args: vec![], ret: None }
		);
	}

	#[test]
	fn invalid() {
		for desc in ["", "V", "[", "L;", "La", "II", "Q"] {
			assert!(FieldDescriptor::try_from(desc).is_err(), "{desc:?} is not a valid field descriptor");
		}
		for desc in ["", "()", "(V)V", "I", "(I", "()VV"] {
			assert!(MethodDescriptor::try_from(desc).is_err(), "{desc:?} is not a valid method descriptor");
		}
	}

	#[test]
	fn kinds() {
		let array = Descriptor::Field(FieldDescriptor::try_from("[[La;").unwrap());
		assert_eq!(array.kind(), DescriptorKind::Array {
			dimension: 2,
			element: FieldDescriptor::try_from("La;").unwrap(),
		});

		let object = Descriptor::Field(FieldDescriptor::try_from("La;").unwrap());
		assert_eq!(object.kind(), DescriptorKind::Object("a"));

		let primitive = Descriptor::Field(FieldDescriptor::try_from("J").unwrap());
		assert_eq!(primitive.kind(), DescriptorKind::Primitive(&BaseType::J));
	}

	#[test]
	fn remap() {
		let remapper = ClassRemapperImpl::new(IndexMap::from([
			("a", "com/example/Alpha"),
			("b", "com/example/Beta"),
		]));

		let desc = |s: &str| remapper.map_field_desc(&FieldDescriptor::try_from(s).unwrap()).unwrap().to_string();
		assert_eq!(desc("I"), "I");
		assert_eq!(desc("La;"), "Lcom/example/Alpha;");
		assert_eq!(desc("[[Lb;"), "[[Lcom/example/Beta;");
		assert_eq!(desc("Lc;"), "Lc;");

		let desc = |s: &str| remapper.map_method_desc(&MethodDescriptor::try_from(s).unwrap()).unwrap().to_string();
		assert_eq!(desc("()V"), "()V");
		assert_eq!(desc("(ILa;[Lb;)V"), "(ILcom/example/Alpha;[Lcom/example/Beta;)V");
		assert_eq!(desc("()[La;"), "()[Lcom/example/Alpha;");
	}
}
