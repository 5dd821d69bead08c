//! A line based model of the "Tiny v1" format.
//!
//! Unlike [`crate::tiny_v2`], this keeps every line of the file as it was read, so that a merge can copy lines
//! over verbatim and only append new columns.
//!
//! A file starts with the header `v1`, followed by the namespaces. Then follow rows of the forms
//! ```txt,ignore
//! CLASS	<name in each namespace>
//! FIELD	<owner>	<descriptor>	<name in each namespace>
//! METHOD	<owner>	<descriptor>	<name in each namespace>
//! ```
//! where owner and descriptor use the class names of the first namespace. Any other line is kept as context.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use anyhow::{anyhow, bail, Context, Result};
use indexmap::IndexMap;
use log::warn;
use crate::tree::descriptor::{ClassRemapper, ClassRemapperImpl, Descriptor, FieldDescriptor, MethodDescriptor};
use crate::tree::names::{Names, Namespace, Namespaces};

/// A parsed tiny v1 file.
#[derive(Debug, Clone, PartialEq)]
pub struct TinyV1File {
	first_line: String,
	namespaces: Namespaces,
	lines: Vec<V1Line>,
	/// The index in `lines` of each class, by its name in the first namespace.
	classes: IndexMap<String, usize>,
}

/// One line of a tiny v1 file.
#[derive(Debug, Clone, PartialEq)]
pub enum V1Line {
	/// A line that isn't a mapping, like a comment.
	Context(String),
	Class(ClassLine),
	Field(MemberLine),
	Method(MemberLine),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassLine {
	pub line: String,
	pub names: Names,
}

/// A field or method line.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberLine {
	pub line: String,
	/// The owning class, in the first namespace.
	pub owner: String,
	/// The descriptor, in the first namespace.
	pub desc: Descriptor,
	pub names: Names,
}

/// Identifies a field or method in one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryTriple {
	pub owner: String,
	pub name: String,
	pub desc: Descriptor,
}

impl MemberLine {
	/// Gives the owner, name and descriptor of this member in the namespace the `remapper` maps to.
	///
	/// Returns `None` if this member has no name in `namespace`.
	pub fn entry(&self, namespace: Namespace, remapper: &impl ClassRemapper) -> Result<Option<EntryTriple>> {
		let Some(name) = self.names.get(namespace) else {
			return Ok(None);
		};

		Ok(Some(EntryTriple {
			owner: remapper.map_class(&self.owner)?,
			name: name.to_owned(),
			desc: remapper.map_desc(&self.desc)?,
		}))
	}
}

impl TinyV1File {
	/// The header line, as read.
	pub fn first_line(&self) -> &str {
		&self.first_line
	}

	pub fn namespaces(&self) -> &Namespaces {
		&self.namespaces
	}

	pub fn lines(&self) -> &[V1Line] {
		&self.lines
	}

	/// Gets the class with the given name in the first namespace.
	pub fn class(&self, name: &str) -> Option<&ClassLine> {
		match self.lines.get(*self.classes.get(name)?)? {
			V1Line::Class(class) => Some(class),
			_ => None,
		}
	}

	/// Creates a remapper from class names of the first namespace to the ones of the given namespace.
	///
	/// Classes without a name in `namespace` keep their name.
	pub fn remapper(&self, namespace: Namespace) -> ClassRemapperImpl<'_> {
		let classes = self.classes.keys()
			.filter_map(|name| {
				let mapped = self.class(name)?.names.get(namespace)?;
				Some((name.as_str(), mapped))
			})
			.collect();

		ClassRemapperImpl::new(classes)
	}
}

/// Reads a tiny v1 file, by opening the file given by the path.
pub fn read_file(path: impl AsRef<Path>) -> Result<TinyV1File> {
	let file = File::open(&path)
		.with_context(|| anyhow!("failed to open mappings file {:?}", path.as_ref()))?;
	read(file)
		.with_context(|| anyhow!("failed to read mappings file {:?} as tiny v1 file", path.as_ref()))
}

#[allow(clippy::tabs_in_doc_comments)]
/// Reads the tiny v1 format, from the given reader.
///
/// ```
/// use quill::tiny_v1::V1Line;
/// let string = "\
/// v1	official	intermediary
/// # a comment
/// CLASS	a	class_1
/// FIELD	a	La;	b	field_1
/// ";
///
/// let file = quill::tiny_v1::read(string.as_bytes()).unwrap();
///
/// file.namespaces().check_that(&["official", "intermediary"]).unwrap();
/// assert_eq!(file.lines().len(), 3);
/// assert!(matches!(file.lines()[0], V1Line::Context(_)));
/// assert!(file.class("a").is_some());
/// ```
pub fn read(reader: impl Read) -> Result<TinyV1File> {
	let mut lines = BufReader::new(reader).lines();

	let first_line = lines.next().context("no header line")??;

	let mut header = first_line.split('\t');
	if header.next() != Some("v1") {
		bail!("invalid mapping version, expected header to start with \"v1\", got {first_line:?}");
	}
	let namespaces: Vec<String> = header.map(|x| x.to_owned()).collect();
	if namespaces.is_empty() {
		bail!("no namespaces in header {first_line:?}");
	}
	let namespaces = Namespaces::try_from(namespaces)?;
	let len = namespaces.len();

	let mut file = TinyV1File {
		first_line,
		namespaces,
		lines: Vec::new(),
		classes: IndexMap::new(),
	};

	for (line_number, line) in lines.enumerate() {
		let line = line
			.with_context(|| anyhow!("failed to read line {}", line_number + 2))?;
		let parsed = parse_line(&line, len);

		if let V1Line::Class(class) = &parsed {
			if let Some(name) = class.names.get(Namespace(0)) {
				file.classes.insert(name.to_owned(), file.lines.len());
			}
		}
		file.lines.push(parsed);
	}

	Ok(file)
}

fn names(fields: &[&str], len: usize) -> Names {
	(0..len)
		.map(|i| fields.get(i).map(|&x| x.to_owned()))
		.collect()
}

fn parse_line(line: &str, len: usize) -> V1Line {
	let fields: Vec<&str> = line.split('\t').collect();

	match fields.as_slice() {
		["CLASS", names_fields @ ..] if !names_fields.is_empty() => {
			V1Line::Class(ClassLine {
				line: line.to_owned(),
				names: names(names_fields, len),
			})
		},
		[tag @ ("FIELD" | "METHOD"), owner, desc, names_fields @ ..] if !names_fields.is_empty() => {
			let desc = if *tag == "FIELD" {
				FieldDescriptor::try_from(*desc).map(Descriptor::Field)
			} else {
				MethodDescriptor::try_from(*desc).map(Descriptor::Method)
			};

			match desc {
				Ok(desc) => {
					let member = MemberLine {
						line: line.to_owned(),
						owner: (*owner).to_owned(),
						desc,
						names: names(names_fields, len),
					};
					if *tag == "FIELD" {
						V1Line::Field(member)
					} else {
						V1Line::Method(member)
					}
				},
				Err(e) => {
					warn!("keeping {tag} line with invalid descriptor as is: {e:#}");
					V1Line::Context(line.to_owned())
				},
			}
		},
		_ => V1Line::Context(line.to_owned()),
	}
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use crate::error::MergeError;
	use crate::tiny_v1::{read, EntryTriple, V1Line};
	use crate::tree::descriptor::{Descriptor, MethodDescriptor};
	use crate::tree::names::{Names, Namespace};

	const FILE: &str = "\
v1\tofficial\tintermediary\tnamed
CLASS\ta\tnet/minecraft/class_1\tnet/minecraft/Foo
CLASS\tb\tnet/minecraft/class_2
METHOD\ta\t(Lb;)La;\tc\tmethod_1\tcreate
FIELD\tb\t[La;\td\tfield_1
FIELD\ta
UNKNOWN\tsomething
";

	#[test]
	fn lines() {
		let file = read(FILE.as_bytes()).unwrap();
		file.namespaces().check_that(&["official", "intermediary", "named"]).unwrap();

		let lines = file.lines();
		assert_eq!(lines.len(), 6);
		assert!(matches!(&lines[4], V1Line::Context(line) if line == "FIELD\ta"));
		assert!(matches!(&lines[5], V1Line::Context(line) if line == "UNKNOWN\tsomething"));

		let class = file.class("b").unwrap();
		assert_eq!(class.line, "CLASS\tb\tnet/minecraft/class_2");
		assert_eq!(class.names, Names::from(["b", "net/minecraft/class_2", ""]));
	}

	#[test]
	fn entries() {
		let file = read(FILE.as_bytes()).unwrap();
		let V1Line::Method(method) = &file.lines()[2] else {
			panic!("expected a method line, got {:?}", file.lines()[2]);
		};

		let intermediary = Namespace(1);
		let entry = method.entry(intermediary, &file.remapper(intermediary)).unwrap();
		assert_eq!(entry, Some(EntryTriple {
			owner: "net/minecraft/class_1".to_owned(),
			name: "method_1".to_owned(),
			desc: Descriptor::Method(MethodDescriptor::try_from("(Lnet/minecraft/class_2;)Lnet/minecraft/class_1;").unwrap()),
		}));

		// b has no name in named, so it keeps its name
		let named = Namespace(2);
		let entry = method.entry(named, &file.remapper(named)).unwrap().unwrap();
		assert_eq!(entry.owner, "net/minecraft/Foo");
		assert_eq!(entry.desc.to_string(), "(Lb;)Lnet/minecraft/Foo;");

		let V1Line::Field(field) = &file.lines()[3] else {
			panic!("expected a field line, got {:?}", file.lines()[3]);
		};
		assert_eq!(field.entry(named, &file.remapper(named)).unwrap(), None);
		let entry = field.entry(intermediary, &file.remapper(intermediary)).unwrap().unwrap();
		assert_eq!(entry.desc.to_string(), "[Lnet/minecraft/class_1;");
	}

	#[test]
	fn bad_header() {
		assert!(read("v2\ta\tb\n".as_bytes()).is_err());
		assert!(read("v1\n".as_bytes()).is_err());
		assert!(read("".as_bytes()).is_err());

		let error = read("v1\ta\tb\ta\n".as_bytes()).unwrap_err();
		assert_eq!(
			error.downcast_ref::<MergeError>(),
			Some(&MergeError::DuplicateNamespace { namespace: "a".to_owned() })
		);
	}
}
