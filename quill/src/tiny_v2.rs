//! Functions to read and write mappings in the "Tiny v2" format.
//!
//! # Reading
//! You can read a `.tiny` file using the [`read_file`] method, by passing a path.
//! If you already have a [`Read`]er, you can use the [`read`] method.
//!
//! It's recommended to check that the namespaces are indeed the ones expected.
//! See [`Namespaces::check_that`][crate::tree::names::Namespaces::check_that] for more info.
//!
//! # Writing
//! For writing `.tiny` files, there are the [`write`][fn@write] as well as the [`write_vec`], [`write_string`] and
//! [`write_file`] methods.
//!
//! Note that all writing sorts the tiny files.
//!
//! # Escaping
//! Comments are always escaped. Names are only escaped if the header has the `escaped-names` property.

use std::fs::File;
use anyhow::{anyhow, bail, Context, Result};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use indexmap::IndexSet;
use crate::lines::tiny_line::TinyLine;
use crate::lines::{Line, WithMoreIdentIter};
use crate::tree::descriptor::{FieldDescriptor, MethodDescriptor};
use crate::tree::mappings::{ClassMapping, ClassNowodeMapping, FieldMapping, FieldNowodeMapping, LocalVariableMapping, LocalVariableNowodeMapping, MappingInfo, Mappings, MethodMapping, MethodNowodeMapping, ParameterMapping, ParameterNowodeMapping, Version};
use crate::tree::names::{Names, Namespaces};
use crate::tree::NodeInfo;

/// Reads a `.tiny` file (tiny v2), by opening the file given by the path.
///
/// It's recommended to check that the namespaces are indeed the ones expected.
/// See [`Namespaces::check_that`] for more info.
pub fn read_file(path: impl AsRef<Path>) -> Result<Mappings> {
	let file = File::open(&path)
		.with_context(|| anyhow!("failed to open mappings file {:?}", path.as_ref()))?;
	read(file)
		.with_context(|| anyhow!("failed to read mappings file {:?} as tiny v2 file", path.as_ref()))
}

#[allow(clippy::tabs_in_doc_comments)]
/// Reads the tiny v2 format, from the given reader.
///
/// It's recommended to check that the namespaces are indeed the ones expected.
/// See [`Namespaces::check_that`] for more info.
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use quill::tree::mappings::Mappings;
/// let string = "\
/// tiny	2	0	namespaceA	namespaceB	namespaceC
/// c	A	B	C
/// 	f	LA;	a	b	c
/// 	m	(LA;)V	a	b	c
/// 		p	1	x		z
/// ";
///
/// let reader = &mut string.as_bytes();
/// let mappings: Mappings = quill::tiny_v2::read(reader).unwrap();
///
/// mappings.info.namespaces.check_that(&["namespaceA", "namespaceB", "namespaceC"]).unwrap();
/// assert_eq!(mappings.classes.len(), 1);
/// assert_eq!(mappings.classes[0].methods[0].parameters.len(), 1);
/// ```
pub fn read(reader: impl Read) -> Result<Mappings> {
	let mut lines = BufReader::new(reader)
		.lines()
		.enumerate()
		.map(|(line_number, line)| -> Result<TinyLine> {
			TinyLine::new(line_number + 1, &line?)
		})
		.peekable();

	let mut header = lines.next().context("no header line")??;
	let header_line_number = header.get_line_number();

	if header.first_field != "tiny" {
		bail!("header doesn't start with \"tiny\", in line {header:?}");
	}
	let major: u32 = header.next()?.parse()
		.with_context(|| anyhow!("invalid major version on line {header_line_number}"))?;
	let minor: u32 = header.next()?.parse()
		.with_context(|| anyhow!("invalid minor version on line {header_line_number}"))?;
	if major != 2 {
		bail!("header version isn't tiny v2, got {major}.{minor} on line {header_line_number}");
	}

	let namespaces: Namespaces = header.rest().try_into()
		.with_context(|| anyhow!("on line {header_line_number}"))?;
	let len = namespaces.len();

	let mut info = MappingInfo::new(namespaces);
	info.version = Version { major, minor };

	WithMoreIdentIter::new(&mut lines).next_level().on_every_line(|_, mut line| {
		let key = std::mem::take(&mut line.first_field);
		let value = line.next_optional();
		if let Some(extra) = line.next_optional() {
			bail!("property {key:?} has more than one value, got {value:?} and {extra:?}");
		}
		info.properties.insert(key, value);
		Ok(())
	}).context("reading properties")?;

	let escaped_names = info.escaped_names();
	let unescape_name = |name: &str| -> Result<String> {
		if escaped_names {
			unescape(name)
		} else {
			Ok(name.to_owned())
		}
	};

	let mut mappings = Mappings::new(info);

	WithMoreIdentIter::new(&mut lines).on_every_line(|iter, line| {
		if line.first_field == "c" {
			let names = line.into_names(len, unescape_name)?;
			let class = mappings.add_class(ClassNowodeMapping::new(ClassMapping { names }));

			iter.next_level().on_every_line(|iter, mut line| {
				if line.first_field == "f" {
					let desc = FieldDescriptor::try_from(line.next()?)?;
					let names = line.into_names(len, unescape_name)?;
					let field = class.add_field(FieldNowodeMapping::new(FieldMapping { desc: Some(desc), names }));

					iter.next_level().on_every_line(|iter, line| {
						if line.first_field == "c" {
							add_comment(&mut field.comments, line)
						} else {
							iter.next_level().skip_all()
						}
					}).context("reading field sub-sections")
				} else if line.first_field == "m" {
					let desc = MethodDescriptor::try_from(line.next()?)?;
					let names = line.into_names(len, unescape_name)?;
					let method = class.add_method(MethodNowodeMapping::new(MethodMapping { desc: Some(desc), names }));

					iter.next_level().on_every_line(|iter, mut line| {
						if line.first_field == "p" {
							let lv_index = line.next()?.parse()?;
							let names = line.into_names(len, unescape_name)?;
							let parameter = method.add_parameter(ParameterNowodeMapping::new(ParameterMapping { lv_index, names }));

							iter.next_level().on_every_line(|iter, line| {
								if line.first_field == "c" {
									add_comment(&mut parameter.comments, line)
								} else {
									iter.next_level().skip_all()
								}
							}).context("reading parameter sub-sections")
						} else if line.first_field == "v" {
							let lv_index = line.next()?.parse()?;
							let lv_start_offset = line.next()?.parse()?;
							let lv_table_index = parse_lv_table_index(&line.next()?)?;
							let names = line.into_names(len, unescape_name)?;
							let mapping = LocalVariableMapping { lv_index, lv_start_offset, lv_table_index, names };
							let local_variable = method.add_local_variable(LocalVariableNowodeMapping::new(mapping));

							iter.next_level().on_every_line(|iter, line| {
								if line.first_field == "c" {
									add_comment(&mut local_variable.comments, line)
								} else {
									iter.next_level().skip_all()
								}
							}).context("reading local variable sub-sections")
						} else if line.first_field == "c" {
							add_comment(&mut method.comments, line)
						} else {
							iter.next_level().skip_all()
						}
					}).context("reading method sub-sections")
				} else if line.first_field == "c" {
					add_comment(&mut class.comments, line)
				} else {
					iter.next_level().skip_all()
				}
			}).context("reading class sub-sections")
		} else {
			iter.next_level().skip_all()
		}
	}).context("reading lines")?;

	if let Some(line) = lines.next() {
		bail!("expected end of input, got: {line:?}");
	}

	Ok(mappings)
}

fn add_comment(comments: &mut IndexSet<String>, line: TinyLine) -> Result<()> {
	comments.insert(unescape(&line.end()?)?);
	Ok(())
}

fn parse_lv_table_index(s: &str) -> Result<Option<usize>> {
	let index: i64 = s.parse()
		.with_context(|| anyhow!("invalid local variable table index {s:?}"))?;
	if index < 0 {
		Ok(None)
	} else {
		usize::try_from(index)
			.map(Some)
			.with_context(|| anyhow!("local variable table index {index} out of range"))
	}
}

/// Escapes `\`, newlines, carriage returns, tabs and null characters.
pub fn escape(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	for ch in s.chars() {
		match ch {
			'\\' => out.push_str("\\\\"),
			'\n' => out.push_str("\\n"),
			'\r' => out.push_str("\\r"),
			'\t' => out.push_str("\\t"),
			'\0' => out.push_str("\\0"),
			ch => out.push(ch),
		}
	}
	out
}

/// The inverse of [`escape`].
pub fn unescape(s: &str) -> Result<String> {
	let mut out = String::with_capacity(s.len());
	let mut chars = s.chars();
	while let Some(ch) = chars.next() {
		if ch == '\\' {
			match chars.next() {
				Some('\\') => out.push('\\'),
				Some('n') => out.push('\n'),
				Some('r') => out.push('\r'),
				Some('t') => out.push('\t'),
				Some('0') => out.push('\0'),
				Some(other) => bail!("unknown escape sequence \\{other} in {s:?}"),
				None => bail!("dangling backslash at the end of {s:?}"),
			}
		} else {
			out.push(ch);
		}
	}
	Ok(out)
}

/// Writes the given mappings into a `String`, in the tiny v2 format.
///
/// This is equivalent to first calling [`write_vec`] and then [`String::from_utf8`].
///
/// This method is of most use in test cases, where you also use the `pretty_assertions` crate for viewing string diffs.
pub fn write_string(mappings: &Mappings) -> Result<String> {
	let vec = write_vec(mappings)?;
	String::from_utf8(vec).context("failed to convert written mappings to utf8")
}

/// Writes the given mappings into a `Vec<u8>`, in the tiny v2 format.
///
/// This is equivalent to letting [`write`][fn@write] write into a `Vec<u8>`.
pub fn write_vec(mappings: &Mappings) -> Result<Vec<u8>> {
	let mut vec = Vec::new();
	write(mappings, &mut vec)?;
	Ok(vec)
}

/// Writes the given mappings into the file at the given path, replacing it if it already exists.
pub fn write_file(mappings: &Mappings, path: impl AsRef<Path>) -> Result<()> {
	let mut file = File::create(&path)
		.with_context(|| anyhow!("failed to create mappings file {:?}", path.as_ref()))?;
	write(mappings, &mut file)
		.with_context(|| anyhow!("failed to write mappings file {:?}", path.as_ref()))
}

fn write_namespaces(w: &mut impl Write, namespaces: &Namespaces) -> Result<()> {
	for namespace in namespaces.names() {
		write!(w, "\t{namespace}")?;
	}
	writeln!(w)?;
	Ok(())
}

fn write_names(w: &mut impl Write, names: &Names, len: usize, escaped: bool) -> Result<()> {
	if names.len() > len {
		bail!("names {names:?} have more entries than the {len} namespaces");
	}
	for i in 0..len {
		let name = names.names().get(i).and_then(|x| x.as_deref()).unwrap_or("");
		if escaped {
			write!(w, "\t{}", escape(name))?;
		} else {
			write!(w, "\t{name}")?;
		}
	}
	writeln!(w)?;
	Ok(())
}

fn write_comments(w: &mut impl Write, comments: &IndexSet<String>, idents: usize) -> Result<()> {
	for comment in comments {
		writeln!(w, "{}c\t{}", "\t".repeat(idents), escape(comment))?;
	}
	Ok(())
}

#[allow(clippy::tabs_in_doc_comments)]
/// Writes the given mappings to the given writer, in the tiny v2 format.
///
/// Note that this currently sorts the classes, fields, methods, parameters and local variables.
///
/// ```
/// # use pretty_assertions::assert_eq;
/// let input = "\
/// tiny	2	0	namespaceA	namespaceB
/// 	sorted
/// c	D	E
/// c	A	B
/// 	c	a class comment
/// 	m	()V	methodB	methodBSecondName
/// 	f	J	aField	c
/// 	f	I	aField	d
/// 	m	()V	methodA	methodASecondName
/// 		v	2	5	-1	local	localSecondName
/// 		p	1	param	paramSecondName
/// ";
///
/// let mappings = quill::tiny_v2::read(input.as_bytes()).unwrap();
///
/// let mut buf: Vec<u8> = Vec::new();
/// quill::tiny_v2::write(&mappings, &mut buf).unwrap();
/// let written = String::from_utf8(buf).unwrap();
///
/// let output = "\
/// tiny	2	0	namespaceA	namespaceB
/// 	sorted
/// c	A	B
/// 	c	a class comment
/// 	f	I	aField	d
/// 	f	J	aField	c
/// 	m	()V	methodA	methodASecondName
/// 		p	1	param	paramSecondName
/// 		v	2	5	-1	local	localSecondName
/// 	m	()V	methodB	methodBSecondName
/// c	D	E
/// ";
///
/// assert_eq!(written, output);
/// ```
///
/// Note that there are also the helper methods [`write_vec`] for writing into a `Vec<u8>` directly,
/// and the helper method [`write_string`] that also tries to convert that `Vec<u8>` into a `String`.
pub fn write(mappings: &Mappings, w: &mut impl Write) -> Result<()> {
	// the buffering makes it much faster
	let mut w = BufWriter::new(w);
	let w = &mut w;

	let info = &mappings.info;
	let len = info.namespaces.len();
	let escaped = info.escaped_names();

	write!(w, "tiny\t{}\t{}", info.version.major, info.version.minor)?;
	write_namespaces(w, &info.namespaces)?;

	for (key, value) in &info.properties {
		match value {
			Some(value) => writeln!(w, "\t{key}\t{value}")?,
			None => writeln!(w, "\t{key}")?,
		}
	}

	let mut classes: Vec<_> = mappings.classes.iter().collect();
	classes.sort_by_key(|x| &x.info);
	for class in classes {
		write!(w, "c")?;
		write_names(w, &class.info.names, len, escaped)?;
		write_comments(w, &class.comments, 1)?;

		let mut fields: Vec<_> = class.fields.iter().collect();
		fields.sort_by_key(|x| &x.info);
		for field in fields {
			let desc = field.info.desc.as_ref()
				.with_context(|| anyhow!("no descriptor for field {:?} in class {:?}", field.info.names, class.info.names))?;
			write!(w, "\tf\t{desc}")?;
			write_names(w, &field.info.names, len, escaped)?;
			write_comments(w, &field.comments, 2)?;
		}

		let mut methods: Vec<_> = class.methods.iter().collect();
		methods.sort_by_key(|x| &x.info);
		for method in methods {
			let desc = method.info.desc.as_ref()
				.with_context(|| anyhow!("no descriptor for method {:?} in class {:?}", method.info.names, class.info.names))?;
			write!(w, "\tm\t{desc}")?;
			write_names(w, &method.info.names, len, escaped)?;
			write_comments(w, &method.comments, 2)?;

			let mut parameters: Vec<_> = method.parameters.iter().collect();
			parameters.sort_by_key(|x| &x.info);
			for parameter in parameters {
				write!(w, "\t\tp\t{}", parameter.info.lv_index)?;
				write_names(w, &parameter.info.names, len, escaped)?;
				write_comments(w, &parameter.comments, 3)?;
			}

			let mut local_variables: Vec<_> = method.local_variables.iter().collect();
			local_variables.sort_by_key(|x| &x.info);
			for local_variable in local_variables {
				let info = &local_variable.info;
				let lv_table_index = info.lv_table_index.map_or_else(|| "-1".to_owned(), |x| x.to_string());
				write!(w, "\t\tv\t{}\t{}\t{lv_table_index}", info.lv_index, info.lv_start_offset)?;
				write_names(w, &info.names, len, escaped)?;
				write_comments(w, &local_variable.comments, 3)?;
			}
		}
	}

	w.flush()?;

	Ok(())
}
