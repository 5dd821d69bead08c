use std::borrow::Cow;
use std::io::{BufWriter, Write};
use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use log::debug;
use crate::action::enclosing_class::find_enclosing;
use crate::action::{index_by, MergeContext, MergeOptions};
use crate::error::{MergeError, Side};
use crate::tiny_v1::{ClassLine, EntryTriple, MemberLine, TinyV1File, V1Line};
use crate::tree::names::Namespace;

fn index_members<'a>(file: &'a TinyV1File, namespace: Namespace, fields: bool) -> Result<IndexMap<EntryTriple, &'a MemberLine>> {
	let remapper = file.remapper(namespace);
	let members: Vec<&MemberLine> = file.lines().iter()
		.filter_map(|line| match line {
			V1Line::Field(member) if fields => Some(member),
			V1Line::Method(member) if !fields => Some(member),
			_ => None,
		})
		.collect();

	let map = index_by(&members, Side::B, |member| {
		member.entry(namespace, &remapper)?
			.ok_or_else(|| MergeError::HoleInCommonNamespace { side: Side::B }.into())
	})?;

	Ok(map.into_iter().map(|(key, &member)| (key, member)).collect())
}

/// The name a class of `a` that `b` lacks gets in `namespace`, from its enclosing classes in `b`.
fn enclosing_class_name<'a>(key: &'a str, namespace: Namespace, classes: &IndexMap<&str, &ClassLine>) -> Cow<'a, str> {
	match find_enclosing(key, |outer| classes.get(outer)) {
		Some((class, inner)) => match class.names.get(namespace) {
			Some(outer) => Cow::Owned(format!("{outer}${inner}")),
			None => Cow::Borrowed(""),
		},
		None => Cow::Borrowed(key),
	}
}

/// Writes a row of `a`, filled up with empty cells if it has fewer than `len` names after its `tags` leading columns.
fn write_row(w: &mut impl Write, line: &str, tags: usize, len: usize) -> Result<()> {
	write!(w, "{line}")?;
	let columns = line.split('\t').count().saturating_sub(tags);
	for _ in columns..len {
		write!(w, "\t")?;
	}
	Ok(())
}

impl TinyV1File {
	/// Merges two tiny v1 files that share one namespace, writing the result.
	///
	/// Every line of `a` is written as is, followed by one column for each namespace only `b` has. Rows missing
	/// names for the last namespaces of `a` get empty cells first.
	/// These are filled with the names of the entry in `b` with the same name, owner and descriptor in the
	/// common namespace.
	///
	/// If `b` lacks such an entry, the cell is left empty for [`MergeOptions::leave_holes`]. Otherwise a class
	/// gets the name of its innermost enclosing class `b` has (or stays empty if that one has no name
	/// there), or, if there is none, its name in the common namespace. Fields and methods get their name in the
	/// common namespace.
	pub fn merge(a: &TinyV1File, b: &TinyV1File, options: &MergeOptions, w: &mut impl Write) -> Result<()> {
		let context = MergeContext::new(a.namespaces(), b.namespaces(), options)?;

		let extra: Vec<(Namespace, &str)> = b.namespaces().iter()
			.filter(|(_, name)| !a.namespaces().contains(name))
			.collect();
		if extra.is_empty() {
			return Err(MergeError::NoAdditionalNamespaces.into());
		}

		debug!("adding namespaces {:?} to lines of A input, matching on {:?}", extra.iter().map(|(_, name)| name).collect::<Vec<_>>(), context.common_name);

		let classes: Vec<&ClassLine> = b.lines().iter()
			.filter_map(|line| match line {
				V1Line::Class(class) => Some(class),
				_ => None,
			})
			.collect();
		let classes_b: IndexMap<&str, &ClassLine> = index_by(&classes, Side::B, |class| context.key(Side::B, &class.names))?
			.into_iter()
			.map(|(key, &class)| (key, class))
			.collect();

		let fields_b = index_members(b, context.common_b, true)
			.context("failed to look up fields of B input")?;
		let methods_b = index_members(b, context.common_b, false)
			.context("failed to look up methods of B input")?;

		let remapper_a = a.remapper(context.common_a);
		let len = a.namespaces().len();

		let mut w = BufWriter::new(w);

		write!(w, "{}", a.first_line())?;
		for (_, name) in &extra {
			write!(w, "\t{name}")?;
		}
		writeln!(w)?;

		for line in a.lines() {
			match line {
				V1Line::Context(line) => writeln!(w, "{line}")?,
				V1Line::Class(class) => {
					let key = context.key(Side::A, &class.names)
						.with_context(|| anyhow!("in line {:?}", class.line))?;
					let entry = classes_b.get(key);

					write_row(&mut w, &class.line, 1, len)?;
					for &(namespace, _) in &extra {
						let name = match entry {
							Some(entry) => Cow::Borrowed(entry.names.get(namespace).unwrap_or("")),
							None if context.leave_holes => Cow::Borrowed(""),
							None => enclosing_class_name(key, namespace, &classes_b),
						};
						write!(w, "\t{name}")?;
					}
					writeln!(w)?;
				},
				V1Line::Field(member) | V1Line::Method(member) => {
					let members_b = if matches!(line, V1Line::Field(_)) { &fields_b } else { &methods_b };

					let key = member.entry(context.common_a, &remapper_a)?
						.ok_or_else(|| anyhow!(MergeError::HoleInCommonNamespace { side: Side::A }))
						.with_context(|| anyhow!("in line {:?}", member.line))?;
					let entry = members_b.get(&key);

					write_row(&mut w, &member.line, 3, len)?;
					for &(namespace, _) in &extra {
						let name = match entry {
							Some(entry) => entry.names.get(namespace).unwrap_or(""),
							None if context.leave_holes => "",
							None => key.name.as_str(),
						};
						write!(w, "\t{name}")?;
					}
					writeln!(w)?;
				},
			}
		}

		w.flush()?;

		Ok(())
	}

	/// Merges two tiny v1 files into a `String`.
	///
	/// See [`TinyV1File::merge`].
	pub fn merge_string(a: &TinyV1File, b: &TinyV1File, options: &MergeOptions) -> Result<String> {
		let mut vec = Vec::new();
		TinyV1File::merge(a, b, options, &mut vec)?;
		String::from_utf8(vec).context("failed to convert merged mappings to utf8")
	}
}
