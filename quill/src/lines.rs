use std::cmp::Ordering;
use std::fmt::Debug;
use std::iter::Peekable;
use anyhow::{anyhow, Context, Result};

pub(crate) trait Line: Debug {
	fn get_idents(&self) -> usize;
	fn get_line_number(&self) -> usize;
}

pub(super) struct WithMoreIdentIter<'a, I: Iterator> {
	depth: usize,
	iter: &'a mut Peekable<I>,
}

impl<'a, I, L> WithMoreIdentIter<'a, I>
where
	I: Iterator<Item=Result<L>>,
	L: Line,
{
	pub(super) fn new(iter: &'a mut Peekable<I>) -> WithMoreIdentIter<'a, I> {
		WithMoreIdentIter { depth: 0, iter }
	}

	pub(super) fn next_level(&mut self) -> WithMoreIdentIter<'_, I> {
		WithMoreIdentIter {
			depth: self.depth + 1,
			iter: self.iter,
		}
	}

	pub(super) fn on_every_line(mut self, mut f: impl FnMut(&mut Self, L) -> Result<()>) -> Result<()> {
		while let Some(line) = self.next() {
			let line = line?;
			let line_number = line.get_line_number();

			f(&mut self, line)
				.with_context(|| anyhow!("in line {line_number}"))?;
		}
		Ok(())
	}

	/// Consumes all the lines that are indented at least as deep as this level.
	pub(super) fn skip_all(self) -> Result<()> {
		let depth = self.depth;
		while let Some(line) = self.iter.next_if(|line| line.as_ref().is_ok_and(|line| line.get_idents() >= depth)) {
			line?;
		}
		Ok(())
	}
}

impl<I, L> Iterator for WithMoreIdentIter<'_, I>
where
	I: Iterator<Item=Result<L>>,
	L: Line,
{
	type Item = Result<L>;

	fn next(&mut self) -> Option<Self::Item> {
		match self.iter.peek()? {
			Ok(line) => {
				match line.get_idents().cmp(&self.depth) {
					Ordering::Less => None, // cancel an inner loop
					Ordering::Equal => self.iter.next(), // actually give back the value
					Ordering::Greater => Some(Err(anyhow!("expected an indentation of {} for line {}: {:#?}", self.depth, line.get_line_number(), line))),
				}
			},
			Err(_) => self.iter.next(),
		}
	}
}


pub(crate) mod tiny_line {
	use anyhow::{anyhow, bail, Context, Result};
	use crate::lines::Line;
	use crate::tree::names::Names;

	#[derive(Debug)]
	pub(crate) struct TinyLine {
		line_number: usize,
		idents: usize,
		pub(crate) first_field: String,
		fields: std::vec::IntoIter<String>,
	}

	impl TinyLine {
		pub(crate) fn new(line_number: usize, line: &str) -> Result<TinyLine> {
			let trimmed = line.trim_start_matches('\t');
			// tabs are one byte each
			let idents = line.len() - trimmed.len();
			let line = trimmed;

			let mut fields = line.split('\t').map(|x| x.to_owned());

			let first_field = fields.next()
				.with_context(|| anyhow!("no first field in line {line_number}"))?;

			let vec: Vec<String> = fields.collect();

			Ok(TinyLine {
				line_number,
				idents,
				first_field,
				fields: vec.into_iter(),
			})
		}

		pub(crate) fn next(&mut self) -> Result<String> {
			self.fields.next()
				.with_context(|| anyhow!("expected another field in line {}: {self:?}", self.line_number))
		}

		pub(crate) fn next_optional(&mut self) -> Option<String> {
			self.fields.next()
		}

		pub(crate) fn end(mut self) -> Result<String> {
			let next = self.next()?;

			if !self.fields.as_slice().is_empty() {
				bail!("line {} contained more fields than expected: {self:?}", self.line_number);
			}

			Ok(next)
		}

		pub(crate) fn rest(self) -> Vec<String> {
			self.fields.collect()
		}

		/// Takes the remaining fields as names, one for each of the `len` namespaces.
		pub(crate) fn into_names(self, len: usize, unescape: impl Fn(&str) -> Result<String>) -> Result<Names> {
			let line_number = self.line_number;
			let vec = self.rest();

			if vec.len() != len {
				bail!("line {line_number} contained more or less fields ({}) than the expected {len}: {vec:?}", vec.len());
			}

			vec.iter()
				.map(|name| unescape(name).map(Some))
				.collect::<Result<Names>>()
				.with_context(|| anyhow!("failed to create names entries on line {line_number}"))
		}
	}

	impl Line for TinyLine {
		fn get_idents(&self) -> usize {
			self.idents
		}
		fn get_line_number(&self) -> usize {
			self.line_number
		}
	}
}
