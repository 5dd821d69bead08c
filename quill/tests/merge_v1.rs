use anyhow::Result;
use pretty_assertions::assert_eq;
use quill::tiny_v1::TinyV1File;
use quill::MergeOptions;

#[test]
fn merge_v1() -> Result<()> {
	let input_a = include_str!("merge_v1_input_a.tiny");
	let input_b = include_str!("merge_v1_input_b.tiny");
	let expected = include_str!("merge_v1_output.tiny");

	let input_a = quill::tiny_v1::read(input_a.as_bytes())?;
	let input_b = quill::tiny_v1::read(input_b.as_bytes())?;

	let actual = TinyV1File::merge_string(&input_a, &input_b, &MergeOptions::default())?;

	assert_eq!(actual, expected, "left: actual, right: expected");

	Ok(())
}
