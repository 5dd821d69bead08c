use anyhow::Result;
use pretty_assertions::assert_eq;
use quill::tree::mappings::Mappings;
use quill::MergeOptions;

#[test]
fn merge() -> Result<()> {
	let input_a = include_str!("merge_input_a.tiny");
	let input_b = include_str!("merge_input_b.tiny");
	let expected = include_str!("merge_output.tiny");

	let input_a = quill::tiny_v2::read(input_a.as_bytes())?;
	let input_b = quill::tiny_v2::read(input_b.as_bytes())?;

	input_a.info.namespaces.check_that(&["intermediary", "named"])?;
	input_b.info.namespaces.check_that(&["intermediary", "official"])?;

	let output = Mappings::merge(&input_a, &input_b, &MergeOptions::default())?;

	let actual = quill::tiny_v2::write_string(&output)?;

	assert_eq!(actual, expected, "left: actual, right: expected");

	Ok(())
}

#[test]
fn merge_leave_holes() -> Result<()> {
	let input_a = include_str!("merge_input_a.tiny");
	let input_b = include_str!("merge_input_b.tiny");
	let expected = include_str!("merge_output_leave_holes.tiny");

	let input_a = quill::tiny_v2::read(input_a.as_bytes())?;
	let input_b = quill::tiny_v2::read(input_b.as_bytes())?;

	let options = MergeOptions {
		common_namespace: Some("intermediary".to_owned()),
		leave_holes: true,
	};
	let output = Mappings::merge(&input_a, &input_b, &options)?;

	let actual = quill::tiny_v2::write_string(&output)?;

	assert_eq!(actual, expected, "left: actual, right: expected");

	Ok(())
}

#[test]
fn merge_with_itself() -> Result<()> {
	let input = include_str!("merge_input_a.tiny");

	let input = quill::tiny_v2::read(input.as_bytes())?;

	let options = MergeOptions {
		common_namespace: Some("intermediary".to_owned()),
		leave_holes: false,
	};
	let output = Mappings::merge(&input, &input, &options)?;

	assert_eq!(quill::tiny_v2::write_string(&output)?, quill::tiny_v2::write_string(&input)?);

	Ok(())
}

#[test]
fn merge_on_other_common_namespace() -> Result<()> {
	let input_a = include_str!("merge_input_a.tiny");
	let input_b = "tiny\t2\t0\tnamed\tsrg\nc\tcom/foo/Bar\tC_1\n";

	let input_a = quill::tiny_v2::read(input_a.as_bytes())?;
	let input_b = quill::tiny_v2::read(input_b.as_bytes())?;

	let output = Mappings::merge(&input_a, &input_b, &MergeOptions::default())?;
	output.info.namespaces.check_that(&["intermediary", "named", "srg"])?;

	let class = output.classes.iter()
		.find(|class| class.info.names.names()[1].as_deref() == Some("com/foo/Bar"))
		.expect("merged class for com/foo/Bar");
	assert_eq!(
		class.info.names.names(),
		&[Some("net/minecraft/class_1".to_owned()), Some("com/foo/Bar".to_owned()), Some("C_1".to_owned())]
	);
	assert_eq!(class.methods.len(), 2);

	Ok(())
}
