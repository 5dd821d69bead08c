use indexmap::IndexMap;
use crate::tree::mappings::{ClassMapping, ClassNowodeMapping};
use crate::tree::names::{Namespace, Namespaces};
use crate::tree::NodeInfo;

/// Walks the enclosing classes of `name`, innermost first, and returns the first one `lookup` gives something for,
/// together with the part of `name` inside of that enclosing class.
///
/// For `a$b$c` this asks for `a$b` and then `a`, giving back `c` or `b$c` as the inner part.
/// Trailing `$` are ignored, so `a$` is not nested.
pub(crate) fn find_enclosing<'a, T>(name: &'a str, mut lookup: impl FnMut(&'a str) -> Option<T>) -> Option<(T, &'a str)> {
	let name = name.trim_end_matches('$');
	let mut end = name.len();
	while let Some(index) = name[..end].rfind('$') {
		if index == 0 {
			break;
		}
		if let Some(found) = lookup(&name[..index]) {
			return Some((found, &name[index + 1..]));
		}
		end = index;
	}
	None
}

/// Creates a class entry for a nested class `key` that the input doesn't have.
///
/// In each namespace other than `common`, the name is the one of the innermost enclosing class that has a name there,
/// with the inner part appended. If there's no such enclosing class, `key` is used as is.
pub(crate) fn synthesize_class(
	key: &str,
	namespaces: &Namespaces,
	common: Namespace,
	classes: &IndexMap<&str, &ClassNowodeMapping>,
) -> ClassNowodeMapping {
	let names = namespaces.iter()
		.map(|(namespace, _)| {
			if namespace == common {
				return Some(key.to_owned());
			}

			let name = find_enclosing(key, |outer| {
				classes.get(outer).and_then(|class| class.info.names.get(namespace))
			})
				.map_or_else(|| key.to_owned(), |(outer, inner)| format!("{outer}${inner}"));

			Some(name)
		})
		.collect();

	ClassNowodeMapping::new(ClassMapping { names })
}

#[cfg(test)]
mod testing {
	use indexmap::IndexMap;
	use pretty_assertions::assert_eq;
	use crate::action::enclosing_class::{find_enclosing, synthesize_class};
	use crate::tree::mappings::{ClassMapping, ClassNowodeMapping};
	use crate::tree::names::{Names, Namespace, Namespaces};
	use crate::tree::NodeInfo;

	#[test]
	fn innermost_first() {
		let mut asked = Vec::new();
		let found = find_enclosing("a$b$c", |outer| {
			asked.push(outer.to_owned());
			None::<()>
		});
		assert_eq!(found, None);
		assert_eq!(asked, vec!["a$b", "a"]);

		assert_eq!(find_enclosing("a$b$c", |outer| (outer == "a").then_some(1)), Some((1, "b$c")));
		assert_eq!(find_enclosing("a$b$c", |outer| (outer != "a").then_some(2)), Some((2, "c")));
	}

	#[test]
	fn not_nested() {
		assert_eq!(find_enclosing("pkg/Outer", |_| Some(())), None);
		assert_eq!(find_enclosing("$Outer", |_| Some(())), None);
		assert_eq!(find_enclosing("a$", |_| Some(())), None);
		assert_eq!(find_enclosing("a$b$", |outer| (outer == "a").then_some(())), Some(((), "b")));
	}

	#[test]
	fn synthesize() {
		let namespaces = Namespaces::try_from(&["intermediary", "named"][..]).unwrap();
		let outer = ClassNowodeMapping::new(ClassMapping { names: Names::from(["pkg/Outer", "pkg/renamed/Outer"]) });
		let unnamed = ClassNowodeMapping::new(ClassMapping { names: Names::from(["pkg/Other$Inner", ""]) });

		let mut classes = IndexMap::new();
		classes.insert("pkg/Outer", &outer);
		classes.insert("pkg/Other$Inner", &unnamed);

		let class = synthesize_class("pkg/Outer$Inner$Deeper", &namespaces, Namespace(0), &classes);
		assert_eq!(class.info.names, Names::from(["pkg/Outer$Inner$Deeper", "pkg/renamed/Outer$Inner$Deeper"]));

		let class = synthesize_class("pkg/Other$Inner$Deeper", &namespaces, Namespace(0), &classes);
		assert_eq!(class.info.names, Names::from(["pkg/Other$Inner$Deeper", "pkg/Other$Inner$Deeper"]));

		let class = synthesize_class("pkg/Outer$", &namespaces, Namespace(0), &classes);
		assert_eq!(class.info.names, Names::from(["pkg/Outer$", "pkg/Outer$"]));
	}
}
