//! Rendering of the dependency tree across an injector and its imports.

use crate::injector::Injector;
use fxhash::FxHashSet;
use itertools::Itertools;
use std::fmt::Write;

/// Renders an indented tree of injector names with their sorted public and
/// private dependency names, recursing into imports. Private names are only
/// shown for the injector the description starts from; an injector name
/// already rendered is skipped, so import cycles terminate.
pub fn describe(injector: &Injector) -> String {
    let mut out = String::new();
    let mut visited = FxHashSet::default();
    describe_into(injector, 0, true, &mut visited, &mut out);
    out
}

fn describe_into(
    injector: &Injector,
    depth: usize,
    top_level: bool,
    visited: &mut FxHashSet<String>,
    out: &mut String,
) {
    if !visited.insert(injector.name().to_string()) {
        return;
    }

    let indent = "  ".repeat(depth);
    let _ = writeln!(out, "{indent}{}", injector.name());

    let (public, private) = injector.names_by_visibility();
    if !public.is_empty() {
        let _ = writeln!(out, "{indent}  public: {}", public.iter().join(", "));
    }
    if top_level && !private.is_empty() {
        let _ = writeln!(out, "{indent}  private: {}", private.iter().join(", "));
    }

    for import in injector.imports_snapshot() {
        describe_into(&import, depth + 1, false, visited, out);
    }
}

#[cfg(test)]
mod tests {
    use crate::describe::describe;
    use crate::injector::Injector;

    #[test]
    fn should_render_sorted_names_by_visibility() {
        let injector = Injector::new("app");
        injector.register("zeta").value(1_i32).public();
        injector.register("alpha").value(2_i32).public();
        injector.register("secret").value(3_i32);

        assert_eq!(
            describe(&injector),
            "app\n  public: alpha, zeta\n  private: secret\n"
        );
    }

    #[test]
    fn should_omit_private_names_of_imported_injectors() {
        let parent = Injector::new("parent");
        parent.register("shared").value(1_i32).public();
        parent.register("hidden").value(2_i32);

        let child = parent.new_child("child");
        child.register("own").value(3_i32);

        assert_eq!(
            describe(&child),
            "child\n  private: own\n  parent\n    public: shared\n"
        );
    }

    #[test]
    fn should_terminate_on_import_cycles() {
        let a = Injector::new("a");
        let b = Injector::new("b");
        a.import_injectors(&[b.clone()]);
        b.import_injectors(&[a.clone()]);

        let rendered = describe(&a);
        assert_eq!(rendered.matches('a').count(), 1);
        assert_eq!(rendered, "a\n  b\n");
    }
}
