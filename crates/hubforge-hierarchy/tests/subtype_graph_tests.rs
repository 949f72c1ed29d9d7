use super::*;
use crate::assignability::AssignabilityOracle;
use crate::builder::UniverseBuilder;

/// Every included pair is related in the graph exactly when the naive check
/// says so.
fn assert_graph_matches_oracle(universe: &TypeUniverse, graph: &SubtypeGraph) {
    let oracle = AssignabilityOracle::new(universe);
    for &super_type in graph.height_order() {
        let mut below = FixedBitSet::with_capacity(universe.len());
        let mut stack = vec![super_type];
        while let Some(ty) = stack.pop() {
            if below.put(ty.index()) {
                continue;
            }
            stack.extend_from_slice(graph.subtypes(ty));
        }
        for &checked in graph.height_order() {
            assert_eq!(
                below.contains(checked.index()),
                oracle.is_assignable(super_type, checked),
                "{} <: {}",
                universe.name(checked),
                universe.name(super_type)
            );
        }
    }
}

#[test]
fn test_classes_and_interfaces() {
    let mut builder = UniverseBuilder::new("Object");
    let root = builder.root();
    let int = builder.primitive("int");
    let i = builder.interface("I", &[]);
    let a = builder.class("A", root);
    builder.implements(a, &[i]);
    let b = builder.class("B", a);
    let universe = builder.finish().unwrap();
    let graph = SubtypeGraph::build(&universe).unwrap();

    assert_eq!(graph.subtypes(root), &[i, a]);
    assert_eq!(graph.subtypes(i), &[a]);
    assert_eq!(graph.class_parent(a), Some(root));
    assert_eq!(graph.class_parent(b), Some(a));
    assert_eq!(graph.class_parent(i), None);
    assert_eq!(graph.class_children(root), &[a]);
    assert_eq!(graph.roots(), &[root, int]);
    assert_graph_matches_oracle(&universe, &graph);
}

#[test]
fn test_height_order_puts_supertypes_first() {
    let mut builder = UniverseBuilder::new("Object");
    let root = builder.root();
    let i = builder.interface("I", &[]);
    let j = builder.interface("J", &[i]);
    let a = builder.class("A", root);
    let b = builder.class("B", a);
    builder.implements(b, &[j]);
    let universe = builder.finish().unwrap();
    let graph = SubtypeGraph::build(&universe).unwrap();

    assert_eq!(graph.num_included(), universe.len());
    for &ty in graph.height_order() {
        let ordinal = graph.ordinal(ty).unwrap();
        for &child in graph.subtypes(ty) {
            assert!(graph.ordinal(child).unwrap() > ordinal);
        }
    }
    assert_eq!(graph.ordinal(root), Some(0));
}

#[test]
fn test_unreachable_types_are_bypassed() {
    let mut builder = UniverseBuilder::new("Object");
    let root = builder.root();
    let a = builder.class("A", root);
    let hidden = builder.class("Hidden", a);
    let c = builder.class("C", hidden);
    builder.set_reachable(hidden, false);
    let universe = builder.finish().unwrap();
    let graph = SubtypeGraph::build(&universe).unwrap();

    assert!(!graph.is_included(hidden));
    assert_eq!(graph.ordinal(hidden), None);
    assert_eq!(graph.subtypes(a), &[c]);
    assert_eq!(graph.class_parent(c), Some(a));
    assert_graph_matches_oracle(&universe, &graph);
}

#[test]
fn test_array_dimensions() {
    let mut builder = UniverseBuilder::new("Object");
    let root = builder.root();
    let cloneable = builder.interface("Cloneable", &[]);
    builder.array_interface(cloneable);
    let int = builder.primitive("int");
    let a = builder.class("A", root);
    let b = builder.class("B", a);
    let object_array = builder.array_of(root);
    let object_array2 = builder.array_of(object_array);
    let int_array = builder.array_of(int);
    let b_array = builder.array_of(b);
    let b_array2 = builder.array_of(b_array);
    let universe = builder.finish().unwrap();
    let graph = SubtypeGraph::build(&universe).unwrap();

    // A[] does not exist, so B[] sits directly below Object[].
    assert_eq!(graph.class_parent(b_array), Some(object_array));
    assert_eq!(graph.class_parent(object_array), Some(root));
    assert_eq!(graph.class_parent(int_array), Some(root));
    assert_eq!(graph.class_parent(object_array2), Some(object_array));
    assert_eq!(graph.class_parent(b_array2), Some(object_array2));
    assert!(graph.subtypes(cloneable).contains(&object_array));
    assert!(graph.subtypes(cloneable).contains(&int_array));
    assert_eq!(graph.root_array_up_to(&universe, 0), root);
    assert_eq!(graph.root_array_up_to(&universe, 3), object_array2);
    assert_graph_matches_oracle(&universe, &graph);
}

#[test]
fn test_class_array_below_interface_array_keeps_class_parent() {
    let mut builder = UniverseBuilder::new("Object");
    let root = builder.root();
    let i = builder.interface("I", &[]);
    let a = builder.class("A", root);
    builder.implements(a, &[i]);
    let i_array = builder.array_of(i);
    let a_array = builder.array_of(a);
    let universe = builder.finish().unwrap();
    let graph = SubtypeGraph::build(&universe).unwrap();

    assert!(graph.subtypes(i_array).contains(&a_array));
    assert_eq!(graph.class_parent(a_array), Some(root));
    assert_graph_matches_oracle(&universe, &graph);
}

#[test]
fn test_unreachable_root_is_an_error() {
    let mut builder = UniverseBuilder::new("Object");
    let root = builder.root();
    builder.set_reachable(root, false);
    let universe = builder.finish().unwrap();
    assert!(matches!(
        SubtypeGraph::build(&universe),
        Err(LayoutError::Structural { .. })
    ));
}

#[test]
fn test_synthetic_graph_matches_oracle() {
    let shape = crate::synthetic::SyntheticShape {
        classes: 60,
        interfaces: 15,
        ..Default::default()
    };
    let universe = crate::synthetic::synthetic_universe(&shape).unwrap();
    let graph = SubtypeGraph::build(&universe).unwrap();
    assert_graph_matches_oracle(&universe, &graph);
}
