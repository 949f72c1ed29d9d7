use super::*;
use hubforge_hierarchy::{AssignabilityOracle, UniverseBuilder};

fn mixed_universe() -> TypeUniverse {
    let mut builder = UniverseBuilder::new("Object");
    let root = builder.root();
    let cloneable = builder.interface("Cloneable", &[]);
    builder.array_interface(cloneable);
    let list = builder.interface("List", &[]);
    let deque = builder.interface("Deque", &[]);
    let base = builder.abstract_class("AbstractList", root);
    builder.implements(base, &[list]);
    let array_list = builder.class("ArrayList", base);
    let linked = builder.class("LinkedList", base);
    builder.implements(linked, &[deque]);
    builder.class("Other", root);
    let int = builder.primitive("int");
    builder.array_of(int);
    builder.array_of(root);
    builder.array_of(list);
    builder.array_of(array_list);
    builder.finish().unwrap()
}

#[test]
fn test_single_chain_uses_one_slot() {
    let mut builder = UniverseBuilder::new("Object");
    let root = builder.root();
    let base = builder.class("Base", root);
    let mid = builder.class("Mid", base);
    let leaf = builder.class("Leaf", mid);
    let universe = builder.finish().unwrap();
    let graph = SubtypeGraph::build(&universe).unwrap();
    let layout = TypeCheckLayout::build(&universe, &graph, 1 << 16).unwrap();

    assert_eq!(layout.num_class_slots, 1);
    assert_eq!(layout.num_interface_slots, 0);
    let check = |ty: TypeId| layout.get(ty).unwrap().check;
    assert!(check(base).start <= check(mid).start && check(mid).end() <= check(base).end());
    assert!(check(mid).start <= check(leaf).start && check(leaf).end() <= check(mid).end());
    assert_eq!(check(leaf).range, 1);
    assert_eq!(layout.is_assignable(base, leaf), Some(true));
    assert_eq!(layout.is_assignable(leaf, base), Some(false));
}

#[test]
fn test_every_pair_matches_oracle() {
    let universe = mixed_universe();
    let graph = SubtypeGraph::build(&universe).unwrap();
    let layout = TypeCheckLayout::build(&universe, &graph, 1 << 16).unwrap();
    let oracle = AssignabilityOracle::new(&universe);

    for &super_type in graph.height_order() {
        for &checked in graph.height_order() {
            assert_eq!(
                layout.is_assignable(super_type, checked),
                Some(oracle.is_assignable(super_type, checked)),
                "{} <: {}",
                universe.name(checked),
                universe.name(super_type)
            );
        }
    }
}

#[test]
fn test_interface_slots_follow_class_slots() {
    let universe = mixed_universe();
    let graph = SubtypeGraph::build(&universe).unwrap();
    let layout = TypeCheckLayout::build(&universe, &graph, 1 << 16).unwrap();

    assert!(layout.num_interface_slots >= 1);
    for (ty, data) in layout.iter() {
        assert_eq!(data.slots.len(), layout.total_slots());
        let slot = usize::from(data.check.slot);
        if universe.is_type_check_interface(ty) {
            assert!(slot >= layout.num_class_slots);
        } else {
            assert!(slot < layout.num_class_slots);
        }
    }
}

#[test]
fn test_ordinals_follow_height_order() {
    let universe = mixed_universe();
    let graph = SubtypeGraph::build(&universe).unwrap();
    let layout = TypeCheckLayout::build(&universe, &graph, 1 << 16).unwrap();

    for (position, &ty) in graph.height_order().iter().enumerate() {
        assert_eq!(layout.get(ty).unwrap().ordinal as usize, position);
    }
}

#[test]
fn test_excluded_types_have_no_data() {
    let mut builder = UniverseBuilder::new("Object");
    let root = builder.root();
    let hidden = builder.class("Hidden", root);
    builder.set_reachable(hidden, false);
    let universe = builder.finish().unwrap();
    let graph = SubtypeGraph::build(&universe).unwrap();
    let layout = TypeCheckLayout::build(&universe, &graph, 1 << 16).unwrap();

    assert!(layout.get(hidden).is_none());
    assert_eq!(layout.is_assignable(root, hidden), None);
    assert_eq!(layout.iter().count(), 1);
}

#[test]
fn test_layout_is_deterministic() {
    let universe = mixed_universe();
    let graph = SubtypeGraph::build(&universe).unwrap();
    let first = TypeCheckLayout::build(&universe, &graph, 1 << 16).unwrap();
    let second = TypeCheckLayout::build(&universe, &graph, 1 << 16).unwrap();
    assert_eq!(first, second);
}
