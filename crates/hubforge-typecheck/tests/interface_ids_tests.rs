use super::*;
use hubforge_common::TypeId;
use hubforge_hierarchy::{AssignabilityOracle, SyntheticShape, UniverseBuilder, synthetic_universe};

fn assign(universe: &TypeUniverse, capacity: u32, first_slot: usize) -> (SubtypeGraph, InterfaceIdAssignment) {
    let graph = SubtypeGraph::build(universe).unwrap();
    let ids = InterfaceIdBuilder::new(universe, &graph, capacity, first_slot)
        .build()
        .unwrap();
    (graph, ids)
}

/// Check every interface range against the naive closure.
fn assert_interface_checks(
    universe: &TypeUniverse,
    graph: &SubtypeGraph,
    ids: &InterfaceIdAssignment,
    first_slot: usize,
) {
    let oracle = AssignabilityOracle::new(universe);
    for &super_type in graph.height_order() {
        let Some(check) = ids.checks[super_type.index()] else {
            assert!(!universe.is_type_check_interface(super_type));
            continue;
        };
        let local = usize::from(check.slot) - first_slot;
        for &checked in graph.height_order() {
            let id = ids.slot_ids[checked.index()][local];
            assert_eq!(
                check.matches(id),
                oracle.is_assignable(super_type, checked),
                "{} <: {}",
                universe.name(checked),
                universe.name(super_type)
            );
        }
    }
}

#[test]
fn test_unrelated_interfaces_share_a_slot() {
    let mut builder = UniverseBuilder::new("Object");
    let root = builder.root();
    let i = builder.interface("I", &[]);
    let j = builder.interface("J", &[]);
    let implementers: Vec<TypeId> = ["A", "B", "C", "D"]
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let class = builder.class(name, root);
            builder.implements(class, &[if index < 2 { i } else { j }]);
            class
        })
        .collect();
    let universe = builder.finish().unwrap();
    let (graph, ids) = assign(&universe, 1 << 16, 1);

    assert_eq!(ids.num_slots, 1);
    let i_check = ids.checks[i.index()].unwrap();
    let j_check = ids.checks[j.index()].unwrap();
    assert_eq!((i_check.slot, i_check.range), (1, 1));
    assert_eq!((j_check.slot, j_check.range), (1, 1));
    assert_ne!(i_check.start, j_check.start);
    // Implementers share their interface's id.
    assert_eq!(ids.slot_ids[implementers[0].index()].as_slice(), &[i_check.start]);
    assert_eq!(ids.slot_ids[implementers[3].index()].as_slice(), &[j_check.start]);
    assert_eq!(ids.slot_ids[root.index()].as_slice(), &[UNASSIGNED_ID]);
    assert_interface_checks(&universe, &graph, &ids, 1);
}

#[test]
fn test_overlapping_interfaces_merge_into_three_groups() {
    let mut builder = UniverseBuilder::new("Object");
    let root = builder.root();
    let i = builder.interface("I", &[]);
    let j = builder.interface("J", &[]);
    let only_i = builder.class("OnlyI", root);
    builder.implements(only_i, &[i]);
    let both = builder.class("Both", root);
    builder.implements(both, &[i, j]);
    let only_j = builder.class("OnlyJ", root);
    builder.implements(only_j, &[j]);
    let universe = builder.finish().unwrap();
    let (graph, ids) = assign(&universe, 1 << 16, 0);

    assert_eq!(ids.num_slots, 1);
    let id = |ty: TypeId| ids.slot_ids[ty.index()][0];
    let mut distinct = vec![id(only_i), id(both), id(only_j)];
    distinct.sort_unstable();
    distinct.dedup();
    assert_eq!(distinct.len(), 3);
    assert_eq!(id(only_i), id(i));
    assert_eq!(id(only_j), id(j));
    assert_eq!(ids.checks[i.index()].unwrap().range, 2);
    assert_eq!(ids.checks[j.index()].unwrap().range, 2);
    assert_interface_checks(&universe, &graph, &ids, 0);
}

#[test]
fn test_cyclic_overlap_opens_a_second_slot() {
    let mut builder = UniverseBuilder::new("Object");
    let root = builder.root();
    let i = builder.interface("I", &[]);
    let j = builder.interface("J", &[]);
    let k = builder.interface("K", &[]);
    for (name, pair) in [("IJ", [i, j]), ("JK", [j, k]), ("KI", [k, i])] {
        let class = builder.class(name, root);
        builder.implements(class, &pair);
    }
    let universe = builder.finish().unwrap();
    let (graph, ids) = assign(&universe, 1 << 16, 2);

    assert_eq!(ids.num_slots, 2);
    let slots: Vec<u16> = [i, j, k]
        .iter()
        .map(|ty| ids.checks[ty.index()].unwrap().slot)
        .collect();
    assert!(slots.iter().all(|&slot| slot == 2 || slot == 3));
    assert!(slots.contains(&3));
    assert_interface_checks(&universe, &graph, &ids, 2);
}

#[test]
fn test_small_capacity_spreads_interfaces() {
    let mut builder = UniverseBuilder::new("Object");
    let root = builder.root();
    for index in 0..6 {
        let iface = builder.interface(&format!("I{index}"), &[]);
        let class = builder.class(&format!("C{index}"), root);
        builder.implements(class, &[iface]);
    }
    let universe = builder.finish().unwrap();
    let (graph, ids) = assign(&universe, 4, 0);

    // Three single-node groups and id 0 fill a slot of capacity 4.
    assert_eq!(ids.num_slots, 2);
    for slot_ids in &ids.slot_ids {
        assert!(slot_ids.iter().all(|&id| id < 4));
    }
    assert_interface_checks(&universe, &graph, &ids, 0);
}

#[test]
fn test_no_interfaces_no_slots() {
    let mut builder = UniverseBuilder::new("Object");
    let root = builder.root();
    builder.class("A", root);
    let universe = builder.finish().unwrap();
    let (_, ids) = assign(&universe, 1 << 16, 1);

    assert_eq!(ids.num_slots, 0);
    assert!(ids.checks.iter().all(Option::is_none));
    assert!(ids.slot_ids.iter().all(|slot_ids| slot_ids.is_empty()));
}

#[test]
fn test_synthetic_universe_matches_oracle() {
    for seed in [1, 2, 3] {
        let shape = SyntheticShape {
            seed,
            ..SyntheticShape::default()
        };
        let universe = synthetic_universe(&shape).unwrap();
        let (graph, ids) = assign(&universe, 1 << 16, 1);
        assert!(ids.num_slots >= 1);
        assert_interface_checks(&universe, &graph, &ids, 1);

        let (graph, ids) = assign(&universe, 512, 1);
        assert_interface_checks(&universe, &graph, &ids, 1);
    }
}
