use super::*;

fn order(slot: &InterfaceSlot) -> Vec<Vec<usize>> {
    slot.c1p_order()
        .iter()
        .map(|set| set.ones().collect())
        .collect()
}

#[test]
fn test_disjoint_groups_share_a_slot() {
    let mut slot = InterfaceSlot::new(0, 16, 8);
    assert_eq!(slot.try_add_grouping(&[0, 1]), AddGroupingResult::Success);
    assert_eq!(slot.num_reserved_ids, 2);
    assert_eq!(slot.try_add_grouping(&[2, 3]), AddGroupingResult::Success);
    assert_eq!(slot.num_reserved_ids, 3);
    assert_eq!(order(&slot), vec![vec![0, 1], vec![2, 3]]);
}

#[test]
fn test_overlapping_groups_form_one_matrix() {
    let mut slot = InterfaceSlot::new(0, 16, 8);
    assert_eq!(slot.try_add_grouping(&[0, 1, 2]), AddGroupingResult::Success);
    assert_eq!(slot.try_add_grouping(&[2, 3]), AddGroupingResult::Success);
    assert_eq!(slot.num_reserved_ids, 4);
    assert_eq!(order(&slot), vec![vec![0, 1], vec![2], vec![3]]);
}

#[test]
fn test_group_seen_through_several_columns_counts_once() {
    let mut slot = InterfaceSlot::new(0, 16, 8);
    assert_eq!(slot.try_add_grouping(&[0, 1, 2]), AddGroupingResult::Success);
    assert_eq!(slot.try_add_grouping(&[1, 2, 3]), AddGroupingResult::Success);
    assert_eq!(slot.num_reserved_ids, 4);
    assert_eq!(order(&slot), vec![vec![0], vec![1, 2], vec![3]]);
}

#[test]
fn test_cycle_is_rejected_and_slot_unchanged() {
    let mut slot = InterfaceSlot::new(0, 16, 8);
    assert_eq!(slot.try_add_grouping(&[0, 1]), AddGroupingResult::Success);
    assert_eq!(slot.try_add_grouping(&[1, 2]), AddGroupingResult::Success);
    assert_eq!(slot.num_reserved_ids, 4);
    assert_eq!(slot.try_add_grouping(&[0, 2]), AddGroupingResult::InvalidC1p);
    assert_eq!(slot.num_reserved_ids, 4);
    assert_eq!(order(&slot), vec![vec![0], vec![1], vec![2]]);
}

#[test]
fn test_capacity_overflow() {
    let mut slot = InterfaceSlot::new(0, 4, 8);
    assert_eq!(slot.try_add_grouping(&[0, 1]), AddGroupingResult::Success);
    assert_eq!(slot.try_add_grouping(&[2, 3]), AddGroupingResult::Success);
    assert_eq!(slot.try_add_grouping(&[4, 5]), AddGroupingResult::Success);
    assert_eq!(slot.num_reserved_ids, 4);
    assert_eq!(
        slot.try_add_grouping(&[6, 7]),
        AddGroupingResult::CapacityOverflow
    );
    assert_eq!(slot.num_reserved_ids, 4);
    assert_eq!(order(&slot).len(), 3);
}

#[test]
fn test_nested_group_is_spliced_into_its_set() {
    let mut slot = InterfaceSlot::new(0, 16, 8);
    assert_eq!(slot.try_add_grouping(&[0, 1, 2, 3]), AddGroupingResult::Success);
    assert_eq!(slot.try_add_grouping(&[1, 2]), AddGroupingResult::Success);
    assert_eq!(slot.num_reserved_ids, 3);
    assert_eq!(order(&slot), vec![vec![0, 3], vec![1, 2]]);
}

#[test]
fn test_coarser_matrix_orders_first() {
    let mut slot = InterfaceSlot::new(0, 16, 8);
    assert_eq!(slot.try_add_grouping(&[0, 1]), AddGroupingResult::Success);
    assert_eq!(slot.try_add_grouping(&[1, 2]), AddGroupingResult::Success);
    // Contains both groups without strictly overlapping either.
    assert_eq!(slot.try_add_grouping(&[0, 1, 2]), AddGroupingResult::Success);
    assert_eq!(order(&slot), vec![vec![0], vec![1], vec![2]]);
}

#[test]
fn test_linking_two_matrices() {
    let mut slot = InterfaceSlot::new(0, 16, 8);
    assert_eq!(slot.try_add_grouping(&[0, 1]), AddGroupingResult::Success);
    assert_eq!(slot.try_add_grouping(&[2, 3]), AddGroupingResult::Success);
    assert_eq!(slot.try_add_grouping(&[1, 2]), AddGroupingResult::Success);
    let ordering = order(&slot);
    assert_eq!(ordering.len(), 4);
    // Every group is still a run of consecutive sets.
    for group in [[0, 1], [2, 3], [1, 2]] {
        let positions: Vec<usize> = group
            .iter()
            .map(|node| ordering.iter().position(|set| set.contains(node)).unwrap())
            .collect();
        assert_eq!(positions[0].abs_diff(positions[1]), 1);
    }
}

#[test]
fn test_strictly_overlaps() {
    assert!(strictly_overlaps(&[0, 1], &[1, 2]));
    assert!(!strictly_overlaps(&[0, 1, 2], &[1]));
    assert!(!strictly_overlaps(&[0], &[1]));
    assert!(!strictly_overlaps(&[0, 1], &[0, 1]));
}
