//! Combined type check layout.
//!
//! Class slots come first, interface slots after them; every included type
//! carries one id per slot and the range check of its own slot.

use crate::class_ids::{ClassIdBuilder, SlotIds, slot_number};
use crate::interface_ids::InterfaceIdBuilder;
use crate::range::RangeCheck;
use hubforge_common::{LayoutError, LayoutResult, TypeId};
use hubforge_hierarchy::{SubtypeGraph, TypeUniverse};
use tracing::{debug, info_span};

/// Type check data of one included type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeCheckData {
    /// Position in the height order.
    pub ordinal: u32,
    pub check: RangeCheck,
    /// `num_class_slots` class ids followed by `num_interface_slots`
    /// interface ids.
    pub slots: SlotIds,
}

impl TypeCheckData {
    /// This type's id in `slot`.
    pub fn id_in(&self, slot: u16) -> u16 {
        self.slots.get(usize::from(slot)).copied().unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeCheckLayout {
    pub num_class_slots: usize,
    pub num_interface_slots: usize,
    types: Vec<Option<TypeCheckData>>,
}

impl TypeCheckLayout {
    pub fn build(
        universe: &TypeUniverse,
        graph: &SubtypeGraph,
        capacity: u32,
    ) -> LayoutResult<Self> {
        let _span = info_span!("type_check_ids", capacity).entered();

        let classes = ClassIdBuilder::new(universe, graph, capacity).build()?;
        let interfaces =
            InterfaceIdBuilder::new(universe, graph, capacity, classes.num_slots).build()?;
        let total = classes.num_slots + interfaces.num_slots;
        slot_number(total.saturating_sub(1))?;

        let mut types = vec![None; universe.len()];
        for &ty in graph.height_order() {
            let check = if universe.is_type_check_interface(ty) {
                interfaces.checks[ty.index()]
            } else {
                classes.checks[ty.index()]
            };
            let Some(check) = check else {
                return Err(LayoutError::structural(format!(
                    "{} did not receive a type check range",
                    universe.name(ty)
                )));
            };
            let mut slots = classes.slot_ids[ty.index()].clone();
            slots.extend_from_slice(&interfaces.slot_ids[ty.index()]);
            debug_assert_eq!(slots.len(), total);
            types[ty.index()] = Some(TypeCheckData {
                ordinal: graph.ordinal(ty).unwrap_or(0),
                check,
                slots,
            });
        }

        debug!(
            class_slots = classes.num_slots,
            interface_slots = interfaces.num_slots,
            "type check layout built"
        );
        Ok(Self {
            num_class_slots: classes.num_slots,
            num_interface_slots: interfaces.num_slots,
            types,
        })
    }

    /// Number of ids every type carries.
    pub fn total_slots(&self) -> usize {
        self.num_class_slots + self.num_interface_slots
    }

    /// Data of an included type.
    pub fn get(&self, ty: TypeId) -> Option<&TypeCheckData> {
        self.types.get(ty.index()).and_then(Option::as_ref)
    }

    /// The run-time check: is a value of type `checked` assignable to
    /// `super_type`? `None` if either type is not part of the layout.
    pub fn is_assignable(&self, super_type: TypeId, checked: TypeId) -> Option<bool> {
        let super_data = self.get(super_type)?;
        let checked_data = self.get(checked)?;
        Some(
            super_data
                .check
                .matches(checked_data.id_in(super_data.check.slot)),
        )
    }

    #[cfg(test)]
    pub(crate) fn get_mut(&mut self, ty: TypeId) -> Option<&mut TypeCheckData> {
        self.types.get_mut(ty.index()).and_then(Option::as_mut)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeCheckData)> + '_ {
        self.types
            .iter()
            .enumerate()
            .filter_map(|(index, data)| Some((TypeId::from_index(index), data.as_ref()?)))
    }
}

#[cfg(test)]
#[path = "../tests/layout_tests.rs"]
mod tests;
