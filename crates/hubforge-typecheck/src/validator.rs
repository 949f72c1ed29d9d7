//! Post-assignment verification of the type check layout.
//!
//! Every ordered pair of included types is checked against the naive
//! ancestor closure, so this is quadratic; `LayoutOptions::verify_type_checks`
//! turns it off for very large universes.

use crate::layout::{TypeCheckData, TypeCheckLayout};
use hubforge_common::{LayoutError, LayoutResult, TypeId};
use hubforge_hierarchy::{AssignabilityOracle, SubtypeGraph, TypeUniverse};
use tracing::{debug, info_span};

pub struct TypeCheckValidator<'a> {
    universe: &'a TypeUniverse,
    graph: &'a SubtypeGraph,
    layout: &'a TypeCheckLayout,
    capacity: u32,
}

impl<'a> TypeCheckValidator<'a> {
    pub fn new(
        universe: &'a TypeUniverse,
        graph: &'a SubtypeGraph,
        layout: &'a TypeCheckLayout,
        capacity: u32,
    ) -> Self {
        Self {
            universe,
            graph,
            layout,
            capacity,
        }
    }

    pub fn verify(&self) -> LayoutResult<()> {
        let _span = info_span!("verify_type_checks").entered();
        self.verify_capacity()?;
        self.verify_pairs()?;
        self.verify_contiguity()?;
        debug!(types = self.graph.num_included(), "type checks verified");
        Ok(())
    }

    /// No id or range end reaches the slot capacity, and every type carries
    /// one id per slot.
    fn verify_capacity(&self) -> LayoutResult<()> {
        let total = self.layout.total_slots();
        for (ty, data) in self.layout.iter() {
            if data.slots.len() != total {
                return Err(LayoutError::structural(format!(
                    "{} carries {} slot ids, expected {total}",
                    self.universe.name(ty),
                    data.slots.len()
                )));
            }
            if let Some(&id) = data.slots.iter().find(|&&id| u32::from(id) >= self.capacity) {
                return Err(LayoutError::structural(format!(
                    "{} has id {id}, slot capacity is {}",
                    self.universe.name(ty),
                    self.capacity
                )));
            }
            if data.check.range == 0 || data.check.end() >= self.capacity {
                return Err(LayoutError::structural(format!(
                    "{} has range {}..={} outside slot capacity {}",
                    self.universe.name(ty),
                    data.check.start,
                    data.check.end(),
                    self.capacity
                )));
            }
        }
        Ok(())
    }

    fn verify_pairs(&self) -> LayoutResult<()> {
        let oracle = AssignabilityOracle::new(self.universe);
        for &checked in self.graph.height_order() {
            let ancestors = oracle.ancestors(checked);
            let checked_data = self.data(checked)?;
            for &super_type in self.graph.height_order() {
                let super_data = self.data(super_type)?;
                let check = super_data.check;
                let id = checked_data.id_in(check.slot);
                let expected = ancestors.contains(super_type.index());
                let actual = check.matches(id);
                if expected != actual {
                    return Err(LayoutError::TypeCheckMismatch {
                        super_type: self.universe.name(super_type).to_string(),
                        checked_type: self.universe.name(checked).to_string(),
                        expected,
                        actual,
                        slot: check.slot,
                        start: check.start,
                        range: check.range,
                        id,
                    });
                }
            }
        }
        Ok(())
    }

    /// The ids of an interface's descendants in its slot are exactly its
    /// range, without holes.
    fn verify_contiguity(&self) -> LayoutResult<()> {
        let oracle = AssignabilityOracle::new(self.universe);
        let interfaces: Vec<TypeId> = self
            .graph
            .height_order()
            .iter()
            .copied()
            .filter(|&ty| self.universe.is_type_check_interface(ty))
            .collect();
        if interfaces.is_empty() {
            return Ok(());
        }

        let mut descendant_ids: Vec<Vec<u16>> = vec![Vec::new(); interfaces.len()];
        for &checked in self.graph.height_order() {
            let ancestors = oracle.ancestors(checked);
            let checked_data = self.data(checked)?;
            for (index, &iface) in interfaces.iter().enumerate() {
                if ancestors.contains(iface.index()) {
                    let slot = self.data(iface)?.check.slot;
                    descendant_ids[index].push(checked_data.id_in(slot));
                }
            }
        }

        for (iface, mut ids) in interfaces.into_iter().zip(descendant_ids) {
            ids.sort_unstable();
            ids.dedup();
            let check = self.data(iface)?.check;
            let contiguous = ids.first() == Some(&check.start)
                && ids.last().map(|&last| u32::from(last)) == Some(check.end())
                && ids.len() == usize::from(check.range);
            if !contiguous {
                return Err(LayoutError::structural(format!(
                    "descendants of {} are not numbered contiguously in slot {}",
                    self.universe.name(iface),
                    check.slot
                )));
            }
        }
        Ok(())
    }

    fn data(&self, ty: TypeId) -> LayoutResult<&'a TypeCheckData> {
        self.layout.get(ty).ok_or_else(|| {
            LayoutError::structural(format!(
                "{} is included but has no type check data",
                self.universe.name(ty)
            ))
        })
    }
}

#[cfg(test)]
#[path = "../tests/validator_tests.rs"]
mod tests;
