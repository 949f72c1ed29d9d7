//! Per-type facts derived from instantiation, computed bottom-up over the
//! subtype graph.

use crate::subtype_graph::SubtypeGraph;
use crate::universe::TypeUniverse;
use hubforge_common::TypeId;
use serde::Serialize;

/// What the optimizer may assume about a value statically typed as a type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TypeStamp {
    /// The most precise type covering every instantiated subtype, or `None`
    /// if no subtype is instantiated.
    pub strengthened: Option<TypeId>,
    /// The single instantiated type every value must have, if there is one.
    pub unique_concrete: Option<TypeId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeStamps {
    stamps: Vec<TypeStamp>,
}

impl TypeStamps {
    pub fn compute(universe: &TypeUniverse, graph: &SubtypeGraph) -> Self {
        let mut stamps = vec![TypeStamp::default(); universe.len()];

        for &ty in graph.height_order().iter().rev() {
            let mut joined: Option<TypeId> = None;
            for &child in graph.subtypes(ty) {
                let Some(child_stamp) = stamps[child.index()].strengthened else {
                    continue;
                };
                match joined {
                    Some(existing) if existing != child_stamp => {
                        // Two different instantiated subtrees: the join is `ty`.
                        joined = Some(ty);
                        break;
                    }
                    _ => joined = Some(child_stamp),
                }
            }

            let instantiated = universe.ty(ty).is_instantiated();
            stamps[ty.index()] = match joined {
                None if instantiated => TypeStamp {
                    strengthened: Some(ty),
                    unique_concrete: Some(ty),
                },
                None => TypeStamp::default(),
                Some(join) if join == ty || instantiated => TypeStamp {
                    strengthened: Some(ty),
                    unique_concrete: None,
                },
                Some(join) => TypeStamp {
                    strengthened: Some(join),
                    unique_concrete: stamps[join.index()].unique_concrete,
                },
            };
        }

        Self { stamps }
    }

    pub fn get(&self, ty: TypeId) -> TypeStamp {
        self.stamps[ty.index()]
    }
}

#[cfg(test)]
#[path = "../tests/stamps_tests.rs"]
mod tests;
