//! Seeded random universes for benchmarks and whole-pipeline checks.
//!
//! The generator only uses its own splitmix64 stream, so a shape and a seed
//! always produce the same universe.

use crate::builder::UniverseBuilder;
use crate::universe::{MethodFlags, TypeUniverse};
use hubforge_common::{LayoutResult, TypeId};

/// Parameters of a generated universe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyntheticShape {
    pub classes: usize,
    pub interfaces: usize,
    /// Upper bound on directly implemented interfaces per type.
    pub max_interfaces_per_type: usize,
    /// Percentage of element types that also get an array type.
    pub array_percent: u64,
    /// Size of the selector pool methods are drawn from.
    pub selectors: usize,
    pub seed: u64,
}

impl Default for SyntheticShape {
    fn default() -> Self {
        Self {
            classes: 200,
            interfaces: 40,
            max_interfaces_per_type: 3,
            array_percent: 20,
            selectors: 24,
            seed: 0x5eed,
        }
    }
}

struct SplitMix64(u64);

impl SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    fn below(&mut self, bound: usize) -> usize {
        if bound == 0 {
            0
        } else {
            (self.next_u64() % bound as u64) as usize
        }
    }

    fn percent(&mut self, percent: u64) -> bool {
        self.next_u64() % 100 < percent
    }
}

pub fn synthetic_universe(shape: &SyntheticShape) -> LayoutResult<TypeUniverse> {
    let mut rng = SplitMix64(shape.seed);
    let mut builder = UniverseBuilder::new("Object");
    let root = builder.root();
    builder.instantiate(root);

    let cloneable = builder.interface("Cloneable", &[]);
    let serializable = builder.interface("Serializable", &[]);
    builder.array_interface(cloneable);
    builder.array_interface(serializable);

    for name in ["int", "long"] {
        let primitive = builder.primitive(name);
        let array = builder.array_of(primitive);
        builder.instantiate(array);
    }

    let selector_name = |index: usize| format!("m{index}");

    let mut interfaces: Vec<TypeId> = vec![cloneable, serializable];
    for index in 0..shape.interfaces {
        let mut supers = Vec::new();
        for _ in 0..rng.below(3) {
            let candidate = interfaces[rng.below(interfaces.len())];
            if !supers.contains(&candidate) {
                supers.push(candidate);
            }
        }
        let iface = builder.interface(&format!("I{index}"), &supers);
        for _ in 0..rng.below(3) {
            let name = selector_name(rng.below(shape.selectors));
            let flags = if rng.percent(25) {
                MethodFlags::INVOKED | MethodFlags::LIVE
            } else {
                MethodFlags::ABSTRACT | MethodFlags::INVOKED
            };
            declare_once(&mut builder, iface, &name, flags);
        }
        interfaces.push(iface);
    }

    let mut classes: Vec<TypeId> = vec![root];
    for index in 0..shape.classes {
        let superclass = classes[rng.below(classes.len())];
        let is_abstract = rng.percent(15);
        let class = if is_abstract {
            builder.abstract_class(&format!("C{index}"), superclass)
        } else {
            builder.class(&format!("C{index}"), superclass)
        };
        let implemented: Vec<TypeId> = (0..rng.below(shape.max_interfaces_per_type + 1))
            .map(|_| interfaces[rng.below(interfaces.len())])
            .collect();
        builder.implements(class, &implemented);
        if !is_abstract && rng.percent(85) {
            builder.instantiate(class);
        }
        for _ in 0..rng.below(4) {
            let name = selector_name(rng.below(shape.selectors));
            let flags = if is_abstract && rng.percent(30) {
                MethodFlags::ABSTRACT | MethodFlags::INVOKED
            } else if rng.percent(90) {
                MethodFlags::INVOKED | MethodFlags::LIVE
            } else {
                MethodFlags::LIVE
            };
            declare_once(&mut builder, class, &name, flags);
        }
        classes.push(class);
    }

    let element_types: Vec<TypeId> = classes
        .iter()
        .chain(interfaces.iter())
        .copied()
        .collect();
    for element in element_types {
        if !rng.percent(shape.array_percent) {
            continue;
        }
        let dim = 1 + rng.below(2) as u32;
        let array = builder.array_of_dim(element, dim);
        builder.instantiate(array);
        if rng.percent(10) {
            builder.set_reachable(array, false);
        }
    }

    builder.finish()
}

fn declare_once(builder: &mut UniverseBuilder, ty: TypeId, name: &str, flags: MethodFlags) {
    if !builder.declares(ty, name) {
        builder.method_with_flags(ty, name, flags);
    }
}

#[cfg(test)]
#[path = "../tests/synthetic_tests.rs"]
mod tests;
