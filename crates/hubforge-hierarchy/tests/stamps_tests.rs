use super::*;
use crate::builder::UniverseBuilder;

#[test]
fn test_stamps() {
    let mut builder = UniverseBuilder::new("Object");
    let root = builder.root();
    let shape = builder.abstract_class("Shape", root);
    let circle = builder.class("Circle", shape);
    let square = builder.class("Square", shape);
    let animal = builder.abstract_class("Animal", root);
    let dog = builder.class("Dog", animal);
    let puppy = builder.class("Puppy", dog);
    let unused = builder.class("Unused", root);
    let solo = builder.class("Solo", root);
    let drawable = builder.interface("Drawable", &[]);
    builder.implements(circle, &[drawable]);
    for ty in [circle, square, dog, puppy, solo] {
        builder.instantiate(ty);
    }
    let universe = builder.finish().unwrap();
    let graph = SubtypeGraph::build(&universe).unwrap();
    let stamps = TypeStamps::compute(&universe, &graph);

    // Two instantiated subtypes: join is the type itself.
    assert_eq!(
        stamps.get(shape),
        TypeStamp {
            strengthened: Some(shape),
            unique_concrete: None
        }
    );
    // Only Circle implements Drawable.
    assert_eq!(
        stamps.get(drawable),
        TypeStamp {
            strengthened: Some(circle),
            unique_concrete: Some(circle)
        }
    );
    // Dog is instantiated and has an instantiated subtype.
    assert_eq!(
        stamps.get(dog),
        TypeStamp {
            strengthened: Some(dog),
            unique_concrete: None
        }
    );
    assert_eq!(stamps.get(animal).strengthened, Some(dog));
    assert_eq!(stamps.get(animal).unique_concrete, None);
    assert_eq!(stamps.get(unused), TypeStamp::default());
    assert_eq!(
        stamps.get(solo),
        TypeStamp {
            strengthened: Some(solo),
            unique_concrete: Some(solo)
        }
    );
    assert_eq!(stamps.get(root).strengthened, Some(root));
}
