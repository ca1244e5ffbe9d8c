//! Data types shared by the unit tests of this crate.

use crate::collection::{DataType, RelationDescriptor};

/// A node with relations to itself and to leaves.
pub(crate) struct Node;

impl Node {
    pub(crate) const CHILDREN: usize = 0;
    pub(crate) const LEAVES: usize = 1;
    pub(crate) const PARENT: usize = 0;
    pub(crate) const TAGS: usize = 0;
}

impl DataType for Node {
    const TYPE_NAME: &'static str = "test::Node";
    type Data = f64;
    type Element = i32;
    const TO_MANY: &'static [RelationDescriptor] = &[
        RelationDescriptor::new("children", "test::Node"),
        RelationDescriptor::new("leaves", "test::Leaf"),
    ];
    const TO_ONE: &'static [RelationDescriptor] =
        &[RelationDescriptor::new("parent", "test::Node")];
    const VECTOR_MEMBERS: &'static [&'static str] = &["tags"];
}

/// A payload-only type.
pub(crate) struct Leaf;

impl DataType for Leaf {
    const TYPE_NAME: &'static str = "test::Leaf";
    type Data = u64;
    type Element = ();
}
