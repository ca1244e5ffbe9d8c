//! Object identity types.

use std::fmt;

/// Identifier for a collection within one persisted frame.
///
/// Collection ids are dense small integers handed out in registration
/// order by a [`CollectionIdTable`](crate::CollectionIdTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionId(pub u32);

impl CollectionId {
    /// Id of a collection that has not been registered with a frame.
    pub const INVALID: Self = Self(u32::MAX);

    /// Creates a new collection ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns true unless this is [`CollectionId::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "col:{}", self.0)
        } else {
            f.write_str("col:-")
        }
    }
}

/// Stable address of one object: its position inside the owning
/// collection plus the id of that collection.
///
/// An id is assigned when the object is inserted into a collection and
/// never changes afterwards. Clearing a collection invalidates every id
/// it handed out.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectID {
    /// Position in the owning collection, or [`ObjectID::UNTRACKED_INDEX`].
    pub index: i64,
    /// Id of the owning collection.
    pub collection_id: CollectionId,
}

impl ObjectID {
    /// Index value marking an object that no collection owns.
    ///
    /// Distinct from every valid position, which is never negative.
    pub const UNTRACKED_INDEX: i64 = i64::MIN;

    /// Creates an object ID.
    #[must_use]
    pub const fn new(index: i64, collection_id: CollectionId) -> Self {
        Self {
            index,
            collection_id,
        }
    }

    /// Creates the id of the object at `position` in `collection_id`.
    #[must_use]
    pub fn at(position: usize, collection_id: CollectionId) -> Self {
        Self::new(i64::try_from(position).unwrap_or(i64::MAX), collection_id)
    }

    /// The id carried by free-floating objects and by empty one-to-one slots.
    #[must_use]
    pub const fn untracked() -> Self {
        Self::new(Self::UNTRACKED_INDEX, CollectionId::INVALID)
    }

    /// Returns true if no collection owns the object.
    #[must_use]
    pub const fn is_untracked(&self) -> bool {
        self.index == Self::UNTRACKED_INDEX
    }

    /// Returns the index as a collection position, if it is one.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        usize::try_from(self.index).ok()
    }
}

impl Default for ObjectID {
    fn default() -> Self {
        Self::untracked()
    }
}

impl fmt::Debug for ObjectID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectID({self})")
    }
}

impl fmt::Display for ObjectID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_untracked() {
            f.write_str("untracked")
        } else {
            write!(f, "{}#{}", self.collection_id, self.index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_id_display() {
        assert_eq!(format!("{}", CollectionId::new(42)), "col:42");
        assert_eq!(format!("{}", CollectionId::INVALID), "col:-");
    }

    #[test]
    fn untracked_is_not_a_position() {
        let id = ObjectID::untracked();
        assert!(id.is_untracked());
        assert_eq!(id.position(), None);
        assert_eq!(ObjectID::default(), id);
    }

    #[test]
    fn tracked_position() {
        let id = ObjectID::at(5, CollectionId::new(2));
        assert!(!id.is_untracked());
        assert_eq!(id.position(), Some(5));
        assert_eq!(format!("{id}"), "col:2#5");
    }

    #[test]
    fn ordering_is_by_index_first() {
        let a = ObjectID::new(1, CollectionId::new(9));
        let b = ObjectID::new(2, CollectionId::new(1));
        assert!(a < b);
    }
}
