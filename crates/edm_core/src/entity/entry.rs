//! Owning wrapper around one record.
//!
//! An entry is in one of two regimes. While its id is untracked it is
//! free-floating and its handles keep it alive and are counted. Once a
//! collection adopts it the count is inert and the collection is the
//! sole owner: clearing or dropping the collection releases the entry
//! and every handle still pointing at it turns unavailable.
//!
//! Relations never own their targets. They hold [`Link`]s, so cycles
//! between entries (including an entry relating to itself) cannot keep
//! anything alive.

use crate::collection::DataType;
use crate::column::RelationRange;
use crate::entity::generation::{Generation, Stamps};
use crate::entity::handle::ObjectRef;
use crate::error::{CoreError, CoreResult};
use crate::types::{CollectionId, ObjectID};
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::any::Any;
use std::sync::{Arc, Weak};

/// Identity state, kept apart from the body so handles can be counted
/// while the body is locked.
struct Tracking {
    id: ObjectID,
    untracked_refs: u32,
    released: bool,
    /// Generation of the owning collection; `None` while floating.
    owner: Option<Arc<Generation>>,
}

/// Non-owning relation slot.
#[derive(Clone, Default)]
pub(crate) struct Link(Option<Weak<dyn ErasedEntry>>);

impl Link {
    /// A link to the target of `target`; empty if `target` is.
    pub(crate) fn to(target: &ObjectRef) -> Self {
        Self(target.erased().map(Arc::downgrade))
    }

    /// True if the slot was never set.
    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    fn target(&self) -> Option<Arc<dyn ErasedEntry>> {
        self.0.as_ref().and_then(Weak::upgrade)
    }

    /// Counted reference to the target; empty once the target is gone.
    pub(crate) fn resolve(&self) -> ObjectRef {
        self.target()
            .map_or_else(ObjectRef::empty, ObjectRef::from_erased)
    }

    /// Id of the target, recording the generation that guards it.
    pub(crate) fn id(&self, stamps: &mut Stamps) -> CoreResult<ObjectID> {
        let target = self.target().ok_or(CoreError::Unavailable)?;
        if let Some(owner) = target.owner() {
            stamps.record(&owner);
        }
        if target.is_released() {
            return Err(CoreError::Unavailable);
        }
        Ok(target.object_id())
    }
}

/// One relation column of a read collection.
pub(crate) enum RelationBuffer {
    /// Ids as handed over by the codec.
    Raw(Vec<ObjectID>),
    /// Ids replaced by links to live entries.
    Live(Vec<Link>),
}

/// Relation columns shared by every entry of one read collection.
pub(crate) struct SharedRelations {
    pub(crate) collection_id: CollectionId,
    pub(crate) buffers: Vec<RwLock<RelationBuffer>>,
}

/// One-to-many relation storage of an entry.
pub(crate) enum ToMany {
    /// Private growable lists, one per relation.
    Owned(Vec<Vec<Link>>),
    /// Windows into the collection-level buffers after a read.
    Shared {
        relations: Arc<SharedRelations>,
        ranges: Vec<RelationRange>,
    },
}

pub(crate) struct EntryBody<T: DataType> {
    pub(crate) data: T::Data,
    pub(crate) to_many: ToMany,
    pub(crate) to_one: Vec<Link>,
    pub(crate) members: Vec<Vec<T::Element>>,
}

impl<T: DataType> EntryBody<T> {
    pub(crate) fn new(data: T::Data) -> Self {
        Self {
            data,
            to_many: ToMany::Owned(T::TO_MANY.iter().map(|_| Vec::new()).collect()),
            to_one: T::TO_ONE.iter().map(|_| Link::default()).collect(),
            members: T::VECTOR_MEMBERS.iter().map(|_| Vec::new()).collect(),
        }
    }

    fn links(&self, relation: usize) -> CoreResult<Vec<Link>> {
        match &self.to_many {
            ToMany::Owned(lists) => Ok(lists[relation].clone()),
            ToMany::Shared { relations, ranges } => {
                match &*relations.buffers[relation].read() {
                    RelationBuffer::Raw(_) => Err(CoreError::UnresolvedReferences {
                        type_name: T::TYPE_NAME,
                        collection_id: relations.collection_id,
                    }),
                    RelationBuffer::Live(links) => {
                        let window = ranges[relation].checked(links.len())?;
                        Ok(links[window].to_vec())
                    }
                }
            }
        }
    }

    /// Live targets of one-to-many relation `relation`.
    ///
    /// Targets that no longer exist come back as empty references.
    pub(crate) fn related(&self, relation: usize) -> CoreResult<Vec<ObjectRef>> {
        Ok(self.links(relation)?.iter().map(Link::resolve).collect())
    }

    /// Number of targets in one-to-many relation `relation`.
    pub(crate) fn related_len(&self, relation: usize) -> usize {
        match &self.to_many {
            ToMany::Owned(lists) => lists[relation].len(),
            ToMany::Shared { ranges, .. } => ranges[relation].len(),
        }
    }

    /// Ids of the targets of `relation`, as they would be persisted.
    ///
    /// Floating targets show up as untracked ids.
    pub(crate) fn related_ids(
        &self,
        relation: usize,
        stamps: &mut Stamps,
    ) -> CoreResult<Vec<ObjectID>> {
        let ids_of = |links: &[Link], stamps: &mut Stamps| -> CoreResult<Vec<ObjectID>> {
            links.iter().map(|link| link.id(stamps)).collect()
        };
        match &self.to_many {
            ToMany::Owned(lists) => ids_of(&lists[relation], stamps),
            ToMany::Shared { relations, ranges } => {
                match &*relations.buffers[relation].read() {
                    RelationBuffer::Raw(ids) => {
                        let window = ranges[relation].checked(ids.len())?;
                        Ok(ids[window].to_vec())
                    }
                    RelationBuffer::Live(links) => {
                        let window = ranges[relation].checked(links.len())?;
                        ids_of(&links[window], stamps)
                    }
                }
            }
        }
    }

    /// Private relation lists, copying them out of the shared buffers
    /// on first mutation.
    pub(crate) fn owned_lists(&mut self) -> CoreResult<&mut Vec<Vec<Link>>> {
        if let ToMany::Shared { .. } = self.to_many {
            let lists = (0..T::TO_MANY.len())
                .map(|relation| self.links(relation))
                .collect::<CoreResult<Vec<_>>>()?;
            self.to_many = ToMany::Owned(lists);
        }
        match &mut self.to_many {
            ToMany::Owned(lists) => Ok(lists),
            ToMany::Shared { .. } => unreachable!("shared relations were copied above"),
        }
    }
}

pub(crate) struct EntryCell<T: DataType> {
    tracking: Mutex<Tracking>,
    body: RwLock<EntryBody<T>>,
}

impl<T: DataType> EntryCell<T> {
    /// A free-floating entry referenced by exactly one handle.
    pub(crate) fn floating(data: T::Data) -> Arc<Self> {
        Arc::new(Self {
            tracking: Mutex::new(Tracking {
                id: ObjectID::untracked(),
                untracked_refs: 1,
                released: false,
                owner: None,
            }),
            body: RwLock::new(EntryBody::new(data)),
        })
    }

    /// An entry owned by a collection from the start.
    pub(crate) fn tracked(id: ObjectID, body: EntryBody<T>, owner: Arc<Generation>) -> Arc<Self> {
        Arc::new(Self {
            tracking: Mutex::new(Tracking {
                id,
                untracked_refs: 0,
                released: false,
                owner: Some(owner),
            }),
            body: RwLock::new(body),
        })
    }

    pub(crate) fn object_id(&self) -> ObjectID {
        self.tracking.lock().id
    }

    pub(crate) fn is_released(&self) -> bool {
        self.tracking.lock().released
    }

    pub(crate) fn owner(&self) -> Option<Arc<Generation>> {
        self.tracking.lock().owner.clone()
    }

    pub(crate) fn untracked_refs(&self) -> Option<u32> {
        let tracking = self.tracking.lock();
        (tracking.id.is_untracked() && !tracking.released).then_some(tracking.untracked_refs)
    }

    pub(crate) fn acquire(&self) {
        let mut tracking = self.tracking.lock();
        if tracking.id.is_untracked() {
            tracking.untracked_refs += 1;
        }
    }

    pub(crate) fn release_ref(&self) {
        let mut tracking = self.tracking.lock();
        if tracking.id.is_untracked() {
            tracking.untracked_refs = tracking.untracked_refs.saturating_sub(1);
        }
    }

    /// Hands ownership to the collection behind `owner`, under `id`.
    pub(crate) fn adopt(&self, id: ObjectID, owner: Arc<Generation>) -> CoreResult<()> {
        let mut tracking = self.tracking.lock();
        if tracking.released {
            return Err(CoreError::Unavailable);
        }
        if !tracking.id.is_untracked() {
            return Err(CoreError::AlreadyTracked {
                id: tracking.id.to_string(),
            });
        }
        tracking.id = id;
        tracking.untracked_refs = 0;
        tracking.owner = Some(owner);
        Ok(())
    }

    /// Rewrites the id of a tracked entry when its collection is renumbered.
    pub(crate) fn reassign(&self, id: ObjectID) {
        self.tracking.lock().id = id;
    }

    pub(crate) fn read(&self) -> CoreResult<RwLockReadGuard<'_, EntryBody<T>>> {
        if self.is_released() {
            return Err(CoreError::Unavailable);
        }
        Ok(self.body.read())
    }

    /// Write access to the body.
    ///
    /// The owner's generation advances while the body is locked, so a
    /// flatten that stamped the old generation cannot have read the new
    /// body and vice versa.
    pub(crate) fn write(&self) -> CoreResult<RwLockWriteGuard<'_, EntryBody<T>>> {
        let body = self.body.write();
        let tracking = self.tracking.lock();
        if tracking.released {
            return Err(CoreError::Unavailable);
        }
        if let Some(owner) = &tracking.owner {
            owner.advance();
        }
        Ok(body)
    }

    /// Marks the entry dead and drops every link it holds.
    pub(crate) fn release(&self) {
        self.tracking.lock().released = true;
        let mut body = self.body.write();
        body.to_many = ToMany::Owned(Vec::new());
        body.to_one.clear();
    }
}

/// Type-erased view of an entry, used by relation slots that may point
/// into any collection.
pub(crate) trait ErasedEntry: Send + Sync {
    fn object_id(&self) -> ObjectID;
    fn is_released(&self) -> bool;
    fn owner(&self) -> Option<Arc<Generation>>;
    fn acquire(&self);
    fn release_ref(&self);
    fn type_name(&self) -> &'static str;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: DataType> ErasedEntry for EntryCell<T> {
    fn object_id(&self) -> ObjectID {
        EntryCell::object_id(self)
    }

    fn is_released(&self) -> bool {
        EntryCell::is_released(self)
    }

    fn owner(&self) -> Option<Arc<Generation>> {
        EntryCell::owner(self)
    }

    fn acquire(&self) {
        EntryCell::acquire(self);
    }

    fn release_ref(&self) {
        EntryCell::release_ref(self);
    }

    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
