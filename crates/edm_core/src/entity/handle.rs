//! Handles: the only thing user and generated code manipulate directly.

use crate::collection::DataType;
use crate::entity::entry::{EntryCell, ErasedEntry, Link};
use crate::error::{CoreError, CoreResult};
use crate::types::ObjectID;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

fn check_index(index: usize, len: usize) -> CoreResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(CoreError::index_out_of_range(index, len))
    }
}

/// Read-only reference to an entry of data type `T`.
///
/// Handles are cheap to clone. Equality compares entry identity, never
/// payload contents. A handle can be empty or unlinked, in which case
/// every accessor fails with [`CoreError::Unavailable`].
pub struct Handle<T: DataType> {
    entry: Option<Arc<EntryCell<T>>>,
}

impl<T: DataType> Handle<T> {
    /// Creates a handle that references nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self { entry: None }
    }

    /// Wraps an entry, counting this handle.
    pub(crate) fn from_entry(entry: Arc<EntryCell<T>>) -> Self {
        entry.acquire();
        Self { entry: Some(entry) }
    }

    pub(crate) fn entry(&self) -> CoreResult<&Arc<EntryCell<T>>> {
        match &self.entry {
            Some(entry) if !entry.is_released() => Ok(entry),
            _ => Err(CoreError::Unavailable),
        }
    }

    /// Returns true if the handle references a live entry.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.entry.as_ref().is_some_and(|entry| !entry.is_released())
    }

    /// The object's identifier; untracked while it is free-floating.
    pub fn id(&self) -> CoreResult<ObjectID> {
        Ok(self.entry()?.object_id())
    }

    /// Returns true if a collection owns the referenced entry.
    #[must_use]
    pub fn is_tracked(&self) -> bool {
        self.id().is_ok_and(|id| !id.is_untracked())
    }

    /// Number of live handles to a free-floating entry.
    ///
    /// `None` once a collection owns the entry, since counting stops there.
    #[must_use]
    pub fn untracked_ref_count(&self) -> Option<u32> {
        self.entry.as_ref().and_then(|entry| entry.untracked_refs())
    }

    /// Copy of the payload.
    pub fn data(&self) -> CoreResult<T::Data> {
        self.read(Clone::clone)
    }

    /// Runs `f` on the payload without copying it.
    pub fn read<R>(&self, f: impl FnOnce(&T::Data) -> R) -> CoreResult<R> {
        let body = self.entry()?.read()?;
        Ok(f(&body.data))
    }

    /// Targets of one-to-many relation `relation`, in insertion order.
    pub fn related(&self, relation: usize) -> CoreResult<Vec<ObjectRef>> {
        check_index(relation, T::TO_MANY.len())?;
        self.entry()?.read()?.related(relation)
    }

    /// Targets of one-to-many relation `relation` as typed handles.
    pub fn related_as<U: DataType>(&self, relation: usize) -> CoreResult<Vec<Handle<U>>> {
        self.related(relation)?
            .iter()
            .map(ObjectRef::downcast::<U>)
            .collect()
    }

    /// Number of targets in one-to-many relation `relation`.
    pub fn related_len(&self, relation: usize) -> CoreResult<usize> {
        check_index(relation, T::TO_MANY.len())?;
        Ok(self.entry()?.read()?.related_len(relation))
    }

    /// Target of one-to-one relation `relation`, if set.
    pub fn single(&self, relation: usize) -> CoreResult<Option<ObjectRef>> {
        check_index(relation, T::TO_ONE.len())?;
        let body = self.entry()?.read()?;
        let slot = &body.to_one[relation];
        Ok((!slot.is_empty()).then(|| slot.resolve()))
    }

    /// Target of one-to-one relation `relation` as a typed handle.
    pub fn single_as<U: DataType>(&self, relation: usize) -> CoreResult<Option<Handle<U>>> {
        self.single(relation)?
            .map(|target| target.downcast::<U>())
            .transpose()
    }

    /// Elements of vector member `member`.
    pub fn members(&self, member: usize) -> CoreResult<Vec<T::Element>> {
        check_index(member, T::VECTOR_MEMBERS.len())?;
        Ok(self.entry()?.read()?.members[member].clone())
    }

    /// Drops this handle's reference without touching other handles.
    pub fn unlink(&mut self) {
        if let Some(entry) = self.entry.take() {
            entry.release_ref();
        }
    }

    /// Type-erased copy of this handle.
    #[must_use]
    pub fn erase(&self) -> ObjectRef {
        match &self.entry {
            Some(entry) => ObjectRef::from_erased(Arc::clone(entry) as Arc<dyn ErasedEntry>),
            None => ObjectRef::empty(),
        }
    }

    fn addr(&self) -> *const () {
        self.entry
            .as_ref()
            .map_or(std::ptr::null(), |entry| Arc::as_ptr(entry).cast::<()>())
    }
}

impl<T: DataType> Clone for Handle<T> {
    fn clone(&self) -> Self {
        match &self.entry {
            Some(entry) => Self::from_entry(Arc::clone(entry)),
            None => Self::empty(),
        }
    }
}

impl<T: DataType> Drop for Handle<T> {
    fn drop(&mut self) {
        self.unlink();
    }
}

impl<T: DataType> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl<T: DataType> Eq for Handle<T> {}

impl<T: DataType> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl<T: DataType> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Ok(id) => write!(f, "Handle<{}>({id})", T::TYPE_NAME),
            Err(_) => write!(f, "Handle<{}>(unavailable)", T::TYPE_NAME),
        }
    }
}

/// Read-write reference to an entry of data type `T`.
///
/// Dereferences to [`Handle`] for all read accessors. A mutable handle
/// converts into a read-only one, never the reverse.
pub struct MutableHandle<T: DataType> {
    handle: Handle<T>,
}

impl<T: DataType> MutableHandle<T> {
    /// Allocates a free-floating entry holding `data`.
    #[must_use]
    pub fn new(data: T::Data) -> Self {
        Self {
            handle: Handle {
                entry: Some(EntryCell::floating(data)),
            },
        }
    }

    pub(crate) fn from_entry(entry: Arc<EntryCell<T>>) -> Self {
        Self {
            handle: Handle::from_entry(entry),
        }
    }

    /// Read-only view of this handle.
    #[must_use]
    pub fn as_handle(&self) -> &Handle<T> {
        &self.handle
    }

    /// Converts into a read-only handle.
    #[must_use]
    pub fn into_handle(self) -> Handle<T> {
        self.handle
    }

    /// Replaces the payload.
    pub fn set(&self, data: T::Data) -> CoreResult<()> {
        self.update(|current| *current = data)
    }

    /// Runs `f` on the payload with write access.
    pub fn update<R>(&self, f: impl FnOnce(&mut T::Data) -> R) -> CoreResult<R> {
        let mut body = self.handle.entry()?.write()?;
        Ok(f(&mut body.data))
    }

    /// Appends `target` to one-to-many relation `relation`.
    ///
    /// The relation does not keep `target` alive and does not count as a
    /// handle to it.
    ///
    /// # Errors
    ///
    /// `Unavailable` if either side is empty, `TypeMismatch` if the
    /// target's data type is not the declared one.
    pub fn add_related(&self, relation: usize, target: impl Into<ObjectRef>) -> CoreResult<()> {
        check_index(relation, T::TO_MANY.len())?;
        let target = target.into();
        check_target(&target, T::TO_MANY[relation].target)?;
        let mut body = self.handle.entry()?.write()?;
        body.owned_lists()?[relation].push(Link::to(&target));
        Ok(())
    }

    /// Removes every target of one-to-many relation `relation`.
    pub fn clear_related(&self, relation: usize) -> CoreResult<()> {
        check_index(relation, T::TO_MANY.len())?;
        let mut body = self.handle.entry()?.write()?;
        body.owned_lists()?[relation].clear();
        Ok(())
    }

    /// Sets one-to-one relation `relation`; an empty reference clears it.
    pub fn set_single(&self, relation: usize, target: impl Into<ObjectRef>) -> CoreResult<()> {
        check_index(relation, T::TO_ONE.len())?;
        let target = target.into();
        if !target.is_empty() {
            check_target(&target, T::TO_ONE[relation].target)?;
        }
        self.handle.entry()?.write()?.to_one[relation] = Link::to(&target);
        Ok(())
    }

    /// Appends one element to vector member `member`.
    pub fn push_member(&self, member: usize, value: T::Element) -> CoreResult<()> {
        check_index(member, T::VECTOR_MEMBERS.len())?;
        self.handle.entry()?.write()?.members[member].push(value);
        Ok(())
    }

    /// Replaces all elements of vector member `member`.
    pub fn set_members(&self, member: usize, values: Vec<T::Element>) -> CoreResult<()> {
        check_index(member, T::VECTOR_MEMBERS.len())?;
        self.handle.entry()?.write()?.members[member] = values;
        Ok(())
    }
}

fn check_target(target: &ObjectRef, expected: &'static str) -> CoreResult<()> {
    let found = target.type_name().ok_or(CoreError::Unavailable)?;
    if !target.is_available() {
        return Err(CoreError::Unavailable);
    }
    if found != expected {
        return Err(CoreError::type_mismatch(expected, found));
    }
    Ok(())
}

impl<T: DataType> Default for MutableHandle<T> {
    fn default() -> Self {
        Self::new(T::Data::default())
    }
}

impl<T: DataType> Clone for MutableHandle<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl<T: DataType> Deref for MutableHandle<T> {
    type Target = Handle<T>;

    fn deref(&self) -> &Handle<T> {
        &self.handle
    }
}

impl<T: DataType> PartialEq for MutableHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<T: DataType> Eq for MutableHandle<T> {}

impl<T: DataType> PartialEq<Handle<T>> for MutableHandle<T> {
    fn eq(&self, other: &Handle<T>) -> bool {
        &self.handle == other
    }
}

impl<T: DataType> Hash for MutableHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl<T: DataType> fmt::Debug for MutableHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mutable{:?}", self.handle)
    }
}

impl<T: DataType> From<MutableHandle<T>> for Handle<T> {
    fn from(handle: MutableHandle<T>) -> Self {
        handle.into_handle()
    }
}

/// Type-erased handle returned by relation accessors.
///
/// Points at an entry of any data type; [`ObjectRef::downcast`] recovers
/// the typed handle.
pub struct ObjectRef {
    entry: Option<Arc<dyn ErasedEntry>>,
}

impl ObjectRef {
    /// Creates a reference to nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self { entry: None }
    }

    pub(crate) fn from_erased(entry: Arc<dyn ErasedEntry>) -> Self {
        entry.acquire();
        Self { entry: Some(entry) }
    }

    pub(crate) fn erased(&self) -> Option<&Arc<dyn ErasedEntry>> {
        self.entry.as_ref()
    }

    /// Returns true if this reference was never set or has been unlinked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    /// Returns true if the reference points at a live entry.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.entry.as_ref().is_some_and(|entry| !entry.is_released())
    }

    /// The target's identifier.
    pub fn id(&self) -> CoreResult<ObjectID> {
        match &self.entry {
            Some(entry) if !entry.is_released() => Ok(entry.object_id()),
            _ => Err(CoreError::Unavailable),
        }
    }

    /// Data type of the target.
    #[must_use]
    pub fn type_name(&self) -> Option<&'static str> {
        self.entry.as_ref().map(|entry| entry.type_name())
    }

    /// Recovers a read-only typed handle.
    ///
    /// # Errors
    ///
    /// `Unavailable` if empty, `TypeMismatch` if the target is not a `T`.
    pub fn downcast<T: DataType>(&self) -> CoreResult<Handle<T>> {
        self.downcast_entry::<T>().map(Handle::from_entry)
    }

    /// Recovers a mutable typed handle.
    pub fn downcast_mut<T: DataType>(&self) -> CoreResult<MutableHandle<T>> {
        self.downcast_entry::<T>().map(MutableHandle::from_entry)
    }

    pub(crate) fn downcast_entry<T: DataType>(&self) -> CoreResult<Arc<EntryCell<T>>> {
        let entry = self.entry.as_ref().ok_or(CoreError::Unavailable)?;
        let found = entry.type_name();
        Arc::clone(entry)
            .into_any()
            .downcast::<EntryCell<T>>()
            .map_err(|_| CoreError::type_mismatch(T::TYPE_NAME, found))
    }

    /// Drops this reference without touching other handles.
    pub fn unlink(&mut self) {
        if let Some(entry) = self.entry.take() {
            entry.release_ref();
        }
    }

    fn addr(&self) -> *const () {
        self.entry
            .as_ref()
            .map_or(std::ptr::null(), |entry| Arc::as_ptr(entry).cast::<()>())
    }
}

impl Default for ObjectRef {
    fn default() -> Self {
        Self::empty()
    }
}

impl Clone for ObjectRef {
    fn clone(&self) -> Self {
        match &self.entry {
            Some(entry) => Self::from_erased(Arc::clone(entry)),
            None => Self::empty(),
        }
    }
}

impl Drop for ObjectRef {
    fn drop(&mut self) {
        self.unlink();
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for ObjectRef {}

impl<T: DataType> PartialEq<Handle<T>> for ObjectRef {
    fn eq(&self, other: &Handle<T>) -> bool {
        self.addr() == other.addr()
    }
}

impl Hash for ObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.type_name(), self.id()) {
            (Some(type_name), Ok(id)) => write!(f, "ObjectRef<{type_name}>({id})"),
            _ => f.write_str("ObjectRef(unavailable)"),
        }
    }
}

impl<T: DataType> From<&Handle<T>> for ObjectRef {
    fn from(handle: &Handle<T>) -> Self {
        handle.erase()
    }
}

impl<T: DataType> From<Handle<T>> for ObjectRef {
    fn from(handle: Handle<T>) -> Self {
        handle.erase()
    }
}

impl<T: DataType> From<&MutableHandle<T>> for ObjectRef {
    fn from(handle: &MutableHandle<T>) -> Self {
        handle.erase()
    }
}

impl<T: DataType> From<MutableHandle<T>> for ObjectRef {
    fn from(handle: MutableHandle<T>) -> Self {
        handle.erase()
    }
}
