//! Typed collection: the arena owning every entry of one data type.
//!
//! A collection is either *normal*, owning its entries, or a *subset*,
//! referencing entries owned by other collections. It converts to flat
//! buffers once per generation through [`Collection::prepare_for_write`]
//! and is rebuilt from buffers by [`Collection::from_read_buffers`],
//! after which [`Collection::set_references`] turns stored ids back into
//! live references.

use crate::collection::buffers::{ReadBuffers, WriteBuffers};
use crate::collection::data_type::{DataType, Record, RecordLayout};
use crate::collection::erased::ErasedCollection;
use crate::column::{RawBytes, RelationRange};
use crate::config::Config;
use crate::entity::{
    EntryBody, EntryCell, ErasedEntry, Generation, Handle, Link, MutableHandle, ObjectRef,
    RelationBuffer, SharedRelations, Stamps, ToMany,
};
use crate::error::{CoreError, CoreResult};
use crate::resolver::{resolve_object, ReferenceResolver};
use crate::types::{CollectionId, ObjectID};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

enum Storage<T: DataType> {
    Owned(Vec<Arc<EntryCell<T>>>),
    Subset(RwLock<Vec<SubsetSlot<T>>>),
}

enum SubsetSlot<T: DataType> {
    /// Id read from storage, not yet resolved.
    Pending(ObjectID),
    Linked(Arc<EntryCell<T>>),
}

/// Ids handed over by a codec that wait for `set_references`.
struct ReadState {
    relations: Option<Arc<SharedRelations>>,
    to_one: Vec<Vec<ObjectID>>,
    resolved: bool,
}

/// Cached buffers and the generations they were built from.
struct Materialized {
    stamps: Stamps,
    buffers: Arc<WriteBuffers>,
}

/// The arena that owns all entries of data type `T`.
///
/// Structural changes (`create`, `push_back`, `clear`, mode switches)
/// take `&mut self`. Payload and relation changes go through the handles
/// returned by [`Collection::get_mut`] and [`Collection::create`].
///
/// Flat buffers are materialized at most once per generation. Any
/// change, whether structural, made through a handle, or made to a
/// collection holding relation targets, starts a new generation and
/// the next [`Collection::prepare_for_write`] flattens again.
pub struct Collection<T: DataType> {
    collection_id: CollectionId,
    config: Config,
    storage: Storage<T>,
    generation: Arc<Generation>,
    materialized: Mutex<Option<Materialized>>,
    read_state: Mutex<Option<ReadState>>,
}

impl<T: DataType> Collection<T> {
    /// Creates an empty normal collection.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty normal collection with `config`.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            collection_id: CollectionId::INVALID,
            storage: Storage::Owned(Vec::with_capacity(config.initial_capacity)),
            config,
            generation: Arc::default(),
            materialized: Mutex::new(None),
            read_state: Mutex::new(None),
        }
    }

    /// Creates an empty subset collection.
    #[must_use]
    pub fn new_subset() -> Self {
        let mut collection = Self::new();
        collection.storage = Storage::Subset(RwLock::new(Vec::new()));
        collection
    }

    /// Persisted type name of the elements.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    /// Id of this collection in its frame.
    #[must_use]
    pub fn collection_id(&self) -> CollectionId {
        self.collection_id
    }

    /// Assigns the collection id and renumbers every owned entry.
    pub fn set_collection_id(&mut self, id: CollectionId) {
        self.collection_id = id;
        if let Storage::Owned(entries) = &self.storage {
            for (index, entry) in entries.iter().enumerate() {
                entry.reassign(ObjectID::at(index, id));
            }
        }
        self.touch();
    }

    /// Starts a new generation after a change through `&mut self`.
    fn touch(&mut self) {
        self.generation.advance();
        *self.materialized.get_mut() = None;
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Owned(entries) => entries.len(),
            Storage::Subset(slots) => slots.read().len(),
        }
    }

    /// Returns true if the collection holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this collection only references objects owned elsewhere.
    #[must_use]
    pub fn is_subset_collection(&self) -> bool {
        matches!(self.storage, Storage::Subset(_))
    }

    /// Switches between normal and subset mode.
    ///
    /// # Errors
    ///
    /// `InvalidModeSwitch` if the mode changes while the collection is
    /// not empty.
    pub fn set_subset_collection(&mut self, subset: bool) -> CoreResult<()> {
        if subset == self.is_subset_collection() {
            return Ok(());
        }
        let len = self.len();
        if len > 0 {
            return Err(CoreError::InvalidModeSwitch {
                len,
                target: if subset { "subset" } else { "normal" },
            });
        }
        self.storage = if subset {
            Storage::Subset(RwLock::new(Vec::new()))
        } else {
            Storage::Owned(Vec::with_capacity(self.config.initial_capacity))
        };
        self.touch();
        *self.read_state.get_mut() = None;
        Ok(())
    }

    /// Appends a new object with default payload.
    ///
    /// # Errors
    ///
    /// `InvalidOnSubset` on a subset collection.
    pub fn create(&mut self) -> CoreResult<MutableHandle<T>> {
        self.create_with(T::Data::default())
    }

    /// Appends a new object with payload `data`.
    ///
    /// # Errors
    ///
    /// `InvalidOnSubset` on a subset collection.
    pub fn create_with(&mut self, data: T::Data) -> CoreResult<MutableHandle<T>> {
        let Storage::Owned(entries) = &mut self.storage else {
            return Err(CoreError::InvalidOnSubset {
                operation: "create",
            });
        };
        let id = ObjectID::at(entries.len(), self.collection_id);
        let entry = EntryCell::tracked(id, EntryBody::new(data), Arc::clone(&self.generation));
        entries.push(Arc::clone(&entry));
        self.touch();
        Ok(MutableHandle::from_entry(entry))
    }

    /// Adopts an object.
    ///
    /// A normal collection takes ownership of a free-floating object. A
    /// subset collection records a reference to an object owned elsewhere.
    ///
    /// # Errors
    ///
    /// - `Unavailable` if the handle is empty or released
    /// - `AlreadyTracked` if a normal collection is handed a tracked object
    /// - `RequiresTrackedObject` if a subset collection is handed a
    ///   free-floating object
    pub fn push_back(&mut self, handle: &Handle<T>) -> CoreResult<()> {
        let entry = handle.entry()?;
        match &mut self.storage {
            Storage::Owned(entries) => {
                entry.adopt(
                    ObjectID::at(entries.len(), self.collection_id),
                    Arc::clone(&self.generation),
                )?;
                entries.push(Arc::clone(entry));
            }
            Storage::Subset(slots) => {
                if entry.object_id().is_untracked() {
                    return Err(CoreError::RequiresTrackedObject);
                }
                slots.get_mut().push(SubsetSlot::Linked(Arc::clone(entry)));
            }
        }
        self.touch();
        Ok(())
    }

    /// Read-only handle to the object at `index`.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` past the end, `UnresolvedReferences` for a
    /// subset slot read from storage and not resolved yet.
    pub fn get(&self, index: usize) -> CoreResult<Handle<T>> {
        self.entry_at(index).map(Handle::from_entry)
    }

    /// Mutable handle to the object at `index`.
    ///
    /// On a subset collection the handle aliases the owning collection's
    /// entry.
    pub fn get_mut(&self, index: usize) -> CoreResult<MutableHandle<T>> {
        self.entry_at(index).map(MutableHandle::from_entry)
    }

    /// Iterates over handles in insertion order.
    ///
    /// Unresolved subset slots yield empty handles.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            collection: self,
            next: 0,
            end: self.len(),
        }
    }

    /// Snapshot of every handle, in insertion order.
    ///
    /// # Errors
    ///
    /// `UnresolvedReferences` if a subset slot is still unresolved.
    pub fn handles(&self) -> CoreResult<Vec<Handle<T>>> {
        (0..self.len()).map(|index| self.get(index)).collect()
    }

    /// Releases every owned object and resets all buffers.
    ///
    /// Relations held by the released objects are unlinked first, so
    /// collections related to this one may be cleared in any order.
    /// Handles that still point at a released object turn unavailable.
    pub fn clear(&mut self) {
        let released = match &mut self.storage {
            Storage::Owned(entries) => {
                let released = entries.len();
                for entry in entries.drain(..) {
                    entry.release();
                }
                released
            }
            Storage::Subset(slots) => {
                slots.get_mut().clear();
                0
            }
        };
        if let Some(relations) = self
            .read_state
            .get_mut()
            .take()
            .and_then(|state| state.relations)
        {
            for buffer in &relations.buffers {
                *buffer.write() = RelationBuffer::Raw(Vec::new());
            }
        }
        self.touch();
        if released > 0 {
            debug!(type_name = T::TYPE_NAME, collection_id = %self.collection_id, released, "cleared collection");
        }
    }

    /// Builds the flat buffers without touching the cache.
    ///
    /// # Errors
    ///
    /// - `UnpersistableReference` if a relation targets a free-floating object
    /// - `Unavailable` if an entry or relation target was released
    ///
    /// Nothing is modified on failure.
    pub fn flatten(&self) -> CoreResult<WriteBuffers> {
        self.flatten_tracked(&mut Stamps::default())
    }

    /// Flattens while recording every generation the result depends on.
    fn flatten_tracked(&self, stamps: &mut Stamps) -> CoreResult<WriteBuffers> {
        stamps.record(&self.generation);
        let layout = RecordLayout::of::<T>();
        match &self.storage {
            Storage::Subset(slots) => {
                let ids = slots
                    .read()
                    .iter()
                    .map(|slot| match slot {
                        SubsetSlot::Pending(id) => Ok(*id),
                        SubsetSlot::Linked(entry) => {
                            if let Some(owner) = entry.owner() {
                                stamps.record(&owner);
                            }
                            if entry.is_released() {
                                return Err(CoreError::Unavailable);
                            }
                            Ok(entry.object_id())
                        }
                    })
                    .collect::<CoreResult<Vec<_>>>()?;
                Ok(WriteBuffers {
                    type_name: T::TYPE_NAME.to_owned(),
                    subset: true,
                    record_array: RawBytes::empty(layout.stride()),
                    relation_id_arrays: vec![RawBytes::encode(&ids)],
                    vector_member_arrays: Vec::new(),
                })
            }
            Storage::Owned(entries) => self.flatten_owned(entries, layout, stamps),
        }
    }

    fn flatten_owned(
        &self,
        entries: &[Arc<EntryCell<T>>],
        layout: RecordLayout,
        stamps: &mut Stamps,
    ) -> CoreResult<WriteBuffers> {
        // One-to-one slots of a read collection stay empty until resolution.
        let pending_to_one = self
            .read_state
            .lock()
            .as_ref()
            .filter(|state| !state.resolved)
            .map(|state| state.to_one.clone());

        let mut records = Vec::with_capacity(entries.len());
        let mut many_ids: Vec<Vec<ObjectID>> = vec![Vec::new(); layout.to_many];
        let mut one_ids: Vec<Vec<ObjectID>> = vec![Vec::with_capacity(entries.len()); layout.to_one];
        let mut members: Vec<Vec<T::Element>> = vec![Vec::new(); layout.vector_members];

        for (index, entry) in entries.iter().enumerate() {
            let body = entry.read()?;
            let mut ranges = Vec::with_capacity(layout.ranges());

            for (relation, descriptor) in T::TO_MANY.iter().enumerate() {
                let targets = body.related_ids(relation, stamps)?;
                if targets.iter().any(ObjectID::is_untracked) {
                    return Err(unpersistable::<T>(index, descriptor.name));
                }
                let buffer = &mut many_ids[relation];
                let begin = offset(buffer.len())?;
                buffer.extend(targets);
                ranges.push(RelationRange::new(begin, offset(buffer.len())?));
            }

            for (member, values) in body.members.iter().enumerate() {
                let buffer = &mut members[member];
                let begin = offset(buffer.len())?;
                buffer.extend_from_slice(values);
                ranges.push(RelationRange::new(begin, offset(buffer.len())?));
            }

            for (relation, descriptor) in T::TO_ONE.iter().enumerate() {
                let slot = &body.to_one[relation];
                let id = if slot.is_empty() {
                    pending_to_one
                        .as_ref()
                        .and_then(|pending| pending[relation].get(index).copied())
                        .unwrap_or_else(ObjectID::untracked)
                } else {
                    let id = slot.id(stamps)?;
                    if id.is_untracked() {
                        return Err(unpersistable::<T>(index, descriptor.name));
                    }
                    id
                };
                one_ids[relation].push(id);
            }

            records.push(Record {
                data: body.data.clone(),
                ranges,
            });
        }

        Ok(WriteBuffers {
            type_name: T::TYPE_NAME.to_owned(),
            subset: false,
            record_array: Record::encode_all(&records, layout),
            relation_id_arrays: many_ids
                .iter()
                .chain(one_ids.iter())
                .map(|ids| RawBytes::encode(ids))
                .collect(),
            vector_member_arrays: members.iter().map(|values| RawBytes::encode(values)).collect(),
        })
    }

    /// Materializes the flat buffers once and returns them.
    ///
    /// Concurrent callers serialize on the materialization step and all
    /// observe the same buffers. Later calls return the cached buffers
    /// until this collection, one of its entries, or a collection owning
    /// one of its relation targets changes.
    ///
    /// # Errors
    ///
    /// See [`Collection::flatten`]. A failed call caches nothing.
    pub fn prepare_for_write(&self) -> CoreResult<Arc<WriteBuffers>> {
        let mut materialized = self.materialized.lock();
        if let Some(cached) = materialized.as_ref() {
            if cached.stamps.is_current() {
                trace!(type_name = T::TYPE_NAME, collection_id = %self.collection_id, "reusing materialized buffers");
                return Ok(Arc::clone(&cached.buffers));
            }
            trace!(type_name = T::TYPE_NAME, collection_id = %self.collection_id, "materialized buffers are stale");
            *materialized = None;
        }
        let mut stamps = Stamps::default();
        let buffers = Arc::new(self.flatten_tracked(&mut stamps).inspect_err(|err| {
            warn!(type_name = T::TYPE_NAME, collection_id = %self.collection_id, error = %err, "cannot flatten collection");
        })?);
        debug!(
            type_name = T::TYPE_NAME,
            collection_id = %self.collection_id,
            len = buffers.len(),
            subset = buffers.subset,
            "materialized collection buffers"
        );
        *materialized = Some(Materialized {
            stamps,
            buffers: Arc::clone(&buffers),
        });
        Ok(buffers)
    }

    /// Whether materialized buffers exist and are still current.
    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.materialized
            .lock()
            .as_ref()
            .is_some_and(|cached| cached.stamps.is_current())
    }

    /// Rebuilds a collection from buffers filled by a codec.
    ///
    /// Every object gets the id `{index: position, collection_id}`.
    /// Relations stay raw ids until [`Collection::set_references`] runs.
    ///
    /// # Errors
    ///
    /// - `TypeMismatch` if the buffers belong to another data type
    /// - `CorruptBuffer` if the buffers do not match the layout of `T`,
    ///   or, with `verify_on_read`, the ranges do not partition the
    ///   relation and member buffers
    pub fn from_read_buffers(
        buffers: &ReadBuffers,
        collection_id: CollectionId,
        config: &Config,
    ) -> CoreResult<Self> {
        buffers.expect_type::<T>()?;
        let generation = Arc::new(Generation::default());
        let (storage, state) = if buffers.subset {
            read_subset::<T>(buffers)?
        } else {
            read_owned::<T>(buffers, collection_id, config, &generation)?
        };
        let collection = Self {
            collection_id,
            config: config.clone(),
            storage,
            generation,
            materialized: Mutex::new(None),
            read_state: Mutex::new(Some(state)),
        };
        debug!(
            type_name = T::TYPE_NAME,
            %collection_id,
            len = collection.len(),
            subset = buffers.subset,
            "reconstructed collection"
        );
        Ok(collection)
    }

    /// Replaces every stored id with a live reference.
    ///
    /// Must run after every collection reachable through `resolver` has
    /// been rebuilt. Every id is looked up before anything is replaced,
    /// so a failure leaves the collection unresolved. Calling it again
    /// after success does nothing. Collections built in memory have
    /// nothing to resolve.
    ///
    /// # Errors
    ///
    /// - `DanglingReference` if an id names a collection the resolver lacks
    /// - `IndexOutOfRange` if an id is past the end of its collection
    /// - `TypeMismatch` if a target has another data type than declared
    /// - `CorruptBuffer` if a one-to-many or subset id is untracked
    ///
    /// Each of these means the data read is corrupt.
    pub fn set_references(&self, resolver: &dyn ReferenceResolver) -> CoreResult<()> {
        let mut guard = self.read_state.lock();
        let Some(state) = guard.as_mut() else {
            return Ok(());
        };
        if state.resolved {
            return Ok(());
        }

        let mut resolved = 0usize;
        match &self.storage {
            Storage::Subset(slots) => {
                let linked = slots
                    .read()
                    .iter()
                    .map(|slot| -> CoreResult<Arc<EntryCell<T>>> {
                        match slot {
                            SubsetSlot::Pending(id) => {
                                resolved += 1;
                                resolve_required::<T>(resolver, *id, T::TYPE_NAME)?.downcast_entry::<T>()
                            }
                            SubsetSlot::Linked(entry) => Ok(Arc::clone(entry)),
                        }
                    })
                    .collect::<CoreResult<Vec<_>>>()?;
                *slots.write() = linked.into_iter().map(SubsetSlot::Linked).collect();
            }
            Storage::Owned(entries) => {
                let mut live = Vec::new();
                if let Some(relations) = &state.relations {
                    for (buffer, descriptor) in relations.buffers.iter().zip(T::TO_MANY) {
                        let links = match &*buffer.read() {
                            RelationBuffer::Raw(ids) => Some(
                                ids.iter()
                                    .map(|id| {
                                        resolve_required::<T>(resolver, *id, descriptor.target)
                                            .map(|target| Link::to(&target))
                                    })
                                    .collect::<CoreResult<Vec<_>>>()?,
                            ),
                            RelationBuffer::Live(_) => None,
                        };
                        resolved += links.as_ref().map_or(0, Vec::len);
                        live.push(links);
                    }
                }
                let singles = state
                    .to_one
                    .iter()
                    .zip(T::TO_ONE)
                    .map(|(ids, descriptor)| {
                        ids.iter()
                            .map(|id| resolve_optional(resolver, *id, descriptor.target))
                            .collect::<CoreResult<Vec<_>>>()
                    })
                    .collect::<CoreResult<Vec<_>>>()?;

                if let Some(relations) = &state.relations {
                    for (buffer, links) in relations.buffers.iter().zip(live) {
                        if let Some(links) = links {
                            *buffer.write() = RelationBuffer::Live(links);
                        }
                    }
                }
                for (relation, targets) in singles.into_iter().enumerate() {
                    for (entry, target) in entries.iter().zip(targets) {
                        resolved += usize::from(!target.is_empty());
                        entry.write()?.to_one[relation] = Link::to(&target);
                    }
                }
            }
        }

        self.generation.advance();
        state.resolved = true;
        state.to_one = Vec::new();
        debug!(type_name = T::TYPE_NAME, collection_id = %self.collection_id, resolved, "resolved references");
        Ok(())
    }

    /// Whether stored ids still wait for [`Collection::set_references`].
    #[must_use]
    pub fn has_unresolved_references(&self) -> bool {
        self.read_state
            .lock()
            .as_ref()
            .is_some_and(|state| !state.resolved)
    }

    fn entry_at(&self, index: usize) -> CoreResult<Arc<EntryCell<T>>> {
        match &self.storage {
            Storage::Owned(entries) => entries
                .get(index)
                .cloned()
                .ok_or_else(|| CoreError::index_out_of_range(index, entries.len())),
            Storage::Subset(slots) => {
                let slots = slots.read();
                match slots.get(index) {
                    None => Err(CoreError::index_out_of_range(index, slots.len())),
                    Some(SubsetSlot::Linked(entry)) => Ok(Arc::clone(entry)),
                    Some(SubsetSlot::Pending(_)) => Err(CoreError::UnresolvedReferences {
                        type_name: T::TYPE_NAME,
                        collection_id: self.collection_id,
                    }),
                }
            }
        }
    }
}

fn read_subset<T: DataType>(buffers: &ReadBuffers) -> CoreResult<(Storage<T>, ReadState)> {
    let [ids] = buffers.relation_id_arrays.as_slice() else {
        return Err(CoreError::corrupt_buffer(format!(
            "subset collection of {} carries {} id arrays",
            T::TYPE_NAME,
            buffers.relation_id_arrays.len()
        )));
    };
    let ids = ids.decode::<ObjectID>()?;
    let slots = ids.into_iter().map(SubsetSlot::Pending).collect();
    let state = ReadState {
        relations: None,
        to_one: Vec::new(),
        resolved: false,
    };
    Ok((Storage::Subset(RwLock::new(slots)), state))
}

fn read_owned<T: DataType>(
    buffers: &ReadBuffers,
    collection_id: CollectionId,
    config: &Config,
    generation: &Arc<Generation>,
) -> CoreResult<(Storage<T>, ReadState)> {
    let layout = RecordLayout::of::<T>();
    if buffers.relation_id_arrays.len() != layout.relation_arrays() {
        return Err(CoreError::corrupt_buffer(format!(
            "{} expects {} relation id arrays, got {}",
            T::TYPE_NAME,
            layout.relation_arrays(),
            buffers.relation_id_arrays.len()
        )));
    }
    if buffers.vector_member_arrays.len() != layout.vector_members {
        return Err(CoreError::corrupt_buffer(format!(
            "{} expects {} vector member arrays, got {}",
            T::TYPE_NAME,
            layout.vector_members,
            buffers.vector_member_arrays.len()
        )));
    }

    let records = Record::<T::Data>::decode_all(&buffers.record_array, layout)?;
    let (many_arrays, one_arrays) = buffers.relation_id_arrays.split_at(layout.to_many);
    let to_many = many_arrays
        .iter()
        .map(|raw| raw.decode::<ObjectID>())
        .collect::<CoreResult<Vec<_>>>()?;
    let to_one = one_arrays
        .iter()
        .map(|raw| raw.decode::<ObjectID>())
        .collect::<CoreResult<Vec<_>>>()?;
    if let Some(ids) = to_one.iter().find(|ids| ids.len() != records.len()) {
        return Err(CoreError::corrupt_buffer(format!(
            "one-to-one array of {} holds {} ids for {} records",
            T::TYPE_NAME,
            ids.len(),
            records.len()
        )));
    }
    let members = buffers
        .vector_member_arrays
        .iter()
        .map(|raw| raw.decode::<T::Element>())
        .collect::<CoreResult<Vec<_>>>()?;

    if config.verify_on_read {
        for (column, ids) in to_many.iter().enumerate() {
            verify_partition::<T>(&records, column, ids.len())?;
        }
        for (member, values) in members.iter().enumerate() {
            verify_partition::<T>(&records, layout.to_many + member, values.len())?;
        }
    }

    let many_lens: Vec<usize> = to_many.iter().map(Vec::len).collect();
    let relations = Arc::new(SharedRelations {
        collection_id,
        buffers: to_many
            .into_iter()
            .map(|ids| RwLock::new(RelationBuffer::Raw(ids)))
            .collect(),
    });

    let entries = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| -> CoreResult<Arc<EntryCell<T>>> {
            let (relation_ranges, member_ranges) = record.ranges.split_at(layout.to_many);
            for (range, len) in relation_ranges.iter().zip(&many_lens) {
                range.checked(*len)?;
            }
            let values = member_ranges
                .iter()
                .zip(&members)
                .map(|(range, values)| -> CoreResult<Vec<T::Element>> {
                    Ok(values[range.checked(values.len())?].to_vec())
                })
                .collect::<CoreResult<Vec<_>>>()?;
            let body = EntryBody {
                data: record.data,
                to_many: ToMany::Shared {
                    relations: Arc::clone(&relations),
                    ranges: relation_ranges.to_vec(),
                },
                to_one: T::TO_ONE.iter().map(|_| Link::default()).collect(),
                members: values,
            };
            Ok(EntryCell::tracked(
                ObjectID::at(index, collection_id),
                body,
                Arc::clone(generation),
            ))
        })
        .collect::<CoreResult<Vec<_>>>()?;

    let state = ReadState {
        relations: Some(relations),
        to_one,
        resolved: false,
    };
    Ok((Storage::Owned(entries), state))
}

/// Checks that range column `column` tiles `0..len` in record order.
fn verify_partition<T: DataType>(
    records: &[Record<T::Data>],
    column: usize,
    len: usize,
) -> CoreResult<()> {
    let mut expected = 0usize;
    for (index, record) in records.iter().enumerate() {
        let range = record.ranges[column];
        if range.begin as usize != expected || range.end < range.begin {
            return Err(CoreError::corrupt_buffer(format!(
                "{}[{index}] range {column} is {}..{}, expected to start at {expected}",
                T::TYPE_NAME,
                range.begin,
                range.end
            )));
        }
        expected = range.end as usize;
    }
    if expected != len {
        return Err(CoreError::corrupt_buffer(format!(
            "ranges of {} column {column} cover {expected} of {len} elements",
            T::TYPE_NAME
        )));
    }
    Ok(())
}

fn resolve_required<T: DataType>(
    resolver: &dyn ReferenceResolver,
    id: ObjectID,
    target: &'static str,
) -> CoreResult<ObjectRef> {
    if id.is_untracked() {
        return Err(CoreError::corrupt_buffer(format!(
            "untracked id stored in a {} relation to {target}",
            T::TYPE_NAME
        )));
    }
    resolve_checked(resolver, id, target)
}

fn resolve_optional(
    resolver: &dyn ReferenceResolver,
    id: ObjectID,
    target: &'static str,
) -> CoreResult<ObjectRef> {
    if id.is_untracked() {
        return Ok(ObjectRef::empty());
    }
    resolve_checked(resolver, id, target)
}

fn resolve_checked(
    resolver: &dyn ReferenceResolver,
    id: ObjectID,
    target: &'static str,
) -> CoreResult<ObjectRef> {
    let object = resolve_object(resolver, id)?;
    match object.type_name() {
        Some(found) if found != target => Err(CoreError::type_mismatch(target, found)),
        _ => Ok(object),
    }
}

fn unpersistable<T: DataType>(index: usize, relation: &'static str) -> CoreError {
    CoreError::UnpersistableReference {
        type_name: T::TYPE_NAME,
        index,
        relation,
    }
}

fn offset(len: usize) -> CoreResult<u32> {
    u32::try_from(len)
        .map_err(|_| CoreError::corrupt_buffer(format!("{len} elements exceed the range width")))
}

impl<T: DataType> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DataType> Drop for Collection<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: DataType> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("type_name", &T::TYPE_NAME)
            .field("collection_id", &self.collection_id)
            .field("len", &self.len())
            .field("subset", &self.is_subset_collection())
            .finish_non_exhaustive()
    }
}

/// Iterator over the handles of a collection.
pub struct Iter<'a, T: DataType> {
    collection: &'a Collection<T>,
    next: usize,
    end: usize,
}

impl<T: DataType> Iterator for Iter<'_, T> {
    type Item = Handle<T>;

    fn next(&mut self) -> Option<Handle<T>> {
        if self.next >= self.end {
            return None;
        }
        let handle = self
            .collection
            .get(self.next)
            .unwrap_or_else(|_| Handle::empty());
        self.next += 1;
        Some(handle)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl<T: DataType> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T: DataType> IntoIterator for &'a Collection<T> {
    type Item = Handle<T>;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T: DataType> ErasedCollection for Collection<T> {
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn collection_id(&self) -> CollectionId {
        self.collection_id
    }

    fn set_collection_id(&mut self, id: CollectionId) {
        Collection::<T>::set_collection_id(self, id);
    }

    fn len(&self) -> usize {
        Collection::<T>::len(self)
    }

    fn is_subset_collection(&self) -> bool {
        Collection::<T>::is_subset_collection(self)
    }

    fn object_at(&self, index: usize) -> CoreResult<ObjectRef> {
        let entry: Arc<dyn ErasedEntry> = self.entry_at(index)?;
        Ok(ObjectRef::from_erased(entry))
    }

    fn prepare_for_write(&self) -> CoreResult<Arc<WriteBuffers>> {
        Collection::<T>::prepare_for_write(self)
    }

    fn set_references(&self, resolver: &dyn ReferenceResolver) -> CoreResult<()> {
        Collection::<T>::set_references(self, resolver)
    }

    fn clear(&mut self) {
        Collection::<T>::clear(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
