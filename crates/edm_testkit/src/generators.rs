//! Property-based test generators using proptest.
//!
//! Events are generated as plain [`EventSpec`] values whose relations
//! are indices, so every generated relation graph is valid by
//! construction. [`EventSpec::build_frame`] turns a spec into a frame
//! and [`EventSpec::from_frame`] reads one back for comparison.

use edm_core::{
    Collection, CollectionId, CoreError, CoreResult, DataType, ErasedCollection, Frame, Handle,
    ObjectRef,
};
use proptest::collection::vec;
use proptest::prelude::*;

use crate::datamodel::{Cluster, ClusterData, Hit, HitData, Track, TrackData};

/// Frame name of the hit collection.
pub const HITS: &str = "hits";
/// Frame name of the cluster collection.
pub const CLUSTERS: &str = "clusters";
/// Frame name of the track collection.
pub const TRACKS: &str = "tracks";
/// Frame name of the subset collection of selected tracks.
pub const SELECTED_TRACKS: &str = "selected_tracks";

/// A cluster with relations given as indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterSpec {
    /// Payload.
    pub data: ClusterData,
    /// Indices into the hits.
    pub hits: Vec<usize>,
    /// Indices into the clusters, possibly including itself.
    pub clusters: Vec<usize>,
    /// Hit weights.
    pub hit_weights: Vec<f32>,
}

/// A track with relations given as indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackSpec {
    /// Payload.
    pub data: TrackData,
    /// Indices into the hits.
    pub hits: Vec<usize>,
    /// Index of the seeding cluster.
    pub seed: Option<usize>,
}

/// One event: every collection of the datamodel plus a subset of tracks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSpec {
    /// Hit payloads.
    pub hits: Vec<HitData>,
    /// Clusters.
    pub clusters: Vec<ClusterSpec>,
    /// Tracks.
    pub tracks: Vec<TrackSpec>,
    /// Indices of the tracks referenced by the subset collection.
    pub selected_tracks: Vec<usize>,
}

/// In-memory collections built from an [`EventSpec`].
#[derive(Debug, Default)]
pub struct EventCollections {
    /// Hits.
    pub hits: Collection<Hit>,
    /// Clusters.
    pub clusters: Collection<Cluster>,
    /// Tracks.
    pub tracks: Collection<Track>,
    /// Subset of `tracks`.
    pub selected_tracks: Collection<Track>,
}

impl EventSpec {
    /// Builds the collections, with every relation pointing at tracked
    /// objects.
    pub fn build(&self) -> CoreResult<EventCollections> {
        let mut event = EventCollections::default();
        event.selected_tracks.set_subset_collection(true)?;

        for data in &self.hits {
            event.hits.create_with(*data)?;
        }
        for spec in &self.clusters {
            event.clusters.create_with(spec.data)?;
        }
        for spec in &self.tracks {
            event.tracks.create_with(spec.data)?;
        }

        for (index, spec) in self.clusters.iter().enumerate() {
            let cluster = event.clusters.get_mut(index)?;
            for &hit in &spec.hits {
                cluster.add_related(Cluster::HITS, event.hits.get(hit)?)?;
            }
            for &other in &spec.clusters {
                cluster.add_related(Cluster::CLUSTERS, event.clusters.get(other)?)?;
            }
            cluster.set_members(Cluster::HIT_WEIGHTS, spec.hit_weights.clone())?;
        }
        for (index, spec) in self.tracks.iter().enumerate() {
            let track = event.tracks.get_mut(index)?;
            for &hit in &spec.hits {
                track.add_related(Track::HITS, event.hits.get(hit)?)?;
            }
            if let Some(seed) = spec.seed {
                track.set_single(Track::SEED, event.clusters.get(seed)?)?;
            }
        }
        for &track in &self.selected_tracks {
            let handle = event.tracks.get(track)?;
            event.selected_tracks.push_back(&handle)?;
        }
        Ok(event)
    }

    /// Builds the collections and puts them into a new frame.
    pub fn build_frame(&self) -> CoreResult<Frame> {
        let EventCollections {
            hits,
            clusters,
            tracks,
            selected_tracks,
        } = self.build()?;
        let mut frame = Frame::new();
        frame.put(hits, HITS)?;
        frame.put(clusters, CLUSTERS)?;
        frame.put(tracks, TRACKS)?;
        frame.put(selected_tracks, SELECTED_TRACKS)?;
        Ok(frame)
    }

    /// Reads an event back from a frame built by [`EventSpec::build_frame`].
    pub fn from_frame(frame: &Frame) -> CoreResult<Self> {
        let hits = typed::<Hit>(frame, HITS)?;
        let clusters = typed::<Cluster>(frame, CLUSTERS)?;
        let tracks = typed::<Track>(frame, TRACKS)?;
        let selected = typed::<Track>(frame, SELECTED_TRACKS)?;

        let mut event = Self::default();
        for hit in hits {
            event.hits.push(hit.data()?);
        }
        for cluster in clusters {
            event.clusters.push(ClusterSpec {
                data: cluster.data()?,
                hits: positions(&cluster.related(Cluster::HITS)?, hits.collection_id())?,
                clusters: positions(
                    &cluster.related(Cluster::CLUSTERS)?,
                    clusters.collection_id(),
                )?,
                hit_weights: cluster.members(Cluster::HIT_WEIGHTS)?,
            });
        }
        for track in tracks {
            let seed = match track.single(Track::SEED)? {
                Some(seed) => Some(position(&seed, clusters.collection_id())?),
                None => None,
            };
            event.tracks.push(TrackSpec {
                data: track.data()?,
                hits: positions(&track.related(Track::HITS)?, hits.collection_id())?,
                seed,
            });
        }
        for track in selected.handles()? {
            event
                .selected_tracks
                .push(handle_position(&track, tracks.collection_id())?);
        }
        Ok(event)
    }

    /// Number of objects across all owning collections.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.hits.len() + self.clusters.len() + self.tracks.len()
    }
}

fn typed<'a, T: DataType>(frame: &'a Frame, name: &str) -> CoreResult<&'a Collection<T>> {
    frame.get::<T>(name).ok_or_else(|| {
        CoreError::type_mismatch(
            T::TYPE_NAME,
            frame
                .get_erased(name)
                .map_or("nothing", |collection| collection.type_name()),
        )
    })
}

fn position(object: &ObjectRef, collection_id: CollectionId) -> CoreResult<usize> {
    let id = object.id()?;
    if id.collection_id != collection_id {
        return Err(CoreError::corrupt_buffer(format!(
            "{id} does not belong to collection {collection_id}"
        )));
    }
    id.position()
        .ok_or_else(|| CoreError::corrupt_buffer(format!("{id} has no position")))
}

fn positions(objects: &[ObjectRef], collection_id: CollectionId) -> CoreResult<Vec<usize>> {
    objects
        .iter()
        .map(|object| position(object, collection_id))
        .collect()
}

fn handle_position<T: DataType>(handle: &Handle<T>, collection_id: CollectionId) -> CoreResult<usize> {
    position(&handle.erase(), collection_id)
}

/// Strategy for hit payloads with finite values.
pub fn hit_data_strategy() -> impl Strategy<Value = HitData> {
    (any::<u64>(), -1.0e6f64..1.0e6, -1.0e3f32..1.0e3).prop_map(|(cell_id, energy, time)| {
        HitData {
            cell_id,
            energy,
            time,
        }
    })
}

/// Strategy for cluster payloads with finite values.
pub fn cluster_data_strategy() -> impl Strategy<Value = ClusterData> {
    (0.0f64..1.0e4, prop::array::uniform3(-1.0e3f32..1.0e3))
        .prop_map(|(energy, position)| ClusterData { energy, position })
}

/// Strategy for track payloads with finite values.
pub fn track_data_strategy() -> impl Strategy<Value = TrackData> {
    (0.0f32..1.0e3, 0i32..64).prop_map(|(chi2, ndf)| TrackData { chi2, ndf })
}

fn indices(len: usize) -> BoxedStrategy<Vec<usize>> {
    if len == 0 {
        Just(Vec::new()).boxed()
    } else {
        vec(0..len, 0..4).boxed()
    }
}

fn optional_index(len: usize) -> BoxedStrategy<Option<usize>> {
    if len == 0 {
        Just(None).boxed()
    } else {
        prop::option::of(0..len).boxed()
    }
}

fn cluster_spec_strategy(hits: usize, clusters: usize) -> impl Strategy<Value = ClusterSpec> {
    (
        cluster_data_strategy(),
        indices(hits),
        indices(clusters),
        vec(0.0f32..1.0, 0..4),
    )
        .prop_map(|(data, hits, clusters, hit_weights)| ClusterSpec {
            data,
            hits,
            clusters,
            hit_weights,
        })
}

fn track_spec_strategy(hits: usize, clusters: usize) -> impl Strategy<Value = TrackSpec> {
    (track_data_strategy(), indices(hits), optional_index(clusters))
        .prop_map(|(data, hits, seed)| TrackSpec { data, hits, seed })
}

/// Strategy for events with up to `max_len` objects per collection and
/// arbitrary valid relations among them.
pub fn event_strategy(max_len: usize) -> impl Strategy<Value = EventSpec> {
    (0..=max_len, 0..=max_len, 0..=max_len).prop_flat_map(|(hits, clusters, tracks)| {
        (
            vec(hit_data_strategy(), hits),
            vec(cluster_spec_strategy(hits, clusters), clusters),
            vec(track_spec_strategy(hits, clusters), tracks),
            indices(tracks),
        )
            .prop_map(|(hits, clusters, tracks, selected_tracks)| EventSpec {
                hits,
                clusters,
                tracks,
                selected_tracks,
            })
    })
}
