//! Example datamodel, written the way generated per-type code looks.
//!
//! - `Hit`: a detector hit, payload only.
//! - `Cluster`: groups hits and other clusters, with per-hit weights.
//! - `Track`: a fitted track over hits, seeded by one cluster.

use edm_core::bytes::BytesMut;
use edm_core::{Column, DataType, RelationDescriptor, TypeRegistry};

/// Payload of a [`Hit`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HitData {
    /// Readout cell.
    pub cell_id: u64,
    /// Deposited energy.
    pub energy: f64,
    /// Hit time.
    pub time: f32,
}

impl Column for HitData {
    const STRIDE: usize = <u64 as Column>::STRIDE + <f64 as Column>::STRIDE + <f32 as Column>::STRIDE;

    fn put(&self, buf: &mut BytesMut) {
        self.cell_id.put(buf);
        self.energy.put(buf);
        self.time.put(buf);
    }

    fn get(buf: &mut &[u8]) -> Self {
        Self {
            cell_id: u64::get(buf),
            energy: f64::get(buf),
            time: f32::get(buf),
        }
    }
}

/// A detector hit.
pub struct Hit;

impl DataType for Hit {
    const TYPE_NAME: &'static str = "edm::Hit";
    type Data = HitData;
    type Element = ();
}

/// Payload of a [`Cluster`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClusterData {
    /// Summed energy.
    pub energy: f64,
    /// Barycenter.
    pub position: [f32; 3],
}

impl Column for ClusterData {
    const STRIDE: usize = <f64 as Column>::STRIDE + <[f32; 3] as Column>::STRIDE;

    fn put(&self, buf: &mut BytesMut) {
        self.energy.put(buf);
        self.position.put(buf);
    }

    fn get(buf: &mut &[u8]) -> Self {
        Self {
            energy: f64::get(buf),
            position: <[f32; 3]>::get(buf),
        }
    }
}

/// A calorimeter cluster.
pub struct Cluster;

impl Cluster {
    /// One-to-many relation to the clustered hits.
    pub const HITS: usize = 0;
    /// One-to-many relation to sub-clusters.
    pub const CLUSTERS: usize = 1;
    /// Vector member with one weight per hit.
    pub const HIT_WEIGHTS: usize = 0;
}

impl DataType for Cluster {
    const TYPE_NAME: &'static str = "edm::Cluster";
    type Data = ClusterData;
    type Element = f32;
    const TO_MANY: &'static [RelationDescriptor] = &[
        RelationDescriptor::new("hits", Hit::TYPE_NAME),
        RelationDescriptor::new("clusters", "edm::Cluster"),
    ];
    const VECTOR_MEMBERS: &'static [&'static str] = &["hit_weights"];
}

/// Payload of a [`Track`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackData {
    /// Fit chi-square.
    pub chi2: f32,
    /// Degrees of freedom.
    pub ndf: i32,
}

impl Column for TrackData {
    const STRIDE: usize = <f32 as Column>::STRIDE + <i32 as Column>::STRIDE;

    fn put(&self, buf: &mut BytesMut) {
        self.chi2.put(buf);
        self.ndf.put(buf);
    }

    fn get(buf: &mut &[u8]) -> Self {
        Self {
            chi2: f32::get(buf),
            ndf: i32::get(buf),
        }
    }
}

/// A reconstructed track.
pub struct Track;

impl Track {
    /// One-to-many relation to the fitted hits.
    pub const HITS: usize = 0;
    /// One-to-one relation to the seeding cluster.
    pub const SEED: usize = 0;
}

impl DataType for Track {
    const TYPE_NAME: &'static str = "edm::Track";
    type Data = TrackData;
    type Element = ();
    const TO_MANY: &'static [RelationDescriptor] =
        &[RelationDescriptor::new("hits", Hit::TYPE_NAME)];
    const TO_ONE: &'static [RelationDescriptor] =
        &[RelationDescriptor::new("seed", Cluster::TYPE_NAME)];
}

/// Registry holding every type of this datamodel.
#[must_use]
pub fn registry() -> TypeRegistry {
    TypeRegistry::new()
        .with::<Hit>()
        .with::<Cluster>()
        .with::<Track>()
}
