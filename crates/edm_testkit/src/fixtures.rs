//! Ready-made events and frames for tests.

use edm_core::{Config, Frame, FrameData};

use crate::datamodel::{registry, ClusterData, HitData, TrackData};
use crate::generators::{ClusterSpec, EventSpec, TrackSpec};

/// A small event touching every relation kind.
///
/// Three hits, two clusters (the first one containing the second), one
/// track seeded by the first cluster, and a subset selecting that track.
#[must_use]
pub fn sample_event() -> EventSpec {
    let hit = |cell_id: u64, energy: f64| HitData {
        cell_id,
        energy,
        time: 0.5,
    };
    EventSpec {
        hits: vec![hit(11, 1.5), hit(12, 2.5), hit(13, 0.75)],
        clusters: vec![
            ClusterSpec {
                data: ClusterData {
                    energy: 4.0,
                    position: [0.0, 1.0, 2.0],
                },
                hits: vec![0, 1],
                clusters: vec![1],
                hit_weights: vec![0.4, 0.6],
            },
            ClusterSpec {
                data: ClusterData {
                    energy: 0.75,
                    position: [3.0, 4.0, 5.0],
                },
                hits: vec![2],
                clusters: Vec::new(),
                hit_weights: vec![1.0],
            },
        ],
        tracks: vec![TrackSpec {
            data: TrackData { chi2: 1.2, ndf: 3 },
            hits: vec![0, 2],
            seed: Some(0),
        }],
        selected_tracks: vec![0],
    }
}

/// [`sample_event`] as a frame, with a couple of parameters set.
#[must_use]
pub fn sample_frame() -> Frame {
    let frame = sample_event()
        .build_frame()
        .expect("sample event is consistent");
    frame.parameters().set("run_number", 42i32);
    frame
        .parameters()
        .set_vec("energy_scale", vec![1.0f64, 0.98]);
    frame
        .parameters()
        .set("detector", String::from("test-stand"));
    frame
}

/// Rebuilds a frame from its flat form with the datamodel registry.
pub fn reread(data: FrameData) -> edm_core::CoreResult<Frame> {
    Frame::from_data(data, &registry(), Config::default())
}
