//! Benchmark utilities.

use edm_testkit::{ClusterData, ClusterSpec, EventSpec, HitData, TrackData, TrackSpec};

/// Builds a deterministic event with `hits` hits.
///
/// Every cluster groups eight consecutive hits and points at its
/// predecessor, every track runs through four hits and is seeded by a
/// cluster, and every other track is selected.
#[must_use]
pub fn generate_event(hits: usize) -> EventSpec {
    let hit_data = (0..hits)
        .map(|i| HitData {
            cell_id: i as u64,
            energy: (i % 97) as f64 * 0.25,
            time: (i % 13) as f32,
        })
        .collect::<Vec<_>>();

    let cluster_count = hits / 8;
    let clusters = (0..cluster_count)
        .map(|c| ClusterSpec {
            data: ClusterData {
                energy: c as f64,
                position: [c as f32, 0.0, 1.0],
            },
            hits: (c * 8..c * 8 + 8).collect(),
            clusters: if c == 0 { Vec::new() } else { vec![c - 1] },
            hit_weights: vec![0.125; 8],
        })
        .collect::<Vec<_>>();

    let track_count = hits / 4;
    let tracks = (0..track_count)
        .map(|t| TrackSpec {
            data: TrackData {
                chi2: (t % 7) as f32,
                ndf: 4,
            },
            hits: (t * 4..t * 4 + 4).collect(),
            seed: (cluster_count > 0).then(|| t % cluster_count),
        })
        .collect::<Vec<_>>();

    EventSpec {
        hits: hit_data,
        clusters,
        selected_tracks: (0..track_count).step_by(2).collect(),
        tracks,
    }
}

/// Event sizes shared by every benchmark group.
pub const EVENT_SIZES: [usize; 3] = [64, 1024, 16384];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_event_builds() {
        let spec = generate_event(64);
        assert_eq!(spec.clusters.len(), 8);
        assert_eq!(spec.tracks.len(), 16);
        let frame = spec.build_frame().unwrap();
        assert_eq!(EventSpec::from_frame(&frame).unwrap(), spec);
    }
}
