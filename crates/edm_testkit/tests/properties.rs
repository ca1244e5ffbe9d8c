//! Property tests over random events and relation graphs.

use edm_core::{Collection, MutableHandle, RecordLayout, RelationRange};
use edm_testkit::prelude::*;
use proptest::prelude::*;

fn ranges_partition(ranges: &[RelationRange], len: usize) -> bool {
    let mut expected = 0;
    for range in ranges {
        if range.begin as usize != expected || range.end < range.begin {
            return false;
        }
        expected = range.end as usize;
    }
    expected == len
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn frame_roundtrip_preserves_event(event in event_strategy(8)) {
        init_test_logging();
        let frame = event.build_frame().unwrap();
        let read = reread(frame.write_data().unwrap()).unwrap();

        prop_assert_eq!(EventSpec::from_frame(&read).unwrap(), event);
    }

    #[test]
    fn prepare_twice_is_byte_identical(event in event_strategy(8)) {
        let collections = event.build().unwrap();

        let first = collections.clusters.flatten().unwrap();
        let second = collections.clusters.flatten().unwrap();
        prop_assert_eq!(&first, &second);
        let prepared = collections.clusters.prepare_for_write().unwrap();
        prop_assert_eq!(&*prepared, &first);

        let tracks = collections.tracks.prepare_for_write().unwrap();
        prop_assert_eq!(&*tracks, &collections.tracks.flatten().unwrap());
    }

    #[test]
    fn ranges_partition_relation_buffers(event in event_strategy(8)) {
        let collections = event.build().unwrap();
        let buffers = collections.clusters.prepare_for_write().unwrap();
        let layout = RecordLayout::of::<Cluster>();
        let records = buffers.records::<Cluster>().unwrap();

        for column in 0..layout.ranges() {
            let ranges: Vec<RelationRange> =
                records.iter().map(|record| record.ranges[column]).collect();
            let len = if column < layout.to_many {
                buffers.relation_id_arrays[column].len()
            } else {
                buffers.vector_member_arrays[column - layout.to_many].len()
            };
            prop_assert!(ranges_partition(&ranges, len));
        }
    }

    #[test]
    fn reread_frame_writes_same_data(event in event_strategy(6)) {
        let data = event.build_frame().unwrap().write_data().unwrap();
        let read = reread(data.clone()).unwrap();

        prop_assert_eq!(read.write_data().unwrap(), data);
    }

    #[test]
    fn floating_counts_until_adopted(copies in 0usize..8, after in 0usize..8) {
        let handle = MutableHandle::<Hit>::new(HitData::default());
        let clones: Vec<_> = (0..copies).map(|_| handle.clone()).collect();
        prop_assert_eq!(handle.untracked_ref_count(), Some(1 + copies as u32));

        let mut hits = Collection::<Hit>::new();
        hits.push_back(&handle).unwrap();
        let more: Vec<_> = (0..after).map(|_| handle.clone()).collect();
        prop_assert_eq!(handle.untracked_ref_count(), None);
        drop(more);
        drop(clones);

        prop_assert!(handle.is_tracked());
        prop_assert_eq!(hits.get(0).unwrap(), handle.as_handle().clone());
    }

    #[test]
    fn floating_count_drops_with_copies(copies in 1usize..8) {
        let handle = MutableHandle::<Hit>::new(HitData::default());
        let mut clones: Vec<_> = (0..copies).map(|_| handle.clone()).collect();

        for remaining in (0..copies).rev() {
            clones.pop();
            prop_assert_eq!(handle.untracked_ref_count(), Some(1 + remaining as u32));
        }
    }

    #[test]
    fn subset_handles_alias_owner(event in event_strategy(6), energy in 0.0f64..1.0e3) {
        let collections = event.build().unwrap();

        for (slot, &track) in event.selected_tracks.iter().enumerate() {
            let through_subset = collections.selected_tracks.get_mut(slot).unwrap();
            through_subset
                .update(|data| data.chi2 = energy as f32)
                .unwrap();
            let owner = collections.tracks.get(track).unwrap();
            prop_assert_eq!(owner.data().unwrap().chi2, energy as f32);
            prop_assert_eq!(owner, through_subset.as_handle().clone());
        }
        for (slot, &track) in event.selected_tracks.iter().enumerate() {
            let through_owner = collections.tracks.get_mut(track).unwrap();
            through_owner
                .update(|data| data.chi2 = -(energy as f32))
                .unwrap();
            let aliased = collections.selected_tracks.get(slot).unwrap();
            prop_assert_eq!(aliased.data().unwrap().chi2, -(energy as f32));
            prop_assert_eq!(aliased, through_owner.as_handle().clone());
        }
    }
}
