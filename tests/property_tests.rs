mod common;

use common::detector;
use image::{Rgb, RgbImage};
use proptest::prelude::*;
use solanum_core::SourceType;
use solanum_eye::Frame;
use solanum_storage::HistoryStore;

proptest! {
    #[test]
    fn test_monotonic_filtering(
        scores in prop::collection::vec(0.01f32..=1.0f32, 0..20),
        t1 in 0.01f32..=1.0f32,
        t2 in 0.01f32..=1.0f32,
    ) {
        let (low, high) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
        let detector = detector(&scores);
        let frame = Frame::from_rgb(RgbImage::from_pixel(30, 30, Rgb([10, 120, 30])), 0);

        let at_low = detector.infer(&frame, low).unwrap().detections.len();
        let at_high = detector.infer(&frame, high).unwrap().detections.len();
        prop_assert!(at_high <= at_low);
    }

    #[test]
    fn test_append_grows_list_by_one(
        paths in prop::collection::vec("[a-z]{1,12}\\.(jpg|png|mp4)", 1..30),
    ) {
        let store = HistoryStore::in_memory();
        let mut last_id = None;
        for (n, path) in paths.iter().enumerate() {
            let id = store.append(SourceType::Image, path.clone(), vec![n as u8]).unwrap();
            if let Some(previous) = last_id {
                prop_assert!(id > previous);
            }
            last_id = Some(id);

            let records = store.list().unwrap();
            prop_assert_eq!(records.len(), n + 1);
            let newest = records.last().unwrap();
            prop_assert_eq!(newest.id, id);
            prop_assert_eq!(&newest.source_path, path);
            prop_assert_eq!(&newest.detected_image, &vec![n as u8]);
        }
    }

    #[test]
    fn test_delete_removes_exactly_one(count in 1usize..20, pick in 0usize..20) {
        let store = HistoryStore::in_memory();
        let ids: Vec<_> = (0..count)
            .map(|i| store.append(SourceType::Video, format!("{}.mp4", i), vec![]).unwrap())
            .collect();
        let target = ids[pick % count];

        prop_assert!(store.delete_by_id(target).unwrap());
        let remaining: Vec<_> = store.list().unwrap().into_iter().map(|r| r.id).collect();
        let expected: Vec<_> = ids.iter().copied().filter(|id| *id != target).collect();
        prop_assert_eq!(remaining, expected);
        prop_assert!(!store.delete_by_id(target).unwrap());
    }
}
