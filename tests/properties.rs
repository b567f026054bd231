use proptest::prelude::*;

use tomato_detect::application::filter::DetectionFilter;
use tomato_detect::domain::condition::{classify, Condition};
use tomato_detect::domain::detection::{BoundingBox, Detection, RawDetection};
use tomato_detect::domain::labels::{LabelCatalog, LabelPalette, LabelVocabulary, TOMATO_LABELS};

fn raw_detection() -> impl Strategy<Value = RawDetection> {
    // Incluye a propósito índices fuera del vocabulario.
    (0usize..10, 0.0f32..=1.0, 0.0f32..100.0, 0.0f32..100.0).prop_map(|(class_index, confidence, x, y)| {
        RawDetection { class_index, confidence, bbox: BoundingBox::from_corners(x, y, x + 10.0, y + 10.0) }
    })
}

fn detection() -> impl Strategy<Value = Detection> {
    (0..TOMATO_LABELS.len(), 0.5f32..=1.0).prop_map(|(i, confidence)| Detection {
        label: TOMATO_LABELS[i].to_string(),
        confidence,
        bbox: BoundingBox::from_corners(0.0, 0.0, 1.0, 1.0),
    })
}

proptest! {
    #[test]
    fn filter_keeps_exactly_known_confident_detections(
        raw in prop::collection::vec(raw_detection(), 0..20),
        threshold in 0.0f32..=1.0,
        hidden in prop::sample::subsequence(TOMATO_LABELS.to_vec(), 0..=TOMATO_LABELS.len()),
    ) {
        let labels = LabelCatalog {
            vocabulary: LabelVocabulary::tomato(),
            palette: LabelPalette::tomato().without(hidden.iter().copied()),
        };
        let kept = DetectionFilter::new(threshold).apply(&raw, &labels);

        let expected: Vec<&RawDetection> = raw
            .iter()
            .filter(|r| r.confidence >= threshold)
            .filter(|r| TOMATO_LABELS.get(r.class_index).is_some_and(|l| !hidden.contains(l)))
            .collect();
        prop_assert_eq!(kept.len(), expected.len());
        for (d, r) in kept.iter().zip(expected) {
            prop_assert_eq!(d.label.as_str(), TOMATO_LABELS[r.class_index]);
            prop_assert_eq!(d.confidence, r.confidence);
            prop_assert_eq!(d.bbox, r.bbox);
        }
        // Lo que no tiene color en la paleta nunca se reporta.
        prop_assert!(kept.iter().all(|d| hidden.iter().all(|h| *h != d.label)));
    }

    #[test]
    fn classification_ignores_detection_order(
        mut detections in prop::collection::vec(detection(), 0..12),
    ) {
        let before = classify(&detections);
        detections.reverse();
        prop_assert_eq!(classify(&detections), before.clone());

        let (condition, remark) = before;
        match condition {
            Condition::NotATomato => prop_assert!(detections.is_empty()),
            Condition::Healthy => prop_assert!(detections.iter().all(|d| d.label == "Healthy")),
            Condition::NotHealthy => {
                for d in detections.iter().filter(|d| d.label != "Healthy") {
                    prop_assert_eq!(remark.matches(d.label.as_str()).count(), 1);
                }
                prop_assert!(!remark.contains("Healthy"));
            }
        }
    }
}
