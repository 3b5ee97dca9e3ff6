use lazy_static::lazy_static;
use shared::Detection;
use std::collections::HashSet;

lazy_static! {
    /// Classes dropped before any scoring or annotation. The detector labels
    /// freckles inconsistently, so every spelling it emits is listed.
    pub static ref EXCLUDED_CLASSES: HashSet<&'static str> =
        ["freckles", "freckle", "Freckles", "Freckle"]
            .into_iter()
            .collect();
}

/// Drop detections whose class is excluded, preserving order. Membership is
/// an exact string test against the set.
pub fn filter_detections(
    detections: Vec<Detection>,
    excluded: &HashSet<&'static str>,
) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|detection| !excluded.contains(detection.class_name.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(class_name: &str) -> Detection {
        Detection {
            x: 10.0,
            y: 10.0,
            width: 4.0,
            height: 4.0,
            confidence: 0.5,
            class_name: class_name.to_string(),
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(filter_detections(Vec::new(), &EXCLUDED_CLASSES).is_empty());
    }

    #[test]
    fn drops_every_listed_case_variant() {
        let detections = vec![
            detection("freckles"),
            detection("Freckles"),
            detection("freckle"),
            detection("Freckle"),
            detection("blackhead"),
        ];
        let kept = filter_detections(detections, &EXCLUDED_CLASSES);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].class_name, "blackhead");
    }

    #[test]
    fn preserves_original_order() {
        let detections = vec![
            detection("cystic"),
            detection("freckles"),
            detection("blackhead"),
            detection("Acne"),
        ];
        let kept = filter_detections(detections, &EXCLUDED_CLASSES);
        let classes: Vec<&str> = kept.iter().map(|d| d.class_name.as_str()).collect();
        assert_eq!(classes, ["cystic", "blackhead", "Acne"]);
    }
}
