//! Landmark-to-placement mapping.
//!
//! Each jewelry category is anchored to one landmark or to the midpoint of
//! two. The anchor, in normalized image coordinates, is mapped into scene
//! space by centring on 0.5, scaling by [`PLACEMENT_SCALE`] and flipping the
//! vertical axis. Depth is fixed at [`PLACEMENT_DEPTH`].

use crate::models::jewelry::{JewelryCategory, Offset3D};
use crate::models::pose::{BodyLandmark, Landmark, LandmarkSet};

/// Scene units per full normalized image width.
pub const PLACEMENT_SCALE: f32 = 10.0;

/// Constant depth for every category.
pub const PLACEMENT_DEPTH: f32 = -5.0;

/// Which landmarks a category is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorRule {
    Point(BodyLandmark),
    Midpoint(BodyLandmark, BodyLandmark),
}

impl AnchorRule {
    pub fn landmarks(&self) -> Vec<BodyLandmark> {
        match *self {
            AnchorRule::Point(lm) => vec![lm],
            AnchorRule::Midpoint(a, b) => vec![a, b],
        }
    }

    fn resolve(&self, landmarks: &LandmarkSet) -> Option<Landmark> {
        match self {
            AnchorRule::Point(lm) => landmarks.get(*lm).copied(),
            AnchorRule::Midpoint(a, b) => {
                let (a, b) = (landmarks.get(*a)?, landmarks.get(*b)?);
                Some(a.midpoint(b))
            }
        }
    }
}

// Anchor table. Earrings and ring use a single point while the necklace
// uses the shoulder midpoint.
pub const NECKLACE_ANCHOR: AnchorRule =
    AnchorRule::Midpoint(BodyLandmark::LeftShoulder, BodyLandmark::RightShoulder);
pub const EARRINGS_ANCHOR: AnchorRule = AnchorRule::Point(BodyLandmark::LeftEar);
pub const RING_ANCHOR: AnchorRule = AnchorRule::Point(BodyLandmark::LeftWrist);

pub const fn anchor_rule(category: JewelryCategory) -> AnchorRule {
    match category {
        JewelryCategory::Necklace => NECKLACE_ANCHOR,
        JewelryCategory::Earrings => EARRINGS_ANCHOR,
        JewelryCategory::Ring => RING_ANCHOR,
    }
}

/// Landmarks that must be present for `place` to produce an offset.
pub fn required_landmarks(category: JewelryCategory) -> Vec<BodyLandmark> {
    anchor_rule(category).landmarks()
}

/// Maps a normalized image point into scene space.
pub fn to_scene_offset(point: &Landmark) -> Offset3D {
    Offset3D {
        x: (point.x - 0.5) * PLACEMENT_SCALE,
        y: -(point.y - 0.5) * PLACEMENT_SCALE,
        z: PLACEMENT_DEPTH,
    }
}

/// Computes where a model of `category` goes for these landmarks.
///
/// Returns `None` when a landmark the category needs is absent; the caller
/// skips the update for that frame. Pure: no state is read or written.
pub fn place(category: JewelryCategory, landmarks: &LandmarkSet) -> Option<Offset3D> {
    anchor_rule(category)
        .resolve(landmarks)
        .map(|anchor| to_scene_offset(&anchor))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_offset(actual: Offset3D, expected: (f32, f32, f32)) {
        let eps = 1e-5;
        assert!(
            (actual.x - expected.0).abs() < eps
                && (actual.y - expected.1).abs() < eps
                && (actual.z - expected.2).abs() < eps,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    fn body() -> LandmarkSet {
        LandmarkSet::centered()
            .with(BodyLandmark::LeftShoulder, Landmark::new(0.4, 0.5))
            .with(BodyLandmark::RightShoulder, Landmark::new(0.6, 0.5))
            .with(BodyLandmark::LeftEar, Landmark::new(0.3, 0.4))
            .with(BodyLandmark::LeftWrist, Landmark::new(0.7, 0.6))
    }

    #[test]
    fn test_necklace_uses_shoulder_midpoint() {
        let offset = place(JewelryCategory::Necklace, &body()).unwrap();
        assert_offset(offset, (0.0, 0.0, -5.0));
    }

    #[test]
    fn test_earrings_use_ear_point() {
        let offset = place(JewelryCategory::Earrings, &body()).unwrap();
        assert_offset(offset, (-2.0, 1.0, -5.0));
    }

    #[test]
    fn test_ring_uses_wrist_point() {
        let offset = place(JewelryCategory::Ring, &body()).unwrap();
        assert_offset(offset, (2.0, -1.0, -5.0));
    }

    #[test]
    fn test_place_is_deterministic() {
        let landmarks = body();
        for category in JewelryCategory::ALL {
            let first = place(category, &landmarks);
            for _ in 0..10 {
                assert_eq!(place(category, &landmarks), first);
            }
        }
    }

    #[test]
    fn test_missing_landmark_skips_placement() {
        // Ends before the right shoulder and wrist.
        let short = LandmarkSet::new(vec![Landmark::new(0.5, 0.5); 12]);
        assert!(place(JewelryCategory::Necklace, &short).is_none());
        assert!(place(JewelryCategory::Ring, &short).is_none());
        assert!(place(JewelryCategory::Earrings, &short).is_some());
        assert!(place(JewelryCategory::Ring, &LandmarkSet::default()).is_none());
    }

    #[test]
    fn test_required_landmarks_match_rules() {
        assert_eq!(
            required_landmarks(JewelryCategory::Necklace),
            vec![BodyLandmark::LeftShoulder, BodyLandmark::RightShoulder]
        );
        assert_eq!(required_landmarks(JewelryCategory::Earrings), vec![BodyLandmark::LeftEar]);
        assert_eq!(required_landmarks(JewelryCategory::Ring), vec![BodyLandmark::LeftWrist]);
    }

    #[test]
    fn test_corners_map_to_scene_extent() {
        assert_offset(to_scene_offset(&Landmark::new(0.0, 0.0)), (-5.0, 5.0, -5.0));
        assert_offset(to_scene_offset(&Landmark::new(1.0, 1.0)), (5.0, -5.0, -5.0));
    }
}
