//! Pluggable region-confidence scorer.
//!
//! An opaque external capability (typically a pretrained inference model)
//! that can refine the confidence of final candidates. It is never part of
//! the core algorithm; when absent, pipeline scores stand as-is.

use image::RgbaImage;

use crate::rect::IntRect;

/// Given an image region, return a confidence score in [0, 1].
pub trait RegionScorer {
    fn score_region(&self, image: &RgbaImage, region: IntRect) -> f32;
}

/// Blend a pipeline score with an external model score.
///
/// Equal weighting keeps the model advisory: it reorders close calls without
/// overriding strong pipeline evidence.
pub(crate) fn blend_scores(pipeline_score: f32, model_score: f32) -> f32 {
    (0.5 * pipeline_score + 0.5 * model_score).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ConstantScorer(f32);

    impl RegionScorer for ConstantScorer {
        fn score_region(&self, _image: &RgbaImage, _region: IntRect) -> f32 {
            self.0
        }
    }

    #[test]
    fn blend_averages_and_clamps() {
        assert!((blend_scores(0.8, 0.4) - 0.6).abs() < 1e-6);
        assert_eq!(blend_scores(2.0, 2.0), 1.0);
    }

    #[test]
    fn scorer_trait_is_object_safe() {
        let scorer: Box<dyn RegionScorer> = Box::new(ConstantScorer(0.7));
        let img = RgbaImage::new(4, 4);
        assert_eq!(scorer.score_region(&img, IntRect::new(0, 0, 2, 2)), 0.7);
    }
}
