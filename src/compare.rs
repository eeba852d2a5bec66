//! Tolerant pixel comparison between two rasters.

use std::path::Path;

use image::RgbaImage;

use crate::error::Result;
use crate::raster::Raster;
use crate::types::ComparisonResult;

/// Per-channel tolerance used when none is configured.
pub const DEFAULT_TOLERANCE: u8 = 2;

/// Compare `a` against `b`.
///
/// A pixel differs when any channel differs by more than `tolerance`. The
/// result only matches when no pixel differs. Rasters of different sizes
/// never match and count every pixel of `a` as differing.
pub fn compare(a: &Raster, b: &Raster, tolerance: u8) -> ComparisonResult {
    if a.width() != b.width() || a.height() != b.height() {
        return ComparisonResult {
            is_match: false,
            similarity_percent: 0.0,
            differing_pixels: a.pixel_count(),
        };
    }

    let differing = a
        .pixels()
        .iter()
        .zip(b.pixels())
        .filter(|(pa, pb)| pixel_differs(pa, pb, tolerance))
        .count() as u64;

    let total = a.pixel_count();
    let similarity_percent = if total > 0 {
        100.0 * (total - differing) as f64 / total as f64
    } else {
        0.0
    };

    ComparisonResult {
        is_match: differing == 0,
        similarity_percent,
        differing_pixels: differing,
    }
}

fn pixel_differs(a: &[u8; 4], b: &[u8; 4], tolerance: u8) -> bool {
    a.iter().zip(b).any(|(ca, cb)| ca.abs_diff(*cb) > tolerance)
}

/// Write a heatmap of differing pixels to `output_path`.
///
/// Matching pixels are transparent; differing ones are shaded from yellow to
/// red by their largest channel difference. Size mismatches produce an image
/// sized like `a` that is entirely red.
pub fn write_diff_heatmap(a: &Raster, b: &Raster, tolerance: u8, output_path: &Path) -> Result<()> {
    let same_size = a.width() == b.width() && a.height() == b.height();
    let mut heat = RgbaImage::new(a.width(), a.height());

    for (x, y, out) in heat.enumerate_pixels_mut() {
        let Some(pa) = a.pixel(x, y) else { continue };
        if !same_size {
            *out = image::Rgba([255, 0, 0, 200]);
            continue;
        }
        let Some(pb) = b.pixel(x, y) else { continue };
        if !pixel_differs(&pa, &pb, tolerance) {
            continue;
        }
        let max_diff = pa
            .iter()
            .zip(pb.iter())
            .map(|(ca, cb)| ca.abs_diff(*cb))
            .max()
            .unwrap_or(0);
        let ratio = max_diff as f32 / 255.0;
        let g = ((1.0 - ratio) * 200.0).clamp(0.0, 200.0) as u8;
        let alpha = (80.0 + ratio * 175.0).clamp(80.0, 255.0) as u8;
        *out = image::Rgba([255, g, 0, alpha]);
    }

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    heat.save(output_path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CompareMode;
    use proptest::prelude::*;

    #[test]
    fn identical_rasters_match() {
        let a = Raster::filled(10, 10, [1, 2, 3, 255]);
        let result = compare(&a, &a.clone(), 0);
        assert!(result.is_match);
        assert_eq!(result.differing_pixels, 0);
        assert!((result.similarity_percent - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn dimension_mismatch_is_total_dissimilarity() {
        let a = Raster::filled(10, 10, [0, 0, 0, 255]);
        let b = Raster::filled(20, 20, [0, 0, 0, 255]);
        let result = compare(&a, &b, 255);
        assert!(!result.is_match);
        assert_eq!(result.similarity_percent, 0.0);
        assert_eq!(result.differing_pixels, 100);
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        let a = Raster::filled(1, 1, [100, 100, 100, 255]);
        let within = Raster::filled(1, 1, [100, 102, 100, 255]);
        let beyond = Raster::filled(1, 1, [100, 103, 100, 255]);

        assert!(compare(&a, &within, 2).is_match);
        assert!(!compare(&a, &beyond, 2).is_match);
        assert_eq!(compare(&a, &beyond, 2).differing_pixels, 1);
    }

    #[test]
    fn single_differing_pixel_fails_strict_match() {
        let a = Raster::filled(10, 10, [50, 50, 50, 255]);
        let mut b = a.clone();
        b.set_pixel(3, 4, [200, 50, 50, 255]);

        let result = compare(&a, &b, 2);
        assert!(!result.is_match);
        assert_eq!(result.differing_pixels, 1);
        assert!((result.similarity_percent - 99.0).abs() < 1e-9);
        assert!(!result.passes(CompareMode::Strict));
        assert!(result.passes(CompareMode::MinSimilarity(98.5)));
    }

    #[test]
    fn empty_rasters_have_zero_similarity() {
        let a = Raster::filled(0, 0, [0; 4]);
        let result = compare(&a, &a.clone(), 0);
        assert!(result.is_match);
        assert_eq!(result.similarity_percent, 0.0);
    }

    #[test]
    fn heatmap_marks_differences() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diff").join("button.png");
        let a = Raster::filled(4, 4, [0, 0, 0, 255]);
        let mut b = a.clone();
        b.set_pixel(1, 1, [255, 255, 255, 255]);

        write_diff_heatmap(&a, &b, 2, &path).expect("write heatmap");

        let heat = image::open(&path).expect("open heatmap").to_rgba8();
        assert_eq!(heat.dimensions(), (4, 4));
        assert_eq!(heat.get_pixel(0, 0)[3], 0);
        assert_eq!(heat.get_pixel(1, 1)[0], 255);
        assert!(heat.get_pixel(1, 1)[3] > 0);
    }

    fn raster_strategy() -> impl Strategy<Value = Raster> {
        (1u32..5, 1u32..5).prop_flat_map(|(w, h)| {
            proptest::collection::vec(any::<[u8; 4]>(), (w * h) as usize)
                .prop_map(move |pixels| Raster::new(w, h, pixels).expect("sized pixels"))
        })
    }

    proptest! {
        #[test]
        fn comparison_is_symmetric(a in raster_strategy(), b in raster_strategy(), t in any::<u8>()) {
            let ab = compare(&a, &b, t);
            let ba = compare(&b, &a, t);
            prop_assert_eq!(ab.is_match, ba.is_match);
        }

        #[test]
        fn channel_difference_of_exactly_t_is_tolerated(base in any::<u8>(), t in 0u8..=128) {
            let other = base.checked_add(t).unwrap_or(base.saturating_sub(t));
            let a = Raster::filled(1, 1, [base, 0, 0, 255]);
            let b = Raster::filled(1, 1, [other, 0, 0, 255]);
            prop_assert!(compare(&a, &b, t).is_match);

            if t < 255 {
                let far = base.checked_add(t + 1).unwrap_or(base.wrapping_sub(t + 1));
                if base.abs_diff(far) == t + 1 {
                    let c = Raster::filled(1, 1, [far, 0, 0, 255]);
                    prop_assert!(!compare(&a, &c, t).is_match);
                }
            }
        }
    }
}
