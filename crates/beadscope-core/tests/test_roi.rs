mod common;

use ndarray::Array3;

use beadscope_core::error::BeadError;
use beadscope_core::roi::{crop, crop_beads, extract_rois, RejectionReason, RoiConfig};
use beadscope_core::volume::{CandidatePoint, PixelSpacing, Volume};

use common::single_bead_volume;

fn roi_config(bead_size: f64, crop_factor: f64, rejection_margin: f64) -> RoiConfig {
    RoiConfig {
        bead_size,
        crop_factor,
        rejection_margin,
        z_half_extent: None,
    }
}

fn ramp_volume(shape: (usize, usize, usize)) -> Volume {
    Volume::new(Array3::from_shape_fn(shape, |(z, y, x)| {
        (z * 10_000 + y * 100 + x) as f32
    }))
}

#[test]
fn test_single_bead_gets_one_roi() {
    let volume = single_bead_volume();
    let candidates = [CandidatePoint::new(10.0, 25.0, 25.0)];
    let extraction = extract_rois(
        &volume,
        &candidates,
        &roi_config(6.0, 2.0, 2.0),
        &PixelSpacing::default(),
    )
    .unwrap();

    assert_eq!(extraction.rois.len(), 1);
    assert_eq!(extraction.retained_indices(), vec![0]);
    let roi = &extraction.rois[0];
    assert_eq!(roi.z, 0..20, "Z spans the full depth by default");
    assert_eq!(roi.y, 19..32);
    assert_eq!(roi.x, 19..32);
    assert_eq!(roi.corners(), [(19, 19), (19, 32), (32, 19)]);
}

#[test]
fn test_empty_candidates_give_empty_extraction() {
    let extraction = extract_rois(
        &single_bead_volume(),
        &[],
        &RoiConfig::default(),
        &PixelSpacing::default(),
    )
    .unwrap();
    assert!(extraction.rois.is_empty());
    assert!(extraction.retained_indices().is_empty());
    assert!(extraction.rejected.is_empty());
}

#[test]
fn test_boxes_never_exceed_volume() {
    let volume = ramp_volume((12, 30, 40));
    let candidates: Vec<CandidatePoint> = [0.0, 1.5, 15.0, 28.0, 29.0]
        .iter()
        .flat_map(|&y| {
            [0.0, 3.0, 20.0, 39.0]
                .into_iter()
                .map(move |x| CandidatePoint::new(6.0, y, x))
        })
        .collect();

    for crop_factor in [0.5, 1.0, 3.0, 20.0] {
        let extraction = extract_rois(
            &volume,
            &candidates,
            &roi_config(4.0, crop_factor, 0.0),
            &PixelSpacing::default(),
        )
        .unwrap();
        assert_eq!(extraction.rois.len(), candidates.len());
        for roi in &extraction.rois {
            assert!(roi.y.end <= 30 && roi.x.end <= 40, "{roi:?} exceeds the volume");
            assert!(!roi.is_empty());
        }
    }
}

#[test]
fn test_z_margin_rejection_holds_for_all_margins() {
    let volume = ramp_volume((20, 16, 16));
    let candidates: Vec<CandidatePoint> = (0..20)
        .map(|z| CandidatePoint::new(z as f64, 8.0, 8.0))
        .collect();
    let spacing = PixelSpacing::new(0.5, 0.1, 0.1);

    for margin in [0.0, 0.5, 1.0, 2.25, 4.0, 10.0] {
        let extraction =
            extract_rois(&volume, &candidates, &roi_config(1.0, 1.0, margin), &spacing).unwrap();
        for index in extraction.retained_indices() {
            let z = candidates[index].z;
            assert!(z * 0.5 >= margin, "z={z} kept with margin {margin}");
            assert!((19.0 - z) * 0.5 >= margin, "z={z} kept with margin {margin}");
        }
        assert_eq!(
            extraction.rois.len() + extraction.rejected.len(),
            candidates.len(),
            "every candidate is either retained or rejected"
        );
        assert!(extraction
            .rejected
            .iter()
            .all(|r| r.reason == RejectionReason::NearZFace));
    }
}

#[test]
fn test_zero_margin_keeps_edge_beads() {
    let volume = ramp_volume((5, 10, 10));
    let candidates = [CandidatePoint::new(0.0, 5.0, 5.0), CandidatePoint::new(4.0, 5.0, 5.0)];
    let extraction = extract_rois(
        &volume,
        &candidates,
        &roi_config(2.0, 1.0, 0.0),
        &PixelSpacing::default(),
    )
    .unwrap();
    assert_eq!(extraction.retained_indices(), vec![0, 1]);
}

#[test]
fn test_retained_indices_point_back_to_candidates() {
    let volume = ramp_volume((20, 30, 30));
    let candidates = [
        CandidatePoint::new(1.0, 10.0, 10.0),
        CandidatePoint::new(10.0, 15.0, 15.0),
        CandidatePoint::new(18.5, 5.0, 5.0),
        CandidatePoint::new(9.0, 25.0, 4.0),
    ];
    let extraction = extract_rois(
        &volume,
        &candidates,
        &roi_config(2.0, 2.0, 3.0),
        &PixelSpacing::default(),
    )
    .unwrap();
    assert_eq!(extraction.retained_indices(), vec![1, 3]);
    let rejected: Vec<usize> = extraction.rejected.iter().map(|r| r.index).collect();
    assert_eq!(rejected, vec![0, 2]);
}

#[test]
fn test_outside_candidate_is_rejected() {
    let volume = ramp_volume((10, 10, 10));
    let candidates = [
        CandidatePoint::new(5.0, 12.0, 5.0),
        CandidatePoint::new(5.0, 5.0, f64::NAN),
    ];
    let extraction = extract_rois(
        &volume,
        &candidates,
        &roi_config(2.0, 1.0, 0.0),
        &PixelSpacing::default(),
    )
    .unwrap();
    assert!(extraction.rois.is_empty());
    assert!(extraction
        .rejected
        .iter()
        .all(|r| r.reason == RejectionReason::OutsideVolume));
}

#[test]
fn test_overlapping_boxes_are_both_kept_and_cropped() {
    let volume = ramp_volume((10, 40, 40));
    let candidates = [
        CandidatePoint::new(5.0, 20.0, 15.0),
        CandidatePoint::new(5.0, 20.0, 21.0),
    ];
    let extraction = extract_rois(
        &volume,
        &candidates,
        &roi_config(4.0, 2.0, 1.0),
        &PixelSpacing::default(),
    )
    .unwrap();

    assert_eq!(extraction.retained_indices(), vec![0, 1]);
    assert_eq!(extraction.overlaps, vec![(0, 1)]);

    let beads = crop_beads(&volume, &candidates, &extraction);
    assert_eq!(beads.len(), 2);
    for (bead, candidate) in beads.iter().zip(&candidates) {
        assert_eq!(bead.data.dim(), bead.roi.shape());
        let origin = bead.roi.origin();
        assert_eq!(bead.centroid.x + origin.x, candidate.x);
        // Crops are independent copies of the same voxels.
        let v = bead.data[[0, 0, 0]];
        assert_eq!(v, volume.data[[bead.roi.z.start, bead.roi.y.start, bead.roi.x.start]]);
    }
}

#[test]
fn test_z_half_extent_limits_depth() {
    let volume = ramp_volume((30, 20, 20));
    let config = RoiConfig {
        z_half_extent: Some(4.0),
        ..roi_config(2.0, 1.0, 0.0)
    };
    let extraction = extract_rois(
        &volume,
        &[CandidatePoint::new(15.0, 10.0, 10.0)],
        &config,
        &PixelSpacing::new(2.0, 1.0, 1.0),
    )
    .unwrap();
    assert_eq!(extraction.rois[0].z, 13..18);
}

#[test]
fn test_anisotropic_spacing_scales_box() {
    let volume = ramp_volume((10, 60, 60));
    let extraction = extract_rois(
        &volume,
        &[CandidatePoint::new(5.0, 30.0, 30.0)],
        &roi_config(1.0, 2.0, 0.0),
        &PixelSpacing::new(1.0, 0.1, 0.2),
    )
    .unwrap();
    let roi = &extraction.rois[0];
    // Half-extent 0.5 / 0.1 * 2 = 10 voxels in Y, 5 voxels in X.
    assert_eq!(roi.y, 20..41);
    assert_eq!(roi.x, 25..36);
}

#[test]
fn test_crop_copies_roi_voxels() {
    let volume = ramp_volume((4, 6, 8));
    let extraction = extract_rois(
        &volume,
        &[CandidatePoint::new(2.0, 3.0, 4.0)],
        &roi_config(2.0, 1.0, 0.0),
        &PixelSpacing::default(),
    )
    .unwrap();
    let roi = &extraction.rois[0];
    let data = crop(&volume, roi);
    assert_eq!(data.dim(), (4, 3, 3));
    assert_eq!(data[[1, 0, 0]], volume.data[[1, 2, 3]]);
}

#[test]
fn test_invalid_roi_config() {
    let volume = ramp_volume((4, 4, 4));
    for config in [
        roi_config(0.0, 1.0, 0.0),
        roi_config(1.0, -1.0, 0.0),
        roi_config(1.0, 1.0, -0.5),
    ] {
        assert!(matches!(
            extract_rois(&volume, &[], &config, &PixelSpacing::default()),
            Err(BeadError::InvalidConfig(_))
        ));
    }
    assert!(matches!(
        extract_rois(
            &volume,
            &[],
            &RoiConfig::default(),
            &PixelSpacing::new(1.0, 0.0, 1.0)
        ),
        Err(BeadError::InvalidConfig(_))
    ));
}
