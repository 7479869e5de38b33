use std::num::NonZeroU32;

use serde_json::Value;

use super::*;
use crate::{
    Action, Armature, Axes, BoneDesc, ErrorKind, FrameRange, FrameRangeOverride, LocalTransform,
    MissingBonePolicy, Scene,
};

fn at_x(x: f64) -> LocalTransform {
    LocalTransform {
        location: Axes { x, y: 0.0, z: 0.0 },
        ..Default::default()
    }
}

fn rig(bones: Vec<BoneDesc>) -> Armature {
    Armature::build("Rig", LocalTransform::IDENTITY, bones).unwrap()
}

/// Hips slides from x=0 at frame 1 to x=10 at frame 10, Spine stays put at z=1
fn linear_scene() -> Scene {
    let armature = rig(vec![
        BoneDesc::new("Hips"),
        BoneDesc::new("Spine").with_rest(LocalTransform {
            location: Axes {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
            ..Default::default()
        }),
    ]);
    let action = Action::new("Slide")
        .with_key("Hips", 1.0, at_x(0.0))
        .with_key("Hips", 10.0, at_x(10.0))
        .with_key("Spine", 1.0, LocalTransform::IDENTITY);
    Scene::new(Some(armature), Some(action)).with_frame(1)
}

fn settings(coordinate_system: CoordinateSystem) -> ExportSettings {
    ExportSettings {
        coordinate_system,
        ..Default::default()
    }
}

fn record(motion: &MotionData, frame: Frame) -> &ExportRecord {
    motion.records.iter().find(|x| x.frame == frame).unwrap()
}

/// Hides poses of chosen bones at chosen frames
struct GapHost {
    scene: Scene,
    gaps: Vec<(&'static str, Frame)>,
}

impl PoseHost for GapHost {
    fn armature(&self) -> Option<&Armature> {
        self.scene.armature()
    }

    fn action_range(&self) -> Option<FrameRange> {
        self.scene.action_range()
    }

    fn current_frame(&self) -> Frame {
        self.scene.current_frame()
    }

    fn set_frame(&mut self, frame: Frame) {
        self.scene.set_frame(frame);
    }

    fn bone_pose(&self, bone: &str) -> Option<TransformSample> {
        let frame = self.scene.current_frame();
        if self.gaps.iter().any(|&(x, f)| x == bone && f == frame) {
            None
        } else {
            self.scene.bone_pose(bone)
        }
    }
}

#[test]
fn test_linear_track_normalized() {
    let mut scene = linear_scene();
    let settings = ExportSettings {
        bone_selection: BoneSelection::Bone("Hips".to_owned()),
        ..settings(CoordinateSystem::Normalized)
    };
    let motion = sample_motion(&mut scene, &settings).unwrap();

    assert_eq!(motion.records.len(), 10);
    let pos_x = |frame| record(&motion, frame).values[0].unwrap().position.x;
    assert_eq!(pos_x(1), -1.0);
    assert_eq!(pos_x(10), 1.0);
    assert!(pos_x(5).abs() <= 0.25);
    assert!(pos_x(6).abs() <= 0.25);
}

#[test]
fn test_constant_bone_normalizes_to_midpoint() {
    let mut scene = linear_scene();
    let motion = sample_motion(&mut scene, &settings(CoordinateSystem::Normalized)).unwrap();

    for record in motion.records.iter() {
        let spine = record.values[1].unwrap();
        assert_eq!(spine.position, Axes::default());
        assert_eq!(spine.rotation, Axes::default());
    }
}

#[test]
fn test_values_outside_prescan_are_clamped() {
    let armature = rig(vec![BoneDesc::new("Hips")]);
    // The spike at frame 2 falls between pre-scan frames
    let action = Action::new("Spike")
        .with_key("Hips", 0.0, at_x(0.0))
        .with_key("Hips", 1.0, at_x(0.0))
        .with_key("Hips", 2.0, at_x(50.0))
        .with_key("Hips", 3.0, at_x(0.0))
        .with_key("Hips", 100.0, at_x(0.0));
    let mut scene = Scene::new(Some(armature), Some(action));

    let motion = sample_motion(&mut scene, &settings(CoordinateSystem::Normalized)).unwrap();
    assert_eq!(motion.records.len(), 101);
    assert_eq!(record(&motion, 2).values[0].unwrap().position.x, 1.0);

    for record in motion.records.iter() {
        for value in record.values[0].unwrap().channels() {
            assert!((-1.0..=1.0).contains(&value), "{value} out of range");
        }
    }
}

#[test]
fn test_world_values_are_rounded() {
    let mut scene = linear_scene();
    let settings = ExportSettings {
        precision: 2,
        ..settings(CoordinateSystem::World)
    };
    let motion = sample_motion(&mut scene, &settings).unwrap();
    let hips = record(&motion, 5).values[0].unwrap();
    assert_eq!(hips.position.x, 4.44);
    let spine = record(&motion, 5).values[1].unwrap();
    assert_eq!(spine.position.z, 1.0);
}

#[test]
fn test_cursor_restored_after_export() {
    let mut scene = linear_scene().with_frame(7);
    sample_motion(&mut scene, &settings(CoordinateSystem::Normalized)).unwrap();
    assert_eq!(scene.current_frame(), 7);
}

#[test]
fn test_inverted_range_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("motion.csv");
    let mut scene = linear_scene().with_frame(3);
    let settings = ExportSettings {
        frame_range: Some(FrameRangeOverride { start: 10, end: 5 }),
        ..Default::default()
    };

    let err = export_motion(&mut scene, &settings, &path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);
    assert!(!path.exists());
    assert_eq!(scene.current_frame(), 3);
}

#[test]
fn test_missing_sources() {
    let settings = ExportSettings::default();

    let mut empty = Scene::new(None, None);
    let err = sample_motion(&mut empty, &settings).unwrap_err();
    assert!(matches!(err, ExportError::MissingArmature));

    let mut unanimated = Scene::new(Some(rig(vec![BoneDesc::new("Hips")])), None);
    let err = sample_motion(&mut unanimated, &settings).unwrap_err();
    assert!(matches!(err, ExportError::MissingAction(ref name) if name == "Rig"));
    assert_eq!(err.kind(), ErrorKind::MissingSource);

    let mut unkeyed = Scene::new(
        Some(rig(vec![BoneDesc::new("Hips")])),
        Some(Action::new("Empty")),
    );
    let err = sample_motion(&mut unkeyed, &settings).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingSource);
}

#[test]
fn test_selection_errors() {
    let mut scene = linear_scene();
    let settings = ExportSettings {
        bone_selection: BoneSelection::Bone("Tail".to_owned()),
        ..Default::default()
    };
    let err = sample_motion(&mut scene, &settings).unwrap_err();
    assert!(matches!(err, ExportError::BoneNotFound(ref name) if name == "Tail"));

    let armature = rig(vec![BoneDesc::new("Ctrl").hidden()]);
    let action = Action::new("Idle").with_key("Ctrl", 1.0, LocalTransform::IDENTITY);
    let mut scene = Scene::new(Some(armature), Some(action));
    let err = sample_motion(&mut scene, &ExportSettings::default()).unwrap_err();
    assert!(matches!(err, ExportError::EmptySelection));
    assert_eq!(err.kind(), ErrorKind::Selection);

    let settings = ExportSettings {
        include_hidden_bones: true,
        ..Default::default()
    };
    let motion = sample_motion(&mut scene, &settings).unwrap();
    assert_eq!(motion.bones, ["Ctrl"]);
}

#[test]
fn test_hidden_bone_selectable_by_name() {
    let armature = rig(vec![BoneDesc::new("Root"), BoneDesc::new("Ctrl").hidden()]);
    let action = Action::new("Idle").with_key("Ctrl", 1.0, LocalTransform::IDENTITY);
    let mut scene = Scene::new(Some(armature), Some(action));
    let settings = ExportSettings {
        bone_selection: BoneSelection::Bone("Ctrl".to_owned()),
        ..Default::default()
    };
    let motion = sample_motion(&mut scene, &settings).unwrap();
    assert_eq!(motion.bones, ["Ctrl"]);
}

#[test]
fn test_stride_excludes_off_grid_end() {
    let mut scene = linear_scene();
    let settings = ExportSettings {
        sample_all_frames: true,
        frame_step: NonZeroU32::new(4).unwrap(),
        ..settings(CoordinateSystem::World)
    };
    let motion = sample_motion(&mut scene, &settings).unwrap();
    let frames: Vec<_> = motion.records.iter().map(|x| x.frame).collect();
    assert_eq!(frames, [1, 5, 9]);
    assert_eq!(motion.frame_range(), Some((1, 9)));
}

#[test]
fn test_auto_capped_stride() {
    let armature = rig(vec![BoneDesc::new("Hips")]);
    let action = Action::new("Long")
        .with_key("Hips", 0.0, at_x(0.0))
        .with_key("Hips", 2000.0, at_x(1.0));
    let mut scene = Scene::new(Some(armature), Some(action));

    let motion = sample_motion(&mut scene, &settings(CoordinateSystem::World)).unwrap();
    assert_eq!(motion.records.len(), 501);
    assert_eq!(motion.records[1].frame, 4);

    let all = ExportSettings {
        sample_all_frames: true,
        ..settings(CoordinateSystem::World)
    };
    let motion = sample_motion(&mut scene, &all).unwrap();
    assert_eq!(motion.records.len(), 2001);
}

#[test]
fn test_csv_two_bones() {
    let mut scene = linear_scene();
    let motion = sample_motion(&mut scene, &settings(CoordinateSystem::World)).unwrap();
    let csv = render_csv(&motion);
    let mut lines = csv.split("\r\n");

    let header: Vec<_> = lines.next().unwrap().split(',').collect();
    assert_eq!(header.len(), 13);
    assert_eq!(header[0], "frame");
    assert_eq!(header[1], "Hips_pos_x");
    assert_eq!(header[7], "Spine_pos_x");

    let first: Vec<_> = lines.next().unwrap().split(',').collect();
    assert_eq!(first.len(), 13);
    assert_eq!(first[0], "1");
    assert_eq!(first[1], "0.000000");
    assert_eq!(first[9], "1.000000");

    assert_eq!(csv.matches("\r\n").count(), 11);
}

#[test]
fn test_csv_single_bone() {
    let mut scene = linear_scene();
    let settings = ExportSettings {
        bone_selection: BoneSelection::Bone("Hips".to_owned()),
        precision: 3,
        ..settings(CoordinateSystem::Normalized)
    };
    let motion = sample_motion(&mut scene, &settings).unwrap();
    let csv = render_csv(&motion);
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("frame,pos_x,pos_y,pos_z,rot_x,rot_y,rot_z")
    );
    assert_eq!(
        lines.next(),
        Some("1,-1.000,0.000,0.000,0.000,0.000,0.000")
    );
}

#[test]
fn test_world_export_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ExportSettings {
        export_format: ExportFormat::Json,
        ..settings(CoordinateSystem::World)
    };

    let mut scene = linear_scene();
    let first = export_motion(&mut scene, &settings, dir.path().join("a")).unwrap();
    let second = export_motion(&mut scene, &settings, dir.path().join("b")).unwrap();

    assert_eq!(first.path, dir.path().join("a.json"));
    let a = std::fs::read(&first.path).unwrap();
    let b = std::fs::read(&second.path).unwrap();
    assert_eq!(a, b);
    assert_eq!(first.bytes_written, a.len());
}

#[test]
fn test_json_document() {
    let mut scene = linear_scene();
    let settings = ExportSettings {
        sample_all_frames: true,
        frame_step: NonZeroU32::new(4).unwrap(),
        ..settings(CoordinateSystem::Normalized)
    };
    let motion = sample_motion(&mut scene, &settings).unwrap();
    let json: Value = serde_json::from_slice(&render_json(&motion).unwrap()).unwrap();

    let metadata = &json["metadata"];
    assert_eq!(metadata["format"], JSON_FORMAT_NAME);
    assert_eq!(metadata["coordinate_system"], "normalized");
    assert_eq!(metadata["frame_count"], 3);
    assert_eq!(metadata["bone_count"], 2);
    assert_eq!(metadata["frame_range"], serde_json::json!([1, 9]));

    let frame = &json["by_frame"]["1"]["Hips"];
    assert_eq!(frame["position"]["x"], -1.0);
    assert_eq!(frame["rotation"]["z"], 0.0);

    assert_eq!(
        json["by_bone_type"]["hip"]["Hips"]["frames"]["9"]["position"]["x"],
        1.0
    );
    assert!(json["by_bone_type"]["spine"]["Spine"]["frames"]["5"].is_object());
}

#[test]
fn test_json_frame_keys_follow_sample_order() {
    let mut scene = linear_scene();
    let motion = sample_motion(&mut scene, &settings(CoordinateSystem::World)).unwrap();
    let text = String::from_utf8(render_json(&motion).unwrap()).unwrap();

    let nine = text.find("\"9\": {").unwrap();
    let ten = text.find("\"10\": {").unwrap();
    assert!(nine < ten);
}

#[test]
fn test_abort_policy_on_missing_pose() {
    let mut host = GapHost {
        scene: linear_scene().with_frame(2),
        gaps: vec![("Spine", 4)],
    };

    let err = sample_motion(&mut host, &settings(CoordinateSystem::World)).unwrap_err();
    assert!(matches!(
        err,
        ExportError::MissingBonePose { ref bone, frame: 4 } if bone == "Spine"
    ));
    assert_eq!(host.current_frame(), 2);
}

#[test]
fn test_skip_policy_omits_missing_pose() {
    let mut host = GapHost {
        scene: linear_scene(),
        gaps: vec![("Spine", 4), ("Hips", 10)],
    };
    let settings = ExportSettings {
        missing_bone_policy: MissingBonePolicy::Skip,
        ..settings(CoordinateSystem::Normalized)
    };

    let motion = sample_motion(&mut host, &settings).unwrap();
    assert!(record(&motion, 4).values[1].is_none());
    assert!(record(&motion, 10).values[0].is_none());
    // Frame 10 was missing from the pre-scan, so Hips tops out at frame 9
    assert_eq!(record(&motion, 9).values[0].unwrap().position.x, 1.0);

    let csv = render_csv(&motion);
    let row = csv.lines().find(|x| x.starts_with("4,")).unwrap();
    assert!(row.ends_with(",,,,,,"));

    let json: Value = serde_json::from_slice(&render_json(&motion).unwrap()).unwrap();
    assert!(json["by_frame"]["4"].get("Spine").is_none());
    assert!(json["by_frame"]["4"].get("Hips").is_some());
    assert!(json["by_bone_type"]["hip"]["Hips"]["frames"].get("10").is_none());
}

#[test]
fn test_skip_policy_needs_one_prescan_sample() {
    let mut host = GapHost {
        scene: linear_scene(),
        gaps: (1..=10).map(|frame| ("Spine", frame)).collect(),
    };
    let settings = ExportSettings {
        missing_bone_policy: MissingBonePolicy::Skip,
        ..settings(CoordinateSystem::Normalized)
    };

    let err = sample_motion(&mut host, &settings).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingSource);
    assert!(matches!(err, ExportError::NoBoundsSamples(ref bone) if bone == "Spine"));
    assert_eq!(host.current_frame(), 1);
}

#[test]
fn test_run_export_reports() {
    let dir = tempfile::tempdir().unwrap();
    let mut scene = linear_scene();

    let outcome = run_export(&mut scene, &ExportSettings::default(), dir.path().join("motion"));
    assert!(outcome.is_finished());
    assert!(outcome.report().starts_with("Motion data exported to: "));
    assert!(outcome.report().ends_with("motion.csv"));

    let settings = ExportSettings {
        bone_selection: BoneSelection::Bone("Tail".to_owned()),
        ..Default::default()
    };
    let outcome = run_export(&mut scene, &settings, dir.path().join("missing"));
    assert!(!outcome.is_finished());
    assert_eq!(outcome.report(), "Selected bone 'Tail' not found");
    assert!(!dir.path().join("missing.csv").exists());
}

#[test]
fn test_unwritable_destination() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no_such_dir").join("motion.csv");
    let mut scene = linear_scene();

    let err = export_motion(&mut scene, &ExportSettings::default(), &path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_demo_scene_and_settings() {
    let mut scene: Scene =
        serde_json::from_str(include_str!("../../demos/data/wave.scene.json")).unwrap();
    let settings = ExportSettings::from_json_str(
        std::path::Path::new("settings.json"),
        include_str!("../../demos/data/settings.json"),
    )
    .unwrap();

    let motion = sample_motion(&mut scene, &settings).unwrap();
    assert_eq!(motion.bones, ["Spine", "RightArm", "RightHand"]);
    assert_eq!(motion.frame_range(), Some((1, 23)));
    assert_eq!(motion.records.len(), 12);

    let json: Value = serde_json::from_slice(&motion.render(settings.export_format).unwrap()).unwrap();
    let arm = json["by_bone_type"]["arm"].as_object().unwrap();
    assert_eq!(arm.len(), 2);
    assert!(json["by_bone_type"]["spine"]["Spine"]["frames"]["23"].is_object());
}

mod normalized_range {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn prop_normalized_values_in_unit_range(
            keys in prop::collection::vec(-100.0f64..100.0, 2..8),
            start in -50i32..50,
            gap in 1i32..20,
            step in 1u32..5,
        ) {
            let armature = rig(vec![BoneDesc::new("Hips")]);
            let mut action = Action::new("Noise");
            for (index, &value) in keys.iter().enumerate() {
                let frame = start + index as i32 * gap;
                let transform = LocalTransform {
                    location: Axes { x: value, y: -0.5 * value, z: 0.0 },
                    rotation: Axes { x: 0.0, y: 0.0, z: value / 100.0 },
                };
                action.insert_key("Hips", frame as f64, transform);
            }
            let mut scene = Scene::new(Some(armature), Some(action));
            let settings = ExportSettings {
                frame_step: NonZeroU32::new(step).unwrap(),
                ..settings(CoordinateSystem::Normalized)
            };

            let motion = sample_motion(&mut scene, &settings).unwrap();
            prop_assert!(!motion.records.is_empty());
            for record in motion.records.iter() {
                let sample = record.values[0].unwrap();
                for value in sample.channels() {
                    prop_assert!((-1.0..=1.0).contains(&value), "{} out of range", value);
                }
            }
        }
    }
}
