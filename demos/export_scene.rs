//! Example exporting bone motion from a scene description.
//!
//! Usage: `export_scene [scene.json] [settings.json] [output]`. Without
//! arguments a small walking rig is built in code and exported next to the
//! working directory as `walk.csv` and `walk.json`.

use bonemotion::host::{Scene, SceneDesc};
use bonemotion::*;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};

fn walking_scene() -> anyhow::Result<Scene> {
    fn offset(x: f64, y: f64, z: f64) -> LocalTransform {
        LocalTransform {
            location: Axes { x, y, z },
            ..Default::default()
        }
    }

    fn swing(angle: f64) -> LocalTransform {
        LocalTransform {
            rotation: Axes {
                x: angle,
                y: 0.0,
                z: 0.0,
            },
            ..Default::default()
        }
    }

    let armature = Armature::build(
        "Walker",
        LocalTransform::IDENTITY,
        vec![
            BoneDesc::new("Hips").with_rest(offset(0.0, 0.0, 1.0)),
            BoneDesc::new("Spine")
                .with_parent("Hips")
                .with_rest(offset(0.0, 0.0, 0.3)),
            BoneDesc::new("Head")
                .with_parent("Spine")
                .with_rest(offset(0.0, 0.0, 0.5)),
            BoneDesc::new("LeftUpLeg")
                .with_parent("Hips")
                .with_rest(offset(0.1, 0.0, -0.1)),
            BoneDesc::new("RightUpLeg")
                .with_parent("Hips")
                .with_rest(offset(-0.1, 0.0, -0.1)),
            BoneDesc::new("IK_Target").hidden(),
        ],
    )?;

    let mut action = Action::new("Walk");
    for (frame, phase) in [(1.0, 0.0), (13.0, 1.0), (25.0, 0.0), (37.0, -1.0), (49.0, 0.0)] {
        action.insert_key("Hips", frame, offset(frame * 0.05, 0.0, 0.02 * phase));
        action.insert_key("LeftUpLeg", frame, swing(0.4 * phase));
        action.insert_key("RightUpLeg", frame, swing(-0.4 * phase));
    }

    Ok(Scene::new(Some(armature), Some(action)))
}

fn main() -> anyhow::Result<()> {
    let config = ConfigBuilder::new().set_target_level(LevelFilter::Off).build();
    TermLogger::init(
        LevelFilter::Info,
        config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let mut args = std::env::args().skip(1);
    let scene_path = args.next();
    let settings_path = args.next();
    let output = args.next().unwrap_or_else(|| "walk".to_owned());

    let mut scene = match scene_path {
        Some(path) => Scene::from_json_file(path)?,
        None => walking_scene()?,
    };

    let formats = match settings_path {
        Some(path) => vec![ExportSettings::from_json_file(path)?],
        None => vec![
            ExportSettings::default(),
            ExportSettings {
                export_format: ExportFormat::Json,
                coordinate_system: CoordinateSystem::World,
                precision: 4,
                ..Default::default()
            },
        ],
    };

    for settings in formats.iter() {
        let outcome = run_export(&mut scene, settings, &output);
        println!("{}", outcome.report());
        if let ExportOutcome::Cancelled(err) = outcome {
            return Err(err.into());
        }
    }

    // Round-trip the scene description so it can be edited and fed back in
    if std::env::args().len() == 1 {
        let desc = SceneDesc::from(scene);
        std::fs::write("walk.scene.json", serde_json::to_string_pretty(&desc)?)?;
        println!("Scene description written to: walk.scene.json");
    }

    Ok(())
}
