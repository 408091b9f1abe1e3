//! Frame, engine and workspace fixtures

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use repcount_engine::config::AnalysisConfig;
use repcount_engine::pose::{pushup_pose, LandmarkPassthrough};
use repcount_engine::{Engine, FramePayload, SessionRegistry};

/// Elbow angle well inside the "up" band
pub const UP: f64 = 170.0;
/// Elbow angle well inside the "down" band
pub const DOWN: f64 = 70.0;
/// Elbow angle between the thresholds
pub const MID: f64 = 115.0;
/// Hip offset that breaks alignment
pub const MISALIGNED: f64 = 0.3;

/// Engine with the landmark passthrough estimator and default settings
pub fn test_engine() -> Arc<Engine> {
    Arc::new(Engine::new(
        Arc::new(SessionRegistry::new()),
        Arc::new(LandmarkPassthrough),
        AnalysisConfig::default(),
    ))
}

/// Landmark frame with both elbows at `angle`
pub fn landmark_frame(angle: f64, torso_offset: f64) -> FramePayload {
    FramePayload::Landmarks {
        landmarks: pushup_pose(angle, angle, torso_offset).landmarks,
        confidence: 0.9,
    }
}

/// `frame` protocol message as JSON
pub fn frame_message(angle: f64, torso_offset: f64) -> Value {
    json!({ "type": "frame", "frame": landmark_frame(angle, torso_offset) })
}

/// Temp directory for running the CLI binary
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("repcount.toml")
    }

    /// Write a file relative to the workspace
    pub fn add_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.dir.path().join(relative_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// Write a recording of landmark frames, one per (angle, torso offset)
    pub fn add_recording(&self, relative_path: &str, frames: &[(f64, f64)]) -> PathBuf {
        let frames: Vec<FramePayload> = frames
            .iter()
            .map(|&(angle, offset)| landmark_frame(angle, offset))
            .collect();
        self.add_file(relative_path, &serde_json::to_string(&frames).unwrap())
    }

    /// Run the repcount binary in the workspace
    pub fn run_cli(&self, args: &[&str]) -> std::io::Result<Output> {
        Command::new(env!("CARGO_BIN_EXE_repcount"))
            .current_dir(self.path())
            .env_remove("REPCOUNT_CONFIG")
            .env_remove("RUST_LOG")
            .args(args)
            .output()
    }

    /// Run CLI and expect success, return stdout
    pub fn run_cli_success(&self, args: &[&str]) -> String {
        let output = self.run_cli(args).expect("Failed to run CLI");
        assert!(
            output.status.success(),
            "CLI command {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Run CLI and expect failure, return (exit code, stderr)
    pub fn run_cli_failure(&self, args: &[&str]) -> (Option<i32>, String) {
        let output = self.run_cli(args).expect("Failed to run CLI");
        assert!(
            !output.status.success(),
            "CLI command {:?} should have failed",
            args
        );
        (
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).to_string(),
        )
    }
}
