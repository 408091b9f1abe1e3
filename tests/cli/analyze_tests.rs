//! Tests for the analyze command

use crate::common::{assert_valid_json, TestWorkspace, DOWN, MID, MISALIGNED, UP};

#[test]
fn test_replay_recording_json() {
    let ws = TestWorkspace::new();
    ws.add_recording(
        "session.json",
        &[
            (UP, 0.0),
            (DOWN, 0.0),
            (UP, 0.0),
            (DOWN, 0.0),
            (MID, 0.0),
            (UP, 0.0),
            (DOWN, 0.0),
            (UP, MISALIGNED),
            (DOWN, 0.0),
            (UP, 0.0),
        ],
    );

    let output = ws.run_cli_success(&["-f", "json", "analyze", "session.json"]);
    let report = assert_valid_json(&output, "analyze replay");

    let summary = &report["summary"];
    assert_eq!(summary["session_id"], "replay");
    assert_eq!(summary["total_reps"], 2);
    assert_eq!(summary["valid_reps"], 2);
    assert_eq!(summary["total_frames"], 10);
    assert_eq!(summary["valid_frames"], 9);
    assert_eq!(summary["accuracy"], 90.0);

    let frames = report["frames"].as_array().unwrap();
    assert_eq!(frames.len(), 10);
    assert_eq!(frames[2]["rep_count"], 1);
    // Transition between down and up breaks the edge
    assert_eq!(frames[5]["rep_count"], 1);
    assert_eq!(frames[7]["analysis"]["is_valid_pose"], false);
    assert_eq!(frames[7]["rep_count"], 1);
    assert_eq!(frames[9]["rep_count"], 2);
}

#[test]
fn test_replay_with_threshold_flags() {
    let ws = TestWorkspace::new();
    ws.add_recording("deep.json", &[(UP, 0.0), (DOWN, 0.0), (UP, 0.0)]);

    // 70 degrees is not below a 60 degree depth threshold
    let output = ws.run_cli_success(&[
        "--format",
        "json",
        "analyze",
        "deep.json",
        "--min-depth-angle",
        "60",
    ]);
    let report = assert_valid_json(&output, "analyze with flags");
    assert_eq!(report["frames"][1]["analysis"]["phase"], "transition");
    assert_eq!(report["summary"]["total_reps"], 0);
}

#[test]
fn test_replay_text_output() {
    let ws = TestWorkspace::new();
    ws.add_recording("rep.json", &[(UP, 0.0), (DOWN, 0.0), (UP, 0.0)]);

    let output = ws.run_cli_success(&["analyze", "rep.json"]);
    assert!(output.contains("1 reps (1 valid) over 3 frames"), "{}", output);
    assert!(output.contains("Rep 1 completed!"));
}

#[test]
fn test_single_frame_json() {
    let ws = TestWorkspace::new();
    let recording = ws.add_recording("tmp.json", &[(UP, MISALIGNED)]);
    // Unwrap the one-element array into a bare frame
    let frames: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(recording).unwrap()).unwrap();
    ws.add_file("frame.json", &frames[0].to_string());

    let output = ws.run_cli_success(&["-f", "json", "analyze", "frame.json"]);
    let analysis = assert_valid_json(&output, "single frame");
    assert_eq!(analysis["phase"], "up");
    assert_eq!(analysis["is_valid_pose"], false);
    assert_eq!(analysis["alignment"]["is_aligned"], false);
    assert!(analysis["feedback"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f == "Keep your body straight"));
}

#[test]
fn test_empty_landmarks_report_no_pose() {
    let ws = TestWorkspace::new();
    ws.add_file("empty.json", r#"{"kind": "landmarks", "landmarks": []}"#);

    let output = ws.run_cli_success(&["analyze", "empty.json"]);
    assert!(output.starts_with("phase: -"), "{}", output);
    assert!(output.contains("No pose detected"));
}

#[test]
fn test_missing_file_exit_code() {
    let ws = TestWorkspace::new();
    let (code, stderr) = ws.run_cli_failure(&["analyze", "nope.json"]);
    assert_eq!(code, Some(1));
    assert!(stderr.starts_with("Error:"), "{}", stderr);
}

#[test]
fn test_malformed_file_exit_code() {
    let ws = TestWorkspace::new();
    ws.add_file("broken.json", "{ not json");
    let (code, stderr) = ws.run_cli_failure(&["analyze", "broken.json"]);
    assert_eq!(code, Some(3));
    assert!(stderr.contains("not valid JSON"), "{}", stderr);
}

#[test]
fn test_image_frames_fail_without_model() {
    let ws = TestWorkspace::new();
    ws.add_file("image.json", r#"{"kind": "image", "data": "aGk="}"#);
    let (code, _) = ws.run_cli_failure(&["analyze", "image.json"]);
    assert_eq!(code, Some(4));
}
