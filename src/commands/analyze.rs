//! Analyze command implementation
//!
//! A file holding one frame prints that frame's analysis. A file holding an
//! array of frames is replayed in order through a fresh session, printing
//! per-frame counters and the final summary.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::api::{parse_frame, StartSessionRequest};
use crate::cli::{AnalyzeArgs, OutputFormat};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::pose::{FrameAnalysis, FramePayload, LandmarkPassthrough};
use crate::session::{SessionOptionsOverride, SessionRegistry, SessionSummary};

use super::{to_json, CommandContext};

const REPLAY_SESSION: &str = "replay";

/// One replayed frame with the counters after it
#[derive(Debug, Serialize)]
struct ReplayStep {
    frame: usize,
    analysis: FrameAnalysis,
    rep_count: u32,
    valid_rep_count: u32,
}

#[derive(Debug, Serialize)]
struct ReplayReport {
    frames: Vec<ReplayStep>,
    summary: SessionSummary,
}

/// Run the analyze command
pub fn run_analyze(ctx: &CommandContext, args: &AnalyzeArgs, config: &EngineConfig) -> Result<String> {
    let frames = load_frames(&args.path)?;
    if ctx.verbose {
        eprintln!("Read {} frame(s) from {}", frames.len(), args.path.display());
    }

    // Recordings already carry landmarks; no model is involved
    let engine = Engine::new(
        Arc::new(SessionRegistry::with_defaults(config.session)),
        Arc::new(LandmarkPassthrough),
        config.analysis.clone(),
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|e| EngineError::Config {
            message: format!("Failed to create tokio runtime: {}", e),
        })?;

    match frames {
        LoadedFrames::Single(frame) => {
            let analysis = runtime.block_on(engine.analyze_frame(&frame))?;
            match ctx.format {
                OutputFormat::Json => Ok(format!("{}\n", to_json(&analysis)?)),
                OutputFormat::Text => Ok(format_analysis(&analysis)),
            }
        }
        LoadedFrames::Sequence(frames) => {
            let overrides = SessionOptionsOverride {
                min_depth_angle: args.min_depth_angle,
                min_extension_angle: args.min_extension_angle,
            };
            let report = runtime.block_on(replay(&engine, &frames, overrides))?;
            match ctx.format {
                OutputFormat::Json => Ok(format!("{}\n", to_json(&report)?)),
                OutputFormat::Text => Ok(format_report(&report)),
            }
        }
    }
}

enum LoadedFrames {
    Single(FramePayload),
    Sequence(Vec<FramePayload>),
}

impl LoadedFrames {
    fn len(&self) -> usize {
        match self {
            LoadedFrames::Single(_) => 1,
            LoadedFrames::Sequence(frames) => frames.len(),
        }
    }
}

fn load_frames(path: &Path) -> Result<LoadedFrames> {
    let content = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content).map_err(|e| EngineError::InvalidMessage {
        message: format!("{} is not valid JSON: {}", path.display(), e),
    })?;

    match value {
        Value::Array(items) => items
            .into_iter()
            .map(parse_frame)
            .collect::<Result<Vec<_>>>()
            .map(LoadedFrames::Sequence),
        other => parse_frame(other).map(LoadedFrames::Single),
    }
}

async fn replay(
    engine: &Engine,
    frames: &[FramePayload],
    options: SessionOptionsOverride,
) -> Result<ReplayReport> {
    engine.start_session(StartSessionRequest {
        session_id: Some(REPLAY_SESSION.to_string()),
        options,
    })?;

    let mut steps = Vec::with_capacity(frames.len());
    for (index, frame) in frames.iter().enumerate() {
        let processed = engine.process_frame(REPLAY_SESSION, frame).await?;
        steps.push(ReplayStep {
            frame: index + 1,
            rep_count: processed.update.status.rep_count,
            valid_rep_count: processed.update.status.valid_rep_count,
            analysis: processed.analysis,
        });
    }

    let summary = engine.end_session(REPLAY_SESSION)?;
    Ok(ReplayReport {
        frames: steps,
        summary,
    })
}

fn format_analysis(analysis: &FrameAnalysis) -> String {
    let mut out = String::new();
    match analysis.phase {
        Some(phase) => {
            out.push_str(&format!(
                "phase: {}  elbows: L {:.1}° R {:.1}° (avg {:.1}°)\n",
                phase,
                analysis.left_elbow_angle,
                analysis.right_elbow_angle,
                analysis.avg_elbow_angle
            ));
            if let Some(alignment) = &analysis.alignment {
                out.push_str(&format!(
                    "aligned: {}  deviation: {:.3}\n",
                    if alignment.is_aligned { "yes" } else { "no" },
                    alignment.deviation
                ));
            }
        }
        None => out.push_str("phase: -\n"),
    }
    for line in &analysis.feedback {
        out.push_str(&format!("  • {}\n", line));
    }
    out
}

fn format_report(report: &ReplayReport) -> String {
    let mut out = String::new();
    for step in &report.frames {
        let phase = step
            .analysis
            .phase
            .map(|p| p.as_str())
            .unwrap_or("-");
        out.push_str(&format!(
            "#{:<4} {:<10} {:>6.1}°  {:<5} reps {} ({} valid)\n",
            step.frame,
            phase,
            step.analysis.avg_elbow_angle,
            if step.analysis.is_valid_pose { "ok" } else { "bad" },
            step.rep_count,
            step.valid_rep_count
        ));
    }

    let summary = &report.summary;
    out.push_str(&format!(
        "\n{} reps ({} valid) over {} frames, accuracy {}%\n",
        summary.total_reps, summary.valid_reps, summary.total_frames, summary.accuracy
    ));
    for line in &summary.feedback {
        out.push_str(&format!("  • {}\n", line));
    }
    out
}
