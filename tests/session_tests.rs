mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use fitbuddy::capture::{FrameSource, PatternCapture, PixelFormat};
use fitbuddy::pipeline::PoseSampler;
use fitbuddy::sink::FeedbackBoard;
use fitbuddy::workout::{SessionCommand, WorkoutSession};
use fitbuddy::{CaptureConfig, PipelineConfig};
use tokio::runtime::Handle;

fn capture_config() -> CaptureConfig {
    CaptureConfig {
        device: String::new(),
        width: WIDTH,
        height: HEIGHT,
        fps: 60,
        format: PixelFormat::I420,
        buffer_count: 3,
    }
}

fn fast_pipeline() -> PipelineConfig {
    PipelineConfig {
        min_interval_ms: 100,
        ..pipeline_config()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn session_runs_until_timer_expires() {
    let script = (0..20)
        .map(|i| (Duration::ZERO, Ok(analysis(&format!("rep {i}")))))
        .collect();
    let analyzer = ScriptedAnalyzer::new(script);
    let board = Arc::new(FeedbackBoard::default());
    let sampler = PoseSampler::new(&fast_pipeline(), analyzer.clone(), board.clone(), Handle::current());
    let stats = sampler.stats();

    let mut source = PatternCapture::new(capture_config());
    let mut ticks = Vec::new();
    let summary = WorkoutSession::new("Squats", Duration::from_millis(400))
        .with_tick(Duration::from_millis(50))
        .run(&mut source, sampler, |remaining| ticks.push(remaining))
        .await
        .unwrap();

    assert!(summary.completed);
    assert_eq!(summary.name, "Squats");
    assert!(summary.elapsed >= Duration::from_millis(400));
    assert!(summary.stats.frames_seen > 0);
    assert!(summary.stats.samples_accepted >= 1);

    // Countdown readings never go up and end at zero
    assert!(ticks.windows(2).all(|w| w[1] <= w[0]));
    assert_eq!(ticks.last(), Some(&Duration::ZERO));

    // Every frame went back to the pool once the session closed
    assert_eq!(source.pool().available(), source.pool().capacity());

    settle(&stats, stats.snapshot().submitted).await;
    assert!(board.current().starts_with("rep "));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn finish_command_stops_early() {
    let analyzer = ScriptedAnalyzer::new(vec![]);
    let board = Arc::new(FeedbackBoard::default());
    let sampler = PoseSampler::new(&fast_pipeline(), analyzer, board, Handle::current());

    let mut source = PatternCapture::new(capture_config());
    let session = WorkoutSession::new("Plank", Duration::from_secs(60))
        .with_tick(Duration::from_millis(20));
    let controller = session.controller();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        controller.send(SessionCommand::Finish).unwrap();
    });

    let summary = tokio::time::timeout(
        Duration::from_secs(5),
        session.run(&mut source, sampler, |_| {}),
    )
    .await
    .expect("session ignored finish")
    .unwrap();

    assert!(!summary.completed);
    assert!(summary.elapsed < Duration::from_secs(60));
    assert_eq!(source.pool().available(), source.pool().capacity());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn paused_timer_does_not_expire() {
    let analyzer = ScriptedAnalyzer::new(vec![]);
    let board = Arc::new(FeedbackBoard::default());
    let sampler = PoseSampler::new(&fast_pipeline(), analyzer, board, Handle::current());

    let mut source = PatternCapture::new(capture_config());
    let session = WorkoutSession::new("Lunges", Duration::from_millis(200))
        .with_tick(Duration::from_millis(20));
    let controller = session.controller();
    controller.send(SessionCommand::Pause).unwrap();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(400)).await;
        controller.send(SessionCommand::Resume).unwrap();
    });

    let summary = tokio::time::timeout(
        Duration::from_secs(5),
        session.run(&mut source, sampler, |_| {}),
    )
    .await
    .expect("session never finished")
    .unwrap();

    assert!(summary.completed);
    assert!(summary.elapsed >= Duration::from_millis(400));
}
