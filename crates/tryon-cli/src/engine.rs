use crate::commands::{UserCommand, HELP};
use crate::config::Config;
use crate::terminal::TerminalUi;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tryon_core::{FaceLandmarks, RgbaCanvas};
use tryon_hw::{Camera, CameraError, Frame};
use tryon_session::{
    snapshot, DriveFolderSource, HttpImageLoader, LandmarkTracker, SessionController,
    SubprocessTracker, TaskRunner, TrackerError, Ui,
};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("camera error: {0}")]
    Camera(#[from] CameraError),
    #[error("capture thread exited")]
    ChannelClosed,
}

/// Messages from the capture thread to the session loop.
enum CaptureEvent {
    Frame {
        frame: Frame,
        landmarks: Option<FaceLandmarks>,
    },
    /// The tracker helper could not be started.
    TrackerFailed(TrackerError),
    /// The tracker helper died partway through the session.
    TrackerLost(TrackerError),
    Stopped(CameraError),
}

/// Handle to the capture thread.
struct Capture {
    width: u32,
    height: u32,
    rx: mpsc::Receiver<CaptureEvent>,
}

/// Spawn camera capture and landmark tracking on a dedicated OS thread.
///
/// The camera is opened on that thread; this waits only for the open to
/// succeed or fail. Frames are handed over through a one-slot channel and
/// dropped while the session loop is still busy with the previous one.
async fn spawn_capture(config: &Config) -> Result<Capture, EngineError> {
    let (ready_tx, ready_rx) = oneshot::channel::<Result<(u32, u32), CameraError>>();
    let (tx, rx) = mpsc::channel::<CaptureEvent>(1);

    let device = config.camera_device.clone();
    let (width, height) = (config.capture_width, config.capture_height);
    let warmup = config.warmup_frames;
    let tracker_command = config.tracker_command.clone();

    std::thread::Builder::new()
        .name("tryon-capture".into())
        .spawn(move || {
            let camera = match Camera::open_with_size(&device, width, height) {
                Ok(c) => {
                    let _ = ready_tx.send(Ok((c.width, c.height)));
                    c
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            capture_loop(&camera, &tracker_command, warmup, tx);
            tracing::info!("capture thread exiting");
        })
        .map_err(|e| CameraError::CaptureFailed(format!("failed to spawn capture thread: {e}")))?;

    let (width, height) = ready_rx.await.map_err(|_| EngineError::ChannelClosed)??;
    tracing::info!(width, height, "camera ready");
    Ok(Capture { width, height, rx })
}

fn capture_loop(
    camera: &Camera,
    tracker_command: &str,
    warmup: usize,
    tx: mpsc::Sender<CaptureEvent>,
) {
    let mut tracker: Option<Box<dyn LandmarkTracker>> =
        match SubprocessTracker::spawn(tracker_command) {
            Ok(t) => Some(Box::new(t)),
            Err(e) => {
                let _ = tx.blocking_send(CaptureEvent::TrackerFailed(e));
                None
            }
        };

    let mut stream = match camera.stream() {
        Ok(s) => s,
        Err(e) => {
            let _ = tx.blocking_send(CaptureEvent::Stopped(e));
            return;
        }
    };

    if warmup > 0 {
        tracing::info!(count = warmup, "discarding warmup frames");
        for _ in 0..warmup {
            let _ = stream.next_frame();
        }
    }

    let mut dropped = 0u64;
    loop {
        let frame = match stream.next_frame() {
            Ok(f) => f,
            Err(e) => {
                let _ = tx.blocking_send(CaptureEvent::Stopped(e));
                return;
            }
        };

        let landmarks = match tracker.as_mut().map(|t| t.process(&frame)) {
            Some(Ok(landmarks)) => landmarks,
            Some(Err(e)) => {
                tracker = None;
                let _ = tx.blocking_send(CaptureEvent::TrackerLost(e));
                None
            }
            None => None,
        };

        match tx.try_send(CaptureEvent::Frame { frame, landmarks }) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                dropped += 1;
                if dropped % 100 == 1 {
                    tracing::debug!(dropped, "session busy; dropping frames");
                }
            }
            Err(mpsc::error::TrySendError::Closed(_)) => return,
        }
    }
}

async fn next_capture_event(capture: &mut Option<Capture>) -> Option<CaptureEvent> {
    match capture {
        Some(c) => c.rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at.into()).await,
        None => std::future::pending().await,
    }
}

/// Mutable state of the live session, owned by the event loop.
struct Session {
    config: Config,
    controller: SessionController,
    runner: TaskRunner,
    ui: TerminalUi,
    canvas: RgbaCanvas,
    last_frame: Option<Frame>,
    last_preview: Option<Instant>,
}

impl Session {
    /// Returns false when the user asked to quit.
    fn handle_command(&mut self, line: &str) -> bool {
        if line.trim().is_empty() {
            return true;
        }
        let command = match line.parse::<UserCommand>() {
            Ok(c) => c,
            Err(e) => {
                println!("{e}");
                return true;
            }
        };

        match command {
            UserCommand::Mode(category) => {
                let request = self.controller.select_mode(category, &mut self.ui);
                self.runner.submit_refresh_opt(request);
            }
            UserCommand::Pick(n) => {
                let Some(category) = self.controller.mode() else {
                    self.ui.notify("Choose earrings or necklaces first.");
                    return true;
                };
                if let Some(request) = self.controller.pick(category, n - 1, &mut self.ui) {
                    self.runner.submit_load(request);
                }
            }
            UserCommand::List => match self.controller.mode() {
                Some(category) => {
                    self.ui.show_panel(category);
                    self.ui
                        .show_options(category, self.controller.cache().get(category));
                }
                None => println!("no jewelry type selected"),
            },
            UserCommand::Refresh => match self.controller.mode() {
                Some(category) => {
                    let request = self.controller.request_refresh(category, &mut self.ui);
                    self.runner.submit_refresh_opt(request);
                }
                None => println!("no jewelry type selected"),
            },
            UserCommand::Snapshot => {
                match snapshot::save_snapshot(
                    self.last_frame.as_ref(),
                    &self.controller,
                    &self.config.snapshot_dir,
                ) {
                    Ok(path) => println!("saved {}", path.display()),
                    Err(snapshot::SnapshotError::CameraNotReady) => {
                        self.ui.notify("Camera not ready. Cannot take a snapshot.");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "snapshot failed");
                        self.ui.notify(&format!("Snapshot failed: {e}"));
                    }
                }
            }
            UserCommand::Help => println!("{HELP}"),
            UserCommand::Quit => return false,
        }
        true
    }

    /// Returns false once the capture thread has stopped.
    fn handle_capture(&mut self, event: CaptureEvent) -> bool {
        match event {
            CaptureEvent::Frame { frame, landmarks } => {
                self.canvas.resize(frame.width, frame.height);
                self.controller.on_frame(landmarks.as_ref(), &mut self.canvas);
                self.last_frame = Some(frame);
                self.write_preview();
                true
            }
            CaptureEvent::TrackerFailed(e) => {
                tracing::error!(error = %e, "landmark tracker unavailable; overlay disabled");
                self.ui
                    .notify("Face tracking failed to start. Jewelry overlay is disabled.");
                true
            }
            CaptureEvent::TrackerLost(e) => {
                tracing::error!(error = %e, "landmark tracker lost; overlay frozen");
                self.ui
                    .notify("Face tracking stopped. Jewelry stays at its last position.");
                true
            }
            CaptureEvent::Stopped(e) => {
                tracing::error!(error = %e, "camera stopped");
                // A frozen frame must not be saved as a snapshot
                self.last_frame = None;
                self.ui.notify(e.user_message());
                false
            }
        }
    }

    fn write_preview(&mut self) {
        let Some(path) = self.config.preview_path.as_ref() else {
            return;
        };
        let now = Instant::now();
        if self
            .last_preview
            .is_some_and(|t| now.duration_since(t) < self.config.preview_interval)
        {
            return;
        }
        self.last_preview = Some(now);

        let result = snapshot::composite(self.last_frame.as_ref(), &self.canvas)
            .map_err(|e| e.to_string())
            .and_then(|canvas| {
                let tmp = path.with_extension("tmp.png");
                canvas.save_png(&tmp).map_err(|e| e.to_string())?;
                std::fs::rename(&tmp, path).map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "preview write failed");
        }
    }
}

/// Run the interactive try-on session until `quit`, EOF on stdin, or Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("tryon/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let source = Arc::new(DriveFolderSource::new(client.clone(), config.folders.clone()));
    let loader = Arc::new(HttpImageLoader::new(client));
    let (runner, mut completions) = TaskRunner::new(source, loader);

    let mut ui = TerminalUi::new(config.notify_duration);

    let mut capture = match spawn_capture(&config).await {
        Ok(c) => Some(c),
        Err(EngineError::Camera(e)) => {
            tracing::error!(device = %config.camera_device, error = %e, "camera unavailable");
            ui.notify(e.user_message());
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "camera unavailable");
            ui.notify("The camera could not be started.");
            None
        }
    };
    let (width, height) = capture
        .as_ref()
        .map(|c| (c.width, c.height))
        .unwrap_or((config.capture_width, config.capture_height));

    let refresh_period = config.refresh_interval;
    let mut session = Session {
        controller: SessionController::with_window(config.smoothing_window),
        canvas: RgbaCanvas::new(width, height),
        config,
        runner,
        ui,
        last_frame: None,
        last_preview: None,
    };

    println!("{HELP}");
    session.ui.print_prompt();

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut refresh = tokio::time::interval_at(
        tokio::time::Instant::now() + refresh_period,
        refresh_period,
    );
    refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        let banner_deadline = session.ui.banner_expires_at();
        tokio::select! {
            line = stdin.next_line() => match line? {
                Some(line) => {
                    if !session.handle_command(&line) {
                        break;
                    }
                    session.ui.print_prompt();
                }
                None => break,
            },
            Some(done) = completions.recv() => {
                done.apply(&mut session.controller, &mut session.ui);
            }
            event = next_capture_event(&mut capture) => match event {
                Some(event) => {
                    if !session.handle_capture(event) {
                        capture = None;
                    }
                }
                None => {
                    tracing::warn!("capture channel closed");
                    capture = None;
                }
            },
            _ = refresh.tick() => {
                let request = session.controller.tick(&mut session.ui);
                session.runner.submit_refresh_opt(request);
            }
            _ = sleep_until_opt(banner_deadline) => session.ui.dismiss_expired(),
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    tracing::info!("session ending");
    Ok(())
}
