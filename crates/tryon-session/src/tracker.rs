//! External face-landmark tracker adapter.
//!
//! The face mesh model lives in a helper process. For every frame we write
//! a one-line JSON header followed by the raw RGB24 bytes to its stdin, and
//! read back one JSON line describing the first detected face:
//!
//! ```text
//! -> {"width":1280,"height":720,"format":"rgb24"}\n<1280*720*3 bytes>
//! <- {"face_detected":true,"landmarks":[[0.41,0.37,-0.02],...]}\n
//! ```

use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use thiserror::Error;
use tryon_core::FaceLandmarks;
use tryon_hw::Frame;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("no tracker command configured")]
    NoCommand,
    #[error("failed to launch tracker '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("tracker pipe error: {0}")]
    Io(#[from] std::io::Error),
    #[error("tracker exited")]
    Exited,
    #[error("malformed tracker packet: {0}")]
    Parse(String),
}

/// Consumes video frames and yields zero or one face per frame.
pub trait LandmarkTracker: Send {
    fn process(&mut self, frame: &Frame) -> Result<Option<FaceLandmarks>, TrackerError>;
}

#[derive(Debug, Serialize)]
struct FrameHeader<'a> {
    width: u32,
    height: u32,
    format: &'a str,
}

/// One response line from the tracker helper.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerPacket {
    pub face_detected: bool,
    /// Normalized points; components beyond x/y (depth) are ignored.
    #[serde(default)]
    pub landmarks: Vec<Vec<f32>>,
}

impl TrackerPacket {
    pub fn into_landmarks(self) -> Result<Option<FaceLandmarks>, TrackerError> {
        if !self.face_detected || self.landmarks.is_empty() {
            return Ok(None);
        }
        let points = self
            .landmarks
            .into_iter()
            .enumerate()
            .map(|(i, p)| match p.as_slice() {
                [x, y, ..] => Ok((*x, *y)),
                _ => Err(TrackerError::Parse(format!(
                    "landmark {i} has {} components",
                    p.len()
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(FaceLandmarks::new(points)))
    }
}

/// Parse a response line into landmarks.
pub fn parse_packet(line: &str) -> Result<Option<FaceLandmarks>, TrackerError> {
    let packet: TrackerPacket = serde_json::from_str(line.trim())
        .map_err(|e| TrackerError::Parse(format!("JSON parse error: {e}")))?;
    packet.into_landmarks()
}

/// Tracker helper running as a child process.
pub struct SubprocessTracker {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    line: String,
}

impl SubprocessTracker {
    /// Launch `command` (whitespace-separated program and arguments).
    pub fn spawn(command: &str) -> Result<Self, TrackerError> {
        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or(TrackerError::NoCommand)?;

        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| TrackerError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(TrackerError::Exited);
        };

        tracing::info!(command, pid = child.id(), "tracker helper started");

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            line: String::new(),
        })
    }
}

impl LandmarkTracker for SubprocessTracker {
    fn process(&mut self, frame: &Frame) -> Result<Option<FaceLandmarks>, TrackerError> {
        let header = serde_json::to_string(&FrameHeader {
            width: frame.width,
            height: frame.height,
            format: "rgb24",
        })
        .map_err(|e| TrackerError::Parse(e.to_string()))?;

        self.stdin.write_all(header.as_bytes())?;
        self.stdin.write_all(b"\n")?;
        self.stdin.write_all(&frame.data)?;
        self.stdin.flush()?;

        self.line.clear();
        if self.stdout.read_line(&mut self.line)? == 0 {
            return Err(TrackerError::Exited);
        }
        parse_packet(&self.line)
    }
}

impl Drop for SubprocessTracker {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        tracing::debug!("tracker helper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_face() {
        let lm = parse_packet(r#"{"face_detected":true,"landmarks":[[0.1,0.2,0.0],[0.3,0.4]]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(lm.points, vec![(0.1, 0.2), (0.3, 0.4)]);
    }

    #[test]
    fn test_parse_no_face() {
        assert!(parse_packet(r#"{"face_detected":false}"#).unwrap().is_none());
        assert!(parse_packet(r#"{"face_detected":true,"landmarks":[]}"#)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_parse_short_point() {
        let result = parse_packet(r#"{"face_detected":true,"landmarks":[[0.1]]}"#);
        assert!(matches!(result, Err(TrackerError::Parse(_))));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(parse_packet("not json"), Err(TrackerError::Parse(_))));
    }

    #[test]
    fn test_spawn_missing_program() {
        let result = SubprocessTracker::spawn("/nonexistent/face-mesh-helper --fast");
        assert!(matches!(result, Err(TrackerError::Spawn { .. })));
    }

    #[test]
    fn test_refined_mesh_packet() {
        // Iris refinement appends 10 points after the 468-point mesh
        let points: Vec<String> = (0..478).map(|i| format!("[{}.0,0.5,0.0]", i % 2)).collect();
        let line = format!(r#"{{"face_detected":true,"landmarks":[{}]}}"#, points.join(","));
        let landmarks = parse_packet(&line).unwrap().unwrap();
        assert_eq!(landmarks.len(), 478);
        assert_eq!(landmarks.get(361), Some((1.0, 0.5)));
        assert_eq!(landmarks.get(477), Some((1.0, 0.5)));
    }

    #[test]
    fn test_spawn_empty_command() {
        assert!(matches!(SubprocessTracker::spawn("   "), Err(TrackerError::NoCommand)));
    }

    #[test]
    fn test_helper_that_exits() {
        let mut tracker = SubprocessTracker::spawn("true").unwrap();
        let frame = Frame {
            data: vec![0u8; 12],
            width: 2,
            height: 2,
            timestamp: std::time::Instant::now(),
            sequence: 0,
        };
        // Either the write hits a closed pipe or the read sees EOF
        assert!(tracker.process(&frame).is_err());
    }
}
