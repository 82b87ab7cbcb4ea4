//! FFmpeg-backed recorder session

use crate::ffmpeg::{build_ffmpeg_args, locate_ffmpeg, CaptureBackend};
use crate::{CaptureError, CaptureRegion, CaptureResult, RecorderSession};
use log::{error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// Recorder settings
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub framerate: u32,
    /// Explicit encoder path; discovered with `locate_ffmpeg` when unset
    pub ffmpeg_path: Option<PathBuf>,
    /// Directory that receives finished recordings
    pub output_dir: PathBuf,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            framerate: 30,
            ffmpeg_path: None,
            output_dir: std::env::temp_dir(),
        }
    }
}

/// Records the screen by running ffmpeg as a child process
pub struct FfmpegRecorder {
    config: RecorderConfig,
    region: Option<CaptureRegion>,
    recording: bool,
    output_path: Option<PathBuf>,
    process: Option<Child>,
}

impl FfmpegRecorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            region: None,
            recording: false,
            output_path: None,
            process: None,
        }
    }

    fn spawn_encoder(&self, output: &Path) -> CaptureResult<Child> {
        let ffmpeg = match &self.config.ffmpeg_path {
            Some(path) => path.clone(),
            None => locate_ffmpeg()?,
        };
        let backend = CaptureBackend::detect()?;
        let args = build_ffmpeg_args(&backend, self.config.framerate, self.region, output);

        let mut command = Command::new(&ffmpeg);
        command
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        platform::configure(&mut command);

        command
            .spawn()
            .map_err(|source| CaptureError::Spawn { path: ffmpeg, source })
    }
}

impl RecorderSession for FfmpegRecorder {
    fn region(&self) -> Option<CaptureRegion> {
        self.region
    }

    fn set_region(&mut self, region: Option<CaptureRegion>) {
        self.region = region;
    }

    fn is_recording(&self) -> bool {
        self.recording
    }

    fn start(&mut self) -> CaptureResult<()> {
        if self.recording {
            return Ok(());
        }

        let output = self
            .config
            .output_dir
            .join(format!("screenrecording_{}.mp4", uuid::Uuid::new_v4()));
        let child = self.spawn_encoder(&output)?;

        info!(
            "Encoder started (pid {}), region {:?}, writing {}",
            child.id(),
            self.region,
            output.display()
        );
        self.process = Some(child);
        self.output_path = Some(output);
        self.recording = true;
        Ok(())
    }

    fn stop(&mut self) -> CaptureResult<()> {
        if !self.recording {
            return Ok(());
        }
        self.recording = false;

        if let Some(mut child) = self.process.take() {
            shutdown_encoder(&mut child)?;
        }

        if let Some(ref path) = self.output_path {
            info!("Recording saved to: {}", path.display());
        }
        Ok(())
    }

    fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }
}

impl Drop for FfmpegRecorder {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("Failed to stop encoder on shutdown: {}", e);
        }
    }
}

/// Ask the encoder to finalise the container, killing it as a last resort.
fn shutdown_encoder(child: &mut Child) -> CaptureResult<()> {
    if let Err(e) = platform::interrupt(child) {
        warn!("Interrupt to encoder {} failed: {}", child.id(), e);
        if let Err(e) = send_quit_key(child) {
            warn!("Quit key to encoder {} failed: {}, killing", child.id(), e);
            // Already exited is fine here; wait() below reaps it.
            let _ = child.kill();
        }
    }

    let status = child.wait()?;
    info!("Encoder exited with {}", status);
    Ok(())
}

/// ffmpeg finishes the file when it reads `q` on stdin.
fn send_quit_key(child: &mut Child) -> std::io::Result<()> {
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::BrokenPipe, "encoder stdin closed"))?;
    stdin.write_all(b"q")?;
    stdin.flush()
}

#[cfg(windows)]
pub(crate) mod platform {
    use std::os::windows::process::CommandExt;
    use std::process::{Child, Command};
    use windows::Win32::System::Console::{GenerateConsoleCtrlEvent, CTRL_BREAK_EVENT};

    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    pub fn configure(command: &mut Command) {
        command.creation_flags(CREATE_NEW_PROCESS_GROUP | CREATE_NO_WINDOW);
    }

    /// CTRL_BREAK to the encoder's process group.
    pub fn interrupt(child: &Child) -> std::io::Result<()> {
        unsafe { GenerateConsoleCtrlEvent(CTRL_BREAK_EVENT, child.id()) }
            .map_err(std::io::Error::other)
    }
}

#[cfg(unix)]
pub(crate) mod platform {
    use std::process::{Child, Command};

    pub fn configure(_command: &mut Command) {}

    pub fn interrupt(child: &Child) -> std::io::Result<()> {
        let rc = unsafe { libc::kill(child.id() as libc::pid_t, libc::SIGINT) };
        if rc == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

#[cfg(not(any(unix, windows)))]
pub(crate) mod platform {
    use std::process::{Child, Command};

    pub fn configure(_command: &mut Command) {}

    pub fn interrupt(_child: &Child) -> std::io::Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "no interrupt signal on this platform",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder_with_missing_encoder() -> (tempfile::TempDir, FfmpegRecorder) {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = RecorderConfig {
            framerate: 30,
            ffmpeg_path: Some(dir.path().join("no-such-ffmpeg")),
            output_dir: dir.path().to_path_buf(),
        };
        (dir, FfmpegRecorder::new(config))
    }

    #[test]
    fn stop_when_idle_is_a_noop() {
        let (_dir, mut recorder) = recorder_with_missing_encoder();
        assert!(recorder.stop().is_ok());
        assert!(!recorder.is_recording());
        assert!(recorder.output_path().is_none());
    }

    #[test]
    fn failed_spawn_leaves_recorder_idle() {
        let (_dir, mut recorder) = recorder_with_missing_encoder();
        recorder.set_region(Some(CaptureRegion::new(0, 0, 100, 100)));

        let result = recorder.start();

        // Hosts without a grabber backend fail before spawning.
        assert!(matches!(
            result,
            Err(CaptureError::Spawn { .. }) | Err(CaptureError::UnsupportedPlatform(_))
        ));
        assert!(!recorder.is_recording());
        assert!(recorder.output_path().is_none());
    }

    #[test]
    fn region_round_trips() {
        let (_dir, mut recorder) = recorder_with_missing_encoder();
        assert_eq!(recorder.region(), None);
        recorder.set_region(Some(CaptureRegion::new(4, 8, 120, 64)));
        assert_eq!(recorder.region(), Some(CaptureRegion::new(4, 8, 120, 64)));
    }
}
