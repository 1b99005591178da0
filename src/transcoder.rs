use std::ffi::OsString;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use human_repr::HumanCount;
use kdam::{term, tqdm, BarExt};

use crate::codecs::Codec;
use crate::error::TranscodeError;
use crate::probe::VideoStreamInfo;

#[derive(Debug)]
struct TranscodeProgress {
    pub frame: usize,
    pub fps: f64,
    pub total_size: usize,
}

impl TranscodeProgress {
    pub fn new() -> Self {
        TranscodeProgress {
            frame: 0,
            fps: 0.0,
            total_size: 0,
        }
    }
}

enum ProgressLineResult {
    Continue,
    Render,
}

// One capability: turn the source into an HEVC copy at the destination.
// The driver and its tests only ever see this trait.
pub trait Transcode {
    fn transcode(&self, source: &PathBuf, info: &VideoStreamInfo, destination: &PathBuf) -> Result<(), TranscodeError>;
}

pub struct FFmpegTranscoder {
    target: Codec,
    bitrate: String,
    stop: Arc<AtomicBool>,
}

impl FFmpegTranscoder {
    pub fn new(bitrate: String, stop: Arc<AtomicBool>) -> Self {
        FFmpegTranscoder {
            target: Codec::HEVC,
            bitrate,
            stop,
        }
    }

    pub fn is_installed() -> bool {
        match Command::new("ffmpeg").arg("-codecs").output() {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }

    fn build_args(&self, encoder: &str, source: &PathBuf, destination: &PathBuf) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-hide_banner".into(), "-nostats".into(),
            "-loglevel".into(), "warning".into(),
            "-progress".into(), "pipe:1".into(),
            "-i".into(), source.as_os_str().to_os_string(),
        ];

        args.push("-c:v".into()); args.push(encoder.into());
        args.push("-b:v".into()); args.push(self.bitrate.as_str().into());

        // players expect the hvc1 tag on hevc streams
        args.push("-tag:v".into()); args.push("hvc1".into());

        // use copy for audio and subtitle streams
        args.push("-c:a".into()); args.push("copy".into());
        args.push("-c:s".into()); args.push("copy".into());

        // map all streams to output
        args.push("-map".into()); args.push("0".into());

        args.push(destination.as_os_str().to_os_string());
        args
    }

    fn consume_stdout(&self, child: &mut Child, info: &VideoStreamInfo) -> bool {
        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => return false,
        };

        term::init(false);

        let mut pbar = tqdm!(
            total = info.total_frames,
            desc = format!("transcoding {}x{}", info.width, info.height),
            position = 0,
            force_refresh = true
        );
        let mut progress = TranscodeProgress::new();
        let stdout_reader = BufReader::new(stdout);
        for line in stdout_reader.lines() {
            if let Ok(l) = line {
                match handle_progress_line(&l, &mut progress) {
                    ProgressLineResult::Continue => (),
                    ProgressLineResult::Render => {
                        pbar.set_postfix(format!("{}", progress.total_size.human_count_bytes()));
                        let _ = pbar.update_to(progress.frame);
                    },
                }
            }

            if self.stop.load(Ordering::Relaxed) {
                return true;
            }
        }

        false
    }
}

impl Transcode for FFmpegTranscoder {
    fn transcode(&self, source: &PathBuf, info: &VideoStreamInfo, destination: &PathBuf) -> Result<(), TranscodeError> {
        let encoder = match self.target.encoder() {
            Some(encoder) => encoder,
            None => return Err(TranscodeError::for_file(source, &format!("no encoder for codec {}.", self.target))),
        };

        let mut cmd = Command::new("ffmpeg");
        cmd.args(self.build_args(encoder, source, destination))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        // lower the child's scheduling priority so the encode does not
        // starve whatever else the host is doing
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            unsafe {
                cmd.pre_exec(|| {
                    libc::nice(10);
                    Ok(())
                });
            }
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(_) => return Err(TranscodeError::for_file(source, "There was an error executing ffmpeg.")),
        };

        let interrupted = self.consume_stdout(&mut child, info);
        if interrupted {
            let _ = child.kill();
        }

        match child.wait() {
            Ok(status) if status.success() && !interrupted => Ok(()),
            Ok(status) => {
                // never leave a partial file for a later run to mistake
                // for a finished transcode
                let _ = fs::remove_file(destination);
                if interrupted {
                    Err(TranscodeError::for_file(source, "stop requested; partial output removed."))
                } else {
                    match status.code() {
                        Some(code) => Err(TranscodeError::for_file(source, &format!("ffmpeg exited with {}; partial output removed.", code))),
                        None => Err(TranscodeError::for_file(source, "ffmpeg did not exit successfully; partial output removed.")),
                    }
                }
            },
            Err(_) => {
                let _ = fs::remove_file(destination);
                Err(TranscodeError::for_file(source, "There was an error waiting for the ffmpeg process."))
            },
        }
    }
}

fn handle_progress_line(line: &str, progress: &mut TranscodeProgress) -> ProgressLineResult {
    let parts: Vec<&str> = line.split('=').collect();
    if parts.len() == 2 {
        match parts[0] {
            "fps" => {
                progress.fps = parts[1].parse().unwrap_or(progress.fps);
                ProgressLineResult::Continue
            },
            "frame" => {
                progress.frame = parts[1].parse().unwrap_or(progress.frame);
                ProgressLineResult::Continue
            },
            "total_size" => {
                progress.total_size = parts[1].parse().unwrap_or(progress.total_size);
                ProgressLineResult::Continue
            },
            "progress" => ProgressLineResult::Render,
            _ => ProgressLineResult::Continue,
        }
    } else {
        ProgressLineResult::Continue
    }
}
