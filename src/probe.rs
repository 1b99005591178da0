use std::path::PathBuf;
use std::process::Command;
use serde::Deserialize;

use crate::codecs::Codec;
use crate::error::ProbeError;

#[derive(Clone, Debug)]
pub struct VideoStreamInfo {
    pub codec: Codec,
    pub width: u64,
    pub height: u64,
    pub total_frames: usize,
}

// One capability: read the first video stream's metadata without
// decoding. The driver and its tests only ever see this trait.
pub trait VideoProbe {
    fn probe_video_stream(&self, path: &PathBuf) -> Result<VideoStreamInfo, ProbeError>;
}

#[derive(Deserialize, Debug)]
struct FFProbeJsonOutput {
    streams: Vec<FFProbeJsonStream>,
}

#[derive(Deserialize, Debug)]
struct FFProbeJsonStream {
    codec_name: String,
    width: u64,
    height: u64,
    nb_read_packets: Option<String>,
}

pub struct FFProbe;

impl FFProbe {
    pub fn is_installed() -> bool {
        match Command::new("ffprobe").arg("-version").output() {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }
}

impl VideoProbe for FFProbe {
    fn probe_video_stream(&self, path: &PathBuf) -> Result<VideoStreamInfo, ProbeError> {
        let output = Command::new("ffprobe")
            .args([
                "-of", "json",
                "-show_streams",
                "-select_streams", "v:0",
                "-count_packets",
            ])
            .arg(path)
            .output()
            .or_else(|_| Err(ProbeError::for_file(path, "There was an error executing ffprobe.")))?;
        if output.status.success() {
            match String::from_utf8(output.stdout) {
                Ok(utf8) => parse_probe_output(path, &utf8),
                Err(_) => Err(ProbeError::for_file(path, "ffprobe output was not valid utf-8.")),
            }
        } else {
            Err(ProbeError::for_file(path, "ffprobe did not exit successfully."))
        }
    }
}

fn parse_probe_output(path: &PathBuf, json: &str) -> Result<VideoStreamInfo, ProbeError> {
    match serde_json::from_str::<FFProbeJsonOutput>(json) {
        Ok(deserialized) => match deserialized.streams.first() {
            Some(stream) => Ok(VideoStreamInfo {
                codec: Codec::from_str(stream.codec_name.as_str()),
                width: stream.width,
                height: stream.height,
                total_frames: match &stream.nb_read_packets {
                    Some(count) => count.parse().unwrap_or(0),
                    None => 0,
                },
            }),
            None => Err(ProbeError::for_file(path, "no video stream found.")),
        },
        Err(_) => Err(ProbeError::for_file(path, "unexpected ffprobe output.")),
    }
}
