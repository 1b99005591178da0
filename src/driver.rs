use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use human_repr::HumanCount;

use crate::codecs::Codec;
use crate::config::RunConfig;
use crate::filescanner::FileScanner;
use crate::fstools::{classify_file, ensure_parent_dirs, map_to_destination, DirEntryCategory};
use crate::probe::{VideoProbe, VideoStreamInfo};
use crate::transcoder::Transcode;

#[derive(Debug, Default, PartialEq)]
pub struct RunSummary {
    pub transcoded: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct Driver<'a> {
    config: &'a RunConfig,
    probe: &'a dyn VideoProbe,
    transcoder: &'a dyn Transcode,
    stop: Arc<AtomicBool>,
}

impl<'a> Driver<'a> {
    pub fn new(config: &'a RunConfig, probe: &'a dyn VideoProbe, transcoder: &'a dyn Transcode, stop: Arc<AtomicBool>) -> Self {
        Driver {
            config,
            probe,
            transcoder,
            stop,
        }
    }

    pub fn run(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        let scanner = FileScanner::new(&self.config.extension);
        for source in scanner.scan(&self.config.source) {
            if self.stop.load(Ordering::Relaxed) {
                println!("stop requested; leaving the remaining files for a later run.");
                break;
            }
            self.process(&source, &mut summary);
        }

        summary
    }

    fn process(&self, source: &PathBuf, summary: &mut RunSummary) {
        let destination = match map_to_destination(&self.config.source, &self.config.destination, source) {
            Some(destination) => destination,
            // the scanner only yields paths under the source root
            None => {
                println!("skipping {:?}: not under the source root.", source);
                summary.skipped += 1;
                return;
            },
        };

        // whatever its contents, a file already at the destination is
        // never overwritten; checked before spending a probe on it
        if let DirEntryCategory::RegularFile = classify_file(&destination) {
            println!("skipping {:?}: destination {:?} already exists.", source, destination);
            summary.skipped += 1;
            return;
        }

        let info = match self.probe.probe_video_stream(source) {
            Ok(info) => info,
            Err(err) => {
                println!("{}", err);
                summary.failed += 1;
                return;
            },
        };

        if info.codec == Codec::HEVC {
            println!("skipping {:?}: already {}.", source, info.codec);
            summary.skipped += 1;
            return;
        }

        print_banner(source, &info, &destination);

        if let Err(err) = ensure_parent_dirs(&destination) {
            println!("Error creating parent directories for {:?}: {}", destination, err);
            summary.failed += 1;
            return;
        }

        match self.transcoder.transcode(source, &info, &destination) {
            Ok(()) => summary.transcoded += 1,
            Err(err) => {
                println!("{}", err);
                summary.failed += 1;
            },
        }
    }
}

fn print_banner(source: &PathBuf, info: &VideoStreamInfo, destination: &PathBuf) {
    let source_size = match fs::metadata(source) {
        Ok(metadata) => metadata.len() as usize,
        Err(_) => 0,
    };
    println!(
        "{:?} ({}, {} {}x{}, {} frames) -> {:?}",
        source,
        source_size.human_count_bytes(),
        info.codec,
        info.width,
        info.height,
        info.total_frames,
        destination);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs::File;
    use tempfile::TempDir;

    use crate::error::{ProbeError, TranscodeError};

    struct FakeProbe {
        codec: Codec,
        fail: bool,
        calls: RefCell<Vec<PathBuf>>,
    }

    impl FakeProbe {
        fn reporting(codec: Codec) -> Self {
            FakeProbe {
                codec,
                fail: false,
                calls: RefCell::new(vec![]),
            }
        }

        fn failing() -> Self {
            FakeProbe {
                codec: Codec::default(),
                fail: true,
                calls: RefCell::new(vec![]),
            }
        }
    }

    impl VideoProbe for FakeProbe {
        fn probe_video_stream(&self, path: &PathBuf) -> Result<VideoStreamInfo, ProbeError> {
            self.calls.borrow_mut().push(path.clone());
            match self.fail {
                true => Err(ProbeError::for_file(path, "ffprobe did not exit successfully.")),
                false => Ok(VideoStreamInfo {
                    codec: self.codec.clone(),
                    width: 1920,
                    height: 1080,
                    total_frames: 1000,
                }),
            }
        }
    }

    struct FakeTranscoder {
        fail_on: Option<PathBuf>,
        calls: RefCell<Vec<(PathBuf, PathBuf)>>,
    }

    impl FakeTranscoder {
        fn succeeding() -> Self {
            FakeTranscoder {
                fail_on: None,
                calls: RefCell::new(vec![]),
            }
        }

        fn failing_on(path: PathBuf) -> Self {
            FakeTranscoder {
                fail_on: Some(path),
                calls: RefCell::new(vec![]),
            }
        }
    }

    impl Transcode for FakeTranscoder {
        fn transcode(&self, source: &PathBuf, _info: &VideoStreamInfo, destination: &PathBuf) -> Result<(), TranscodeError> {
            self.calls.borrow_mut().push((source.clone(), destination.clone()));
            match &self.fail_on {
                Some(path) if path == source => Err(TranscodeError::for_file(source, "ffmpeg exited with 1")),
                _ => Ok(()),
            }
        }
    }

    fn fixture(files: &[&str]) -> (TempDir, RunConfig) {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("library");
        let destination = dir.path().join("mirror");
        for file in files {
            let path = source.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            File::create(&path).unwrap();
        }
        let config = RunConfig::new("mkv", source, destination, 2000);
        (dir, config)
    }

    fn unset_stop() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn test_transcodes_candidate_into_mirrored_tree() {
        let (_dir, config) = fixture(&["x/y.mkv"]);
        let probe = FakeProbe::reporting(Codec::H264);
        let transcoder = FakeTranscoder::succeeding();

        let summary = Driver::new(&config, &probe, &transcoder, unset_stop()).run();

        assert_eq!(summary, RunSummary { transcoded: 1, skipped: 0, failed: 0 });
        let calls = transcoder.calls.borrow();
        assert_eq!(*calls, vec![(config.source.join("x/y.mkv"), config.destination.join("x/y.mkv"))]);
        // parents exist before the transcoder runs
        assert!(config.destination.join("x").is_dir());
    }

    #[test]
    fn test_existing_destination_is_never_overwritten() {
        let (_dir, config) = fixture(&["x/y.mkv"]);
        let existing = config.destination.join("x/y.mkv");
        fs::create_dir_all(existing.parent().unwrap()).unwrap();
        File::create(&existing).unwrap();
        let probe = FakeProbe::reporting(Codec::H264);
        let transcoder = FakeTranscoder::succeeding();

        let summary = Driver::new(&config, &probe, &transcoder, unset_stop()).run();

        assert_eq!(summary, RunSummary { transcoded: 0, skipped: 1, failed: 0 });
        // the probe is not spent on a skipped candidate
        assert!(probe.calls.borrow().is_empty());
        assert!(transcoder.calls.borrow().is_empty());
    }

    #[test]
    fn test_already_hevc_is_skipped() {
        let (_dir, config) = fixture(&["y.mkv"]);
        let probe = FakeProbe::reporting(Codec::HEVC);
        let transcoder = FakeTranscoder::succeeding();

        let summary = Driver::new(&config, &probe, &transcoder, unset_stop()).run();

        assert_eq!(summary, RunSummary { transcoded: 0, skipped: 1, failed: 0 });
        assert!(transcoder.calls.borrow().is_empty());
    }

    #[test]
    fn test_probed_carriage_return_codec_is_skipped() {
        let (_dir, config) = fixture(&["y.mkv"]);
        let probe = FakeProbe::reporting(Codec::from_str("HEVC\r"));
        let transcoder = FakeTranscoder::succeeding();

        let summary = Driver::new(&config, &probe, &transcoder, unset_stop()).run();

        assert_eq!(summary.skipped, 1);
        assert!(transcoder.calls.borrow().is_empty());
    }

    #[test]
    fn test_failed_transcode_does_not_stop_the_batch() {
        let (_dir, config) = fixture(&["a.mkv", "b.mkv"]);
        let probe = FakeProbe::reporting(Codec::H264);
        let transcoder = FakeTranscoder::failing_on(config.source.join("a.mkv"));

        let summary = Driver::new(&config, &probe, &transcoder, unset_stop()).run();

        assert_eq!(summary, RunSummary { transcoded: 1, skipped: 0, failed: 1 });
        assert_eq!(transcoder.calls.borrow().len(), 2);
    }

    #[test]
    fn test_failed_probe_counts_and_continues() {
        let (_dir, config) = fixture(&["a.mkv", "b.mkv"]);
        let probe = FakeProbe::failing();
        let transcoder = FakeTranscoder::succeeding();

        let summary = Driver::new(&config, &probe, &transcoder, unset_stop()).run();

        assert_eq!(summary, RunSummary { transcoded: 0, skipped: 0, failed: 2 });
        assert_eq!(probe.calls.borrow().len(), 2);
        assert!(transcoder.calls.borrow().is_empty());
    }

    #[test]
    fn test_stop_flag_halts_the_batch() {
        let (_dir, config) = fixture(&["a.mkv", "b.mkv"]);
        let probe = FakeProbe::reporting(Codec::H264);
        let transcoder = FakeTranscoder::succeeding();
        let stop = Arc::new(AtomicBool::new(true));

        let summary = Driver::new(&config, &probe, &transcoder, stop).run();

        assert_eq!(summary, RunSummary::default());
        assert!(transcoder.calls.borrow().is_empty());
    }

    #[test]
    fn test_non_matching_extensions_are_not_candidates() {
        let (_dir, config) = fixture(&["keep.mkv", "other.mp4", "upper.MKV"]);
        let probe = FakeProbe::reporting(Codec::H264);
        let transcoder = FakeTranscoder::succeeding();

        let summary = Driver::new(&config, &probe, &transcoder, unset_stop()).run();

        assert_eq!(summary.transcoded, 1);
        assert_eq!(probe.calls.borrow().len(), 1);
    }
}
