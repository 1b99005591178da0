pub mod codecs;
pub mod config;
pub mod driver;
pub mod error;
pub mod filescanner;
pub mod fstools;
pub mod probe;
pub mod transcoder;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use rustop::opts;

use config::RunConfig;
use driver::Driver;
use fstools::{classify_file, DirEntryCategory};
use probe::FFProbe;
use transcoder::FFmpegTranscoder;

fn main() -> ExitCode {
    let (args, _rest) = opts! {
        synopsis "Recursively re-encode a video library to HEVC, mirroring its layout.";
        opt extension:String, desc:"File extension to match, without the leading dot. (e.g. mkv)";
        opt source:String, desc:"Source directory, scanned recursively.";
        opt destination:String, desc:"Destination directory; existing files are never overwritten.";
        opt bitrate:u32=2000, desc:"Target video bitrate in kbps.";
    }.parse_or_exit();

    if !FFmpegTranscoder::is_installed() || !FFProbe::is_installed() {
        println!("ffmpeg and ffprobe are required but not installed.");
        return ExitCode::FAILURE;
    }

    let config = RunConfig::new(
        &args.extension,
        PathBuf::from(&args.source),
        PathBuf::from(&args.destination),
        args.bitrate);

    match classify_file(&config.source) {
        DirEntryCategory::Directory => (),
        _ => {
            println!("{:?} is not a directory.", config.source);
            return ExitCode::FAILURE;
        },
    }

    let stop = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        if let Err(err) = signal_hook::flag::register(signal, Arc::clone(&stop)) {
            println!("Unable to register a handler for signal {}: {}", signal, err);
            return ExitCode::FAILURE;
        }
    }

    let probe = FFProbe;
    let transcoder = FFmpegTranscoder::new(config.bitrate_parameter(), Arc::clone(&stop));
    let driver = Driver::new(&config, &probe, &transcoder, Arc::clone(&stop));
    let summary = driver.run();
    println!("{} transcoded, {} skipped, {} failed.", summary.transcoded, summary.skipped, summary.failed);

    match summary.failed {
        0 => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
