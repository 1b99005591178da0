use std::path::PathBuf;

// Set once in main from the command line, immutable for the run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub extension: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub bitrate_kbps: u32,
}

impl RunConfig {
    pub fn new(extension: &str, source: PathBuf, destination: PathBuf, bitrate_kbps: u32) -> Self {
        RunConfig {
            extension: String::from(extension.trim_start_matches('.')),
            source,
            destination,
            bitrate_kbps,
        }
    }

    pub fn bitrate_parameter(&self) -> String {
        format!("{}k", self.bitrate_kbps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_bitrate(bitrate_kbps: u32) -> RunConfig {
        RunConfig::new("mkv", PathBuf::from("/a"), PathBuf::from("/b"), bitrate_kbps)
    }

    #[test]
    fn test_bitrate_parameter() {
        assert_eq!(config_with_bitrate(2000).bitrate_parameter(), "2000k");
        assert_eq!(config_with_bitrate(4500).bitrate_parameter(), "4500k");
    }

    #[test]
    fn test_extension_leading_dot_is_stripped() {
        let config = RunConfig::new(".mkv", PathBuf::from("/a"), PathBuf::from("/b"), 2000);
        assert_eq!(config.extension, "mkv");
    }
}
