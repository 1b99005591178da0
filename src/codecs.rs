use std::fmt::Display;

#[derive(Clone, Debug, PartialEq)]
pub enum Codec {
    Unknown(String),
    AV1,
    HEVC,
    H264,
}

impl Codec {
    // probe output sometimes carries a trailing carriage return
    pub fn from_str(s: &str) -> Self {
        match s.trim_end_matches('\r').to_lowercase().as_str() {
            "av1" => Codec::AV1,
            "hevc" => Codec::HEVC,
            "h264" => Codec::H264,
            _ => Codec::Unknown(String::from(s)),
        }
    }

    pub fn encoder(&self) -> Option<&'static str> {
        match self {
            Codec::Unknown(_) => None,
            Codec::AV1 => Some("libsvtav1"),
            Codec::HEVC => Some("libx265"),
            Codec::H264 => Some("libx264"),
        }
    }
}

impl Default for Codec {
    fn default() -> Self {
        Codec::Unknown(String::new())
    }
}

impl Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Codec::Unknown(codec) => write!(f, "{}", codec.to_lowercase()),
            _ => write!(f, "{}", format!("{:?}", self).to_lowercase()),
        }
    }
}
