use snafu::Snafu;

use super::*;

/// Identifier of a video, chosen by the client that registers it. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for VideoId {
    type Err = ParseVideoId;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.is_empty() {
            return Err(ParseVideoId {
                text: input.to_string(),
            });
        }

        Ok(VideoId(input.to_string()))
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(display("Failed to parse video id: `{}`", text))]
pub struct ParseVideoId {
    pub text: String,
}
