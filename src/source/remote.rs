use crate::foundation::error::{OnionError, OnionResult};
use url::Url;

/// Identifier of a video hosted by a remote player.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RemoteVideoId(String);

impl RemoteVideoId {
    /// Length of a bare video id.
    pub const BARE_LEN: usize = 11;

    /// Extract a video id from user input.
    ///
    /// Accepted forms: an 11-character bare id, `youtu.be/<id>`, `youtube.com/watch?v=<id>`
    /// and `youtube.com/shorts/<id>`.
    pub fn parse(input: &str) -> OnionResult<Self> {
        let s = input.trim();
        if s.is_empty() {
            return Err(OnionError::source("empty video reference"));
        }
        if s.chars().count() == Self::BARE_LEN && !s.contains("http") {
            return Ok(Self(s.to_owned()));
        }
        let url = Url::parse(s)
            .map_err(|e| OnionError::source(format!("could not parse video URL '{s}': {e}")))?;
        id_from_url(&url)
            .map(Self)
            .ok_or_else(|| OnionError::source(format!("no video id in '{s}'")))
    }

    /// The bare id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RemoteVideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn id_from_url(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let mut segments = url
        .path_segments()
        .into_iter()
        .flatten()
        .filter(|seg| !seg.is_empty());

    if host.contains("youtu.be") {
        return segments.next().map(str::to_owned);
    }
    if host.contains("youtube.com") {
        if let Some((_, v)) = url.query_pairs().find(|(k, v)| k == "v" && !v.is_empty()) {
            return Some(v.into_owned());
        }
        let parts: Vec<&str> = segments.collect();
        let shorts = parts.iter().position(|p| *p == "shorts")?;
        return parts.get(shorts + 1).map(|id| (*id).to_owned());
    }
    None
}

#[cfg(test)]
#[path = "../../tests/unit/source/remote.rs"]
mod tests;
