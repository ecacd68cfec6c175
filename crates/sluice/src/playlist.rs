// Playlist plumbing: fetch the live manifest, repair nonstandard EXTINF
// lines, and decode it as a media playlist.

use std::borrow::Cow;
use std::time::Duration;

use bytes::Bytes;
use m3u8_rs::{MediaPlaylist, parse_playlist_res};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::HarvestError;

/// Placeholder EXTINF line substituted when a manifest omits the trailing
/// attribute separator. Some origins emit `#EXTINF:8.00` with no comma,
/// which the structural parser rejects.
const EXTINF_PLACEHOLDER: &str = "#EXTINF:8.00,";

/// Fetches the raw playlist bytes with a single GET.
///
/// No retry here: a failed refresh ends the current worker and recovery
/// is the supervisor's job.
pub async fn fetch_playlist(
    client: &Client,
    url: &Url,
    timeout: Duration,
) -> Result<Bytes, HarvestError> {
    let response = client.get(url.clone()).timeout(timeout).send().await?;

    if !response.status().is_success() {
        return Err(HarvestError::http_status(
            response.status(),
            url.as_str(),
            "playlist fetch",
        ));
    }

    Ok(response.bytes().await?)
}

/// Repairs EXTINF lines that lack the `,` attribute separator.
///
/// The repair is all-or-nothing: if any duration line is malformed, every
/// EXTINF line is rewritten to a fixed 8-second placeholder. That loses
/// the declared durations, which only skews pacing; it is a best-effort
/// repair, not a reconstruction. Well-formed input is returned unchanged.
pub fn repair_extinf_lines(content: &str) -> Cow<'_, str> {
    let is_extinf = |line: &str| line.trim_start().starts_with("#EXTINF:");

    if !content
        .lines()
        .any(|line| is_extinf(line) && !line.contains(','))
    {
        return Cow::Borrowed(content);
    }

    debug!("Playlist has EXTINF lines without a separator, rewriting durations");
    let mut out = String::with_capacity(content.len());
    for line in content.lines() {
        if is_extinf(line) {
            out.push_str(EXTINF_PLACEHOLDER);
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    Cow::Owned(out)
}

/// Decodes playlist bytes as a live media playlist.
///
/// A master/variant playlist is a configuration error for a harvester and
/// is rejected, as is anything else the structural parser cannot decode.
pub fn parse_media_playlist(bytes: &[u8]) -> Result<MediaPlaylist, HarvestError> {
    match parse_playlist_res(bytes) {
        Ok(m3u8_rs::Playlist::MediaPlaylist(playlist)) => Ok(playlist),
        Ok(m3u8_rs::Playlist::MasterPlaylist(_)) => Err(HarvestError::playlist(
            "expected a media playlist, got a master playlist",
        )),
        Err(e) => Err(HarvestError::playlist(format!(
            "failed to parse playlist: {e}"
        ))),
    }
}
