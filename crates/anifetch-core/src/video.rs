//! Play URL composition for resolved video addresses.

/// Player endpoint that wraps resolved video addresses.
pub const PLAYER_BASE: &str = "https://tup.iyinghua.com/?vid=";

/// Episode number from an episode page URL shaped `/v/<show>-<episode>.html`.
pub fn episode_from_page_url(page_url: &str) -> Option<u32> {
    let tail = &page_url[page_url.rfind("/v/")? + 3..];
    let stem = tail.strip_suffix(".html")?;
    let (show, episode) = stem.split_once('-')?;
    if show.is_empty() || !show.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if episode.is_empty() || !episode.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    episode.parse().ok()
}

/// Two-digit episode label (`1` -> `01`).
pub fn episode_label(episode: u32) -> String {
    format!("{episode:02}")
}

/// Playable m3u8 address for `video_url`, labelled with the page's episode.
///
/// Addresses already wrapped by the player or already pointing at an m3u8
/// playlist are returned unchanged. Episode defaults to 1 when the page URL
/// does not carry one.
pub fn play_url(video_url: &str, page_url: &str) -> String {
    let video_url = video_url.trim();
    if video_url.starts_with(PLAYER_BASE) || is_playlist(video_url) {
        return video_url.to_string();
    }
    let episode = episode_from_page_url(page_url).unwrap_or(1);
    format!(
        "{PLAYER_BASE}{}/第{}集/index.m3u8$mp4",
        video_url.trim_end_matches('/'),
        episode_label(episode)
    )
}

fn is_playlist(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.ends_with(".m3u8") || url.ends_with(".m3u8$mp4")
}
