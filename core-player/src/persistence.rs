//! Session persistence.
//!
//! Four independent string-keyed records survive a process restart: the
//! current episode and podcast (JSON), the last position (decimal seconds)
//! and the playback rate (decimal). There is no transactional guarantee
//! across them, so restore tolerates any subset being absent or malformed:
//! unparseable JSON and non-finite numbers are treated as absent.
//!
//! Writes are best-effort. A failed write is logged and never surfaced;
//! the next state change retries implicitly.

use crate::model::{Episode, Podcast};
use bridge_traits::KeyValueStore;
use tracing::{debug, warn};

pub mod keys {
    pub const EPISODE: &str = "player.current_episode";
    pub const PODCAST: &str = "player.current_podcast";
    pub const POSITION: &str = "player.last_position";
    pub const RATE: &str = "player.playback_rate";
}

/// What restore recovered from storage. Absent or malformed records come
/// back as `None`; the episode/podcast pair is all-or-nothing.
#[derive(Debug, Default)]
pub struct RestoredSession {
    pub episode: Option<Episode>,
    pub podcast: Option<Podcast>,
    /// Last play head position in seconds, to seek to after loading.
    pub position_secs: Option<f64>,
    pub rate: Option<f32>,
}

/// Read the persisted session in one batch. Never fails: storage errors
/// and malformed records degrade to an empty result.
pub async fn load(store: &dyn KeyValueStore) -> RestoredSession {
    let records = match store
        .multi_get(&[keys::EPISODE, keys::PODCAST, keys::POSITION, keys::RATE])
        .await
    {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "failed to read persisted session");
            return RestoredSession::default();
        }
    };

    let mut restored = RestoredSession {
        rate: records.get(keys::RATE).and_then(|raw| parse_rate(raw)),
        position_secs: records
            .get(keys::POSITION)
            .and_then(|raw| parse_position(raw)),
        ..RestoredSession::default()
    };

    // The pair is installed together or not at all.
    if let (Some(episode_json), Some(podcast_json)) =
        (records.get(keys::EPISODE), records.get(keys::PODCAST))
    {
        match (
            serde_json::from_str::<Episode>(episode_json),
            serde_json::from_str::<Podcast>(podcast_json),
        ) {
            (Ok(episode), Ok(podcast)) => {
                restored.episode = Some(episode);
                restored.podcast = Some(podcast);
            }
            (episode, podcast) => {
                warn!(
                    episode_ok = episode.is_ok(),
                    podcast_ok = podcast.is_ok(),
                    "discarding malformed persisted episode/podcast pair"
                );
            }
        }
    }

    restored
}

/// Persist the current episode/podcast pair in one batched write.
pub async fn save_current(store: &dyn KeyValueStore, episode: &Episode, podcast: &Podcast) {
    let (episode_json, podcast_json) =
        match (serde_json::to_string(episode), serde_json::to_string(podcast)) {
            (Ok(e), Ok(p)) => (e, p),
            (episode, podcast) => {
                warn!(
                    episode_ok = episode.is_ok(),
                    podcast_ok = podcast.is_ok(),
                    "failed to serialize episode/podcast pair"
                );
                return;
            }
        };

    if let Err(e) = store
        .multi_set(&[
            (keys::EPISODE, episode_json.as_str()),
            (keys::PODCAST, podcast_json.as_str()),
        ])
        .await
    {
        warn!(error = %e, episode_id = %episode.id, "failed to persist episode state");
    }
}

/// Persist the playback rate.
pub async fn save_rate(store: &dyn KeyValueStore, rate: f32) {
    if let Err(e) = store.set(keys::RATE, &rate.to_string()).await {
        warn!(error = %e, rate, "failed to persist playback rate");
    }
}

/// Persist the play head position, in seconds.
pub async fn save_position(store: &dyn KeyValueStore, seconds: f64) {
    if let Err(e) = store.set(keys::POSITION, &seconds.to_string()).await {
        debug!(error = %e, seconds, "failed to persist position");
    }
}

/// Reset the persisted position to the start, for a fresh episode.
pub async fn reset_position(store: &dyn KeyValueStore) {
    if let Err(e) = store.set(keys::POSITION, "0").await {
        debug!(error = %e, "failed to reset persisted position");
    }
}

fn parse_rate(raw: &str) -> Option<f32> {
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|rate| rate.is_finite() && *rate > 0.0)
}

fn parse_position(raw: &str) -> Option<f64> {
    // "NaN" parses successfully, so finiteness must be checked explicitly.
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
}
