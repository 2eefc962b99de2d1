//! Episode and podcast records.
//!
//! Both types serialize with camelCase field names, matching the JSON
//! layout of the persisted session records. Every field carries a serde
//! default so a partially written or older record still deserializes.

use bridge_traits::playback::EngineTrack;
use serde::{Deserialize, Serialize};

/// A playable episode.
///
/// `id` is the stable identifier used as the engine track id and as the
/// persistence key. `podcast_title`/`artist_name` are denormalized parent
/// fields carried when an episode travels detached from its podcast (e.g.
/// out of a liked-episodes list).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Episode {
    pub id: String,
    pub title: String,
    pub description: String,
    pub audio_url: String,
    pub pub_date: String,
    /// Duration in seconds, from the feed. Authoritative only until the
    /// engine reports a live duration.
    pub duration: f64,
    pub artwork: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub podcast_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist_name: Option<String>,
    /// Path of a downloaded copy. Preferred over `audio_url` when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_uri: Option<String>,
}

impl Episode {
    /// Resolved playback source: the downloaded copy when present,
    /// otherwise the remote URL.
    pub fn playback_url(&self) -> &str {
        self.local_uri.as_deref().unwrap_or(&self.audio_url)
    }

    /// Whether this episode carries denormalized podcast fields of its own.
    pub fn has_podcast_fields(&self) -> bool {
        self.podcast_title.is_some() || self.artist_name.is_some()
    }

    /// Build the engine track descriptor for this episode.
    pub fn engine_track(&self, podcast: &Podcast) -> EngineTrack {
        let artwork = if !self.artwork.is_empty() {
            Some(self.artwork.clone())
        } else if !podcast.artwork_url_600.is_empty() {
            Some(podcast.artwork_url_600.clone())
        } else {
            None
        };

        EngineTrack {
            id: self.id.clone(),
            url: self.playback_url().to_string(),
            title: self.title.clone(),
            artist: podcast.collection_name.clone(),
            artwork,
            duration: (self.duration > 0.0).then_some(self.duration),
        }
    }
}

/// The show an episode belongs to. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Podcast {
    pub collection_id: i64,
    pub collection_name: String,
    pub artist_name: String,
    pub artwork_url_600: String,
    pub artwork_url_100: String,
    pub feed_url: String,
    pub track_count: u32,
    pub release_date: String,
    pub primary_genre_name: String,
    pub collection_view_url: String,
}

impl Podcast {
    /// Synthesize a minimal podcast record from an episode's denormalized
    /// fields, falling back to the current podcast's artwork when the
    /// episode carries none. Used when a queued episode arrives without
    /// its parent show.
    pub fn synthesized(episode: &Episode, current: Option<&Podcast>) -> Podcast {
        let artwork = if !episode.artwork.is_empty() {
            episode.artwork.clone()
        } else {
            current
                .map(|p| p.artwork_url_600.clone())
                .unwrap_or_default()
        };

        Podcast {
            collection_id: -1,
            collection_name: episode
                .podcast_title
                .clone()
                .unwrap_or_else(|| "Unknown Podcast".to_string()),
            artist_name: episode
                .artist_name
                .clone()
                .unwrap_or_else(|| "Unknown Artist".to_string()),
            artwork_url_600: artwork.clone(),
            artwork_url_100: artwork,
            ..Podcast::default()
        }
    }
}
