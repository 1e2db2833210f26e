//! Avatar loading with placeholder fallback.
//!
//! Loading is the only place rendering touches I/O. A failed fetch or
//! decode for one avatar never aborts a match: the agent gets a
//! class-coloured placeholder and a warning is logged.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use arena_core::agent::AgentId;
use arena_core::class::PlayerClass;
use arena_core::scene::Scene;
use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use thiserror::Error;
use tracing::{debug, warn};

/// Why an avatar could not be loaded.
#[derive(Debug, Error)]
pub enum AssetError {
    /// HTTP request failed or returned an error status.
    #[error("Failed to fetch avatar '{reference}': {source}")]
    Http {
        /// The URL requested.
        reference: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// Local file could not be read.
    #[error("Failed to read avatar file '{path}': {source}")]
    Io {
        /// Path on disk.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Bytes were not a decodable image.
    #[error("Failed to decode avatar '{reference}': {source}")]
    Decode {
        /// The reference the bytes came from.
        reference: String,
        /// Underlying decoder error.
        #[source]
        source: image::ImageError,
    },

    /// Empty reference.
    #[error("Avatar reference is empty")]
    Empty,
}

/// Where avatar bytes come from.
pub trait AvatarSource {
    /// Fetch the raw encoded bytes behind `reference`.
    fn fetch(&self, reference: &str) -> impl Future<Output = Result<Vec<u8>, AssetError>> + Send;
}

/// Fetches `http(s)://` references over the network and everything else
/// (bare paths or `file://` URLs) from disk.
#[derive(Debug, Clone)]
pub struct HttpAvatarSource {
    client: reqwest::Client,
}

impl HttpAvatarSource {
    /// Request timeout for a single avatar.
    pub const TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a source with the default timeout.
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Self::TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpAvatarSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AvatarSource for HttpAvatarSource {
    fn fetch(&self, reference: &str) -> impl Future<Output = Result<Vec<u8>, AssetError>> + Send {
        let client = self.client.clone();
        let reference = reference.trim().to_string();
        async move {
            if reference.is_empty() {
                return Err(AssetError::Empty);
            }
            if reference.starts_with("http://") || reference.starts_with("https://") {
                let http = |source| AssetError::Http {
                    reference: reference.clone(),
                    source,
                };
                let response = client
                    .get(&reference)
                    .send()
                    .await
                    .and_then(reqwest::Response::error_for_status)
                    .map_err(http)?;
                let bytes = response.bytes().await.map_err(http)?;
                return Ok(bytes.to_vec());
            }
            let path = PathBuf::from(reference.strip_prefix("file://").unwrap_or(&reference));
            tokio::fs::read(&path)
                .await
                .map_err(|source| AssetError::Io { path, source })
        }
    }
}

/// Decode and square-resize an avatar to `diameter` pixels.
pub fn decode_avatar(reference: &str, bytes: &[u8], diameter: u32) -> Result<RgbaImage, AssetError> {
    let decoded = image::load_from_memory(bytes).map_err(|source| AssetError::Decode {
        reference: reference.to_string(),
        source,
    })?;
    Ok(image::imageops::resize(
        &decoded.to_rgba8(),
        diameter.max(1),
        diameter.max(1),
        FilterType::Triangle,
    ))
}

/// Flat class-coloured disc stand-in with a darker rim.
#[must_use]
pub fn placeholder_avatar(class: PlayerClass, diameter: u32) -> RgbaImage {
    let [r, g, b] = class.color();
    let diameter = diameter.max(1);
    let centre = diameter as f32 / 2.0;
    let rim = (centre - 2.0).max(0.0);
    RgbaImage::from_fn(diameter, diameter, |x, y| {
        let dx = x as f32 + 0.5 - centre;
        let dy = y as f32 + 0.5 - centre;
        if dx.hypot(dy) > rim {
            Rgba([r / 2, g / 2, b / 2, 255])
        } else {
            Rgba([r, g, b, 255])
        }
    })
}

/// Pre-sized avatar images keyed by agent.
#[derive(Debug, Clone, Default)]
pub struct AvatarCache {
    images: HashMap<AgentId, RgbaImage>,
    fallbacks: Vec<AgentId>,
}

impl AvatarCache {
    /// Store an avatar for an agent.
    pub fn insert(&mut self, id: AgentId, image: RgbaImage) {
        self.images.insert(id, image);
    }

    /// Avatar for an agent, if one was loaded.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&RgbaImage> {
        self.images.get(&id)
    }

    /// Agents that fell back to a placeholder.
    #[must_use]
    pub fn fallbacks(&self) -> &[AgentId] {
        &self.fallbacks
    }

    /// Number of cached avatars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// True when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Load every agent's avatar, substituting placeholders on failure.
pub async fn load_avatars<S: AvatarSource>(source: &S, scene: &Scene, diameter: u32) -> AvatarCache {
    let mut cache = AvatarCache::default();
    for agent in scene.agents() {
        let reference = agent.player.avatar_url.as_str();
        let loaded = match source.fetch(reference).await {
            Ok(bytes) => decode_avatar(reference, &bytes, diameter),
            Err(err) => Err(err),
        };
        match loaded {
            Ok(image) => {
                debug!(agent = %agent.id, reference, "Avatar loaded");
                cache.insert(agent.id, image);
            }
            Err(err) => {
                warn!(agent = %agent.id, player = %agent.player.name, error = %err, "Avatar load failed, using placeholder");
                cache.insert(agent.id, placeholder_avatar(agent.class, diameter));
                cache.fallbacks.push(agent.id);
            }
        }
    }
    cache
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_has_rim_and_fill() {
        let img = placeholder_avatar(PlayerClass::Knight, 32);
        let [r, g, b] = PlayerClass::Knight.color();
        assert_eq!(img.dimensions(), (32, 32));
        assert_eq!(img.get_pixel(16, 16), &Rgba([r, g, b, 255]));
        assert_eq!(img.get_pixel(0, 0), &Rgba([r / 2, g / 2, b / 2, 255]));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_avatar("x", b"definitely not a png", 32).unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
    }
}
