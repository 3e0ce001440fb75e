//! Raster asset loading (logo, signature) and aspect-preserving box fitting.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;

use crate::error::AssetError;

/// Capability to fetch the raw bytes behind an asset URL. The engine only
/// depends on this contract; storage and transport are the caller's choice.
pub trait AssetLoader {
    fn load(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, AssetError>> + Send;
}

/// Reads assets from the local filesystem. Accepts plain paths and
/// `file://` URLs; relative paths resolve against `root`.
#[derive(Clone, Debug, Default)]
pub struct FsAssetLoader {
    root: PathBuf,
}

impl FsAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetLoader for FsAssetLoader {
    async fn load(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let path = self.root.join(url.strip_prefix("file://").unwrap_or(url));
        std::fs::read(&path).map_err(|e| AssetError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(feature = "http")]
#[derive(Clone, Debug, Default)]
pub struct HttpAssetLoader {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpAssetLoader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http")]
impl AssetLoader for HttpAssetLoader {
    async fn load(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let fetch_err = |e: reqwest::Error| AssetError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(fetch_err)?
            .error_for_status()
            .map_err(fetch_err)?;
        let bytes = response.bytes().await.map_err(fetch_err)?;
        Ok(bytes.to_vec())
    }
}

/// A decoded raster: straight RGBA8 pixels plus intrinsic pixel size.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RasterImage {
    pub fn has_alpha(&self) -> bool {
        self.rgba.chunks_exact(4).any(|p| p[3] < 255)
    }
}

pub fn decode_image(url: &str, bytes: &[u8]) -> Result<RasterImage, AssetError> {
    let decoded = image::load_from_memory(bytes).map_err(|source| AssetError::Decode {
        url: url.to_string(),
        source,
    })?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(AssetError::Empty {
            url: url.to_string(),
        });
    }
    Ok(RasterImage {
        rgba: rgba.into_raw(),
        width,
        height,
    })
}

/// Largest box with the intrinsic aspect ratio that fits `max_w x max_h`.
pub fn fit_box(intrinsic_w: u32, intrinsic_h: u32, max_w: f32, max_h: f32) -> (f32, f32) {
    let ratio = intrinsic_w as f32 / intrinsic_h as f32;
    if ratio > max_w / max_h {
        (max_w, max_w / ratio)
    } else {
        (max_h * ratio, max_h)
    }
}

/// Decoded assets for one render call, keyed by source URL.
#[derive(Clone, Debug, Default)]
pub struct ImageCache {
    images: HashMap<String, RasterImage>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch and decode `url`. Failures are logged and swallowed so that the
    /// caller can fall back to text; returns whether the image is available.
    pub async fn load<L: AssetLoader>(&mut self, loader: &L, url: &str) -> bool {
        if self.images.contains_key(url) {
            return true;
        }
        let t0 = std::time::Instant::now();
        let result = match loader.load(url).await {
            Ok(bytes) => decode_image(url, &bytes),
            Err(e) => Err(e),
        };
        match result {
            Ok(img) => {
                log::debug!(
                    "asset {url}: {}x{} px in {:.1}ms",
                    img.width,
                    img.height,
                    t0.elapsed().as_secs_f64() * 1000.0
                );
                self.images.insert(url.to_string(), img);
                true
            }
            Err(e) => {
                log::warn!("{e}; falling back to text");
                false
            }
        }
    }

    pub fn insert(&mut self, url: impl Into<String>, image: RasterImage) {
        self.images.insert(url.into(), image);
    }

    pub fn get(&self, url: &str) -> Option<&RasterImage> {
        self.images.get(url)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_into_wide_box_is_height_bound() {
        assert_eq!(fit_box(100, 100, 40.0, 20.0), (20.0, 20.0));
    }

    #[test]
    fn very_wide_logo_is_width_bound() {
        let (w, h) = fit_box(1000, 100, 40.0, 20.0);
        assert_eq!(w, 40.0);
        assert!((h - 4.0).abs() < 1e-4);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = decode_image("mem://x", b"not an image").unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
    }
}
