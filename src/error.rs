use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure to obtain or decode a raster asset. Always recoverable: the
/// renderer logs it and draws a text fallback instead.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("asset decode failed for {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: image::ImageError,
    },

    #[error("asset {url} has zero width or height")]
    Empty { url: String },
}

#[derive(Debug, Error)]
pub enum Error {
    /// Required discriminant or mandatory field could not be resolved.
    #[error("invalid contract data: {0}")]
    DataShape(String),

    /// A single block needs more vertical space than one page can offer.
    #[error("block of {needed:.1} mm does not fit a page ({capacity:.1} mm printable)")]
    LayoutOverflow { needed: f32, capacity: f32 },

    #[error("image {0} was placed but never registered with the page sink")]
    UnknownImage(String),
}
