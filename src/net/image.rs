//! Image resolution.
//!
//! Turns image URLs found during extraction into embeddable data URIs so
//! a renderer never has to reach a cross-origin host itself. Failures are
//! never fatal: the record keeps its URL and is marked `NeedsFallback`.

use std::collections::BTreeMap;
use std::io::Cursor;

use base64::Engine;
use rayon::prelude::*;
use thiserror::Error;

use crate::dom::{ElementRecord, ImageStatus};
use crate::net::fetch::USER_AGENT;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server answered HTTP {0}")]
    Status(u16),
    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// A downsampled image ready to inline.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

/// Fetches one image and returns it in embeddable form.
pub trait ImageResolver {
    fn resolve(&self, url: &str) -> Result<EmbeddedImage, ImageError>;
}

/// Blocking HTTP resolver; images wider than `max_width` are downsampled.
pub struct HttpImageResolver {
    client: reqwest::blocking::Client,
    max_width: u32,
}

impl HttpImageResolver {
    pub fn new() -> Result<Self, ImageError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            max_width: 512,
        })
    }

    pub fn with_max_width(mut self, max_width: u32) -> Self {
        self.max_width = max_width.max(1);
        self
    }
}

impl ImageResolver for HttpImageResolver {
    fn resolve(&self, url: &str) -> Result<EmbeddedImage, ImageError> {
        let resp = self.client.get(url).send()?;
        if !resp.status().is_success() {
            return Err(ImageError::Status(resp.status().as_u16()));
        }
        let bytes = resp.bytes()?;
        encode_embedded(&bytes, self.max_width)
    }
}

/// Decode, cap width, and re-encode as a PNG data URI.
pub fn encode_embedded(bytes: &[u8], max_width: u32) -> Result<EmbeddedImage, ImageError> {
    let img = image::load_from_memory(bytes)?;
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();

    let rgba = if w > max_width {
        let ratio = max_width as f32 / w as f32;
        let new_h = ((h as f32 * ratio) as u32).max(1);
        image::imageops::resize(&rgba, max_width, new_h, image::imageops::FilterType::Triangle)
    } else {
        rgba
    };
    let (width, height) = rgba.dimensions();

    let mut png = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(rgba).write_to(&mut png, image::ImageFormat::Png)?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(png.into_inner());

    Ok(EmbeddedImage {
        data_uri: format!("data:image/png;base64,{encoded}"),
        width,
        height,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub requested: usize,
    pub embedded: usize,
    pub fallback: usize,
}

/// Resolve every pending image reference in parallel, one request per
/// distinct URL.
pub fn resolve_images<R>(records: &mut [ElementRecord], resolver: &R) -> ResolveStats
where
    R: ImageResolver + Sync + ?Sized,
{
    let mut urls: Vec<String> = records
        .iter()
        .filter_map(|r| r.image.as_ref())
        .filter(|img| img.status == ImageStatus::Pending && !img.src.starts_with("data:"))
        .map(|img| img.src.clone())
        .collect();
    urls.sort_unstable();
    urls.dedup();

    let resolved: BTreeMap<String, Option<EmbeddedImage>> = urls
        .par_iter()
        .map(|url| {
            let result = resolver.resolve(url);
            if let Err(e) = &result {
                log::warn!("image fallback for {}: {}", url, e);
            }
            (url.clone(), result.ok())
        })
        .collect();

    let mut stats = ResolveStats {
        requested: resolved.len(),
        ..Default::default()
    };
    for img in records.iter_mut().filter_map(|r| r.image.as_mut()) {
        let Some(outcome) = resolved.get(&img.src) else { continue };
        img.status = match outcome {
            Some(embedded) => {
                stats.embedded += 1;
                ImageStatus::Embedded {
                    data_uri: embedded.data_uri.clone(),
                    width: embedded.width,
                    height: embedded.height,
                }
            }
            None => {
                stats.fallback += 1;
                ImageStatus::NeedsFallback
            }
        };
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::record::fixtures::record;
    use crate::dom::{Bounds, ImageRef, ImageSource};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Mock {
        calls: AtomicUsize,
    }

    impl ImageResolver for Mock {
        fn resolve(&self, url: &str) -> Result<EmbeddedImage, ImageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if url.contains("broken") {
                return Err(ImageError::Status(404));
            }
            Ok(EmbeddedImage {
                data_uri: format!("data:image/png;base64,{}", url.len()),
                width: 2,
                height: 1,
            })
        }
    }

    fn with_image(order: usize, src: &str) -> ElementRecord {
        let mut r = record(order, "img", Bounds::new(0.0, 0.0, 10.0, 10.0));
        r.image = Some(ImageRef {
            src: src.to_string(),
            source: ImageSource::Own,
            needs_proxy: true,
            status: ImageStatus::Pending,
        });
        r
    }

    #[test]
    fn failures_keep_url_and_fall_back() {
        let mut records = vec![
            with_image(0, "https://cdn.test/a.png"),
            with_image(1, "https://cdn.test/broken.png"),
            with_image(2, "https://cdn.test/a.png"),
            record(3, "p", Bounds::new(0.0, 0.0, 1.0, 1.0)),
        ];
        let mock = Mock { calls: AtomicUsize::new(0) };
        let stats = resolve_images(&mut records, &mock);

        assert_eq!(mock.calls.load(Ordering::SeqCst), 2);
        assert_eq!(stats, ResolveStats { requested: 2, embedded: 2, fallback: 1 });

        let broken = records[1].image.as_ref().unwrap();
        assert_eq!(broken.status, ImageStatus::NeedsFallback);
        assert_eq!(broken.src, "https://cdn.test/broken.png");
        assert!(matches!(records[0].image.as_ref().unwrap().status, ImageStatus::Embedded { width: 2, .. }));
    }

    #[test]
    fn data_uris_are_left_alone() {
        let mut records = vec![with_image(0, "data:image/gif;base64,R0lGOD")];
        let mock = Mock { calls: AtomicUsize::new(0) };
        resolve_images(&mut records, &mock);
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
        assert_eq!(records[0].image.as_ref().unwrap().status, ImageStatus::Pending);
    }

    #[test]
    fn wide_images_are_downsampled() {
        let src = image::RgbaImage::from_pixel(1000, 10, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(src)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();

        let embedded = encode_embedded(bytes.get_ref(), 500).unwrap();
        assert_eq!((embedded.width, embedded.height), (500, 5));
        assert!(embedded.data_uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn undecodable_bytes_error() {
        assert!(matches!(encode_embedded(b"not an image", 100), Err(ImageError::Decode(_))));
    }
}
