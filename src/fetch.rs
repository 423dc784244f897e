use std::{path::PathBuf, time::Duration};

use image::RgbaImage;
use rayon::prelude::*;
use tracing::debug;

use crate::{
    error::{ReelError, ReelResult},
    media::decode_image,
};

/// Byte-level image source, keyed by URL or path string.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>>;
}

/// Blocking HTTP fetcher with a bounded per-request timeout.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let resp = self.client.get(url).send()?.error_for_status()?;
        Ok(resp.bytes()?.to_vec())
    }
}

/// Local-filesystem fetcher; treats each "url" as a path, optionally under a
/// base directory.
#[derive(Default)]
pub struct FsFetcher {
    pub base_dir: Option<PathBuf>,
}

impl ImageFetcher for FsFetcher {
    fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let path = match &self.base_dir {
            Some(base) => base.join(url),
            None => PathBuf::from(url),
        };
        use anyhow::Context as _;
        std::fs::read(&path).with_context(|| format!("failed to read image '{}'", path.display()))
    }
}

/// Fetches and decodes every image in parallel, preserving input order. Any
/// single failure fails the whole batch.
pub fn fetch_and_decode_all(
    fetcher: &dyn ImageFetcher,
    urls: &[String],
) -> ReelResult<Vec<RgbaImage>> {
    let images: Vec<ReelResult<RgbaImage>> = urls
        .par_iter()
        .map(|url| {
            let bytes = fetcher
                .fetch(url)
                .map_err(|e| ReelError::media(format!("failed to fetch '{url}': {e}")))?;
            let img = decode_image(&bytes)
                .map_err(|e| ReelError::media(format!("failed to decode '{url}': {e}")))?;
            debug!(url = %url, width = img.width(), height = img.height(), "decoded image");
            Ok(img)
        })
        .collect();

    images.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticFetcher {
        png: Vec<u8>,
    }

    impl StaticFetcher {
        fn new() -> Self {
            let img = RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255]));
            let mut png = Vec::new();
            img.write_to(
                &mut std::io::Cursor::new(&mut png),
                image::ImageFormat::Png,
            )
            .unwrap();
            Self { png }
        }
    }

    impl ImageFetcher for StaticFetcher {
        fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
            if url == "bad" {
                anyhow::bail!("no such image");
            }
            Ok(self.png.clone())
        }
    }

    #[test]
    fn batch_decodes_in_order() {
        let fetcher = StaticFetcher::new();
        let urls = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let images = fetch_and_decode_all(&fetcher, &urls).unwrap();
        assert_eq!(images.len(), 3);
        assert!(images.iter().all(|i| i.dimensions() == (2, 2)));
    }

    #[test]
    fn single_failure_fails_batch() {
        let fetcher = StaticFetcher::new();
        let urls = vec!["a".to_string(), "bad".to_string()];
        let err = fetch_and_decode_all(&fetcher, &urls).unwrap_err();
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn fs_fetcher_reports_missing_file() {
        let fetcher = FsFetcher { base_dir: None };
        assert!(fetcher.fetch("/definitely/not/here.png").is_err());
    }
}
