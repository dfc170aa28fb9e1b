// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Context;
use async_trait::async_trait;
use std::path::PathBuf;

use crate::traits::EmojiSource;
use crate::value::RasterImage;

/// Emoji artwork read from `<dir>/smileys/<name>.png`.
pub struct FileEmojiSource {
    dir: PathBuf,
}

impl FileEmojiSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> anyhow::Result<PathBuf> {
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            anyhow::bail!("'{}' is not a valid emoji name", name);
        }
        Ok(self.dir.join("smileys").join(format!("{}.png", name)))
    }
}

#[async_trait]
impl EmojiSource for FileEmojiSource {
    async fn load(&self, name: &str) -> anyhow::Result<RasterImage> {
        let path = self.path_for(name)?;
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("no emoji '{}' at {}", name, path.display()))?;
        let image = image::load_from_memory(&bytes).with_context(|| format!("emoji '{}' is not an image", name))?;
        Ok(RasterImage::new(image))
    }
}
