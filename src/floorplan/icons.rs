//! Fixture icon cache
//!
//! Icons are fetched by the host's authenticated image helper. Until a
//! texture is ready (or if the fetch fails) the fixture draws its placeholder;
//! nothing here ever blocks a frame.

use std::collections::HashMap;

use egui::TextureId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconState {
    Ready(TextureId),
    Pending,
    Failed,
}

/// Read side used by the renderer
pub trait IconLookup {
    fn icon(&self, url: &str) -> IconState;
}

/// Host-provided fetcher (authenticated image helper)
pub trait IconResolver {
    fn resolve(&mut self, url: &str) -> Result<TextureId, String>;
}

#[derive(Debug, Default)]
pub struct IconCache {
    entries: HashMap<String, IconState>,
    queued: Vec<String>,
}

impl IconCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a fetch for an icon not seen before
    pub fn request(&mut self, url: &str) {
        if !self.entries.contains_key(url) {
            self.entries.insert(url.to_string(), IconState::Pending);
            self.queued.push(url.to_string());
        }
    }

    /// URLs waiting to be fetched
    pub fn take_requests(&mut self) -> Vec<String> {
        std::mem::take(&mut self.queued)
    }

    pub fn mark_ready(&mut self, url: &str, texture: TextureId) {
        self.entries.insert(url.to_string(), IconState::Ready(texture));
    }

    pub fn mark_failed(&mut self, url: &str, reason: &str) {
        tracing::warn!(url, reason, "fixture icon unavailable, using placeholder");
        self.entries.insert(url.to_string(), IconState::Failed);
    }

    /// Fetch everything queued through `resolver`
    pub fn resolve_queued(&mut self, resolver: &mut dyn IconResolver) {
        for url in self.take_requests() {
            match resolver.resolve(&url) {
                Ok(texture) => self.mark_ready(&url, texture),
                Err(reason) => self.mark_failed(&url, &reason),
            }
        }
    }
}

impl IconLookup for IconCache {
    fn icon(&self, url: &str) -> IconState {
        self.entries.get(url).copied().unwrap_or(IconState::Pending)
    }
}
