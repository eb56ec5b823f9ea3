//! Revocable display references for image resources
//!
//! The engine never reads or decodes pixels. It only hands out small,
//! revocable handles that the presentation layer turns into URLs
//! (`/res/{generation}/{slot}`) and that the HTTP layer resolves back to the
//! file bytes on demand.
//!
//! Handles are allocated per dataset load. Every load opens a new
//! *generation*; when a newer dataset is installed the whole previous
//! generation is released at once, so repeated uploads never accumulate
//! dead references.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the bytes behind a display reference live.
#[derive(Debug, Clone)]
pub enum ByteSource {
    /// A file on disk, read lazily when the reference is resolved.
    File(PathBuf),
    /// Bytes already held in memory (e.g. uploaded through the HTTP API).
    Memory(Arc<[u8]>),
}

impl ByteSource {
    /// Read the full content. Memory sources are copied out of the shared buffer.
    pub fn read(&self) -> std::io::Result<Vec<u8>> {
        match self {
            ByteSource::File(path) => std::fs::read(path),
            ByteSource::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }

    /// Human-readable location, used in exports and the CLI table.
    pub fn location(&self, name: &str) -> String {
        match self {
            ByteSource::File(path) => path.display().to_string(),
            ByteSource::Memory(_) => name.to_string(),
        }
    }
}

/// A registered resource: the originating file name plus its bytes.
#[derive(Debug, Clone)]
pub struct Resource {
    pub name: String,
    pub source: ByteSource,
}

impl Resource {
    /// MIME type guessed from the file extension.
    pub fn content_type(&self) -> &'static str {
        let ext = Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "bmp" => "image/bmp",
            "svg" => "image/svg+xml",
            "ico" => "image/x-icon",
            "tif" | "tiff" => "image/tiff",
            "avif" => "image/avif",
            _ => "application/octet-stream",
        }
    }
}

/// Opaque identity of one display reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResourceHandle {
    generation: u32,
    slot: u32,
}

impl ResourceHandle {
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// The display reference handed to the presentation layer.
    pub fn url(&self) -> String {
        format!("/res/{}/{}", self.generation, self.slot)
    }

    /// Inverse of [`ResourceHandle::url`]. Returns `None` for anything that
    /// is not a well-formed reference.
    pub fn parse_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("/res/")?;
        let (generation, slot) = rest.split_once('/')?;
        Some(Self {
            generation: generation.parse().ok()?,
            slot: slot.parse().ok()?,
        })
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}

/// Owns every live display reference.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    generation: u32,
    next_slot: u32,
    live: HashMap<ResourceHandle, Resource>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new generation. Handles acquired afterwards belong to it.
    pub fn begin_generation(&mut self) -> u32 {
        self.generation += 1;
        self.next_slot = 0;
        self.generation
    }

    /// Generation that [`acquire`](Self::acquire) currently allocates into.
    pub fn current_generation(&self) -> u32 {
        self.generation
    }

    pub fn acquire(&mut self, name: &str, source: ByteSource) -> ResourceHandle {
        let handle = ResourceHandle {
            generation: self.generation,
            slot: self.next_slot,
        };
        self.next_slot += 1;
        self.live.insert(
            handle,
            Resource {
                name: name.to_string(),
                source,
            },
        );
        handle
    }

    /// Revoke one reference. Returns false if it was not live.
    pub fn release(&mut self, handle: ResourceHandle) -> bool {
        self.live.remove(&handle).is_some()
    }

    /// Revoke every reference of a generation, returning how many were live.
    pub fn release_generation(&mut self, generation: u32) -> usize {
        let before = self.live.len();
        self.live.retain(|handle, _| handle.generation != generation);
        let released = before - self.live.len();
        if released > 0 {
            log::info!("released {} display reference(s) of load #{}", released, generation);
        }
        released
    }

    pub fn resolve(&self, handle: ResourceHandle) -> Option<&Resource> {
        self.live.get(&handle)
    }

    /// Resolve a display reference string as produced by [`ResourceHandle::url`].
    pub fn resolve_url(&self, url: &str) -> Option<&Resource> {
        ResourceHandle::parse_url(url).and_then(|h| self.resolve(h))
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
