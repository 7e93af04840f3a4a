//! Album catalog
//!
//! Static mapping from tag identifier to playable album metadata, built once
//! at startup from configuration and read-only afterwards. Construction
//! rejects colliding identifiers instead of letting a later entry shadow an
//! earlier one.

use std::collections::{HashMap, HashSet};

use tagbox_common::config::AlbumConfig;
use tagbox_common::TagId;

use crate::{Error, Result};

/// One playable album and the tag that selects it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumEntry {
    /// Catalog index, unique across the catalog
    pub index: u32,
    /// Tag provisioned for this album, unique across the catalog
    pub tag_id: TagId,
    /// Context URI handed to the playback service
    pub uri: String,
    /// Album artist
    pub artist: String,
    /// Album title
    pub title: String,
}

impl From<AlbumConfig> for AlbumEntry {
    fn from(album: AlbumConfig) -> Self {
        Self {
            index: album.index,
            tag_id: album.tag_id,
            uri: album.uri,
            artist: album.artist,
            title: album.title,
        }
    }
}

/// Read-only tag → album mapping
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<AlbumEntry>,
    by_tag: HashMap<TagId, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate tag ids and duplicate indexes
    pub fn new(entries: Vec<AlbumEntry>) -> Result<Self> {
        let mut by_tag = HashMap::with_capacity(entries.len());
        let mut seen_index = HashSet::with_capacity(entries.len());

        for (pos, entry) in entries.iter().enumerate() {
            if let Some(prev) = by_tag.insert(entry.tag_id.clone(), pos) {
                return Err(Error::Catalog(format!(
                    "tag id {} is assigned to both {:?} and {:?}",
                    entry.tag_id, entries[prev].title, entry.title
                )));
            }
            if !seen_index.insert(entry.index) {
                return Err(Error::Catalog(format!(
                    "duplicate catalog index {} ({:?})",
                    entry.index, entry.title
                )));
            }
        }

        Ok(Self { entries, by_tag })
    }

    /// Build a catalog from the `[[albums]]` config tables
    pub fn from_config(albums: &[AlbumConfig]) -> Result<Self> {
        Self::new(albums.iter().cloned().map(AlbumEntry::from).collect())
    }

    /// Look up the album provisioned on a tag, if any
    pub fn lookup(&self, tag_id: &TagId) -> Option<&AlbumEntry> {
        self.by_tag.get(tag_id).map(|&pos| &self.entries[pos])
    }

    /// Number of albums in the catalog
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no albums
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, in catalog order
    pub fn entries(&self) -> &[AlbumEntry] {
        &self.entries
    }
}
