pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod hierarchy;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use catalog::Catalog;
use config::Settings;
use domain::*;
use error::Result;
use hierarchy::Forest;

/// The main entry point for the albumtree library.
pub struct Gallery {
    catalog: Catalog,
    settings: Settings,
}

impl Gallery {
    /// Open or create the catalog named in `settings`.
    pub fn open(settings: Settings) -> Result<Self> {
        let catalog = Catalog::open(&settings.catalog_path)?;
        Self::with_catalog(catalog, settings)
    }

    /// A throwaway gallery backed by an in-memory catalog.
    pub fn open_in_memory(settings: Settings) -> Result<Self> {
        Self::with_catalog(Catalog::open_in_memory()?, settings)
    }

    fn with_catalog(mut catalog: Catalog, settings: Settings) -> Result<Self> {
        catalog.set_busy_timeout(settings.busy_timeout())?;
        catalog.set_verify_mutations(settings.verify_mutations);
        debug!(
            catalog = %settings.catalog_path.display(),
            verify = settings.verify_mutations,
            "gallery ready"
        );
        Ok(Self { catalog, settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ── Albums ───────────────────────────────────────────────────────

    /// Create an album as the last child of `parent_id`, or as the last root.
    pub fn create_album(&mut self, parent_id: Option<AlbumId>, title: &str) -> Result<AlbumNode> {
        self.catalog.insert_album(parent_id, title)
    }

    /// Move an album and everything below it. `None` moves it to the top level.
    pub fn move_album(&mut self, id: AlbumId, new_parent: Option<AlbumId>) -> Result<AlbumNode> {
        self.catalog.move_album(id, new_parent)
    }

    /// Delete an album with its sub-albums and photos. Returns the number
    /// of albums removed.
    pub fn delete_album(&mut self, id: AlbumId) -> Result<usize> {
        self.catalog.delete_album(id)
    }

    /// Path, subtree timestamps and photo count of one album.
    pub fn album(&self, id: AlbumId) -> Result<AlbumSummary> {
        self.catalog.album_summary(id, &self.settings.path_separator)
    }

    /// All albums in display (pre-)order.
    pub fn albums(&self) -> Result<Vec<AlbumNode>> {
        self.catalog.list_albums()
    }

    pub fn children(&self, id: AlbumId) -> Result<Vec<AlbumNode>> {
        self.catalog.children(id)
    }

    pub fn ancestors(&self, id: AlbumId) -> Result<Vec<AlbumNode>> {
        self.catalog.ancestors(id)
    }

    pub fn descendants(&self, id: AlbumId) -> Result<Vec<AlbumNode>> {
        self.catalog.descendants(id)
    }

    pub fn is_descendant(&self, candidate: AlbumId, ancestor: AlbumId) -> Result<bool> {
        self.catalog.is_descendant(candidate, ancestor)
    }

    /// Titles from the root down to `id`, joined with the configured separator.
    pub fn full_path(&self, id: AlbumId) -> Result<String> {
        self.catalog.full_path(id, &self.settings.path_separator)
    }

    /// Snapshot of the whole tree for in-memory traversal.
    pub fn forest(&self) -> Result<Forest> {
        self.catalog.forest()
    }

    // ── Photos ───────────────────────────────────────────────────────

    pub fn add_photo(
        &self,
        album_id: AlbumId,
        title: &str,
        taken_at: Option<DateTime<Utc>>,
    ) -> Result<PhotoItem> {
        self.catalog.add_photo(album_id, title, taken_at)
    }

    pub fn remove_photo(&self, id: i64) -> Result<()> {
        self.catalog.remove_photo(id)
    }

    pub fn photos_in(&self, album_id: AlbumId) -> Result<Vec<PhotoItem>> {
        self.catalog.photos_in(album_id)
    }

    pub fn photos_under(&self, album_id: AlbumId) -> Result<Vec<PhotoItem>> {
        self.catalog.photos_under(album_id)
    }

    pub fn taken_at_range(&self, album_id: AlbumId) -> Result<TakenAtRange> {
        self.catalog.taken_at_range(album_id)
    }

    // ── Maintenance ──────────────────────────────────────────────────

    pub fn check(&self) -> Result<TreeErrors> {
        let errors = self.catalog.check_tree()?;
        if errors.is_broken() {
            warn!(%errors, "album tree is broken");
        }
        Ok(errors)
    }

    /// Rebuild intervals from parent links. Returns the number of albums renumbered.
    pub fn fix(&mut self) -> Result<usize> {
        self.catalog.fix_tree()
    }
}
