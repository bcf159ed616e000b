pub mod schema;

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::domain::*;
use crate::error::{Error, Result};
use crate::hierarchy::forest::Forest;
use crate::hierarchy::interval::{is_descendant, Interval};
use crate::hierarchy::mutator::{self, IntervalStore, Renumbering};
use crate::hierarchy::path;

const ALBUM_COLUMNS: &str = "id, parent_id, lft, rgt, title";
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed catalog of albums (as a nested set) and their photos.
pub struct Catalog {
    conn: Connection,
    verify_mutations: bool,
}

impl Catalog {
    /// Open or create a catalog at the given path with WAL mode.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        debug!(path = %path.display(), "opened catalog");
        Self::init(conn)
    }

    /// Open an in-memory catalog (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn,
            verify_mutations: true,
        })
    }

    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }

    /// Toggle the full-tree check run before each mutation commits.
    pub fn set_verify_mutations(&mut self, verify: bool) {
        self.verify_mutations = verify;
    }

    /// Run `op` in one write transaction. Any error drops (rolls back) it.
    fn write<T>(&mut self, op: impl FnOnce(&mut TxStore<'_>) -> Result<T>) -> Result<T> {
        let verify = self.verify_mutations;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = op(&mut TxStore { conn: &tx, verify })?;
        tx.commit()?;
        Ok(value)
    }

    // ── Albums ───────────────────────────────────────────────────────

    pub fn insert_album(&mut self, parent_id: Option<AlbumId>, title: &str) -> Result<AlbumNode> {
        let album = self.write(|store| {
            let id = mutator::insert(store, parent_id, title)?;
            store.node(id)
        })?;
        info!(album = album.id, ?parent_id, interval = %album.interval, "created album");
        Ok(album)
    }

    /// Re-parent an album with its subtree. `None` makes it the last root.
    pub fn move_album(&mut self, id: AlbumId, new_parent: Option<AlbumId>) -> Result<AlbumNode> {
        let album = self.write(|store| {
            mutator::move_subtree(store, id, new_parent)?;
            store.node(id)
        })?;
        info!(album = id, ?new_parent, interval = %album.interval, "moved album");
        Ok(album)
    }

    /// Delete an album, its descendants and their photos.
    /// Returns the number of albums removed.
    pub fn delete_album(&mut self, id: AlbumId) -> Result<usize> {
        let removed = self.write(|store| mutator::delete_subtree(store, id))?;
        info!(album = id, removed, "deleted album");
        Ok(removed)
    }

    pub fn get_album(&self, id: AlbumId) -> Result<AlbumNode> {
        load_album(&self.conn, id)
    }

    pub fn find_album(&self, id: AlbumId) -> Result<Option<AlbumNode>> {
        find_album(&self.conn, id)
    }

    /// All albums in pre-order.
    pub fn list_albums(&self) -> Result<Vec<AlbumNode>> {
        query_albums(&self.conn, "1 = 1", [])
    }

    pub fn roots(&self) -> Result<Vec<AlbumNode>> {
        query_albums(&self.conn, "parent_id IS NULL", [])
    }

    pub fn children(&self, id: AlbumId) -> Result<Vec<AlbumNode>> {
        self.get_album(id)?;
        query_albums(&self.conn, "parent_id = ?1", params![id])
    }

    /// Ancestors from the root down to the direct parent.
    pub fn ancestors(&self, id: AlbumId) -> Result<Vec<AlbumNode>> {
        let album = self.get_album(id)?;
        query_albums(
            &self.conn,
            "lft < ?1 AND rgt > ?2",
            params![album.interval.left as i64, album.interval.right as i64],
        )
    }

    pub fn descendants(&self, id: AlbumId) -> Result<Vec<AlbumNode>> {
        let album = self.get_album(id)?;
        query_albums(
            &self.conn,
            "lft > ?1 AND rgt < ?2",
            params![album.interval.left as i64, album.interval.right as i64],
        )
    }

    pub fn siblings(&self, id: AlbumId) -> Result<Vec<AlbumNode>> {
        let album = self.get_album(id)?;
        query_albums(
            &self.conn,
            "parent_id IS ?1 AND id != ?2",
            params![album.parent_id, id],
        )
    }

    pub fn depth(&self, id: AlbumId) -> Result<usize> {
        let album = self.get_album(id)?;
        let depth: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM albums WHERE lft < ?1 AND rgt > ?2",
            params![album.interval.left as i64, album.interval.right as i64],
            |row| row.get(0),
        )?;
        Ok(depth as usize)
    }

    pub fn is_descendant(&self, candidate: AlbumId, ancestor: AlbumId) -> Result<bool> {
        let candidate = self.get_album(candidate)?;
        let ancestor = self.get_album(ancestor)?;
        Ok(is_descendant(&candidate.interval, &ancestor.interval))
    }

    pub fn full_path(&self, id: AlbumId, separator: &str) -> Result<String> {
        let album = self.get_album(id)?;
        path::full_path(&album, separator, |parent_id| self.find_album(parent_id))
    }

    /// Path, depth, photo count and taken-at range of one album, read from a
    /// single snapshot.
    pub fn album_summary(&self, id: AlbumId, separator: &str) -> Result<AlbumSummary> {
        let tx = self.conn.unchecked_transaction()?;
        let album = self.get_album(id)?;
        let summary = AlbumSummary {
            path: self.full_path(id, separator)?,
            taken_at: self.taken_at_range(id)?,
            photo_count: self.count_photos(id)?,
            depth: self.depth(id)?,
            album,
        };
        tx.commit()?;
        Ok(summary)
    }

    /// Consistent snapshot of the whole tree.
    pub fn forest(&self) -> Result<Forest> {
        let tx = self.conn.unchecked_transaction()?;
        let forest = load_forest(&tx)?;
        tx.commit()?;
        Ok(forest)
    }

    // ── Photos ───────────────────────────────────────────────────────

    pub fn add_photo(
        &self,
        album_id: AlbumId,
        title: &str,
        taken_at: Option<DateTime<Utc>>,
    ) -> Result<PhotoItem> {
        self.get_album(album_id)?;
        // Stored with second precision.
        let taken_at = taken_at.and_then(|t| DateTime::from_timestamp(t.timestamp(), 0));
        self.conn.execute(
            "INSERT INTO photos (album_id, title, taken_at) VALUES (?1, ?2, ?3)",
            params![album_id, title, taken_at.map(|t| t.timestamp())],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(photo = id, album = album_id, "added photo");
        Ok(PhotoItem {
            id,
            album_id,
            title: title.to_string(),
            taken_at,
        })
    }

    pub fn remove_photo(&self, id: i64) -> Result<()> {
        let removed = self
            .conn
            .execute("DELETE FROM photos WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(Error::PhotoNotFound(id));
        }
        Ok(())
    }

    pub fn list_photos(&self) -> Result<Vec<PhotoItem>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, album_id, title, taken_at FROM photos ORDER BY id")?;
        let photos = stmt
            .query_map([], photo_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(photos)
    }

    /// Photos owned directly by the album.
    pub fn photos_in(&self, album_id: AlbumId) -> Result<Vec<PhotoItem>> {
        self.get_album(album_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT id, album_id, title, taken_at FROM photos
             WHERE album_id = ?1
             ORDER BY taken_at, id",
        )?;
        let photos = stmt
            .query_map(params![album_id], photo_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(photos)
    }

    /// Photos owned by the album or any album below it.
    pub fn photos_under(&self, album_id: AlbumId) -> Result<Vec<PhotoItem>> {
        let range = self.get_album(album_id)?.interval;
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.album_id, p.title, p.taken_at
             FROM photos p
             JOIN albums a ON a.id = p.album_id
             WHERE a.lft >= ?1 AND a.lft < ?2
             ORDER BY a.lft, p.taken_at, p.id",
        )?;
        let photos = stmt
            .query_map(params![range.left as i64, range.right as i64], photo_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(photos)
    }

    pub fn count_photos(&self, album_id: AlbumId) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM photos WHERE album_id = ?1",
            params![album_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Earliest and latest `taken_at` in the album's subtree, as one range query.
    pub fn taken_at_range(&self, album_id: AlbumId) -> Result<TakenAtRange> {
        let range = self.get_album(album_id)?.interval;
        let (min, max) = self.conn.query_row(
            "SELECT MIN(p.taken_at), MAX(p.taken_at)
             FROM photos p
             JOIN albums a ON a.id = p.album_id
             WHERE a.lft >= ?1 AND a.lft < ?2",
            params![range.left as i64, range.right as i64],
            |row| Ok((row.get::<_, Option<i64>>(0)?, row.get::<_, Option<i64>>(1)?)),
        )?;
        Ok(TakenAtRange {
            min: min.and_then(|secs| DateTime::from_timestamp(secs, 0)),
            max: max.and_then(|secs| DateTime::from_timestamp(secs, 0)),
        })
    }

    // ── Maintenance ──────────────────────────────────────────────────

    pub fn check_tree(&self) -> Result<TreeErrors> {
        Ok(self.forest()?.check())
    }

    /// Rebuild all intervals from parent links. Returns the number of albums
    /// whose bounds changed.
    pub fn fix_tree(&mut self) -> Result<usize> {
        let changed = self.write(|store| {
            let forest = load_forest(store.conn)?;
            let changes = forest.rebuild()?;
            let mut stmt = store
                .conn
                .prepare("UPDATE albums SET lft = ?1, rgt = ?2 WHERE id = ?3")?;
            for (id, interval) in &changes {
                stmt.execute(params![interval.left as i64, interval.right as i64, id])?;
            }
            load_forest(store.conn)?.ensure_consistent()?;
            Ok(changes.len())
        })?;
        if changed > 0 {
            warn!(changed, "rebuilt album intervals from parent links");
        }
        Ok(changed)
    }
}

/// The mutator's view of an open write transaction.
struct TxStore<'a> {
    conn: &'a Connection,
    verify: bool,
}

impl IntervalStore for TxStore<'_> {
    fn node(&self, id: AlbumId) -> Result<AlbumNode> {
        load_album(self.conn, id)
    }

    fn max_right(&self) -> Result<u64> {
        let max: i64 =
            self.conn
                .query_row("SELECT COALESCE(MAX(rgt), 0) FROM albums", [], |row| row.get(0))?;
        Ok(max as u64)
    }

    fn renumber(&mut self, plan: &Renumbering) -> Result<usize> {
        if plan.is_empty() {
            return Ok(0);
        }
        let (sql, values) = renumber_statement(plan);
        Ok(self.conn.execute(&sql, params_from_iter(values.iter()))?)
    }

    fn create(
        &mut self,
        parent_id: Option<AlbumId>,
        interval: Interval,
        title: &str,
    ) -> Result<AlbumId> {
        self.conn.execute(
            "INSERT INTO albums (parent_id, lft, rgt, title, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                parent_id,
                interval.left as i64,
                interval.right as i64,
                title,
                Utc::now().timestamp(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn remove_range(&mut self, range: Interval) -> Result<usize> {
        Ok(self.conn.execute(
            "DELETE FROM albums WHERE lft >= ?1 AND rgt <= ?2",
            params![range.left as i64, range.right as i64],
        )?)
    }

    fn set_parent(&mut self, id: AlbumId, parent_id: Option<AlbumId>) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE albums SET parent_id = ?1 WHERE id = ?2",
            params![parent_id, id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(id));
        }
        Ok(())
    }

    fn verify(&self) -> Result<()> {
        if !self.verify {
            return Ok(());
        }
        load_forest(self.conn)?.ensure_consistent()
    }
}

/// Build one UPDATE applying every shift of `plan` against the old bounds.
/// Shift `i` binds `?(3i+1)` = from, `?(3i+2)` = to (NULL = open), `?(3i+3)` = delta.
fn renumber_statement(plan: &Renumbering) -> (String, Vec<Value>) {
    let mut values = Vec::with_capacity(plan.shifts.len() * 3);
    for shift in &plan.shifts {
        values.push(Value::Integer(shift.from as i64));
        values.push(shift.to.map_or(Value::Null, |to| Value::Integer(to as i64)));
        values.push(Value::Integer(shift.delta));
    }

    let in_range = |column: &str, i: usize| {
        let (from, to) = (3 * i + 1, 3 * i + 2);
        format!("({column} >= ?{from} AND (?{to} IS NULL OR {column} <= ?{to}))")
    };
    let case = |column: &str| {
        let arms: String = (0..plan.shifts.len())
            .map(|i| format!(" WHEN {} THEN {column} + ?{}", in_range(column, i), 3 * i + 3))
            .collect();
        format!("CASE{arms} ELSE {column} END")
    };
    let filter = (0..plan.shifts.len())
        .flat_map(|i| [in_range("lft", i), in_range("rgt", i)])
        .collect::<Vec<_>>()
        .join(" OR ");

    let sql = format!(
        "UPDATE albums SET lft = {}, rgt = {} WHERE {filter}",
        case("lft"),
        case("rgt")
    );
    (sql, values)
}

fn album_from_row(row: &Row<'_>) -> rusqlite::Result<AlbumNode> {
    Ok(AlbumNode {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        interval: Interval {
            left: row.get::<_, i64>(2)? as u64,
            right: row.get::<_, i64>(3)? as u64,
        },
        title: row.get(4)?,
    })
}

fn photo_from_row(row: &Row<'_>) -> rusqlite::Result<PhotoItem> {
    Ok(PhotoItem {
        id: row.get(0)?,
        album_id: row.get(1)?,
        title: row.get(2)?,
        taken_at: row
            .get::<_, Option<i64>>(3)?
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
    })
}

fn find_album(conn: &Connection, id: AlbumId) -> Result<Option<AlbumNode>> {
    let album = conn
        .query_row(
            &format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE id = ?1"),
            params![id],
            album_from_row,
        )
        .optional()?;
    Ok(album)
}

fn load_album(conn: &Connection, id: AlbumId) -> Result<AlbumNode> {
    find_album(conn, id)?.ok_or(Error::NotFound(id))
}

fn query_albums<P: rusqlite::Params>(
    conn: &Connection,
    condition: &str,
    params: P,
) -> Result<Vec<AlbumNode>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ALBUM_COLUMNS} FROM albums WHERE {condition} ORDER BY lft"
    ))?;
    let albums = stmt
        .query_map(params, album_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(albums)
}

/// All albums, with new ids continuing after the highest id ever assigned.
fn load_forest(conn: &Connection) -> Result<Forest> {
    let last_id: Option<i64> = conn
        .query_row(
            "SELECT seq FROM sqlite_sequence WHERE name = 'albums'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    let forest = Forest::from_nodes(query_albums(conn, "1 = 1", [])?);
    Ok(match last_id {
        Some(last_id) => forest.with_next_id(last_id + 1),
        None => forest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::mutator::{delete_subtree, insert, move_subtree};

    fn at(secs: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(secs, 0)
    }

    fn bounds(catalog: &Catalog, id: AlbumId) -> (u64, u64) {
        let album = catalog.get_album(id).unwrap();
        (album.interval.left, album.interval.right)
    }

    fn ids(albums: Vec<AlbumNode>) -> Vec<AlbumId> {
        albums.into_iter().map(|a| a.id).collect()
    }

    /// Trip -> (Paris -> Day1), Rome ; Work
    fn make_catalog() -> (Catalog, [AlbumId; 5]) {
        let mut catalog = Catalog::open_in_memory().unwrap();
        let trip = catalog.insert_album(None, "Trip").unwrap().id;
        let paris = catalog.insert_album(Some(trip), "Paris").unwrap().id;
        let day1 = catalog.insert_album(Some(paris), "Day1").unwrap().id;
        let rome = catalog.insert_album(Some(trip), "Rome").unwrap().id;
        let work = catalog.insert_album(None, "Work").unwrap().id;
        (catalog, [trip, paris, day1, rome, work])
    }

    // ── Album tests ──────────────────────────────────────────────

    #[test]
    fn test_insert_assigns_nested_bounds() {
        let (catalog, [trip, paris, day1, rome, work]) = make_catalog();
        assert_eq!(bounds(&catalog, trip), (1, 8));
        assert_eq!(bounds(&catalog, paris), (2, 5));
        assert_eq!(bounds(&catalog, day1), (3, 4));
        assert_eq!(bounds(&catalog, rome), (6, 7));
        assert_eq!(bounds(&catalog, work), (9, 10));
        assert_eq!(catalog.get_album(day1).unwrap().parent_id, Some(paris));
    }

    #[test]
    fn test_insert_unknown_parent_writes_nothing() {
        let (mut catalog, _) = make_catalog();
        let before = catalog.list_albums().unwrap();
        let err = catalog.insert_album(Some(404), "Lost").unwrap_err();
        assert!(matches!(err, Error::NotFound(404)));
        assert_eq!(catalog.list_albums().unwrap(), before);
    }

    #[test]
    fn test_queries() {
        let (catalog, [trip, paris, day1, rome, work]) = make_catalog();
        assert_eq!(ids(catalog.list_albums().unwrap()), vec![trip, paris, day1, rome, work]);
        assert_eq!(ids(catalog.roots().unwrap()), vec![trip, work]);
        assert_eq!(ids(catalog.children(trip).unwrap()), vec![paris, rome]);
        assert_eq!(ids(catalog.ancestors(day1).unwrap()), vec![trip, paris]);
        assert_eq!(ids(catalog.descendants(trip).unwrap()), vec![paris, day1, rome]);
        assert_eq!(ids(catalog.siblings(paris).unwrap()), vec![rome]);
        assert_eq!(ids(catalog.siblings(work).unwrap()), vec![trip]);
        assert_eq!(catalog.depth(day1).unwrap(), 2);
        assert!(catalog.is_descendant(day1, trip).unwrap());
        assert!(!catalog.is_descendant(rome, paris).unwrap());
        assert!(matches!(catalog.children(77).unwrap_err(), Error::NotFound(77)));
    }

    #[test]
    fn test_full_path() {
        let (catalog, [_, _, day1, _, work]) = make_catalog();
        assert_eq!(catalog.full_path(day1, "/").unwrap(), "Trip/Paris/Day1");
        assert_eq!(catalog.full_path(work, "/").unwrap(), "Work");
        assert!(matches!(catalog.full_path(99, "/").unwrap_err(), Error::NotFound(99)));
    }

    #[test]
    fn test_move_album() {
        let (mut catalog, [trip, paris, day1, rome, work]) = make_catalog();
        let moved = catalog.move_album(paris, Some(work)).unwrap();

        assert_eq!(moved.parent_id, Some(work));
        assert_eq!(moved.interval, Interval { left: 6, right: 9 });
        assert_eq!(bounds(&catalog, trip), (1, 4));
        assert_eq!(bounds(&catalog, rome), (2, 3));
        assert_eq!(bounds(&catalog, work), (5, 10));
        assert_eq!(bounds(&catalog, day1), (7, 8));
        assert_eq!(catalog.full_path(day1, "/").unwrap(), "Work/Paris/Day1");
    }

    #[test]
    fn test_move_album_to_root() {
        let (mut catalog, [trip, paris, ..]) = make_catalog();
        let moved = catalog.move_album(paris, None).unwrap();
        assert_eq!(moved.parent_id, None);
        assert_eq!(moved.interval, Interval { left: 7, right: 10 });
        assert_eq!(bounds(&catalog, trip), (1, 4));
    }

    #[test]
    fn test_move_into_descendant_rolls_back() {
        let (mut catalog, [trip, _, day1, ..]) = make_catalog();
        let before = catalog.list_albums().unwrap();

        let err = catalog.move_album(trip, Some(day1)).unwrap_err();
        assert!(matches!(err, Error::Cycle { .. }));
        assert_eq!(catalog.list_albums().unwrap(), before);
    }

    #[test]
    fn test_delete_album_compacts_and_cascades_photos() {
        let (mut catalog, [trip, paris, day1, rome, work]) = make_catalog();
        catalog.add_photo(day1, "eiffel.jpg", at(100)).unwrap();
        let kept = catalog.add_photo(rome, "colosseum.jpg", at(200)).unwrap();

        assert_eq!(catalog.delete_album(paris).unwrap(), 2);

        assert!(catalog.find_album(day1).unwrap().is_none());
        assert_eq!(bounds(&catalog, trip), (1, 4));
        assert_eq!(bounds(&catalog, rome), (2, 3));
        assert_eq!(bounds(&catalog, work), (5, 6));
        assert_eq!(catalog.list_photos().unwrap(), vec![kept]);
    }

    #[test]
    fn test_delete_unknown_album() {
        let (mut catalog, _) = make_catalog();
        assert!(matches!(catalog.delete_album(12).unwrap_err(), Error::NotFound(12)));
    }

    #[test]
    fn test_ids_are_never_reused() {
        let (mut catalog, [.., work]) = make_catalog();
        catalog.delete_album(work).unwrap();
        let next = catalog.insert_album(None, "Home").unwrap();
        assert!(next.id > work);
    }

    #[test]
    fn test_snapshot_forest_continues_id_sequence() {
        let (mut catalog, [.., work]) = make_catalog();
        catalog.delete_album(work).unwrap();

        let mut snapshot = catalog.forest().unwrap();
        let in_memory = snapshot.insert_album(None, "Home").unwrap();
        let stored = catalog.insert_album(None, "Home").unwrap();
        assert!(in_memory > work);
        assert_eq!(in_memory, stored.id);
    }

    #[test]
    fn test_album_summary() {
        let (catalog, [trip, paris, day1, ..]) = make_catalog();
        catalog.add_photo(day1, "eiffel.jpg", at(300)).unwrap();
        catalog.add_photo(paris, "louvre.jpg", at(100)).unwrap();

        let summary = catalog.album_summary(paris, " > ").unwrap();
        assert_eq!(summary.path, "Trip > Paris");
        assert_eq!(summary.depth, 1);
        assert_eq!(summary.photo_count, 1);
        assert_eq!((summary.taken_at.min, summary.taken_at.max), (at(100), at(300)));
        assert_eq!(catalog.album_summary(trip, "/").unwrap().photo_count, 0);
        assert!(matches!(catalog.album_summary(99, "/"), Err(Error::NotFound(99))));
    }

    #[test]
    fn test_corrupt_tree_aborts_mutation() {
        let (mut catalog, [trip, ..]) = make_catalog();
        catalog
            .conn
            .execute("UPDATE albums SET rgt = 3 WHERE id = ?1", params![trip])
            .unwrap();
        let before = catalog.list_albums().unwrap();

        let err = catalog.insert_album(None, "New").unwrap_err();
        assert!(matches!(err, Error::ConsistencyViolation(_)));
        assert_eq!(catalog.list_albums().unwrap(), before);

        catalog.set_verify_mutations(false);
        assert!(catalog.insert_album(None, "New").is_ok());
    }

    #[test]
    fn test_renumber_statement_binds_three_values_per_shift() {
        let plan = mutator::plan_move(Interval { left: 2, right: 5 }, 10);
        let (sql, values) = renumber_statement(&plan);
        assert_eq!(values.len(), 6);
        assert!(sql.starts_with("UPDATE albums SET lft = CASE WHEN"));
        assert!(sql.contains("?6"));
        assert!(!sql.contains("?7"));
    }

    // ── Photo tests ──────────────────────────────────────────────

    #[test]
    fn test_photo_lifecycle() {
        let (catalog, [trip, paris, day1, ..]) = make_catalog();
        let a = catalog.add_photo(day1, "a.jpg", at(300)).unwrap();
        let b = catalog.add_photo(paris, "b.jpg", None).unwrap();
        let c = catalog.add_photo(trip, "c.jpg", at(100)).unwrap();

        assert_eq!(catalog.photos_in(paris).unwrap(), vec![b.clone()]);
        assert_eq!(catalog.photos_under(paris).unwrap(), vec![b.clone(), a.clone()]);
        assert_eq!(catalog.photos_under(trip).unwrap().len(), 3);
        assert_eq!(catalog.count_photos(day1).unwrap(), 1);

        catalog.remove_photo(c.id).unwrap();
        assert!(matches!(
            catalog.remove_photo(c.id).unwrap_err(),
            Error::PhotoNotFound(id) if id == c.id
        ));
        assert!(matches!(
            catalog.add_photo(999, "x.jpg", None).unwrap_err(),
            Error::NotFound(999)
        ));
    }

    #[test]
    fn test_taken_at_range() {
        let (catalog, [trip, paris, day1, rome, work]) = make_catalog();
        assert!(catalog.taken_at_range(trip).unwrap().is_empty());

        catalog.add_photo(day1, "a.jpg", at(500)).unwrap();
        let single = catalog.taken_at_range(trip).unwrap();
        assert_eq!((single.min, single.max), (at(500), at(500)));

        catalog.add_photo(rome, "b.jpg", at(100)).unwrap();
        catalog.add_photo(work, "c.jpg", at(10)).unwrap();
        catalog.add_photo(paris, "d.jpg", None).unwrap();

        let range = catalog.taken_at_range(trip).unwrap();
        assert_eq!((range.min, range.max), (at(100), at(500)));

        let forest = catalog.forest().unwrap();
        let photos = catalog.list_photos().unwrap();
        for id in [trip, paris, day1, rome, work] {
            assert_eq!(
                catalog.taken_at_range(id).unwrap(),
                forest.taken_at_range(id, &photos).unwrap()
            );
        }
    }

    // ── Maintenance tests ────────────────────────────────────────

    #[test]
    fn test_check_tree_clean() {
        let (catalog, _) = make_catalog();
        assert_eq!(catalog.check_tree().unwrap(), TreeErrors::default());
    }

    #[test]
    fn test_fix_tree_repairs_scrambled_bounds() {
        let (mut catalog, _) = make_catalog();
        let expected = catalog.list_albums().unwrap();
        catalog
            .conn
            .execute("UPDATE albums SET lft = lft * 10, rgt = lft * 10 + 1", [])
            .unwrap();
        assert!(catalog.check_tree().unwrap().is_broken());

        assert_eq!(catalog.fix_tree().unwrap(), 5);
        assert_eq!(catalog.list_albums().unwrap(), expected);
        assert_eq!(catalog.fix_tree().unwrap(), 0);
    }

    enum Op {
        Insert(Option<AlbumId>, &'static str),
        Move(AlbumId, Option<AlbumId>),
        Delete(AlbumId),
    }

    fn apply<S: IntervalStore + ?Sized>(store: &mut S, op: &Op) -> Result<()> {
        match *op {
            Op::Insert(parent, title) => insert(store, parent, title).map(|_| ()),
            Op::Move(id, parent) => move_subtree(store, id, parent),
            Op::Delete(id) => delete_subtree(store, id).map(|_| ()),
        }
    }

    #[test]
    fn test_forest_and_catalog_agree() {
        let mut catalog = Catalog::open_in_memory().unwrap();
        let mut forest = Forest::new();
        let ops = [
            Op::Insert(None, "A"),
            Op::Insert(Some(1), "B"),
            Op::Insert(Some(2), "C"),
            Op::Insert(None, "D"),
            Op::Insert(Some(4), "E"),
            Op::Move(2, Some(5)),
            Op::Move(4, Some(1)),
            Op::Delete(3),
            Op::Insert(Some(2), "F"),
        ];

        for op in &ops {
            forest.transaction(|f| apply(f, op)).unwrap();
            catalog.write(|store| apply(store, op)).unwrap();
        }

        assert_eq!(catalog.forest().unwrap().intervals(), forest.intervals());
        assert_eq!(
            catalog.full_path(6, "/").unwrap(),
            forest.full_path(6, "/").unwrap()
        );
    }

    #[test]
    fn test_reopen_persists_and_rejects_unknown_schema() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/catalog.db");
        {
            let mut catalog = Catalog::open(&path).unwrap();
            catalog.insert_album(None, "Trip").unwrap();
        }
        let catalog = Catalog::open(&path).unwrap();
        assert_eq!(catalog.list_albums().unwrap().len(), 1);
        catalog.conn.pragma_update(None, "user_version", 7).unwrap();
        drop(catalog);

        assert!(matches!(
            Catalog::open(&path).err().unwrap(),
            Error::UnsupportedSchema(7)
        ));
    }
}
