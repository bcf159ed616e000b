use albumtree_core::Gallery;
use anyhow::Result;
use chrono::{DateTime, Utc};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use super::format_time;

pub fn add(
    gallery: &Gallery,
    album: i64,
    title: &str,
    taken_at: Option<DateTime<Utc>>,
) -> Result<()> {
    let photo = gallery.add_photo(album, title, taken_at)?;
    println!(
        "Added photo #{} {} to {}",
        photo.id,
        photo.title,
        gallery.full_path(album)?
    );
    Ok(())
}

pub fn rm(gallery: &Gallery, id: i64) -> Result<()> {
    gallery.remove_photo(id)?;
    println!("Removed photo #{id}");
    Ok(())
}

pub fn ls(gallery: &Gallery, album: i64, recursive: bool) -> Result<()> {
    let photos = if recursive {
        gallery.photos_under(album)?
    } else {
        gallery.photos_in(album)?
    };

    if photos.is_empty() {
        println!("No photos in {}.", gallery.full_path(album)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID"),
        Cell::new("Title"),
        Cell::new("Album"),
        Cell::new("Taken At"),
    ]);

    for photo in &photos {
        table.add_row(vec![
            Cell::new(photo.id),
            Cell::new(&photo.title),
            Cell::new(gallery.full_path(photo.album_id)?),
            Cell::new(format_time(photo.taken_at)),
        ]);
    }

    println!("{table}");
    let range = gallery.taken_at_range(album)?;
    if !range.is_empty() {
        println!(
            "  {} photos, taken {} .. {}",
            photos.len(),
            format_time(range.min),
            format_time(range.max)
        );
    }
    Ok(())
}
