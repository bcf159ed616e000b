use albumtree_core::Gallery;
use anyhow::Result;

use super::format_time;

pub fn add(gallery: &mut Gallery, parent: Option<i64>, title: &str) -> Result<()> {
    let album = gallery.create_album(parent, title)?;
    println!(
        "Created album #{} {} {}",
        album.id,
        gallery.full_path(album.id)?,
        album.interval
    );
    Ok(())
}

pub fn mv(gallery: &mut Gallery, id: i64, parent: Option<i64>) -> Result<()> {
    let album = gallery.move_album(id, parent)?;
    println!(
        "Moved album #{} to {} {}",
        album.id,
        gallery.full_path(album.id)?,
        album.interval
    );
    Ok(())
}

pub fn rm(gallery: &mut Gallery, id: i64) -> Result<()> {
    let path = gallery.full_path(id)?;
    let removed = gallery.delete_album(id)?;
    println!("Deleted {path} ({removed} albums removed)");
    Ok(())
}

pub fn show(gallery: &Gallery, id: i64, json: bool) -> Result<()> {
    let summary = gallery.album(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Album #{} {}", summary.album.id, summary.path);
    println!("{}", "-".repeat(60));
    println!("  Bounds:     {}", summary.album.interval);
    println!("  Depth:      {}", summary.depth);
    println!("  Photos:     {}", summary.photo_count);
    if summary.taken_at.is_empty() {
        println!("  Taken at:   no dated photos");
    } else {
        println!(
            "  Taken at:   {} .. {}",
            format_time(summary.taken_at.min),
            format_time(summary.taken_at.max)
        );
    }

    let children = gallery.children(id)?;
    if !children.is_empty() {
        println!("  Sub-albums:");
        for child in &children {
            println!("    #{} {}", child.id, child.title);
        }
    }

    Ok(())
}
