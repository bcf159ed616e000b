use albumtree_core::Gallery;
use anyhow::{bail, Result};

pub fn check(gallery: &Gallery) -> Result<()> {
    let errors = gallery.check()?;
    if !errors.is_broken() {
        println!("Album tree OK.");
        return Ok(());
    }

    println!("Album tree has {} problems:", errors.total());
    println!("  Odd bounds:       {}", errors.oddness);
    println!("  Duplicate bounds: {}", errors.duplicates);
    println!("  Wrong parent:     {}", errors.wrong_parent);
    println!("  Missing parent:   {}", errors.missing_parent);
    println!("  Overlaps:         {}", errors.overlaps);
    bail!("run `albumtree fix` to rebuild the bounds")
}

pub fn fix(gallery: &mut Gallery) -> Result<()> {
    let renumbered = gallery.fix()?;
    if renumbered == 0 {
        println!("Album tree already consistent.");
    } else {
        println!("Renumbered {renumbered} albums.");
    }
    Ok(())
}
