use albumtree_core::Gallery;
use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

pub fn run(gallery: &Gallery, json: bool) -> Result<()> {
    let forest = gallery.forest()?;

    if json {
        let rows: Vec<serde_json::Value> = forest
            .nodes_with_depth()
            .into_iter()
            .map(|(node, depth)| serde_json::json!({ "album": node, "depth": depth }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if forest.is_empty() {
        println!("No albums yet. Create one with `albumtree album add <title>`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID"),
        Cell::new("Album"),
        Cell::new("Left"),
        Cell::new("Right"),
    ]);

    for (node, depth) in forest.nodes_with_depth() {
        let title = format!("{}{}", "  ".repeat(depth), node.title);
        let title = if node.interval.is_leaf() {
            Cell::new(title)
        } else {
            Cell::new(title).fg(Color::Cyan)
        };
        table.add_row(vec![
            Cell::new(node.id),
            title,
            Cell::new(node.interval.left),
            Cell::new(node.interval.right),
        ]);
    }

    println!("{table}");
    Ok(())
}
