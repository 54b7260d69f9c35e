//! Spatial tree printing

use super::{load_config, open_scene};
use anyhow::Result;
use serde_json::json;

pub struct TreeArgs {
    pub scene: String,
    pub filter: Option<String>,
    pub positional_ids: bool,
    pub collapsed: bool,
    pub format: String,
}

pub fn run(args: TreeArgs) -> Result<()> {
    let mut viewer = open_scene(&args.scene, load_config(args.positional_ids)?)?;

    if viewer.tree().is_none() {
        println!("Scene has no spatial structure.");
        return Ok(());
    }

    if !args.collapsed {
        viewer.set_all_expanded(true);
    }
    if let Some(filter) = &args.filter {
        viewer.set_filter(filter.as_str());
    }

    let rows = viewer.tree_rows();

    match args.format.as_str() {
        "json" => {
            let out: Vec<_> = rows
                .iter()
                .map(|row| {
                    json!({
                        "id": row.id.as_str(),
                        "depth": row.depth,
                        "name": row.name,
                        "category": row.category,
                        "visible": row.visible,
                        "elements": row.element_count,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        _ => {
            if rows.is_empty() {
                println!("No nodes match '{}'.", args.filter.as_deref().unwrap_or(""));
                return Ok(());
            }
            for row in &rows {
                let marker = match (row.has_children, row.expanded) {
                    (false, _) => " ",
                    (true, true) => "v",
                    (true, false) => ">",
                };
                let category = row.category.as_deref().unwrap_or("-");
                println!(
                    "{}{} {}  [{}]  {} elements  ({})",
                    "  ".repeat(row.depth),
                    marker,
                    row.name,
                    category,
                    row.element_count,
                    row.id
                );
            }
        }
    }

    Ok(())
}
