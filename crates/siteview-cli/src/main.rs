//! Siteview CLI - Inspect, hide, and annotate scene documents

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{comment, config, project, tree, visibility};

#[derive(Parser)]
#[command(name = "siteview")]
#[command(about = "Spatial tree, surface anchoring, and comments for 3D building models", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the spatial tree of a scene
    Tree {
        /// Path to scene JSON
        scene: String,

        /// Only show nodes whose name or category contains this text
        #[arg(long)]
        filter: Option<String>,

        /// Derive ids for unidentified nodes from their position
        #[arg(long)]
        positional_ids: bool,

        /// Show only the root instead of every branch
        #[arg(long)]
        collapsed: bool,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Hide every element under a tree node
    Hide {
        /// Path to scene JSON
        scene: String,

        /// Node id as printed by `siteview tree`
        node: String,

        /// Derive ids for unidentified nodes from their position
        #[arg(long)]
        positional_ids: bool,
    },

    /// Show every element under a tree node
    Show {
        /// Path to scene JSON
        scene: String,

        /// Node id as printed by `siteview tree`
        node: String,

        /// Derive ids for unidentified nodes from their position
        #[arg(long)]
        positional_ids: bool,
    },

    /// Project a ray onto the model surface
    ProjectRay {
        /// Path to scene JSON
        scene: String,

        /// Ray origin (comma-separated x,y,z)
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
        origin: [f32; 3],

        /// Ray direction (comma-separated x,y,z)
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
        direction: [f32; 3],
    },

    /// Snap a point to the nearest model surface
    ProjectPoint {
        /// Path to scene JSON
        scene: String,

        /// Point to snap (comma-separated x,y,z)
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
        point: [f32; 3],
    },

    /// Comment operations against a JSON comment file
    #[command(subcommand)]
    Comment(comment::CommentCommands),

    /// Print the effective configuration
    Config,
}

pub(crate) fn parse_vec3(s: &str) -> Result<[f32; 3], String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err(format!("expected 3 comma-separated values, got {}", parts.len()));
    }
    let x: f32 = parts[0].trim().parse().map_err(|e| format!("invalid x: {}", e))?;
    let y: f32 = parts[1].trim().parse().map_err(|e| format!("invalid y: {}", e))?;
    let z: f32 = parts[2].trim().parse().map_err(|e| format!("invalid z: {}", e))?;
    Ok([x, y, z])
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Tree {
            scene,
            filter,
            positional_ids,
            collapsed,
            format,
        } => tree::run(tree::TreeArgs {
            scene,
            filter,
            positional_ids,
            collapsed,
            format,
        }),
        Commands::Hide {
            scene,
            node,
            positional_ids,
        } => visibility::run(&scene, &node, false, positional_ids),
        Commands::Show {
            scene,
            node,
            positional_ids,
        } => visibility::run(&scene, &node, true, positional_ids),
        Commands::ProjectRay {
            scene,
            origin,
            direction,
        } => project::ray(&scene, origin, direction),
        Commands::ProjectPoint { scene, point } => project::point(&scene, point),
        Commands::Comment(cmd) => comment::run(cmd),
        Commands::Config => config::run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vec3() {
        assert_eq!(parse_vec3("1, -2.5,3").unwrap(), [1.0, -2.5, 3.0]);
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec3("1,x,3").unwrap_err().contains("invalid y"));
    }
}
