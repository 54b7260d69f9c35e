//! Comment commands backed by a JSON file

use anyhow::{Context, Result};
use clap::Subcommand;
use siteview_annotation::{AnnotationStore, Comment, CommentBackend, JsonFileBackend};
use siteview_core::{CommentId, SiteviewConfig, Vec3};

const DEFAULT_FILE: &str = ".siteview/comments.json";

#[derive(Subcommand)]
pub enum CommentCommands {
    /// Add a comment
    Add {
        /// Comment text
        content: String,

        /// World-space anchor (comma-separated x,y,z)
        #[arg(long, value_parser = crate::parse_vec3, allow_hyphen_values = true)]
        anchor: Option<[f32; 3]>,

        /// Author id (defaults to the configured author)
        #[arg(long)]
        author: Option<String>,

        /// Make the comment visible to the secondary role
        #[arg(long)]
        share: bool,

        /// Comment file
        #[arg(long, default_value = DEFAULT_FILE)]
        file: String,
    },

    /// List comments
    List {
        /// Only comments visible to the secondary role
        #[arg(long)]
        shared: bool,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,

        /// Comment file
        #[arg(long, default_value = DEFAULT_FILE)]
        file: String,
    },

    /// Remove a comment
    Rm {
        /// Comment id
        id: String,

        /// Comment file
        #[arg(long, default_value = DEFAULT_FILE)]
        file: String,
    },
}

pub fn run(cmd: CommentCommands) -> Result<()> {
    match cmd {
        CommentCommands::Add {
            content,
            anchor,
            author,
            share,
            file,
        } => add(&content, anchor, author, share, &file),
        CommentCommands::List { shared, format, file } => list(shared, &format, &file),
        CommentCommands::Rm { id, file } => remove(&id, &file),
    }
}

fn ensure_parent(file: &str) -> Result<()> {
    if let Some(parent) = std::path::Path::new(file).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    Ok(())
}

fn add(content: &str, anchor: Option<[f32; 3]>, author: Option<String>, share: bool, file: &str) -> Result<()> {
    if content.trim().is_empty() {
        anyhow::bail!("Comment text must not be empty");
    }
    ensure_parent(file)?;

    let author = match author {
        Some(author) => author,
        None => SiteviewConfig::load().context("Failed to load configuration")?.comments.author,
    };
    let comment = Comment::new(content, anchor.map(Vec3::from_array), author).visible_to_secondary_role(share);

    let mut backend = JsonFileBackend::new(file);
    backend
        .create(&comment)
        .with_context(|| format!("Failed to save comment to {}", file))?;

    println!("Added comment {}", comment.id);
    Ok(())
}

fn load_store(file: &str) -> Result<(AnnotationStore, JsonFileBackend)> {
    let config = SiteviewConfig::load().context("Failed to load configuration")?;
    let backend = JsonFileBackend::new(file);
    let mut store = AnnotationStore::new(&config.comments);
    store
        .load_from(&backend)
        .with_context(|| format!("Failed to read comments from {}", file))?;
    Ok((store, backend))
}

fn list(shared: bool, format: &str, file: &str) -> Result<()> {
    let (store, _) = load_store(file)?;
    let comments: Vec<&Comment> = if shared {
        store.list_for_secondary_role()
    } else {
        store.list().iter().collect()
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&comments)?);
        return Ok(());
    }

    if comments.is_empty() {
        println!("No comments.");
        return Ok(());
    }
    for comment in comments {
        let anchor = comment
            .anchor
            .map_or("unanchored".to_string(), |a| format!("@ {:.2}, {:.2}, {:.2}", a.x, a.y, a.z));
        println!(
            "{}  {}  {}  {}",
            comment.id,
            comment.created_at.format("%Y-%m-%d %H:%M"),
            comment.author_id,
            anchor
        );
        println!("    {}", comment.content);
    }
    Ok(())
}

fn remove(id: &str, file: &str) -> Result<()> {
    let (mut store, mut backend) = load_store(file)?;
    let id = CommentId::new(id);
    store
        .delete_persisted(&mut backend, &id)
        .with_context(|| format!("Failed to remove comment {}", id))?;
    println!("Removed comment {} ({} left)", id, store.len());
    Ok(())
}
