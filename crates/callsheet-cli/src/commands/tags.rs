use crate::commands::{print_json, Context};
use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

#[derive(Debug, Subcommand)]
pub enum TagCommand {
    /// List tags with the number of contacts carrying each
    Ls(TagListArgs),
}

#[derive(Debug, Args)]
pub struct TagListArgs {}

#[derive(Debug, Serialize)]
struct TagCountDto {
    name: String,
    count: i64,
}

pub fn list_tags(ctx: &Context<'_>, _args: TagListArgs) -> Result<()> {
    let tags = ctx.store.tags().list_with_counts()?;
    let items: Vec<TagCountDto> = tags
        .into_iter()
        .map(|(tag, count)| TagCountDto {
            name: tag.name.as_str().to_string(),
            count,
        })
        .collect();

    if ctx.json {
        print_json(&items)?;
        return Ok(());
    }

    if items.is_empty() {
        println!("no tags");
        return Ok(());
    }

    for item in items {
        println!("{} ({})", item.name, item.count);
    }
    Ok(())
}
