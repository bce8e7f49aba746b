use std::path::PathBuf;

use anyhow::Context as _;
use log::{debug, info, warn};

use crate::{
    context::Context,
    metadata::{self, PostRecord},
};

pub(crate) mod clean;
pub(crate) mod markdown;
pub(crate) mod writer;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Summary {
    /// valid records loaded from the metadata table
    pub records: usize,
    pub published: usize,
    pub converted: usize,
    pub failed: usize,
}

fn convert_post(ctx: &Context, record: &PostRecord) -> anyhow::Result<PathBuf> {
    let source_path = ctx.posts_dir.join(&record.source);
    let source = std::fs::read_to_string(&source_path)
        .with_context(|| format!("while reading {source_path:?}"))?;

    let cleaned = ctx.cleaner.clean(&source);
    let body = ctx
        .markdown
        .convert(&cleaned)
        .with_context(|| format!("while converting {source_path:?}"))?;
    let content = writer::render(record, &body)?;

    writer::write(&ctx.out_dir, &ctx.slugger, record, &content)
}

/// Converts every published post of the export described by `ctx`.
///
/// Only problems with the metadata table or the output directory are
/// returned as errors; a post that fails is logged and counted.
pub(crate) fn convert(ctx: &Context) -> anyhow::Result<Summary> {
    let records = metadata::load(&ctx.metadata_path)?;
    let mut summary = Summary {
        records: records.len(),
        ..Default::default()
    };
    let published = metadata::published(records);
    summary.published = published.len();
    info!(
        "Found {} published post(s) out of {}",
        summary.published, summary.records
    );

    fs_extra::dir::create_all(&ctx.out_dir, false)
        .with_context(|| format!("while creating {:?}", ctx.out_dir))?;

    for record in published.iter() {
        debug!("converting post {} ({:?})", record.id, record.source);
        match convert_post(ctx, record) {
            Ok(out_path) => {
                info!("Converted: {:?} -> {:?}", record.source, out_path);
                summary.converted += 1;
            }
            Err(e) => {
                warn!("Error converting {:?}: {e:#}", record.source);
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}
