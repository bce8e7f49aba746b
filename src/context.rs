use std::path::{Path, PathBuf};

use anyhow::bail;

use crate::converter::{clean::Cleaner, markdown::MarkdownConverter, writer::Slugger};

#[derive(Debug)]
pub(crate) struct Context {
    pub metadata_path: PathBuf,
    pub posts_dir: PathBuf,
    pub out_dir: PathBuf,

    pub cleaner: Cleaner,
    pub markdown: MarkdownConverter,
    pub slugger: Slugger,
}

impl Context {
    /// Resolves the export layout under `export_dir`.
    ///
    /// `out_dir` defaults to `<export_dir>/markdown_posts`. `strip` holds
    /// extra boilerplate selectors.
    pub fn new(
        export_dir: &Path,
        out_dir: Option<PathBuf>,
        strip: &[String],
    ) -> anyhow::Result<Self> {
        if !export_dir.is_dir() {
            bail!("export directory {export_dir:?} does not exist.");
        }
        let posts_dir = export_dir.join("posts");
        if !posts_dir.is_dir() {
            bail!("posts directory {posts_dir:?} does not exist.");
        }
        let out_dir = out_dir.unwrap_or_else(|| export_dir.join("markdown_posts"));
        if out_dir.exists() && !out_dir.is_dir() {
            bail!("if out_dir exists, it must be directory.");
        }

        Ok(Self {
            metadata_path: export_dir.join("posts.csv"),
            posts_dir,
            out_dir,
            cleaner: Cleaner::new(strip)?,
            markdown: MarkdownConverter::new()?,
            slugger: Slugger::new()?,
        })
    }
}
