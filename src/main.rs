use std::path::PathBuf;

use anyhow::anyhow;
use clap::{command, Arg, ArgAction};
use context::Context;
use log::info;

mod context;
mod converter;
mod metadata;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = command!()
        .args(&[
            Arg::new("export_dir")
                .help("Directory of the unzipped export, holding posts.csv and posts/")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true),
            Arg::new("out_dir")
                .help("Directory path of output. Defaults to <export_dir>/markdown_posts. Existing files with the same name will be overwritten.")
                .short('o')
                .long("out-dir")
                .value_parser(clap::value_parser!(PathBuf)),
            Arg::new("strip")
                .help("Additional CSS selector of elements to remove before conversion. Can be repeated.")
                .long("strip")
                .value_name("SELECTOR")
                .action(ArgAction::Append),
        ])
        .get_matches();

    let export_dir: &PathBuf = matches
        .get_one("export_dir")
        .ok_or_else(|| anyhow!("export_dir is required."))?;
    let out_dir: Option<PathBuf> = matches.get_one::<PathBuf>("out_dir").cloned();
    let strip: Vec<String> = matches
        .get_many::<String>("strip")
        .unwrap_or_default()
        .cloned()
        .collect();

    let ctx = Context::new(export_dir, out_dir, strip.as_slice())?;
    let summary = converter::convert(&ctx)?;

    info!(
        "Conversion complete: {}/{} posts converted ({} failed, {} valid records read)",
        summary.converted, summary.published, summary.failed, summary.records
    );
    info!("Markdown files saved to: {:?}", ctx.out_dir);

    Ok(())
}
