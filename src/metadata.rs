use std::{collections::HashSet, fmt, path::Path, path::PathBuf};

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{info, warn};
use serde::{Deserialize, Serialize};

const REQUIRED_COLUMNS: [&str; 6] = [
    "post_id",
    "post_date",
    "is_published",
    "type",
    "title",
    "subtitle",
];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub(crate) enum PostType {
    Newsletter,
    Podcast,
    Thread,
    Other(String),
}

impl From<String> for PostType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "" | "newsletter" => PostType::Newsletter,
            "podcast" => PostType::Podcast,
            "thread" => PostType::Thread,
            other => PostType::Other(other.to_string()),
        }
    }
}

impl From<PostType> for String {
    fn from(value: PostType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostType::Newsletter => f.write_str("newsletter"),
            PostType::Podcast => f.write_str("podcast"),
            PostType::Thread => f.write_str("thread"),
            PostType::Other(s) => f.write_str(s),
        }
    }
}

/// One row of `posts.csv`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PostRecord {
    pub id: u64,
    pub title: String,
    pub subtitle: Option<String>,
    pub date: Option<NaiveDate>,
    pub post_type: PostType,
    pub published: bool,
    /// file name of the post's HTML, relative to the posts folder
    pub source: PathBuf,
}

#[derive(Deserialize, Debug)]
struct Row {
    post_id: String,
    post_date: String,
    is_published: String,
    #[serde(rename = "type")]
    post_type: String,
    title: String,
    subtitle: String,
}

fn parse_post_date(value: &str) -> anyhow::Result<Option<NaiveDate>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(dt.date_naive()));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Some(dt.date()));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .with_context(|| format!("Invalid post_date: {value:?}"))
}

impl TryFrom<Row> for PostRecord {
    type Error = anyhow::Error;

    fn try_from(row: Row) -> anyhow::Result<Self> {
        let post_id = row.post_id.trim();
        let id = post_id
            .split('.')
            .next()
            .and_then(|prefix| prefix.parse::<u64>().ok())
            .ok_or_else(|| anyhow!("Invalid post_id: {post_id:?}"))?;
        // post_id names a file inside the posts folder
        if post_id.contains(['/', '\\']) || post_id.contains("..") {
            bail!("post_id is not a plain file name: {post_id:?}");
        }

        let published = match row.is_published.trim().to_lowercase().as_str() {
            "true" => true,
            "false" => false,
            other => bail!("Invalid is_published: {other:?}"),
        };

        let title = match row.title.trim() {
            "" => "Untitled".to_string(),
            title => title.to_string(),
        };
        let subtitle = Some(row.subtitle.trim().to_string()).filter(|s| !s.is_empty());

        Ok(PostRecord {
            id,
            title,
            subtitle,
            date: parse_post_date(&row.post_date)?,
            post_type: PostType::from(row.post_type),
            published,
            source: PathBuf::from(format!("{post_id}.html")),
        })
    }
}

/// Reads the metadata table at `path`.
///
/// A missing file or a header without one of the required columns is an
/// error. Rows that cannot be turned into a [`PostRecord`] are skipped with a
/// warning, as are rows repeating an identifier seen earlier in the file.
pub(crate) fn load(path: &Path) -> anyhow::Result<Vec<PostRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .with_context(|| format!("while opening metadata file {path:?}"))?;

    let headers = reader
        .headers()
        .with_context(|| format!("while reading header of {path:?}"))?
        .clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            bail!("{path:?} has no `{column}` column");
        }
    }

    let mut seen = HashSet::new();
    let mut records = vec![];
    for (i, result) in reader.deserialize::<Row>().enumerate() {
        // header is line 1
        let line = i + 2;
        let record = match result
            .map_err(anyhow::Error::from)
            .and_then(PostRecord::try_from)
        {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping malformed row at line {line} of {path:?}: {e:#}");
                continue;
            }
        };
        if !seen.insert(record.id) {
            warn!(
                "Skipping row at line {line} of {path:?}: duplicate post id {}",
                record.id
            );
            continue;
        }
        records.push(record);
    }

    Ok(records)
}

/// Drops every record that is not published, keeping the original order.
pub(crate) fn published(records: Vec<PostRecord>) -> Vec<PostRecord> {
    records
        .into_iter()
        .filter(|record| {
            if !record.published {
                info!("Skipping unpublished post: {:?}", record.source);
            }
            record.published
        })
        .collect()
}
