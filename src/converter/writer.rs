use std::{
    fs::OpenOptions,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::metadata::{PostRecord, PostType};

/// Leaves room for the id, `_` and `.md` under the 255-byte name limit.
const MAX_SLUG_BYTES: usize = 200;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub(super) struct FrontMatter {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub published: bool,
    pub substack_id: u64,
}

impl From<&PostRecord> for FrontMatter {
    fn from(record: &PostRecord) -> Self {
        Self {
            title: record.title.clone(),
            subtitle: record.subtitle.clone(),
            date: record.date,
            post_type: record.post_type.clone(),
            published: record.published,
            substack_id: record.id,
        }
    }
}

/// Prepends the YAML header built from `record` to `body`.
pub(super) fn render(record: &PostRecord, body: &str) -> anyhow::Result<String> {
    let header = serde_yaml::to_string(&FrontMatter::from(record))
        .with_context(|| format!("while serializing front matter of post {}", record.id))?;
    Ok(format!("---\n{header}---\n\n{body}\n"))
}

/// Turns titles into filesystem-safe file name stems.
#[derive(Debug)]
pub(crate) struct Slugger {
    punctuation: Regex,
    separators: Regex,
}

impl Slugger {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            punctuation: Regex::new(r"[^\w\s-]")?,
            separators: Regex::new(r"[\s_-]+")?,
        })
    }

    fn slugify(&self, title: &str) -> String {
        let lowered = title.to_lowercase();
        let stripped = self.punctuation.replace_all(&lowered, "");
        let separated = self.separators.replace_all(stripped.trim(), "-");

        let mut slug = String::new();
        for c in separated.trim_matches('-').chars() {
            if slug.len() + c.len_utf8() > MAX_SLUG_BYTES {
                break;
            }
            slug.push(c);
        }
        match slug.trim_end_matches('-') {
            "" => "untitled".to_string(),
            slug => slug.to_string(),
        }
    }

    /// `{id}_{slug}.md`
    pub fn file_name(&self, record: &PostRecord) -> PathBuf {
        PathBuf::from(format!("{}_{}.md", record.id, self.slugify(&record.title)))
    }
}

pub(super) fn write(
    out_dir: &Path,
    slugger: &Slugger,
    record: &PostRecord,
    content: &str,
) -> anyhow::Result<PathBuf> {
    let out_path = out_dir.join(slugger.file_name(record));
    let fd = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&out_path)
        .with_context(|| format!("while opening {out_path:?}"))?;
    let mut writer = BufWriter::new(fd);
    writer.write_all(content.as_bytes())?;
    writer.flush()?;

    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn record(id: u64, title: &str) -> PostRecord {
        PostRecord {
            id,
            title: title.to_string(),
            subtitle: None,
            date: NaiveDate::from_ymd_opt(2024, 2, 29),
            post_type: PostType::Newsletter,
            published: true,
            source: PathBuf::from(format!("{id}.post.html")),
        }
    }

    fn parse(content: &str) -> (FrontMatter, &str) {
        let rest = content.strip_prefix("---\n").unwrap();
        let (header, body) = rest.split_once("\n---\n\n").unwrap();
        (serde_yaml::from_str(header).unwrap(), body)
    }

    #[test]
    fn slugs() {
        let slugger = Slugger::new().unwrap();
        let slugify = |title: &str| slugger.slugify(title);
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  AC/DC: \"Live\" & 'Loud' "), "acdc-live-loud");
        assert_eq!(slugify("Ünïcødé Straße 東京"), "ünïcødé-straße-東京");
        assert_eq!(slugify("snake_case -- and   spaces"), "snake-case-and-spaces");
        assert_eq!(slugify("?!/"), "untitled");
        assert_eq!(slugify(&"a".repeat(300)).len(), MAX_SLUG_BYTES);
        assert_eq!(slugify(&format!("{} b", "a".repeat(199))), "a".repeat(199));
    }

    #[test]
    fn wide_characters_stay_under_name_limit() {
        let slugger = Slugger::new().unwrap();
        let title = "𝐁".repeat(90);

        let slug = slugger.slugify(&title);
        assert_eq!(slug, "𝐁".repeat(MAX_SLUG_BYTES / 4));

        let name = slugger.file_name(&record(123_456_789, &title));
        assert!(name.to_string_lossy().len() <= 255, "{name:?}");

        // a multi-byte char straddling the cap is dropped whole
        let slug = slugger.slugify(&format!("a{}", "東".repeat(100)));
        assert_eq!(slug, format!("a{}", "東".repeat(66)));
    }

    #[test]
    fn file_names_are_unique_and_safe() {
        let titles = ["Hello, World!", "Hello World", "a/b\\c", "../../etc", "\"quoted\"", ""];
        let slugger = Slugger::new().unwrap();
        let names: Vec<String> = titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                slugger
                    .file_name(&record(i as u64, title))
                    .to_string_lossy()
                    .to_string()
            })
            .collect();

        assert_eq!(names[0], "0_hello-world.md");
        assert_eq!(names[2], "2_abc.md");
        assert_eq!(names[3], "3_etc.md");
        assert_eq!(names[5], "5_untitled.md");
        for name in names.iter() {
            assert!(!name.contains(['/', '\\', '"', ':']), "{name}");
        }
        assert_eq!(names.iter().collect::<HashSet<_>>().len(), names.len());
    }

    #[test]
    fn front_matter_round_trips() {
        let mut record = record(42, "Quotes \"here\": and 'there' in ünïcode 東京");
        record.subtitle = Some("true".to_string());
        record.post_type = PostType::Other("video".to_string());

        let content = render(&record, "Body").unwrap();
        let (front_matter, body) = parse(&content);

        assert_eq!(front_matter, FrontMatter::from(&record));
        assert_eq!(body, "Body\n");
    }

    #[test]
    fn optional_fields_are_omitted() {
        let mut record = record(7, "Plain");
        record.date = None;

        let content = render(&record, "# Hi").unwrap();
        assert_eq!(
            content,
            "---\ntitle: Plain\ntype: newsletter\npublished: true\nsubstack_id: 7\n---\n\n# Hi\n"
        );
    }

    #[test]
    fn writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let slugger = Slugger::new().unwrap();
        let record = record(123, "Hello, World!");

        let path = write(dir.path(), &slugger, &record, "content").unwrap();
        assert_eq!(path, dir.path().join("123_hello-world.md"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");

        write(dir.path(), &slugger, &record, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }
}
