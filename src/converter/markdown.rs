use anyhow::Context;
use htmd::HtmlToMarkdown;
use regex::Regex;

pub(crate) struct MarkdownConverter {
    html_to_markdown: HtmlToMarkdown,
    blank_lines: Regex,
}

impl MarkdownConverter {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            html_to_markdown: HtmlToMarkdown::builder()
                .skip_tags(vec!["head", "script", "style", "noscript"])
                .build(),
            blank_lines: Regex::new(r"\n[ \t]*(\n[ \t]*)+\n")?,
        })
    }

    /// Converts cleaned HTML into a Markdown body without surrounding blank
    /// lines.
    pub fn convert(&self, html: &str) -> anyhow::Result<String> {
        let markdown = self
            .html_to_markdown
            .convert(html)
            .context("while converting HTML to Markdown")?;
        Ok(self
            .blank_lines
            .replace_all(&markdown, "\n\n")
            .trim()
            .to_string())
    }
}

impl std::fmt::Debug for MarkdownConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkdownConverter").finish_non_exhaustive()
    }
}
