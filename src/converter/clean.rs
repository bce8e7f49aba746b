use anyhow::anyhow;
use log::debug;
use maud::html;
use scraper::{ElementRef, Html, Selector};

/// Substack widgets that carry no article content.
pub(crate) const BOILERPLATE: [&str; 6] = [
    "div.subscription-widget",
    "div.subscription-widget-wrap",
    "div.subscription-widget-wrap-editor",
    "div.poll-embed",
    "div.captioned-button-wrap",
    "p.button-wrapper",
];

fn parse_selector(selector: &str) -> anyhow::Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("Invalid selector {selector:?}: {e:?}"))
}

#[derive(Debug)]
pub(crate) struct Cleaner {
    boilerplate: Vec<Selector>,
    image_container: Selector,
    image: Selector,
    caption: Selector,
    internal_link: Selector,
}

impl Cleaner {
    /// Builds a cleaner stripping [`BOILERPLATE`] plus `extra` selectors.
    pub fn new<S: AsRef<str>>(extra: &[S]) -> anyhow::Result<Self> {
        let boilerplate = BOILERPLATE
            .iter()
            .map(|s| parse_selector(s))
            .chain(extra.iter().map(|s| parse_selector(s.as_ref())))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            boilerplate,
            image_container: parse_selector("div.captioned-image-container")?,
            image: parse_selector("img")?,
            caption: parse_selector("figcaption")?,
            internal_link: parse_selector("a[href^=\"#\"]")?,
        })
    }

    pub fn clean(&self, source: &str) -> String {
        let mut document = Html::parse_fragment(source);

        let garbage: Vec<_> = self
            .boilerplate
            .iter()
            .flat_map(|selector| document.root_element().select(selector))
            .map(|element| element.id())
            .collect();
        debug!("removing {} boilerplate element(s)", garbage.len());
        for id in garbage {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }

        // the serializer is deterministic, so an element's own markup appears
        // verbatim in the serialized document. Image containers go first since
        // their replacement swallows any anchor inside them.
        let mut replacements: Vec<(String, String)> = document
            .root_element()
            .select(&self.image_container)
            .filter_map(|container| {
                self.render_image(container)
                    .map(|simplified| (container.html(), simplified))
            })
            .collect();
        // footnote anchors and other in-page links keep only their text
        replacements.extend(
            document
                .root_element()
                .select(&self.internal_link)
                .map(|anchor| (anchor.html(), anchor.inner_html())),
        );

        let mut cleaned = document.root_element().inner_html();
        for (from, to) in replacements {
            cleaned = cleaned.replace(&from, &to);
        }
        cleaned
    }

    fn render_image(&self, container: ElementRef) -> Option<String> {
        let img = container.select(&self.image).next()?;
        let src = img.value().attr("src").unwrap_or_default();
        let caption = container
            .select(&self.caption)
            .next()
            .map(|c| c.text().collect::<String>().trim().to_string())
            .filter(|c| !c.is_empty());
        let alt = match img.value().attr("alt").map(str::trim) {
            Some(alt) if !alt.is_empty() => alt.to_string(),
            _ => caption.clone().unwrap_or_default(),
        };

        Some(
            html! {
                p { img src=(src) alt=(alt); }
                @if let Some(caption) = caption {
                    p { em { (caption) } }
                }
            }
            .into_string(),
        )
    }
}
