//! Stylesheet + raw HTML body to display-ready styled text.
//!
//! The body is sanitized, converted to Markdown and read back as block and
//! inline events. `<style>` contents are kept aside as the text's stylesheet.
//! Characters in the body's text that Markdown would act on travel through the
//! conversion as private-use stand-ins and are restored on the way out.

use std::collections::{HashMap, HashSet};

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RenderError {
    #[error("styled body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlockKind {
    Paragraph,
    Heading(u8),
    CodeBlock,
    ListItem,
    Quote,
}

/// A span of text sharing one set of inline styles.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Run {
    pub text: String,
    pub strong: bool,
    pub emphasis: bool,
    pub code: bool,
    pub link: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub runs: Vec<Run>,
}

impl Block {
    #[must_use]
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StyledText {
    stylesheet: String,
    blocks: Vec<Block>,
}

impl StyledText {
    /// Raw CSS collected from `<style>` elements.
    #[must_use]
    pub fn stylesheet(&self) -> &str {
        &self.stylesheet
    }

    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.stylesheet.is_empty()
    }

    #[must_use]
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Render `body` with `style` prepended. Failures yield empty styled text.
#[must_use]
pub fn render(body: &str, style: Option<&[u8]>) -> StyledText {
    try_render(body, style).unwrap_or_else(|err| {
        warn!(error = %err, "body could not be rendered");
        StyledText::default()
    })
}

/// # Errors
///
/// Returns `RenderError::InvalidUtf8` if the stylesheet bytes are not UTF-8.
pub fn try_render(body: &str, style: Option<&[u8]>) -> Result<StyledText, RenderError> {
    let mut combined = Vec::with_capacity(style.map_or(0, <[u8]>::len) + body.len());
    if let Some(style) = style {
        combined.extend_from_slice(style);
    }
    combined.extend_from_slice(body.as_bytes());
    let html = std::str::from_utf8(&combined)?;

    let (stylesheet, markup) = split_style_elements(html);
    let markdown = html2md::parse_html(&shield_text(&sanitize_html(&markup)));
    Ok(StyledText {
        stylesheet,
        blocks: markdown_blocks(&markdown),
    })
}

//
// ─── HTML ──────────────────────────────────────────────────────────────────────
//

/// Pull the contents of every `<style>` element out of `html`.
///
/// Returns the concatenated CSS and the markup with the elements removed.
fn split_style_elements(html: &str) -> (String, String) {
    let lower = html.to_ascii_lowercase();
    let mut css = String::new();
    let mut markup = String::with_capacity(html.len());
    let mut pos = 0;

    while let Some(found) = lower[pos..].find("<style") {
        let open = pos + found;
        let Some(open_end) = lower[open..].find('>').map(|i| open + i + 1) else {
            break;
        };
        let (inner_end, close_end) = match lower[open_end..].find("</style") {
            Some(i) => {
                let close = open_end + i;
                let end = lower[close..].find('>').map_or(lower.len(), |j| close + j + 1);
                (close, end)
            }
            None => (lower.len(), lower.len()),
        };

        markup.push_str(&html[pos..open]);
        let sheet = html[open_end..inner_end].trim();
        if !sheet.is_empty() {
            if !css.is_empty() {
                css.push('\n');
            }
            css.push_str(sheet);
        }
        pos = close_end;
    }
    markup.push_str(&html[pos..]);
    (css, markup)
}

fn sanitize_html(html: &str) -> String {
    let tags: HashSet<&str> = [
        "p", "div", "span", "br", "em", "strong", "b", "i", "u", "code", "pre", "blockquote",
        "ul", "ol", "li", "a", "h1", "h2", "h3", "h4", "h5", "h6",
    ]
    .into_iter()
    .collect();

    let mut attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
    attributes.insert("a", ["href"].into_iter().collect());

    ammonia::Builder::new()
        .tags(tags)
        .tag_attributes(attributes)
        .link_rel(None)
        .clean(html)
        .to_string()
}

//
// ─── LITERAL TEXT ──────────────────────────────────────────────────────────────
//

const MARKDOWN_ACTIVE: [char; 16] = [
    '\\', '*', '_', '~', '[', ']', '`', '#', '|', '!', '+', '-', '.', '&', '<', '>',
];
const STAND_IN_BASE: u32 = 0xE000;

fn stand_in(ch: char) -> Option<char> {
    let pos = MARKDOWN_ACTIVE.iter().position(|&c| c == ch)?;
    char::from_u32(STAND_IN_BASE + u32::try_from(pos).ok()?)
}

fn restore_literals(text: &str) -> String {
    text.chars()
        .map(|ch| {
            u32::from(ch)
                .checked_sub(STAND_IN_BASE)
                .and_then(|offset| usize::try_from(offset).ok())
                .and_then(|offset| MARKDOWN_ACTIVE.get(offset).copied())
                .unwrap_or(ch)
        })
        .collect()
}

/// Replace Markdown-active characters in the text of serialized `html` with
/// stand-ins. Tags and attribute values are copied unchanged.
fn shield_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut in_quote = false;
    let mut rest = html;

    while let Some(ch) = rest.chars().next() {
        if in_tag {
            match ch {
                '"' => in_quote = !in_quote,
                '>' if !in_quote => in_tag = false,
                _ => {}
            }
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
            continue;
        }

        if ch == '<' {
            in_tag = true;
            out.push(ch);
            rest = &rest[1..];
            continue;
        }
        if ch == '&' {
            let entity = [("&amp;", '&'), ("&lt;", '<'), ("&gt;", '>')]
                .into_iter()
                .find(|(name, _)| rest.starts_with(name));
            if let Some((name, literal)) = entity {
                out.extend(stand_in(literal));
                rest = &rest[name.len()..];
                continue;
            }
        }
        out.push(stand_in(ch).unwrap_or(ch));
        rest = &rest[ch.len_utf8()..];
    }
    out
}

//
// ─── MARKDOWN EVENTS ───────────────────────────────────────────────────────────
//

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    open: Option<Block>,
    strong: usize,
    emphasis: usize,
    link: Option<String>,
    quote_depth: usize,
    item_depth: usize,
}

impl BlockBuilder {
    fn context_kind(&self) -> BlockKind {
        if self.item_depth > 0 {
            BlockKind::ListItem
        } else if self.quote_depth > 0 {
            BlockKind::Quote
        } else {
            BlockKind::Paragraph
        }
    }

    fn start(&mut self, kind: BlockKind) {
        self.flush();
        self.open = Some(Block {
            kind,
            runs: Vec::new(),
        });
    }

    fn flush(&mut self) {
        if let Some(mut block) = self.open.take() {
            if block.kind == BlockKind::CodeBlock {
                if let Some(last) = block.runs.last_mut() {
                    let trimmed = last.text.trim_end_matches('\n').len();
                    last.text.truncate(trimmed);
                }
            }
            if block.runs.iter().any(|r| !r.text.trim().is_empty()) {
                self.blocks.push(block);
            }
        }
    }

    fn push_text(&mut self, text: &str, code: bool) {
        if self.open.is_none() {
            let kind = self.context_kind();
            self.start(kind);
        }
        let run = Run {
            text: restore_literals(text),
            strong: self.strong > 0,
            emphasis: self.emphasis > 0,
            code: code || self.open.as_ref().is_some_and(|b| b.kind == BlockKind::CodeBlock),
            link: self.link.clone(),
        };
        if let Some(block) = self.open.as_mut() {
            match block.runs.last_mut() {
                Some(last) if same_style(last, &run) => last.text.push_str(&run.text),
                _ => block.runs.push(run),
            }
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Paragraph) => {
                let kind = self.context_kind();
                self.start(kind);
            }
            Event::Start(Tag::Heading { level, .. }) => {
                self.start(BlockKind::Heading(heading_level(level)));
            }
            Event::Start(Tag::CodeBlock(_)) => self.start(BlockKind::CodeBlock),
            Event::Start(Tag::BlockQuote { .. }) => self.quote_depth += 1,
            Event::Start(Tag::Item) => {
                self.item_depth += 1;
                self.start(BlockKind::ListItem);
            }
            Event::Start(Tag::Strong) => self.strong += 1,
            Event::Start(Tag::Emphasis) => self.emphasis += 1,
            Event::Start(Tag::Link { dest_url, .. }) => self.link = Some(dest_url.into_string()),
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::CodeBlock) => {
                self.flush();
            }
            Event::End(TagEnd::BlockQuote { .. }) => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            Event::End(TagEnd::Item) => {
                self.flush();
                self.item_depth = self.item_depth.saturating_sub(1);
            }
            Event::End(TagEnd::Strong) => self.strong = self.strong.saturating_sub(1),
            Event::End(TagEnd::Emphasis) => self.emphasis = self.emphasis.saturating_sub(1),
            Event::End(TagEnd::Link) => self.link = None,
            Event::Text(text) => self.push_text(&text, false),
            Event::Code(text) => self.push_text(&text, true),
            Event::SoftBreak => self.push_text(" ", false),
            Event::HardBreak => self.push_text("\n", false),
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}

fn same_style(a: &Run, b: &Run) -> bool {
    a.strong == b.strong && a.emphasis == b.emphasis && a.code == b.code && a.link == b.link
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn markdown_blocks(markdown: &str) -> Vec<Block> {
    let mut builder = BlockBuilder::default();
    for event in Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH) {
        builder.event(event);
    }
    builder.finish()
}
