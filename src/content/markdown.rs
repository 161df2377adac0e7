//! Markdown rendering with syntax highlighting

use pulldown_cmark::{
    html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd,
};
use serde::Serialize;
use std::collections::HashSet;
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::config::HighlightConfig;
use crate::helpers::escape_html;

/// One heading collected while rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub title: String,
}

/// Rendered Markdown body
#[derive(Debug, Clone, Default)]
pub struct RenderedMarkdown {
    pub html: String,
    pub toc: Vec<TocEntry>,
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    highlight: bool,
    line_numbers: bool,
}

/// Heading whose inner events are buffered until its end tag
struct PendingHeading<'a> {
    level: HeadingLevel,
    id: Option<CowStr<'a>>,
    classes: Vec<CowStr<'a>>,
    attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    text: String,
    inner: Vec<Event<'a>>,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options(&HighlightConfig::default())
    }

    /// Create with custom settings
    pub fn with_options(config: &HighlightConfig) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: config.theme.clone(),
            highlight: config.enable,
            line_numbers: config.line_numbers,
        }
    }

    /// Render markdown to HTML.
    ///
    /// Never fails: malformed constructs degrade to literal text the way
    /// CommonMark prescribes.
    pub fn render(&self, markdown: &str) -> RenderedMarkdown {
        // Front matter is stripped before we get here, so no metadata blocks
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut toc = Vec::new();
        let mut used_ids: HashSet<String> = HashSet::new();

        let mut code_block: Option<Option<String>> = None;
        let mut code_block_content = String::new();
        let mut heading: Option<PendingHeading> = None;

        for event in parser {
            if let Some(lang) = &code_block {
                match event {
                    Event::Text(text) => code_block_content.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        let highlighted = self.highlight_code(&code_block_content, lang.as_deref());
                        events.push(Event::Html(CowStr::from(highlighted)));
                        code_block = None;
                    }
                    _ => {}
                }
                continue;
            }

            if let Some(pending) = heading.as_mut() {
                match event {
                    Event::End(TagEnd::Heading(_)) => {
                        if let Some(pending) = heading.take() {
                            self.finish_heading(pending, &mut events, &mut toc, &mut used_ids);
                        }
                    }
                    Event::Text(ref text) | Event::Code(ref text) => {
                        pending.text.push_str(text);
                        pending.inner.push(event);
                    }
                    other => pending.inner.push(other),
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(|lang| lang.to_string()),
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some(lang);
                    code_block_content.clear();
                }
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    heading = Some(PendingHeading {
                        level,
                        id,
                        classes,
                        attrs,
                        text: String::new(),
                        inner: Vec::new(),
                    });
                }
                other => events.push(other),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        RenderedMarkdown {
            html: html_output,
            toc,
        }
    }

    /// Emit a buffered heading with a unique anchor id
    fn finish_heading<'a>(
        &self,
        pending: PendingHeading<'a>,
        events: &mut Vec<Event<'a>>,
        toc: &mut Vec<TocEntry>,
        used_ids: &mut HashSet<String>,
    ) {
        let base = match &pending.id {
            Some(id) => id.to_string(),
            None => {
                let slug = slug::slugify(&pending.text);
                if slug.is_empty() {
                    "section".to_string()
                } else {
                    slug
                }
            }
        };

        // Suffixed ids can collide with literal headings like `Usage 1`
        let mut id = base.clone();
        let mut n = 1;
        while used_ids.contains(&id) {
            id = format!("{}-{}", base, n);
            n += 1;
        }
        used_ids.insert(id.clone());

        toc.push(TocEntry {
            level: pending.level as u8,
            id: id.clone(),
            title: pending.text.trim().to_string(),
        });

        events.push(Event::Start(Tag::Heading {
            level: pending.level,
            id: Some(CowStr::from(id)),
            classes: pending.classes,
            attrs: pending.attrs,
        }));
        events.extend(pending.inner);
        events.push(Event::End(TagEnd::Heading(pending.level)));
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let class = lang.unwrap_or("text");
        let plain = || {
            format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(class),
                escape_html(code)
            )
        };

        let lang = match lang {
            Some(lang) if self.highlight => lang,
            _ => return plain(),
        };

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = match self.theme_set.themes.get(&self.theme_name) {
            Some(theme) => theme,
            None => {
                tracing::warn!("Unknown highlight theme {:?}", self.theme_name);
                return plain();
            }
        };

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut highlighted = String::new();
        for line in LinesWithEndings::from(code) {
            let styled = highlighter
                .highlight_line(line, &self.syntax_set)
                .and_then(|regions| {
                    styled_line_to_highlighted_html(&regions, IncludeBackground::No)
                });
            match styled {
                Ok(html) => highlighted.push_str(&html),
                Err(e) => {
                    tracing::debug!("Highlighting {} failed, using plain text: {}", lang, e);
                    return plain();
                }
            }
        }

        if self.line_numbers {
            self.add_line_numbers(&highlighted, class)
        } else {
            format!(
                r#"<pre class="highlight"><code class="language-{}">{}</code></pre>"#,
                escape_html(class),
                highlighted
            )
        }
    }

    /// Add line numbers to highlighted code
    fn add_line_numbers(&self, code: &str, lang: &str) -> String {
        let lines: Vec<&str> = code.lines().collect();

        let gutter = (1..=lines.len())
            .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code"><pre><code class="language-{}">{}</code></pre></td></tr></table></figure>"#,
            escape_html(lang),
            gutter,
            escape_html(lang),
            lines.join("\n")
        )
    }

    /// Split the body at the excerpt separator; returns the Markdown before it
    pub fn split_excerpt<'a>(content: &'a str, separator: &str) -> Option<&'a str> {
        if separator.is_empty() {
            return None;
        }
        content
            .find(separator)
            .map(|pos| content[..pos].trim())
            .filter(|excerpt| !excerpt.is_empty())
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Render collected headings as a nested-by-class list
pub fn toc_html(entries: &[TocEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut out = String::from(r#"<ul class="toc">"#);
    for entry in entries {
        out.push_str(&format!(
            r##"<li class="toc-level-{}"><a href="#{}">{}</a></li>"##,
            entry.level,
            escape_html(&entry.id),
            escape_html(&entry.title)
        ));
    }
    out.push_str("</ul>");
    out
}
