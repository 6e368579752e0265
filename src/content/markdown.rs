//! Markdown rendering with syntax highlighting

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::config::SiteConfig;

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    highlight: bool,
    line_numbers: bool,
    excerpt_separator: String,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options("base16-ocean.dark", true, false, "<!-- more -->")
    }

    /// Create with custom settings
    pub fn with_options(
        theme: &str,
        highlight: bool,
        line_numbers: bool,
        excerpt_separator: &str,
    ) -> Self {
        let theme_set = ThemeSet::load_defaults();
        if highlight && !theme_set.themes.contains_key(theme) {
            tracing::warn!("Unknown highlight theme {:?}, code blocks stay plain", theme);
        }
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set,
            theme_name: theme.to_string(),
            highlight,
            line_numbers,
            excerpt_separator: excerpt_separator.to_string(),
        }
    }

    /// Build from the site configuration
    pub fn from_config(config: &SiteConfig) -> Self {
        Self::with_options(
            &config.highlight.theme,
            config.highlight.enable,
            config.highlight.line_number,
            &config.excerpt_separator,
        )
    }

    fn options() -> Options {
        // YAML metadata blocks stay off, front-matter is split beforehand
        Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES
    }

    /// Render markdown to HTML. Raw HTML in the source is passed through.
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, Self::options());

        let mut events: Vec<Event> = Vec::new();
        // (language, accumulated source) while inside a code block
        let mut code_block: Option<(Option<String>, String)> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split(|c: char| c.is_whitespace() || c == ',')
                            .next()
                            .filter(|l| !l.is_empty())
                            .map(str::to_string),
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, code)) = code_block.take() {
                        let html = self.highlight_code(&code, lang.as_deref());
                        events.push(Event::Html(CowStr::from(html)));
                    }
                }
                Event::Text(text) if code_block.is_some() => {
                    if let Some((_, code)) = code_block.as_mut() {
                        code.push_str(&text);
                    }
                }
                other => events.push(other),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    fn theme(&self) -> Option<&Theme> {
        self.theme_set.themes.get(&self.theme_name)
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let class = lang.unwrap_or("text");
        let plain = || {
            format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                html_escape(class),
                html_escape(code)
            )
        };

        let theme = match self.theme() {
            Some(theme) if self.highlight => theme,
            _ => return plain(),
        };

        let syntax = self
            .syntax_set
            .find_syntax_by_token(class)
            .or_else(|| self.syntax_set.find_syntax_by_extension(class))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        match highlighted_html_for_string(code, &self.syntax_set, syntax, theme) {
            Ok(highlighted) if self.line_numbers => add_line_numbers(&highlighted, class),
            Ok(highlighted) => format!(
                r#"<figure class="highlight {}">{}</figure>"#,
                html_escape(class),
                highlighted
            ),
            Err(e) => {
                tracing::debug!("Highlighting {} block failed: {}", class, e);
                plain()
            }
        }
    }

    /// Plain-text preview of a post body.
    ///
    /// Text before the excerpt separator when the body has one, otherwise
    /// the first paragraph. `None` when there is no prose to show.
    pub fn excerpt(&self, body: &str) -> Option<String> {
        let split = if self.excerpt_separator.is_empty() {
            None
        } else {
            body.find(&self.excerpt_separator)
        };
        let text = match split {
            Some(pos) => plain_text(&body[..pos], false),
            None => plain_text(body, true),
        };
        (!text.is_empty()).then_some(text)
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect the prose of a markdown fragment, whitespace-normalized.
/// Code blocks and raw HTML are skipped.
fn plain_text(markdown: &str, first_paragraph_only: bool) -> String {
    let mut out = String::new();
    let mut paragraph_depth = 0usize;
    let mut in_code_block = false;

    for event in Parser::new_ext(markdown, MarkdownRenderer::options()) {
        match event {
            Event::Start(Tag::Paragraph) => paragraph_depth += 1,
            Event::End(TagEnd::Paragraph) => {
                paragraph_depth = paragraph_depth.saturating_sub(1);
                if first_paragraph_only && !out.trim().is_empty() {
                    break;
                }
                out.push(' ');
            }
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => in_code_block = false,
            Event::End(TagEnd::Heading(_)) | Event::End(TagEnd::Item) => out.push(' '),
            Event::Text(text) | Event::Code(text) if !in_code_block => {
                if paragraph_depth > 0 || !first_paragraph_only {
                    out.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            _ => {}
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Add line numbers to highlighted code
fn add_line_numbers(code: &str, lang: &str) -> String {
    let lines: Vec<&str> = code.lines().collect();

    let gutter = (1..=lines.len())
        .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code">{}</td></tr></table></figure>"#,
        html_escape(lang),
        gutter,
        lines.join("\n")
    )
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Hi\n\nHello **world**.");
        assert!(html.contains("<h1>Hi</h1>"));
        assert!(html.contains("<strong>world</strong>"));
    }

    #[test]
    fn test_raw_html_is_preserved() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render(
            "<div class=\"note\">kept</div>\n\nText with <abbr title=\"x\">inline</abbr> html.",
        );
        assert!(html.contains("<div class=\"note\">kept</div>"));
        assert!(html.contains("<abbr title=\"x\">inline</abbr>"));
    }

    #[test]
    fn test_render_code_block_highlighted() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```rust\nfn main() {}\n```");
        assert!(html.contains(r#"<figure class="highlight rust">"#));
        assert!(!html.contains("```"));
    }

    #[test]
    fn test_render_code_block_plain_when_disabled() {
        let renderer = MarkdownRenderer::with_options("base16-ocean.dark", false, false, "<!-- more -->");
        let html = renderer.render("```js title=app.js\nlet a = 1 < 2;\n```");
        assert!(html.contains(r#"<pre><code class="language-js">let a = 1 &lt; 2;"#));
    }

    #[test]
    fn test_line_numbers() {
        let renderer = MarkdownRenderer::with_options("base16-ocean.dark", true, true, "<!-- more -->");
        let html = renderer.render("```\na\nb\n```");
        assert!(html.contains(r#"<span class="line-number">1</span>"#));
        assert!(html.contains(r#"<span class="line-number">2</span>"#));
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = MarkdownRenderer::new();
        let md = "## Title\n\n```python\nprint('hi')\n```\n\n| a | b |\n|---|---|\n| 1 | 2 |";
        assert_eq!(renderer.render(md), renderer.render(md));
    }

    #[test]
    fn test_excerpt_first_paragraph() {
        let renderer = MarkdownRenderer::new();
        let excerpt = renderer.excerpt("# Hi\n\nHello **world**,\nagain.\n\nSecond paragraph.");
        assert_eq!(excerpt.as_deref(), Some("Hello world, again."));
    }

    #[test]
    fn test_excerpt_explicit_separator() {
        let renderer = MarkdownRenderer::new();
        let excerpt =
            renderer.excerpt("## Intro\n\nOne.\n\nTwo `code`.\n<!-- more -->\n\nThe rest.");
        assert_eq!(excerpt.as_deref(), Some("Intro One. Two code."));
    }

    #[test]
    fn test_excerpt_without_separator_configured() {
        let renderer = MarkdownRenderer::with_options("base16-ocean.dark", true, false, "");
        let excerpt = renderer.excerpt("First paragraph.\n\nSecond.");
        assert_eq!(excerpt.as_deref(), Some("First paragraph."));
    }

    #[test]
    fn test_excerpt_empty_body() {
        let renderer = MarkdownRenderer::new();
        assert_eq!(renderer.excerpt(""), None);
        assert_eq!(renderer.excerpt("```\ncode only\n```"), None);
    }
}
