//! Markdown renderer.

use std::fmt::Write;

use crate::doc::{Block, Package, Span, block_text};
use crate::embed::ImageTable;
use crate::error::Result;
use crate::normalize::collapse_whitespace;

use super::{RenderOptions, Renderer};

/// Lines longer than this that don't end in a period get promoted to
/// level-2 headings when the heuristic is enabled. The heuristic exists for
/// inputs whose structural tags were lost during normalization. Only a
/// trailing period suppresses promotion; other punctuation does not.
const HEURISTIC_MIN_LEN: usize = 50;

/// Renders headings as `#` runs and emphasis as `**`/`*`, one blank line
/// between blocks. Images are dropped by policy.
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(
        &self,
        package: &Package,
        _images: &ImageTable,
        options: &RenderOptions,
    ) -> Result<Vec<u8>> {
        let mut out = String::new();

        if options.document_header {
            let title = package.document.title.as_deref().unwrap_or("Untitled");
            let _ = writeln!(out, "# {}", escape_markdown(title));
            if let Some(author) = &package.document.author {
                let _ = writeln!(out, "\n*{}*", escape_markdown(author));
            }
            let _ = writeln!(
                out,
                "\n> Generated: {}",
                options.generated_at().format("%Y-%m-%d %H:%M:%S UTC")
            );
            out.push('\n');
        }

        for section in &package.document.sections {
            for block in &section.blocks {
                match block {
                    Block::Heading { level, spans } => {
                        let text = collapse_whitespace(&block_text(spans));
                        let text = text.trim();
                        if !text.is_empty() {
                            let _ = writeln!(
                                out,
                                "{} {}\n",
                                "#".repeat(usize::from(*level)),
                                escape_markdown(text)
                            );
                        }
                    }
                    Block::Paragraph { spans } => {
                        let rendered = render_spans(spans);
                        if rendered.is_empty() {
                            continue;
                        }
                        if options.heuristic_headings && is_heading_candidate(&rendered) {
                            let _ = writeln!(out, "## {rendered}\n");
                        } else {
                            let _ = writeln!(out, "{rendered}\n");
                        }
                    }
                    // Markdown image rendering is out of scope; dropped.
                    Block::Image { .. } => {}
                }
            }
        }

        // No trailing blank line
        while out.ends_with('\n') {
            out.pop();
        }
        if !out.is_empty() {
            out.push('\n');
        }

        Ok(out.into_bytes())
    }
}

fn render_spans(spans: &[Span]) -> String {
    let mut out = String::new();
    for span in spans {
        let raw = span.text();
        let has_leading = raw.starts_with(char::is_whitespace);
        let has_trailing = raw.ends_with(char::is_whitespace);
        let core = collapse_whitespace(raw);
        let core = core.trim();
        if core.is_empty() {
            // Whitespace-only spans still separate their neighbors
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
            continue;
        }

        if has_leading && !out.is_empty() && !out.ends_with(' ') {
            out.push(' ');
        }

        match span {
            Span::Text(_) => out.push_str(&escape_markdown(core)),
            // Emphasis markers must hug the text, so boundary spaces moved
            // outside the markers above.
            Span::Bold(_) => {
                out.push_str("**");
                out.push_str(&escape_markdown(core));
                out.push_str("**");
            }
            Span::Italic(_) => {
                out.push('*');
                out.push_str(&escape_markdown(core));
                out.push('*');
            }
        }

        if has_trailing {
            out.push(' ');
        }
    }
    out.trim().to_string()
}

/// A long line that doesn't end in a period likely lost a heading tag.
fn is_heading_candidate(line: &str) -> bool {
    !line.contains('\n') && line.chars().count() > HEURISTIC_MIN_LEN && !line.ends_with('.')
}

/// Escape characters with structural meaning in Markdown.
///
/// A reduced version of full CommonMark escaping: emphasis, code, links,
/// and heading/list introducers at line start.
pub fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 10);
    let mut at_line_start = true;

    for c in text.chars() {
        match c {
            '\\' | '*' | '_' | '[' | ']' | '`' => {
                result.push('\\');
                result.push(c);
            }
            '#' | '>' | '-' | '+' if at_line_start => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
        at_line_start = c == '\n';
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::Section;

    fn package_with_blocks(blocks: Vec<Block>) -> Package {
        let mut section = Section::new("s0", 0, "ch0.xhtml", "application/xhtml+xml", Vec::new());
        section.blocks = blocks;
        let mut package = Package::default();
        package.document.sections.push(section);
        package
    }

    fn render_md(blocks: Vec<Block>, options: &RenderOptions) -> String {
        let package = package_with_blocks(blocks);
        let out = MarkdownRenderer
            .render(&package, &ImageTable::new(), options)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_heading_levels() {
        let out = render_md(
            vec![
                Block::Heading {
                    level: 1,
                    spans: vec![Span::Text("Top".into())],
                },
                Block::Heading {
                    level: 3,
                    spans: vec![Span::Text("Deep".into())],
                },
            ],
            &RenderOptions::default(),
        );
        assert_eq!(out, "# Top\n\n### Deep\n");
    }

    #[test]
    fn test_emphasis() {
        let out = render_md(
            vec![Block::Paragraph {
                spans: vec![
                    Span::Text("a ".into()),
                    Span::Bold("bold".into()),
                    Span::Text(" and ".into()),
                    Span::Italic("italic".into()),
                ],
            }],
            &RenderOptions::default(),
        );
        assert_eq!(out, "a **bold** and *italic*\n");
    }

    #[test]
    fn test_images_dropped() {
        let out = render_md(
            vec![Block::Image {
                src: "a.png".into(),
                resolved: None,
            }],
            &RenderOptions::default(),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_heuristic_promotes_long_untagged_line() {
        let line = "A Chapter Title That Somehow Lost Its Markup Along The Way";
        assert!(line.len() > HEURISTIC_MIN_LEN);

        let blocks = vec![Block::Paragraph {
            spans: vec![Span::Text(line.into())],
        }];

        let plain = render_md(blocks.clone(), &RenderOptions::default());
        assert_eq!(plain, format!("{line}\n"));

        let options = RenderOptions {
            heuristic_headings: true,
            ..Default::default()
        };
        let promoted = render_md(blocks, &options);
        assert_eq!(promoted, format!("## {line}\n"));
    }

    #[test]
    fn test_heuristic_leaves_sentences_alone() {
        let line = "This is a normal sentence that is quite long and ends with a period.";
        let options = RenderOptions {
            heuristic_headings: true,
            ..Default::default()
        };
        let out = render_md(
            vec![Block::Paragraph {
                spans: vec![Span::Text(line.into())],
            }],
            &options,
        );
        assert_eq!(out, format!("{line}\n"));
    }

    #[test]
    fn test_heuristic_only_a_period_suppresses() {
        // Exclamations, questions, colons: all still promote
        let options = RenderOptions {
            heuristic_headings: true,
            ..Default::default()
        };
        for line in [
            "What A Surprisingly Long And Enthusiastic Chapter Title This Is!",
            "Could This Long Line Be A Chapter Title Rather Than A Sentence?",
            "Part Two Of The Story, In Which Several Things Happen At Once:",
        ] {
            assert!(line.chars().count() > HEURISTIC_MIN_LEN);
            let out = render_md(
                vec![Block::Paragraph {
                    spans: vec![Span::Text(line.into())],
                }],
                &options,
            );
            assert_eq!(out, format!("## {line}\n"));
        }
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("*bold*"), "\\*bold\\*");
        assert_eq!(escape_markdown("[link]"), "\\[link\\]");
        assert_eq!(escape_markdown("# not a heading"), "\\# not a heading");
        assert_eq!(escape_markdown("mid # hash"), "mid # hash");
    }

    #[test]
    fn test_deterministic_with_pinned_timestamp() {
        use chrono::TimeZone;
        let mut package = package_with_blocks(vec![Block::Paragraph {
            spans: vec![Span::Text("Body".into())],
        }]);
        package.document.title = Some("T".into());

        let options = RenderOptions {
            document_header: true,
            timestamp: Some(chrono::Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let a = MarkdownRenderer
            .render(&package, &ImageTable::new(), &options)
            .unwrap();
        let b = MarkdownRenderer
            .render(&package, &ImageTable::new(), &options)
            .unwrap();
        assert_eq!(a, b);
    }
}
