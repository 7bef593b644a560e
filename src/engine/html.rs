//! Markup for highlighted code.
//!
//! ```text
//! <pre class="moonlight {theme}" style="background-color:..;color:.." tabindex="0"><code>
//! <span class="line"><span style="color:..">fn</span>...</span>
//! ...
//! </code></pre>
//! ```
//!
//! Lines are split on `\n` (a trailing newline yields a final empty line) and
//! joined back with `\n` inside `<code>`.

use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, Style, Theme};
use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
use syntect::parsing::{SyntaxReference, SyntaxSet};

use crate::consts::{PRE_CLASS, theme_slug};
use crate::error::Error;

/// Highlight `code` with `syntax` and wrap it in the block markup.
pub fn render(
    code: &str,
    syntax: &SyntaxReference,
    syntaxes: &SyntaxSet,
    theme: &Theme,
    theme_id: &str,
) -> Result<String, Error> {
    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut lines = Vec::new();

    for line in code.split('\n') {
        // The syntax set is built for newline-terminated lines.
        let line = format!("{line}\n");
        let regions = highlighter.highlight_line(&line, syntaxes)?;
        let regions: Vec<(Style, &str)> = regions
            .into_iter()
            .map(|(style, text)| (style, text.trim_end_matches(['\n', '\r'])))
            .filter(|(_, text)| !text.is_empty())
            .collect();
        let body = styled_line_to_highlighted_html(&regions, IncludeBackground::No)?;
        lines.push(format!("<span class=\"line\">{body}</span>"));
    }

    let background = theme.settings.background.unwrap_or(Color::WHITE);
    let foreground = theme.settings.foreground.unwrap_or(Color::BLACK);
    Ok(format!(
        "<pre class=\"{PRE_CLASS} {}\" style=\"background-color:{};color:{}\" tabindex=\"0\"><code>{}</code></pre>",
        theme_slug(theme_id),
        hex(background),
        hex(foreground),
        lines.join("\n")
    ))
}

/// `#rrggbb`, or `#rrggbbaa` when not opaque.
pub fn hex(color: Color) -> String {
    if color.a == 0xff {
        format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
    } else {
        format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            color.r, color.g, color.b, color.a
        )
    }
}
