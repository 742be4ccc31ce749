//! Embedding snippets for delivery URLs
//!
//! Different documents want the URL in different shapes: an `<img>` tag in
//! markup, an image link in markdown, `url()` in stylesheets and a quoted
//! string in source code.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentKind {
    Markup,
    #[default]
    Markdown,
    Stylesheet,
    Quoted,
    Plain,
}

impl DocumentKind {
    /// Classify an editor language id (`"markdown"`, `"scss"`, `"rust"`, ...).
    pub fn from_language_id(language_id: &str) -> Self {
        match language_id {
            "html" | "php" | "vue" | "svelte" | "jsx" | "tsx" => Self::Markup,
            "markdown" => Self::Markdown,
            "css" | "scss" | "sass" | "less" => Self::Stylesheet,
            "json" | "jsonc" | "javascript" | "typescript" | "javascriptreact"
            | "typescriptreact" | "python" | "ruby" | "go" | "rust" | "java" | "csharp"
            | "cpp" | "c" => Self::Quoted,
            _ => Self::Plain,
        }
    }

    /// Render `url` for this kind of document.
    pub fn format_link(self, url: &str, file_name: &str) -> String {
        match self {
            Self::Markup => format!("<img src=\"{}\" alt=\"{}\" />", url, file_name),
            Self::Markdown => format!("![{}]({})", file_name, url),
            Self::Stylesheet => format!("url('{}')", url),
            Self::Quoted => format!("\"{}\"", url),
            Self::Plain => url.to_string(),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Markup => "markup",
            Self::Markdown => "markdown",
            Self::Stylesheet => "stylesheet",
            Self::Quoted => "quoted",
            Self::Plain => "plain",
        };
        f.write_str(name)
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    /// Accepts either a kind name or any editor language id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        if lowered.is_empty() {
            return Err("document kind must not be empty".to_string());
        }
        Ok(match lowered.as_str() {
            "markup" => Self::Markup,
            "stylesheet" => Self::Stylesheet,
            "quoted" => Self::Quoted,
            "plain" | "plaintext" | "url" => Self::Plain,
            other => Self::from_language_id(other),
        })
    }
}
