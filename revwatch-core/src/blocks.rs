//! Slack Block Kit vocabulary used by review notifications
//!
//! Only the two block types the notifications need are modelled: `context`
//! blocks of inline images and markdown, and `rich_text` blocks made of
//! sections or quotes of styled text and emoji.

use serde::Serialize;

/// A top level message block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Context { elements: Vec<ContextElement> },
    RichText { elements: Vec<RichTextSection> },
}

/// Inline element of a context block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContextElement {
    Image { image_url: String, alt_text: String },
    Mrkdwn { text: String },
}

/// Section of a rich text block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichTextSection {
    RichTextQuote { elements: Vec<RichTextElement> },
}

/// Styled text or emoji inside a rich text section
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichTextElement {
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        style: Option<TextStyle>,
    },
    Emoji { name: String, unicode: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TextStyle {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
}

impl TextStyle {
    pub const BOLD: TextStyle = TextStyle {
        bold: true,
        italic: false,
    };
    pub const ITALIC: TextStyle = TextStyle {
        bold: false,
        italic: true,
    };
}

pub fn context(elements: Vec<ContextElement>) -> Block {
    Block::Context { elements }
}

pub fn rich_text(elements: Vec<RichTextSection>) -> Block {
    Block::RichText { elements }
}

pub fn quote(elements: Vec<RichTextElement>) -> RichTextSection {
    RichTextSection::RichTextQuote { elements }
}

pub fn mrkdwn(text: impl Into<String>) -> ContextElement {
    ContextElement::Mrkdwn { text: text.into() }
}

pub fn image(url: impl Into<String>, alt: impl Into<String>) -> ContextElement {
    ContextElement::Image {
        image_url: url.into(),
        alt_text: alt.into(),
    }
}

pub fn text(text: impl Into<String>) -> RichTextElement {
    RichTextElement::Text {
        text: text.into(),
        style: None,
    }
}

pub fn styled(text: impl Into<String>, style: TextStyle) -> RichTextElement {
    RichTextElement::Text {
        text: text.into(),
        style: Some(style),
    }
}

/// Emoji element; `unicode` is the hyphen-joined hex code points of `glyph`
pub fn emoji(glyph: &str) -> RichTextElement {
    let unicode = glyph
        .chars()
        .map(|c| format!("{:x}", c as u32))
        .collect::<Vec<_>>()
        .join("-");
    RichTextElement::Emoji {
        name: glyph.to_string(),
        unicode,
    }
}

/// Markdown bold: `*text*`, trimmed
pub fn bold(text: &str) -> String {
    format!("*{}*", text.trim())
}

/// Markdown link: `<url|text>`, both escaped
pub fn linkify(text: &str, url: &str) -> String {
    format!("<{}|{}>", escape(url), escape(text))
}

/// Escape the control characters of Slack markup
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape() {
        assert_eq!(escape("a & <b>"), "a &amp; &lt;b&gt;");
        assert_eq!(escape("&lt;"), "&amp;lt;");
    }

    #[test]
    fn test_linkify_escapes_both_parts() {
        assert_eq!(
            linkify("Tom & Jerry", "https://x.test/?a=1&b=2"),
            "<https://x.test/?a=1&amp;b=2|Tom &amp; Jerry>"
        );
    }

    #[test]
    fn test_bold_trims() {
        assert_eq!(bold("  hi "), "*hi*");
    }

    #[test]
    fn test_emoji_code_points() {
        match emoji("🇺🇸") {
            RichTextElement::Emoji { name, unicode } => {
                assert_eq!(name, "🇺🇸");
                assert_eq!(unicode, "1f1fa-1f1f8");
            }
            other => panic!("unexpected element: {:?}", other),
        }
    }

    #[test]
    fn test_block_serialization() {
        let block = rich_text(vec![quote(vec![
            styled("★★★☆☆", TextStyle::BOLD),
            text("\t"),
        ])]);
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({
                "type": "rich_text",
                "elements": [{
                    "type": "rich_text_quote",
                    "elements": [
                        {"type": "text", "text": "★★★☆☆", "style": {"bold": true}},
                        {"type": "text", "text": "\t"}
                    ]
                }]
            })
        );

        let block = context(vec![image("https://i.test/a.png", ""), mrkdwn("*x*")]);
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({
                "type": "context",
                "elements": [
                    {"type": "image", "image_url": "https://i.test/a.png", "alt_text": ""},
                    {"type": "mrkdwn", "text": "*x*"}
                ]
            })
        );
    }
}
