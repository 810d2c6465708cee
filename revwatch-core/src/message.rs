//! Notification message assembly
//!
//! A message is four blocks: a header naming the app, the comment body, a
//! footer with device and date details, and a row of links.

use serde::Serialize;

use crate::blocks::{self, Block, TextStyle};
use crate::links;
use crate::model::{
    format_date, Comment, DeveloperComment, LastModified, Review, TrackedApp, UserComment,
};

const FALLBACK_FLAG: &str = "🏁";
const LINK_SEPARATOR: &str = " ∙ ";

/// A chat message ready to post
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub blocks: Vec<Block>,
    pub unfurl_links: bool,
    pub unfurl_media: bool,
}

impl Message {
    /// Create a message from blocks with link unfurling disabled
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            unfurl_links: false,
            unfurl_media: false,
        }
    }

    /// Build the notification for one comment of a review
    pub fn for_comment(
        app: &TrackedApp,
        review: &Review,
        comment: &Comment,
        context: &LinkContext,
    ) -> Self {
        let (body, footer) = match comment {
            Comment::User(user) => (user_review_block(review, user), user_footer_block(user)),
            Comment::Developer(developer) => (
                developer_response_block(review, developer),
                developer_footer_block(developer),
            ),
        };

        Self::new(vec![
            header_block(app),
            body,
            footer,
            links_block(app, review, comment, context),
        ])
    }
}

/// Identifiers of the console hosting the app documents, for settings links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkContext {
    pub project_id: String,
    pub database_id: String,
}

impl Default for LinkContext {
    fn default() -> Self {
        Self {
            project_id: "_".to_string(),
            database_id: "(default)".to_string(),
        }
    }
}

/// Star rating as filled and empty glyphs, always five wide
pub fn rating_stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

/// Flag emoji for the region subtag of a locale such as `en_US` or `pt-BR`.
///
/// A bare language code (`en`, `ar`) has no region and yields `None`.
pub fn locale_flag(locale: Option<&str>) -> Option<String> {
    let mut subtags = locale?.trim().split(['_', '-']);
    subtags.next()?;
    let region = subtags.last()?;
    if region.len() != 2 || !region.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    region
        .to_ascii_uppercase()
        .chars()
        .map(|c| char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)))
        .collect()
}

fn header_block(app: &TrackedApp) -> Block {
    let mut elements = Vec::with_capacity(2);
    if let Some(icon) = app.icon.as_deref().filter(|i| !i.is_empty()) {
        elements.push(blocks::image(icon, ""));
    }
    elements.push(blocks::mrkdwn(blocks::bold(&blocks::linkify(
        app.display_name(),
        &links::app_link(app.package()),
    ))));
    blocks::context(elements)
}

fn user_review_block(review: &Review, comment: &UserComment) -> Block {
    let flag = locale_flag(comment.reviewer_language.as_deref())
        .unwrap_or_else(|| FALLBACK_FLAG.to_string());

    blocks::rich_text(vec![
        blocks::quote(vec![
            blocks::styled(rating_stars(comment.star_rating), TextStyle::BOLD),
            blocks::text("\t"),
            blocks::emoji(&flag),
            blocks::text(" "),
            blocks::text(review.author()),
        ]),
        blocks::quote(vec![blocks::styled(comment.text.trim(), TextStyle::ITALIC)]),
    ])
}

fn developer_response_block(review: &Review, comment: &DeveloperComment) -> Block {
    blocks::rich_text(vec![
        blocks::quote(vec![
            blocks::styled("Response to: ", TextStyle::BOLD),
            blocks::text(review.author()),
        ]),
        blocks::quote(vec![blocks::styled(comment.text.trim(), TextStyle::ITALIC)]),
    ])
}

fn user_footer_block(comment: &UserComment) -> Block {
    let device = comment.device_metadata.clone().unwrap_or_default();
    let version = match comment.app_version_code {
        Some(code) => format!(
            "{} ({})",
            comment.app_version_name.as_deref().unwrap_or("?"),
            code
        ),
        None => comment.app_version_name.as_deref().unwrap_or("?").to_string(),
    };

    blocks::context(vec![
        blocks::mrkdwn(format!(
            "*Device*: {}",
            device.product_name.as_deref().unwrap_or("?")
        )),
        blocks::mrkdwn(format!(
            "*Brand*: {}",
            device.manufacturer.as_deref().unwrap_or("?")
        )),
        blocks::mrkdwn(format!(
            "*API*: {}",
            comment
                .android_os_version
                .map_or_else(|| "?".to_string(), |v| v.to_string())
        )),
        blocks::mrkdwn(format!("*Version*: {}", version)),
        blocks::mrkdwn(format!(
            "*Date*: {}",
            date(comment.last_modified)
        )),
    ])
}

fn developer_footer_block(comment: &DeveloperComment) -> Block {
    blocks::context(vec![blocks::mrkdwn(format!(
        "*Date*: {}",
        date(comment.last_modified)
    ))])
}

fn date(last_modified: LastModified) -> String {
    last_modified
        .millis()
        .map_or_else(|| "?".to_string(), format_date)
}

fn links_block(app: &TrackedApp, review: &Review, comment: &Comment, context: &LinkContext) -> Block {
    let row = [
        blocks::linkify(
            "Reply",
            &links::reply_link(
                app.developer_id.as_deref(),
                app.application_id.as_deref(),
                &review.review_id,
            ),
        ),
        blocks::linkify("View", &links::view_link(app.package(), &review.review_id)),
        blocks::linkify(
            "Translate",
            &links::translate_link(comment.reviewer_language(), Some(comment.text())),
        ),
        blocks::linkify(
            "Settings",
            &links::settings_link(
                &context.project_id,
                &context.database_id,
                &app.document_path(),
            ),
        ),
    ]
    .join(LINK_SEPARATOR);

    blocks::context(vec![blocks::mrkdwn(row)])
}
