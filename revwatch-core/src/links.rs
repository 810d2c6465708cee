//! Store, console and translation links embedded in notifications

use url::form_urlencoded::byte_serialize;

const PLAY_STORE: &str = "https://play.google.com/store/apps/details";
const PLAY_CONSOLE: &str = "https://play.google.com/console/developers";
const TRANSLATE: &str = "https://translate.google.com/";
const FIREBASE_CONSOLE: &str = "https://console.firebase.google.com/project";

fn encode(text: &str) -> String {
    byte_serialize(text.as_bytes()).collect()
}

/// Public store listing of an app
pub fn app_link(package_name: &str) -> String {
    format!("{}?id={}", PLAY_STORE, package_name)
}

/// Console page to reply to a review; unknown ids are rendered as `_`
pub fn reply_link(developer_id: Option<&str>, application_id: Option<&str>, review_id: &str) -> String {
    format!(
        "{}/{}/app/{}/user-feedback/review-details?reviewId={}",
        PLAY_CONSOLE,
        developer_id.unwrap_or("_"),
        application_id.unwrap_or("_"),
        review_id
    )
}

/// Public view of a single review
pub fn view_link(package_name: &str, review_id: &str) -> String {
    format!("{}?id={}&reviewId={}", PLAY_STORE, package_name, review_id)
}

/// Google Translate link for a comment; source language defaults to `auto`
pub fn translate_link(reviewer_language: Option<&str>, text: Option<&str>) -> String {
    format!(
        "{}?sl={}&op=translate&text={}",
        TRANSLATE,
        reviewer_language.unwrap_or("auto"),
        encode(text.map(str::trim).unwrap_or_default())
    )
}

/// Console link to the app document.
///
/// The default database is named `(default)`, which the console addresses as `-default-`.
pub fn settings_link(project_id: &str, database_id: &str, document_path: &str) -> String {
    format!(
        "{}/{}/firestore/databases/{}/data/{}",
        FIREBASE_CONSOLE,
        project_id,
        database_id.replace(['(', ')'], "-"),
        encode(document_path)
    )
}
