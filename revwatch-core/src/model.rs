//! Domain model: tracked apps and the reviews fetched for them

use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// A tracked application, as stored in the watermark store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedApp {
    /// Stable document key
    pub id: String,
    /// Human readable name
    pub name: Option<String>,
    /// Icon URL shown in the message header
    pub icon: Option<String>,
    /// Store package name; an app without one is invalid
    pub package_name: Option<String>,
    /// Owning developer account id (console links)
    pub developer_id: Option<String>,
    /// Console application id (console links)
    pub application_id: Option<String>,
    /// Ignored apps are never fetched
    pub ignored: bool,
    /// Effective timestamp (ms) of the most recent delivered comment.
    /// `None` compares lower than every timestamp.
    pub watermark: Option<i64>,
}

impl TrackedApp {
    /// An app is invalid when its package name is absent or blank
    pub fn is_invalid(&self) -> bool {
        self.package_name
            .as_deref()
            .map_or(true, |p| p.trim().is_empty())
    }

    /// Whether the app is excluded by configuration
    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Valid and not ignored
    pub fn is_eligible(&self) -> bool {
        !self.is_invalid() && !self.is_ignored()
    }

    /// Package name, or an empty string for invalid apps
    pub fn package(&self) -> &str {
        self.package_name.as_deref().unwrap_or_default()
    }

    /// Name to display, falling back to the package name and then the id
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.package_name.as_deref())
            .unwrap_or(&self.id)
    }

    /// Path of the app document, used by the settings link
    pub fn document_path(&self) -> String {
        format!("apps/{}", self.id)
    }

    /// Whether a comment with the given effective timestamp is newer than the watermark
    pub fn is_newer(&self, timestamp: i64) -> bool {
        self.watermark.map_or(true, |w| timestamp > w)
    }
}

/// Partial app record supplied on creation
///
/// Field names follow the document format (`packageName`, `developerId`, ...),
/// so documents exported elsewhere can be imported as-is. A legacy
/// `timestamp` field is accepted as the watermark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppDocument {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub package_name: Option<String>,
    pub developer_id: Option<String>,
    pub application_id: Option<String>,
    pub ignored: Option<bool>,
    #[serde(alias = "timestamp", deserialize_with = "lenient_millis")]
    pub watermark: Option<i64>,
}

impl AppDocument {
    /// Merge the default field set into this document without overwriting
    /// anything that was supplied. New apps start ignored.
    pub fn sanitize(self, id: impl Into<String>) -> TrackedApp {
        TrackedApp {
            id: id.into(),
            name: self.name,
            icon: self.icon,
            package_name: self.package_name,
            developer_id: self.developer_id,
            application_id: self.application_id,
            ignored: self.ignored.unwrap_or(true),
            watermark: self.watermark,
        }
    }
}

/// One review thread returned by the review source
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub review_id: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub comments: Vec<ReviewComment>,
}

impl Review {
    /// Trimmed author name, or `(unknown)`
    pub fn author(&self) -> &str {
        self.author_name
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or("(unknown)")
    }
}

/// One comment slot of a review thread
///
/// The upstream format carries a user comment or a developer comment in the
/// same slot. A slot with neither is kept as `None` so the caller can report it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawCommentSlot")]
pub struct ReviewComment {
    comment: Option<Comment>,
}

impl ReviewComment {
    /// A slot with neither variant populated
    pub fn malformed() -> Self {
        Self { comment: None }
    }

    /// The comment held by this slot, if any
    pub fn comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }
}

impl From<Comment> for ReviewComment {
    fn from(comment: Comment) -> Self {
        Self {
            comment: Some(comment),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCommentSlot {
    #[serde(default)]
    user_comment: Option<UserComment>,
    #[serde(default)]
    developer_comment: Option<DeveloperComment>,
}

impl From<RawCommentSlot> for ReviewComment {
    fn from(raw: RawCommentSlot) -> Self {
        let comment = match (raw.user_comment, raw.developer_comment) {
            (Some(user), _) => Some(Comment::User(user)),
            (None, Some(developer)) => Some(Comment::Developer(developer)),
            (None, None) => None,
        };
        Self { comment }
    }
}

/// A comment written by a user or by the developer
#[derive(Debug, Clone, PartialEq)]
pub enum Comment {
    User(UserComment),
    Developer(DeveloperComment),
}

impl Comment {
    /// Comment body
    pub fn text(&self) -> &str {
        match self {
            Comment::User(c) => &c.text,
            Comment::Developer(c) => &c.text,
        }
    }

    /// Last modification time
    pub fn last_modified(&self) -> LastModified {
        match self {
            Comment::User(c) => c.last_modified,
            Comment::Developer(c) => c.last_modified,
        }
    }

    /// Effective timestamp in milliseconds, `None` when out of range
    pub fn timestamp(&self) -> Option<i64> {
        self.last_modified().millis()
    }

    /// Reviewer language; developer responses have none
    pub fn reviewer_language(&self) -> Option<&str> {
        match self {
            Comment::User(c) => c.reviewer_language.as_deref(),
            Comment::Developer(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Comment::User(_) => "user",
            Comment::Developer(_) => "developer",
        }
    }
}

/// A review written by a user
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserComment {
    pub text: String,
    pub last_modified: LastModified,
    /// Star rating, 1 to 5
    pub star_rating: u8,
    pub reviewer_language: Option<String>,
    pub device_metadata: Option<DeviceMetadata>,
    pub android_os_version: Option<i64>,
    pub app_version_code: Option<i64>,
    pub app_version_name: Option<String>,
}

/// A developer response to a review
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeveloperComment {
    pub text: String,
    pub last_modified: LastModified,
}

/// Device the review was written from
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceMetadata {
    pub product_name: Option<String>,
    pub manufacturer: Option<String>,
}

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// 9999-12-31T23:59:59.999Z
const MAX_MILLIS: i64 = 253_402_300_799_999;

/// Upstream timestamp: seconds plus sub-second nanos
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LastModified {
    #[serde(deserialize_with = "int_or_string")]
    pub seconds: i64,
    pub nanos: i64,
}

impl LastModified {
    pub fn new(seconds: i64, nanos: i64) -> Self {
        Self { seconds, nanos }
    }

    /// `seconds * 1000 + nanos / 1_000_000`, truncated.
    ///
    /// `None` for negative values, nanos outside one second and dates past
    /// the year 9999.
    pub fn millis(&self) -> Option<i64> {
        if !(0..NANOS_PER_SECOND).contains(&self.nanos) {
            return None;
        }

        self.seconds
            .checked_mul(1000)?
            .checked_add(self.nanos / 1_000_000)
            .filter(|ms| (0..=MAX_MILLIS).contains(ms))
    }
}

/// Render a millisecond timestamp as `YYYY-MM-DD HH:MM:SS` (UTC)
pub fn format_date(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "?".to_string())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Str(String),
}

// int64 fields are encoded as JSON strings by the upstream API
fn int_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match IntOrString::deserialize(deserializer)? {
        IntOrString::Int(value) => Ok(value),
        IntOrString::Str(value) => value.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Numbers and numeric strings become a timestamp; anything else reads as absent
fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| parse_millis(&v)))
}

fn parse_millis(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(package_name: Option<&str>, ignored: bool) -> TrackedApp {
        TrackedApp {
            id: "app".to_string(),
            name: None,
            icon: None,
            package_name: package_name.map(String::from),
            developer_id: None,
            application_id: None,
            ignored,
            watermark: None,
        }
    }

    #[test]
    fn test_effective_timestamp() {
        let lm = LastModified::new(1000, 500_000_000);
        assert_eq!(lm.millis(), Some(1_000_500));

        // Sub-millisecond nanos are truncated
        let lm = LastModified::new(1, 999_999);
        assert_eq!(lm.millis(), Some(1000));
    }

    #[test]
    fn test_out_of_range_timestamp() {
        let lm: LastModified =
            serde_json::from_str(r#"{"seconds":"9223372036854775807","nanos":0}"#).unwrap();
        assert_eq!(lm.millis(), None);

        // Fits in i64 but lands hundreds of millions of years ahead
        assert_eq!(LastModified::new(9_223_372_036_854_775, 0).millis(), None);
        assert_eq!(LastModified::new(-1, 0).millis(), None);
        assert_eq!(LastModified::new(1, 1_000_000_000).millis(), None);
        assert_eq!(LastModified::new(253_402_300_799, 999_000_000).millis(), Some(MAX_MILLIS));
    }

    #[test]
    fn test_validity() {
        assert!(app(None, false).is_invalid());
        assert!(app(Some(""), false).is_invalid());
        assert!(app(Some("  "), false).is_invalid());
        assert!(app(Some("com.example"), false).is_eligible());
        assert!(!app(Some("com.example"), true).is_eligible());
    }

    #[test]
    fn test_is_newer() {
        let mut tracked = app(Some("com.example"), false);
        assert!(tracked.is_newer(i64::MIN));

        tracked.watermark = Some(100);
        assert!(!tracked.is_newer(99));
        assert!(!tracked.is_newer(100));
        assert!(tracked.is_newer(101));
    }

    #[test]
    fn test_sanitize_defaults() {
        let tracked = AppDocument::default().sanitize("a1");
        assert_eq!(tracked.id, "a1");
        assert!(tracked.ignored);
        assert!(tracked.package_name.is_none());
        assert!(tracked.watermark.is_none());
    }

    #[test]
    fn test_sanitize_keeps_supplied_fields() {
        let doc = AppDocument {
            package_name: Some("com.example".to_string()),
            ignored: Some(false),
            name: Some("Example".to_string()),
            ..Default::default()
        };
        let tracked = doc.sanitize("a1");
        assert!(!tracked.ignored);
        assert_eq!(tracked.package_name.as_deref(), Some("com.example"));
        assert_eq!(tracked.display_name(), "Example");
    }

    #[test]
    fn test_document_watermark_parsing() {
        let doc: AppDocument =
            serde_json::from_str(r#"{"packageName": "p", "timestamp": "1700000000000"}"#).unwrap();
        assert_eq!(doc.watermark, Some(1_700_000_000_000));

        let doc: AppDocument = serde_json::from_str(r#"{"watermark": "soon"}"#).unwrap();
        assert_eq!(doc.watermark, None);

        let doc: AppDocument = serde_json::from_str(r#"{"watermark": 42}"#).unwrap();
        assert_eq!(doc.watermark, Some(42));
    }

    #[test]
    fn test_parse_review_list() {
        let json = r#"[{
            "reviewId": "r1",
            "authorName": " Jane ",
            "comments": [
                {"userComment": {
                    "text": "Great app",
                    "lastModified": {"seconds": "1700000000", "nanos": 250000000},
                    "starRating": 4,
                    "reviewerLanguage": "en_US",
                    "deviceMetadata": {"productName": "Pixel", "manufacturer": "Google"},
                    "androidOsVersion": 34,
                    "appVersionCode": 12,
                    "appVersionName": "1.2"
                }},
                {"developerComment": {
                    "text": "Thanks!",
                    "lastModified": {"seconds": 1700000100}
                }},
                {}
            ]
        }]"#;

        let reviews: Vec<Review> = serde_json::from_str(json).unwrap();
        assert_eq!(reviews.len(), 1);
        let review = &reviews[0];
        assert_eq!(review.author(), "Jane");
        assert_eq!(review.comments.len(), 3);

        let user = review.comments[0].comment().unwrap();
        assert_eq!(user.kind(), "user");
        assert_eq!(user.timestamp(), Some(1_700_000_000_250));
        assert_eq!(user.reviewer_language(), Some("en_US"));

        let developer = review.comments[1].comment().unwrap();
        assert_eq!(developer.kind(), "developer");
        assert_eq!(developer.timestamp(), Some(1_700_000_100_000));
        assert!(developer.reviewer_language().is_none());

        assert!(review.comments[2].comment().is_none());
    }

    #[test]
    fn test_unknown_author() {
        let review = Review {
            review_id: "r".to_string(),
            author_name: Some("   ".to_string()),
            comments: vec![],
        };
        assert_eq!(review.author(), "(unknown)");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(0), "1970-01-01 00:00:00");
        assert_eq!(format_date(1_700_000_000_250), "2023-11-14 22:13:20");
    }
}
