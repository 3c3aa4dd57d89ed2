//! Domain models
//!
//! These types mirror the GraphQL response shapes. Ids arrive as `_id`,
//! other fields in camelCase. Timestamps are epoch milliseconds, sent by
//! the server either as a string or as a number.

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// =============================================================================
// Timestamps
// =============================================================================

/// Epoch-millisecond timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create from epoch milliseconds
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Epoch milliseconds
    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Convert to a UTC date-time, if in range
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.timestamp_millis())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

struct TimestampVisitor;

impl<'de> Visitor<'de> for TimestampVisitor {
    type Value = Timestamp;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("epoch milliseconds as a number or string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Timestamp, E> {
        Ok(Timestamp(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Timestamp, E> {
        i64::try_from(v)
            .map(Timestamp)
            .map_err(|_| E::custom("timestamp out of range"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Timestamp, E> {
        // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
        if !v.is_finite() || v < i64::MIN as f64 || v >= i64::MAX as f64 {
            return Err(E::custom(format!("timestamp out of range: {}", v)));
        }
        Ok(Timestamp(v.trunc() as i64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Timestamp, E> {
        if let Ok(millis) = v.trim().parse::<i64>() {
            return Ok(Timestamp(millis));
        }
        DateTime::parse_from_rfc3339(v)
            .map(|dt| Timestamp(dt.timestamp_millis()))
            .map_err(|_| E::custom(format!("invalid timestamp: {}", v)))
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TimestampVisitor)
    }
}

// =============================================================================
// Users
// =============================================================================

/// Basic user fields (post author, search result, registration result)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// User id
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Username
    #[serde(default)]
    pub username: String,
    /// Email address
    #[serde(default)]
    pub email: String,
}

impl UserSummary {
    /// Username prefixed with `@`
    pub fn handle(&self) -> String {
        format!("@{}", self.username)
    }
}

/// Follower/following entry; only the id is guaranteed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// User id
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Username, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Email, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// User profile with follow lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name
    pub name: String,
    /// Username
    pub username: String,
    /// Email address
    #[serde(default)]
    pub email: String,
    /// Users following this user
    #[serde(default)]
    pub follower: Vec<UserRef>,
    /// Users this user follows
    #[serde(default)]
    pub following: Vec<UserRef>,
}

impl User {
    /// Number of followers
    pub fn follower_count(&self) -> usize {
        self.follower.len()
    }

    /// Number of followed users
    pub fn following_count(&self) -> usize {
        self.following.len()
    }

    /// Check whether `user_id` follows this user
    pub fn is_followed_by(&self, user_id: &str) -> bool {
        self.follower.iter().any(|f| f.id == user_id)
    }

    /// Username prefixed with `@`
    pub fn handle(&self) -> String {
        format!("@{}", self.username)
    }
}

// =============================================================================
// Posts
// =============================================================================

/// Comment embedded in a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Comment text
    pub content: String,
    /// Commenter's username
    pub username: String,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    /// Last update time
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Like embedded in a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    /// Username of the liker
    pub username: String,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    /// Last update time
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// A post with its comments, likes and author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Post id
    #[serde(rename = "_id")]
    pub id: String,
    /// Post text
    pub content: String,
    /// Tags (order carries no meaning)
    #[serde(default)]
    pub tags: Vec<String>,
    /// Image URL; may be empty
    #[serde(default)]
    pub img_url: Option<String>,
    /// Author id
    #[serde(default)]
    pub author_id: Option<String>,
    /// Comments, oldest first
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Likes
    #[serde(default)]
    pub likes: Vec<Like>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    /// Last update time
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    /// Author
    #[serde(default)]
    pub author: Option<UserSummary>,
}

impl Post {
    /// Number of likes
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    /// Number of comments
    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    /// Image URL, treating an empty string as no image
    pub fn image_url(&self) -> Option<&str> {
        self.img_url.as_deref().filter(|url| !url.is_empty())
    }

    /// Check whether `username` liked this post
    pub fn is_liked_by(&self, username: &str) -> bool {
        self.likes.iter().any(|l| l.username == username)
    }

    /// Check for a tag, ignoring position
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

// =============================================================================
// Mutation Payloads
// =============================================================================

/// Object identified only by its id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityId {
    /// Id
    #[serde(rename = "_id")]
    pub id: String,
}

/// Result of following a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowResult {
    /// Server status message
    #[serde(default)]
    pub status: Option<String>,
    /// The follow record
    #[serde(default)]
    pub data: Option<EntityId>,
}

/// Login result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginPayload {
    /// Session token
    pub access_token: String,
}
