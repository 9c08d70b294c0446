use serde::{Deserialize, Serialize};

/// Kind of user content that can be screened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    Comment,
    Review,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Comment => "COMMENT",
            ContentType::Review => "REVIEW",
        }
    }

    pub fn parse(s: &str) -> Option<ContentType> {
        match s {
            "COMMENT" => Some(ContentType::Comment),
            "REVIEW" => Some(ContentType::Review),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a piece of user content handed over by the CRUD layer on
/// submission. Read-only here; the moderation core never edits content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRef {
    pub content_type: ContentType,
    pub content_id: i64,
    pub author_id: i64,
    pub post_id: i64,
    pub text: String,
}
