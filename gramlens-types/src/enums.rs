use serde::{Deserialize, Serialize};

/// Which kind of text unit a flat record was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Post,
    Comment,
    Reply,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Post => "post",
            SourceType::Comment => "comment",
            SourceType::Reply => "reply",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "post" => Some(SourceType::Post),
            "comment" => Some(SourceType::Comment),
            "reply" => Some(SourceType::Reply),
            _ => None,
        }
    }
}
