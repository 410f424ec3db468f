use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Server-side record of a client-held modification link. Only the one-way
/// digest of the secret is ever stored; the plaintext lives in the link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModificationToken {
    pub id: String,
    pub digest: String,
    pub kind: TokenKind,
    pub booking_id: String,
    pub expires_at: NaiveDateTime,
    pub consumed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Modify,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Modify => "modify",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "modify" => Some(TokenKind::Modify),
            _ => None,
        }
    }
}
