use derive_more::{Display, Error};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub mod product;
pub mod subcategory;

pub const OBJECT_ID_LEN: usize = 24;

/// Primary key of catalog documents: 12 bytes rendered as 24 hex digits.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

#[derive(Debug, Display, Error, PartialEq, Eq)]
#[display("Malformed object id {_0:?}")]
pub struct MalformedObjectId(#[error(not(source))] pub String);

impl ObjectId {
    pub fn is_valid(s: &str) -> bool {
        s.len() == OBJECT_ID_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Timestamp-prefixed id, so ids generated later sort after earlier ones.
    pub fn generate() -> Self {
        let secs = time::OffsetDateTime::now_utc().unix_timestamp() as u32;
        let tail: [u8; 8] = rand::thread_rng().gen();
        let mut id = format!("{secs:08x}");
        for b in tail {
            id.push_str(&format!("{b:02x}"));
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ObjectId {
    type Err = MalformedObjectId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_valid(s) {
            Ok(Self(s.to_lowercase()))
        } else {
            Err(MalformedObjectId(s.to_string()))
        }
    }
}

impl TryFrom<String> for ObjectId {
    type Error = MalformedObjectId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> String {
        id.0
    }
}
