//! Editor selection

use serde::{Deserialize, Serialize};

/// What the controls currently act on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Selection {
    None,
    #[default]
    Image,
    Text(String),
}

impl Selection {
    pub fn is_none(&self) -> bool {
        matches!(self, Selection::None)
    }

    pub fn text_id(&self) -> Option<&str> {
        match self {
            Selection::Text(id) => Some(id),
            _ => None,
        }
    }
}
