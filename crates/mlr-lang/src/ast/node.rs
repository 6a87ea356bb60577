#[cfg(feature = "ast-json")]
use serde::{Deserialize, Serialize};

use super::NodeType;

/// One node of the generic syntax tree produced by the DSL parser.
///
/// `children` is `None` for leaves and `Some` (possibly empty) for everything
/// else; the compiler relies on that distinction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ast-json", derive(Serialize, Deserialize))]
pub struct AstNode {
    #[cfg_attr(feature = "ast-json", serde(rename = "type"))]
    pub node_type: NodeType,
    #[cfg_attr(
        feature = "ast-json",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub token: Option<String>,
    #[cfg_attr(
        feature = "ast-json",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub children: Option<Vec<AstNode>>,
}

impl AstNode {
    pub fn new(node_type: NodeType, token: Option<&str>, children: Vec<AstNode>) -> Self {
        Self {
            node_type,
            token: token.map(str::to_string),
            children: Some(children),
        }
    }

    pub fn leaf(node_type: NodeType, token: &str) -> Self {
        Self {
            node_type,
            token: Some(token.to_string()),
            children: None,
        }
    }

    #[inline(always)]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn token_str(&self) -> &str {
        self.token.as_deref().unwrap_or_default()
    }

    pub fn children(&self) -> &[AstNode] {
        self.children.as_deref().unwrap_or_default()
    }

    #[cfg(feature = "ast-json")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "ast-json")]
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }
}
