/// Value data type attached to a property key in ConfigHub.
///
/// Pull payloads carry it as the `type` tag of each property; pushes send it
/// as the `vdt` key attribute. `Code` is text the UI renders as source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueDataType {
    Text,
    Code,
    Boolean,
    Integer,
    Long,
    Double,
    Float,
    Map,
    List,
}

impl ValueDataType {
    /// Parse a wire type tag. Tags are case-sensitive, as sent by the service.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let t = match tag {
            "Text" => Self::Text,
            "Code" => Self::Code,
            "Boolean" => Self::Boolean,
            "Integer" => Self::Integer,
            "Long" => Self::Long,
            "Double" => Self::Double,
            "Float" => Self::Float,
            "Map" => Self::Map,
            "List" => Self::List,
            _ => return None,
        };
        Some(t)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Code => "Code",
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::Long => "Long",
            Self::Double => "Double",
            Self::Float => "Float",
            Self::Map => "Map",
            Self::List => "List",
        }
    }
}

/// How a session identifies the repository it talks to.
#[derive(Debug, Clone, PartialEq)]
pub enum Auth {
    /// A repository token, sent as the `Client-Token` header.
    Token(String),
    /// Open access by owner account and repository name, appended to the URL path.
    Repository { account: String, repository: String },
}
