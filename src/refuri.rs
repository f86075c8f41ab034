//! Reference URIs for versioned artifacts.
//!
//! Example: wandb-artifact:///acme/mnist/Dataset:abc123/obj
//!      =>  RefUri { entity: "acme", project: "mnist", name: "Dataset", version: "abc123" }
//!
//! The name may itself contain ':'; the version is whatever follows the last one.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

pub const SCHEME: &str = "wandb-artifact";
const SUFFIX: &str = "obj";

static REF_URI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^wandb-artifact:///([^/]+)/([^/]+)/([^/]+):([^/:]+)/obj$")
        .expect("reference uri pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefUri {
    pub entity: String,
    pub project: String,
    pub name: String,
    pub version: String,
}

impl RefUri {
    pub fn new(
        entity: impl Into<String>,
        project: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            entity: entity.into(),
            project: project.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    /// Parse a reference string. Anything off-scheme is `None`.
    pub fn decode(s: &str) -> Option<Self> {
        let caps = REF_URI_RE.captures(s)?;
        Some(Self {
            entity: caps.get(1)?.as_str().to_string(),
            project: caps.get(2)?.as_str().to_string(),
            name: caps.get(3)?.as_str().to_string(),
            version: caps.get(4)?.as_str().to_string(),
        })
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RefUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:///{}/{}/{}:{}/{}",
            SCHEME, self.entity, self.project, self.name, self.version, SUFFIX
        )
    }
}

/// Decode a JSON value as a reference, if it is a string in the right shape.
pub fn decode_value(value: &serde_json::Value) -> Option<RefUri> {
    value.as_str().and_then(RefUri::decode)
}
