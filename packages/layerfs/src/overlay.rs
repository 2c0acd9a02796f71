//! Overlay configuration.
//!
//! An overlay names one source and the overlays layered above it:
//!
//! ```json
//! {
//!   "source": "https://cdn.example.com/site.tar.gz",
//!   "workdir": "dist",
//!   "headers": { "Authorization": "Bearer {env.CDN_TOKEN}" },
//!   "overlay": [
//!     { "source": "/srv/patches" }
//!   ]
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::headers::Headers;
use crate::placeholder::Replacer;
use crate::Error;

/// One node of the overlay tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Overlay {
    /// Local path, `file://`, `http(s)://` or `s3://host/bucket/key`.
    #[serde(alias = "root")]
    pub source: String,

    /// Sub-path of the source that becomes the root.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub workdir: String,

    /// Forced archive type; overrides suffix sniffing.
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub file_type: String,

    #[serde(default, skip_serializing_if = "Headers::is_empty")]
    pub headers: Headers,

    /// Layered above this node, later entries on top.
    #[serde(rename = "overlay", default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Overlay>,
}

impl Overlay {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn with_workdir(mut self, workdir: impl Into<String>) -> Self {
        self.workdir = workdir.into();
        self
    }

    pub fn with_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = file_type.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    pub fn with_child(mut self, child: Overlay) -> Self {
        self.children.push(child);
        self
    }

    /// Parse a JSON overlay tree. Unknown keys are rejected by name.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::config(e.to_string()))
    }

    /// Check every source in the tree names a supported scheme.
    pub fn validate(&self) -> Result<(), Error> {
        Backend::parse(&self.source).map_err(|source| Error::Overlay {
            description: self.to_string(),
            source: Box::new(source),
        })?;
        self.children.iter().try_for_each(Overlay::validate)
    }

    /// A copy with every string field passed through `replacer`.
    pub fn resolve_placeholders(&self, replacer: &dyn Replacer) -> Overlay {
        Overlay {
            source: replacer.replace_all(&self.source),
            workdir: replacer.replace_all(&self.workdir),
            file_type: replacer.replace_all(&self.file_type),
            headers: self.headers.map_values(|v| replacer.replace_all(v)),
            children: self
                .children
                .iter()
                .map(|child| child.resolve_placeholders(replacer))
                .collect(),
        }
    }

    /// Number of nodes in this tree, this one included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Overlay::node_count).sum::<usize>()
    }
}

impl fmt::Display for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "source={} workdir={} type={}",
            self.source, self.workdir, self.file_type
        )
    }
}
