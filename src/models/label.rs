use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where a pesticide illustration lives
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImageRef {
    /// Relative to the configured assets directory
    Local(PathBuf),
    Remote(String),
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            ImageRef::Remote(value)
        } else {
            ImageRef::Local(PathBuf::from(value))
        }
    }
}

impl From<ImageRef> for String {
    fn from(value: ImageRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::Local(path) => write!(f, "{}", path.display()),
            ImageRef::Remote(url) => f.write_str(url),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub index: usize,
    pub pest: String,
    pub pesticide: String,
    pub image: ImageRef,
}

impl LabelEntry {
    pub fn new(index: usize, pest: &str, pesticide: &str, image: impl Into<String>) -> Self {
        Self {
            index,
            pest: pest.to_string(),
            pesticide: pesticide.to_string(),
            image: ImageRef::from(image.into()),
        }
    }
}
