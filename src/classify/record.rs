use super::scan::CompileMarker;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// How a discovered file is treated when the destination tree is assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Python module eligible for native compilation
    Compile,
    /// Non-Python file kept because it matches `include_data`
    DataCopy,
    /// Python module that is always shipped as source
    PlainCopy,
    /// Dropped from the destination tree
    Ignored,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Compile => "compile",
            Category::DataCopy => "data",
            Category::PlainCopy => "plain",
            Category::Ignored => "ignored",
        };
        f.write_str(name)
    }
}

/// One file discovered under the source package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Path relative to the project root, including the package directory
    pub path: PathBuf,
    pub category: Category,
    pub marker: CompileMarker,
    pub uses_runtime_annotation: bool,
}

impl FileRecord {
    pub fn new(path: PathBuf, category: Category) -> Self {
        Self {
            path,
            category,
            marker: CompileMarker::NotMarked,
            uses_runtime_annotation: false,
        }
    }

    pub fn is_retained(&self) -> bool {
        self.category != Category::Ignored
    }
}
