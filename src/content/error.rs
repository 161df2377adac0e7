//! Per-document error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the build of a single document.
///
/// None of these stop the rest of the site from building; the generator
/// records them in the build report and moves on.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("malformed document `{}`: {reason}", document.display())]
    MalformedDocument { document: PathBuf, reason: String },

    #[error("document `{}` uses unknown layout `{layout}`", document.display())]
    UnknownLayout { document: PathBuf, layout: String },

    #[error("layout `{layout}` failed to render `{}`: {message}", document.display())]
    Template {
        document: PathBuf,
        layout: String,
        message: String,
    },

    #[error("`{}` and `{}` both write `{}`", document.display(), other.display(), output.display())]
    OutputConflict {
        document: PathBuf,
        other: PathBuf,
        output: PathBuf,
    },

    #[error("IO error on `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

impl RenderError {
    pub(crate) fn malformed(document: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            document: document.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }

    /// Short name of the error kind, used in build summaries
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedDocument { .. } => "malformed",
            Self::UnknownLayout { .. } => "unknown-layout",
            Self::Template { .. } => "template",
            Self::OutputConflict { .. } => "conflict",
            Self::Io { .. } => "io",
        }
    }
}

/// Flatten a tera error and its causes into one line
pub(crate) fn describe_tera_error(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut cause = std::error::Error::source(err);
    while let Some(inner) = cause {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        cause = inner.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_render_error_display() {
        let err = RenderError::malformed("_posts/a.md", "unterminated front matter");
        let display = format!("{err}");
        assert!(display.contains("_posts/a.md"));
        assert!(display.contains("unterminated front matter"));
        assert_eq!(err.kind(), "malformed");

        let err = RenderError::UnknownLayout {
            document: PathBuf::from("about.md"),
            layout: "fancy".to_string(),
        };
        assert!(format!("{err}").contains("`fancy`"));

        let err = RenderError::io("out/index.html", Error::new(ErrorKind::PermissionDenied, "no"));
        assert!(format!("{err}").contains("out/index.html"));
        assert_eq!(err.kind(), "io");
    }
}
