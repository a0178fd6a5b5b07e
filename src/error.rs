#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the dashboard compiler crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.
//!
//! Every configuration variant carries a message naming the offending field,
//! value and owning entity so a failure can be localized without re-parsing
//! the document.

use std::path::{Path, PathBuf};

/// Unified error type returned by the compiler pipeline, the API client and
/// the CLI.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Wraps I/O errors that occur while reading configuration files.
    #[error("failed to read configuration from {path:?}: {source}")]
    Io {
        /// Location of the configuration file.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps YAML decoding errors.
    #[error("failed to parse configuration: {source}")]
    Parse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Wraps serialization errors when encoding request bodies.
    #[error("failed to serialize dashboards: {source}")]
    Serialize {
        /// Underlying serialization error.
        source: serde_json::Error
    },
    /// A base filter is malformed.
    #[error("invalid filter: {message}")]
    InvalidFilter {
        /// Human readable message describing the problem.
        message: String
    },
    /// An extending filter has a bad operator or operands, references no
    /// filters, or cannot be resolved.
    #[error("invalid extending filter: {message}")]
    InvalidExtendingFilter {
        /// Human readable message describing the problem.
        message: String
    },
    /// An output selection has an unsupported shape.
    #[error("invalid output selection: {message}")]
    InvalidOutput {
        /// Human readable message describing the problem.
        message: String
    },
    /// A query is missing a required field or references an unknown
    /// component.
    #[error("invalid query configuration: {message}")]
    InvalidQuery {
        /// Human readable message describing the problem.
        message: String
    },
    /// A widget definition or placement is missing a field or references an
    /// unknown query or widget.
    #[error("invalid widget configuration: {message}")]
    InvalidWidget {
        /// Human readable message describing the problem.
        message: String
    },
    /// A dashboard definition is missing a required field.
    #[error("invalid dashboard configuration: {message}")]
    InvalidDashboard {
        /// Human readable message describing the problem.
        message: String
    },
    /// A visualization name is unknown or missing.
    #[error("invalid visualization: {message}")]
    InvalidVisualization {
        /// Human readable message describing the problem.
        message: String
    },
    /// The New Relic API rejected a request or returned an unusable answer.
    #[error("New Relic API error: {message}")]
    Api {
        /// Human readable message describing the failure.
        message: String
    },
    /// One or more documents failed validation during `lint`.
    #[error("{failed} of {total} configuration files failed validation")]
    Lint {
        /// Number of files that failed.
        failed: usize,
        /// Number of files checked.
        total:  usize
    }
}

impl Error {
    /// Constructs an [`Error::InvalidFilter`] from the provided message.
    pub fn invalid_filter<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::InvalidFilter {
            message: message.into()
        }
    }

    /// Constructs an [`Error::InvalidExtendingFilter`] from the provided
    /// message.
    pub fn invalid_extending_filter<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::InvalidExtendingFilter {
            message: message.into()
        }
    }

    /// Constructs an [`Error::InvalidOutput`] from the provided message.
    pub fn invalid_output<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::InvalidOutput {
            message: message.into()
        }
    }

    /// Constructs an [`Error::InvalidQuery`] from the provided message.
    pub fn invalid_query<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::InvalidQuery {
            message: message.into()
        }
    }

    /// Constructs an [`Error::InvalidWidget`] from the provided message.
    pub fn invalid_widget<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::InvalidWidget {
            message: message.into()
        }
    }

    /// Constructs an [`Error::InvalidDashboard`] from the provided message.
    pub fn invalid_dashboard<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::InvalidDashboard {
            message: message.into()
        }
    }

    /// Constructs an [`Error::InvalidVisualization`] from the provided
    /// message.
    pub fn invalid_visualization<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::InvalidVisualization {
            message: message.into()
        }
    }

    /// Constructs an [`Error::Api`] from the provided message.
    pub fn api<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Api {
            message: message.into()
        }
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// The returned string matches the [`std::fmt::Display`] implementation.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Parse {
            source
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::Api {
            message: error.to_string()
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location of the configuration file that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}
