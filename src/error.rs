use font_types::Tag;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed filter data, a missing or broken font table, an invalid TTC index.
    BadFileFormat,
    /// An unknown filter or predictor, or data this crate does not handle.
    UnsupportedFeature,
    /// The underlying file could not be read.
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{filter}: {reason}")]
    BadFilterData {
        filter: &'static str,
        reason: &'static str,
    },
    #[error("unsupported filter /{0}")]
    UnsupportedFilter(String),
    #[error("unsupported predictor {predictor} with {bits_per_component} bits per component")]
    UnsupportedPredictor {
        predictor: u8,
        bits_per_component: u8,
    },
    #[error("table '{0}' does not exist")]
    TableNotPresent(Tag),
    #[error("table '{tag}' is malformed: {reason}")]
    MalformedTable { tag: Tag, reason: &'static str },
    #[error("font index {index} is out of range, the collection has {count} fonts")]
    InvalidTtcIndex { index: u32, count: u32 },
    #[error("not a valid TrueType font: {0}")]
    BadFontFormat(&'static str),
    #[error("unexpected end of data")]
    Truncated,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::BadFilterData { .. }
            | Error::TableNotPresent(_)
            | Error::MalformedTable { .. }
            | Error::InvalidTtcIndex { .. }
            | Error::BadFontFormat(_)
            | Error::Truncated => ErrorKind::BadFileFormat,
            Error::UnsupportedFilter(_) | Error::UnsupportedPredictor { .. } => {
                ErrorKind::UnsupportedFeature
            }
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Attribute a bare truncation to the table that was being read.
    pub(crate) fn in_table(self, tag: Tag) -> Self {
        match self {
            Error::Truncated => Error::MalformedTable {
                tag,
                reason: "unexpected end of table data",
            },
            other => other,
        }
    }

    pub(crate) fn filter(filter: &'static str, reason: &'static str) -> Self {
        Error::BadFilterData { filter, reason }
    }
}

impl From<bytes::TryGetError> for Error {
    fn from(_value: bytes::TryGetError) -> Self {
        Self::Truncated
    }
}

pub(crate) fn usize_will_overflow(a: usize, b: usize) -> bool {
    a.checked_add(b).is_none()
}

#[cfg(not(feature = "debug"))]
mod regular {
    macro_rules! bail {
        ($err: expr) => {
            return Err($err)
        };
    }
    pub(crate) use bail;

    macro_rules! bail_if {
        ($cond: expr, $err: expr) => {
            if $cond {
                return Err($err);
            }
        };
    }
    pub(crate) use bail_if;
}
#[cfg(not(feature = "debug"))]
pub(crate) use regular::*;

#[cfg(feature = "debug")]
mod debug {
    macro_rules! bail {
        ($err: expr) => {
            panic!("{}", $err)
        };
    }
    pub(crate) use bail;

    macro_rules! bail_if {
        ($cond: expr, $err: expr) => {
            if $cond {
                panic!("{}: {}", stringify!($cond), $err)
            }
        };
    }
    pub(crate) use bail_if;
}
#[cfg(feature = "debug")]
pub(crate) use debug::*;
