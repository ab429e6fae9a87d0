//! Pattern grammar: parsing, validation and canonical formatting.
//!
//! A pattern is `METHOD/segment/.../segment`. The method is matched
//! case-insensitively and always stored upper-cased. Each path segment is a
//! literal token, `*` (exactly one segment), `**` (one or more trailing
//! segments, last position only) or empty (trailing delimiter, last position
//! only).

use std::fmt;
use std::str::FromStr;

use crate::error::PatternError;

/// Path delimiter between segments.
pub const DELIMITER: char = '/';

/// Human-readable grammar, quoted in [`PatternError::Malformed`].
pub const GRAMMAR: &str = "[get, post, put, patch, delete, view]/{a-Z}+/{*}+/{**}";

const SINGLE_WILDCARD: &str = "*";
const MULTI_WILDCARD: &str = "**";

/// The leading segment of every pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    /// Synthetic method for page views.
    View,
}

impl Method {
    /// Every recognized method, in display order.
    pub const ALL: [Method; 6] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::View,
    ];

    /// Upper-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::View => "VIEW",
        }
    }

    /// The allowed set, formatted for error messages.
    pub fn allowed() -> String {
        let names: Vec<&str> = Self::ALL.iter().map(Method::as_str).collect();
        format!("[{}]", names.join(" "))
    }
}

impl FromStr for Method {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == upper)
            .ok_or(PatternError::UnsupportedMethod(upper))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One path segment after the method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Exact, case-sensitive token.
    Literal(String),
    /// `*`: exactly one arbitrary segment.
    SingleWildcard,
    /// `**`: one or more trailing segments. Last position only.
    MultiWildcard,
    /// Trailing delimiter. Last position only.
    Empty,
}

impl Segment {
    /// Classify an already-trimmed segment.
    pub fn new(raw: &str) -> Self {
        match raw {
            "" => Segment::Empty,
            SINGLE_WILDCARD => Segment::SingleWildcard,
            MULTI_WILDCARD => Segment::MultiWildcard,
            literal => Segment::Literal(literal.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Segment::Literal(literal) => literal,
            Segment::SingleWildcard => SINGLE_WILDCARD,
            Segment::MultiWildcard => MULTI_WILDCARD,
            Segment::Empty => "",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated pattern (or request): a method followed by at least one segment.
///
/// `Display` renders the canonical form, which is also the pattern's identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    method: Method,
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn method(&self) -> Method {
        self.method
    }

    /// Path segments, in order, excluding the method.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim().trim_start_matches(DELIMITER);
        if trimmed.is_empty() {
            return Err(PatternError::Malformed);
        }

        let parts: Vec<&str> = trimmed.split(DELIMITER).map(str::trim).collect();
        if parts.len() < 2 {
            return Err(PatternError::Malformed);
        }

        // A bare wildcard root (`GET/`, `GET/*`, `GET/**`) names no route.
        if parts.len() == 2 && matches!(parts[1], "" | SINGLE_WILDCARD | MULTI_WILDCARD) {
            return Err(PatternError::IllegalWildcard);
        }

        let method: Method = parts[0].parse()?;

        let last = parts.len() - 1;
        let mut segments = Vec::with_capacity(last);
        for (k, part) in parts.iter().enumerate().skip(1) {
            let segment = Segment::new(part);
            if k != last {
                match segment {
                    Segment::Empty => return Err(PatternError::IllegalEmptyPath),
                    Segment::MultiWildcard => return Err(PatternError::IllegalOmittedPath),
                    _ => {}
                }
            }
            segments.push(segment);
        }

        Ok(Pattern { method, segments })
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.method)?;
        for segment in &self.segments {
            write!(f, "{}{}", DELIMITER, segment)?;
        }
        Ok(())
    }
}

/// Parse and validate a pattern or request string.
pub fn parse(raw: &str) -> Result<Pattern, PatternError> {
    raw.parse()
}

/// Normalize a pattern to its canonical string form.
pub fn format(raw: &str) -> Result<String, PatternError> {
    parse(raw).map(|pattern| pattern.to_string())
}

/// Build the `METHOD/path` request string that [`Table::mapping`](crate::Table::mapping)
/// expects from an HTTP method and a request path.
pub fn request_key(method: &str, path: &str) -> String {
    format!("{}{}{}", method, DELIMITER, path.trim_start_matches(DELIMITER))
}
