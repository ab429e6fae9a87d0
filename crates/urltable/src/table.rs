use std::collections::HashMap;

use crate::error::{PatternError, TableError};
use crate::pattern::{parse, Method, Segment, DELIMITER};

/// The pattern table. Maps `METHOD/path` requests to registered patterns.
///
/// Populate it with [`append`](Table::append), then share it read-only and
/// resolve requests with [`mapping`](Table::mapping). Mutation needs `&mut`,
/// so a finished table can be shared across threads without locking.
#[derive(Debug, Default)]
pub struct Table {
    /// Number of terminal nodes.
    size: usize,
    /// One subtree per method.
    roots: HashMap<Method, Node>,
}

/// A single position in the segment trie.
#[derive(Debug, Default)]
struct Node {
    /// Some registered pattern ends exactly here.
    terminal: bool,
    /// Children keyed by segment. Wildcards use their own variants as keys,
    /// so there is at most one `*` and one `**` child per node.
    children: HashMap<Segment, Node>,
}

impl Node {
    /// Whether descending by `incoming` would make this node ambiguous.
    ///
    /// A `**` child owns every other segment at this position. The reverse
    /// is not checked: a `**` may join existing literal siblings, which
    /// keep priority at lookup.
    fn conflicts_with(&self, incoming: &Segment) -> bool {
        match incoming {
            Segment::MultiWildcard => self.children.contains_key(&Segment::SingleWildcard),
            _ => self.children.contains_key(&Segment::MultiWildcard),
        }
    }

    fn collect(&self, prefix: &mut String, out: &mut Vec<String>) {
        if self.terminal {
            out.push(prefix.clone());
        }
        for (segment, child) in &self.children {
            let len = prefix.len();
            prefix.push(DELIMITER);
            prefix.push_str(segment.as_str());
            child.collect(prefix, out);
            prefix.truncate(len);
        }
    }
}

impl Table {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from patterns in order, stopping at the first error.
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for pattern in patterns {
            table.append(pattern.as_ref())?;
        }
        Ok(table)
    }

    /// Number of terminal nodes, i.e. distinct registered patterns.
    ///
    /// A pattern that is a prefix of one already present still counts once it
    /// is appended: `GET/api/v1` after `GET/api/v1/user` gives a size of 2.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Register a pattern.
    ///
    /// Registering an identical pattern twice is a no-op. Conflicts can only
    /// surface at nodes that already existed, so a failed append leaves the
    /// table exactly as it was.
    pub fn append(&mut self, pattern: &str) -> Result<(), TableError> {
        let pattern = parse(pattern)?;
        let method = pattern.method();
        let segments = pattern.segments();

        let mut node = self.roots.entry(method).or_default();
        for (i, segment) in segments.iter().enumerate() {
            if node.conflicts_with(segment) {
                let prefix = join(method, segments[..i].iter().map(Segment::as_str));
                tracing::warn!(
                    pattern = %pattern,
                    prefix = %prefix,
                    "pattern conflicts with a registered wildcard"
                );
                return Err(TableError::Conflict { prefix });
            }
            node = node.children.entry(segment.clone()).or_default();
        }

        if !node.terminal {
            node.terminal = true;
            self.size += 1;
            tracing::debug!(pattern = %pattern, size = self.size, "pattern registered");
        }

        Ok(())
    }

    /// Resolve a concrete `METHOD/path` request to the pattern that handles it.
    ///
    /// Literal children win over `*`, and `*` is only taken when there is no
    /// `**` sibling. A `**` absorbs the rest of the request. There is no
    /// backtracking. Returns `Ok(None)` both when no route matches and when
    /// the walk ends on a prefix that was never registered.
    pub fn mapping(&self, request: &str) -> Result<Option<String>, PatternError> {
        let request = parse(request)?;
        let method = request.method();

        let Some(mut node) = self.roots.get(&method) else {
            return Ok(None);
        };

        let mut matched: Vec<&str> = Vec::with_capacity(request.segments().len());
        for segment in request.segments() {
            if let Some(child) = node.children.get(segment) {
                matched.push(segment.as_str());
                node = child;
                continue;
            }

            if let Some(multi) = node.children.get(&Segment::MultiWildcard) {
                matched.push(Segment::MultiWildcard.as_str());
                node = multi;
                break;
            }

            match node.children.get(&Segment::SingleWildcard) {
                Some(single) => {
                    matched.push(Segment::SingleWildcard.as_str());
                    node = single;
                }
                None => return Ok(None),
            }
        }

        Ok(node.terminal.then(|| join(method, matched)))
    }

    /// Canonical forms of every registered pattern, sorted.
    pub fn patterns(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.size);
        for (method, root) in &self.roots {
            let mut prefix = method.to_string();
            root.collect(&mut prefix, &mut out);
        }
        out.sort();
        out
    }
}

fn join<'a>(method: Method, segments: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = method.to_string();
    for segment in segments {
        out.push(DELIMITER);
        out.push_str(segment);
    }
    out
}
