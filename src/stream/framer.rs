//! Line-oriented event framing
//!
//! The inference server frames its streaming response body as
//! line-oriented events: `data: <payload>`, `event: <name>`, and
//! `: <comment>` lines, one classification per callback. [`LineFramer`]
//! reassembles complete lines across fragment boundaries and classifies
//! each one.
//!
//! Classification checks every prefix independently, longest first. No
//! current prefix is a prefix of another so at most one fires per line in
//! practice, but a line matching several prefixes would emit one
//! [`FramedLine`] per match. This mirrors the wire contract, which treats
//! the checks as independent rather than mutually exclusive.

/// Comment line prefix
const COMMENT_PREFIX: &str = ":";
/// Event-name line prefix
const EVENT_PREFIX: &str = "event:";
/// Data line prefix
const DATA_PREFIX: &str = "data:";

/// A classified line from the event stream
///
/// Produced transiently per decoded fragment; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramedLine {
    /// `: <text>` — informational, ignored by business logic
    Comment(String),
    /// `event: <name>` — names the next logical event
    Event(String),
    /// `data: <payload>` — opaque payload text, dispatched per line
    Data(String),
}

/// Splits decoded text into lines and classifies them
///
/// Text after the last line feed in a fragment belongs to the next
/// fragment and is held in a carry buffer until the line completes.
#[derive(Debug, Default)]
pub struct LineFramer {
    /// Partial line carried from the previous fragment
    carry: String,
}

impl LineFramer {
    /// Create a framer with an empty carry buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame a decoded text fragment into classified lines
    ///
    /// # Examples
    ///
    /// ```
    /// use hearthchat::stream::{FramedLine, LineFramer};
    ///
    /// let mut framer = LineFramer::new();
    /// assert!(framer.push("dat").is_empty());
    /// let lines = framer.push("a: hello\n");
    /// assert_eq!(lines, vec![FramedLine::Data("hello".to_string())]);
    /// ```
    pub fn push(&mut self, fragment: &str) -> Vec<FramedLine> {
        let mut framed = Vec::new();
        let mut text = std::mem::take(&mut self.carry);
        text.push_str(fragment);

        let mut rest = text.as_str();
        while let Some(pos) = rest.find('\n') {
            classify_line(&rest[..pos], &mut framed);
            rest = &rest[pos + 1..];
        }
        self.carry = rest.to_string();

        framed
    }

    /// Whether a partial line is waiting for its terminating line feed
    pub fn has_partial_line(&self) -> bool {
        !self.carry.is_empty()
    }
}

/// Classify one complete line, emitting every matching prefix
///
/// Prefixes are anchored at the start of the line and checked longest
/// first; the prefix is stripped and the remainder trimmed.
fn classify_line(line: &str, out: &mut Vec<FramedLine>) {
    let line = line.strip_suffix('\r').unwrap_or(line);

    if let Some(name) = line.strip_prefix(EVENT_PREFIX) {
        out.push(FramedLine::Event(name.trim().to_string()));
    }
    if let Some(payload) = line.strip_prefix(DATA_PREFIX) {
        out.push(FramedLine::Data(payload.trim().to_string()));
    }
    if let Some(text) = line.strip_prefix(COMMENT_PREFIX) {
        out.push(FramedLine::Comment(text.trim().to_string()));
    }
    // All other lines are ignored.
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(fragments: &[&str]) -> Vec<FramedLine> {
        let mut framer = LineFramer::new();
        let mut out = Vec::new();
        for fragment in fragments {
            out.extend(framer.push(fragment));
        }
        out
    }

    #[test]
    fn test_data_line() {
        assert_eq!(
            framed(&["data: hello\n"]),
            vec![FramedLine::Data("hello".to_string())]
        );
    }

    #[test]
    fn test_event_line() {
        assert_eq!(
            framed(&["event: done\n"]),
            vec![FramedLine::Event("done".to_string())]
        );
    }

    #[test]
    fn test_comment_line() {
        assert_eq!(
            framed(&[": keep-alive\n"]),
            vec![FramedLine::Comment("keep-alive".to_string())]
        );
    }

    #[test]
    fn test_unprefixed_line_ignored() {
        assert!(framed(&["retry: 3000\nhello\n"]).is_empty());
    }

    #[test]
    fn test_prefix_must_be_anchored_at_line_start() {
        // "data: :x" is Data only: the ':' is payload, not a comment line.
        assert_eq!(
            framed(&["data: :x\n"]),
            vec![FramedLine::Data(":x".to_string())]
        );
        // " data: x" does not start with "data:", so it is ignored.
        assert!(framed(&[" data: x\n"]).is_empty());
    }

    #[test]
    fn test_line_split_across_fragments() {
        assert_eq!(
            framed(&["dat", "a: hello\ndata: world\n"]),
            vec![
                FramedLine::Data("hello".to_string()),
                FramedLine::Data("world".to_string()),
            ]
        );
    }

    #[test]
    fn test_fragment_boundary_invariance() {
        let body = ": warming up\nevent: token\ndata: alpha\ndata: beta\n";
        let whole = framed(&[body]);
        for split in 0..body.len() {
            assert_eq!(
                framed(&[&body[..split], &body[split..]]),
                whole,
                "split at byte {}",
                split
            );
        }
    }

    #[test]
    fn test_crlf_line_endings_tolerated() {
        assert_eq!(
            framed(&["data: hello\r\n"]),
            vec![FramedLine::Data("hello".to_string())]
        );
    }

    #[test]
    fn test_payload_whitespace_trimmed() {
        assert_eq!(
            framed(&["data:    spaced out   \n"]),
            vec![FramedLine::Data("spaced out".to_string())]
        );
    }

    #[test]
    fn test_empty_data_payload() {
        assert_eq!(
            framed(&["data:\n"]),
            vec![FramedLine::Data(String::new())]
        );
    }

    #[test]
    fn test_trailing_partial_line_is_carried_not_emitted() {
        let mut framer = LineFramer::new();
        assert!(framer.push("data: incomplete").is_empty());
        assert!(framer.has_partial_line());
    }

    /// The prefix checks are independent by contract: every matching
    /// prefix fires. No current prefix is a prefix of another, so this
    /// pins the single-match behavior for each prefix rather than an
    /// early-exit ordering.
    #[test]
    fn test_independent_prefix_checks_single_match_each() {
        assert_eq!(framed(&["event: e\ndata: d\n: c\n"]).len(), 3);
        // A comment whose text mentions another prefix stays one comment.
        assert_eq!(
            framed(&[": data: not data\n"]),
            vec![FramedLine::Comment("data: not data".to_string())]
        );
    }
}
