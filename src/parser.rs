/*!
Recovers point lists from the text a message inspection tool prints for
recorded messages (`rostopic echo` style YAML).

There is no schema to lean on, so every line is first classified into a
[`LineKind`] and then fed to a small state machine:

- *Idle*: nothing is being collected. A topic line or a `name:` line opens a
  block and moves to *Collecting*.
- *Collecting*: `x:`/`y:` fields are paired into points, but only inside a
  `points:` (or `position:`) section of the current block. The section ends
  at the next key that is not indented deeper than the marker. A blank line
  or a `---` separator emits the block and goes back to *Idle*; a new topic or
  name emits it and opens the next one.

Numbers that do not parse are read as zero and reported as a
[`Diagnostic::MalformedField`]; one bad field never spoils the rest of the
dump.
 */
use std::borrow::Cow;
use std::mem;

use crate::error::Diagnostic;
use crate::projection::LocalPoint;
use crate::topics::{self, Topic};
use crate::zone::ZoneKind;

const SEPARATOR: &str = "---";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    fn as_str(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
        }
    }
}

/// What a single dump line means to the parser.
///
/// `indent` is the column of the key, counting a leading `- ` list marker
/// as part of the indentation.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind<'a> {
    Blank,
    /// `---` between two messages
    Separator,
    /// A line mentioning one of the known topics
    Topic(Topic),
    /// `name: "..."`, quotes removed and escapes decoded
    Name(Cow<'a, str>),
    /// `points:` or `position:`, the start of a coordinate section
    PointsMarker { indent: usize },
    /// Any other key without an inline value, e.g. `orientation:`
    Section { key: &'a str, indent: usize },
    /// `x: <raw>` or `y: <raw>`
    Coord { axis: Axis, raw: &'a str, indent: usize },
    /// `{x: <raw>, y: <raw>, ...}`
    InlinePoint { x: &'a str, y: &'a str, indent: usize },
    /// Everything else; `key` is set for `key: value` lines
    Other { key: Option<&'a str>, indent: usize },
}

/// Classifies one line of dump text.
pub fn classify_line(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if trimmed == SEPARATOR {
        return LineKind::Separator;
    }

    let mut indent = line.len() - line.trim_start().len();
    let mut content = trimmed;
    while let Some(rest) = content.strip_prefix("- ") {
        indent += content.len() - rest.trim_start().len();
        content = rest.trim_start();
    }

    if content.starts_with('{') {
        return match inline_point(content) {
            Some((x, y)) => LineKind::InlinePoint { x, y, indent },
            None => LineKind::Other { key: None, indent },
        };
    }

    let key_value = split_key(content);
    if let Some(("name", value)) = key_value {
        return LineKind::Name(unquote(value));
    }
    if let Some(topic) = topics::find_in(content) {
        return LineKind::Topic(topic);
    }

    match key_value {
        Some(("points" | "position", _)) => LineKind::PointsMarker { indent },
        Some(("x", raw)) => LineKind::Coord {
            axis: Axis::X,
            raw,
            indent,
        },
        Some(("y", raw)) => LineKind::Coord {
            axis: Axis::Y,
            raw,
            indent,
        },
        Some((key, "")) => LineKind::Section { key, indent },
        Some((key, _)) => LineKind::Other {
            key: Some(key),
            indent,
        },
        None => LineKind::Other { key: None, indent },
    }
}

/// `key: value` with an identifier-like key; value trimmed, possibly empty.
fn split_key(content: &str) -> Option<(&str, &str)> {
    let (key, value) = content.split_once(':')?;
    let key = key.trim();
    if key.is_empty() || !key.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some((key, value.trim()))
}

fn inline_point(content: &str) -> Option<(&str, &str)> {
    let inner = content.strip_prefix('{')?.strip_suffix('}')?;
    let mut x = None;
    let mut y = None;
    for field in inner.split(',') {
        match split_key(field.trim()) {
            Some(("x", raw)) => x = Some(raw),
            Some(("y", raw)) => y = Some(raw),
            _ => {}
        }
    }
    Some((x?, y?))
}

fn strip_pair(value: &str, quote: char) -> Option<&str> {
    value.strip_prefix(quote)?.strip_suffix(quote)
}

/// Surrounding quotes removed, escapes left alone.
fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    strip_pair(value, '"')
        .or_else(|| strip_pair(value, '\''))
        .unwrap_or(value)
}

/// A YAML scalar as text: double quoted values have their escapes decoded,
/// single quoted ones their doubled quotes.
fn unquote(value: &str) -> Cow<'_, str> {
    let value = value.trim();
    if let Some(inner) = strip_pair(value, '"') {
        return unescape(inner);
    }
    match strip_pair(value, '\'') {
        Some(inner) if inner.contains("''") => Cow::Owned(inner.replace("''", "'")),
        Some(inner) => Cow::Borrowed(inner),
        None => Cow::Borrowed(value),
    }
}

fn unescape(inner: &str) -> Cow<'_, str> {
    if !inner.contains('\\') {
        return Cow::Borrowed(inner);
    }
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(c @ ('"' | '\\' | '/')) => out.push(c),
            Some(code @ ('x' | 'u' | 'U')) => {
                let width = match code {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars.by_ref().take(width).collect();
                let decoded = Some(digits.as_str())
                    .filter(|digits| digits.len() == width)
                    .and_then(|digits| u32::from_str_radix(digits, 16).ok())
                    .and_then(char::from_u32);
                match decoded {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push(code);
                        out.push_str(&digits);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}

/// Reads a scalar, `None` for anything that is not a finite number.
fn parse_number(raw: &str) -> Option<f64> {
    strip_quotes(raw).parse::<f64>().ok().filter(|v| v.is_finite())
}

/// One recovered shape, points in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct PointBlock {
    pub name: String,
    pub topic: Option<Topic>,
    pub kind: ZoneKind,
    pub points: Vec<LocalPoint>,
}

/// Result of parsing a dump: shapes in discovery order plus what had to be
/// patched up on the way.
#[derive(Debug, Clone, Default)]
pub struct ParsedDump {
    pub blocks: Vec<PointBlock>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedDump {
    /// Points of the first block called `name`.
    pub fn points(&self, name: &str) -> Option<&[LocalPoint]> {
        self.blocks
            .iter()
            .find(|block| block.name == name)
            .map(|block| block.points.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Appends another dump, keeping discovery order.
    pub fn extend(&mut self, other: ParsedDump) {
        self.blocks.extend(other.blocks);
        self.diagnostics.extend(other.diagnostics);
    }
}

/// Parses a dump that carries its own topic or `name:` lines.
pub fn parse<'a, I>(lines: I) -> ParsedDump
where
    I: IntoIterator<Item = &'a str>,
{
    let mut machine = Machine::default();
    for (index, line) in lines.into_iter().enumerate() {
        machine.feed(index + 1, line);
    }
    machine.finish()
}

/// Parses the output of echoing a single `topic`, which does not repeat the
/// topic name itself.
pub fn parse_topic(topic: Topic, text: &str) -> ParsedDump {
    let mut machine = Machine::default();
    machine.open_topic(topic);
    for (index, line) in text.lines().enumerate() {
        machine.feed(index + 1, line);
    }
    machine.finish()
}

#[derive(Debug)]
struct Block {
    /// Name of the area the block belongs to, before any obstacle suffix
    area: String,
    name: String,
    topic: Option<Topic>,
    kind: ZoneKind,
    /// Indentation of the active `points:` marker
    section: Option<usize>,
    seen_marker: bool,
    pending_x: Option<f64>,
    points: Vec<LocalPoint>,
}

impl Block {
    fn new(name: String, topic: Option<Topic>, kind: ZoneKind) -> Self {
        Self {
            area: name.clone(),
            name,
            topic,
            kind,
            section: None,
            seen_marker: false,
            pending_x: None,
            points: Vec::new(),
        }
    }

    fn leave_section_at(&mut self, indent: usize) {
        if self.section.map_or(false, |marker| indent <= marker) {
            self.section = None;
            self.pending_x = None;
        }
    }

    fn in_section(&self, indent: usize) -> bool {
        self.section.map_or(false, |marker| indent > marker)
    }

    /// Hands out the collected shape and keeps the block open for more.
    fn take_shape(&mut self) -> Option<PointBlock> {
        let seen = mem::replace(&mut self.seen_marker, false);
        self.section = None;
        self.pending_x = None;
        let points = mem::take(&mut self.points);
        seen.then(|| PointBlock {
            name: self.name.clone(),
            topic: self.topic,
            kind: self.kind,
            points,
        })
    }
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Collecting(Block),
}

#[derive(Debug, Default)]
struct Machine {
    state: State,
    topic: Option<Topic>,
    blocks: Vec<PointBlock>,
    diagnostics: Vec<Diagnostic>,
}

impl Machine {
    fn feed(&mut self, number: usize, line: &str) {
        let kind = classify_line(line);
        match kind {
            LineKind::Blank | LineKind::Separator => self.close_block(),
            LineKind::Topic(topic) => self.open_topic(topic),
            LineKind::Name(name) => self.open_name(&name),
            LineKind::PointsMarker { indent } => {
                if let State::Collecting(block) = &mut self.state {
                    if !block.points.is_empty() || block.pending_x.is_some() {
                        self.blocks.extend(block.take_shape());
                    }
                    block.section = Some(indent);
                    block.seen_marker = true;
                }
            }
            LineKind::Section { key, indent } => {
                if let State::Collecting(block) = &mut self.state {
                    block.leave_section_at(indent);
                    if key == "obstacles" {
                        self.blocks.extend(block.take_shape());
                        block.name = format!("{} exclusion", block.area);
                        block.kind = ZoneKind::classify(&block.name);
                    }
                }
            }
            LineKind::Coord { axis, raw, indent } => {
                if let State::Collecting(block) = &mut self.state {
                    block.leave_section_at(indent);
                    if !block.in_section(indent) {
                        return;
                    }
                    let value = number_or_zero(&mut self.diagnostics, number, axis, raw);
                    match axis {
                        Axis::X => {
                            if block.pending_x.replace(value).is_some() {
                                log::debug!("line {}: x without a matching y, dropped", number);
                            }
                        }
                        Axis::Y => match block.pending_x.take() {
                            Some(x) => block.points.push(LocalPoint::new(x, value)),
                            None => log::debug!("line {}: y without a preceding x, ignored", number),
                        },
                    }
                }
            }
            LineKind::InlinePoint { x, y, indent } => {
                if let State::Collecting(block) = &mut self.state {
                    if block.in_section(indent) {
                        let x = number_or_zero(&mut self.diagnostics, number, Axis::X, x);
                        let y = number_or_zero(&mut self.diagnostics, number, Axis::Y, y);
                        block.pending_x = None;
                        block.points.push(LocalPoint::new(x, y));
                    }
                }
            }
            LineKind::Other { key: Some(_), indent } => {
                if let State::Collecting(block) = &mut self.state {
                    block.leave_section_at(indent);
                }
            }
            LineKind::Other { key: None, .. } => {}
        }
    }

    fn open_topic(&mut self, topic: Topic) {
        self.close_block();
        self.topic = Some(topic);
        let block = Block::new(topic.name.to_string(), Some(topic), topics::kind_of(topic));
        self.state = State::Collecting(block);
    }

    fn open_name(&mut self, name: &str) {
        self.close_block();
        let name = match (name.is_empty(), self.topic) {
            (false, _) => name.to_string(),
            (true, Some(topic)) => topic.name.to_string(),
            (true, None) => "unnamed".to_string(),
        };
        let kind = ZoneKind::classify(&name);
        self.state = State::Collecting(Block::new(name, self.topic, kind));
    }

    fn close_block(&mut self) {
        if let State::Collecting(mut block) = mem::take(&mut self.state) {
            self.blocks.extend(block.take_shape());
        }
    }

    fn finish(mut self) -> ParsedDump {
        self.close_block();
        ParsedDump {
            blocks: self.blocks,
            diagnostics: self.diagnostics,
        }
    }
}

fn number_or_zero(diagnostics: &mut Vec<Diagnostic>, line: usize, axis: Axis, raw: &str) -> f64 {
    parse_number(raw).unwrap_or_else(|| {
        diagnostics.push(
            Diagnostic::MalformedField {
                line,
                field: axis.as_str().to_string(),
                text: raw.to_string(),
            }
            .report(),
        );
        0.0
    })
}
