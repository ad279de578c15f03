//! # Message Pattern Compiler
//!
//! A pattern describes the layout of every line written by a logger, for
//! example `"%date [%lvl] %name - %message"`. It is compiled once when the
//! options are applied into a [`CompiledPattern`]: a list of literal runs and
//! positional placeholders, each bound to a fixed argument index.
//!
//! | token      | index | renders                               |
//! |------------|-------|---------------------------------------|
//! | `%date`    | 0     | local timestamp                       |
//! | `%LEVEL`   | 1     | level name in upper case (`INFORMATION`) |
//! | `%level`   | 2     | level name (`Information`)            |
//! | `%LVL`     | 3     | level abbreviation in upper case (`INFO`) |
//! | `%lvl`     | 4     | level abbreviation (`Info`)           |
//! | `%name`    | 5     | logger name                           |
//! | `%message` | 6     | message text                          |
//!
//! Keywords match case-insensitively; for `level` and `lvl` an upper-case
//! first letter selects the upper-case variant. An optional width may sit
//! between `%` and the keyword (`%-5lvl`, `%20name`): a negative width pads
//! on the right, a positive one on the left. Anything else after a `%` is
//! kept as literal text.

use std::fmt;

use crate::level::LogLevel;

/// Pattern used when the options do not provide one.
pub const DEFAULT_PATTERN: &str = "%date [%lvl] %name - %message";

/// `chrono` format used for the `%date` token.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

const KEYWORDS: [&str; 5] = ["message", "level", "date", "name", "lvl"];

/// Argument a placeholder is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternArg {
    Date,
    LevelUpper,
    LevelLower,
    LvlUpper,
    LvlLower,
    Name,
    Message,
}

impl PatternArg {
    /// Fixed positional index of the argument.
    pub fn index(self) -> usize {
        match self {
            PatternArg::Date => 0,
            PatternArg::LevelUpper => 1,
            PatternArg::LevelLower => 2,
            PatternArg::LvlUpper => 3,
            PatternArg::LvlLower => 4,
            PatternArg::Name => 5,
            PatternArg::Message => 6,
        }
    }

    fn from_keyword(keyword: &str, upper: bool) -> Self {
        match (keyword, upper) {
            ("date", _) => PatternArg::Date,
            ("level", true) => PatternArg::LevelUpper,
            ("level", false) => PatternArg::LevelLower,
            ("lvl", true) => PatternArg::LvlUpper,
            ("lvl", false) => PatternArg::LvlLower,
            ("name", _) => PatternArg::Name,
            _ => PatternArg::Message,
        }
    }
}

/// One piece of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied verbatim.
    Literal(String),
    /// A substitution, with its optional alignment width.
    Placeholder { arg: PatternArg, width: Option<i32> },
}

/// Values substituted into a pattern for a single line.
#[derive(Debug, Clone, Copy)]
pub struct PatternArgs<'a> {
    pub timestamp: &'a str,
    pub level: LogLevel,
    pub name: &'a str,
    pub message: &'a str,
}

/// An immutable, pre-parsed message pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    source: String,
    segments: Vec<Segment>,
}

impl CompiledPattern {
    /// Compiles `pattern`. Never fails: malformed tokens stay literal text.
    pub fn compile(pattern: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = pattern;

        while let Some(pos) = rest.find('%') {
            literal.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            match scan_token(after) {
                Some((arg, width, consumed)) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder { arg, width });
                    rest = &after[consumed..];
                }
                None => {
                    literal.push('%');
                    rest = after;
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        CompiledPattern {
            source: pattern.to_string(),
            segments,
        }
    }

    /// The pattern text this was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the pattern places the message itself.
    pub fn has_message(&self) -> bool {
        self.segments.iter().any(|segment| {
            matches!(
                segment,
                Segment::Placeholder {
                    arg: PatternArg::Message,
                    ..
                }
            )
        })
    }

    /// Appends the rendered pattern to `out`.
    pub fn render_into(&self, out: &mut String, args: &PatternArgs<'_>) {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder { arg, width } => {
                    let (value, upper) = match arg {
                        PatternArg::Date => (args.timestamp, false),
                        PatternArg::LevelUpper => (args.level.name(), true),
                        PatternArg::LevelLower => (args.level.name(), false),
                        PatternArg::LvlUpper => (args.level.abbreviation(), true),
                        PatternArg::LvlLower => (args.level.abbreviation(), false),
                        PatternArg::Name => (args.name, false),
                        PatternArg::Message => (args.message, false),
                    };
                    push_aligned(out, value, upper, *width);
                }
            }
        }
    }

    /// Renders the pattern into a fresh string.
    pub fn render(&self, args: &PatternArgs<'_>) -> String {
        let mut out = String::with_capacity(self.source.len() + args.message.len());
        self.render_into(&mut out, args);
        out
    }
}

impl fmt::Display for CompiledPattern {
    /// Writes the positional form of the pattern, e.g. `{0} [{4,-5}] {5} - {6}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => {
                    for c in text.chars() {
                        match c {
                            '{' => f.write_str("{{")?,
                            '}' => f.write_str("}}")?,
                            _ => write!(f, "{c}")?,
                        }
                    }
                }
                Segment::Placeholder { arg, width: None } => write!(f, "{{{}}}", arg.index())?,
                Segment::Placeholder {
                    arg,
                    width: Some(width),
                } => write!(f, "{{{},{}}}", arg.index(), width)?,
            }
        }
        Ok(())
    }
}

/// Largest field width a placeholder accepts; wider ones stay literal text.
pub const MAX_WIDTH: i32 = 1_000_000;

/// Recognizes `[-]digits? keyword` at the start of `s`.
///
/// Returns the argument, the width and the number of bytes consumed.
fn scan_token(s: &str) -> Option<(PatternArg, Option<i32>, usize)> {
    let bytes = s.as_bytes();
    let mut i = usize::from(bytes.first() == Some(&b'-'));
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }

    let width = if i > digits_start {
        let width = s[..i].parse::<i32>().ok()?;
        if width.unsigned_abs() > MAX_WIDTH.unsigned_abs() {
            return None;
        }
        Some(width)
    } else if digits_start > 0 {
        // a lone '-' is not a width
        return None;
    } else {
        None
    };

    let tail = &bytes[i..];
    KEYWORDS.iter().find_map(|keyword| {
        let candidate = tail.get(..keyword.len())?;
        if !candidate.eq_ignore_ascii_case(keyword.as_bytes()) {
            return None;
        }
        let upper = candidate[0].is_ascii_uppercase();
        Some((
            PatternArg::from_keyword(keyword, upper),
            width,
            i + keyword.len(),
        ))
    })
}

fn push_aligned(out: &mut String, value: &str, upper: bool, width: Option<i32>) {
    let len = value.chars().count();
    let pad = width.map_or(0, |w| (w.unsigned_abs() as usize).saturating_sub(len));
    let right_align = width.is_some_and(|w| w > 0);

    if right_align {
        out.extend(std::iter::repeat(' ').take(pad));
    }
    if upper {
        out.extend(value.chars().flat_map(char::to_uppercase));
    } else {
        out.push_str(value);
    }
    if !right_align {
        out.extend(std::iter::repeat(' ').take(pad));
    }
}
