//! Line to command parsing

use super::{PX, SIZE};

/// A single parsed protocol line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Write `color` (0xRRGGBB) at `(x, y)` with weight `alpha`
    SetPixel { x: u32, y: u32, color: u32, alpha: u8 },
    /// `SIZE`; recognized but never answered
    SizeQuery,
    /// Anything that is not a valid command, kept for diagnostics
    Unrecognized { raw: &'a [u8] },
}

impl Command<'_> {
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Command::Unrecognized { .. })
    }
}

/// Protocol parser.
///
/// The 8-digit `rrggbbaa` color form is off unless `with_alpha(true)` is
/// set. Its digit-count based detection has never been exercised by real
/// clients, so it stays behind its own switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Parser {
    alpha: bool,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the `rrggbbaa` color form
    pub fn with_alpha(mut self, enabled: bool) -> Self {
        self.alpha = enabled;
        self
    }

    pub fn alpha_enabled(&self) -> bool {
        self.alpha
    }

    /// Parse one line with its `\n` already removed
    pub fn parse<'a>(&self, line: &'a [u8]) -> Command<'a> {
        if let Some(cmd) = self.parse_px(line) {
            return cmd;
        }
        if line.starts_with(SIZE) {
            return Command::SizeQuery;
        }
        Command::Unrecognized { raw: line }
    }

    fn parse_px(&self, line: &[u8]) -> Option<Command<'static>> {
        let rest = line.strip_prefix(PX)?;
        if !rest.first()?.is_ascii_whitespace() {
            return None;
        }

        let mut fields = rest
            .split(u8::is_ascii_whitespace)
            .filter(|field| !field.is_empty());
        let x = parse_decimal(fields.next()?)?;
        let y = parse_decimal(fields.next()?)?;
        let hex = fields.next()?;
        if fields.next().is_some() {
            return None;
        }

        let (color, alpha) = match hex.len() {
            6 => (parse_hex(hex)?, u8::MAX),
            8 if self.alpha => {
                let rgba = parse_hex(hex)?;
                (rgba >> 8, rgba as u8)
            }
            _ => return None,
        };

        Some(Command::SetPixel { x, y, color, alpha })
    }
}

/// Parse with the default (opaque only) parser
pub fn parse_line(line: &[u8]) -> Command<'_> {
    Parser::default().parse(line)
}

/// Decimal digits only; values past `u32::MAX` saturate so the framebuffer
/// bounds check drops them instead of the parser.
fn parse_decimal(field: &[u8]) -> Option<u32> {
    if field.is_empty() || !field.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(field.iter().fold(0u32, |acc, &b| {
        acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
    }))
}

fn parse_hex(field: &[u8]) -> Option<u32> {
    field.iter().try_fold(0u32, |acc, &b| {
        char::from(b).to_digit(16).map(|d| acc << 4 | d)
    })
}
