//! Location codec: `%IX0.1` ⇄ `(Direction, SizeClass, msi, lsi)`.
//!
//! Grammar: `%` + direction letter (`I`/`Q`/`M`) + size letter
//! (`X`/`B`/`W`/`D`/`L`) + major index [`.` minor index]. The minor index
//! is mandatory for bit locations and forbidden for every other size, so
//! every accepted string is already in normalized form and formats back
//! to itself. Parsing never allocates.

use core::fmt;
use core::str::FromStr;
use thiserror::Error;

use crate::consts::MAX_LSI;

// ─── Direction ──────────────────────────────────────────────────────

/// Direction of a located variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Direction {
    /// `%I`: process input.
    Input = 0,
    /// `%Q`: process output.
    Output = 1,
    /// `%M`: internal memory.
    Memory = 2,
}

impl Direction {
    /// All directions, in discriminant order.
    pub const ALL: [Direction; 3] = [Self::Input, Self::Output, Self::Memory];

    /// Address letter for this direction.
    pub const fn letter(self) -> char {
        match self {
            Self::Input => 'I',
            Self::Output => 'Q',
            Self::Memory => 'M',
        }
    }

    /// Direction for an address letter, if recognized.
    pub const fn from_letter(c: char) -> Option<Self> {
        match c {
            'I' => Some(Self::Input),
            'Q' => Some(Self::Output),
            'M' => Some(Self::Memory),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

// ─── SizeClass ──────────────────────────────────────────────────────

/// Addressing granularity and storage width of a located variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SizeClass {
    /// `X`: a single bit.
    Bit = 0,
    /// `B`: 1 byte.
    Byte = 1,
    /// `W`: 2 bytes.
    Word = 2,
    /// `D`: 4 bytes, including REAL.
    DoubleWord = 3,
    /// `L`: 8 bytes, including LREAL and LINT.
    LongWord = 4,
}

impl SizeClass {
    /// All size classes, in discriminant order.
    pub const ALL: [SizeClass; 5] = [
        Self::Bit,
        Self::Byte,
        Self::Word,
        Self::DoubleWord,
        Self::LongWord,
    ];

    /// Address letter for this size class.
    pub const fn letter(self) -> char {
        match self {
            Self::Bit => 'X',
            Self::Byte => 'B',
            Self::Word => 'W',
            Self::DoubleWord => 'D',
            Self::LongWord => 'L',
        }
    }

    /// Size class for an address letter, if recognized.
    pub const fn from_letter(c: char) -> Option<Self> {
        match c {
            'X' => Some(Self::Bit),
            'B' => Some(Self::Byte),
            'W' => Some(Self::Word),
            'D' => Some(Self::DoubleWord),
            'L' => Some(Self::LongWord),
            _ => None,
        }
    }

    /// Width of the storage cell in bytes. A bit occupies one byte cell.
    pub const fn byte_width(self) -> usize {
        match self {
            Self::Bit | Self::Byte => 1,
            Self::Word => 2,
            Self::DoubleWord => 4,
            Self::LongWord => 8,
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

// ─── LocationError ──────────────────────────────────────────────────

/// Reasons a location string or key is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The string does not start with `%`.
    #[error("location must start with '%'")]
    MissingPrefix,

    /// The string ends before the direction and size letters.
    #[error("location is truncated")]
    Truncated,

    /// Unrecognized direction letter.
    #[error("unknown direction letter {0:?} (expected I, Q or M)")]
    UnknownDirection(char),

    /// Unrecognized size letter.
    #[error("unknown size letter {0:?} (expected X, B, W, D or L)")]
    UnknownSize(char),

    /// Major index is empty, non-numeric or not in normalized form.
    #[error("major index is not a plain decimal number")]
    InvalidMajor,

    /// Major index exceeds the 16-bit range.
    #[error("major index {0} exceeds 65535")]
    MajorOutOfRange(u32),

    /// Minor index is empty, non-numeric or not in normalized form.
    #[error("minor index is not a plain decimal number")]
    InvalidMinor,

    /// Minor index exceeds the last bit lane of a group.
    #[error("minor index {0} exceeds {MAX_LSI}")]
    MinorOutOfRange(u32),

    /// Bit location without a minor index.
    #[error("bit location requires a minor index")]
    MissingMinor,

    /// Minor index supplied for a non-bit size class.
    #[error("minor index is only allowed for bit (X) locations, not {0}")]
    UnexpectedMinor(SizeClass),
}

// ─── Location ───────────────────────────────────────────────────────

/// Structured key of a located variable.
///
/// `lsi` is always zero unless `size` is [`SizeClass::Bit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    direction: Direction,
    size: SizeClass,
    msi: u16,
    lsi: u8,
}

impl Location {
    /// Build a location key, enforcing the minor-index rules.
    ///
    /// # Errors
    /// - [`LocationError::UnexpectedMinor`] for a non-zero `lsi` on a
    ///   non-bit size class.
    /// - [`LocationError::MinorOutOfRange`] for a bit `lsi` above
    ///   [`MAX_LSI`].
    pub const fn new(
        direction: Direction,
        size: SizeClass,
        msi: u16,
        lsi: u8,
    ) -> Result<Self, LocationError> {
        match size {
            SizeClass::Bit if lsi > MAX_LSI => Err(LocationError::MinorOutOfRange(lsi as u32)),
            SizeClass::Bit => Ok(Self {
                direction,
                size,
                msi,
                lsi,
            }),
            _ if lsi != 0 => Err(LocationError::UnexpectedMinor(size)),
            _ => Ok(Self {
                direction,
                size,
                msi,
                lsi: 0,
            }),
        }
    }

    /// Direction component.
    #[inline]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Size-class component.
    #[inline]
    pub const fn size(&self) -> SizeClass {
        self.size
    }

    /// Major (most significant) index.
    #[inline]
    pub const fn msi(&self) -> u16 {
        self.msi
    }

    /// Minor (bit) index. Zero for non-bit locations.
    #[inline]
    pub const fn lsi(&self) -> u8 {
        self.lsi
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}{}{}", self.direction, self.size, self.msi)?;
        if self.size == SizeClass::Bit {
            write!(f, ".{}", self.lsi)?;
        }
        Ok(())
    }
}

impl FromStr for Location {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix('%').ok_or(LocationError::MissingPrefix)?;
        let mut chars = rest.chars();

        let d = chars.next().ok_or(LocationError::Truncated)?;
        let direction = Direction::from_letter(d).ok_or(LocationError::UnknownDirection(d))?;
        let z = chars.next().ok_or(LocationError::Truncated)?;
        let size = SizeClass::from_letter(z).ok_or(LocationError::UnknownSize(z))?;

        let indices = chars.as_str();
        let (major, minor) = match indices.split_once('.') {
            Some((major, minor)) => (major, Some(minor)),
            None => (indices, None),
        };

        let msi = parse_index(major).ok_or(LocationError::InvalidMajor)?;
        let msi = u16::try_from(msi).map_err(|_| LocationError::MajorOutOfRange(msi))?;

        let lsi = match (size, minor) {
            (SizeClass::Bit, None) => return Err(LocationError::MissingMinor),
            (SizeClass::Bit, Some(minor)) => {
                let lsi = parse_index(minor).ok_or(LocationError::InvalidMinor)?;
                if lsi > MAX_LSI as u32 {
                    return Err(LocationError::MinorOutOfRange(lsi));
                }
                lsi as u8
            }
            (_, Some(_)) => return Err(LocationError::UnexpectedMinor(size)),
            (_, None) => 0,
        };

        Ok(Self {
            direction,
            size,
            msi,
            lsi,
        })
    }
}

/// Parse a normalized decimal index: ASCII digits only, no sign, no
/// leading zeros. Values that do not fit in `u32` are rejected.
fn parse_index(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.len() > 1 && s.starts_with('0') {
        return None;
    }
    // Long digit runs saturate to a value that is out of range for `u16`.
    if s.len() > 9 {
        return Some(u32::MAX);
    }
    s.parse().ok()
}
