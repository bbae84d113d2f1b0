use std::fmt::{self, Display};

/// Everything that can go wrong while decoding emulated state.
///
/// None of these reach the emulator as a hard failure: hook handlers log them
/// and render nothing for the affected primitive or frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The ROM image ends before the header's game code.
    RomTooShort { len: usize },
    /// An address outside the memory regions a fast path can read directly.
    UnsupportedRegion { address: u32 },
    /// A bulk copy whose source runs past the end of its memory region.
    CopySourceOutOfBounds { address: u32, len: usize },
    /// A primitive tag the Drome rasterizer does not know.
    UnknownPrimitive { tag: u8 },
    /// A game code that is not four ASCII characters.
    InvalidTitleCode(String),
    /// A render scale of zero.
    InvalidScale(usize),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RomTooShort { len } => {
                write!(f, "rom is {len} bytes long, too short to hold a header")
            }
            Self::UnsupportedRegion { address } => {
                write!(f, "unsupported memory region {:02X} (address {address:#010X})", address >> 24)
            }
            Self::CopySourceOutOfBounds { address, len } => {
                write!(f, "copy of {len} bytes from {address:#010X} runs past its region")
            }
            Self::UnknownPrimitive { tag } => write!(f, "unknown primitive type {tag}"),
            Self::InvalidTitleCode(code) => write!(f, "invalid game code {code:?}"),
            Self::InvalidScale(scale) => write!(f, "invalid render scale {scale}"),
        }
    }
}

impl std::error::Error for Error {}
