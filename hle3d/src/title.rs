use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Offset of the 4-byte game code in the cartridge header.
const GAME_CODE_OFFSET: usize = 0xAC;

/// Identifies a game by the 4-byte game code of its cartridge header
/// (e.g. `BLXP`), stored as the little-endian word the CPU would load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TitleId(u32);

impl TitleId {
    /// Builds an identifier from the game code as it appears in the header.
    #[must_use]
    pub const fn from_code(code: &[u8; 4]) -> Self {
        Self(u32::from_le_bytes(*code))
    }

    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Reads the game code out of a ROM image.
    pub fn from_rom_header(rom: &[u8]) -> Result<Self, Error> {
        let code: [u8; 4] = rom
            .get(GAME_CODE_OFFSET..GAME_CODE_OFFSET + 4)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(Error::RomTooShort { len: rom.len() })?;

        Ok(Self::from_code(&code))
    }

    #[must_use]
    pub const fn code(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl Display for TitleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.code() {
            if byte.is_ascii_graphic() {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{byte:02x}")?;
            }
        }

        Ok(())
    }
}

impl FromStr for TitleId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| Error::InvalidTitleCode(s.to_owned()))?;

        if !code.iter().all(u8::is_ascii_alphanumeric) {
            return Err(Error::InvalidTitleCode(s.to_owned()));
        }

        Ok(Self::from_code(&code))
    }
}

impl TryFrom<String> for TitleId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TitleId> for String {
    fn from(title: TitleId) -> Self {
        title.to_string()
    }
}
