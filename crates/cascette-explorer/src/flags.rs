//! Locale and content flags carried by root variants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Locale flags select which regional build of a file applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocaleFlags(pub u32);

impl LocaleFlags {
    /// No locale
    pub const NONE: u32 = 0;

    /// All locales
    pub const ALL: u32 = 0xFFFF_FFFF;

    /// English (United States)
    pub const ENUS: u32 = 0x0000_0002;

    /// Korean
    pub const KOKR: u32 = 0x0000_0004;

    /// French (France)
    pub const FRFR: u32 = 0x0000_0010;

    /// German (Germany)
    pub const DEDE: u32 = 0x0000_0020;

    /// Chinese (China)
    pub const ZHCN: u32 = 0x0000_0040;

    /// Spanish (Spain)
    pub const ESES: u32 = 0x0000_0080;

    /// Chinese (Taiwan)
    pub const ZHTW: u32 = 0x0000_0100;

    /// English (Great Britain)
    pub const ENGB: u32 = 0x0000_0200;

    /// English (China)
    pub const ENCN: u32 = 0x0000_0400;

    /// English (Taiwan)
    pub const ENTW: u32 = 0x0000_0800;

    /// Spanish (Mexico)
    pub const ESMX: u32 = 0x0000_1000;

    /// Russian
    pub const RURU: u32 = 0x0000_2000;

    /// Portuguese (Brazil)
    pub const PTBR: u32 = 0x0000_4000;

    /// Italian (Italy)
    pub const ITIT: u32 = 0x0000_8000;

    /// Portuguese (Portugal)
    pub const PTPT: u32 = 0x0001_0000;

    /// Named single-locale flags in display order
    pub const NAMED: [(&'static str, u32); 15] = [
        ("enUS", Self::ENUS),
        ("koKR", Self::KOKR),
        ("frFR", Self::FRFR),
        ("deDE", Self::DEDE),
        ("zhCN", Self::ZHCN),
        ("esES", Self::ESES),
        ("zhTW", Self::ZHTW),
        ("enGB", Self::ENGB),
        ("enCN", Self::ENCN),
        ("enTW", Self::ENTW),
        ("esMX", Self::ESMX),
        ("ruRU", Self::RURU),
        ("ptBR", Self::PTBR),
        ("itIT", Self::ITIT),
        ("ptPT", Self::PTPT),
    ];

    /// Create new locale flags
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get raw value
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Check if locale flag is set
    pub const fn has(&self, locale: u32) -> bool {
        (self.0 & locale) != 0
    }

    /// Check if any locale is shared with `other`
    pub const fn matches(&self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Check if no locale is set
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Names offered by a locale picker, `All` first
    pub fn choices() -> impl Iterator<Item = &'static str> {
        std::iter::once("All").chain(Self::NAMED.iter().map(|(name, _)| *name))
    }
}

impl fmt::Display for LocaleFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Self::ALL => f.write_str("All"),
            Self::NONE => f.write_str("None"),
            value => write_named(
                f,
                u64::from(value),
                Self::NAMED.iter().map(|&(name, flag)| (name, u64::from(flag))),
            ),
        }
    }
}

impl FromStr for LocaleFlags {
    type Err = FlagParseError;

    /// Parse a locale name (`enUS`), `All`, `None`, raw hex bits (`0x1`)
    /// or a comma separated list of those
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut value = 0u32;
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            value |= match part {
                p if p.eq_ignore_ascii_case("all") => Self::ALL,
                p if p.eq_ignore_ascii_case("none") => Self::NONE,
                p => match p.strip_prefix("0x").or_else(|| p.strip_prefix("0X")) {
                    Some(hex) => u32::from_str_radix(hex, 16)
                        .map_err(|_| FlagParseError(p.to_string()))?,
                    None => Self::NAMED
                        .iter()
                        .find(|(name, _)| name.eq_ignore_ascii_case(p))
                        .map(|&(_, flag)| flag)
                        .ok_or_else(|| FlagParseError(p.to_string()))?,
                },
            };
        }
        Ok(Self(value))
    }
}

impl TryFrom<String> for LocaleFlags {
    type Error = FlagParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LocaleFlags> for String {
    fn from(flags: LocaleFlags) -> Self {
        flags.to_string()
    }
}

impl From<u32> for LocaleFlags {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl std::ops::BitAnd for LocaleFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl std::ops::BitOr for LocaleFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for LocaleFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Content flags describe platform and packaging of a root variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContentFlags {
    /// Raw flag value (up to 40 bits)
    pub value: u64,
}

impl ContentFlags {
    /// No special flags
    pub const NONE: u64 = 0x0000_0000;

    /// Windows platform (bit 0)
    pub const LOAD_ON_WINDOWS: u64 = 0x0001;

    /// macOS platform (bit 1)
    pub const LOAD_ON_MACOS: u64 = 0x0002;

    /// File should be installed (bit 2)
    pub const INSTALL: u64 = 0x0004;

    /// Low violence version (bit 3)
    pub const LOW_VIOLENCE: u64 = 0x0008;

    /// Do not load (bit 9)
    pub const DO_NOT_LOAD: u64 = 0x0200;

    /// Update plugin (bit 10)
    pub const UPDATE_PLUGIN: u64 = 0x0400;

    /// ARM64 architecture (bit 11)
    pub const ARM64: u64 = 0x0800;

    /// Encrypted content (bit 12)
    pub const ENCRYPTED: u64 = 0x1000;

    /// No name hash present in block (bit 13)
    pub const NO_NAME_HASH: u64 = 0x2000;

    /// Uncommon resolution (bit 14)
    pub const UNCOMMON_RESOLUTION: u64 = 0x4000;

    /// Bundled file (bit 15)
    pub const BUNDLE: u64 = 0x8000;

    /// No compression applied (bit 16)
    pub const NO_COMPRESSION: u64 = 0x0001_0000;

    /// No TOC hash (bit 17)
    pub const NO_TOC_HASH: u64 = 0x0002_0000;

    const NAMED: [(&'static str, u64); 13] = [
        ("LoadOnWindows", Self::LOAD_ON_WINDOWS),
        ("LoadOnMacOS", Self::LOAD_ON_MACOS),
        ("Install", Self::INSTALL),
        ("LowViolence", Self::LOW_VIOLENCE),
        ("DoNotLoad", Self::DO_NOT_LOAD),
        ("UpdatePlugin", Self::UPDATE_PLUGIN),
        ("Arm64", Self::ARM64),
        ("Encrypted", Self::ENCRYPTED),
        ("NoNameHash", Self::NO_NAME_HASH),
        ("UncommonResolution", Self::UNCOMMON_RESOLUTION),
        ("Bundle", Self::BUNDLE),
        ("NoCompression", Self::NO_COMPRESSION),
        ("NoTocHash", Self::NO_TOC_HASH),
    ];

    /// Create new content flags from raw value
    pub const fn new(value: u64) -> Self {
        Self { value }
    }

    /// Check if flag is set
    pub const fn has(&self, flag: u64) -> bool {
        (self.value & flag) != 0
    }
}

impl fmt::Display for ContentFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value == Self::NONE {
            return f.write_str("None");
        }
        write_named(f, self.value, Self::NAMED.iter().copied())
    }
}

impl From<u64> for ContentFlags {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl std::ops::BitOr for ContentFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::new(self.value | rhs.value)
    }
}

impl std::ops::BitOrAssign for ContentFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.value |= rhs.value;
    }
}

/// Unknown locale name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown locale: {0}")]
pub struct FlagParseError(pub String);

/// Write set flag names joined by `, `, leftover bits as hex
fn write_named<'a>(
    f: &mut fmt::Formatter<'_>,
    value: u64,
    names: impl Iterator<Item = (&'a str, u64)>,
) -> fmt::Result {
    let mut rest = value;
    let mut first = true;
    for (name, flag) in names {
        if value & flag != 0 {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
            rest &= !flag;
            first = false;
        }
    }
    if rest != 0 {
        if !first {
            f.write_str(", ")?;
        }
        write!(f, "0x{rest:x}")?;
    }
    Ok(())
}
