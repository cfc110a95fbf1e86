//! BIP32 derivation paths such as `m/44'/60'/0'/0/0`

use std::fmt;
use std::str::FromStr;

use super::error::HdError;

/// First hardened child index
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Path used for DX accounts (Ethereum coin type)
pub const DEFAULT_DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

/// One step of a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildIndex {
    Normal(u32),
    Hardened(u32),
}

impl ChildIndex {
    /// Build a child index, rejecting values at or above 2^31
    pub fn new(index: u32, hardened: bool) -> Result<Self, HdError> {
        if index >= HARDENED_OFFSET {
            return Err(HdError::InvalidPath(index.to_string()));
        }
        Ok(if hardened {
            ChildIndex::Hardened(index)
        } else {
            ChildIndex::Normal(index)
        })
    }

    /// Index without the hardened bit
    pub fn index(&self) -> u32 {
        match *self {
            ChildIndex::Normal(i) | ChildIndex::Hardened(i) => i,
        }
    }

    pub fn is_hardened(&self) -> bool {
        matches!(self, ChildIndex::Hardened(_))
    }

    /// Index as serialized in BIP32 (hardened bit set when hardened)
    pub fn to_u32(&self) -> u32 {
        match *self {
            ChildIndex::Normal(i) => i,
            ChildIndex::Hardened(i) => i | HARDENED_OFFSET,
        }
    }

    /// Inverse of [`ChildIndex::to_u32`]
    pub fn from_u32(raw: u32) -> Self {
        if raw >= HARDENED_OFFSET {
            ChildIndex::Hardened(raw - HARDENED_OFFSET)
        } else {
            ChildIndex::Normal(raw)
        }
    }
}

impl fmt::Display for ChildIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildIndex::Normal(i) => write!(f, "{i}"),
            ChildIndex::Hardened(i) => write!(f, "{i}'"),
        }
    }
}

impl FromStr for ChildIndex {
    type Err = HdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (digits, hardened) = match s.strip_suffix('\'') {
            Some(digits) => (digits, true),
            None => (s, false),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(HdError::InvalidPath(s.to_string()));
        }
        let index: u32 = digits
            .parse()
            .map_err(|_| HdError::InvalidPath(s.to_string()))?;
        ChildIndex::new(index, hardened).map_err(|_| HdError::InvalidPath(s.to_string()))
    }
}

/// A parsed derivation path
///
/// Accepts `m/` followed by one or more `/`-separated indices, each optionally
/// suffixed with `'` to mark it hardened. The leading `m/` may be omitted, in
/// which case the path is relative to whatever key it is applied to.
/// A bare `m` or an empty string is not a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationPath {
    from_master: bool,
    steps: Vec<ChildIndex>,
}

impl DerivationPath {
    /// A relative path over the given steps
    pub fn relative(steps: Vec<ChildIndex>) -> Self {
        Self {
            from_master: false,
            steps,
        }
    }

    /// Whether the path was written with the `m/` prefix
    pub fn is_from_master(&self) -> bool {
        self.from_master
    }

    pub fn steps(&self) -> &[ChildIndex] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Default for DerivationPath {
    fn default() -> Self {
        Self {
            from_master: true,
            steps: vec![
                ChildIndex::Hardened(44),
                ChildIndex::Hardened(60),
                ChildIndex::Hardened(0),
                ChildIndex::Normal(0),
                ChildIndex::Normal(0),
            ],
        }
    }
}

impl FromStr for DerivationPath {
    type Err = HdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (body, from_master) = match s.strip_prefix("m/") {
            Some(body) => (body, true),
            None => (s, false),
        };
        if body.is_empty() {
            return Err(HdError::InvalidPath(s.to_string()));
        }
        let steps = body
            .split('/')
            .map(|part| part.parse::<ChildIndex>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| HdError::InvalidPath(s.to_string()))?;
        Ok(Self { from_master, steps })
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from_master {
            write!(f, "m/")?;
        }
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}
