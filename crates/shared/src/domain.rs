use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseHexError;

macro_rules! hex_newtype {
    ($name:ident, $len:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub [u8; $len]);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = ParseHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.trim();
                let digits = raw
                    .strip_prefix("0x")
                    .or_else(|| raw.strip_prefix("0X"))
                    .unwrap_or(raw);
                let bytes = hex::decode(digits).map_err(|err| ParseHexError::InvalidHex {
                    kind: stringify!($name),
                    message: err.to_string(),
                })?;
                let actual = bytes.len();
                let array: [u8; $len] =
                    bytes
                        .try_into()
                        .map_err(|_| ParseHexError::InvalidLength {
                            kind: stringify!($name),
                            expected: $len,
                            actual,
                        })?;
                Ok(Self(array))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(de::Error::custom)
            }
        }
    };
}

hex_newtype!(Address, 20);
hex_newtype!(TxHash, 32);

/// Zero-argument view functions exposed by the stopwatch contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadFunction {
    ElapsedTime,
    IsRunning,
    StartTime,
    GetCurrentTime,
}

impl ReadFunction {
    pub const ALL: [ReadFunction; 4] = [
        ReadFunction::ElapsedTime,
        ReadFunction::IsRunning,
        ReadFunction::StartTime,
        ReadFunction::GetCurrentTime,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ElapsedTime => "elapsedTime",
            Self::IsRunning => "isRunning",
            Self::StartTime => "startTime",
            Self::GetCurrentTime => "getCurrentTime",
        }
    }

    pub fn signature(self) -> &'static str {
        match self {
            Self::ElapsedTime => "elapsedTime()",
            Self::IsRunning => "isRunning()",
            Self::StartTime => "startTime()",
            Self::GetCurrentTime => "getCurrentTime()",
        }
    }

    pub fn output(self) -> AbiKind {
        match self {
            Self::IsRunning => AbiKind::Bool,
            Self::ElapsedTime | Self::StartTime | Self::GetCurrentTime => AbiKind::Uint256,
        }
    }
}

impl fmt::Display for ReadFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Zero-argument state-changing functions exposed by the stopwatch contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteFunction {
    Start,
    Stop,
    Reset,
}

impl WriteFunction {
    pub const ALL: [WriteFunction; 3] = [
        WriteFunction::Start,
        WriteFunction::Stop,
        WriteFunction::Reset,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Reset => "reset",
        }
    }

    pub fn signature(self) -> &'static str {
        match self {
            Self::Start => "start()",
            Self::Stop => "stop()",
            Self::Reset => "reset()",
        }
    }
}

impl fmt::Display for WriteFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiKind {
    Uint256,
    Bool,
}

/// A decoded return value. Integers wider than 128 bits are rejected by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ContractValue {
    Uint(u128),
    Bool(bool),
}

impl ContractValue {
    pub fn as_uint(&self) -> Option<u128> {
        match self {
            Self::Uint(value) => Some(*value),
            Self::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Uint(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_hash: TxHash,
    pub status: ReceiptStatus,
    pub block_number: Option<u64>,
}
