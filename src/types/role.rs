use std::fmt;

use serde::{Deserialize, Serialize};

/// Who may read a project absent explicit collaboration.
///
/// Stored as the integer codes 0..=3 in `projects.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    /// `role_value` holds a delimited username allowlist.
    RestrictedList,
    /// `role_value` holds the link token compared against a viewcode.
    LinkProtected,
}

impl Visibility {
    pub const fn code(self) -> i64 {
        match self {
            Self::Public => 0,
            Self::Private => 1,
            Self::RestrictedList => 2,
            Self::LinkProtected => 3,
        }
    }

    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Public),
            1 => Some(Self::Private),
            2 => Some(Self::RestrictedList),
            3 => Some(Self::LinkProtected),
            _ => None,
        }
    }
}

/// Grant attached to a (user, project) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum CollaboratorRole {
    Viewer,
    Editor,
}

impl CollaboratorRole {
    pub const fn code(self) -> i64 {
        match self {
            Self::Viewer => 0,
            Self::Editor => 1,
        }
    }

    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Viewer),
            1 => Some(Self::Editor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum DocStatus {
    /// Visible only to the doc's own creator.
    Draft,
    #[default]
    Published,
    Reserved,
    /// Soft-deleted; the row stays in place.
    Deleted,
}

impl DocStatus {
    pub const fn code(self) -> i64 {
        match self {
            Self::Draft => 0,
            Self::Published => 1,
            Self::Reserved => 2,
            Self::Deleted => 3,
        }
    }

    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Draft),
            1 => Some(Self::Published),
            2 => Some(Self::Reserved),
            3 => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// How a share token is checked on access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ShareType {
    #[default]
    Open,
    /// The presented viewcode must equal `share_value`.
    Code,
}

impl ShareType {
    pub const fn code(self) -> i64 {
        match self {
            Self::Open => 0,
            Self::Code => 1,
        }
    }

    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Open),
            1 => Some(Self::Code),
            _ => None,
        }
    }
}

/// Raised when a stored or submitted integer code has no matching variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: i64,
}

impl fmt::Display for UnknownCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} code: {}", self.kind, self.code)
    }
}

impl std::error::Error for UnknownCode {}

macro_rules! code_conversions {
    ($ty:ident, $kind:literal) => {
        impl TryFrom<i64> for $ty {
            type Error = UnknownCode;

            fn try_from(code: i64) -> Result<Self, Self::Error> {
                Self::from_code(code).ok_or(UnknownCode { kind: $kind, code })
            }
        }

        impl From<$ty> for i64 {
            fn from(value: $ty) -> Self {
                value.code()
            }
        }
    };
}

code_conversions!(Visibility, "visibility");
code_conversions!(CollaboratorRole, "collaborator role");
code_conversions!(DocStatus, "doc status");
code_conversions!(ShareType, "share type");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_codes_roundtrip() {
        for code in 0..=3 {
            let v = Visibility::from_code(code).unwrap();
            assert_eq!(v.code(), code);
        }
        assert_eq!(Visibility::from_code(4), None);
    }

    #[test]
    fn test_serde_uses_integer_codes() {
        let json = serde_json::to_string(&DocStatus::Deleted).unwrap();
        assert_eq!(json, "3");

        let role: CollaboratorRole = serde_json::from_str("1").unwrap();
        assert_eq!(role, CollaboratorRole::Editor);

        assert!(serde_json::from_str::<CollaboratorRole>("2").is_err());
    }
}
