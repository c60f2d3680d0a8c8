use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(SourceKind {
    Pdf => "pdf",
    JsonRecord => "json_record",
});

str_enum!(StageKind {
    Temporal => "temporal",
    Names => "names",
    Themes => "themes",
    Places => "places",
    References => "references",
});

impl StageKind {
    pub const ALL: [StageKind; 5] = [
        StageKind::Temporal,
        StageKind::Names,
        StageKind::Themes,
        StageKind::Places,
        StageKind::References,
    ];
}

str_enum!(SnapshotKind {
    Progress => "progress",
    Final => "final",
});

str_enum!(RunStatus {
    Success => "success",
    Error => "error",
});

str_enum!(MidpointRounding {
    HalfAwayFromZero => "half_away_from_zero",
    HalfEven => "half_even",
    Floor => "floor",
});

impl Default for MidpointRounding {
    fn default() -> Self {
        Self::HalfAwayFromZero
    }
}
