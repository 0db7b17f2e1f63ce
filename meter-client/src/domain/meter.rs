use std::fmt;

/// Utility type of a meter, stored as lowercase text in the `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MeterKind {
    Gas,
    Elec,
}

impl MeterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gas => "gas",
            Self::Elec => "elec",
        }
    }
}

impl fmt::Display for MeterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
