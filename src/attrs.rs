//! Closed set of protein attributes a dataset view may expose.

use crate::error::{DatasetError, DatasetResult};
use std::fmt;
use std::str::FromStr;

/// A retrievable protein attribute. Names match the [`StructureRecord`](crate::StructureRecord)
/// field they select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProteinAttr {
    Idcode,
    Resolution,
    ResidueToken,
    ResidueIndex,
    ResidueMask,
    ChainToken,
    AtomToken,
    AtomCoord,
    AtomMask,
}

impl ProteinAttr {
    pub const ALL: [Self; 9] = [
        Self::Idcode,
        Self::Resolution,
        Self::ResidueToken,
        Self::ResidueIndex,
        Self::ResidueMask,
        Self::ChainToken,
        Self::AtomToken,
        Self::AtomCoord,
        Self::AtomMask,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idcode => "idcode",
            Self::Resolution => "resolution",
            Self::ResidueToken => "residue_token",
            Self::ResidueIndex => "residue_index",
            Self::ResidueMask => "residue_mask",
            Self::ChainToken => "chain_token",
            Self::AtomToken => "atom_token",
            Self::AtomCoord => "atom_coord",
            Self::AtomMask => "atom_mask",
        }
    }
}

impl fmt::Display for ProteinAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProteinAttr {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| DatasetError::schema(format!("attribute {s} is invalid")))
    }
}

/// Which attributes a dataset view serves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AttrSelection {
    #[default]
    All,
    /// Explicit allow-list, deduplicated, in request order.
    Only(Vec<ProteinAttr>),
}

impl AttrSelection {
    /// Parse an allow-list of attribute names.
    ///
    /// # Errors
    /// Returns [`DatasetError::Schema`] for the first unrecognized name.
    pub fn parse<I, S>(names: I) -> DatasetResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut attrs: Vec<ProteinAttr> = Vec::new();
        for name in names {
            let attr: ProteinAttr = name.as_ref().parse()?;
            if !attrs.contains(&attr) {
                attrs.push(attr);
            }
        }
        Ok(Self::Only(attrs))
    }

    #[must_use]
    pub fn contains(&self, attr: ProteinAttr) -> bool {
        match self {
            Self::All => true,
            Self::Only(attrs) => attrs.contains(&attr),
        }
    }

    /// Like [`contains`](Self::contains), by name. Unknown names are never contained.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        name.parse::<ProteinAttr>().is_ok_and(|a| self.contains(a))
    }

    /// The concrete attribute list.
    #[must_use]
    pub fn attrs(&self) -> Vec<ProteinAttr> {
        match self {
            Self::All => ProteinAttr::ALL.to_vec(),
            Self::Only(attrs) => attrs.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_attributes() {
        let sel = AttrSelection::parse(["idcode", "atom_coord", "idcode"]).unwrap();
        assert_eq!(
            sel,
            AttrSelection::Only(vec![ProteinAttr::Idcode, ProteinAttr::AtomCoord])
        );
        assert!(sel.contains_name("atom_coord"));
        assert!(!sel.contains_name("atom_mask"));
    }

    #[test]
    fn test_unknown_attribute_is_schema_error() {
        let err = AttrSelection::parse(["idcode", "b_factor"]).unwrap_err();
        assert!(matches!(err, DatasetError::Schema(ref m) if m.contains("b_factor")));
    }

    #[test]
    fn test_all_contains_every_attribute() {
        let all = AttrSelection::All;
        assert_eq!(all.attrs().len(), ProteinAttr::ALL.len());
        for attr in ProteinAttr::ALL {
            assert!(all.contains(attr));
            assert_eq!(attr.name().parse::<ProteinAttr>().unwrap(), attr);
        }
        assert!(!all.contains_name("sequence"));
    }
}
