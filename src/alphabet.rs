//! Residue alphabet: token values used in [`StructureRecord::residue_token`](crate::StructureRecord).
//!
//! Token `0` is padding and token `1` ([`UNK_TOKEN`]) marks an unknown or
//! non-standard residue. The twenty standard amino acids follow in
//! alphabetical order of their three-letter codes.

/// Padding token.
pub const PAD_TOKEN: u8 = 0;

/// Reserved token for unknown / non-standard residues.
pub const UNK_TOKEN: u8 = 1;

/// Three-letter residue names, indexed by token.
pub const RESIDUE_NAMES: [&str; 22] = [
    "PAD", "UNK", "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE", "LEU",
    "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
];

/// One-letter codes, indexed by token.
pub const ONE_LETTER: [char; 22] = [
    '-', 'X', 'A', 'R', 'N', 'D', 'C', 'Q', 'E', 'G', 'H', 'I', 'L', 'K', 'M', 'F', 'P', 'S',
    'T', 'W', 'Y', 'V',
];

/// Token for a three-letter residue name. Anything unrecognized maps to [`UNK_TOKEN`].
#[must_use]
pub fn residue_token(name: &str) -> u8 {
    let upper = name.trim().to_ascii_uppercase();
    RESIDUE_NAMES
        .iter()
        .skip(2)
        .position(|n| *n == upper)
        .map_or(UNK_TOKEN, |i| (i + 2) as u8)
}

/// Token for a one-letter code. Anything unrecognized maps to [`UNK_TOKEN`].
#[must_use]
pub fn token_from_letter(letter: char) -> u8 {
    let upper = letter.to_ascii_uppercase();
    ONE_LETTER
        .iter()
        .skip(2)
        .position(|c| *c == upper)
        .map_or(UNK_TOKEN, |i| (i + 2) as u8)
}

/// One-letter code for a token; out-of-range tokens render as `X`.
#[must_use]
pub fn letter(token: u8) -> char {
    ONE_LETTER
        .get(usize::from(token))
        .copied()
        .unwrap_or(ONE_LETTER[usize::from(UNK_TOKEN)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_residues_round_trip_through_letters() {
        for token in 2..RESIDUE_NAMES.len() as u8 {
            assert_eq!(token_from_letter(letter(token)), token);
            assert_eq!(residue_token(RESIDUE_NAMES[usize::from(token)]), token);
        }
    }

    #[test]
    fn test_unknown_names_map_to_unk() {
        assert_eq!(residue_token("HOH"), UNK_TOKEN);
        assert_eq!(residue_token("mse"), UNK_TOKEN);
        assert_eq!(token_from_letter('B'), UNK_TOKEN);
        assert_eq!(letter(200), 'X');
    }

    #[test]
    fn test_lowercase_names_are_accepted() {
        assert_eq!(residue_token("gly"), 9);
        assert_eq!(token_from_letter('g'), 9);
    }
}
