//! Protocol revisions and the thresholds that gate behavior on them.

use std::{fmt, str::FromStr};

use crate::errors::RevisionError;

/// A named protocol rule-set, ordered by activation.
///
/// Every revision-conditional rule in the workspace is expressed as a
/// comparison against one of the associated thresholds below rather than
/// against the token the revision was parsed from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Revision {
    Frontier,
    Homestead,
    TangerineWhistle,
    SpuriousDragon,
    Byzantium,
    Constantinople,
    Petersburg,
    Istanbul,
    Berlin,
    London,
    Paris,
    Shanghai,
    Cancun,
    Prague,
    Osaka,
}

impl Revision {
    /// Receipts carry a status code instead of an intermediate state root.
    pub const STATUS_RECEIPTS: Revision = Revision::Byzantium;

    /// Proof-of-stake, difficulty is no longer computed.
    pub const MERGE: Revision = Revision::Paris;

    /// Beacon chain withdrawals are credited and committed to.
    pub const WITHDRAWALS: Revision = Revision::Shanghai;

    /// Blob transactions and blob gas accounting.
    pub const BLOBS: Revision = Revision::Cancun;

    /// Execution-layer requests digest.
    pub const REQUESTS: Revision = Revision::Prague;

    /// All revisions, oldest first.
    pub const ALL: [Revision; 15] = [
        Revision::Frontier,
        Revision::Homestead,
        Revision::TangerineWhistle,
        Revision::SpuriousDragon,
        Revision::Byzantium,
        Revision::Constantinople,
        Revision::Petersburg,
        Revision::Istanbul,
        Revision::Berlin,
        Revision::London,
        Revision::Paris,
        Revision::Shanghai,
        Revision::Cancun,
        Revision::Prague,
        Revision::Osaka,
    ];

    /// Returns if this revision includes the rules introduced by `other`.
    pub fn is_enabled_in(self, other: Revision) -> bool {
        self >= other
    }

    /// Canonical fixture token for this revision.
    pub fn name(self) -> &'static str {
        match self {
            Revision::Frontier => "Frontier",
            Revision::Homestead => "Homestead",
            Revision::TangerineWhistle => "EIP150",
            Revision::SpuriousDragon => "EIP158",
            Revision::Byzantium => "Byzantium",
            Revision::Constantinople => "Constantinople",
            Revision::Petersburg => "ConstantinopleFix",
            Revision::Istanbul => "Istanbul",
            Revision::Berlin => "Berlin",
            Revision::London => "London",
            Revision::Paris => "Merge",
            Revision::Shanghai => "Shanghai",
            Revision::Cancun => "Cancun",
            Revision::Prague => "Prague",
            Revision::Osaka => "Osaka",
        }
    }
}

impl FromStr for Revision {
    type Err = RevisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rev = match s {
            "Frontier" => Revision::Frontier,
            "Homestead" => Revision::Homestead,
            "EIP150" | "TangerineWhistle" => Revision::TangerineWhistle,
            "EIP158" | "SpuriousDragon" => Revision::SpuriousDragon,
            "Byzantium" => Revision::Byzantium,
            "Constantinople" => Revision::Constantinople,
            "ConstantinopleFix" | "Petersburg" => Revision::Petersburg,
            "Istanbul" => Revision::Istanbul,
            "Berlin" => Revision::Berlin,
            "London" => Revision::London,
            "Merge" | "Paris" => Revision::Paris,
            "Shanghai" => Revision::Shanghai,
            "Cancun" => Revision::Cancun,
            "Prague" => Revision::Prague,
            "Osaka" => Revision::Osaka,
            _ => return Err(RevisionError::Unknown(s.to_owned())),
        };
        Ok(rev)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revisions_totally_ordered() {
        for pair in Revision::ALL.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_thresholds() {
        assert!(!Revision::Istanbul.is_enabled_in(Revision::MERGE));
        assert!(Revision::Paris.is_enabled_in(Revision::MERGE));
        assert!(Revision::Shanghai.is_enabled_in(Revision::WITHDRAWALS));
        assert!(!Revision::Paris.is_enabled_in(Revision::WITHDRAWALS));
        assert!(Revision::Osaka.is_enabled_in(Revision::REQUESTS));
        assert!(Revision::Homestead < Revision::STATUS_RECEIPTS);
    }

    #[test]
    fn test_parse_roundtrips_names() {
        for rev in Revision::ALL {
            assert_eq!(rev.name().parse::<Revision>(), Ok(rev));
        }
        assert_eq!("Paris".parse::<Revision>(), Ok(Revision::Paris));
    }

    #[test]
    fn test_parse_unknown() {
        let err = "Bogus".parse::<Revision>().unwrap_err();
        assert_eq!(err.to_string(), "unknown revision: Bogus");
    }
}
