//! Security identifier strings for POSIX identities.
//!
//! Users map to `S-1-22-1-<uid>`, groups to `S-1-22-2-<gid>` and the world
//! class to the well-known `S-1-1-0`.

use std::fmt::{self, Display, Formatter};

const USER_PREFIX: &str = "S-1-22-1-";
const GROUP_PREFIX: &str = "S-1-22-2-";
const EVERYONE: &str = "S-1-1-0";

/// Identity named by a security identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    /// A user id.
    User(u32),
    /// A group id.
    Group(u32),
    /// Everyone.
    Everyone,
}

impl Identity {
    /// Parse a SID string; `None` when it names no mappable identity.
    #[must_use]
    pub fn parse(sid: &str) -> Option<Self> {
        let sid = sid.trim();
        if sid.eq_ignore_ascii_case(EVERYONE) {
            return Some(Self::Everyone);
        }
        if let Some(uid) = strip_prefix_ignore_case(sid, USER_PREFIX) {
            return uid.parse().ok().map(Self::User);
        }
        strip_prefix_ignore_case(sid, GROUP_PREFIX)
            .and_then(|gid| gid.parse().ok())
            .map(Self::Group)
    }
}

impl Display for Identity {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(uid) => write!(formatter, "{USER_PREFIX}{uid}"),
            Self::Group(gid) => write!(formatter, "{GROUP_PREFIX}{gid}"),
            Self::Everyone => formatter.write_str(EVERYONE),
        }
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_forms() {
        assert_eq!(Identity::parse("S-1-22-1-1000"), Some(Identity::User(1000)));
        assert_eq!(Identity::parse("s-1-22-2-42"), Some(Identity::Group(42)));
        assert_eq!(Identity::parse(" S-1-1-0 "), Some(Identity::Everyone));
    }

    #[test]
    fn rejects_foreign_sids() {
        assert!(Identity::parse("S-1-5-32-544").is_none());
        assert!(Identity::parse("S-1-22-1-").is_none());
        assert!(Identity::parse("S-1-22-1-abc").is_none());
        assert!(Identity::parse("").is_none());
    }

    #[test]
    fn display_round_trips() {
        for identity in [Identity::User(0), Identity::Group(7), Identity::Everyone] {
            assert_eq!(Identity::parse(&identity.to_string()), Some(identity));
        }
    }
}
