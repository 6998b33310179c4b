//! Query tokens as handed over by the tokenizer.

use fttrie_common::{Result, verify_arg};

/// How the query token is matched against the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryMode {
    /// The token must be present verbatim.
    #[default]
    Exact,
    /// The token may contain a wildcard operator (`.`, `.*`, `.+` or `.?`).
    Wildcard,
    /// Tokens within a bounded edit distance match.
    Fuzzy,
}

/// Operator flags attached to a token by the tokenizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryFlags {
    pub fuzzy: bool,
    pub wildcard: bool,
    /// Skip position lists.
    pub fast: bool,
    /// Per-query fuzzy edit budget; 0 defers to the index options.
    pub max_errors: u32,
}

/// A single-token index query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtQuery {
    token: Vec<u8>,
    mode: QueryMode,
    fast: bool,
    max_errors: u32,
}

impl FtQuery {
    pub fn exact(token: impl Into<Vec<u8>>) -> FtQuery {
        FtQuery {
            token: token.into(),
            mode: QueryMode::Exact,
            fast: false,
            max_errors: 0,
        }
    }

    pub fn wildcard(token: impl Into<Vec<u8>>) -> FtQuery {
        FtQuery {
            mode: QueryMode::Wildcard,
            ..Self::exact(token)
        }
    }

    /// A fuzzy query; `max_errors == 0` defers to the index options.
    pub fn fuzzy(token: impl Into<Vec<u8>>, max_errors: u32) -> FtQuery {
        FtQuery {
            mode: QueryMode::Fuzzy,
            max_errors,
            ..Self::exact(token)
        }
    }

    /// Builds a query from tokenizer flags.
    ///
    /// # Errors
    ///
    /// Fails with an invalid-argument error if both `fuzzy` and `wildcard` are set.
    pub fn from_flags(token: impl Into<Vec<u8>>, flags: QueryFlags) -> Result<FtQuery> {
        verify_arg!(flags, !(flags.fuzzy && flags.wildcard));
        let query = if flags.fuzzy {
            FtQuery::fuzzy(token, flags.max_errors)
        } else if flags.wildcard {
            FtQuery::wildcard(token)
        } else {
            FtQuery::exact(token)
        };
        Ok(query.with_fast(flags.fast))
    }

    /// In fast mode results carry pre-values only.
    pub fn with_fast(mut self, fast: bool) -> FtQuery {
        self.fast = fast;
        self
    }

    pub fn token(&self) -> &[u8] {
        &self.token
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    pub fn is_fast(&self) -> bool {
        self.fast
    }

    pub fn max_errors(&self) -> u32 {
        self.max_errors
    }
}

#[cfg(test)]
mod tests {
    use fttrie_common::error::ErrorKind;

    use super::*;

    #[test]
    fn test_from_flags() {
        let q = FtQuery::from_flags(
            "kitten",
            QueryFlags {
                fuzzy: true,
                max_errors: 2,
                fast: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(q.mode(), QueryMode::Fuzzy);
        assert_eq!(q.max_errors(), 2);
        assert!(q.is_fast());

        let q = FtQuery::from_flags("c.t", QueryFlags::default()).unwrap();
        assert_eq!(q.mode(), QueryMode::Exact);
        assert_eq!(q.token(), b"c.t");
    }

    #[test]
    fn test_conflicting_flags_rejected() {
        let flags = QueryFlags {
            fuzzy: true,
            wildcard: true,
            ..Default::default()
        };
        let err = FtQuery::from_flags("x", flags).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
    }
}
