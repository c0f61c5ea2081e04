use std::collections::HashSet;

/// Read-only set of accepted API tokens
///
/// Built once at startup and shared with the request handler.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    tokens: HashSet<String>,
}

impl CredentialStore {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `token` is one of the accepted tokens
    pub fn is_authenticated(&self, token: &str) -> bool {
        !token.is_empty() && self.tokens.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
