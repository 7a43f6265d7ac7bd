//! Closed vocabularies mapping word strings to token ids.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;
use rustc_hash::FxHashMap;

use crate::corpus::ensure_exists;
use crate::error::{AcceptabilityError, Result};
use crate::special_tokens::{reserved_index, RESERVED, UNK_INDEX};

/// Token identifier used throughout the crate.
pub type TokenId = u32;

/// String to id mapping whose lookups fall back to the unknown index instead of failing.
#[derive(Debug, Clone, Default)]
pub struct TokenIndex {
    map: FxHashMap<String, TokenId>,
}

impl TokenIndex {
    /// Returns the id registered for `token`, if any.
    #[must_use]
    pub fn get(&self, token: &str) -> Option<TokenId> {
        self.map.get(token).copied()
    }

    /// Returns the id registered for `token`, or [`UNK_INDEX`].
    #[must_use]
    pub fn or_default(&self, token: &str) -> TokenId {
        self.get(token).unwrap_or(UNK_INDEX)
    }

    /// Number of distinct strings registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` when nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn insert(&mut self, token: String, id: TokenId) {
        self.map.insert(token, id);
    }
}

/// Vocabulary read from a one-token-per-line file, prefixed by the reserved control tokens.
#[must_use]
#[derive(Debug, Clone)]
pub struct Vocabulary {
    itos: Vec<String>,
    stoi: TokenIndex,
}

impl Vocabulary {
    /// Loads a vocabulary file, assigning ids from 3 upward in read order.
    ///
    /// Lines are trimmed and not deduplicated: a repeated token occupies a new id and later
    /// lines win the lookup.  This includes reserved tokens listed in the file, which then
    /// resolve to their file index; unknown words still map to [`UNK_INDEX`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        ensure_exists(path)?;
        let file =
            File::open(path).map_err(|err| AcceptabilityError::io(err, Some(path.into())))?;
        let mut lines = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|err| AcceptabilityError::io(err, Some(path.into())))?;
            lines.push(line.trim().to_string());
        }
        let vocab = Self::from_tokens(lines)?;
        debug!(
            "loaded vocabulary of {} entries from {}",
            vocab.size(),
            path.display()
        );
        Ok(vocab)
    }

    /// Builds a vocabulary from tokens already held in memory, with the same rules as
    /// [`Vocabulary::from_file`].
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut itos: Vec<String> = RESERVED.iter().map(|token| (*token).to_string()).collect();
        let mut stoi = TokenIndex::default();
        for (idx, token) in RESERVED.iter().enumerate() {
            stoi.insert((*token).to_string(), idx as TokenId);
        }

        for token in tokens {
            let token = token.into();
            let id = TokenId::try_from(itos.len()).map_err(|_| {
                AcceptabilityError::InvalidConfig("vocabulary size exceeds u32::MAX".into())
            })?;
            if let Some(reserved) = reserved_index(&token) {
                debug!("reserved token {token} (id {reserved}) remapped to {id}");
            }
            stoi.insert(token.clone(), id);
            itos.push(token);
        }
        Ok(Self { itos, stoi })
    }

    /// Returns the id of `token`, or the unknown index for unseen tokens.
    #[must_use]
    pub fn index_of(&self, token: &str) -> TokenId {
        self.stoi.or_default(token)
    }

    /// Returns the token string stored at `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index >= self.size()`.
    #[must_use]
    pub fn token_at(&self, index: usize) -> &str {
        &self.itos[index]
    }

    /// Checked variant of [`Vocabulary::token_at`].
    #[must_use]
    pub fn get_token(&self, index: usize) -> Option<&str> {
        self.itos.get(index).map(String::as_str)
    }

    /// Number of entries including the reserved tokens.
    #[must_use]
    pub fn size(&self) -> usize {
        self.itos.len()
    }

    /// Returns the underlying lookup table.
    #[must_use]
    pub fn stoi(&self) -> &TokenIndex {
        &self.stoi
    }

    /// Maps each word through [`Vocabulary::index_of`].
    pub fn encode<'a, I>(&self, words: I) -> Vec<TokenId>
    where
        I: IntoIterator<Item = &'a str>,
    {
        words.into_iter().map(|word| self.index_of(word)).collect()
    }
}
