//! Reserved control tokens shared by every vocabulary.

use crate::vocab::TokenId;

/// Token substituted for words missing from the vocabulary.
pub const UNK_TOKEN: &str = "<unk>";
/// Token marking the start of a sentence.
pub const SOS_TOKEN: &str = "<s>";
/// Token marking the end of a sentence.
pub const EOS_TOKEN: &str = "</s>";

/// Index of [`UNK_TOKEN`].
pub const UNK_INDEX: TokenId = 0;
/// Index of [`SOS_TOKEN`].
pub const SOS_INDEX: TokenId = 1;
/// Index of [`EOS_TOKEN`].
pub const EOS_INDEX: TokenId = 2;

/// Reserved tokens in index order; they always occupy ids `0..RESERVED.len()`.
pub const RESERVED: [&str; 3] = [UNK_TOKEN, SOS_TOKEN, EOS_TOKEN];

/// Returns the reserved index for `token`, if it is one of the control tokens.
#[must_use]
pub fn reserved_index(token: &str) -> Option<TokenId> {
    RESERVED
        .iter()
        .position(|reserved| *reserved == token)
        .map(|idx| idx as TokenId)
}

/// Wraps a sentence's words with the start and end markers.
pub fn wrap_sentence<'a, I>(words: I) -> impl Iterator<Item = &'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    std::iter::once(SOS_TOKEN)
        .chain(words)
        .chain(std::iter::once(EOS_TOKEN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_indices_are_fixed() {
        assert_eq!(reserved_index("<unk>"), Some(UNK_INDEX));
        assert_eq!(reserved_index("<s>"), Some(SOS_INDEX));
        assert_eq!(reserved_index("</s>"), Some(EOS_INDEX));
        assert_eq!(reserved_index("the"), None);
    }

    #[test]
    fn wrap_adds_markers() {
        let wrapped: Vec<&str> = wrap_sentence(["a", "b"]).collect();
        assert_eq!(wrapped, vec!["<s>", "a", "b", "</s>"]);
    }
}
