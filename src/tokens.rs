//! Token types, token values and the configured token catalog.

use crate::rng::TokenSource;
use serde::Deserialize;

/// Token kinds. The set is closed; a catalog may use a subset of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Milk,
    Apple,
    Orange,
    Bread,
    Lettuce,
    Coconut,
    Carambola,
}

impl TokenType {
    pub const ALL: [Self; 7] = [
        Self::Milk,
        Self::Apple,
        Self::Orange,
        Self::Bread,
        Self::Lettuce,
        Self::Coconut,
        Self::Carambola,
    ];

    /// Colour index 0..7 for theme.token_color().
    pub fn color_index(self) -> u8 {
        match self {
            Self::Milk => 0,
            Self::Apple => 1,
            Self::Orange => 2,
            Self::Bread => 3,
            Self::Lettuce => 4,
            Self::Coconut => 5,
            Self::Carambola => 6,
        }
    }

    /// Single-character glyph drawn inside the cell so types stay distinguishable without colour.
    pub fn glyph(self) -> char {
        match self {
            Self::Milk => 'M',
            Self::Apple => 'A',
            Self::Orange => 'O',
            Self::Bread => 'B',
            Self::Lettuce => 'L',
            Self::Coconut => 'C',
            Self::Carambola => 'K',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Milk => "Milk",
            Self::Apple => "Apple",
            Self::Orange => "Orange",
            Self::Bread => "Bread",
            Self::Lettuce => "Lettuce",
            Self::Coconut => "Coconut",
            Self::Carambola => "Carambola",
        }
    }

    /// Score used when no score table is configured.
    pub fn default_score(self) -> u32 {
        match self {
            Self::Milk | Self::Lettuce => 5,
            Self::Apple | Self::Orange => 10,
            Self::Bread => 15,
            Self::Coconut => 20,
            Self::Carambola => 25,
        }
    }
}

/// A single matchable piece. Carries no position: the cell holding it is the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenType,
    pub score: u32,
}

impl Token {
    pub const fn new(kind: TokenType, score: u32) -> Self {
        Self { kind, score }
    }
}

/// The token set new tokens are drawn from, with the score of each type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCatalog {
    entries: Vec<Token>,
}

impl Default for TokenCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl TokenCatalog {
    /// All seven types with their default scores.
    pub fn standard() -> Self {
        Self::from_scores(TokenType::ALL.iter().map(|&k| (k, k.default_score())))
    }

    /// Build a catalog from (type, score) pairs. Later duplicates replace earlier ones;
    /// entries keep the enumeration order so draws do not depend on input order.
    pub fn from_scores(scores: impl IntoIterator<Item = (TokenType, u32)>) -> Self {
        let mut entries: Vec<Token> = Vec::with_capacity(TokenType::ALL.len());
        for (kind, score) in scores {
            match entries.iter_mut().find(|t| t.kind == kind) {
                Some(existing) => existing.score = score,
                None => entries.push(Token::new(kind, score)),
            }
        }
        entries.sort_by_key(|t| t.kind);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.entries
    }

    #[cfg(test)]
    pub fn token(&self, kind: TokenType) -> Option<Token> {
        self.entries.iter().copied().find(|t| t.kind == kind)
    }

    /// Draw a token uniformly from the catalog.
    pub fn draw(&self, source: &mut dyn TokenSource) -> Token {
        self.entries[source.random_int(self.entries.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedSource;

    #[test]
    fn test_standard_catalog_has_all_types() {
        let catalog = TokenCatalog::standard();
        assert_eq!(catalog.len(), 7);
        assert_eq!(
            catalog.token(TokenType::Carambola),
            Some(Token::new(TokenType::Carambola, 25))
        );
    }

    #[test]
    fn test_from_scores_sorts_and_dedups() {
        let catalog = TokenCatalog::from_scores([
            (TokenType::Bread, 1),
            (TokenType::Milk, 2),
            (TokenType::Bread, 3),
        ]);
        let kinds: Vec<_> = catalog.tokens().iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TokenType::Milk, TokenType::Bread]);
        assert_eq!(catalog.token(TokenType::Bread).map(|t| t.score), Some(3));
    }

    #[test]
    fn test_draw_indexes_by_source() {
        let catalog = TokenCatalog::standard();
        let mut source = ScriptedSource::new([6, 0, 3]);
        assert_eq!(catalog.draw(&mut source).kind, TokenType::Carambola);
        assert_eq!(catalog.draw(&mut source).kind, TokenType::Milk);
        assert_eq!(catalog.draw(&mut source).kind, TokenType::Bread);
    }
}
