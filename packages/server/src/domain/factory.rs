//! Factory: ドメインオブジェクトの生成

use rand::{Rng, seq::IndexedRandom};

use super::{DisplayName, ValidationError};

const ADJECTIVES: &[&str] = &[
    "Swift", "Bright", "Silent", "Noble", "Mystic", "Cosmic", "Shadow", "Golden", "Mighty",
    "Bold", "Fierce", "Strong", "Brave", "Wild", "Steel", "Iron", "Crystal", "Storm", "Thunder",
    "Frost", "Flame", "Ocean", "Wind", "Earth", "Ancient", "Lunar", "Solar", "Astral",
    "Ethereal", "Divine", "Sacred", "Arcane", "Crimson", "Azure", "Violet", "Emerald", "Silver",
    "Obsidian", "Jade", "Ruby", "Clever", "Wise", "Cunning", "Loyal", "Free", "Pure", "Dark",
    "Light",
];

const NOUNS: &[&str] = &[
    "Fox", "Eagle", "Wolf", "Phoenix", "Dragon", "Tiger", "Raven", "Lion", "Griffin", "Sphinx",
    "Pegasus", "Unicorn", "Kraken", "Hydra", "Chimera", "Basilisk", "Hawk", "Panther", "Cobra",
    "Shark", "Falcon", "Viper", "Lynx", "Jaguar", "Star", "Moon", "Sun", "Comet", "Nova",
    "Galaxy", "Nebula", "Void", "Knight", "Warrior", "Guardian", "Hunter", "Blade", "Arrow",
    "Shield", "Crown", "Flame", "Storm", "Thunder", "Lightning", "Glacier", "Volcano", "Tornado",
    "Tsunami",
];

/// DisplayName の Factory
///
/// 形容詞 + 名詞 + 0〜999 の数字で表示名を生成する（例: `SwiftDragon123`）。
/// 乱数源は `rand::rng()`（OS エントロピーでシードされた CSPRNG）。
/// 一意性は保証しない（表示名はキーではない）。
pub struct DisplayNameFactory;

impl DisplayNameFactory {
    pub fn generate() -> Result<DisplayName, ValidationError> {
        let mut rng = rand::rng();
        let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("Swift");
        let noun = NOUNS.choose(&mut rng).copied().unwrap_or("Fox");
        let number: u16 = rng.random_range(0..1000);

        DisplayName::new(format!("{}{}{}", adjective, noun, number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_produces_valid_names() {
        // テスト項目: 生成された名前は常にパターン・長さ制約を満たす
        // given / when:
        let names: Vec<DisplayName> = (0..500)
            .map(|_| DisplayNameFactory::generate().unwrap())
            .collect();

        // then (期待する結果):
        for name in &names {
            assert!(DisplayName::new(name.as_str().to_string()).is_ok());
        }
    }

    #[test]
    fn test_generate_uses_word_lists_and_number() {
        // テスト項目: 名前は形容詞で始まり、0〜999 の数字で終わる
        // given / when:
        let name = DisplayNameFactory::generate().unwrap();
        let value = name.as_str();

        // then (期待する結果):
        assert!(ADJECTIVES.iter().any(|a| value.starts_with(a)));
        let digits: String = value.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
        assert!(!digits.is_empty() && digits.len() <= 3);
    }

    #[test]
    fn test_longest_combination_fits() {
        // テスト項目: 最長の形容詞 + 最長の名詞 + 3 桁でも 20 文字以内に収まる
        // given (前提条件):
        let longest_adjective = ADJECTIVES.iter().map(|a| a.len()).max().unwrap();
        let longest_noun = NOUNS.iter().map(|n| n.len()).max().unwrap();

        // when / then:
        assert!(longest_adjective + longest_noun + 3 <= DisplayName::MAX_LEN);
    }
}
