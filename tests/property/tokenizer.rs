//! Tokenizer and line-parser properties

use proptest::prelude::*;
use sfcli::shell::{parse_line, tokenize, Command};

fn word() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.,=-][A-Za-z0-9_.,='-]{0,12}"
}

proptest! {
    /// Plain words separated by any whitespace come back unchanged.
    #[test]
    fn plain_words_survive_tokenizing(
        words in prop::collection::vec(word(), 0..8),
        gap in "[ \t]{1,3}",
    ) {
        let line = words.join(&gap);
        prop_assert_eq!(tokenize(&line).unwrap(), words);
    }

    /// A double-quoted token keeps inner spaces, pipes and apostrophes.
    #[test]
    fn quoted_token_is_kept_whole(inner in "[A-Za-z' |]{0,20}") {
        let line = format!("search Account \"{}\"", inner);
        let tokens = tokenize(&line).unwrap();
        prop_assert_eq!(tokens.len(), 3);
        prop_assert_eq!(&tokens[2], &inner);
    }

    /// An opening quote with no partner is always rejected.
    #[test]
    fn unterminated_quote_is_an_error(inner in "[A-Za-z ]{0,20}") {
        let line = format!("show \"{}", inner);
        prop_assert!(tokenize(&line).is_err());
    }

    /// A bare unquoted pipe always becomes its own token.
    #[test]
    fn pipe_splits_tokens(left in word(), right in word()) {
        let tokens = tokenize(&format!("{}|{}", left, right)).unwrap();
        prop_assert_eq!(tokens, vec![left, "|".to_string(), right]);
    }

    /// Any positive number on its own line is a quick-select.
    #[test]
    fn bare_number_selects(n in 1usize..100_000) {
        prop_assert_eq!(parse_line(&n.to_string()).unwrap(), Some(Command::Select(n)));
    }

    /// `query` keeps the raw remainder, quotes included.
    #[test]
    fn query_keeps_raw_soql(name in "[A-Za-z' ]{1,20}") {
        let soql = format!("SELECT Id FROM Account WHERE Name = '{}'", name);
        let parsed = parse_line(&format!("query {}", soql)).unwrap();
        prop_assert_eq!(parsed, Some(Command::Query { soql: soql.trim().to_string() }));
    }
}
