//! Property tests for the literal parser.

use commlens_ingest::parse_literal;
use commlens_model::CellValue;
use proptest::prelude::*;

proptest! {
    #[test]
    fn never_panics_on_arbitrary_text(input in ".{0,64}") {
        let _ = parse_literal(&input);
    }

    #[test]
    fn quoted_words_parse_as_text_lists(words in proptest::collection::vec("[a-z ]{0,12}", 0..6)) {
        let literal = format!(
            "[{}]",
            words.iter().map(|w| format!("'{w}'")).collect::<Vec<_>>().join(", ")
        );
        let expected = CellValue::List(words.iter().map(|w| CellValue::text(w.as_str())).collect());
        prop_assert_eq!(parse_literal(&literal), Ok(expected));
    }
}
