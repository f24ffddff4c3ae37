use proptest::prelude::*;

use logsieve::config::ParserConfig;
use logsieve::stream::Session;
use logsieve::{Pattern, PatternMode};

fn session() -> Session {
    Session::new(&ParserConfig::default()).expect("default config")
}

fn row_texts(session: &Session) -> Vec<String> {
    session
        .rows()
        .iter()
        .map(|row| row.text.clone())
        .collect()
}

fn filtered_flags(session: &Session) -> Vec<bool> {
    session.rows().iter().map(|row| row.filtered).collect()
}

proptest! {
    /// Ingesting a text whole or split at any point yields the same settled
    /// state: same rows, same pending rest, same source and offset index.
    #[test]
    fn fragment_equivalence(
        text in "[a-zA-Z0-9 \n\r]{0,48}",
        split in any::<prop::sample::Index>(),
    ) {
        let k = split.index(text.len() + 1);

        let mut whole = session();
        whole.create(&text);

        let mut split_session = session();
        split_session.create(&text[..k]);
        split_session.append(&text[k..]);

        prop_assert_eq!(row_texts(&whole), row_texts(&split_session));
        prop_assert_eq!(whole.rest(), split_session.rest());
        prop_assert_eq!(whole.source(), split_session.source());
        prop_assert_eq!(
            whole.offset_index().ends(),
            split_session.offset_index().ends()
        );
    }

    /// A text-mode active filter is insensitive to fragmentation as well.
    #[test]
    fn fragment_equivalence_under_text_filter(
        text in "[a-be \n]{0,32}",
        split in any::<prop::sample::Index>(),
    ) {
        let k = split.index(text.len() + 1);
        let filter = Pattern::new(PatternMode::Text, "a");

        let mut whole = session();
        whole.set_active_filter(filter.clone());
        whole.create(&text);

        let mut split_session = session();
        split_session.set_active_filter(filter);
        split_session.create(&text[..k]);
        split_session.append(&text[k..]);

        prop_assert_eq!(filtered_flags(&whole), filtered_flags(&split_session));
    }

    /// Offset index keys stay strictly increasing across arbitrary fragment
    /// sequences, and each key resolves back to its own row position.
    #[test]
    fn offset_monotonicity(fragments in prop::collection::vec("[a-z0-9 \n]{0,12}", 0..8)) {
        let mut session = session();
        let mut fragments = fragments.into_iter();
        if let Some(first) = fragments.next() {
            session.create(&first);
        }
        for fragment in fragments {
            session.append(&fragment);
        }

        let ends = session.offset_index().ends();
        prop_assert_eq!(ends.len(), session.rows().len());
        for pair in ends.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
        for (row, &end) in ends.iter().enumerate() {
            prop_assert_eq!(session.offset_index().resolve(end), Some((row, end)));
        }
    }

    /// Row text never changes once the row exists, whatever arrives next.
    #[test]
    fn rows_are_append_only(
        first in "[a-z \n]{0,24}",
        second in "[a-z \n]{0,24}",
    ) {
        let mut session = session();
        session.create(&first);
        let before = row_texts(&session);

        session.append(&second);
        session.set_active_filter(Pattern::new(PatternMode::Regex, "[ab]+"));
        session.recompute_secondary_filters();

        let after = row_texts(&session);
        prop_assert_eq!(&after[..before.len()], &before[..]);
    }
}
