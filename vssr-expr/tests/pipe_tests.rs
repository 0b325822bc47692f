use proptest::prelude::*;
use vssr_expr::{FilterCall, split_pipeline};

fn ident() -> impl Strategy<Value = String> {
    "[a-z_$][a-zA-Z0-9_]{0,8}"
}

/// Quoted string literal whose body may contain separators.
fn quoted() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z |,(){}\\[\\]]{0,10}".prop_map(|s| format!("'{s}'")),
        "[a-z |,(){}\\[\\]]{0,10}".prop_map(|s| format!("\"{s}\"")),
    ]
}

fn argument() -> impl Strategy<Value = String> {
    prop_oneof![ident(), quoted(), "[0-9]{1,4}".prop_map(String::from)]
}

proptest! {
    #[test]
    fn heads_without_pipes_are_split_on_commas(heads in prop::collection::vec(argument(), 1..5)) {
        let source = heads.join(", ");
        let pipeline = split_pipeline(&source);
        prop_assert_eq!(pipeline.expressions, heads);
        prop_assert!(pipeline.filters.is_empty());
    }

    #[test]
    fn filters_and_their_arguments_are_recovered(
        head in argument(),
        filters in prop::collection::vec((ident(), prop::collection::vec(argument(), 0..4)), 1..4),
    ) {
        let mut source = head.clone();
        for (name, args) in &filters {
            source.push_str(" | ");
            source.push_str(name);
            if !args.is_empty() {
                source.push('(');
                source.push_str(&args.join(", "));
                source.push(')');
            }
        }

        let pipeline = split_pipeline(&source);
        prop_assert_eq!(pipeline.expressions, vec![head]);
        let expected: Vec<_> = filters
            .into_iter()
            .map(|(name, args)| FilterCall::new(name, args))
            .collect();
        prop_assert_eq!(pipeline.filters, expected);
    }

    #[test]
    fn logical_or_never_splits(left in ident(), right in ident()) {
        let source = format!("{left} || {right}");
        let pipeline = split_pipeline(&source);
        prop_assert!(!pipeline.has_filters());
        prop_assert_eq!(pipeline.expressions, vec![source.clone()]);
    }

    #[test]
    fn never_panics(source in "\\PC{0,40}") {
        let _ = split_pipeline(&source);
    }
}
