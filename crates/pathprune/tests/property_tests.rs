//! Property-based tests for pruning
//!
//! These tests use proptest to verify:
//! 1. Identity: pruning with an empty set changes nothing
//! 2. Exclusion: excluded paths disappear, everything else survives
//! 3. Idempotence: pruning twice equals pruning once
//! 4. Wildcards only ever grow the exclusion set as patterns are added

use proptest::prelude::*;
use serde_json::Value;

use pathprune::{
    enumerate_paths, expand_wildcards, measure, prune, Document, PathSet, XmlDocument,
    XmlElement,
};

fn arb_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(str::to_string)
}

fn arb_element() -> impl Strategy<Value = XmlElement> {
    let leaf = (arb_name(), "[a-z &<]{0,6}").prop_map(|(name, text)| {
        let element = XmlElement::new(name);
        if text.is_empty() {
            element
        } else {
            element.with_text(text)
        }
    });

    leaf.prop_recursive(5, 64, 5, |inner| {
        (arb_name(), prop::collection::vec(inner, 0..5)).prop_map(|(name, children)| {
            children
                .into_iter()
                .fold(XmlElement::new(name).with_text("\n"), XmlElement::with_child)
        })
    })
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::from),
        "[a-z]{0,4}".prop_map(Value::from),
    ];

    leaf.prop_recursive(5, 64, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::vec((arb_name(), inner), 0..5)
                .prop_map(|pairs| Value::Object(pairs.into_iter().collect())),
        ]
    })
}

/// Shell patterns without `**`, which globset reserves for whole components
fn arb_pattern() -> impl Strategy<Value = String> {
    "([abcd?/]|\\*[abcd?/]){0,3}\\*?"
}

fn arb_document() -> impl Strategy<Value = Document> {
    prop_oneof![
        arb_element().prop_map(|root| Document::Xml(XmlDocument { root })),
        arb_json().prop_map(Document::Json),
    ]
}

/// A document plus an exclusion set drawn from its own paths
fn arb_document_and_exclusion() -> impl Strategy<Value = (Document, PathSet)> {
    arb_document().prop_flat_map(|doc| {
        let root = match &doc {
            Document::Xml(xml) => Some(xml.root.name.clone()),
            Document::Json(_) => None,
        };
        let paths: Vec<String> = enumerate_paths(&doc)
            .into_iter()
            .filter(|path| Some(path) != root.as_ref())
            .collect();
        let len = paths.len();
        (
            Just(doc),
            prop::sample::subsequence(paths, 0..=len)
                .prop_map(|chosen| chosen.into_iter().collect::<PathSet>()),
        )
    })
}

fn has_excluded_ancestor(path: &str, excluded: &PathSet) -> bool {
    path.match_indices('/')
        .any(|(idx, _)| path.get(..idx).is_some_and(|prefix| excluded.contains(prefix)))
}

proptest! {
    #[test]
    fn empty_exclusion_is_identity(doc in arb_document()) {
        let pruned = prune(&doc, &PathSet::new());
        prop_assert_eq!(&pruned, &doc);
        prop_assert_eq!(measure(&pruned).ok(), measure(&doc).ok());
        prop_assert_eq!(pruned.to_bytes().ok(), doc.to_bytes().ok());
    }

    #[test]
    fn excluded_paths_vanish_and_others_survive((doc, excluded) in arb_document_and_exclusion()) {
        let remaining = enumerate_paths(&prune(&doc, &excluded));

        for path in &excluded {
            prop_assert!(!remaining.contains(path), "{} still present", path);
        }
        for path in enumerate_paths(&doc) {
            if !excluded.contains(&path) && !has_excluded_ancestor(&path, &excluded) {
                prop_assert!(remaining.contains(&path), "{} went missing", path);
            }
        }
    }

    #[test]
    fn pruning_is_idempotent((doc, excluded) in arb_document_and_exclusion()) {
        let once = prune(&doc, &excluded);
        let twice = prune(&once, &excluded);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn pruning_never_grows_the_document((doc, excluded) in arb_document_and_exclusion()) {
        let before = measure(&doc).unwrap();
        let after = measure(&prune(&doc, &excluded)).unwrap();
        prop_assert!(after <= before);
    }

    #[test]
    fn wildcards_are_monotonic(
        doc in arb_document(),
        base in prop::collection::vec(arb_pattern(), 0..3),
        extra in prop::collection::vec(arb_pattern(), 0..3),
    ) {
        let known = enumerate_paths(&doc);
        let mut wider = base.clone();
        wider.extend(extra);

        let narrow = expand_wildcards(&known, &base).unwrap();
        let broad = expand_wildcards(&known, &wider).unwrap();
        prop_assert!(narrow.is_subset(&broad));
    }
}
