//! Golden journal files.
//!
//! Each vector is a journal as it may be found on disk, together with the
//! tree it must replay to. Any reader of the format has to agree on these.

use docjournal::DocumentStore;
use docjournal_core::Map;

use crate::fixtures::TestJournal;

/// A golden journal.
#[derive(Debug, Clone)]
pub struct GoldenJournal {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// File contents.
    pub journal: &'static str,
    /// The replayed tree, as YAML.
    pub expected: &'static str,
}

impl GoldenJournal {
    /// The expected tree.
    pub fn expected_tree(&self) -> Map {
        serde_yaml::from_str(self.expected).expect("golden tree parses")
    }
}

/// Get all golden journals.
pub fn all_journals() -> Vec<GoldenJournal> {
    vec![
        GoldenJournal {
            name: "empty file",
            journal: "",
            expected: "{}",
        },
        GoldenJournal {
            name: "snapshot only",
            journal: "b: 1\na: 2\n",
            expected: "a: 2\nb: 1\n",
        },
        GoldenJournal {
            name: "top-level set and delete",
            journal: "a: a\nb: b\nc: c\n---\n[\"set\",[],\"a\",\"AA\"]\n---\n[\"delete\",[],\"b\"]",
            expected: "a: AA\nc: c\n",
        },
        GoldenJournal {
            name: "records without a snapshot",
            journal: "\n---\n[\"set\",[],\"n\",1]\n---\n[\"set\",[],\"list\",[]]\n---\n[\"insert\",[\"list\"],0,\"x\"]",
            expected: "list: [x]\nn: 1\n",
        },
        GoldenJournal {
            name: "sequence edits",
            journal: "list: [20, 30, 40]\n---\n[\"delete\",[\"list\"],1]\n---\n[\"insert\",[\"list\"],0,10]\n---\n[\"insert\",[\"list\"],3,50]",
            expected: "list: [10, 20, 40, 50]\n",
        },
        GoldenJournal {
            name: "deep path",
            journal: "config:\n  servers:\n  - name: a\n    port: 1\n  - name: b\n    port: 2\n---\n[\"set\",[\"config\",\"servers\",1],\"port\",8080]",
            expected: "config:\n  servers:\n  - {name: a, port: 1}\n  - {name: b, port: 8080}\n",
        },
        GoldenJournal {
            name: "snapshot resets the tree",
            journal: "a: 1\n---\n[\"set\",[],\"b\",2]\n---\nc: 3\n---\n[\"set\",[],\"d\",4]",
            expected: "c: 3\nd: 4\n",
        },
        GoldenJournal {
            name: "end markers and blank lines",
            journal: "a: 1\n...\n---\n\n[\"set\",[],\"a\",2]\n\n---\n[\"set\",[],\"b\",null]\n",
            expected: "a: 2\nb: null\n",
        },
        GoldenJournal {
            name: "unicode",
            journal: "greeting: \"gr\\u00fc\\u00df\"\n---\n[\"set\",[],\"farewell\",\"tsch\u{fc}ss\"]",
            expected: "farewell: tschüss\ngreeting: grüß\n",
        },
    ]
}

/// Replay every golden journal and report whether it produced the expected
/// tree. Returns `(name, matches)` per vector.
pub fn verify_all_journals() -> Vec<(String, bool)> {
    all_journals()
        .iter()
        .map(|vector| {
            let journal = TestJournal::with_contents(vector.journal);
            let store = DocumentStore::open(journal.path());
            let matches = match store {
                Ok(store) => store.tree() == &vector.expected_tree(),
                Err(_) => false,
            };
            (vector.name.to_string(), matches)
        })
        .collect()
}
