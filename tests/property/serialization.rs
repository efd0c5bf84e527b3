//! Property-based serialization round-trip tests.
//!
//! Uses proptest to verify:
//! 1. Any valid `Task` survives a JSON encode → decode round-trip.
//! 2. Any valid `ClientIntent` and `ServerFact` round-trip through the codec.
//! 3. Arbitrary text never causes a panic in the decoders (they return `Err`
//!    gracefully).
//! 4. The event envelope keeps the board vocabulary (`taskId`, `newStatus`,
//!    `createdAt`) on every generated message.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use taskboard_proto::codec;
use taskboard_proto::protocol::{ClientIntent, ServerFact};
use taskboard_proto::task::{
    Attachment, Category, Priority, Task, TaskDraft, TaskId, TaskPatch, TaskStatus,
};

// --- Strategies for protocol types ---

/// Strategy for generating arbitrary `TaskId` values.
fn arb_task_id() -> impl Strategy<Value = TaskId> {
    any::<u64>().prop_map(TaskId::new)
}

/// Strategy for generating arbitrary `TaskStatus` values.
fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Todo),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Done),
    ]
}

/// Strategy for generating arbitrary `Priority` values.
fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Low),
        Just(Priority::Medium),
        Just(Priority::High),
    ]
}

/// Strategy for generating arbitrary `Category` values.
fn arb_category() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::Bug),
        Just(Category::Feature),
        Just(Category::Enhancement),
    ]
}

/// Strategy for free-form text fields (titles, descriptions).
fn arb_text() -> impl Strategy<Value = String> {
    "[^\x00]{0,64}"
}

/// Strategy for generating arbitrary `Attachment` descriptors.
fn arb_attachment() -> impl Strategy<Value = Attachment> {
    ("[a-z0-9]{1,16}", "(png|jpg|gif|pdf|docx)", any::<u32>()).prop_map(|(stem, ext, size)| {
        Attachment {
            filename: format!("{stem}.{ext}"),
            path: format!("/uploads/{stem}.{ext}"),
            size: u64::from(size),
        }
    })
}

/// Strategy for millisecond-precision creation timestamps.
fn arb_created_at() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800_000).prop_map(|ms| Utc.timestamp_millis_opt(ms).single().unwrap())
}

/// Strategy for generating arbitrary `Task` records.
fn arb_task() -> impl Strategy<Value = Task> {
    (
        arb_task_id(),
        arb_text(),
        arb_text(),
        arb_status(),
        arb_priority(),
        arb_category(),
        prop::collection::vec(arb_attachment(), 0..3),
        arb_created_at(),
    )
        .prop_map(
            |(id, title, description, status, priority, category, attachments, created_at)| Task {
                id,
                title,
                description,
                status,
                priority,
                category,
                attachments,
                created_at,
            },
        )
}

/// Strategy for generating arbitrary `TaskDraft` values.
fn arb_draft() -> impl Strategy<Value = TaskDraft> {
    (
        arb_text(),
        arb_text(),
        arb_status(),
        arb_priority(),
        arb_category(),
        prop::collection::vec(arb_attachment(), 0..3),
    )
        .prop_map(
            |(title, description, status, priority, category, attachments)| TaskDraft {
                title,
                description,
                status,
                priority,
                category,
                attachments,
            },
        )
}

/// Strategy for generating arbitrary `TaskPatch` values.
fn arb_patch() -> impl Strategy<Value = TaskPatch> {
    (
        arb_task_id(),
        prop::option::of(arb_text()),
        prop::option::of(arb_text()),
        prop::option::of(arb_status()),
        prop::option::of(arb_priority()),
        prop::option::of(arb_category()),
        prop::option::of(prop::collection::vec(arb_attachment(), 0..3)),
    )
        .prop_map(
            |(id, title, description, status, priority, category, attachments)| TaskPatch {
                id,
                title,
                description,
                status,
                priority,
                category,
                attachments,
            },
        )
}

/// Strategy for generating arbitrary `ClientIntent` values.
fn arb_intent() -> impl Strategy<Value = ClientIntent> {
    prop_oneof![
        arb_draft().prop_map(ClientIntent::Create),
        arb_patch().prop_map(ClientIntent::Update),
        (arb_task_id(), arb_status()).prop_map(|(task_id, new_status)| ClientIntent::Move {
            task_id,
            new_status,
        }),
        arb_task_id().prop_map(ClientIntent::Delete),
    ]
}

/// Strategy for generating arbitrary `ServerFact` values.
fn arb_fact() -> impl Strategy<Value = ServerFact> {
    prop_oneof![
        prop::collection::vec(arb_task(), 0..4).prop_map(ServerFact::Sync),
        arb_task().prop_map(ServerFact::Created),
        arb_task().prop_map(ServerFact::Updated),
        (arb_task_id(), arb_status()).prop_map(|(task_id, new_status)| ServerFact::Moved {
            task_id,
            new_status,
        }),
        arb_task_id().prop_map(ServerFact::Deleted),
        arb_text().prop_map(|message| ServerFact::Error { message }),
    ]
}

// --- Property tests ---

proptest! {
    /// Any valid Task survives a JSON encode → decode round-trip.
    #[test]
    fn task_round_trip(task in arb_task()) {
        let json = serde_json::to_string(&task).unwrap();
        let decoded: Task = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(task, decoded);
    }

    /// Any valid ClientIntent survives a codec round-trip.
    #[test]
    fn intent_round_trip(intent in arb_intent()) {
        let text = codec::encode_intent(&intent).unwrap();
        let decoded = codec::decode_intent(&text).unwrap();
        prop_assert_eq!(intent, decoded);
    }

    /// Any valid ServerFact survives a codec round-trip.
    #[test]
    fn fact_round_trip(fact in arb_fact()) {
        let text = codec::encode_fact(&fact).unwrap();
        let decoded = codec::decode_fact(&text).unwrap();
        prop_assert_eq!(fact, decoded);
    }

    /// Arbitrary text never panics the intent decoder.
    #[test]
    fn decode_intent_never_panics(text in "\\PC*") {
        let _ = codec::decode_intent(&text);
    }

    /// Arbitrary text never panics the fact decoder.
    #[test]
    fn decode_fact_never_panics(text in "\\PC*") {
        let _ = codec::decode_fact(&text);
    }

    /// Move messages always carry the board's camelCase envelope keys.
    #[test]
    fn move_intent_uses_board_vocabulary(task_id in arb_task_id(), status in arb_status()) {
        let intent = ClientIntent::Move { task_id, new_status: status };
        let text = codec::encode_intent(&intent).unwrap();
        prop_assert!(text.contains("\"taskId\""));
        prop_assert!(text.contains("\"newStatus\""));
        prop_assert!(text.contains("\"task:move\""));
    }

    /// Broadcast task facts always stamp creation time under `createdAt`.
    #[test]
    fn created_fact_uses_created_at_key(task in arb_task()) {
        let text = codec::encode_fact(&ServerFact::Created(task)).unwrap();
        prop_assert!(text.contains("\"createdAt\""));
    }
}
