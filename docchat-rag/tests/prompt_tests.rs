//! Prompt composition tests.

use docchat_model::Role;
use docchat_rag::{DEFAULT_SYSTEM_INSTRUCTION, PromptComposer};

#[test]
fn single_chunk_precedes_the_question() {
    let turns = PromptComposer::new()
        .compose(&["Paris is the capital of France."], "What is the capital of France?");

    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::System);
    assert_eq!(turns[0].content, DEFAULT_SYSTEM_INSTRUCTION);
    assert_eq!(turns[1].role, Role::User);
    assert_eq!(
        turns[1].content,
        "Paris is the capital of France.\n\nWhat is the capital of France?"
    );
}

#[test]
fn chunks_keep_retrieval_order() {
    let turns = PromptComposer::new().compose(&["best", "second", "third"], "q?");
    assert_eq!(turns[1].content, "best\n\nsecond\n\nthird\n\nq?");
}

#[test]
fn no_context_sends_the_bare_question() {
    let turns = PromptComposer::new().compose(&[], "Anything?");
    assert_eq!(turns[1].content, "Anything?");
}

#[test]
fn cap_drops_whole_chunks_from_the_bottom() {
    let composer = PromptComposer::new().with_max_context_chars(Some(20));
    let turns = composer.compose(&["0123456789", "abcdefgh", "never fits"], "q");
    assert_eq!(turns[1].content, "0123456789\n\nabcdefgh\n\nq");

    let exact = PromptComposer::new().with_max_context_chars(Some(22));
    let turns = exact.compose(&["0123456789", "abcdefghij"], "q");
    assert_eq!(turns[1].content, "0123456789\n\nabcdefghij\n\nq");
}

#[test]
fn custom_instruction_replaces_system_turn() {
    let turns = PromptComposer::new().with_instruction("Reply in French.").compose(&["ctx"], "q");
    assert_eq!(turns[0].content, "Reply in French.");
}
