//! Turn persistence and directory reads across conversations.

use factotum::chat::domain::Role;
use factotum::chat::services::PageRequest;
use factotum::identity::UserId;
use factotum::orchestrator::adapters::ScriptedCapability;
use factotum::orchestrator::turn::TurnRequest;
use rstest::rstest;

use super::helpers::world;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn each_turn_appends_a_user_and_assistant_pair() -> eyre::Result<()> {
    let script = ScriptedCapability::new().then_reply("Hello!");
    let world = world(script)?;
    let user = UserId::new();

    let result = world.engine.run_turn(user, TurnRequest::new("hi")).await?;

    let detail = world.directory.detail(user, result.conversation_id()).await?;
    let messages = detail.messages();
    assert_eq!(messages.len(), 2);

    let first = messages.first().expect("user message");
    assert_eq!(first.role(), Role::User);
    assert_eq!(first.content(), "hi");
    assert_eq!(first.sequence_number().value(), 1);

    let second = messages.get(1).expect("assistant message");
    assert_eq!(second.role(), Role::Assistant);
    assert_eq!(second.content(), "Hello!");
    assert_eq!(second.sequence_number().value(), 2);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn continued_conversation_accumulates_ordered_history() -> eyre::Result<()> {
    let script = ScriptedCapability::new()
        .then_reply("First reply")
        .then_reply("Second reply");
    let world = world(script)?;
    let user = UserId::new();

    let first = world
        .engine
        .run_turn(user, TurnRequest::new("first message"))
        .await?;
    let second = world
        .engine
        .run_turn(
            user,
            TurnRequest::new("second message").with_conversation(first.conversation_id()),
        )
        .await?;

    assert_eq!(second.conversation_id(), first.conversation_id());

    let detail = world.directory.detail(user, first.conversation_id()).await?;
    let contents: Vec<&str> = detail
        .messages()
        .iter()
        .map(|message| message.content())
        .collect();
    assert_eq!(
        contents,
        vec!["first message", "First reply", "second message", "Second reply"]
    );

    let sequences: Vec<u64> = detail
        .messages()
        .iter()
        .map(|message| message.sequence_number().value())
        .collect();
    assert_eq!(sequences, vec![1, 2, 3, 4]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn turns_without_a_conversation_open_separate_ones() -> eyre::Result<()> {
    let script = ScriptedCapability::new()
        .then_reply("First reply")
        .then_reply("Second reply");
    let world = world(script)?;
    let user = UserId::new();

    let first = world
        .engine
        .run_turn(user, TurnRequest::new("first topic"))
        .await?;
    let second = world
        .engine
        .run_turn(user, TurnRequest::new("second topic"))
        .await?;

    assert_ne!(first.conversation_id(), second.conversation_id());

    let page = world.directory.list(user, PageRequest::default()).await?;
    assert_eq!(page.total(), 2);
    assert!(
        page.summaries()
            .iter()
            .all(|summary| summary.message_count() == 2)
    );
    // Newest activity first.
    assert_eq!(
        page.summaries()
            .first()
            .expect("newest conversation")
            .conversation()
            .id(),
        second.conversation_id()
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn directory_listing_is_scoped_to_the_caller() -> eyre::Result<()> {
    let script = ScriptedCapability::new()
        .then_reply("For alice")
        .then_reply("For bob");
    let world = world(script)?;
    let alice = UserId::new();
    let bob = UserId::new();

    let alice_turn = world
        .engine
        .run_turn(alice, TurnRequest::new("alice talking"))
        .await?;
    world
        .engine
        .run_turn(bob, TurnRequest::new("bob talking"))
        .await?;

    let page = world.directory.list(bob, PageRequest::default()).await?;
    assert_eq!(page.total(), 1);
    assert_ne!(
        page.summaries()
            .first()
            .expect("bob's conversation")
            .conversation()
            .id(),
        alice_turn.conversation_id()
    );
    Ok(())
}
