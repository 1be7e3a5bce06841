use anyhow::Result;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::types::ChatId;

use vocab_bot::dialogue::{VocabDialogue, VocabDialogueState};
use vocab_bot::quiz::QuizSession;
use vocab_bot::storage::WordPair;

fn words() -> Vec<WordPair> {
    [("cat", "кошка"), ("dog", "собака"), ("house", "дом")]
        .into_iter()
        .map(|(word, translation)| WordPair {
            user_id: 1,
            word: word.to_string(),
            translation: translation.to_string(),
            created_at: Utc::now(),
        })
        .collect()
}

/// Test basic dialogue functionality
#[tokio::test]
async fn test_default_state_is_idle() -> Result<()> {
    let state = VocabDialogueState::default();

    assert_eq!(state, VocabDialogueState::Idle);
    assert!(state.quiz_session().is_none());
    assert!(!state.awaiting_quiz_answer());

    Ok(())
}

/// Test that the quiz state reports whether text is an answer
#[tokio::test]
async fn test_quiz_state_tracks_open_question() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(21);
    let mut session = QuizSession::for_user(1);

    let state = VocabDialogueState::Quiz {
        session: session.clone(),
        message_id: None,
    };
    assert!(state.quiz_session().is_some());
    assert!(!state.awaiting_quiz_answer(), "no question asked yet");

    let round = session.next_question(&words(), &mut rng)?.round;
    let state = VocabDialogueState::Quiz {
        session: session.clone(),
        message_id: Some(10),
    };
    assert!(state.awaiting_quiz_answer());

    session.answer_option(round, 0)?;
    let state = VocabDialogueState::Quiz {
        session,
        message_id: Some(10),
    };
    assert!(!state.awaiting_quiz_answer());

    Ok(())
}

/// Test dialogue state round trip through in-memory storage
#[tokio::test]
async fn test_dialogue_storage_per_chat() -> Result<()> {
    let storage = InMemStorage::<VocabDialogueState>::new();
    let first = VocabDialogue::new(storage.clone(), ChatId(1));
    let second = VocabDialogue::new(storage.clone(), ChatId(2));

    assert_eq!(first.get().await?, None);

    let mut rng = StdRng::seed_from_u64(3);
    let mut session = QuizSession::for_user(1);
    session.next_question(&words(), &mut rng)?;
    let quiz = VocabDialogueState::Quiz {
        session,
        message_id: Some(99),
    };

    first.update(quiz.clone()).await?;
    assert_eq!(first.get().await?, Some(quiz));
    assert_eq!(second.get().await?, None, "chats do not share state");

    first.update(VocabDialogueState::Idle).await?;
    assert_eq!(first.get().await?, Some(VocabDialogueState::Idle));

    Ok(())
}

/// Test that dialogue states serialize for persistent storages
#[tokio::test]
async fn test_dialogue_state_serialization() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(8);
    let mut session = QuizSession::for_user(1);
    session.next_question(&words(), &mut rng)?;

    let state = VocabDialogueState::Quiz {
        session,
        message_id: Some(5),
    };
    let json = serde_json::to_string(&state)?;
    let restored: VocabDialogueState = serde_json::from_str(&json)?;
    assert_eq!(restored, state);

    Ok(())
}
