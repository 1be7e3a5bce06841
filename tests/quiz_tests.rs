//! # Quiz Tests
//!
//! Question generation and scoring with a seeded RNG.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use vocab_bot::quiz::{build_question, AnswerOutcome, QuizError, QuizSession, OPTION_COUNT};
use vocab_bot::storage::WordPair;

fn pair(word: &str, translation: &str) -> WordPair {
    WordPair {
        user_id: 1,
        word: word.to_string(),
        translation: translation.to_string(),
        created_at: Utc::now(),
    }
}

fn sample_words() -> Vec<WordPair> {
    vec![
        pair("cat", "кошка"),
        pair("dog", "собака"),
        pair("house", "дом"),
        pair("tree", "дерево"),
        pair("water", "вода"),
        pair("sun", "солнце"),
    ]
}

#[test]
fn test_question_options_contain_correct_translation_once() {
    let words = sample_words();
    let mut rng = StdRng::seed_from_u64(42);

    for round in 1..=50 {
        let question = build_question(&words, round, None, &mut rng).unwrap();
        assert_eq!(question.round, round);
        assert_eq!(question.options.len(), OPTION_COUNT);
        assert_eq!(
            question
                .options
                .iter()
                .filter(|o| **o == question.correct_translation)
                .count(),
            1
        );
        assert_eq!(
            question.options[question.correct_index()],
            question.correct_translation
        );

        let expected = words
            .iter()
            .find(|w| w.word == question.word)
            .map(|w| w.translation.clone());
        assert_eq!(expected, Some(question.correct_translation.clone()));
    }
}

#[test]
fn test_small_dictionary_gets_fewer_options() {
    let words = vec![pair("cat", "кошка"), pair("dog", "собака")];
    let mut rng = StdRng::seed_from_u64(1);

    let question = build_question(&words, 1, None, &mut rng).unwrap();
    assert_eq!(question.options.len(), 2);
}

#[test]
fn test_options_have_distinct_translations() {
    let words = vec![
        pair("big", "большой"),
        pair("large", "Большой"),
        pair("huge", "большой "),
        pair("small", "маленький"),
    ];
    let mut rng = StdRng::seed_from_u64(3);

    for round in 1..=20 {
        let question = build_question(&words, round, None, &mut rng).unwrap();
        let mut normalized: Vec<String> = question
            .options
            .iter()
            .map(|o| o.trim().to_lowercase())
            .collect();
        normalized.sort();
        normalized.dedup();
        assert_eq!(normalized.len(), question.options.len());
        assert_eq!(question.options.len(), 2);
    }
}

#[test]
fn test_identical_translations_are_not_enough() {
    let words = vec![pair("big", "большой"), pair("large", "большой")];
    let mut rng = StdRng::seed_from_u64(9);

    assert!(matches!(
        build_question(&words, 1, None, &mut rng),
        Err(QuizError::NotEnoughWords { available: 1, .. })
    ));
}

#[test]
fn test_previous_word_is_avoided_when_possible() {
    let words = sample_words();
    let mut rng = StdRng::seed_from_u64(5);

    for round in 1..=30 {
        let question = build_question(&words, round, Some("cat"), &mut rng).unwrap();
        assert_ne!(question.word, "cat");
    }

    // With two words the other one must be asked
    let two = vec![pair("cat", "кошка"), pair("dog", "собака")];
    let question = build_question(&two, 1, Some("CAT"), &mut rng).unwrap();
    assert_eq!(question.word, "dog");
}

#[test]
fn test_session_scores_button_answers() {
    let words = sample_words();
    let mut rng = StdRng::seed_from_u64(11);
    let mut session = QuizSession::for_user(1);

    let question = session.next_question(&words, &mut rng).unwrap().clone();
    assert_eq!(question.round, 1);
    assert!(session.awaiting_answer());

    let outcome = session
        .answer_option(question.round, question.correct_index())
        .unwrap();
    assert_eq!(outcome, AnswerOutcome::Correct);
    assert!(!session.awaiting_answer());
    assert_eq!(session.answer_option(question.round, 0), Err(QuizError::AlreadyAnswered));

    let question = session.next_question(&words, &mut rng).unwrap().clone();
    assert_eq!(question.round, 2);
    let wrong_index = (question.correct_index() + 1) % question.options.len();
    let outcome = session.answer_option(2, wrong_index).unwrap();
    assert_eq!(
        outcome,
        AnswerOutcome::Incorrect {
            expected: question.correct_translation.clone()
        }
    );

    assert_eq!(session.answered, 2);
    assert_eq!(session.correct_answers, 1);
    assert_eq!(session.accuracy_percent(), 50);
}

#[test]
fn test_session_rejects_stale_and_invalid_presses() {
    let words = sample_words();
    let mut rng = StdRng::seed_from_u64(13);
    let mut session = QuizSession::for_user(1);

    assert_eq!(session.answer_option(1, 0), Err(QuizError::NoActiveQuestion));

    session.next_question(&words, &mut rng).unwrap();
    session.next_question(&words, &mut rng).unwrap();

    assert_eq!(
        session.answer_option(1, 0),
        Err(QuizError::StaleRound {
            expected: 2,
            got: 1
        })
    );
    assert_eq!(session.answer_option(2, 99), Err(QuizError::OptionOutOfRange(99)));
    assert_eq!(session.answered, 0, "dropped questions do not count");
}

#[test]
fn test_typed_answers_ignore_case_and_whitespace() {
    let words = vec![pair("cat", "Кошка"), pair("dog", "собака")];
    let mut rng = StdRng::seed_from_u64(17);
    let mut session = QuizSession::for_user(1);

    let question = session.next_question(&words, &mut rng).unwrap().clone();
    let typed = format!("  {}  ", question.correct_translation.to_lowercase());
    assert_eq!(session.answer_text(&typed), Ok(AnswerOutcome::Correct));
    assert_eq!(session.answer_text(&typed), Err(QuizError::AlreadyAnswered));
}

#[test]
fn test_session_survives_serialization() {
    let words = sample_words();
    let mut rng = StdRng::seed_from_u64(19);
    let mut session = QuizSession::for_user(1);
    session.next_question(&words, &mut rng).unwrap();

    let json = serde_json::to_string(&session).unwrap();
    let restored: QuizSession = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, session);
}
