//! Property-based tests for the grading wire protocol

use proptest::prelude::*;
use speedgrader::canvas::StudentIdentity;
use speedgrader::grader::protocol::{decode, DiscussionContext, GradingRequest, SubmissionRecord};
use speedgrader::error::DecodeError;

fn student(name: &str, login: &str) -> StudentIdentity {
    StudentIdentity {
        user_id: 1,
        name: name.to_string(),
        login_id: login.to_string(),
        email: format!("{}@example.edu", login),
        sortable_name: name.to_string(),
    }
}

/// Arbitrary bytes never panic the decoder; they either parse or produce a
/// typed error.
#[test]
fn test_decode_is_total_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&any::<Vec<u8>>(), |bytes| {
            match decode(&bytes) {
                Ok(response) => {
                    // anything that parses must carry a usable grade
                    assert!(!response.grade_text().is_empty() || !response.grade.is_string());
                }
                Err(DecodeError::NotWellFormed(_)) | Err(DecodeError::MissingRequiredField(_)) => {}
            }
            Ok(())
        })
        .unwrap();
}

/// Requests encode to valid JSON for any submission text, and the message
/// survives the trip byte for byte.
#[test]
fn test_encode_preserves_message_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(any::<String>(), any::<String>()), |(message, title)| {
            let discussion = DiscussionContext {
                id: 7,
                title,
                prompt: "Discuss.".to_string(),
            };
            let submission = SubmissionRecord {
                entry_id: 99,
                message: message.clone(),
                created_at: None,
                updated_at: None,
                word_count: message.split_whitespace().count(),
            };
            let request = GradingRequest {
                discussion: &discussion,
                student: &student("Ada Lovelace", "ada.l"),
                submission: &submission,
            };

            let encoded = request.encode();
            let value: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
            assert_eq!(value["submission"]["message"], message);
            assert_eq!(value["student"]["login_id"], "ada.l");

            Ok(())
        })
        .unwrap();
}

/// Any decoded response re-serializes and decodes back to an equal value,
/// extra fields included.
#[test]
fn test_response_reserialization_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &("[a-zA-Z0-9+ .-]{1,12}", proptest::option::of(any::<String>()), any::<u32>()),
            |(grade, comment, points)| {
                let mut payload = serde_json::json!({
                    "grade": grade,
                    "points": points,
                });
                if let Some(comment) = &comment {
                    payload["comment"] = serde_json::Value::String(comment.clone());
                }
                let bytes = serde_json::to_vec(&payload).unwrap();

                let response = match decode(&bytes) {
                    Ok(response) => response,
                    // blank-string grades are rejected by design
                    Err(DecodeError::MissingRequiredField(_)) => return Ok(()),
                    Err(e) => panic!("unexpected decode failure: {}", e),
                };
                assert_eq!(response.grade_text(), grade);
                assert_eq!(response.extra["points"], points);

                let again = decode(&serde_json::to_vec(&response).unwrap()).unwrap();
                assert_eq!(response, again);

                Ok(())
            },
        )
        .unwrap();
}
