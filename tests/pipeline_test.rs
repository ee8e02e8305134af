//! End-to-end pipeline tests against real repositories and a mocked Gemini API.

mod common;

use common::{TestRepo, gemini_reply, generate_path};
use scribe::commit::{DiffSummarizer, PrefixFormat};
use scribe::error::{CommitError, GenerationError};
use scribe::git::GitCli;
use scribe::llm::GeminiClient;
use scribe::notes::NoteStore;
use scribe::pipeline::{Mode, Outcome, PipelineConfig, run_pipeline};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-2.0-flash";

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new("test-key", MODEL)
        .expect("Failed to build client")
        .with_base_url(server.uri())
}

fn commit_config() -> PipelineConfig {
    PipelineConfig {
        auto_prefix: true,
        ..Default::default()
    }
}

async fn mount_reply(server: &MockServer, text: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(generate_path(MODEL)))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(text)))
        .expect(times)
        .mount(server)
        .await;
}

fn looks_conventional(message: &str) -> bool {
    let Some((head, description)) = message.split_once(": ") else {
        return false;
    };
    let kind = head.split('(').next().unwrap_or_default();
    !kind.is_empty() && kind.chars().all(|c| c.is_ascii_lowercase()) && !description.is_empty()
}

#[tokio::test]
async fn test_dry_run_prints_message_without_committing() {
    let test_repo = TestRepo::new();
    test_repo.stage_file("src/auth.rs", "pub fn login() {}\n");

    let server = MockServer::start().await;
    mount_reply(&server, "```\nfeat(auth): add login function\n```", 1).await;

    let ctx = test_repo.context();
    let config = PipelineConfig {
        dry_run: true,
        ..commit_config()
    };
    let outcome = run_pipeline(
        &config,
        &GitCli::new(ctx.root.clone()),
        &client(&server),
        &NoteStore::for_repo(&ctx),
    )
    .await
    .expect("Pipeline failed");

    assert!(matches!(outcome, Outcome::DryRun { .. }));
    assert_eq!(outcome.message(), "feat(auth): add login function");
    assert!(!outcome.message().contains('\n'));
    assert!(looks_conventional(outcome.message()));
    assert_eq!(test_repo.commit_count(), 0);
    assert!(!test_repo.notes_path().exists());
}

#[tokio::test]
async fn test_commit_consumes_notes() {
    let test_repo = TestRepo::new();
    test_repo.stage_file("src/session.rs", "pub fn refresh() {}\n");

    let ctx = test_repo.context();
    let notes = NoteStore::for_repo(&ctx);
    notes.add("sessions expired after 5 minutes on Safari").unwrap();
    notes.add("support ticket from the mobile team").unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_path(MODEL)))
        .and(body_string_contains("sessions expired after 5 minutes on Safari"))
        .and(body_string_contains("support ticket from the mobile team"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_reply("fix(session): refresh tokens before expiry")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = run_pipeline(
        &commit_config(),
        &GitCli::new(ctx.root.clone()),
        &client(&server),
        &notes,
    )
    .await
    .expect("Pipeline failed");

    assert!(matches!(outcome, Outcome::Committed(_)));
    assert_eq!(outcome.generated().notes_used, 2);
    assert!(notes.list().is_empty());
    assert_eq!(
        test_repo.head_message().as_deref(),
        Some("fix(session): refresh tokens before expiry")
    );
}

#[tokio::test]
async fn test_branch_ticket_becomes_prefix() {
    let test_repo = TestRepo::new();
    test_repo.switch_branch("feature/JR-1234-add-auth");
    test_repo.stage_file("src/auth.rs", "pub fn login() {}\n");

    let server = MockServer::start().await;
    mount_reply(&server, "feat(auth): add login", 1).await;

    let ctx = test_repo.context();
    let outcome = run_pipeline(
        &commit_config(),
        &GitCli::new(ctx.root.clone()),
        &client(&server),
        &NoteStore::for_repo(&ctx),
    )
    .await
    .expect("Pipeline failed");

    let prefix = outcome.generated().prefix.as_ref().expect("Expected a prefix");
    assert_eq!(prefix.value, "JR-1234");
    assert!(outcome.message().starts_with("[JR-1234] "));
    assert_eq!(
        test_repo.head_message().as_deref(),
        Some("[JR-1234] feat(auth): add login")
    );
}

#[tokio::test]
async fn test_colon_prefix_format() {
    let test_repo = TestRepo::new();
    test_repo.switch_branch("JR-77-typo");
    test_repo.stage_file("README.md", "# scribe\n");

    let server = MockServer::start().await;
    mount_reply(&server, "docs: fix typo", 1).await;

    let ctx = test_repo.context();
    let config = PipelineConfig {
        dry_run: true,
        prefix_format: PrefixFormat::Colon,
        ..commit_config()
    };
    let outcome = run_pipeline(
        &config,
        &GitCli::new(ctx.root.clone()),
        &client(&server),
        &NoteStore::for_repo(&ctx),
    )
    .await
    .unwrap();

    assert_eq!(outcome.message(), "JR-77: docs: fix typo");
}

#[tokio::test]
async fn test_nothing_staged_makes_no_request() {
    let test_repo = TestRepo::new();
    test_repo.write_file("untracked.txt", "not staged\n");

    let server = MockServer::start().await;
    mount_reply(&server, "feat: should not happen", 0).await;

    let ctx = test_repo.context();
    let notes = NoteStore::for_repo(&ctx);
    notes.add("still here afterwards").unwrap();

    let result = run_pipeline(
        &commit_config(),
        &GitCli::new(ctx.root.clone()),
        &client(&server),
        &notes,
    )
    .await;

    assert!(matches!(result, Err(CommitError::NothingStaged)));
    assert_eq!(notes.list().len(), 1);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_large_diff_is_summarized() {
    let test_repo = TestRepo::new();
    let big: String = (0..200).map(|i| format!("line {i}\n")).collect();
    test_repo.stage_file("data/big.txt", &big);
    test_repo.stage_file("data/small.txt", "x\n");

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_path(MODEL)))
        .and(body_string_contains("CHANGE SUMMARY"))
        .and(body_string_contains("data/big.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("chore(data): add fixtures")))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = test_repo.context();
    let config = PipelineConfig {
        dry_run: true,
        summarizer: DiffSummarizer::new(500),
        ..commit_config()
    };
    let outcome = run_pipeline(
        &config,
        &GitCli::new(ctx.root.clone()),
        &client(&server),
        &NoteStore::for_repo(&ctx),
    )
    .await
    .unwrap();

    assert!(outcome.generated().summarized);
}

#[tokio::test]
async fn test_regenerate_amends_head() {
    let test_repo = TestRepo::new();
    test_repo.stage_file("src/lib.rs", "pub mod auth;\n");
    test_repo.commit("wip");
    test_repo.stage_file("src/auth.rs", "pub fn login() {}\n");
    test_repo.commit("more wip");

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_path(MODEL)))
        .and(body_string_contains("src/auth.rs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("feat(auth): add login")))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = test_repo.context();
    let config = PipelineConfig {
        mode: Mode::Regenerate,
        ..commit_config()
    };
    let outcome = run_pipeline(
        &config,
        &GitCli::new(ctx.root.clone()),
        &client(&server),
        &NoteStore::for_repo(&ctx),
    )
    .await
    .expect("Regenerate failed");

    match &outcome {
        Outcome::Amended { previous, .. } => assert_eq!(previous.message, "more wip"),
        other => panic!("expected amend, got {other:?}"),
    }
    assert_eq!(test_repo.commit_count(), 2);
    assert_eq!(test_repo.head_message().as_deref(), Some("feat(auth): add login"));
}

#[tokio::test]
async fn test_regenerate_without_commits_fails() {
    let test_repo = TestRepo::new();
    let server = MockServer::start().await;
    mount_reply(&server, "feat: nope", 0).await;

    let ctx = test_repo.context();
    let config = PipelineConfig {
        mode: Mode::Regenerate,
        ..commit_config()
    };
    let result = run_pipeline(
        &config,
        &GitCli::new(ctx.root.clone()),
        &client(&server),
        &NoteStore::for_repo(&ctx),
    )
    .await;

    assert!(matches!(
        result,
        Err(CommitError::Git(scribe::error::GitError::NoCommits))
    ));
}

#[tokio::test]
async fn test_api_error_keeps_notes() {
    let test_repo = TestRepo::new();
    test_repo.stage_file("a.txt", "a\n");

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_path(MODEL)))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        })))
        .mount(&server)
        .await;

    let ctx = test_repo.context();
    let notes = NoteStore::for_repo(&ctx);
    notes.add("keep me").unwrap();

    let result = run_pipeline(
        &commit_config(),
        &GitCli::new(ctx.root.clone()),
        &client(&server),
        &notes,
    )
    .await;

    match result {
        Err(CommitError::Generation(GenerationError::Api { status, message })) => {
            assert_eq!(status, 400);
            assert!(message.contains("API key not valid"));
        }
        other => panic!("expected API error, got {other:?}"),
    }
    assert_eq!(notes.list().len(), 1);
    assert_eq!(test_repo.commit_count(), 0);
}
