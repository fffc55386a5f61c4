// ABOUTME: Integration tests for session wiring — config, provider registry, tools, transcript.
// ABOUTME: Builds sessions from TOML config and runs prompts end to end with test doubles.

mod support;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use support::{RecordingServer, ScriptedProvider};
use toolhost::agent::{NoopObserver, TurnSettings};
use toolhost::provider::{ProviderRegistry, ProviderSettings};
use toolhost::session::{TranscriptLogger, read_transcript};
use toolhost::tools::ToolDispatcher;
use toolhost::{
    AgentError, Completion, Provider, ProviderError, RetryPolicy, Role, Session, ToolCall,
    ToolInvoker,
};

fn registry_for(provider: Arc<ScriptedProvider>, seen: Arc<Mutex<Option<ProviderSettings>>>) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register("scripted", move |settings| {
        *seen.lock().unwrap() = Some(settings);
        Ok(provider.clone() as Arc<dyn Provider>)
    });
    registry
}

#[tokio::test]
async fn session_loads_config_prompt_and_tools() {
    let tmp = tempfile::tempdir().unwrap();
    let prompt_path = tmp.path().join("prompt.json");
    std::fs::write(&prompt_path, r#"{"systemPrompt": "Answer in haiku."}"#).unwrap();
    let config_path = tmp.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            "[llm]\nmodel = \"scripted:tiny:v2\"\nsystem_prompt_file = {:?}\n",
            prompt_path.to_string_lossy()
        ),
    )
    .unwrap();
    let config = toolhost::config::Config::load_from(&config_path).unwrap();

    let provider = ScriptedProvider::new(vec![
        Ok(Completion::text("").with_tool_call(ToolCall::new("c1", "files__echo", json!({"x": 1})))),
        Ok(Completion::text("Five syllables here")),
    ]);
    let seen = Arc::new(Mutex::new(None));
    let registry = registry_for(provider.clone(), seen.clone());
    let server = RecordingServer::new();

    let mut session = Session::new(
        &config,
        &registry,
        vec![("files".to_string(), server.clone() as Arc<dyn ToolInvoker>)],
    )
    .await
    .unwrap();

    let settings = seen.lock().unwrap().clone().unwrap();
    assert_eq!(settings.model, "tiny:v2");
    assert_eq!(settings.system_prompt, "Answer in haiku.");

    let tool_names: Vec<&str> = session.tools().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tool_names, vec!["files__echo", "files__fail"]);

    let outcome = session
        .run_prompt(&CancellationToken::new(), "write a poem", &NoopObserver)
        .await
        .unwrap();
    assert_eq!(outcome.rounds, 2);
    assert_eq!(server.call_names(), vec!["echo"]);
    assert_eq!(provider.requests()[0].tool_names, vec!["files__echo", "files__fail"]);
    assert_eq!(session.history().last().unwrap().text(), "Five syllables here");

    session.close().await.unwrap();
}

#[tokio::test]
async fn blank_prompt_is_ignored() {
    let provider = ScriptedProvider::new(Vec::new());
    let mut session = Session::from_parts(
        provider.clone(),
        ToolDispatcher::new(),
        RetryPolicy::default(),
        TurnSettings::default(),
    );

    let outcome = session
        .run_prompt(&CancellationToken::new(), "   ", &NoopObserver)
        .await
        .unwrap();

    assert_eq!(outcome.rounds, 0);
    assert!(session.history().is_empty());
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn history_carries_across_prompts() {
    let provider = ScriptedProvider::new(vec![
        Ok(Completion::text("first answer")),
        Ok(Completion::text("second answer")),
    ]);
    let mut session = Session::from_parts(
        provider.clone(),
        ToolDispatcher::new(),
        RetryPolicy::default(),
        TurnSettings::default(),
    );
    let cancel = CancellationToken::new();

    session.run_prompt(&cancel, "one", &NoopObserver).await.unwrap();
    session.run_prompt(&cancel, "two", &NoopObserver).await.unwrap();

    let roles: Vec<Role> = session.history().messages().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
    assert_eq!(provider.requests()[1].history.len(), 3);
}

#[tokio::test]
async fn transcript_mirrors_every_message() {
    let tmp = tempfile::tempdir().unwrap();
    let logger = TranscriptLogger::new_in_dir(tmp.path()).unwrap();
    let transcript_path = logger.path.clone();

    let provider = ScriptedProvider::new(vec![
        Ok(Completion::text("").with_tool_call(ToolCall::new("c1", "srv__echo", json!({})))),
        Ok(Completion::text("done")),
    ]);
    let mut dispatcher = ToolDispatcher::new();
    dispatcher.add_server("srv", RecordingServer::new(), &[]);
    let mut session = Session::from_parts(
        provider,
        dispatcher,
        RetryPolicy::default(),
        TurnSettings::default(),
    )
    .with_transcript(logger);

    session
        .run_prompt(&CancellationToken::new(), "hi", &NoopObserver)
        .await
        .unwrap();

    let entries = read_transcript(&transcript_path).unwrap();
    let roles: Vec<Role> = entries.iter().map(|e| e.message.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]);
}

#[tokio::test]
async fn persistent_overload_surfaces_terminal_error() {
    let provider = ScriptedProvider::new(
        (0..10)
            .map(|_| Err(ProviderError::classify("529 overloaded_error")))
            .collect(),
    );
    let policy = RetryPolicy {
        max_retries: 2,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(2),
    };
    let mut session =
        Session::from_parts(provider.clone(), ToolDispatcher::new(), policy, TurnSettings::default());

    let err = session
        .run_prompt(&CancellationToken::new(), "hi", &NoopObserver)
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::Overloaded { retries: 2 }));
    assert_eq!(provider.requests().len(), 3);
    // The user message stays; nothing else was appended.
    assert_eq!(session.history().len(), 1);
}

#[tokio::test]
async fn unknown_provider_fails_session_setup() {
    let config: toolhost::config::Config = toml::from_str("[llm]\nmodel = \"nope:x\"\n").unwrap();
    let registry = ProviderRegistry::new();
    let result = Session::new(&config, &registry, Vec::new()).await;
    let err = result.err().unwrap();
    assert!(err.to_string().contains("unsupported provider: nope"));
}
