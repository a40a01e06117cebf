use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use luna_core::embedding::HashingEmbedder;
use luna_core::memory::{MemoryConfig, SessionMemoryManager};
use luna_core::services::llm::{ChatRequest, ChatResponse, ChatRole, LlmError};
use luna_core::{ChatModel, ConversationAgent, LunaError, VectorStore};

/// Chat model that records every request and answers from a script.
struct ScriptedModel {
    replies: Mutex<Vec<Result<String, LlmError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().rev().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn generate(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Ok("(no script left)".to_string()));
        reply.map(|text| ChatResponse::new(text, "scripted"))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn create_memory(memory_len: usize) -> Arc<SessionMemoryManager> {
    Arc::new(SessionMemoryManager::new(MemoryConfig::new(memory_len)).unwrap())
}

#[tokio::test]
async fn test_history_window_follows_memory_len() {
    let model = Arc::new(ScriptedModel::new(
        (1..=4).map(|i| Ok(format!("reply {i}"))).collect(),
    ));
    let agent = ConversationAgent::new(create_memory(2), model.clone());

    for i in 1..=4 {
        agent.respond("s", &format!("question {i}")).await.unwrap();
    }

    // The fourth request carries the two retained exchanges (3 prior turns, cap 2)
    let last = model.requests().pop().unwrap();
    let contents: Vec<&str> = last
        .messages
        .iter()
        .filter(|m| m.role != ChatRole::System)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(
        contents,
        vec!["question 2", "reply 2", "question 3", "reply 3", "question 4"]
    );

    let history = agent.memory().history_view("s");
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].agent, "reply 4");
}

#[tokio::test]
async fn test_sessions_do_not_share_history() {
    let model = Arc::new(ScriptedModel::new(vec![
        Ok("hi alice".to_string()),
        Ok("hi bob".to_string()),
    ]));
    let agent = ConversationAgent::new(create_memory(5), model.clone());

    agent.respond("alice", "I am alice").await.unwrap();
    agent.respond("bob", "I am bob").await.unwrap();

    let bob_request = &model.requests()[1];
    assert!(bob_request
        .messages
        .iter()
        .all(|m| !m.content.contains("alice")));
}

#[tokio::test]
async fn test_retrieved_context_is_included() {
    let store = Arc::new(VectorStore::new(Arc::new(HashingEmbedder::default())));
    store
        .insert_batch(&[
            "Tech Stack - Python, JavaScript, React, Node.js",
            "Favorite dish - spicy tteokbokki with cheese",
        ])
        .await
        .unwrap();

    let model = Arc::new(ScriptedModel::new(vec![Ok("Python and React".to_string())]));
    let agent = ConversationAgent::new(create_memory(5), model.clone())
        .with_retriever(store, 1)
        .unwrap();

    let reply = agent.respond("s", "What is my tech stack?").await.unwrap();
    assert_eq!(reply.context.len(), 1);
    assert!(reply.context[0].text.starts_with("Tech Stack"));

    let request = &model.requests()[0];
    assert_eq!(request.messages[1].role, ChatRole::System);
    assert!(request.messages[1].content.contains("Tech Stack"));
}

#[tokio::test]
async fn test_empty_store_adds_no_context() {
    let store = Arc::new(VectorStore::new(Arc::new(HashingEmbedder::default())));
    let model = Arc::new(ScriptedModel::new(vec![Ok("ok".to_string())]));
    let agent = ConversationAgent::new(create_memory(5), model.clone())
        .with_retriever(store, 3)
        .unwrap();

    let reply = agent.respond("s", "hello").await.unwrap();
    assert!(reply.context.is_empty());
    assert_eq!(model.requests()[0].messages.len(), 2);
}

#[tokio::test]
async fn test_model_failure_keeps_history() {
    let model = Arc::new(ScriptedModel::new(vec![
        Ok("first".to_string()),
        Err(LlmError::Server {
            status: 503,
            message: "unavailable".to_string(),
        }),
    ]));
    let agent = ConversationAgent::new(create_memory(5), model);

    agent.respond("s", "one").await.unwrap();
    let err = agent.respond("s", "two").await.unwrap_err();

    assert!(matches!(err, LunaError::Model(LlmError::Server { status: 503, .. })));
    let history = agent.memory().history_view("s");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].human, "one");
}

#[tokio::test]
async fn test_clear_history_forgets_all_sessions() {
    let model = Arc::new(ScriptedModel::new(Vec::new()));
    let agent = ConversationAgent::new(create_memory(5), model);

    agent.respond("a", "x").await.unwrap();
    agent.respond("b", "y").await.unwrap();
    agent.clear_history();

    assert_eq!(agent.memory().session_count(), 0);
    assert!(agent.memory().history_view("a").is_empty());
}
