//! Per-connection chat session.
//!
//! A session builds one [`QaPipeline`] when it starts and keeps it for its
//! whole lifetime. If that build fails the session stays `Failed` and answers
//! every message with a fixed notice; the index and model are never retried.

pub mod sink;

use qa_pipeline::{AnswerResult, InitError, PipelineBackend, QaPipeline};
use tracing::{error, info, warn};

use self::sink::{ChatSink, SinkError};

/// Placeholder shown while the pipeline loads.
pub const STARTING_TEXT: &str = "Starting the bot...";
/// Reply to every message of a session whose pipeline failed to build.
pub const INIT_FAILED_TEXT: &str = "Sorry, the chatbot failed to initialize. Please restart.";
/// Reply when a single question could not be answered.
pub const ANSWER_FAILED_TEXT: &str = "Sorry, I encountered an error.";
pub const NO_SOURCES_TEXT: &str = "No sources found";
pub const DEFAULT_BOT_NAME: &str = "Medical Bot";

/// Session-level knobs shared by all connections.
#[derive(Clone, Debug)]
pub struct ChatConfig {
    pub bot_name: String,
    pub top_k: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            bot_name: DEFAULT_BOT_NAME.to_string(),
            top_k: 2,
        }
    }
}

impl ChatConfig {
    pub fn welcome_text(&self) -> String {
        format!("Hi, Welcome to {}. What is your query?", self.bot_name)
    }
}

#[derive(Debug)]
pub enum SessionState {
    Uninitialized,
    Ready(QaPipeline),
    Failed(InitError),
}

#[derive(Debug)]
pub struct ChatSession {
    config: ChatConfig,
    state: SessionState,
}

impl ChatSession {
    /// A session that has not been started yet.
    pub fn new(config: ChatConfig) -> Self {
        Self {
            config,
            state: SessionState::Uninitialized,
        }
    }

    /// Shows the placeholder, builds the pipeline, then turns the placeholder
    /// into the welcome text whatever the outcome.
    ///
    /// # Errors
    /// Only [`SinkError`]; a failed pipeline build is recorded in the state.
    pub async fn start(
        backend: &dyn PipelineBackend,
        config: ChatConfig,
        sink: &mut dyn ChatSink,
    ) -> Result<Self, SinkError> {
        let mut session = Self::new(config);
        let placeholder = sink.send_message(STARTING_TEXT).await?;

        session.state = match QaPipeline::create(backend, session.config.top_k).await {
            Ok(p) => {
                info!("session ready");
                SessionState::Ready(p)
            }
            Err(e) => {
                error!(error = %e, "session failed to initialize");
                SessionState::Failed(e)
            }
        };

        sink.update_message(placeholder, &session.config.welcome_text())
            .await?;
        Ok(session)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Handles one user message and sends exactly one reply.
    ///
    /// # Errors
    /// Only [`SinkError`]; answer failures become an apology.
    pub async fn on_message(&self, text: &str, sink: &mut dyn ChatSink) -> Result<(), SinkError> {
        let reply = match &self.state {
            SessionState::Uninitialized => {
                warn!("message received before session start");
                INIT_FAILED_TEXT.to_string()
            }
            SessionState::Failed(_) => {
                warn!("message received on a session that failed to initialize");
                INIT_FAILED_TEXT.to_string()
            }
            SessionState::Ready(pipeline) => match pipeline.answer(text).await {
                Ok(res) => {
                    info!(sources = res.sources.len(), "answered");
                    format_reply(&res)
                }
                Err(e) => {
                    error!(query = %text, stage = e.stage(), error = %e, "answer failed");
                    ANSWER_FAILED_TEXT.to_string()
                }
            },
        };
        sink.send_message(&reply).await?;
        Ok(())
    }
}

/// Answer text followed by the sources listing.
///
/// ```
/// use api::session::format_reply;
/// use qa_pipeline::AnswerResult;
/// let r = AnswerResult { text: "Rest and fluids.".into(), sources: vec![] };
/// assert_eq!(format_reply(&r), "Rest and fluids.\nNo sources found");
/// ```
pub fn format_reply(res: &AnswerResult) -> String {
    let mut out = res.text.clone();
    if res.sources.is_empty() {
        out.push('\n');
        out.push_str(NO_SOURCES_TEXT);
    } else {
        out.push_str("\nSources:");
        for f in &res.sources {
            out.push_str("\n- ");
            out.push_str(&f.identity());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::sink::MessageId;
    use super::*;
    use async_trait::async_trait;
    use qa_pipeline::{
        AnswerGenerator, DocumentFragment, InferenceError, ModelError, Prompt, Retriever,
    };
    use rag_store::RagError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /* ---- stubs ---- */

    #[derive(Default)]
    struct RecordingSink {
        sent: Vec<String>,
        updates: Vec<(MessageId, String)>,
    }

    #[async_trait]
    impl ChatSink for RecordingSink {
        async fn send_message(&mut self, text: &str) -> Result<MessageId, SinkError> {
            self.sent.push(text.to_string());
            Ok(MessageId(self.sent.len() as u64))
        }

        async fn update_message(&mut self, id: MessageId, text: &str) -> Result<(), SinkError> {
            self.updates.push((id, text.to_string()));
            Ok(())
        }
    }

    fn frag(text: &str, source: &str, page: Option<u32>) -> DocumentFragment {
        DocumentFragment {
            text: text.into(),
            source: source.into(),
            page,
            score: 0.5,
        }
    }

    struct FixedRetriever(Vec<DocumentFragment>);

    #[async_trait]
    impl Retriever for FixedRetriever {
        async fn fetch(&self, _q: &str, k: usize) -> Result<Vec<DocumentFragment>, RagError> {
            Ok(self.0.iter().take(k).cloned().collect())
        }
    }

    /// Answers "answer N"; fails on the calls listed in `fail_on` (1-based).
    struct CountingGenerator {
        calls: Arc<AtomicUsize>,
        fail_on: Vec<usize>,
    }

    #[async_trait]
    impl AnswerGenerator for CountingGenerator {
        async fn generate(&self, _p: &Prompt) -> Result<String, InferenceError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on.contains(&n) {
                Err(InferenceError::EmptyCompletion)
            } else {
                Ok(format!("answer {n}"))
            }
        }
    }

    struct StubBackend {
        index_ok: bool,
        model_ok: bool,
        fragments: Vec<DocumentFragment>,
        fail_on: Vec<usize>,
        generate_calls: Arc<AtomicUsize>,
        generator_loads: AtomicUsize,
    }

    impl StubBackend {
        fn new(index_ok: bool, model_ok: bool) -> Self {
            Self {
                index_ok,
                model_ok,
                fragments: vec![],
                fail_on: vec![],
                generate_calls: Arc::new(AtomicUsize::new(0)),
                generator_loads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PipelineBackend for StubBackend {
        async fn load_retriever(&self) -> Result<Arc<dyn Retriever>, RagError> {
            if self.index_ok {
                Ok(Arc::new(FixedRetriever(self.fragments.clone())))
            } else {
                Err(RagError::NotFound("vectorstore".into()))
            }
        }

        async fn load_generator(&self) -> Result<Arc<dyn AnswerGenerator>, ModelError> {
            self.generator_loads.fetch_add(1, Ordering::SeqCst);
            if self.model_ok {
                Ok(Arc::new(CountingGenerator {
                    calls: self.generate_calls.clone(),
                    fail_on: self.fail_on.clone(),
                }))
            } else {
                Err(ModelError::Artifact(
                    ai_llm_service::ModelArtifactError::NotFound("llama-2.gguf".into()),
                ))
            }
        }
    }

    /* ---- tests ---- */

    #[tokio::test]
    async fn start_sends_placeholder_then_welcome() {
        let backend = StubBackend::new(true, true);
        let mut sink = RecordingSink::default();
        let s = ChatSession::start(&backend, ChatConfig::default(), &mut sink)
            .await
            .unwrap();

        assert!(matches!(s.state(), SessionState::Ready(_)));
        assert_eq!(sink.sent, [STARTING_TEXT]);
        assert_eq!(
            sink.updates,
            [(
                MessageId(1),
                "Hi, Welcome to Medical Bot. What is your query?".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn missing_index_fails_session_without_generation() {
        let backend = StubBackend::new(false, true);
        let mut sink = RecordingSink::default();
        let s = ChatSession::start(&backend, ChatConfig::default(), &mut sink)
            .await
            .unwrap();

        assert!(matches!(
            s.state(),
            SessionState::Failed(InitError::IndexUnavailable(_))
        ));
        // welcome is still shown
        assert_eq!(sink.updates.len(), 1);

        for q in ["What is fever?", "And asthma?"] {
            s.on_message(q, &mut sink).await.unwrap();
        }
        assert_eq!(sink.sent[1..], [INIT_FAILED_TEXT, INIT_FAILED_TEXT]);
        assert_eq!(backend.generator_loads.load(Ordering::SeqCst), 0);
        assert_eq!(backend.generate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn model_failure_after_index_load_fails_session() {
        let backend = StubBackend::new(true, false);
        let mut sink = RecordingSink::default();
        let s = ChatSession::start(&backend, ChatConfig::default(), &mut sink)
            .await
            .unwrap();

        assert!(matches!(
            s.state(),
            SessionState::Failed(InitError::ModelUnavailable(_))
        ));
        assert_eq!(backend.generator_loads.load(Ordering::SeqCst), 1);

        s.on_message("hello", &mut sink).await.unwrap();
        assert_eq!(sink.sent.last().map(String::as_str), Some(INIT_FAILED_TEXT));
    }

    #[tokio::test]
    async fn message_before_start_gets_init_failure_text() {
        let s = ChatSession::new(ChatConfig::default());
        let mut sink = RecordingSink::default();
        s.on_message("hi", &mut sink).await.unwrap();
        assert_eq!(sink.sent, [INIT_FAILED_TEXT]);
    }

    #[tokio::test]
    async fn reply_lists_source_identities() {
        let mut backend = StubBackend::new(true, true);
        backend.fragments = vec![
            frag("Fever is...", "data/gale.pdf", Some(12)),
            frag("Antipyretics...", "notes.txt", None),
        ];
        let mut sink = RecordingSink::default();
        let s = ChatSession::start(&backend, ChatConfig::default(), &mut sink)
            .await
            .unwrap();

        s.on_message("What lowers fever?", &mut sink).await.unwrap();
        assert_eq!(
            sink.sent[1],
            "answer 1\nSources:\n- data/gale.pdf (page 12)\n- notes.txt"
        );
    }

    #[tokio::test]
    async fn reply_without_sources_says_so() {
        let backend = StubBackend::new(true, true);
        let mut sink = RecordingSink::default();
        let s = ChatSession::start(&backend, ChatConfig::default(), &mut sink)
            .await
            .unwrap();

        s.on_message("anything", &mut sink).await.unwrap();
        assert!(sink.sent[1].ends_with("\nNo sources found"));
    }

    #[tokio::test]
    async fn transient_failure_only_affects_its_own_message() {
        let mut backend = StubBackend::new(true, true);
        backend.fragments = vec![frag("ctx", "gale.pdf", None)];
        backend.fail_on = vec![2];
        let mut sink = RecordingSink::default();
        let s = ChatSession::start(&backend, ChatConfig::default(), &mut sink)
            .await
            .unwrap();

        for q in ["q1", "q2", "q3"] {
            s.on_message(q, &mut sink).await.unwrap();
        }

        assert_eq!(sink.sent[1], "answer 1\nSources:\n- gale.pdf");
        assert_eq!(sink.sent[2], ANSWER_FAILED_TEXT);
        assert_eq!(sink.sent[3], "answer 3\nSources:\n- gale.pdf");
        assert!(matches!(s.state(), SessionState::Ready(_)));
    }

    #[test]
    fn welcome_uses_bot_name() {
        let cfg = ChatConfig {
            bot_name: "Cardio Bot".into(),
            top_k: 2,
        };
        assert_eq!(cfg.welcome_text(), "Hi, Welcome to Cardio Bot. What is your query?");
    }
}
