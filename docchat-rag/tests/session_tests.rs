//! End-to-end session tests with scripted embedding and completion clients.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FailingEmbedder, KeywordEmbedder, SlowEmbedder};
use docchat_model::{MockCompletionClient, ModelError, Role};
use docchat_rag::{
    ChatSession, DistanceMetric, EmbeddingProvider, FixedSizeChunker, MediaType, RagConfig,
    RagError, RagPipeline, VectorIndex, extract,
};

fn pipeline_with(provider: Arc<dyn EmbeddingProvider>, config: RagConfig) -> Arc<RagPipeline> {
    Arc::new(RagPipeline::builder().config(config).embedding_provider(provider).build().unwrap())
}

fn uploads() -> Vec<docchat_rag::Document> {
    vec![
        extract("france.txt", b"Paris is the capital of France.", MediaType::PlainText).unwrap(),
        extract("rivers.txt", b"The Loire is the longest river in France.", MediaType::PlainText)
            .unwrap(),
    ]
}

#[tokio::test]
async fn answers_stream_from_retrieved_context() {
    let pipeline = pipeline_with(Arc::new(KeywordEmbedder::new()), RagConfig::default());
    let completion = Arc::new(MockCompletionClient::new(["Paris", " is the capital."]));
    let session = ChatSession::start(pipeline, completion.clone(), &uploads()).await.unwrap();
    assert_eq!(session.index().len(), 1);

    let mut answer = session.ask("What is the capital of France?").await.unwrap();
    assert_eq!(answer.sources.len(), 1);
    assert!(answer.sources[0].chunk.text.contains("--- france.txt ---"));

    let mut seen = Vec::new();
    while let Some(partial) = answer.response.next().await {
        seen.push(partial.unwrap().to_string());
    }
    assert_eq!(seen, vec!["Paris", "Paris is the capital."]);
    assert!(answer.response.is_finished());

    let requests = completion.requests();
    assert_eq!(requests.len(), 1);
    let turns = &requests[0];
    assert_eq!(turns[0].role, Role::System);
    assert_eq!(turns[1].role, Role::User);
    assert!(turns[1].content.starts_with("--- france.txt ---\nParis is the capital of France."));
    assert!(turns[1].content.ends_with("\n\nWhat is the capital of France?"));
}

#[tokio::test]
async fn mid_stream_failure_keeps_partial_answer() {
    let pipeline = pipeline_with(Arc::new(KeywordEmbedder::new()), RagConfig::default());
    let completion = MockCompletionClient::new(["Paris", " is", " never seen"])
        .fail_after(2, "connection reset");
    let completion = Arc::new(completion);
    let session = ChatSession::start(pipeline, completion, &uploads()).await.unwrap();

    let mut answer = session.ask("What is the capital of France?").await.unwrap();
    assert_eq!(answer.response.next().await.unwrap().unwrap(), "Paris");
    assert_eq!(answer.response.next().await.unwrap().unwrap(), "Paris is");

    match answer.response.next().await {
        Some(Err(ModelError::Completion { message, .. })) => {
            assert_eq!(message, "connection reset")
        }
        other => panic!("expected a completion error, got {other:?}"),
    }
    assert!(answer.response.next().await.is_none());
    assert_eq!(answer.response.response(), "Paris is");
    assert!(answer.response.is_failed());
}

#[tokio::test]
async fn retrieval_uses_top_k_from_config() {
    let config = RagConfig::builder().top_k(2).build().unwrap();
    let pipeline = Arc::new(
        RagPipeline::builder()
            .config(config)
            .embedding_provider(Arc::new(KeywordEmbedder::new()))
            .chunker(Arc::new(FixedSizeChunker::new(20, 0)))
            .build()
            .unwrap(),
    );
    let completion = Arc::new(MockCompletionClient::new(["ok"]));
    let session = ChatSession::start(pipeline, completion, &uploads()).await.unwrap();
    assert!(session.index().len() > 2);

    let answer = session.ask("capital").await.unwrap();
    assert_eq!(answer.sources.len(), 2);
    assert!(answer.sources[0].score >= answer.sources[1].score);
}

#[tokio::test]
async fn blank_question_is_rejected_before_any_call() {
    let provider = Arc::new(KeywordEmbedder::new());
    let pipeline = pipeline_with(provider.clone(), RagConfig::default());
    let completion = Arc::new(MockCompletionClient::new(["unused"]));
    let session = ChatSession::start(pipeline, completion.clone(), &uploads()).await.unwrap();
    let calls_after_indexing = provider.calls();

    let result = session.ask("   \n").await;
    assert!(matches!(result, Err(RagError::PipelineError(_))));
    assert_eq!(provider.calls(), calls_after_indexing);
    assert!(completion.requests().is_empty());
}

#[tokio::test]
async fn empty_index_sends_bare_question() {
    let pipeline = pipeline_with(Arc::new(KeywordEmbedder::new()), RagConfig::default());
    let completion = Arc::new(MockCompletionClient::new(["I don't know."]));
    let index = VectorIndex::empty(DistanceMetric::Cosine);
    let session = ChatSession::with_index(pipeline, completion.clone(), index);

    let answer = session.ask("Is anyone there?").await.unwrap();
    assert!(answer.sources.is_empty());
    assert_eq!(completion.requests()[0][1].content, "Is anyone there?");
}

#[tokio::test]
async fn starting_without_documents_fails() {
    let pipeline = pipeline_with(Arc::new(KeywordEmbedder::new()), RagConfig::default());
    let completion = Arc::new(MockCompletionClient::new(["unused"]));
    let result = ChatSession::start(pipeline, completion, &[]).await;
    assert!(matches!(result, Err(RagError::PipelineError(_))));
}

#[tokio::test]
async fn embedding_failure_aborts_the_session() {
    let pipeline = pipeline_with(Arc::new(FailingEmbedder::after(0)), RagConfig::default());
    let completion = Arc::new(MockCompletionClient::new(["unused"]));
    let result = ChatSession::start(pipeline, completion.clone(), &uploads()).await;
    assert!(matches!(result, Err(RagError::EmbeddingError { .. })));
    assert!(completion.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_indexing_times_out() {
    let config =
        RagConfig::builder().embed_timeout(Some(Duration::from_secs(60))).build().unwrap();
    let provider = Arc::new(SlowEmbedder { delay: Duration::from_secs(120) });
    let pipeline = pipeline_with(provider, config);
    let completion = Arc::new(MockCompletionClient::new(["unused"]));

    let result = ChatSession::start(pipeline, completion, &uploads()).await;
    assert!(matches!(result, Err(RagError::Timeout(_))));
}

#[tokio::test(start_paused = true)]
async fn slow_question_embedding_times_out() {
    let config = RagConfig::builder().embed_timeout(Some(Duration::from_secs(5))).build().unwrap();
    let pipeline = pipeline_with(Arc::new(SlowEmbedder { delay: Duration::from_secs(30) }), config);
    let documents = [docchat_rag::Document::from_text("a.txt", "some text")];
    let fast_index = VectorIndex::build(
        &KeywordEmbedder::new(),
        pipeline.chunk(&documents[0]),
        DistanceMetric::Cosine,
        8,
    )
    .await
    .unwrap();

    let retriever = pipeline.retriever(Arc::new(fast_index));
    let result = retriever.retrieve("text").await;
    assert!(matches!(result, Err(RagError::Timeout(_))));
}

#[test]
fn builder_requires_an_embedding_provider() {
    let result = RagPipeline::builder().config(RagConfig::default()).build();
    assert!(matches!(result, Err(RagError::ConfigError(_))));
}

#[tokio::test]
async fn every_session_gets_its_own_id() {
    let pipeline = pipeline_with(Arc::new(KeywordEmbedder::new()), RagConfig::default());
    let completion = Arc::new(MockCompletionClient::new(["ok"]));
    let a = ChatSession::with_index(pipeline.clone(), completion.clone(), VectorIndex::default());
    let b = ChatSession::with_index(pipeline, completion, VectorIndex::default());
    assert_ne!(a.id(), b.id());
}
