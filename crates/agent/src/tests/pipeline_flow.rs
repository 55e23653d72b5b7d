//! Scripted end-to-end runs of the answer pipeline.

use crate::assertions::AssertionSet;
use crate::conversation::Conversation;
use crate::pipeline::AnswerPipeline;
use crate::retrieval::{RetrievalGateway, RetrievedDocument, Retriever};
use mes_droits_core::{AppError, AppResult};
use mes_droits_llm::{ChatMessage, MockClient, Role, ToolCall, ToolChoice};
use mes_droits_store::{
    MemoryIndex, MockEmbeddings, Publication, PublicationVectorStore, RetryPolicy,
};
use std::sync::{Arc, Mutex};

/// Retriever returning a fixed document list, recording queries.
struct ScriptedRetriever {
    documents: Vec<RetrievedDocument>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedRetriever {
    fn with_documents(documents: Vec<RetrievedDocument>) -> Self {
        Self {
            documents,
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl Retriever for ScriptedRetriever {
    async fn search(&self, query: &str, _k: usize) -> AppResult<Vec<RetrievedDocument>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.documents.clone())
    }
}

fn search_call(query: &str) -> ToolCall {
    ToolCall::new("search", serde_json::json!({ "query": query }))
}

fn sourced_assertions_json() -> String {
    serde_json::json!({
        "assertions": [
            {
                "assertion": "Le chèque énergie aide à payer les factures d'énergie.",
                "source": "https://www.service-public.fr/particuliers/vosdroits/F33667"
            },
            {
                "assertion": "Une affirmation sans source.",
                "source": null
            },
            {
                "assertion": "Le fonds de solidarité logement peut aider à payer les factures d'eau.",
                "source": "https://www.service-public.fr/particuliers/vosdroits/F1334"
            }
        ]
    })
    .to_string()
}

fn pipeline_with(
    client: Arc<MockClient>,
    retriever: Arc<dyn Retriever>,
) -> AnswerPipeline {
    AnswerPipeline::new(client, RetrievalGateway::new(retriever), "mock-model")
}

#[tokio::test]
async fn test_full_run_message_layout() {
    let client = Arc::new(MockClient::new());
    client.push_message(ChatMessage::assistant_tool_calls(vec![search_call(
        "aide paiement factures",
    )]));
    client.push_message(ChatMessage::assistant(sourced_assertions_json()));
    client.push_message(ChatMessage::assistant(
        "Le chèque énergie peut vous aider ( https://www.service-public.fr/particuliers/vosdroits/F33667 ).",
    ));

    let retriever = Arc::new(ScriptedRetriever::with_documents(vec![RetrievedDocument {
        title: "Chèque énergie".to_string(),
        content: "Aide au paiement des factures d'énergie.".to_string(),
    }]));

    let pipeline = pipeline_with(client.clone(), retriever.clone());
    let seed = Conversation::with_user("J'ai du mal à payer mes factures, que faire ?");
    let result = pipeline.run(seed.clone()).await.unwrap();

    // seed + tool call + tool result + pairing (2) + final answer
    assert_eq!(result.len(), 6);

    let messages = result.messages();
    assert_eq!(messages[0].role, Role::User);
    // Prior turns are bit-identical after the run
    assert_eq!(messages[0], seed.messages()[0]);

    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].tool_calls.len(), 1);

    assert_eq!(messages[2].role, Role::Tool);
    assert_eq!(messages[2].tool_call_id, Some(messages[1].tool_calls[0].id.clone()));
    assert!(messages[2].content.starts_with("Chèque énergie\n"));

    // Synthetic pairing: invocation answered by the assertion payload
    assert_eq!(messages[3].role, Role::Assistant);
    assert_eq!(messages[3].tool_calls[0].name, "summary");
    assert_eq!(messages[4].role, Role::Tool);
    assert_eq!(messages[4].tool_call_id, Some(messages[3].tool_calls[0].id.clone()));

    // The unsourced assertion was filtered before reaching the conversation
    let recorded = AssertionSet::from_json(&messages[4].content).unwrap();
    assert_eq!(recorded.assertions.len(), 2);

    assert_eq!(messages[5].role, Role::Assistant);
    assert_eq!(result.final_answer(), Some(messages[5].content.as_str()));

    // Stage contract: tools forced in stage 1, schema forced in stage 3,
    // free-form generation in stage 4
    let requests = client.recorded_requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].tools.len(), 1);
    assert_eq!(requests[0].tool_choice, ToolChoice::Required);
    assert!(requests[1].format.is_some());
    assert!(requests[2].tools.is_empty());
    assert!(requests[2].format.is_none());

    // Visibility: stage 3 sees the tool result, stage 4 sees the assertions
    assert!(requests[1]
        .messages
        .iter()
        .any(|m| m.role == Role::Tool && m.content.starts_with("Chèque énergie")));
    assert!(requests[2]
        .messages
        .iter()
        .any(|m| m.role == Role::Tool && m.content.contains("F33667")));
}

#[tokio::test]
async fn test_empty_assertion_set_inserts_sentinel() {
    let client = Arc::new(MockClient::new());
    client.push_message(ChatMessage::assistant_tool_calls(vec![search_call(
        "question introuvable",
    )]));
    client.push_message(ChatMessage::assistant(
        serde_json::json!({
            "assertions": [{"assertion": "Invérifiable.", "source": null}]
        })
        .to_string(),
    ));
    client.push_message(ChatMessage::assistant(
        "Je ne suis pas en mesure de répondre à votre question.",
    ));

    let retriever = Arc::new(ScriptedRetriever::with_documents(Vec::new()));
    let pipeline = pipeline_with(client.clone(), retriever);

    let result = pipeline
        .run(Conversation::with_user("Une question sans réponse ?"))
        .await
        .unwrap();

    // The sentinel is visible to stage 4 as prior context
    let sentinel = result
        .messages()
        .iter()
        .find(|m| m.role == Role::Tool && m.content.contains("No sourced assertions"))
        .expect("sentinel message present");
    assert!(sentinel.content.contains("cannot answer"));

    let requests = client.recorded_requests();
    assert!(requests[2]
        .messages
        .iter()
        .any(|m| m.content.contains("No sourced assertions")));

    assert!(result
        .final_answer()
        .unwrap()
        .contains("pas en mesure de répondre"));
}

#[tokio::test]
async fn test_multiple_tool_calls_executed_in_order() {
    let client = Arc::new(MockClient::new());
    client.push_message(ChatMessage::assistant_tool_calls(vec![
        search_call("chèque énergie"),
        search_call("fonds de solidarité"),
    ]));
    client.push_message(ChatMessage::assistant(sourced_assertions_json()));
    client.push_message(ChatMessage::assistant("Réponse."));

    let retriever = Arc::new(ScriptedRetriever::with_documents(vec![RetrievedDocument {
        title: "Publication".to_string(),
        content: "Contenu.".to_string(),
    }]));

    let pipeline = pipeline_with(client, retriever.clone());
    let result = pipeline
        .run(Conversation::with_user("Que faire ?"))
        .await
        .unwrap();

    // Both queries executed, in request order
    assert_eq!(
        *retriever.queries.lock().unwrap(),
        vec!["chèque énergie".to_string(), "fonds de solidarité".to_string()]
    );

    // One tool result per invocation, paired by id, in the same order
    let messages = result.messages();
    assert_eq!(messages[1].tool_calls.len(), 2);
    assert_eq!(messages[2].tool_call_id, Some(messages[1].tool_calls[0].id.clone()));
    assert_eq!(messages[3].tool_call_id, Some(messages[1].tool_calls[1].id.clone()));
}

#[tokio::test]
async fn test_conversation_grows_monotonically() {
    let client = Arc::new(MockClient::new());
    client.push_message(ChatMessage::assistant_tool_calls(vec![search_call("q")]));
    client.push_message(ChatMessage::assistant(sourced_assertions_json()));
    client.push_message(ChatMessage::assistant("Réponse."));

    let retriever = Arc::new(ScriptedRetriever::with_documents(Vec::new()));
    let pipeline = pipeline_with(client, retriever);

    let seed = Conversation::from_messages(vec![
        ChatMessage::user("Première question"),
        ChatMessage::assistant("Première réponse"),
        ChatMessage::user("J'ai du mal à payer mes factures, que faire ?"),
    ]);

    let result = pipeline.run(seed.clone()).await.unwrap();

    assert!(result.len() > seed.len());
    for (before, after) in seed.messages().iter().zip(result.messages()) {
        assert_eq!(before, after);
    }
}

#[tokio::test]
async fn test_unparseable_assertions_abort_with_schema_error() {
    let client = Arc::new(MockClient::new());
    client.push_message(ChatMessage::assistant_tool_calls(vec![search_call("q")]));
    client.push_message(ChatMessage::assistant("Voici quelques pistes générales..."));

    let retriever = Arc::new(ScriptedRetriever::with_documents(Vec::new()));
    let pipeline = pipeline_with(client, retriever);

    let result = pipeline.run(Conversation::with_user("Question ?")).await;
    assert!(matches!(result, Err(AppError::Schema(_))));
}

#[tokio::test]
async fn test_answer_without_search_is_rejected() {
    let client = Arc::new(MockClient::new());
    client.push_message(ChatMessage::assistant("Je réponds sans chercher."));

    let retriever = Arc::new(ScriptedRetriever::with_documents(Vec::new()));
    let pipeline = pipeline_with(client, retriever);

    let result = pipeline.run(Conversation::with_user("Question ?")).await;
    assert!(matches!(result, Err(AppError::Llm(_))));
}

#[tokio::test]
async fn test_missing_query_argument_is_schema_error() {
    let client = Arc::new(MockClient::new());
    client.push_message(ChatMessage::assistant_tool_calls(vec![ToolCall::new(
        "search",
        serde_json::json!({ "requete": "mal nommée" }),
    )]));

    let retriever = Arc::new(ScriptedRetriever::with_documents(Vec::new()));
    let pipeline = pipeline_with(client, retriever);

    let result = pipeline.run(Conversation::with_user("Question ?")).await;
    assert!(matches!(result, Err(AppError::Schema(_))));
}

/// End-to-end over a real store: the corpus holds a publication about
/// payment difficulties and the final answer cites its URL.
#[tokio::test]
async fn test_grounded_answer_cites_corpus_url() {
    let url = "https://www.service-public.fr/particuliers/vosdroits/F33667";

    let store = Arc::new(
        PublicationVectorStore::new(
            Arc::new(MemoryIndex::new()),
            Arc::new(MockEmbeddings::new(64)),
        )
        .with_retry_policy(RetryPolicy::immediate(1)),
    );

    store
        .add_publications(vec![Publication {
            id: Some("F33667".to_string()),
            url: Some(url.to_string()),
            title: Some("Chèque énergie".to_string()),
            paragraphs: vec![
                "Le chèque énergie est une aide au paiement des factures d'énergie du logement."
                    .to_string(),
            ],
            ..Default::default()
        }])
        .await
        .unwrap();

    let client = Arc::new(MockClient::new());
    client.push_message(ChatMessage::assistant_tool_calls(vec![search_call(
        "difficultés paiement factures aide",
    )]));
    client.push_message(ChatMessage::assistant(
        serde_json::json!({
            "assertions": [{
                "assertion": "Le chèque énergie aide les ménages à payer leurs factures d'énergie.",
                "source": url
            }]
        })
        .to_string(),
    ));
    client.push_message(ChatMessage::assistant(format!(
        "Si vous avez du mal à payer vos factures, vous pouvez bénéficier du chèque énergie ( {} ).",
        url
    )));

    let pipeline = pipeline_with(client.clone(), store);
    let result = pipeline
        .run(Conversation::with_user(
            "J'ai du mal à payer mes factures, que faire ?",
        ))
        .await
        .unwrap();

    // The retrieval stage surfaced the publication to the model
    let tool_result = &result.messages()[2];
    assert_eq!(tool_result.role, Role::Tool);
    assert!(tool_result.content.contains("Chèque énergie"));
    assert!(tool_result.content.contains(url));

    // The extraction stage saw that content before asserting
    let requests = client.recorded_requests();
    assert!(requests[1]
        .messages
        .iter()
        .any(|m| m.role == Role::Tool && m.content.contains(url)));

    // The final answer carries a ( URL ) citation drawn from the corpus
    let answer = result.final_answer().unwrap();
    assert!(answer.contains(&format!("( {} )", url)));
}
