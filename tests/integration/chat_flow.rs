//! Chat and lookup controllers sharing one page.

use std::sync::Arc;
use std::time::Duration;

use govdesk::assistant::AssistantError;
use govdesk::chat::{
    build_prompt, ChatController, LookupController, LookupOutcome, LookupRequest, SubmitOutcome,
};
use govdesk::markup::CmarkRenderer;
use govdesk::page::{LookupOutput, Origin};

use crate::fixtures::{catalog, page, ScriptedAssistant};

#[tokio::test(start_paused = true)]
async fn test_canned_reply_skips_assistant() {
    let catalog = catalog();
    let page = page(&catalog);
    let assistant = Arc::new(ScriptedAssistant::replying("unused"));
    let chat = ChatController::new(page.clone(), assistant.clone())
        .with_reply_delay(Duration::from_millis(600));

    let outcome = chat.submit("I forgot my PIN").await;
    assert_eq!(outcome, SubmitOutcome::Canned);
    assert!(assistant.prompts().is_empty());

    page.read(|doc| {
        let transcript = &doc.chat.as_ref().unwrap().transcript;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.nodes()[0].message.origin, Origin::User);
        assert_eq!(
            transcript.nodes()[1].message.content,
            "Use the 'Forgot Password' option to reset your password."
        );
        assert!(!transcript.is_typing());
    });
}

#[tokio::test(start_paused = true)]
async fn test_conversation_keeps_order_and_prompt_shape() {
    let catalog = catalog();
    let page = page(&catalog);
    let assistant = Arc::new(ScriptedAssistant::new(vec![
        Ok("Use **DigiLocker**.".to_string()),
        Err(AssistantError::NonOk {
            status: 502,
            message: None,
        }),
    ]));
    let chat = ChatController::new(page.clone(), assistant.clone())
        .with_renderer(Arc::new(CmarkRenderer));

    assert_eq!(chat.submit("where is my marksheet?").await, SubmitOutcome::Replied);
    assert!(matches!(
        chat.submit("and my licence?").await,
        SubmitOutcome::Failed(_)
    ));

    assert_eq!(assistant.prompts()[0], build_prompt("where is my marksheet?"));
    page.read(|doc| {
        let nodes = doc.chat.as_ref().unwrap().transcript.nodes();
        let origins: Vec<Origin> = nodes.iter().map(|n| n.message.origin).collect();
        assert_eq!(
            origins,
            vec![Origin::User, Origin::Assistant, Origin::User, Origin::Error]
        );
        assert!(nodes[1].html.contains("<strong>DigiLocker</strong>"));
        assert_eq!(nodes[3].html, "⚠ Server returned 502");
    });
}

#[tokio::test(start_paused = true)]
async fn test_new_session_drops_late_reply() {
    let catalog = catalog();
    let page = page(&catalog);
    let assistant = Arc::new(
        ScriptedAssistant::replying("late answer").with_delay(Duration::from_secs(5)),
    );
    let chat = Arc::new(ChatController::new(page.clone(), assistant));

    let pending = tokio::spawn({
        let chat = chat.clone();
        async move { chat.submit("how do I link aadhaar?").await }
    });
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(page.read(|doc| doc.chat.as_ref().unwrap().transcript.is_typing()));

    chat.new_session();
    assert_eq!(pending.await.unwrap(), SubmitOutcome::Discarded);
    page.read(|doc| {
        let transcript = &doc.chat.as_ref().unwrap().transcript;
        assert!(!transcript.is_typing());
        assert!(transcript
            .nodes()
            .iter()
            .all(|n| n.message.content != "late answer"));
    });
}

#[tokio::test(start_paused = true)]
async fn test_lookup_and_chat_share_page() {
    let catalog = catalog();
    let page = page(&catalog);
    let assistant = Arc::new(ScriptedAssistant::new(vec![
        Ok("UMANG brings **1200+** services together.".to_string()),
        Ok("Reply from chat".to_string()),
    ]));
    let lookup = LookupController::new(page.clone(), assistant.clone())
        .with_renderer(Arc::new(CmarkRenderer));
    let chat = ChatController::new(page.clone(), assistant.clone());

    let outcome = lookup
        .show(LookupRequest::new("", "UMANG", None))
        .await;
    assert_eq!(outcome, LookupOutcome::Shown);
    assert_eq!(chat.submit("hello").await, SubmitOutcome::Replied);

    assert_eq!(
        assistant.prompts()[0],
        "Tell me about the UMANG app and its key features in english."
    );
    page.read(|doc| {
        match &doc.lookup.as_ref().unwrap().output {
            LookupOutput::Ready(html) => assert!(html.contains("<strong>1200+</strong>")),
            other => panic!("unexpected lookup output {:?}", other),
        }
        assert_eq!(doc.chat.as_ref().unwrap().transcript.len(), 2);
    });
}

#[tokio::test(start_paused = true)]
async fn test_lookup_with_problem_prompt() {
    let catalog = catalog();
    let page = page(&catalog);
    let assistant = Arc::new(ScriptedAssistant::replying("Re-download from Issued Documents."));
    let lookup = LookupController::new(page.clone(), assistant.clone());

    let request = LookupRequest::new("hindi", "DigiLocker", Some("  marksheet missing "));
    assert_eq!(lookup.show(request).await, LookupOutcome::Shown);
    assert_eq!(
        assistant.prompts()[0],
        "I am facing a problem with the DigiLocker app. The problem is: marksheet missing. Please explain how to fix this in hindi."
    );
}
