// Integration tests for dialog interception
//
// Tests cover:
// - confirm() and prompt() answered by interceptors
// - Default replies when nothing is intercepted
// - Interceptor record order
// - Teardown uninstalling interceptors before late page timers fire

use pagewright::server::{App, Context, Html, h};
use pagewright::{
    Dialog, DialogKind, DialogResponse, DialogStub, Session, SessionOptions, Site, expect,
};
use std::sync::Arc;
use std::time::Duration;

mod common;

#[derive(Default)]
struct Files {
    names: Vec<String>,
}

enum Message {
    Add,
    DeleteAll,
    Rename,
    RemindLater,
    Remind,
}

impl App for Files {
    type Message = Message;

    fn update(&mut self, message: Message, ctx: &Context<Message>) {
        match message {
            Message::Add => self.names.push(format!("file{}", self.names.len() + 1)),
            Message::DeleteAll => {
                if ctx.confirm(format!("Delete {} file(s)?", self.names.len())) {
                    self.names.clear();
                }
            }
            Message::Rename => {
                let current = self.names.first().cloned().unwrap_or_default();
                if let Some(name) = ctx.prompt("New name", Some(current.as_str()))
                    && let Some(first) = self.names.first_mut()
                {
                    *first = name;
                }
            }
            Message::RemindLater => ctx.send_after(Duration::from_millis(500), Message::Remind),
            Message::Remind => ctx.alert("reminder"),
        }
    }

    fn view(&self) -> Html<Message> {
        h::div()
            .push(h::button().push("Add").on("click", |_| Message::Add))
            .push(h::button().push("Delete all").on("click", |_| Message::DeleteAll))
            .push(h::button().push("Rename").on("click", |_| Message::Rename))
            .push(h::button().push("Remind me").on("click", |_| Message::RemindLater))
            .push(h::ul().append(self.names.iter().map(|n| h::li().push(n.clone()))))
            .into()
    }
}

async fn session() -> Session {
    let site = Site::new("http://127.0.0.1:9999")
        .unwrap()
        .mount("/files/index.html", Files::default);
    let session = Session::new(site, SessionOptions::new()).unwrap();
    session
        .visit("http://127.0.0.1:9999/files/index.html")
        .await
        .unwrap();
    for _ in 0..2 {
        session.get("button").contains("Add").click().await.unwrap();
    }
    session
}

// ============================================================================
// confirm()
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_confirm_dismissed_keeps_files() -> pagewright::Result<()> {
    common::init_tracing();
    let session = session().await;
    let stub = DialogStub::returning(DialogResponse::dismiss());
    session.intercept(DialogKind::Confirm, stub.handler());

    session.get("button").contains("Delete all").click().await?;

    stub.assert_called_with("Delete 2 file(s)?")?;
    expect(session.get("li")).to_have_count(2).await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_confirm_default_reply_accepts() -> pagewright::Result<()> {
    common::init_tracing();
    let session = session().await;

    session.get("button").contains("Delete all").click().await?;

    expect(session.get("li")).not().to_exist().await?;
    assert!(session.intercepted().is_empty());
    Ok(())
}

// ============================================================================
// prompt()
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_prompt_answers() -> pagewright::Result<()> {
    common::init_tracing();
    let session = session().await;
    let seen = Arc::new(parking_lot::Mutex::new(Vec::<Dialog>::new()));
    let seen_clone = Arc::clone(&seen);
    session.intercept(
        DialogKind::Prompt,
        Arc::new(move |dialog: &Dialog| {
            seen_clone.lock().push(dialog.clone());
            DialogResponse::accept_with("notes.txt")
        }),
    );

    session.get("button").contains("Rename").click().await?;

    expect(session.get("li").first()).to_have_text("notes.txt").await?;
    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].default_value.as_deref(), Some("file1"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_prompt_accept_without_text_uses_default() -> pagewright::Result<()> {
    common::init_tracing();
    let session = session().await;
    session.intercept(
        DialogKind::Prompt,
        DialogStub::returning(DialogResponse::accept()).handler(),
    );

    session.get("button").contains("Rename").click().await?;

    expect(session.get("li").first()).to_have_text("file1").await?;
    Ok(())
}

// ============================================================================
// Records and teardown
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_intercepted_records_in_call_order() -> pagewright::Result<()> {
    common::init_tracing();
    let session = session().await;
    session.intercept(
        DialogKind::Confirm,
        DialogStub::returning(DialogResponse::dismiss()).handler(),
    );
    session.intercept(DialogKind::Alert, DialogStub::new().handler());

    session.get("button").contains("Delete all").click().await?;
    session.get("button").contains("Remind me").click().await?;
    session.wait(Duration::from_millis(600)).await;

    let records = session.intercepted();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].kind, DialogKind::Confirm);
    assert_eq!(records[0].response, DialogResponse::Dismiss);
    assert_eq!(records[1].kind, DialogKind::Alert);
    assert_eq!(records[1].message, "reminder");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_close_stops_late_dialogs() -> pagewright::Result<()> {
    common::init_tracing();
    let session = session().await;
    let stub = DialogStub::new();
    session.intercept(DialogKind::Alert, stub.handler());

    session.get("button").contains("Remind me").click().await?;
    session.close().await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(stub.call_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_interceptors_do_not_leak_across_sessions() -> pagewright::Result<()> {
    common::init_tracing();
    let stub = DialogStub::new();
    {
        let first = session().await;
        first.intercept(DialogKind::Alert, stub.handler());
        first.get("button").contains("Remind me").click().await?;
        // dropped without close()
    }

    let second = session().await;
    second.get("button").contains("Remind me").click().await?;
    second.wait(Duration::from_millis(600)).await;

    assert_eq!(stub.call_count(), 0);
    assert!(second.intercepted().is_empty());
    Ok(())
}
