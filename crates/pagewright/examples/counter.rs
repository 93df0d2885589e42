// Counter example - driving an in-process page
//
// Shows: mounting an app, visit, contains + click, have.text, expect

use pagewright::server::{App, Context, Html, h};
use pagewright::{Assertion, Session, SessionOptions, Site, expect};

#[derive(Default)]
struct Counter {
    value: i32,
}

enum Message {
    Increment,
    Decrement,
}

impl App for Counter {
    type Message = Message;

    fn update(&mut self, message: Message, _ctx: &Context<Message>) {
        match message {
            Message::Increment => self.value += 1,
            Message::Decrement => self.value -= 1,
        }
    }

    fn view(&self) -> Html<Message> {
        h::div()
            .push(h::button().push("-").on("click", |_| Message::Decrement))
            .push(" ")
            .push(self.value)
            .push(" ")
            .push(h::button().push("+").on("click", |_| Message::Increment))
            .into()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let site = Site::new("http://127.0.0.1:9999")?.mount("/counter/index.html", Counter::default);
    let session = Session::new(site, SessionOptions::from_env()?.base_url("http://127.0.0.1:9999"))?;
    session.visit("/counter/index.html").await?;

    for _ in 0..3 {
        session.get("button").contains("+").click().await?;
    }
    session
        .get("div")
        .should(Assertion::have_text("- 3 +"))
        .await?;

    session.get("button").first().click().await?;
    expect(session.get("div")).to_contain_text("2").await?;

    let subject = session.get("button").await?;
    println!("{} buttons on {}", subject.len(), session.url().map(String::from).unwrap_or_default());

    session.close().await;
    Ok(())
}
