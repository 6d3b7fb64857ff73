//! # Example: Basic dispatch
//!
//! Subscribes a sync, an async and a failing handler, posts a few events and
//! stops the dispatcher. Runtime notices are printed by [`LogWriter`].
//!
//! Run with: `cargo run --example basic`

use std::{sync::Arc, time::Duration};

use serde_json::json;

use eventvisor::{
    Dispatcher, DispatcherConfig, Handler, HandlerError, Listener, LogWriter, Payload,
};

struct Orders;

impl Listener for Orders {}

fn data(p: &Payload) -> String {
    p.get("dummy_data")
        .and_then(|v| v.as_str())
        .unwrap_or("-")
        .to_string()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let dispatcher: Arc<Dispatcher> = Dispatcher::builder(DispatcherConfig::named("orders"))
        .with_observer(Arc::new(LogWriter::new()))
        .build();

    let audit = Handler::new_sync("audit", |p: Payload| {
        println!("[audit] {}", data(&p));
        Ok(())
    });
    let notify = Handler::new_async("notify", |p: Payload| async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        println!("[notify] {}", data(&p));
        Ok::<_, HandlerError>(())
    });
    let reject = Handler::new_sync("reject", |p: Payload| {
        Err(HandlerError::fail(format!("cannot ship {}", data(&p))))
    });

    let outcomes = Orders.setup_handlers(
        &dispatcher,
        [
            ("order.created", Some(audit)),
            ("order.created", Some(notify)),
            ("order.shipped", Some(reject)),
            ("order.refunded", None),
        ],
    );
    for o in &outcomes {
        println!("{}", o.message);
    }

    dispatcher.start()?;

    for id in ["A-1", "A-2"] {
        dispatcher.post("order.created", Payload::try_from(json!({ "dummy_data": id }))?)?;
    }
    dispatcher.post("order.shipped", Payload::try_from(json!({ "dummy_data": "A-1" }))?)?;

    if let Err(e) = dispatcher.post("order.refunded", Payload::empty()) {
        println!("post rejected: {e}");
    }

    dispatcher.process_all_events().await;
    dispatcher.stop().await;

    // let the observer flush the final notices
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
