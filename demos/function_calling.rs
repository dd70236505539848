use fnkit::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
enum Priority {
    Low,
    Normal,
    Urgent,
}

#[derive(Debug, Serialize)]
struct Ticket {
    id: u32,
    title: String,
    priority: Priority,
}

#[derive(Default)]
struct HelpDesk {
    next_id: AtomicU32,
}

#[function_source(name = "help_desk")]
impl HelpDesk {
    /// Opens a support ticket and returns it
    #[function(name = "open_ticket")]
    async fn open(
        &self,
        #[param(description = "Short summary of the problem")] title: String,
        #[param(description = "How soon this needs attention")] priority: Option<Priority>,
    ) -> anyhow::Result<Ticket> {
        if title.trim().is_empty() {
            anyhow::bail!("ticket title must not be empty");
        }
        Ok(Ticket {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            title,
            priority: priority.unwrap_or(Priority::Normal),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = FnkitConfig::load_or_default()?;
    init_telemetry(&config.observability)?;

    println!("=== fnkit function calling demo ===\n");

    let registry = Arc::new(FunctionRegistry::from_config(&config));
    registry.register_source(Arc::new(HelpDesk::default()));
    registry.register_source(Arc::new(builtin_functions()?));
    registry.log_summary();

    println!("Tool manifest sent to the model:");
    println!(
        "{}\n",
        serde_json::to_string_pretty(&registry.tool_manifest())?
    );

    let dispatcher = Dispatcher::from_config(Arc::clone(&registry), &config);

    // Calls as a model would issue them
    let requests = [
        CallRequest::new(
            "open_ticket",
            r#"{"title": "VPN drops hourly", "priority": "urgent"}"#,
        ),
        CallRequest::new("open_ticket", r#"{"title": "Printer jam"}"#),
        CallRequest::new("calculator", r#"{"expression": "15 * 23 + 100"}"#),
        CallRequest::new("open_ticket", r#"{"priority": "low"}"#),
        CallRequest::new("reboot_server", "{}"),
    ];

    for request in &requests {
        let result = dispatcher.dispatch(request).await;
        println!(
            "{}({}) -> {}",
            request.function_name,
            request.arguments_json,
            result.to_message_content()
        );
    }

    Ok(())
}
