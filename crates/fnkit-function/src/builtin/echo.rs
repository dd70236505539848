use crate::FunctionBuilder;
use fnkit_core::{InvokeError, MemberSignature, Result};
use serde_json::json;

/// Creates an echo function for testing purposes
pub fn echo_function() -> Result<MemberSignature> {
    FunctionBuilder::new()
        .name("echo")
        .description("Echoes back the provided message. Useful for testing function calling.")
        .param::<String>("message", "Message to echo back")
        .handler(|mut args| async move {
            let message: String = args.next()?;

            tracing::debug!(message = %message, "Echo function called");

            Ok::<_, InvokeError>(json!({ "message": message }))
        })
        .build()
}
