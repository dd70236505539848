use crate::FunctionBuilder;
use fnkit_core::{InvokeError, MemberSignature, Result};
use serde_json::json;

/// Creates a calculator function that evaluates mathematical expressions
pub fn calculator_function() -> Result<MemberSignature> {
    FunctionBuilder::new()
        .name("calculator")
        .description(
            "Evaluates mathematical expressions. Supports +, -, *, /, ^, parentheses, and numbers.",
        )
        .param::<String>(
            "expression",
            "Mathematical expression to evaluate (e.g., '2 + 2', '10 * 5')",
        )
        .handler(|mut args| async move {
            let expression: String = args.next()?;

            tracing::debug!(expression = %expression, "Calculating expression");

            let result = evaluate_expression(&expression)?;

            tracing::debug!(result = %result, "Calculation completed");

            Ok::<_, InvokeError>(json!({
                "result": result,
                "expression": expression
            }))
        })
        .build()
}

fn evaluate_expression(expr: &str) -> std::result::Result<f64, InvokeError> {
    let expr = expr.trim().replace(' ', "");

    let result = meval::eval_str(&expr)
        .map_err(|e| InvokeError::execution(format!("Failed to evaluate expression: {}", e)))?;

    if result.is_finite() {
        Ok(result)
    } else {
        Err(InvokeError::execution(format!(
            "Expression '{}' has no finite result",
            expr
        )))
    }
}
