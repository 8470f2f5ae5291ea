//! Prompt assembly for product-copy generation.
//!
//! Building a prompt is a pure function of the request fields; nothing here
//! touches configuration or the network.

/// Fixed system instruction sent with every request.
pub const SYSTEM_INSTRUCTION: &str = "You are an editor writing product introduction copy for e-commerce. \
Strictly apply the structure and formatting given by the TEMPLATE section. \
Keep every fact from the PRODUCT_INFO section as-is; never invent figures or details. \
Write in the template's target language, clear and concise, using markdown headings and bold text the way the template does.";

/// The two-message prompt sent to the generation provider.
///
/// Exists only for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptDocument {
    pub system: &'static str,
    pub user: String,
}

/// Assemble the user message from the template, the product info and an
/// optional extra-instructions block.
///
/// The extra block is only emitted when `extra_prompt` contains something
/// other than whitespace. The trailing output-requirements block is fixed.
pub fn build_prompt(template: &str, product_info: &str, extra_prompt: Option<&str>) -> PromptDocument {
    let mut user = format!(
        "# TEMPLATE\n{template}\n\n# PRODUCT_INFO\n{product_info}\n"
    );

    if let Some(extra) = extra_prompt {
        if !extra.trim().is_empty() {
            user.push_str(&format!("\n# EXTRA_INSTRUCTIONS\n{extra}\n"));
        }
    }

    user.push_str(
        "\n# OUTPUT_REQUIREMENTS\n\
         - Rewrite the content following the template structure exactly.\n\
         - If a fact is missing, write \"(missing information: ...)\" instead of inventing it.\n\
         - Output only the final article content (markdown), with no preamble or commentary.",
    );

    PromptDocument {
        system: SYSTEM_INSTRUCTION,
        user,
    }
}
