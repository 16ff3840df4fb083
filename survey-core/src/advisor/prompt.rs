//! Prompt construction for advisory consultations.

use crate::db::QuestionContext;

/// System instruction sent ahead of every consultation prompt.
pub const SYSTEM_PROMPT: &str =
    "You are a professional financial consultant. Give a clear consultation about financial products.";

/// Build the user prompt for a consultation query.
///
/// Missing context fields render as empty sections so the layout stays stable.
pub fn build_consultation_prompt(query: &str, context: &QuestionContext, max_words: u32) -> String {
    format!(
        "QUESTION CONTEXT:\n{question}\n\n\
         MARKET SITUATION:\n{market}\n\n\
         PRODUCT A: {a}\nDetails: {a_details}\n\n\
         PRODUCT B: {b}\nDetails: {b_details}\n\n\
         PARTICIPANT QUESTION: {query}\n\n\
         ANSWER REQUIREMENTS:\n\
         - Give a concrete recommendation that takes the market situation into account\n\
         - Explain the risks and benefits of each product\n\
         - Work out the real (inflation-adjusted) return where relevant\n\
         - Keep it understandable for a non-specialist\n\
         - Do not exceed {max_words} words\n\
         - Structure the answer as short bullet points\n\n\
         Answer:",
        question = context.question_text,
        market = context.market_context,
        a = context.option_a,
        a_details = context.option_a_details,
        b = context.option_b,
        b_details = context.option_b_details,
        query = query.trim(),
        max_words = max_words,
    )
}
