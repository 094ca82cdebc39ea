/// Fixed system-role instruction placed at the top of every prompt.
pub const PREAMBLE: &str = "You are a Unix command line filter, you will follow the instructions below to transform, translate, convert, edit or modify the input provided below to the desired outcome.";

const DELIMITER: &str = "\n\n---\n\n";

/// Assemble the text sent to the provider.
///
/// Segments are trimmed and joined in a fixed order: preamble, context (only
/// when non-empty), instruction, input.
pub fn build(preamble: &str, instruction: &str, input: &str, context: Option<&str>) -> String {
    let mut prompt = preamble.trim().to_owned();

    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str(DELIMITER);
        prompt.push_str("Context:\n\n");
        prompt.push_str(context);
    }

    prompt.push_str(DELIMITER);
    prompt.push_str("Your task:\n\n");
    prompt.push_str(instruction.trim());

    prompt.push_str(DELIMITER);
    prompt.push_str("Input:\n\n");
    prompt.push_str(input.trim());

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_without_context() {
        let prompt = build(" Be a filter. ", "Translate to pirate speak\n", "Hello\n", None);
        assert_eq!(
            prompt,
            "Be a filter.\n\n---\n\nYour task:\n\nTranslate to pirate speak\n\n---\n\nInput:\n\nHello"
        );
        assert!(!prompt.contains("Context:"));
    }

    #[test]
    fn blank_context_is_omitted() {
        let prompt = build(PREAMBLE, "task", "input", Some("  \n "));
        assert!(!prompt.contains("Context:"));
    }

    #[test]
    fn context_sits_between_preamble_and_task() {
        let prompt = build(PREAMBLE, "task", "input", Some("some notes"));
        assert_eq!(prompt.matches("Context:").count(), 1);

        let preamble = prompt.find(PREAMBLE).unwrap();
        let context = prompt.find("Context:\n\nsome notes").unwrap();
        let task = prompt.find("Your task:").unwrap();
        let input = prompt.find("Input:").unwrap();
        assert!(preamble < context && context < task && task < input);
    }

    #[test]
    fn same_inputs_same_prompt() {
        assert_eq!(
            build(PREAMBLE, "a", "b", Some("c")),
            build(PREAMBLE, "a", "b", Some("c"))
        );
    }
}
