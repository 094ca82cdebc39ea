//! Post-processing applied to provider output before it reaches stdout.

const FENCE: &str = "```";

/// Remove a single fenced code block wrapping the whole response.
///
/// The opening fence must be the first line (a language tag after the
/// backticks is allowed). The closing fence is the *last* line consisting of
/// just the fence marker, so output holding several blocks is trimmed from the
/// first opening fence to the last closing one. Responses that don't start
/// with a fence are returned unchanged.
pub fn strip_code_fence(input: &str) -> String {
    let lines: Vec<&str> = input.split('\n').collect();
    if lines.len() < 2 {
        return input.to_owned();
    }

    if !lines[0].trim().starts_with(FENCE) {
        return input.to_owned();
    }

    let Some(close) = lines
        .iter()
        .skip(1)
        .rposition(|line| line.trim() == FENCE)
        .map(|i| i + 1)
    else {
        return input.to_owned();
    };

    let mut output = lines[1..close].join("\n");
    if input.ends_with('\n') && !output.is_empty() {
        output.truncate(output.trim_end_matches('\n').len());
        output.push('\n');
    }
    output
}
