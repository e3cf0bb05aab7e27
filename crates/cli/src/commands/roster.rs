use parley_core::builtin_roster;

pub fn run() -> String {
    let roster = builtin_roster();
    serde_json::to_string_pretty(&roster)
        .unwrap_or_else(|error| format!("{{\"error\":\"{error}\"}}"))
}
