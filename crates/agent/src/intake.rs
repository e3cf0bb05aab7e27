//! Deterministic chat intake: progressively extract product, quantity, and
//! per-unit budget from free-form shopping messages until the run is ready
//! for a priority choice. No model in the loop; this is the guaranteed path.

use serde::{Deserialize, Serialize};

const STOPWORDS: &[&str] = &[
    "i", "we", "need", "want", "wants", "looking", "for", "buy", "buying", "get", "the", "a",
    "an", "some", "please", "hi", "hello", "hey", "my", "me", "to", "of", "with", "and", "under",
    "budget", "spend", "max", "below", "around", "about", "in", "at", "is", "it", "them", "can",
    "you", "help", "would", "like", "order", "our", "us", "that", "this",
];

const QUANTITY_UNITS: &[&str] =
    &["unit", "units", "pc", "pcs", "piece", "pieces", "box", "boxes", "pair", "pairs", "pack",
      "packs", "item", "items"];

/// Fields gathered so far across the conversation. The caller passes the
/// previous state back in so extraction stays progressive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedFields {
    pub product: Option<String>,
    pub quantity: Option<u32>,
    pub budget: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingIntent {
    pub reply: String,
    pub needs_more_info: bool,
    pub missing_fields: Vec<String>,
    pub ready_for_priority: bool,
    pub extracted: ExtractedFields,
}

#[derive(Clone, Debug, Default)]
pub struct IntakeExtractor;

impl IntakeExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str, prior: &ExtractedFields) -> ShoppingIntent {
        let normalized = text.to_lowercase();
        let tokens = tokenize(&normalized);

        let budget = extract_budget(&tokens).or(prior.budget);
        let quantity = extract_quantity(&tokens).or(prior.quantity);
        // Numbers are unambiguous signals so fresh ones win; product words
        // are noisy, so an already-confirmed product sticks.
        let product = prior.product.clone().or_else(|| extract_product(&tokens));

        let extracted = ExtractedFields { product, quantity, budget };

        let mut missing_fields = Vec::new();
        if extracted.product.is_none() {
            missing_fields.push("product".to_string());
        }
        if extracted.quantity.is_none() {
            missing_fields.push("quantity".to_string());
        }
        if extracted.budget.is_none() {
            missing_fields.push("budget".to_string());
        }

        let ready_for_priority = missing_fields.is_empty();
        let reply = reply_for(&extracted, &missing_fields);

        ShoppingIntent {
            reply,
            needs_more_info: !ready_for_priority,
            missing_fields,
            ready_for_priority,
            extracted,
        }
    }
}

fn reply_for(extracted: &ExtractedFields, missing_fields: &[String]) -> String {
    if missing_fields.is_empty() {
        return format!(
            "Great - {} {} with a budget around ${:.0} per unit. Pick a priority (speed, carbon, \
             or price) and I'll start negotiating.",
            extracted.quantity.unwrap_or(1),
            extracted.product.as_deref().unwrap_or("units"),
            extracted.budget.unwrap_or(0.0),
        );
    }

    match missing_fields[0].as_str() {
        "product" => {
            "I'm here to help you find sustainable products! What are you looking for?".to_string()
        }
        "quantity" => format!(
            "How many {} do you need?",
            extracted.product.as_deref().unwrap_or("units")
        ),
        _ => format!(
            "What's your budget per unit for the {}?",
            extracted.product.as_deref().unwrap_or("order")
        ),
    }
}

fn tokenize(text: &str) -> Vec<String> {
    let mut sanitized = String::with_capacity(text.len());
    for character in text.chars() {
        if character.is_ascii_alphanumeric() || matches!(character, '$' | '.') {
            sanitized.push(character);
        } else {
            sanitized.push(' ');
        }
    }
    sanitized.split_whitespace().map(|token| token.to_string()).collect()
}

fn extract_budget(tokens: &[String]) -> Option<f64> {
    let budget_context = ["budget", "spend", "under", "below", "max", "around"];
    for (index, token) in tokens.iter().enumerate() {
        let in_context = index > 0 && budget_context.contains(&tokens[index - 1].as_str());
        if token.starts_with('$') || in_context {
            if let Some(amount) = parse_money_token(token) {
                return Some(amount);
            }
        }
    }
    None
}

fn parse_money_token(token: &str) -> Option<f64> {
    let trimmed = token.trim_start_matches('$');
    if trimmed.is_empty() {
        return None;
    }

    let (number_part, multiplier) = if let Some(prefix) = trimmed.strip_suffix('k') {
        (prefix, 1_000.0)
    } else if let Some(prefix) = trimmed.strip_suffix('m') {
        (prefix, 1_000_000.0)
    } else {
        (trimmed, 1.0)
    };

    let amount = number_part.parse::<f64>().ok()?;
    (amount > 0.0).then_some(amount * multiplier)
}

fn extract_quantity(tokens: &[String]) -> Option<u32> {
    // A number right before a unit word wins over any bare number.
    for window in tokens.windows(2) {
        if let [value, unit] = window {
            if QUANTITY_UNITS.contains(&unit.as_str()) {
                if let Ok(quantity) = value.parse::<u32>() {
                    if quantity > 0 {
                        return Some(quantity);
                    }
                }
            }
        }
    }

    tokens
        .iter()
        .filter(|token| !token.starts_with('$'))
        .filter_map(|token| token.parse::<u32>().ok())
        .find(|quantity| (1..1_000_000).contains(quantity))
}

fn extract_product(tokens: &[String]) -> Option<String> {
    // The product is the longest contiguous run of plain words once numbers,
    // money, units, and filler are stripped.
    let mut best: Vec<&str> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for token in tokens {
        let keep = !token.starts_with('$')
            && token.parse::<f64>().is_err()
            && !STOPWORDS.contains(&token.as_str())
            && !QUANTITY_UNITS.contains(&token.as_str());

        if keep {
            current.push(token.as_str());
        } else {
            if current.len() > best.len() {
                best = std::mem::take(&mut current);
            } else {
                current.clear();
            }
        }
    }
    if current.len() > best.len() {
        best = current;
    }

    (!best.is_empty()).then(|| best.join(" "))
}
