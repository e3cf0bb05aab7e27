//! Carbon footprint heuristics: a coarse keyword-matched baseline per
//! product category and relatable unit conversions for user-facing framing.

/// Industry average per-unit footprints by product category, kg CO2e.
const AVERAGE_DEFAULT: f64 = 30.0;
const AVERAGE_TOOTHBRUSHES: f64 = 25.0;
const AVERAGE_SHOES: f64 = 35.0;
const AVERAGE_ELECTRONICS: f64 = 50.0;
const AVERAGE_CLOTHING: f64 = 20.0;
const AVERAGE_FURNITURE: f64 = 60.0;

/// Average car emissions per mile driven, kg CO2e.
const CO2_PER_MILE_DRIVEN: f64 = 0.4;

pub fn industry_average(product: &str) -> f64 {
    let product = product.to_lowercase();

    if product.contains("toothbrush") {
        return AVERAGE_TOOTHBRUSHES;
    }
    if product.contains("shoe") || product.contains("sneaker") {
        return AVERAGE_SHOES;
    }
    if product.contains("electronic") || product.contains("laptop") || product.contains("phone") {
        return AVERAGE_ELECTRONICS;
    }
    if product.contains("shirt") || product.contains("clothing") || product.contains("apparel") {
        return AVERAGE_CLOTHING;
    }
    if product.contains("furniture") || product.contains("chair") || product.contains("desk") {
        return AVERAGE_FURNITURE;
    }

    AVERAGE_DEFAULT
}

/// Per-unit savings versus the category average. Never negative.
pub fn carbon_savings(offer_carbon: f64, average_carbon: f64) -> f64 {
    (average_carbon - offer_carbon).max(0.0)
}

/// Savings expressed as car miles not driven.
pub fn carbon_to_miles(kg_co2: f64) -> i64 {
    (kg_co2 / CO2_PER_MILE_DRIVEN).round() as i64
}

pub fn carbon_reduction_pct(offer_carbon: f64, average_carbon: f64) -> i64 {
    if average_carbon == 0.0 {
        return 0;
    }
    ((average_carbon - offer_carbon) / average_carbon * 100.0).round() as i64
}

/// A relatable comparison line for the savings figure.
pub fn savings_comparison(kg_co2: f64) -> String {
    let miles = carbon_to_miles(kg_co2);

    if miles > 500 {
        format!("Not driving {miles} miles - that's like a road trip from SF to LA!")
    } else if miles > 100 {
        format!("Not driving {miles} miles - that's like a weekend getaway!")
    } else if miles > 50 {
        format!("Not driving {miles} miles - that's like your daily commute for a week!")
    } else if miles > 10 {
        format!("Not driving {miles} miles")
    } else {
        format!("Saving {kg_co2:.0}kg CO₂")
    }
}
