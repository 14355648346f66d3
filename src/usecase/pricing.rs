//! Competitor hotel pricing extraction.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::UseCaseError;
use crate::llm::{Bindings, PromptTemplate, sanitize_for_prompt};
use crate::refine::{NeverAccept, RefinementLoop, RefinementResult};
use crate::web::{LinkSearch, PageScraper};

use super::ModelPair;
use super::dates::pricing_date_range;

const EXPERT_TEMPLATE: &str = r#"
You are a hotel pricing expert working from raw scraped web data.

Your task:
- Identify the top 5 real competitor hotels near "{hotel_name}", located in "{hotel_location}".
- Only include legitimate competitors (exclude hostels, dorms, or motels unless clearly relevant).
- Match competitors on hotel category (luxury, boutique, mid-scale, budget).
- Prices must be realistic for the market, season and demand during: {date_range}.

For each competitor, provide:
- "hotel_name": string
- "hotel_location": string (including city and state if available)
- "price_per_night_usd": number

Output format:
Return only a strict JSON array of exactly 5 hotel objects. No explanation or commentary.

Reviewer feedback on your previous answer (empty on the first attempt):
{reviewer_feedback}

Text:
{raw_text}
"#;

const REVIEWER_TEMPLATE: &str = r#"
You are a hotel pricing reviewer.

Instructions:
- Carefully review the JSON list of hotels and their prices below:
{extracted_output}
- Check that pricing is consistent with each hotel's category and star rating.
- Flag unrealistic entries and outliers.
- Confirm that prices apply to the date range: {date_range}.
- Ensure every competitor is located near or in "{hotel_location}".
- Ensure the output is a JSON array of exactly 5 objects with fields "hotel_name", "hotel_location", "price_per_night_usd".

Output format:
Return only the strict JSON array of hotel objects, fully corrected and sorted by price if necessary.
"#;

/// Label used when the final answer is not a list of competitors.
const INVALID_JSON: &str = "Invalid JSON";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingRequest {
    pub hotel_name: String,
    pub hotel_location: String,
    /// `YYYY-MM-DD`
    pub start_date: String,
    /// `YYYY-MM-DD`
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelInfo {
    pub hotel_name: String,
    pub hotel_location: String,
    pub price_per_night_usd: f64,
}

/// A competitor, or the reason no competitors could be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompetitorEntry {
    Hotel(HotelInfo),
    Invalid { error: String, details: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelPricingResponse {
    pub hotel_name: String,
    pub hotel_location: String,
    pub date_range: String,
    pub competitors: Vec<CompetitorEntry>,
}

/// Where the pricing use case gets its raw context from.
#[derive(Clone, Copy)]
pub struct WebSources<'a> {
    pub search: &'a dyn LinkSearch,
    pub scraper: &'a dyn PageScraper,
    /// How many search results to scrape.
    pub results: usize,
}

fn search_query(request: &PricingRequest) -> String {
    format!(
        r#"Find top websites or sources that provide up-to-date competitive hotel pricing information for "{}" and surrounding areas in "{}"."#,
        request.hotel_name, request.hotel_location
    )
}

/// Search, scrape and refine competitor prices for one hotel and date range.
pub async fn extract_hotel_pricing(
    request: &PricingRequest,
    sources: WebSources<'_>,
    models: ModelPair<'_>,
    max_iterations: usize,
) -> Result<HotelPricingResponse, UseCaseError> {
    let date_range = pricing_date_range(&request.start_date, &request.end_date)?;

    let urls = sources
        .search
        .top_links(&search_query(request), sources.results)
        .await?;
    info!("Found {} candidate pages", urls.len());

    let pages = sources.scraper.scrape(&urls).await;
    if pages.is_empty() {
        warn!("No page could be scraped, the expert will work without web context");
    }
    let raw_context = pages
        .iter()
        .map(|page| sanitize_for_prompt(page))
        .collect::<Vec<_>>()
        .join("\n\n");

    let expert_template = PromptTemplate::new("pricing-expert", EXPERT_TEMPLATE)?;
    let reviewer_template = PromptTemplate::new("pricing-reviewer", REVIEWER_TEMPLATE)?;
    let extra = Bindings::new()
        .with("hotel_name", request.hotel_name.as_str())
        .with("hotel_location", request.hotel_location.as_str())
        .with("date_range", date_range.as_str());

    let result = RefinementLoop::new(models.expert, models.reviewer)
        .max_iterations(max_iterations)
        .acceptance(NeverAccept)
        .refine(&raw_context, &expert_template, &reviewer_template, &extra)
        .await?;

    Ok(HotelPricingResponse {
        hotel_name: request.hotel_name.clone(),
        hotel_location: request.hotel_location.clone(),
        date_range,
        competitors: competitors_from(&result),
    })
}

/// Normalize the loop's final answer into competitor entries.
fn competitors_from(result: &RefinementResult) -> Vec<CompetitorEntry> {
    let invalid = |details: String| {
        vec![CompetitorEntry::Invalid {
            error: INVALID_JSON.to_string(),
            details,
        }]
    };

    let Some(extraction) = &result.final_output else {
        return invalid("no refinement iterations were run".to_string());
    };
    // An earlier valid answer beats a garbled last pass.
    let Some(value) = result.last_structured_output() else {
        let details = extraction.value["details"]
            .as_str()
            .unwrap_or("unparseable model output")
            .to_string();
        return invalid(details);
    };

    match serde_json::from_value::<Vec<HotelInfo>>(value.clone()) {
        Ok(hotels) => hotels.into_iter().map(CompetitorEntry::Hotel).collect(),
        Err(e) => invalid(format!("{e}: {}", compact(&value))),
    }
}

fn compact(value: &Value) -> String {
    let text = value.to_string();
    match text.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text,
    }
}
