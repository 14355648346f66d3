//! Occupancy (total bookings) forecasting.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::UseCaseError;
use crate::llm::{Bindings, PromptTemplate};
use crate::refine::{ContainsToken, IterationRecord, RefinementLoop, RefinementResult, Termination};

use super::ModelPair;
use super::dates::forecast_date_range;

const EXPERT_TEMPLATE: &str = r#"
You are a hotel revenue management AI specializing in booking prediction.

Hotel: {hotel_name}
Location: {hotel_location}
Forecast Period: {date_range}

Confirmed Bookings Data:
{confirmed_bookings}

Event Data:
{events_json}

Reviewer feedback on your previous forecast (empty on the first attempt):
{reviewer_feedback}

Task:
- Predict the **total bookings** for each day in the forecast period.
- Base your prediction on confirmed bookings and relevant event data.

Respond in JSON array format:
[
  {{"date": "YYYY-MM-DD", "predicted_total_bookings": <integer>, "reasoning": "..." }},
  ...
]
"#;

const REVIEWER_TEMPLATE: &str = r#"
You are a reviewer evaluating the predicted total bookings.

Event Data: {events_json}

Instructions:
- Ensure each entry includes "date", "predicted_total_bookings", and "reasoning".
- Check for illogical or inconsistent predictions based on events and trends.
- Suggest corrections if needed.
- If the forecast needs no changes, write APPROVED in your feedback.

Forecast to Review:
{extracted_output}

Respond with:
{{"feedback": "<review comments>", "corrected_forecast": [ ... ]}}
"#;

/// Reviewer token that ends the loop early.
pub const APPROVAL_TOKEN: &str = "APPROVED";

const INVALID_FORECAST: &str = "Invalid JSON format in forecast output.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingInput {
    pub hotel_name: String,
    pub hotel_location: String,
    /// `YYYY-MM-DD`
    pub start_date: String,
    /// `YYYY-MM-DD`
    pub end_date: String,
    #[serde(default)]
    pub confirmed_bookings: Vec<Value>,
    #[serde(default)]
    pub events_json: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastOutput {
    pub forecast_logs: Vec<IterationRecord>,
    pub final_forecast: Value,
    pub terminated_by: Termination,
}

/// Forecast daily total bookings, stopping early once the reviewer approves.
pub async fn forecast_total_bookings(
    input: &BookingInput,
    models: ModelPair<'_>,
    max_iterations: usize,
) -> Result<ForecastOutput, UseCaseError> {
    let date_range = forecast_date_range(&input.start_date, &input.end_date)?;
    let confirmed_bookings = serde_json::to_string_pretty(&input.confirmed_bookings)
        .map_err(UseCaseError::SerializationFailed)?;
    let events_json = serde_json::to_string_pretty(&input.events_json)
        .map_err(UseCaseError::SerializationFailed)?;

    let expert_template = PromptTemplate::new("forecast-expert", EXPERT_TEMPLATE)?;
    let reviewer_template = PromptTemplate::new("forecast-reviewer", REVIEWER_TEMPLATE)?;
    let extra = Bindings::new()
        .with("hotel_name", input.hotel_name.as_str())
        .with("hotel_location", input.hotel_location.as_str())
        .with("date_range", date_range)
        .with("confirmed_bookings", confirmed_bookings)
        .with("events_json", events_json);

    // The forecast is built from the bookings payload, not scraped text.
    let result = RefinementLoop::new(models.expert, models.reviewer)
        .max_iterations(max_iterations)
        .acceptance(ContainsToken::new(APPROVAL_TOKEN))
        .refine("", &expert_template, &reviewer_template, &extra)
        .await?;

    Ok(forecast_output(result))
}

fn forecast_output(result: RefinementResult) -> ForecastOutput {
    let final_forecast = result
        .last_structured_output()
        .unwrap_or_else(|| json!({ "error": INVALID_FORECAST }));

    ForecastOutput {
        forecast_logs: result.log,
        final_forecast,
        terminated_by: result.terminated_by,
    }
}
