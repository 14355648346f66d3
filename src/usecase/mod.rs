//! The two callers of the refinement loop: competitor pricing extraction and
//! occupancy forecasting.
//!
//! Each use case owns its prompt templates and the interpretation of the
//! final result; the loop itself knows nothing about hotels.

pub mod dates;
pub mod forecast;
pub mod pricing;

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::UseCaseError;
use crate::llm::LanguageModel;

pub use forecast::{APPROVAL_TOKEN, BookingInput, ForecastOutput, forecast_total_bookings};
pub use pricing::{
    CompetitorEntry, HotelInfo, HotelPricingResponse, PricingRequest, WebSources,
    extract_hotel_pricing,
};

/// The two collaborators a use case drives. Both may be the same model.
#[derive(Clone, Copy)]
pub struct ModelPair<'a> {
    pub expert: &'a dyn LanguageModel,
    pub reviewer: &'a dyn LanguageModel,
}

impl<'a> ModelPair<'a> {
    /// Use one model for both roles.
    pub fn shared(model: &'a dyn LanguageModel) -> Self {
        Self {
            expert: model,
            reviewer: model,
        }
    }
}

/// Run `fut` under an optional deadline covering the whole invocation.
pub async fn with_deadline<T, F>(deadline: Option<Duration>, fut: F) -> Result<T, UseCaseError>
where
    F: Future<Output = Result<T, UseCaseError>>,
{
    match deadline {
        None => fut.await,
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Use case exceeded deadline of {}s", limit.as_secs());
                Err(UseCaseError::TimedOut(limit.as_secs()))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn deadline_cancels_slow_invocation() {
        let result: Result<(), UseCaseError> = with_deadline(Some(Duration::from_secs(2)), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;
        let err = tokio_test::assert_err!(result);
        assert!(matches!(err, UseCaseError::TimedOut(2)));
    }

    #[tokio::test]
    async fn no_deadline_passes_result_through() {
        let result = with_deadline(None, async { Ok::<_, UseCaseError>(7) }).await;
        assert_eq!(tokio_test::assert_ok!(result), 7);
    }
}
