use crate::{PipelineError, Rating, Ticker};

use super::DataPipeline;

impl DataPipeline {
    /// Current analyst rating, or `None` when the provider has no snapshot,
    /// no score, or a score outside the rating scale for `ticker`.
    pub async fn get_rating(&self, ticker: &Ticker) -> Result<Option<Rating>, PipelineError> {
        let snapshot = self.provider.rating_snapshot(ticker).await?;
        let Some(score) = snapshot.and_then(|snapshot| snapshot.overall_score.get()) else {
            return Ok(None);
        };
        match Rating::from_score(score.round() as i64) {
            Ok(rating) => Ok(Some(rating)),
            Err(error) => {
                tracing::warn!(ticker = %ticker, score, %error, "ignoring out-of-scale rating score");
                Ok(None)
            }
        }
    }
}
