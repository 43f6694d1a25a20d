use crate::cache::{decode_records, Dataset};
use crate::{normalize, CompanyNews, IsoDate, PipelineError, Ticker};

use super::{check_range, in_range, DataPipeline};

impl DataPipeline {
    /// News published within the range, newest first, at most `limit`.
    ///
    /// Articles are dated by the day part of their publish stamp; articles
    /// whose stamp does not parse never match a range.
    pub async fn get_company_news(
        &self,
        ticker: &Ticker,
        end: IsoDate,
        start: Option<IsoDate>,
        limit: usize,
    ) -> Result<Vec<CompanyNews>, PipelineError> {
        if let Some(start) = start {
            check_range(start, end)?;
        }

        let rows = self.cache.get(Dataset::CompanyNews, ticker.as_str()).await?;
        let cached = bound_news(
            decode_records(Dataset::CompanyNews, ticker.as_str(), rows),
            start,
            end,
            limit,
        );
        if !cached.is_empty() {
            tracing::debug!(ticker = %ticker, articles = cached.len(), "news served from cache");
            return Ok(cached);
        }

        tracing::debug!(ticker = %ticker, "news cache miss");
        let raw = self.provider.company_news(ticker, start, end).await?;
        let news = raw
            .iter()
            .map(|row| normalize::company_news(ticker.as_str(), row))
            .collect::<Vec<_>>();
        let news = bound_news(news, start, end, limit);
        if news.is_empty() {
            return Ok(news);
        }

        self.write_back(Dataset::CompanyNews, ticker, &news).await?;
        Ok(news)
    }

    /// Press releases in the range, newest first. Not cached.
    pub async fn get_press_releases(
        &self,
        ticker: &Ticker,
        end: IsoDate,
        start: Option<IsoDate>,
    ) -> Result<Vec<CompanyNews>, PipelineError> {
        if let Some(start) = start {
            check_range(start, end)?;
        }

        let raw = self.provider.press_releases(ticker, start, end).await?;
        let mut releases = raw
            .iter()
            .map(|row| normalize::company_news(ticker.as_str(), row))
            .filter(|release| {
                release
                    .publish_day()
                    .is_some_and(|day| in_range(day, start, end))
            })
            .collect::<Vec<_>>();
        releases.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(releases)
    }
}

fn bound_news(
    news: Vec<CompanyNews>,
    start: Option<IsoDate>,
    end: IsoDate,
    limit: usize,
) -> Vec<CompanyNews> {
    let mut bounded = news
        .into_iter()
        .filter(|article| {
            article
                .publish_day()
                .is_some_and(|day| in_range(day, start, end))
        })
        .collect::<Vec<_>>();
    bounded.sort_by(|a, b| b.date.cmp(&a.date));
    bounded.truncate(limit);
    bounded
}
