//! The fetcher triad implemented by every endpoint.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Debug;

use crate::error::{DataError, Result};
use crate::reader::FactorReader;

/// One endpoint: validate parameters, query the store, reshape the result.
#[async_trait]
pub trait Fetcher: Send + Sync + Debug {
    /// Validated query.
    type Query: Send + Sync + Debug;
    /// Raw result handed from extraction to transformation.
    type Raw: Send;
    /// Output record.
    type Data: Serialize + Send + Debug;

    /// Model name the endpoint is registered under.
    fn model(&self) -> &'static str;

    /// Short description of the endpoint.
    fn description(&self) -> &'static str;

    /// Validates and defaults caller parameters.
    fn transform_query(&self, params: &Value) -> Result<Self::Query>;

    /// Runs the query against the store. Fails with `EmptyData` when nothing comes back.
    async fn extract_data(
        &self,
        query: &Self::Query,
        reader: &dyn FactorReader,
    ) -> Result<Self::Raw>;

    /// Reshapes the raw result into records.
    fn transform_data(&self, query: &Self::Query, raw: Self::Raw) -> Result<Vec<Self::Data>>;

    /// Runs the full triad.
    async fn fetch_data(
        &self,
        params: &Value,
        reader: &dyn FactorReader,
    ) -> Result<Vec<Self::Data>> {
        let query = self.transform_query(params)?;
        let raw = self.extract_data(&query, reader).await?;
        self.transform_data(&query, raw)
    }
}

/// Deserializes caller parameters, reporting failures as invalid parameters.
pub fn parse_params<T: DeserializeOwned>(params: &Value) -> Result<T> {
    T::deserialize(params).map_err(|e| DataError::InvalidParameter(e.to_string()))
}
