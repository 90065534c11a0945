use crate::domain::model::{ImportReport, ImportSource, ParsedBatch};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn catalog_file(&self) -> &str;
    fn max_rows(&self) -> Option<usize>;
}

#[async_trait]
pub trait ImportPipeline: Send + Sync {
    async fn fetch(&self, source: &ImportSource) -> Result<Vec<u8>>;
    async fn parse(&self, raw: Vec<u8>) -> Result<ParsedBatch>;
    async fn commit(&self, batch: ParsedBatch) -> Result<ImportReport>;
}
