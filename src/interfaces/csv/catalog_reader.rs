use crate::domain::catalog::CatalogProduct;
use crate::error::{DeskError, Result};
use std::io::Read;

/// Reads an offline product table from CSV with columns `id,name,price,description`.
///
/// Whitespace around fields is trimmed and the description column may be
/// left out entirely.
pub struct CatalogReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CatalogReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and deserializes products, one `Result` per row.
    pub fn products(self) -> impl Iterator<Item = Result<CatalogProduct>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(DeskError::from))
    }

    /// Reads the whole table, failing on the first malformed row.
    pub fn read_all(self) -> Result<Vec<CatalogProduct>> {
        self.products().collect()
    }
}
