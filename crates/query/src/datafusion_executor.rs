use crate::{DEFAULT_PREVIEW_LIMIT, QueryExecutor, QueryRequest, QueryResult, TABLE_NAME};
use arrow::array::Array;
use arrow::util::display::array_value_to_string;
use async_trait::async_trait;
use datafusion::execution::context::SessionContext;
use datafusion::prelude::{CsvReadOptions, NdJsonReadOptions, ParquetReadOptions};
use dataset::{Error, FormatOptions, Result, TextOptions};
use std::path::Path;

/// Runs each request in a fresh DataFusion session with the bound file
/// registered as [`TABLE_NAME`]
#[derive(Debug, Clone)]
pub struct DataFusionExecutor {
    limit: usize,
}

impl Default for DataFusionExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_LIMIT)
    }
}

impl DataFusionExecutor {
    /// `limit` caps the rows returned by any query
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    async fn register(&self, ctx: &SessionContext, location: &str, options: &FormatOptions) -> Result<()> {
        // Listing tables filter by extension, so match the file's own
        let extension = Path::new(location)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();

        let registered = match options {
            FormatOptions::Text(text) => {
                let csv = csv_options(text, &extension)?;
                ctx.register_csv(TABLE_NAME, location, csv).await
            }
            FormatOptions::Json => {
                let json = NdJsonReadOptions::default().file_extension(&extension);
                ctx.register_json(TABLE_NAME, location, json).await
            }
            FormatOptions::Parquet => {
                let parquet = ParquetReadOptions {
                    file_extension: &extension,
                    ..Default::default()
                };
                ctx.register_parquet(TABLE_NAME, location, parquet).await
            }
            FormatOptions::Xls(_) | FormatOptions::Excel(_) | FormatOptions::Unknown => {
                return Err(Error::UnsupportedFormat(options.file_type().to_string()));
            }
        };
        registered.map_err(|e| Error::query(format!("Failed to register {location}: {e}")))
    }
}

fn single_byte(value: &str, what: &str) -> Result<u8> {
    match value.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(Error::validation(value, format!("{what} must be a single byte"))),
    }
}

fn csv_options<'a>(text: &TextOptions, extension: &'a str) -> Result<CsvReadOptions<'a>> {
    let mut csv = CsvReadOptions::new()
        .has_header(text.extract_header || text.skip_first_line)
        .delimiter(single_byte(&text.field_delimiter, "field delimiter")?)
        .quote(single_byte(&text.quote, "quote")?)
        .file_extension(extension);
    if text.escape != text.quote {
        csv = csv.escape(single_byte(&text.escape, "escape")?);
    }
    if !text.comment.is_empty() {
        csv = csv.comment(single_byte(&text.comment, "comment")?);
    }
    match text.line_delimiter.as_str() {
        "\n" | "\r\n" => {}
        other => csv = csv.terminator(Some(single_byte(other, "line delimiter")?)),
    }
    Ok(csv)
}

/// Header naming that the CSV reader does not do itself
fn column_names(options: &FormatOptions, names: Vec<String>) -> Vec<String> {
    match options {
        FormatOptions::Text(text) if text.skip_first_line && !text.extract_header => (1..=names
            .len())
            .map(|i| format!("column_{i}"))
            .collect(),
        FormatOptions::Text(text) if text.extract_header && text.trim_header => {
            names.into_iter().map(|n| n.trim().to_string()).collect()
        }
        _ => names,
    }
}

#[async_trait]
impl QueryExecutor for DataFusionExecutor {
    async fn execute(&self, request: QueryRequest) -> Result<QueryResult> {
        let location = request.table.location.as_str();
        let exists = tokio::fs::try_exists(location)
            .await
            .map_err(|e| Error::io(format!("checking {location}"), e))?;
        if !exists {
            return Err(Error::not_found(location));
        }

        let sql = request.sql.as_str();
        let options = request.table.options.table_options();
        diagnostics::log_debug!("Executing {sql} over {location} with {options}", sql: sql, location: location, options: options);

        let ctx = SessionContext::new();
        self.register(&ctx, location, &request.table.options).await?;

        let df = ctx
            .sql(sql)
            .await
            .map_err(|e| Error::query(format!("Failed to plan '{sql}': {e}")))?;
        let names = df
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        let batches = df
            .collect()
            .await
            .map_err(|e| Error::query(format!("Failed to execute '{sql}': {e}")))?;

        let mut result = QueryResult {
            columns: column_names(&request.table.options, names),
            rows: Vec::new(),
            truncated: false,
        };

        'batches: for batch in &batches {
            for row in 0..batch.num_rows() {
                if result.rows.len() == self.limit {
                    result.truncated = true;
                    break 'batches;
                }
                let mut values = Vec::with_capacity(batch.num_columns());
                for column in batch.columns() {
                    if column.is_null(row) {
                        values.push(String::new());
                    } else {
                        values.push(array_value_to_string(column.as_ref(), row).map_err(|e| {
                            Error::query(format!("Failed to render value: {e}"))
                        })?);
                    }
                }
                result.rows.push(values);
            }
        }

        let rows = result.rows.len();
        diagnostics::log_debug!("Query returned {rows} rows", rows: rows);
        Ok(result)
    }
}
