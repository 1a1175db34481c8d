use polars::error::PolarsError;
use std::io::Error as IoError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Performance data error: {0}")]
    Polars(#[from] PolarsError),

    #[error("Dataset or report file error: {0}")]
    Io(#[from] IoError),

    #[error("Dataset has no '{0}' column")]
    MissingColumn(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_dataset() {
        let err = Error::MissingColumn("Demarcacion".into());
        assert_eq!(err.to_string(), "Dataset has no 'Demarcacion' column");

        let err = Error::from(IoError::new(std::io::ErrorKind::NotFound, "rendimiento_fisico.parquet"));
        assert_eq!(err.to_string(), "Dataset or report file error: rendimiento_fisico.parquet");
    }
}
