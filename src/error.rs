use crate::{column, search::SearchError, spatial::QueryError, tree};

/// Any error this crate can produce.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Tree(#[from] tree::Error),
    #[error(transparent)]
    Serialize(#[from] tree::SerializeError),
    #[error(transparent)]
    Column(#[from] column::Error),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Query(#[from] QueryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OctantCode;

    fn fails() -> Result<(), Error> {
        Err(tree::Error::InvalidCode(OctantCode::NONE))?;
        Ok(())
    }

    #[test]
    fn converts() {
        assert!(matches!(
            fails(),
            Err(Error::Tree(tree::Error::InvalidCode(OctantCode::NONE)))
        ));
        let stale: Error = SearchError::StaleGraph {
            expected: 1,
            found: 2,
        }
        .into();
        assert_eq!(stale.to_string(), SearchError::StaleGraph { expected: 1, found: 2 }.to_string());
    }
}
