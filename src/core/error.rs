use std::fmt;

/// Every failure class the store can raise.
///
/// Bootstrap kinds only ever surface while configuration is being turned
/// into validated stores and indexes; once a `Database` exists, operations
/// raise the engine and index-maintenance kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    // Bootstrap / validation
    InvalidStore,
    StoreKeyMalformed,
    IndexKeyMalformed,
    SystemReserved,
    FulltextNoDistinct,
    FulltextInvalidFields,
    FulltextEmptyFields,
    FulltextInvalidFieldsString,
    InvalidDistinctValue,
    FailedDirectoryCreate,
    NotWritable,
    InvalidIndexKey,

    // Engine operations
    IdMalformed,
    IdCollision,
    FileMissing,
    NotReadable,
    WriteError,
    ReadError,
    DeleteError,
    LockWriteFailure,

    // Index maintenance
    CleanError,
    FulltextWriteError,
    IndexWriteError,
    DistinctDeleteError,
    DistinctWriteError,

    // Underlying I/O
    Io,
}

/// Error plus the store/index/document context it was raised in.
#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub store: Option<String>,
    pub index: Option<String>,
    pub id: Option<String>,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Error {
            kind,
            store: None,
            index: None,
            id: None,
            context: context.into(),
        }
    }

    pub fn with_store(mut self, store: &str) -> Self {
        self.store = Some(store.to_string());
        self
    }

    pub fn with_index(mut self, index: &str) -> Self {
        self.index = Some(index.to_string());
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(store) = &self.store {
            write!(f, " store={}", store)?;
        }
        if let Some(index) = &self.index {
            write!(f, " index={}", index)?;
        }
        if let Some(id) = &self.id {
            write!(f, " id={}", id)?;
        }
        write!(f, ": {}", self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::Io, err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
